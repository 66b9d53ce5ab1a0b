//! Data models for Tooldesk

pub mod accessory;
pub mod assignment;
pub mod category;
pub mod deleted;
pub mod employee;
pub mod enums;
pub mod envelope;
pub mod hierarchy;
pub mod lifecycle;
pub mod position;
pub mod reference;
pub mod sub_tool;
pub mod tool;

// Re-export commonly used types
pub use accessory::Accessory;
pub use assignment::{AssetSnapshot, AssignRequest, RevokeRequest};
pub use category::Category;
pub use deleted::{AssetKey, ChildrenCount, DeletedSubTool, DeletedTool};
pub use employee::Employee;
pub use enums::{AccessoryStatus, AssetKind, Condition, DeviceStatus, Permission};
pub use envelope::Envelope;
pub use position::{PermissionSet, Position};
pub use reference::{resolve_ref, EntityRef, ResolvedRef};
pub use sub_tool::SubTool;
pub use tool::Tool;
