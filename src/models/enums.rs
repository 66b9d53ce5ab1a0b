//! Shared fixed vocabularies
//!
//! The backend stores these as their Vietnamese labels, so each variant
//! serializes to the exact label string.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AppError;

macro_rules! vocabulary {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.label())
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(s) || format!("{:?}", v).eq_ignore_ascii_case(s))
                    .ok_or_else(|| AppError::Validation(format!("Giá trị không hợp lệ: {}", s)))
            }
        }
    };
}

// ---------------------------------------------------------------------------
// DeviceStatus
// ---------------------------------------------------------------------------

vocabulary! {
    /// Status of Tools and SubTools
    DeviceStatus {
        Available => "Khả dụng",
        InUse => "Đang sử dụng",
        Broken => "Hỏng",
        Liquidated => "Thanh lý",
        Standby => "Dự phòng",
    }
}

// ---------------------------------------------------------------------------
// AccessoryStatus
// ---------------------------------------------------------------------------

vocabulary! {
    /// Status of Accessories
    AccessoryStatus {
        Available => "Khả dụng",
        InUse => "Đang sử dụng",
        Maintenance => "Bảo trì",
        Broken => "Hỏng",
        Upgraded => "Đã nâng cấp",
        Liquidated => "Thanh lý",
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

vocabulary! {
    /// Physical condition, recorded on create, handover and return
    Condition {
        New => "Mới",
        Used => "Cũ",
        Damaged => "Hỏng",
    }
}

impl Default for Condition {
    fn default() -> Self {
        Condition::New
    }
}

// ---------------------------------------------------------------------------
// AssetKind
// ---------------------------------------------------------------------------

/// The three levels of the asset hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Tool,
    SubTool,
    Accessory,
}

impl AssetKind {
    /// Value of the `type` field in restore / permanent-delete bodies
    pub fn wire_type(&self) -> &'static str {
        match self {
            AssetKind::Tool => "tool",
            AssetKind::SubTool => "subtool",
            AssetKind::Accessory => "accessory",
        }
    }

    /// JSON field carrying the asset id in assign/revoke bodies
    pub fn id_field(&self) -> &'static str {
        match self {
            AssetKind::Tool => "toolId",
            AssetKind::SubTool => "subToolId",
            AssetKind::Accessory => "accessoryId",
        }
    }

    /// JSON field carrying the destination container id, if the level has one
    pub fn destination_field(&self) -> Option<&'static str> {
        match self {
            AssetKind::Tool => None,
            AssetKind::SubTool => Some("targetToolId"),
            AssetKind::Accessory => Some("targetSubToolId"),
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AssetKind::Tool => "Thiết bị",
            AssetKind::SubTool => "Thiết bị con",
            AssetKind::Accessory => "Phụ kiện",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for AssetKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tool" => Ok(AssetKind::Tool),
            "subtool" | "sub-tool" | "sub_tool" => Ok(AssetKind::SubTool),
            "accessory" => Ok(AssetKind::Accessory),
            other => Err(AppError::Validation(format!("Loại tài sản không hợp lệ: {}", other))),
        }
    }
}

// ---------------------------------------------------------------------------
// Permission
// ---------------------------------------------------------------------------

/// Permission tokens a Position may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewDashboard,
    ViewTool,
    CreateTool,
    UpdateTool,
    DeleteTool,
    AssignTool,
    RevokeTool,
    RestoreTool,
    PermanentDeleteTool,
    ViewEmployee,
    CreateEmployee,
    UpdateEmployee,
    DeleteEmployee,
    ViewPosition,
    CreatePosition,
    UpdatePosition,
    DeletePosition,
    ViewDepartment,
    ManageDepartment,
    ViewCategory,
    ManageCategory,
}

impl Permission {
    pub const ALL: &'static [Permission] = &[
        Permission::ViewDashboard,
        Permission::ViewTool,
        Permission::CreateTool,
        Permission::UpdateTool,
        Permission::DeleteTool,
        Permission::AssignTool,
        Permission::RevokeTool,
        Permission::RestoreTool,
        Permission::PermanentDeleteTool,
        Permission::ViewEmployee,
        Permission::CreateEmployee,
        Permission::UpdateEmployee,
        Permission::DeleteEmployee,
        Permission::ViewPosition,
        Permission::CreatePosition,
        Permission::UpdatePosition,
        Permission::DeletePosition,
        Permission::ViewDepartment,
        Permission::ManageDepartment,
        Permission::ViewCategory,
        Permission::ManageCategory,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            Permission::ViewDashboard => "view_dashboard",
            Permission::ViewTool => "view_tool",
            Permission::CreateTool => "create_tool",
            Permission::UpdateTool => "update_tool",
            Permission::DeleteTool => "delete_tool",
            Permission::AssignTool => "assign_tool",
            Permission::RevokeTool => "revoke_tool",
            Permission::RestoreTool => "restore_tool",
            Permission::PermanentDeleteTool => "permanent_delete_tool",
            Permission::ViewEmployee => "view_employee",
            Permission::CreateEmployee => "create_employee",
            Permission::UpdateEmployee => "update_employee",
            Permission::DeleteEmployee => "delete_employee",
            Permission::ViewPosition => "view_position",
            Permission::CreatePosition => "create_position",
            Permission::UpdatePosition => "update_position",
            Permission::DeletePosition => "delete_position",
            Permission::ViewDepartment => "view_department",
            Permission::ManageDepartment => "manage_department",
            Permission::ViewCategory => "view_category",
            Permission::ManageCategory => "manage_category",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Permission::ALL.iter().copied().find(|p| p.token() == token)
    }
}
