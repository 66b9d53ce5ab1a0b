//! Accessory model (part attached to one SubTool)

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, skip_serializing_none, DefaultOnError, DefaultOnNull};
use validator::Validate;

use super::enums::{AccessoryStatus, Condition};
use super::lifecycle::Lifecycle;
use super::reference::{ref_id, EntityRef};

/// Accessory record as returned by the backend
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessory {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub sub_tool_id: Option<EntityRef>,
    /// Denormalized grand-parent, must follow the SubTool's parent
    #[serde(default)]
    pub parent_tool_id: Option<EntityRef>,
    #[serde(default)]
    pub accessory_type: Option<EntityRef>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub unit: Option<EntityRef>,
    /// Mounting slot label (e.g. "DIMM 1", "M.2 #2")
    #[serde(default)]
    pub slot: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub warranty_until: Option<DateTime<Utc>>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub status: Option<AccessoryStatus>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub specifications: IndexMap<String, Value>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Stored image references (URLs or file names)
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub assigned_to: Option<EntityRef>,
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
}

impl Accessory {
    pub fn sub_tool(&self) -> Option<&str> {
        ref_id(self.sub_tool_id.as_ref())
    }

    pub fn parent_tool(&self) -> Option<&str> {
        ref_id(self.parent_tool_id.as_ref())
    }

    pub fn assignee_id(&self) -> Option<&str> {
        ref_id(self.assigned_to.as_ref())
    }

    pub fn is_in_use(&self) -> bool {
        self.status == Some(AccessoryStatus::InUse)
    }
}

/// Create accessory request
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccessory {
    #[validate(length(min = 1, message = "Tên phụ kiện là bắt buộc"))]
    pub name: String,
    pub code: Option<String>,
    #[validate(length(min = 1, message = "Thiết bị con là bắt buộc"))]
    pub sub_tool_id: String,
    #[validate(length(min = 1, message = "Loại phụ kiện là bắt buộc"))]
    pub accessory_type: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub quantity: Option<u32>,
    pub unit: Option<String>,
    pub slot: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub warranty_until: Option<DateTime<Utc>>,
    pub status: Option<AccessoryStatus>,
    pub condition: Option<Condition>,
    pub specifications: Option<IndexMap<String, Value>>,
    pub notes: Option<String>,
    pub images: Vec<String>,
}

/// Update accessory request
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccessory {
    pub name: Option<String>,
    pub code: Option<String>,
    pub accessory_type: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub quantity: Option<u32>,
    pub unit: Option<String>,
    pub slot: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub warranty_until: Option<DateTime<Utc>>,
    pub status: Option<AccessoryStatus>,
    pub condition: Option<Condition>,
    pub specifications: Option<IndexMap<String, Value>>,
    pub notes: Option<String>,
    pub images: Option<Vec<String>>,
}

/// List filters for `GET /accessory`
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryFilter {
    pub status: Option<AccessoryStatus>,
    pub assigned_to: Option<String>,
    pub sub_tool_id: Option<String>,
    pub accessory_type: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Stored references returned by `POST /accessory/upload-images`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImages {
    #[serde(default)]
    pub images: Vec<String>,
}
