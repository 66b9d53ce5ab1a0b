//! Tool model (top-level asset)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, skip_serializing_none, DefaultOnError, DefaultOnNull};
use validator::Validate;

use super::enums::DeviceStatus;
use super::lifecycle::Lifecycle;
use super::reference::{ref_id, EntityRef};

/// Tool record as returned by the backend
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<EntityRef>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub status: Option<DeviceStatus>,
    #[serde(default)]
    pub assigned_to: Option<EntityRef>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Tool {
    pub fn category_id(&self) -> Option<&str> {
        ref_id(self.category.as_ref())
    }

    pub fn assignee_id(&self) -> Option<&str> {
        ref_id(self.assigned_to.as_ref())
    }

    pub fn is_in_use(&self) -> bool {
        self.status == Some(DeviceStatus::InUse)
    }
}

/// Create tool request
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTool {
    #[validate(length(min = 1, message = "Tên thiết bị là bắt buộc"))]
    pub name: String,
    pub code: Option<String>,
    #[validate(length(min = 1, message = "Danh mục là bắt buộc"))]
    pub category: String,
    pub status: Option<DeviceStatus>,
    pub description: Option<String>,
}

/// Update tool request
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTool {
    pub name: Option<String>,
    pub code: Option<String>,
    pub category: Option<String>,
    pub status: Option<DeviceStatus>,
    pub description: Option<String>,
}

/// List filters for `GET /tools`
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolFilter {
    pub status: Option<DeviceStatus>,
    pub assigned_to: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
