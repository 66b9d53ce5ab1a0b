//! SubTool model (component attached to one Tool)

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, skip_serializing_none, DefaultOnError, DefaultOnNull};
use validator::Validate;

use super::enums::{Condition, DeviceStatus};
use super::lifecycle::Lifecycle;
use super::reference::{ref_id, EntityRef};

/// SubTool record as returned by the backend
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTool {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub parent_tool: Option<EntityRef>,
    #[serde(default)]
    pub sub_tool_type: Option<EntityRef>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub warranty_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub unit: Option<EntityRef>,
    /// Type-dependent attributes (screen size, switch type, DPI...)
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub specifications: IndexMap<String, Value>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub status: Option<DeviceStatus>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub assigned_to: Option<EntityRef>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub lifecycle: Lifecycle,
}

impl SubTool {
    pub fn parent_tool_id(&self) -> Option<&str> {
        ref_id(self.parent_tool.as_ref())
    }

    pub fn assignee_id(&self) -> Option<&str> {
        ref_id(self.assigned_to.as_ref())
    }

    /// Type name when the backend embedded the type document
    pub fn type_name(&self) -> Option<&str> {
        self.sub_tool_type
            .as_ref()
            .and_then(EntityRef::as_object)
            .and_then(|t| t.name.as_deref())
    }

    /// Assignee of the parent Tool when the backend embedded it
    pub fn parent_assignee_id(&self) -> Option<String> {
        self.parent_tool
            .as_ref()
            .and_then(EntityRef::as_object)
            .and_then(|p| p.nested_ref("assignedTo"))
            .map(|r| r.id().to_string())
            .filter(|id| !id.is_empty())
    }
}

/// Create sub-tool request
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubTool {
    #[validate(length(min = 1, message = "Tên thiết bị con là bắt buộc"))]
    pub name: String,
    pub code: Option<String>,
    #[validate(length(min = 1, message = "Thiết bị cha là bắt buộc"))]
    pub parent_tool: String,
    #[validate(length(min = 1, message = "Loại thiết bị là bắt buộc"))]
    pub sub_tool_type: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub warranty_until: Option<DateTime<Utc>>,
    pub quantity: Option<u32>,
    pub unit: Option<String>,
    pub specifications: Option<IndexMap<String, Value>>,
    pub status: Option<DeviceStatus>,
    pub condition: Option<Condition>,
    pub notes: Option<String>,
}

/// Update sub-tool request
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubTool {
    pub name: Option<String>,
    pub code: Option<String>,
    pub sub_tool_type: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub warranty_until: Option<DateTime<Utc>>,
    pub quantity: Option<u32>,
    pub unit: Option<String>,
    pub specifications: Option<IndexMap<String, Value>>,
    pub status: Option<DeviceStatus>,
    pub condition: Option<Condition>,
    pub notes: Option<String>,
}

/// List filters for `GET /sub-tool`
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubToolFilter {
    pub status: Option<DeviceStatus>,
    pub assigned_to: Option<String>,
    pub parent_tool: Option<String>,
    pub sub_tool_type: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Envelope;
    use serde_json::json;

    #[test]
    fn test_specifications_keep_order() {
        let sub: SubTool = serde_json::from_value(json!({
            "_id": "s1",
            "name": "Màn hình Dell",
            "parentTool": "t1",
            "subToolType": { "_id": "type-screen", "name": "Màn hình" },
            "specifications": { "size": "24\"", "resolution": "1920x1080", "panel": "IPS" },
            "status": "Khả dụng",
            "condition": "Mới"
        }))
        .unwrap();
        let keys: Vec<_> = sub.specifications.keys().cloned().collect();
        assert_eq!(keys, vec!["size", "resolution", "panel"]);
        assert_eq!(sub.type_name(), Some("Màn hình"));
        assert_eq!(sub.parent_tool_id(), Some("t1"));
    }

    #[test]
    fn test_specifications_order_survives_raw_body() {
        let raw = r#"{"success":true,"data":[{"_id":"s1","name":"RAM","specifications":{"speed":"3200","capacity":"16GB","ecc":false}}]}"#;
        let body: Value = serde_json::from_str(raw).unwrap();
        let listed: Envelope<Vec<SubTool>> = serde_json::from_value(body).unwrap();
        let keys: Vec<_> = listed.data.unwrap()[0].specifications.keys().cloned().collect();
        assert_eq!(keys, vec!["speed", "capacity", "ecc"]);
    }

    #[test]
    fn test_legacy_condition_keeps_the_rest_of_the_list() {
        let listed: Envelope<Vec<SubTool>> = serde_json::from_value(json!({
            "success": true,
            "data": [
                { "_id": "s1", "name": "Case cũ", "condition": "Tốt", "status": "Đang sử dụng" },
                { "_id": "s2", "name": "Case mới", "condition": "Mới", "status": "Sắp về" }
            ]
        }))
        .unwrap();
        let rows = listed.data.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].condition, None);
        assert_eq!(rows[0].status, Some(DeviceStatus::InUse));
        assert_eq!(rows[1].condition, Some(Condition::New));
        assert_eq!(rows[1].status, None);
    }

    #[test]
    fn test_null_collections_decode_as_empty() {
        let sub: SubTool = serde_json::from_value(json!({
            "_id": "s1",
            "name": "x",
            "code": null,
            "specifications": null
        }))
        .unwrap();
        assert!(sub.specifications.is_empty());
        assert_eq!(sub.code, "");
    }

    #[test]
    fn test_parent_assignee_from_embedded_parent() {
        let sub: SubTool = serde_json::from_value(json!({
            "_id": "s1",
            "name": "Case",
            "parentTool": { "_id": "t1", "name": "PC", "assignedTo": { "_id": "e2", "fullName": "B" } }
        }))
        .unwrap();
        assert_eq!(sub.parent_assignee_id().as_deref(), Some("e2"));
        assert_eq!(sub.assignee_id(), None);
    }

    #[test]
    fn test_create_requires_name_parent_and_type() {
        let payload = CreateSubTool::default();
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("parent_tool"));
        assert!(fields.contains_key("sub_tool_type"));
    }
}
