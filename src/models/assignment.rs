//! Assign / transfer / revoke payloads and the asset view they are built from

use serde_json::{Map, Value};

use super::accessory::Accessory;
use super::enums::{AssetKind, Condition};
use super::reference::{resolve_ref, EntityRef, ResolvedRef};
use super::sub_tool::SubTool;
use super::tool::Tool;

/// What the workflow needs to know about the asset being handed over
#[derive(Debug, Clone, PartialEq)]
pub struct AssetSnapshot {
    pub kind: AssetKind,
    pub id: String,
    pub name: String,
    /// Status is "Đang sử dụng"
    pub in_use: bool,
    pub assignee: Option<ResolvedRef>,
    /// Current container: parent Tool of a SubTool, SubTool of an Accessory
    pub parent: Option<ResolvedRef>,
    /// Category of the parent Tool, when the backend embedded it
    pub parent_category_id: Option<String>,
}

impl From<&Tool> for AssetSnapshot {
    fn from(tool: &Tool) -> Self {
        Self {
            kind: AssetKind::Tool,
            id: tool.id.clone(),
            name: tool.name.clone(),
            in_use: tool.is_in_use(),
            assignee: resolve_ref(tool.assigned_to.as_ref()),
            parent: None,
            parent_category_id: None,
        }
    }
}

impl From<&SubTool> for AssetSnapshot {
    fn from(sub: &SubTool) -> Self {
        let parent_category_id = sub
            .parent_tool
            .as_ref()
            .and_then(EntityRef::as_object)
            .and_then(|p| p.nested_ref("category"))
            .and_then(|c| c.resolve())
            .map(|c| c.id);
        Self {
            kind: AssetKind::SubTool,
            id: sub.id.clone(),
            name: sub.name.clone(),
            in_use: sub.status == Some(super::enums::DeviceStatus::InUse),
            assignee: resolve_ref(sub.assigned_to.as_ref()),
            parent: resolve_ref(sub.parent_tool.as_ref()),
            parent_category_id,
        }
    }
}

impl From<&Accessory> for AssetSnapshot {
    fn from(acc: &Accessory) -> Self {
        // An accessory without its own assignee is held through its SubTool
        let assignee = resolve_ref(acc.assigned_to.as_ref()).or_else(|| {
            acc.sub_tool_id
                .as_ref()
                .and_then(EntityRef::as_object)
                .and_then(|s| s.nested_ref("assignedTo"))
                .and_then(|r| r.resolve())
        });
        Self {
            kind: AssetKind::Accessory,
            id: acc.id.clone(),
            name: acc.name.clone(),
            in_use: acc.is_in_use(),
            assignee,
            parent: resolve_ref(acc.sub_tool_id.as_ref()),
            parent_category_id: None,
        }
    }
}

/// Assign or transfer submission
#[derive(Debug, Clone, PartialEq)]
pub struct AssignRequest {
    pub kind: AssetKind,
    pub asset_id: String,
    pub employee_id: String,
    pub destination_id: Option<String>,
    pub condition: Condition,
    pub notes: Option<String>,
}

impl AssignRequest {
    /// `{ <kind>Id, employeeId, target<Container>Id?, condition, notes? }`
    pub fn payload(&self) -> Value {
        let mut body = Map::new();
        body.insert(self.kind.id_field().into(), Value::from(self.asset_id.clone()));
        body.insert("employeeId".into(), Value::from(self.employee_id.clone()));
        if let (Some(field), Some(dest)) = (self.kind.destination_field(), &self.destination_id) {
            body.insert(field.into(), Value::from(dest.clone()));
        }
        body.insert("condition".into(), Value::from(self.condition.label()));
        if let Some(notes) = self.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            body.insert("notes".into(), Value::from(notes));
        }
        Value::Object(body)
    }
}

/// Revoke submission
#[derive(Debug, Clone, PartialEq)]
pub struct RevokeRequest {
    pub kind: AssetKind,
    pub asset_id: String,
    /// Condition on return
    pub condition: Condition,
    pub notes: Option<String>,
}

impl RevokeRequest {
    pub fn payload(&self) -> Value {
        let mut body = Map::new();
        body.insert(self.kind.id_field().into(), Value::from(self.asset_id.clone()));
        body.insert("condition".into(), Value::from(self.condition.label()));
        if let Some(notes) = self.notes.as_deref().filter(|n| !n.trim().is_empty()) {
            body.insert("notes".into(), Value::from(notes));
        }
        Value::Object(body)
    }
}
