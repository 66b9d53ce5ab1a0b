//! Polymorphic entity references
//!
//! The backend joins related documents inconsistently: the same field
//! (`assignedTo`, `category`, `subToolType`, `parentTool`...) may arrive as a
//! raw id string or as an embedded object. [`EntityRef`] accepts both shapes
//! and [`resolve_ref`] is the single place where an id/label pair is
//! extracted from either.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Embedded document as joined by the backend
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefObject {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Every other joined field, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RefObject {
    /// Nested reference carried by the embedded document (e.g. the
    /// `category` of an embedded `parentTool`).
    pub fn nested_ref(&self, field: &str) -> Option<EntityRef> {
        self.extra
            .get(field)
            .and_then(|v| serde_json::from_value::<EntityRef>(v.clone()).ok())
    }

    /// Nested string field of the embedded document.
    pub fn nested_str(&self, field: &str) -> Option<&str> {
        self.extra.get(field).and_then(Value::as_str)
    }
}

/// A foreign key that is either a raw id or an embedded object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef {
    Id(String),
    Object(RefObject),
}

/// Normalized id/label pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedRef {
    pub id: String,
    pub label: String,
}

impl EntityRef {
    pub fn id(&self) -> &str {
        match self {
            EntityRef::Id(id) => id,
            EntityRef::Object(obj) => &obj.id,
        }
    }

    /// Normalizes either shape. Empty ids resolve to `None`.
    pub fn resolve(&self) -> Option<ResolvedRef> {
        let id = self.id().trim();
        if id.is_empty() {
            return None;
        }
        let label = match self {
            EntityRef::Id(_) => None,
            EntityRef::Object(obj) => obj
                .name
                .as_deref()
                .or(obj.full_name.as_deref())
                .or(obj.code.as_deref())
                .filter(|s| !s.is_empty()),
        };
        Some(ResolvedRef {
            id: id.to_string(),
            label: label.unwrap_or(id).to_string(),
        })
    }

    pub fn as_object(&self) -> Option<&RefObject> {
        match self {
            EntityRef::Object(obj) => Some(obj),
            EntityRef::Id(_) => None,
        }
    }

    /// True when this reference points at `id`, whichever shape it has.
    pub fn is(&self, id: &str) -> bool {
        !id.is_empty() && self.id() == id
    }
}

impl From<&str> for EntityRef {
    fn from(id: &str) -> Self {
        EntityRef::Id(id.to_string())
    }
}

impl From<String> for EntityRef {
    fn from(id: String) -> Self {
        EntityRef::Id(id)
    }
}

/// Normalize an optional reference field.
pub fn resolve_ref(field: Option<&EntityRef>) -> Option<ResolvedRef> {
    field.and_then(EntityRef::resolve)
}

/// Id of an optional reference field, ignoring empty ids.
pub fn ref_id(field: Option<&EntityRef>) -> Option<&str> {
    field.map(EntityRef::id).filter(|id| !id.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_raw_id() {
        let r: EntityRef = serde_json::from_value(json!("65f1c0a2")).unwrap();
        let resolved = r.resolve().unwrap();
        assert_eq!(resolved.id, "65f1c0a2");
        assert_eq!(resolved.label, "65f1c0a2");
    }

    #[test]
    fn test_resolve_embedded_object() {
        let r: EntityRef = serde_json::from_value(json!({
            "_id": "e1",
            "fullName": "Nguyễn Văn A",
            "email": "a@example.com"
        }))
        .unwrap();
        let resolved = r.resolve().unwrap();
        assert_eq!(resolved.id, "e1");
        assert_eq!(resolved.label, "Nguyễn Văn A");
        assert_eq!(r.as_object().unwrap().nested_str("email"), Some("a@example.com"));
    }

    #[test]
    fn test_name_preferred_over_code() {
        let r: EntityRef =
            serde_json::from_value(json!({ "id": "c1", "name": "Máy tính", "code": "PC" })).unwrap();
        assert_eq!(r.resolve().unwrap().label, "Máy tính");
    }

    #[test]
    fn test_nested_reference() {
        let r: EntityRef = serde_json::from_value(json!({
            "_id": "t1",
            "name": "PC-01",
            "category": { "_id": "cat-pc", "name": "Máy tính" }
        }))
        .unwrap();
        let category = r.as_object().unwrap().nested_ref("category").unwrap();
        assert_eq!(category.id(), "cat-pc");
    }

    #[test]
    fn test_empty_or_missing_resolves_to_none() {
        assert_eq!(resolve_ref(None), None);
        assert_eq!(resolve_ref(Some(&EntityRef::Id(String::new()))), None);
        assert_eq!(ref_id(Some(&EntityRef::Id("  ".into()))), None);
    }
}
