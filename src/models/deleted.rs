//! Soft-deleted items as listed by the recovery endpoints

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull};

use super::accessory::Accessory;
use super::enums::AssetKind;
use super::sub_tool::SubTool;
use super::tool::Tool;

/// Rolled-up count of deleted descendants of a Tool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildrenCount {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub sub_tools: u32,
    #[serde(default)]
    pub accessories: u32,
}

impl ChildrenCount {
    pub fn new(sub_tools: u32, accessories: u32) -> Self {
        Self {
            total: sub_tools + accessories,
            sub_tools,
            accessories,
        }
    }

    /// Recompute the rollup from a detail listing
    pub fn from_detail(sub_tools: &[DeletedSubTool]) -> Self {
        let deleted_sub_tools = sub_tools
            .iter()
            .filter(|s| s.sub_tool.lifecycle.is_delete)
            .count() as u32;
        let deleted_accessories = sub_tools
            .iter()
            .flat_map(|s| s.accessories.iter())
            .filter(|a| a.lifecycle.is_delete)
            .count() as u32;
        Self::new(deleted_sub_tools, deleted_accessories)
    }
}

/// Row of `GET /tools/deleted`
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedTool {
    #[serde(flatten)]
    pub tool: Tool,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub children_count: ChildrenCount,
}

/// Row of `GET /sub-tool/deleted`: a SubTool that is deleted itself or
/// still holds deleted Accessories, with those Accessories nested.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedSubTool {
    #[serde(flatten)]
    pub sub_tool: SubTool,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default, alias = "deletedAccessories")]
    pub accessories: Vec<Accessory>,
}

/// Identity of any node in the hierarchy, as the backend's `{id, type}`
/// contract expects it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    pub kind: AssetKind,
    pub id: String,
}

impl AssetKey {
    pub fn new(kind: AssetKind, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }

    pub fn tool(id: impl Into<String>) -> Self {
        Self::new(AssetKind::Tool, id)
    }

    pub fn sub_tool(id: impl Into<String>) -> Self {
        Self::new(AssetKind::SubTool, id)
    }

    pub fn accessory(id: impl Into<String>) -> Self {
        Self::new(AssetKind::Accessory, id)
    }

    /// Body of restore / permanent-delete calls
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({ "type": self.kind.wire_type() })
    }
}

impl std::fmt::Display for AssetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind.wire_type(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deleted_sub(id: &str, deleted: bool, accessories: &[(&str, bool)]) -> DeletedSubTool {
        serde_json::from_value(json!({
            "_id": id,
            "name": id,
            "parentTool": "t1",
            "isDelete": deleted,
            "accessories": accessories
                .iter()
                .map(|(aid, d)| json!({ "_id": aid, "name": aid, "subToolId": id, "isDelete": d }))
                .collect::<Vec<_>>()
        }))
        .unwrap()
    }

    #[test]
    fn test_null_nested_lists_decode_as_empty() {
        let row: DeletedSubTool = serde_json::from_value(json!({
            "_id": "s1",
            "name": "Case",
            "isDelete": true,
            "accessories": null
        }))
        .unwrap();
        assert!(row.accessories.is_empty());

        let tool: DeletedTool = serde_json::from_value(json!({
            "_id": "t1",
            "name": "PC",
            "childrenCount": null
        }))
        .unwrap();
        assert_eq!(tool.children_count, ChildrenCount::default());
    }

    #[test]
    fn test_rollup_two_sub_tools_three_accessories() {
        let detail = vec![
            deleted_sub("s1", true, &[("a1", true), ("a2", true)]),
            deleted_sub("s2", true, &[("a3", true)]),
        ];
        assert_eq!(
            ChildrenCount::from_detail(&detail),
            ChildrenCount { total: 5, sub_tools: 2, accessories: 3 }
        );
    }

    #[test]
    fn test_live_sub_tool_holding_deleted_accessory() {
        let detail = vec![deleted_sub("s1", false, &[("a1", true)])];
        assert_eq!(ChildrenCount::from_detail(&detail), ChildrenCount::new(0, 1));
    }

    #[test]
    fn test_deleted_tool_row() {
        let row: DeletedTool = serde_json::from_value(json!({
            "_id": "t1",
            "name": "PC-01",
            "isDelete": true,
            "deletedAt": "2024-05-01T08:00:00Z",
            "childrenCount": { "total": 5, "subTools": 2, "accessories": 3 }
        }))
        .unwrap();
        assert!(row.tool.lifecycle.is_delete);
        assert!(row.tool.lifecycle.deleted_at.is_some());
        assert_eq!(row.children_count, ChildrenCount::new(2, 3));
    }

    #[test]
    fn test_asset_key_body() {
        assert_eq!(AssetKey::sub_tool("s1").body(), json!({ "type": "subtool" }));
    }
}
