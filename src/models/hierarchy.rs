//! Tool → SubTool → Accessory trees and destination compatibility

use std::collections::{HashMap, HashSet};

use super::accessory::Accessory;
use super::enums::DeviceStatus;
use super::sub_tool::SubTool;
use super::tool::Tool;

/// SubTool type names that can host accessories (case / chassis types)
pub const ACCESSORY_HOST_TYPES: &[&str] = &["case", "case máy tính", "thùng máy", "cpu"];

pub fn is_accessory_host(type_name: &str) -> bool {
    let normalized = type_name.trim().to_lowercase();
    ACCESSORY_HOST_TYPES.iter().any(|t| *t == normalized)
}

/// Destination Tools for a SubTool transfer: the employee's Tools in the
/// same category as the current parent and currently in use.
pub fn compatible_tools<'a>(
    employee_tools: &'a [Tool],
    employee_id: &str,
    parent_category_id: &str,
) -> Vec<&'a Tool> {
    employee_tools
        .iter()
        .filter(|t| !t.lifecycle.is_delete)
        .filter(|t| t.assignee_id() == Some(employee_id))
        .filter(|t| t.category_id() == Some(parent_category_id))
        .filter(|t| t.status == Some(DeviceStatus::InUse))
        .collect()
}

/// Destination SubTools for an Accessory transfer: host-type SubTools held
/// by the employee directly or through their parent Tool.
///
/// `type_names` resolves type ids for SubTools whose type arrived as a raw id.
pub fn compatible_sub_tools<'a>(
    candidates: &'a [SubTool],
    employee_id: &str,
    employee_tools: &[Tool],
    type_names: &HashMap<String, String>,
) -> Vec<&'a SubTool> {
    let held_tools: HashSet<&str> = employee_tools
        .iter()
        .filter(|t| t.assignee_id() == Some(employee_id))
        .map(|t| t.id.as_str())
        .collect();

    candidates
        .iter()
        .filter(|s| !s.lifecycle.is_delete)
        .filter(|s| {
            let type_name = s.type_name().map(str::to_string).or_else(|| {
                s.sub_tool_type
                    .as_ref()
                    .and_then(|t| type_names.get(t.id()).cloned())
            });
            type_name.map(|n| is_accessory_host(&n)).unwrap_or(false)
        })
        .filter(|s| {
            s.assignee_id() == Some(employee_id)
                || s.parent_assignee_id().as_deref() == Some(employee_id)
                || s.parent_tool_id().map(|p| held_tools.contains(p)).unwrap_or(false)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubToolNode {
    pub sub_tool: SubTool,
    pub accessories: Vec<Accessory>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolNode {
    pub tool: Tool,
    pub sub_tools: Vec<SubToolNode>,
}

/// Accessory whose denormalized `parentToolId` disagrees with its SubTool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleAccessory {
    pub accessory_id: String,
    pub sub_tool_id: String,
    pub recorded_parent: Option<String>,
    pub actual_parent: Option<String>,
}

/// Flat listings grouped into trees by normalized ids
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetTree {
    pub tools: Vec<ToolNode>,
    /// SubTools whose parent Tool was not part of the listing
    pub detached_sub_tools: Vec<SubToolNode>,
    /// Accessories whose SubTool was not part of the listing
    pub detached_accessories: Vec<Accessory>,
}

impl AssetTree {
    pub fn build(tools: Vec<Tool>, sub_tools: Vec<SubTool>, accessories: Vec<Accessory>) -> Self {
        let mut by_sub_tool: HashMap<String, Vec<Accessory>> = HashMap::new();
        let mut detached_accessories = Vec::new();
        let sub_ids: HashSet<String> = sub_tools.iter().map(|s| s.id.clone()).collect();

        for acc in accessories {
            match acc.sub_tool().filter(|id| sub_ids.contains(*id)).map(str::to_string) {
                Some(sub_id) => by_sub_tool.entry(sub_id).or_default().push(acc),
                None => detached_accessories.push(acc),
            }
        }

        let tool_ids: HashSet<String> = tools.iter().map(|t| t.id.clone()).collect();
        let mut by_tool: HashMap<String, Vec<SubToolNode>> = HashMap::new();
        let mut detached_sub_tools = Vec::new();

        for sub in sub_tools {
            let accessories = by_sub_tool.remove(&sub.id).unwrap_or_default();
            let parent = sub.parent_tool_id().filter(|id| tool_ids.contains(*id)).map(str::to_string);
            let node = SubToolNode { sub_tool: sub, accessories };
            match parent {
                Some(tool_id) => by_tool.entry(tool_id).or_default().push(node),
                None => detached_sub_tools.push(node),
            }
        }

        let tools = tools
            .into_iter()
            .map(|tool| {
                let sub_tools = by_tool.remove(&tool.id).unwrap_or_default();
                ToolNode { tool, sub_tools }
            })
            .collect();

        Self {
            tools,
            detached_sub_tools,
            detached_accessories,
        }
    }

    fn sub_tool_nodes(&self) -> impl Iterator<Item = &SubToolNode> {
        self.tools
            .iter()
            .flat_map(|t| t.sub_tools.iter())
            .chain(self.detached_sub_tools.iter())
    }

    pub fn find_sub_tool(&self, id: &str) -> Option<&SubToolNode> {
        self.sub_tool_nodes().find(|n| n.sub_tool.id == id)
    }

    /// Accessories left pointing at a previous grand-parent after a transfer
    pub fn stale_accessories(&self) -> Vec<StaleAccessory> {
        self.sub_tool_nodes()
            .flat_map(|node| {
                let actual = node.sub_tool.parent_tool_id().map(str::to_string);
                node.accessories.iter().filter_map(move |acc| {
                    let recorded = acc.parent_tool().map(str::to_string);
                    (recorded != actual).then(|| StaleAccessory {
                        accessory_id: acc.id.clone(),
                        sub_tool_id: node.sub_tool.id.clone(),
                        recorded_parent: recorded,
                        actual_parent: actual.clone(),
                    })
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool(id: &str, category: &str, status: &str, assignee: Option<&str>) -> Tool {
        serde_json::from_value(json!({
            "_id": id,
            "name": id,
            "category": category,
            "status": status,
            "assignedTo": assignee
        }))
        .unwrap()
    }

    fn sub_tool(id: &str, parent: &str, type_ref: serde_json::Value, assignee: Option<&str>) -> SubTool {
        serde_json::from_value(json!({
            "_id": id,
            "name": id,
            "parentTool": parent,
            "subToolType": type_ref,
            "assignedTo": assignee
        }))
        .unwrap()
    }

    fn accessory(id: &str, sub: &str, parent: &str) -> Accessory {
        serde_json::from_value(json!({
            "_id": id,
            "name": id,
            "subToolId": sub,
            "parentToolId": parent
        }))
        .unwrap()
    }

    #[test]
    fn test_compatible_tools_exact_subset() {
        let tools = vec![
            tool("t1", "pc", "Đang sử dụng", Some("e2")),
            tool("t2", "pc", "Đang sử dụng", Some("e2")),
            tool("t3", "pc", "Khả dụng", Some("e2")),
            tool("t4", "printer", "Đang sử dụng", Some("e2")),
            tool("t5", "pc", "Đang sử dụng", Some("e9")),
        ];
        let ids: Vec<_> = compatible_tools(&tools, "e2", "pc").iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
    }

    #[test]
    fn test_compatible_tools_empty_when_no_match() {
        let tools = vec![tool("t4", "printer", "Đang sử dụng", Some("e2"))];
        assert!(compatible_tools(&tools, "e2", "pc").is_empty());
    }

    #[test]
    fn test_compatible_sub_tools_by_type_and_holder() {
        let employee_tools = vec![tool("t2", "pc", "Đang sử dụng", Some("e2"))];
        let candidates = vec![
            sub_tool("s2", "t2", json!({ "_id": "type-case", "name": "Case" }), None),
            sub_tool("s3", "t2", json!({ "_id": "type-screen", "name": "Màn hình" }), None),
            sub_tool("s4", "t9", json!("type-case-id"), Some("e2")),
            sub_tool("s5", "t9", json!({ "_id": "type-case", "name": "Case" }), None),
        ];
        let mut names = HashMap::new();
        names.insert("type-case-id".to_string(), "Thùng máy".to_string());

        let ids: Vec<_> = compatible_sub_tools(&candidates, "e2", &employee_tools, &names)
            .iter()
            .map(|s| s.id.clone())
            .collect();
        assert_eq!(ids, vec!["s2", "s4"]);
    }

    #[test]
    fn test_host_type_names_are_case_insensitive() {
        assert!(is_accessory_host("CASE"));
        assert!(is_accessory_host(" Case máy tính "));
        assert!(!is_accessory_host("Bàn phím"));
    }

    #[test]
    fn test_build_tree_and_detect_stale_accessories() {
        let tools = vec![tool("t1", "pc", "Đang sử dụng", None), tool("t2", "pc", "Đang sử dụng", None)];
        let subs = vec![
            sub_tool("s1", "t1", json!("case"), None),
            sub_tool("s2", "t2", json!("case"), None),
            sub_tool("s9", "t-missing", json!("case"), None),
        ];
        let accs = vec![
            accessory("a1", "s1", "t1"),
            accessory("a2", "s2", "t1"),
            accessory("a3", "s-missing", "t1"),
        ];

        let tree = AssetTree::build(tools, subs, accs);
        assert_eq!(tree.tools.len(), 2);
        assert_eq!(tree.tools[0].sub_tools.len(), 1);
        assert_eq!(tree.detached_sub_tools.len(), 1);
        assert_eq!(tree.detached_accessories.len(), 1);
        assert_eq!(tree.find_sub_tool("s2").unwrap().accessories.len(), 1);

        let stale = tree.stale_accessories();
        assert_eq!(
            stale,
            vec![StaleAccessory {
                accessory_id: "a2".into(),
                sub_tool_id: "s2".into(),
                recorded_parent: Some("t1".into()),
                actual_parent: Some("t2".into()),
            }]
        );
    }
}
