//! Response envelope shared by every endpoint

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Pagination fields the backend adds next to `data` on list endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: Option<u64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub total_pages: Option<u32>,
}

/// Side effects of an assign/transfer call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferChanges {
    /// The asset changed parent container
    #[serde(default)]
    pub transferred: bool,
    /// Accessories whose parent references were rewritten along with a SubTool
    pub accessorys_updated: Option<u32>,
}

/// Descendants restored along with the requested node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreCascade {
    #[serde(default)]
    pub sub_tools: u32,
    #[serde(default)]
    pub accessories: u32,
}

impl RestoreCascade {
    pub fn total(&self) -> u32 {
        self.sub_tools + self.accessories
    }
}

/// `{ success, data, message?, ...pagination }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(flatten)]
    pub pagination: Pagination,
    pub changes: Option<TransferChanges>,
    /// Some deployments report the cascade count outside of `changes`
    pub accessorys_updated: Option<u32>,
    pub restored: Option<RestoreCascade>,
}

impl<T> Envelope<T> {
    /// The `data` payload, failing when the server omitted it
    pub fn into_data(self) -> AppResult<T> {
        self.data
            .ok_or_else(|| AppError::Decode("response envelope carries no data".to_string()))
    }

    pub fn transferred(&self) -> bool {
        self.changes.as_ref().map(|c| c.transferred).unwrap_or(false)
    }

    /// Number of accessories cascade-updated by a SubTool transfer.
    /// `None` when absent or zero.
    pub fn cascade_count(&self) -> Option<u32> {
        self.changes
            .as_ref()
            .and_then(|c| c.accessorys_updated)
            .or(self.accessorys_updated)
            .filter(|n| *n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_envelope_with_pagination() {
        let env: Envelope<Vec<String>> = serde_json::from_value(json!({
            "success": true,
            "data": ["a", "b"],
            "total": 42,
            "page": 2,
            "limit": 20,
            "totalPages": 3
        }))
        .unwrap();
        assert!(env.success);
        assert_eq!(env.pagination.total, Some(42));
        assert_eq!(env.pagination.total_pages, Some(3));
        assert_eq!(env.into_data().unwrap().len(), 2);
    }

    #[test]
    fn test_cascade_count_zero_or_missing_is_none() {
        let env: Envelope<serde_json::Value> = serde_json::from_value(json!({
            "success": true,
            "changes": { "transferred": true, "accessorysUpdated": 0 }
        }))
        .unwrap();
        assert!(env.transferred());
        assert_eq!(env.cascade_count(), None);

        let env: Envelope<serde_json::Value> =
            serde_json::from_value(json!({ "success": true, "changes": { "transferred": false } })).unwrap();
        assert_eq!(env.cascade_count(), None);
    }

    #[test]
    fn test_cascade_count_positive_from_either_place() {
        let env: Envelope<serde_json::Value> = serde_json::from_value(json!({
            "success": true,
            "changes": { "transferred": true, "accessorysUpdated": 4 }
        }))
        .unwrap();
        assert_eq!(env.cascade_count(), Some(4));

        let env: Envelope<serde_json::Value> =
            serde_json::from_value(json!({ "success": true, "accessorysUpdated": 2 })).unwrap();
        assert_eq!(env.cascade_count(), Some(2));
    }

    #[test]
    fn test_missing_data_is_decode_error() {
        let env: Envelope<String> = serde_json::from_value(json!({ "success": false })).unwrap();
        assert!(matches!(env.into_data(), Err(AppError::Decode(_))));
    }
}
