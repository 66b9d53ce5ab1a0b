//! Tool endpoints, plus the recovery endpoints shared by all levels

use serde_json::Value;
use uuid::Uuid;

use super::post_assignment;
use crate::{
    client::ApiClient,
    error::AppResult,
    models::{
        tool::{CreateTool, Tool, ToolFilter, UpdateTool},
        AssetKey, AssignRequest, DeletedTool, Envelope, RevokeRequest,
    },
};

#[derive(Clone)]
pub struct ToolsRepository {
    client: ApiClient,
}

impl ToolsRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// List tools
    pub async fn list(&self, filter: &ToolFilter) -> AppResult<Envelope<Vec<Tool>>> {
        self.client.get_with("/tools", filter).await
    }

    /// Get tool by ID
    pub async fn get(&self, id: &str) -> AppResult<Envelope<Tool>> {
        self.client.get(&format!("/tools/{}", id)).await
    }

    pub async fn create(&self, data: &CreateTool) -> AppResult<Envelope<Tool>> {
        self.client.post("/tools", data).await
    }

    pub async fn update(&self, id: &str, data: &UpdateTool) -> AppResult<Envelope<Tool>> {
        self.client.put(&format!("/tools/{}", id), data).await
    }

    /// Soft delete: the record is flagged and kept for restore
    pub async fn soft_delete(&self, id: &str) -> AppResult<Envelope<Value>> {
        self.client.delete(&format!("/tools/{}", id)).await
    }

    /// Restore any level; the backend cascades to descendants
    pub async fn restore(&self, key: &AssetKey) -> AppResult<Envelope<Value>> {
        self.client
            .patch(&format!("/tools/{}/restore", key.id), &key.body())
            .await
    }

    /// Irreversible delete of any level, cascading to descendants
    pub async fn permanent_delete(&self, key: &AssetKey) -> AppResult<Envelope<Value>> {
        self.client
            .delete_with(&format!("/tools/{}/permanent", key.id), &key.body())
            .await
    }

    /// Soft-deleted tools with their rolled-up descendant counts
    pub async fn list_deleted(&self) -> AppResult<Envelope<Vec<DeletedTool>>> {
        self.client.get("/tools/deleted").await
    }

    pub async fn assign(&self, request: &AssignRequest, key: Uuid) -> AppResult<Envelope<Value>> {
        post_assignment(&self.client, "/tools", "assign", request.payload(), key).await
    }

    pub async fn revoke(&self, request: &RevokeRequest, key: Uuid) -> AppResult<Envelope<Value>> {
        post_assignment(&self.client, "/tools", "revoke", request.payload(), key).await
    }
}

#[cfg(test)]
mod tests {
    use crate::client::{Body, Method};
    use crate::models::{tool::ToolFilter, AssetKey, DeviceStatus};
    use crate::repository::tests::{repository, RecordingTransport};
    use serde_json::json;

    #[tokio::test]
    async fn test_list_sends_filters_as_query() {
        let transport = RecordingTransport::new(json!({
            "success": true,
            "data": [{ "_id": "t1", "name": "PC-01", "status": "Đang sử dụng" }],
            "total": 1
        }));
        let repo = repository(transport.clone());

        let env = repo
            .tools
            .list(&ToolFilter {
                assigned_to: Some("e1".into()),
                status: Some(DeviceStatus::InUse),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(env.pagination.total, Some(1));
        assert_eq!(env.into_data().unwrap()[0].id, "t1");
        let sent = transport.last();
        assert_eq!(sent.path, "/tools");
        assert!(sent.query.contains(&("assignedTo".into(), "e1".into())));
        assert!(sent.query.contains(&("status".into(), "Đang sử dụng".into())));
    }

    #[tokio::test]
    async fn test_restore_and_purge_carry_type() {
        let transport = RecordingTransport::new(json!({ "success": true }));
        let repo = repository(transport.clone());

        repo.tools.restore(&AssetKey::accessory("a9")).await.unwrap();
        let sent = transport.last();
        assert_eq!(sent.method, Method::Patch);
        assert_eq!(sent.path, "/tools/a9/restore");
        assert_eq!(sent.body, Body::Json(json!({ "type": "accessory" })));

        repo.tools.permanent_delete(&AssetKey::tool("t1")).await.unwrap();
        let sent = transport.last();
        assert_eq!(sent.method, Method::Delete);
        assert_eq!(sent.path, "/tools/t1/permanent");
        assert_eq!(sent.body, Body::Json(json!({ "type": "tool" })));
    }
}
