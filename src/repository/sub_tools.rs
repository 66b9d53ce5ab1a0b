//! SubTool endpoints

use serde::Serialize;
use serde_json::Value;
use serde_with::skip_serializing_none;
use uuid::Uuid;

use super::post_assignment;
use crate::{
    client::ApiClient,
    error::AppResult,
    models::{
        sub_tool::{CreateSubTool, SubTool, SubToolFilter, UpdateSubTool},
        AssignRequest, DeletedSubTool, Envelope, RevokeRequest,
    },
};

#[derive(Clone)]
pub struct SubToolsRepository {
    client: ApiClient,
}

impl SubToolsRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &SubToolFilter) -> AppResult<Envelope<Vec<SubTool>>> {
        self.client.get_with("/sub-tool", filter).await
    }

    pub async fn get(&self, id: &str) -> AppResult<Envelope<SubTool>> {
        self.client.get(&format!("/sub-tool/{}", id)).await
    }

    /// SubTools currently attached to a Tool
    pub async fn list_by_parent(&self, tool_id: &str) -> AppResult<Envelope<Vec<SubTool>>> {
        self.client.get(&format!("/sub-tool/parent/{}", tool_id)).await
    }

    pub async fn create(&self, data: &CreateSubTool) -> AppResult<Envelope<SubTool>> {
        self.client.post("/sub-tool", data).await
    }

    pub async fn update(&self, id: &str, data: &UpdateSubTool) -> AppResult<Envelope<SubTool>> {
        self.client.put(&format!("/sub-tool/{}", id), data).await
    }

    pub async fn soft_delete(&self, id: &str) -> AppResult<Envelope<Value>> {
        self.client.delete(&format!("/sub-tool/{}", id)).await
    }

    /// Deleted SubTools (or SubTools holding deleted Accessories), optionally
    /// limited to one parent Tool
    pub async fn list_deleted(&self, parent_tool: Option<&str>) -> AppResult<Envelope<Vec<DeletedSubTool>>> {
        self.client
            .get_with("/sub-tool/deleted", &DeletedQuery { parent_tool })
            .await
    }

    pub async fn assign(&self, request: &AssignRequest, key: Uuid) -> AppResult<Envelope<Value>> {
        post_assignment(&self.client, "/sub-tool", "assign", request.payload(), key).await
    }

    pub async fn revoke(&self, request: &RevokeRequest, key: Uuid) -> AppResult<Envelope<Value>> {
        post_assignment(&self.client, "/sub-tool", "revoke", request.payload(), key).await
    }
}

#[skip_serializing_none]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeletedQuery<'a> {
    parent_tool: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use crate::repository::tests::{repository, RecordingTransport};
    use serde_json::json;

    #[tokio::test]
    async fn test_list_deleted_for_parent() {
        let transport = RecordingTransport::new(json!({
            "success": true,
            "data": [{
                "_id": "s1",
                "name": "Case",
                "parentTool": "t1",
                "isDelete": true,
                "accessories": [{ "_id": "a1", "name": "RAM", "subToolId": "s1", "isDelete": true }]
            }]
        }));
        let repo = repository(transport.clone());

        let rows = repo.sub_tools.list_deleted(Some("t1")).await.unwrap().into_data().unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].accessories.len(), 1);
        let sent = transport.last();
        assert_eq!(sent.path, "/sub-tool/deleted");
        assert_eq!(sent.query, vec![("parentTool".to_string(), "t1".to_string())]);
    }

    #[tokio::test]
    async fn test_list_by_parent_path() {
        let transport = RecordingTransport::new(json!({ "success": true, "data": [] }));
        let repo = repository(transport.clone());

        repo.sub_tools.list_by_parent("t7").await.unwrap();

        assert_eq!(transport.last().path, "/sub-tool/parent/t7");
    }
}
