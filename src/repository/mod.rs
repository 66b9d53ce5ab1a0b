//! Repository layer: typed façades over the REST endpoints
//!
//! No validation happens here; callers check their inputs before invoking.

pub mod accessories;
pub mod categories;
pub mod employees;
pub mod positions;
pub mod sub_tools;
pub mod tools;

use serde_json::Value;
use uuid::Uuid;

use crate::{
    client::{ApiClient, ApiRequest},
    error::AppResult,
    models::{AssetKind, AssignRequest, Envelope, RevokeRequest},
};

/// Header carrying the per-submission idempotency token
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Main repository struct holding the API client
#[derive(Clone)]
pub struct Repository {
    pub client: ApiClient,
    pub tools: tools::ToolsRepository,
    pub sub_tools: sub_tools::SubToolsRepository,
    pub accessories: accessories::AccessoriesRepository,
    pub employees: employees::EmployeesRepository,
    pub positions: positions::PositionsRepository,
    pub categories: categories::CategoriesRepository,
}

impl Repository {
    /// Create a new repository over the given client
    pub fn new(client: ApiClient) -> Self {
        Self {
            tools: tools::ToolsRepository::new(client.clone()),
            sub_tools: sub_tools::SubToolsRepository::new(client.clone()),
            accessories: accessories::AccessoriesRepository::new(client.clone()),
            employees: employees::EmployeesRepository::new(client.clone()),
            positions: positions::PositionsRepository::new(client.clone()),
            categories: categories::CategoriesRepository::new(client.clone()),
            client,
        }
    }

    /// Assign or transfer at the level named by the request
    pub async fn assign(&self, request: &AssignRequest, key: Uuid) -> AppResult<Envelope<Value>> {
        match request.kind {
            AssetKind::Tool => self.tools.assign(request, key).await,
            AssetKind::SubTool => self.sub_tools.assign(request, key).await,
            AssetKind::Accessory => self.accessories.assign(request, key).await,
        }
    }

    /// Revoke at the level named by the request
    pub async fn revoke(&self, request: &RevokeRequest, key: Uuid) -> AppResult<Envelope<Value>> {
        match request.kind {
            AssetKind::Tool => self.tools.revoke(request, key).await,
            AssetKind::SubTool => self.sub_tools.revoke(request, key).await,
            AssetKind::Accessory => self.accessories.revoke(request, key).await,
        }
    }
}

pub(crate) async fn post_assignment(
    client: &ApiClient,
    collection: &str,
    action: &str,
    payload: Value,
    key: Uuid,
) -> AppResult<Envelope<Value>> {
    let request = ApiRequest::post(format!("{}/{}", collection, action))
        .json(&payload)?
        .header(IDEMPOTENCY_HEADER, key.to_string());
    client.execute(request).await
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::client::{ApiResponse, Body, MemoryTokenStore, Method, Session, Tokens, Transport};
    use crate::error::AppResult;
    use crate::models::Condition;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Records every request and answers with a canned body
    pub(crate) struct RecordingTransport {
        pub requests: Mutex<Vec<ApiRequest>>,
        response: Value,
    }

    impl RecordingTransport {
        pub(crate) fn new(response: Value) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                response,
            })
        }

        pub(crate) fn last(&self) -> ApiRequest {
            self.requests.lock().unwrap().last().cloned().expect("no request sent")
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: &ApiRequest, _bearer: Option<&str>) -> AppResult<ApiResponse> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(ApiResponse::new(200, self.response.clone()))
        }
    }

    pub(crate) fn repository(transport: Arc<RecordingTransport>) -> Repository {
        let session = Session::new(Arc::new(MemoryTokenStore::new(Tokens {
            access_token: Some("a1".into()),
            refresh_token: Some("r1".into()),
        })))
        .unwrap();
        Repository::new(ApiClient::new(transport, Arc::new(session)))
    }

    #[tokio::test]
    async fn test_assign_posts_to_level_collection_with_idempotency_key() {
        let transport = RecordingTransport::new(json!({
            "success": true,
            "data": {},
            "changes": { "transferred": true, "accessorysUpdated": 3 }
        }));
        let repo = repository(transport.clone());
        let key = Uuid::new_v4();

        let env = repo
            .assign(
                &AssignRequest {
                    kind: AssetKind::SubTool,
                    asset_id: "s1".into(),
                    employee_id: "e2".into(),
                    destination_id: Some("t2".into()),
                    condition: Condition::New,
                    notes: None,
                },
                key,
            )
            .await
            .unwrap();

        assert_eq!(env.cascade_count(), Some(3));
        let sent = transport.last();
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.path, "/sub-tool/assign");
        assert!(sent
            .headers
            .contains(&(IDEMPOTENCY_HEADER.to_string(), key.to_string())));
        assert_eq!(
            sent.body,
            Body::Json(json!({ "subToolId": "s1", "employeeId": "e2", "targetToolId": "t2", "condition": "Mới" }))
        );
    }

    #[tokio::test]
    async fn test_revoke_posts_to_level_collection() {
        let transport = RecordingTransport::new(json!({ "success": true }));
        let repo = repository(transport.clone());

        repo.revoke(
            &RevokeRequest {
                kind: AssetKind::Accessory,
                asset_id: "a1".into(),
                condition: Condition::Used,
                notes: Some("Trả lại kho".into()),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let sent = transport.last();
        assert_eq!(sent.path, "/accessory/revoke");
        assert_eq!(
            sent.body,
            Body::Json(json!({ "accessoryId": "a1", "condition": "Cũ", "notes": "Trả lại kho" }))
        );
    }
}
