//! Accessory endpoints, including image storage

use serde_json::Value;
use uuid::Uuid;

use super::post_assignment;
use crate::{
    client::{ApiClient, ApiRequest, FilePart},
    error::AppResult,
    models::{
        accessory::{Accessory, AccessoryFilter, CreateAccessory, UpdateAccessory, UploadedImages},
        AssignRequest, Envelope, RevokeRequest,
    },
};

#[derive(Clone)]
pub struct AccessoriesRepository {
    client: ApiClient,
}

impl AccessoriesRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &AccessoryFilter) -> AppResult<Envelope<Vec<Accessory>>> {
        self.client.get_with("/accessory", filter).await
    }

    pub async fn get(&self, id: &str) -> AppResult<Envelope<Accessory>> {
        self.client.get(&format!("/accessory/{}", id)).await
    }

    /// Accessories currently attached to a SubTool
    pub async fn list_by_sub_tool(&self, sub_tool_id: &str) -> AppResult<Envelope<Vec<Accessory>>> {
        self.client.get(&format!("/accessory/subtool/{}", sub_tool_id)).await
    }

    pub async fn create(&self, data: &CreateAccessory) -> AppResult<Envelope<Accessory>> {
        self.client.post("/accessory", data).await
    }

    pub async fn update(&self, id: &str, data: &UpdateAccessory) -> AppResult<Envelope<Accessory>> {
        self.client.put(&format!("/accessory/{}", id), data).await
    }

    pub async fn soft_delete(&self, id: &str) -> AppResult<Envelope<Value>> {
        self.client.delete(&format!("/accessory/{}", id)).await
    }

    pub async fn assign(&self, request: &AssignRequest, key: Uuid) -> AppResult<Envelope<Value>> {
        post_assignment(&self.client, "/accessory", "assign", request.payload(), key).await
    }

    pub async fn revoke(&self, request: &RevokeRequest, key: Uuid) -> AppResult<Envelope<Value>> {
        post_assignment(&self.client, "/accessory", "revoke", request.payload(), key).await
    }

    /// Upload image files in one multipart call; returns the stored references
    pub async fn upload_images(&self, files: Vec<FilePart>) -> AppResult<Envelope<UploadedImages>> {
        let request = ApiRequest::post("/accessory/upload-images").multipart(files);
        self.client.execute(request).await
    }

    /// Delete one stored image by file name
    pub async fn delete_image(&self, filename: &str) -> AppResult<Envelope<Value>> {
        self.client.delete(&format!("/accessory/images/{}", filename)).await
    }
}
