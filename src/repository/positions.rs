//! Position endpoints

use serde_json::Value;

use crate::{
    client::ApiClient,
    error::AppResult,
    models::{
        position::{CreatePosition, Position, PositionFilter, UpdatePosition},
        Envelope,
    },
};

#[derive(Clone)]
pub struct PositionsRepository {
    client: ApiClient,
}

impl PositionsRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &PositionFilter) -> AppResult<Envelope<Vec<Position>>> {
        self.client.get_with("/positions", filter).await
    }

    pub async fn get(&self, id: &str) -> AppResult<Envelope<Position>> {
        self.client.get(&format!("/positions/{}", id)).await
    }

    pub async fn create(&self, data: &CreatePosition) -> AppResult<Envelope<Position>> {
        self.client.post("/positions", data).await
    }

    pub async fn update(&self, id: &str, data: &UpdatePosition) -> AppResult<Envelope<Position>> {
        self.client.put(&format!("/positions/{}", id), data).await
    }

    pub async fn soft_delete(&self, id: &str) -> AppResult<Envelope<Value>> {
        self.client.delete(&format!("/positions/{}", id)).await
    }
}
