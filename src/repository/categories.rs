//! Reference-data lookups used by forms and compatibility checks

use crate::{
    client::ApiClient,
    error::AppResult,
    models::{Category, Envelope},
};

#[derive(Clone)]
pub struct CategoriesRepository {
    client: ApiClient,
}

impl CategoriesRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn tool_categories(&self) -> AppResult<Envelope<Vec<Category>>> {
        self.client.get("/categories").await
    }

    pub async fn sub_tool_types(&self) -> AppResult<Envelope<Vec<Category>>> {
        self.client.get("/sub-tool-types").await
    }

    pub async fn accessory_types(&self) -> AppResult<Envelope<Vec<Category>>> {
        self.client.get("/accessory-types").await
    }

    pub async fn departments(&self) -> AppResult<Envelope<Vec<Category>>> {
        self.client.get("/departments").await
    }

    pub async fn units(&self) -> AppResult<Envelope<Vec<Category>>> {
        self.client.get("/units").await
    }
}
