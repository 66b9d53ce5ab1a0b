//! Employee endpoints

use serde_json::Value;

use crate::{
    client::ApiClient,
    error::AppResult,
    models::{
        employee::{CreateEmployee, Employee, EmployeeFilter, UpdateEmployee},
        Envelope,
    },
};

#[derive(Clone)]
pub struct EmployeesRepository {
    client: ApiClient,
}

impl EmployeesRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &EmployeeFilter) -> AppResult<Envelope<Vec<Employee>>> {
        self.client.get_with("/employees", filter).await
    }

    pub async fn get(&self, id: &str) -> AppResult<Envelope<Employee>> {
        self.client.get(&format!("/employees/{}", id)).await
    }

    pub async fn create(&self, data: &CreateEmployee) -> AppResult<Envelope<Employee>> {
        self.client.post("/employees", data).await
    }

    pub async fn update(&self, id: &str, data: &UpdateEmployee) -> AppResult<Envelope<Employee>> {
        self.client.put(&format!("/employees/{}", id), data).await
    }

    pub async fn soft_delete(&self, id: &str) -> AppResult<Envelope<Value>> {
        self.client.delete(&format!("/employees/{}", id)).await
    }
}
