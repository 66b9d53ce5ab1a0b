//! Employee directory

use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        employee::{CreateEmployee, EmployeeFilter, UpdateEmployee},
        Employee, ResolvedRef,
    },
    repository::Repository,
};

use super::fetch::load_or_empty;

/// Upper bound for dropdown option lists
const OPTIONS_LIMIT: u32 = 1000;

#[derive(Clone)]
pub struct EmployeeDirectory {
    repository: Repository,
}

impl EmployeeDirectory {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, filter: &EmployeeFilter) -> AppResult<Vec<Employee>> {
        Ok(self.repository.employees.list(filter).await?.data.unwrap_or_default())
    }

    pub async fn get(&self, id: &str) -> AppResult<Employee> {
        self.repository.employees.get(id).await?.into_data()
    }

    /// Employees as id/label pairs for pickers. Never fails: a backend
    /// error yields an empty list.
    pub async fn options(&self, search: Option<&str>) -> Vec<ResolvedRef> {
        let filter = EmployeeFilter {
            search: search.map(str::to_string),
            limit: Some(OPTIONS_LIMIT),
            ..Default::default()
        };
        let mut options: Vec<ResolvedRef> = load_or_empty("employees", self.list(&filter))
            .await
            .into_iter()
            .map(|e| ResolvedRef {
                label: if e.code.is_empty() {
                    e.full_name
                } else {
                    format!("{} ({})", e.full_name, e.code)
                },
                id: e.id,
            })
            .collect();
        options.sort_by(|a, b| a.label.cmp(&b.label));
        options
    }

    pub async fn create(&self, form: &CreateEmployee) -> AppResult<Employee> {
        form.validate()?;
        let employee = self.repository.employees.create(form).await?.into_data()?;
        tracing::info!("Created employee {}", employee.id);
        Ok(employee)
    }

    pub async fn update(&self, id: &str, changes: &UpdateEmployee) -> AppResult<Employee> {
        self.repository.employees.update(id, changes).await?.into_data()
    }

    pub async fn remove(&self, id: &str) -> AppResult<()> {
        self.repository.employees.soft_delete(id).await?;
        tracing::info!("Deleted employee {}", id);
        Ok(())
    }
}
