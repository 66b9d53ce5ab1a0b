//! Position editing and the permission checklist

use std::sync::Arc;

use async_trait::async_trait;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        position::{CreatePosition, PositionFilter, UpdatePosition},
        Permission, PermissionSet, Position,
    },
    repository::Repository,
};

use super::notify::Notifier;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PositionStore: Send + Sync {
    async fn list(&self, filter: PositionFilter) -> AppResult<Vec<Position>>;

    async fn create(&self, data: CreatePosition) -> AppResult<Position>;

    async fn update(&self, id: String, data: UpdatePosition) -> AppResult<Position>;

    async fn remove(&self, id: String) -> AppResult<()>;
}

#[async_trait]
impl PositionStore for Repository {
    async fn list(&self, filter: PositionFilter) -> AppResult<Vec<Position>> {
        Ok(self.positions.list(&filter).await?.data.unwrap_or_default())
    }

    async fn create(&self, data: CreatePosition) -> AppResult<Position> {
        self.positions.create(&data).await?.into_data()
    }

    async fn update(&self, id: String, data: UpdatePosition) -> AppResult<Position> {
        self.positions.update(&id, &data).await?.into_data()
    }

    async fn remove(&self, id: String) -> AppResult<()> {
        self.positions.soft_delete(&id).await.map(|_| ())
    }
}

/// Every catalog permission with whether `granted` holds it, in catalog order
pub fn checklist(granted: &PermissionSet) -> Vec<(Permission, bool)> {
    Permission::ALL
        .iter()
        .map(|p| (*p, granted.allows(*p)))
        .collect()
}

pub struct PositionEditor {
    store: Arc<dyn PositionStore>,
    notifier: Arc<dyn Notifier>,
}

impl PositionEditor {
    pub fn new(store: Arc<dyn PositionStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Positions sorted by display order, then name
    pub async fn list(&self, filter: PositionFilter) -> AppResult<Vec<Position>> {
        let mut positions = self.store.list(filter).await?;
        positions.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
        Ok(positions)
    }

    pub async fn create(&self, form: CreatePosition) -> AppResult<Position> {
        let result = match form.validate() {
            Ok(()) => self.store.create(form).await,
            Err(e) => Err(e.into()),
        };
        self.finish(result, "Đã tạo chức vụ")
    }

    pub async fn update(&self, id: &str, changes: UpdatePosition) -> AppResult<Position> {
        let result = match Self::check_update(&changes) {
            Ok(()) => self.store.update(id.to_string(), changes).await,
            Err(e) => Err(e),
        };
        self.finish(result, "Đã cập nhật chức vụ")
    }

    pub async fn remove(&self, position: &Position) -> AppResult<()> {
        match self.store.remove(position.id.clone()).await {
            Ok(()) => {
                self.notifier.success(&format!("Đã xóa chức vụ {}", position.name));
                Ok(())
            }
            Err(e) => {
                self.notifier.failure("Deleting position", &e);
                Err(e)
            }
        }
    }

    fn check_update(changes: &UpdatePosition) -> AppResult<()> {
        if changes.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::Validation("Tên chức vụ là bắt buộc".to_string()));
        }
        if changes.department.as_deref().is_some_and(|d| d.trim().is_empty()) {
            return Err(AppError::Validation("Phòng ban là bắt buộc".to_string()));
        }
        if changes.order.is_some_and(|o| o > 1000) {
            return Err(AppError::Validation("Thứ tự không hợp lệ".to_string()));
        }
        Ok(())
    }

    fn finish(&self, result: AppResult<Position>, done: &str) -> AppResult<Position> {
        match result {
            Ok(position) => {
                tracing::info!(
                    "Position {} saved with {} permissions",
                    position.id,
                    position.permissions.len()
                );
                self.notifier.success(&format!("{} {}", done, position.name));
                Ok(position)
            }
            Err(e) => {
                self.notifier.failure("Saving position", &e);
                Err(e)
            }
        }
    }
}
