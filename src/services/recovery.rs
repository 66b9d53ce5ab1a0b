//! Deleted-items recovery browser
//!
//! Lists soft-deleted Tools, drills into their deleted descendants and
//! restores or purges any node by `{kind, id}`. Every action closes the
//! detail view and reloads the list from the backend.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{
        envelope::RestoreCascade, AssetKey, AssetKind, ChildrenCount, DeletedSubTool, DeletedTool,
        Envelope, Permission, PermissionSet,
    },
    repository::Repository,
};

use super::notify::Notifier;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecoveryGateway: Send + Sync {
    async fn deleted_tools(&self) -> AppResult<Vec<DeletedTool>>;

    /// Deleted SubTools of a Tool, and SubTools still holding deleted Accessories
    async fn deleted_children(&self, tool_id: &str) -> AppResult<Vec<DeletedSubTool>>;

    async fn restore(&self, key: AssetKey) -> AppResult<Envelope<Value>>;

    async fn permanent_delete(&self, key: AssetKey) -> AppResult<Envelope<Value>>;
}

#[async_trait]
impl RecoveryGateway for Repository {
    async fn deleted_tools(&self) -> AppResult<Vec<DeletedTool>> {
        Ok(self.tools.list_deleted().await?.data.unwrap_or_default())
    }

    async fn deleted_children(&self, tool_id: &str) -> AppResult<Vec<DeletedSubTool>> {
        Ok(self
            .sub_tools
            .list_deleted(Some(tool_id))
            .await?
            .data
            .unwrap_or_default())
    }

    async fn restore(&self, key: AssetKey) -> AppResult<Envelope<Value>> {
        self.tools.restore(&key).await
    }

    async fn permanent_delete(&self, key: AssetKey) -> AppResult<Envelope<Value>> {
        self.tools.permanent_delete(&key).await
    }
}

/// An opened deleted Tool with its deleted descendants
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedToolDetail {
    pub tool: DeletedTool,
    pub sub_tools: Vec<DeletedSubTool>,
}

impl DeletedToolDetail {
    pub fn counts(&self) -> ChildrenCount {
        ChildrenCount::from_detail(&self.sub_tools)
    }
}

/// Confirmation token for an irreversible delete.
///
/// Only [`RecoveryBrowser::request_permanent_delete`] creates one, so the
/// purge call cannot be issued without going through the confirmation step.
#[derive(Debug, PartialEq, Eq)]
pub struct PendingPurge {
    key: AssetKey,
    label: String,
}

impl PendingPurge {
    pub fn key(&self) -> &AssetKey {
        &self.key
    }

    pub fn prompt(&self) -> String {
        format!(
            "Xóa vĩnh viễn {} \"{}\" cùng toàn bộ dữ liệu con? Thao tác này không thể hoàn tác.",
            self.key.kind.to_string().to_lowercase(),
            self.label
        )
    }
}

pub struct RecoveryBrowser {
    gateway: Arc<dyn RecoveryGateway>,
    notifier: Arc<dyn Notifier>,
    permissions: PermissionSet,
    rows: Vec<DeletedTool>,
    detail: Option<DeletedToolDetail>,
    loading: bool,
    in_flight: bool,
}

impl RecoveryBrowser {
    pub fn new(
        gateway: Arc<dyn RecoveryGateway>,
        notifier: Arc<dyn Notifier>,
        permissions: PermissionSet,
    ) -> Self {
        Self {
            gateway,
            notifier,
            permissions,
            rows: Vec::new(),
            detail: None,
            loading: false,
            in_flight: false,
        }
    }

    pub fn rows(&self) -> &[DeletedTool] {
        &self.rows
    }

    pub fn detail(&self) -> Option<&DeletedToolDetail> {
        self.detail.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    pub fn can_restore(&self) -> bool {
        self.permissions.allows(Permission::RestoreTool)
    }

    pub fn can_purge(&self) -> bool {
        self.permissions.allows(Permission::PermanentDeleteTool)
    }

    /// Fetch the deleted Tools list
    pub async fn load(&mut self) -> AppResult<()> {
        self.loading = true;
        let result = self.gateway.deleted_tools().await;
        self.loading = false;
        match result {
            Ok(rows) => {
                tracing::debug!("Loaded {} deleted tools", rows.len());
                self.rows = rows;
                Ok(())
            }
            Err(e) => {
                self.notifier.failure("Loading deleted tools", &e);
                Err(e)
            }
        }
    }

    /// Open the detail view of a deleted Tool
    pub async fn open(&mut self, tool_id: &str) -> AppResult<&DeletedToolDetail> {
        let tool = self
            .rows
            .iter()
            .find(|r| r.tool.id == tool_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Không tìm thấy thiết bị đã xóa {}", tool_id)))?;

        let sub_tools = match self.gateway.deleted_children(tool_id).await {
            Ok(sub_tools) => sub_tools,
            Err(e) => {
                self.notifier.failure("Loading deleted descendants", &e);
                return Err(e);
            }
        };

        let detail = self.detail.insert(DeletedToolDetail { tool, sub_tools });
        let counts = detail.counts();
        if counts != detail.tool.children_count {
            tracing::debug!(
                "Children count of {} differs from its detail: {:?} vs {:?}",
                tool_id,
                detail.tool.children_count,
                counts
            );
        }
        Ok(&*detail)
    }

    pub fn close(&mut self) {
        self.detail = None;
    }

    /// Restore any node. The backend cascades to descendants and may
    /// report how many came back with it.
    pub async fn restore(&mut self, key: AssetKey) -> AppResult<Option<RestoreCascade>> {
        if !self.can_restore() {
            return Err(AppError::Forbidden("restore_tool".to_string()));
        }
        self.start()?;

        let label = self.label_of(&key);
        tracing::info!("Restoring {}", key);
        let result = self.gateway.restore(key).await;
        self.in_flight = false;

        match result {
            Ok(envelope) => {
                self.notifier.success(&format!("Đã khôi phục {}", label));
                let cascade = envelope.restored.filter(|r| r.total() > 0);
                if let Some(restored) = &cascade {
                    self.notifier.info(&format!(
                        "Đã khôi phục kèm {} thiết bị con và {} phụ kiện",
                        restored.sub_tools, restored.accessories
                    ));
                }
                self.refresh().await;
                Ok(cascade)
            }
            Err(e) => {
                self.notifier.failure("Restore", &e);
                Err(e)
            }
        }
    }

    /// First step of a permanent delete: returns the confirmation to show
    pub fn request_permanent_delete(&self, key: AssetKey) -> AppResult<PendingPurge> {
        if !self.can_purge() {
            return Err(AppError::Forbidden("permanent_delete_tool".to_string()));
        }
        let label = self.label_of(&key);
        Ok(PendingPurge { key, label })
    }

    /// Second step: the operator confirmed
    pub async fn confirm_permanent_delete(&mut self, pending: PendingPurge) -> AppResult<()> {
        if !self.can_purge() {
            return Err(AppError::Forbidden("permanent_delete_tool".to_string()));
        }
        self.start()?;

        tracing::warn!("Permanently deleting {}", pending.key);
        let result = self.gateway.permanent_delete(pending.key).await;
        self.in_flight = false;

        match result {
            Ok(_) => {
                self.notifier
                    .success(&format!("Đã xóa vĩnh viễn {}", pending.label));
                self.refresh().await;
                Ok(())
            }
            Err(e) => {
                self.notifier.failure("Permanent delete", &e);
                Err(e)
            }
        }
    }

    fn start(&mut self) -> AppResult<()> {
        if self.in_flight {
            return Err(AppError::Conflict("Thao tác trước đang được xử lý".to_string()));
        }
        self.in_flight = true;
        Ok(())
    }

    async fn refresh(&mut self) {
        self.close();
        // load() already reported the failure
        let _ = self.load().await;
    }

    fn label_of(&self, key: &AssetKey) -> String {
        let from_rows = || {
            self.rows
                .iter()
                .find(|r| r.tool.id == key.id)
                .map(|r| r.tool.name.clone())
        };
        let sub_tools = self.detail.iter().flat_map(|d| d.sub_tools.iter());
        let label = match key.kind {
            AssetKind::Tool => from_rows(),
            AssetKind::SubTool => sub_tools
                .map(|s| &s.sub_tool)
                .find(|s| s.id == key.id)
                .map(|s| s.name.clone()),
            AssetKind::Accessory => sub_tools
                .flat_map(|s| s.accessories.iter())
                .find(|a| a.id == key.id)
                .map(|a| a.name.clone()),
        };
        label.unwrap_or_else(|| key.id.clone())
    }
}
