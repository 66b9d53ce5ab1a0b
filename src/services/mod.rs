//! Business logic services

pub mod accessories;
pub mod employees;
pub mod fetch;
pub mod notify;
pub mod positions;
pub mod recovery;
pub mod transfer;

use std::sync::Arc;

use crate::{
    config::UploadConfig,
    error::AppResult,
    models::{
        accessory::AccessoryFilter, hierarchy::AssetTree, sub_tool::SubToolFilter, tool::ToolFilter,
        PermissionSet, Tool,
    },
    repository::Repository,
};

use self::{
    accessories::AccessoryEditor, employees::EmployeeDirectory, fetch::Resource, notify::Notifier,
    positions::PositionEditor, recovery::RecoveryBrowser, transfer::TransferWorkflow,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub notifier: Arc<dyn Notifier>,
    pub employees: EmployeeDirectory,
    uploads: UploadConfig,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, notifier: Arc<dyn Notifier>, uploads: UploadConfig) -> Self {
        Self {
            employees: EmployeeDirectory::new(repository.clone()),
            repository,
            notifier,
            uploads,
        }
    }

    /// Tool listing that re-fetches on every reload
    pub fn tools(&self, filter: ToolFilter) -> Arc<Resource<Vec<Tool>>> {
        let repository = self.repository.clone();
        Arc::new(Resource::new("tools", move || {
            let repository = repository.clone();
            let filter = filter.clone();
            async move {
                let listed = repository.tools.list(&filter).await?;
                AppResult::Ok(listed.data.unwrap_or_default())
            }
        }))
    }

    /// Workflow whose successful submissions reload `listing`
    pub fn transfer_workflow(&self, listing: Option<Arc<Resource<Vec<Tool>>>>) -> TransferWorkflow {
        let workflow = TransferWorkflow::new(Arc::new(self.repository.clone()), self.notifier.clone());
        match listing {
            Some(listing) => workflow.with_reload(listing),
            None => workflow,
        }
    }

    pub fn recovery_browser(&self, permissions: PermissionSet) -> RecoveryBrowser {
        RecoveryBrowser::new(Arc::new(self.repository.clone()), self.notifier.clone(), permissions)
    }

    pub fn accessory_editor(&self) -> AccessoryEditor {
        AccessoryEditor::new(Arc::new(self.repository.clone()), self.notifier.clone(), &self.uploads)
    }

    pub fn position_editor(&self) -> PositionEditor {
        PositionEditor::new(Arc::new(self.repository.clone()), self.notifier.clone())
    }

    /// Permissions carried by a Position
    pub async fn permissions_of(&self, position_id: &str) -> AppResult<PermissionSet> {
        let position = self.repository.positions.get(position_id).await?.into_data()?;
        Ok(position.permissions)
    }

    /// Whole active hierarchy, grouped into trees
    pub async fn asset_tree(&self) -> AppResult<AssetTree> {
        let (tool_filter, sub_tool_filter, accessory_filter) = (
            ToolFilter::default(),
            SubToolFilter::default(),
            AccessoryFilter::default(),
        );
        let (tools, sub_tools, accessories) = tokio::try_join!(
            self.repository.tools.list(&tool_filter),
            self.repository.sub_tools.list(&sub_tool_filter),
            self.repository.accessories.list(&accessory_filter),
        )?;
        Ok(AssetTree::build(
            tools.data.unwrap_or_default(),
            sub_tools.data.unwrap_or_default(),
            accessories.data.unwrap_or_default(),
        ))
    }
}
