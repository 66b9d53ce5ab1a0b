//! Assign / transfer / revoke workflow
//!
//! One controller drives the hand-over of a single asset from the moment the
//! operator opens the dialog until the backend confirms (or rejects) the
//! change. The page's listing is never patched locally: on success the
//! controller asks its [`Reload`] hook for a fresh snapshot.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        hierarchy::{compatible_sub_tools, compatible_tools},
        sub_tool::SubToolFilter,
        tool::ToolFilter,
        AssetKind, AssetSnapshot, AssignRequest, Condition, Envelope, ResolvedRef, RevokeRequest,
        SubTool, Tool,
    },
    repository::Repository,
};

use super::fetch::Reload;
use super::notify::Notifier;

/// Upper bound on records pulled when computing destination candidates
const CANDIDATE_LIMIT: u32 = 500;

/// Backend operations the workflow depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssignmentGateway: Send + Sync {
    /// Tools currently assigned to the employee
    async fn employee_tools(&self, employee_id: &str) -> AppResult<Vec<Tool>>;

    /// SubTools held by the employee directly or under one of `tool_ids`
    async fn host_candidates(&self, employee_id: &str, tool_ids: Vec<String>) -> AppResult<Vec<SubTool>>;

    async fn tool(&self, id: &str) -> AppResult<Tool>;

    /// SubTool type id → name
    async fn sub_tool_type_names(&self) -> AppResult<HashMap<String, String>>;

    async fn assign(&self, request: AssignRequest, key: Uuid) -> AppResult<Envelope<Value>>;

    async fn revoke(&self, request: RevokeRequest, key: Uuid) -> AppResult<Envelope<Value>>;
}

#[async_trait]
impl AssignmentGateway for Repository {
    async fn employee_tools(&self, employee_id: &str) -> AppResult<Vec<Tool>> {
        let filter = ToolFilter {
            assigned_to: Some(employee_id.to_string()),
            limit: Some(CANDIDATE_LIMIT),
            ..Default::default()
        };
        Ok(self.tools.list(&filter).await?.data.unwrap_or_default())
    }

    async fn host_candidates(&self, employee_id: &str, tool_ids: Vec<String>) -> AppResult<Vec<SubTool>> {
        let filter = SubToolFilter {
            assigned_to: Some(employee_id.to_string()),
            limit: Some(CANDIDATE_LIMIT),
            ..Default::default()
        };
        let direct = self.sub_tools.list(&filter).await?.data.unwrap_or_default();
        let nested = futures::future::try_join_all(
            tool_ids.iter().map(|id| self.sub_tools.list_by_parent(id)),
        )
        .await?;

        let mut seen = HashSet::new();
        Ok(direct
            .into_iter()
            .chain(nested.into_iter().flat_map(|env| env.data.unwrap_or_default()))
            .filter(|sub| seen.insert(sub.id.clone()))
            .collect())
    }

    async fn tool(&self, id: &str) -> AppResult<Tool> {
        self.tools.get(id).await?.into_data()
    }

    async fn sub_tool_type_names(&self) -> AppResult<HashMap<String, String>> {
        let types = self.categories.sub_tool_types().await?.data.unwrap_or_default();
        Ok(types.into_iter().map(|t| (t.id, t.name)).collect())
    }

    async fn assign(&self, request: AssignRequest, key: Uuid) -> AppResult<Envelope<Value>> {
        Repository::assign(self, &request, key).await
    }

    async fn revoke(&self, request: RevokeRequest, key: Uuid) -> AppResult<Envelope<Value>> {
        Repository::revoke(self, &request, key).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    Assign,
    Transfer,
    Revoke,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    SelectingEmployee,
    SelectingDestination,
    Confirming,
    Submitting,
    Succeeded,
    Failed(String),
}

/// Container an asset can be moved into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub id: String,
    pub label: String,
}

/// "Moves from A to B" summary shown before confirming a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePreview {
    pub from: Option<String>,
    pub to: String,
    pub is_transferring: bool,
}

impl std::fmt::Display for MovePreview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.from {
            Some(from) if self.is_transferring => write!(f, "Chuyển từ {} sang {}", from, self.to),
            Some(from) => write!(f, "Giữ nguyên tại {}", from),
            None => write!(f, "Gắn vào {}", self.to),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOutcome {
    pub message: String,
    pub transferred: bool,
    pub cascade_count: Option<u32>,
}

pub struct TransferWorkflow {
    gateway: Arc<dyn AssignmentGateway>,
    notifier: Arc<dyn Notifier>,
    reload: Option<Arc<dyn Reload>>,
    kind: WorkflowKind,
    state: WorkflowState,
    asset: Option<AssetSnapshot>,
    employee: Option<ResolvedRef>,
    candidates: Vec<Destination>,
    destination: Option<Destination>,
    blocking: Option<String>,
    condition: Condition,
    notes: Option<String>,
    in_flight: bool,
    idempotency_key: Uuid,
}

impl TransferWorkflow {
    pub fn new(gateway: Arc<dyn AssignmentGateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gateway,
            notifier,
            reload: None,
            kind: WorkflowKind::Assign,
            state: WorkflowState::Idle,
            asset: None,
            employee: None,
            candidates: Vec::new(),
            destination: None,
            blocking: None,
            condition: Condition::default(),
            notes: None,
            in_flight: false,
            idempotency_key: Uuid::new_v4(),
        }
    }

    /// Listing to re-fetch after a successful submission
    pub fn with_reload(mut self, reload: Arc<dyn Reload>) -> Self {
        self.reload = Some(reload);
        self
    }

    pub fn kind(&self) -> WorkflowKind {
        self.kind
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn asset(&self) -> Option<&AssetSnapshot> {
        self.asset.as_ref()
    }

    pub fn employee(&self) -> Option<&ResolvedRef> {
        self.employee.as_ref()
    }

    pub fn candidates(&self) -> &[Destination] {
        &self.candidates
    }

    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    /// Message explaining why no destination can be picked
    pub fn blocking_message(&self) -> Option<&str> {
        self.blocking.as_deref()
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    /// Open the dialog for `asset`
    pub fn begin(&mut self, kind: WorkflowKind, asset: AssetSnapshot) -> AppResult<()> {
        if self.in_flight {
            return Err(AppError::Conflict("Thao tác trước đang được xử lý".to_string()));
        }

        match kind {
            WorkflowKind::Assign => {
                if let Some(holder) = &asset.assignee {
                    return Err(AppError::Validation(format!(
                        "{} đã được giao cho {}",
                        asset.name, holder.label
                    )));
                }
            }
            WorkflowKind::Transfer => {
                if asset.kind == AssetKind::Tool {
                    return Err(AppError::Validation(
                        "Thiết bị cấp cao nhất không thể chuyển sang thiết bị khác".to_string(),
                    ));
                }
            }
            WorkflowKind::Revoke => {
                if !asset.in_use {
                    return Err(AppError::Validation(format!(
                        "Chỉ thu hồi được tài sản đang sử dụng: {}",
                        asset.name
                    )));
                }
            }
        }

        self.reset();
        self.kind = kind;
        self.asset = Some(asset);
        self.state = match kind {
            WorkflowKind::Revoke => WorkflowState::Confirming,
            _ => WorkflowState::SelectingEmployee,
        };
        Ok(())
    }

    /// Close the dialog
    pub fn cancel(&mut self) {
        if !self.in_flight {
            self.reset();
        }
    }

    /// Pick the receiving employee. For transfers this recomputes the
    /// destination candidates.
    pub async fn select_employee(&mut self, employee: ResolvedRef) -> AppResult<()> {
        if self.kind == WorkflowKind::Revoke || !self.accepts_input() {
            return Err(AppError::Validation("Không thể chọn nhân viên ở bước này".to_string()));
        }

        self.employee = Some(employee.clone());
        self.destination = None;
        self.candidates.clear();
        self.blocking = None;

        if self.kind == WorkflowKind::Assign {
            self.state = WorkflowState::Confirming;
            return Ok(());
        }

        match self.destination_candidates(&employee.id).await {
            Ok(candidates) => {
                if candidates.is_empty() {
                    self.blocking = Some(self.no_destination_message(&employee));
                }
                self.candidates = candidates;
                self.state = WorkflowState::SelectingDestination;
                Ok(())
            }
            Err(e) => {
                self.notifier.failure("Loading transfer destinations", &e);
                self.employee = None;
                self.state = WorkflowState::SelectingEmployee;
                Err(e)
            }
        }
    }

    /// Whether the destination selector is usable
    pub fn destination_enabled(&self) -> bool {
        self.kind == WorkflowKind::Transfer && self.employee.is_some() && !self.candidates.is_empty()
    }

    pub fn select_destination(&mut self, id: &str) -> AppResult<()> {
        if self.kind != WorkflowKind::Transfer || !self.accepts_input() {
            return Err(AppError::Validation("Không thể chọn thiết bị đích ở bước này".to_string()));
        }
        let destination = self
            .candidates
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| AppError::Validation("Thiết bị đích không hợp lệ".to_string()))?;
        self.destination = Some(destination);
        self.state = WorkflowState::Confirming;
        Ok(())
    }

    /// The chosen destination differs from the current container
    pub fn is_transferring(&self) -> bool {
        match (&self.destination, self.asset.as_ref().and_then(|a| a.parent.as_ref())) {
            (Some(dest), Some(parent)) => dest.id != parent.id,
            (Some(_), None) => true,
            _ => false,
        }
    }

    pub fn preview(&self) -> Option<MovePreview> {
        let destination = self.destination.as_ref()?;
        let from = self
            .asset
            .as_ref()
            .and_then(|a| a.parent.as_ref())
            .map(|p| p.label.clone());
        Some(MovePreview {
            from,
            to: destination.label.clone(),
            is_transferring: self.is_transferring(),
        })
    }

    pub fn set_condition(&mut self, condition: Condition) {
        self.condition = condition;
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        let notes = notes.into();
        self.notes = (!notes.trim().is_empty()).then_some(notes);
    }

    pub fn can_submit(&self) -> bool {
        self.guard().is_ok()
    }

    fn guard(&self) -> AppResult<&AssetSnapshot> {
        if self.in_flight {
            return Err(AppError::Conflict("Thao tác đang được xử lý".to_string()));
        }
        let asset = self
            .asset
            .as_ref()
            .ok_or_else(|| AppError::Validation("Chưa chọn tài sản".to_string()))?;
        if !matches!(self.state, WorkflowState::Confirming | WorkflowState::Failed(_)) {
            return Err(AppError::Validation("Chưa hoàn tất các bước".to_string()));
        }
        if self.kind != WorkflowKind::Revoke && self.employee.is_none() {
            return Err(AppError::Validation("Vui lòng chọn nhân viên".to_string()));
        }
        if self.kind == WorkflowKind::Transfer && self.destination.is_none() {
            return Err(AppError::Validation("Vui lòng chọn thiết bị đích".to_string()));
        }
        Ok(asset)
    }

    /// Send the hand-over to the backend
    pub async fn submit(&mut self) -> AppResult<WorkflowOutcome> {
        let asset = match self.guard() {
            Ok(asset) => asset.clone(),
            Err(e) => {
                self.notifier.warning(&e.user_message());
                return Err(e);
            }
        };

        self.in_flight = true;
        self.state = WorkflowState::Submitting;
        tracing::info!(
            "Submitting {:?} for {} {} (key {})",
            self.kind,
            asset.kind.wire_type(),
            asset.id,
            self.idempotency_key
        );

        let result = match self.kind {
            WorkflowKind::Revoke => {
                let request = RevokeRequest {
                    kind: asset.kind,
                    asset_id: asset.id.clone(),
                    condition: self.condition,
                    notes: self.notes.clone(),
                };
                self.gateway.revoke(request, self.idempotency_key).await
            }
            WorkflowKind::Assign | WorkflowKind::Transfer => {
                let request = AssignRequest {
                    kind: asset.kind,
                    asset_id: asset.id.clone(),
                    employee_id: self.employee.as_ref().map(|e| e.id.clone()).unwrap_or_default(),
                    destination_id: self.destination.as_ref().map(|d| d.id.clone()),
                    condition: self.condition,
                    notes: self.notes.clone(),
                };
                self.gateway.assign(request, self.idempotency_key).await
            }
        };
        self.in_flight = false;

        match result {
            Ok(envelope) => {
                let outcome = self.outcome(&asset, &envelope);
                self.notifier.success(&outcome.message);
                if let Some(count) = outcome.cascade_count {
                    self.notifier
                        .info(&format!("Đã cập nhật {} phụ kiện theo thiết bị mới", count));
                }
                self.state = WorkflowState::Succeeded;
                self.idempotency_key = Uuid::new_v4();

                if let Some(reload) = &self.reload {
                    if let Err(e) = reload.reload().await {
                        self.notifier.failure("Reloading after submission", &e);
                    }
                }
                Ok(outcome)
            }
            Err(e) => {
                self.notifier.failure("Asset hand-over", &e);
                self.state = WorkflowState::Failed(e.user_message());
                Err(e)
            }
        }
    }

    fn outcome(&self, asset: &AssetSnapshot, envelope: &Envelope<Value>) -> WorkflowOutcome {
        let employee = self.employee.as_ref().map(|e| e.label.as_str()).unwrap_or_default();
        let transferred = self.kind == WorkflowKind::Transfer && envelope.transferred();
        let message = match (self.kind, &self.destination) {
            (WorkflowKind::Revoke, _) => format!("Đã thu hồi {}", asset.name),
            (WorkflowKind::Transfer, Some(dest)) if transferred => format!(
                "Đã chuyển {} sang {} và giao cho {}",
                asset.name, dest.label, employee
            ),
            _ => format!("Đã giao {} cho {}", asset.name, employee),
        };
        WorkflowOutcome {
            message,
            transferred,
            cascade_count: envelope.cascade_count(),
        }
    }

    async fn destination_candidates(&self, employee_id: &str) -> AppResult<Vec<Destination>> {
        let Some(asset) = &self.asset else {
            return Ok(Vec::new());
        };
        let tools = self.gateway.employee_tools(employee_id).await?;

        match asset.kind {
            AssetKind::SubTool => {
                let category = match &asset.parent_category_id {
                    Some(id) => Some(id.clone()),
                    None => match &asset.parent {
                        Some(parent) => self
                            .gateway
                            .tool(&parent.id)
                            .await?
                            .category_id()
                            .map(str::to_string),
                        None => None,
                    },
                };
                let Some(category) = category else {
                    tracing::warn!("SubTool {} has no parent category, no destination possible", asset.id);
                    return Ok(Vec::new());
                };
                Ok(compatible_tools(&tools, employee_id, &category)
                    .into_iter()
                    .map(|t| Destination {
                        id: t.id.clone(),
                        label: t.name.clone(),
                    })
                    .collect())
            }
            AssetKind::Accessory => {
                let tool_ids = tools.iter().map(|t| t.id.clone()).collect();
                let hosts = self.gateway.host_candidates(employee_id, tool_ids).await?;
                // Only needed when some type arrived as a bare id
                let type_names = if hosts.iter().any(|s| s.type_name().is_none() && s.sub_tool_type.is_some()) {
                    match self.gateway.sub_tool_type_names().await {
                        Ok(names) => names,
                        Err(e) => {
                            tracing::warn!("Could not load sub-tool types: {}", e);
                            HashMap::new()
                        }
                    }
                } else {
                    HashMap::new()
                };
                Ok(compatible_sub_tools(&hosts, employee_id, &tools, &type_names)
                    .into_iter()
                    .map(|s| Destination {
                        id: s.id.clone(),
                        label: s.name.clone(),
                    })
                    .collect())
            }
            AssetKind::Tool => Ok(Vec::new()),
        }
    }

    fn no_destination_message(&self, employee: &ResolvedRef) -> String {
        match self.asset.as_ref().map(|a| a.kind) {
            Some(AssetKind::Accessory) => format!(
                "{} không có thiết bị con loại Case/CPU phù hợp để gắn phụ kiện",
                employee.label
            ),
            _ => format!(
                "{} không có thiết bị cùng danh mục đang sử dụng để nhận thiết bị con",
                employee.label
            ),
        }
    }

    fn accepts_input(&self) -> bool {
        !self.in_flight
            && matches!(
                self.state,
                WorkflowState::SelectingEmployee
                    | WorkflowState::SelectingDestination
                    | WorkflowState::Confirming
                    | WorkflowState::Failed(_)
            )
    }

    fn reset(&mut self) {
        self.state = WorkflowState::Idle;
        self.asset = None;
        self.employee = None;
        self.candidates.clear();
        self.destination = None;
        self.blocking = None;
        self.condition = Condition::default();
        self.notes = None;
        self.idempotency_key = Uuid::new_v4();
    }
}
