//! Tooldesk asset inventory client
//!
//! Typed client and workflow layer over the inventory REST backend: the
//! Tool → SubTool → Accessory hierarchy, assignment/transfer/revoke, the
//! soft-delete recovery browser and position permissions.

use std::sync::Arc;

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use client::{ApiClient, FileTokenStore, ReqwestTransport, Session};
use repository::Repository;
use services::{notify::Notifier, Services};

/// Application state shared by every command
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub session: Arc<Session>,
    pub services: Arc<Services>,
}

impl AppState {
    /// Wire the production stack: reqwest transport, file-backed session
    pub fn build(config: AppConfig, notifier: Arc<dyn Notifier>) -> AppResult<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config.api)?);
        let store = Arc::new(FileTokenStore::new(&config.session.store_path));
        let session = Arc::new(Session::new(store)?);
        session.set_on_login_route(config.session.on_login_route);

        let repository = Repository::new(ApiClient::new(transport, session.clone()));
        let services = Services::new(repository, notifier, config.uploads.clone());

        Ok(Self {
            config: Arc::new(config),
            session,
            services: Arc::new(services),
        })
    }
}
