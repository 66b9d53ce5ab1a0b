//! Reusable fetch/loading/error state for listings
//!
//! A [`Resource`] owns one fetched snapshot and knows how to fetch it again.
//! Mutations never patch the snapshot; they call [`Reload::reload`] and the
//! backend's answer replaces it wholesale.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::AppResult;

type Loader<T> = Arc<dyn Fn() -> BoxFuture<'static, AppResult<T>> + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

/// Something a mutation can ask to re-fetch
#[async_trait]
pub trait Reload: Send + Sync {
    async fn reload(&self) -> AppResult<()>;
}

pub struct Resource<T> {
    name: String,
    loader: Loader<T>,
    state: Mutex<FetchState<T>>,
}

impl<T: Clone + Send + 'static> Resource<T> {
    pub fn new<F, Fut>(name: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<T>> + Send + 'static,
    {
        Self {
            name: name.into(),
            loader: Arc::new(move || Box::pin(loader())),
            state: Mutex::new(FetchState::default()),
        }
    }

    /// Fetch and replace the snapshot. On failure the previous data is kept
    /// and the error message recorded.
    pub async fn fetch(&self) -> AppResult<()> {
        self.lock().loading = true;
        let result = (self.loader)().await;
        let mut state = self.lock();
        state.loading = false;
        match result {
            Ok(data) => {
                state.data = Some(data);
                state.error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Loading {} failed: {}", self.name, e);
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    pub fn data(&self) -> Option<T> {
        self.lock().data.clone()
    }

    pub fn snapshot(&self) -> FetchState<T> {
        let state = self.lock();
        FetchState {
            data: state.data.clone(),
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FetchState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> Reload for Resource<T> {
    async fn reload(&self) -> AppResult<()> {
        self.fetch().await
    }
}

/// Best-effort list load (dropdown options and the like): failures are
/// logged and degrade to an empty list.
pub async fn load_or_empty<T, Fut>(what: &str, load: Fut) -> Vec<T>
where
    Fut: Future<Output = AppResult<Vec<T>>>,
{
    match load.await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("Could not load {}, continuing with an empty list: {}", what, e);
            Vec::new()
        }
    }
}
