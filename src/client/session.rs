//! Client-side session: stored tokens and teardown

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// Persistence for the token pair
pub trait TokenStore: Send + Sync {
    fn load(&self) -> AppResult<Tokens>;
    fn save(&self, tokens: &Tokens) -> AppResult<()>;
    fn clear(&self) -> AppResult<()>;
}

/// JSON file holding `accessToken` and `refreshToken`
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> AppResult<Tokens> {
        if !self.path.exists() {
            return Ok(Tokens::default());
        }
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| AppError::Internal(format!("Failed to read session file: {}", e)))?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, tokens: &Tokens) -> AppResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .map_err(|e| AppError::Internal(format!("Failed to create session directory: {}", e)))?;
        }
        let raw = serde_json::to_string_pretty(tokens)?;
        fs::write(&self.path, raw)
            .map_err(|e| AppError::Internal(format!("Failed to write session file: {}", e)))
    }

    fn clear(&self) -> AppResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!("Failed to remove session file: {}", e))),
        }
    }
}

/// In-process store
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Tokens>,
}

impl MemoryTokenStore {
    pub fn new(tokens: Tokens) -> Self {
        Self {
            tokens: Mutex::new(tokens),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> AppResult<Tokens> {
        Ok(self.tokens.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, tokens: &Tokens) -> AppResult<()> {
        *self.tokens.lock().unwrap_or_else(PoisonError::into_inner) = tokens.clone();
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        *self.tokens.lock().unwrap_or_else(PoisonError::into_inner) = Tokens::default();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Active,
    /// Credentials cleared, nothing else to do
    LoggedOut,
    /// Credentials cleared, the operator has to log in again
    LoginRequired,
}

pub struct Session {
    store: Arc<dyn TokenStore>,
    tokens: RwLock<Tokens>,
    events: watch::Sender<SessionEvent>,
    on_login_route: AtomicBool,
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>) -> AppResult<Self> {
        let tokens = store.load()?;
        let initial = if tokens.access_token.is_some() {
            SessionEvent::Active
        } else {
            SessionEvent::LoggedOut
        };
        let (events, _) = watch::channel(initial);
        Ok(Self {
            store,
            tokens: RwLock::new(tokens),
            events,
            on_login_route: AtomicBool::new(false),
        })
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().refresh_token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().access_token.is_some()
    }

    pub fn set_tokens(&self, tokens: Tokens) -> AppResult<()> {
        self.store.save(&tokens)?;
        *self.write() = tokens;
        self.events.send_replace(SessionEvent::Active);
        Ok(())
    }

    /// Store a refreshed access token; keeps the old refresh token unless rotated.
    /// Runs on the request path, so the store is written off the async workers.
    pub async fn update_access(&self, access_token: String, refresh_token: Option<String>) -> AppResult<()> {
        let mut tokens = self.read().clone();
        tokens.access_token = Some(access_token);
        if refresh_token.is_some() {
            tokens.refresh_token = refresh_token;
        }
        let saved = tokens.clone();
        self.offload(move |store| store.save(&saved)).await?;
        *self.write() = tokens;
        self.events.send_replace(SessionEvent::Active);
        Ok(())
    }

    pub fn set_on_login_route(&self, value: bool) {
        self.on_login_route.store(value, Ordering::SeqCst);
    }

    /// Clear every credential. Asks for a new login unless the operator is
    /// already on the login route.
    pub async fn teardown(&self, reason: &str) {
        tracing::warn!("Tearing down session: {}", reason);
        *self.write() = Tokens::default();
        if let Err(e) = self.offload(|store| store.clear()).await {
            tracing::error!("Failed to clear stored credentials: {}", e);
        }
        let event = if self.on_login_route.load(Ordering::SeqCst) {
            SessionEvent::LoggedOut
        } else {
            SessionEvent::LoginRequired
        };
        self.events.send_replace(event);
    }

    pub fn logout(&self) -> AppResult<()> {
        self.store.clear()?;
        *self.write() = Tokens::default();
        self.events.send_replace(SessionEvent::LoggedOut);
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn current_event(&self) -> SessionEvent {
        *self.events.borrow()
    }

    /// Run a store operation on the blocking pool
    async fn offload<F>(&self, op: F) -> AppResult<()>
    where
        F: FnOnce(&dyn TokenStore) -> AppResult<()> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| AppError::Internal(format!("Session store task failed: {}", e)))?
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tokens> {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tokens> {
        self.tokens.write().unwrap_or_else(PoisonError::into_inner)
    }
}
