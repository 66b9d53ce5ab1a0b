//! Authenticated API client with single-flight token refresh

use std::sync::{Arc, Mutex, PoisonError};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tokio::sync::oneshot;

use super::session::Session;
use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::{
    error::{AppError, AppResult},
    models::Envelope,
};

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    /// Requests parked while a refresh is running
    waiters: Vec<oneshot::Sender<Option<String>>>,
}

struct Inner {
    transport: Arc<dyn Transport>,
    session: Arc<Session>,
    refresh: Mutex<RefreshState>,
}

/// Marks a refresh as running. Dropping it unfinished (the refreshing
/// future was cancelled) clears the flag and releases parked requests so
/// one of them can take the refresh over.
struct InFlight<'a> {
    state: &'a Mutex<RefreshState>,
    armed: bool,
}

impl InFlight<'_> {
    fn finish(mut self) -> Vec<oneshot::Sender<Option<String>>> {
        self.armed = false;
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.in_flight = false;
        std::mem::take(&mut state.waiters)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.in_flight = false;
            state.waiters.clear();
        }
    }
}

/// Shared handle over the backend; cheap to clone
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<Session>) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                session,
                refresh: Mutex::new(RefreshState::default()),
            }),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.inner.session
    }

    /// Send a request with the current bearer token.
    ///
    /// A 401 outside of `/auth/*` refreshes the token (once per request) and
    /// replays the request; a 403 tears the session down.
    pub async fn send(&self, request: ApiRequest) -> AppResult<ApiResponse> {
        let token = self.inner.session.access_token();
        let response = self.inner.transport.send(&request, token.as_deref()).await?;

        if response.status == 401 && !request.is_auth_endpoint() {
            tracing::debug!("401 on {}, refreshing access token", request.path);
            let fresh = self.fresh_token(token.as_deref()).await?;
            let retried = self.inner.transport.send(&request, Some(&fresh)).await?;
            return self.check(retried, &request).await;
        }

        self.check(response, &request).await
    }

    async fn check(&self, response: ApiResponse, request: &ApiRequest) -> AppResult<ApiResponse> {
        if response.is_success() {
            return Ok(response);
        }
        let message = response.message();
        if response.status == 403 {
            self.inner.session.teardown("access forbidden").await;
            return Err(AppError::Forbidden(message.unwrap_or_else(|| "Forbidden".to_string())));
        }
        tracing::warn!(
            "{:?} {} failed with status {}: {}",
            request.method,
            request.path,
            response.status,
            message.as_deref().unwrap_or("-")
        );
        Err(AppError::from_status(response.status, message))
    }

    /// A token newer than `stale`, refreshing at most once for all callers
    async fn fresh_token(&self, stale: Option<&str>) -> AppResult<String> {
        let guard = loop {
            let waiter = {
                let mut state = self.inner.refresh.lock().unwrap_or_else(PoisonError::into_inner);
                if state.in_flight {
                    let (tx, rx) = oneshot::channel();
                    state.waiters.push(tx);
                    rx
                } else {
                    // Someone else refreshed after this request was sent
                    if let Some(current) = self.inner.session.access_token() {
                        if Some(current.as_str()) != stale {
                            return Ok(current);
                        }
                    }
                    state.in_flight = true;
                    break InFlight {
                        state: &self.inner.refresh,
                        armed: true,
                    };
                }
            };

            match waiter.await {
                Ok(Some(token)) => return Ok(token),
                Ok(None) => return Err(AppError::SessionExpired),
                // The refreshing request was dropped before it finished
                Err(_) => tracing::debug!("Token refresh abandoned, taking it over"),
            }
        };

        let result = self.refresh_tokens().await;
        let waiters = guard.finish();

        match result {
            Ok(token) => {
                tracing::info!("Access token refreshed, replaying {} queued request(s)", waiters.len());
                for waiter in waiters {
                    let _ = waiter.send(Some(token.clone()));
                }
                Ok(token)
            }
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                for waiter in waiters {
                    let _ = waiter.send(None);
                }
                self.inner.session.teardown("token refresh failed").await;
                Err(AppError::SessionExpired)
            }
        }
    }

    async fn refresh_tokens(&self) -> AppResult<String> {
        let refresh_token = self
            .inner
            .session
            .refresh_token()
            .ok_or(AppError::SessionExpired)?;

        let request = ApiRequest::post("/auth/refresh").json(&json!({ "refreshToken": refresh_token }))?;
        let response = self.inner.transport.send(&request, None).await?;
        if !response.is_success() {
            return Err(AppError::from_status(response.status, response.message()));
        }

        // Accept both `{accessToken}` and `{data: {accessToken}}`
        let payload = response.body.get("data").filter(|d| d.is_object()).unwrap_or(&response.body);
        let access = payload
            .get("accessToken")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::Decode("refresh response carries no accessToken".to_string()))?
            .to_string();
        let rotated = payload
            .get("refreshToken")
            .and_then(Value::as_str)
            .map(str::to_string);

        self.inner.session.update_access(access.clone(), rotated).await?;
        Ok(access)
    }

    /// Send and decode the response envelope
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> AppResult<Envelope<T>> {
        let response = self.send(request).await?;
        let body = match response.body {
            Value::Null => json!({ "success": true }),
            other => other,
        };
        Ok(serde_json::from_value(body)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AppResult<Envelope<T>> {
        self.execute(ApiRequest::get(path)).await
    }

    pub async fn get_with<T: DeserializeOwned, Q: Serialize>(&self, path: &str, query: &Q) -> AppResult<Envelope<T>> {
        self.execute(ApiRequest::get(path).query(query)?).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> AppResult<Envelope<T>> {
        self.execute(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> AppResult<Envelope<T>> {
        self.execute(ApiRequest::put(path).json(body)?).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> AppResult<Envelope<T>> {
        self.execute(ApiRequest::patch(path).json(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> AppResult<Envelope<T>> {
        self.execute(ApiRequest::delete(path)).await
    }

    pub async fn delete_with<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> AppResult<Envelope<T>> {
        self.execute(ApiRequest::delete(path).json(body)?).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::client::session::{MemoryTokenStore, SessionEvent, TokenStore, Tokens};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Backend double: accepts only `valid` as bearer, issues `issued` on refresh
    pub(crate) struct FakeBackend {
        valid: Mutex<String>,
        issued: String,
        refresh_ok: bool,
        always_unauthorized: bool,
        stall_first_refresh: bool,
        pub refresh_calls: AtomicUsize,
        pub seen: Mutex<Vec<(String, Option<String>)>>,
    }

    impl FakeBackend {
        pub(crate) fn new(valid: &str, issued: &str) -> Self {
            Self {
                valid: Mutex::new(valid.to_string()),
                issued: issued.to_string(),
                refresh_ok: true,
                always_unauthorized: false,
                stall_first_refresh: false,
                refresh_calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for FakeBackend {
        async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> AppResult<ApiResponse> {
            self.seen
                .lock()
                .unwrap()
                .push((request.path.clone(), bearer.map(str::to_string)));

            if request.path == "/auth/refresh" {
                let previous = self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                if self.stall_first_refresh && previous == 0 {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                }
                tokio::time::sleep(Duration::from_millis(30)).await;
                if !self.refresh_ok {
                    return Ok(ApiResponse::new(401, json!({ "message": "Refresh token expired" })));
                }
                *self.valid.lock().unwrap() = self.issued.clone();
                return Ok(ApiResponse::new(200, json!({ "accessToken": self.issued })));
            }
            if request.path == "/forbidden" {
                return Ok(ApiResponse::new(403, json!({ "message": "Session revoked" })));
            }

            let valid = self.valid.lock().unwrap().clone();
            if self.always_unauthorized || bearer != Some(valid.as_str()) {
                return Ok(ApiResponse::new(401, json!({ "message": "jwt expired" })));
            }
            Ok(ApiResponse::new(200, json!({ "success": true, "data": request.path })))
        }
    }

    fn client_with(backend: Arc<FakeBackend>, access: &str) -> (ApiClient, Arc<MemoryTokenStore>) {
        let store = Arc::new(MemoryTokenStore::new(Tokens {
            access_token: Some(access.into()),
            refresh_token: Some("r1".into()),
        }));
        let session = Arc::new(Session::new(store.clone()).unwrap());
        (ApiClient::new(backend, session), store)
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let backend = Arc::new(FakeBackend::new("fresh", "fresh"));
        let (client, _) = client_with(backend.clone(), "stale");

        let (a, b) = tokio::join!(client.get::<String>("/tools"), client.get::<String>("/sub-tool"));

        assert_eq!(a.unwrap().into_data().unwrap(), "/tools");
        assert_eq!(b.unwrap().into_data().unwrap(), "/sub-tool");
        assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(client.session().access_token().as_deref(), Some("fresh"));

        let seen = backend.seen.lock().unwrap();
        let replays: Vec<_> = seen
            .iter()
            .filter(|(path, bearer)| path != "/auth/refresh" && bearer.as_deref() == Some("fresh"))
            .collect();
        assert_eq!(replays.len(), 2);
    }

    #[tokio::test]
    async fn test_abandoned_refresh_is_taken_over() {
        let mut backend = FakeBackend::new("fresh", "fresh");
        backend.stall_first_refresh = true;
        let backend = Arc::new(backend);
        let (client, _) = client_with(backend.clone(), "stale");

        let abandoned = tokio::time::timeout(Duration::from_millis(80), client.get::<String>("/tools"));
        let parked = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            client.get::<String>("/sub-tool").await
        };
        let (abandoned, parked) = tokio::join!(abandoned, parked);

        assert!(abandoned.is_err());
        assert_eq!(parked.unwrap().into_data().unwrap(), "/sub-tool");
        let later = client.get::<String>("/accessory").await.unwrap();
        assert_eq!(later.into_data().unwrap(), "/accessory");
        assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_refresh_failure_rejects_all_and_tears_down() {
        let mut backend = FakeBackend::new("fresh", "fresh");
        backend.refresh_ok = false;
        let backend = Arc::new(backend);
        let (client, store) = client_with(backend.clone(), "stale");
        let events = client.session().subscribe();

        let (a, b) = tokio::join!(client.get::<String>("/tools"), client.get::<String>("/accessory"));

        assert!(matches!(a, Err(AppError::SessionExpired)));
        assert!(matches!(b, Err(AppError::SessionExpired)));
        assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.load().unwrap(), Tokens::default());
        assert_eq!(*events.borrow(), SessionEvent::LoginRequired);
    }

    #[tokio::test]
    async fn test_retry_happens_only_once() {
        let mut backend = FakeBackend::new("fresh", "fresh");
        backend.always_unauthorized = true;
        let backend = Arc::new(backend);
        let (client, _) = client_with(backend.clone(), "stale");

        let result = client.get::<String>("/tools").await;

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
        assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
        let calls = backend.seen.lock().unwrap().iter().filter(|(p, _)| p == "/tools").count();
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn test_403_tears_down_without_retry() {
        let backend = Arc::new(FakeBackend::new("a1", "a2"));
        let (client, store) = client_with(backend.clone(), "a1");

        let result = client.get::<Value>("/forbidden").await;

        assert!(matches!(result, Err(AppError::Forbidden(ref m)) if m == "Session revoked"));
        assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 0);
        assert!(store.load().unwrap().access_token.is_none());
    }

    #[tokio::test]
    async fn test_auth_endpoints_are_not_refreshed() {
        let backend = Arc::new(FakeBackend::new("a1", "a2"));
        let (client, _) = client_with(backend.clone(), "stale");

        let result = client.post::<Value, _>("/auth/login", &json!({ "username": "x" })).await;

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
        assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_late_401_uses_token_refreshed_meanwhile() {
        let backend = Arc::new(FakeBackend::new("fresh", "fresh"));
        let (client, _) = client_with(backend.clone(), "fresh");

        // The request went out with a token that has since been replaced
        let token = client.fresh_token(Some("stale")).await.unwrap();

        assert_eq!(token, "fresh");
        assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 0);
    }
}
