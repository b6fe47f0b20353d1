//! Session-aware API client.
//!
//! Mirrors authentication state across process starts and coordinates with
//! the server on every mutation. One logical session per client: callers
//! serialize their own operations, but a cache clear always wins a race
//! against an in-flight profile refresh.

use parking_lot::Mutex;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::models::{LoginRequest, ProfileUpdateRequest, SignupRequest, TokenResponse};
use crate::client::cache::{CachedSession, SessionCache};
use crate::client::net::{self, ClientError, ConnectionStatus, RetryPolicy};
use crate::database::models::UserProfile;
use crate::routes::contact::ContactRequest;

/// What the UI should render for the account area.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Anonymous,
    Authenticated(UserProfile),
}

struct SessionState {
    status: ConnectionStatus,
    auth: AuthState,
    access_token: Option<String>,
}

pub struct SessionClient {
    http: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
    cache: SessionCache,
    state: Mutex<SessionState>,
}

impl SessionClient {
    pub fn new(base_url: impl Into<String>, cache_path: PathBuf) -> Self {
        Self::with_policy(base_url, cache_path, RetryPolicy::default())
    }

    pub fn with_policy(
        base_url: impl Into<String>,
        cache_path: PathBuf,
        policy: RetryPolicy,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            policy,
            cache: SessionCache::new(cache_path),
            state: Mutex::new(SessionState {
                status: ConnectionStatus::Checking,
                auth: AuthState::Anonymous,
                access_token: None,
            }),
        }
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.state.lock().status
    }

    pub fn auth_state(&self) -> AuthState {
        self.state.lock().auth.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state.lock().auth, AuthState::Authenticated(_))
    }

    /// Reconcile with the server on process start.
    ///
    /// Hydrates from the local cache, then — if the server is reachable and
    /// a token is present — refetches the profile authoritatively. A
    /// rejected token clears the cache; a connectivity failure keeps the
    /// cached profile and reports `Disconnected`.
    pub async fn initialize(&self) -> ConnectionStatus {
        self.set_status(ConnectionStatus::Checking);

        if let Some(cached) = self.cache.load() {
            let mut state = self.state.lock();
            state.access_token = Some(cached.access_token);
            state.auth = AuthState::Authenticated(cached.user);
        }

        if !net::probe(&self.http, &self.base_url, &self.policy).await {
            self.set_status(ConnectionStatus::Disconnected);
            return ConnectionStatus::Disconnected;
        }
        self.set_status(ConnectionStatus::Connected);

        let token = self.state.lock().access_token.clone();
        if let Some(token) = token {
            match self.fetch_me(&token).await {
                Ok(user) => self.apply_refreshed_user(&token, user),
                Err(e) if e.is_unauthorized() => {
                    tracing::info!("cached session rejected, signing out");
                    self.clear_session();
                }
                Err(ClientError::Network(_)) | Err(ClientError::Timeout) => {
                    self.set_status(ConnectionStatus::Disconnected);
                }
                Err(e) => tracing::warn!("profile refresh failed: {}", e.user_message()),
            }
        }

        self.connection_status()
    }

    /// Re-run the liveness probe, e.g. from a retry button.
    pub async fn retry_connection(&self) -> ConnectionStatus {
        self.set_status(ConnectionStatus::Checking);
        let status = if net::probe(&self.http, &self.base_url, &self.policy).await {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        };
        self.set_status(status);
        status
    }

    pub async fn signup(&self, data: &SignupRequest) -> Result<UserProfile, ClientError> {
        let url = format!("{}/auth/signup", self.base_url);
        let response = self.guarded(self.http.post(&url).json(data)).await?;
        self.establish_session(decode_json(response).await?)
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<UserProfile, ClientError> {
        let url = format!("{}/auth/login", self.base_url);
        let response = self.guarded(self.http.post(&url).json(credentials)).await?;
        self.establish_session(decode_json(response).await?)
    }

    /// Authoritative profile fetch; a rejected token signs the session out.
    pub async fn current_user(&self) -> Result<UserProfile, ClientError> {
        let token = self.require_token()?;
        match self.fetch_me(&token).await {
            Ok(user) => {
                self.apply_refreshed_user(&token, user.clone());
                Ok(user)
            }
            Err(e) => {
                if e.is_unauthorized() {
                    self.clear_session();
                }
                Err(e)
            }
        }
    }

    pub async fn update_profile(
        &self,
        patch: &ProfileUpdateRequest,
    ) -> Result<UserProfile, ClientError> {
        let token = self.require_token()?;
        let url = format!("{}/auth/profile", self.base_url);
        let result = self
            .guarded(self.http.put(&url).bearer_auth(&token).json(patch))
            .await;
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                if e.is_unauthorized() {
                    self.clear_session();
                }
                return Err(e);
            }
        };
        let user: UserProfile = decode_json(response).await?;
        self.apply_refreshed_user(&token, user.clone());
        Ok(user)
    }

    /// Best-effort server notification, then unconditional local sign-out.
    /// Never fails: an unreachable server still ends the local session.
    pub async fn logout(&self) {
        let token = self.state.lock().access_token.clone();
        let url = format!("{}/auth/logout", self.base_url);
        let mut request = self.http.post(&url);
        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }
        if let Err(e) = net::execute_with_retry(&self.policy, request).await {
            tracing::warn!("logout request failed: {}", e.user_message());
        }
        self.clear_session();
    }

    pub async fn submit_contact(&self, form: &ContactRequest) -> Result<(), ClientError> {
        let url = format!("{}/contact", self.base_url);
        self.guarded(self.http.post(&url).json(form)).await?;
        Ok(())
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.state.lock().status = status;
    }

    fn require_token(&self) -> Result<String, ClientError> {
        self.state
            .lock()
            .access_token
            .clone()
            .ok_or(ClientError::NotAuthenticated)
    }

    async fn fetch_me(&self, token: &str) -> Result<UserProfile, ClientError> {
        let url = format!("{}/auth/me", self.base_url);
        let response = self.guarded(self.http.get(&url).bearer_auth(token)).await?;
        decode_json(response).await
    }

    /// Route every delivered call's outcome into the connectivity status.
    async fn guarded(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ClientError> {
        match net::execute_with_retry(&self.policy, request).await {
            Ok(response) => {
                self.set_status(ConnectionStatus::Connected);
                Ok(response)
            }
            Err(e) => {
                if matches!(e, ClientError::Network(_) | ClientError::Timeout) {
                    self.set_status(ConnectionStatus::Disconnected);
                }
                Err(e)
            }
        }
    }

    fn establish_session(&self, tokens: TokenResponse) -> Result<UserProfile, ClientError> {
        let session = CachedSession {
            access_token: tokens.access_token,
            user: tokens.user,
        };
        if let Err(e) = self.cache.store(&session) {
            tracing::warn!("failed to persist session cache: {e:#}");
        }
        let mut state = self.state.lock();
        state.access_token = Some(session.access_token);
        state.auth = AuthState::Authenticated(session.user.clone());
        Ok(session.user)
    }

    /// Replace the cached profile after a refresh, unless the session was
    /// signed out while the request was in flight.
    fn apply_refreshed_user(&self, token: &str, user: UserProfile) {
        {
            let mut state = self.state.lock();
            if state.access_token.as_deref() != Some(token) {
                return;
            }
            state.auth = AuthState::Authenticated(user.clone());
        }
        let session = CachedSession {
            access_token: token.to_string(),
            user,
        };
        if let Err(e) = self.cache.store(&session) {
            tracing::warn!("failed to persist session cache: {e:#}");
        }
    }

    fn clear_session(&self) {
        self.cache.clear();
        let mut state = self.state.lock();
        state.access_token = None;
        state.auth = AuthState::Anonymous;
    }
}

async fn decode_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::Unexpected(format!("unexpected response body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{Claims, JwtService};
    use crate::database::memory::MemoryStore;
    use crate::server::{AppState, build_router};
    use crate::services::Mailer;
    use chrono::{Duration as ChronoDuration, Utc};
    use jsonwebtoken::{EncodingKey, Header};
    use std::sync::Arc;
    use uuid::Uuid;

    const SECRET: &str = "test_secret";

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(10),
            attempt_timeout: Duration::from_secs(2),
            probe_timeout: Duration::from_millis(500),
        }
    }

    async fn spawn_app() -> (String, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = AppState {
            store: store.clone(),
            jwt_service: Arc::new(JwtService::new(SECRET)),
            mailer: Arc::new(Mailer::disabled()),
        };
        let app = build_router(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), store)
    }

    fn client(base_url: &str, dir: &tempfile::TempDir) -> SessionClient {
        SessionClient::with_policy(base_url, dir.path().join("session.json"), fast_policy())
    }

    fn signup_data() -> SignupRequest {
        SignupRequest {
            email: "a@b.com".to_string(),
            password: "Str0ng!pw".to_string(),
            full_name: "A B".to_string(),
            company: None,
            phone: None,
        }
    }

    #[tokio::test]
    async fn signup_persists_session_and_survives_restart() {
        let (base, _) = spawn_app().await;
        let dir = tempfile::tempdir().unwrap();

        let session = client(&base, &dir);
        let user = session.signup(&signup_data()).await.unwrap();
        assert_eq!(user.email, "a@b.com");
        assert!(session.is_authenticated());

        // A fresh client over the same cache reconciles and stays signed in.
        let restarted = client(&base, &dir);
        let status = restarted.initialize().await;
        assert_eq!(status, ConnectionStatus::Connected);
        match restarted.auth_state() {
            AuthState::Authenticated(profile) => assert_eq!(profile.email, "a@b.com"),
            other => panic!("expected authenticated state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn expired_cached_token_is_cleared_on_initialize() {
        let (base, _) = spawn_app().await;
        let dir = tempfile::tempdir().unwrap();

        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            iat: (now - ChronoDuration::hours(25)).timestamp(),
            exp: (now - ChronoDuration::hours(1)).timestamp(),
            iss: "portico-server".to_string(),
        };
        let expired = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let cache = SessionCache::new(dir.path().join("session.json"));
        cache
            .store(&CachedSession {
                access_token: expired,
                user: UserProfile {
                    id: claims.sub,
                    email: "a@b.com".to_string(),
                    full_name: "A B".to_string(),
                    company: None,
                    phone: None,
                    created_at: now,
                    is_active: true,
                },
            })
            .unwrap();

        let session = client(&base, &dir);
        let status = session.initialize().await;
        assert_eq!(status, ConnectionStatus::Connected);
        assert_eq!(session.auth_state(), AuthState::Anonymous);
        assert!(cache.load().is_none());
    }

    #[tokio::test]
    async fn unreachable_server_keeps_cached_profile_but_reports_disconnected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::new(dir.path().join("session.json"));
        let user = UserProfile {
            id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            full_name: "A B".to_string(),
            company: None,
            phone: None,
            created_at: Utc::now(),
            is_active: true,
        };
        cache
            .store(&CachedSession {
                access_token: "aaa.bbb.ccc".to_string(),
                user: user.clone(),
            })
            .unwrap();

        let session = client("http://127.0.0.1:9", &dir);
        let status = session.initialize().await;
        assert_eq!(status, ConnectionStatus::Disconnected);
        assert_eq!(session.auth_state(), AuthState::Authenticated(user));
    }

    #[tokio::test]
    async fn logout_clears_locally_even_when_server_is_down() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SessionCache::new(dir.path().join("session.json"));
        cache
            .store(&CachedSession {
                access_token: "aaa.bbb.ccc".to_string(),
                user: UserProfile {
                    id: Uuid::new_v4(),
                    email: "a@b.com".to_string(),
                    full_name: "A B".to_string(),
                    company: None,
                    phone: None,
                    created_at: Utc::now(),
                    is_active: true,
                },
            })
            .unwrap();

        let session = client("http://127.0.0.1:9", &dir);
        session.initialize().await;
        session.logout().await;

        assert_eq!(session.auth_state(), AuthState::Anonymous);
        assert!(cache.load().is_none());
    }

    #[tokio::test]
    async fn update_profile_refreshes_cache() {
        let (base, _) = spawn_app().await;
        let dir = tempfile::tempdir().unwrap();

        let session = client(&base, &dir);
        session.signup(&signup_data()).await.unwrap();

        let updated = session
            .update_profile(&ProfileUpdateRequest {
                company: Some("Acme".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.company.as_deref(), Some("Acme"));
        assert_eq!(updated.email, "a@b.com");

        let cache = SessionCache::new(dir.path().join("session.json"));
        let cached = cache.load().unwrap();
        assert_eq!(cached.user.company.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn login_with_wrong_password_surfaces_generic_message() {
        let (base, _) = spawn_app().await;
        let dir = tempfile::tempdir().unwrap();

        let session = client(&base, &dir);
        session.signup(&signup_data()).await.unwrap();
        session.logout().await;

        let err = session
            .login(&LoginRequest {
                email: "a@b.com".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(
            err.user_message(),
            "The email or password you entered is incorrect. Please try again."
        );
        assert_eq!(session.auth_state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn contact_submission_goes_through_the_guard() {
        let (base, store) = spawn_app().await;
        let dir = tempfile::tempdir().unwrap();

        let session = client(&base, &dir);
        session
            .submit_contact(&ContactRequest {
                name: "A B".to_string(),
                email: "a@b.com".to_string(),
                subject: "Hello".to_string(),
                message: "A question.".to_string(),
                phone: None,
            })
            .await
            .unwrap();
        assert_eq!(store.contact_count(), 1);
        assert_eq!(session.connection_status(), ConnectionStatus::Connected);
    }
}
