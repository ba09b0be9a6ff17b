//! HTTP client for the todo hive backends.
//!
//! The client owns the token store: successful register/login calls persist
//! the token, and the first response shape it sees decides the backend
//! variant for the rest of the session.

mod types;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

pub use self::types::{
    Health, LoginOutcome, RegisterOutcome, ServiceInfo, SessionCheck, Todo, TokenCheck,
    TokenUser, User,
};
use self::types::{CredentialsBody, MeResponse, TodoBody, TodoList, TokenBody};
use crate::error::ApiError;
use crate::session::{BackendVariant, Negotiated, Session, TokenStore};

/// Standard User-Agent header for todo-hive requests.
pub const USER_AGENT: &str = concat!("todo-hive/", env!("CARGO_PKG_VERSION"));

/// Port Worker B listens on by default.
const WORKER_B_DEFAULT_PORT: u16 = 5001;

/// Options for building an [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout: Option<Duration>,
    /// Variant to assume until one is detected.
    pub pinned_variant: Option<BackendVariant>,
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
            pinned_variant: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_pinned_variant(mut self, variant: Option<BackendVariant>) -> Self {
        self.pinned_variant = variant;
        self
    }
}

/// Variant to assume before any response has been seen.
///
/// A pinned variant wins; otherwise the Worker B default port selects B and
/// everything else selects A.
pub fn assume_variant(base_url: &url::Url, pinned: Option<BackendVariant>) -> BackendVariant {
    if let Some(variant) = pinned {
        return variant;
    }
    if base_url.port_or_known_default() == Some(WORKER_B_DEFAULT_PORT) {
        BackendVariant::B
    } else {
        BackendVariant::A
    }
}

/// Todo hive API client.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    store: Arc<dyn TokenStore>,
    assumed: BackendVariant,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("assumed", &self.assumed)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client for `options.base_url` backed by `store`.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(options: ClientOptions, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let base_url = options.base_url.trim().trim_end_matches('/').to_string();
        let parsed = url::Url::parse(&base_url).map_err(|source| ApiError::InvalidBaseUrl {
            url: base_url.clone(),
            source,
        })?;
        let assumed = assume_variant(&parsed, options.pinned_variant);

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ApiError::Transport)?;

        Ok(Self {
            base_url,
            http,
            store,
            assumed,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &dyn TokenStore {
        self.store.as_ref()
    }

    /// Resolves the backend variant once for the session: a stored tag wins,
    /// otherwise the assumed variant is used without being persisted.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn negotiate(&self) -> Result<Negotiated, ApiError> {
        Ok(match self.store.get_variant()? {
            Some(stored) => Negotiated::Stored(stored),
            None => Negotiated::Assumed(self.assumed),
        })
    }

    /// Effective backend variant.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn variant(&self) -> Result<BackendVariant, ApiError> {
        Ok(self.negotiate()?.variant())
    }

    /// Current session snapshot.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn session(&self) -> Result<Session, ApiError> {
        Ok(Session::load(self.store.as_ref(), self.assumed)?)
    }

    /// Stored bearer token.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(self.store.get()?)
    }

    /// Forgets the bearer token. Returns whether one was stored.
    ///
    /// # Errors
    /// Returns an error if the store cannot be written.
    pub fn logout(&self) -> Result<bool, ApiError> {
        let had_token = self.store.get()?.is_some();
        self.store.clear()?;
        Ok(had_token)
    }

    /// Forgets token and detected variant.
    ///
    /// # Errors
    /// Returns an error if the store cannot be written.
    pub fn forget_backend(&self) -> Result<(), ApiError> {
        self.store.reset()?;
        Ok(())
    }

    /// Registers an account.
    ///
    /// A `{token, user}` response signs the user in (variant B); a `{message}`
    /// response leaves the session anonymous (variant A).
    ///
    /// # Errors
    /// Returns an error on non-2xx responses, transport failures or unknown shapes.
    pub async fn register(&self, username: &str, password: &str) -> Result<RegisterOutcome, ApiError> {
        let outcome: RegisterOutcome = self
            .post("/api/register", &CredentialsBody { username, password })
            .await?;

        if let Some(token) = outcome.token() {
            self.store.set(token)?;
        }
        self.record_variant(outcome.variant(), "register")?;

        Ok(outcome)
    }

    /// Logs in and stores the returned token.
    ///
    /// # Errors
    /// Returns an error on non-2xx responses, transport failures or unknown shapes.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, ApiError> {
        let outcome: LoginOutcome = self
            .post("/api/login", &CredentialsBody { username, password })
            .await?;

        self.store.set(outcome.token())?;
        self.record_variant(outcome.variant(), "login")?;

        Ok(outcome)
    }

    /// Fetches the signed-in user.
    ///
    /// Returns `Ok(None)` when the backend has no such endpoint: a detected
    /// variant A (no request is made) or a bare 404/405. Refused tokens and
    /// transport failures are errors.
    ///
    /// # Errors
    /// Returns an error for refused tokens, other HTTP errors and transport failures.
    pub async fn current_user(&self) -> Result<Option<User>, ApiError> {
        if self.negotiate()? == Negotiated::Stored(BackendVariant::A) {
            debug!("current user lookup skipped: backend has no profile endpoint");
            return Ok(None);
        }

        match self.get::<MeResponse>("/api/me").await {
            Ok(me) => Ok(Some(me.user)),
            Err(err) if err.is_unsupported_endpoint() => {
                debug!(%err, "profile endpoint unsupported");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Creates a todo.
    ///
    /// # Errors
    /// Returns a capability error without any request on variant B backends.
    pub async fn create_todo(&self, content: &str) -> Result<Todo, ApiError> {
        self.require(BackendVariant::A, "todo management")?;
        self.post("/api/todos", &TodoBody { content }).await
    }

    /// Lists the signed-in user's todos.
    ///
    /// # Errors
    /// Returns a capability error without any request on variant B backends.
    pub async fn list_todos(&self) -> Result<Vec<Todo>, ApiError> {
        self.require(BackendVariant::A, "todo management")?;
        let list: TodoList = self.get("/api/todos").await?;
        Ok(list.todos)
    }

    /// Liveness check.
    ///
    /// # Errors
    /// Returns an error on non-2xx responses or transport failures.
    pub async fn health(&self) -> Result<Health, ApiError> {
        self.get("/health").await
    }

    /// Service description (variant B).
    ///
    /// # Errors
    /// Returns a capability error without any request on variant A backends.
    pub async fn service_info(&self) -> Result<ServiceInfo, ApiError> {
        self.require(BackendVariant::B, "service info")?;
        self.get("/").await
    }

    /// Asks the backend whether `token` is valid (variant B).
    ///
    /// # Errors
    /// Returns a capability error without any request on variant A backends.
    pub async fn verify_token(&self, token: &str) -> Result<TokenCheck, ApiError> {
        self.require(BackendVariant::B, "token verification")?;
        self.post("/api/verify-token", &TokenBody { token }).await
    }

    /// Checks the stored token against the backend.
    ///
    /// Variant B asks `/api/me`; variant A has no profile endpoint and uses
    /// the authenticated todo listing instead. A refused token is cleared.
    ///
    /// # Errors
    /// Returns an error for failures other than a refused token.
    pub async fn verify_session(&self) -> Result<SessionCheck, ApiError> {
        if self.store.get()?.is_none() {
            return Ok(SessionCheck::Anonymous);
        }

        let result = match self.variant()? {
            BackendVariant::B => self
                .get::<MeResponse>("/api/me")
                .await
                .map(|me| SessionCheck::Valid {
                    user: Some(me.user),
                    todos: None,
                }),
            BackendVariant::A => {
                self.get::<TodoList>("/api/todos")
                    .await
                    .map(|list| SessionCheck::Valid {
                        user: None,
                        todos: Some(list.todos),
                    })
            }
        };

        match result {
            Err(err) if err.is_session_error() => {
                warn!(%err, "stored token rejected; clearing session");
                self.store.clear()?;
                Ok(SessionCheck::Rejected {
                    reason: err.to_string(),
                })
            }
            other => other,
        }
    }

    /// Persists the first detected variant; later detections never overwrite it.
    fn record_variant(
        &self,
        detected: BackendVariant,
        operation: &'static str,
    ) -> Result<BackendVariant, ApiError> {
        match self.store.get_variant()? {
            Some(stored) if stored != detected => {
                warn!(
                    %stored,
                    %detected,
                    operation,
                    "response shape disagrees with stored backend variant; keeping stored"
                );
                Ok(stored)
            }
            Some(stored) => Ok(stored),
            None => {
                info!(variant = %detected, operation, "detected backend variant");
                self.store.set_variant(detected)?;
                Ok(detected)
            }
        }
    }

    fn require(&self, required: BackendVariant, operation: &'static str) -> Result<(), ApiError> {
        let current = self.variant()?;
        if current == required {
            Ok(())
        } else {
            Err(ApiError::Capability {
                operation,
                required,
                current,
            })
        }
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder, ApiError> {
        let url = format!("{}{endpoint}", self.base_url);
        let mut builder = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = self.store.get()? {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, endpoint)?;
        self.send(builder, "GET", endpoint).await
    }

    async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::POST, endpoint)?.json(body);
        self.send(builder, "POST", endpoint).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        method: &'static str,
        endpoint: &str,
    ) -> Result<T, ApiError> {
        let response = builder.send().await.map_err(|err| {
            debug!(method, endpoint, %err, "request failed");
            ApiError::Transport(err)
        })?;
        let status = response.status();
        let body = response.text().await.map_err(ApiError::Transport)?;
        debug!(method, endpoint, status = status.as_u16(), "api response");

        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests;
