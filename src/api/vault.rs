use super::types::{
    AuthStatusResponse, CsrfTokenResponse, ErrorResponse, LoginRequest, SaveReceipt, SaveRequest, TasksSnapshot, CSRF_HEADER, SESSION_COOKIE,
};
use super::{ApiError, Session, TaskApi};
use crate::libs::config::ClientConfig;
use crate::libs::data_storage::DataStorage;
use crate::libs::messages::Message;
use crate::libs::secret::Secret;
use crate::libs::task::TaskRecord;
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{
    header::{COOKIE, SET_COOKIE},
    Client, RequestBuilder, Response, StatusCode,
};
use std::fs;
use std::sync::Arc;
use tracing::debug;

const SESSION_ID_FILE: &str = ".session_id";
const SECRET_FILE: &str = ".secret";
const LOGIN_URL: &str = "api/login";
const LOGOUT_URL: &str = "api/logout";
const AUTH_STATUS_URL: &str = "api/auth-status";
const CSRF_TOKEN_URL: &str = "api/csrf-token";
const TASKS_URL: &str = "api/tasks";

/// HTTP client for one TaskVault service.
///
/// Clones share the session cookie and the cached CSRF token.
#[derive(Clone, Debug)]
pub struct VaultClient {
    client: Client,
    base_url: String,
    session_id: Arc<Mutex<Option<String>>>,
    csrf_token: Arc<Mutex<Option<String>>>,
}

impl VaultClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session_id: Arc::new(Mutex::new(None)),
            csrf_token: Arc::new(Mutex::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session_id(&self) -> Option<String> {
        self.session_id.lock().clone()
    }

    pub fn set_session_id(&self, session_id: Option<String>) {
        *self.session_id.lock() = session_id;
        *self.csrf_token.lock() = None;
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn with_cookie(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session_id() {
            Some(session_id) => request.header(COOKIE, format!("{}={}", SESSION_COOKIE, session_id)),
            None => request,
        }
    }

    async fn check(res: Response) -> Result<Response, ApiError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        match status {
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => Err(ApiError::TooManyAttempts),
            _ => {
                let reason = status.canonical_reason().unwrap_or_default().to_string();
                let message = res.json::<ErrorResponse>().await.map(|body| body.error).unwrap_or(reason);
                Err(ApiError::Status {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    fn session_from_cookies(res: &Response) -> Option<String> {
        let prefix = format!("{}=", SESSION_COOKIE);
        res.headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .map(str::trim)
            .find(|part| part.starts_with(&prefix))
            .map(|part| part.trim_start_matches(&prefix).to_string())
    }

    /// Logs in and keeps the session cookie. Returns the session id.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let credentials = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let res = self.client.post(self.url(LOGIN_URL)).json(&credentials).send().await?;
        let res = match Self::check(res).await {
            Err(ApiError::Unauthorized) => return Err(ApiError::InvalidCredentials),
            other => other?,
        };

        let session_id = Self::session_from_cookies(&res).ok_or_else(|| ApiError::Status {
            status: res.status().as_u16(),
            message: "login response carried no session cookie".to_string(),
        })?;
        self.set_session_id(Some(session_id.clone()));
        debug!("logged in");
        Ok(session_id)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        let res = self.with_cookie(self.client.post(self.url(LOGOUT_URL))).send().await?;
        Self::check(res).await?;
        self.set_session_id(None);
        Ok(())
    }

    pub async fn auth_status(&self) -> Result<bool, ApiError> {
        let res = self.with_cookie(self.client.get(self.url(AUTH_STATUS_URL))).send().await?;
        let status: AuthStatusResponse = Self::check(res).await?.json().await?;
        Ok(status.authenticated)
    }

    /// Returns the session's CSRF token, fetching it on first use.
    pub async fn csrf_token(&self) -> Result<String, ApiError> {
        if let Some(token) = self.csrf_token.lock().clone() {
            return Ok(token);
        }
        let res = self.with_cookie(self.client.get(self.url(CSRF_TOKEN_URL))).send().await?;
        let body: CsrfTokenResponse = Self::check(res).await?.json().await?;
        *self.csrf_token.lock() = Some(body.csrf_token.clone());
        Ok(body.csrf_token)
    }
}

#[async_trait]
impl TaskApi for VaultClient {
    async fn load_tasks(&self) -> Result<TasksSnapshot, ApiError> {
        let res = self.with_cookie(self.client.get(self.url(TASKS_URL))).send().await?;
        Ok(Self::check(res).await?.json().await?)
    }

    async fn save_tasks(&self, items: &[TaskRecord]) -> Result<SaveReceipt, ApiError> {
        let mut refreshed = false;
        loop {
            let token = self.csrf_token().await?;
            let res = self
                .with_cookie(self.client.put(self.url(TASKS_URL)))
                .header(CSRF_HEADER, token)
                .json(&SaveRequest { items })
                .send()
                .await?;

            // A stale token gets one refresh
            if res.status() == StatusCode::FORBIDDEN && !refreshed {
                debug!("CSRF token rejected, refreshing");
                *self.csrf_token.lock() = None;
                refreshed = true;
                continue;
            }
            return Ok(Self::check(res).await?.json().await?);
        }
    }
}

/// Client session bound to the configured service and admin user.
pub struct VaultSession {
    client: VaultClient,
    username: String,
    password: Option<String>,
    secret: Secret,
    retries: i32,
}

impl VaultSession {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: VaultClient::new(&config.api_url),
            username: config.username.clone(),
            password: None,
            secret: Secret::new(SECRET_FILE, &Message::PromptPassword.to_string()),
            retries: 0,
        }
    }

    pub fn client(&self) -> &VaultClient {
        &self.client
    }

    /// Returns a client with a live session, logging in if needed.
    ///
    /// A cached session id the server no longer knows is discarded once and
    /// replaced by a fresh login.
    pub async fn connect(&mut self) -> Result<VaultClient> {
        let session_id = self.get_session_id().await?;
        self.client.set_session_id(Some(session_id));
        if self.client.auth_status().await? {
            return Ok(self.client.clone());
        }

        debug!("cached session rejected, logging in again");
        self.delete_session_id()?;
        let session_id = self.get_session_id().await?;
        self.client.set_session_id(Some(session_id));
        Ok(self.client.clone())
    }

    /// Client carrying the cached session id, without logging in.
    pub fn restore(&self) -> Option<VaultClient> {
        let path = DataStorage::new().get_path(self.session_id_file()).ok()?;
        let session_id = fs::read_to_string(path).ok()?.trim().to_string();
        if session_id.is_empty() {
            return None;
        }
        self.client.set_session_id(Some(session_id));
        Some(self.client.clone())
    }

    /// Ends the server session and forgets the cached session and password.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(client) = self.restore() {
            if let Err(e) = client.logout().await {
                debug!(error = %e, "logout request failed");
            }
        }
        self.delete_session_id()?;
        self.secret.clear()?;
        Ok(())
    }
}

impl Session for VaultSession {
    async fn login(&self) -> Result<String> {
        let password = self.password.as_deref().unwrap_or_default();
        Ok(self.client.login(&self.username, password).await?)
    }

    fn set_credentials(&mut self, password: &str) -> Result<()> {
        self.password = Some(password.to_string());
        Ok(())
    }

    fn session_id_file(&self) -> &str {
        SESSION_ID_FILE
    }

    fn secret(&self) -> Secret {
        self.secret.clone()
    }

    fn retry(&self) -> i32 {
        self.retries
    }

    fn inc_retry(&mut self) {
        self.retries += 1;
    }
}
