use super::error::ServerError;
use super::session::{expired_session_cookie, session_cookie, session_id};
use super::AppState;
use crate::api::types::{
    AuthStatusResponse, CsrfTokenResponse, HealthResponse, LoginRequest, SaveReceipt, SuccessResponse, TasksSnapshot, CSRF_HEADER,
};
use crate::libs::reconcile::{reconcile, validate_payload};
use crate::libs::task;
use axum::body::Bytes;
use axum::extract::{ConnectInfo, FromRequestParts, State};
use axum::http::header::SET_COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tracing::{info, warn};

/// Address of the peer, or `0.0.0.0` when the connection info is unavailable.
#[derive(Debug, Clone, Copy)]
pub struct ClientAddr(pub IpAddr);

impl<S: Send + Sync> FromRequestParts<S> for ClientAddr {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        Ok(ClientAddr(addr))
    }
}

/// Id of a live session. Rejects the request with 401 otherwise.
#[derive(Debug, Clone)]
pub struct AuthSession(pub String);

impl FromRequestParts<Arc<AppState>> for AuthSession {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        match session_id(&parts.headers) {
            Some(id) if state.sessions.is_valid(&id) => Ok(AuthSession(id)),
            _ => Err(ServerError::Unauthorized),
        }
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: task::now(),
    })
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ClientAddr(addr): ClientAddr,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ServerError> {
    if !state.limiter.try_acquire(addr) {
        warn!(%addr, "login throttled");
        return Err(ServerError::TooManyAttempts);
    }

    let credentials: LoginRequest = serde_json::from_slice(&body).map_err(|e| ServerError::BadRequest(e.to_string()))?;
    if !state.credentials.matches(&credentials.username, &credentials.password) {
        warn!(%addr, "failed login attempt");
        return Err(ServerError::InvalidCredentials);
    }
    state.limiter.reset(addr);

    if let Some(previous) = session_id(&headers) {
        state.sessions.destroy(&previous);
    }
    let id = state.sessions.create();
    info!(user = %credentials.username, "admin logged in");

    Ok(([(SET_COOKIE, session_cookie(&id, state.sessions.ttl()))], Json(SuccessResponse { success: true })))
}

pub async fn logout(State(state): State<Arc<AppState>>, AuthSession(id): AuthSession) -> impl IntoResponse {
    state.sessions.destroy(&id);
    info!("admin logged out");
    ([(SET_COOKIE, expired_session_cookie())], Json(SuccessResponse { success: true }))
}

pub async fn auth_status(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Json<AuthStatusResponse> {
    let authenticated = session_id(&headers).is_some_and(|id| state.sessions.is_valid(&id));
    Json(AuthStatusResponse { authenticated })
}

pub async fn csrf_token(State(state): State<Arc<AppState>>, AuthSession(id): AuthSession) -> Result<Json<CsrfTokenResponse>, ServerError> {
    let csrf_token = state.sessions.csrf_token(&id).ok_or(ServerError::Unauthorized)?;
    Ok(Json(CsrfTokenResponse { csrf_token }))
}

pub async fn get_tasks(State(state): State<Arc<AppState>>, _session: AuthSession) -> Result<Json<TasksSnapshot>, ServerError> {
    let loaded = state.store.lock().await.load().map_err(ServerError::Load)?;
    Ok(Json(TasksSnapshot {
        items: loaded.tasks,
        last_saved: loaded.last_saved,
    }))
}

pub async fn put_tasks(
    State(state): State<Arc<AppState>>,
    AuthSession(id): AuthSession,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SaveReceipt>, ServerError> {
    let token = headers.get(CSRF_HEADER).and_then(|value| value.to_str().ok()).unwrap_or_default();
    if !state.sessions.verify_csrf(&id, token) {
        return Err(ServerError::InvalidCsrfToken);
    }

    let payload: serde_json::Value = serde_json::from_slice(&body).map_err(|e| ServerError::BadRequest(e.to_string()))?;
    let incoming = validate_payload(payload)?;

    let mut store = state.store.lock().await;
    let stored = store.load().map_err(ServerError::Load)?;
    let tasks = reconcile(incoming, &stored.tasks, task::now());
    let last_saved = store.save(&tasks).map_err(ServerError::Save)?;
    info!(count = tasks.len(), "task list saved");

    Ok(Json(SaveReceipt { success: true, last_saved }))
}
