//! The TaskVault HTTP service.
//!
//! A single admin logs in with the credentials from the environment and
//! reads or replaces the whole task list:
//!
//! - `POST /api/login`, `POST /api/logout`, `GET /api/auth-status`
//! - `GET /api/csrf-token`: token required by `PUT /api/tasks`
//! - `GET /api/tasks`, `PUT /api/tasks`
//! - `GET /health`
//!
//! Saves run the reconciliation in [`crate::libs::reconcile`] against the
//! stored list while holding the store lock, so concurrent saves are applied
//! one after the other and the last one wins.

pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod session;

use crate::db::tasks::TaskStore;
use crate::libs::config::{AdminCredentials, ServerConfig};
use crate::libs::messages::Message;
use crate::{msg_error, msg_info, msg_print};
use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use rate_limit::LoginLimiter;
use session::SessionStore;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub store: Mutex<TaskStore>,
    pub sessions: SessionStore,
    pub credentials: AdminCredentials,
    pub limiter: LoginLimiter,
}

impl AppState {
    pub fn new(store: TaskStore, credentials: AdminCredentials, config: &ServerConfig) -> Self {
        Self {
            store: Mutex::new(store),
            sessions: SessionStore::new(config.session_ttl()),
            credentials,
            limiter: LoginLimiter::new(config.login_max_attempts, config.login_window()),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route("/api/auth-status", get(handlers::auth_status))
        .route("/api/csrf-token", get(handlers::csrf_token))
        .route("/api/tasks", get(handlers::get_tasks).put(handlers::put_tasks).post(handlers::put_tasks))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves `state` on an already bound listener until `shutdown` resolves.
pub async fn serve_on<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state).into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await
}

/// Runs the service until Ctrl-C or SIGTERM.
pub async fn serve(config: ServerConfig, credentials: AdminCredentials) -> Result<()> {
    let store = match &config.data_dir {
        Some(dir) => TaskStore::in_dir(dir),
        None => TaskStore::new()?,
    };
    msg_print!(Message::ServerDataFile(store.path().display().to_string()));

    let state = Arc::new(AppState::new(store, credentials, &config));
    let listener = TcpListener::bind(config.address()).await?;
    msg_print!(Message::ServerListening(listener.local_addr()?.to_string()));

    serve_on(listener, state, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            msg_error!(Message::ServerSignalHandlerFailed(e.to_string()));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                msg_error!(Message::ServerSignalHandlerFailed(e.to_string()));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    msg_info!(Message::ServerShuttingDown);
}
