//! Client side of the TaskVault HTTP API.
//!
//! - [`TaskApi`] is the seam between the client state controller and the
//!   network: load the full list, save the full list.
//! - [`VaultClient`](vault::VaultClient) implements it over `reqwest`.
//! - [`Session`] caches the session id on disk and re-authenticates with the
//!   encrypted password cache when the session is gone.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskvault::api::{vault::VaultSession, Session, TaskApi};
//! use taskvault::libs::config::ClientConfig;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut session = VaultSession::new(&ClientConfig::default());
//! let client = session.connect().await?;
//! let snapshot = client.load_tasks().await?;
//! println!("{} tasks", snapshot.items.len());
//! # Ok(())
//! # }
//! ```

use crate::libs::data_storage::DataStorage;
use crate::libs::messages::Message;
use crate::libs::secret::Secret;
use crate::libs::task::TaskRecord;
use crate::msg_error_anyhow;
use anyhow::Result;
use async_trait::async_trait;
use std::fs;
use thiserror::Error;

pub mod types;
pub mod vault;

pub use types::{SaveReceipt, TasksSnapshot};

/// Maximum number of authentication retry attempts before giving up.
const MAX_RETRY_COUNT: i32 = 3;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthorized,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("too many login attempts, try again later")]
    TooManyAttempts,
    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// Full-list load and save, the only two operations the controller needs.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn load_tasks(&self) -> Result<TasksSnapshot, ApiError>;

    /// Replaces the stored list with `items` and returns the save time.
    async fn save_tasks(&self, items: &[TaskRecord]) -> Result<SaveReceipt, ApiError>;
}

/// Session management for the client.
///
/// A valid session id is restored from the data directory when possible.
/// Otherwise the password comes from the encrypted cache (or a prompt) and
/// login is retried up to [`MAX_RETRY_COUNT`] times, prompting again after
/// each failure.
#[allow(async_fn_in_trait)]
pub trait Session {
    /// Authenticates with the stored credentials and returns the session id.
    async fn login(&self) -> Result<String>;

    fn set_credentials(&mut self, password: &str) -> Result<()>;

    /// File name of the cached session id inside the data directory.
    fn session_id_file(&self) -> &str;

    fn secret(&self) -> Secret;

    fn retry(&self) -> i32;

    fn inc_retry(&mut self);

    /// Returns a cached session id or logs in to get a new one.
    async fn get_session_id(&mut self) -> Result<String> {
        let session_id_file_path = DataStorage::new().get_path(self.session_id_file())?;

        if let Ok(session_id) = fs::read_to_string(&session_id_file_path) {
            let session_id = session_id.trim().to_string();
            if !session_id.is_empty() {
                return Ok(session_id);
            }
        }

        loop {
            let password = match self.retry() > 0 {
                true => self.secret().prompt()?,
                false => self.secret().get_or_prompt()?,
            };
            self.set_credentials(&password)?;

            match self.login().await {
                Ok(session_id) => {
                    let _ = fs::write(&session_id_file_path, &session_id);
                    return Ok(session_id);
                }
                Err(e) => {
                    tracing::debug!(error = %e, attempt = self.retry(), "login attempt failed");
                    // Only a rejected password is worth another prompt
                    if !matches!(e.downcast_ref::<ApiError>(), Some(ApiError::InvalidCredentials)) {
                        break Err(e);
                    }
                    if self.retry() < MAX_RETRY_COUNT {
                        self.inc_retry();
                        continue;
                    }
                    break Err(msg_error_anyhow!(Message::WrongPassword(MAX_RETRY_COUNT)));
                }
            }
        }
    }

    /// Deletes the cached session id. A missing file is not an error.
    fn delete_session_id(&self) -> Result<()> {
        let session_id_file_path = DataStorage::new().get_path(self.session_id_file())?;
        match fs::remove_file(session_id_file_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
