//! Configuration for the TaskVault service and its terminal client.
//!
//! Settings live in `config.json` in the data directory. Both sections are
//! optional: a missing section means defaults. The environment (with `.env`
//! loaded through `dotenv` at startup) overrides the file for the values a
//! deployment usually sets per host:
//!
//! - `ADMIN_USER`, `ADMIN_PASS`: the single admin account, required by `serve`
//! - `PORT`: listening port
//! - `DATA_DIR`: directory holding `tasks.json`
//!
//! ```rust,no_run
//! use taskvault::libs::config::Config;
//!
//! let config = Config::read()?;
//! let server = config.server.unwrap_or_default().with_env();
//! println!("listening on {}", server.address());
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::autosave::DEFAULT_AUTOSAVE_DELAY;
use super::data_storage::DataStorage;
use crate::libs::messages::Message;
use crate::{msg_error_anyhow, msg_print};
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input, MultiSelect};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::{self, File};
use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "config.json";

pub const ADMIN_USER_ENV: &str = "ADMIN_USER";
pub const ADMIN_PASS_ENV: &str = "ADMIN_PASS";
pub const PORT_ENV: &str = "PORT";
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// A section offered by the setup wizard.
#[derive(Debug, Clone)]
pub struct ConfigModule {
    pub key: String,
    pub name: String,
}

/// Settings for `taskvault serve`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory for `tasks.json`. `None` means the per-user data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub session_ttl_hours: u64,
    /// Failed logins allowed per client address within the window.
    pub login_max_attempts: u32,
    pub login_window_minutes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            data_dir: None,
            session_ttl_hours: 24,
            login_max_attempts: 5,
            login_window_minutes: 15,
        }
    }
}

impl ServerConfig {
    pub fn module() -> ConfigModule {
        ConfigModule {
            key: "server".to_string(),
            name: "Server".to_string(),
        }
    }

    /// Applies `PORT` and `DATA_DIR` from the environment.
    ///
    /// An unparsable `PORT` is ignored.
    pub fn with_env(mut self) -> Self {
        if let Some(port) = env::var(PORT_ENV).ok().and_then(|port| port.trim().parse().ok()) {
            self.port = port;
        }
        if let Ok(dir) = env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                self.data_dir = Some(PathBuf::from(dir.trim()));
            }
        }
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_hours * 60 * 60)
    }

    pub fn login_window(&self) -> Duration {
        Duration::from_secs(self.login_window_minutes * 60)
    }

    fn init(current: &Option<ServerConfig>) -> Result<Self> {
        let default = current.clone().unwrap_or_default();
        msg_print!(Message::ConfigModuleServer);

        let data_dir: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptServerDataDir.to_string())
            .default(default.data_dir.as_ref().map(|dir| dir.display().to_string()).unwrap_or_default())
            .allow_empty(true)
            .interact_text()?;

        Ok(Self {
            host: Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptServerHost.to_string())
                .default(default.host)
                .interact_text()?,
            port: Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptServerPort.to_string())
                .default(default.port)
                .interact_text()?,
            data_dir: match data_dir.trim() {
                "" => None,
                dir => Some(PathBuf::from(dir)),
            },
            session_ttl_hours: Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptSessionTtl.to_string())
                .default(default.session_ttl_hours)
                .interact_text()?,
            ..default
        })
    }
}

/// Settings for the terminal client.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub api_url: String,
    pub username: String,
    /// Quiet period before pending edits are saved.
    pub autosave_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            username: "admin".to_string(),
            autosave_delay_ms: DEFAULT_AUTOSAVE_DELAY.as_millis() as u64,
        }
    }
}

impl ClientConfig {
    pub fn module() -> ConfigModule {
        ConfigModule {
            key: "client".to_string(),
            name: "Client".to_string(),
        }
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    fn init(current: &Option<ClientConfig>) -> Result<Self> {
        let default = current.clone().unwrap_or_default();
        msg_print!(Message::ConfigModuleClient);

        Ok(Self {
            api_url: Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptApiUrl.to_string())
                .default(default.api_url)
                .interact_text()?,
            username: Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptUsername.to_string())
                .default(default.username)
                .interact_text()?,
            autosave_delay_ms: Input::with_theme(&ColorfulTheme::default())
                .with_prompt(Message::PromptAutosaveDelay.to_string())
                .default(default.autosave_delay_ms)
                .interact_text()?,
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientConfig>,
}

impl Config {
    /// Reads `config.json`, or returns defaults when there is none.
    pub fn read() -> Result<Config> {
        Self::read_from(DataStorage::new())
    }

    pub fn read_from(storage: DataStorage) -> Result<Config> {
        let config_file_path = storage.get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(DataStorage::new())
    }

    pub fn save_to(&self, storage: DataStorage) -> Result<()> {
        let config_file_path = storage.get_path(CONFIG_FILE_NAME)?;
        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Interactive wizard over the selected sections, seeded from the current file.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();
        let modules = [ServerConfig::module(), ClientConfig::module()];

        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptSelectModules.to_string())
            .items(&modules.iter().map(|module| &module.name).collect::<Vec<_>>())
            .interact()?;

        for &selection in &selected {
            match modules[selection].key.as_str() {
                "server" => config.server = Some(ServerConfig::init(&config.server)?),
                "client" => config.client = Some(ClientConfig::init(&config.client)?),
                _ => {}
            }
        }

        Ok(config)
    }

    /// Server section with environment overrides applied.
    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default().with_env()
    }

    pub fn client(&self) -> ClientConfig {
        self.client.clone().unwrap_or_default()
    }
}

/// The single admin account, taken from `ADMIN_USER` and `ADMIN_PASS`.
#[derive(Clone, PartialEq)]
pub struct AdminCredentials {
    pub username: String,
    password: String,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials").field("username", &self.username).finish_non_exhaustive()
    }
}

impl AdminCredentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Fails when either variable is unset or empty.
    pub fn from_env() -> Result<Self> {
        let username = env::var(ADMIN_USER_ENV).unwrap_or_default();
        let password = env::var(ADMIN_PASS_ENV).unwrap_or_default();
        if username.is_empty() || password.is_empty() {
            return Err(msg_error_anyhow!(Message::AdminCredentialsMissing));
        }
        Ok(Self::new(&username, &password))
    }

    pub fn matches(&self, username: &str, password: &str) -> bool {
        constant_time_eq(self.username.as_bytes(), username.as_bytes()) & constant_time_eq(self.password.as_bytes(), password.as_bytes())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
