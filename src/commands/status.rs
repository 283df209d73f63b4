use crate::api::vault::VaultSession;
use crate::libs::{config::Config, messages::Message};
use crate::{msg_info, msg_warning};
use anyhow::Result;

pub async fn cmd() -> Result<()> {
    let config = Config::read()?.client();
    match VaultSession::new(&config).restore() {
        Some(client) => msg_info!(Message::AuthStatus(client.auth_status().await?)),
        None => msg_warning!(Message::NotLoggedIn),
    }
    Ok(())
}
