use crate::api::vault::VaultSession;
use crate::libs::{config::Config, messages::Message};
use crate::msg_success;
use anyhow::Result;

pub async fn cmd() -> Result<()> {
    let config = Config::read()?.client();
    VaultSession::new(&config).disconnect().await?;
    msg_success!(Message::LoggedOut);
    Ok(())
}
