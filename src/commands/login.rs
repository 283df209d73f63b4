use crate::api::{vault::VaultSession, Session};
use crate::libs::{config::Config, messages::Message};
use crate::msg_success;
use anyhow::Result;

pub async fn cmd() -> Result<()> {
    let config = Config::read()?.client();
    let mut session = VaultSession::new(&config);
    session.delete_session_id()?;
    session.connect().await?;
    msg_success!(Message::LoginSucceeded(config.username));
    Ok(())
}
