use super::task::{confirm_delete, open_vault, print_list, try_save};
use crate::api::vault::{VaultClient, VaultSession};
use crate::api::Session;
use crate::libs::actions::{error_message, Action, ACTIONS};
use crate::libs::autosave::Autosave;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::view::View;
use crate::{msg_error, msg_error_anyhow, msg_info, msg_print, msg_warning};
use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const PROMPT: &str = "taskvault> ";

/// Logs in again after the server dropped the session and reloads the list.
async fn reconnect(autosave: &Autosave<VaultClient>) -> Result<()> {
    msg_error!(Message::SessionExpired);
    let config = Config::read()?.client();
    let mut session = VaultSession::new(&config);
    session.delete_session_id()?;
    let client = session.connect().await?;
    autosave.api().set_session_id(client.session_id());
    autosave.load().await.map_err(|e| msg_error_anyhow!(Message::LoadFailed(e.to_string())))?;
    msg_info!(Message::SessionRestored);
    Ok(())
}

pub async fn cmd() -> Result<()> {
    let autosave = open_vault().await?;
    msg_print!(Message::ShellWelcome);
    msg_info!(Message::TasksLoaded(autosave.controller().lock().len()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", PROMPT);
        std::io::stdout().flush()?;

        // EOF ends the shell like `quit`
        let Some(line) = lines.next_line().await? else {
            break;
        };

        // A background save found the session gone and cleared the list
        if autosave.take_session_expired() {
            reconnect(&autosave).await?;
            continue;
        }

        let action = match Action::parse(&line) {
            Ok(action) => action,
            Err(e) => {
                msg_warning!(e.message());
                continue;
            }
        };

        match action {
            Action::Quit => break,
            Action::Help => View::help(ACTIONS),
            Action::List => print_list(&autosave.controller().lock()),
            Action::Save => {
                if !autosave.controller().lock().has_unsaved_changes() {
                    msg_info!(Message::NothingToSave);
                    continue;
                }
                match try_save(&autosave).await {
                    Ok(()) => {}
                    Err(Message::SessionExpired) => {
                        autosave.take_session_expired();
                        reconnect(&autosave).await?;
                    }
                    Err(message) => msg_error!(message),
                }
            }
            action => {
                let confirmed = match &action {
                    Action::Delete(index) => confirm_delete(&autosave, *index)?,
                    _ => true,
                };
                match autosave.mutate(|controller| action.apply(controller, |_, _| confirmed)) {
                    Ok(Some(message)) => msg_info!(message),
                    Ok(None) => {}
                    Err(e) => msg_warning!(error_message(&e)),
                }
            }
        }
    }

    if let Err(message) = try_save(&autosave).await {
        msg_error!(message);
    }
    if autosave.controller().lock().has_unsaved_changes() {
        msg_warning!(Message::UnsavedChangesRemain);
    }
    msg_print!(Message::ShellGoodbye);
    Ok(())
}
