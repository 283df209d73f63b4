use crate::api::vault::{VaultClient, VaultSession};
use crate::api::ApiError;
use crate::libs::actions::{error_message, Action};
use crate::libs::autosave::Autosave;
use crate::libs::config::Config;
use crate::libs::controller::{TaskListController, ViewFilter};
use crate::libs::messages::Message;
use crate::libs::view::View;
use crate::{msg_error_anyhow, msg_info, msg_success};
use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Hide completed items (headers stay visible)
    #[arg(long)]
    hide_completed: bool,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Add a header instead of an item
    #[arg(long, conflicts_with = "after")]
    header: bool,
    /// Insert the item right after task N
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    after: Option<u64>,
    text: Option<String>,
}

#[derive(Debug, Args)]
pub struct NumberArgs {
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    number: u64,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    number: u64,
    text: String,
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    from: u64,
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    to: u64,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[arg(value_parser = clap::value_parser!(u64).range(1..))]
    number: u64,
    /// Delete a header with items without asking
    #[arg(short, long)]
    yes: bool,
}

fn index(number: u64) -> usize {
    number.saturating_sub(1) as usize
}

/// Logs in (or reuses the cached session) and loads the list.
pub async fn open_vault() -> Result<Autosave<VaultClient>> {
    let config = Config::read()?.client();
    let client = VaultSession::new(&config).connect().await?;
    let autosave = Autosave::new(client, config.autosave_delay());
    autosave.load().await.map_err(|e| msg_error_anyhow!(Message::LoadFailed(e.to_string())))?;
    Ok(autosave)
}

/// Asks before deleting a header that still has items.
///
/// The controller lock is released before prompting.
pub fn confirm_delete(autosave: &Autosave<VaultClient>, index: usize) -> Result<bool> {
    let (text, items) = {
        let controller = autosave.controller().lock();
        let items = controller.header_item_count(index);
        (controller.get(index).map(|task| task.text.clone()).unwrap_or_default(), items)
    };
    if items == 0 {
        return Ok(true);
    }
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::ConfirmDeleteHeader { text, items }.to_string())
        .default(false)
        .interact()?)
}

/// Applies `action`, then saves right away.
async fn run(action: Action, confirmed: Option<bool>) -> Result<()> {
    let autosave = open_vault().await?;
    let confirmed = match (&action, confirmed) {
        (_, Some(confirmed)) => confirmed,
        (Action::Delete(index), None) => confirm_delete(&autosave, *index)?,
        _ => true,
    };

    let message = autosave
        .mutate(|controller| action.apply(controller, |_, _| confirmed))
        .map_err(|e| msg_error_anyhow!(error_message(&e)))?;
    if let Some(message) = message {
        msg_success!(message);
    }

    save(&autosave).await
}

/// Saves pending changes now. A failure comes back as the message to show.
pub async fn try_save(autosave: &Autosave<VaultClient>) -> Result<(), Message> {
    match autosave.flush_when_idle().await {
        Ok(Some(saved_at)) => {
            msg_info!(Message::TasksSaved(View::format_time(Some(saved_at))));
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(ApiError::Unauthorized) => Err(Message::SessionExpired),
        Err(e) => Err(Message::SaveFailed(e.to_string())),
    }
}

/// Saves pending changes now and reports the outcome.
pub async fn save(autosave: &Autosave<VaultClient>) -> Result<()> {
    try_save(autosave).await.map_err(|message| msg_error_anyhow!(message))
}

pub fn print_list(controller: &TaskListController) {
    if controller.is_empty() {
        msg_info!(Message::TasksEmpty);
        return;
    }
    View::tasks(&controller.filtered_view());
}

pub async fn list(args: ListArgs) -> Result<()> {
    let autosave = open_vault().await?;
    let mut controller = autosave.controller().lock();
    if args.hide_completed {
        controller.set_filter(ViewFilter::HideCompleted);
    }
    print_list(&controller);
    Ok(())
}

pub async fn add(args: AddArgs) -> Result<()> {
    let action = match (args.header, args.after) {
        (true, _) => Action::Header(args.text),
        (false, Some(after)) => Action::After(index(after), args.text),
        (false, None) => Action::Item(args.text),
    };
    run(action, None).await
}

pub async fn edit(args: EditArgs) -> Result<()> {
    run(Action::Edit(index(args.number), args.text), None).await
}

pub async fn toggle(args: NumberArgs) -> Result<()> {
    run(Action::Toggle(index(args.number)), None).await
}

pub async fn move_to(args: MoveArgs) -> Result<()> {
    run(Action::Move(index(args.from), index(args.to)), None).await
}

pub async fn delete(args: DeleteArgs) -> Result<()> {
    run(Action::Delete(index(args.number)), args.yes.then_some(true)).await
}
