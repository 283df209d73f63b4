//! Human-readable text for every [`Message`].
//!
//! All user-facing wording lives here so commands only deal with typed
//! messages and their parameters.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            // === TASK MESSAGES ===
            Message::TasksHeader => "TASKS".to_string(),
            Message::TasksEmpty => "The task list is empty. Add a header or an item to get started.".to_string(),
            Message::TasksLoaded(count) => format!("Loaded {} task(s)", count),
            Message::TaskAdded(text) => format!("Added '{}'", text),
            Message::TaskUpdated(number) => format!("Task #{} updated", number),
            Message::TaskDeleted(text) => format!("Deleted '{}'", text),
            Message::TaskMoved(from, to) => format!("Moved task #{} to position #{}", from, to),
            Message::TaskCompleted(text) => format!("Completed '{}'", text),
            Message::TaskReopened(text) => format!("Reopened '{}'", text),
            Message::TaskIndexOutOfRange(number, len) => format!("There is no task #{} (the list has {} task(s))", number, len),
            Message::HeaderCannotBeToggled(number) => format!("Task #{} is a header and cannot be checked off", number),
            Message::ConfirmDeleteHeader { text, items } => {
                format!("Header '{}' has {} item(s) under it. Delete the header anyway?", text, items)
            }
            Message::DeleteCancelled => "Deletion cancelled".to_string(),
            Message::FilterShowAll => "Showing all tasks".to_string(),
            Message::FilterHideCompleted => "Hiding completed items".to_string(),

            // === SAVE MESSAGES ===
            Message::TasksSaved(last_saved) => format!("Saved at {}", last_saved),
            Message::NothingToSave => "No unsaved changes".to_string(),
            Message::SaveFailed(error) => format!("Failed to save tasks: {}", error),
            Message::LoadFailed(error) => format!("Failed to load tasks: {}", error),
            Message::UnsavedChangesRemain => "Some changes could not be saved and are lost when the client exits".to_string(),

            // === SHELL MESSAGES ===
            Message::ShellWelcome => "TaskVault shell. Changes are saved automatically. Type 'help' for commands.".to_string(),
            Message::ShellUnknownCommand(name) => format!("Unknown command '{}'. Type 'help' for commands.", name),
            Message::ShellUsage(usage) => format!("Usage: {}", usage),
            Message::ShellGoodbye => "Bye!".to_string(),

            // === CONFIGURATION MESSAGES ===
            Message::ConfigSaved => "Configuration saved successfully".to_string(),
            Message::ConfigModuleServer => "Server settings".to_string(),
            Message::ConfigModuleClient => "Client settings".to_string(),
            Message::ClientConfigMissing => "Client is not configured. Run 'taskvault init' first.".to_string(),
            Message::AdminCredentialsMissing => "ADMIN_USER and ADMIN_PASS must be set in the environment or in .env".to_string(),

            // === SERVER MESSAGES ===
            Message::ServerListening(addr) => format!("TaskVault running on {}", addr),
            Message::ServerDataFile(path) => format!("Task document: {}", path),
            Message::ServerShuttingDown => "Shutting down".to_string(),
            Message::ServerSignalHandlerFailed(error) => format!("Failed to listen for shutdown signal: {}", error),

            // === AUTHENTICATION MESSAGES ===
            Message::LoginSucceeded(user) => format!("Logged in as {}", user),
            Message::LoggedOut => "Logged out".to_string(),
            Message::NotLoggedIn => "Not logged in. Run 'taskvault login'.".to_string(),
            Message::SessionExpired => "Session expired, please log in again".to_string(),
            Message::SessionRestored => "Logged in again and reloaded the list. The last command was not applied.".to_string(),
            Message::WrongPassword(count) => format!("You entered the wrong password {} times!", count),
            Message::AuthStatus(true) => "Authenticated".to_string(),
            Message::AuthStatus(false) => "Not authenticated".to_string(),
            Message::TooManyLoginAttempts => "Too many login attempts, try again later".to_string(),

            // === PROMPTS ===
            Message::PromptSelectModules => "Select settings to configure".to_string(),
            Message::PromptServerHost => "Address to listen on".to_string(),
            Message::PromptServerPort => "Port to listen on".to_string(),
            Message::PromptServerDataDir => "Directory for tasks.json (empty for default)".to_string(),
            Message::PromptSessionTtl => "Session lifetime (hours)".to_string(),
            Message::PromptApiUrl => "TaskVault server URL".to_string(),
            Message::PromptUsername => "Admin username".to_string(),
            Message::PromptAutosaveDelay => "Autosave delay after the last edit (milliseconds)".to_string(),
            Message::PromptPassword => "Enter your TaskVault password".to_string(),
        };
        write!(f, "{}", text)
    }
}
