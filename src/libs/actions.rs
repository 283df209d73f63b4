//! Command dispatch for the interactive shell.
//!
//! Each line the user types is parsed into an [`Action`] by looking its first
//! word up in [`ACTIONS`]. Task numbers are 1-based on the command line and
//! converted to list indices here, so the rest of the crate only sees indices.

use super::controller::{ControllerError, Deletion, TaskListController, ViewFilter};
use super::messages::Message;
use super::task::{now, TaskRecord};
use thiserror::Error;

pub struct ActionInfo {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
}

pub static ACTIONS: &[ActionInfo] = &[
    ActionInfo {
        name: "header",
        usage: "header [text]",
        description: "Append a header",
    },
    ActionInfo {
        name: "item",
        usage: "item [text]",
        description: "Append an item",
    },
    ActionInfo {
        name: "after",
        usage: "after <n> [text]",
        description: "Insert an item after task n",
    },
    ActionInfo {
        name: "edit",
        usage: "edit <n> <text>",
        description: "Change the text of task n",
    },
    ActionInfo {
        name: "toggle",
        usage: "toggle <n>",
        description: "Check off or reopen item n",
    },
    ActionInfo {
        name: "move",
        usage: "move <from> <to>",
        description: "Move task from one position to another",
    },
    ActionInfo {
        name: "delete",
        usage: "delete <n>",
        description: "Delete task n",
    },
    ActionInfo {
        name: "filter",
        usage: "filter",
        description: "Show or hide completed items",
    },
    ActionInfo {
        name: "list",
        usage: "list",
        description: "Print the task list",
    },
    ActionInfo {
        name: "save",
        usage: "save",
        description: "Save now instead of waiting",
    },
    ActionInfo {
        name: "help",
        usage: "help",
        description: "Show this help",
    },
    ActionInfo {
        name: "quit",
        usage: "quit",
        description: "Save pending changes and exit",
    },
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

impl ParseError {
    pub fn message(&self) -> Message {
        match self {
            ParseError::Empty => Message::ShellUsage("help".to_string()),
            ParseError::Unknown(name) => Message::ShellUnknownCommand(name.clone()),
            ParseError::Usage(usage) => Message::ShellUsage(usage.to_string()),
        }
    }
}

/// One shell command. Positions are 0-based list indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Header(Option<String>),
    Item(Option<String>),
    After(usize, Option<String>),
    Edit(usize, String),
    Toggle(usize),
    Move(usize, usize),
    Delete(usize),
    Filter,
    List,
    Save,
    Help,
    Quit,
}

fn optional_text(rest: &str) -> Option<String> {
    match rest.trim() {
        "" => None,
        text => Some(text.to_string()),
    }
}

/// Splits off the first word and returns it with the trimmed remainder.
fn next_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

fn position(word: &str, usage: &'static str) -> Result<usize, ParseError> {
    match word.parse::<usize>() {
        Ok(number) if number > 0 => Ok(number - 1),
        _ => Err(ParseError::Usage(usage)),
    }
}

impl Action {
    pub fn parse(line: &str) -> Result<Action, ParseError> {
        let (name, rest) = next_word(line);
        if name.is_empty() {
            return Err(ParseError::Empty);
        }
        let info = ACTIONS
            .iter()
            .find(|info| info.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ParseError::Unknown(name.to_string()))?;
        let usage = info.usage;

        let action = match info.name {
            "header" => Action::Header(optional_text(rest)),
            "item" => Action::Item(optional_text(rest)),
            "after" => {
                let (number, text) = next_word(rest);
                Action::After(position(number, usage)?, optional_text(text))
            }
            "edit" => {
                let (number, text) = next_word(rest);
                let index = position(number, usage)?;
                match optional_text(text) {
                    Some(text) => Action::Edit(index, text),
                    None => return Err(ParseError::Usage(usage)),
                }
            }
            "toggle" => Action::Toggle(position(rest, usage)?),
            "move" => {
                let (from, to) = next_word(rest);
                Action::Move(position(from, usage)?, position(to, usage)?)
            }
            "delete" => Action::Delete(position(rest, usage)?),
            "filter" => Action::Filter,
            "list" => Action::List,
            "save" => Action::Save,
            "help" => Action::Help,
            _ => Action::Quit,
        };
        Ok(action)
    }

    /// Whether the action changes the list and should trigger an autosave.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Action::Header(_) | Action::Item(_) | Action::After(..) | Action::Edit(..) | Action::Toggle(_) | Action::Move(..) | Action::Delete(_)
        )
    }

    /// Runs the action against `controller` and describes the result.
    ///
    /// `confirm` is consulted before deleting a header that still has items.
    /// Actions the shell handles itself (`list`, `save`, `help`, `quit`)
    /// return `None`.
    pub fn apply<F>(&self, controller: &mut TaskListController, confirm: F) -> Result<Option<Message>, ControllerError>
    where
        F: FnOnce(&TaskRecord, usize) -> bool,
    {
        let message = match self {
            Action::Header(text) => {
                let index = match text {
                    Some(text) => controller.add_header_with_text(text),
                    None => controller.add_header(),
                };
                Message::TaskAdded(controller.tasks()[index].text.clone())
            }
            Action::Item(text) => {
                let index = match text {
                    Some(text) => controller.add_item_with_text(text),
                    None => controller.add_item(),
                };
                Message::TaskAdded(controller.tasks()[index].text.clone())
            }
            Action::After(after, text) => {
                let index = match text {
                    Some(text) => controller.add_item_after_with_text(*after, text)?,
                    None => controller.add_item_after(*after)?,
                };
                Message::TaskAdded(controller.tasks()[index].text.clone())
            }
            Action::Edit(index, text) => {
                controller.update_task_text(*index, text)?;
                Message::TaskUpdated(index + 1)
            }
            Action::Toggle(index) => {
                let done = controller.toggle_task(*index, now())?;
                let text = controller.tasks()[*index].text.clone();
                match done {
                    true => Message::TaskCompleted(text),
                    false => Message::TaskReopened(text),
                }
            }
            Action::Move(from, to) => {
                controller.move_task(*from, *to)?;
                Message::TaskMoved(from + 1, (*to).min(controller.len() - 1) + 1)
            }
            Action::Delete(index) => match controller.delete_task(*index, confirm)? {
                Deletion::Deleted(task) => Message::TaskDeleted(task.text),
                Deletion::Cancelled => Message::DeleteCancelled,
            },
            Action::Filter => match controller.toggle_filter() {
                ViewFilter::All => Message::FilterShowAll,
                ViewFilter::HideCompleted => Message::FilterHideCompleted,
            },
            Action::List | Action::Save | Action::Help | Action::Quit => return Ok(None),
        };
        Ok(Some(message))
    }
}

/// User-facing text for a controller error, with 1-based task numbers.
pub fn error_message(error: &ControllerError) -> Message {
    match error {
        ControllerError::IndexOutOfRange { index, len } => Message::TaskIndexOutOfRange(index + 1, *len),
        ControllerError::NotAnItem(index) => Message::HeaderCannotBeToggled(index + 1),
    }
}
