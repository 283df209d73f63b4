use super::actions::ActionInfo;
use super::controller::ViewEntry;
use super::task::Timestamp;
use chrono::Local;
use prettytable::{row, Table};

pub struct View {}

impl View {
    pub fn tasks(entries: &[ViewEntry<'_>]) {
        let mut table = Table::new();

        table.add_row(row!["#", "", "TEXT", "CREATED", "COMPLETED"]);
        for entry in entries {
            let task = entry.task;
            let marker = match (task.is_header(), task.done) {
                (true, _) => "##",
                (false, true) => "[x]",
                (false, false) => "[ ]",
            };
            table.add_row(row![
                entry.index + 1,
                marker,
                task.text,
                Self::format_time(task.created_at),
                Self::format_time(task.completed_at)
            ]);
        }
        table.printstd();
    }

    pub fn help(actions: &[ActionInfo]) {
        let mut table = Table::new();

        table.add_row(row!["COMMAND", "DESCRIPTION"]);
        for action in actions {
            table.add_row(row![action.usage, action.description]);
        }
        table.printstd();
    }

    pub fn format_time(time: Option<Timestamp>) -> String {
        time.map(|time| time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()).unwrap_or_default()
    }
}
