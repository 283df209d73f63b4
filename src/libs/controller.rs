//! Client-side owner of the task list.
//!
//! [`TaskListController`] holds the list the user is editing together with the
//! view filter and the change-tracking flags. Every mutation is synchronous
//! and marks the list dirty; persisting is a separate two-step protocol
//! ([`begin_save`](TaskListController::begin_save) /
//! [`finish_save`](TaskListController::finish_save)) so the network round trip
//! can run without holding the controller.
//!
//! The controller has no I/O of its own. The debounced flush lives in
//! [`autosave`](super::autosave).

use super::task::{TaskList, TaskRecord, Timestamp, DEFAULT_HEADER_TEXT, DEFAULT_ITEM_TEXT};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControllerError {
    #[error("no task at index {index} (list has {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("task at index {0} is a header")]
    NotAnItem(usize),
}

/// Which records the view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewFilter {
    #[default]
    All,
    /// Completed items are hidden; headers always stay visible.
    HideCompleted,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    /// Unsaved changes are waiting for the next flush.
    Pending,
    Saving,
    Saved(Timestamp),
    Error(String),
}

/// A visible record and its position in the full list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewEntry<'a> {
    pub index: usize,
    pub task: &'a TaskRecord,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Deletion {
    Deleted(TaskRecord),
    Cancelled,
}

#[derive(Debug, Default)]
pub struct TaskListController {
    tasks: TaskList,
    filter: ViewFilter,
    has_unsaved_changes: bool,
    is_saving: bool,
    status: SaveStatus,
    last_saved: Option<Timestamp>,
}

impl TaskListController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: TaskList) -> Self {
        Self { tasks, ..Self::default() }
    }

    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn get(&self, index: usize) -> Option<&TaskRecord> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn filter(&self) -> ViewFilter {
        self.filter
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    pub fn save_status(&self) -> &SaveStatus {
        &self.status
    }

    pub fn last_saved(&self) -> Option<Timestamp> {
        self.last_saved
    }

    fn check_index(&self, index: usize) -> Result<(), ControllerError> {
        if index < self.tasks.len() {
            Ok(())
        } else {
            Err(ControllerError::IndexOutOfRange { index, len: self.tasks.len() })
        }
    }

    fn mark_dirty(&mut self) {
        self.has_unsaved_changes = true;
        if !self.is_saving {
            self.status = SaveStatus::Pending;
        }
    }

    /// Appends a header with the default text and returns its index.
    pub fn add_header(&mut self) -> usize {
        self.add_header_with_text(DEFAULT_HEADER_TEXT)
    }

    pub fn add_header_with_text(&mut self, text: &str) -> usize {
        self.tasks.push(TaskRecord::header(text));
        self.mark_dirty();
        self.tasks.len() - 1
    }

    /// Appends an item with the default text and returns its index.
    pub fn add_item(&mut self) -> usize {
        self.add_item_with_text(DEFAULT_ITEM_TEXT)
    }

    pub fn add_item_with_text(&mut self, text: &str) -> usize {
        self.tasks.push(TaskRecord::item(text));
        self.mark_dirty();
        self.tasks.len() - 1
    }

    /// Inserts a new item directly after `index` and returns the new index.
    pub fn add_item_after(&mut self, index: usize) -> Result<usize, ControllerError> {
        self.add_item_after_with_text(index, DEFAULT_ITEM_TEXT)
    }

    pub fn add_item_after_with_text(&mut self, index: usize, text: &str) -> Result<usize, ControllerError> {
        self.check_index(index)?;
        self.tasks.insert(index + 1, TaskRecord::item(text));
        self.mark_dirty();
        Ok(index + 1)
    }

    /// Number of items grouped under the header at `index`.
    ///
    /// Zero when `index` is not a header.
    pub fn header_item_count(&self, index: usize) -> usize {
        match self.tasks.get(index) {
            Some(task) if task.is_header() => self.tasks[index + 1..].iter().take_while(|task| !task.is_header()).filter(|task| task.is_item()).count(),
            _ => 0,
        }
    }

    /// Whether deleting `index` needs the user's confirmation.
    pub fn header_has_items(&self, index: usize) -> bool {
        self.header_item_count(index) > 0
    }

    /// Removes the record at `index`.
    ///
    /// Deleting a header that still groups items asks `confirm` first, passing
    /// the header and its item count. A declined confirmation changes nothing.
    pub fn delete_task<F>(&mut self, index: usize, confirm: F) -> Result<Deletion, ControllerError>
    where
        F: FnOnce(&TaskRecord, usize) -> bool,
    {
        self.check_index(index)?;
        let items = self.header_item_count(index);
        if items > 0 && !confirm(&self.tasks[index], items) {
            return Ok(Deletion::Cancelled);
        }
        let removed = self.tasks.remove(index);
        self.mark_dirty();
        Ok(Deletion::Deleted(removed))
    }

    /// Flips `done` on the item at `index` and stamps or clears `completedAt`.
    ///
    /// Returns the new `done` value. The server applies the same rule on save,
    /// so the local stamp is only a preview until the round trip confirms it.
    pub fn toggle_task(&mut self, index: usize, now: Timestamp) -> Result<bool, ControllerError> {
        self.check_index(index)?;
        let task = &mut self.tasks[index];
        if !task.is_item() {
            return Err(ControllerError::NotAnItem(index));
        }
        let (was_done, stamp) = (task.done, task.completed_at);
        task.done = !was_done;
        task.apply_done_transition(was_done, stamp, now);
        let done = task.done;
        self.mark_dirty();
        Ok(done)
    }

    /// Replaces the text of the record at `index`. Never saves by itself.
    pub fn update_task_text(&mut self, index: usize, text: &str) -> Result<(), ControllerError> {
        self.check_index(index)?;
        if self.tasks[index].text != text {
            self.tasks[index].text = text.to_string();
            self.mark_dirty();
        }
        Ok(())
    }

    /// Moves the record at `from` so that it ends up at `to`.
    ///
    /// `to` is clamped to the end of the list. No record field changes.
    pub fn move_task(&mut self, from: usize, to: usize) -> Result<(), ControllerError> {
        self.check_index(from)?;
        if from == to {
            return Ok(());
        }
        let task = self.tasks.remove(from);
        let to = to.min(self.tasks.len());
        self.tasks.insert(to, task);
        self.mark_dirty();
        Ok(())
    }

    pub fn set_filter(&mut self, filter: ViewFilter) {
        self.filter = filter;
    }

    pub fn toggle_filter(&mut self) -> ViewFilter {
        self.filter = match self.filter {
            ViewFilter::All => ViewFilter::HideCompleted,
            ViewFilter::HideCompleted => ViewFilter::All,
        };
        self.filter
    }

    /// Records to display under the current filter.
    ///
    /// Display only: saves always send the full list.
    pub fn filtered_view(&self) -> Vec<ViewEntry<'_>> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| self.filter == ViewFilter::All || !task.is_completed())
            .map(|(index, task)| ViewEntry { index, task })
            .collect()
    }

    /// Installs a list loaded from the server. Clears the dirty flag.
    pub fn replace_all(&mut self, tasks: TaskList, last_saved: Option<Timestamp>) {
        self.tasks = tasks;
        self.has_unsaved_changes = false;
        self.last_saved = last_saved;
        self.status = match last_saved {
            Some(at) => SaveStatus::Saved(at),
            None => SaveStatus::Idle,
        };
    }

    /// Drops all state, used when the session ends.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Starts a save and returns the payload, or `None` when there is nothing
    /// to save or a save is already in flight.
    ///
    /// The dirty flag is cleared here so that edits made while the request is
    /// in flight are recognised afterwards.
    pub fn begin_save(&mut self) -> Option<TaskList> {
        if !self.has_unsaved_changes || self.is_saving {
            return None;
        }
        self.is_saving = true;
        self.has_unsaved_changes = false;
        self.status = SaveStatus::Saving;
        Some(self.tasks.clone())
    }

    /// Ends the save started by [`begin_save`](Self::begin_save).
    ///
    /// On success returns `true` if the list changed while the save was in
    /// flight and another save should be scheduled. On failure the list is
    /// marked dirty again so the next trigger retries, and `false` is
    /// returned.
    pub fn finish_save(&mut self, result: Result<Timestamp, String>) -> bool {
        self.is_saving = false;
        match result {
            Ok(saved_at) => {
                self.last_saved = Some(saved_at);
                if self.has_unsaved_changes {
                    self.status = SaveStatus::Pending;
                    true
                } else {
                    self.status = SaveStatus::Saved(saved_at);
                    false
                }
            }
            Err(error) => {
                self.has_unsaved_changes = true;
                self.status = SaveStatus::Error(error);
                false
            }
        }
    }
}
