//! Server-side merge of an incoming full task list against stored state.
//!
//! The client is authoritative for order, text, kind and the `done` flag. It is
//! never authoritative for timestamps: `createdAt` is fixed at first sight of a
//! record and `completedAt` only moves on a real `done` transition.
//!
//! Saves always replace the whole list. A record present in storage but absent
//! from the incoming list is deleted by omission.

use super::task::{find_duplicate_id, generate_id, TaskList, TaskRecord, Timestamp};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Request body must be a JSON object with an `items` array")]
    ItemsNotArray,
    #[error("Invalid task at position {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
    #[error("Duplicate task id `{0}`")]
    DuplicateId(String),
}

/// Validates a save payload (`{"items": [...]}`) and returns its records.
///
/// Nothing about the stored state is touched here; a rejected payload leaves
/// the document exactly as it was.
pub fn validate_payload(body: Value) -> Result<TaskList, ValidationError> {
    let items = match body {
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) => items,
            _ => return Err(ValidationError::ItemsNotArray),
        },
        _ => return Err(ValidationError::ItemsNotArray),
    };

    let tasks = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<TaskRecord>(item).map_err(|e| ValidationError::InvalidRecord {
                index,
                reason: e.to_string(),
            })
        })
        .collect::<Result<TaskList, _>>()?;

    if let Some(id) = find_duplicate_id(&tasks) {
        return Err(ValidationError::DuplicateId(id.to_string()));
    }

    Ok(tasks)
}

/// Produces the list to persist from the client's list and the stored one.
///
/// The result has exactly the length and order of `incoming`.
pub fn reconcile(incoming: TaskList, stored: &[TaskRecord], now: Timestamp) -> TaskList {
    let stored_by_id: HashMap<&str, &TaskRecord> = stored.iter().filter(|task| task.has_id()).map(|task| (task.id.as_str(), task)).collect();

    incoming
        .into_iter()
        .map(|mut task| {
            if !task.has_id() {
                task.id = generate_id();
            }

            match stored_by_id.get(task.id.as_str()) {
                Some(previous) => {
                    task.created_at = Some(previous.created_at.unwrap_or(now));
                    task.apply_done_transition(previous.done, previous.completed_at, now);
                }
                None => {
                    task.created_at = Some(now);
                    task.apply_done_transition(false, None, now);
                }
            }

            task
        })
        .collect()
}
