//! Task record model.
//!
//! A task list is a flat, ordered sequence of two kinds of records: headers,
//! which group the items that follow them, and items, which can be checked
//! off. Both share an identity (`id`) and a creation stamp (`createdAt`);
//! only items carry completion state.
//!
//! The JSON shape matches the persisted document and the wire format:
//!
//! ```json
//! { "id": "lx3k2a9q7f0c1b2d", "type": "item", "text": "Buy milk",
//!   "done": true, "createdAt": "2025-01-15T09:30:00.000Z",
//!   "completedAt": "2025-01-15T10:02:11.412Z" }
//! ```

use chrono::{DateTime, SubsecRound, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// Point in time used for `createdAt` / `completedAt`.
pub type Timestamp = DateTime<Utc>;

/// Ordered list of records. Order defines grouping under headers.
pub type TaskList = Vec<TaskRecord>;

/// Default text for a header created without explicit text.
pub const DEFAULT_HEADER_TEXT: &str = "New Header";

/// Default text for an item created without explicit text.
pub const DEFAULT_ITEM_TEXT: &str = "New task";

const ID_SUFFIX_LEN: usize = 8;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Current time at millisecond precision, the resolution the wire format keeps.
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(3)
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Generates a fresh record id.
///
/// The id is the current time in milliseconds (base 36) followed by a random
/// base-36 suffix, so ids created within the same millisecond still differ.
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN).map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char).collect();
    format!("{}{}", to_base36(millis), suffix)
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Header,
    Item,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// Stable identifier. Empty means the record has not been assigned one yet.
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: TaskKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub done: bool,
    /// Server-owned. An unreadable value sent by a client reads as `None`.
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "lenient_timestamp", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
}

impl TaskRecord {
    fn new(kind: TaskKind, text: &str) -> Self {
        TaskRecord {
            id: generate_id(),
            kind,
            text: text.to_string(),
            done: false,
            created_at: Some(now()),
            completed_at: None,
        }
    }

    /// Creates a header with a fresh id, stamped now.
    pub fn header(text: &str) -> Self {
        Self::new(TaskKind::Header, text)
    }

    /// Creates an open item with a fresh id, stamped now.
    pub fn item(text: &str) -> Self {
        Self::new(TaskKind::Item, text)
    }

    pub fn is_header(&self) -> bool {
        self.kind == TaskKind::Header
    }

    pub fn is_item(&self) -> bool {
        self.kind == TaskKind::Item
    }

    /// True for an item that is checked off. Headers are never completed.
    pub fn is_completed(&self) -> bool {
        self.is_item() && self.done
    }

    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// Applies the `done` transition rule to this record in place.
    ///
    /// `was_done` is the previous completion state and `previous_stamp` the
    /// completion stamp that goes with it.
    pub fn apply_done_transition(&mut self, was_done: bool, previous_stamp: Option<Timestamp>, now: Timestamp) {
        if self.is_header() {
            self.done = false;
            self.completed_at = None;
            return;
        }
        self.completed_at = match (was_done, self.done) {
            (false, true) => Some(now),
            (true, true) => previous_stamp.or(Some(now)),
            (_, false) => None,
        };
    }

    /// Upgrades a record written before ids and timestamps existed.
    ///
    /// Fills in a missing `id` and `createdAt`, strips `done` from headers and
    /// makes `completedAt` agree with `done`. A completed item without a stamp
    /// gets its creation time. Returns `true` if anything changed.
    pub fn backfill(&mut self, now: Timestamp) -> bool {
        let before = (self.id.is_empty(), self.created_at, self.done, self.completed_at);
        if !self.has_id() {
            self.id = generate_id();
        }
        let created_at = *self.created_at.get_or_insert(now);
        if self.is_header() {
            self.done = false;
        }
        self.completed_at = match self.done {
            true => self.completed_at.or(Some(created_at)),
            false => None,
        };
        before != (self.id.is_empty(), self.created_at, self.done, self.completed_at)
    }
}

/// Returns the first id that occurs more than once in `tasks`.
///
/// Records without an id are ignored.
pub fn find_duplicate_id(tasks: &[TaskRecord]) -> Option<&str> {
    let mut seen = HashSet::new();
    for task in tasks {
        if task.has_id() && !seen.insert(task.id.as_str()) {
            return Some(task.id.as_str());
        }
    }
    None
}
