use crate::libs::data_storage::DataStorage;
use crate::libs::task::{self, TaskList, Timestamp};
use chrono::{DateTime, SubsecRound, Utc};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const TASKS_FILE_NAME: &str = "tasks.json";
const TEMP_SUFFIX: &str = "tmp";
const CORRUPT_SUFFIX: &str = "corrupt";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task document I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("task document could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result of reading the task document.
#[derive(Debug, Clone, Default)]
pub struct LoadedTasks {
    pub tasks: TaskList,
    /// Modification time of the document, `None` before the first save.
    pub last_saved: Option<Timestamp>,
}

/// Durable home of the task list: one pretty-printed JSON array in one file.
///
/// Every save replaces the whole document. Writes go to a sibling temp file
/// that is renamed over the document, so a reader never sees half a list.
#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    tainted: bool,
}

impl TaskStore {
    /// Opens the store at the default location in the application data directory.
    pub fn new() -> Result<TaskStore, StoreError> {
        let path = DataStorage::new().get_path(TASKS_FILE_NAME)?;
        Ok(Self::with_path(path))
    }

    /// Opens the store at `<dir>/tasks.json`.
    pub fn in_dir(dir: &Path) -> TaskStore {
        Self::with_path(dir.join(TASKS_FILE_NAME))
    }

    pub fn with_path(path: PathBuf) -> TaskStore {
        TaskStore { path, tainted: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True after a load found a document that could not be parsed.
    pub fn is_tainted(&self) -> bool {
        self.tainted
    }

    /// Reads the persisted list.
    ///
    /// A missing document is a first run and yields an empty list. An
    /// unparseable document also yields an empty list, but the store is
    /// marked tainted so the next save moves the unreadable file aside
    /// instead of overwriting it. Legacy records without `id`/`createdAt`
    /// are upgraded and the upgrade is written back.
    pub fn load(&mut self) -> Result<LoadedTasks, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no task document yet");
                return Ok(LoadedTasks::default());
            }
            Err(e) => return Err(e.into()),
        };

        let mut tasks: TaskList = match serde_json::from_str(&raw) {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "task document is unreadable, serving an empty list");
                self.tainted = true;
                return Ok(LoadedTasks::default());
            }
        };
        self.tainted = false;

        let now = task::now();
        let upgraded = tasks.iter_mut().fold(0usize, |count, task| count + task.backfill(now) as usize);
        let mut last_saved = self.modified()?;
        if upgraded > 0 {
            info!(count = upgraded, "upgraded legacy task records");
            match self.save(&tasks) {
                Ok(saved_at) => last_saved = Some(saved_at),
                Err(e) => warn!(error = %e, "could not persist upgraded task records"),
            }
        }

        Ok(LoadedTasks { tasks, last_saved })
    }

    /// Replaces the document with `tasks` and returns the save time.
    pub fn save(&mut self, tasks: &TaskList) -> Result<Timestamp, StoreError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        if self.tainted && self.path.exists() {
            let backup = self.sibling(&format!("{}-{}", CORRUPT_SUFFIX, Utc::now().timestamp()));
            fs::rename(&self.path, &backup)?;
            warn!(backup = %backup.display(), "moved unreadable task document aside");
        }

        let temp_path = self.sibling(TEMP_SUFFIX);
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, tasks)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;
        self.tainted = false;

        let saved_at = self.modified()?.unwrap_or_else(task::now);
        debug!(count = tasks.len(), path = %self.path.display(), "task document saved");
        Ok(saved_at)
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| TASKS_FILE_NAME.into());
        name.push(".");
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn modified(&self) -> Result<Option<Timestamp>, StoreError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(Some(DateTime::<Utc>::from(meta.modified()?).trunc_subsecs(3))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
