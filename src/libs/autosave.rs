//! Debounced persistence for a [`TaskListController`].
//!
//! Every mutation goes through [`Autosave::mutate`], which restarts the quiet
//! period. When it elapses the whole list is sent with
//! [`TaskApi::save_tasks`]. Edits made while a save is in flight are picked up
//! by a follow-up save.
//!
//! A background save rejected with 401 clears the controller and raises a
//! flag the caller picks up with [`Autosave::take_session_expired`].

use super::controller::TaskListController;
use super::debounce::Debouncer;
use super::task::Timestamp;
use crate::api::{ApiError, SaveReceipt, TaskApi};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, warn};

pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(1000);

pub struct Autosave<A: TaskApi + 'static> {
    controller: Arc<Mutex<TaskListController>>,
    api: Arc<A>,
    debouncer: Arc<Debouncer>,
    /// Signalled whenever a save round trip ends.
    idle: Arc<Notify>,
    session_expired: Arc<AtomicBool>,
}

impl<A: TaskApi + 'static> Clone for Autosave<A> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
            api: Arc::clone(&self.api),
            debouncer: Arc::clone(&self.debouncer),
            idle: Arc::clone(&self.idle),
            session_expired: Arc::clone(&self.session_expired),
        }
    }
}

impl<A: TaskApi + 'static> Autosave<A> {
    pub fn new(api: A, delay: Duration) -> Self {
        Self::with_controller(Arc::new(api), TaskListController::new(), delay)
    }

    pub fn with_controller(api: Arc<A>, controller: TaskListController, delay: Duration) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            api,
            debouncer: Arc::new(Debouncer::new(delay)),
            idle: Arc::new(Notify::new()),
            session_expired: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn controller(&self) -> &Mutex<TaskListController> {
        &self.controller
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// True while a flush is waiting for the quiet period to end.
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// True once after the server rejected the session, then resets.
    pub fn take_session_expired(&self) -> bool {
        self.session_expired.swap(false, Ordering::AcqRel)
    }

    fn expire_session(&self) {
        self.debouncer.cancel();
        self.controller.lock().clear();
        self.session_expired.store(true, Ordering::Release);
    }

    /// Applies `f` to the controller and schedules a flush if the list is dirty.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut TaskListController) -> R) -> R {
        let (result, dirty) = {
            let mut controller = self.controller.lock();
            let result = f(&mut controller);
            (result, controller.has_unsaved_changes())
        };
        if dirty {
            self.schedule();
        }
        result
    }

    fn schedule(&self) {
        let autosave = self.clone();
        self.debouncer.schedule(move || async move {
            if let Err(e) = autosave.flush().await {
                warn!(error = %e, "autosave failed");
            }
        });
    }

    /// Sends the list if it has unsaved changes and no save is in flight.
    ///
    /// Returns the server's save time, or `None` when nothing was sent. A
    /// rejected session clears the controller.
    pub async fn flush(&self) -> Result<Option<Timestamp>, ApiError> {
        let payload = { self.controller.lock().begin_save() };
        let Some(payload) = payload else {
            return Ok(None);
        };

        debug!(tasks = payload.len(), "saving task list");
        let result = self.api.save_tasks(&payload).await;
        let outcome = self.finish(result);
        self.idle.notify_waiters();
        outcome
    }

    fn finish(&self, result: Result<SaveReceipt, ApiError>) -> Result<Option<Timestamp>, ApiError> {
        match result {
            Ok(receipt) => {
                let follow_up = { self.controller.lock().finish_save(Ok(receipt.last_saved)) };
                if follow_up {
                    debug!("list changed during save, scheduling another");
                    self.schedule();
                }
                Ok(Some(receipt.last_saved))
            }
            Err(e) if e.is_unauthorized() => {
                warn!("session rejected during save");
                self.expire_session();
                Err(e)
            }
            Err(e) => {
                self.controller.lock().finish_save(Err(e.to_string()));
                Err(e)
            }
        }
    }

    /// Skips the quiet period and saves right away.
    pub async fn flush_now(&self) -> Result<Option<Timestamp>, ApiError> {
        self.debouncer.cancel();
        self.flush().await
    }

    /// Waits for a save in flight to finish, then flushes what is left.
    pub async fn flush_when_idle(&self) -> Result<Option<Timestamp>, ApiError> {
        loop {
            // Registered before the check so a save ending in between still wakes us
            let idle = self.idle.notified();
            let saving = self.controller.lock().is_saving();
            if !saving {
                break;
            }
            idle.await;
        }
        self.flush_now().await
    }

    /// Replaces the local list with the server's. Returns the record count.
    pub async fn load(&self) -> Result<usize, ApiError> {
        match self.api.load_tasks().await {
            Ok(snapshot) => {
                let count = snapshot.items.len();
                self.debouncer.cancel();
                self.controller.lock().replace_all(snapshot.items, snapshot.last_saved);
                Ok(count)
            }
            Err(e) => {
                if e.is_unauthorized() {
                    self.expire_session();
                }
                Err(e)
            }
        }
    }
}
