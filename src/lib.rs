//! TaskVault: a single-user task list served over HTTP, with a terminal
//! client that edits the list locally and saves it in the background.
//!
//! - [`libs::task`] and [`libs::reconcile`]: the record model and the
//!   server-side merge that owns timestamps.
//! - [`db::tasks`]: the JSON document on disk.
//! - [`server`]: the `axum` service.
//! - [`api`], [`libs::controller`] and [`libs::autosave`]: the client.

pub mod api;
pub mod commands;
pub mod db;
pub mod libs;
pub mod server;
