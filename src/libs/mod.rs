pub mod actions;
pub mod autosave;
pub mod config;
pub mod controller;
pub mod data_storage;
pub mod debounce;
pub mod messages;
pub mod reconcile;
pub mod secret;
pub mod task;
pub mod view;
