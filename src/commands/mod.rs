//! Command-line interface.
//!
//! `serve` runs the HTTP service. Every other command is a client of a
//! running service: one-shot edits (`add`, `edit`, `toggle`, `move`,
//! `delete`) save immediately, while `shell` keeps the list open and saves
//! after a quiet period.

pub mod init;
pub mod login;
pub mod logout;
pub mod serve;
pub mod shell;
pub mod status;
pub mod task;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Configure the server and client")]
    Init,
    #[command(about = "Run the TaskVault HTTP service")]
    Serve(serve::ServeArgs),
    #[command(about = "Log in to the TaskVault service")]
    Login,
    #[command(about = "Log out and forget the cached password")]
    Logout,
    #[command(about = "Show whether the cached session is still valid")]
    Status,
    #[command(about = "Print the task list")]
    List(task::ListArgs),
    #[command(about = "Add a header or an item")]
    Add(task::AddArgs),
    #[command(about = "Change the text of a task")]
    Edit(task::EditArgs),
    #[command(about = "Check off or reopen an item")]
    Toggle(task::NumberArgs),
    #[command(about = "Move a task to another position")]
    Move(task::MoveArgs),
    #[command(about = "Delete a task")]
    Delete(task::DeleteArgs),
    #[command(about = "Edit the list interactively with autosave")]
    Shell,
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help(true))]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub async fn menu() -> Result<()> {
        let cli = Self::parse();
        match cli.command {
            Commands::Init => init::cmd(),
            Commands::Serve(args) => serve::cmd(args).await,
            Commands::Login => login::cmd().await,
            Commands::Logout => logout::cmd().await,
            Commands::Status => status::cmd().await,
            Commands::List(args) => task::list(args).await,
            Commands::Add(args) => task::add(args).await,
            Commands::Edit(args) => task::edit(args).await,
            Commands::Toggle(args) => task::toggle(args).await,
            Commands::Move(args) => task::move_to(args).await,
            Commands::Delete(args) => task::delete(args).await,
            Commands::Shell => shell::cmd().await,
        }
    }
}
