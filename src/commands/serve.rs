use crate::libs::config::{AdminCredentials, Config};
use crate::server;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on, overrides PORT
    #[arg(short, long)]
    port: Option<u16>,
    /// Directory holding tasks.json, overrides DATA_DIR
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

pub async fn cmd(args: ServeArgs) -> Result<()> {
    let mut config = Config::read()?.server();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = Some(data_dir);
    }

    let credentials = AdminCredentials::from_env()?;
    server::serve(config, credentials).await
}
