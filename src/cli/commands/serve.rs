use anyhow::{Context, Result};
use clap::Args;

use crate::context::AppContext;
use crate::models::Config;
use crate::server::Server;

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, short = 'a', help = "Address to bind, e.g. 0.0.0.0:8000")]
    pub address: Option<String>,
}

pub async fn handle_serve(args: ServeArgs) -> Result<()> {
    let config = Config::load()
        .context("failed to load configuration")?
        .config;
    let address = args.address.unwrap_or_else(|| config.server.address.clone());

    let ctx = AppContext::from_config(config)
        .await
        .context("failed to initialize backends")?;
    Server::new(ctx).run(&address).await
}
