mod ask;
mod config;
mod serve;
mod status;
mod upload;

pub use ask::AskArgs;
pub use config::ConfigCommand;
pub use serve::ServeArgs;
pub use upload::UploadArgs;

pub use ask::handle_ask;
pub use config::handle_config;
pub use serve::handle_serve;
pub use status::handle_status;
pub use upload::handle_upload;

use anyhow::{Context, Result};

use crate::context::AppContext;
use crate::models::Config;

/// Load the resolved configuration and connect every backend it selects.
async fn load_context() -> Result<AppContext> {
    let config = Config::load()
        .context("failed to load configuration")?
        .config;
    AppContext::from_config(config)
        .await
        .context("failed to initialize backends")
}
