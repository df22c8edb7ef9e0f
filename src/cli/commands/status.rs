use anyhow::Result;

use super::load_context;
use crate::cli::output::get_formatter;
use crate::models::{DocumentDriver, OutputFormat, StorageDriver};

pub async fn handle_status(format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);
    let ctx = load_context().await?;
    let status = ctx.status().await;

    print!("{}", formatter.format_status(&status));

    if !status.document_store.healthy {
        eprintln!();
        match ctx.config.document_store.driver {
            DocumentDriver::MongoDB => {
                eprintln!("Warning: MongoDB not reachable. Check MONGO_URI.");
            }
            DocumentDriver::PostgreSQL => {
                eprintln!("Warning: PostgreSQL not accessible. Check connection settings.");
            }
            DocumentDriver::SQLite => {
                eprintln!("Warning: SQLite database could not be queried.");
            }
        }
    }
    if !status.object_storage.healthy && ctx.config.storage.driver == StorageDriver::Cloudinary {
        eprintln!("Warning: Cloudinary rejected the configured credentials.");
    }
    if !status.embedding.healthy || !status.generation.healthy {
        eprintln!("Hint: check the provider URLs and API keys with: pdfqa config show");
    }

    Ok(())
}
