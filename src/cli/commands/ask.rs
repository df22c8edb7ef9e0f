use anyhow::{Context, Result};
use clap::Args;

use super::load_context;
use crate::cli::output::get_formatter;
use crate::models::{AskQuestionRequest, OutputFormat};

#[derive(Debug, Args)]
pub struct AskArgs {
    #[arg(help = "Filename the document was uploaded under")]
    pub filename: String,

    #[arg(help = "Question to answer from the document")]
    pub question: String,
}

pub async fn handle_ask(args: AskArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);
    let ctx = load_context().await?;

    let request = AskQuestionRequest::new(args.filename, args.question);
    let answer = ctx
        .qa_pipeline()
        .answer(&request)
        .await
        .with_context(|| format!("failed to answer question about {}", request.filename))?;

    print!("{}", formatter.format_answer(&answer, verbose));
    Ok(())
}
