use console::style;
use serde::Serialize;

use crate::models::{ComponentStatus, OutputFormat, StatusResponse, UploadReceipt};
use crate::services::QaAnswer;

pub trait Formatter {
    fn format_answer(&self, answer: &QaAnswer, verbose: bool) -> String;
    fn format_uploads(&self, report: &UploadReport) -> String;
    fn format_status(&self, status: &StatusResponse) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

/// Outcome of an `upload` run over one or more paths.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
    pub uploaded: Vec<UploadReceipt>,
    pub failed: Vec<UploadFailure>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadFailure {
    pub path: String,
    pub error: String,
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_answer(&self, answer: &QaAnswer, verbose: bool) -> String {
        let mut output = format!(
            "{} {}\n\n{}\n",
            style("Q:").bold(),
            answer.result.question,
            answer.result.answer
        );

        if verbose && !answer.retrieved.is_empty() {
            output.push_str(&format!("\n{}\n", style("Context").bold().underlined()));
            for (i, scored) in answer.retrieved.iter().enumerate() {
                output.push_str(&format!(
                    "{}. [Score: {:.3}] chars {}..{}\n",
                    i + 1,
                    scored.score,
                    scored.chunk.start,
                    scored.chunk.end
                ));
                let preview: String = scored.chunk.content.chars().take(200).collect();
                for line in preview.lines() {
                    output.push_str(&format!("   {}\n", style(line).dim()));
                }
            }
        }

        output
    }

    fn format_uploads(&self, report: &UploadReport) -> String {
        let mut output = String::new();
        for receipt in &report.uploaded {
            let action = if receipt.replaced { "replaced" } else { "uploaded" };
            output.push_str(&format!(
                "{} {} ({action}, {} chars)\n",
                style("✓").green(),
                receipt.filename,
                receipt.characters
            ));
            output.push_str(&format!("  {}\n", style(&receipt.storage_url).dim()));
        }
        for failure in &report.failed {
            output.push_str(&format!(
                "{} {}: {}\n",
                style("✗").red(),
                failure.path,
                failure.error
            ));
        }
        output.push_str(&format!(
            "\n{} uploaded, {} failed in {}ms\n",
            report.uploaded.len(),
            report.failed.len(),
            report.duration_ms
        ));
        output
    }

    fn format_status(&self, status: &StatusResponse) -> String {
        let mut output = format!("pdfqa {}\n", status.version);
        output.push_str("------\n");
        output.push_str(&component_line("Document store", &status.document_store));
        output.push_str(&component_line("Object storage", &status.object_storage));
        output.push_str(&component_line("Embedding", &status.embedding));
        output.push_str(&component_line("Generation", &status.generation));

        if let Some(count) = status.documents {
            output.push_str(&format!("\nDocuments:     {count}\n"));
        }
        if let Some(ref m) = status.metrics {
            output.push_str(&format!("Requests:      {}\n", m.total_requests));
            output.push_str(&format!("Avg Latency:   {}ms\n", m.avg_latency_ms));
            if m.error_rate > 0.0 {
                output.push_str(&format!("Error Rate:    {:.1}%\n", m.error_rate));
            }
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{message}\n")
    }

    fn format_error(&self, error: &str) -> String {
        format!("{} {error}\n", style("Error:").red().bold())
    }
}

fn component_line(label: &str, component: &ComponentStatus) -> String {
    let state = if component.healthy {
        style("[OK]").green()
    } else {
        style("[DOWN]").red()
    };
    let mut line = format!("{:<15}{} {}", format!("{label}:"), component.driver, state);
    if let Some(ref model) = component.model {
        line.push_str(&format!("  {}", style(model).dim()));
    }
    if let Some(ref error) = component.error {
        line.push_str(&format!("\n               {}", style(error).yellow()));
    }
    line.push('\n');
    line
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| serde_json::json!({"error": e.to_string()}).to_string())
    }
}

impl Formatter for JsonFormatter {
    fn format_answer(&self, answer: &QaAnswer, verbose: bool) -> String {
        if verbose {
            self.render(&serde_json::json!({
                "question": answer.result.question,
                "answer": answer.result.answer,
                "context": answer.retrieved,
            }))
        } else {
            self.render(&answer.result)
        }
    }

    fn format_uploads(&self, report: &UploadReport) -> String {
        self.render(report)
    }

    fn format_status(&self, status: &StatusResponse) -> String {
        self.render(status)
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}
