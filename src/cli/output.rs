//! CLI output formatting (JSON, YAML, table).
//!
//! Structured formats wrap every payload in a [`CliResponse`] envelope.

use crate::core::error::{ExitCode, ThinktreeError};
use crate::core::idea::Idea;
use crate::core::project::Project;
use crate::core::tags::preview;
use comfy_table::{Cell, Table};
use serde::Serialize;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// Machine-readable JSON format.
    Json,
    /// YAML output format.
    Yaml,
}

/// Structured CLI response.
#[derive(Debug, Serialize)]
pub struct CliResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorOutput>,
}

/// Structured error output.
#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub category: String,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl From<&ThinktreeError> for ErrorOutput {
    fn from(err: &ThinktreeError) -> Self {
        Self {
            category: err.category.to_string(),
            code: err.code.clone(),
            message: err.message.clone(),
            hint: err.recovery_hint.clone(),
        }
    }
}

impl<T: Serialize> CliResponse<T> {
    /// Creates a successful response with data.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Creates an error response.
    pub fn error(err: &ThinktreeError) -> CliResponse<()> {
        CliResponse {
            success: false,
            data: None,
            error: Some(ErrorOutput::from(err)),
        }
    }
}

/// Outputs data in the specified format.
pub fn output<T: Serialize>(data: T, format: OutputFormat) -> std::io::Result<()> {
    match format {
        OutputFormat::Json => {
            let response = CliResponse::success(data);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Table => {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        OutputFormat::Yaml => {
            let response = CliResponse::success(data);
            if let Ok(yaml) = serde_yaml::to_string(&response) {
                print!("{yaml}");
            }
        }
    }
    Ok(())
}

/// Outputs an error in the specified format.
pub fn output_error(err: &ThinktreeError, format: OutputFormat) -> ExitCode {
    match format {
        OutputFormat::Json => {
            let response = CliResponse::<()>::error(err);
            if let Ok(json) = serde_json::to_string_pretty(&response) {
                eprintln!("{json}");
            }
        }
        OutputFormat::Yaml => {
            let response = CliResponse::<()>::error(err);
            if let Ok(yaml) = serde_yaml::to_string(&response) {
                eprint!("{yaml}");
            }
        }
        OutputFormat::Table => {
            eprintln!("Error: {err}");
            if let Some(hint) = &err.recovery_hint {
                eprintln!("Hint: {hint}");
            }
        }
    }
    error_to_exit_code(err)
}

/// Maps error codes to exit codes per CLI operational semantics.
fn error_to_exit_code(err: &ThinktreeError) -> ExitCode {
    match err.code.as_str() {
        c if c.contains("not_found") => ExitCode::NotFound,
        "last_project" => ExitCode::Conflict,
        c if c.contains("conflict") => ExitCode::Conflict,
        _ => ExitCode::Error,
    }
}

/// Helper to create a table with headers.
#[must_use]
pub fn create_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_header(headers.iter().map(|h| Cell::new(*h)));
    table
}

/// Trait for types that can be displayed as a table row.
pub trait TableRow {
    fn to_row(&self) -> Vec<String>;
}

impl TableRow for Project {
    fn to_row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.created_at.format("%Y-%m-%d %H:%M").to_string(),
        ]
    }
}

impl TableRow for Idea {
    fn to_row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            if self.is_trunk { "*" } else { "" }.to_string(),
            preview(&self.text, 60),
            self.tags
                .iter()
                .map(|t| format!("#{t}"))
                .collect::<Vec<_>>()
                .join(" "),
            self.linked_to.map(|p| p.to_string()).unwrap_or_default(),
        ]
    }
}

/// Builds a table from rows.
#[must_use]
pub fn rows_table<R: TableRow>(headers: &[&str], rows: &[R]) -> Table {
    let mut table = create_table(headers);
    for row in rows {
        table.add_row(row.to_row());
    }
    table
}
