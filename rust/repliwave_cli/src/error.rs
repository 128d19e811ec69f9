use repliwave::RepliwaveError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Analysis error: {0}")]
    Repliwave(#[from] RepliwaveError),

    #[error("Logging setup error: {0}")]
    Logging(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("Progress bar template error: {0}")]
    Template(#[from] indicatif::style::TemplateError),

    #[error("Data processing error: {0}")]
    DataProcessing(String),
}
