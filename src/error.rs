use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum AppError {
    #[error("Environment error: {0}")]
    #[diagnostic(code(sheetbridge::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(sheetbridge::config))]
    Config(String),

    /// Webhook or chat API failure, either on the network or a non-2xx status
    #[error("{0}")]
    #[diagnostic(code(sheetbridge::upstream))]
    Upstream(String),

    #[error("不明な区分: {label}")]
    #[diagnostic(code(sheetbridge::unrecognized_category))]
    UnrecognizedCategory { label: String },

    #[error("Invalid row at sheet line {row}: {message}")]
    #[diagnostic(
        code(sheetbridge::invalid_row),
        help("Check that the date, time and event ID columns are filled in")
    )]
    InvalidRow { row: usize, message: String },

    #[error("Spreadsheet parse error: {0}")]
    #[diagnostic(code(sheetbridge::parse))]
    Parse(String),

    #[error("Bad request: {0}")]
    #[diagnostic(code(sheetbridge::bad_request))]
    BadRequest(String),

    #[error(transparent)]
    #[diagnostic(code(sheetbridge::io))]
    Io(#[from] std::io::Error),
}

impl From<calamine::Error> for AppError {
    fn from(err: calamine::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type AppResult<T> = Result<T, AppError>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> AppError {
    AppError::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> AppError {
    AppError::Config(message.to_string())
}

/// Helper to create upstream errors
pub fn upstream_error(message: &str) -> AppError {
    AppError::Upstream(message.to_string())
}

/// Helper to create spreadsheet parse errors
pub fn parse_error(message: &str) -> AppError {
    AppError::Parse(message.to_string())
}

/// Helper to create bad request errors
pub fn bad_request(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

/// Helper to create invalid row errors. `row` is the 1-based sheet line.
pub fn invalid_row(row: usize, message: &str) -> AppError {
    AppError::InvalidRow {
        row,
        message: message.to_string(),
    }
}
