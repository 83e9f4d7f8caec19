use std::string::FromUtf8Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Source unavailable: {source_name}: {reason}")]
    SourceUnavailable { source_name: String, reason: String },
    #[error("Update check failed: {0}")]
    UpdateCheckFailed(String),
    #[error("Unknown filter field: '{0}'")]
    UnknownFilterField(String),
    #[error("Timed out after {seconds}s: {what}")]
    Timeout { what: String, seconds: u64 },
    #[error("Command Error: {0}")]
    Command(#[from] std::io::Error),
    #[error("String Conversion Error: {0}")]
    String(#[from] FromUtf8Error),
    #[error("Config Error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Error: {0}")]
    Other(String),
}

impl AppError {
    pub fn unavailable(source_name: &str, reason: impl ToString) -> Self {
        AppError::SourceUnavailable {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Other(err)
    }
}
