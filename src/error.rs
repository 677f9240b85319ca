use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown chart: {0}")]
    UnknownChart(String),

    #[error("Duplicate chart id: {0}")]
    DuplicateChart(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        EngineError::Network(err.to_string())
    }
}

impl From<csv::Error> for EngineError {
    fn from(err: csv::Error) -> Self {
        EngineError::Parse(format!("CSV error: {}", err))
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Parse(format!("JSON error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

// Alias for convenience
pub type Error = EngineError;
