use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanlineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Preference error: {0}")]
    Preference(String),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// Why a route could not be added to the table.
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error(
        "handler for `{pattern}` takes {handler_params} path parameters but the pattern declares {pattern_params}"
    )]
    ArityMismatch {
        pattern: String,
        pattern_params: usize,
        handler_params: usize,
    },
    #[error("invalid route pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, ScanlineError>;
