use core_types::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("The API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),

    #[error("Failed to build the request: {0}")]
    RequestBuild(String),
}

impl ApiError {
    /// Classifies the error into the shared failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Request(e) if e.is_timeout() => ErrorKind::Timeout,
            ApiError::Request(e) if e.is_decode() => ErrorKind::Validation,
            ApiError::Request(e) => match e.status() {
                Some(status) => ErrorKind::from_status(status.as_u16()),
                None => ErrorKind::Network,
            },
            ApiError::Status { status, .. } => ErrorKind::from_status(*status),
            ApiError::Deserialization(_) | ApiError::InvalidData(_) => ErrorKind::Validation,
            ApiError::RequestBuild(_) => ErrorKind::Client(400),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Deserialization(e.to_string())
    }
}
