use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to (de)serialize cached value: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid key pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
