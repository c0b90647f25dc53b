use api_client::error::ApiError;
use configuration::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregatorError {
    #[error("API client error: {0}")]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
