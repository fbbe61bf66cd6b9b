use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdwatchError {
    #[error("Missing env {0}")]
    MissingEnv(String),

    #[error("Invalid value for env {key}: {value:?}")]
    InvalidEnv { key: String, value: String },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AdwatchError>;
