//! Error types.
//!
//! Only configuration problems and storage/output failures are errors.
//! Data quality issues (a bad timestamp, an empty county list) are handled
//! where they occur by excluding the offending record and never surface here.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CadenceError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Outlet not found: {outlet_id}")]
    OutletNotFound { outlet_id: String },
}

/// Fatal problems detected before any computation or write happens.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("window must be a positive number of days, got {0}")]
    NonPositiveWindow(i64),

    #[error("window of {0} days is too large")]
    WindowTooLarge(i64),

    #[error("outlet registry is missing required column `{0}`")]
    MissingColumn(String),

    #[error("invalid config file {path}: {source}")]
    InvalidConfigFile {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

pub type Result<T> = std::result::Result<T, CadenceError>;
