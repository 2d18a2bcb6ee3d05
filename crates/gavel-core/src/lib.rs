use thiserror::Error;

mod app_config;
mod auction;
mod config;

pub use app_config::{AppConfig, Environment};
pub use auction::{Auction, AuctionStatus, ProductCondition};
pub use config::{load_app_config, load_app_config_from_env};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid auction status: {0}")]
    InvalidStatus(String),
    #[error("invalid product condition: {0}")]
    InvalidCondition(String),
}
