//! Domain core for the herbcat catalog: the canonical product model,
//! the input normalizer that turns raw admin payloads into it, the
//! visibility-aware query builder, and application configuration.
//!
//! Everything here is pure: persistence lives in `herbcat-db`, HTTP in
//! `herbcat-server`.

use thiserror::Error;

mod app_config;
pub mod categories;
mod config;
pub mod normalize;
pub mod product;
pub mod query;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use normalize::{normalize, FieldError, NormalizeMode, RawProductPayload, ValidationErrors};
pub use product::{slugify, Faq, Form, NormalizedProduct, UsageStep};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read category file {path}: {source}")]
    CategoryFileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse category file: {0}")]
    CategoryFileParse(#[from] serde_yaml::Error),
    #[error("invalid category configuration: {0}")]
    Validation(String),
}
