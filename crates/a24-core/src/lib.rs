pub mod app_config;
pub mod barcode;
pub mod category_tree;
pub mod config;
pub mod products;
pub mod slug;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use barcode::{base_barcode, classify, BarcodeGroup, BarcodeLookup, Classification, StagedIndex};
pub use category_tree::{Category, CategoryNode, CategoryTree};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{NormalizedProduct, ProductAttribute, COLOR_ATTRIBUTE_NAME, COLOR_ATTRIBUTE_SLUG};
pub use slug::to_slug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
