pub mod catalog;
pub mod color;
pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;

pub use error::{AppError, CatalogError, ConfigError, FetchError};

pub use catalog::{AugmentedRow, CatalogRow};
pub use color::{BlueClassifier, BlueExtractor, ColorHistogram};
pub use config::Configuration;
pub use fetch::{HttpImageFetcher, ImageFetcher};
pub use pipeline::{BatchOrchestrator, RowProcessor};
