use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Catalog Error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Fetch Error: {0}")]
    Fetch(#[from] FetchError),
    #[error("Pipeline Error: {0}")]
    Pipeline(String),
}

// Image fetch and decode failures. These never abort a batch, the row
// processor turns them into an empty color field.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Server answered {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Worker task failed: {0}")]
    Worker(String),
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read or write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
