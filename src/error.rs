use thiserror::Error;

#[derive(Error, Debug)]
pub enum KichoError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Unknown client: {0}")]
    UnknownClient(String),

    #[error("Unknown account item: {0}")]
    UnknownAccountItem(String),

    #[error("Unknown tax category: {0}")]
    UnknownTaxCategory(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, KichoError>;
