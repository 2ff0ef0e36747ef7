use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShelfError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Catalog returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Unexpected catalog response: {0}")]
    Decode(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ShelfError>;
