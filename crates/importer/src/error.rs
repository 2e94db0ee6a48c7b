use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImportError>;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Graph error: {0}")]
    GraphError(#[from] psgc_graph::GraphError),

    #[error("Invalid input {path}: {message}")]
    InvalidInput { path: String, message: String },

    #[error("Invalid import options: {0}")]
    InvalidOptions(String),
}
