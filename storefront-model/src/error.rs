use thiserror::Error;

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("page numbers start at 1 (got {0})")]
    InvalidPage(u32),
    #[error("invalid image id '{0}'")]
    InvalidImageId(String),
    #[error("invalid location: {0}")]
    InvalidLocation(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
