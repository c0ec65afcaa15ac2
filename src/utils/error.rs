use std::io;
use thiserror::Error;

/// Main error type for the IMS encoder library.
#[derive(Error, Debug)]
pub enum ImsError {
    /// The byte sink could not be opened or written
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The image source is unusable (empty, oversized, inconsistent planes)
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    /// An invalid encoder parameter was provided
    #[error("Invalid argument: {0}")]
    InvalidArg(String),
    /// A bitstream does not follow the IMS layout
    #[error("Format error: {0}")]
    Format(String),
}

/// A specialized `Result` type for IMS encoding operations.
pub type Result<T> = std::result::Result<T, ImsError>;
