use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContrastError>;

#[derive(Error, Debug)]
pub enum ContrastError {
    #[error("failed to decode {}: {source}", .path.display())]
    DecodeError {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode {}: {source}", .path.display())]
    EncodeError {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot create output directory {}: {source}", .path.display())]
    DirectoryError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameterError(String),
}

pub fn invalid_parameter(msg: impl ToString) -> ContrastError {
    ContrastError::InvalidParameterError(msg.to_string())
}

impl ContrastError {
    /// True for failures on the output side (encoding or output directory).
    pub fn is_encode_error(&self) -> bool {
        matches!(
            self,
            ContrastError::EncodeError { .. } | ContrastError::DirectoryError { .. }
        )
    }
}
