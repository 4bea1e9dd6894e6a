use thiserror::Error;

/// Result type for viewer operations
pub type Result<T> = std::result::Result<T, ViewerError>;

/// Errors that can occur in the viewer core
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Invalid image descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Image index out of range: {index} (image count {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("No displayable source for image {id}")]
    NoDisplayableSource { id: String },

    #[error("Manifest parsing failed: {0}")]
    ManifestError(#[from] serde_json::Error),

    #[error("Fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Image decode failed: {0}")]
    DecodeError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "streaming")]
    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),
}

impl ViewerError {
    /// Returns true if this error is recoverable (best-effort paths drop it
    /// without surfacing anything to the user)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::FetchFailed { .. } | Self::DecodeError(_) => true,
            #[cfg(feature = "streaming")]
            Self::ImageError(_) => true,
            _ => false,
        }
    }
}
