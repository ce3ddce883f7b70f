use std::path::PathBuf;

/// Errors from the fallible file operations. All of these are recoverable:
/// call sites log and fall back to a placeholder state, nothing here ever
/// terminates the process.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("failed to re-encode {path}: {source}")]
    Resave {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
