/// Error taxonomy for the conversion pipeline.
///
/// - Fatal: [`RunError`] (wrapping [`ClassifyError`] / [`LocateError`]) aborts a run.
/// - Scoped: [`ConvertError`] / [`CopyError`] are attributed to one item;
///   the runner reports them and moves on.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to list the input folder.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot read directory {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure to create the chosen output folder.
#[derive(Debug, Error)]
pub enum LocateError {
    #[error("cannot create output directory {}: {source}", .path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure converting one image. Always carries the source file name.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("{name}: decode failed: {cause}")]
    Decode { name: String, cause: String },

    #[error("{name}: encode failed: {cause}")]
    Encode { name: String, cause: String },

    #[error("{name}: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("{name}: HEIF decoding is not available in this build")]
    Unsupported { name: String },
}

impl ConvertError {
    /// The file the failure is attributed to.
    pub fn name(&self) -> &str {
        match self {
            Self::Decode { name, .. }
            | Self::Encode { name, .. }
            | Self::Io { name, .. }
            | Self::Unsupported { name } => name,
        }
    }
}

/// Failure copying one pass-through file.
#[derive(Debug, Error)]
#[error("{name}: {source}")]
pub struct CopyError {
    pub name: String,
    #[source]
    pub source: io::Error,
}

/// A failure that ends the whole run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error("unexpected fault: {0}")]
    Unexpected(String),
}

/// Why [`crate::runner::ConversionRunner::start_run`] did not start a run.
#[derive(Debug, Error)]
pub enum StartError {
    /// A run is already in flight; the request was ignored.
    #[error("a conversion run is already active")]
    AlreadyRunning,

    #[error("failed to spawn runner thread: {0}")]
    Spawn(#[source] io::Error),
}
