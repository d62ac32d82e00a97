use serde::Serialize;
use std::path::{Path, PathBuf};

/// Whether a run converts one file or a whole folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Convert one HEIC/HEIF file next to itself.
    Single,
    /// Convert every image in a folder into a fresh sibling folder,
    /// copying the other files across.
    Batch,
}

/// What the host asks the runner to do. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    input_path: PathBuf,
    mode: RunMode,
}

impl ConversionRequest {
    pub fn new(input_path: impl Into<PathBuf>, mode: RunMode) -> Self {
        Self {
            input_path: input_path.into(),
            mode,
        }
    }

    pub fn single(input_path: impl Into<PathBuf>) -> Self {
        Self::new(input_path, RunMode::Single)
    }

    pub fn batch(input_path: impl Into<PathBuf>) -> Self {
        Self::new(input_path, RunMode::Batch)
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }
}
