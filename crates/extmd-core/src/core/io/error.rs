use crate::core::models::frame::FrameError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the frame store adapter.
///
/// [`FrameNotFound`](FrameStoreError::FrameNotFound) and
/// [`FrameCorrupt`](FrameStoreError::FrameCorrupt) are expected while the
/// simulation is still writing the file; every other variant is fatal.
#[derive(Debug, Error)]
pub enum FrameStoreError {
    #[error("Frame {index} not found in '{path}' ({available} complete frame(s) on disk)", path = path.display())]
    FrameNotFound {
        path: PathBuf,
        index: usize,
        available: usize,
    },

    #[error("Frame {index} in '{path}' is incomplete or malformed: {kind}", path = path.display())]
    FrameCorrupt {
        path: PathBuf,
        index: usize,
        kind: CorruptionKind,
    },

    #[error("File '{}' exists. Preventing overwrite.", .0.display())]
    FileExists(PathBuf),

    #[error("Cannot write frame to '{path}': {source}", path = path.display())]
    InvalidFrame {
        path: PathBuf,
        #[source]
        source: FrameError,
    },

    #[error("I/O error on '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FrameStoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error only reflects a frame that has not been fully written yet.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::FrameNotFound { .. } | Self::FrameCorrupt { .. })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CorruptionKind {
    #[error("header truncated ({available} of {required} bytes present)")]
    TruncatedHeader { available: u64, required: u64 },
    #[error("body truncated ({available} of {required} bytes present)")]
    TruncatedBody { available: u64, required: u64 },
    #[error("bad magic number {0} (expected 1993)")]
    BadMagic(i32),
    #[error("unrecognized version string")]
    BadVersion,
    #[error("inconsistent block sizes: {0}")]
    InvalidBlockSizes(String),
    #[error("preceding frame {0} is malformed")]
    MalformedPredecessor(usize),
}

impl CorruptionKind {
    /// Truncation is what a concurrent writer leaves behind; anything else
    /// means the bytes themselves are wrong.
    pub fn is_truncation(&self) -> bool {
        matches!(
            self,
            Self::TruncatedHeader { .. } | Self::TruncatedBody { .. }
        )
    }
}
