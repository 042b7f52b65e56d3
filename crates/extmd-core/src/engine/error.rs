use super::config::ConfigError;
use crate::core::io::error::FrameStoreError;
use crate::core::process::LaunchError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error("Preprocessing exited with code {exit_code}: {command}")]
    Preparation { exit_code: i32, command: String },

    #[error("Frame store error: {0}")]
    Storage(#[from] FrameStoreError),

    #[error("Segment number {0} does not fit the 7-digit file numbering")]
    SegmentNumberOverflow(usize),

    #[error("Segment number 0 is reserved for the initial frame")]
    ReservedSegmentNumber,

    #[error("No segment is active; call `set_filenames` or `launch_segment` first")]
    NoActiveSegment,

    #[error("Cannot derive a file number from segment file '{}'", .0.display())]
    UnrecognizedSegmentFile(PathBuf),

    #[error("The engine that created this snapshot has been dropped")]
    EngineDropped,

    #[error("Failed to create directory '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
