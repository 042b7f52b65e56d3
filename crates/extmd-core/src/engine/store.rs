use crate::core::io::error::FrameStoreError;
use crate::core::io::traits::{FrameReader, TrajectoryFormat};
use crate::core::models::frame::Frame;
use std::fmt;
use std::io;
use std::path::Path;
use tracing::debug;

/// Single-slot, path-keyed cache of an open trajectory reader.
///
/// Reopening the segment on every poll is the dominant cost of polling, so
/// the reader stays open until a read targets a different path.
pub struct FrameStoreCache<F: TrajectoryFormat> {
    format: F,
    slot: Option<F::Reader>,
    opens: usize,
}

impl<F: TrajectoryFormat> fmt::Debug for FrameStoreCache<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameStoreCache")
            .field("open_path", &self.open_path())
            .field("opens", &self.opens)
            .finish()
    }
}

impl<F: TrajectoryFormat> FrameStoreCache<F> {
    pub fn new(format: F) -> Self {
        Self {
            format,
            slot: None,
            opens: 0,
        }
    }

    pub fn format(&self) -> &F {
        &self.format
    }

    /// Path of the currently open reader, if any.
    pub fn open_path(&self) -> Option<&Path> {
        self.slot.as_ref().map(|r| r.path())
    }

    /// Number of times a reader has been opened.
    pub fn opens(&self) -> usize {
        self.opens
    }

    fn acquire(&mut self, path: &Path) -> Result<&mut F::Reader, FrameStoreError> {
        let reader = match self.slot.take() {
            Some(reader) if reader.path() == path => reader,
            stale => {
                if let Some(old) = stale {
                    debug!(
                        from = %old.path().display(),
                        to = %path.display(),
                        "Switching trajectory reader."
                    );
                }
                let reader = self.format.open(path)?;
                self.opens += 1;
                reader
            }
        };
        Ok(self.slot.insert(reader))
    }

    /// Reads frame `index` of `path` through the cached reader.
    ///
    /// A segment file that does not exist yet holds no frames, so it is
    /// reported as [`FrameStoreError::FrameNotFound`] rather than an I/O error.
    pub fn read(&mut self, path: &Path, index: usize) -> Result<Frame, FrameStoreError> {
        match self.acquire(path) {
            Ok(reader) => reader.read_frame(index),
            Err(FrameStoreError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Err(FrameStoreError::FrameNotFound {
                    path: path.to_path_buf(),
                    index,
                    available: 0,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Closes the cached reader.
    pub fn release(&mut self) {
        self.slot = None;
    }
}
