use super::error::FrameStoreError;
use crate::core::models::frame::Frame;
use std::path::Path;

/// An open, random-access view of one trajectory segment file.
///
/// Readers may be kept open while another process appends to the file; every
/// call to [`read_frame`](FrameReader::read_frame) reflects what is on disk at
/// that moment.
pub trait FrameReader {
    /// The path this reader was opened against.
    fn path(&self) -> &Path;

    /// Reads exactly one frame.
    ///
    /// # Errors
    ///
    /// - [`FrameStoreError::FrameNotFound`] if `index` is at or past the end of the
    ///   frames present in the file.
    /// - [`FrameStoreError::FrameCorrupt`] if bytes for `index` exist but do not
    ///   form a complete, well-formed frame.
    /// - [`FrameStoreError::Io`] for any other I/O failure.
    fn read_frame(&mut self, index: usize) -> Result<Frame, FrameStoreError>;
}

/// Defines how trajectory segments are stored on disk.
///
/// Implementors provide random-access reads and single-frame, create-only
/// writes. Caching of frame contents is not the format's job; the lazy
/// snapshot owns that.
pub trait TrajectoryFormat: Send + Sync {
    /// The reader returned by [`open`](TrajectoryFormat::open).
    type Reader: FrameReader + Send;

    /// File extension (without the dot) of segment files in this format.
    fn extension(&self) -> &'static str;

    /// Opens a reader on an existing segment file.
    ///
    /// # Errors
    ///
    /// Returns [`FrameStoreError::Io`] if the file cannot be opened.
    fn open(&self, path: &Path) -> Result<Self::Reader, FrameStoreError>;

    /// Writes a single-frame segment file.
    ///
    /// # Errors
    ///
    /// Returns [`FrameStoreError::FileExists`] if `path` already exists. The
    /// existing file is never touched.
    fn write_frame(&self, path: &Path, frame: &Frame) -> Result<(), FrameStoreError>;

    /// Opens `path` and reads frame `index` with a fresh reader.
    fn read(&self, path: &Path, index: usize) -> Result<Frame, FrameStoreError> {
        self.open(path)?.read_frame(index)
    }
}
