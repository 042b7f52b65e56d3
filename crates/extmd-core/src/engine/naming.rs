//! Segment file naming.
//!
//! Every simulation segment gets a trajectory, energy and log file under
//! `<name>_trr/`, `<name>_edr/` and `<name>_log/`, all sharing a 7-digit
//! zero-padded stem so that lexicographic and numeric order agree on disk.
//! Segment 0 is the externally supplied initial condition, always
//! `initial_frame.trr`.

use std::path::{Path, PathBuf};

pub const FILE_NUMBER_WIDTH: usize = 7;
pub const MAX_FILE_NUMBER: usize = 9_999_999;
pub const INITIAL_FRAME_STEM: &str = "initial_frame";

/// Pure, deterministic mapping from segment numbers to file paths.
///
/// Paths returned by the `*_filename` methods are relative to the base
/// directory; [`resolve`](FileNaming::resolve) anchors them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNaming {
    name: String,
    base_dir: PathBuf,
    extension: &'static str,
}

impl FileNaming {
    pub fn new(
        name: impl Into<String>,
        base_dir: impl Into<PathBuf>,
        extension: &'static str,
    ) -> Self {
        Self {
            name: name.into(),
            base_dir: base_dir.into(),
            extension,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn stem(number: usize) -> String {
        format!("{number:0width$}", width = FILE_NUMBER_WIDTH)
    }

    pub fn trajectory_dir(&self) -> PathBuf {
        PathBuf::from(format!("{}_{}", self.name, self.extension))
    }

    pub fn energy_dir(&self) -> PathBuf {
        PathBuf::from(format!("{}_edr", self.name))
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(format!("{}_log", self.name))
    }

    pub fn trajectory_filename(&self, number: usize) -> PathBuf {
        self.trajectory_dir()
            .join(format!("{}.{}", Self::stem(number), self.extension))
    }

    pub fn energy_filename(&self, number: usize) -> PathBuf {
        self.energy_dir().join(format!("{}.edr", Self::stem(number)))
    }

    pub fn log_filename(&self, number: usize) -> PathBuf {
        self.log_dir().join(format!("{}.log", Self::stem(number)))
    }

    pub fn initial_frame_filename(&self) -> PathBuf {
        PathBuf::from(format!("{INITIAL_FRAME_STEM}.{}", self.extension))
    }

    /// Path of the file holding segment `number`; 0 is the initial frame.
    pub fn segment_filename(&self, number: usize) -> PathBuf {
        match number {
            0 => self.initial_frame_filename(),
            n => self.trajectory_filename(n),
        }
    }

    /// Anchors a relative segment path at the base directory.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.base_dir.join(relative)
    }

    /// Recovers the file number from a segment path.
    ///
    /// Accepts `<digits>.<ext>` and the initial-frame file (number 0).
    pub fn parse_file_number(path: &Path) -> Option<usize> {
        let stem = path.file_stem()?.to_str()?;
        if stem == INITIAL_FRAME_STEM {
            return Some(0);
        }
        if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        stem.parse().ok()
    }
}
