use super::config::EngineConfig;
use super::error::EngineError;
use super::ids::EngineId;
use super::naming::{FileNaming, MAX_FILE_NUMBER};
use super::outcome::FrameOutcome;
use super::snapshot::{ExternalMdSnapshot, FrameSource};
use super::store::FrameStoreCache;
use crate::core::io::error::FrameStoreError;
use crate::core::io::traits::TrajectoryFormat;
use crate::core::io::trr::TrrFormat;
use crate::core::models::frame::Frame;
use crate::core::process::{self, SimulationProcess, quote_arg};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, info, trace, warn};

/// Lifecycle of the segment an engine is working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentState {
    Idle,
    /// Only observable while the preprocessing subprocess runs.
    Preparing,
    Prepared,
    Running,
    Complete,
}

impl fmt::Display for SegmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Preparing => "preparing",
            Self::Prepared => "prepared",
            Self::Running => "running",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Output files of the active segment, relative to the base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFiles {
    pub number: usize,
    pub output_file: PathBuf,
    pub energy_file: PathBuf,
    pub log_file: PathBuf,
}

/// The part of an engine that snapshots may reach through a weak handle.
struct EngineCore<F: TrajectoryFormat> {
    id: EngineId,
    name: Arc<str>,
    naming: FileNaming,
    store: Mutex<FrameStoreCache<F>>,
}

impl<F: TrajectoryFormat> EngineCore<F> {
    fn store(&self) -> MutexGuard<'_, FrameStoreCache<F>> {
        // A panic mid-read leaves at worst a stale reader, which the next path switch replaces.
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<F: TrajectoryFormat> FrameSource for EngineCore<F> {
    fn engine_id(&self) -> EngineId {
        self.id
    }

    fn engine_name(&self) -> &str {
        &self.name
    }

    fn segment_path(&self, file_number: usize) -> PathBuf {
        self.naming.resolve(&self.naming.segment_filename(file_number))
    }

    fn read_frame_data(&self, path: &Path, file_position: usize) -> Result<Frame, FrameStoreError> {
        self.store().read(path, file_position)
    }
}

/// Drives GROMACS as an external coprocess, one trajectory segment at a time.
///
/// The engine never blocks on the simulation itself: [`launch_segment`]
/// returns as soon as `mdrun` is started, and the caller polls the growing
/// trajectory with [`generate_next_frame`] (or [`poll_frame`]). Each poll is
/// [`FrameOutcome::Pending`], [`FrameOutcome::Corrupt`] or a ready
/// [`ExternalMdSnapshot`]; how long to wait between polls is up to the caller.
///
/// [`launch_segment`]: ExternalEngine::launch_segment
/// [`generate_next_frame`]: ExternalEngine::generate_next_frame
/// [`poll_frame`]: ExternalEngine::poll_frame
pub struct ExternalEngine<F: TrajectoryFormat = TrrFormat> {
    core: Arc<EngineCore<F>>,
    config: EngineConfig,
    state: SegmentState,
    input_file: PathBuf,
    segment: Option<SegmentFiles>,
}

impl ExternalEngine<TrrFormat> {
    /// Creates an engine writing and reading TRR segments.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_format(config, TrrFormat)
    }
}

impl<F: TrajectoryFormat + 'static> ExternalEngine<F> {
    pub fn with_format(config: EngineConfig, format: F) -> Self {
        let naming = FileNaming::new(
            config.name.clone(),
            config.base_dir.clone(),
            format.extension(),
        );
        let input_file = naming.initial_frame_filename();
        let core = EngineCore {
            id: EngineId::next(),
            name: Arc::from(config.name.as_str()),
            naming,
            store: Mutex::new(FrameStoreCache::new(format)),
        };
        Self {
            core: Arc::new(core),
            config,
            state: SegmentState::Idle,
            input_file,
            segment: None,
        }
    }

    pub fn id(&self) -> EngineId {
        self.core.id
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn naming(&self) -> &FileNaming {
        &self.core.naming
    }

    pub fn base_dir(&self) -> &Path {
        self.core.naming.base_dir()
    }

    pub fn state(&self) -> SegmentState {
        self.state
    }

    pub fn segment(&self) -> Option<&SegmentFiles> {
        self.segment.as_ref()
    }

    pub fn current_file_number(&self) -> Option<usize> {
        self.segment.as_ref().map(|s| s.number)
    }

    /// Initial condition consumed by `grompp -t`, relative to the base directory.
    pub fn input_file(&self) -> &Path {
        &self.input_file
    }

    pub fn trajectory_filename(&self, number: usize) -> PathBuf {
        self.core.naming.trajectory_filename(number)
    }

    /// Resolved path of the file holding segment `number`.
    pub fn trajectory_path(&self, number: usize) -> PathBuf {
        self.core.segment_path(number)
    }

    pub fn energy_filename(&self, number: usize) -> PathBuf {
        self.core.naming.energy_filename(number)
    }

    pub fn log_filename(&self, number: usize) -> PathBuf {
        self.core.naming.log_filename(number)
    }

    /// Number of times the frame store has opened a reader.
    pub fn store_opens(&self) -> usize {
        self.core.store().opens()
    }

    /// Creates a lazy snapshot of frame `file_position` in segment `file_number`.
    ///
    /// No I/O happens until the snapshot's data is accessed.
    pub fn snapshot(&self, file_number: usize, file_position: usize) -> ExternalMdSnapshot {
        let engine = Arc::downgrade(&self.core) as Weak<dyn FrameSource>;
        ExternalMdSnapshot::from_source(
            file_number,
            file_position,
            engine,
            self.core.id,
            Arc::clone(&self.core.name),
        )
    }

    /// Points the per-run cursor at segment `number`.
    ///
    /// A running or completed segment returns the engine to
    /// [`SegmentState::Idle`]; a prepared run input stays valid.
    pub fn set_filenames(&mut self, number: usize) -> Result<(), EngineError> {
        if number == 0 {
            return Err(EngineError::ReservedSegmentNumber);
        }
        if number > MAX_FILE_NUMBER {
            return Err(EngineError::SegmentNumberOverflow(number));
        }

        let naming = &self.core.naming;
        self.input_file = naming.initial_frame_filename();
        self.segment = Some(SegmentFiles {
            number,
            output_file: naming.trajectory_filename(number),
            energy_file: naming.energy_filename(number),
            log_file: naming.log_filename(number),
        });
        if matches!(self.state, SegmentState::Running | SegmentState::Complete) {
            self.state = SegmentState::Idle;
        }
        Ok(())
    }

    /// Writes a single-frame trajectory file, refusing to overwrite.
    ///
    /// Relative paths are taken against the base directory. Missing parent
    /// directories are created.
    pub fn write_frame_to_file(&self, path: &Path, frame: &Frame) -> Result<PathBuf, EngineError> {
        let path = self.core.naming.resolve(path);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| EngineError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        self.core.store().format().write_frame(&path, frame)?;
        Ok(path)
    }

    /// Writes the initial condition and returns a snapshot of it (segment 0, frame 0).
    pub fn write_initial_frame(&self, frame: &Frame) -> Result<ExternalMdSnapshot, EngineError> {
        let path = self.write_frame_to_file(&self.input_file, frame)?;
        info!(path = %path.display(), n_atoms = frame.n_atoms(), "Wrote initial frame.");
        Ok(self.snapshot(0, 0))
    }

    /// The `grompp` command line that builds the run input.
    pub fn preprocess_command(&self) -> String {
        format!(
            "{} grompp -c {} -f {} -p {} -t {}",
            self.config.gmx_executable,
            path_arg(&self.config.gro),
            path_arg(&self.config.mdp),
            path_arg(&self.config.top),
            path_arg(&self.input_file),
        )
    }

    /// Runs `grompp` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Preparation`] on a non-zero exit and
    /// [`EngineError::Launch`] if the command cannot be started. Either way
    /// the engine is back in [`SegmentState::Idle`]; nothing is retried.
    pub fn prepare(&mut self) -> Result<(), EngineError> {
        let command = self.preprocess_command();
        self.state = SegmentState::Preparing;
        info!(engine = %self.core.name, "Preparing run input.");
        debug!(%command, "Preprocessing command.");

        match process::run_sync(&command, Some(self.base_dir())) {
            Ok(0) => {
                self.state = SegmentState::Prepared;
                info!(engine = %self.core.name, "Run input prepared.");
                Ok(())
            }
            Ok(exit_code) => {
                self.state = SegmentState::Idle;
                Err(EngineError::Preparation { exit_code, command })
            }
            Err(e) => {
                self.state = SegmentState::Idle;
                Err(e.into())
            }
        }
    }

    /// The `mdrun` command line for the active segment.
    pub fn engine_command(&self) -> Result<String, EngineError> {
        let files = self.segment.as_ref().ok_or(EngineError::NoActiveSegment)?;
        let mut command = format!(
            "{} mdrun -s {} -o {} -e {} -g {}",
            self.config.gmx_executable,
            path_arg(&self.config.tpr_file),
            path_arg(&files.output_file),
            path_arg(&files.energy_file),
            path_arg(&files.log_file),
        );
        let extra = self.config.mdrun_args.trim();
        if !extra.is_empty() {
            command.push(' ');
            command.push_str(extra);
        }
        Ok(command)
    }

    /// Starts `mdrun` for segment `number` and returns without waiting.
    ///
    /// # Errors
    ///
    /// Refuses with [`FrameStoreError::FileExists`] if the segment's
    /// trajectory already exists, so a finished segment is never clobbered.
    pub fn launch_segment(&mut self, number: usize) -> Result<SimulationProcess, EngineError> {
        self.set_filenames(number)?;
        let naming = &self.core.naming;
        for dir in [naming.trajectory_dir(), naming.energy_dir(), naming.log_dir()] {
            let path = naming.resolve(&dir);
            fs::create_dir_all(&path).map_err(|source| EngineError::Io { path, source })?;
        }

        let output = self.core.segment_path(number);
        if output.exists() {
            return Err(FrameStoreError::FileExists(output).into());
        }
        if self.state != SegmentState::Prepared {
            warn!(state = %self.state, "Launching segment {} without a fresh prepare.", number);
        }
        // A reader left on a previous file of the same name would see stale bytes.
        self.core.store().release();

        let command = self.engine_command()?;
        info!(engine = %self.core.name, segment = number, "Launching segment.");
        debug!(%command, "Engine command.");
        let process = process::run_async(&command, Some(self.base_dir()))?;
        self.state = SegmentState::Running;
        Ok(process)
    }

    /// Checks whether frame `number` of the active segment is available.
    ///
    /// Does not remember earlier polls; asking for the same number twice
    /// reads the file twice. The snapshot in a ready outcome is not loaded.
    pub fn poll_frame(&self, number: usize) -> Result<FrameOutcome, EngineError> {
        let files = self.segment.as_ref().ok_or(EngineError::NoActiveSegment)?;
        let path = self.core.segment_path(files.number);
        let result = self.core.read_frame_data(&path, number);
        self.classify(result, files.number, number)
    }

    /// Like [`poll_frame`](Self::poll_frame), against an arbitrary segment file.
    ///
    /// The file number is derived from the file stem (`0000003.trr` is 3,
    /// `initial_frame.trr` is 0), and the snapshot later loads through the
    /// engine's naming policy.
    pub fn read_frame_from_file(
        &self,
        path: &Path,
        number: usize,
    ) -> Result<FrameOutcome, EngineError> {
        let file_number = FileNaming::parse_file_number(path)
            .ok_or_else(|| EngineError::UnrecognizedSegmentFile(path.to_path_buf()))?;
        let resolved = self.core.naming.resolve(path);
        let result = self.core.read_frame_data(&resolved, number);
        self.classify(result, file_number, number)
    }

    /// Asks for the frame after `current`.
    ///
    /// The next index is `current.file_position() + 1` when `current` came
    /// from this engine's active segment, otherwise 0.
    pub fn generate_next_frame(
        &self,
        current: Option<&ExternalMdSnapshot>,
    ) -> Result<FrameOutcome, EngineError> {
        let active = self.current_file_number();
        let next = match current {
            Some(snap) if snap.engine_id() == self.core.id && Some(snap.file_number()) == active => {
                snap.file_position() + 1
            }
            _ => 0,
        };
        self.poll_frame(next)
    }

    /// Marks the active segment complete and closes the cached reader.
    pub fn finish_segment(&mut self) {
        self.core.store().release();
        self.state = SegmentState::Complete;
        if let Some(files) = &self.segment {
            info!(engine = %self.core.name, segment = files.number, "Segment complete.");
        }
    }

    fn classify(
        &self,
        result: Result<Frame, FrameStoreError>,
        file_number: usize,
        file_position: usize,
    ) -> Result<FrameOutcome, EngineError> {
        match result {
            Ok(_) => Ok(FrameOutcome::Ready(self.snapshot(file_number, file_position))),
            Err(FrameStoreError::FrameNotFound { available, .. }) => {
                trace!(file_number, file_position, available, "Frame pending.");
                Ok(FrameOutcome::Pending)
            }
            Err(FrameStoreError::FrameCorrupt { kind, .. }) => {
                trace!(file_number, file_position, %kind, "Frame incomplete.");
                Ok(FrameOutcome::Corrupt)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<F: TrajectoryFormat> fmt::Debug for ExternalEngine<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalEngine")
            .field("id", &self.core.id)
            .field("name", &self.core.name)
            .field("state", &self.state)
            .field("segment", &self.segment)
            .finish()
    }
}

fn path_arg(path: &Path) -> String {
    quote_arg(&path.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::EngineConfigBuilder;
    use tempfile::tempdir;

    fn config(base: &Path) -> EngineConfig {
        EngineConfigBuilder::new()
            .name("gmx")
            .gro("conf.gro")
            .mdp("md.mdp")
            .top("topol.top")
            .base_dir(base)
            .build()
            .unwrap()
    }

    fn frame(x: f32) -> Frame {
        let mut frame = Frame::zeros(2);
        frame.coordinates[1].x = x;
        frame
    }

    #[test]
    fn new_engine_is_idle_without_a_segment() {
        let engine = ExternalEngine::new(config(Path::new("")));
        assert_eq!(engine.state(), SegmentState::Idle);
        assert_eq!(engine.current_file_number(), None);
        assert_eq!(engine.input_file(), Path::new("initial_frame.trr"));
        assert_eq!(engine.store_opens(), 0);
    }

    #[test]
    fn set_filenames_derives_segment_files() {
        let mut engine = ExternalEngine::new(config(Path::new("")));
        engine.set_filenames(3).unwrap();
        let files = engine.segment().unwrap();
        assert_eq!(files.number, 3);
        assert_eq!(files.output_file, PathBuf::from("gmx_trr/0000003.trr"));
        assert_eq!(files.energy_file, PathBuf::from("gmx_edr/0000003.edr"));
        assert_eq!(files.log_file, PathBuf::from("gmx_log/0000003.log"));
    }

    #[test]
    fn set_filenames_rejects_unencodable_numbers() {
        let mut engine = ExternalEngine::new(config(Path::new("")));
        assert!(matches!(
            engine.set_filenames(10_000_000),
            Err(EngineError::SegmentNumberOverflow(10_000_000))
        ));
        assert!(matches!(
            engine.set_filenames(0),
            Err(EngineError::ReservedSegmentNumber)
        ));
        assert!(engine.set_filenames(9_999_999).is_ok());
    }

    #[test]
    fn commands_follow_gromacs_argument_order() {
        let mut cfg = config(Path::new(""));
        cfg.mdrun_args = "-nt 2".to_string();
        let mut engine = ExternalEngine::new(cfg);
        assert_eq!(
            engine.preprocess_command(),
            "gmx grompp -c conf.gro -f md.mdp -p topol.top -t initial_frame.trr"
        );
        assert!(matches!(
            engine.engine_command(),
            Err(EngineError::NoActiveSegment)
        ));

        engine.set_filenames(1).unwrap();
        assert_eq!(
            engine.engine_command().unwrap(),
            "gmx mdrun -s topol.tpr -o gmx_trr/0000001.trr -e gmx_edr/0000001.edr \
             -g gmx_log/0000001.log -nt 2"
        );
    }

    #[test]
    fn paths_with_spaces_are_quoted() {
        let mut cfg = config(Path::new(""));
        cfg.gro = PathBuf::from("my conf.gro");
        let engine = ExternalEngine::new(cfg);
        let argv = process::split_command(&engine.preprocess_command()).unwrap();
        assert_eq!(argv[3], "my conf.gro");
    }

    #[test]
    fn poll_requires_an_active_segment() {
        let engine = ExternalEngine::new(config(Path::new("")));
        assert!(matches!(
            engine.poll_frame(0),
            Err(EngineError::NoActiveSegment)
        ));
    }

    #[test]
    fn poll_of_unwritten_segment_is_pending() {
        let dir = tempdir().unwrap();
        let mut engine = ExternalEngine::new(config(dir.path()));
        engine.set_filenames(1).unwrap();
        assert_eq!(engine.poll_frame(0).unwrap(), FrameOutcome::Pending);
        assert_eq!(engine.generate_next_frame(None).unwrap(), FrameOutcome::Pending);
    }

    #[test]
    fn initial_frame_is_written_once() {
        let dir = tempdir().unwrap();
        let engine = ExternalEngine::new(config(dir.path()));
        let snap = engine.write_initial_frame(&frame(1.5)).unwrap();
        assert_eq!((snap.file_number(), snap.file_position()), (0, 0));
        assert!(dir.path().join("initial_frame.trr").is_file());
        assert_eq!(snap.coordinates().unwrap()[1].x, 1.5);

        let err = engine.write_initial_frame(&frame(2.0)).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Storage(FrameStoreError::FileExists(_))
        ));
        snap.invalidate();
        assert_eq!(snap.coordinates().unwrap()[1].x, 1.5);
    }

    #[test]
    fn write_frame_to_file_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let engine = ExternalEngine::new(config(dir.path()));
        let path = engine
            .write_frame_to_file(&engine.trajectory_filename(4), &frame(0.0))
            .unwrap();
        assert_eq!(path, dir.path().join("gmx_trr/0000004.trr"));
        assert!(path.is_file());
    }

    #[test]
    fn next_frame_index_follows_the_current_snapshot() {
        let dir = tempdir().unwrap();
        let mut engine = ExternalEngine::new(config(dir.path()));
        engine.set_filenames(2).unwrap();
        engine
            .write_frame_to_file(&engine.trajectory_filename(2), &frame(0.0))
            .unwrap();

        let first = engine.generate_next_frame(None).unwrap().into_snapshot().unwrap();
        assert_eq!((first.file_number(), first.file_position()), (2, 0));
        assert_eq!(
            engine.generate_next_frame(Some(&first)).unwrap(),
            FrameOutcome::Pending
        );

        // Snapshots of another segment restart at frame 0.
        let foreign = engine.snapshot(1, 0);
        assert!(engine.generate_next_frame(Some(&foreign)).unwrap().is_ready());
    }

    #[test]
    fn read_frame_from_file_derives_file_number() {
        let dir = tempdir().unwrap();
        let engine = ExternalEngine::new(config(dir.path()));
        let relative = engine.trajectory_filename(3);
        engine.write_frame_to_file(&relative, &frame(0.25)).unwrap();

        let snap = engine
            .read_frame_from_file(&relative, 0)
            .unwrap()
            .into_snapshot()
            .unwrap();
        assert_eq!(snap.file_number(), 3);
        assert_eq!(snap.coordinates().unwrap()[1].x, 0.25);
        assert_eq!(
            engine.read_frame_from_file(&relative, 1).unwrap(),
            FrameOutcome::Pending
        );
        assert!(matches!(
            engine.read_frame_from_file(Path::new("traj.trr"), 0),
            Err(EngineError::UnrecognizedSegmentFile(_))
        ));
    }

    #[test]
    fn finish_segment_releases_the_reader() {
        let dir = tempdir().unwrap();
        let mut engine = ExternalEngine::new(config(dir.path()));
        engine.set_filenames(1).unwrap();
        engine
            .write_frame_to_file(&engine.trajectory_filename(1), &frame(0.0))
            .unwrap();
        engine.poll_frame(0).unwrap();
        engine.poll_frame(0).unwrap();
        assert_eq!(engine.store_opens(), 1);

        engine.finish_segment();
        assert_eq!(engine.state(), SegmentState::Complete);
        engine.poll_frame(0).unwrap();
        assert_eq!(engine.store_opens(), 2);

        engine.set_filenames(2).unwrap();
        assert_eq!(engine.state(), SegmentState::Idle);
    }
}
