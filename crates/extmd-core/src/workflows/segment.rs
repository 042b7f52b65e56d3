use crate::core::io::traits::TrajectoryFormat;
use crate::core::process::SimulationProcess;
use crate::engine::error::EngineError;
use crate::engine::external::ExternalEngine;
use crate::engine::outcome::FrameOutcome;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::snapshot::ExternalMdSnapshot;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How the caller waits on a growing segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Sleep between transient (pending or corrupt) polls.
    pub poll_interval: Duration,
    /// Stop after this many frames even if none was accepted.
    pub max_frames: Option<usize>,
    /// Give up after this many consecutive transient polls.
    pub max_transient_polls: Option<usize>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_frames: None,
            max_transient_polls: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The stop condition accepted the last snapshot.
    Accepted,
    MaxFrames,
    /// The process exited and no further frame was found.
    ProcessExited,
    PollLimit,
}

#[derive(Debug, Clone)]
pub struct SegmentResult {
    /// Every ready frame, in file order.
    pub snapshots: Vec<ExternalMdSnapshot>,
    pub stop_reason: StopReason,
    /// Exit code of `mdrun`; `128 + 15` if it had to be terminated.
    pub exit_code: i32,
}

impl SegmentResult {
    pub fn last(&self) -> Option<&ExternalMdSnapshot> {
        self.snapshots.last()
    }
}

/// Prepares the run input, launches segment `number` and monitors it.
///
/// `stop` sees every ready snapshot in order; returning `Ok(true)` ends the
/// segment.
#[instrument(skip_all, name = "segment_workflow", fields(segment = number))]
pub fn run<F, S>(
    engine: &mut ExternalEngine<F>,
    number: usize,
    config: &PollConfig,
    stop: S,
    reporter: &ProgressReporter,
) -> Result<SegmentResult, EngineError>
where
    F: TrajectoryFormat + 'static,
    S: FnMut(&ExternalMdSnapshot) -> Result<bool, EngineError>,
{
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    engine.prepare()?;
    reporter.report(Progress::PhaseFinish);

    let process = engine.launch_segment(number)?;
    monitor(engine, process, config, stop, reporter)
}

/// Polls an already launched segment until it stops, then shuts it down.
///
/// The process group is terminated if it is still running, and the segment
/// is finished even when polling fails. Termination and a failed exit are
/// both reported as [`Progress::Message`].
pub fn monitor<F, S>(
    engine: &mut ExternalEngine<F>,
    mut process: SimulationProcess,
    config: &PollConfig,
    mut stop: S,
    reporter: &ProgressReporter,
) -> Result<SegmentResult, EngineError>
where
    F: TrajectoryFormat + 'static,
    S: FnMut(&ExternalMdSnapshot) -> Result<bool, EngineError>,
{
    reporter.report(Progress::SegmentStart {
        number: engine.current_file_number().unwrap_or_default(),
        max_frames: config.max_frames.map(|n| n as u64),
    });

    let polled = poll_until_stop(engine, &mut process, config, &mut stop, reporter);
    let shutdown = shutdown(&mut process, reporter);
    engine.finish_segment();
    reporter.report(Progress::SegmentFinish);

    let (snapshots, stop_reason) = polled?;
    let exit_code = shutdown?;
    info!(
        frames = snapshots.len(),
        ?stop_reason,
        exit_code,
        "Segment workflow finished."
    );
    Ok(SegmentResult {
        snapshots,
        stop_reason,
        exit_code,
    })
}

fn poll_until_stop<F, S>(
    engine: &ExternalEngine<F>,
    process: &mut SimulationProcess,
    config: &PollConfig,
    stop: &mut S,
    reporter: &ProgressReporter,
) -> Result<(Vec<ExternalMdSnapshot>, StopReason), EngineError>
where
    F: TrajectoryFormat + 'static,
    S: FnMut(&ExternalMdSnapshot) -> Result<bool, EngineError>,
{
    let mut snapshots: Vec<ExternalMdSnapshot> = Vec::new();
    let mut transient = 0usize;

    loop {
        if config.max_frames.is_some_and(|max| snapshots.len() >= max) {
            return Ok((snapshots, StopReason::MaxFrames));
        }

        // Sampled before the poll so frames flushed right before exit are still drained.
        let exited = process.try_wait()?.is_some();

        match engine.generate_next_frame(snapshots.last())? {
            FrameOutcome::Ready(snapshot) => {
                transient = 0;
                reporter.report(Progress::FrameReady {
                    file_number: snapshot.file_number(),
                    file_position: snapshot.file_position(),
                });
                let accepted = stop(&snapshot)?;
                snapshots.push(snapshot);
                if accepted {
                    return Ok((snapshots, StopReason::Accepted));
                }
            }
            FrameOutcome::Pending | FrameOutcome::Corrupt => {
                if exited {
                    return Ok((snapshots, StopReason::ProcessExited));
                }
                transient += 1;
                if config.max_transient_polls.is_some_and(|max| transient >= max) {
                    return Ok((snapshots, StopReason::PollLimit));
                }
                reporter.report(Progress::Waiting {
                    file_position: snapshots.len(),
                    interval: config.poll_interval,
                });
                thread::sleep(config.poll_interval);
            }
        }
    }
}

fn shutdown(
    process: &mut SimulationProcess,
    reporter: &ProgressReporter,
) -> Result<i32, EngineError> {
    let exited_on_its_own = process.try_wait()?.is_some();
    if !exited_on_its_own {
        warn!(pid = process.pid(), "Terminating still-running engine process.");
        process.terminate()?;
        reporter.report(Progress::Message(format!(
            "Terminated engine process group {}",
            process.pid()
        )));
    }
    let code = process.wait()?;
    debug!(pid = process.pid(), code, "Engine process reaped.");
    if exited_on_its_own && code != 0 {
        warn!(pid = process.pid(), code, "Engine process exited with an error.");
        reporter.report(Progress::Message(format!(
            "Engine process exited with code {code}"
        )));
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_poll_config_polls_forever() {
        let config = PollConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.max_frames, None);
        assert_eq!(config.max_transient_polls, None);
    }
}
