use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    /// `mdrun` started for segment `number`; `max_frames` bounds the run if set.
    SegmentStart { number: usize, max_frames: Option<u64> },
    FrameReady { file_number: usize, file_position: usize },
    /// The next frame is not complete yet; the caller sleeps for `interval`.
    Waiting { file_position: usize, interval: Duration },
    SegmentFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
