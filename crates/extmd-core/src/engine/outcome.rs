use super::snapshot::ExternalMdSnapshot;

/// Result of asking the engine for the next frame of a growing segment.
///
/// `Pending` and `Corrupt` are both transient while the simulation is still
/// writing; the caller decides how long to wait before asking again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame has not been written yet.
    Pending,
    /// Bytes for the frame exist but do not yet form a complete frame.
    Corrupt,
    Ready(ExternalMdSnapshot),
}

impl FrameOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn is_transient(&self) -> bool {
        !self.is_ready()
    }

    pub fn snapshot(&self) -> Option<&ExternalMdSnapshot> {
        match self {
            Self::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn into_snapshot(self) -> Option<ExternalMdSnapshot> {
        match self {
            Self::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}
