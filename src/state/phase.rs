/// Collector phase definitions
///
/// The collector walks these phases for every search page and candidate.
use std::fmt;

/// Represents the current phase of a collection run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectorPhase {
    // ===== Startup =====
    /// Collector constructed, nothing requested yet
    Idle,

    // ===== Working Phases =====
    /// Requesting the next search page
    Searching,

    /// Fetching a candidate's profile, repositories, or language breakdowns
    Fetching,

    /// Applying rejection rules or building the record
    Classifying,

    /// Appending an accepted record and persisting at interval boundaries
    Accumulating,

    /// Waiting out a quota suspension
    Throttled,

    // ===== Shutdown =====
    /// Writing the last checkpoint and the final batch
    Finalizing,

    /// Run finished
    Done,
}

impl CollectorPhase {
    /// Returns true once the run is over
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true for phases that issue or wait on API calls
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Searching | Self::Fetching | Self::Classifying | Self::Accumulating | Self::Throttled
        )
    }

    /// Whether the collector may move from `self` to `next`
    ///
    /// Any working phase may go straight to `Finalizing` when the target is
    /// reached or the queries run out. `Throttled` only returns to the phase
    /// that entered it.
    pub fn can_transition_to(&self, next: CollectorPhase) -> bool {
        use CollectorPhase::*;
        match (self, next) {
            (Idle, Searching) => true,
            (Idle, Finalizing) => true,

            (Searching, Searching | Fetching | Throttled | Finalizing) => true,

            (Fetching, Fetching | Classifying | Searching | Throttled | Finalizing) => true,

            (Classifying, Fetching | Accumulating | Searching | Finalizing) => true,

            (Accumulating, Fetching | Searching | Finalizing) => true,

            (Throttled, Searching | Fetching) => true,

            (Finalizing, Done) => true,

            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Searching => "searching",
            Self::Fetching => "fetching",
            Self::Classifying => "classifying",
            Self::Accumulating => "accumulating",
            Self::Throttled => "throttled",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
        }
    }

    /// Returns all phases
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::Searching,
            Self::Fetching,
            Self::Classifying,
            Self::Accumulating,
            Self::Throttled,
            Self::Finalizing,
            Self::Done,
        ]
    }
}

impl fmt::Display for CollectorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
