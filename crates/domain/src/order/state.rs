//! Order placement state machine.

use serde::{Deserialize, Serialize};

/// The progress of a single placement attempt.
///
/// State transitions:
/// ```text
/// Pending ──► AvailabilityChecked ──► StockDeducted ──► Committed
///    │                │                     │
///    └────────────────┴─────────────────────┴──► Aborted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PlacementState {
    /// Unit of work opened, nothing checked yet.
    #[default]
    Pending,

    /// At least one portion is available under lock.
    AvailabilityChecked,

    /// The order is staged and every recipe line deducted.
    StockDeducted,

    /// The unit of work committed (terminal state).
    Committed,

    /// The unit of work was rolled back (terminal state).
    Aborted,
}

impl PlacementState {
    /// Returns true if `next` may follow this state.
    pub fn can_transition_to(&self, next: PlacementState) -> bool {
        use PlacementState::*;
        match (self, next) {
            (Pending, AvailabilityChecked)
            | (AvailabilityChecked, StockDeducted)
            | (StockDeducted, Committed) => true,
            (current, Aborted) => !current.is_terminal(),
            _ => false,
        }
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlacementState::Committed | PlacementState::Aborted)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementState::Pending => "Pending",
            PlacementState::AvailabilityChecked => "AvailabilityChecked",
            PlacementState::StockDeducted => "StockDeducted",
            PlacementState::Committed => "Committed",
            PlacementState::Aborted => "Aborted",
        }
    }
}

impl std::fmt::Display for PlacementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
