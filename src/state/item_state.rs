/// Work item state definitions for tracking pipeline progress
use std::fmt;

/// Represents the current state of a work item in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    // ===== Active States =====
    /// Item is waiting for a pool slot
    Pending,

    /// Page is being fetched
    Fetching,

    /// Body is being scanned for candidates
    Scanning,

    /// Candidates are passing through completion and resolution
    Filtering,

    /// Surviving candidates are being pushed to the result stream
    Emitting,

    // ===== Terminal States =====
    /// Every candidate of the item has been handled
    Done,

    /// The item was dropped (fetch or parse failure)
    Failed,
}

impl ItemState {
    /// Returns true if no further processing happens for the item
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if `next` is a legal successor of this state
    ///
    /// Raw bodies skip `Fetching`, and filtering alternates with emitting
    /// once per candidate.
    pub fn can_transition_to(&self, next: ItemState) -> bool {
        use ItemState::*;

        match (self, next) {
            (Pending, Fetching) | (Pending, Scanning) => true,
            (Fetching, Scanning) => true,
            (Scanning, Filtering) | (Scanning, Done) => true,
            (Filtering, Emitting) | (Filtering, Filtering) | (Filtering, Done) => true,
            (Emitting, Filtering) | (Emitting, Done) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Scanning => "scanning",
            Self::Filtering => "filtering",
            Self::Emitting => "emitting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Follows one work item through its states, logging each transition
#[derive(Debug)]
pub struct StateTracker {
    label: String,
    state: ItemState,
}

impl StateTracker {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            state: ItemState::Pending,
        }
    }

    pub fn state(&self) -> ItemState {
        self.state
    }

    /// Moves to `next`; an illegal transition is logged but still applied
    pub fn advance(&mut self, next: ItemState) {
        if self.state == next {
            return;
        }

        if self.state.can_transition_to(next) {
            tracing::trace!("{}: {} -> {}", self.label, self.state, next);
        } else {
            tracing::warn!(
                "{}: unexpected transition {} -> {}",
                self.label,
                self.state,
                next
            );
        }
        self.state = next;
    }
}
