//! Task status state machine.

use serde::{Deserialize, Serialize};

/// Task status.
///
/// State transitions:
/// - Pending -> Completed (admin completes the task, cascade runs)
/// - Pending -> Cancelled (task is abandoned; cancellation is a status, not removal)
///
/// Completed and Cancelled are terminal: no transition leaves them.
///
/// Design note: Using an enum ensures exhaustive matching and prevents invalid states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting for an admin to complete it.
    Pending,

    /// Completed; completion metadata and cascade links are recorded.
    Completed,

    /// Abandoned. The record stays in the store.
    Cancelled,
}

impl TaskStatus {
    /// Is this a terminal status (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }

    /// Is the transition `self -> next` allowed by the state machine?
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        match self {
            TaskStatus::Pending => matches!(next, TaskStatus::Completed | TaskStatus::Cancelled),
            TaskStatus::Completed | TaskStatus::Cancelled => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}
