//! Status of a task within its evaluation lifecycle.

use std::fmt;

/// Lifecycle state of a task.
///
/// # State Machine
///
/// ```text
/// FRESH ──run──> RUNNING ──> SUCCEEDED | FAILED
///                   │
///                   └──cancel──> CANCELLED
/// ```
///
/// Every state returns to `Fresh` through a reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    /// The task has never run or has been reset.
    #[default]
    Fresh,

    /// The task needs to run again on the next step.
    Running,

    /// The task returned success.
    Succeeded,

    /// The task returned failure.
    Failed,

    /// The task was terminated by an ancestor.
    Cancelled,
}

impl Status {
    /// Returns `true` if this status is `Running`.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, Status::Running)
    }

    /// Returns `true` if this status is `Succeeded`.
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Succeeded)
    }

    /// Returns `true` if this status is `Failed`.
    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Failed)
    }

    /// Returns `true` for the terminal states `Succeeded`, `Failed` and `Cancelled`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Succeeded | Status::Failed | Status::Cancelled)
    }

    /// Swaps `Succeeded` and `Failed`; other states are returned unchanged.
    #[inline]
    pub fn invert(self) -> Self {
        match self {
            Status::Succeeded => Status::Failed,
            Status::Failed => Status::Succeeded,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Fresh => "FRESH",
            Status::Running => "RUNNING",
            Status::Succeeded => "SUCCEEDED",
            Status::Failed => "FAILED",
            Status::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
