#![forbid(unsafe_code)]

//! Error taxonomy for operations, the ledger, and the engine.
//!
//! Three layers, each with its own enum:
//!
//! - [`OperationError`]: what an [`Operation`](crate::Operation) returns from
//!   `apply`/`reverse`. Domain code only ever builds
//!   [`OperationError::Rejected`]; the macro variants are produced by
//!   [`MacroOperation`](crate::MacroOperation).
//! - [`LedgerError`]: cursor boundaries, nothing else.
//! - [`EngineError`]: what callers of [`Engine`](crate::Engine) see.
//!
//! # Severity
//!
//! | Variant                | Receiver touched? | Engine usable after? |
//! |------------------------|-------------------|----------------------|
//! | `OperationFailed`      | no                | yes                  |
//! | `EmptyHistory`         | no                | yes                  |
//! | `NothingToRedo`        | no                | yes                  |
//! | `MacroPartialFailure`  | no (rolled back)  | yes                  |
//! | `CorruptedHistory`     | unknown           | no, until `clear()`  |

use std::fmt;

/// Failure returned by an operation's `apply` or `reverse`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    /// Expected domain-level failure (target missing, name taken, ...).
    #[error("{0}")]
    Rejected(String),

    /// A macro member failed after earlier members applied. The applied
    /// members have already been reversed.
    #[error("member {failed_at} failed after {applied} applied members were rolled back: {cause}")]
    MacroPartialFailure {
        /// Index of the member whose `apply` failed.
        failed_at: usize,
        /// Number of members that had applied and were rolled back.
        applied: usize,
        /// The failing member's error.
        cause: Box<OperationError>,
    },

    /// Reversing an already-applied macro member failed during rollback.
    #[error("rollback of member {index} failed: {cause}")]
    RollbackFailed {
        /// Index of the member whose `reverse` failed.
        index: usize,
        /// The reverse error.
        cause: Box<OperationError>,
    },
}

impl OperationError {
    /// Build a domain-level rejection.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    /// Whether the receiver may have been left in an unknown state.
    #[must_use]
    pub fn is_rollback_failure(&self) -> bool {
        match self {
            Self::RollbackFailed { .. } => true,
            Self::MacroPartialFailure { cause, .. } => cause.is_rollback_failure(),
            Self::Rejected(_) => false,
        }
    }
}

/// Result type for operation effects.
pub type OperationResult = Result<(), OperationError>;

/// Ledger cursor boundary conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Cursor is at the start; nothing to undo.
    #[error("nothing to undo")]
    EmptyHistory,
    /// Cursor is at the end; nothing to redo.
    #[error("nothing to redo")]
    NothingToRedo,
}

/// Which engine call discovered a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPhase {
    /// A macro rollback failed inside `run`.
    Run,
    /// `reverse` failed inside `undo`.
    Undo,
    /// `apply` failed inside `redo`.
    Redo,
    /// The shared engine's lock was poisoned by a panicking operation.
    Lock,
}

impl fmt::Display for FaultPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Run => "run",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Lock => "lock",
        };
        f.write_str(name)
    }
}

/// Record of an inverse-contract violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryFault {
    /// Call that discovered the fault.
    pub phase: FaultPhase,
    /// Description of the offending operation.
    pub description: String,
    /// Rendered error from the operation.
    pub reason: String,
}

impl fmt::Display for HistoryFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of '{}' failed: {}",
            self.phase, self.description, self.reason
        )
    }
}

/// Errors surfaced by the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// `run` was rejected by the operation; receiver and ledger unchanged.
    #[error("operation '{description}' failed: {reason}")]
    OperationFailed {
        /// Description of the rejected operation.
        description: String,
        /// Rejection reason.
        reason: String,
    },

    /// `undo` with the cursor at the start.
    #[error("nothing to undo")]
    EmptyHistory,

    /// `redo` with the cursor at the end.
    #[error("nothing to redo")]
    NothingToRedo,

    /// A macro member failed; applied members were already rolled back.
    #[error("macro '{description}' failed at member {failed_at} ({applied} rolled back): {reason}")]
    MacroPartialFailure {
        /// Description of the macro.
        description: String,
        /// Index of the failing member.
        failed_at: usize,
        /// Number of members rolled back.
        applied: usize,
        /// The failing member's error.
        reason: String,
    },

    /// An operation broke its inverse contract. The engine refuses further
    /// work until [`Engine::clear`](crate::Engine::clear).
    #[error("corrupted history: {0}")]
    CorruptedHistory(HistoryFault),
}

impl EngineError {
    /// `EmptyHistory` or `NothingToRedo`: report, don't alarm.
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        matches!(self, Self::EmptyHistory | Self::NothingToRedo)
    }

    /// `CorruptedHistory`: the engine is halted.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CorruptedHistory(_))
    }
}

impl From<LedgerError> for EngineError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::EmptyHistory => Self::EmptyHistory,
            LedgerError::NothingToRedo => Self::NothingToRedo,
        }
    }
}

/// Result type for engine calls.
pub type EngineResult<T = ()> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_displays_reason_verbatim() {
        let err = OperationError::rejected("file not found: a.txt");
        assert_eq!(err.to_string(), "file not found: a.txt");
    }

    #[test]
    fn rollback_failure_detected_through_nesting() {
        let inner = OperationError::RollbackFailed {
            index: 0,
            cause: Box::new(OperationError::rejected("gone")),
        };
        let outer = OperationError::MacroPartialFailure {
            failed_at: 2,
            applied: 2,
            cause: Box::new(inner),
        };
        assert!(outer.is_rollback_failure());
        assert!(!OperationError::rejected("x").is_rollback_failure());
    }

    #[test]
    fn ledger_errors_map_to_boundaries() {
        let undo: EngineError = LedgerError::EmptyHistory.into();
        let redo: EngineError = LedgerError::NothingToRedo.into();
        assert_eq!(undo, EngineError::EmptyHistory);
        assert_eq!(redo, EngineError::NothingToRedo);
        assert!(undo.is_boundary());
        assert!(!undo.is_fatal());
    }

    #[test]
    fn corrupted_history_is_fatal() {
        let err = EngineError::CorruptedHistory(HistoryFault {
            phase: FaultPhase::Undo,
            description: "Append".into(),
            reason: "buffer too short".into(),
        });
        assert!(err.is_fatal());
        assert!(!err.is_boundary());
        assert_eq!(
            err.to_string(),
            "corrupted history: undo of 'Append' failed: buffer too short"
        );
    }
}
