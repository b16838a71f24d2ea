#![forbid(unsafe_code)]

//! The invoker: applies operations to a receiver and replays the ledger.
//!
//! [`Engine`] borrows the receiver mutably for its whole lifetime, so the
//! only way to mutate it while managed is through `run`/`undo`/`redo`.
//!
//! # State Machine
//!
//! ```text
//!            run(op) ok: record, drop redo tail
//!          ┌──────────────────────────────────┐
//!          │                                  ▼
//!   ┌─────────────┐   undo() / redo()   ┌─────────────┐
//!   │    Live     │ ◄─────────────────► │    Live     │
//!   └─────────────┘                     └─────────────┘
//!          │ reverse/apply broke its contract
//!          ▼
//!   ┌─────────────┐      clear()       ┌─────────────┐
//!   │   Halted    │ ─────────────────► │ Live, empty │
//!   └─────────────┘                    └─────────────┘
//! ```
//!
//! # Invariants
//!
//! 1. The receiver's state equals the result of applying, in order, every
//!    entry before the ledger cursor to the state before the oldest retained
//!    entry (the state at the last `clear()` until anything is evicted).
//! 2. A successful `run` is always undoable: recording never evicts the
//!    operation just applied.
//! 3. A failed `run` leaves receiver and ledger untouched.
//! 4. A failed `undo`/`redo` leaves the cursor where it was.
//! 5. While halted, no call touches the receiver or the ledger.

use std::fmt;
use std::time::Duration;

use web_time::Instant;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult, FaultPhase, HistoryFault, OperationError};
use crate::ledger::{HistoryConfig, Ledger};
use crate::operation::{BoxedOperation, Operation};

/// Per-engine monotonic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Operations applied and recorded by `run`.
    pub runs: u64,
    /// Successful undos.
    pub undos: u64,
    /// Successful redos.
    pub redos: u64,
    /// `run` calls rejected by the operation (including macro failures).
    pub failures: u64,
    /// `undo`/`redo` calls that hit a history boundary.
    pub boundary_hits: u64,
    /// Entries evicted by history limits.
    pub evictions: u64,
    /// Contract violations that halted the engine.
    pub faults: u64,
}

/// Applies operations to a borrowed receiver and keeps their history.
pub struct Engine<'r, R: ?Sized> {
    receiver: &'r mut R,
    ledger: Ledger<BoxedOperation<R>>,
    config: EngineConfig,
    /// Set when an operation broke its inverse contract.
    fault: Option<HistoryFault>,
    stats: EngineStats,
}

impl<R: ?Sized> fmt::Debug for Engine<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("ledger", &self.ledger)
            .field("fault", &self.fault)
            .field("stats", &self.stats)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'r, R: ?Sized + 'static> Engine<'r, R> {
    /// Manage `receiver` with the default configuration.
    #[must_use]
    pub fn new(receiver: &'r mut R) -> Self {
        Self::with_config(receiver, EngineConfig::default())
    }

    /// Manage `receiver` with an explicit configuration.
    ///
    /// `config` should pass [`EngineConfig::validate`]. With
    /// `history.max_depth == 0` (debug builds assert against it) nothing is
    /// retained and every `run` is final.
    #[must_use]
    pub fn with_config(receiver: &'r mut R, config: EngineConfig) -> Self {
        debug_assert!(
            config.validate().is_empty(),
            "invalid engine config: {:?}",
            config.validate()
        );
        Self {
            receiver,
            ledger: Ledger::new(config.history),
            config,
            fault: None,
            stats: EngineStats::default(),
        }
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Apply `op` and, on success, record it.
    pub fn run(&mut self, op: impl Operation<R> + 'static) -> EngineResult {
        self.run_boxed(Box::new(op))
    }

    /// Apply an already-boxed operation and, on success, record it.
    ///
    /// Any redo tail is discarded once the operation is recorded. On
    /// failure nothing is recorded and the redo tail survives.
    pub fn run_boxed(&mut self, mut op: BoxedOperation<R>) -> EngineResult {
        self.check_halted()?;
        let _span = tracing::debug_span!("engine.run", description = %op.description()).entered();

        let started = Instant::now();
        let result = op.apply(&mut *self.receiver);
        let elapsed = started.elapsed();
        warn_if_slow(&self.config, FaultPhase::Run, op.description(), elapsed);

        if let Err(err) = result {
            return Err(self.run_failure(op.description().to_owned(), err));
        }

        self.stats.runs += 1;
        let dropped_redo = self.ledger.redo_depth();
        let evicted = self.ledger.record(op);
        self.stats.evictions += evicted as u64;

        tracing::debug!(
            target: "revop.engine",
            undo_depth = self.ledger.undo_depth(),
            dropped_redo,
            evicted,
            duration_us = elapsed.as_micros() as u64,
            "operation applied"
        );
        Ok(())
    }

    /// Reverse the most recent undoable operation.
    ///
    /// `EmptyHistory` at the start of history. A failing `reverse` halts the
    /// engine with `CorruptedHistory`.
    pub fn undo(&mut self) -> EngineResult {
        let _span = tracing::debug_span!("engine.undo").entered();
        self.replay(FaultPhase::Undo)
    }

    /// Re-apply the most recently undone operation.
    ///
    /// `NothingToRedo` at the end of history. A failing `apply` halts the
    /// engine with `CorruptedHistory`.
    pub fn redo(&mut self) -> EngineResult {
        let _span = tracing::debug_span!("engine.redo").entered();
        self.replay(FaultPhase::Redo)
    }

    /// Forget all history and lift a halt.
    ///
    /// Use at checkpoint boundaries, after the embedding application has
    /// captured the receiver's state by its own means.
    pub fn clear(&mut self) {
        let discarded = self.ledger.len();
        self.ledger.clear();
        if let Some(fault) = self.fault.take() {
            tracing::info!(
                target: "revop.engine",
                fault = %fault,
                "history cleared, engine resumed"
            );
        }
        tracing::debug!(target: "revop.engine", discarded, "history cleared");
    }

    /// Replace the history limits. Returns the number of entries evicted.
    ///
    /// Redoable entries are dropped before undoable ones, so whatever
    /// remains redoable still continues from the current state.
    pub fn set_history_config(&mut self, history: HistoryConfig) -> usize {
        debug_assert!(
            history.validate().is_empty(),
            "invalid history config: {:?}",
            history.validate()
        );
        self.config.history = history;
        let evicted = self.ledger.set_config(history);
        self.stats.evictions += evicted as u64;
        evicted
    }

    /// Release the receiver borrow, handing back the history.
    #[must_use]
    pub fn into_inner(self) -> Ledger<BoxedOperation<R>> {
        self.ledger
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// Read access to the managed receiver.
    #[must_use]
    pub fn receiver(&self) -> &R {
        &*self.receiver
    }

    /// Number of undoable operations.
    #[must_use]
    pub fn history_depth(&self) -> usize {
        self.ledger.undo_depth()
    }

    /// Number of redoable operations.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.ledger.redo_depth()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.fault.is_none() && self.ledger.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.fault.is_none() && self.ledger.can_redo()
    }

    /// Descriptions of undoable operations, most recent first.
    pub fn undo_descriptions(&self, limit: usize) -> Vec<&str> {
        self.ledger
            .iter_undoable()
            .take(limit)
            .map(|op| op.description())
            .collect()
    }

    /// Descriptions of redoable operations, next redo first.
    pub fn redo_descriptions(&self, limit: usize) -> Vec<&str> {
        self.ledger
            .iter_redoable()
            .take(limit)
            .map(|op| op.description())
            .collect()
    }

    #[must_use]
    pub fn next_undo_description(&self) -> Option<&str> {
        self.ledger.iter_undoable().next().map(|op| op.description())
    }

    #[must_use]
    pub fn next_redo_description(&self) -> Option<&str> {
        self.ledger.iter_redoable().next().map(|op| op.description())
    }

    /// Whether a contract violation has halted the engine.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.fault.is_some()
    }

    /// The fault that halted the engine, if any.
    #[must_use]
    pub fn fault(&self) -> Option<&HistoryFault> {
        self.fault.as_ref()
    }

    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn ledger(&self) -> &Ledger<BoxedOperation<R>> {
        &self.ledger
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn check_halted(&self) -> EngineResult {
        match &self.fault {
            Some(fault) => Err(EngineError::CorruptedHistory(fault.clone())),
            None => Ok(()),
        }
    }

    fn replay(&mut self, phase: FaultPhase) -> EngineResult {
        self.check_halted()?;
        let cursor = self.ledger.cursor();

        let selected = match phase {
            FaultPhase::Redo => self.ledger.redo(),
            _ => self.ledger.undo(),
        };
        let op = match selected {
            Ok(op) => op,
            Err(boundary) => {
                self.stats.boundary_hits += 1;
                tracing::debug!(
                    target: "revop.engine",
                    phase = %phase,
                    boundary = %boundary,
                    "history boundary reached"
                );
                return Err(boundary.into());
            }
        };

        let started = Instant::now();
        let result = match phase {
            FaultPhase::Redo => op.apply(&mut *self.receiver),
            _ => op.reverse(&mut *self.receiver),
        };
        let elapsed = started.elapsed();
        let description = op.description().to_owned();
        warn_if_slow(&self.config, phase, &description, elapsed);

        match result {
            Ok(()) => {
                match phase {
                    FaultPhase::Redo => self.stats.redos += 1,
                    _ => self.stats.undos += 1,
                }
                tracing::debug!(
                    target: "revop.engine",
                    phase = %phase,
                    description = %description,
                    undo_depth = self.ledger.undo_depth(),
                    redo_depth = self.ledger.redo_depth(),
                    duration_us = elapsed.as_micros() as u64,
                    "history replayed"
                );
                Ok(())
            }
            Err(err) => {
                self.ledger.reset_cursor(cursor);
                Err(self.halt(phase, description, err.to_string()))
            }
        }
    }

    /// Classify a failed `run`. Broken macro rollbacks halt the engine.
    fn run_failure(&mut self, description: String, err: OperationError) -> EngineError {
        if err.is_rollback_failure() {
            return self.halt(FaultPhase::Run, description, err.to_string());
        }

        self.stats.failures += 1;
        match err {
            OperationError::MacroPartialFailure {
                failed_at,
                applied,
                cause,
            } => {
                tracing::warn!(
                    target: "revop.engine",
                    description = %description,
                    failed_at,
                    applied,
                    error = %cause,
                    "macro failed, applied members rolled back"
                );
                EngineError::MacroPartialFailure {
                    description,
                    failed_at,
                    applied,
                    reason: cause.to_string(),
                }
            }
            other => {
                tracing::warn!(
                    target: "revop.engine",
                    description = %description,
                    error = %other,
                    "operation rejected"
                );
                EngineError::OperationFailed {
                    description,
                    reason: other.to_string(),
                }
            }
        }
    }

    fn halt(&mut self, phase: FaultPhase, description: String, reason: String) -> EngineError {
        let fault = HistoryFault {
            phase,
            description,
            reason,
        };
        tracing::error!(
            target: "revop.engine",
            phase = %fault.phase,
            description = %fault.description,
            error = %fault.reason,
            "operation broke its inverse contract, engine halted until clear()"
        );
        self.stats.faults += 1;
        self.fault = Some(fault.clone());
        EngineError::CorruptedHistory(fault)
    }

    /// Halt after a panic poisoned the shared engine's lock.
    pub(crate) fn halt_on_poison(&mut self) {
        if self.fault.is_some() {
            return;
        }
        let description = self
            .next_undo_description()
            .unwrap_or("<unknown>")
            .to_owned();
        self.halt(
            FaultPhase::Lock,
            description,
            "an operation panicked while the engine lock was held".to_string(),
        );
    }
}

fn warn_if_slow(config: &EngineConfig, phase: FaultPhase, description: &str, elapsed: Duration) {
    if config.slow_operation_ms == 0 {
        return;
    }
    if elapsed.as_millis() > u128::from(config.slow_operation_ms) {
        tracing::warn!(
            target: "revop.engine",
            phase = %phase,
            description = %description,
            duration_us = elapsed.as_micros() as u64,
            threshold_ms = config.slow_operation_ms,
            "operation exceeded slow threshold"
        );
    }
}

// ============================================================================
// Tests
// ============================================================================
