#![forbid(unsafe_code)]

//! A mutex-guarded engine for concurrent callers.
//!
//! Interleaving a `record` with another caller's `undo` would break the
//! cursor invariant, so the whole engine is a single critical section: every
//! call takes the one lock and holds it until the effect has finished.
//! Operations should therefore be short; an operation doing I/O must bound
//! it with its own timeout.
//!
//! A panic inside an operation poisons the lock. The next caller recovers
//! the guard, the engine is halted with a [`FaultPhase::Lock`] fault, and
//! the usual `CorruptedHistory` error is returned until `clear()`.
//!
//! [`FaultPhase::Lock`]: crate::FaultPhase::Lock

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::engine::{Engine, EngineStats};
use crate::error::EngineResult;
use crate::operation::{BoxedOperation, Operation};

/// An [`Engine`] shareable across threads.
///
/// `Sync` whenever the receiver is `Send`; use it from scoped threads when
/// the receiver lives on the caller's stack.
pub struct SharedEngine<'r, R: ?Sized> {
    inner: Mutex<Engine<'r, R>>,
}

impl<R: ?Sized> fmt::Debug for SharedEngine<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedEngine")
            .field("inner", &self.inner)
            .finish()
    }
}

impl<'r, R: ?Sized + 'static> SharedEngine<'r, R> {
    #[must_use]
    pub fn new(engine: Engine<'r, R>) -> Self {
        Self {
            inner: Mutex::new(engine),
        }
    }

    /// See [`Engine::run`].
    pub fn run(&self, op: impl Operation<R> + 'static) -> EngineResult {
        self.lock().run(op)
    }

    /// See [`Engine::run_boxed`].
    pub fn run_boxed(&self, op: BoxedOperation<R>) -> EngineResult {
        self.lock().run_boxed(op)
    }

    /// See [`Engine::undo`].
    pub fn undo(&self) -> EngineResult {
        self.lock().undo()
    }

    /// See [`Engine::redo`].
    pub fn redo(&self) -> EngineResult {
        self.lock().redo()
    }

    /// See [`Engine::clear`].
    pub fn clear(&self) {
        self.lock().clear();
    }

    #[must_use]
    pub fn history_depth(&self) -> usize {
        self.lock().history_depth()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.lock().redo_depth()
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.lock().is_halted()
    }

    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.lock().stats()
    }

    /// Inspect the receiver under the lock.
    pub fn with_receiver<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        f(self.lock().receiver())
    }

    /// Inspect the engine under the lock.
    pub fn with_engine<T>(&self, f: impl FnOnce(&Engine<'r, R>) -> T) -> T {
        f(&self.lock())
    }

    /// Unwrap the engine.
    #[must_use]
    pub fn into_inner(self) -> Engine<'r, R> {
        self.inner.into_inner().unwrap_or_else(|poisoned| {
            let mut engine = poisoned.into_inner();
            engine.halt_on_poison();
            engine
        })
    }

    fn lock(&self) -> MutexGuard<'_, Engine<'r, R>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            self.inner.clear_poison();
            let mut engine = poisoned.into_inner();
            engine.halt_on_poison();
            engine
        })
    }
}
