#![forbid(unsafe_code)]

//! Reversible operation engine.
//!
//! Accepts discrete operations against a caller-owned receiver, records
//! them, and undoes/redoes them in a well-defined order. After any
//! undo/redo sequence the receiver is identical to replaying the undoable
//! operations, in order, from the state at the last `clear()`.
//!
//! # Key Components
//!
//! - [`Operation`] - Apply/reverse contract for one unit of mutation
//! - [`MacroOperation`] - Atomic sequence of operations, one history entry
//! - [`Ledger`] - Cursor-addressed history, receiver-agnostic
//! - [`Engine`] - Invoker: applies, records, undoes, redoes
//! - [`SharedEngine`] - The engine behind one lock for concurrent callers
//! - [`EngineConfig`] - Capacity bounds and slow-operation threshold
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                            Engine                             │
//! │                                                               │
//! │   run(op) ──► op.apply(receiver) ──ok──► ledger.record(op)    │
//! │                                                               │
//! │   ┌───────────────────────── Ledger ────────────────────────┐ │
//! │   │  [op1, op2, op3, op4, op5]                              │ │
//! │   │               ^ cursor                                  │ │
//! │   │   undoable ◄──┘└──► redoable                            │ │
//! │   └─────────────────────────────────────────────────────────┘ │
//! │                                                               │
//! │   undo() ──► ledger.undo() ──► op.reverse(receiver)           │
//! │   redo() ──► ledger.redo() ──► op.apply(receiver)             │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use revop::{Engine, EngineError, Operation, OperationResult};
//!
//! struct Append(String);
//!
//! impl Operation<String> for Append {
//!     fn apply(&mut self, buf: &mut String) -> OperationResult {
//!         buf.push_str(&self.0);
//!         Ok(())
//!     }
//!
//!     fn reverse(&mut self, buf: &mut String) -> OperationResult {
//!         buf.truncate(buf.len() - self.0.len());
//!         Ok(())
//!     }
//! }
//!
//! let mut buffer = String::new();
//! let mut engine = Engine::new(&mut buffer);
//!
//! engine.run(Append("Hello".into())).unwrap();
//! engine.run(Append(", world".into())).unwrap();
//! engine.undo().unwrap();
//! assert_eq!(engine.receiver(), "Hello");
//!
//! engine.run(Append("!".into())).unwrap();
//! assert_eq!(engine.redo(), Err(EngineError::NothingToRedo));
//! assert_eq!(engine.receiver(), "Hello!");
//! ```
//!
//! # Capacity
//!
//! History is bounded: by default 100 entries and 10 MB of reported
//! operation size, oldest evicted first. See [`HistoryConfig`].

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod macro_op;
pub mod operation;
pub mod shared;

pub use config::{DEFAULT_SLOW_OPERATION_MS, EngineConfig};
#[cfg(feature = "config-files")]
pub use config::ConfigError;
pub use engine::{Engine, EngineStats};
pub use error::{
    EngineError, EngineResult, FaultPhase, HistoryFault, LedgerError, OperationError,
    OperationResult,
};
pub use ledger::{Footprint, HistoryConfig, Ledger};
pub use macro_op::MacroOperation;
pub use operation::{BoxedOperation, FnOperation, Operation};
pub use shared::SharedEngine;
