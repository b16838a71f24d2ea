#![forbid(unsafe_code)]

//! Composite operations that apply and reverse as one ledger entry.

use std::fmt;

use crate::error::{OperationError, OperationResult};
use crate::operation::{BoxedOperation, Operation};

/// An ordered group of operations exposed as a single operation.
///
/// `apply` runs members front-to-back and is atomic: when a member fails,
/// every member that already applied is reversed back-to-front before the
/// failure is returned. `reverse` runs the inverses back-to-front.
pub struct MacroOperation<R: ?Sized> {
    description: String,
    /// Members in application order.
    members: Vec<BoxedOperation<R>>,
}

impl<R: ?Sized> fmt::Debug for MacroOperation<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroOperation")
            .field("description", &self.description)
            .field("members", &self.members)
            .finish()
    }
}

impl<R: ?Sized + 'static> MacroOperation<R> {
    /// Create an empty macro.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            members: Vec::new(),
        }
    }

    /// Append a member.
    pub fn push(&mut self, op: impl Operation<R> + 'static) {
        self.members.push(Box::new(op));
    }

    /// Append an already-boxed member.
    pub fn push_boxed(&mut self, op: BoxedOperation<R>) {
        self.members.push(op);
    }

    /// Builder form of [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, op: impl Operation<R> + 'static) -> Self {
        self.push(op);
        self
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the macro has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Reverse members `..applied` back-to-front after a failed apply.
    fn roll_back(&mut self, receiver: &mut R, applied: usize) -> OperationResult {
        for index in (0..applied).rev() {
            if let Err(cause) = self.members[index].reverse(receiver) {
                tracing::error!(
                    target: "revop.engine",
                    macro_description = %self.description,
                    member = index,
                    error = %cause,
                    "macro rollback failed"
                );
                return Err(OperationError::RollbackFailed {
                    index,
                    cause: Box::new(cause),
                });
            }
        }
        Ok(())
    }
}

impl<R: ?Sized + 'static> Operation<R> for MacroOperation<R> {
    fn apply(&mut self, receiver: &mut R) -> OperationResult {
        for index in 0..self.members.len() {
            let Err(cause) = self.members[index].apply(receiver) else {
                continue;
            };
            if index == 0 {
                // Nothing applied yet; the member's own error says it all.
                return Err(cause);
            }
            self.roll_back(receiver, index)?;
            return Err(OperationError::MacroPartialFailure {
                failed_at: index,
                applied: index,
                cause: Box::new(cause),
            });
        }
        Ok(())
    }

    fn reverse(&mut self, receiver: &mut R) -> OperationResult {
        for member in self.members.iter_mut().rev() {
            member.reverse(receiver)?;
        }
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.description.len()
            + self.members.iter().map(|m| m.size_bytes()).sum::<usize>()
    }
}
