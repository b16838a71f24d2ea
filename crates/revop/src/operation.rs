#![forbid(unsafe_code)]

//! The reversible operation contract.
//!
//! An [`Operation`] owns the parameters it needs to perform its forward
//! effect and the exact inverse of it. It never holds the receiver; the
//! engine lends it for the duration of each call.
//!
//! # Invariants
//!
//! - `apply` followed by `reverse` restores the receiver exactly
//! - `reverse` followed by `apply` reproduces the forward effect exactly
//! - effects are confined to the receiver passed in
//! - a failing `apply` leaves the receiver untouched
//!
//! # Failure Modes
//!
//! - **Rejected apply**: expected, recoverable. Return
//!   [`OperationError::Rejected`] before mutating anything.
//! - **Failed reverse**: a contract violation. The engine halts with
//!   `CorruptedHistory`.

use std::fmt;
use std::marker::PhantomData;

use crate::error::OperationResult;
use crate::ledger::Footprint;

/// A reversible unit of mutation against a receiver of type `R`.
///
/// `&mut self` lets an operation capture what its inverse needs while
/// applying (the text a truncation dropped, the contents of a deleted
/// file). It must not derive anything else from the receiver that would
/// make a second `apply` differ from the first.
pub trait Operation<R: ?Sized>: Send {
    /// Perform the forward mutation.
    fn apply(&mut self, receiver: &mut R) -> OperationResult;

    /// Perform the exact inverse of [`apply`](Self::apply).
    ///
    /// Called only on a receiver left in the post-apply state.
    fn reverse(&mut self, receiver: &mut R) -> OperationResult;

    /// Human-readable label for history displays.
    fn description(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Approximate heap + inline footprint, for the ledger's byte budget.
    fn size_bytes(&self) -> usize {
        std::mem::size_of_val(self)
    }
}

/// A type-erased operation, as stored in the ledger.
pub type BoxedOperation<R> = Box<dyn Operation<R>>;

impl<R: ?Sized> fmt::Debug for dyn Operation<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("description", &self.description())
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}

impl<R: ?Sized, O: Operation<R> + ?Sized> Operation<R> for Box<O> {
    fn apply(&mut self, receiver: &mut R) -> OperationResult {
        (**self).apply(receiver)
    }

    fn reverse(&mut self, receiver: &mut R) -> OperationResult {
        (**self).reverse(receiver)
    }

    fn description(&self) -> &str {
        (**self).description()
    }

    fn size_bytes(&self) -> usize {
        (**self).size_bytes()
    }
}

impl<R: ?Sized> Footprint for BoxedOperation<R> {
    fn size_bytes(&self) -> usize {
        (**self).size_bytes()
    }
}

/// An operation assembled from two closures.
///
/// ```
/// use revop::{Engine, FnOperation};
///
/// let mut counter = 0_i64;
/// let mut engine = Engine::new(&mut counter);
/// engine
///     .run(FnOperation::new(
///         "add 5",
///         |n: &mut i64| {
///             *n += 5;
///             Ok(())
///         },
///         |n: &mut i64| {
///             *n -= 5;
///             Ok(())
///         },
///     ))
///     .unwrap();
/// assert_eq!(*engine.receiver(), 5);
/// engine.undo().unwrap();
/// assert_eq!(*engine.receiver(), 0);
/// ```
pub struct FnOperation<R: ?Sized, A, U> {
    description: String,
    forward: A,
    inverse: U,
    _receiver: PhantomData<fn(&mut R)>,
}

impl<R: ?Sized, A, U> fmt::Debug for FnOperation<R, A, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOperation")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<R, A, U> FnOperation<R, A, U>
where
    R: ?Sized,
    A: FnMut(&mut R) -> OperationResult + Send,
    U: FnMut(&mut R) -> OperationResult + Send,
{
    /// Bind a forward and an inverse closure under one description.
    #[must_use]
    pub fn new(description: impl Into<String>, forward: A, inverse: U) -> Self {
        Self {
            description: description.into(),
            forward,
            inverse,
            _receiver: PhantomData,
        }
    }
}

impl<R, A, U> Operation<R> for FnOperation<R, A, U>
where
    R: ?Sized,
    A: FnMut(&mut R) -> OperationResult + Send,
    U: FnMut(&mut R) -> OperationResult + Send,
{
    fn apply(&mut self, receiver: &mut R) -> OperationResult {
        (self.forward)(receiver)
    }

    fn reverse(&mut self, receiver: &mut R) -> OperationResult {
        (self.inverse)(receiver)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.description.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OperationError;

    struct Push(i32);

    impl Operation<Vec<i32>> for Push {
        fn apply(&mut self, stack: &mut Vec<i32>) -> OperationResult {
            stack.push(self.0);
            Ok(())
        }

        fn reverse(&mut self, stack: &mut Vec<i32>) -> OperationResult {
            match stack.pop() {
                Some(v) if v == self.0 => Ok(()),
                _ => Err(OperationError::rejected("top of stack mismatch")),
            }
        }
    }

    #[test]
    fn default_description_is_type_name() {
        let op = Push(1);
        assert!(op.description().ends_with("Push"));
    }

    #[test]
    fn default_size_is_inline_size() {
        let op = Push(1);
        assert_eq!(<Push as Operation<Vec<i32>>>::size_bytes(&op), 4);
    }

    #[test]
    fn boxed_forwards_every_method() {
        let mut op: BoxedOperation<Vec<i32>> = Box::new(Push(7));
        let mut stack = Vec::new();
        op.apply(&mut stack).unwrap();
        assert_eq!(stack, vec![7]);
        op.reverse(&mut stack).unwrap();
        assert!(stack.is_empty());
        assert!(op.description().ends_with("Push"));
        assert_eq!(Footprint::size_bytes(&op), 4);
    }

    #[test]
    fn fn_operation_runs_both_closures() {
        let mut op = FnOperation::new(
            "double",
            |v: &mut i32| {
                *v *= 2;
                Ok(())
            },
            |v: &mut i32| {
                *v /= 2;
                Ok(())
            },
        );
        let mut value = 21;
        op.apply(&mut value).unwrap();
        assert_eq!(value, 42);
        op.reverse(&mut value).unwrap();
        assert_eq!(value, 21);
        assert_eq!(op.description(), "double");
    }

    #[test]
    fn fn_operation_size_includes_description() {
        let op = FnOperation::new("abc", |_: &mut i32| Ok(()), |_: &mut i32| Ok(()));
        assert!(Operation::<i32>::size_bytes(&op) >= std::mem::size_of_val(&op) + 3);
    }

    #[test]
    fn debug_for_dyn_operation() {
        let op: BoxedOperation<Vec<i32>> = Box::new(Push(1));
        let rendered = format!("{:?}", &*op);
        assert!(rendered.contains("Operation"));
        assert!(rendered.contains("size_bytes"));
    }
}
