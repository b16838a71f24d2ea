#![allow(dead_code)]

//! Operations shared by the integration tests.

use revop::{Operation, OperationError, OperationResult};

// ============================================================================
// Text buffer operations (receiver = String)
// ============================================================================

/// Append text to the end of the buffer.
#[derive(Debug, Clone)]
pub struct Append(pub String);

impl Append {
    pub fn new(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl Operation<String> for Append {
    fn apply(&mut self, buf: &mut String) -> OperationResult {
        buf.push_str(&self.0);
        Ok(())
    }

    fn reverse(&mut self, buf: &mut String) -> OperationResult {
        if !buf.ends_with(self.0.as_str()) {
            return Err(OperationError::rejected(format!(
                "buffer does not end with {:?}",
                self.0
            )));
        }
        buf.truncate(buf.len() - self.0.len());
        Ok(())
    }

    fn description(&self) -> &str {
        "Append"
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.0.len()
    }
}

/// Cut the buffer down to `len` bytes, remembering what was removed.
#[derive(Debug)]
pub struct Truncate {
    pub len: usize,
    removed: Option<String>,
}

impl Truncate {
    pub fn new(len: usize) -> Self {
        Self { len, removed: None }
    }
}

impl Operation<String> for Truncate {
    fn apply(&mut self, buf: &mut String) -> OperationResult {
        if self.len > buf.len() || !buf.is_char_boundary(self.len) {
            return Err(OperationError::rejected(format!(
                "cannot truncate {} bytes to {}",
                buf.len(),
                self.len
            )));
        }
        self.removed = Some(buf.split_off(self.len));
        Ok(())
    }

    fn reverse(&mut self, buf: &mut String) -> OperationResult {
        let removed = self
            .removed
            .take()
            .ok_or_else(|| OperationError::rejected("truncate was never applied"))?;
        buf.push_str(&removed);
        Ok(())
    }

    fn description(&self) -> &str {
        "Truncate"
    }
}

// ============================================================================
// Stack operations (receiver = Vec<i64>)
// ============================================================================

/// Declarative form of a stack operation, for property tests.
#[derive(Debug, Clone)]
pub enum StackSpec {
    Push(i64),
    Pop,
    Set(usize, i64),
}

impl StackSpec {
    /// The state after applying this step, or `None` if it would be rejected.
    pub fn model(&self, state: &[i64]) -> Option<Vec<i64>> {
        let mut next = state.to_vec();
        match *self {
            Self::Push(v) => next.push(v),
            Self::Pop => {
                next.pop()?;
            }
            Self::Set(index, v) => *next.get_mut(index)? = v,
        }
        Some(next)
    }

    pub fn build(&self) -> Box<dyn Operation<Vec<i64>>> {
        match *self {
            Self::Push(v) => Box::new(Push(v)),
            Self::Pop => Box::new(Pop { taken: None }),
            Self::Set(index, value) => Box::new(Set {
                index,
                value,
                previous: None,
            }),
        }
    }
}

/// Model the effect of an atomic sequence: all or nothing.
pub fn model_all(specs: &[StackSpec], state: &[i64]) -> Option<Vec<i64>> {
    let mut current = state.to_vec();
    for spec in specs {
        current = spec.model(&current)?;
    }
    Some(current)
}

pub struct Push(pub i64);

impl Operation<Vec<i64>> for Push {
    fn apply(&mut self, stack: &mut Vec<i64>) -> OperationResult {
        stack.push(self.0);
        Ok(())
    }

    fn reverse(&mut self, stack: &mut Vec<i64>) -> OperationResult {
        match stack.pop() {
            Some(v) if v == self.0 => Ok(()),
            _ => Err(OperationError::rejected("top of stack mismatch")),
        }
    }

    fn description(&self) -> &str {
        "Push"
    }
}

pub struct Pop {
    taken: Option<i64>,
}

impl Operation<Vec<i64>> for Pop {
    fn apply(&mut self, stack: &mut Vec<i64>) -> OperationResult {
        let v = stack
            .pop()
            .ok_or_else(|| OperationError::rejected("pop from empty stack"))?;
        self.taken = Some(v);
        Ok(())
    }

    fn reverse(&mut self, stack: &mut Vec<i64>) -> OperationResult {
        let v = self
            .taken
            .ok_or_else(|| OperationError::rejected("pop was never applied"))?;
        stack.push(v);
        Ok(())
    }

    fn description(&self) -> &str {
        "Pop"
    }
}

pub struct Set {
    index: usize,
    value: i64,
    previous: Option<i64>,
}

impl Operation<Vec<i64>> for Set {
    fn apply(&mut self, stack: &mut Vec<i64>) -> OperationResult {
        let slot = stack
            .get_mut(self.index)
            .ok_or_else(|| OperationError::rejected(format!("index {} out of range", self.index)))?;
        self.previous = Some(std::mem::replace(slot, self.value));
        Ok(())
    }

    fn reverse(&mut self, stack: &mut Vec<i64>) -> OperationResult {
        let previous = self
            .previous
            .ok_or_else(|| OperationError::rejected("set was never applied"))?;
        let slot = stack
            .get_mut(self.index)
            .ok_or_else(|| OperationError::rejected(format!("index {} out of range", self.index)))?;
        *slot = previous;
        Ok(())
    }

    fn description(&self) -> &str {
        "Set"
    }
}
