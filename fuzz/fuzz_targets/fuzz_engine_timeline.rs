#![no_main]

//! Random run/undo/redo/clear sequences against a byte stack.
//!
//! The engine is checked against a model that keeps every state reachable
//! by undo. Any divergence, unexpected fault, or depth overrun panics.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use revop::{
    Engine, EngineConfig, EngineError, HistoryConfig, MacroOperation, Operation, OperationError,
    OperationResult,
};

#[derive(Debug, Clone, Copy, Arbitrary)]
enum Step {
    Push(u8),
    Pop,
}

#[derive(Debug, Arbitrary)]
enum Action {
    Run(Step),
    Macro(Vec<Step>),
    Undo,
    Redo,
    Clear,
}

#[derive(Debug, Arbitrary)]
struct Input {
    max_depth: u8,
    actions: Vec<Action>,
}

struct StackOp {
    step: Step,
    popped: Option<u8>,
}

impl Operation<Vec<u8>> for StackOp {
    fn apply(&mut self, stack: &mut Vec<u8>) -> OperationResult {
        match self.step {
            Step::Push(v) => stack.push(v),
            Step::Pop => {
                self.popped = Some(
                    stack
                        .pop()
                        .ok_or_else(|| OperationError::rejected("empty"))?,
                );
            }
        }
        Ok(())
    }

    fn reverse(&mut self, stack: &mut Vec<u8>) -> OperationResult {
        match self.step {
            Step::Push(v) => match stack.pop() {
                Some(top) if top == v => Ok(()),
                _ => Err(OperationError::rejected("top mismatch")),
            },
            Step::Pop => {
                let v = self
                    .popped
                    .take()
                    .ok_or_else(|| OperationError::rejected("never popped"))?;
                stack.push(v);
                Ok(())
            }
        }
    }
}

fn op(step: Step) -> StackOp {
    StackOp { step, popped: None }
}

fn model_step(state: &[u8], step: Step) -> Option<Vec<u8>> {
    let mut next = state.to_vec();
    match step {
        Step::Push(v) => next.push(v),
        Step::Pop => {
            next.pop()?;
        }
    }
    Some(next)
}

fuzz_target!(|input: Input| {
    let max_depth = usize::from(input.max_depth % 16) + 1;
    let config = EngineConfig::default()
        .with_history(HistoryConfig::new(max_depth, 0))
        .with_slow_operation_ms(0);

    let mut stack = Vec::new();
    let mut engine = Engine::with_config(&mut stack, config);
    // states[..=cursor] reachable by undo, states[cursor + 1..] by redo.
    let mut states: Vec<Vec<u8>> = vec![Vec::new()];
    let mut cursor = 0_usize;

    for action in input.actions.into_iter().take(256) {
        match action {
            Action::Run(step) => match model_step(&states[cursor], step) {
                Some(next) => {
                    engine.run(op(step)).expect("model says run succeeds");
                    states.truncate(cursor + 1);
                    states.push(next);
                    cursor += 1;
                }
                None => {
                    assert!(matches!(
                        engine.run(op(step)),
                        Err(EngineError::OperationFailed { .. })
                    ));
                }
            },
            Action::Macro(steps) => {
                let mut state = Some(states[cursor].clone());
                let mut batch = MacroOperation::new("batch");
                for step in steps.into_iter().take(8) {
                    state = state.and_then(|s| model_step(&s, step));
                    batch.push(op(step));
                }
                let result = engine.run(batch);
                match state {
                    Some(next) => {
                        result.expect("model says macro succeeds");
                        states.truncate(cursor + 1);
                        states.push(next);
                        cursor += 1;
                    }
                    None => assert!(result.is_err() && !engine.is_halted()),
                }
            }
            Action::Undo => {
                if cursor == 0 {
                    assert_eq!(engine.undo(), Err(EngineError::EmptyHistory));
                } else {
                    engine.undo().expect("undo within history");
                    cursor -= 1;
                }
            }
            Action::Redo => {
                if cursor + 1 == states.len() {
                    assert_eq!(engine.redo(), Err(EngineError::NothingToRedo));
                } else {
                    engine.redo().expect("redo within history");
                    cursor += 1;
                }
            }
            Action::Clear => {
                engine.clear();
                states = vec![states[cursor].clone()];
                cursor = 0;
            }
        }

        // Evict like the ledger: keep at most max_depth undoable steps.
        while states.len() > max_depth + 1 {
            states.remove(0);
            cursor -= 1;
        }

        assert_eq!(engine.receiver(), &states[cursor], "receiver diverged");
        assert_eq!(engine.history_depth(), cursor);
        assert_eq!(engine.redo_depth(), states.len() - 1 - cursor);
        assert!(!engine.is_halted());
    }
});
