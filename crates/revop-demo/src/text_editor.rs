#![forbid(unsafe_code)]

//! Text editor receiver with typed-text operations and memento checkpoints.
//!
//! A memento is a full snapshot of the editor contents. Restoring one runs
//! as an operation, so a restore can itself be undone. [`checkpoint`]
//! captures a memento and clears the engine's history at that boundary.

use revop::{Engine, Operation, OperationError, OperationResult};

/// Editor holding a single text buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextEditor {
    content: String,
}

impl TextEditor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn type_text(&mut self, text: &str) {
        self.content.push_str(text);
    }

    /// Snapshot the current contents.
    #[must_use]
    pub fn save(&self) -> EditorMemento {
        EditorMemento {
            content: self.content.clone(),
        }
    }

    /// Replace the contents with a snapshot.
    pub fn restore(&mut self, memento: &EditorMemento) {
        self.content.clone_from(&memento.content);
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Immutable snapshot of a [`TextEditor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorMemento {
    content: String,
}

impl EditorMemento {
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Append text at the end of the editor.
#[derive(Debug, Clone)]
pub struct TypeText {
    text: String,
}

impl TypeText {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Operation<TextEditor> for TypeText {
    fn apply(&mut self, editor: &mut TextEditor) -> OperationResult {
        editor.type_text(&self.text);
        Ok(())
    }

    fn reverse(&mut self, editor: &mut TextEditor) -> OperationResult {
        let Some(kept) = editor.content.len().checked_sub(self.text.len()) else {
            return Err(OperationError::rejected("editor shorter than typed text"));
        };
        if !editor.content.ends_with(self.text.as_str()) {
            return Err(OperationError::rejected(format!(
                "editor does not end with {:?}",
                self.text
            )));
        }
        editor.content.truncate(kept);
        Ok(())
    }

    fn description(&self) -> &str {
        "type"
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.text.len()
    }
}

/// Restore a memento; reversed by restoring the contents it replaced.
#[derive(Debug, Clone)]
pub struct RestoreMemento {
    target: EditorMemento,
    replaced: Option<EditorMemento>,
}

impl RestoreMemento {
    #[must_use]
    pub fn new(target: EditorMemento) -> Self {
        Self {
            target,
            replaced: None,
        }
    }
}

impl Operation<TextEditor> for RestoreMemento {
    fn apply(&mut self, editor: &mut TextEditor) -> OperationResult {
        self.replaced = Some(editor.save());
        editor.restore(&self.target);
        Ok(())
    }

    fn reverse(&mut self, editor: &mut TextEditor) -> OperationResult {
        let replaced = self
            .replaced
            .take()
            .ok_or_else(|| OperationError::rejected("restore was never applied"))?;
        editor.restore(&replaced);
        Ok(())
    }

    fn description(&self) -> &str {
        "restore"
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.target.content.len()
            + self.replaced.as_ref().map_or(0, |m| m.content.len())
    }
}

/// Snapshot the editor and start a fresh history from that state.
pub fn checkpoint(engine: &mut Engine<'_, TextEditor>) -> EditorMemento {
    let memento = engine.receiver().save();
    engine.clear();
    tracing::debug!(
        target: "revop_demo.editor",
        bytes = memento.content.len(),
        "checkpoint taken"
    );
    memento
}
