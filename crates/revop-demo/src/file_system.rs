#![forbid(unsafe_code)]

//! In-memory file store and its reversible create/rename/delete operations.
//!
//! Every operation validates against the store before touching it, so a
//! rejected operation leaves the store exactly as it was.

use std::collections::BTreeMap;

use revop::{Operation, OperationError, OperationResult};

/// Failure of a primitive file-store call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileSystemError {
    #[error("no such file: {0}")]
    NotFound(String),
    #[error("file already exists: {0}")]
    AlreadyExists(String),
}

impl From<FileSystemError> for OperationError {
    fn from(err: FileSystemError) -> Self {
        OperationError::rejected(err.to_string())
    }
}

/// Flat namespace of named files with text contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSystem {
    files: BTreeMap<String, String>,
}

impl FileSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_file(&mut self, name: &str, contents: &str) -> Result<(), FileSystemError> {
        if self.files.contains_key(name) {
            return Err(FileSystemError::AlreadyExists(name.to_owned()));
        }
        self.files.insert(name.to_owned(), contents.to_owned());
        tracing::debug!(target: "revop_demo.fs", name, "file created");
        Ok(())
    }

    pub fn rename_file(&mut self, from: &str, to: &str) -> Result<(), FileSystemError> {
        if self.files.contains_key(to) {
            return Err(FileSystemError::AlreadyExists(to.to_owned()));
        }
        let contents = self
            .files
            .remove(from)
            .ok_or_else(|| FileSystemError::NotFound(from.to_owned()))?;
        self.files.insert(to.to_owned(), contents);
        tracing::debug!(target: "revop_demo.fs", from, to, "file renamed");
        Ok(())
    }

    /// Remove a file, returning its contents.
    pub fn delete_file(&mut self, name: &str) -> Result<String, FileSystemError> {
        let contents = self
            .files
            .remove(name)
            .ok_or_else(|| FileSystemError::NotFound(name.to_owned()))?;
        tracing::debug!(target: "revop_demo.fs", name, "file deleted");
        Ok(contents)
    }

    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    #[must_use]
    pub fn contents(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    /// File names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Create a file; reversed by deleting it.
#[derive(Debug, Clone)]
pub struct CreateFile {
    name: String,
    contents: String,
    description: String,
}

impl CreateFile {
    #[must_use]
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: format!("create {name}"),
            name,
            contents: contents.into(),
        }
    }

    #[must_use]
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, String::new())
    }
}

impl Operation<FileSystem> for CreateFile {
    fn apply(&mut self, fs: &mut FileSystem) -> OperationResult {
        fs.create_file(&self.name, &self.contents)?;
        Ok(())
    }

    fn reverse(&mut self, fs: &mut FileSystem) -> OperationResult {
        fs.delete_file(&self.name)?;
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.name.len() + self.contents.len() + self.description.len()
    }
}

/// Rename a file; reversed by renaming it back.
#[derive(Debug, Clone)]
pub struct RenameFile {
    from: String,
    to: String,
    description: String,
}

impl RenameFile {
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        let (from, to) = (from.into(), to.into());
        Self {
            description: format!("rename {from} -> {to}"),
            from,
            to,
        }
    }
}

impl Operation<FileSystem> for RenameFile {
    fn apply(&mut self, fs: &mut FileSystem) -> OperationResult {
        fs.rename_file(&self.from, &self.to)?;
        Ok(())
    }

    fn reverse(&mut self, fs: &mut FileSystem) -> OperationResult {
        fs.rename_file(&self.to, &self.from)?;
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Delete a file; reversed by recreating it with the contents it had.
#[derive(Debug, Clone)]
pub struct DeleteFile {
    name: String,
    /// Contents captured by the last `apply`.
    removed: Option<String>,
    description: String,
}

impl DeleteFile {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            description: format!("delete {name}"),
            name,
            removed: None,
        }
    }
}

impl Operation<FileSystem> for DeleteFile {
    fn apply(&mut self, fs: &mut FileSystem) -> OperationResult {
        self.removed = Some(fs.delete_file(&self.name)?);
        Ok(())
    }

    fn reverse(&mut self, fs: &mut FileSystem) -> OperationResult {
        let contents = self
            .removed
            .take()
            .ok_or_else(|| OperationError::rejected(format!("{} was never applied", self.description)))?;
        if let Err(err) = fs.create_file(&self.name, &contents) {
            self.removed = Some(contents);
            return Err(err.into());
        }
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.name.len()
            + self.description.len()
            + self.removed.as_ref().map_or(0, String::len)
    }
}
