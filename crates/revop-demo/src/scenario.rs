#![forbid(unsafe_code)]

//! Scripted walkthroughs of the engine against the demo receivers.
//!
//! Each scenario returns a transcript line per engine call. History
//! boundaries and rejected operations are part of the script and are
//! reported in the transcript; anything fatal aborts the scenario.

use revop::{Engine, EngineConfig, EngineError, EngineResult, EngineStats, MacroOperation};

use crate::error::{DemoError, Result};
use crate::file_system::{CreateFile, DeleteFile, FileSystem, RenameFile};
use crate::text_editor::{RestoreMemento, TextEditor, TypeText, checkpoint};

/// What a scenario left behind.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome<R> {
    pub receiver: R,
    pub stats: EngineStats,
    pub transcript: Vec<String>,
}

struct Transcript {
    scenario: &'static str,
    lines: Vec<String>,
}

impl Transcript {
    fn new(scenario: &'static str) -> Self {
        Self {
            scenario,
            lines: Vec::new(),
        }
    }

    /// Note the outcome of one call. Fatal errors end the scenario.
    fn step(&mut self, call: &str, result: EngineResult, state: String) -> Result<()> {
        match result {
            Ok(()) => self.lines.push(format!("[{}] {call}: ok -> {state}", self.scenario)),
            Err(EngineError::EmptyHistory) => {
                self.lines.push(format!("[{}] {call}: nothing to undo", self.scenario));
            }
            Err(EngineError::NothingToRedo) => {
                self.lines.push(format!("[{}] {call}: nothing to redo", self.scenario));
            }
            Err(err) if !err.is_fatal() => {
                tracing::info!(target: "revop_demo", scenario = self.scenario, call, error = %err, "step rejected");
                self.lines
                    .push(format!("[{}] {call}: rejected ({err}) -> {state}", self.scenario));
            }
            Err(source) => {
                return Err(DemoError::Engine {
                    scenario: self.scenario,
                    source,
                });
            }
        }
        Ok(())
    }
}

fn listing(fs: &FileSystem) -> String {
    let names: Vec<_> = fs.names().collect();
    format!("[{}]", names.join(", "))
}

fn quoted(editor: &TextEditor) -> String {
    format!("{:?}", editor.content())
}

/// Create, rename and delete a report, then undo past the start of history.
pub fn file_system(config: EngineConfig) -> Result<ScenarioOutcome<FileSystem>> {
    let mut fs = FileSystem::new();
    let mut log = Transcript::new("files");
    let stats = {
        let mut engine = Engine::with_config(&mut fs, config);

        let r = engine.run(CreateFile::new("report.txt", "quarterly numbers"));
        log.step("create report.txt", r, listing(engine.receiver()))?;
        let r = engine.run(RenameFile::new("report.txt", "report_final.txt"));
        log.step("rename to report_final.txt", r, listing(engine.receiver()))?;
        let r = engine.run(DeleteFile::new("report_final.txt"));
        log.step("delete report_final.txt", r, listing(engine.receiver()))?;

        for _ in 0..4 {
            let r = engine.undo();
            log.step("undo", r, listing(engine.receiver()))?;
        }

        let r = engine.redo();
        log.step("redo", r, listing(engine.receiver()))?;

        // The second member fails, so the first is rolled back.
        let archive = MacroOperation::new("archive")
            .with(RenameFile::new("report.txt", "archive/report.txt"))
            .with(RenameFile::new("summary.txt", "archive/summary.txt"));
        let r = engine.run(archive);
        log.step("archive", r, listing(engine.receiver()))?;

        engine.stats()
    };

    Ok(ScenarioOutcome {
        receiver: fs,
        stats,
        transcript: log.lines,
    })
}

/// Type, undo, and restore a checkpoint.
pub fn text_editor(config: EngineConfig) -> Result<ScenarioOutcome<TextEditor>> {
    let mut editor = TextEditor::new();
    let mut log = Transcript::new("editor");
    let stats = {
        let mut engine = Engine::with_config(&mut editor, config);

        let r = engine.run(TypeText::new("Hello"));
        log.step("type \"Hello\"", r, quoted(engine.receiver()))?;
        let r = engine.run(TypeText::new(", world!"));
        log.step("type \", world!\"", r, quoted(engine.receiver()))?;
        let r = engine.undo();
        log.step("undo", r, quoted(engine.receiver()))?;
        let r = engine.undo();
        log.step("undo", r, quoted(engine.receiver()))?;

        let r = engine.run(TypeText::new("Draft"));
        log.step("type \"Draft\"", r, quoted(engine.receiver()))?;
        let saved = checkpoint(&mut engine);
        log.lines
            .push(format!("[editor] checkpoint: {:?}, history cleared", saved.content()));

        let r = engine.run(TypeText::new(" with typos"));
        log.step("type \" with typos\"", r, quoted(engine.receiver()))?;
        let r = engine.run(RestoreMemento::new(saved));
        log.step("restore checkpoint", r, quoted(engine.receiver()))?;
        let r = engine.undo();
        log.step("undo", r, quoted(engine.receiver()))?;

        engine.stats()
    };

    Ok(ScenarioOutcome {
        receiver: editor,
        stats,
        transcript: log.lines,
    })
}
