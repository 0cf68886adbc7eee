//! Working-session state machine: the transient input/output/error state
//! plus the history it records into. Rendering lives in `tui`; everything
//! here is driven through explicit operations.

use crate::history::{HistoryController, HistoryEntry};
use crate::language::Language;
use crate::refine::{RefineError, Refiner};
use crate::shared::logging::EventLog;
use crate::store::KeyValueStore;
use serde_json::Value;

pub const EMPTY_PROMPT_MESSAGE: &str = "Please enter a prompt idea first.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Validating,
    InFlight,
    Succeeded,
    Failed,
}

/// Snapshot of what was submitted when a generate action passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRefinement {
    pub input: String,
    pub language: Language,
}

#[derive(Debug)]
pub struct Session<S> {
    input: String,
    output: String,
    error: Option<String>,
    language: Language,
    phase: Phase,
    history: HistoryController<S>,
    log: EventLog,
}

impl<S: KeyValueStore> Session<S> {
    /// Starts a session over `store`, loading any persisted history.
    pub fn start(store: S, language: Language, log: EventLog) -> Self {
        let history = HistoryController::load(store, &log);
        Self::with_history(history, language, log)
    }

    pub fn with_history(history: HistoryController<S>, language: Language, log: EventLog) -> Self {
        Self {
            input: String::new(),
            output: String::new(),
            error: None,
            language,
            phase: Phase::Idle,
            history,
            log,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn history(&self) -> &HistoryController<S> {
        &self.history
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::InFlight
    }

    pub fn can_generate(&self) -> bool {
        !self.is_loading() && !self.input.trim().is_empty()
    }

    pub fn can_clear(&self) -> bool {
        !self.input.is_empty() || !self.output.is_empty() || self.error.is_some()
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn toggle_language(&mut self) {
        self.language = self.language.toggled();
    }

    /// Validates the current input and, if it passes, moves to `InFlight`
    /// and returns what must be sent. Returns `None` when a request is
    /// already in flight or validation failed.
    pub fn begin_generate(&mut self) -> Option<PendingRefinement> {
        if self.phase == Phase::InFlight {
            return None;
        }
        self.phase = Phase::Validating;
        if self.input.trim().is_empty() {
            self.error = Some(EMPTY_PROMPT_MESSAGE.to_string());
            self.phase = Phase::Failed;
            self.log
                .info("session.validation_failed", EMPTY_PROMPT_MESSAGE, &[]);
            return None;
        }

        self.error = None;
        self.output.clear();
        self.phase = Phase::InFlight;
        Some(PendingRefinement {
            input: self.input.clone(),
            language: self.language,
        })
    }

    /// Applies the result of the request started by `begin_generate`.
    /// Ignored unless a request is in flight.
    pub fn complete_generate(
        &mut self,
        pending: PendingRefinement,
        result: Result<String, RefineError>,
    ) -> Phase {
        if self.phase != Phase::InFlight {
            return self.phase;
        }

        let result = result.and_then(|text| {
            let text = text.trim();
            if text.is_empty() {
                Err(RefineError::EmptyResponse("no text".to_string()))
            } else {
                Ok(text.to_string())
            }
        });

        match result {
            Ok(text) => {
                self.log.info(
                    "refine.succeeded",
                    "refined prompt received",
                    &[
                        ("language", Value::String(pending.language.to_string())),
                        ("output_chars", Value::from(text.chars().count())),
                    ],
                );
                let entry = self
                    .history
                    .new_entry(&pending.input, &text, pending.language);
                let entry_id = entry.id().to_string();
                if let Err(err) = self.history.record(entry) {
                    self.log.warn(
                        "history.persist_failed",
                        &err.to_string(),
                        &[("entry_id", Value::String(entry_id))],
                    );
                }
                self.output = text;
                self.phase = Phase::Succeeded;
            }
            Err(err) => {
                self.log.warn(
                    "refine.failed",
                    &err.to_string(),
                    &[("category", Value::String(err.category().to_string()))],
                );
                self.error = Some(err.banner());
                self.output.clear();
                self.phase = Phase::Failed;
            }
        }
        self.phase
    }

    /// Runs a whole generate cycle on the calling thread.
    pub fn generate<R: Refiner + ?Sized>(&mut self, refiner: &R) -> Phase {
        let Some(pending) = self.begin_generate() else {
            return self.phase;
        };
        let result = refiner.refine(&pending.input, pending.language);
        self.complete_generate(pending, result)
    }

    /// Empties input, output and error. History is untouched, and a request
    /// already in flight still completes.
    pub fn clear(&mut self) {
        self.input.clear();
        self.output.clear();
        self.error = None;
        if self.phase != Phase::InFlight {
            self.phase = Phase::Idle;
        }
    }

    /// Loads an entry's input, output and language into the working fields.
    pub fn use_history_entry(&mut self, id: &str) -> bool {
        let Some(entry) = self.history.reuse(id) else {
            return false;
        };
        let (input, output, language) = (
            entry.input_prompt().to_string(),
            entry.output_prompt().to_string(),
            entry.language(),
        );
        self.input = input;
        self.output = output;
        self.language = language;
        true
    }

    pub fn history_entry(&self, id: &str) -> Option<&HistoryEntry> {
        self.history.find(id)
    }

    /// Returns whether an entry was removed. Write failures are logged.
    pub fn delete_history_entry(&mut self, id: &str) -> bool {
        match self.history.delete(id) {
            Ok(removed) => removed,
            Err(err) => {
                self.log.warn(
                    "history.persist_failed",
                    &err.to_string(),
                    &[("entry_id", Value::String(id.to_string()))],
                );
                self.history.find(id).is_none()
            }
        }
    }
}
