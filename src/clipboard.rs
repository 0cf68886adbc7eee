use crate::session::Session;
use crate::store::KeyValueStore;
use std::time::{Duration, Instant};

pub const COPY_FEEDBACK_DURATION: Duration = Duration::from_secs(2);

/// One-shot text sink. Nothing is read back after writing.
pub trait ClipboardSink {
    fn write_text(&mut self, text: &str) -> Result<(), String>;
}

#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), String> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| format!("clipboard unavailable: {e}"))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| format!("failed to write clipboard: {e}"))
    }
}

/// Copies the current output. Returns `Ok(false)` when there is nothing to
/// copy.
pub fn copy_output<S: KeyValueStore, C: ClipboardSink + ?Sized>(
    session: &Session<S>,
    sink: &mut C,
) -> Result<bool, String> {
    if session.output().is_empty() {
        return Ok(false);
    }
    sink.write_text(session.output())?;
    Ok(true)
}

pub fn copy_history_output<S: KeyValueStore, C: ClipboardSink + ?Sized>(
    session: &Session<S>,
    id: &str,
    sink: &mut C,
) -> Result<bool, String> {
    let Some(entry) = session.history_entry(id) else {
        return Ok(false);
    };
    sink.write_text(entry.output_prompt())?;
    Ok(true)
}

/// Short-lived "copied" indicator shown after a successful copy.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyFeedback {
    copied_at: Option<Instant>,
}

impl CopyFeedback {
    pub fn mark(&mut self) {
        self.copied_at = Some(Instant::now());
    }

    pub fn is_active(&self) -> bool {
        self.copied_at
            .map(|at| at.elapsed() < COPY_FEEDBACK_DURATION)
            .unwrap_or(false)
    }

    #[cfg(test)]
    fn mark_at(&mut self, at: Instant) {
        self.copied_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::refine::{RefineError, Refiner};
    use crate::shared::logging::EventLog;
    use crate::store::MemoryStore;

    #[derive(Default)]
    struct RecordingClipboard {
        writes: Vec<String>,
    }

    impl ClipboardSink for RecordingClipboard {
        fn write_text(&mut self, text: &str) -> Result<(), String> {
            self.writes.push(text.to_string());
            Ok(())
        }
    }

    struct Echo;

    impl Refiner for Echo {
        fn refine(&self, input: &str, _language: Language) -> Result<String, RefineError> {
            Ok(format!("refined {input}"))
        }
    }

    #[test]
    fn copy_output_skips_empty_output() {
        let session = Session::start(MemoryStore::new(), Language::English, EventLog::disabled());
        let mut sink = RecordingClipboard::default();
        assert_eq!(copy_output(&session, &mut sink), Ok(false));
        assert!(sink.writes.is_empty());
    }

    #[test]
    fn copy_output_and_history_output_write_refined_text() {
        let mut session =
            Session::start(MemoryStore::new(), Language::English, EventLog::disabled());
        session.set_input("a cat");
        session.generate(&Echo);
        let id = session.history().entries()[0].id().to_string();

        let mut sink = RecordingClipboard::default();
        assert_eq!(copy_output(&session, &mut sink), Ok(true));
        assert_eq!(copy_history_output(&session, &id, &mut sink), Ok(true));
        assert_eq!(copy_history_output(&session, "missing", &mut sink), Ok(false));
        assert_eq!(sink.writes, vec!["refined a cat", "refined a cat"]);
    }

    #[test]
    fn copy_feedback_expires() {
        let mut feedback = CopyFeedback::default();
        assert!(!feedback.is_active());
        feedback.mark();
        assert!(feedback.is_active());
        feedback.mark_at(Instant::now() - COPY_FEEDBACK_DURATION);
        assert!(!feedback.is_active());
    }
}
