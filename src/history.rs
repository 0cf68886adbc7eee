use crate::language::Language;
use crate::shared::ids::random_hex;
use crate::shared::logging::EventLog;
use crate::shared::now_millis;
use crate::store::{KeyValueStore, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

pub const HISTORY_KEY: &str = "promptHistory";
pub const EMPTY_HISTORY_MESSAGE: &str = "No history yet. Generate a prompt to get started!";

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history entry `{0}` already exists")]
    DuplicateId(String),
    #[error("failed to encode history: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One completed refinement. Entries are immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    id: String,
    input_prompt: String,
    output_prompt: String,
    language: Language,
    timestamp: i64,
}

impl HistoryEntry {
    pub fn new(
        id: impl Into<String>,
        input_prompt: impl Into<String>,
        output_prompt: impl Into<String>,
        language: Language,
        timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            input_prompt: input_prompt.into(),
            output_prompt: output_prompt.into(),
            language,
            timestamp,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn input_prompt(&self) -> &str {
        &self.input_prompt
    }

    pub fn output_prompt(&self) -> &str {
        &self.output_prompt
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Milliseconds since the Unix epoch.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Parses a persisted history blob and checks the invariants the controller
/// relies on before any field is trusted.
pub fn decode_history(raw: &str) -> Result<Vec<HistoryEntry>, String> {
    let entries: Vec<HistoryEntry> =
        serde_json::from_str(raw).map_err(|err| format!("invalid history json: {err}"))?;
    let mut seen = HashSet::new();
    for (index, entry) in entries.iter().enumerate() {
        if entry.id.trim().is_empty() {
            return Err(format!("entry {index} has an empty id"));
        }
        if entry.input_prompt.trim().is_empty() {
            return Err(format!("entry `{}` has an empty input prompt", entry.id));
        }
        if !seen.insert(entry.id.as_str()) {
            return Err(format!("duplicate entry id `{}`", entry.id));
        }
    }
    Ok(entries)
}

pub fn encode_history(entries: &[HistoryEntry]) -> Result<String, HistoryError> {
    serde_json::to_string(entries).map_err(HistoryError::Encode)
}

/// Newest-first list of refinements mirrored into a key-value store under
/// [`HISTORY_KEY`].
#[derive(Debug)]
pub struct HistoryController<S> {
    store: S,
    entries: Vec<HistoryEntry>,
}

impl<S: KeyValueStore> HistoryController<S> {
    /// Reads the persisted list; this never fails. Corrupt data is removed
    /// from the store. Any other read failure leaves the stored value alone
    /// and the controller starts empty.
    pub fn load(mut store: S, log: &EventLog) -> Self {
        let entries = match store.get(HISTORY_KEY) {
            Ok(None) => Vec::new(),
            Ok(Some(raw)) if raw.trim().is_empty() => Vec::new(),
            Ok(Some(raw)) => match decode_history(&raw) {
                Ok(entries) => entries,
                Err(reason) => {
                    discard_persisted(&mut store, log, &reason);
                    Vec::new()
                }
            },
            Err(err) if err.is_corrupt_data() => {
                discard_persisted(&mut store, log, &err.to_string());
                Vec::new()
            }
            Err(err) => {
                log.warn(
                    "history.load_reset",
                    "history unreadable, starting empty",
                    &[
                        ("reason", Value::String(err.to_string())),
                        ("removed", Value::Bool(false)),
                    ],
                );
                Vec::new()
            }
        };
        Self { store, entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Looks up an entry so the caller can repopulate its working fields.
    /// The list is left untouched.
    pub fn reuse(&self, id: &str) -> Option<&HistoryEntry> {
        self.find(id)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Builds an entry stamped now, with an id no current entry holds.
    pub fn new_entry(
        &self,
        input_prompt: &str,
        output_prompt: &str,
        language: Language,
    ) -> HistoryEntry {
        let timestamp = now_millis();
        let mut id = format!("hist-{timestamp}-{}", random_hex(4));
        while self.find(&id).is_some() {
            id = format!("hist-{timestamp}-{}", random_hex(4));
        }
        HistoryEntry::new(id, input_prompt, output_prompt, language, timestamp)
    }

    /// Prepends `entry` and writes the whole list. A write failure is
    /// returned but the in-memory list keeps the new entry.
    pub fn record(&mut self, entry: HistoryEntry) -> Result<(), HistoryError> {
        if self.find(&entry.id).is_some() {
            return Err(HistoryError::DuplicateId(entry.id));
        }
        self.entries.insert(0, entry);
        self.persist()
    }

    /// Removes the entry with `id`. Returns `Ok(false)` without touching the
    /// store when no such entry exists.
    pub fn delete(&mut self, id: &str) -> Result<bool, HistoryError> {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        if self.entries.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    fn persist(&mut self) -> Result<(), HistoryError> {
        let body = encode_history(&self.entries)?;
        self.store.set(HISTORY_KEY, &body)?;
        Ok(())
    }
}

fn discard_persisted<S: KeyValueStore>(store: &mut S, log: &EventLog, reason: &str) {
    let removed = store.remove(HISTORY_KEY).is_ok();
    log.warn(
        "history.load_reset",
        "discarded unreadable history",
        &[
            ("reason", Value::String(reason.to_string())),
            ("removed", Value::Bool(removed)),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn entry(id: &str, input: &str) -> HistoryEntry {
        HistoryEntry::new(
            id,
            input,
            format!("refined {input}"),
            Language::English,
            1_700_000_000_000,
        )
    }

    fn controller_with(entries: &[HistoryEntry]) -> HistoryController<MemoryStore> {
        let raw = serde_json::to_string(entries).expect("encode");
        HistoryController::load(
            MemoryStore::with_value(HISTORY_KEY, &raw),
            &EventLog::disabled(),
        )
    }

    #[test]
    fn persisted_format_uses_camel_case_keys() {
        let raw = serde_json::to_value(entry("hist-1", "a cat")).expect("encode");
        assert_eq!(raw["id"], "hist-1");
        assert_eq!(raw["inputPrompt"], "a cat");
        assert_eq!(raw["outputPrompt"], "refined a cat");
        assert_eq!(raw["language"], "English");
        assert_eq!(raw["timestamp"], 1_700_000_000_000_i64);
    }

    #[test]
    fn load_reads_entries_in_stored_order() {
        let controller = controller_with(&[entry("b", "newer"), entry("a", "older")]);
        let ids: Vec<&str> = controller.entries().iter().map(HistoryEntry::id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn load_resets_and_removes_corrupt_value() {
        let controller = HistoryController::load(
            MemoryStore::with_value(HISTORY_KEY, "{not json"),
            &EventLog::disabled(),
        );
        assert!(controller.is_empty());
        assert_eq!(controller.store().raw(HISTORY_KEY), None);
    }

    struct UnreadableStore {
        kind: std::io::ErrorKind,
        removes: usize,
    }

    impl KeyValueStore for UnreadableStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Read {
                path: "promptHistory.json".to_string(),
                source: std::io::Error::from(self.kind),
            })
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Ok(())
        }

        fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
            self.removes += 1;
            Ok(())
        }
    }

    #[test]
    fn load_keeps_value_when_read_is_denied() {
        let controller = HistoryController::load(
            UnreadableStore {
                kind: std::io::ErrorKind::PermissionDenied,
                removes: 0,
            },
            &EventLog::disabled(),
        );
        assert!(controller.is_empty());
        assert_eq!(controller.store().removes, 0);
    }

    #[test]
    fn load_removes_value_that_is_not_text() {
        let controller = HistoryController::load(
            UnreadableStore {
                kind: std::io::ErrorKind::InvalidData,
                removes: 0,
            },
            &EventLog::disabled(),
        );
        assert!(controller.is_empty());
        assert_eq!(controller.store().removes, 1);
    }

    #[test]
    fn load_rejects_wrong_shape_and_invariant_violations() {
        for raw in [
            r#"{"id":"x"}"#,
            r#"[{"id":"x","inputPrompt":"a","outputPrompt":"b","language":"French","timestamp":1}]"#,
            r#"[{"id":"x","inputPrompt":"  ","outputPrompt":"b","language":"English","timestamp":1}]"#,
            r#"[{"id":"x","inputPrompt":"a","outputPrompt":"b","language":"English","timestamp":1},
                {"id":"x","inputPrompt":"c","outputPrompt":"d","language":"Bangla","timestamp":2}]"#,
        ] {
            let controller = HistoryController::load(
                MemoryStore::with_value(HISTORY_KEY, raw),
                &EventLog::disabled(),
            );
            assert!(controller.is_empty(), "accepted: {raw}");
        }
    }

    #[test]
    fn record_prepends_and_persists_whole_list() {
        let mut controller = controller_with(&[entry("a", "older")]);
        controller.record(entry("b", "newer")).expect("record");

        assert_eq!(controller.len(), 2);
        assert_eq!(controller.entries()[0].id(), "b");
        let persisted = decode_history(controller.store().raw(HISTORY_KEY).expect("raw"))
            .expect("decode");
        assert_eq!(persisted, controller.entries());
    }

    #[test]
    fn record_rejects_an_id_already_held() {
        let mut controller = controller_with(&[entry("a", "older")]);
        let err = controller.record(entry("a", "again")).expect_err("duplicate");
        assert!(matches!(err, HistoryError::DuplicateId(id) if id == "a"));
        assert_eq!(controller.len(), 1);
    }

    #[test]
    fn record_keeps_in_memory_entry_when_persist_fails() {
        let mut store = MemoryStore::new();
        store.set_read_only(true);
        let mut controller = HistoryController::load(store, &EventLog::disabled());
        let err = controller.record(entry("a", "idea")).expect_err("persist fails");
        assert!(matches!(err, HistoryError::Store(StoreError::ReadOnly)));
        assert_eq!(controller.len(), 1);
    }

    #[test]
    fn delete_removes_matching_entry_or_is_a_no_op() {
        let mut controller = controller_with(&[entry("b", "two"), entry("a", "one")]);
        assert!(controller.delete("a").expect("delete"));
        assert_eq!(controller.len(), 1);
        assert!(controller.find("a").is_none());

        assert!(!controller.delete("missing").expect("no-op"));
        assert_eq!(controller.len(), 1);
        let persisted = decode_history(controller.store().raw(HISTORY_KEY).expect("raw"))
            .expect("decode");
        assert_eq!(persisted.len(), 1);
    }

    #[test]
    fn reuse_does_not_change_list() {
        let controller = controller_with(&[entry("b", "two"), entry("a", "one")]);
        let before = controller.entries().to_vec();
        let found = controller.reuse("a").expect("found");
        assert_eq!(found.input_prompt(), "one");
        assert!(controller.reuse("zzz").is_none());
        assert_eq!(controller.entries(), before.as_slice());
    }

    #[test]
    fn new_entry_ids_are_unique_within_controller() {
        let mut controller = HistoryController::load(MemoryStore::new(), &EventLog::disabled());
        for n in 0..50 {
            let entry = controller.new_entry(&format!("idea {n}"), "out", Language::Bangla);
            assert!(entry.id().starts_with("hist-"));
            controller.record(entry).expect("record");
        }
        let ids: HashSet<&str> = controller.entries().iter().map(HistoryEntry::id).collect();
        assert_eq!(ids.len(), 50);
    }
}
