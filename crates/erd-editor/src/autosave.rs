//! Local caching and the periodic server flush.
//!
//! Every edit is written to the local store immediately and marks the
//! document dirty. The page polls [`Autosave::due`] on a short tick and, when
//! it says so, sends the document to the server and reports the result.

use erd_core::Schema;

/// Local-store key of the cached document.
pub const LOCAL_STORAGE_KEY: &str = "dbdesigner:lastSchema";

#[derive(Debug, Clone, PartialEq)]
pub struct AutosaveConfig {
    /// How often the page should poll [`Autosave::due`].
    pub tick_interval_ms: u32,
    /// Minimum time between two successful sends.
    pub min_flush_interval_ms: f64,
    /// File name the server writes the document to.
    pub target_file: String,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 250,
            min_flush_interval_ms: 1000.0,
            target_file: "solution.json".to_string(),
        }
    }
}

/// Synchronous key-value cache for the current document.
pub trait LocalStore {
    /// Store the serialized document. Failures are the store's to log.
    fn save(&mut self, json: &str);
    fn load(&self) -> Option<String>;
}

/// Store backed by a string in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    value: Option<String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(json: impl Into<String>) -> Self {
        Self {
            value: Some(json.into()),
            writes: 0,
        }
    }

    /// Number of `save` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl LocalStore for MemoryStore {
    fn save(&mut self, json: &str) {
        self.value = Some(json.to_string());
        self.writes += 1;
    }

    fn load(&self) -> Option<String> {
        self.value.clone()
    }
}

/// Write `schema` to `store`; encoding failures are logged and dropped.
pub fn cache_schema(store: &mut impl LocalStore, schema: &Schema) {
    match schema.to_json() {
        Ok(json) => store.save(&json),
        Err(e) => log::warn!("not caching document: {e}"),
    }
}

/// The cached document, or `None` when absent or unreadable.
pub fn load_cached(store: &impl LocalStore) -> Option<Schema> {
    let raw = store.load()?;
    match Schema::from_json(&raw) {
        Ok(schema) => Some(schema),
        Err(e) => {
            log::warn!("ignoring cached document: {e}");
            None
        }
    }
}

/// Dirty tracking and flush cadence for the server copy.
#[derive(Debug, Clone)]
pub struct Autosave {
    config: AutosaveConfig,
    dirty: bool,
    last_sent_ms: f64,
}

impl Default for Autosave {
    fn default() -> Self {
        Self::new(AutosaveConfig::default())
    }
}

impl Autosave {
    pub const SAVED_PREFIX: &'static str = "Auto-saved to ";
    pub const FAILED: &'static str = "Auto-save failed (will retry)";

    pub fn new(config: AutosaveConfig) -> Self {
        Self {
            config,
            dirty: false,
            last_sent_ms: 0.0,
        }
    }

    pub fn config(&self) -> &AutosaveConfig {
        &self.config
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether a send should start at `now_ms`.
    pub fn due(&self, now_ms: f64) -> bool {
        self.dirty && now_ms - self.last_sent_ms >= self.config.min_flush_interval_ms
    }

    /// Record a successful send started at `now_ms`; returns the status line.
    pub fn mark_sent(&mut self, now_ms: f64) -> String {
        self.dirty = false;
        self.last_sent_ms = now_ms;
        format!("{}{}", Self::SAVED_PREFIX, self.config.target_file)
    }

    /// Record a failed send. The document stays dirty and is retried on a
    /// later tick.
    pub fn mark_failed(&mut self) -> &'static str {
        log::warn!("auto-save to {} failed", self.config.target_file);
        Self::FAILED
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flushes_only_when_dirty_and_after_the_interval() {
        let mut a = Autosave::default();
        assert!(!a.due(5000.0));

        a.mark_dirty();
        assert!(a.due(1000.0));
        assert_eq!(a.mark_sent(1000.0), "Auto-saved to solution.json");
        assert!(!a.due(1250.0));

        a.mark_dirty();
        assert!(!a.due(1750.0));
        assert!(a.due(2000.0));
    }

    #[test]
    fn failure_keeps_the_document_dirty() {
        let mut a = Autosave::default();
        a.mark_dirty();
        assert_eq!(a.mark_failed(), "Auto-save failed (will retry)");
        assert!(a.is_dirty());
        assert!(a.due(1250.0));
    }

    #[test]
    fn cache_roundtrip_and_corrupt_cache() {
        let mut store = MemoryStore::new();
        assert!(load_cached(&store).is_none());

        cache_schema(&mut store, &Schema::new("cached"));
        assert_eq!(store.writes(), 1);
        assert_eq!(load_cached(&store).map(|s| s.name), Some("cached".to_string()));

        let corrupt = MemoryStore::with_value("{ nope");
        assert!(load_cached(&corrupt).is_none());
    }
}
