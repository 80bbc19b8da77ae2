//! Map ranked oracle keys onto catalog rows.
//!
//! ## Algorithm
//! 1. Decide how keys are compared with catalog ids
//!    - `Batch`: if every key parses as an integer the whole batch is looked
//!      up by integer id; if any key fails, the whole batch is compared as
//!      text against the string-cast catalog id
//!    - `PerKey`: each key goes through whichever space it parses into
//! 2. Fetch the matching rows in one store call per space
//! 3. Walk the keys in rank order and emit the row each key resolved to
//!
//! Keys that resolve to nothing are dropped. The output is always a
//! sub-sequence of the input order, and a row repeats only when its key does.

use catalog::{CatalogItem, CatalogStore, ItemId, StoreError};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// How keys are matched against the catalog id space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileStrategy {
    /// One mode for the whole batch, chosen by whether every key is numeric
    #[default]
    Batch,
    /// Each key resolved in the space it parses into
    PerKey,
}

/// Comparison space for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    /// Parsed and compared as an integer id
    Integer,
    /// Compared verbatim with the id cast to text
    Text,
}

/// Integer form of a key, if it has one.
///
/// Surrounding whitespace is ignored here only. Text mode compares keys
/// verbatim, so `" 1"` resolves only when the whole batch is integer.
pub fn parse_key(key: &str) -> Option<ItemId> {
    key.trim().parse().ok()
}

/// Mode the `Batch` strategy uses for these keys
pub fn batch_mode(keys: &[String]) -> KeyMode {
    if keys.iter().all(|k| parse_key(k).is_some()) {
        KeyMode::Integer
    } else {
        KeyMode::Text
    }
}

/// Resolve `keys` to catalog rows, preserving rank order.
///
/// Only a failing store call is an error; unknown keys are not.
#[instrument(skip(keys, catalog), fields(key_count = keys.len()))]
pub fn reconcile(
    keys: &[String],
    catalog: &dyn CatalogStore,
    strategy: ReconcileStrategy,
) -> Result<Vec<CatalogItem>, StoreError> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }

    let modes: Vec<KeyMode> = match strategy {
        ReconcileStrategy::Batch => vec![batch_mode(keys); keys.len()],
        ReconcileStrategy::PerKey => keys
            .iter()
            .map(|k| match parse_key(k) {
                Some(_) => KeyMode::Integer,
                None => KeyMode::Text,
            })
            .collect(),
    };

    let int_ids: Vec<ItemId> = keys
        .iter()
        .zip(&modes)
        .filter(|(_, mode)| **mode == KeyMode::Integer)
        .filter_map(|(k, _)| parse_key(k))
        .collect();
    let text_keys: Vec<String> = keys
        .iter()
        .zip(&modes)
        .filter(|(_, mode)| **mode == KeyMode::Text)
        .map(|(k, _)| k.clone())
        .collect();

    let by_id: HashMap<ItemId, CatalogItem> = if int_ids.is_empty() {
        HashMap::new()
    } else {
        catalog
            .lookup_by_ids(&int_ids)?
            .into_iter()
            .map(|item| (item.id, item))
            .collect()
    };
    let by_raw: HashMap<String, CatalogItem> = if text_keys.is_empty() {
        HashMap::new()
    } else {
        catalog
            .lookup_by_raw_ids(&text_keys)?
            .into_iter()
            .map(|item| (item.raw_id(), item))
            .collect()
    };

    let resolved: Vec<CatalogItem> = keys
        .iter()
        .zip(&modes)
        .filter_map(|(key, mode)| match mode {
            KeyMode::Integer => parse_key(key).and_then(|id| by_id.get(&id)),
            KeyMode::Text => by_raw.get(key.as_str()),
        })
        .cloned()
        .collect();

    debug!(
        "Resolved {} of {} keys ({} integer, {} text)",
        resolved.len(),
        keys.len(),
        int_ids.len(),
        text_keys.len()
    );
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::CatalogIndex;
    use std::sync::Mutex;

    /// Records which lookup methods were called
    struct RecordingStore {
        index: CatalogIndex,
        calls: Mutex<Vec<&'static str>>,
    }

    impl RecordingStore {
        fn new(ids: &[ItemId]) -> Self {
            let mut index = CatalogIndex::new();
            for &id in ids {
                index.insert_item(CatalogItem::new(id, format!("item {}", id), "Misc"));
            }
            Self {
                index,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CatalogStore for RecordingStore {
        fn lookup_by_ids(&self, ids: &[ItemId]) -> Result<Vec<CatalogItem>, StoreError> {
            self.calls.lock().unwrap().push("ids");
            self.index.lookup_by_ids(ids)
        }

        fn lookup_by_raw_ids(&self, keys: &[String]) -> Result<Vec<CatalogItem>, StoreError> {
            self.calls.lock().unwrap().push("raw");
            self.index.lookup_by_raw_ids(keys)
        }

        fn all_items(&self) -> Result<Vec<CatalogItem>, StoreError> {
            self.index.all_items()
        }
    }

    struct BrokenStore;

    impl CatalogStore for BrokenStore {
        fn lookup_by_ids(&self, _ids: &[ItemId]) -> Result<Vec<CatalogItem>, StoreError> {
            Err(StoreError::Unavailable("connection reset".to_string()))
        }

        fn lookup_by_raw_ids(&self, _keys: &[String]) -> Result<Vec<CatalogItem>, StoreError> {
            Err(StoreError::Unavailable("connection reset".to_string()))
        }

        fn all_items(&self) -> Result<Vec<CatalogItem>, StoreError> {
            Err(StoreError::Unavailable("connection reset".to_string()))
        }
    }

    fn keys(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn ids(items: &[CatalogItem]) -> Vec<ItemId> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_integer_mode_preserves_rank_order() {
        let store = RecordingStore::new(&[1, 2, 3, 4]);
        let items = reconcile(&keys(&["3", "1", "4"]), &store, ReconcileStrategy::Batch).unwrap();

        assert_eq!(ids(&items), vec![3, 1, 4]);
        assert_eq!(store.calls(), vec!["ids"]);
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let store = RecordingStore::new(&[1, 2]);
        let items = reconcile(&keys(&["9", "2", "7", "1"]), &store, ReconcileStrategy::Batch).unwrap();

        assert_eq!(ids(&items), vec![2, 1]);
    }

    #[test]
    fn test_one_text_key_switches_whole_batch() {
        let store = RecordingStore::new(&[1, 2]);
        let batch = keys(&["1", "2", "x"]);

        assert_eq!(batch_mode(&batch), KeyMode::Text);
        let items = reconcile(&batch, &store, ReconcileStrategy::Batch).unwrap();

        // Text comparison still matches "1" and "2" verbatim
        assert_eq!(ids(&items), vec![1, 2]);
        assert_eq!(store.calls(), vec!["raw"]);
    }

    #[test]
    fn test_text_mode_loses_non_canonical_numbers() {
        let store = RecordingStore::new(&[1, 2]);

        // "01" parses, but the "x" forces text mode where "01" != "1"
        let items = reconcile(&keys(&["01", "2", "x"]), &store, ReconcileStrategy::Batch).unwrap();
        assert_eq!(ids(&items), vec![2]);

        // On its own the same key resolves through integer mode
        let items = reconcile(&keys(&["01", "2"]), &store, ReconcileStrategy::Batch).unwrap();
        assert_eq!(ids(&items), vec![1, 2]);
    }

    #[test]
    fn test_padded_key_resolves_only_in_integer_mode() {
        let store = RecordingStore::new(&[1, 2]);

        let items = reconcile(&keys(&[" 1", "2"]), &store, ReconcileStrategy::Batch).unwrap();
        assert_eq!(ids(&items), vec![1, 2]);

        let items = reconcile(&keys(&[" 1", "2", "x"]), &store, ReconcileStrategy::Batch).unwrap();
        assert_eq!(ids(&items), vec![2]);
    }

    #[test]
    fn test_per_key_strategy_resolves_each_key_in_its_space() {
        let store = RecordingStore::new(&[1, 2]);
        let items = reconcile(&keys(&["x", "01", "2"]), &store, ReconcileStrategy::PerKey).unwrap();

        assert_eq!(ids(&items), vec![1, 2]);
        assert_eq!(store.calls(), vec!["ids", "raw"]);
    }

    #[test]
    fn test_duplicate_keys_repeat_rows() {
        let store = RecordingStore::new(&[1, 2]);
        let items = reconcile(&keys(&["2", "1", "2"]), &store, ReconcileStrategy::Batch).unwrap();

        assert_eq!(ids(&items), vec![2, 1, 2]);
    }

    #[test]
    fn test_empty_keys_skip_the_store() {
        let store = RecordingStore::new(&[1]);
        let items = reconcile(&[], &store, ReconcileStrategy::Batch).unwrap();

        assert!(items.is_empty());
        assert!(store.calls().is_empty());
    }

    #[test]
    fn test_output_is_sub_order_of_input() {
        let store = RecordingStore::new(&[2, 4, 6, 8, 10]);
        let batch = keys(&["10", "3", "8", "5", "2", "6", "1"]);
        let items = reconcile(&batch, &store, ReconcileStrategy::Batch).unwrap();

        let positions: Vec<usize> = items
            .iter()
            .map(|item| batch.iter().position(|k| *k == item.raw_id()).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(items.len() <= batch.len());
    }

    #[test]
    fn test_store_failure_is_reported() {
        let err = reconcile(&keys(&["1"]), &BrokenStore, ReconcileStrategy::Batch).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
