//! Store interfaces used by the serving path.
//!
//! The serving code only talks to these traits, so a relational backend can
//! stand in for the in-memory `CatalogIndex` without touching it. All methods
//! are blocking; async callers should run them on a blocking thread.

use crate::error::StoreError;
use crate::types::{CatalogIndex, CatalogItem, ItemCount, ItemId};
use std::collections::HashSet;

/// Read access to catalog rows
pub trait CatalogStore: Send + Sync {
    /// Rows whose integer id is in `ids`, in no particular order, each at most once
    fn lookup_by_ids(&self, ids: &[ItemId]) -> Result<Vec<CatalogItem>, StoreError>;

    /// Rows whose id, cast to text, equals one of `keys` exactly
    fn lookup_by_raw_ids(&self, keys: &[String]) -> Result<Vec<CatalogItem>, StoreError>;

    /// Every catalog row
    fn all_items(&self) -> Result<Vec<CatalogItem>, StoreError>;
}

/// Aggregate queries over the event tables
pub trait InteractionStore: Send + Sync {
    /// Event count for every catalog item, zero counts included
    fn popularity_counts(&self) -> Result<Vec<ItemCount>, StoreError>;
}

impl CatalogStore for CatalogIndex {
    fn lookup_by_ids(&self, ids: &[ItemId]) -> Result<Vec<CatalogItem>, StoreError> {
        let wanted: HashSet<ItemId> = ids.iter().copied().collect();
        Ok(wanted
            .into_iter()
            .filter_map(|id| self.get_item(id).cloned())
            .collect())
    }

    fn lookup_by_raw_ids(&self, keys: &[String]) -> Result<Vec<CatalogItem>, StoreError> {
        let wanted: HashSet<&str> = keys.iter().map(String::as_str).collect();
        Ok(wanted
            .into_iter()
            .filter_map(|raw| self.get_item_by_raw(raw).cloned())
            .collect())
    }

    fn all_items(&self) -> Result<Vec<CatalogItem>, StoreError> {
        Ok(self.items().cloned().collect())
    }
}

impl InteractionStore for CatalogIndex {
    fn popularity_counts(&self) -> Result<Vec<ItemCount>, StoreError> {
        if !self.has_order_table() {
            return Err(StoreError::TableMissing("order_items".to_string()));
        }

        Ok(self
            .items()
            .map(|item| ItemCount {
                item_id: item.id,
                count: self.order_count(item.id),
            })
            .collect())
    }
}
