//! Core domain types for the storefront catalog.
//!
//! This module defines the records shared by the serving path and the
//! offline dataset tooling, plus the in-memory `CatalogIndex`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// =============================================================================
// Type Aliases
// =============================================================================

/// Canonical catalog identifier (integer primary key of a product row)
pub type ItemId = i64;

/// Identifier of an order placed in the store
pub type OrderId = i64;

// =============================================================================
// Catalog Types
// =============================================================================

/// A product row in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
    pub category: String,
}

impl CatalogItem {
    /// Minimal item with only the required fields set
    pub fn new(id: ItemId, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            price: None,
            image_url: None,
            category: category.into(),
        }
    }

    /// The id as the catalog store renders it when cast to text
    pub fn raw_id(&self) -> String {
        self.id.to_string()
    }
}

/// One line of a customer order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub order_id: OrderId,
    pub product_id: ItemId,
    pub quantity: u32,
}

/// Aggregate event count for one catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCount {
    pub item_id: ItemId,
    pub count: u64,
}

// =============================================================================
// Interaction Type
// =============================================================================

/// A logged user/item event.
///
/// Ids are kept as opaque strings: the event log and the ranking model
/// share this identifier space, which need not match the catalog's.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: String,
    pub item_id: String,
    /// Seconds since the epoch, or a row ordinal when the log carries no time
    pub timestamp: i64,
}

impl Interaction {
    pub fn new(user_id: impl Into<String>, item_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            timestamp,
        }
    }
}

// =============================================================================
// CatalogIndex - In-Memory Catalog and Order Store
// =============================================================================

/// Holds the product catalog and the order-line table.
///
/// Items are kept in a `BTreeMap` so every full scan is ordered by id,
/// which keeps paging and tie-breaking deterministic.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    pub(crate) items: BTreeMap<ItemId, CatalogItem>,

    /// String-cast id -> canonical id
    pub(crate) raw_ids: HashMap<String, ItemId>,

    /// `None` when the order-line table was never loaded
    pub(crate) order_lines: Option<Vec<OrderLine>>,

    /// Order lines per product, kept in sync with `order_lines`
    pub(crate) order_counts: HashMap<ItemId, u64>,
}

impl CatalogIndex {
    /// Creates a new, empty index with no order-line table
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an item by canonical id
    pub fn get_item(&self, id: ItemId) -> Option<&CatalogItem> {
        self.items.get(&id)
    }

    /// Get an item by the text form of its id
    pub fn get_item_by_raw(&self, raw: &str) -> Option<&CatalogItem> {
        self.raw_ids.get(raw).and_then(|id| self.items.get(id))
    }

    /// Iterate all items in ascending id order
    pub fn items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.values()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the order-line table is present
    pub fn has_order_table(&self) -> bool {
        self.order_lines.is_some()
    }

    /// Number of order lines recorded for an item (zero if none)
    pub fn order_count(&self, id: ItemId) -> u64 {
        self.order_counts.get(&id).copied().unwrap_or(0)
    }

    /// Page through the catalog ordered by id
    pub fn page(&self, skip: usize, limit: usize) -> Vec<&CatalogItem> {
        self.items.values().skip(skip).take(limit).collect()
    }

    /// Insert (or replace) an item
    pub fn insert_item(&mut self, item: CatalogItem) {
        self.raw_ids.insert(item.raw_id(), item.id);
        self.items.insert(item.id, item);
    }

    /// Create an empty order-line table if none exists yet
    pub fn init_order_table(&mut self) {
        self.order_lines.get_or_insert_with(Vec::new);
    }

    /// Record an order line, creating the table on first use
    pub fn insert_order_line(&mut self, line: OrderLine) {
        *self.order_counts.entry(line.product_id).or_insert(0) += 1;
        self.order_lines.get_or_insert_with(Vec::new).push(line);
    }

    /// Get counts for debugging/validation: (items, order lines)
    pub fn counts(&self) -> (usize, usize) {
        let lines = self.order_lines.as_ref().map(|v| v.len()).unwrap_or(0);
        (self.items.len(), lines)
    }
}
