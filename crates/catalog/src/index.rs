//! CatalogIndex building from the export files.
//!
//! Both files are parsed in parallel. `products.dat` is required;
//! `order_items.dat` is optional, and when it is missing the index has no
//! order table at all (popularity queries against it then fail).

use crate::error::{CatalogError, Result};
use crate::parser;
use crate::types::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

pub const PRODUCTS_FILE: &str = "products.dat";
pub const ORDER_ITEMS_FILE: &str = "order_items.dat";

impl CatalogIndex {
    /// Load the catalog from a directory holding the export files
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        info!("Loading catalog from {:?}", data_dir);

        let products_path = data_dir.join(PRODUCTS_FILE);
        let order_items_path = data_dir.join(ORDER_ITEMS_FILE);

        let (items, order_lines) = rayon::join(
            || parser::parse_products(&products_path),
            || parser::parse_order_lines(&order_items_path),
        );

        let items = items?;
        let order_lines = match order_lines {
            Ok(lines) => Some(lines),
            Err(CatalogError::FileNotFound { path }) => {
                warn!("No order table at {}, popularity ranking will be unavailable", path);
                None
            }
            Err(e) => return Err(e),
        };

        Self::from_parts(items, order_lines)
    }

    /// Build an index from already-parsed rows
    ///
    /// Rejects duplicate item ids. Order lines pointing at unknown products
    /// are kept but never surface, since popularity only ranks catalog items.
    pub fn from_parts(items: Vec<CatalogItem>, order_lines: Option<Vec<OrderLine>>) -> Result<Self> {
        let mut index = CatalogIndex::new();

        let mut seen = HashSet::with_capacity(items.len());
        for item in items {
            if !seen.insert(item.id) {
                return Err(CatalogError::DuplicateItem {
                    file: PRODUCTS_FILE.to_string(),
                    id: item.id,
                });
            }
            index.insert_item(item);
        }

        if let Some(lines) = order_lines {
            index.init_order_table();
            let orphans = lines
                .iter()
                .filter(|l| !index.items.contains_key(&l.product_id))
                .count();
            if orphans > 0 {
                warn!("{} order lines reference unknown products", orphans);
            }
            for line in lines {
                index.insert_order_line(line);
            }
        }

        let (items, lines) = index.counts();
        info!("Catalog loaded: {} items, {} order lines", items, lines);
        Ok(index)
    }
}
