//! # Catalog Crate
//!
//! Loads the storefront product catalog and order-line table, and exposes
//! them to the serving path through the `CatalogStore` and
//! `InteractionStore` traits.
//!
//! ## Main Components
//!
//! - **types**: Domain records (CatalogItem, OrderLine, Interaction) and `CatalogIndex`
//! - **parser**: Parse the `::`-separated export files
//! - **index**: Build a `CatalogIndex` from a data directory
//! - **store**: Store traits and their in-memory implementation
//! - **error**: Error types
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{CatalogIndex, CatalogStore};
//! use std::path::Path;
//!
//! let index = CatalogIndex::load_from_dir(Path::new("data/shop"))?;
//! let rows = index.lookup_by_ids(&[1, 2, 3])?;
//! ```

pub mod error;
pub mod index;
pub mod parser;
pub mod store;
pub mod types;

pub use error::{CatalogError, Result, StoreError};
pub use store::{CatalogStore, InteractionStore};
pub use types::{
    // Type aliases
    ItemId,
    OrderId,
    // Core types
    CatalogIndex,
    CatalogItem,
    Interaction,
    ItemCount,
    OrderLine,
};
