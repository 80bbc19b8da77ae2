//! # Dataset Crate
//!
//! Builds the train/valid/test interaction files used to train the ranking
//! model.
//!
//! ## Main Components
//!
//! - **partition**: Per-user temporal split (pure, parallel over users)
//! - **io**: Read the interaction CSV, write the split files
//! - **error**: Error types
//!
//! ## Example Usage
//!
//! ```ignore
//! use dataset::{prepare_dataset, ColumnSpec};
//! use std::path::Path;
//!
//! let report = prepare_dataset(
//!     Path::new("data/interactions.csv"),
//!     Path::new("dataset/shop"),
//!     &ColumnSpec::default(),
//! )?;
//! ```

pub mod error;
pub mod io;
pub mod partition;

pub use error::{DatasetError, Result};
pub use io::{prepare_dataset, read_interactions, write_splits, ColumnSpec, LoadedLog, PartitionReport};
pub use partition::{partition, split_user, PartitionedLog, UserSplit};
