//! # reelsim Storage
//!
//! Everything that touches disk: reading the catalog CSV, writing and reading
//! the persisted similarity model, and opening a validated
//! [`SimilarityStore`](reelsim_core::SimilarityStore) from the two.

pub mod catalog;
pub mod manager;
pub mod model;

pub use catalog::{load_catalog, read_catalog, CatalogOptions, DEFAULT_DESCRIPTION_COLUMN};
pub use manager::{build_model, open_store, BuildReport, BuiltModel, ModelManager};
pub use model::{catalog_fingerprint, load_model, save_model, ModelHeader, MODEL_MAGIC, MODEL_VERSION};
