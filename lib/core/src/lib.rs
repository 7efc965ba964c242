//! # reelsim Core
//!
//! Core library for the reelsim item-to-item recommender.
//!
//! This crate provides the offline model pipeline and the online query path:
//!
//! - [`CountVectorizer`] - Bag-of-words vectors over a capped vocabulary
//! - [`build_similarity`] - Dense pairwise cosine (or Jaccard) matrix
//! - [`SimilarityStore`] - Immutable catalog + matrix shared by every query
//! - [`QueryEngine`] - Ranked, filtered, bounded-pool recommendations
//! - [`CategoryOracle`] / [`CategoryFilter`] - External category constraint
//!
//! ## Example
//!
//! ```rust
//! use reelsim_core::{
//!     build_similarity, Catalog, CatalogRecord, CountVectorizer, EngineConfig, Metric,
//!     QueryEngine, SimilarityStore, VectorizerConfig,
//! };
//! use std::sync::Arc;
//!
//! let records = vec![
//!     CatalogRecord::new("1", "Alien", Some("crew of a space freighter hunted by a creature")),
//!     CatalogRecord::new("2", "Aliens", Some("marines return to fight the creature in space")),
//!     CatalogRecord::new("3", "Up", Some("an old man flies his house with balloons")),
//! ];
//!
//! let vectorizer = CountVectorizer::new(VectorizerConfig::default());
//! let docs: Vec<&str> = records.iter().map(|r| r.description_text()).collect();
//! let (_, vectors) = vectorizer.fit_transform(&docs);
//! let matrix = build_similarity(&vectors, Metric::Cosine).unwrap();
//!
//! let store = SimilarityStore::new(Catalog::from_records(&records), matrix).unwrap();
//! let engine = QueryEngine::new(Arc::new(store), EngineConfig::default()).unwrap();
//!
//! let recs = engine.recommend(0, 1, None).unwrap();
//! assert_eq!(recs.titles(), vec!["Aliens"]);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod item;
pub mod matrix;
pub mod sparse;
pub mod stopwords;
pub mod store;
pub mod vectorizer;

pub use config::{EngineConfig, Metric, StopWords, VectorizerConfig};
pub use engine::{QueryEngine, RankedCandidate, Recommendation, Recommendations};
pub use error::{Error, Result};
pub use filter::{
    find_category, resolve_category, CandidateFilter, Category, CategoryFilter, CategoryId,
    CategoryOracle, CategorySet, ExternalRecord,
};
pub use item::{Catalog, CatalogRecord, Item};
pub use matrix::{build_similarity, SimilarityMatrix};
pub use sparse::SparseVector;
pub use store::SimilarityStore;
pub use vectorizer::{CountVectorizer, FittedVectorizer};
