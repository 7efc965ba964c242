//! # reelsim
//!
//! A content-based "more like this" recommender.
//!
//! reelsim turns the free-text descriptions of a fixed catalog into
//! bag-of-words count vectors, precomputes a dense pairwise cosine similarity
//! matrix once offline, and answers "top N items similar to X" queries online,
//! optionally constrained by an external category oracle (for films, TMDB
//! genres).
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! reelsim build --catalog dataset.csv --model similarity.bin
//! reelsim recommend --catalog dataset.csv --model similarity.bin --title "Alien" -n 5
//! reelsim serve --catalog dataset.csv --model similarity.bin --http-port 8080
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use reelsim::prelude::*;
//! use std::sync::Arc;
//!
//! let store = ModelManager::new("dataset.csv", "similarity.bin").open().unwrap();
//! let engine = QueryEngine::new(Arc::new(store), EngineConfig::default()).unwrap();
//!
//! let oracle = MemoryOracle::from_path("genres.json").unwrap();
//! let animation = CategoryFilter::new(oracle, 16);
//! let recs = engine.recommend_by_title("Up", 5, Some(&animation)).unwrap();
//! for rec in &recs.items {
//!     println!("{} ({:.3})", rec.title, rec.score);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - `reelsim-core` - Vectorizer, similarity matrix, store, query engine, filter contract
//! - `reelsim-storage` - Catalog CSV, persisted model, store opening
//! - `reelsim-oracle` - TMDB oracle, TTL cache, in-memory oracle
//! - `reelsim-api` - REST API

pub mod config;

// Re-export core types
pub use reelsim_core::{
    build_similarity, find_category, resolve_category, CandidateFilter, Catalog, CatalogRecord,
    Category, CategoryFilter, CategoryId, CategoryOracle, CountVectorizer, EngineConfig, Error,
    Item, Metric, QueryEngine, Recommendation, Recommendations, Result, SimilarityMatrix,
    SimilarityStore, StopWords, VectorizerConfig,
};

// Re-export storage
pub use reelsim_storage::{load_catalog, BuildReport, CatalogOptions, ModelHeader, ModelManager};

// Re-export oracles
pub use reelsim_oracle::{CachedOracle, MemoryOracle, TmdbConfig, TmdbOracle};

// Re-export API
pub use reelsim_api::{AppState, RestApi};

pub use config::Settings;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CandidateFilter, CategoryFilter, CategoryOracle, EngineConfig, Error, Item, MemoryOracle,
        Metric, ModelManager, QueryEngine, Recommendations, Result, SimilarityStore,
        VectorizerConfig,
    };
}
