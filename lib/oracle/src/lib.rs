//! # reelsim Oracle
//!
//! Category oracles consulted by the query engine's category filter:
//!
//! - [`TmdbOracle`] - Resolves titles and genres against the TMDB API
//! - [`CachedOracle`] - TTL memoisation in front of any oracle
//! - [`MemoryOracle`] - Static table, loadable from JSON

pub mod cache;
pub mod memory;
pub mod tmdb;

pub use cache::{CachedOracle, TtlCache, DEFAULT_TTL};
pub use memory::MemoryOracle;
pub use tmdb::{poster_url, TmdbConfig, TmdbOracle};
