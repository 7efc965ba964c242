//! Bounded-pool query engine
//!
//! A query ranks every other item by its similarity to the selected one, draws
//! a pool of `max(pool_min, n * expansion_factor)` top candidates (never more
//! than the catalog minus the selected item) and walks it in rank order through
//! the optional filter until `n` items are accepted or the pool runs out. The
//! pool is never widened afterwards, so a query makes at most `pool_size`
//! filter calls. Restrictive filters can therefore return fewer than `n` items;
//! [`Recommendations::is_partial`] reports that to the caller.

use ordered_float::OrderedFloat;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::filter::CandidateFilter;
use crate::store::SimilarityStore;
use crate::{Error, Result};

/// One entry of a ranked candidate list
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub index: usize,
    pub score: f32,
}

/// An accepted recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub index: usize,
    pub id: String,
    pub title: String,
    pub score: f32,
}

/// Accepted items in rank order plus bookkeeping about the walk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendations {
    pub items: Vec<Recommendation>,
    pub requested: usize,
    pub pool_size: usize,
    /// Candidates handed to the filter (or accepted directly without one)
    pub examined: usize,
    pub rejected: usize,
    /// Rejections caused by a failing filter call
    pub failed: usize,
}

impl Recommendations {
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Fewer items than requested were found
    #[inline]
    pub fn is_partial(&self) -> bool {
        self.items.len() < self.requested
    }

    pub fn indices(&self) -> Vec<usize> {
        self.items.iter().map(|r| r.index).collect()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.items.iter().map(|r| r.title.as_str()).collect()
    }
}

/// Stateless recommender over a shared [`SimilarityStore`]
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: Arc<SimilarityStore>,
    config: EngineConfig,
}

impl QueryEngine {
    pub fn new(store: Arc<SimilarityStore>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    #[inline]
    pub fn store(&self) -> &SimilarityStore {
        &self.store
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Pool drawn for a request of `n` results
    pub fn pool_size(&self, n: usize) -> usize {
        let available = self.store.len().saturating_sub(1);
        self.config
            .pool_min
            .max(n.saturating_mul(self.config.expansion_factor))
            .min(available)
    }

    /// Top `limit` candidates for `selected`, excluding `selected` itself,
    /// by score descending then index ascending
    pub fn rank(&self, selected: usize, limit: usize) -> Result<Vec<RankedCandidate>> {
        self.store.item(selected)?;

        let mut candidates: Vec<RankedCandidate> = self
            .store
            .matrix()
            .row(selected)
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != selected)
            .map(|(index, &score)| RankedCandidate { index, score })
            .collect();

        if limit == 0 {
            return Ok(Vec::new());
        }
        if limit < candidates.len() {
            candidates.select_nth_unstable_by(limit - 1, rank_order);
            candidates.truncate(limit);
        }
        candidates.sort_unstable_by(rank_order);
        Ok(candidates)
    }

    /// Recommend up to `n` items similar to `selected` that pass `filter`
    pub fn recommend(
        &self,
        selected: usize,
        n: usize,
        filter: Option<&dyn CandidateFilter>,
    ) -> Result<Recommendations> {
        if n == 0 {
            return Err(Error::InvalidRequest("requested count must be at least 1".to_string()));
        }

        let pool_size = self.pool_size(n);
        let pool = self.rank(selected, pool_size)?;

        let mut items = Vec::with_capacity(n.min(pool.len()));
        let (mut examined, mut rejected, mut failed) = (0, 0, 0);

        for candidate in pool {
            if items.len() >= n {
                break;
            }
            examined += 1;
            let item = self.store.item(candidate.index)?;

            let accepted = match filter {
                None => true,
                Some(f) => match f.evaluate(item) {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::warn!(
                            candidate = candidate.index,
                            title = %item.title,
                            error = %e,
                            "Filter failed, rejecting candidate"
                        );
                        failed += 1;
                        false
                    }
                },
            };

            if accepted {
                items.push(Recommendation {
                    index: item.index,
                    id: item.id.clone(),
                    title: item.title.clone(),
                    score: candidate.score,
                });
            } else {
                rejected += 1;
            }
        }

        tracing::debug!(
            selected,
            requested = n,
            pool_size,
            examined,
            accepted = items.len(),
            rejected,
            failed,
            "Recommendation query finished"
        );

        Ok(Recommendations {
            items,
            requested: n,
            pool_size,
            examined,
            rejected,
            failed,
        })
    }

    /// Resolve `title` to the first matching item, then [`recommend`](Self::recommend)
    pub fn recommend_by_title(
        &self,
        title: &str,
        n: usize,
        filter: Option<&dyn CandidateFilter>,
    ) -> Result<Recommendations> {
        let selected = self.store.resolve_title(title)?;
        self.recommend(selected, n, filter)
    }
}

#[inline]
fn rank_order(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    OrderedFloat(b.score)
        .cmp(&OrderedFloat(a.score))
        .then_with(|| a.index.cmp(&b.index))
}
