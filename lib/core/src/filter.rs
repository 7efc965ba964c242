//! Candidate filtering and the external category oracle contract
//!
//! The query engine only sees [`CandidateFilter`]. A filter answers accept or
//! reject for one item; an `Err` is treated by the engine as a rejection of
//! that single candidate. [`CategoryFilter`] builds the category-membership
//! predicate on top of any [`CategoryOracle`].

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::item::Item;
use crate::{Error, Result};

pub type CategoryId = u64;
pub type CategorySet = AHashSet<CategoryId>;

/// Accept/reject predicate applied to ranked candidates
pub trait CandidateFilter {
    fn evaluate(&self, item: &Item) -> Result<bool>;
}

impl<F> CandidateFilter for F
where
    F: Fn(&Item) -> bool,
{
    fn evaluate(&self, item: &Item) -> Result<bool> {
        Ok(self(item))
    }
}

/// Canonical record of an item in the external catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRecord {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// External service answering category questions about titles.
///
/// Calls may block on network I/O; implementations should bound each call
/// with a timeout and report it as an error.
pub trait CategoryOracle: Send + Sync {
    /// Resolve a title to the oracle's canonical record, `None` when not found
    fn resolve(&self, title: &str) -> Result<Option<ExternalRecord>>;

    /// Category ids attached to a record
    fn categories_of(&self, record_id: &str) -> Result<CategorySet>;

    /// Every category the oracle knows about.
    ///
    /// Oracles that cannot enumerate their categories report an error rather
    /// than an empty listing.
    fn categories(&self) -> Result<Vec<Category>> {
        Err(Error::Oracle(format!("{}: category listing unsupported", self.name())))
    }

    /// Oracle name for logging
    fn name(&self) -> &'static str;
}

impl<O: CategoryOracle + ?Sized> CategoryOracle for Arc<O> {
    fn resolve(&self, title: &str) -> Result<Option<ExternalRecord>> {
        (**self).resolve(title)
    }

    fn categories_of(&self, record_id: &str) -> Result<CategorySet> {
        (**self).categories_of(record_id)
    }

    fn categories(&self) -> Result<Vec<Category>> {
        (**self).categories()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Accepts items whose external record carries `category`
pub struct CategoryFilter<O> {
    oracle: O,
    category: CategoryId,
}

impl<O: CategoryOracle> CategoryFilter<O> {
    pub fn new(oracle: O, category: CategoryId) -> Self {
        Self { oracle, category }
    }

    pub fn category(&self) -> CategoryId {
        self.category
    }

    pub fn oracle_name(&self) -> &'static str {
        self.oracle.name()
    }
}

impl<O: CategoryOracle> CandidateFilter for CategoryFilter<O> {
    fn evaluate(&self, item: &Item) -> Result<bool> {
        match self.oracle.resolve(&item.title)? {
            None => Ok(false),
            Some(record) => Ok(self.oracle.categories_of(&record.id)?.contains(&self.category)),
        }
    }
}

/// Find a category by numeric id or case-insensitive name
pub fn find_category<'a>(categories: &'a [Category], query: &str) -> Option<&'a Category> {
    let query = query.trim();
    if let Ok(id) = query.parse::<CategoryId>() {
        return categories.iter().find(|c| c.id == id);
    }
    categories.iter().find(|c| c.name.eq_ignore_ascii_case(query))
}

/// Resolve a user-supplied category (id or name) against the oracle's listing.
///
/// Listing failures propagate; a query matching no listed category is an
/// `InvalidRequest`.
pub fn resolve_category<O: CategoryOracle + ?Sized>(oracle: &O, query: &str) -> Result<CategoryId> {
    let categories = oracle.categories()?;
    find_category(&categories, query)
        .map(|c| c.id)
        .ok_or_else(|| Error::InvalidRequest(format!("unknown category '{}'", query.trim())))
}
