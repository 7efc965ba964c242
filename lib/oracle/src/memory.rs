// In-memory oracle backed by a static title -> categories table
use ahash::AHashMap;
use reelsim_core::{Category, CategoryId, CategoryOracle, CategorySet, Error, ExternalRecord, Result};
use serde::Deserialize;
use std::path::Path;

/// Deterministic oracle for offline use and tests.
///
/// JSON form:
///
/// ```json
/// {
///   "categories": [{ "id": 878, "name": "Science Fiction" }],
///   "titles": { "Alien": [27, 878] }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryOracle {
    categories: Vec<Category>,
    // title -> (record, categories); the record id is its title
    titles: AHashMap<String, (ExternalRecord, CategorySet)>,
}

#[derive(Deserialize)]
struct MemoryOracleFile {
    #[serde(default)]
    categories: Vec<Category>,
    #[serde(default)]
    titles: AHashMap<String, Vec<CategoryId>>,
}

impl MemoryOracle {
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            categories,
            titles: AHashMap::new(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: &str, categories: &[CategoryId]) -> Self {
        self.insert(title, categories);
        self
    }

    pub fn insert(&mut self, title: &str, categories: &[CategoryId]) {
        let record = ExternalRecord {
            id: title.to_string(),
            title: title.to_string(),
            poster_path: None,
        };
        self.titles
            .insert(title.to_string(), (record, categories.iter().copied().collect()));
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: MemoryOracleFile =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        let mut oracle = Self::new(file.categories);
        for (title, categories) in &file.titles {
            oracle.insert(title, categories);
        }
        Ok(oracle)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

impl CategoryOracle for MemoryOracle {
    fn resolve(&self, title: &str) -> Result<Option<ExternalRecord>> {
        Ok(self.titles.get(title).map(|(record, _)| record.clone()))
    }

    fn categories_of(&self, record_id: &str) -> Result<CategorySet> {
        Ok(self
            .titles
            .get(record_id)
            .map(|(_, categories)| categories.clone())
            .unwrap_or_default())
    }

    fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.clone())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
