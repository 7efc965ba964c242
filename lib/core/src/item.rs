use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A raw catalog row as read from the dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CatalogRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.map(str::to_string),
        }
    }

    /// Description with a missing value normalised to the empty string
    #[inline]
    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// An item of the catalog; `index` is its row in the similarity matrix
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub index: usize,
    pub id: String,
    pub title: String,
}

/// Ordered, immutable item sequence
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<Item>,
    // title -> first index carrying it
    by_title: AHashMap<String, usize>,
}

impl Catalog {
    pub fn from_records(records: &[CatalogRecord]) -> Self {
        let items = records
            .iter()
            .enumerate()
            .map(|(index, r)| Item {
                index,
                id: r.id.clone(),
                title: r.title.clone(),
            })
            .collect();
        Self::from_items(items)
    }

    /// Items are re-indexed by position
    pub fn from_items(mut items: Vec<Item>) -> Self {
        let mut by_title = AHashMap::with_capacity(items.len());
        for (index, item) in items.iter_mut().enumerate() {
            item.index = index;
            by_title.entry(item.title.clone()).or_insert(index);
        }
        Self { items, by_title }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    /// First item whose title matches exactly
    pub fn find_by_title(&self, title: &str) -> Option<&Item> {
        self.by_title.get(title).map(|&idx| &self.items[idx])
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Case-insensitive substring search over titles, in catalog order
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Item> {
        let needle = query.trim().to_lowercase();
        self.items
            .iter()
            .filter(|item| item.title.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_records(&[
            CatalogRecord::new("19995", "Avatar", Some("marine on an alien moon")),
            CatalogRecord::new("285", "Pirates", None),
            CatalogRecord::new("9999", "Avatar", Some("remake")),
        ])
    }

    #[test]
    fn test_indices_follow_order() {
        let c = catalog();
        assert_eq!(c.len(), 3);
        assert_eq!(c.get(1).unwrap().id, "285");
        assert!(c.get(3).is_none());
    }

    #[test]
    fn test_duplicate_title_resolves_to_first() {
        let c = catalog();
        assert_eq!(c.find_by_title("Avatar").unwrap().index, 0);
        assert!(c.find_by_title("avatar").is_none());
        assert_eq!(c.find_by_id("9999").unwrap().index, 2);
    }

    #[test]
    fn test_search() {
        let c = catalog();
        let hits = c.search("AVA", 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(c.search("ava", 1).len(), 1);
    }

    #[test]
    fn test_missing_description_is_empty() {
        let r = CatalogRecord::new("1", "x", None);
        assert_eq!(r.description_text(), "");
    }
}
