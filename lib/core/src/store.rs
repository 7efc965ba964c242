use crate::item::{Catalog, Item};
use crate::matrix::SimilarityMatrix;
use crate::{Error, Result};

/// Immutable pairing of the catalog with its similarity matrix.
///
/// Construct once, wrap in an `Arc` and hand it to every
/// [`QueryEngine`](crate::QueryEngine); nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct SimilarityStore {
    catalog: Catalog,
    matrix: SimilarityMatrix,
}

impl SimilarityStore {
    pub fn new(catalog: Catalog, matrix: SimilarityMatrix) -> Result<Self> {
        if catalog.len() != matrix.n() {
            return Err(Error::ModelMismatch {
                expected: catalog.len(),
                actual: matrix.n(),
            });
        }
        Ok(Self { catalog, matrix })
    }

    #[inline]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[inline]
    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn item(&self, index: usize) -> Result<&Item> {
        self.catalog
            .get(index)
            .ok_or_else(|| Error::UnknownItem(format!("index {} (catalog has {} items)", index, self.len())))
    }

    /// Index of the first item titled `title`
    pub fn resolve_title(&self, title: &str) -> Result<usize> {
        self.catalog
            .find_by_title(title)
            .map(|item| item.index)
            .ok_or_else(|| Error::UnknownItem(format!("title '{}'", title)))
    }

    /// Index of the item whose catalog id is `id`
    pub fn resolve_id(&self, id: &str) -> Result<usize> {
        self.catalog
            .find_by_id(id)
            .map(|item| item.index)
            .ok_or_else(|| Error::UnknownItem(format!("id '{}'", id)))
    }

    #[inline]
    pub fn similarity(&self, i: usize, j: usize) -> f32 {
        self.matrix.get(i, j)
    }
}
