use reelsim_core::{
    build_similarity, Catalog, CatalogRecord, CountVectorizer, Error, Metric, Result,
    SimilarityMatrix, SimilarityStore, VectorizerConfig,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::catalog::{load_catalog, CatalogOptions};
use crate::model::{catalog_fingerprint, load_model, save_model, ModelHeader};

/// Output of the offline pipeline, before persistence
#[derive(Debug, Clone)]
pub struct BuiltModel {
    pub header: ModelHeader,
    pub matrix: SimilarityMatrix,
    pub empty_descriptions: usize,
}

/// Summary of a completed build
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub items: usize,
    pub vocabulary_size: usize,
    pub empty_descriptions: usize,
    pub metric: Metric,
    pub model_path: PathBuf,
    pub bytes: u64,
    pub elapsed: Duration,
}

/// Vectorize the catalog descriptions and compute the similarity matrix
pub fn build_model(records: &[CatalogRecord], config: &VectorizerConfig, metric: Metric) -> Result<BuiltModel> {
    if records.is_empty() {
        return Err(Error::ModelBuild("catalog is empty".to_string()));
    }
    config.validate()?;

    let descriptions: Vec<&str> = records.iter().map(CatalogRecord::description_text).collect();
    let vectorizer = CountVectorizer::new(config.clone());
    let (fitted, vectors) = vectorizer.fit_transform(&descriptions);
    let empty_descriptions = vectors.iter().filter(|v| v.is_empty()).count();

    let matrix = build_similarity(&vectors, metric)?;
    let catalog = Catalog::from_records(records);
    let header = ModelHeader::new(&catalog, metric, fitted.len());

    Ok(BuiltModel {
        header,
        matrix,
        empty_descriptions,
    })
}

/// Pair a loaded catalog with a loaded model, refusing mismatches
pub fn open_store(
    catalog: Catalog,
    header: &ModelHeader,
    matrix: SimilarityMatrix,
    verify_fingerprint: bool,
) -> Result<SimilarityStore> {
    if header.n != catalog.len() as u64 {
        return Err(Error::ModelMismatch {
            expected: catalog.len(),
            actual: header.n as usize,
        });
    }
    if verify_fingerprint {
        let actual = catalog_fingerprint(&catalog);
        if actual != header.catalog_fingerprint {
            return Err(Error::FingerprintMismatch(format!(
                "model built for catalog {}, loaded catalog is {}",
                short(&header.catalog_fingerprint),
                short(&actual)
            )));
        }
    }
    SimilarityStore::new(catalog, matrix)
}

fn short(fingerprint: &str) -> &str {
    &fingerprint[..fingerprint.len().min(12)]
}

/// Owns the catalog and model locations for one dataset revision
#[derive(Debug, Clone)]
pub struct ModelManager {
    catalog_path: PathBuf,
    model_path: PathBuf,
    description_column: String,
    verify_fingerprint: bool,
}

impl ModelManager {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(catalog_path: P, model_path: Q) -> Self {
        Self {
            catalog_path: catalog_path.as_ref().to_path_buf(),
            model_path: model_path.as_ref().to_path_buf(),
            description_column: crate::catalog::DEFAULT_DESCRIPTION_COLUMN.to_string(),
            verify_fingerprint: true,
        }
    }

    #[must_use]
    pub fn with_description_column(mut self, column: impl Into<String>) -> Self {
        self.description_column = column.into();
        self
    }

    /// Only compare item counts when opening
    #[must_use]
    pub fn skip_fingerprint_check(mut self) -> Self {
        self.verify_fingerprint = false;
        self
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Run the offline build and persist its result
    pub fn build(&self, config: &VectorizerConfig, metric: Metric) -> Result<BuildReport> {
        let started = Instant::now();
        let records = load_catalog(&self.catalog_path, &CatalogOptions::for_build(&self.description_column))?;
        let built = build_model(&records, config, metric)?;
        let bytes = save_model(&self.model_path, &built.header, &built.matrix)?;

        let report = BuildReport {
            items: records.len(),
            vocabulary_size: built.header.vocabulary_size as usize,
            empty_descriptions: built.empty_descriptions,
            metric,
            model_path: self.model_path.clone(),
            bytes,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            items = report.items,
            vocabulary = report.vocabulary_size,
            empty_descriptions = report.empty_descriptions,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Model build complete"
        );
        Ok(report)
    }

    /// Load catalog and model into a validated, immutable store
    pub fn open(&self) -> Result<SimilarityStore> {
        let options = CatalogOptions {
            description_column: self.description_column.clone(),
            ..Default::default()
        };
        let records = load_catalog(&self.catalog_path, &options)?;
        let catalog = Catalog::from_records(&records);
        let (header, matrix) = load_model(&self.model_path)?;
        open_store(catalog, &header, matrix, self.verify_fingerprint)
    }

    pub fn inspect(&self) -> Result<ModelHeader> {
        load_model(&self.model_path).map(|(header, _)| header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_catalog(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("dataset.csv");
        std::fs::write(&path, body).unwrap();
        path
    }

    const DATASET: &str = "id,title,overview\n\
        1,Alien,crew of a space freighter hunted by a creature\n\
        2,Aliens,marines fight the creature in space\n\
        3,Up,old man flies his house with balloons\n\
        4,Silent,\n";

    #[test]
    fn test_build_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = write_catalog(dir.path(), DATASET);
        let manager = ModelManager::new(&catalog, dir.path().join("similarity.bin"));

        let report = manager.build(&VectorizerConfig::default(), Metric::Cosine).unwrap();
        assert_eq!(report.items, 4);
        assert_eq!(report.empty_descriptions, 1);
        assert!(report.bytes > 0);

        let store = manager.open().unwrap();
        assert_eq!(store.len(), 4);
        assert!(store.similarity(0, 1) > 0.0);
        assert_eq!(store.similarity(0, 2), 0.0);
        assert_eq!(store.similarity(3, 0), 0.0);
        assert_eq!(manager.inspect().unwrap().n, 4);
    }

    #[test]
    fn test_empty_catalog_build_fails() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = write_catalog(dir.path(), "id,title,overview\n");
        let manager = ModelManager::new(&catalog, dir.path().join("similarity.bin"));
        let err = manager.build(&VectorizerConfig::default(), Metric::Cosine).unwrap_err();
        assert!(matches!(err, Error::ModelBuild(_)));
        assert!(!manager.model_path().exists());
    }

    #[test]
    fn test_open_with_grown_catalog_is_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = write_catalog(dir.path(), DATASET);
        let manager = ModelManager::new(&catalog, dir.path().join("similarity.bin"));
        manager.build(&VectorizerConfig::default(), Metric::Cosine).unwrap();

        write_catalog(dir.path(), &format!("{}5,Extra,new item\n", DATASET));
        let err = manager.open().unwrap_err();
        assert!(matches!(err, Error::ModelMismatch { expected: 5, actual: 4 }));
    }

    #[test]
    fn test_open_with_reordered_catalog_is_fingerprint_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = write_catalog(dir.path(), DATASET);
        let manager = ModelManager::new(&catalog, dir.path().join("similarity.bin"));
        manager.build(&VectorizerConfig::default(), Metric::Cosine).unwrap();

        write_catalog(
            dir.path(),
            "id,title,overview\n2,Aliens,x\n1,Alien,x\n3,Up,x\n4,Silent,\n",
        );
        let err = manager.open().unwrap_err();
        assert!(err.is_mismatch());
        assert!(manager.clone().skip_fingerprint_check().open().is_ok());
    }

    #[test]
    fn test_build_model_in_memory() {
        let records = vec![
            CatalogRecord::new("1", "a", Some("robot dream")),
            CatalogRecord::new("2", "b", Some("robot war")),
        ];
        let built = build_model(&records, &VectorizerConfig::default(), Metric::Jaccard).unwrap();
        assert_eq!(built.header.vocabulary_size, 3);
        assert!((built.matrix.get(0, 1) - 1.0 / 3.0).abs() < 1e-6);
        assert!(matches!(
            build_model(&[], &VectorizerConfig::default(), Metric::Cosine),
            Err(Error::ModelBuild(_))
        ));
    }
}
