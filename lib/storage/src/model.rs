//! Persisted similarity model
//!
//! On disk the model is a single bincode document: a [`ModelHeader`] followed
//! by the `n * n` row-major `f32` matrix. Files are replaced atomically, so a
//! failed or interrupted build leaves any previous model intact.

use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, Utc};
use reelsim_core::{Catalog, Error, Metric, Result, SimilarityMatrix};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub const MODEL_MAGIC: [u8; 4] = *b"RSIM";
pub const MODEL_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelHeader {
    pub magic: [u8; 4],
    pub version: u32,
    /// Item count; the matrix is `n x n`
    pub n: u64,
    pub metric: Metric,
    pub vocabulary_size: u64,
    /// SHA-256 over the catalog ids and titles in order
    pub catalog_fingerprint: String,
    pub created_at: DateTime<Utc>,
}

impl ModelHeader {
    pub fn new(catalog: &Catalog, metric: Metric, vocabulary_size: usize) -> Self {
        Self {
            magic: MODEL_MAGIC,
            version: MODEL_VERSION,
            n: catalog.len() as u64,
            metric,
            vocabulary_size: vocabulary_size as u64,
            catalog_fingerprint: catalog_fingerprint(catalog),
            created_at: Utc::now(),
        }
    }
}

#[derive(Serialize)]
struct ModelFileRef<'a> {
    header: &'a ModelHeader,
    data: &'a [f32],
}

#[derive(Deserialize)]
struct ModelFile {
    header: ModelHeader,
    data: Vec<f32>,
}

/// Hex SHA-256 of the catalog's `(id, title)` sequence
pub fn catalog_fingerprint(catalog: &Catalog) -> String {
    let mut hasher = Sha256::new();
    for item in catalog.iter() {
        hasher.update(item.id.as_bytes());
        hasher.update([0x1f]);
        hasher.update(item.title.as_bytes());
        hasher.update([0x1e]);
    }
    format!("{:x}", hasher.finalize())
}

/// Write the model atomically; returns the file size in bytes
pub fn save_model<P: AsRef<Path>>(path: P, header: &ModelHeader, matrix: &SimilarityMatrix) -> Result<u64> {
    let path = path.as_ref();
    if header.n != matrix.n() as u64 {
        return Err(Error::Persistence(format!(
            "header claims {} items but matrix has {}",
            header.n,
            matrix.n()
        )));
    }

    let file = ModelFileRef {
        header,
        data: matrix.as_slice(),
    };

    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| {
            let mut writer = BufWriter::new(f);
            bincode::serialize_into(&mut writer, &file)?;
            writer.flush()?;
            Ok::<(), bincode::Error>(())
        })
        .map_err(|e| Error::Persistence(format!("cannot write model {}: {}", path.display(), e)))?;

    let size = std::fs::metadata(path)?.len();
    tracing::info!(path = %path.display(), items = header.n, bytes = size, "Saved similarity model");
    Ok(size)
}

/// Read and validate a model file
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<(ModelHeader, SimilarityMatrix)> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| Error::Persistence(format!("cannot open model {}: {}", path.display(), e)))?;

    let model: ModelFile = bincode::deserialize_from(BufReader::new(file))
        .map_err(|e| Error::Serialization(format!("model {}: {}", path.display(), e)))?;

    let header = model.header;
    if header.magic != MODEL_MAGIC {
        return Err(Error::Persistence(format!("{} is not a similarity model", path.display())));
    }
    if header.version != MODEL_VERSION {
        return Err(Error::Persistence(format!(
            "unsupported model version {} (expected {})",
            header.version, MODEL_VERSION
        )));
    }

    let n = usize::try_from(header.n)
        .map_err(|_| Error::Persistence(format!("model size {} does not fit in memory", header.n)))?;
    let matrix = SimilarityMatrix::from_raw(n, model.data)?;

    tracing::info!(
        path = %path.display(),
        items = n,
        metric = %header.metric,
        created_at = %header.created_at,
        "Loaded similarity model"
    );
    Ok((header, matrix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelsim_core::CatalogRecord;

    fn catalog(titles: &[&str]) -> Catalog {
        let records: Vec<CatalogRecord> = titles
            .iter()
            .enumerate()
            .map(|(i, t)| CatalogRecord::new(i.to_string(), *t, None))
            .collect();
        Catalog::from_records(&records)
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity.bin");
        let cat = catalog(&["a", "b"]);
        let matrix = SimilarityMatrix::from_rows(vec![vec![1.0, 0.25], vec![0.25, 1.0]]).unwrap();
        let header = ModelHeader::new(&cat, Metric::Cosine, 12);

        let size = save_model(&path, &header, &matrix).unwrap();
        assert!(size > 16);

        let (loaded_header, loaded) = load_model(&path).unwrap();
        assert_eq!(loaded_header, header);
        assert_eq!(loaded, matrix);
    }

    #[test]
    fn test_fingerprint_depends_on_order() {
        let a = catalog_fingerprint(&catalog(&["x", "y"]));
        let b = catalog_fingerprint(&catalog(&["y", "x"]));
        assert_ne!(a, b);
        assert_eq!(a, catalog_fingerprint(&catalog(&["x", "y"])));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_garbage_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        std::fs::write(&path, b"definitely not a model").unwrap();
        assert!(load_model(&path).is_err());
    }

    #[test]
    fn test_header_matrix_disagreement() {
        let dir = tempfile::tempdir().unwrap();
        let cat = catalog(&["a"]);
        let matrix = SimilarityMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let header = ModelHeader::new(&cat, Metric::Cosine, 1);
        assert!(save_model(dir.path().join("m.bin"), &header, &matrix).is_err());
    }

    #[test]
    fn test_failed_save_keeps_previous_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity.bin");
        let cat = catalog(&["a"]);
        let matrix = SimilarityMatrix::from_rows(vec![vec![1.0]]).unwrap();
        save_model(&path, &ModelHeader::new(&cat, Metric::Cosine, 1), &matrix).unwrap();

        let bigger = SimilarityMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        assert!(save_model(&path, &ModelHeader::new(&cat, Metric::Cosine, 1), &bigger).is_err());

        let (header, loaded) = load_model(&path).unwrap();
        assert_eq!(header.n, 1);
        assert_eq!(loaded, matrix);
    }
}
