// Catalog CSV loading
use reelsim_core::{CatalogRecord, Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const DEFAULT_DESCRIPTION_COLUMN: &str = "overview";

/// How to read the catalog file
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    /// Column holding the free-text description
    pub description_column: String,
    /// Fail when the description column is absent (the model build needs it)
    pub require_description: bool,
    pub delimiter: u8,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            description_column: DEFAULT_DESCRIPTION_COLUMN.to_string(),
            require_description: false,
            delimiter: b',',
        }
    }
}

impl CatalogOptions {
    pub fn for_build(description_column: impl Into<String>) -> Self {
        Self {
            description_column: description_column.into(),
            require_description: true,
            ..Default::default()
        }
    }
}

/// Read a catalog file; row order defines item indices
pub fn load_catalog<P: AsRef<Path>>(path: P, options: &CatalogOptions) -> Result<Vec<CatalogRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        Error::ModelBuild(format!("cannot open catalog {}: {}", path.display(), e))
    })?;
    let records = read_catalog(file, options)?;
    tracing::info!(path = %path.display(), items = records.len(), "Loaded catalog");
    Ok(records)
}

/// Parse catalog CSV with a header row containing at least `id` and `title`
pub fn read_catalog<R: Read>(reader: R, options: &CatalogOptions) -> Result<Vec<CatalogRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| Error::ModelBuild(format!("catalog header: {}", e)))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let id_col = column("id").ok_or_else(|| Error::ModelBuild("catalog has no 'id' column".to_string()))?;
    let title_col =
        column("title").ok_or_else(|| Error::ModelBuild("catalog has no 'title' column".to_string()))?;
    let desc_col = column(&options.description_column);
    if desc_col.is_none() {
        if options.require_description {
            return Err(Error::ModelBuild(format!(
                "catalog has no '{}' column",
                options.description_column
            )));
        }
        tracing::debug!(column = %options.description_column, "Catalog has no description column");
    }

    let mut records = Vec::new();
    for (row, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| Error::ModelBuild(format!("catalog row {}: {}", row + 1, e)))?;
        let field = |col: usize| record.get(col).unwrap_or("").to_string();

        let description = desc_col.map(field).filter(|d| !d.trim().is_empty());
        records.push(CatalogRecord {
            id: field(id_col),
            title: field(title_col),
            description,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "id,title,overview,genre\n\
        19995,Avatar,\"A marine, on an alien moon\",sf\n\
        285,Pirates,,adventure\n";

    #[test]
    fn test_read_catalog() {
        let records = read_catalog(CSV.as_bytes(), &CatalogOptions::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "19995");
        assert_eq!(records[0].description.as_deref(), Some("A marine, on an alien moon"));
        assert_eq!(records[1].description, None);
        assert_eq!(records[1].description_text(), "");
    }

    #[test]
    fn test_missing_description_column() {
        let csv = "id,title\n1,Up\n";
        let lenient = read_catalog(csv.as_bytes(), &CatalogOptions::default()).unwrap();
        assert_eq!(lenient[0].description, None);

        let err = read_catalog(csv.as_bytes(), &CatalogOptions::for_build("overview")).unwrap_err();
        assert!(matches!(err, Error::ModelBuild(_)));
    }

    #[test]
    fn test_missing_title_column() {
        let err = read_catalog("id,name\n1,Up\n".as_bytes(), &CatalogOptions::default()).unwrap_err();
        assert!(matches!(err, Error::ModelBuild(_)));
    }

    #[test]
    fn test_ragged_row_is_malformed() {
        let err = read_catalog("id,title\n1,Up,extra\n".as_bytes(), &CatalogOptions::default()).unwrap_err();
        assert!(matches!(err, Error::ModelBuild(_)));
    }

    #[test]
    fn test_custom_description_column() {
        let csv = "id,title,plot\n1,Up,balloons\n";
        let records = read_catalog(csv.as_bytes(), &CatalogOptions::for_build("plot")).unwrap();
        assert_eq!(records[0].description.as_deref(), Some("balloons"));
    }
}
