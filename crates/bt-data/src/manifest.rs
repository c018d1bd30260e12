//! Dataset-directory manifest parsing: two accepted
//! schemas, strict v1 and a legacy per-symbol-parquet shape. Actually reading
//! the referenced Parquet files is out of scope for this crate (a general
//! on-disk Parquet reader is an external collaborator); this module only
//! resolves a manifest into the `(symbol, path)` pairs a `BarSource`
//! implementation would load.

use serde::Deserialize;
use std::path::Path;

use crate::errors::DataError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub symbol: String,
    pub path: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileEntry {
    Tagged { symbol: String, path: String },
    Bare(String),
}

#[derive(Debug, Deserialize)]
struct StrictV1 {
    version: u32,
    format: String,
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct Legacy {
    format: String,
    symbols: Vec<String>,
    path: String,
}

pub fn parse_manifest(yaml: &str) -> Result<Vec<ManifestEntry>, DataError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| DataError::ManifestParse(e.to_string()))?;

    if let Ok(strict) = serde_yaml::from_value::<StrictV1>(value.clone()) {
        if strict.version == 1 && strict.format == "parquet" {
            return Ok(strict
                .files
                .into_iter()
                .map(|f| match f {
                    FileEntry::Tagged { symbol, path } => ManifestEntry { symbol, path },
                    FileEntry::Bare(path) => {
                        let symbol = synthetic_symbol(&path);
                        ManifestEntry { symbol, path }
                    }
                })
                .collect());
        }
    }

    if let Ok(legacy) = serde_yaml::from_value::<Legacy>(value) {
        if legacy.format == "per_symbol_parquet" {
            return Ok(legacy
                .symbols
                .into_iter()
                .map(|symbol| {
                    let path = legacy.path.replace("{symbol}", &symbol);
                    ManifestEntry { symbol, path }
                })
                .collect());
        }
    }

    Err(DataError::ManifestSchemaUnknown)
}

/// Deterministic synthetic symbol for a bare-path file entry: the path's
/// file stem, uppercased.
fn synthetic_symbol(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_uppercase()
}
