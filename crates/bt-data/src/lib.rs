mod csv_source;
mod errors;
mod feed;
mod htf;
mod manifest;
mod merge;
mod scope;
mod types;
mod validate;

pub use csv_source::{load_csv_file, parse_csv_bars};
pub use errors::DataError;
pub use feed::{DataFeed, FeedStep};
pub use htf::{HtfResampler, Timeframe, HTF_GAP_THRESHOLD_SECS};
pub use manifest::{parse_manifest, ManifestEntry};
pub use merge::{merge_by_timestamp, MergedStep};
pub use scope::{apply_scope, is_scope_reducing};
pub use types::{Bar, HtfBar, Side, PRICE_SCALE, QTY_SCALE};
pub use validate::{validate_bar, validate_sequence};

use std::collections::BTreeMap;

/// A restartable, resettable source of validated per-symbol bar sequences.
/// The CSV single-file adapter is the one concrete implementation this crate
/// carries; a dataset-manifest-backed Parquet source would implement this
/// same contract.
pub trait BarSource {
    fn load(&self) -> Result<BTreeMap<String, Vec<Bar>>, DataError>;
}

/// Loads an entire single CSV file as a `BarSource`.
pub struct CsvFileSource {
    pub path: std::path::PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BarSource for CsvFileSource {
    fn load(&self) -> Result<BTreeMap<String, Vec<Bar>>, DataError> {
        load_csv_file(&self.path)
    }
}
