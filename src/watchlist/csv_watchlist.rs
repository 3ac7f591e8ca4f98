use std::fs::File;

use async_trait::async_trait;
use csv::ReaderBuilder;

use super::{extract_candidates, WatchlistError, WatchlistSource};
use crate::types::Candidate;

/// Candidates from a local CSV file (`SCREENER_CSV`), using the same
/// extraction rules as the screener tab. The file is read at call time.
pub struct CsvWatchlist {
    name: String,
    path: String,
}

impl CsvWatchlist {
    pub fn new(name: String, path: String) -> Self {
        Self { name, path }
    }
}

#[async_trait]
impl WatchlistSource for CsvWatchlist {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>, WatchlistError> {
        let file = File::open(&self.path).map_err(|err| {
            WatchlistError::SourceUnavailable(format!("failed to open {}: {err}", self.path))
        })?;
        // Header handling lives in extract_candidates, so the reader treats
        // every line as data
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);
        let mut values = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|err| WatchlistError::SourceUnavailable(err.to_string()))?;
            values.push(record.iter().map(str::to_string).collect());
        }
        Ok(extract_candidates(&values))
    }
}
