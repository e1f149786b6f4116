//! Feature table construction: metadata rows joined with extraction results.

use std::iter::repeat_n;
use std::path::Path;

use tracing::{info, warn};

use super::DatasetError;
use super::csv::{MetadataTable, format_f32, write_csv};
use crate::analysis::{
    ExtractionConfig, FEATURE_COLUMNS, FEATURE_LEN, FeatureVector, extract_feature_vector,
};

/// Row counts of one table build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub total_rows: usize,
    pub failed_rows: usize,
}

/// Pairs every metadata row with its extraction result.
///
/// Extraction runs lazily as the iterator advances, so callers can
/// stream arbitrarily large tables. Rows without a usable `file_path`
/// cell yield an error result instead of being dropped.
pub fn extraction_rows<'a>(
    table: &'a MetadataTable,
    config: &'a ExtractionConfig,
) -> impl Iterator<Item = (&'a [String], Result<FeatureVector, String>)> {
    table.rows.iter().map(move |row| {
        let result = match table.path_cell(row) {
            Some(path) => extract_feature_vector(Path::new(path), config),
            None => Err("Metadata row has no file_path cell".to_string()),
        };
        (row.as_slice(), result)
    })
}

/// Extracts features for every row of `table` and writes the joined
/// table to `output`.
///
/// Failed rows keep their metadata cells and get empty feature cells,
/// so the output always has one line per input row.
pub fn write_feature_table(
    table: &MetadataTable,
    output: &Path,
    config: &ExtractionConfig,
) -> Result<BuildSummary, DatasetError> {
    let mut columns = table.columns.clone();
    columns.extend(FEATURE_COLUMNS.iter().map(|&c| c.to_string()));

    let mut total = 0usize;
    let mut failed = 0usize;
    let mut first_errors: Vec<String> = Vec::new();
    let rows = extraction_rows(table, config).map(|(row, result)| {
        total += 1;
        let mut cells = row.to_vec();
        cells.resize(table.columns.len(), String::new());
        match result {
            Ok(vector) => cells.extend(vector.values().iter().map(|&v| format_f32(v))),
            Err(err) => {
                failed += 1;
                if first_errors.len() < 3 {
                    first_errors.push(err);
                }
                cells.extend(repeat_n(String::new(), FEATURE_LEN));
            }
        }
        cells
    });
    write_csv(output, &columns, rows)?;

    if failed > 0 {
        warn!("Feature extraction failed for {failed} of {total} clips; first errors: {first_errors:?}");
    }
    info!(
        "Feature table written to {} ({} rows, {} failed)",
        output.display(),
        total,
        failed
    );
    Ok(BuildSummary {
        total_rows: total,
        failed_rows: failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn failed_rows_keep_metadata_and_get_empty_feature_cells() {
        let dir = tempfile::tempdir().unwrap();
        let garbage = dir.path().join("1001_IEO_HAP_HI.wav");
        std::fs::write(&garbage, b"definitely not audio").unwrap();

        let metadata_path = dir.path().join("meta.csv");
        std::fs::write(
            &metadata_path,
            format!(
                "actor_id,emotion_id,file_path\n1001,HAP,{}\n1002,SAD,\n",
                garbage.display()
            ),
        )
        .unwrap();
        let table = MetadataTable::read(&metadata_path).unwrap();

        let output = dir.path().join("features.csv");
        let summary =
            write_feature_table(&table, &output, &ExtractionConfig::default()).unwrap();
        assert_eq!(summary.total_rows, 2);
        assert_eq!(summary.failed_rows, 2);

        let lines = read_lines(&output);
        assert_eq!(lines.len(), 3);
        let header: Vec<&str> = lines[0].split(',').collect();
        assert_eq!(header.len(), 3 + FEATURE_LEN);
        assert_eq!(header[3], "mfcc_1");
        assert_eq!(*header.last().unwrap(), "f3");

        let first_row: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(first_row.len(), 3 + FEATURE_LEN);
        assert_eq!(first_row[0], "1001");
        assert_eq!(first_row[1], "HAP");
        assert!(first_row[3..].iter().all(|cell| cell.is_empty()));
    }

    #[test]
    fn extraction_rows_reports_missing_paths_without_dropping_rows() {
        let dir = tempfile::tempdir().unwrap();
        let metadata_path = dir.path().join("meta.csv");
        std::fs::write(&metadata_path, "actor_id,file_path\n1001,\n").unwrap();
        let table = MetadataTable::read(&metadata_path).unwrap();

        let config = ExtractionConfig::default();
        let pairs: Vec<_> = extraction_rows(&table, &config).collect();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0[0], "1001");
        assert!(pairs[0].1.as_ref().unwrap_err().contains("file_path"));
    }
}
