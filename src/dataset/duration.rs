//! Appending measured clip durations to a metadata table.

use std::path::Path;

use tracing::{info, warn};

use super::DatasetError;
use super::builder::BuildSummary;
use super::csv::{MetadataTable, format_f64, write_csv};
use crate::analysis::audio::clip_duration_seconds;

pub const DURATION_COLUMN: &str = "duration";

/// Reads the table at `input`, measures every clip, and writes the same
/// table with a `duration` column appended to `output`.
///
/// Durations are measured at `sample_rate` so they match what the
/// extraction pipeline sees. Rows whose clip cannot be decoded get an
/// empty cell. `input` and `output` may be the same path; the input is
/// fully read before the output is created.
pub fn append_durations(
    input: &Path,
    output: &Path,
    sample_rate: u32,
) -> Result<BuildSummary, DatasetError> {
    let table = MetadataTable::read(input)?;
    let mut columns = table.columns.clone();
    columns.push(DURATION_COLUMN.to_string());

    let mut failed = 0usize;
    let mut rows = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let mut cells = row.clone();
        cells.resize(table.columns.len(), String::new());
        let measured = match table.path_cell(row) {
            Some(path) => match clip_duration_seconds(Path::new(path), sample_rate) {
                Ok(seconds) => Some(seconds),
                Err(err) => {
                    warn!("Duration measurement failed: {err}");
                    None
                }
            },
            None => {
                warn!("Metadata row has no file_path cell; leaving duration empty");
                None
            }
        };
        match measured {
            Some(seconds) => cells.push(format_f64(seconds)),
            None => {
                failed += 1;
                cells.push(String::new());
            }
        }
        rows.push(cells);
    }
    write_csv(output, &columns, rows)?;

    info!(
        "Durations written to {} ({} rows, {} failed)",
        output.display(),
        table.rows.len(),
        failed
    );
    Ok(BuildSummary {
        total_rows: table.rows.len(),
        failed_rows: failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tone_wav(path: &Path, seconds: f32, sample_rate: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let len = (seconds * sample_rate as f32) as usize;
        for i in 0..len {
            let t = i as f32 / sample_rate as f32;
            writer
                .write_sample(0.4 * (2.0 * std::f32::consts::PI * 440.0 * t).sin())
                .unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn appends_duration_column() {
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("1001_IEO_HAP_HI.wav");
        write_tone_wav(&clip, 0.5, 16_000);
        let broken = dir.path().join("1002_IEO_SAD_LO.wav");
        std::fs::write(&broken, b"nope").unwrap();

        let input = dir.path().join("meta.csv");
        std::fs::write(
            &input,
            format!(
                "actor_id,file_path\n1001,{}\n1002,{}\n",
                clip.display(),
                broken.display()
            ),
        )
        .unwrap();

        let output = dir.path().join("with_durations.csv");
        let summary = append_durations(&input, &output, 16_000).unwrap();
        assert_eq!(summary.total_rows, 2);
        assert_eq!(summary.failed_rows, 1);

        let text = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "actor_id,file_path,duration");
        let good: Vec<&str> = lines[1].split(',').collect();
        let seconds: f64 = good[2].parse().unwrap();
        assert!((seconds - 0.5).abs() < 1e-3, "duration {seconds}");
        let bad: Vec<&str> = lines[2].split(',').collect();
        assert_eq!(bad[2], "");
    }

    #[test]
    fn overwrites_input_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("1001_IEO_HAP_HI.wav");
        write_tone_wav(&clip, 0.25, 16_000);
        let table_path = dir.path().join("meta.csv");
        std::fs::write(
            &table_path,
            format!("actor_id,file_path\n1001,{}\n", clip.display()),
        )
        .unwrap();

        append_durations(&table_path, &table_path, 16_000).unwrap();
        let text = std::fs::read_to_string(&table_path).unwrap();
        assert!(text.lines().next().unwrap().ends_with(",duration"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn rejects_missing_input_table() {
        let err = append_durations(Path::new("/no/meta.csv"), Path::new("/tmp/out.csv"), 16_000)
            .unwrap_err();
        assert!(matches!(err, DatasetError::ReadFile { .. }));
    }
}
