use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use emovec::analysis::{self, ExtractionConfig, FormantSource};
use emovec::dataset;
use emovec::logging;

#[derive(Parser, Debug)]
#[command(name = "emovec")]
#[command(about = "Speech-emotion feature dataset builder")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a corpus directory and write the metadata table.
    Scan {
        /// Directory containing the labeled WAV clips.
        corpus_dir: PathBuf,
        /// Output metadata CSV.
        #[arg(short, long, default_value = "speech_dataset.csv")]
        output: PathBuf,
    },
    /// Extract a feature vector for every clip in a metadata table.
    Extract {
        /// Metadata CSV with a file_path column.
        metadata: PathBuf,
        /// Output feature CSV.
        #[arg(short, long, default_value = "processed_features.csv")]
        output: PathBuf,
        #[command(flatten)]
        tuning: Tuning,
    },
    /// Measure clip durations and append them as a table column.
    Durations {
        /// Metadata CSV with a file_path column.
        table: PathBuf,
        /// Output CSV; the input table is overwritten when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Working sample rate for duration measurement.
        #[arg(long, default_value_t = analysis::DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,
    },
    /// Decode, trim, normalize, and re-export one clip as 16-bit PCM WAV.
    Preprocess {
        /// Input audio file.
        input: PathBuf,
        /// Output WAV path.
        output: PathBuf,
        /// Working sample rate.
        #[arg(long, default_value_t = analysis::DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,
        /// Silence threshold in dB below the loudest frame.
        #[arg(long, default_value_t = analysis::DEFAULT_SILENCE_THRESHOLD_DB)]
        top_db: f32,
    },
}

/// Extraction knobs shared by feature commands.
#[derive(Args, Debug)]
struct Tuning {
    /// Working sample rate for decoding and analysis.
    #[arg(long, default_value_t = analysis::DEFAULT_SAMPLE_RATE)]
    sample_rate: u32,
    /// Silence threshold in dB below the loudest frame.
    #[arg(long, default_value_t = analysis::DEFAULT_SILENCE_THRESHOLD_DB)]
    top_db: f32,
    /// Signal variant the HNR and formant measures run on.
    #[arg(long, value_enum, default_value_t = FormantArg::Untrimmed)]
    formant_source: FormantArg,
    /// Number of evenly spaced formant sampling points per clip.
    #[arg(long, default_value_t = 100)]
    formant_samples: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormantArg {
    Untrimmed,
    Prepared,
}

impl From<FormantArg> for FormantSource {
    fn from(arg: FormantArg) -> Self {
        match arg {
            FormantArg::Untrimmed => FormantSource::Untrimmed,
            FormantArg::Prepared => FormantSource::Prepared,
        }
    }
}

impl Tuning {
    fn to_config(&self) -> ExtractionConfig {
        ExtractionConfig {
            sample_rate: self.sample_rate,
            silence_threshold_db: self.top_db,
            formant_sample_count: self.formant_samples,
            formant_source: self.formant_source.into(),
            ..ExtractionConfig::default()
        }
    }
}

fn main() -> ExitCode {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Scan { corpus_dir, output } => {
            let rows = dataset::scan_corpus(&corpus_dir)?;
            dataset::write_metadata_csv(&output, &rows)?;
            println!("Wrote {} rows to {}", rows.len(), output.display());
        }
        Command::Extract {
            metadata,
            output,
            tuning,
        } => {
            let table = dataset::MetadataTable::read(&metadata)?;
            let summary = dataset::write_feature_table(&table, &output, &tuning.to_config())?;
            println!(
                "Wrote {} rows to {} ({} failed)",
                summary.total_rows,
                output.display(),
                summary.failed_rows
            );
        }
        Command::Durations {
            table,
            output,
            sample_rate,
        } => {
            let destination = output.unwrap_or_else(|| table.clone());
            let summary = dataset::append_durations(&table, &destination, sample_rate)?;
            println!(
                "Wrote {} rows to {} ({} without duration)",
                summary.total_rows,
                destination.display(),
                summary.failed_rows
            );
        }
        Command::Preprocess {
            input,
            output,
            sample_rate,
            top_db,
        } => {
            let decoded = analysis::audio::load_signal(&input, sample_rate, top_db)?;
            analysis::audio::write_wav_pcm16(&output, &decoded.prepared)?;
            println!(
                "Wrote {} ({:.3}s)",
                output.display(),
                decoded.prepared.duration_seconds()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_extract_with_tuning_flags() {
        let cli = Cli::parse_from([
            "emovec",
            "extract",
            "meta.csv",
            "-o",
            "out.csv",
            "--sample-rate",
            "22050",
            "--top-db",
            "40",
            "--formant-source",
            "prepared",
            "--formant-samples",
            "50",
        ]);
        let Command::Extract {
            metadata,
            output,
            tuning,
        } = cli.command
        else {
            panic!("expected extract command");
        };
        assert_eq!(metadata, PathBuf::from("meta.csv"));
        assert_eq!(output, PathBuf::from("out.csv"));
        let config = tuning.to_config();
        assert_eq!(config.sample_rate, 22_050);
        assert_eq!(config.silence_threshold_db, 40.0);
        assert_eq!(config.formant_source, FormantSource::Prepared);
        assert_eq!(config.formant_sample_count, 50);
    }

    #[test]
    fn extract_defaults_match_pipeline_defaults() {
        let cli = Cli::parse_from(["emovec", "extract", "meta.csv"]);
        let Command::Extract { output, tuning, .. } = cli.command else {
            panic!("expected extract command");
        };
        assert_eq!(output, PathBuf::from("processed_features.csv"));
        let config = tuning.to_config();
        let defaults = ExtractionConfig::default();
        assert_eq!(config.sample_rate, defaults.sample_rate);
        assert_eq!(config.silence_threshold_db, defaults.silence_threshold_db);
        assert_eq!(config.formant_source, defaults.formant_source);
        assert_eq!(config.formant_sample_count, defaults.formant_sample_count);
    }

    #[test]
    fn scan_defaults_output_name() {
        let cli = Cli::parse_from(["emovec", "scan", "corpus"]);
        let Command::Scan { output, .. } = cli.command else {
            panic!("expected scan command");
        };
        assert_eq!(output, PathBuf::from("speech_dataset.csv"));
    }

    #[test]
    fn durations_overwrite_input_when_output_omitted() {
        let cli = Cli::parse_from(["emovec", "durations", "meta.csv"]);
        let Command::Durations {
            table,
            output,
            sample_rate,
        } = cli.command
        else {
            panic!("expected durations command");
        };
        assert_eq!(table, PathBuf::from("meta.csv"));
        assert!(output.is_none());
        assert_eq!(sample_rate, 16_000);
    }
}
