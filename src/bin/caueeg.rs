//! caueeg CLI - Command-line interface for the CAUEEG to BIDS conversion
//!
//! Commands:
//! - convert: Derive labels and splits, segment every recording (batch mode)
//! - labels: Derive and validate the participants table only
//! - segment: Segment a single event log

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use caueeg_bids::pipeline::{convert_dataset, prepare_subjects, ConversionReport};
use caueeg_bids::schema::parse_event_log;
use caueeg_bids::segmenter::{segment, Interval};
use caueeg_bids::{ConversionConfig, ConvertError, ParticipantTable, SplitDefinitions, VERSION};

/// caueeg - Convert the CAUEEG archive into a labeled BIDS dataset
#[derive(Parser)]
#[command(name = "caueeg")]
#[command(version = VERSION)]
#[command(about = "Label, split and segment the CAUEEG archive", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive labels and splits, then segment every recording
    Convert {
        #[command(flatten)]
        paths: PathArgs,

        /// Sampling frequency of the recordings in Hz
        #[arg(long)]
        sample_rate: Option<f64>,

        /// Write the conversion report as JSON to this file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Print the report as JSON instead of the summary
        #[arg(long)]
        json: bool,
    },

    /// Derive and validate the participants table without touching recordings
    Labels {
        #[command(flatten)]
        paths: PathArgs,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Segment one event log into labeled intervals
    Segment {
        /// Event log path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Sampling frequency of the recording in Hz
        #[arg(long, default_value = "200")]
        sample_rate: f64,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,
    },
}

#[derive(clap::Args)]
struct PathArgs {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root of the extracted CAUEEG archive
    #[arg(long)]
    source_dir: Option<PathBuf>,

    /// Directory for the converted output
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl PathArgs {
    fn load(&self) -> Result<ConversionConfig, CliFailure> {
        let mut config = match &self.config {
            Some(path) => ConversionConfig::from_json_file(path)?,
            None => ConversionConfig::default(),
        };
        if let Some(dir) = &self.source_dir {
            config.source_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        Ok(config)
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one interval per line)
    Ndjson,
    /// JSON array of intervals
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: Cli) -> Result<(), CliFailure> {
    match cli.command {
        Commands::Convert {
            paths,
            sample_rate,
            report,
            json,
        } => cmd_convert(&paths, sample_rate, report.as_deref(), json),

        Commands::Labels { paths, output } => cmd_labels(&paths, &output),

        Commands::Segment {
            input,
            sample_rate,
            output_format,
        } => cmd_segment(&input, sample_rate, &output_format),
    }
}

fn cmd_convert(
    paths: &PathArgs,
    sample_rate: Option<f64>,
    report_path: Option<&Path>,
    json: bool,
) -> Result<(), CliFailure> {
    let mut config = paths.load()?;
    if let Some(rate) = sample_rate {
        config.sample_rate = rate;
    }

    let report = match convert_dataset(&config) {
        Ok(report) => report,
        Err(ConvertError::ParticipantsWrite {
            path,
            message,
            report,
        }) => {
            println!("{}", report);
            return Err(ConvertError::ParticipantsWrite {
                path,
                message,
                report,
            }
            .into());
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(path) = report_path {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    check_complete(&report)
}

fn check_complete(report: &ConversionReport) -> Result<(), CliFailure> {
    if report.is_complete() {
        Ok(())
    } else {
        Err(CliFailure::Incomplete(report.errors.len()))
    }
}

fn cmd_labels(paths: &PathArgs, output: &Path) -> Result<(), CliFailure> {
    let config = paths.load()?;

    let mut table = ParticipantTable::from_path(&config.annotation_table_path())?;
    let definitions = SplitDefinitions::load(&config)?;
    prepare_subjects(&mut table.records, &definitions)?;

    if output.to_string_lossy() == "-" {
        print!("{}", table.to_tsv()?);
    } else {
        table.write_atomic(output)?;
        log::info!("Wrote {} participants to {}", table.len(), output.display());
    }

    Ok(())
}

fn cmd_segment(
    input: &Path,
    sample_rate: f64,
    output_format: &OutputFormat,
) -> Result<(), CliFailure> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let events = parse_event_log(&input_data)?;
    let segmentation = segment(&events, sample_rate)?;
    log::debug!(
        "{} intervals from {} events ({} dropped)",
        segmentation.len(),
        events.len(),
        segmentation.dropped
    );

    print!("{}", format_output(&segmentation.intervals, output_format)?);
    Ok(())
}

// Helper functions

fn format_output(intervals: &[Interval], format: &OutputFormat) -> Result<String, CliFailure> {
    match format {
        OutputFormat::Ndjson => {
            let mut out = String::new();
            for interval in intervals {
                out.push_str(&serde_json::to_string(interval)?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string(intervals)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(intervals)? + "\n"),
    }
}

// Error types

#[derive(Debug)]
enum CliFailure {
    Io(io::Error),
    Convert(ConvertError),
    Json(serde_json::Error),
    Incomplete(usize),
}

impl From<io::Error> for CliFailure {
    fn from(e: io::Error) -> Self {
        CliFailure::Io(e)
    }
}

impl From<ConvertError> for CliFailure {
    fn from(e: ConvertError) -> Self {
        CliFailure::Convert(e)
    }
}

impl From<serde_json::Error> for CliFailure {
    fn from(e: serde_json::Error) -> Self {
        CliFailure::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CliFailure> for CliError {
    fn from(e: CliFailure) -> Self {
        match e {
            CliFailure::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CliFailure::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CliFailure::Convert(e) if e.is_recording_scoped() => CliError {
                code: "RECORDING_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the event log and sample rate".to_string()),
            },
            CliFailure::Convert(e @ ConvertError::LabelConflict { .. })
            | CliFailure::Convert(e @ ConvertError::Consistency { .. })
            | CliFailure::Convert(e @ ConvertError::UnknownSubject { .. }) => CliError {
                code: "LABEL_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(
                    "The annotation table and split files disagree; fix the source data"
                        .to_string(),
                ),
            },
            CliFailure::Convert(e @ ConvertError::ParticipantsWrite { .. }) => CliError {
                code: "OUTPUT_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check that the output directory is writable".to_string()),
            },
            CliFailure::Convert(e @ ConvertError::Io(_))
            | CliFailure::Convert(e @ ConvertError::JsonError(_))
            | CliFailure::Convert(e @ ConvertError::ParseError(_)) => CliError {
                code: "INPUT_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the source directory and configuration paths".to_string()),
            },
            CliFailure::Convert(e) => CliError {
                code: "TABLE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check the annotation table header and cells".to_string()),
            },
            CliFailure::Incomplete(count) => CliError {
                code: "INCOMPLETE".to_string(),
                message: format!("{} recordings could not be converted", count),
                hint: Some("See the errors listed in the summary".to_string()),
            },
        }
    }
}
