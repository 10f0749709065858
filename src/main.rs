use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{LevelFilter, Log, Metadata, Record};

use xlbridge::{ExtractorBuilder, InjectorBuilder, XlBridgeError};

#[derive(Parser)]
#[command(
    name = "xlbridge",
    version,
    about = "Extract translatable text from Excel workbooks and inject translations back."
)]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write cells, shapes and notes of a workbook to a translation file.
    Extract {
        /// Source workbook (.xlsx).
        #[arg(short, long)]
        input: PathBuf,

        /// Translation file to write.
        #[arg(short, long)]
        output: PathBuf,

        /// Sheet to extract (repeatable, default: all sheets).
        #[arg(short, long = "sheet")]
        sheets: Vec<String>,

        /// Skip text in shapes and text boxes.
        #[arg(long)]
        no_shapes: bool,

        /// Skip cell notes.
        #[arg(long)]
        no_notes: bool,

        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Write a translation file back into a copy of the workbook.
    Inject {
        /// Source workbook (.xlsx). Only read, never modified.
        #[arg(short, long)]
        input: PathBuf,

        /// Translation file.
        #[arg(short, long)]
        translation: PathBuf,

        /// Output workbook (default: <stem>_<lang>.xlsx next to the input).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Translation column to inject: en or vi (default: original text).
        #[arg(short, long)]
        lang: Option<String>,

        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Writes `LEVEL: message` lines to stderr.
struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("{}: {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), XlBridgeError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| XlBridgeError::Config(format!("Failed to serialize summary: {}", e)))?;
    println!("{}", json);
    Ok(())
}

fn run(command: Command) -> Result<(), XlBridgeError> {
    match command {
        Command::Extract {
            input,
            output,
            sheets,
            no_shapes,
            no_notes,
            json,
        } => {
            let extractor = ExtractorBuilder::new()
                .with_sheets(sheets)
                .include_shapes(!no_shapes)
                .include_notes(!no_notes)
                .build()?;
            let summary = extractor.extract(&input, &output)?;
            if json {
                print_json(&summary)?;
            }
        }
        Command::Inject {
            input,
            translation,
            output,
            lang,
            json,
        } => {
            let mut builder = InjectorBuilder::new();
            if let Some(lang) = lang {
                builder = builder.with_language(lang);
            }
            if let Some(output) = output {
                builder = builder.with_output(output);
            }
            let report = builder.build()?.inject(&input, &translation)?;
            if json {
                print_json(&report.summary)?;
            } else {
                println!("Output written to: {}", report.output.display());
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
