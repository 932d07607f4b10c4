mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use pauta_core::error::ErrorKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pauta",
    version,
    about = "Turn legislative agenda PDFs into a styled spreadsheet or a plenary document"
)]
struct Cli {
    /// Log progress to stderr at debug level (-vv adds trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON configuration file (titles, date, stop marker)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Date stamped into titles and file names (default: today)
    #[arg(long, value_name = "DD/MM/YYYY", global = true)]
    date: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the agenda tables into a styled .xlsx workbook
    Spreadsheet {
        /// Path to the agenda PDF
        pdf_file: PathBuf,

        /// Save to FILE instead of asking
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Accept the suggested file name without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Lay out the numbered agenda items in a landscape .docx document
    Document {
        /// Path to the agenda PDF
        pdf_file: PathBuf,

        /// Save to FILE instead of asking
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Accept the suggested file name without asking
        #[arg(short, long)]
        yes: bool,

        /// Stop reading at the first page containing this text (default: AVISO)
        #[arg(long, value_name = "TEXT", conflicts_with = "no_stop_marker")]
        stop_marker: Option<String>,

        /// Read every page
        #[arg(long)]
        no_stop_marker: bool,
    },
    /// Run only the extraction stage and print what was found
    Extract {
        /// Path to the agenda PDF
        pdf_file: PathBuf,

        /// What to extract
        #[arg(short, long, value_enum)]
        mode: ExtractMode,

        /// Output format: text (default) or json
        #[arg(short, long, default_value = "text")]
        output: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExtractMode {
    Tables,
    Blocks,
}

/// Filter used when `RUST_LOG` is not set.
fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "pauta_core=debug,pauta=debug",
        _ => "pauta_core=trace,pauta=trace",
    }
}

fn init_logging(verbose: u8) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = commands::load_config(cli.config.as_deref(), cli.date.as_deref()).and_then(
        |mut config| match cli.command {
            Commands::Spreadsheet {
                pdf_file,
                output,
                yes,
            } => commands::render::spreadsheet(pdf_file, config, output, yes),
            Commands::Document {
                pdf_file,
                output,
                yes,
                stop_marker,
                no_stop_marker,
            } => {
                if no_stop_marker {
                    config.stop_marker = None;
                } else if let Some(marker) = stop_marker {
                    config.stop_marker = Some(marker).filter(|m| !m.is_empty());
                }
                commands::render::document(pdf_file, config, output, yes)
            }
            Commands::Extract {
                pdf_file,
                mode,
                output,
            } => match mode {
                ExtractMode::Tables => commands::extract::tables(&pdf_file, &output),
                ExtractMode::Blocks => commands::extract::blocks(&pdf_file, &config, &output),
            },
        },
    );

    match result {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UserCancelled => {
            eprintln!("{e}");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
