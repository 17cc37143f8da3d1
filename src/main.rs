//! Main binary entry point for the rtml-converter.

use clap::{Parser, Subcommand};
use rtml_converter::errors::RtmlError;
use rtml_converter::rtml_version::RtmlVersion;
use rtml_converter::{Command, Config};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Convert a document between RTML 2.2 and 3.1a
    Convert {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        #[arg(long, value_enum, help = "Output dialect")]
        to: RtmlVersion,

        #[arg(long, value_enum, help = "Input dialect (detected when omitted)")]
        from: Option<RtmlVersion>,

        #[arg(long, value_name = "URL", help = "Schema location written on 3.1a output")]
        schema_url: Option<String>,

        #[arg(long, help = "Document uid written on 3.1a output")]
        uid: Option<String>,
    },
    /// Print a summary of a document
    Inspect {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        #[arg(long, help = "Print the decoded document as JSON")]
        json: bool,

        #[arg(long, value_enum, help = "Input dialect (detected when omitted)")]
        from: Option<RtmlVersion>,
    },
    /// Decode a document and report structural and semantic problems
    Validate {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        #[arg(long, value_enum, help = "Input dialect (detected when omitted)")]
        from: Option<RtmlVersion>,

        #[arg(long, help = "Disable colored output")]
        plain: bool,
    },
}

fn setup_logging(verbose: bool) {
    let filter_level = if verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter(None, filter_level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run_app() -> Result<bool, RtmlError> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = match cli.command {
        CliCommand::Convert {
            input,
            output,
            to,
            from,
            schema_url,
            uid,
        } => Config {
            input_file: input,
            from,
            command: Command::Convert {
                output_file: output,
                to,
                schema_url,
                uid,
            },
        },
        CliCommand::Inspect { input, json, from } => Config {
            input_file: input,
            from,
            command: Command::Inspect { json },
        },
        CliCommand::Validate { input, from, plain } => Config {
            input_file: input,
            from,
            command: Command::Validate { plain },
        },
    };

    let report = rtml_converter::run(config)?;
    Ok(!report.has_errors())
}

fn main() -> ExitCode {
    match run_app() {
        Ok(true) => {
            log::info!("Completed successfully.");
            ExitCode::SUCCESS
        }
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("A fatal error occurred:");
            log::error!("{}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(s) = source {
                log::error!("  Caused by: {}", s);
                source = std::error::Error::source(s);
            }
            ExitCode::FAILURE
        }
    }
}
