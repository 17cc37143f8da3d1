//! Main library for the RTML converter.
//!
//! This crate maps RTML 2.2 and 3.1a telescope scheduling documents to and
//! from a typed document model, and wraps the mapping in a small command line
//! tool that converts, inspects and validates files.

pub mod angle;
pub mod date;
pub mod diagnostics;
pub mod errors;
pub mod formats;
pub mod model;
pub mod rtml_version;
pub mod version_detection;
pub mod xml;

use diagnostics::{Diagnostic, DiagnosticReport, lint_document};
use errors::RtmlError;
use formats::{Decoded, EncoderOptions};
use log::{info, warn};
use model::{Document, RtmlUrl};
use rtml_version::RtmlVersion;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;
use version_detection::{DetectedDialect, detect_dialect, dialect_description};
use xml::XmlDocument;

/// What to do with the input document.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Decode the input and write it out in another (or the same) dialect.
    Convert {
        output_file: PathBuf,
        to: RtmlVersion,
        /// Schema location for 3.1a output.
        schema_url: Option<String>,
        /// Document uid for 3.1a output.
        uid: Option<String>,
    },
    /// Print a summary of the decoded document, or the document as JSON.
    Inspect { json: bool },
    /// Decode and lint the document, printing every finding.
    Validate { plain: bool },
}

/// Top-level configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input_file: PathBuf,
    /// Input dialect; detected from the document when absent.
    pub from: Option<RtmlVersion>,
    pub command: Command,
}

/// The main entry point for the command line logic.
///
/// Returns the findings collected along the way; a report with errors means
/// the run should be treated as failed.
pub fn run(config: Config) -> Result<DiagnosticReport, RtmlError> {
    let start_time = Instant::now();
    info!("Reading {}", config.input_file.display());

    let tree = read_tree(&config.input_file)?;
    let version = resolve_version(&tree, config.from, &config.input_file)?;
    let file = config.input_file.display().to_string();
    let Decoded {
        mut document,
        diagnostics,
    } = match (formats::decode(version, &tree), &config.command) {
        (Ok(decoded), _) => decoded,
        // validate reports a failed decode as a finding instead of aborting
        (Err(err), Command::Validate { plain }) => {
            let report = DiagnosticReport::new(vec![Diagnostic::from_error(&err)]).with_file(file);
            print_report(&report, *plain);
            return Ok(report);
        }
        (Err(err), _) => return Err(err),
    };
    let mut report = DiagnosticReport::new(diagnostics).with_file(file);

    match config.command {
        Command::Convert {
            output_file,
            to,
            schema_url,
            uid,
        } => {
            let mut options = EncoderOptions::default();
            if let Some(url) = schema_url {
                url.parse::<RtmlUrl>().map_err(|e| {
                    RtmlError::Configuration(format!("invalid schema URL '{}': {}", url, e))
                })?;
                options.schema_url = url;
            }
            if let Some(uid) = uid {
                document.uid = Some(uid);
            }
            if to == RtmlVersion::V3_1a {
                ensure_uid(&mut document);
            }
            info!("Converting RTML {} to RTML {}", version, to);
            write_tree(&output_file, &formats::encode(to, &document, &options), options.indent)?;
            info!("Wrote {}", output_file.display());
        }
        Command::Inspect { json } => {
            if json {
                let text = serde_json::to_string_pretty(&document).map_err(|e| {
                    RtmlError::Serialization(format!("Failed to render document as JSON: {}", e))
                })?;
                println!("{}", text);
            } else {
                print!("{}", summarize(&document, version));
            }
        }
        Command::Validate { plain } => {
            for diagnostic in lint_document(&document) {
                report.push(diagnostic);
            }
            print_report(&report, plain);
        }
    }

    info!("Total execution time: {:.2?}", start_time.elapsed());
    Ok(report)
}

fn print_report(report: &DiagnosticReport, plain: bool) {
    if plain {
        print!("{}", report.render_plain());
    } else {
        print!("{}", report.render_colored());
    }
}

fn read_tree(path: &Path) -> Result<XmlDocument, RtmlError> {
    let file = File::open(path)
        .map_err(|e| RtmlError::Io(e, format!("Failed to open {}", path.display())))?;
    xml::parse_reader(BufReader::new(file))
}

fn write_tree(path: &Path, tree: &XmlDocument, indent: usize) -> Result<(), RtmlError> {
    let file = File::create(path)
        .map_err(|e| RtmlError::Io(e, format!("Failed to create {}", path.display())))?;
    xml::write(BufWriter::new(file), tree, indent)
}

/// An explicit dialect wins; otherwise the root element decides.
fn resolve_version(
    tree: &XmlDocument,
    explicit: Option<RtmlVersion>,
    path: &Path,
) -> Result<RtmlVersion, RtmlError> {
    if let Some(version) = explicit {
        return Ok(version);
    }
    let dialect = detect_dialect(tree);
    info!("Detected {}", dialect_description(&dialect));
    match dialect {
        DetectedDialect::Known(version) => Ok(version),
        DetectedDialect::Unsupported(version) => Err(RtmlError::UnsupportedVersion(version)),
        DetectedDialect::Unknown => Err(RtmlError::UnsupportedVersion(format!(
            "could not identify the dialect of {}; use --from",
            path.display()
        ))),
    }
}

/// 3.1a roots carry a uid. Falls back to a fresh one when neither the
/// document nor its agent provides it.
fn ensure_uid(document: &mut Document) {
    let agent_id = document
        .intelligent_agent
        .as_ref()
        .and_then(|agent| agent.id.as_ref());
    if document.uid.is_none() && agent_id.is_none() {
        let uid = uuid::Uuid::new_v4().to_string();
        warn!("Document has no uid, generated {}", uid);
        document.uid = Some(uid);
    }
}

fn summarize(document: &Document, version: RtmlVersion) -> String {
    let mut out = format!("Dialect: RTML {}\n", version);
    out.push_str(&format!(
        "Type: {}\n",
        document
            .document_type()
            .map(|t| t.as_str())
            .unwrap_or("(none)")
    ));
    if let Some(uid) = &document.uid {
        out.push_str(&format!("Uid: {}\n", uid));
    }
    if let Some(error) = document.error_string() {
        out.push_str(&format!("Error: {}\n", error));
    }
    out.push_str(&format!("Observations: {}\n", document.observations().len()));
    for (i, observation) in document.observations().iter().enumerate() {
        let target = observation
            .target
            .as_ref()
            .and_then(|t| t.name.as_deref())
            .unwrap_or("(unnamed)");
        out.push_str(&format!(
            "  [{}] {} ({} image(s))\n",
            i + 1,
            target,
            observation.image_data().len()
        ));
    }
    if let Some(score) = document.score {
        out.push_str(&format!("Score: {}\n", score));
    }
    out
}
