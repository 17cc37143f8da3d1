//! Non-fatal findings reported alongside a decoded document.
//!
//! Decoders record unknown elements here instead of failing; the `validate`
//! command adds a few semantic checks on the decoded model and prints the
//! whole report.

use crate::date::TimeBound;
use crate::errors::RtmlError;
use crate::model::Document;
use colored::*;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Element path such as `RTML/Observation/Target`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            location: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            location: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// An element the decoder has no handler for.
    pub fn unknown_element(location: impl Into<String>, node: &str) -> Self {
        Self::warning(format!("Ignoring unknown element {}", node)).with_location(location)
    }

    /// A fatal decode error, with its cause chain folded into the message.
    pub fn from_error(err: &RtmlError) -> Self {
        Self::error(err.chain_message())
    }

    pub fn format_colored(&self) -> String {
        let mut output = String::new();

        let (icon, color_fn): (&str, fn(&str) -> ColoredString) = match self.severity {
            Severity::Error => ("✗", |s: &str| s.red().bold()),
            Severity::Warning => ("⚠", |s: &str| s.yellow().bold()),
            Severity::Info => ("ℹ", |s: &str| s.cyan().bold()),
        };
        output.push_str(&format!("{} ", color_fn(icon)));

        if let Some(ref location) = self.location {
            output.push_str(&format!("[{}] ", location.bright_blue()));
        }

        output.push_str(&self.message);
        output.push('\n');
        output
    }

    pub fn format_plain(&self) -> String {
        let severity_str = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        };

        let mut output = format!("[{}] ", severity_str);
        if let Some(ref location) = self.location {
            output.push_str(&format!("[{}] ", location));
        }
        output.push_str(&self.message);
        output.push('\n');
        output
    }
}

/// All findings for one input.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosticReport {
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl DiagnosticReport {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            diagnostics,
            file_path: None,
        }
    }

    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn render_colored(&self) -> String {
        let mut out = String::new();
        if let Some(ref path) = self.file_path {
            out.push_str(&format!("{} {}\n", "Validating:".bold(), path.bright_blue()));
        }
        for diagnostic in &self.diagnostics {
            out.push_str(&diagnostic.format_colored());
        }
        if self.diagnostics.is_empty() {
            out.push_str(&format!("{}\n", "✓ No issues found".green().bold()));
        } else {
            out.push_str(&format!("{} {}\n", "Summary:".bold(), self.summary()));
        }
        out
    }

    pub fn render_plain(&self) -> String {
        let mut out = String::new();
        if let Some(ref path) = self.file_path {
            out.push_str(&format!("Validating: {}\n", path));
        }
        for diagnostic in &self.diagnostics {
            out.push_str(&diagnostic.format_plain());
        }
        if self.diagnostics.is_empty() {
            out.push_str("No issues found\n");
        } else {
            out.push_str(&format!("Summary: {}\n", self.summary()));
        }
        out
    }

    fn summary(&self) -> String {
        format!(
            "{} errors, {} warnings, {} infos",
            self.count(Severity::Error),
            self.count(Severity::Warning),
            self.count(Severity::Info)
        )
    }
}

/// Semantic checks the model itself does not enforce.
pub fn lint_document(doc: &Document) -> Vec<Diagnostic> {
    let mut found = Vec::new();

    if doc.document_type().is_none() {
        found.push(Diagnostic::warning("Document has no type").with_location("RTML"));
    }
    if doc.is_error() && doc.error_string().is_none() {
        found.push(Diagnostic::info("Error document carries no error text").with_location("RTML"));
    }

    for (i, obs) in doc.observations().iter().enumerate() {
        let location = format!("RTML/Observation[{}]", i + 1);
        match &obs.target {
            None => found.push(Diagnostic::info("Observation has no target").with_location(&location)),
            Some(t) if t.ra.is_none() != t.dec.is_none() => found.push(
                Diagnostic::warning("Target has only one of RA and Dec").with_location(&location),
            ),
            Some(_) => {}
        }

        let Some(schedule) = &obs.schedule else {
            continue;
        };
        if let (Some(TimeBound::At(start)), Some(TimeBound::At(end))) =
            (&schedule.start_date, &schedule.end_date)
        {
            if end < start {
                found.push(
                    Diagnostic::error(format!(
                        "Schedule window ends ({}) before it starts ({})",
                        end, start
                    ))
                    .with_location(format!("{}/Schedule", location)),
                );
            }
        }
        if let Some(seeing) = &schedule.seeing_constraint {
            if seeing.minimum > seeing.maximum {
                found.push(
                    Diagnostic::error("Seeing minimum exceeds maximum")
                        .with_location(format!("{}/Schedule/SeeingConstraint", location)),
                );
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::parse_date;
    use crate::model::{DocumentType, Observation, Schedule, SeeingConstraint};

    #[test]
    fn test_diagnostic_creation() {
        let d = Diagnostic::unknown_element("RTML/Observation", "<Weather>");
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.location.as_deref(), Some("RTML/Observation"));
        assert!(d.message.contains("<Weather>"));
    }

    #[test]
    fn test_format_plain() {
        let d = Diagnostic::error("bad").with_location("RTML");
        assert_eq!(d.format_plain(), "[ERROR] [RTML] bad\n");
    }

    #[test]
    fn test_report_counts_and_render() {
        let mut report = DiagnosticReport::default().with_file("a.xml");
        assert!(report.render_plain().contains("No issues found"));
        report.push(Diagnostic::warning("w"));
        report.push(Diagnostic::error("e"));
        assert!(report.has_errors());
        let text = report.render_plain();
        assert!(text.starts_with("Validating: a.xml\n"));
        assert!(text.contains("Summary: 1 errors, 1 warnings, 0 infos"));
    }

    #[test]
    fn test_lint_flags_inverted_window() {
        let mut doc = Document::with_type(DocumentType::Request);
        let mut schedule = Schedule::new();
        schedule.start_date = Some(TimeBound::At(parse_date("2005-03-02T00:00:00Z").unwrap()));
        schedule.end_date = Some(TimeBound::At(parse_date("2005-03-01T00:00:00Z").unwrap()));
        schedule.seeing_constraint = Some(SeeingConstraint::new(3.0, 1.0));
        let mut obs = Observation::new();
        obs.schedule = Some(schedule);
        doc.add_observation(obs);

        let found = lint_document(&doc);
        let messages: Vec<_> = found.iter().map(|d| d.message.as_str()).collect();
        assert!(messages.contains(&"Observation has no target"));
        assert!(messages.iter().any(|m| m.starts_with("Schedule window ends")));
        assert!(messages.contains(&"Seeing minimum exceeds maximum"));
        assert!(DiagnosticReport::new(found).has_errors());
    }

    #[test]
    fn test_lint_clean_document() {
        let doc = Document::with_type(DocumentType::Request);
        assert!(lint_document(&doc).is_empty());
    }
}
