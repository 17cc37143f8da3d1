//! Defines the error types shared by the decoders, encoders and the CLI.
//!
//! Every fatal failure is a single [`RtmlError`]. Low-level causes (number
//! parsing, URL syntax, angle or period grammar) are kept as the error
//! `source()` so the whole chain can be reported at the outer boundary.

use std::error::Error as StdError;
use thiserror::Error;

/// Boxed low-level cause carried by [`RtmlError::Value`].
pub type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum RtmlError {
    /// Wrong node kind, unexpected tag, or a mandated attribute/element is missing.
    #[error("Structure Error in {context}: {message} (node: {node})")]
    Structure {
        context: String,
        node: String,
        message: String,
    },

    /// A value failed to parse, or fell outside its vocabulary or range.
    #[error("Value Error in {context}: illegal {field} '{value}'")]
    Value {
        context: String,
        field: String,
        value: String,
        #[source]
        source: Option<BoxedCause>,
    },

    #[error("Configuration Error: {0}")]
    Configuration(String),

    #[error("Parse Error: {0}")]
    Parse(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("I/O Error: {1} - {0}")]
    Io(#[source] std::io::Error, String),

    #[error("Unsupported RTML version: {0}")]
    UnsupportedVersion(String),
}

impl RtmlError {
    pub fn structure(
        context: impl Into<String>,
        node: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RtmlError::Structure {
            context: context.into(),
            node: node.into(),
            message: message.into(),
        }
    }

    /// A value error without an underlying cause (vocabulary or range check).
    pub fn value(
        context: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        RtmlError::Value {
            context: context.into(),
            field: field.into(),
            value: value.into(),
            source: None,
        }
    }

    /// A value error chaining the low-level parse failure.
    pub fn value_caused_by<E>(
        context: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
        cause: E,
    ) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        RtmlError::Value {
            context: context.into(),
            field: field.into(),
            value: value.into(),
            source: Some(Box::new(cause)),
        }
    }

    pub fn is_structure(&self) -> bool {
        matches!(self, RtmlError::Structure { .. })
    }

    pub fn is_value(&self) -> bool {
        matches!(self, RtmlError::Value { .. })
    }

    /// Renders the message followed by every nested cause, one per line.
    pub fn chain_message(&self) -> String {
        let mut out = self.to_string();
        let mut source = StdError::source(self);
        while let Some(s) = source {
            out.push_str("\n  Caused by: ");
            out.push_str(&s.to_string());
            source = s.source();
        }
        out
    }
}

impl From<std::io::Error> for RtmlError {
    fn from(err: std::io::Error) -> Self {
        RtmlError::Io(err, "IO operation failed".to_string())
    }
}
