//! Tree-walk skeleton shared by the dialect decoders.
//!
//! A [`Dispatch`] table maps child tag names to handler functions for one
//! element type. Tables are built once when a decoder is constructed; the
//! walk itself checks the element's tag, routes each child to its handler,
//! and records unknown children as diagnostics in the [`Session`].

use crate::date::{TimeBound, parse_date};
use crate::diagnostics::Diagnostic;
use crate::errors::RtmlError;
use crate::model::{PeriodFormat, RtmlUrl};
use crate::xml::{XmlElement, XmlNode};
use chrono::{DateTime, FixedOffset};
use log::{debug, warn};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::str::FromStr;

/// Handles one child element of the element being walked.
pub type ElementHandler<D, T> =
    fn(&D, &XmlElement, &mut T, &mut Session) -> Result<(), RtmlError>;

/// Handles one text child. Called once per text node, so the last one wins.
pub type TextHandler<D, T> = fn(&D, &str, &mut T, &mut Session) -> Result<(), RtmlError>;

/// Per-decode state: the current element path and collected diagnostics.
#[derive(Debug, Default)]
pub struct Session {
    path: Vec<&'static str>,
    diagnostics: Vec<Diagnostic>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slash separated path of the elements currently being walked.
    pub fn path(&self) -> String {
        self.path.join("/")
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn report_unknown(&mut self, context: &str, element: &XmlElement) {
        let location = self.path();
        warn!(
            "{}: ignoring unknown element {} under {}",
            context,
            element.describe(),
            location
        );
        self.diagnostics
            .push(Diagnostic::unknown_element(location, &element.describe()));
    }

    fn enter(&mut self, tag: &'static str) {
        self.path.push(tag);
    }

    fn leave(&mut self) {
        self.path.pop();
    }
}

/// Lookup table from child tag to handler for one element type `T`, walked on
/// behalf of decoder `D`.
pub struct Dispatch<D, T> {
    context: &'static str,
    tag: &'static str,
    elements: HashMap<&'static str, ElementHandler<D, T>>,
    text: Option<TextHandler<D, T>>,
}

impl<D, T> Dispatch<D, T> {
    pub fn new(context: &'static str, tag: &'static str) -> Self {
        Self {
            context,
            tag,
            elements: HashMap::new(),
            text: None,
        }
    }

    /// Registers a child element handler. Registering a tag twice is a
    /// configuration error.
    pub fn element(
        mut self,
        tag: &'static str,
        handler: ElementHandler<D, T>,
    ) -> Result<Self, RtmlError> {
        if self.elements.insert(tag, handler).is_some() {
            return Err(RtmlError::Configuration(format!(
                "{}: duplicate handler for <{}> under <{}>",
                self.context, tag, self.tag
            )));
        }
        Ok(self)
    }

    pub fn text(mut self, handler: TextHandler<D, T>) -> Result<Self, RtmlError> {
        if self.text.replace(handler).is_some() {
            return Err(RtmlError::Configuration(format!(
                "{}: duplicate text handler for <{}>",
                self.context, self.tag
            )));
        }
        Ok(self)
    }

    /// Checks `element` is this table's tag, then dispatches every child in
    /// document order. Comments are skipped.
    pub fn walk(
        &self,
        decoder: &D,
        element: &XmlElement,
        target: &mut T,
        session: &mut Session,
    ) -> Result<(), RtmlError> {
        expect_tag(self.context, element, self.tag)?;
        session.enter(self.tag);
        debug!("{}: walking {}", self.context, session.path());

        for child in element.children() {
            match child {
                XmlNode::Element(e) => match self.elements.get(e.name()) {
                    Some(handler) => handler(decoder, e, target, session)?,
                    None => session.report_unknown(self.context, e),
                },
                XmlNode::Text(t) => {
                    if let Some(handler) = self.text {
                        handler(decoder, t, target, session)?;
                    }
                }
                XmlNode::Comment(_) => {}
            }
        }

        session.leave();
        Ok(())
    }
}

/// Requires `node` to be an element with the given tag.
pub fn expect_element<'a>(
    context: &str,
    node: &'a XmlNode,
    tag: &str,
) -> Result<&'a XmlElement, RtmlError> {
    match node {
        XmlNode::Element(e) => {
            expect_tag(context, e, tag)?;
            Ok(e)
        }
        other => Err(RtmlError::structure(
            context,
            other.describe(),
            format!("expected element <{}> but found {}", tag, other.kind()),
        )),
    }
}

pub fn expect_tag(context: &str, element: &XmlElement, tag: &str) -> Result<(), RtmlError> {
    if element.name() != tag {
        return Err(RtmlError::structure(
            context,
            element.describe(),
            format!("expected <{}>", tag),
        ));
    }
    Ok(())
}

/// Last text child of a leaf element. Nested elements are reported as unknown.
pub fn leaf_text<'a>(
    context: &str,
    element: &'a XmlElement,
    session: &mut Session,
) -> Option<&'a str> {
    let mut text = None;
    for child in element.children() {
        match child {
            XmlNode::Text(t) => text = Some(t.as_str()),
            XmlNode::Element(e) => session.report_unknown(context, e),
            XmlNode::Comment(_) => {}
        }
    }
    text
}

/// Like [`leaf_text`], but an element without text is a structure error.
pub fn required_leaf_text<'a>(
    context: &str,
    element: &'a XmlElement,
    session: &mut Session,
) -> Result<&'a str, RtmlError> {
    leaf_text(context, element, session).ok_or_else(|| {
        RtmlError::structure(context, element.describe(), "element has no text content")
    })
}

pub fn required_attribute<'a>(
    context: &str,
    element: &'a XmlElement,
    name: &str,
) -> Result<&'a str, RtmlError> {
    element.attribute(name).ok_or_else(|| {
        RtmlError::structure(
            context,
            element.describe(),
            format!("missing required attribute '{}'", name),
        )
    })
}

/// Parses a trimmed value, wrapping any failure as a value error with cause.
pub fn parse_value<T>(context: &str, field: &str, raw: &str) -> Result<T, RtmlError>
where
    T: FromStr,
    T::Err: StdError + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| RtmlError::value_caused_by(context, field, raw, e))
}

pub fn parse_attribute<T>(
    context: &str,
    element: &XmlElement,
    name: &str,
) -> Result<Option<T>, RtmlError>
where
    T: FromStr,
    T::Err: StdError + Send + Sync + 'static,
{
    element
        .attribute(name)
        .map(|raw| parse_value(context, name, raw))
        .transpose()
}

/// Attribute value as an owned string, when present.
pub fn string_attribute(element: &XmlElement, name: &str) -> Option<String> {
    element.attribute(name).map(str::to_string)
}

pub fn parse_f64(context: &str, field: &str, raw: &str) -> Result<f64, RtmlError> {
    parse_value(context, field, raw)
}

/// Integer node such as `<Count>`.
pub fn parse_count(context: &str, field: &str, raw: &str) -> Result<u32, RtmlError> {
    parse_value(context, field, raw)
}

/// Period node such as `<Interval>PT1H</Interval>`.
pub fn parse_period(context: &str, field: &str, raw: &str) -> Result<PeriodFormat, RtmlError> {
    parse_value(context, field, raw)
}

pub fn parse_time_bound(context: &str, field: &str, raw: &str) -> Result<TimeBound, RtmlError> {
    TimeBound::parse(raw).map_err(|e| RtmlError::value_caused_by(context, field, raw, e))
}

pub fn parse_instant(
    context: &str,
    field: &str,
    raw: &str,
) -> Result<DateTime<FixedOffset>, RtmlError> {
    parse_date(raw).map_err(|e| RtmlError::value_caused_by(context, field, raw, e))
}

pub fn parse_url(context: &str, field: &str, raw: &str) -> Result<RtmlUrl, RtmlError> {
    parse_value(context, field, raw)
}
