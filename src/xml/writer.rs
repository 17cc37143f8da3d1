//! Renders an [`XmlDocument`] to text with the `quick-xml` writer.

use super::{XmlDocument, XmlElement, XmlNode};
use crate::errors::RtmlError;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::fmt::Display;
use std::io::Write;

/// Render a document to a `String`, indenting nested elements by `indent` spaces.
///
/// An indent of zero writes everything on one line.
pub fn to_string(doc: &XmlDocument, indent: usize) -> Result<String, RtmlError> {
    let mut buffer = Vec::new();
    write(&mut buffer, doc, indent)?;
    String::from_utf8(buffer).map_err(serialization)
}

/// Render a document into any writer.
pub fn write<W: Write>(writer: W, doc: &XmlDocument, indent: usize) -> Result<(), RtmlError> {
    let mut xml = if indent > 0 {
        Writer::new_with_indent(writer, b' ', indent)
    } else {
        Writer::new(writer)
    };

    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(serialization)?;

    if let Some(doctype) = &doc.doctype {
        xml.write_event(Event::DocType(BytesText::from_escaped(doctype.as_str())))
            .map_err(serialization)?;
    }

    write_element(&mut xml, &doc.root)?;

    let mut inner = xml.into_inner();
    inner
        .write_all(b"\n")
        .map_err(|e| RtmlError::Io(e, "Failed to write XML content".to_string()))?;
    inner
        .flush()
        .map_err(|e| RtmlError::Io(e, "Failed to flush XML output".to_string()))?;
    Ok(())
}

fn write_element<W: Write>(xml: &mut Writer<W>, element: &XmlElement) -> Result<(), RtmlError> {
    let mut start = BytesStart::new(element.name());
    for (key, value) in element.attributes() {
        start.push_attribute((key, value));
    }

    if element.children().is_empty() {
        return xml.write_event(Event::Empty(start)).map_err(serialization);
    }

    xml.write_event(Event::Start(start)).map_err(serialization)?;
    for child in element.children() {
        match child {
            XmlNode::Element(e) => write_element(xml, e)?,
            XmlNode::Text(t) => xml
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(serialization)?,
            XmlNode::Comment(c) => xml
                .write_event(Event::Comment(BytesText::from_escaped(c.as_str())))
                .map_err(serialization)?,
        }
    }
    xml.write_event(Event::End(BytesEnd::new(element.name())))
        .map_err(serialization)
}

fn serialization<E: Display>(e: E) -> RtmlError {
    RtmlError::Serialization(e.to_string())
}
