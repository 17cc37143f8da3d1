//! Builds an [`XmlDocument`] from XML text using the `quick-xml` event reader.
//!
//! Whitespace-only text between elements is dropped; any other text is kept
//! verbatim (no trimming), because some RTML payloads (cluster object lists,
//! FITS headers) are raw text blobs whose layout matters.

use super::{XmlDocument, XmlElement, XmlNode};
use crate::errors::RtmlError;
use log::debug;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::Read;

/// Parse a document from any reader.
pub fn parse_reader<R: Read>(mut reader: R) -> Result<XmlDocument, RtmlError> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .map_err(|e| RtmlError::Io(e, "Failed to read XML input".to_string()))?;
    parse_str(&content)
}

/// Parse a document from a string slice.
pub fn parse_str(xml: &str) -> Result<XmlDocument, RtmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut doctype: Option<String> = None;
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                stack.push(element_from_start(&e)?);
            }
            Ok(Event::Empty(e)) => {
                let element = element_from_start(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| RtmlError::Parse("Unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| RtmlError::Parse(format!("Invalid text content: {}", e)))?;
                if !text.trim().is_empty() {
                    if let Some(parent) = stack.last_mut() {
                        parent.append_child(XmlNode::Text(text.into_owned()));
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(parent) = stack.last_mut() {
                    parent.append_child(XmlNode::Text(String::from_utf8_lossy(&c).into_owned()));
                }
            }
            Ok(Event::Comment(c)) => {
                if let Some(parent) = stack.last_mut() {
                    parent.append_child(XmlNode::Comment(String::from_utf8_lossy(&c).into_owned()));
                }
            }
            Ok(Event::DocType(d)) => {
                doctype = Some(String::from_utf8_lossy(&d).trim().to_string());
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(RtmlError::Parse(format!(
                    "Failed to parse XML at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(RtmlError::Parse(format!(
            "Unexpected end of input inside {}",
            open.describe()
        )));
    }

    let root = root.ok_or_else(|| RtmlError::Parse("Document has no root element".to_string()))?;
    debug!("Parsed XML tree with root {}", root.describe());
    Ok(XmlDocument { doctype, root })
}

fn element_from_start(start: &BytesStart) -> Result<XmlElement, RtmlError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| {
            RtmlError::Parse(format!("Invalid attribute in <{}>: {}", element.name(), e))
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| RtmlError::Parse(format!("Invalid attribute value for '{}': {}", key, e)))?
            .into_owned();
        element.set_attribute(key, value);
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), RtmlError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.append_element(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(RtmlError::Parse(format!(
            "Multiple root elements: {}",
            element.describe()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::NodeKind;
    use std::io::Cursor;

    #[test]
    fn test_parse_nested_tree() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE RTML SYSTEM "http://www.estar.org.uk/documents/rtml2.2.dtd">
<RTML version="2.2" type="request">
  <!-- a comment -->
  <Project>agent &amp; test</Project>
  <Contact PI="true"><Name>Jane</Name></Contact>
</RTML>"#;
        let doc = parse_str(xml).unwrap();
        assert_eq!(doc.root.name(), "RTML");
        assert_eq!(doc.root.attribute("type"), Some("request"));
        assert_eq!(
            doc.doctype_system_id(),
            Some("http://www.estar.org.uk/documents/rtml2.2.dtd")
        );
        let kinds: Vec<NodeKind> = doc.root.children().iter().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Comment, NodeKind::Element, NodeKind::Element]
        );
        let project = doc.root.first_element("Project").unwrap();
        assert_eq!(project.last_text(), Some("agent & test"));
    }

    #[test]
    fn test_text_is_not_trimmed() {
        let xml = "<ObjectList type=\"cluster\">\n 1 2 3\n 4 5 6\n</ObjectList>";
        let doc = parse_str(xml).unwrap();
        assert_eq!(doc.root.last_text(), Some("\n 1 2 3\n 4 5 6\n"));
    }

    #[test]
    fn test_cdata_becomes_text() {
        let doc = parse_str("<FITSHeader><![CDATA[SIMPLE = T <x>]]></FITSHeader>").unwrap();
        assert_eq!(doc.root.last_text(), Some("SIMPLE = T <x>"));
    }

    #[test]
    fn test_mismatched_tags_fail() {
        let result = parse_str("<RTML><Target></RTML>");
        assert!(matches!(result, Err(RtmlError::Parse(_))));
    }

    #[test]
    fn test_unclosed_root_fails() {
        let result = parse_str("<RTML><Target/>");
        assert!(matches!(result, Err(RtmlError::Parse(_))));
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(parse_str("").is_err());
    }

    #[test]
    fn test_parse_reader() {
        let doc = parse_reader(Cursor::new(b"<RTML/>".to_vec())).unwrap();
        assert_eq!(doc.root.name(), "RTML");
        assert!(doc.root.children().is_empty());
    }
}
