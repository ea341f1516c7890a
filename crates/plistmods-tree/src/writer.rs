//! XML plist writer.
//!
//! Always emits the Apple DOCTYPE, whatever the source document declared.
//! Text that XML 1.0 cannot carry (C0 controls other than tab, newline and
//! carriage return, U+FFFE, U+FFFF) is rejected rather than written.

use crate::document::PlistDocument;
use crate::error::TreeError;
use crate::node::{Dict, PlistNode, Scalar};

/// Public identifier of the plist DTD.
pub const DOCTYPE_PUBLIC_ID: &str = "-//Apple//DTD PLIST 1.0//EN";

/// System identifier of the plist DTD.
pub const DOCTYPE_SYSTEM_ID: &str = "http://www.apple.com/DTDs/PropertyList-1.0.dtd";

/// Serialize a document to XML text.
pub fn write_document(doc: &PlistDocument) -> Result<String, TreeError> {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<!DOCTYPE plist PUBLIC \"{}\" \"{}\">\n",
        DOCTYPE_PUBLIC_ID, DOCTYPE_SYSTEM_ID
    ));
    xml.push_str(&format!("<plist version=\"{}\">\n", xml_escape_attr(&doc.version)?));
    write_node(&mut xml, &doc.root, 0)?;
    xml.push_str("</plist>\n");
    Ok(xml)
}

fn indent(xml: &mut String, depth: usize) {
    for _ in 0..depth {
        xml.push('\t');
    }
}

fn write_node(xml: &mut String, node: &PlistNode, depth: usize) -> Result<(), TreeError> {
    indent(xml, depth);
    match node {
        PlistNode::Dict(dict) => write_dict(xml, dict, depth)?,
        PlistNode::Array(items) => {
            if items.is_empty() {
                xml.push_str("<array/>\n");
                return Ok(());
            }
            xml.push_str("<array>\n");
            for item in items {
                write_node(xml, item, depth + 1)?;
            }
            indent(xml, depth);
            xml.push_str("</array>\n");
        }
        PlistNode::Scalar(scalar) => {
            write_scalar(xml, scalar)?;
            xml.push('\n');
        }
    }
    Ok(())
}

fn write_dict(xml: &mut String, dict: &Dict, depth: usize) -> Result<(), TreeError> {
    if dict.is_empty() {
        xml.push_str("<dict/>\n");
        return Ok(());
    }
    xml.push_str("<dict>\n");
    for (key, value) in dict.iter() {
        indent(xml, depth + 1);
        xml.push_str(&format!("<key>{}</key>\n", xml_escape(key)?));
        write_node(xml, value, depth + 1)?;
    }
    indent(xml, depth);
    xml.push_str("</dict>\n");
    Ok(())
}

fn write_scalar(xml: &mut String, scalar: &Scalar) -> Result<(), TreeError> {
    match scalar {
        Scalar::Bool(true) => xml.push_str("<true/>"),
        Scalar::Bool(false) => xml.push_str("<false/>"),
        Scalar::Void(kind) => xml.push_str(&format!("<{}/>", kind.element_name())),
        other => {
            let name = other.kind().as_str();
            let text = other.text().unwrap_or_default();
            xml.push_str(&format!("<{}>{}</{}>", name, xml_escape(text)?, name));
        }
    }
    Ok(())
}

/// XML-escape character data.
///
/// A carriage return is written as `&#13;` so that XML line-ending
/// normalization in other readers does not drop it.
fn xml_escape(s: &str) -> Result<String, TreeError> {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            '\t' | '\n' => out.push(ch),
            '\u{0}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => {
                return Err(TreeError::UnencodableCharacter {
                    code: ch as u32,
                    text: s.to_string(),
                })
            }
            _ => out.push(ch),
        }
    }
    Ok(out)
}

/// XML-escape an attribute value.
fn xml_escape_attr(s: &str) -> Result<String, TreeError> {
    Ok(xml_escape(s)?.replace('"', "&quot;"))
}
