//! XML plist reader.
//!
//! Parses the XML property list format into a [`PlistDocument`]. Only the
//! subset of XML that plist files use is understood: a prolog (declaration,
//! DOCTYPE, comments), elements without namespaces, attributes, character
//! data with the predefined entities and numeric references, and CDATA.

use crate::document::PlistDocument;
use crate::error::TreeError;
use crate::node::{Dict, PlistNode, Scalar, ScalarKind};

/// Parse XML plist text.
pub fn parse_document(src: &str) -> Result<PlistDocument, TreeError> {
    let mut reader = Reader::new(src);
    reader.document()
}

/// A parsed start tag.
struct StartTag {
    name: String,
    attributes: Vec<(String, String)>,
    self_closing: bool,
    offset: usize,
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(src: &'a str) -> Self {
        // Tolerate a UTF-8 byte order mark.
        let pos = if src.starts_with('\u{feff}') { 3 } else { 0 };
        Self { src, pos }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek_byte(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Advance past `terminator`, failing with `what` if it never appears.
    fn skip_past(&mut self, terminator: &str, what: &str) -> Result<(), TreeError> {
        match self.rest().find(terminator) {
            Some(idx) => {
                self.pos += idx + terminator.len();
                Ok(())
            }
            None => Err(TreeError::syntax(self.pos, format!("unterminated {}", what))),
        }
    }

    /// Skip whitespace, processing instructions, comments and DOCTYPE.
    fn skip_misc(&mut self) -> Result<(), TreeError> {
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("<?") {
                self.skip_past("?>", "processing instruction")?;
            } else if rest.starts_with("<!--") {
                self.skip_past("-->", "comment")?;
            } else if rest.starts_with("<!DOCTYPE") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_doctype(&mut self) -> Result<(), TreeError> {
        let start = self.pos;
        let mut in_subset = false;
        let mut quote: Option<u8> = None;
        while let Some(b) = self.peek_byte() {
            self.pos += 1;
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"') | (None, b'\'') => quote = Some(b),
                (None, b'[') => in_subset = true,
                (None, b']') => in_subset = false,
                (None, b'>') if !in_subset => return Ok(()),
                _ => {}
            }
        }
        Err(TreeError::syntax(start, "unterminated DOCTYPE"))
    }

    fn document(&mut self) -> Result<PlistDocument, TreeError> {
        self.skip_misc()?;
        if self.at_eof() {
            return Err(TreeError::MissingRoot);
        }

        let tag = self.start_tag()?;
        if tag.name != "plist" {
            return Err(TreeError::UnexpectedElement {
                name: tag.name,
                offset: tag.offset,
            });
        }
        if tag.self_closing {
            return Err(TreeError::InvalidPlist("<plist> element is empty".to_string()));
        }

        let version = tag
            .attributes
            .iter()
            .find(|(k, _)| k == "version")
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| "1.0".to_string());

        self.skip_misc()?;
        if self.rest().starts_with("</") {
            return Err(TreeError::InvalidPlist("<plist> element is empty".to_string()));
        }
        let root = self.node()?;
        self.skip_misc()?;
        self.end_tag("plist")?;
        self.skip_misc()?;

        if !self.at_eof() {
            return Err(TreeError::syntax(self.pos, "content after </plist>"));
        }

        Ok(PlistDocument { version, root })
    }

    fn name(&mut self) -> Result<String, TreeError> {
        let start = self.pos;
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_whitespace() || b == b'/' || b == b'>' || b == b'=' {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(TreeError::syntax(start, "expected a name"));
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn start_tag(&mut self) -> Result<StartTag, TreeError> {
        let offset = self.pos;
        if self.peek_byte() != Some(b'<') || self.rest().starts_with("</") {
            return Err(TreeError::syntax(offset, "expected a start tag"));
        }
        self.pos += 1;
        let name = self.name()?;
        let mut attributes = Vec::new();

        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok(StartTag {
                    name,
                    attributes,
                    self_closing: true,
                    offset,
                });
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return Ok(StartTag {
                    name,
                    attributes,
                    self_closing: false,
                    offset,
                });
            }
            if self.at_eof() {
                return Err(TreeError::syntax(offset, format!("unterminated <{}>", name)));
            }

            let attr_name = self.name()?;
            self.skip_whitespace();
            if self.peek_byte() != Some(b'=') {
                return Err(TreeError::syntax(self.pos, "expected '=' after attribute name"));
            }
            self.pos += 1;
            self.skip_whitespace();
            let quote = match self.peek_byte() {
                Some(q @ (b'"' | b'\'')) => q,
                _ => return Err(TreeError::syntax(self.pos, "expected quoted attribute value")),
            };
            self.pos += 1;
            let value_start = self.pos;
            let len = self.rest().find(quote as char).ok_or_else(|| {
                TreeError::syntax(value_start, "unterminated attribute value")
            })?;
            let raw = &self.src[value_start..value_start + len];
            self.pos += len + 1;
            attributes.push((attr_name, unescape(raw, value_start)?));
        }
    }

    fn end_tag(&mut self, expected: &str) -> Result<(), TreeError> {
        let offset = self.pos;
        if !self.rest().starts_with("</") {
            return Err(TreeError::syntax(offset, format!("expected </{}>", expected)));
        }
        self.pos += 2;
        let name = self.name()?;
        self.skip_whitespace();
        if self.peek_byte() != Some(b'>') {
            return Err(TreeError::syntax(self.pos, "expected '>'"));
        }
        self.pos += 1;
        if name != expected {
            return Err(TreeError::syntax(
                offset,
                format!("mismatched end tag </{}>, expected </{}>", name, expected),
            ));
        }
        Ok(())
    }

    /// Character data up to the matching end tag.
    fn text(&mut self, element: &str) -> Result<String, TreeError> {
        let mut out = String::new();
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return Err(TreeError::syntax(self.pos, format!("unterminated <{}>", element)));
            }
            if rest.starts_with("</") {
                self.end_tag(element)?;
                return Ok(out);
            }
            if rest.starts_with("<![CDATA[") {
                let body_start = self.pos + "<![CDATA[".len();
                let len = self.src[body_start..]
                    .find("]]>")
                    .ok_or_else(|| TreeError::syntax(self.pos, "unterminated CDATA section"))?;
                out.push_str(&self.src[body_start..body_start + len]);
                self.pos = body_start + len + 3;
                continue;
            }
            if rest.starts_with("<!--") {
                self.skip_past("-->", "comment")?;
                continue;
            }
            if rest.starts_with('<') {
                return Err(TreeError::UnexpectedElement {
                    name: rest[1..].chars().take_while(|c| c.is_alphanumeric()).collect(),
                    offset: self.pos,
                });
            }

            let len = rest.find('<').unwrap_or(rest.len());
            out.push_str(&unescape(&rest[..len], self.pos)?);
            self.pos += len;
        }
    }

    fn node(&mut self) -> Result<PlistNode, TreeError> {
        let tag = self.start_tag()?;
        match tag.name.as_str() {
            "dict" => {
                if tag.self_closing {
                    return Ok(PlistNode::Dict(Dict::new()));
                }
                self.dict_body()
            }
            "array" => {
                let mut items = Vec::new();
                if tag.self_closing {
                    return Ok(PlistNode::Array(items));
                }
                loop {
                    self.skip_misc()?;
                    if self.rest().starts_with("</") {
                        self.end_tag("array")?;
                        return Ok(PlistNode::Array(items));
                    }
                    items.push(self.node()?);
                }
            }
            "true" | "false" => {
                let value = tag.name == "true";
                if !tag.self_closing {
                    let text = self.text(&tag.name)?;
                    if !text.trim().is_empty() {
                        return Err(TreeError::syntax(
                            tag.offset,
                            format!("<{}> must be empty", tag.name),
                        ));
                    }
                }
                Ok(PlistNode::Scalar(Scalar::Bool(value)))
            }
            "string" | "integer" | "real" | "date" | "data" => {
                let kind = ScalarKind::from_tag(&tag.name).unwrap_or(ScalarKind::String);
                if tag.self_closing {
                    return Ok(PlistNode::Scalar(Scalar::Void(kind)));
                }
                let text = self.text(&tag.name)?;
                let text = match kind {
                    ScalarKind::Integer | ScalarKind::Real | ScalarKind::Date => {
                        text.trim().to_string()
                    }
                    _ => text,
                };
                Scalar::from_text(kind, text)
                    .map(PlistNode::Scalar)
                    .ok_or_else(|| TreeError::InvalidPlist(format!("bad <{}>", tag.name)))
            }
            _ => Err(TreeError::UnexpectedElement {
                name: tag.name,
                offset: tag.offset,
            }),
        }
    }

    fn dict_body(&mut self) -> Result<PlistNode, TreeError> {
        let mut dict = Dict::new();
        loop {
            self.skip_misc()?;
            if self.rest().starts_with("</") {
                self.end_tag("dict")?;
                return Ok(PlistNode::Dict(dict));
            }

            let key_tag = self.start_tag()?;
            if key_tag.name != "key" {
                return Err(TreeError::UnexpectedElement {
                    name: key_tag.name,
                    offset: key_tag.offset,
                });
            }
            let key = if key_tag.self_closing {
                String::new()
            } else {
                self.text("key")?
            };

            self.skip_misc()?;
            if self.rest().starts_with("</") {
                return Err(TreeError::InvalidPlist(format!("key '{}' has no value", key)));
            }
            let value = self.node()?;
            dict.push(key, value);
        }
    }
}

/// Resolve entity and character references in `raw`.
fn unescape(raw: &str, offset: usize) -> Result<String, TreeError> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| TreeError::syntax(offset, "unterminated entity reference"))?;
        let entity = &after[..semi];
        let ch = match entity {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hex) = entity.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32).ok_or_else(|| {
                    TreeError::syntax(offset, format!("unknown entity '&{};'", entity))
                })?
            }
        };
        out.push(ch);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>CFBundleName</key>
	<string>My &amp; App</string>
	<key>CFBundleVersion</key>
	<string>1</string>
	<!-- a comment -->
	<key>LSRequiresIPhoneOS</key>
	<true/>
	<key>Count</key>
	<integer> 42 </integer>
	<key>Orientations</key>
	<array>
		<string>UIInterfaceOrientationPortrait</string>
	</array>
	<key>Empty</key>
	<dict/>
</dict>
</plist>
"#;

    #[test]
    fn test_parse_info_plist() {
        let doc = parse_document(INFO_PLIST).unwrap();
        assert_eq!(doc.version, "1.0");

        let root = doc.root.as_dict().unwrap();
        assert_eq!(
            root.keys().collect::<Vec<_>>(),
            vec!["CFBundleName", "CFBundleVersion", "LSRequiresIPhoneOS", "Count", "Orientations", "Empty"]
        );
        assert_eq!(root.get("CFBundleName").and_then(|n| n.as_str()), Some("My & App"));
        assert_eq!(root.get("LSRequiresIPhoneOS").and_then(|n| n.as_bool()), Some(true));
        assert_eq!(
            root.get("Count").and_then(|n| n.as_scalar()),
            Some(&Scalar::Integer("42".to_string()))
        );
        assert_eq!(root.get("Orientations").and_then(|n| n.as_array()).map(|a| a.len()), Some(1));
        assert!(root.get("Empty").and_then(|n| n.as_dict()).unwrap().is_empty());
    }

    #[test]
    fn test_self_closing_scalar_is_void() {
        let doc = parse_document("<plist><dict><key>S</key><string/></dict></plist>").unwrap();
        let root = doc.root.as_dict().unwrap();
        assert_eq!(
            root.get("S").and_then(|n| n.as_scalar()),
            Some(&Scalar::Void(ScalarKind::String))
        );
    }

    #[test]
    fn test_empty_string_element_is_empty_string() {
        let doc = parse_document("<plist><dict><key>S</key><string></string></dict></plist>").unwrap();
        assert_eq!(doc.root.as_dict().unwrap().get("S").and_then(|n| n.as_str()), Some(""));
    }

    #[test]
    fn test_cdata_and_char_refs() {
        let doc = parse_document(
            "<plist><array><string><![CDATA[<raw>]]>&#65;&#x42;</string></array></plist>",
        )
        .unwrap();
        let items = doc.root.as_array().unwrap();
        assert_eq!(items[0].as_str(), Some("<raw>AB"));
    }

    #[test]
    fn test_doctype_with_internal_subset() {
        let src = r#"<!DOCTYPE plist [ <!ENTITY x "y"> ]><plist version="1.0"><dict/></plist>"#;
        let doc = parse_document(src).unwrap();
        assert!(doc.root.as_dict().unwrap().is_empty());
    }

    #[test]
    fn test_missing_root() {
        let err = parse_document("<?xml version=\"1.0\"?>\n").unwrap_err();
        assert!(matches!(err, TreeError::MissingRoot));
    }

    #[test]
    fn test_unknown_element_rejected() {
        let err = parse_document("<plist><dict><key>A</key><frob/></dict></plist>").unwrap_err();
        match err {
            TreeError::UnexpectedElement { name, .. } => assert_eq!(name, "frob"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_key_without_value() {
        let err = parse_document("<plist><dict><key>A</key></dict></plist>").unwrap_err();
        assert!(err.to_string().contains("'A' has no value"));
    }

    #[test]
    fn test_mismatched_end_tag() {
        let err = parse_document("<plist><array></dict></plist>").unwrap_err();
        assert!(err.to_string().contains("mismatched end tag"));
    }

    #[test]
    fn test_trailing_content_rejected() {
        let err = parse_document("<plist><dict/></plist><extra/>").unwrap_err();
        assert!(err.to_string().contains("content after"));
    }

    #[test]
    fn test_unknown_entity() {
        let err = parse_document("<plist><string>&nbsp;</string></plist>").unwrap_err();
        assert!(err.to_string().contains("unknown entity"));
    }
}
