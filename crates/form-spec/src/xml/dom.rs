use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};

use crate::xml::ParseError;

/// Minimal element tree read from the wire before it is mapped onto nodes.
/// Plain text and CDATA are kept apart so CDATA can win when both exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    text: String,
    cdata: Option<String>,
}

impl XmlElement {
    fn open(start: &BytesStart<'_>) -> Result<Self, ParseError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(malformed)?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = match attribute.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(_) => unescape_lenient(&String::from_utf8_lossy(&attribute.value)),
            };
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// CDATA content verbatim when present and non-empty, otherwise the
    /// trimmed plain text.
    pub fn text(&self) -> String {
        match &self.cdata {
            Some(cdata) if !cdata.is_empty() => cdata.clone(),
            _ => self.text.trim().to_string(),
        }
    }
}

pub(crate) fn malformed(err: impl std::fmt::Display) -> ParseError {
    ParseError::Malformed(err.to_string())
}

/// Reads the first top-level element of `xml`. `Ok(None)` means the input
/// was well-formed but held no element at all.
pub(crate) fn read_root(xml: &str) -> Result<Option<XmlElement>, ParseError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(start) => stack.push(XmlElement::open(&start)?),
            Event::Empty(start) => {
                let element = XmlElement::open(&start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ParseError::Malformed("unexpected closing tag".into()))?;
                attach(&mut stack, &mut root, element);
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.decode().map_err(malformed)?);
                }
            }
            Event::CData(cdata) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .cdata
                        .get_or_insert_with(String::new)
                        .push_str(&cdata.decode().map_err(malformed)?);
                }
            }
            Event::GeneralRef(reference) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&resolve_reference(&reference)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::Malformed(format!(
            "element <{}> is never closed",
            open.name
        )));
    }
    Ok(root)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Attribute fallback when strict unescaping fails: predefined and
/// character references are expanded, unknown entities such as `&nbsp;`
/// stay literal, matching how text content is read.
fn unescape_lenient(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let Some(semi) = tail.find(';') else {
            out.push_str(&rest[amp..]);
            return out;
        };
        let name = &tail[..semi];
        match expand_entity(name) {
            Some(expanded) => out.push_str(&expanded),
            None => {
                out.push('&');
                out.push_str(name);
                out.push(';');
            }
        }
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    out
}

fn expand_entity(name: &str) -> Option<Cow<'static, str>> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse().ok()?,
        };
        return char::from_u32(value).map(|ch| Cow::Owned(ch.to_string()));
    }
    resolve_predefined_entity(name).map(Cow::Borrowed)
}

fn resolve_reference(reference: &BytesRef<'_>) -> Result<Cow<'static, str>, ParseError> {
    if let Some(ch) = reference.resolve_char_ref().map_err(malformed)? {
        return Ok(Cow::Owned(ch.to_string()));
    }
    let name = reference.decode().map_err(malformed)?;
    match resolve_predefined_entity(&name) {
        Some(value) => Ok(Cow::Borrowed(value)),
        None => Ok(Cow::Owned(format!("&{name};"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdata_wins_over_text() {
        let root = read_root("<d>  plain <![CDATA[<strong>Bold</strong>]]></d>")
            .expect("parse")
            .expect("root");
        assert_eq!(root.text(), "<strong>Bold</strong>");
    }

    #[test]
    fn plain_text_is_trimmed_and_unescaped() {
        let root = read_root("<d>\n   Fish &amp; chips &#65;  </d>")
            .expect("parse")
            .expect("root");
        assert_eq!(root.text(), "Fish & chips A");
    }

    #[test]
    fn attributes_are_unescaped() {
        let root = read_root(r#"<q title="A &lt; B"/>"#)
            .expect("parse")
            .expect("root");
        assert_eq!(root.attr("title"), Some("A < B"));
        assert_eq!(root.attr("missing"), None);
    }

    #[test]
    fn unknown_entities_in_attributes_stay_literal() {
        let root = read_root(r#"<q title="Bar&nbsp;Form &amp; Co &#65;"/>"#)
            .expect("parse")
            .expect("root");
        assert_eq!(root.attr("title"), Some("Bar&nbsp;Form & Co A"));
        assert_eq!(unescape_lenient("a & b"), "a & b");
        assert_eq!(unescape_lenient("&bogus"), "&bogus");
    }

    #[test]
    fn mismatched_tags_are_malformed() {
        assert!(matches!(
            read_root("<a><b></a>"),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn unclosed_root_is_malformed() {
        assert!(matches!(read_root("<a><b/>"), Err(ParseError::Malformed(_))));
    }
}
