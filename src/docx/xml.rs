//! Lightweight owned XML tree over quick-xml
//!
//! Word parts are small enough to hold in memory; editing an owned tree keeps
//! run merging and paragraph insertion simple index work.

use crate::error::{xml_err, OfficeError, OfficeResult};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Qualified name, e.g. `w:p`
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder form of [`set_attr`](Self::set_attr)
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder form of [`push`](Self::push)
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.is(name))
    }

    /// Existing child `name`, or a new one appended
    pub fn child_or_insert(&mut self, name: &str) -> &mut XmlElement {
        let pos = self.position_of(name).unwrap_or_else(|| {
            self.push(XmlElement::new(name));
            self.children.len() - 1
        });
        match &mut self.children[pos] {
            XmlNode::Element(e) => e,
            // position_of and push only ever point at elements
            _ => unreachable!("child index always refers to an element"),
        }
    }

    /// Existing child `name`, or a new one inserted first (property elements lead their parent)
    pub fn child_or_insert_first(&mut self, name: &str) -> &mut XmlElement {
        let pos = self.position_of(name).unwrap_or_else(|| {
            self.children.insert(0, XmlNode::Element(XmlElement::new(name)));
            0
        });
        match &mut self.children[pos] {
            XmlNode::Element(e) => e,
            _ => unreachable!("child index always refers to an element"),
        }
    }

    /// Index in `children` of the first element named `name`
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(e) if e.is(name)))
    }

    /// Concatenated text of every descendant text node
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
                XmlNode::Comment(_) => {}
            }
        }
    }
}

/// Parse a document into its root element
pub fn parse(bytes: &[u8]) -> OfficeResult<XmlElement> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Start(e) => stack.push(element_from_start(&e)?),
            Event::Empty(e) => {
                let element = element_from_start(&e)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| OfficeError::Xml("Unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, element);
            }
            Event::Text(e) => {
                if let Some(parent) = stack.last_mut() {
                    let text = e.unescape().map_err(xml_err)?;
                    parent.children.push(XmlNode::Text(text.into_owned()));
                }
            }
            Event::CData(e) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    parent.children.push(XmlNode::CData(text));
                }
            }
            Event::Comment(e) => {
                if let Some(parent) = stack.last_mut() {
                    parent
                        .children
                        .push(XmlNode::Comment(String::from_utf8_lossy(&e).into_owned()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(OfficeError::Xml("Unclosed element at end of document".to_string()));
    }
    root.ok_or_else(|| OfficeError::Xml("Document has no root element".to_string()))
}

fn element_from_start(start: &BytesStart) -> OfficeResult<XmlElement> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(xml_err)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_err)?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) {
    match stack.last_mut() {
        Some(parent) => parent.push(element),
        None => *root = Some(element),
    }
}

/// Serialize with a standalone UTF-8 declaration
pub fn to_bytes(root: &XmlElement) -> OfficeResult<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(xml_err)?;
    writer.get_mut().extend_from_slice(b"\r\n");
    write_element(&mut writer, root)?;
    Ok(writer.into_inner())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> OfficeResult<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(xml_err)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(xml_err)?;
    for node in &element.children {
        match node {
            XmlNode::Element(child) => write_element(writer, child)?,
            XmlNode::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(xml_err)?,
            XmlNode::CData(text) => writer
                .write_event(Event::CData(BytesCData::new(text.as_str())))
                .map_err(xml_err)?,
            XmlNode::Comment(text) => writer
                .write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
                .map_err(xml_err)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(xml_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="urn:w"><w:body><w:p><w:r><w:t xml:space="preserve"> a &amp; b </w:t></w:r></w:p><!-- note --><w:sectPr/></w:body></w:document>"#;

    #[test]
    fn test_parse_tree() {
        let root = parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(root.name, "w:document");
        assert_eq!(root.attr("xmlns:w"), Some("urn:w"));
        let body = root.child("w:body").unwrap();
        assert_eq!(body.elements().count(), 2);
        assert_eq!(body.text(), " a & b ");
    }

    #[test]
    fn test_serialize_escapes_and_keeps_whitespace() {
        let root = parse(SAMPLE.as_bytes()).unwrap();
        let out = String::from_utf8(to_bytes(&root).unwrap()).unwrap();
        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"));
        assert!(out.contains("<w:t xml:space=\"preserve\"> a &amp; b </w:t>"));
        assert!(out.contains("<w:sectPr/>"));
        assert!(out.contains("<!-- note -->"));
        assert_eq!(parse(&to_bytes(&root).unwrap()).unwrap(), root);
    }

    #[test]
    fn test_child_or_insert() {
        let mut p = XmlElement::new("w:p").with_child(XmlElement::new("w:r"));
        p.child_or_insert_first("w:pPr").push(XmlElement::new("w:jc").with_attr("w:val", "center"));
        assert_eq!(p.position_of("w:pPr"), Some(0));
        p.child_or_insert("w:pPr").set_attr("x", "1");
        assert_eq!(p.elements().count(), 2);
        assert_eq!(p.child("w:pPr").and_then(|e| e.attr("x")), Some("1"));
    }

    #[test]
    fn test_unbalanced_is_error() {
        assert!(parse(b"<a><b></a>").is_err());
        assert!(parse(b"").is_err());
    }
}
