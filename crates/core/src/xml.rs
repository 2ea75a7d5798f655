//! Owned XML element tree for slide parts.
//!
//! Slide XML is parsed into a tree that keeps every element, attribute,
//! text node and comment, so markup the rewriter never touches is written
//! back as it was read. Element and attribute names are kept qualified
//! (`p:sp`, `r:id`); lookups match on the local part.

use crate::{Error, Result};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A node in the element tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    /// Raw (still escaped) comment body.
    Comment(String),
    /// Raw processing instruction body.
    ProcessingInstruction(String),
}

/// An XML element with its attributes and children in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

/// A parsed XML part: optional declaration plus the root element.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// `Some(standalone)` if the source carried an XML declaration.
    pub declaration: Option<Option<String>>,
    pub root: XmlElement,
}

/// Extract the local part of a potentially namespaced name.
pub fn local_name(name: &str) -> &str {
    match name.rfind(':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder-style text append.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    /// A name in this element's namespace prefix: `a:p` + `r` gives `a:r`.
    pub fn qualified(&self, local: &str) -> String {
        match self.name.rfind(':') {
            Some(pos) => format!("{}:{}", &self.name[..pos], local),
            None => local.to_string(),
        }
    }

    /// Attribute value by exact (qualified) name.
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

    pub fn remove_attr(&mut self, key: &str) {
        self.attributes.retain(|(k, _)| k != key);
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Child elements paired with their raw position in `children`.
    pub fn indexed_elements(&self) -> impl Iterator<Item = (usize, &XmlElement)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match node {
                XmlNode::Element(el) => Some((i, el)),
                _ => None,
            })
    }

    /// Child elements with the given local name.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |el| el.is(local))
    }

    pub fn children_named_mut<'a>(
        &'a mut self,
        local: &'a str,
    ) -> impl Iterator<Item = &'a mut XmlElement> + 'a {
        self.elements_mut().filter(move |el| el.is(local))
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.is(local))
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|el| el.is(local))
    }

    /// Descend through first children matching each local name in turn.
    pub fn find(&self, path: &[&str]) -> Option<&XmlElement> {
        path.iter().try_fold(self, |el, local| el.child(local))
    }

    pub fn find_mut(&mut self, path: &[&str]) -> Option<&mut XmlElement> {
        let mut current = self;
        for local in path {
            current = current.child_mut(local)?;
        }
        Some(current)
    }

    /// Element reached by following raw child positions.
    pub fn at_path(&self, path: &[usize]) -> Option<&XmlElement> {
        let mut current = self;
        for &index in path {
            match current.children.get(index) {
                Some(XmlNode::Element(el)) => current = el,
                _ => return None,
            }
        }
        Some(current)
    }

    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut XmlElement> {
        let mut current = self;
        for &index in path {
            match current.children.get_mut(index) {
                Some(XmlNode::Element(el)) => current = el,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Concatenated direct text children.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                _ => {}
            }
        }
        out
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        self.children.push(XmlNode::Text(text.into()));
    }

    /// Remove child elements matching the predicate, returning how many went.
    pub fn remove_elements_where<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&XmlElement) -> bool,
    {
        let before = self.children.len();
        self.children.retain(|node| match node {
            XmlNode::Element(el) => !pred(el),
            _ => true,
        });
        before - self.children.len()
    }

    /// Insert a child element so the children keep the given local-name order.
    ///
    /// The new element goes before the first existing child whose local name
    /// appears later in `order`. Returns its raw position.
    pub fn insert_ordered(&mut self, child: XmlElement, order: &[&str]) -> usize {
        let rank = |local: &str| order.iter().position(|o| *o == local);
        let position = match rank(child.local_name()) {
            Some(own) => self
                .children
                .iter()
                .position(|node| match node {
                    XmlNode::Element(el) => rank(el.local_name()).is_some_and(|r| r > own),
                    _ => false,
                })
                .unwrap_or(self.children.len()),
            None => self.children.len(),
        };
        self.children.insert(position, XmlNode::Element(child));
        position
    }

    /// The first child with the given qualified name, created in schema order
    /// when missing.
    pub fn ensure_child(&mut self, qualified: &str, order: &[&str]) -> &mut XmlElement {
        let local = local_name(qualified).to_string();
        let position = match self
            .children
            .iter()
            .position(|node| matches!(node, XmlNode::Element(el) if el.is(&local)))
        {
            Some(position) => position,
            None => self.insert_ordered(XmlElement::new(qualified), order),
        };
        match &mut self.children[position] {
            XmlNode::Element(el) => el,
            // insert_ordered and the position search both land on elements
            _ => unreachable!("child position always holds an element"),
        }
    }

    /// Text of every descendant element with the given local name, in order.
    pub fn descendant_text(&self, local: &str) -> String {
        let mut out = String::new();
        self.collect_descendant_text(local, &mut out);
        out
    }

    fn collect_descendant_text(&self, local: &str, out: &mut String) {
        for el in self.elements() {
            if el.is(local) {
                out.push_str(&el.text());
            } else {
                el.collect_descendant_text(local, out);
            }
        }
    }

    /// Largest numeric value of `key` on this element or any descendant named `local`.
    pub fn max_numeric_attr(&self, local: &str, key: &str) -> Option<u32> {
        let own = if self.is(local) {
            self.attr(key).and_then(|v| v.parse::<u32>().ok())
        } else {
            None
        };
        self.elements()
            .filter_map(|el| el.max_numeric_attr(local, key))
            .chain(own)
            .max()
    }
}

impl XmlDocument {
    /// Parse an XML part into an owned tree.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);

        let mut declaration = None;
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Decl(ref decl)) => {
                    let standalone = decl
                        .standalone()
                        .and_then(|s| s.ok())
                        .map(|s| String::from_utf8_lossy(&s).into_owned());
                    declaration = Some(standalone);
                }
                Ok(Event::Start(ref e)) => {
                    stack.push(element_from_start(e)?);
                }
                Ok(Event::Empty(ref e)) => {
                    let element = element_from_start(e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::XmlError("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::XmlError(format!("bad text content: {}", e)))?;
                        parent.children.push(XmlNode::Text(text.into_owned()));
                    }
                }
                Ok(Event::CData(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let data: &[u8] = e;
                        parent
                            .children
                            .push(XmlNode::CData(String::from_utf8_lossy(data).into_owned()));
                    }
                }
                Ok(Event::Comment(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let raw: &[u8] = e;
                        parent
                            .children
                            .push(XmlNode::Comment(String::from_utf8_lossy(raw).into_owned()));
                    }
                }
                Ok(Event::PI(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let raw: &[u8] = e;
                        parent.children.push(XmlNode::ProcessingInstruction(
                            String::from_utf8_lossy(raw).into_owned(),
                        ));
                    }
                }
                Ok(Event::DocType(_)) => {}
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
            }
        }

        if !stack.is_empty() {
            return Err(Error::XmlError(format!(
                "unclosed element <{}>",
                stack.last().map(|el| el.name.as_str()).unwrap_or_default()
            )));
        }

        let root = root.ok_or_else(|| Error::XmlError("document has no root element".to_string()))?;
        Ok(Self { declaration, root })
    }

    /// Serialize the tree back to XML text.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());

        if let Some(standalone) = &self.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new(
                    "1.0",
                    Some("UTF-8"),
                    standalone.as_deref(),
                )))
                .map_err(|e| Error::XmlError(e.to_string()))?;
            writer.get_mut().extend_from_slice(b"\r\n");
        }

        write_element(&mut writer, &self.root)?;

        String::from_utf8(writer.into_inner())
            .map_err(|e| Error::XmlError(format!("serialized XML is not UTF-8: {}", e)))
    }
}

fn element_from_start(e: &BytesStart) -> Result<XmlElement> {
    let mut element = XmlElement::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::XmlError(format!("bad attribute: {}", e)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::XmlError(format!("bad attribute value: {}", e)))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None => {
            if root.is_some() {
                return Err(Error::XmlError("multiple root elements".to_string()));
            }
            *root = Some(element);
        }
    }
    Ok(())
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, element: &XmlElement) -> Result<()> {
    let xml_err = |e: quick_xml::Error| Error::XmlError(e.to_string());

    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(xml_err)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(xml_err)?;
    for child in &element.children {
        match child {
            XmlNode::Element(el) => write_element(writer, el)?,
            XmlNode::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(xml_err)?,
            XmlNode::CData(data) => writer
                .write_event(Event::CData(BytesCData::new(data.as_str())))
                .map_err(xml_err)?,
            XmlNode::Comment(raw) => writer
                .write_event(Event::Comment(BytesText::from_escaped(raw.as_str())))
                .map_err(xml_err)?,
            XmlNode::ProcessingInstruction(raw) => writer
                .write_event(Event::PI(BytesText::from_escaped(raw.as_str())))
                .map_err(xml_err)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(xml_err)?;
    Ok(())
}
