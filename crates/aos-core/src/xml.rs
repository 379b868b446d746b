//! Minimal XML document tree with a typed query layer
//!
//! The catalog parser needs child/descendant lookups by local name plus
//! attribute predicates, not streaming. This module reads a whole document
//! into an owned [`Element`] tree via quick-xml events and strips namespace
//! prefixes, so callers query by local name only.

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::path::Path;

/// One XML element: local name, attributes, child elements, and text content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Local element name, namespace prefix stripped
    pub name: String,
    /// Attributes by local name
    pub attrs: BTreeMap<String, String>,
    /// Child elements in document order
    pub children: Vec<Element>,
    /// Concatenated, trimmed text content
    pub text: String,
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            attrs: BTreeMap::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    /// Get an attribute value by local name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Check whether an attribute contains the given substring
    pub fn attr_contains(&self, name: &str, needle: &str) -> bool {
        self.attr(name).is_some_and(|v| v.contains(needle))
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given name
    pub fn children_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a Element> + use<'a, 'n> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First element reached by descending the given direct-child name path
    pub fn find(&self, path: &[&str]) -> Option<&Element> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => self
                .children_named(head)
                .find_map(|child| child.find(rest)),
        }
    }

    /// All elements reached by descending the given direct-child name path
    pub fn find_all(&self, path: &[&str]) -> Vec<&Element> {
        match path.split_first() {
            None => vec![self],
            Some((head, rest)) => self
                .children_named(head)
                .flat_map(|child| child.find_all(rest))
                .collect(),
        }
    }

    /// All descendants (any depth) with the given name
    pub fn descendants(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            found.extend(child.descendants(name));
        }
        found
    }

    /// All elements whose first path segment matches at any depth and whose
    /// remaining segments are direct children, like an XPath `.//a/b` query
    pub fn find_deep(&self, path: &[&str]) -> Vec<&Element> {
        match path.split_first() {
            None => vec![self],
            Some((head, rest)) => self
                .descendants(head)
                .into_iter()
                .flat_map(|el| el.find_all(rest))
                .collect(),
        }
    }
}

/// Parse an XML document from a string into its root element
pub fn parse_str(xml: &str, source_name: &str) -> Result<Element> {
    let path = Path::new(source_name);
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| Error::Xml {
            path: path.to_path_buf(),
            source: e,
        })?;

        match event {
            Event::Start(start) => {
                let element = element_from_start(&start).map_err(|e| Error::Xml {
                    path: path.to_path_buf(),
                    source: e,
                })?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = element_from_start(&start).map_err(|e| Error::Xml {
                    path: path.to_path_buf(),
                    source: e,
                })?;
                close_element(element, &mut stack, &mut root);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    close_element(element, &mut stack, &mut root);
                }
            }
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    let value = text.unescape().map_err(|e| Error::Xml {
                        path: path.to_path_buf(),
                        source: e,
                    })?;
                    push_text(parent, &value);
                }
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    push_text(parent, &value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or_else(|| Error::XmlParse {
        path: path.to_path_buf(),
        message: "document has no root element".to_string(),
    })
}

/// Parse an XML document from a file into its root element
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Element> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_str(&xml, &path.to_string_lossy())
}

fn element_from_start(start: &BytesStart<'_>) -> std::result::Result<Element, quick_xml::Error> {
    let name = local_name(start.local_name().as_ref());
    let mut element = Element::new(name);

    for attr in start.attributes() {
        let attr = attr?;
        let key = local_name(attr.key.local_name().as_ref());
        let value = attr.unescape_value()?.into_owned();
        element.attrs.insert(key, value);
    }

    Ok(element)
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

fn close_element(element: Element, stack: &mut Vec<Element>, root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn push_text(parent: &mut Element, value: &str) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return;
    }
    if !parent.text.is_empty() {
        parent.text.push(' ');
    }
    parent.text.push_str(trimmed);
}
