//! # Mutable XML Tree
//!
//! A small owned element tree used to mutate SVG templates. Parsing and
//! serialization go through `quick-xml`; qualified names (`xlink:href`) and
//! namespace declarations are kept verbatim as attributes so the output
//! re-parses with the same meaning as the input.
//!
//! Entities declared in an internal DTD subset (Illustrator writes
//! `xmlns="&ns_svg;"` against `<!ENTITY ns_svg "...">`) are resolved while
//! parsing; the DOCTYPE itself is written back unchanged.
//!
//! Elements are addressed by [`NodePath`]: the child indexes from the root
//! down to the element. Paths stay valid as long as no sibling before them
//! is inserted or removed, which holds for every mutation the template
//! filler performs (text replacement only touches the target's own children).

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{LabelError, Result};

/// Child indexes from the document root to an element.
pub type NodePath = Vec<usize>;

/// A node in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    DocType(String),
}

/// An element with its qualified name, attributes in document order and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Name without its namespace prefix (`svg:text` → `text`).
    pub fn local_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Attribute value by exact qualified name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing the existing value in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// The raw `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Drop every child and replace them with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        self.children.push(Node::Text(text.into()));
    }

    /// Concatenated text of this element and all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Direct child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Visit this element and every descendant element in document order.
    ///
    /// The callback receives the path relative to `self` (empty for `self`).
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&[usize], &'a Element)) {
        let mut path = Vec::new();
        walk_inner(self, &mut path, visit);
    }

    /// Path (relative to `self`) of the first descendant matching `pred`,
    /// excluding `self`.
    pub fn find_descendant(&self, pred: impl Fn(&Element) -> bool) -> Option<NodePath> {
        let mut found = None;
        self.walk(&mut |path, el| {
            if found.is_none() && !path.is_empty() && pred(el) {
                found = Some(path.to_vec());
            }
        });
        found
    }

    /// Element at `path` relative to `self`.
    pub fn at(&self, path: &[usize]) -> Option<&Element> {
        let mut current = self;
        for &idx in path {
            current = match current.children.get(idx)? {
                Node::Element(el) => el,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Mutable element at `path` relative to `self`.
    pub fn at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = self;
        for &idx in path {
            current = match current.children.get_mut(idx)? {
                Node::Element(el) => el,
                _ => return None,
            };
        }
        Some(current)
    }
}

fn collect_text(el: &Element, out: &mut String) {
    for child in &el.children {
        match child {
            Node::Text(t) | Node::CData(t) => out.push_str(t),
            Node::Element(inner) => collect_text(inner, out),
            _ => {}
        }
    }
}

fn walk_inner<'a>(
    el: &'a Element,
    path: &mut Vec<usize>,
    visit: &mut impl FnMut(&[usize], &'a Element),
) {
    visit(path, el);
    for (idx, child) in el.children.iter().enumerate() {
        if let Node::Element(inner) = child {
            path.push(idx);
            walk_inner(inner, path, visit);
            path.pop();
        }
    }
}

/// A parsed XML document: prolog nodes, the root element, trailing nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub declaration: bool,
    pub prolog: Vec<Node>,
    pub root: Element,
    pub epilog: Vec<Node>,
}

impl Document {
    /// Parse a document, failing on anything that is not well-formed.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = Reader::from_str(text);
        reader.trim_text(false);

        let mut declaration = false;
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<Element> = None;
        let mut stack: Vec<Element> = Vec::new();
        let mut entities: Vec<(String, String)> = Vec::new();

        loop {
            let node = match reader.read_event()? {
                Event::Start(start) => {
                    stack.push(element_from(&start, &entities)?);
                    continue;
                }
                Event::Empty(start) => Node::Element(element_from(&start, &entities)?),
                Event::End(_) => match stack.pop() {
                    Some(el) => Node::Element(el),
                    None => return Err(template_err("unexpected closing tag")),
                },
                Event::Text(text) => Node::Text(
                    text.unescape_with(|name| lookup_entity(&entities, name))?
                        .into_owned(),
                ),
                Event::CData(data) => Node::CData(String::from_utf8_lossy(&data).into_owned()),
                Event::Comment(text) => Node::Comment(String::from_utf8_lossy(&text).into_owned()),
                Event::DocType(text) => {
                    let doctype = String::from_utf8_lossy(&text).into_owned();
                    entities.extend(internal_entities(&doctype));
                    Node::DocType(doctype)
                }
                Event::Decl(_) => {
                    declaration = true;
                    continue;
                }
                Event::Eof => break,
                _ => continue,
            };

            if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
                continue;
            }

            match node {
                Node::Element(el) => {
                    if root.is_some() {
                        return Err(template_err("multiple root elements"));
                    }
                    root = Some(el);
                }
                Node::Text(t) | Node::CData(t) if !t.trim().is_empty() => {
                    return Err(template_err("text outside the root element"));
                }
                other => {
                    if root.is_some() {
                        epilog.push(other);
                    } else {
                        prolog.push(other);
                    }
                }
            }
        }

        if let Some(open) = stack.last() {
            return Err(template_err(&format!("unclosed element <{}>", open.name)));
        }
        let root = root.ok_or_else(|| template_err("document has no root element"))?;

        Ok(Self {
            declaration,
            prolog,
            root,
            epilog,
        })
    }

    /// Serialize the document back to text.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        if self.declaration {
            writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        }
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }
        String::from_utf8(writer.into_inner())
            .map_err(|e| template_err(&format!("serialized output is not UTF-8: {}", e)))
    }

    /// Declare `xmlns:{prefix}` on the root unless it is already declared there.
    pub fn ensure_namespace(&mut self, prefix: &str, uri: &str) {
        let key = format!("xmlns:{}", prefix);
        if self.root.attr(&key).is_none() {
            self.root.set_attr(&key, uri);
        }
    }
}

fn template_err(msg: &str) -> LabelError {
    LabelError::Template(msg.to_string())
}

/// General entities declared as `<!ENTITY name "value">` in a DOCTYPE's
/// internal subset. Parameter and external entities are skipped.
fn internal_entities(doctype: &str) -> Vec<(String, String)> {
    const DECL: &str = "<!ENTITY";
    let mut entities = Vec::new();
    let mut rest = doctype;
    while let Some(pos) = rest.find(DECL) {
        rest = rest[pos + DECL.len()..].trim_start();
        if rest.starts_with('%') {
            continue;
        }
        let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let name = &rest[..name_end];
        let value = rest[name_end..].trim_start();
        let Some(quote) = value.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let Some(end) = value[1..].find(quote) else {
            break;
        };
        entities.push((name.to_string(), value[1..end + 1].to_string()));
        rest = &value[end + 2..];
    }
    entities
}

fn lookup_entity<'a>(entities: &'a [(String, String)], name: &str) -> Option<&'a str> {
    entities
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

fn element_from(start: &BytesStart<'_>, entities: &[(String, String)]) -> Result<Element> {
    let name = String::from_utf8(start.name().as_ref().to_vec())
        .map_err(|_| template_err("element name is not UTF-8"))?;
    let mut el = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value_with(|name| lookup_entity(entities, name))?
            .into_owned();
        el.attributes.push((key, value));
    }
    Ok(el)
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &Element) -> Result<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for (key, value) in &el.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if el.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for child in &el.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(el.name.as_str())))?;
    Ok(())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<()> {
    match node {
        Node::Element(el) => write_element(writer, el)?,
        Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        Node::CData(text) => writer.write_event(Event::CData(BytesCData::new(text.as_str())))?,
        Node::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?
        }
        Node::DocType(text) => {
            writer.write_event(Event::DocType(BytesText::from_escaped(text.as_str())))?
        }
    }
    Ok(())
}
