//! Owned XML element tree for DOCX parts.
//!
//! Parts are small enough to materialize, and the run merger rewrites the
//! tree in place before extraction walks it, so this is a mutable arena
//! rather than a streaming reader. Nodes are addressed by [`NodeId`] handles;
//! the output model keeps such handles as back-references into the tree that
//! produced it. Raw prefixed names and `xmlns` attributes are preserved so a
//! tree can be serialized back into the package with its structure intact.

use crate::error::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::{NsReader, Writer};
use std::io::Write;

/// Handle to a node in an [`XmlTree`].
///
/// Only meaningful for the tree that issued it. Cheap to copy and compare;
/// holds no ownership of the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// The `xmlns` pseudo-namespace, used to tag namespace-declaration attributes
/// so they never collide with semantic lookups.
pub const XMLNS_URI: &str = "http://www.w3.org/2000/xmlns/";

#[derive(Debug, Clone)]
struct XmlNode {
    /// Raw name as written in the part, e.g. `w:p`.
    name: Box<str>,
    /// Interned namespace index of the resolved element namespace.
    ns: usize,
    attrs: Vec<XmlAttr>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    /// Concatenated direct text content.
    text: String,
}

#[derive(Debug, Clone)]
struct XmlAttr {
    /// Raw name as written, e.g. `w:val` or `xmlns:w`.
    name: Box<str>,
    /// Interned namespace index of the resolved attribute namespace.
    ns: usize,
    value: String,
}

fn local_of(raw: &str) -> &str {
    match raw.split_once(':') {
        Some((_, local)) => local,
        None => raw,
    }
}

/// A mutable, namespace-resolved XML document.
#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<XmlNode>,
    /// Interned namespace URIs; index 0 is the empty (no) namespace.
    namespaces: Vec<String>,
    root: NodeId,
}

impl XmlTree {
    /// Parse a document part into a tree.
    ///
    /// `part` names the origin for error messages only.
    pub fn parse(data: &[u8], part: &str) -> Result<Self> {
        let mut reader = NsReader::from_reader(data);

        let xml_err = |e: quick_xml::Error| Error::XmlParse {
            part: part.to_string(),
            message: e.to_string(),
        };

        let mut tree = XmlTree {
            nodes: Vec::new(),
            namespaces: vec![String::new()],
            root: NodeId(0),
        };
        let mut stack: Vec<NodeId> = Vec::new();
        let mut saw_root = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf).map_err(xml_err)? {
                Event::Start(start) => {
                    let id = tree.open_element(&reader, &start, stack.last().copied());
                    if stack.is_empty() && !saw_root {
                        tree.root = id;
                        saw_root = true;
                    }
                    stack.push(id);
                }
                Event::Empty(start) => {
                    let id = tree.open_element(&reader, &start, stack.last().copied());
                    if stack.is_empty() && !saw_root {
                        tree.root = id;
                        saw_root = true;
                    }
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(text) => {
                    if let Some(&top) = stack.last() {
                        let unescaped =
                            text.unescape().map(|t| t.into_owned()).map_err(xml_err)?;
                        tree.nodes[top.0].text.push_str(&unescaped);
                    }
                }
                Event::CData(data) => {
                    if let Some(&top) = stack.last() {
                        tree.nodes[top.0]
                            .text
                            .push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                // declaration, comments, processing instructions
                _ => {}
            }
            buf.clear();
        }

        if !saw_root {
            return Err(Error::XmlParse {
                part: part.to_string(),
                message: "no document element".to_string(),
            });
        }
        Ok(tree)
    }

    /// Create a node for a start (or empty) tag and attach it to `parent`.
    fn open_element<R>(
        &mut self,
        reader: &NsReader<R>,
        start: &BytesStart,
        parent: Option<NodeId>,
    ) -> NodeId {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let (resolved, _) = reader.resolve_element(start.name());
        let ns = self.intern(resolve_uri(&resolved));

        let mut attrs = Vec::new();
        for attr in start.attributes().with_checks(false).flatten() {
            let raw = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let attr_ns = if raw == "xmlns" || raw.starts_with("xmlns:") {
                self.intern(XMLNS_URI)
            } else {
                let (res, _) = reader.resolve_attribute(attr.key);
                self.intern(resolve_uri(&res))
            };
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            attrs.push(XmlAttr {
                name: raw.into_boxed_str(),
                ns: attr_ns,
                value,
            });
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(XmlNode {
            name: name.into_boxed_str(),
            ns,
            attrs,
            children: Vec::new(),
            parent,
            text: String::new(),
        });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    fn intern(&mut self, uri: &str) -> usize {
        if let Some(pos) = self.namespaces.iter().position(|n| n == uri) {
            return pos;
        }
        self.namespaces.push(uri.to_string());
        self.namespaces.len() - 1
    }

    /// Root element of the part.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Resolved namespace URI of an element ("" when unqualified).
    pub fn ns(&self, id: NodeId) -> &str {
        &self.namespaces[self.nodes[id.0].ns]
    }

    /// Local element name without prefix.
    pub fn local(&self, id: NodeId) -> &str {
        local_of(&self.nodes[id.0].name)
    }

    /// Raw element name as written in the source, e.g. `w:tbl`.
    pub fn raw_name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    /// Ordered child elements.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Direct text content of the element.
    pub fn text(&self, id: NodeId) -> &str {
        &self.nodes[id.0].text
    }

    /// Replace the direct text content of the element.
    ///
    /// The package can be rewritten afterwards with the edit in place; this
    /// is the supported path for search-and-replace over `w:t` elements.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.nodes[id.0].text = text.into();
    }

    /// All text in the element and its descendants, document order.
    pub fn itertext(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        out.push_str(&self.nodes[id.0].text);
        for &child in &self.nodes[id.0].children {
            self.collect_text(child, out);
        }
    }

    /// Attributes as `(namespace uri, local name, value)` triples.
    pub fn attrs(&self, id: NodeId) -> impl Iterator<Item = (&str, &str, &str)> {
        self.nodes[id.0].attrs.iter().map(move |a| {
            (
                self.namespaces[a.ns].as_str(),
                local_of(&a.name),
                a.value.as_str(),
            )
        })
    }

    /// First matching attribute value by namespace predicate and local name.
    pub fn attr_where<F>(&self, id: NodeId, mut ns_matches: F, local: &str) -> Option<&str>
    where
        F: FnMut(&str) -> bool,
    {
        self.nodes[id.0].attrs.iter().find_map(|a| {
            let uri = self.namespaces[a.ns].as_str();
            if uri != XMLNS_URI && local_of(&a.name) == local && ns_matches(uri) {
                Some(a.value.as_str())
            } else {
                None
            }
        })
    }

    /// Every node of the subtree rooted at `id`, depth-first preorder.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// First child with the given local name, any namespace.
    pub fn find_child(&self, id: NodeId, local: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.local(c) == local)
    }

    /// Detach `child` from `parent`'s child list. The node stays allocated in
    /// the arena but is no longer reachable from the root.
    pub(crate) fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.retain(|&c| c != child);
        self.nodes[child.0].parent = None;
    }

    /// Move every child of `src` to the end of `dst`'s child list.
    pub(crate) fn adopt_children(&mut self, dst: NodeId, src: NodeId) {
        let moved = std::mem::take(&mut self.nodes[src.0].children);
        for &m in &moved {
            self.nodes[m.0].parent = Some(dst);
        }
        self.nodes[dst.0].children.extend(moved);
    }

    /// Serialize the tree back to XML bytes, with declaration.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Serialize the tree into a writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut xml = Writer::new(writer);
        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(|e| Error::XmlWrite(e.to_string()))?;
        self.write_node(&mut xml, self.root)
    }

    fn write_node<W: Write>(&self, xml: &mut Writer<W>, id: NodeId) -> Result<()> {
        let node = &self.nodes[id.0];
        let mut start = BytesStart::new(node.name.as_ref());
        for attr in &node.attrs {
            start.push_attribute((attr.name.as_ref(), attr.value.as_str()));
        }

        if node.children.is_empty() && node.text.is_empty() {
            xml.write_event(Event::Empty(start))
                .map_err(|e| Error::XmlWrite(e.to_string()))?;
            return Ok(());
        }

        xml.write_event(Event::Start(start))
            .map_err(|e| Error::XmlWrite(e.to_string()))?;
        if !node.text.is_empty() {
            xml.write_event(Event::Text(BytesText::new(&node.text)))
                .map_err(|e| Error::XmlWrite(e.to_string()))?;
        }
        for &child in &node.children {
            self.write_node(xml, child)?;
        }
        xml.write_event(Event::End(BytesEnd::new(node.name.as_ref())))
            .map_err(|e| Error::XmlWrite(e.to_string()))?;
        Ok(())
    }
}

fn resolve_uri<'n>(resolved: &ResolveResult<'n>) -> &'n str {
    match resolved {
        ResolveResult::Bound(ns) => std::str::from_utf8(ns.into_inner()).unwrap_or(""),
        _ => "",
    }
}
