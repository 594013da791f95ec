//! Owned XML document tree.
//!
//! Fixtures, stylesheets and engine output are all parsed into a [`Document`]
//! with `quick-xml`. The tree keeps everything that can change the rendered
//! text of a document (names, attribute order, text, comments, processing
//! instructions) and nothing else: the XML declaration is dropped and CDATA
//! sections are folded into plain text.

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::escape::{escape, partial_escape, resolve_predefined_entity, unescape};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::trace;

use crate::errors::{HarnessError, HarnessResult};

/// A parsed XML document with exactly one root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Raw content of a `<!DOCTYPE ...>` declaration, if any.
    pub doctype: Option<String>,
    /// Comments and processing instructions before the root element.
    pub prolog: Vec<Node>,
    pub root: Element,
    /// Comments and processing instructions after the root element.
    pub epilog: Vec<Node>,
    /// File the document was read from, when it came from disk.
    pub source_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written, prefix included.
    pub name: String,
    /// Attributes in document order, values unescaped.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Character data, unescaped.
    Text(String),
    Comment(String),
    /// Processing instruction content, target included (`target data`).
    ProcessingInstruction(String),
}

impl Node {
    /// True for text that only holds XML whitespace.
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(text) if is_blank(text))
    }
}

pub(crate) fn is_blank(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Appends a child, merging adjacent text runs.
    fn push(&mut self, node: Node) {
        if let Node::Text(text) = &node {
            if let Some(Node::Text(last)) = self.children.last_mut() {
                last.push_str(text);
                return;
            }
        }
        self.children.push(node);
    }
}

impl Document {
    /// Parses a document from a string. `name` labels diagnostics.
    ///
    /// Line endings are normalized to `\n` first, so diagnostic offsets refer
    /// to the normalized text.
    pub fn parse_str(name: &str, source: &str) -> HarnessResult<Self> {
        let normalized = normalize_line_endings(source);
        let source = normalized.as_ref();
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text(false);
        let mut builder = TreeBuilder::default();

        loop {
            let pos = reader.buffer_position() as usize;
            let event = reader.read_event().map_err(|e| {
                HarnessError::malformed_xml(
                    name,
                    source,
                    reader.error_position() as usize,
                    e.to_string(),
                )
            })?;
            let malformed =
                |message: String| HarnessError::malformed_xml(name, source, pos, message);

            match event {
                Event::Start(e) => {
                    let element = start_element(&e).map_err(malformed)?;
                    builder.open(element);
                }
                Event::Empty(e) => {
                    let element = start_element(&e).map_err(malformed)?;
                    builder.leaf(element).map_err(malformed)?;
                }
                Event::End(_) => builder.close().map_err(malformed)?,
                Event::Text(e) => {
                    let raw = utf8(&e).map_err(malformed)?;
                    let text = unescape(raw).map_err(|e| malformed(e.to_string()))?;
                    builder.text(text.into_owned()).map_err(malformed)?;
                }
                Event::GeneralRef(e) => {
                    let reference = utf8(&e).map_err(malformed)?;
                    let text = resolve_reference(reference).map_err(malformed)?;
                    builder.text(text).map_err(malformed)?;
                }
                Event::CData(e) => {
                    let text = utf8(&e).map_err(malformed)?.to_string();
                    builder.text(text).map_err(malformed)?;
                }
                Event::Comment(e) => {
                    builder.misc(Node::Comment(utf8(&e).map_err(malformed)?.to_string()));
                }
                Event::PI(e) => {
                    let content = utf8(&e).map_err(malformed)?;
                    builder.misc(Node::ProcessingInstruction(content.to_string()));
                }
                Event::DocType(e) => {
                    builder.doctype = Some(utf8(&e).map_err(malformed)?.trim().to_string());
                }
                Event::Decl(_) => {}
                Event::Eof => break,
            }
        }

        let document = builder
            .finish()
            .map_err(|message| HarnessError::malformed_xml(name, source, source.len(), message))?;
        trace!(name, root = %document.root.name, "parsed document");
        Ok(document)
    }

    /// Reads and parses the document at `path`.
    pub fn from_path(path: &Path) -> HarnessResult<Self> {
        let source = fs::read_to_string(path).map_err(|source| HarnessError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut document = Self::parse_str(&path.display().to_string(), &source)?;
        document.source_path = Some(path.to_path_buf());
        Ok(document)
    }

    /// Directory of [`Document::source_path`], against which relative
    /// references in the document resolve.
    pub fn base_dir(&self) -> Option<&Path> {
        self.source_path.as_deref().and_then(Path::parent)
    }

    /// Serializes the document as-is, whitespace included.
    ///
    /// This is what gets fed to an engine; use [`crate::canonical`] to compare.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        if let Some(doctype) = &self.doctype {
            out.push_str(&format!("<!DOCTYPE {}>\n", doctype));
        }
        for node in &self.prolog {
            write_node(&mut out, node);
            out.push('\n');
        }
        write_element(&mut out, &self.root);
        for node in &self.epilog {
            out.push('\n');
            write_node(&mut out, node);
        }
        out.push('\n');
        out
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

// ============================================================================
// SERIALIZATION
// ============================================================================

pub(crate) fn write_start_tag(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(&element.name);
    for (key, value) in &element.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_attribute(value));
        out.push('"');
    }
}

/// Writes an element and its subtree exactly as stored.
pub(crate) fn write_element(out: &mut String, element: &Element) {
    write_start_tag(out, element);
    if element.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &element.children {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

pub(crate) fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Element(element) => write_element(out, element),
        Node::Text(text) => out.push_str(&partial_escape(text.as_str())),
        Node::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Node::ProcessingInstruction(content) => {
            out.push_str("<?");
            out.push_str(content);
            out.push_str("?>");
        }
    }
}

/// Escapes an attribute value, keeping whitespace characters that
/// attribute-value normalization would otherwise fold.
fn escape_attribute(value: &str) -> String {
    escape(value)
        .replace('\t', "&#9;")
        .replace('\n', "&#10;")
        .replace('\r', "&#13;")
}

// ============================================================================
// PARSING HELPERS
// ============================================================================

/// `\r\n` and lone `\r` become `\n`, as an XML processor reads them.
fn normalize_line_endings(source: &str) -> Cow<'_, str> {
    if !source.contains('\r') {
        return Cow::Borrowed(source);
    }
    Cow::Owned(source.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Literal whitespace in a raw attribute value reads as a space. Character
/// references are left alone, so `&#10;` still yields a newline.
fn normalize_attribute(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['\t', '\n', '\r']) {
        return Cow::Borrowed(raw);
    }
    Cow::Owned(raw.replace(['\t', '\n', '\r'], " "))
}

fn utf8(bytes: &[u8]) -> Result<&str, String> {
    std::str::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {}", e))
}

fn start_element(e: &quick_xml::events::BytesStart<'_>) -> Result<Element, String> {
    let name = std::str::from_utf8(e.name().as_ref())
        .map_err(|err| err.to_string())?
        .to_string();
    let mut element = Element::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(|err| err.to_string())?;
        let raw = std::str::from_utf8(&attr.value).map_err(|err| err.to_string())?;
        let value = unescape(&normalize_attribute(raw))
            .map_err(|err| err.to_string())?
            .into_owned();
        element.attributes.push((key.to_string(), value));
    }
    Ok(element)
}

/// Resolves the body of an `&...;` reference found in text.
fn resolve_reference(name: &str) -> Result<String, String> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => number.parse::<u32>(),
        }
        .map_err(|_| format!("invalid character reference '&{};'", name))?;
        return char::from_u32(code)
            .map(String::from)
            .ok_or_else(|| format!("invalid character reference '&{};'", name));
    }
    resolve_predefined_entity(name)
        .map(str::to_string)
        .ok_or_else(|| format!("undefined entity '&{};'", name))
}

#[derive(Default)]
struct TreeBuilder {
    doctype: Option<String>,
    prolog: Vec<Node>,
    stack: Vec<Element>,
    root: Option<Element>,
    epilog: Vec<Node>,
}

impl TreeBuilder {
    fn open(&mut self, element: Element) {
        self.stack.push(element);
    }

    fn leaf(&mut self, element: Element) -> Result<(), String> {
        self.attach(element)
    }

    fn close(&mut self) -> Result<(), String> {
        let element = self
            .stack
            .pop()
            .ok_or_else(|| "closing tag without a matching opening tag".to_string())?;
        self.attach(element)
    }

    fn attach(&mut self, element: Element) -> Result<(), String> {
        match self.stack.last_mut() {
            Some(parent) => {
                parent.push(Node::Element(element));
                Ok(())
            }
            None if self.root.is_none() => {
                self.root = Some(element);
                Ok(())
            }
            None => Err(format!(
                "second root element <{}> after the document element",
                element.name
            )),
        }
    }

    fn text(&mut self, text: String) -> Result<(), String> {
        match self.stack.last_mut() {
            Some(parent) => {
                parent.push(Node::Text(text));
                Ok(())
            }
            None if is_blank(&text) => Ok(()),
            None => Err("text outside of the document element".to_string()),
        }
    }

    fn misc(&mut self, node: Node) {
        match (self.stack.last_mut(), &self.root) {
            (Some(parent), _) => parent.push(node),
            (None, None) => self.prolog.push(node),
            (None, Some(_)) => self.epilog.push(node),
        }
    }

    fn finish(self) -> Result<Document, String> {
        if let Some(open) = self.stack.last() {
            return Err(format!("unclosed element <{}>", open.name));
        }
        let root = self
            .root
            .ok_or_else(|| "document has no root element".to_string())?;
        Ok(Document {
            doctype: self.doctype,
            prolog: self.prolog,
            root,
            epilog: self.epilog,
            source_path: None,
        })
    }
}
