//! Canonical rendering and textual comparison of documents.
//!
//! Two documents are considered equal when their canonical renderings are
//! byte-for-byte identical. The rendering re-indents element-only content and
//! drops whitespace-only text; everything else (attribute order, text inside
//! mixed content, comments) is kept, so semantically equivalent documents can
//! still compare unequal.

use std::fmt;

use difference::{Changeset, Difference};
use serde::Serialize;

use crate::document::{write_element, write_node, write_start_tag, Document, Element, Node};

const INDENT: &str = "  ";

/// Renders `document` as indented, newline-terminated text.
pub fn to_canonical_string(document: &Document) -> String {
    let mut out = String::new();
    if let Some(doctype) = &document.doctype {
        out.push_str(&format!("<!DOCTYPE {}>\n", doctype));
    }
    for node in &document.prolog {
        write_node(&mut out, node);
        out.push('\n');
    }
    write_indented(&mut out, &document.root, 0);
    for node in &document.epilog {
        write_node(&mut out, node);
        out.push('\n');
    }
    out
}

fn write_indented(out: &mut String, element: &Element, depth: usize) {
    out.push_str(&INDENT.repeat(depth));

    let significant: Vec<&Node> = element
        .children
        .iter()
        .filter(|child| !child.is_blank_text())
        .collect();

    if significant.is_empty() {
        write_start_tag(out, element);
        out.push_str("/>\n");
        return;
    }

    // Mixed content: indentation would change the text, keep the subtree as is.
    if significant.iter().any(|child| matches!(child, Node::Text(_))) {
        write_element(out, element);
        out.push('\n');
        return;
    }

    write_start_tag(out, element);
    out.push_str(">\n");
    for child in significant {
        match child {
            Node::Element(inner) => write_indented(out, inner, depth + 1),
            other => {
                out.push_str(&INDENT.repeat(depth + 1));
                write_node(out, other);
                out.push('\n');
            }
        }
    }
    out.push_str(&INDENT.repeat(depth));
    out.push_str("</");
    out.push_str(&element.name);
    out.push_str(">\n");
}

/// How a single line of a [`TextDiff`] relates the two renderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTag {
    /// Present in both.
    Same,
    /// Only in the actual output.
    Removed,
    /// Only in the expected output.
    Added,
}

impl LineTag {
    pub fn marker(self) -> &'static str {
        match self {
            LineTag::Same => "  ",
            LineTag::Removed => "- ",
            LineTag::Added => "+ ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub tag: LineTag,
    pub text: String,
}

/// Line-level difference between an actual and an expected rendering.
///
/// Only ever built for renderings that differ; equality is signalled by
/// [`compare`] returning `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextDiff {
    pub lines: Vec<DiffLine>,
}

impl TextDiff {
    /// Diffs two texts line by line, `actual` on the removed side.
    pub fn between(actual: &str, expected: &str) -> Self {
        let changeset = Changeset::new(
            actual.trim_end_matches('\n'),
            expected.trim_end_matches('\n'),
            "\n",
        );
        let mut lines = Vec::new();
        for diff in &changeset.diffs {
            let (tag, chunk) = match diff {
                Difference::Same(chunk) => (LineTag::Same, chunk),
                Difference::Rem(chunk) => (LineTag::Removed, chunk),
                Difference::Add(chunk) => (LineTag::Added, chunk),
            };
            lines.extend(chunk.split('\n').map(|text| DiffLine {
                tag,
                text: text.to_string(),
            }));
        }
        Self { lines }
    }

    pub fn has_changes(&self) -> bool {
        self.lines.iter().any(|line| line.tag != LineTag::Same)
    }

    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.lines_tagged(LineTag::Removed)
    }

    pub fn added(&self) -> impl Iterator<Item = &str> {
        self.lines_tagged(LineTag::Added)
    }

    fn lines_tagged(&self, tag: LineTag) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .filter(move |line| line.tag == tag)
            .map(|line| line.text.as_str())
    }
}

impl fmt::Display for TextDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}{}", line.tag.marker(), line.text)?;
        }
        Ok(())
    }
}

/// Compares the canonical renderings of two documents.
///
/// Returns `None` when they are textually identical.
pub fn compare(actual: &Document, expected: &Document) -> Option<TextDiff> {
    let actual = to_canonical_string(actual);
    let expected = to_canonical_string(expected);
    if actual == expected {
        return None;
    }
    Some(TextDiff::between(&actual, &expected))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(src: &str) -> Document {
        Document::parse_str("test", src).unwrap()
    }

    #[test]
    fn indents_element_only_content() {
        let rendered = to_canonical_string(&doc("<a><b><c/></b><d x=\"1\"/></a>"));
        assert_eq!(
            rendered,
            "<a>\n  <b>\n    <c/>\n  </b>\n  <d x=\"1\"/>\n</a>\n"
        );
    }

    #[test]
    fn ignores_formatting_whitespace() {
        let compact = doc("<a><b/><c>t</c></a>");
        let spread = doc("<a>\n\t<b>  </b>\n\n   <c>t</c>\n</a>");
        assert_eq!(to_canonical_string(&compact), to_canonical_string(&spread));
        assert!(compare(&compact, &spread).is_none());
    }

    #[test]
    fn line_endings_and_wrapped_attributes_do_not_matter() {
        assert!(compare(&doc("<a>line1\r\nline2</a>"), &doc("<a>line1\nline2</a>")).is_none());
        assert!(compare(&doc("<a x=\"1\n2\"/>"), &doc("<a x=\"1 2\"/>")).is_none());
    }

    #[test]
    fn keeps_mixed_content_inline() {
        let rendered = to_canonical_string(&doc("<p>Hello <b>big</b> world</p>"));
        assert_eq!(rendered, "<p>Hello <b>big</b> world</p>\n");
    }

    #[test]
    fn comments_and_pis_get_their_own_lines() {
        let rendered = to_canonical_string(&doc("<!--c--><a><!-- x --><?pi y?><b/></a>"));
        assert_eq!(
            rendered,
            "<!--c-->\n<a>\n  <!-- x -->\n  <?pi y?>\n  <b/>\n</a>\n"
        );
    }

    #[test]
    fn attribute_order_is_significant() {
        let a = doc(r#"<a x="1" y="2"/>"#);
        let b = doc(r#"<a y="2" x="1"/>"#);
        assert!(compare(&a, &b).is_some());
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let sources = [
            "<a><b/></a>",
            "<r>\n <p>Some <i>mixed</i> text &amp; more</p>\n <q k=\"&quot;v&quot;\"/>\n</r>",
            "<!DOCTYPE r><r><!--n--><s><t>1</t></s></r>",
        ];
        for src in sources {
            let once = to_canonical_string(&doc(src));
            let twice = to_canonical_string(&doc(&once));
            assert_eq!(once, twice, "source: {}", src);
        }
    }

    #[test]
    fn comparing_a_document_with_itself_yields_none() {
        let a = doc("<a><b k=\"v\">text</b><!--c--></a>");
        assert!(compare(&a, &a).is_none());
    }

    #[test]
    fn diff_marks_removed_and_added_lines() {
        let diff = compare(&doc("<a><b/></a>"), &doc("<a><c/></a>")).unwrap();
        assert!(diff.has_changes());
        assert_eq!(diff.removed().collect::<Vec<_>>(), vec!["  <b/>"]);
        assert_eq!(diff.added().collect::<Vec<_>>(), vec!["  <c/>"]);
        let text = diff.to_string();
        assert!(text.contains("  <a>\n"));
        assert!(text.contains("-   <b/>\n"));
        assert!(text.contains("+   <c/>\n"));
        assert!(text.ends_with("  </a>\n"));
    }
}
