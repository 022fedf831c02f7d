use crate::document::{BlockType, Document, Element, Node, NodeId, TextLeaf};

/// Serializes every top-level node and concatenates the results.
pub fn serialize_document(document: &Document) -> String {
    let mut out = String::new();
    for id in document.roots() {
        write_node(document, *id, &mut out);
    }
    out
}

pub fn serialize_node(document: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(document, id, &mut out);
    out
}

/// Escapes `&` first so the entities produced for `<` and `>` stay intact.
pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

pub(crate) fn tag_for(kind: BlockType) -> Option<&'static str> {
    let tag = match kind {
        BlockType::Paragraph => "p",
        BlockType::HeadingOne => "h1",
        BlockType::HeadingTwo => "h2",
        BlockType::HeadingThree => "h3",
        BlockType::HeadingFour => "h4",
        BlockType::HeadingFive => "h5",
        BlockType::HeadingSix => "h6",
        BlockType::BlockQuote => "blockquote",
        BlockType::BulletedList => "ul",
        BlockType::NumberedList => "ol",
        BlockType::ListItem => "li",
        BlockType::Image => "img",
        BlockType::Unrecognized => return None,
    };
    Some(tag)
}

fn write_node(document: &Document, id: NodeId, out: &mut String) {
    match document.node(id) {
        Some(Node::Text(leaf)) => write_leaf(leaf, out),
        Some(Node::Element(element)) => write_element(document, element, out),
        None => {}
    }
}

fn write_leaf(leaf: &TextLeaf, out: &mut String) {
    let mut html = escape_text(&leaf.text).replace('\n', "<br />");
    if leaf.marks.underline {
        html = format!("<u>{html}</u>");
    }
    if leaf.marks.italic {
        html = format!("<em>{html}</em>");
    }
    if leaf.marks.bold {
        html = format!("<strong>{html}</strong>");
    }
    out.push_str(&html);
}

fn write_element(document: &Document, element: &Element, out: &mut String) {
    if element.is_void() {
        let src = element.url.as_deref().unwrap_or_default();
        out.push_str("<img src=\"");
        out.push_str(&escape_attribute(src));
        out.push_str("\" />");
        return;
    }

    let mut children = String::new();
    for child in &element.children {
        write_node(document, *child, &mut children);
    }

    // Alignment is kept in the document only; no style attribute is written.
    match tag_for(element.kind) {
        Some("p") if children.is_empty() => out.push_str("<br />"),
        Some(tag) => {
            out.push('<');
            out.push_str(tag);
            out.push('>');
            out.push_str(&children);
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        None => out.push_str(&children),
    }
}
