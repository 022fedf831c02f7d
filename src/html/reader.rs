use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::document::AlignType;

const ROOT_TAG: &str = "newsdesk-fragment";
const VOID_TAGS: [&str; 3] = ["br", "img", "hr"];

/// Display-only kinds produced from HTML tags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewKind {
    Paragraph,
    Heading(u8),
    BlockQuote,
    Strong,
    Emphasis,
    Underline,
    LineBreak,
    BulletedList,
    NumberedList,
    ListItem,
    Aligned(AlignType),
    Image { src: String },
    /// Any other tag; rendered as a transparent wrapper around its children.
    Generic { tag: String },
}

impl ViewKind {
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            ViewKind::Paragraph
                | ViewKind::Heading(_)
                | ViewKind::BlockQuote
                | ViewKind::BulletedList
                | ViewKind::NumberedList
                | ViewKind::ListItem
                | ViewKind::Aligned(_)
                | ViewKind::Image { .. }
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewNode {
    Text(String),
    Element {
        kind: ViewKind,
        children: Vec<ViewNode>,
    },
}

impl ViewNode {
    pub fn element(kind: ViewKind, children: Vec<ViewNode>) -> Self {
        ViewNode::Element { kind, children }
    }

    pub fn text(text: impl Into<String>) -> Self {
        ViewNode::Text(text.into())
    }

    /// Visible text; line breaks count as `\n`.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            ViewNode::Text(text) => out.push_str(text),
            ViewNode::Element {
                kind: ViewKind::LineBreak,
                ..
            } => out.push('\n'),
            ViewNode::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewTree {
    pub nodes: Vec<ViewNode>,
}

impl ViewTree {
    pub fn text_content(&self) -> String {
        self.nodes.iter().map(ViewNode::text_content).collect()
    }
}

struct OpenElement {
    tag: String,
    kind: Option<ViewKind>,
    children: Vec<ViewNode>,
}

/// Parses an HTML fragment into a view tree. Unknown tags become
/// [`ViewKind::Generic`]; unclosed elements are closed at the end of input.
/// A tokenizer error stops reading and keeps what was built so far.
pub fn parse_html(html: &str) -> ViewTree {
    let wrapped = format!("<{ROOT_TAG}>{html}</{ROOT_TAG}>");
    let mut reader = Reader::from_reader(wrapped.as_bytes());
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = false;
    reader.config_mut().allow_unmatched_ends = true;

    let mut buf = Vec::with_capacity(64);
    let mut stack: Vec<OpenElement> = Vec::with_capacity(8);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let tag = decode_tag_name(&reader, e.name().as_ref());
                if tag == ROOT_TAG && stack.is_empty() {
                    stack.push(OpenElement {
                        tag,
                        kind: None,
                        children: Vec::new(),
                    });
                } else {
                    let kind = view_kind(&reader, &tag, &e);
                    if VOID_TAGS.contains(&tag.as_str()) {
                        push_node(&mut stack, ViewNode::element(kind, Vec::new()));
                    } else {
                        stack.push(OpenElement {
                            tag,
                            kind: Some(kind),
                            children: Vec::new(),
                        });
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                let tag = decode_tag_name(&reader, e.name().as_ref());
                let kind = view_kind(&reader, &tag, &e);
                push_node(&mut stack, ViewNode::element(kind, Vec::new()));
            }
            Ok(Event::End(e)) => {
                let tag = decode_tag_name(&reader, e.name().as_ref());
                close_element(&mut stack, &tag);
            }
            Ok(Event::Text(e)) => match e.decode() {
                Ok(text) => push_text(&mut stack, &text),
                Err(err) => tracing::warn!(%err, "skipping undecodable text"),
            },
            Ok(Event::CData(e)) => match reader.decoder().decode(&e) {
                Ok(text) => push_text(&mut stack, &text),
                Err(err) => tracing::warn!(%err, "skipping undecodable cdata"),
            },
            Ok(Event::GeneralRef(e)) => {
                let name = match e.decode() {
                    Ok(name) => name.into_owned(),
                    Err(err) => {
                        tracing::warn!(%err, "skipping undecodable entity");
                        buf.clear();
                        continue;
                    }
                };
                let entity = format!("&{name};");
                match quick_xml::escape::unescape(&entity) {
                    Ok(resolved) => push_text(&mut stack, &resolved),
                    Err(_) => push_text(&mut stack, &entity),
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(
                    position = reader.buffer_position(),
                    %err,
                    "stopped reading malformed html"
                );
                break;
            }
        }
        buf.clear();
    }

    while stack.len() > 1 {
        pop_into_parent(&mut stack);
    }
    ViewTree {
        nodes: stack.pop().map(|root| root.children).unwrap_or_default(),
    }
}

fn decode_tag_name(reader: &Reader<&[u8]>, raw: &[u8]) -> String {
    match reader.decoder().decode(raw) {
        Ok(decoded) => {
            let local_name = decoded.rsplit(':').next().unwrap_or(decoded.as_ref());
            local_name.to_ascii_lowercase()
        }
        Err(_) => String::new(),
    }
}

fn attribute(reader: &Reader<&[u8]>, start: &BytesStart<'_>, name: &str) -> Option<String> {
    for attr in start.attributes().flatten() {
        let Ok(key) = reader.decoder().decode(attr.key.as_ref()) else {
            continue;
        };
        if !key.eq_ignore_ascii_case(name) {
            continue;
        }
        return match attr.decode_and_unescape_value(reader.decoder()) {
            Ok(value) => Some(value.into_owned()),
            Err(_) => reader
                .decoder()
                .decode(&attr.value)
                .ok()
                .map(|value| value.into_owned()),
        };
    }
    None
}

fn text_align(style: &str) -> AlignType {
    style
        .split(';')
        .filter_map(|declaration| declaration.split_once(':'))
        .find(|(property, _)| property.trim().eq_ignore_ascii_case("text-align"))
        .and_then(|(_, value)| AlignType::from_name(value))
        .unwrap_or(AlignType::Left)
}

fn view_kind(reader: &Reader<&[u8]>, tag: &str, start: &BytesStart<'_>) -> ViewKind {
    match tag {
        "p" => ViewKind::Paragraph,
        "h1" => ViewKind::Heading(1),
        "h2" => ViewKind::Heading(2),
        "h3" => ViewKind::Heading(3),
        "h4" => ViewKind::Heading(4),
        "h5" => ViewKind::Heading(5),
        "h6" => ViewKind::Heading(6),
        "blockquote" => ViewKind::BlockQuote,
        "strong" => ViewKind::Strong,
        "em" => ViewKind::Emphasis,
        "u" => ViewKind::Underline,
        "br" => ViewKind::LineBreak,
        "ul" => ViewKind::BulletedList,
        "ol" => ViewKind::NumberedList,
        "li" => ViewKind::ListItem,
        "div" => ViewKind::Aligned(
            attribute(reader, start, "style")
                .map(|style| text_align(&style))
                .unwrap_or(AlignType::Left),
        ),
        "img" => ViewKind::Image {
            src: attribute(reader, start, "src").unwrap_or_default(),
        },
        other => ViewKind::Generic {
            tag: other.to_string(),
        },
    }
}

fn push_node(stack: &mut [OpenElement], node: ViewNode) {
    if let Some(open) = stack.last_mut() {
        open.children.push(node);
    }
}

fn push_text(stack: &mut [OpenElement], text: &str) {
    if text.is_empty() {
        return;
    }
    let Some(open) = stack.last_mut() else {
        return;
    };
    match open.children.last_mut() {
        Some(ViewNode::Text(existing)) => existing.push_str(text),
        _ => open.children.push(ViewNode::Text(text.to_string())),
    }
}

fn pop_into_parent(stack: &mut Vec<OpenElement>) {
    let Some(open) = stack.pop() else {
        return;
    };
    let node = match open.kind {
        Some(kind) => ViewNode::element(kind, open.children),
        None => return,
    };
    push_node(stack, node);
}

/// Closes the innermost open element named `tag` and everything opened after
/// it. Stray end tags are ignored.
fn close_element(stack: &mut Vec<OpenElement>, tag: &str) {
    let Some(position) = stack.iter().rposition(|open| open.tag == tag) else {
        return;
    };
    let keep = position.max(1);
    while stack.len() > keep {
        pop_into_parent(stack);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(kind: ViewKind, children: Vec<ViewNode>) -> ViewNode {
        ViewNode::element(kind, children)
    }

    #[test]
    fn parses_blocks_and_marks() {
        let tree = parse_html("<p>Hello <strong><em>world</em></strong></p><h2>Title</h2>");
        assert_eq!(
            tree.nodes,
            vec![
                element(
                    ViewKind::Paragraph,
                    vec![
                        ViewNode::text("Hello "),
                        element(
                            ViewKind::Strong,
                            vec![element(ViewKind::Emphasis, vec![ViewNode::text("world")])],
                        ),
                    ],
                ),
                element(ViewKind::Heading(2), vec![ViewNode::text("Title")]),
            ]
        );
    }

    #[test]
    fn resolves_entities_into_one_text_node() {
        let tree = parse_html("<p>A &amp; B &lt; C &gt; D &#233;</p>");
        assert_eq!(
            tree.nodes,
            vec![element(
                ViewKind::Paragraph,
                vec![ViewNode::text("A & B < C > D é")]
            )]
        );
    }

    #[test]
    fn unknown_entities_are_kept_literally() {
        let tree = parse_html("<p>a&nbsp;b</p>");
        assert_eq!(tree.text_content(), "a&nbsp;b");
    }

    #[test]
    fn unknown_tags_become_generic_wrappers() {
        let tree = parse_html("<section><p>x</p></section>");
        assert_eq!(
            tree.nodes,
            vec![element(
                ViewKind::Generic {
                    tag: "section".to_string()
                },
                vec![element(ViewKind::Paragraph, vec![ViewNode::text("x")])],
            )]
        );
    }

    #[test]
    fn div_reads_text_align_from_style() {
        let tree = parse_html(r#"<div style="color: red; text-align: Center">x</div><div>y</div>"#);
        assert_eq!(
            tree.nodes,
            vec![
                element(ViewKind::Aligned(AlignType::Center), vec![ViewNode::text("x")]),
                element(ViewKind::Aligned(AlignType::Left), vec![ViewNode::text("y")]),
            ]
        );
    }

    #[test]
    fn images_and_breaks_are_void() {
        let tree = parse_html(r#"<p>a<br>b<br />c</p><img src="a.png?x=1&amp;y=2">"#);
        assert_eq!(
            tree.nodes,
            vec![
                element(
                    ViewKind::Paragraph,
                    vec![
                        ViewNode::text("a"),
                        element(ViewKind::LineBreak, vec![]),
                        ViewNode::text("b"),
                        element(ViewKind::LineBreak, vec![]),
                        ViewNode::text("c"),
                    ],
                ),
                element(
                    ViewKind::Image {
                        src: "a.png?x=1&y=2".to_string()
                    },
                    vec![]
                ),
            ]
        );
        assert_eq!(tree.text_content(), "a\nb\nc");
    }

    #[test]
    fn unclosed_elements_are_closed_at_end() {
        let tree = parse_html("<ul><li>one<li>two");
        assert_eq!(tree.text_content(), "onetwo");
        assert_eq!(tree.nodes.len(), 1);
    }

    #[test]
    fn stray_end_tags_are_ignored() {
        let tree = parse_html("</em><p>x</p></div>");
        assert_eq!(
            tree.nodes,
            vec![element(ViewKind::Paragraph, vec![ViewNode::text("x")])]
        );
    }

    #[test]
    fn empty_input_is_an_empty_tree() {
        assert_eq!(parse_html(""), ViewTree::default());
    }
}
