//! The HTML dialect persisted as `contentHTML`.
//!
//! [`serialize_document`] turns a [`Document`] into HTML. [`parse_html`] reads
//! HTML back into a display-only [`ViewTree`]; it is deliberately looser than
//! an inverse of the writer and never fails on unknown tags.
//!
//! [`Outline`] reduces either side to block structure plus visible text, which
//! is what survives a write/read cycle (alignment is not written).

use crate::document::{BlockType, Document, NodeId};

mod reader;
mod writer;

pub use reader::{ViewKind, ViewNode, ViewTree, parse_html};
pub use writer::{escape_text, serialize_document, serialize_node};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outline {
    pub tag: &'static str,
    pub text: String,
    pub children: Vec<Outline>,
}

impl Outline {
    fn leaf(tag: &'static str, text: String) -> Self {
        Self {
            tag,
            text,
            children: Vec::new(),
        }
    }

    pub fn of_document(document: &Document) -> Vec<Outline> {
        outline_ids(document, document.roots())
    }
}

fn outline_ids(document: &Document, ids: &[NodeId]) -> Vec<Outline> {
    let mut out = Vec::new();
    for id in ids {
        let Some(element) = document.element(*id) else {
            continue;
        };
        match element.kind {
            BlockType::Unrecognized => out.extend(outline_ids(document, &element.children)),
            BlockType::Image => out.push(Outline::leaf("img", String::new())),
            kind => {
                let Some(tag) = writer::tag_for(kind) else {
                    continue;
                };
                out.push(Outline {
                    tag,
                    text: document.text_content(*id),
                    children: outline_ids(document, &element.children),
                });
            }
        }
    }
    out
}

impl ViewTree {
    /// Block skeleton of the tree. A line break standing where a block is
    /// expected is how the writer encodes an empty paragraph.
    pub fn outline(&self) -> Vec<Outline> {
        outline_nodes(&self.nodes, true)
    }
}

fn view_tag(kind: &ViewKind) -> Option<&'static str> {
    let tag = match kind {
        ViewKind::Paragraph => "p",
        ViewKind::Heading(1) => "h1",
        ViewKind::Heading(2) => "h2",
        ViewKind::Heading(3) => "h3",
        ViewKind::Heading(4) => "h4",
        ViewKind::Heading(5) => "h5",
        ViewKind::Heading(_) => "h6",
        ViewKind::BlockQuote => "blockquote",
        ViewKind::BulletedList => "ul",
        ViewKind::NumberedList => "ol",
        ViewKind::ListItem => "li",
        _ => return None,
    };
    Some(tag)
}

fn outline_nodes(nodes: &[ViewNode], block_level: bool) -> Vec<Outline> {
    let mut out = Vec::new();
    for node in nodes {
        let ViewNode::Element { kind, children } = node else {
            continue;
        };
        match kind {
            ViewKind::LineBreak if block_level => out.push(Outline::leaf("p", String::new())),
            ViewKind::LineBreak => {}
            ViewKind::Image { .. } => out.push(Outline::leaf("img", String::new())),
            ViewKind::BulletedList | ViewKind::NumberedList => {
                if let Some(tag) = view_tag(kind) {
                    out.push(Outline {
                        tag,
                        text: node.text_content(),
                        children: outline_nodes(children, true),
                    });
                }
            }
            kind => match view_tag(kind) {
                Some(tag) => out.push(Outline {
                    tag,
                    text: node.text_content(),
                    children: outline_nodes(children, false),
                }),
                None => out.extend(outline_nodes(children, block_level)),
            },
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{AlignType, Mark, Marks, TreeNode};

    fn item(text: &str) -> TreeNode {
        TreeNode::element(BlockType::ListItem, vec![TreeNode::text(text)])
    }

    fn sample() -> Document {
        let bold = Marks::default().with(Mark::Bold);
        Document::from_tree(vec![
            TreeNode::element(BlockType::HeadingOne, vec![TreeNode::text("Outage report")])
                .with_align(AlignType::Center),
            TreeNode::element(
                BlockType::Paragraph,
                vec![
                    TreeNode::text("Fiber in "),
                    TreeNode::styled("zone 4", bold.with(Mark::Underline)),
                    TreeNode::text(" is back.\nThanks & sorry <3"),
                ],
            ),
            TreeNode::paragraph(""),
            TreeNode::element(
                BlockType::BulletedList,
                vec![item("north"), item(""), item("south")],
            ),
            TreeNode::element(BlockType::BlockQuote, vec![TreeNode::text("quoted")]),
            TreeNode::image("https://cdn.example/map.png"),
            TreeNode::element(BlockType::NumberedList, vec![item("first")]),
            TreeNode::element(BlockType::HeadingSix, vec![TreeNode::text("fin")]),
        ])
    }

    #[test]
    fn written_html_reads_back_with_same_structure_and_text() {
        let document = sample();
        let html = serialize_document(&document);
        let view = parse_html(&html);
        assert_eq!(view.outline(), Outline::of_document(&document));
    }

    #[test]
    fn outline_treats_top_level_break_as_empty_paragraph() {
        let view = parse_html("<br /><p>a<br />b</p>");
        assert_eq!(
            view.outline(),
            vec![
                Outline::leaf("p", String::new()),
                Outline::leaf("p", "a\nb".to_string()),
            ]
        );
    }

    #[test]
    fn freshly_created_document_round_trips() {
        let document = Document::new();
        let view = parse_html(&serialize_document(&document));
        assert_eq!(view.outline(), Outline::of_document(&document));
    }

    #[test]
    fn list_toggle_scenario_produces_single_list() {
        use crate::editor::{CaretPosition, DocumentEditor};

        let mut editor = DocumentEditor::new(Document::from_tree(vec![
            TreeNode::paragraph("a"),
            TreeNode::paragraph("b"),
            TreeNode::paragraph("c"),
        ]));
        editor.focus();
        editor.move_to_position(CaretPosition::new(2, 1), true);
        assert!(editor.toggle_block(BlockType::BulletedList));
        assert_eq!(
            serialize_document(editor.document()),
            "<ul><li>a</li><li>b</li><li>c</li></ul>"
        );
        assert!(editor.toggle_block(BlockType::BulletedList));
        assert_eq!(serialize_document(editor.document()), "<p>a</p><p>b</p><p>c</p>");
    }
}
