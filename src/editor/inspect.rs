use super::{NodePath, Point, SegmentKind, SegmentRef};
use crate::document::{Document, Mark, NodeId};

use super::content::block_len;

pub fn collect_segments(document: &Document) -> Vec<SegmentRef> {
    let mut result = Vec::new();
    let mut path = NodePath::default();
    collect_rec(document, document.roots(), &mut path, &mut result);
    result
}

fn collect_rec(
    document: &Document,
    nodes: &[NodeId],
    path: &mut NodePath,
    out: &mut Vec<SegmentRef>,
) {
    for (idx, id) in nodes.iter().enumerate() {
        path.push(idx);
        if let Some(element) = document.element(*id) {
            if element.is_void() {
                out.push(SegmentRef {
                    block: *id,
                    path: path.clone(),
                    len: 0,
                    kind: SegmentKind::Void,
                });
            } else if document.is_text_block(*id) {
                out.push(SegmentRef {
                    block: *id,
                    path: path.clone(),
                    len: block_len(document, *id),
                    kind: SegmentKind::Text,
                });
            } else {
                collect_rec(document, &element.children, path, out);
            }
        }
        path.pop();
    }
}

/// Labels from the outermost element down to the marks active at `point`,
/// e.g. `["Bulleted List", "List Item", "Bold"]`.
pub fn breadcrumbs_for_point(document: &Document, point: &Point) -> Option<Vec<String>> {
    let node = document.node_at(point.path.indices())?;
    let mut labels = Vec::new();
    for ancestor in document.ancestors(node) {
        if let Some(element) = document.element(ancestor) {
            labels.push(element.kind.label().to_string());
        }
    }
    match document.element(node) {
        Some(element) => labels.push(element.kind.label().to_string()),
        None => {
            let leaf = document.leaf(node)?;
            labels.extend(
                Mark::ALL
                    .into_iter()
                    .filter(|mark| leaf.marks.has(*mark))
                    .map(|mark| mark.label().to_string()),
            );
        }
    }
    Some(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BlockType, Marks, TreeNode};

    fn sample() -> Document {
        Document::from_tree(vec![
            TreeNode::element(BlockType::HeadingTwo, vec![TreeNode::text("Title")]),
            TreeNode::element(
                BlockType::BulletedList,
                vec![TreeNode::element(
                    BlockType::ListItem,
                    vec![
                        TreeNode::text("plain "),
                        TreeNode::styled("loud", Marks::default().with(Mark::Bold)),
                    ],
                )],
            ),
            TreeNode::image("pic.png"),
        ])
    }

    #[test]
    fn segments_follow_document_order() {
        let document = sample();
        let segments = collect_segments(&document);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].path.indices(), &[0]);
        assert_eq!(segments[0].len, 5);
        assert_eq!(segments[1].path.indices(), &[1, 0]);
        assert_eq!(segments[1].len, 10);
        assert_eq!(segments[1].kind, SegmentKind::Text);
        assert_eq!(segments[2].kind, SegmentKind::Void);
        assert_eq!(segments[2].len, 0);
    }

    #[test]
    fn breadcrumbs_include_containers_and_marks() {
        let document = sample();
        let crumbs = breadcrumbs_for_point(&document, &Point::new(vec![1, 0, 1], 2));
        assert_eq!(
            crumbs,
            Some(vec![
                "Bulleted List".to_string(),
                "List Item".to_string(),
                "Bold".to_string()
            ])
        );
    }

    #[test]
    fn breadcrumbs_for_void_name_the_element() {
        let document = sample();
        let crumbs = breadcrumbs_for_point(&document, &Point::new(vec![2], 0));
        assert_eq!(crumbs, Some(vec!["Image".to_string()]));
    }

    #[test]
    fn breadcrumbs_for_missing_path_are_none() {
        let document = sample();
        assert_eq!(breadcrumbs_for_point(&document, &Point::new(vec![9, 0], 0)), None);
    }
}
