use crate::document::TreeNode;

use super::*;

fn editor_with(nodes: Vec<TreeNode>) -> DocumentEditor {
    let mut editor = DocumentEditor::new(Document::from_tree(nodes));
    editor.focus();
    editor
}

#[test]
fn move_right_crosses_block_boundary() {
    let mut editor = editor_with(vec![TreeNode::paragraph("ab"), TreeNode::paragraph("c")]);
    assert!(editor.move_to_position(CaretPosition::new(0, 2), false));
    assert!(editor.move_right(false));
    assert_eq!(editor.focus_position(), Some(CaretPosition::new(1, 0)));
    assert!(editor.move_left(false));
    assert_eq!(editor.focus_position(), Some(CaretPosition::new(0, 2)));
}

#[test]
fn move_left_at_document_start_fails() {
    let mut editor = editor_with(vec![TreeNode::paragraph("ab")]);
    assert!(!editor.move_left(false));
    assert!(editor.move_to_document_end(false));
    assert!(!editor.move_right(false));
}

#[test]
fn extending_selection_keeps_anchor() {
    let mut editor = editor_with(vec![TreeNode::paragraph("abc")]);
    assert!(editor.move_right(true));
    assert!(editor.move_right(true));
    assert_eq!(
        editor.selection_range(),
        Some((CaretPosition::new(0, 0), CaretPosition::new(0, 2)))
    );
    assert!(editor.has_expanded_selection());

    assert!(editor.move_left(false));
    assert_eq!(editor.focus_position(), Some(CaretPosition::new(0, 0)));
    assert!(!editor.has_expanded_selection());
}

#[test]
fn word_moves_stop_at_word_starts() {
    let mut editor = editor_with(vec![TreeNode::paragraph("hello brave world")]);
    assert!(editor.move_word_right(false));
    assert_eq!(editor.focus_position(), Some(CaretPosition::new(0, 6)));
    assert!(editor.move_word_right(false));
    assert_eq!(editor.focus_position(), Some(CaretPosition::new(0, 12)));
    assert!(editor.move_word_left(false));
    assert_eq!(editor.focus_position(), Some(CaretPosition::new(0, 6)));
}

#[test]
fn vertical_moves_clamp_column() {
    let mut editor = editor_with(vec![TreeNode::paragraph("abcdef"), TreeNode::paragraph("xy")]);
    assert!(editor.move_to_position(CaretPosition::new(0, 5), false));
    assert!(editor.move_down(false));
    assert_eq!(editor.focus_position(), Some(CaretPosition::new(1, 2)));
    assert!(editor.move_up(false));
    assert_eq!(editor.focus_position(), Some(CaretPosition::new(0, 2)));
}

#[test]
fn select_all_then_delete_leaves_empty_paragraph() {
    let mut editor = editor_with(vec![TreeNode::paragraph("ab"), TreeNode::paragraph("cd")]);
    assert!(editor.select_all());
    assert_eq!(
        editor.selection_range(),
        Some((CaretPosition::new(0, 0), CaretPosition::new(1, 2)))
    );
    assert!(editor.delete_selection());
    assert_eq!(editor.segments().len(), 1);
    assert_eq!(editor.block_text(0), "");
    assert_eq!(editor.document(), &Document::new());
}

#[test]
fn segment_start_and_end() {
    let mut editor = editor_with(vec![TreeNode::paragraph("abc")]);
    assert!(editor.move_to_segment_end(false));
    assert_eq!(editor.focus_position(), Some(CaretPosition::new(0, 3)));
    assert!(editor.move_to_segment_start(true));
    assert_eq!(
        editor.selection_range(),
        Some((CaretPosition::new(0, 0), CaretPosition::new(0, 3)))
    );
}

#[test]
fn breadcrumbs_follow_caret() {
    let editor = editor_with(vec![TreeNode::element(
        BlockType::BlockQuote,
        vec![TreeNode::text("quoted")],
    )]);
    assert_eq!(editor.cursor_breadcrumbs(), Some(vec!["Quote".to_string()]));
}
