use crate::document::{AlignType, TreeNode};

use super::*;

fn editor_with(nodes: Vec<TreeNode>) -> DocumentEditor {
    let mut editor = DocumentEditor::new(Document::from_tree(nodes));
    editor.focus();
    editor
}

fn select(editor: &mut DocumentEditor, from: (usize, usize), to: (usize, usize)) {
    assert!(editor.move_to_position(CaretPosition::new(from.0, from.1), false));
    assert!(editor.move_to_position(CaretPosition::new(to.0, to.1), true));
}

fn item(text: &str) -> TreeNode {
    TreeNode::element(BlockType::ListItem, vec![TreeNode::text(text)])
}

#[test]
fn toggle_heading_sets_and_clears_block_type() {
    let mut editor = editor_with(vec![TreeNode::paragraph("Title")]);
    assert!(editor.toggle_block(BlockType::HeadingOne));
    assert_eq!(editor.block_kind(0), Some(BlockType::HeadingOne));
    assert!(editor.is_block_active(BlockType::HeadingOne));

    assert!(editor.toggle_block(BlockType::HeadingOne));
    assert_eq!(editor.block_kind(0), Some(BlockType::Paragraph));
    assert!(!editor.is_block_active(BlockType::HeadingOne));
}

#[test]
fn toggle_list_wraps_and_unwraps() {
    let mut editor = editor_with(vec![TreeNode::paragraph("a"), TreeNode::paragraph("b")]);
    let before = editor.document().clone();
    select(&mut editor, (0, 0), (1, 1));

    assert!(editor.toggle_block(BlockType::BulletedList));
    assert_eq!(
        editor.document().to_tree(),
        vec![TreeNode::element(
            BlockType::BulletedList,
            vec![item("a"), item("b")],
        )]
    );
    assert!(editor.is_block_active(BlockType::BulletedList));
    assert_eq!(
        editor.selection_range(),
        Some((CaretPosition::new(0, 0), CaretPosition::new(1, 1)))
    );

    assert!(editor.toggle_block(BlockType::BulletedList));
    assert_eq!(editor.document(), &before);
}

#[test]
fn switching_list_kind_rewraps_items() {
    let mut editor = editor_with(vec![TreeNode::element(
        BlockType::BulletedList,
        vec![item("a"), item("b")],
    )]);
    select(&mut editor, (0, 0), (1, 1));
    assert!(!editor.is_block_active(BlockType::NumberedList));
    assert!(editor.toggle_block(BlockType::NumberedList));
    assert_eq!(
        editor.document().to_tree(),
        vec![TreeNode::element(
            BlockType::NumberedList,
            vec![item("a"), item("b")],
        )]
    );
}

#[test]
fn toggling_list_off_for_middle_item_splits_list() {
    let mut editor = editor_with(vec![TreeNode::element(
        BlockType::BulletedList,
        vec![item("a"), item("b"), item("c")],
    )]);
    assert!(editor.move_to_position(CaretPosition::new(1, 0), false));
    assert!(editor.toggle_block(BlockType::BulletedList));
    assert_eq!(
        editor.document().to_tree(),
        vec![
            TreeNode::element(BlockType::BulletedList, vec![item("a")]),
            TreeNode::paragraph("b"),
            TreeNode::element(BlockType::BulletedList, vec![item("c")]),
        ]
    );
    assert_eq!(editor.focus_position(), Some(CaretPosition::new(1, 0)));
}

#[test]
fn heading_inside_list_lifts_item() {
    let mut editor = editor_with(vec![TreeNode::element(
        BlockType::NumberedList,
        vec![item("a")],
    )]);
    assert!(editor.toggle_block(BlockType::HeadingTwo));
    assert_eq!(
        editor.document().to_tree(),
        vec![TreeNode::element(
            BlockType::HeadingTwo,
            vec![TreeNode::text("a")],
        )]
    );
}

#[test]
fn selection_ending_at_block_start_excludes_that_block() {
    let mut editor = editor_with(vec![TreeNode::paragraph("a"), TreeNode::paragraph("b")]);
    select(&mut editor, (0, 0), (1, 0));
    assert!(editor.toggle_block(BlockType::HeadingOne));
    assert_eq!(editor.block_kind(0), Some(BlockType::HeadingOne));
    assert_eq!(editor.block_kind(1), Some(BlockType::Paragraph));
}

#[test]
fn block_is_active_when_any_selected_block_matches() {
    let mut editor = editor_with(vec![
        TreeNode::element(BlockType::HeadingOne, vec![TreeNode::text("a")]),
        TreeNode::paragraph("b"),
    ]);
    select(&mut editor, (0, 0), (1, 1));
    assert!(editor.is_block_active(BlockType::HeadingOne));
    assert!(editor.is_block_active(BlockType::Paragraph));
    assert!(!editor.is_block_active(BlockType::BlockQuote));
}

#[test]
fn toggle_block_rejects_non_toggleable_types() {
    let mut editor = editor_with(vec![TreeNode::paragraph("a")]);
    assert!(!editor.toggle_block(BlockType::ListItem));
    assert!(!editor.toggle_block(BlockType::Image));
    assert_eq!(editor.block_kind(0), Some(BlockType::Paragraph));
}

#[test]
fn toggle_align_sets_and_clears() {
    let mut editor = editor_with(vec![TreeNode::paragraph("x")]);
    assert!(editor.is_align_active(AlignType::Left));

    assert!(editor.toggle_align(AlignType::Center));
    let root = editor.document().roots()[0];
    assert_eq!(
        editor.document().element(root).and_then(|e| e.align),
        Some(AlignType::Center)
    );
    assert!(editor.is_align_active(AlignType::Center));
    assert!(!editor.is_align_active(AlignType::Left));

    assert!(editor.toggle_align(AlignType::Center));
    assert_eq!(editor.document().element(root).and_then(|e| e.align), None);

    assert!(editor.toggle_align(AlignType::Right));
    assert!(editor.toggle_align(AlignType::Left));
    assert_eq!(editor.document().element(root).and_then(|e| e.align), None);
    assert!(editor.is_align_active(AlignType::Left));
}

#[test]
fn alignment_survives_block_type_changes() {
    let mut editor = editor_with(vec![TreeNode::paragraph("x").with_align(AlignType::Justify)]);
    assert!(editor.toggle_block(BlockType::BlockQuote));
    assert_eq!(editor.current_alignment(), Some(AlignType::Justify));
}
