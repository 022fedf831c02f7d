use super::*;
use crate::document::TreeNode;
use crate::html::parse_html;

fn text(line: &Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}

fn texts(lines: &[Line<'_>]) -> Vec<String> {
    lines.iter().map(text).collect()
}

fn editor(nodes: Vec<TreeNode>) -> DocumentEditor {
    let mut editor = DocumentEditor::new(Document::from_tree(nodes));
    editor.focus();
    editor
}

fn item(text: &str) -> TreeNode {
    TreeNode::element(BlockType::ListItem, vec![TreeNode::text(text)])
}

#[test]
fn top_level_blocks_are_separated_by_blank_lines() {
    let editor = editor(vec![TreeNode::paragraph("a"), TreeNode::paragraph("b")]);
    let result = render_document(&editor, 40, &Theme::default());
    assert_eq!(texts(&result.lines), vec!["a", "", "b"]);
    assert_eq!(result.total_lines, 3);
}

#[test]
fn list_items_get_markers() {
    let editor = editor(vec![
        TreeNode::element(BlockType::BulletedList, vec![item("north"), item("south")]),
        TreeNode::element(BlockType::NumberedList, vec![item("one"), item("two")]),
    ]);
    let result = render_document(&editor, 40, &Theme::default());
    assert_eq!(
        texts(&result.lines),
        vec!["\u{2022} north", "\u{2022} south", "", "1. one", "2. two"]
    );
}

#[test]
fn quote_lines_carry_a_bar() {
    let editor = editor(vec![TreeNode::element(
        BlockType::BlockQuote,
        vec![TreeNode::text("said so")],
    )]);
    let result = render_document(&editor, 40, &Theme::default());
    assert_eq!(texts(&result.lines), vec!["\u{2502} said so"]);
}

#[test]
fn first_two_heading_levels_are_ruled() {
    let editor = editor(vec![
        TreeNode::element(BlockType::HeadingOne, vec![TreeNode::text("Title")]),
        TreeNode::element(BlockType::HeadingTwo, vec![TreeNode::text("Sub")]),
        TreeNode::element(BlockType::HeadingThree, vec![TreeNode::text("Minor")]),
    ]);
    let result = render_document(&editor, 40, &Theme::default());
    assert_eq!(
        texts(&result.lines),
        vec!["Title", "=====", "", "Sub", "---", "", "Minor"]
    );
    assert!(result.lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
}

#[test]
fn caret_map_covers_every_offset() {
    let mut editor = editor(vec![TreeNode::paragraph("ab")]);
    editor.move_to_position(CaretPosition::new(0, 1), false);
    let result = render_document(&editor, 40, &Theme::default());
    assert_eq!(result.cursor_map.len(), 3);
    assert_eq!(result.cursor, Some(CursorVisualPosition { line: 0, column: 1 }));
    assert_eq!(
        result.visual_of(CaretPosition::new(0, 2)),
        Some(CursorVisualPosition { line: 0, column: 2 })
    );
}

#[test]
fn long_text_wraps_at_word_boundaries() {
    let editor = editor(vec![TreeNode::paragraph("alpha beta gamma")]);
    let result = render_document(&editor, 11, &Theme::default());
    assert_eq!(texts(&result.lines), vec!["alpha beta ", "gamma"]);
    assert_eq!(
        result.visual_of(CaretPosition::new(0, 11)),
        Some(CursorVisualPosition { line: 1, column: 0 })
    );
    assert_eq!(result.position_near(1, 3), Some(CaretPosition::new(0, 14)));
}

#[test]
fn soft_break_starts_a_new_line() {
    let editor = editor(vec![TreeNode::paragraph("a\nb")]);
    let result = render_document(&editor, 40, &Theme::default());
    assert_eq!(texts(&result.lines), vec!["a", "b"]);
    assert_eq!(
        result.visual_of(CaretPosition::new(0, 2)),
        Some(CursorVisualPosition { line: 1, column: 0 })
    );
}

#[test]
fn centered_block_is_padded_and_caret_follows() {
    let editor = editor(vec![TreeNode::paragraph("ab").with_align(AlignType::Center)]);
    let result = render_document(&editor, 10, &Theme::default());
    assert_eq!(texts(&result.lines), vec!["    ab"]);
    assert_eq!(result.cursor, Some(CursorVisualPosition { line: 0, column: 4 }));
}

#[test]
fn right_aligned_block_is_flush_right() {
    let editor = editor(vec![TreeNode::paragraph("ab").with_align(AlignType::Right)]);
    let result = render_document(&editor, 10, &Theme::default());
    assert_eq!(texts(&result.lines), vec!["        ab"]);
}

#[test]
fn selection_is_highlighted() {
    let theme = Theme::default();
    let mut editor = editor(vec![TreeNode::paragraph("ab")]);
    editor.select_all();
    let result = render_document(&editor, 40, &theme);
    assert!(
        result.lines[0]
            .spans
            .iter()
            .any(|span| span.style.bg == Some(theme.selection_bg))
    );
}

#[test]
fn images_show_a_placeholder_with_a_caret_stop() {
    let editor = editor(vec![
        TreeNode::image("data:image/png;base64,AAAA"),
        TreeNode::paragraph(""),
    ]);
    let result = render_document(&editor, 40, &Theme::default());
    assert_eq!(text(&result.lines[0]), "[image: embedded image/png]");
    assert_eq!(
        result.visual_of(CaretPosition::new(0, 0)),
        Some(CursorVisualPosition { line: 0, column: 0 })
    );
}

#[test]
fn long_image_urls_are_shortened() {
    let url = format!("https://cdn.example/{}", "x".repeat(80));
    let label = image_label(&url);
    assert!(label.ends_with("\u{2026}]"));
    assert_eq!(label.chars().count(), "[image: ]".chars().count() + IMAGE_LABEL_LIMIT + 1);
    assert_eq!(image_label("/a.png"), "[image: /a.png]");
}

#[test]
fn view_tree_renders_blocks_and_breaks() {
    let view = parse_html("<h2>News</h2><ul><li>a</li><li>b</li></ul><p>x<br />y</p>");
    let lines = render_view(&view, 40, &Theme::default());
    assert_eq!(
        texts(&lines),
        vec!["News", "----", "", "\u{2022} a", "\u{2022} b", "", "x", "y"]
    );
}

#[test]
fn view_tree_applies_inline_styles_and_alignment() {
    let view = parse_html("<div style=\"text-align: right\"><p>a <strong>b</strong></p></div>");
    let lines = render_view(&view, 10, &Theme::default());
    assert_eq!(texts(&lines), vec!["       a b"]);
    let bold = lines[0]
        .spans
        .iter()
        .find(|span| span.content.as_ref() == "b")
        .map(|span| span.style);
    assert!(bold.is_some_and(|style| style.add_modifier.contains(Modifier::BOLD)));
}

#[test]
fn empty_view_renders_one_blank_line() {
    let lines = render_view(&parse_html(""), 10, &Theme::default());
    assert_eq!(texts(&lines), vec![""]);
}
