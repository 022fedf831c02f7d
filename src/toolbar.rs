//! Formatting controls and their dispatch onto a [`DocumentEditor`].
//!
//! The toolbar holds no editor of its own; callers pass the one that has
//! focus.

use crossterm::event::{KeyCode, KeyModifiers};

use crate::document::{AlignType, BlockType, Mark};
use crate::editor::DocumentEditor;
use crate::upload::PreparedImage;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolbarCommand {
    ToggleMark(Mark),
    ToggleBlock(BlockType),
    ToggleAlign(AlignType),
    InsertImage,
}

/// Alt plus a key, optionally with Shift.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shortcut {
    pub key: char,
    pub requires_shift: bool,
}

impl Shortcut {
    pub const fn new(key: char) -> Self {
        Self {
            key,
            requires_shift: false,
        }
    }

    pub const fn with_shift(key: char) -> Self {
        Self {
            key,
            requires_shift: true,
        }
    }

    pub fn matches(&self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        let KeyCode::Char(ch) = code else {
            return false;
        };
        if !modifiers.contains(KeyModifiers::ALT) || modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        // Some terminals report Shift only through the uppercase char.
        let shifted = modifiers.contains(KeyModifiers::SHIFT) || ch.is_ascii_uppercase();
        ch.to_ascii_lowercase() == self.key && shifted == self.requires_shift
    }

    pub fn label(&self) -> String {
        if self.requires_shift {
            format!("Alt+Shift+{}", self.key.to_ascii_uppercase())
        } else {
            format!("Alt+{}", self.key)
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Control {
    pub label: &'static str,
    pub icon: &'static str,
    pub command: ToolbarCommand,
    pub shortcut: Shortcut,
}

const fn control(
    label: &'static str,
    icon: &'static str,
    command: ToolbarCommand,
    shortcut: Shortcut,
) -> Control {
    Control {
        label,
        icon,
        command,
        shortcut,
    }
}

pub const CONTROLS: &[Control] = &[
    control("Bold", "B", ToolbarCommand::ToggleMark(Mark::Bold), Shortcut::new('b')),
    control("Italic", "I", ToolbarCommand::ToggleMark(Mark::Italic), Shortcut::new('i')),
    control("Underline", "U", ToolbarCommand::ToggleMark(Mark::Underline), Shortcut::new('u')),
    control("Heading 1", "H1", ToolbarCommand::ToggleBlock(BlockType::HeadingOne), Shortcut::new('1')),
    control("Heading 2", "H2", ToolbarCommand::ToggleBlock(BlockType::HeadingTwo), Shortcut::new('2')),
    control("Heading 3", "H3", ToolbarCommand::ToggleBlock(BlockType::HeadingThree), Shortcut::new('3')),
    control("Heading 4", "H4", ToolbarCommand::ToggleBlock(BlockType::HeadingFour), Shortcut::new('4')),
    control("Heading 5", "H5", ToolbarCommand::ToggleBlock(BlockType::HeadingFive), Shortcut::new('5')),
    control("Heading 6", "H6", ToolbarCommand::ToggleBlock(BlockType::HeadingSix), Shortcut::new('6')),
    control("Quote", "\u{201c}", ToolbarCommand::ToggleBlock(BlockType::BlockQuote), Shortcut::new('q')),
    control("Bulleted list", "\u{2022}", ToolbarCommand::ToggleBlock(BlockType::BulletedList), Shortcut::new('8')),
    control("Numbered list", "1.", ToolbarCommand::ToggleBlock(BlockType::NumberedList), Shortcut::new('7')),
    control("Align left", "\u{21e4}", ToolbarCommand::ToggleAlign(AlignType::Left), Shortcut::with_shift('l')),
    control("Align center", "\u{2194}", ToolbarCommand::ToggleAlign(AlignType::Center), Shortcut::with_shift('e')),
    control("Align right", "\u{21e5}", ToolbarCommand::ToggleAlign(AlignType::Right), Shortcut::with_shift('r')),
    control("Justify", "\u{2261}", ToolbarCommand::ToggleAlign(AlignType::Justify), Shortcut::with_shift('j')),
    control("Image", "\u{25a3}", ToolbarCommand::InsertImage, Shortcut::new('p')),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Applied,
    Unchanged,
    /// The caller has to pick a file and come back with
    /// [`Toolbar::insert_prepared_image`].
    ImageRequested,
}

pub struct Toolbar;

impl Toolbar {
    pub fn controls() -> &'static [Control] {
        CONTROLS
    }

    pub fn find_shortcut(code: KeyCode, modifiers: KeyModifiers) -> Option<&'static Control> {
        CONTROLS
            .iter()
            .find(|control| control.shortcut.matches(code, modifiers))
    }

    pub fn dispatch(editor: &mut DocumentEditor, command: ToolbarCommand) -> DispatchOutcome {
        if editor.selection().is_none() {
            return DispatchOutcome::Unchanged;
        }
        let changed = match command {
            ToolbarCommand::ToggleMark(mark) => editor.toggle_mark(mark),
            ToolbarCommand::ToggleBlock(kind) => editor.toggle_block(kind),
            ToolbarCommand::ToggleAlign(align) => editor.toggle_align(align),
            ToolbarCommand::InsertImage => return DispatchOutcome::ImageRequested,
        };
        tracing::trace!(?command, changed, "toolbar command");
        if changed {
            DispatchOutcome::Applied
        } else {
            DispatchOutcome::Unchanged
        }
    }

    pub fn is_pressed(editor: &DocumentEditor, command: ToolbarCommand) -> bool {
        if editor.selection().is_none() {
            return false;
        }
        match command {
            ToolbarCommand::ToggleMark(mark) => editor.is_mark_active(mark),
            ToolbarCommand::ToggleBlock(kind) => editor.is_block_active(kind),
            ToolbarCommand::ToggleAlign(align) => editor.is_align_active(align),
            ToolbarCommand::InsertImage => false,
        }
    }

    pub fn insert_prepared_image(editor: &mut DocumentEditor, image: &PreparedImage) -> bool {
        let inserted = editor.insert_image(&image.src);
        if inserted {
            tracing::info!(name = %image.name, mime_type = %image.mime_type, "image inserted");
        }
        inserted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, TreeNode};
    use crate::editor::CaretPosition;

    fn editor_with(text: &str) -> DocumentEditor {
        let mut editor = DocumentEditor::new(Document::from_tree(vec![TreeNode::paragraph(text)]));
        editor.focus();
        editor
    }

    #[test]
    fn every_control_has_a_distinct_shortcut() {
        for (idx, control) in CONTROLS.iter().enumerate() {
            for other in &CONTROLS[idx + 1..] {
                assert_ne!(control.shortcut, other.shortcut, "{} vs {}", control.label, other.label);
            }
        }
    }

    #[test]
    fn shortcuts_need_alt() {
        let bold = Toolbar::find_shortcut(KeyCode::Char('b'), KeyModifiers::ALT);
        assert_eq!(bold.map(|c| c.command), Some(ToolbarCommand::ToggleMark(Mark::Bold)));
        assert!(Toolbar::find_shortcut(KeyCode::Char('b'), KeyModifiers::NONE).is_none());
        assert!(
            Toolbar::find_shortcut(KeyCode::Char('b'), KeyModifiers::ALT | KeyModifiers::CONTROL)
                .is_none()
        );
    }

    #[test]
    fn shifted_shortcuts_accept_uppercase_reports() {
        let center = Toolbar::find_shortcut(KeyCode::Char('E'), KeyModifiers::ALT);
        assert_eq!(
            center.map(|c| c.command),
            Some(ToolbarCommand::ToggleAlign(AlignType::Center))
        );
        let center = Toolbar::find_shortcut(
            KeyCode::Char('e'),
            KeyModifiers::ALT | KeyModifiers::SHIFT,
        );
        assert!(center.is_some());
        assert!(Toolbar::find_shortcut(KeyCode::Char('e'), KeyModifiers::ALT).is_none());
        assert_eq!(Shortcut::with_shift('e').label(), "Alt+Shift+E");
    }

    #[test]
    fn dispatch_without_selection_is_ignored() {
        let mut editor = DocumentEditor::new(Document::from_tree(vec![TreeNode::paragraph("x")]));
        for control in CONTROLS {
            assert_eq!(
                Toolbar::dispatch(&mut editor, control.command),
                DispatchOutcome::Unchanged
            );
            assert!(!Toolbar::is_pressed(&editor, control.command));
        }
        assert_eq!(editor.document().to_tree(), vec![TreeNode::paragraph("x")]);
    }

    #[test]
    fn bold_control_presses_after_dispatch() {
        let mut editor = editor_with("news");
        editor.select_all();
        let bold = ToolbarCommand::ToggleMark(Mark::Bold);
        assert!(!Toolbar::is_pressed(&editor, bold));
        assert_eq!(Toolbar::dispatch(&mut editor, bold), DispatchOutcome::Applied);
        assert!(Toolbar::is_pressed(&editor, bold));
        assert!(!Toolbar::is_pressed(&editor, ToolbarCommand::ToggleMark(Mark::Italic)));
    }

    #[test]
    fn heading_control_toggles_back() {
        let mut editor = editor_with("title");
        let heading = ToolbarCommand::ToggleBlock(BlockType::HeadingTwo);
        Toolbar::dispatch(&mut editor, heading);
        assert!(Toolbar::is_pressed(&editor, heading));
        assert_eq!(editor.block_kind(0), Some(BlockType::HeadingTwo));
        Toolbar::dispatch(&mut editor, heading);
        assert_eq!(editor.block_kind(0), Some(BlockType::Paragraph));
    }

    #[test]
    fn image_control_defers_to_caller() {
        let mut editor = editor_with("caption");
        assert_eq!(
            Toolbar::dispatch(&mut editor, ToolbarCommand::InsertImage),
            DispatchOutcome::ImageRequested
        );
        let image = PreparedImage {
            name: "map.png".to_string(),
            mime_type: "image/png".to_string(),
            src: "https://cdn.example/map.png".to_string(),
        };
        editor.move_to_position(CaretPosition::new(0, 7), false);
        assert!(Toolbar::insert_prepared_image(&mut editor, &image));
        assert_eq!(
            editor.document().image_urls(),
            vec!["https://cdn.example/map.png".to_string()]
        );
    }
}
