use super::content::{next_word_boundary, previous_word_boundary};
use super::{CaretPosition, DocumentEditor, Selection};

impl DocumentEditor {
    fn step_left(&self, position: CaretPosition) -> Option<CaretPosition> {
        if position.offset > 0 {
            return Some(CaretPosition::new(position.segment, position.offset - 1));
        }
        let previous = position.segment.checked_sub(1)?;
        let len = self.segments.get(previous)?.len;
        Some(CaretPosition::new(previous, len))
    }

    fn step_right(&self, position: CaretPosition) -> Option<CaretPosition> {
        let len = self.segments.get(position.segment)?.len;
        if position.offset < len {
            return Some(CaretPosition::new(position.segment, position.offset + 1));
        }
        self.segments.get(position.segment + 1)?;
        Some(CaretPosition::new(position.segment + 1, 0))
    }

    /// Without `extend`, an expanded selection collapses to its start.
    pub fn move_left(&mut self, extend: bool) -> bool {
        if !extend {
            if let Some((start, end)) = self.selection_range() {
                if start != end {
                    return self.move_to_position(start, false);
                }
            }
        }
        let Some(focus) = self.focus_position() else {
            return false;
        };
        match self.step_left(focus) {
            Some(target) => self.move_to_position(target, extend),
            None => false,
        }
    }

    pub fn move_right(&mut self, extend: bool) -> bool {
        if !extend {
            if let Some((start, end)) = self.selection_range() {
                if start != end {
                    return self.move_to_position(end, false);
                }
            }
        }
        let Some(focus) = self.focus_position() else {
            return false;
        };
        match self.step_right(focus) {
            Some(target) => self.move_to_position(target, extend),
            None => false,
        }
    }

    /// Previous block, keeping the column where possible.
    pub fn move_up(&mut self, extend: bool) -> bool {
        let Some(focus) = self.focus_position() else {
            return false;
        };
        if focus.segment == 0 {
            return self.move_to_position(CaretPosition::new(0, 0), extend);
        }
        self.move_to_position(CaretPosition::new(focus.segment - 1, focus.offset), extend)
    }

    pub fn move_down(&mut self, extend: bool) -> bool {
        let Some(focus) = self.focus_position() else {
            return false;
        };
        if focus.segment + 1 >= self.segments.len() {
            let len = self.segments.get(focus.segment).map(|s| s.len).unwrap_or(0);
            return self.move_to_position(CaretPosition::new(focus.segment, len), extend);
        }
        self.move_to_position(CaretPosition::new(focus.segment + 1, focus.offset), extend)
    }

    pub fn move_word_left(&mut self, extend: bool) -> bool {
        let Some(focus) = self.focus_position() else {
            return false;
        };
        if focus.offset == 0 {
            return self.move_left(extend);
        }
        let text = self.block_text(focus.segment);
        let target = previous_word_boundary(&text, focus.offset);
        self.move_to_position(CaretPosition::new(focus.segment, target), extend)
    }

    pub fn move_word_right(&mut self, extend: bool) -> bool {
        let Some(focus) = self.focus_position() else {
            return false;
        };
        let len = self.segment_len(focus.segment);
        if focus.offset >= len {
            return self.move_right(extend);
        }
        let text = self.block_text(focus.segment);
        let target = next_word_boundary(&text, focus.offset);
        self.move_to_position(CaretPosition::new(focus.segment, target), extend)
    }

    pub fn move_to_segment_start(&mut self, extend: bool) -> bool {
        let Some(focus) = self.focus_position() else {
            return false;
        };
        self.move_to_position(CaretPosition::new(focus.segment, 0), extend)
    }

    pub fn move_to_segment_end(&mut self, extend: bool) -> bool {
        let Some(focus) = self.focus_position() else {
            return false;
        };
        let len = self.segment_len(focus.segment);
        self.move_to_position(CaretPosition::new(focus.segment, len), extend)
    }

    pub fn move_to_document_start(&mut self, extend: bool) -> bool {
        self.move_to_position(CaretPosition::new(0, 0), extend)
    }

    pub fn move_to_document_end(&mut self, extend: bool) -> bool {
        let Some(last) = self.segments.len().checked_sub(1) else {
            return false;
        };
        let len = self.segments[last].len;
        self.move_to_position(CaretPosition::new(last, len), extend)
    }

    pub fn select_all(&mut self) -> bool {
        let Some(last) = self.segments.len().checked_sub(1) else {
            return false;
        };
        let start = self.point_at(CaretPosition::new(0, 0));
        let end = self.point_at(CaretPosition::new(last, self.segments[last].len));
        let (Some(anchor), Some(focus)) = (start, end) else {
            return false;
        };
        self.selection = Some(Selection::new(anchor, focus));
        self.pending_marks = None;
        true
    }

    pub fn collapse(&mut self) -> bool {
        match self.focus_position() {
            Some(focus) => self.move_to_position(focus, false),
            None => false,
        }
    }

    pub fn cursor_breadcrumbs(&self) -> Option<Vec<String>> {
        let focus = &self.selection.as_ref()?.focus;
        super::breadcrumbs_for_point(&self.document, focus)
    }
}
