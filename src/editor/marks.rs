use super::content::{leaves_in_range, marks_at_offset, normalize_leaves};
use super::{CaretPosition, DocumentEditor, SegmentKind};
use crate::document::{Mark, Marks};

impl DocumentEditor {
    /// Marks the next typed character would get.
    pub fn active_marks(&self) -> Marks {
        match self.focus_position() {
            Some(position) => self.marks_at(position),
            None => Marks::default(),
        }
    }

    fn marks_at(&self, position: CaretPosition) -> Marks {
        if let Some(marks) = self.pending_marks {
            return marks;
        }
        match self.segments.get(position.segment) {
            Some(segment) if segment.kind == SegmentKind::Text => {
                marks_at_offset(&self.document, segment.block, position.offset)
            }
            _ => Marks::default(),
        }
    }

    /// Marks of every non-empty leaf overlapping `start..end`.
    fn marks_in_range(&self, start: CaretPosition, end: CaretPosition) -> Vec<Marks> {
        let mut found = Vec::new();
        for index in start.segment..=end.segment {
            let Some(segment) = self.segments.get(index) else {
                continue;
            };
            if segment.kind != SegmentKind::Text {
                continue;
            }
            let from = if index == start.segment { start.offset } else { 0 };
            let to = if index == end.segment {
                end.offset
            } else {
                segment.len
            };
            let mut leaf_start = 0;
            for child in self.document.children(segment.block) {
                let Some(leaf) = self.document.leaf(*child) else {
                    continue;
                };
                let leaf_end = leaf_start + leaf.char_len();
                if leaf_start < to && leaf_end > from {
                    found.push(leaf.marks);
                }
                leaf_start = leaf_end;
            }
        }
        found
    }

    /// With a collapsed selection this reports the marks at the caret
    /// (including pending ones); otherwise every selected leaf must carry
    /// the mark.
    pub fn is_mark_active(&self, mark: Mark) -> bool {
        let Some((start, end)) = self.selection_range() else {
            return false;
        };
        if start == end {
            return self.marks_at(start).has(mark);
        }
        let covered = self.marks_in_range(start, end);
        if covered.is_empty() {
            return self.marks_at(start).has(mark);
        }
        covered.iter().all(|marks| marks.has(mark))
    }

    pub fn toggle_mark(&mut self, mark: Mark) -> bool {
        let Some((start, end)) = self.selection_range() else {
            return false;
        };
        let active = self.is_mark_active(mark);

        if start == end {
            let mut marks = self.marks_at(start);
            marks.set(mark, !active);
            self.pending_marks = Some(marks);
            tracing::trace!(mark = mark.label(), enabled = !active, "pending mark");
            return true;
        }

        let saved = self.capture_selection();
        let segments = self.segments[start.segment..=end.segment].to_vec();
        let mut changed = false;
        for (idx, segment) in segments.iter().enumerate() {
            if segment.kind != SegmentKind::Text {
                continue;
            }
            let index = start.segment + idx;
            let from = if index == start.segment { start.offset } else { 0 };
            let to = if index == end.segment {
                end.offset
            } else {
                segment.len
            };
            if from >= to {
                continue;
            }
            for leaf in leaves_in_range(&mut self.document, segment.block, from, to) {
                if let Some(leaf) = self.document.leaf_mut(leaf) {
                    leaf.marks.set(mark, !active);
                    changed = true;
                }
            }
            normalize_leaves(&mut self.document, segment.block);
        }

        self.rebuild_segments();
        self.restore_selection(saved);
        tracing::debug!(mark = mark.label(), enabled = !active, changed, "toggled mark");
        changed
    }
}
