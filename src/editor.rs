use std::cmp::Ordering;

use crate::document::{BlockType, Document, Marks, NodeId, ensure_document_initialized};

use content::{
    block_len, insert_text_in_block, leaf_at_offset, leaf_start, previous_word_boundary,
    remove_block_text,
};
use inspect::collect_segments;
use structure::{insert_empty_paragraph_after, merge_blocks, remove_block, split_block};

mod content;
mod cursor;
mod inspect;
mod marks;
mod structure;

pub use inspect::breadcrumbs_for_point;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath {
    indices: Vec<usize>,
}

impl NodePath {
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn new_root(idx: usize) -> Self {
        Self { indices: vec![idx] }
    }

    pub fn push(&mut self, idx: usize) {
        self.indices.push(idx);
    }

    pub fn pop(&mut self) {
        self.indices.pop();
    }

    pub fn child(&self, idx: usize) -> Self {
        let mut path = self.clone();
        path.push(idx);
        path
    }

    pub fn parent(&self) -> Option<NodePath> {
        let (_, prefix) = self.indices.split_last()?;
        Some(NodePath::new(prefix.to_vec()))
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// A caret location: path to a text leaf (or to a void element) and a
/// character offset inside it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Point {
    pub path: NodePath,
    pub offset: usize,
}

impl Point {
    pub fn new(indices: Vec<usize>, offset: usize) -> Self {
        Self {
            path: NodePath::new(indices),
            offset,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// Position in segment space: which block, and the character offset across
/// all of its leaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaretPosition {
    pub segment: usize,
    pub offset: usize,
}

impl CaretPosition {
    pub fn new(segment: usize, offset: usize) -> Self {
        Self { segment, offset }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    Text,
    Void,
}

/// One caret-addressable block, in document order.
#[derive(Clone, Debug)]
pub struct SegmentRef {
    pub block: NodeId,
    pub path: NodePath,
    pub len: usize,
    pub kind: SegmentKind,
}

/// Block-relative location that survives structural edits, since block ids
/// are stable while paths are not.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct BlockAnchor {
    block: NodeId,
    offset: usize,
}

#[derive(Clone, Copy, Debug)]
struct SavedSelection {
    anchor: BlockAnchor,
    focus: BlockAnchor,
    fallback: CaretPosition,
}

#[derive(Clone, Copy)]
enum RemovalDirection {
    Backward,
    Forward,
}

#[derive(Clone, Debug)]
pub struct DocumentEditor {
    document: Document,
    segments: Vec<SegmentRef>,
    selection: Option<Selection>,
    pending_marks: Option<Marks>,
}

impl DocumentEditor {
    pub fn new(mut document: Document) -> Self {
        ensure_document_initialized(&mut document);
        let mut editor = Self {
            document,
            segments: Vec::new(),
            selection: None,
            pending_marks: None,
        };
        editor.rebuild_segments();
        editor
    }

    /// Places the caret at the start of the document unless a selection exists.
    pub fn focus(&mut self) {
        if self.selection.is_none() {
            self.move_to_position(CaretPosition::new(0, 0), false);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.pending_marks = None;
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn segments(&self) -> &[SegmentRef] {
        &self.segments
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn pending_marks(&self) -> Option<Marks> {
        self.pending_marks
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) -> bool {
        self.pending_marks = None;
        let Some(selection) = selection else {
            self.selection = None;
            return true;
        };
        let (Some(anchor), Some(focus)) = (
            self.position_of(&selection.anchor),
            self.position_of(&selection.focus),
        ) else {
            return false;
        };
        let (Some(anchor), Some(focus)) = (self.point_at(anchor), self.point_at(focus)) else {
            return false;
        };
        self.selection = Some(Selection { anchor, focus });
        true
    }

    pub fn position_of(&self, point: &Point) -> Option<CaretPosition> {
        let node = self.document.node_at(point.path.indices())?;
        if self.document.element(node).is_some() {
            let segment = self.segment_index_of(node)?;
            let len = self.segments[segment].len;
            return Some(CaretPosition::new(segment, point.offset.min(len)));
        }
        let block_path = point.path.parent()?;
        let block = self.document.node_at(block_path.indices())?;
        let segment = self.segment_index_of(block)?;
        let leaf_index = *point.path.indices().last()?;
        let leaf_len = self.document.leaf(node)?.char_len();
        let start = leaf_start(&self.document, block, leaf_index);
        Some(CaretPosition::new(segment, start + point.offset.min(leaf_len)))
    }

    pub fn point_at(&self, position: CaretPosition) -> Option<Point> {
        let segment = self.segments.get(position.segment)?;
        match segment.kind {
            SegmentKind::Void => Some(Point {
                path: segment.path.clone(),
                offset: 0,
            }),
            SegmentKind::Text => {
                let offset = position.offset.min(segment.len);
                let (leaf_index, local) = leaf_at_offset(&self.document, segment.block, offset)?;
                Some(Point {
                    path: segment.path.child(leaf_index),
                    offset: local,
                })
            }
        }
    }

    pub fn focus_position(&self) -> Option<CaretPosition> {
        self.position_of(&self.selection.as_ref()?.focus)
    }

    pub fn anchor_position(&self) -> Option<CaretPosition> {
        self.position_of(&self.selection.as_ref()?.anchor)
    }

    /// Ordered (start, end) of the current selection.
    pub fn selection_range(&self) -> Option<(CaretPosition, CaretPosition)> {
        let anchor = self.anchor_position()?;
        let focus = self.focus_position()?;
        if anchor <= focus {
            Some((anchor, focus))
        } else {
            Some((focus, anchor))
        }
    }

    pub fn has_expanded_selection(&self) -> bool {
        self.selection_range()
            .map(|(start, end)| start != end)
            .unwrap_or(false)
    }

    pub fn compare_points(&self, a: &Point, b: &Point) -> Option<Ordering> {
        Some(self.position_of(a)?.cmp(&self.position_of(b)?))
    }

    pub fn move_to_position(&mut self, position: CaretPosition, extend: bool) -> bool {
        if self.segments.is_empty() {
            return false;
        }
        let segment = position.segment.min(self.segments.len() - 1);
        let offset = position.offset.min(self.segments[segment].len);
        let Some(focus) = self.point_at(CaretPosition::new(segment, offset)) else {
            return false;
        };
        let anchor = match (&self.selection, extend) {
            (Some(selection), true) => selection.anchor.clone(),
            _ => focus.clone(),
        };
        self.selection = Some(Selection { anchor, focus });
        self.pending_marks = None;
        true
    }

    pub fn block_text(&self, segment: usize) -> String {
        self.segments
            .get(segment)
            .map(|segment| self.document.text_content(segment.block))
            .unwrap_or_default()
    }

    pub fn block_kind(&self, segment: usize) -> Option<BlockType> {
        let segment = self.segments.get(segment)?;
        self.document.element(segment.block).map(|element| element.kind)
    }

    fn segment_index_of(&self, block: NodeId) -> Option<usize> {
        self.segments.iter().position(|segment| segment.block == block)
    }

    pub(crate) fn rebuild_segments(&mut self) {
        self.segments = collect_segments(&self.document);
    }

    fn block_anchor(&self, position: CaretPosition) -> Option<BlockAnchor> {
        let segment = self.segments.get(position.segment)?;
        Some(BlockAnchor {
            block: segment.block,
            offset: position.offset,
        })
    }

    fn position_for_anchor(&self, anchor: BlockAnchor) -> Option<CaretPosition> {
        let segment = self.segment_index_of(anchor.block)?;
        let len = self.segments[segment].len;
        Some(CaretPosition::new(segment, anchor.offset.min(len)))
    }

    fn capture_selection(&self) -> Option<SavedSelection> {
        let anchor = self.anchor_position()?;
        let focus = self.focus_position()?;
        Some(SavedSelection {
            anchor: self.block_anchor(anchor)?,
            focus: self.block_anchor(focus)?,
            fallback: focus,
        })
    }

    /// Recomputes selection paths after a structural edit.
    fn restore_selection(&mut self, saved: Option<SavedSelection>) {
        let Some(saved) = saved else {
            return;
        };
        if self.segments.is_empty() {
            self.selection = None;
            return;
        }
        let last = self.segments.len() - 1;
        let fallback = CaretPosition::new(saved.fallback.segment.min(last), 0);
        let anchor = self.position_for_anchor(saved.anchor).unwrap_or(fallback);
        let focus = self.position_for_anchor(saved.focus).unwrap_or(fallback);
        let (Some(anchor), Some(focus)) = (self.point_at(anchor), self.point_at(focus)) else {
            return;
        };
        self.selection = Some(Selection { anchor, focus });
    }

    fn place_caret_at_anchor(&mut self, anchor: BlockAnchor, fallback: CaretPosition) -> bool {
        let target = self.position_for_anchor(anchor).unwrap_or(fallback);
        self.move_to_position(target, false)
    }

    fn finish_structural_edit(&mut self) {
        ensure_document_initialized(&mut self.document);
        self.rebuild_segments();
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        let mut buf = [0u8; 4];
        self.insert_text(ch.encode_utf8(&mut buf))
    }

    pub fn insert_text(&mut self, text: &str) -> bool {
        if self.selection.is_none() || text.is_empty() {
            return false;
        }
        if self.has_expanded_selection() {
            self.delete_selection();
        }
        let Some(mut position) = self.focus_position() else {
            return false;
        };
        if self.segments[position.segment].kind == SegmentKind::Void {
            let Some(opened) = self.open_paragraph_after(position.segment) else {
                return false;
            };
            position = opened;
        }
        let block = self.segments[position.segment].block;
        let marks = self.pending_marks.take();
        let inserted =
            insert_text_in_block(&mut self.document, block, position.offset, text, marks);
        self.rebuild_segments();
        tracing::trace!(block = block.index(), offset = position.offset, inserted, "inserted text");
        self.place_caret_at_anchor(
            BlockAnchor {
                block,
                offset: position.offset + inserted,
            },
            position,
        )
    }

    /// Line break inside the current block, written out as `<br />`.
    pub fn insert_soft_break(&mut self) -> bool {
        self.insert_text("\n")
    }

    pub fn insert_block_break(&mut self) -> bool {
        if self.selection.is_none() {
            return false;
        }
        if self.has_expanded_selection() {
            self.delete_selection();
        }
        let Some(position) = self.focus_position() else {
            return false;
        };
        let segment = self.segments[position.segment].clone();
        if segment.kind == SegmentKind::Void {
            let Some(opened) = self.open_paragraph_after(position.segment) else {
                return false;
            };
            return self.move_to_position(opened, false);
        }

        let kind = self
            .document
            .element(segment.block)
            .map(|element| element.kind)
            .unwrap_or(BlockType::Paragraph);
        if kind == BlockType::ListItem && segment.len == 0 {
            let list_kind = self
                .document
                .ancestors(segment.block)
                .last()
                .and_then(|parent| self.document.element(*parent))
                .map(|element| element.kind)
                .filter(|kind| kind.is_list());
            if let Some(list_kind) = list_kind {
                return self.toggle_block(list_kind);
            }
        }

        let continues_as_paragraph = position.offset == segment.len
            && (kind.heading_level().is_some() || kind == BlockType::BlockQuote);
        let Some(new_block) = split_block(&mut self.document, segment.block, position.offset)
        else {
            return false;
        };
        if continues_as_paragraph {
            if let Some(element) = self.document.element_mut(new_block) {
                element.kind = BlockType::Paragraph;
            }
        }
        self.rebuild_segments();
        tracing::trace!(block = segment.block.index(), offset = position.offset, "split block");
        self.place_caret_at_anchor(
            BlockAnchor {
                block: new_block,
                offset: 0,
            },
            position,
        )
    }

    pub fn backspace(&mut self) -> bool {
        if self.selection.is_none() {
            return false;
        }
        if self.has_expanded_selection() {
            return self.delete_selection();
        }
        let Some(position) = self.focus_position() else {
            return false;
        };
        let segment = self.segments[position.segment].clone();
        if segment.kind == SegmentKind::Void {
            return self.remove_void_segment(position.segment, RemovalDirection::Backward);
        }

        if position.offset > 0 {
            remove_block_text(
                &mut self.document,
                segment.block,
                position.offset - 1,
                position.offset,
            );
            self.rebuild_segments();
            return self.place_caret_at_anchor(
                BlockAnchor {
                    block: segment.block,
                    offset: position.offset - 1,
                },
                position,
            );
        }

        if position.segment == 0 {
            return self.reset_leading_block(segment.block);
        }

        let previous = self.segments[position.segment - 1].clone();
        match previous.kind {
            SegmentKind::Void => {
                remove_block(&mut self.document, previous.block);
                self.finish_structural_edit();
                self.place_caret_at_anchor(
                    BlockAnchor {
                        block: segment.block,
                        offset: 0,
                    },
                    position,
                )
            }
            SegmentKind::Text => {
                merge_blocks(&mut self.document, previous.block, segment.block);
                self.finish_structural_edit();
                self.place_caret_at_anchor(
                    BlockAnchor {
                        block: previous.block,
                        offset: previous.len,
                    },
                    CaretPosition::new(position.segment - 1, previous.len),
                )
            }
        }
    }

    pub fn delete_forward(&mut self) -> bool {
        if self.selection.is_none() {
            return false;
        }
        if self.has_expanded_selection() {
            return self.delete_selection();
        }
        let Some(position) = self.focus_position() else {
            return false;
        };
        let segment = self.segments[position.segment].clone();
        if segment.kind == SegmentKind::Void {
            return self.remove_void_segment(position.segment, RemovalDirection::Forward);
        }

        if position.offset < segment.len {
            remove_block_text(
                &mut self.document,
                segment.block,
                position.offset,
                position.offset + 1,
            );
            self.rebuild_segments();
            return self.place_caret_at_anchor(
                BlockAnchor {
                    block: segment.block,
                    offset: position.offset,
                },
                position,
            );
        }

        let Some(next) = self.segments.get(position.segment + 1).cloned() else {
            return false;
        };
        match next.kind {
            SegmentKind::Void => remove_block(&mut self.document, next.block),
            SegmentKind::Text => merge_blocks(&mut self.document, segment.block, next.block),
        };
        self.finish_structural_edit();
        self.place_caret_at_anchor(
            BlockAnchor {
                block: segment.block,
                offset: position.offset,
            },
            position,
        )
    }

    pub fn delete_word_backward(&mut self) -> bool {
        if self.has_expanded_selection() {
            return self.delete_selection();
        }
        let Some(position) = self.focus_position() else {
            return false;
        };
        if position.offset == 0 || self.segments[position.segment].kind == SegmentKind::Void {
            return self.backspace();
        }
        let block = self.segments[position.segment].block;
        let text = self.document.text_content(block);
        let boundary = previous_word_boundary(&text, position.offset);
        remove_block_text(&mut self.document, block, boundary, position.offset);
        self.rebuild_segments();
        self.place_caret_at_anchor(
            BlockAnchor {
                block,
                offset: boundary,
            },
            position,
        )
    }

    /// Removes everything inside the selection and joins the boundary blocks.
    pub fn delete_selection(&mut self) -> bool {
        let Some((start, end)) = self.selection_range() else {
            return false;
        };
        if start == end {
            return false;
        }
        let first = self.segments[start.segment].clone();
        let last = self.segments[end.segment].clone();

        if start.segment == end.segment {
            remove_block_text(&mut self.document, first.block, start.offset, end.offset);
            self.rebuild_segments();
            return self.place_caret_at_anchor(
                BlockAnchor {
                    block: first.block,
                    offset: start.offset,
                },
                start,
            );
        }

        let middle: Vec<NodeId> = self.segments[start.segment + 1..end.segment]
            .iter()
            .map(|segment| segment.block)
            .collect();
        for block in middle {
            remove_block(&mut self.document, block);
        }

        let caret = match (first.kind, last.kind) {
            (SegmentKind::Text, SegmentKind::Text) => {
                remove_block_text(&mut self.document, first.block, start.offset, first.len);
                remove_block_text(&mut self.document, last.block, 0, end.offset);
                merge_blocks(&mut self.document, first.block, last.block);
                Some(BlockAnchor {
                    block: first.block,
                    offset: start.offset,
                })
            }
            (SegmentKind::Text, SegmentKind::Void) => {
                remove_block_text(&mut self.document, first.block, start.offset, first.len);
                remove_block(&mut self.document, last.block);
                Some(BlockAnchor {
                    block: first.block,
                    offset: start.offset,
                })
            }
            (SegmentKind::Void, SegmentKind::Text) => {
                remove_block(&mut self.document, first.block);
                remove_block_text(&mut self.document, last.block, 0, end.offset);
                Some(BlockAnchor {
                    block: last.block,
                    offset: 0,
                })
            }
            (SegmentKind::Void, SegmentKind::Void) => {
                remove_block(&mut self.document, first.block);
                remove_block(&mut self.document, last.block);
                None
            }
        };
        self.finish_structural_edit();
        tracing::debug!(from = ?start, to = ?end, "deleted selection");
        let fallback = CaretPosition::new(start.segment, 0);
        match caret {
            Some(anchor) => self.place_caret_at_anchor(anchor, fallback),
            None => self.move_to_position(fallback, false),
        }
    }

    fn remove_void_segment(&mut self, index: usize, direction: RemovalDirection) -> bool {
        let Some(segment) = self.segments.get(index).cloned() else {
            return false;
        };
        let previous = index
            .checked_sub(1)
            .and_then(|idx| self.segments.get(idx))
            .map(|prev| BlockAnchor {
                block: prev.block,
                offset: prev.len,
            });
        let next = self.segments.get(index + 1).map(|next| BlockAnchor {
            block: next.block,
            offset: 0,
        });
        let target = match direction {
            RemovalDirection::Backward => previous.or(next),
            RemovalDirection::Forward => next.or(previous),
        };
        if !remove_block(&mut self.document, segment.block) {
            return false;
        }
        self.finish_structural_edit();
        let fallback = CaretPosition::new(index.saturating_sub(1), 0);
        match target {
            Some(anchor) => self.place_caret_at_anchor(anchor, fallback),
            None => self.move_to_position(fallback, false),
        }
    }

    /// Backspace at the very start of the document turns the block back into
    /// a plain paragraph.
    fn reset_leading_block(&mut self, block: NodeId) -> bool {
        let Some(kind) = self.document.element(block).map(|element| element.kind) else {
            return false;
        };
        let list_parent = self
            .document
            .ancestors(block)
            .into_iter()
            .rev()
            .filter_map(|id| self.document.element(id).map(|element| element.kind))
            .find(|kind| kind.is_list());
        if let Some(list_kind) = list_parent {
            return self.toggle_block(list_kind);
        }
        if kind == BlockType::Paragraph {
            return false;
        }
        self.toggle_block(kind)
    }

    fn open_paragraph_after(&mut self, segment: usize) -> Option<CaretPosition> {
        let block = self.segments.get(segment)?.block;
        let paragraph = insert_empty_paragraph_after(&mut self.document, block)?;
        self.rebuild_segments();
        self.position_for_anchor(BlockAnchor {
            block: paragraph,
            offset: 0,
        })
    }

    pub fn current_block_len(&self) -> usize {
        self.focus_position()
            .and_then(|position| self.segments.get(position.segment))
            .map(|segment| segment.len)
            .unwrap_or(0)
    }

    pub(crate) fn segment_len(&self, segment: usize) -> usize {
        self.segments
            .get(segment)
            .map(|segment| block_len(&self.document, segment.block))
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;

#[cfg(test)]
#[path = "editor/cursor_tests.rs"]
mod cursor_tests;



#[cfg(test)]
#[path = "editor/structure_tests.rs"]
mod structure_tests;
