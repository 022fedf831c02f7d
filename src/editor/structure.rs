use super::content::{normalize_leaves, split_leaves_at};
use super::{DocumentEditor, SegmentKind};
use crate::document::{AlignType, BlockType, Document, Element, NodeId, TextLeaf};

const MAX_UNWRAP_PASSES: usize = 64;

/// Detaches `block` from its parent and frees it, then removes any ancestors
/// left without children.
pub(crate) fn remove_block(document: &mut Document, block: NodeId) -> bool {
    let Some((parent, index)) = document.locate(block) else {
        return false;
    };
    if let Some(children) = document.children_of_mut(parent) {
        children.remove(index);
    }
    document.free_subtree(block);
    prune_empty_ancestors(document, parent);
    true
}

fn prune_empty_ancestors(document: &mut Document, mut parent: Option<NodeId>) {
    while let Some(id) = parent {
        if !document.children(id).is_empty() {
            break;
        }
        let Some((grandparent, index)) = document.locate(id) else {
            break;
        };
        if let Some(children) = document.children_of_mut(grandparent) {
            children.remove(index);
        }
        document.free_node(id);
        parent = grandparent;
    }
}

fn insert_sibling(document: &mut Document, reference: NodeId, node: NodeId, after: bool) -> bool {
    let Some((parent, index)) = document.locate(reference) else {
        return false;
    };
    let Some(children) = document.children_of_mut(parent) else {
        return false;
    };
    let at = if after { index + 1 } else { index };
    children.insert(at, node);
    true
}

pub(crate) fn insert_empty_paragraph_after(document: &mut Document, block: NodeId) -> Option<NodeId> {
    let leaf = document.alloc_leaf(TextLeaf::default());
    let mut paragraph = Element::new(BlockType::Paragraph);
    paragraph.children.push(leaf);
    let id = document.alloc_element(paragraph);
    if insert_sibling(document, block, id, true) {
        Some(id)
    } else {
        document.free_subtree(id);
        None
    }
}

/// Splits a text block at `offset`; the tail becomes a new sibling of the same
/// type and alignment. Both halves keep at least one leaf.
pub(crate) fn split_block(document: &mut Document, block: NodeId, offset: usize) -> Option<NodeId> {
    let (kind, align) = {
        let element = document.element(block)?;
        if element.is_void() {
            return None;
        }
        (element.kind, element.align)
    };
    let at = split_leaves_at(document, block, offset);
    let tail = document.element_mut(block)?.children.split_off(at);

    let mut sibling = Element::new(kind);
    sibling.align = align;
    sibling.children = tail;
    if sibling.children.is_empty() {
        let marks = document
            .children(block)
            .last()
            .and_then(|leaf| document.leaf(*leaf))
            .map(|leaf| leaf.marks)
            .unwrap_or_default();
        sibling.children.push(document.alloc_leaf(TextLeaf::styled("", marks)));
    }
    if document.children(block).is_empty() {
        let marks = sibling
            .children
            .first()
            .and_then(|leaf| document.leaf(*leaf))
            .map(|leaf| leaf.marks)
            .unwrap_or_default();
        let leaf = document.alloc_leaf(TextLeaf::styled("", marks));
        document.element_mut(block)?.children.push(leaf);
    }
    let id = document.alloc_element(sibling);
    if !insert_sibling(document, block, id, true) {
        document.free_subtree(id);
        return None;
    }
    normalize_leaves(document, block);
    normalize_leaves(document, id);
    Some(id)
}

/// Moves every leaf of `source` to the end of `target` and removes `source`.
pub(crate) fn merge_blocks(document: &mut Document, target: NodeId, source: NodeId) -> bool {
    if target == source || !document.is_text_block(target) || !document.is_text_block(source) {
        return false;
    }
    let moved = match document.element_mut(source) {
        Some(element) => std::mem::take(&mut element.children),
        None => return false,
    };
    match document.element_mut(target) {
        Some(element) => element.children.extend(moved),
        None => return false,
    }
    let Some((parent, index)) = document.locate(source) else {
        return false;
    };
    if let Some(children) = document.children_of_mut(parent) {
        children.remove(index);
    }
    document.free_node(source);
    prune_empty_ancestors(document, parent);
    normalize_leaves(document, target);
    true
}

fn nearest_list_ancestor(document: &Document, block: NodeId) -> Option<NodeId> {
    document.ancestors(block).into_iter().rev().find(|id| {
        document
            .element(*id)
            .map(|element| element.kind.is_list())
            .unwrap_or(false)
    })
}

/// Lifts the `selected` children of `list` up one level. Unselected items
/// before and after stay in lists of the same kind.
fn unwrap_list(document: &mut Document, list: NodeId, selected: &[NodeId]) -> bool {
    let Some((kind, align)) = document.element(list).map(|e| (e.kind, e.align)) else {
        return false;
    };
    let children = document.children(list).to_vec();
    let Some(first) = children.iter().position(|child| selected.contains(child)) else {
        return false;
    };
    let last = children
        .iter()
        .rposition(|child| selected.contains(child))
        .unwrap_or(first);
    let Some((parent, index)) = document.locate(list) else {
        return false;
    };

    let before = children[..first].to_vec();
    let lifted = children[first..=last].to_vec();
    let after = children[last + 1..].to_vec();

    let mut replacement = Vec::new();
    if before.is_empty() {
        document.free_node(list);
    } else {
        if let Some(element) = document.element_mut(list) {
            element.children = before;
        }
        replacement.push(list);
    }
    replacement.extend(lifted);
    if !after.is_empty() {
        let mut tail = Element::new(kind);
        tail.align = align;
        tail.children = after;
        replacement.push(document.alloc_element(tail));
    }

    let Some(siblings) = document.children_of_mut(parent) else {
        return false;
    };
    siblings.splice(index..index + 1, replacement);
    true
}

pub(crate) fn unwrap_list_ancestors(document: &mut Document, blocks: &[NodeId]) -> bool {
    let mut changed = false;
    for _ in 0..MAX_UNWRAP_PASSES {
        let Some(list) = blocks
            .iter()
            .find_map(|block| nearest_list_ancestor(document, *block))
        else {
            break;
        };
        let affected: Vec<NodeId> = document
            .children(list)
            .iter()
            .filter(|child| {
                blocks
                    .iter()
                    .any(|block| block == *child || document.ancestors(*block).contains(*child))
            })
            .copied()
            .collect();
        if !unwrap_list(document, list, &affected) {
            break;
        }
        changed = true;
    }
    changed
}

/// Wraps each run of consecutive sibling blocks in a new container of `kind`.
pub(crate) fn wrap_blocks(document: &mut Document, blocks: &[NodeId], kind: BlockType) {
    let mut runs: Vec<Vec<NodeId>> = Vec::new();
    let mut previous: Option<(Option<NodeId>, usize)> = None;
    for block in blocks {
        let Some((parent, index)) = document.locate(*block) else {
            continue;
        };
        let continues = matches!(previous, Some((prev_parent, prev_index)) if prev_parent == parent && prev_index + 1 == index);
        match runs.last_mut() {
            Some(run) if continues => run.push(*block),
            _ => runs.push(vec![*block]),
        }
        previous = Some((parent, index));
    }

    for run in runs {
        let Some((parent, index)) = document.locate(run[0]) else {
            continue;
        };
        let mut container = Element::new(kind);
        container.children = run.clone();
        let id = document.alloc_element(container);
        if let Some(siblings) = document.children_of_mut(parent) {
            siblings.splice(index..index + run.len(), [id]);
        }
    }
}

impl DocumentEditor {
    /// Blocks covered by the selection. A range ending at offset 0 of a later
    /// block does not include that block.
    fn selected_segments(&self) -> Option<Vec<usize>> {
        let (start, end) = self.selection_range()?;
        let last = if end.segment > start.segment && end.offset == 0 {
            end.segment - 1
        } else {
            end.segment
        };
        Some((start.segment..=last).collect())
    }

    fn selected_text_blocks(&self) -> Vec<NodeId> {
        self.selected_segments()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|idx| self.segments.get(idx))
            .filter(|segment| segment.kind == SegmentKind::Text)
            .map(|segment| segment.block)
            .collect()
    }

    /// True when any selected block, or one of its ancestors, has type `kind`.
    pub fn is_block_active(&self, kind: BlockType) -> bool {
        let Some(selected) = self.selected_segments() else {
            return false;
        };
        selected
            .into_iter()
            .filter_map(|idx| self.segments.get(idx))
            .any(|segment| {
                std::iter::once(segment.block)
                    .chain(self.document.ancestors(segment.block))
                    .any(|id| self.document.element(id).map(|e| e.kind) == Some(kind))
            })
    }

    pub fn toggle_block(&mut self, kind: BlockType) -> bool {
        if matches!(
            kind,
            BlockType::ListItem | BlockType::Image | BlockType::Unrecognized
        ) {
            return false;
        }
        let blocks = self.selected_text_blocks();
        if blocks.is_empty() {
            return false;
        }
        let active = self.is_block_active(kind);
        let saved = self.capture_selection();

        unwrap_list_ancestors(&mut self.document, &blocks);
        let target = if active {
            BlockType::Paragraph
        } else if kind.is_list() {
            BlockType::ListItem
        } else {
            kind
        };
        for block in &blocks {
            if let Some(element) = self.document.element_mut(*block) {
                element.kind = target;
            }
        }
        if !active && kind.is_list() {
            wrap_blocks(&mut self.document, &blocks, kind);
        }

        self.rebuild_segments();
        self.restore_selection(saved);
        tracing::debug!(kind = kind.name(), active, blocks = blocks.len(), "toggled block");
        true
    }

    /// Effective alignment of the first selected text block.
    pub fn current_alignment(&self) -> Option<AlignType> {
        let block = *self.selected_text_blocks().first()?;
        let element = self.document.element(block)?;
        Some(element.align.unwrap_or(AlignType::Left))
    }

    pub fn is_align_active(&self, align: AlignType) -> bool {
        self.current_alignment() == Some(align)
    }

    /// Sets `align` on every selected block, or clears it when already
    /// active. Left is the default and is stored as no alignment.
    pub fn toggle_align(&mut self, align: AlignType) -> bool {
        let blocks = self.selected_text_blocks();
        if blocks.is_empty() {
            return false;
        }
        let active = self.is_align_active(align);
        let value = if active || align == AlignType::Left {
            None
        } else {
            Some(align)
        };
        for block in &blocks {
            if let Some(element) = self.document.element_mut(*block) {
                element.align = value;
            }
        }
        tracing::debug!(align = align.name(), active, "toggled alignment");
        true
    }

    /// Inserts an image element at the caret. An expanded selection is
    /// deleted first.
    pub fn insert_image(&mut self, url: &str) -> bool {
        if self.selection.is_none() {
            return false;
        }
        if self.has_expanded_selection() {
            self.delete_selection();
        }
        let Some(position) = self.focus_position() else {
            return false;
        };
        let Some(segment) = self.segments.get(position.segment).cloned() else {
            return false;
        };

        let mut image = Element::new(BlockType::Image);
        image.url = Some(url.to_string());
        let image = self.document.alloc_element(image);

        let caret_block = match segment.kind {
            SegmentKind::Text if segment.len == 0 || position.offset == 0 => {
                if !insert_sibling(&mut self.document, segment.block, image, false) {
                    self.document.free_subtree(image);
                    return false;
                }
                Some(segment.block)
            }
            SegmentKind::Text if position.offset < segment.len => {
                let Some(tail) = split_block(&mut self.document, segment.block, position.offset)
                else {
                    self.document.free_subtree(image);
                    return false;
                };
                insert_sibling(&mut self.document, tail, image, false);
                Some(tail)
            }
            _ => {
                if !insert_sibling(&mut self.document, segment.block, image, true) {
                    self.document.free_subtree(image);
                    return false;
                }
                None
            }
        };

        let caret_block = match caret_block {
            Some(block) => Some(block),
            None => self
                .following_text_block(image)
                .or_else(|| insert_empty_paragraph_after(&mut self.document, image)),
        };
        self.rebuild_segments();
        tracing::debug!(url_len = url.len(), "inserted image");
        match caret_block {
            Some(block) => self.place_caret_at_anchor(
                super::BlockAnchor { block, offset: 0 },
                position,
            ),
            None => true,
        }
    }

    fn following_text_block(&self, node: NodeId) -> Option<NodeId> {
        let (parent, index) = self.document.locate(node)?;
        let next = *self.document.children_of(parent).get(index + 1)?;
        self.document.is_text_block(next).then_some(next)
    }
}
