use crate::document::{Document, Marks, NodeId, TextLeaf};

pub fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    for (count, (byte_idx, _)) in text.char_indices().enumerate() {
        if count == char_idx {
            return byte_idx;
        }
    }
    text.len()
}

pub(crate) fn split_text(text: &str, offset: usize) -> (String, String) {
    let byte_idx = char_to_byte_idx(text, offset);
    (text[..byte_idx].to_string(), text[byte_idx..].to_string())
}

pub(crate) fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

pub fn previous_word_boundary(text: &str, offset: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let mut idx = offset.min(chars.len());
    while idx > 0 && chars[idx - 1].is_whitespace() {
        idx -= 1;
    }
    if idx == 0 {
        return 0;
    }
    if is_word_char(chars[idx - 1]) {
        while idx > 0 && is_word_char(chars[idx - 1]) {
            idx -= 1;
        }
    } else {
        while idx > 0 && !is_word_char(chars[idx - 1]) && !chars[idx - 1].is_whitespace() {
            idx -= 1;
        }
    }
    idx
}

pub fn next_word_boundary(text: &str, offset: usize) -> usize {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut idx = offset.min(len);
    if idx >= len {
        return len;
    }

    if is_word_char(chars[idx]) {
        while idx < len && is_word_char(chars[idx]) {
            idx += 1;
        }
    } else if !chars[idx].is_whitespace() {
        while idx < len && !chars[idx].is_whitespace() && !is_word_char(chars[idx]) {
            idx += 1;
        }
    }
    while idx < len && chars[idx].is_whitespace() {
        idx += 1;
    }
    idx
}

/// Character count across all leaves of a block.
pub(crate) fn block_len(document: &Document, block: NodeId) -> usize {
    document
        .children(block)
        .iter()
        .filter_map(|child| document.leaf(*child))
        .map(TextLeaf::char_len)
        .sum()
}

/// Offset at which the leaf with index `leaf_index` starts.
pub(crate) fn leaf_start(document: &Document, block: NodeId, leaf_index: usize) -> usize {
    document
        .children(block)
        .iter()
        .take(leaf_index)
        .filter_map(|child| document.leaf(*child))
        .map(TextLeaf::char_len)
        .sum()
}

/// Leaf index and local offset for a block offset. On a boundary between two
/// leaves the earlier one wins, so typing continues the preceding style.
pub(crate) fn leaf_at_offset(
    document: &Document,
    block: NodeId,
    offset: usize,
) -> Option<(usize, usize)> {
    let children = document.children(block);
    let mut start = 0;
    let mut last = None;
    for (idx, child) in children.iter().enumerate() {
        let Some(leaf) = document.leaf(*child) else {
            continue;
        };
        let len = leaf.char_len();
        if offset <= start + len {
            return Some((idx, offset - start));
        }
        start += len;
        last = Some((idx, len));
    }
    last
}

pub(crate) fn marks_at_offset(document: &Document, block: NodeId, offset: usize) -> Marks {
    leaf_at_offset(document, block, offset)
        .and_then(|(idx, _)| document.children(block).get(idx).copied())
        .and_then(|leaf| document.leaf(leaf))
        .map(|leaf| leaf.marks)
        .unwrap_or_default()
}

/// Makes sure a leaf boundary sits at `offset` and returns the index of the
/// first child starting there.
pub(crate) fn split_leaves_at(document: &mut Document, block: NodeId, offset: usize) -> usize {
    let children = document.children(block).to_vec();
    let mut start = 0;
    for (idx, child) in children.iter().enumerate() {
        let Some(leaf) = document.leaf(*child) else {
            continue;
        };
        let len = leaf.char_len();
        if offset <= start {
            return idx;
        }
        if offset < start + len {
            let (left, right) = split_text(&leaf.text, offset - start);
            let right = TextLeaf::styled(right, leaf.marks);
            if let Some(leaf) = document.leaf_mut(*child) {
                leaf.text = left;
            }
            let right_id = document.alloc_leaf(right);
            if let Some(element) = document.element_mut(block) {
                element.children.insert(idx + 1, right_id);
            }
            return idx + 1;
        }
        start += len;
    }
    children.len()
}

/// Isolates the leaves covering `start..end` and returns their ids.
pub(crate) fn leaves_in_range(
    document: &mut Document,
    block: NodeId,
    start: usize,
    end: usize,
) -> Vec<NodeId> {
    if start >= end {
        return Vec::new();
    }
    let first = split_leaves_at(document, block, start);
    let last = split_leaves_at(document, block, end);
    document.children(block)[first..last].to_vec()
}

pub(crate) fn remove_block_text(document: &mut Document, block: NodeId, start: usize, end: usize) {
    let doomed = leaves_in_range(document, block, start, end);
    if doomed.is_empty() {
        return;
    }
    if let Some(element) = document.element_mut(block) {
        element.children.retain(|child| !doomed.contains(child));
    }
    for leaf in doomed {
        document.free_node(leaf);
    }
    normalize_leaves(document, block);
}

/// Inserts `text` at `offset` and returns the number of characters written.
/// With explicit `marks` that differ from the surrounding leaf, the text gets
/// a leaf of its own.
pub(crate) fn insert_text_in_block(
    document: &mut Document,
    block: NodeId,
    offset: usize,
    text: &str,
    marks: Option<Marks>,
) -> usize {
    let inserted = text.chars().count();
    let current = marks_at_offset(document, block, offset);
    let located = leaf_at_offset(document, block, offset);

    match (marks, located) {
        (Some(marks), _) if marks != current => {
            let at = split_leaves_at(document, block, offset);
            let leaf = document.alloc_leaf(TextLeaf::styled(text, marks));
            if let Some(element) = document.element_mut(block) {
                element.children.insert(at, leaf);
            }
        }
        (_, Some((idx, local))) => {
            let Some(child) = document.children(block).get(idx).copied() else {
                return 0;
            };
            let Some(leaf) = document.leaf_mut(child) else {
                return 0;
            };
            let byte_idx = char_to_byte_idx(&leaf.text, local);
            leaf.text.insert_str(byte_idx, text);
        }
        (marks, None) => {
            let leaf = document.alloc_leaf(TextLeaf::styled(text, marks.unwrap_or_default()));
            match document.element_mut(block) {
                Some(element) => element.children.push(leaf),
                None => return 0,
            }
        }
    }
    normalize_leaves(document, block);
    inserted
}

/// Drops empty leaves (keeping one if nothing else remains) and merges
/// neighbours that carry identical marks.
pub(crate) fn normalize_leaves(document: &mut Document, block: NodeId) {
    let children = document.children(block).to_vec();
    let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
    let mut dropped: Vec<NodeId> = Vec::new();

    for child in children {
        let Some(leaf) = document.leaf(child).cloned() else {
            kept.push(child);
            continue;
        };
        if leaf.text.is_empty() {
            dropped.push(child);
            continue;
        }
        let previous = kept.last().copied();
        let merge_into = previous.filter(|prev| {
            document
                .leaf(*prev)
                .map(|prev_leaf| prev_leaf.marks == leaf.marks)
                .unwrap_or(false)
        });
        match merge_into.and_then(|prev| document.leaf_mut(prev)) {
            Some(prev_leaf) => {
                prev_leaf.text.push_str(&leaf.text);
                dropped.push(child);
            }
            None => kept.push(child),
        }
    }

    if kept.is_empty() {
        if let Some(first) = dropped.first().copied() {
            dropped.remove(0);
            kept.push(first);
        } else {
            kept.push(document.alloc_leaf(TextLeaf::default()));
        }
    }

    if let Some(element) = document.element_mut(block) {
        element.children = kept;
    }
    for leaf in dropped {
        document.free_node(leaf);
    }
}
