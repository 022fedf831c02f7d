//! The editable document tree.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Elements only know
//! their children; parents and paths are derived by walking from the roots, so
//! a `Document` can be cloned as a plain snapshot at any time.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockType {
    Paragraph,
    HeadingOne,
    HeadingTwo,
    HeadingThree,
    HeadingFour,
    HeadingFive,
    HeadingSix,
    BlockQuote,
    BulletedList,
    NumberedList,
    ListItem,
    Image,
    /// Any element type this editor does not know. Kept as a plain container.
    Unrecognized,
}

impl BlockType {
    pub const HEADINGS: [BlockType; 6] = [
        BlockType::HeadingOne,
        BlockType::HeadingTwo,
        BlockType::HeadingThree,
        BlockType::HeadingFour,
        BlockType::HeadingFive,
        BlockType::HeadingSix,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BlockType::Paragraph => "paragraph",
            BlockType::HeadingOne => "heading-one",
            BlockType::HeadingTwo => "heading-two",
            BlockType::HeadingThree => "heading-three",
            BlockType::HeadingFour => "heading-four",
            BlockType::HeadingFive => "heading-five",
            BlockType::HeadingSix => "heading-six",
            BlockType::BlockQuote => "block-quote",
            BlockType::BulletedList => "bulleted-list",
            BlockType::NumberedList => "numbered-list",
            BlockType::ListItem => "list-item",
            BlockType::Image => "image",
            BlockType::Unrecognized => "unrecognized",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "paragraph" => BlockType::Paragraph,
            "heading-one" => BlockType::HeadingOne,
            "heading-two" => BlockType::HeadingTwo,
            "heading-three" => BlockType::HeadingThree,
            "heading-four" => BlockType::HeadingFour,
            "heading-five" => BlockType::HeadingFive,
            "heading-six" => BlockType::HeadingSix,
            "block-quote" => BlockType::BlockQuote,
            "bulleted-list" => BlockType::BulletedList,
            "numbered-list" => BlockType::NumberedList,
            "list-item" => BlockType::ListItem,
            "image" => BlockType::Image,
            _ => return None,
        };
        Some(kind)
    }

    pub fn label(self) -> &'static str {
        match self {
            BlockType::Paragraph => "Paragraph",
            BlockType::HeadingOne => "Heading 1",
            BlockType::HeadingTwo => "Heading 2",
            BlockType::HeadingThree => "Heading 3",
            BlockType::HeadingFour => "Heading 4",
            BlockType::HeadingFive => "Heading 5",
            BlockType::HeadingSix => "Heading 6",
            BlockType::BlockQuote => "Quote",
            BlockType::BulletedList => "Bulleted List",
            BlockType::NumberedList => "Numbered List",
            BlockType::ListItem => "List Item",
            BlockType::Image => "Image",
            BlockType::Unrecognized => "Block",
        }
    }

    pub fn is_list(self) -> bool {
        matches!(self, BlockType::BulletedList | BlockType::NumberedList)
    }

    pub fn is_void(self) -> bool {
        self == BlockType::Image
    }

    pub fn heading_level(self) -> Option<u8> {
        BlockType::HEADINGS
            .iter()
            .position(|kind| *kind == self)
            .map(|idx| idx as u8 + 1)
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for BlockType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for BlockType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(BlockType::from_name(&name).unwrap_or_else(|| {
            tracing::warn!(block_type = %name, "unknown block type, keeping as container");
            BlockType::Unrecognized
        }))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignType {
    Left,
    Center,
    Right,
    Justify,
}

impl AlignType {
    pub const ALL: [AlignType; 4] = [
        AlignType::Left,
        AlignType::Center,
        AlignType::Right,
        AlignType::Justify,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AlignType::Left => "left",
            AlignType::Center => "center",
            AlignType::Right => "right",
            AlignType::Justify => "justify",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        AlignType::ALL
            .into_iter()
            .find(|align| align.name().eq_ignore_ascii_case(name.trim()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mark {
    Bold,
    Italic,
    Underline,
}

impl Mark {
    pub const ALL: [Mark; 3] = [Mark::Bold, Mark::Italic, Mark::Underline];

    pub fn label(self) -> &'static str {
        match self {
            Mark::Bold => "Bold",
            Mark::Italic => "Italic",
            Mark::Underline => "Underline",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Marks {
    pub fn has(&self, mark: Mark) -> bool {
        match mark {
            Mark::Bold => self.bold,
            Mark::Italic => self.italic,
            Mark::Underline => self.underline,
        }
    }

    pub fn set(&mut self, mark: Mark, value: bool) {
        match mark {
            Mark::Bold => self.bold = value,
            Mark::Italic => self.italic = value,
            Mark::Underline => self.underline = value,
        }
    }

    pub fn with(mut self, mark: Mark) -> Self {
        self.set(mark, true);
        self
    }

    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.underline
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextLeaf {
    pub text: String,
    pub marks: Marks,
}

impl TextLeaf {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::default(),
        }
    }

    pub fn styled(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub kind: BlockType,
    pub align: Option<AlignType>,
    /// Source of a void image element.
    pub url: Option<String>,
    pub children: Vec<NodeId>,
}

impl Element {
    pub fn new(kind: BlockType) -> Self {
        Self {
            kind,
            align: None,
            url: None,
            children: Vec::new(),
        }
    }

    pub fn is_void(&self) -> bool {
        self.kind.is_void()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Text(TextLeaf),
    Element(Element),
}

#[derive(Clone, Debug)]
pub struct Document {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    roots: Vec<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.to_tree() == other.to_tree()
    }
}

impl Document {
    /// A document holding one empty paragraph.
    pub fn new() -> Self {
        let mut document = Self::bare();
        ensure_document_initialized(&mut document);
        document
    }

    fn bare() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn from_tree(nodes: Vec<TreeNode>) -> Self {
        let mut document = Self::bare();
        for node in nodes {
            let id = match node {
                TreeNode::Text(leaf) => {
                    let leaf_id = document.alloc(Node::Text(leaf.into_leaf()));
                    let mut paragraph = Element::new(BlockType::Paragraph);
                    paragraph.children.push(leaf_id);
                    document.alloc(Node::Element(paragraph))
                }
                TreeNode::Element(element) => document.build_element(element),
            };
            document.roots.push(id);
        }
        ensure_document_initialized(&mut document);
        document
    }

    fn build_element(&mut self, tree: ElementTree) -> NodeId {
        let mut element = Element::new(tree.kind);
        element.align = tree.align;
        if tree.kind.is_void() {
            element.url = Some(tree.url.unwrap_or_default());
            return self.alloc(Node::Element(element));
        }
        element.url = tree.url;
        for child in tree.children {
            let id = match child {
                TreeNode::Text(leaf) => self.alloc(Node::Text(leaf.into_leaf())),
                TreeNode::Element(nested) => self.build_element(nested),
            };
            element.children.push(id);
        }
        if element.children.is_empty() {
            let leaf = self.alloc(Node::Text(TextLeaf::default()));
            element.children.push(leaf);
        }
        self.alloc(Node::Element(element))
    }

    pub fn to_tree(&self) -> Vec<TreeNode> {
        self.roots.iter().filter_map(|id| self.subtree(*id)).collect()
    }

    pub fn subtree(&self, id: NodeId) -> Option<TreeNode> {
        match self.node(id)? {
            Node::Text(leaf) => Some(TreeNode::Text(TextTree::from_leaf(leaf))),
            Node::Element(element) => Some(TreeNode::Element(ElementTree {
                kind: element.kind,
                align: element.align,
                url: element.url.clone(),
                children: element
                    .children
                    .iter()
                    .filter_map(|child| self.subtree(*child))
                    .collect(),
            })),
        }
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0)?.as_ref()
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.0)?.as_mut()
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.node(id)? {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match self.node_mut(id)? {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn leaf(&self, id: NodeId) -> Option<&TextLeaf> {
        match self.node(id)? {
            Node::Text(leaf) => Some(leaf),
            Node::Element(_) => None,
        }
    }

    pub fn leaf_mut(&mut self, id: NodeId) -> Option<&mut TextLeaf> {
        match self.node_mut(id)? {
            Node::Text(leaf) => Some(leaf),
            Node::Element(_) => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.element(id)
            .map(|element| element.children.as_slice())
            .unwrap_or(&[])
    }

    /// Children of `parent`, or the top-level nodes for `None`.
    pub fn children_of(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            Some(id) => self.children(id),
            None => &self.roots,
        }
    }

    pub(crate) fn children_of_mut(&mut self, parent: Option<NodeId>) -> Option<&mut Vec<NodeId>> {
        match parent {
            Some(id) => self.element_mut(id).map(|element| &mut element.children),
            None => Some(&mut self.roots),
        }
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            self.slots[index] = Some(node);
            NodeId(index)
        } else {
            self.slots.push(Some(node));
            NodeId(self.slots.len() - 1)
        }
    }

    pub fn alloc_leaf(&mut self, leaf: TextLeaf) -> NodeId {
        self.alloc(Node::Text(leaf))
    }

    pub fn alloc_element(&mut self, element: Element) -> NodeId {
        self.alloc(Node::Element(element))
    }

    /// Releases a single slot. Children of an element stay allocated.
    pub(crate) fn free_node(&mut self, id: NodeId) -> Option<Node> {
        let node = self.slots.get_mut(id.0)?.take()?;
        self.free.push(id.0);
        Some(node)
    }

    pub(crate) fn free_subtree(&mut self, id: NodeId) {
        if let Some(Node::Element(element)) = self.free_node(id) {
            for child in element.children {
                self.free_subtree(child);
            }
        }
    }

    pub fn live_nodes(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn node_at(&self, path: &[usize]) -> Option<NodeId> {
        let (first, rest) = path.split_first()?;
        let mut current = *self.roots.get(*first)?;
        for idx in rest {
            current = *self.children(current).get(*idx)?;
        }
        Some(current)
    }

    pub fn path_of(&self, target: NodeId) -> Option<Vec<usize>> {
        fn walk(document: &Document, nodes: &[NodeId], target: NodeId, path: &mut Vec<usize>) -> bool {
            for (idx, id) in nodes.iter().enumerate() {
                path.push(idx);
                if *id == target || walk(document, document.children(*id), target, path) {
                    return true;
                }
                path.pop();
            }
            false
        }
        let mut path = Vec::new();
        walk(self, &self.roots, target, &mut path).then_some(path)
    }

    /// Parent (None for top level) and index of `target` within it.
    pub fn locate(&self, target: NodeId) -> Option<(Option<NodeId>, usize)> {
        let path = self.path_of(target)?;
        let (index, parent_path) = path.split_last()?;
        let parent = if parent_path.is_empty() {
            None
        } else {
            Some(self.node_at(parent_path)?)
        };
        Some((parent, *index))
    }

    /// Element ancestors of `target`, outermost first.
    pub fn ancestors(&self, target: NodeId) -> Vec<NodeId> {
        let Some(path) = self.path_of(target) else {
            return Vec::new();
        };
        (1..path.len())
            .filter_map(|len| self.node_at(&path[..len]))
            .collect()
    }

    /// An element holding only text leaves.
    pub fn is_text_block(&self, id: NodeId) -> bool {
        match self.element(id) {
            Some(element) if !element.is_void() => element
                .children
                .iter()
                .all(|child| self.leaf(*child).is_some()),
            _ => false,
        }
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.node(id) {
            Some(Node::Text(leaf)) => out.push_str(&leaf.text),
            Some(Node::Element(element)) => {
                for child in &element.children {
                    self.collect_text(*child, out);
                }
            }
            None => {}
        }
    }

    /// True when nothing but blank text is present.
    pub fn is_blank(&self) -> bool {
        fn blank(document: &Document, id: NodeId) -> bool {
            match document.node(id) {
                Some(Node::Text(leaf)) => leaf.text.trim().is_empty(),
                Some(Node::Element(element)) => {
                    !element.is_void() && element.children.iter().all(|c| blank(document, *c))
                }
                None => true,
            }
        }
        self.roots.iter().all(|id| blank(self, *id))
    }

    /// Urls of every image element, in document order.
    pub fn image_urls(&self) -> Vec<String> {
        fn walk(document: &Document, ids: &[NodeId], out: &mut Vec<String>) {
            for id in ids {
                if let Some(element) = document.element(*id) {
                    if element.is_void() {
                        out.push(element.url.clone().unwrap_or_default());
                    } else {
                        walk(document, &element.children, out);
                    }
                }
            }
        }
        let mut out = Vec::new();
        walk(self, &self.roots, &mut out);
        out
    }
}

pub(crate) fn ensure_document_initialized(document: &mut Document) {
    if document.roots.is_empty() {
        let leaf = document.alloc_leaf(TextLeaf::default());
        let mut paragraph = Element::new(BlockType::Paragraph);
        paragraph.children.push(leaf);
        let id = document.alloc_element(paragraph);
        document.roots.push(id);
    }
}

/// Owned nested form of a node, matching the persisted `contentJSON` shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Element(ElementTree),
    Text(TextTree),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementTree {
    #[serde(rename = "type")]
    pub kind: BlockType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<AlignType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextTree {
    pub text: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl TextTree {
    fn from_leaf(leaf: &TextLeaf) -> Self {
        Self {
            text: leaf.text.clone(),
            bold: leaf.marks.bold,
            italic: leaf.marks.italic,
            underline: leaf.marks.underline,
        }
    }

    fn into_leaf(self) -> TextLeaf {
        TextLeaf {
            text: self.text,
            marks: Marks {
                bold: self.bold,
                italic: self.italic,
                underline: self.underline,
            },
        }
    }
}

impl TreeNode {
    pub fn text(text: impl Into<String>) -> Self {
        TreeNode::Text(TextTree {
            text: text.into(),
            ..TextTree::default()
        })
    }

    pub fn styled(text: impl Into<String>, marks: Marks) -> Self {
        TreeNode::Text(TextTree::from_leaf(&TextLeaf::styled(text, marks)))
    }

    pub fn element(kind: BlockType, children: Vec<TreeNode>) -> Self {
        TreeNode::Element(ElementTree {
            kind,
            align: None,
            url: None,
            children,
        })
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        TreeNode::element(BlockType::Paragraph, vec![TreeNode::text(text)])
    }

    pub fn image(url: impl Into<String>) -> Self {
        TreeNode::Element(ElementTree {
            kind: BlockType::Image,
            align: None,
            url: Some(url.into()),
            children: Vec::new(),
        })
    }

    pub fn with_align(mut self, align: AlignType) -> Self {
        if let TreeNode::Element(element) = &mut self {
            element.align = Some(align);
        }
        self
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_tree().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<TreeNode>::deserialize(deserializer).map(Document::from_tree)
    }
}
