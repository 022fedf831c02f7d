use std::collections::HashMap;

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use unicode_width::UnicodeWidthChar;

use crate::document::{AlignType, BlockType, Document, Mark, Marks, NodeId};
use crate::editor::{CaretPosition, DocumentEditor};
use crate::html::{ViewKind, ViewNode, ViewTree};
use crate::theme::Theme;

const IMAGE_LABEL_LIMIT: usize = 48;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CursorVisualPosition {
    pub line: usize,
    pub column: u16,
}

#[derive(Debug)]
pub struct RenderResult {
    pub lines: Vec<Line<'static>>,
    pub cursor: Option<CursorVisualPosition>,
    pub total_lines: usize,
    pub cursor_map: Vec<(CaretPosition, CursorVisualPosition)>,
}

impl RenderResult {
    /// Caret position drawn closest to a screen location. Same line wins over
    /// column distance.
    pub fn position_near(&self, line: usize, column: u16) -> Option<CaretPosition> {
        self.cursor_map
            .iter()
            .min_by_key(|(_, visual)| (visual.line.abs_diff(line), visual.column.abs_diff(column)))
            .map(|(position, _)| *position)
    }

    pub fn visual_of(&self, position: CaretPosition) -> Option<CursorVisualPosition> {
        self.cursor_map
            .iter()
            .find(|(candidate, _)| *candidate == position)
            .map(|(_, visual)| *visual)
    }
}

pub fn render_document(editor: &DocumentEditor, width: usize, theme: &Theme) -> RenderResult {
    let mut renderer = Renderer::new(editor, width.max(1), theme);
    renderer.render_blocks(editor.document().roots(), "");
    renderer.finish()
}

struct Renderer<'a> {
    document: &'a Document,
    theme: &'a Theme,
    wrap_width: usize,
    segment_of: HashMap<NodeId, usize>,
    selection: Option<(CaretPosition, CaretPosition)>,
    focus: Option<CaretPosition>,
    cursor: Option<CursorVisualPosition>,
    cursor_map: Vec<(CaretPosition, CursorVisualPosition)>,
    lines: Vec<Line<'static>>,
}

impl<'a> Renderer<'a> {
    fn new(editor: &'a DocumentEditor, wrap_width: usize, theme: &'a Theme) -> Self {
        let segment_of = editor
            .segments()
            .iter()
            .enumerate()
            .map(|(idx, segment)| (segment.block, idx))
            .collect();
        Self {
            document: editor.document(),
            theme,
            wrap_width,
            segment_of,
            selection: editor.selection_range(),
            focus: editor.focus_position(),
            cursor: None,
            cursor_map: Vec::new(),
            lines: Vec::new(),
        }
    }

    fn render_blocks(&mut self, ids: &[NodeId], prefix: &str) {
        for (idx, id) in ids.iter().enumerate() {
            if idx > 0 {
                self.push_blank_line();
            }
            self.render_block(*id, prefix, prefix);
        }
    }

    fn render_block(&mut self, id: NodeId, first_prefix: &str, continuation_prefix: &str) {
        let document = self.document;
        let Some(element) = document.element(id) else {
            return;
        };
        match element.kind {
            BlockType::Image => {
                let src = element.url.as_deref().unwrap_or_default();
                self.render_image(id, src, first_prefix);
            }
            BlockType::BulletedList | BlockType::NumberedList => {
                self.render_list(&element.children, element.kind, first_prefix, continuation_prefix);
            }
            BlockType::BlockQuote => {
                let first = format!("{first_prefix}\u{2502} ");
                let continuation = format!("{continuation_prefix}\u{2502} ");
                self.render_text_or_children(id, Style::default(), &first, &continuation, element.align);
            }
            kind => {
                let style = match kind.heading_level() {
                    Some(_) => Style::default().add_modifier(Modifier::BOLD),
                    None => Style::default(),
                };
                self.render_text_or_children(id, style, first_prefix, continuation_prefix, element.align);
                match kind {
                    BlockType::HeadingOne => self.push_heading_rule(continuation_prefix, '='),
                    BlockType::HeadingTwo => self.push_heading_rule(continuation_prefix, '-'),
                    _ => {}
                }
            }
        }
    }

    fn render_text_or_children(
        &mut self,
        id: NodeId,
        style: Style,
        first_prefix: &str,
        continuation_prefix: &str,
        align: Option<AlignType>,
    ) {
        let document = self.document;
        if document.is_text_block(id) {
            self.render_text_block(id, style, first_prefix, continuation_prefix, align);
            return;
        }
        for (idx, child) in document.children(id).iter().enumerate() {
            let first = if idx == 0 { first_prefix } else { continuation_prefix };
            self.render_block(*child, first, continuation_prefix);
        }
    }

    fn render_list(
        &mut self,
        items: &[NodeId],
        kind: BlockType,
        first_prefix: &str,
        continuation_prefix: &str,
    ) {
        let mut number = 0;
        for (idx, item) in items.iter().enumerate() {
            let outer = if idx == 0 { first_prefix } else { continuation_prefix };
            let is_nested_list = self
                .document
                .element(*item)
                .is_some_and(|element| element.kind.is_list());
            if is_nested_list {
                let nested = format!("{continuation_prefix}  ");
                self.render_block(*item, &nested, &nested);
                continue;
            }
            number += 1;
            let marker = if kind == BlockType::NumberedList {
                format!("{number}. ")
            } else {
                "\u{2022} ".to_string()
            };
            let first = format!("{outer}{marker}");
            let continuation = format!(
                "{continuation_prefix}{}",
                " ".repeat(visible_width(&marker))
            );
            self.render_block(*item, &first, &continuation);
        }
    }

    fn render_text_block(
        &mut self,
        block: NodeId,
        style: Style,
        first_prefix: &str,
        continuation_prefix: &str,
        align: Option<AlignType>,
    ) {
        let segment = self.segment_of.get(&block).copied();
        let len = self
            .document
            .children(block)
            .iter()
            .filter_map(|child| self.document.leaf(*child))
            .map(|leaf| leaf.char_len())
            .sum();
        let selected = segment.and_then(|segment| self.selected_span(segment, len));
        let fragments = block_fragments(
            self.document,
            block,
            style,
            selected,
            self.theme.selection_style(),
        );
        let lines = wrap_fragments(&fragments, first_prefix, continuation_prefix, self.wrap_width);
        self.consume_lines(lines, segment, align);
    }

    fn render_image(&mut self, id: NodeId, src: &str, prefix: &str) {
        let segment = self.segment_of.get(&id).copied();
        let mut style = self.theme.image_style();
        if segment.and_then(|segment| self.selected_span(segment, 1)).is_some() {
            style = style.patch(self.theme.selection_style());
        }
        let mut tokenizer = Tokenizer::default();
        tokenizer.caret(0);
        for ch in image_label(src).chars() {
            tokenizer.push(ch, style);
        }
        let lines = wrap_fragments(&tokenizer.finish(), prefix, prefix, self.wrap_width);
        self.consume_lines(lines, segment, None);
    }

    /// Selected char range inside one segment, if any.
    fn selected_span(&self, segment: usize, len: usize) -> Option<(usize, usize)> {
        let (start, end) = self.selection?;
        if start == end || segment < start.segment || segment > end.segment {
            return None;
        }
        let from = if segment == start.segment { start.offset } else { 0 };
        let to = if segment == end.segment { end.offset } else { len };
        (from < to).then_some((from, to))
    }

    fn push_heading_rule(&mut self, prefix: &str, ch: char) {
        let width = self
            .lines
            .last()
            .map(|line| line_width(line).saturating_sub(visible_width(prefix)))
            .unwrap_or(0);
        let rule = format!("{prefix}{}", underline_string(width, ch));
        self.lines.push(Line::from(vec![Span::raw(rule)]));
    }

    fn push_blank_line(&mut self) {
        self.lines.push(Line::from(""));
    }

    fn consume_lines(
        &mut self,
        outputs: Vec<LineOutput>,
        segment: Option<usize>,
        align: Option<AlignType>,
    ) {
        for output in outputs {
            let (line, events) = place_line(output, self.wrap_width, align, self.theme.gutter_style());
            let index = self.lines.len();
            for event in events {
                let Some(segment) = segment else {
                    continue;
                };
                let TextEventKind::Caret(offset) = event.kind;
                let position = CaretPosition::new(segment, offset);
                let visual = CursorVisualPosition {
                    line: index,
                    column: event.column,
                };
                if self.focus == Some(position) {
                    self.cursor = Some(visual);
                }
                self.cursor_map.push((position, visual));
            }
            self.lines.push(line);
        }
    }

    fn finish(mut self) -> RenderResult {
        if self.lines.is_empty() {
            self.lines.push(Line::from(""));
        }
        let total_lines = self.lines.len();
        RenderResult {
            lines: self.lines,
            cursor: self.cursor,
            total_lines,
            cursor_map: self.cursor_map,
        }
    }
}

/// Renders the read view of stored HTML.
pub fn render_view(view: &ViewTree, width: usize, theme: &Theme) -> Vec<Line<'static>> {
    let mut renderer = ViewRenderer {
        theme,
        wrap_width: width.max(1),
        lines: Vec::new(),
        pending: Tokenizer::default(),
    };
    let mut context = ViewContext::default();
    renderer.walk(&view.nodes, &mut context);
    renderer.flush(&mut context);
    if renderer.lines.is_empty() {
        renderer.lines.push(Line::from(""));
    }
    renderer.lines
}

#[derive(Clone, Default)]
struct ViewContext {
    style: Style,
    first_prefix: String,
    continuation_prefix: String,
    align: Option<AlignType>,
    depth: usize,
}

impl ViewContext {
    fn nested(&self) -> Self {
        let mut child = self.clone();
        child.depth += 1;
        child
    }

    fn with_prefix(&self, first: String, continuation: String) -> Self {
        let mut child = self.nested();
        child.first_prefix = first;
        child.continuation_prefix = continuation;
        child
    }
}

struct ViewRenderer<'a> {
    theme: &'a Theme,
    wrap_width: usize,
    lines: Vec<Line<'static>>,
    pending: Tokenizer,
}

impl ViewRenderer<'_> {
    fn walk(&mut self, nodes: &[ViewNode], context: &mut ViewContext) {
        for node in nodes {
            match node {
                ViewNode::Text(text) => {
                    for ch in text.chars() {
                        self.pending.push(ch, context.style);
                    }
                }
                ViewNode::Element { kind, children } => self.walk_element(kind, children, context),
            }
        }
    }

    fn walk_element(&mut self, kind: &ViewKind, children: &[ViewNode], context: &mut ViewContext) {
        let mut inline = context.clone();
        match kind {
            ViewKind::Strong => inline.style = inline.style.add_modifier(Modifier::BOLD),
            ViewKind::Emphasis => inline.style = inline.style.add_modifier(Modifier::ITALIC),
            ViewKind::Underline => inline.style = inline.style.add_modifier(Modifier::UNDERLINED),
            ViewKind::Generic { .. } => {}
            ViewKind::LineBreak => {
                if self.pending.is_empty() {
                    self.begin_block(context);
                    self.lines.push(Line::from(""));
                } else {
                    self.pending.line_break();
                }
                return;
            }
            ViewKind::Image { src } => {
                self.flush(context);
                self.begin_block(context);
                let label = image_label(src);
                let line = format!("{}{label}", context.first_prefix);
                self.lines.push(Line::from(vec![Span::styled(line, self.theme.image_style())]));
                return;
            }
            block => {
                self.flush(context);
                self.begin_block(context);
                self.walk_block(block, children, context);
                return;
            }
        }
        // Inline content keeps flowing into the surrounding block.
        self.walk(children, &mut inline);
        context.first_prefix = inline.first_prefix;
    }

    fn walk_block(&mut self, kind: &ViewKind, children: &[ViewNode], context: &mut ViewContext) {
        let mut block = context.nested();
        match kind {
            ViewKind::Heading(level) => {
                block.style = block.style.add_modifier(Modifier::BOLD);
                self.walk(children, &mut block);
                self.flush(&mut block);
                match *level {
                    1 => self.push_rule(&block.continuation_prefix, '='),
                    2 => self.push_rule(&block.continuation_prefix, '-'),
                    _ => {}
                }
            }
            ViewKind::BlockQuote => {
                let mut quote = context.with_prefix(
                    format!("{}\u{2502} ", context.first_prefix),
                    format!("{}\u{2502} ", context.continuation_prefix),
                );
                self.walk(children, &mut quote);
                self.flush(&mut quote);
            }
            ViewKind::BulletedList | ViewKind::NumberedList => {
                let mut number = 0;
                for child in children {
                    let ViewNode::Element {
                        kind: ViewKind::ListItem,
                        children: item_children,
                    } = child
                    else {
                        let mut nested = context.with_prefix(
                            format!("{}  ", context.continuation_prefix),
                            format!("{}  ", context.continuation_prefix),
                        );
                        self.walk(std::slice::from_ref(child), &mut nested);
                        self.flush(&mut nested);
                        continue;
                    };
                    number += 1;
                    let marker = if *kind == ViewKind::NumberedList {
                        format!("{number}. ")
                    } else {
                        "\u{2022} ".to_string()
                    };
                    let first = if number == 1 {
                        format!("{}{marker}", context.first_prefix)
                    } else {
                        format!("{}{marker}", context.continuation_prefix)
                    };
                    let continuation = format!(
                        "{}{}",
                        context.continuation_prefix,
                        " ".repeat(visible_width(&marker))
                    );
                    let mut item = context.with_prefix(first, continuation);
                    self.walk(item_children, &mut item);
                    self.flush(&mut item);
                }
            }
            ViewKind::Aligned(align) => {
                block.align = Some(*align);
                self.walk(children, &mut block);
                self.flush(&mut block);
            }
            _ => {
                self.walk(children, &mut block);
                self.flush(&mut block);
            }
        }
        context.first_prefix = context.continuation_prefix.clone();
    }

    /// Top-level blocks are separated by a blank line.
    fn begin_block(&mut self, context: &ViewContext) {
        if context.depth == 0 && !self.lines.is_empty() {
            self.lines.push(Line::from(""));
        }
    }

    fn flush(&mut self, context: &mut ViewContext) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        self.begin_block(context);
        let outputs = wrap_fragments(
            &pending.finish(),
            &context.first_prefix,
            &context.continuation_prefix,
            self.wrap_width,
        );
        for output in outputs {
            let (line, _) = place_line(output, self.wrap_width, context.align, self.theme.gutter_style());
            self.lines.push(line);
        }
        context.first_prefix = context.continuation_prefix.clone();
    }

    fn push_rule(&mut self, prefix: &str, ch: char) {
        let width = self
            .lines
            .last()
            .map(|line| line_width(line).saturating_sub(visible_width(prefix)))
            .unwrap_or(0);
        let rule = format!("{prefix}{}", underline_string(width, ch));
        self.lines.push(Line::from(vec![Span::raw(rule)]));
    }
}

/// Placeholder text for an image. Data urls are cut after their media type.
pub fn image_label(src: &str) -> String {
    let shown = match src.strip_prefix("data:") {
        Some(rest) => {
            let media = rest.split([';', ',']).next().unwrap_or_default();
            format!("embedded {media}")
        }
        None if src.chars().count() > IMAGE_LABEL_LIMIT => {
            let cut: String = src.chars().take(IMAGE_LABEL_LIMIT).collect();
            format!("{cut}\u{2026}")
        }
        None => src.to_string(),
    };
    format!("[image: {shown}]")
}

fn mark_style(marks: Marks) -> Style {
    let mut style = Style::default();
    if marks.has(Mark::Bold) {
        style = style.add_modifier(Modifier::BOLD);
    }
    if marks.has(Mark::Italic) {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if marks.has(Mark::Underline) {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    style
}

fn block_fragments(
    document: &Document,
    block: NodeId,
    base: Style,
    selected: Option<(usize, usize)>,
    selection_style: Style,
) -> Vec<FragmentItem> {
    let mut tokenizer = Tokenizer::default();
    let mut offset = 0;
    for child in document.children(block) {
        let Some(leaf) = document.leaf(*child) else {
            continue;
        };
        let style = base.patch(mark_style(leaf.marks));
        for ch in leaf.text.chars() {
            let in_selection = selected.is_some_and(|(from, to)| offset >= from && offset < to);
            let style = if in_selection {
                style.patch(selection_style)
            } else {
                style
            };
            tokenizer.caret(offset);
            tokenizer.push(ch, style);
            offset += 1;
        }
    }
    tokenizer.caret(offset);
    tokenizer.finish()
}

#[derive(Clone)]
struct LineSegment {
    text: String,
    style: Style,
}

struct LineOutput {
    spans: Vec<LineSegment>,
    events: Vec<LocatedEvent>,
    width: usize,
    has_prefix: bool,
}

#[derive(Clone, Copy)]
struct LocatedEvent {
    column: u16,
    kind: TextEventKind,
}

#[derive(Clone)]
struct Fragment {
    pieces: Vec<LineSegment>,
    kind: FragmentKind,
    width: usize,
    events: Vec<TextEvent>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FragmentKind {
    Word,
    Whitespace,
}

#[derive(Clone)]
enum FragmentItem {
    Token(Fragment),
    LineBreak,
}

#[derive(Clone, Copy)]
struct TextEvent {
    offset: usize,
    kind: TextEventKind,
}

#[derive(Clone, Copy)]
enum TextEventKind {
    Caret(usize),
}

/// Splits styled chars into word and whitespace tokens, carrying caret
/// events along with the char they precede.
#[derive(Default)]
struct Tokenizer {
    builder: Option<TokenBuilder>,
    pending_events: Vec<TextEvent>,
    fragments: Vec<FragmentItem>,
}

impl Tokenizer {
    fn is_empty(&self) -> bool {
        self.builder.is_none() && self.fragments.is_empty() && self.pending_events.is_empty()
    }

    fn caret(&mut self, offset: usize) {
        self.pending_events.push(TextEvent {
            offset: 0,
            kind: TextEventKind::Caret(offset),
        });
    }

    fn line_break(&mut self) {
        if let Some(mut token) = self.builder.take() {
            token.add_events(&mut self.pending_events);
            self.fragments.push(FragmentItem::Token(token.finish()));
        } else if !self.pending_events.is_empty() {
            self.fragments.push(FragmentItem::Token(Fragment {
                pieces: Vec::new(),
                kind: FragmentKind::Word,
                width: 0,
                events: self.pending_events.drain(..).collect(),
            }));
        }
        self.fragments.push(FragmentItem::LineBreak);
    }

    fn push(&mut self, ch: char, style: Style) {
        match ch {
            '\r' => {}
            '\n' => self.line_break(),
            '\t' => {
                for _ in 0..4 {
                    self.push_visible(' ', style);
                }
            }
            ch => self.push_visible(ch, style),
        }
    }

    fn push_visible(&mut self, ch: char, style: Style) {
        let is_whitespace = ch.is_whitespace();
        let continues = self
            .builder
            .as_ref()
            .is_some_and(|existing| existing.kind_matches(is_whitespace));
        if !continues {
            if let Some(mut existing) = self.builder.take() {
                existing.add_events(&mut self.pending_events);
                self.fragments.push(FragmentItem::Token(existing.finish()));
            }
            self.builder = Some(TokenBuilder::new(is_whitespace));
        }
        if let Some(current) = self.builder.as_mut() {
            current.add_events(&mut self.pending_events);
            current.push_char(ch, style);
        }
    }

    fn finish(mut self) -> Vec<FragmentItem> {
        if let Some(mut token) = self.builder.take() {
            token.add_events(&mut self.pending_events);
            self.fragments.push(FragmentItem::Token(token.finish()));
        } else if !self.pending_events.is_empty() {
            self.fragments.push(FragmentItem::Token(Fragment {
                pieces: Vec::new(),
                kind: FragmentKind::Word,
                width: 0,
                events: self.pending_events,
            }));
        }
        self.fragments
    }
}

struct TokenBuilder {
    pieces: Vec<LineSegment>,
    kind: FragmentKind,
    width: usize,
    events: Vec<TextEvent>,
}

impl TokenBuilder {
    fn new(is_whitespace: bool) -> Self {
        Self {
            pieces: Vec::new(),
            kind: if is_whitespace {
                FragmentKind::Whitespace
            } else {
                FragmentKind::Word
            },
            width: 0,
            events: Vec::new(),
        }
    }

    fn kind_matches(&self, is_whitespace: bool) -> bool {
        matches!(
            (self.kind, is_whitespace),
            (FragmentKind::Whitespace, true) | (FragmentKind::Word, false)
        )
    }

    fn add_events(&mut self, pending: &mut Vec<TextEvent>) {
        for mut event in pending.drain(..) {
            event.offset = self.width;
            self.events.push(event);
        }
    }

    fn push_char(&mut self, ch: char, style: Style) {
        match self.pieces.last_mut() {
            Some(piece) if piece.style == style => piece.text.push(ch),
            _ => self.pieces.push(LineSegment {
                text: ch.to_string(),
                style,
            }),
        }
        self.width += UnicodeWidthChar::width(ch).unwrap_or(0);
    }

    fn finish(self) -> Fragment {
        Fragment {
            pieces: self.pieces,
            kind: self.kind,
            width: self.width,
            events: self.events,
        }
    }
}

fn wrap_fragments(
    fragments: &[FragmentItem],
    first_prefix: &str,
    continuation_prefix: &str,
    width: usize,
) -> Vec<LineOutput> {
    let mut outputs = Vec::new();
    let mut builder = LineBuilder::new(first_prefix);
    let mut pending_whitespace: Vec<Fragment> = Vec::new();

    for fragment in fragments {
        match fragment {
            FragmentItem::LineBreak => {
                builder.consume_pending(&mut pending_whitespace);
                outputs.push(builder.build_line());
                builder = LineBuilder::new(continuation_prefix);
            }
            FragmentItem::Token(token) => match token.kind {
                FragmentKind::Whitespace => {
                    pending_whitespace.push(token.clone());
                }
                FragmentKind::Word => {
                    let whitespace_width: usize =
                        pending_whitespace.iter().map(|item| item.width).sum();
                    if builder.current_width() > builder.prefix_width
                        && builder.current_width() + whitespace_width + token.width > width
                    {
                        builder.consume_pending(&mut pending_whitespace);
                        outputs.push(builder.build_line());
                        builder = LineBuilder::new(continuation_prefix);
                    }

                    builder.append_with_pending(token.clone(), &mut pending_whitespace);
                }
            },
        }
    }

    builder.consume_pending(&mut pending_whitespace);
    outputs.push(builder.build_line());
    outputs
}

struct LineBuilder {
    segments: Vec<LineSegment>,
    events: Vec<LocatedEvent>,
    width: usize,
    prefix_width: usize,
    has_prefix: bool,
}

impl LineBuilder {
    fn new(prefix: &str) -> Self {
        let prefix_width = visible_width(prefix);
        let mut segments = Vec::new();
        if !prefix.is_empty() {
            segments.push(LineSegment {
                text: prefix.to_string(),
                style: Style::default(),
            });
        }
        Self {
            segments,
            events: Vec::new(),
            width: prefix_width,
            prefix_width,
            has_prefix: !prefix.is_empty(),
        }
    }

    fn current_width(&self) -> usize {
        self.width
    }

    fn append_with_pending(&mut self, token: Fragment, pending_whitespace: &mut Vec<Fragment>) {
        self.consume_pending(pending_whitespace);
        self.append_token(token);
    }

    fn consume_pending(&mut self, pending_whitespace: &mut Vec<Fragment>) {
        for fragment in pending_whitespace.drain(..) {
            self.append_token(fragment);
        }
    }

    fn append_token(&mut self, fragment: Fragment) {
        let start = self.width;
        self.segments.extend(fragment.pieces);
        self.width += fragment.width;

        for event in fragment.events {
            self.events.push(LocatedEvent {
                column: (start + event.offset) as u16,
                kind: event.kind,
            });
        }
    }

    fn build_line(mut self) -> LineOutput {
        if self.segments.is_empty() {
            self.segments.push(LineSegment {
                text: String::new(),
                style: Style::default(),
            });
        }
        LineOutput {
            spans: self.segments,
            events: self.events,
            width: self.width,
            has_prefix: self.has_prefix,
        }
    }
}

/// Turns a wrapped line into ratatui spans, padding it for center and right
/// alignment. Justify is drawn flush left.
fn place_line(
    output: LineOutput,
    wrap_width: usize,
    align: Option<AlignType>,
    prefix_style: Style,
) -> (Line<'static>, Vec<LocatedEvent>) {
    let free = wrap_width.saturating_sub(output.width);
    let pad = match align {
        Some(AlignType::Center) => free / 2,
        Some(AlignType::Right) => free,
        _ => 0,
    };
    let has_prefix = output.has_prefix;
    let mut spans: Vec<Span<'static>> = output
        .spans
        .into_iter()
        .enumerate()
        .map(|(idx, segment)| {
            if idx == 0 && has_prefix {
                Span::styled(segment.text, prefix_style)
            } else {
                Span::styled(segment.text, segment.style)
            }
        })
        .collect();
    if pad > 0 {
        let at = usize::from(has_prefix).min(spans.len());
        spans.insert(at, Span::raw(" ".repeat(pad)));
    }
    let events = output
        .events
        .into_iter()
        .map(|mut event| {
            event.column += pad as u16;
            event
        })
        .collect();
    (Line::from(spans), events)
}

fn visible_width(text: &str) -> usize {
    text.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

fn line_width(line: &Line<'_>) -> usize {
    line.spans
        .iter()
        .map(|span| visible_width(span.content.as_ref()))
        .sum()
}

fn underline_string(width: usize, ch: char) -> String {
    std::iter::repeat_n(ch, width.max(1)).collect()
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
