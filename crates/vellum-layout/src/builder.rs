//! Box tree construction.
//!
//! The builder walks a content range of the document, classifies children as
//! inline or block, and emits the sequence of block-level boxes for that
//! range: element boxes through the [`crate::context::BoxFactory`], anonymous
//! paragraphs around runs of inline content, and anonymous tables around
//! stray table children.

use vellum_css::Display;
use vellum_dom::{Child, ContentRange, Document, NodeId, NodeKind};

use crate::context::LayoutContext;
use crate::tree::{BoxData, BoxId, BoxKind, BoxTree};

/// True if the child lays out as inline content in its parent.
///
/// Text is always inline. Elements follow their `display` value with the CSS
/// table-context exceptions: a table child whose parent does not establish
/// the required table context falls back to inline. Comments and processing
/// instructions are inline only inside an inline parent.
#[must_use]
pub fn is_inline(ctx: &LayoutContext<'_>, child: &Child) -> bool {
    match child {
        Child::Text(_) => true,
        Child::Node(id) => node_is_inline(ctx, *id),
    }
}

fn display_of(ctx: &LayoutContext<'_>, node: NodeId) -> Display {
    ctx.sheet.styles(ctx.document, node).display
}

fn node_is_inline(ctx: &LayoutContext<'_>, node: NodeId) -> bool {
    let doc = ctx.document;
    let parent_display = doc.parent(node).map(|parent| display_of(ctx, parent));
    match doc.kind(node) {
        NodeKind::Document => false,
        NodeKind::Comment | NodeKind::ProcessingInstruction { .. } => {
            parent_display == Some(Display::Inline)
        }
        NodeKind::Element { .. } => match display_of(ctx, node) {
            Display::Inline => true,
            Display::TableCell => parent_display != Some(Display::TableRow),
            Display::TableRow => !matches!(
                parent_display,
                Some(
                    Display::Table
                        | Display::TableRowGroup
                        | Display::TableHeaderGroup
                        | Display::TableFooterGroup
                )
            ),
            Display::TableRowGroup | Display::TableHeaderGroup | Display::TableFooterGroup => {
                !matches!(parent_display, Some(Display::Table | Display::TableRowGroup))
            }
            Display::TableColumn => parent_display != Some(Display::TableColumnGroup),
            Display::TableColumnGroup | Display::TableCaption => {
                parent_display != Some(Display::Table)
            }
            _ => false,
        },
    }
}

/// Finds the first block-level node in `[start, end)` among the children of
/// `parent`, descending into inline elements so that a block nested inside
/// inline markup still breaks the surrounding run.
fn find_next_block_node(
    ctx: &LayoutContext<'_>,
    parent: NodeId,
    start: usize,
    end: usize,
) -> Option<NodeId> {
    let doc = ctx.document;
    for child in doc.content_children(parent, start, end) {
        let Child::Node(id) = child else { continue };
        if display_of(ctx, id) == Display::None {
            continue;
        }
        if !node_is_inline(ctx, id) {
            return Some(id);
        }
        if matches!(doc.kind(id), NodeKind::Element { .. }) {
            let inner_start = (doc.start_offset(id) + 1).max(start);
            let inner_end = doc.end_offset(id).min(end);
            if inner_start < inner_end {
                if let Some(found) = find_next_block_node(ctx, id, inner_start, inner_end) {
                    return Some(found);
                }
            }
        }
    }
    None
}

enum Chunk {
    Inline(ContentRange),
    Block(NodeId),
}

/// Yields the range as alternating inline stretches and block nodes, with a
/// one-chunk push-back so the caller can peek past a run of table children.
struct BlockInlineIterator<'c, 'a> {
    ctx: &'c LayoutContext<'a>,
    node: NodeId,
    cursor: usize,
    end: usize,
    pushed: Vec<Chunk>,
}

impl<'c, 'a> BlockInlineIterator<'c, 'a> {
    fn new(ctx: &'c LayoutContext<'a>, node: NodeId, start: usize, end: usize) -> Self {
        BlockInlineIterator {
            ctx,
            node,
            cursor: start,
            end,
            pushed: Vec::new(),
        }
    }

    fn push_back(&mut self, chunk: Chunk) {
        self.pushed.push(chunk);
    }

    fn next_chunk(&mut self) -> Option<Chunk> {
        if let Some(chunk) = self.pushed.pop() {
            return Some(chunk);
        }
        if self.cursor >= self.end {
            return None;
        }
        let doc = self.ctx.document;
        match find_next_block_node(self.ctx, self.node, self.cursor, self.end) {
            None => {
                let range = ContentRange::new(self.cursor, self.end);
                self.cursor = self.end;
                Some(Chunk::Inline(range))
            }
            Some(block) => {
                let block_start = doc.start_offset(block);
                let block_end = doc.end_offset(block);
                if block_start > self.cursor {
                    let range = ContentRange::new(self.cursor, block_start);
                    self.pushed.push(Chunk::Block(block));
                    self.cursor = block_end + 1;
                    Some(Chunk::Inline(range))
                } else {
                    self.cursor = block_end + 1;
                    Some(Chunk::Block(block))
                }
            }
        }
    }
}

/// Builds the block-level boxes for `range` under `parent`.
///
/// `leading` and `trailing` are already-created inline boxes grafted onto the
/// first and last paragraph, used when a caller splits a run of inline
/// content around a block boundary. An empty point range produces a single
/// paragraph holding one placeholder so the caret has somewhere to live.
pub fn create_block_boxes(
    ctx: &LayoutContext<'_>,
    tree: &mut BoxTree,
    parent: BoxId,
    range: ContentRange,
    width: f32,
    leading: Vec<BoxId>,
    trailing: Vec<BoxId>,
) -> Vec<BoxId> {
    let doc = ctx.document;
    let mut result = Vec::new();
    let mut pending = leading;
    let node = doc.find_common_node(range.start, range.end);

    if range.is_empty() {
        pending.push(make_placeholder(
            tree,
            node,
            range.start - doc.start_offset(node),
        ));
    } else {
        let in_table = matches!(tree[parent].kind, BoxKind::Table);
        let mut chunks = BlockInlineIterator::new(ctx, node, range.start, range.end);
        while let Some(chunk) = chunks.next_chunk() {
            match chunk {
                Chunk::Inline(range) => {
                    pending.extend(create_inline_boxes(ctx, tree, node, range));
                    pending.push(make_placeholder(
                        tree,
                        node,
                        range.end - doc.start_offset(node),
                    ));
                }
                Chunk::Block(block) => {
                    if !pending.is_empty() {
                        result.push(make_paragraph(doc, tree, parent, std::mem::take(&mut pending)));
                    }
                    if !in_table && display_of(ctx, block).is_table_child() {
                        let table_start = doc.start_offset(block);
                        let mut table_end = doc.end_offset(block);
                        while let Some(next) = chunks.next_chunk() {
                            match next {
                                Chunk::Block(sibling)
                                    if display_of(ctx, sibling).is_table_child() =>
                                {
                                    table_end = doc.end_offset(sibling);
                                }
                                other => {
                                    chunks.push_back(other);
                                    break;
                                }
                            }
                        }
                        result.push(make_anonymous_table(
                            doc,
                            tree,
                            parent,
                            table_start,
                            table_end + 1,
                        ));
                    } else {
                        result.push(ctx.factory.create_box(ctx, tree, block, parent, width));
                    }
                }
            }
        }
    }

    pending.extend(trailing);
    if !pending.is_empty() {
        result.push(make_paragraph(doc, tree, parent, pending));
    }
    result
}

/// Builds the inline fragment boxes for `[range.start, range.end)` inside
/// `node`: text runs, unbreakable inline elements, and, for inline elements
/// only partially covered because a block was pulled out of them, their
/// remaining inline content.
pub fn create_inline_boxes(
    ctx: &LayoutContext<'_>,
    tree: &mut BoxTree,
    node: NodeId,
    range: ContentRange,
) -> Vec<BoxId> {
    let doc = ctx.document;
    let node_start = doc.start_offset(node);
    let mut result = Vec::new();
    for child in doc.content_children(node, range.start, range.end) {
        match child {
            Child::Text(text_range) => {
                let mut data = BoxData::new(BoxKind::Text {
                    text: doc.text_between(text_range),
                });
                data.node = Some(node);
                data.rel_range =
                    Some((text_range.start - node_start, text_range.end - node_start));
                result.push(tree.push(data));
            }
            Child::Node(id) => {
                if display_of(ctx, id) == Display::None {
                    continue;
                }
                let child_start = doc.start_offset(id);
                let child_end = doc.end_offset(id);
                if child_start >= range.start && child_end < range.end {
                    let mut data = BoxData::new(BoxKind::InlineElement {
                        text: doc.text_of(id),
                    });
                    data.node = Some(id);
                    data.rel_range = Some((0, child_end - child_start + 1));
                    result.push(tree.push(data));
                } else {
                    let inner_start = (child_start + 1).max(range.start);
                    let inner_end = child_end.min(range.end);
                    if inner_start < inner_end {
                        result.extend(create_inline_boxes(
                            ctx,
                            tree,
                            id,
                            ContentRange::new(inner_start, inner_end),
                        ));
                    }
                }
            }
        }
    }
    result
}

fn make_placeholder(tree: &mut BoxTree, node: NodeId, rel_offset: usize) -> BoxId {
    let mut data = BoxData::new(BoxKind::Placeholder);
    data.node = Some(node);
    data.rel_range = Some((rel_offset, rel_offset));
    tree.push(data)
}

fn make_paragraph(
    doc: &Document,
    tree: &mut BoxTree,
    parent: BoxId,
    fragments: Vec<BoxId>,
) -> BoxId {
    let start = tree.start_offset(doc, fragments[0]);
    let end = tree.end_offset(doc, fragments[fragments.len() - 1]);
    let mut data = BoxData::new(BoxKind::Paragraph);
    data.parent = Some(parent);
    data.start_pos = Some(doc.create_position(start));
    data.end_pos = Some(doc.create_position(end));
    let id = tree.push(data);
    for &fragment in &fragments {
        tree[fragment].parent = Some(id);
    }
    tree[id].children = fragments;
    id
}

fn make_anonymous_table(
    doc: &Document,
    tree: &mut BoxTree,
    parent: BoxId,
    start: usize,
    end: usize,
) -> BoxId {
    let mut data = BoxData::new(BoxKind::Table);
    data.parent = Some(parent);
    data.start_pos = Some(doc.create_position(start));
    data.end_pos = Some(doc.create_position(end));
    tree.push(data)
}
