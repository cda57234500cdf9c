//! The incremental layout passes.
//!
//! Layout is demand driven: `layout(top, bottom)` only does work for boxes
//! intersecting the requested vertical band, so material far outside the
//! viewport stays in `REDO` until it is actually asked for. Each pass returns
//! the band that changed and therefore needs repainting, or `None` when
//! nothing moved.

use std::collections::VecDeque;

use vellum_dom::{ContentRange, Document, NodeId};

use crate::builder;
use crate::context::LayoutContext;
use crate::geometry::{Caret, Insets, VerticalRange};
use crate::nav;
use crate::text::split_text;
use crate::tree::{BoxData, BoxId, BoxKind, BoxTree, LayoutState};

/// Lays out one box over the band `[top, bottom]` in box-relative
/// coordinates. Returns the vertical band that changed, if any.
pub fn layout(
    ctx: &LayoutContext<'_>,
    tree: &mut BoxTree,
    id: BoxId,
    top: f32,
    bottom: f32,
) -> Option<VerticalRange> {
    match tree[id].kind {
        BoxKind::Root | BoxKind::Block | BoxKind::Table => layout_block(ctx, tree, id, top, bottom),
        BoxKind::Paragraph => layout_paragraph(ctx, tree, id),
        _ => {
            tree[id].state = LayoutState::Ok;
            None
        }
    }
}

fn layout_block(
    ctx: &LayoutContext<'_>,
    tree: &mut BoxTree,
    id: BoxId,
    top: f32,
    bottom: f32,
) -> Option<VerticalRange> {
    let original_height = tree[id].height;
    let mut repaint_to_bottom = false;
    let mut result: Option<VerticalRange> = None;

    if tree[id].state == LayoutState::Redo {
        create_children(ctx, tree, id);
        let children = tree[id].children.clone();
        for &child in &children {
            set_initial_size(ctx, tree, child);
        }
        let _ = position_children(ctx, tree, id);
        repaint_to_bottom = true;
        result = Some(VerticalRange::new(0.0, 0.0));
    }

    let children = tree[id].children.clone();
    for child in children {
        let child_top = tree[child].y;
        let child_bottom = child_top + tree[child].height;
        if top <= child_bottom && bottom >= child_top {
            if let Some(range) = layout(ctx, tree, child, top - child_top, bottom - child_top) {
                let moved = range.move_by(child_top);
                result = Some(result.map_or(moved, |r| r.union(moved)));
            }
        }
    }

    if let Some(first_moved) = position_children(ctx, tree, id) {
        repaint_to_bottom = true;
        let new_top = result.map_or(first_moved, |r| r.top.min(first_moved));
        let new_bottom = result.map_or(first_moved, |r| r.bottom);
        result = Some(VerticalRange::new(new_top, new_bottom));
    }

    tree[id].state = LayoutState::Ok;

    if repaint_to_bottom {
        let repaint_top = result.map_or(0.0, |r| r.top);
        result = Some(VerticalRange::new(
            repaint_top,
            original_height.max(tree[id].height),
        ));
    }
    result.filter(|range| !range.is_empty())
}

/// Rebuilds a block's children from the document. The old subtree is
/// abandoned in the arena after its tracked positions are released.
fn create_children(ctx: &LayoutContext<'_>, tree: &mut BoxTree, id: BoxId) {
    tree.release_subtree(ctx.document, id);
    let width = tree[id].width;
    match tree[id].kind {
        BoxKind::Root => {
            let root_element = ctx.document.root_element();
            let child = ctx.factory.create_box(ctx, tree, root_element, id, width);
            tree[id].children = vec![child];
        }
        BoxKind::Block | BoxKind::Table => {
            let start = tree.start_offset(ctx.document, id);
            let end = tree.end_offset(ctx.document, id);
            let range = ContentRange::new(start, end);
            let children =
                builder::create_block_boxes(ctx, tree, id, range, width, Vec::new(), Vec::new());
            tree[id].children = children;
        }
        _ => {}
    }
}

/// Gives a freshly built child its provisional geometry: full available
/// width, estimated height.
fn set_initial_size(ctx: &LayoutContext<'_>, tree: &mut BoxTree, id: BoxId) {
    let Some(parent) = tree[id].parent else {
        return;
    };
    let parent_width = tree[parent].width;
    let child_insets = insets(ctx, tree, id, parent_width);
    tree[id].width = (parent_width - child_insets.left - child_insets.right).max(0.0);
    tree[id].height = estimated_height(ctx, tree, id);
}

/// The resolved spacing around a box. Element boxes carry margin, border and
/// padding; anonymous boxes only their cached vertical margins.
#[must_use]
pub fn insets(
    ctx: &LayoutContext<'_>,
    tree: &BoxTree,
    id: BoxId,
    container_width: f32,
) -> Insets {
    match tree[id].node {
        Some(node) => {
            let styles = ctx.sheet.styles(ctx.document, node);
            Insets {
                top: tree[id].margin_top
                    + styles.border_top_width
                    + styles.padding_top.resolve(container_width),
                left: styles.margin_left.resolve(container_width)
                    + styles.border_left_width
                    + styles.padding_left.resolve(container_width),
                bottom: tree[id].margin_bottom
                    + styles.border_bottom_width
                    + styles.padding_bottom.resolve(container_width),
                right: styles.margin_right.resolve(container_width)
                    + styles.border_right_width
                    + styles.padding_right.resolve(container_width),
            }
        }
        None => Insets {
            top: tree[id].margin_top,
            left: 0.0,
            bottom: tree[id].margin_bottom,
            right: 0.0,
        },
    }
}

/// A plausible height for a box whose content has not been laid out yet,
/// floored at one line. Keeps carets and scrolling sensible ahead of actual
/// layout.
fn estimated_height(ctx: &LayoutContext<'_>, tree: &BoxTree, id: BoxId) -> f32 {
    let styles = ctx.containing_styles(tree, id);
    let doc = ctx.document;
    let char_count =
        (tree.end_offset(doc, id).saturating_sub(tree.start_offset(doc, id))) as f32;
    let width = tree[id].width.max(1.0);
    let estimate = styles.line_height * styles.font_size * 0.6 * char_count / width;
    estimate.max(styles.line_height)
}

/// Stacks the children vertically, collapsing adjoining vertical margins.
///
/// Adjacent siblings keep only the larger of the two touching margins. When
/// the box itself has no top (resp. bottom) border or padding, the first
/// (resp. last) child's margin collapses through into the box's own margin
/// instead of consuming vertical space. Returns the y coordinate at which
/// children first deviate from their previous position, or `None` when
/// nothing moved.
fn position_children(ctx: &LayoutContext<'_>, tree: &mut BoxTree, id: BoxId) -> Option<f32> {
    let children = tree[id].children.clone();
    let width = tree[id].width;

    let (top_edge, bottom_edge) = match tree[id].node {
        Some(node) => {
            let styles = ctx.sheet.styles(ctx.document, node);
            (
                styles.border_top_width + styles.padding_top.resolve(width),
                styles.border_bottom_width + styles.padding_bottom.resolve(width),
            )
        }
        None => (0.0, 0.0),
    };

    let mut child_y = 0.0;
    let mut first_moved: Option<f32> = None;

    if tree[id].node.is_some() && !children.is_empty() && top_edge == 0.0 {
        let first_margin = tree[children[0]].margin_top;
        tree[id].margin_top = tree[id].margin_top.max(first_margin);
        child_y -= first_margin;
    }

    let mut previous_margin: f32 = 0.0;
    for (index, &child) in children.iter().enumerate() {
        let child_insets = insets(ctx, tree, child, width);
        child_y += child_insets.top;
        if index > 0 {
            child_y -= previous_margin.min(tree[child].margin_top);
        }
        if tree[child].y != child_y && first_moved.is_none() {
            first_moved = Some(tree[child].y.min(child_y));
        }
        tree[child].x = child_insets.left;
        tree[child].y = child_y;
        child_y += tree[child].height + child_insets.bottom;
        previous_margin = tree[child].margin_bottom;
    }

    if tree[id].node.is_some() && !children.is_empty() && bottom_edge == 0.0 {
        let last_margin = tree[children[children.len() - 1]].margin_bottom;
        tree[id].margin_bottom = tree[id].margin_bottom.max(last_margin);
        child_y -= last_margin;
    }

    tree[id].height = child_y;
    first_moved
}

/// Flows a paragraph's inline fragments into lines. Fragments that do not
/// fit the remaining line are split at the furthest fitting whitespace
/// boundary, force-split mid-word when alone on an empty line, or moved to
/// the next line whole.
fn layout_paragraph(
    ctx: &LayoutContext<'_>,
    tree: &mut BoxTree,
    id: BoxId,
) -> Option<VerticalRange> {
    if tree[id].state != LayoutState::Redo {
        tree[id].state = LayoutState::Ok;
        return None;
    }
    let original_height = tree[id].height;
    let styles = ctx.containing_styles(tree, id);
    let font_size = styles.font_size;
    let line_height = styles.line_height;
    let width = tree[id].width;

    let mut queue: VecDeque<BoxId> = std::mem::take(&mut tree[id].children).into();
    let mut placed = Vec::new();
    let mut x = 0.0;
    let mut y = 0.0;

    while let Some(fragment) = queue.pop_front() {
        let budget = width - x;
        match tree[fragment].kind.clone() {
            BoxKind::Placeholder => {
                place_fragment(tree, fragment, x, y, 0.0, line_height);
                placed.push(fragment);
            }
            BoxKind::InlineElement { text } => {
                let fragment_width = ctx.metrics.text_width(&text, font_size);
                if fragment_width <= budget || x == 0.0 {
                    place_fragment(tree, fragment, x, y, fragment_width, line_height);
                    placed.push(fragment);
                    x += fragment_width;
                } else {
                    x = 0.0;
                    y += line_height;
                    queue.push_front(fragment);
                }
            }
            BoxKind::Text { text } => {
                let fragment_width = ctx.metrics.text_width(&text, font_size);
                if fragment_width <= budget {
                    place_fragment(tree, fragment, x, y, fragment_width, line_height);
                    placed.push(fragment);
                    x += fragment_width;
                    continue;
                }
                match split_text(&text, budget, x == 0.0, ctx.metrics, font_size) {
                    (Some(left), right) => {
                        let left_count = left.chars().count();
                        let (rel_start, rel_end) =
                            tree[fragment].rel_range.unwrap_or((0, text.chars().count()));
                        let mut left_data = BoxData::new(BoxKind::Text {
                            text: left.to_string(),
                        });
                        left_data.node = tree[fragment].node;
                        left_data.rel_range = Some((rel_start, rel_start + left_count));
                        left_data.parent = Some(id);
                        let left_width = ctx.metrics.text_width(left, font_size);
                        let right = right.to_string();
                        let left_id = tree.push(left_data);
                        place_fragment(tree, left_id, x, y, left_width, line_height);
                        placed.push(left_id);

                        tree[fragment].kind = BoxKind::Text { text: right };
                        tree[fragment].rel_range = Some((rel_start + left_count, rel_end));
                        x = 0.0;
                        y += line_height;
                        queue.push_front(fragment);
                    }
                    (None, _) => {
                        x = 0.0;
                        y += line_height;
                        queue.push_front(fragment);
                    }
                }
            }
            _ => {}
        }
    }

    let height = if placed.is_empty() { 0.0 } else { y + line_height };
    tree[id].children = placed;
    tree[id].height = height;
    tree[id].state = LayoutState::Ok;
    Some(VerticalRange::new(0.0, original_height.max(height)))
}

fn place_fragment(tree: &mut BoxTree, id: BoxId, x: f32, y: f32, width: f32, height: f32) {
    let data = &mut tree[id];
    data.x = x;
    data.y = y;
    data.width = width;
    data.height = height;
    data.state = LayoutState::Ok;
}

/// Marks a box dirty. A direct invalidation means the box's own content
/// changed: it moves to `REDO`, and if any later sibling's offsets may have
/// shifted, the parent must rebuild too. Indirect invalidations downgrade
/// clean ancestors to `PROPAGATE` without ever weakening a `REDO`.
pub fn invalidate(tree: &mut BoxTree, doc: &Document, id: BoxId, direct: bool) {
    if direct {
        tree[id].state = LayoutState::Redo;
        if let Some(parent) = tree[id].parent {
            let offset = tree.start_offset(doc, id);
            let has_later_children = tree[parent]
                .children
                .iter()
                .any(|&child| tree.has_content(child) && tree.start_offset(doc, child) > offset);
            if has_later_children {
                tree[parent].state = LayoutState::Redo;
            }
        }
    } else if tree[id].state != LayoutState::Redo {
        tree[id].state = LayoutState::Propagate;
    }
    if let Some(parent) = tree[id].parent {
        invalidate(tree, doc, parent, false);
    }
}

/// Owns the box tree for one document and drives incremental layout over it.
pub struct LayoutEngine {
    tree: BoxTree,
    root: BoxId,
}

impl LayoutEngine {
    /// Creates an engine with an empty root box of the given width. The
    /// first [`LayoutEngine::layout`] call builds the tree.
    #[must_use]
    pub fn new(width: f32) -> Self {
        let mut tree = BoxTree::new();
        let mut data = BoxData::new(BoxKind::Root);
        data.node = Some(NodeId::ROOT);
        data.width = width;
        let root = tree.push(data);
        LayoutEngine { tree, root }
    }

    /// The root box.
    #[must_use]
    pub fn root(&self) -> BoxId {
        self.root
    }

    /// Read access to the box tree.
    #[must_use]
    pub fn tree(&self) -> &BoxTree {
        &self.tree
    }

    /// Lays out the band `[top, bottom]` in document coordinates and returns
    /// the band needing repaint, if any.
    pub fn layout(
        &mut self,
        ctx: &LayoutContext<'_>,
        top: f32,
        bottom: f32,
    ) -> Option<VerticalRange> {
        layout(ctx, &mut self.tree, self.root, top, bottom)
    }

    /// Marks the deepest block-level box containing `offset` for rebuild.
    /// Call after every document edit, before the next layout pass.
    pub fn invalidate_at(&mut self, doc: &Document, offset: usize) {
        let mut current = self.root;
        'descend: loop {
            let children = self.tree[current].children.clone();
            for child in children {
                if matches!(
                    self.tree[child].kind,
                    BoxKind::Block | BoxKind::Table
                ) && self.tree.has_content(child)
                    && self.tree.start_offset(doc, child) <= offset
                    && offset <= self.tree.end_offset(doc, child)
                {
                    current = child;
                    continue 'descend;
                }
            }
            break;
        }
        invalidate(&mut self.tree, doc, current, true);
    }

    /// Changes the available width, forcing a full rebuild on the next pass.
    pub fn resize(&mut self, width: f32) {
        if self.tree[self.root].width != width {
            self.tree[self.root].width = width;
            self.tree[self.root].state = LayoutState::Redo;
        }
    }

    /// Caret geometry for a content offset, in document coordinates.
    #[must_use]
    pub fn caret(&self, ctx: &LayoutContext<'_>, offset: usize) -> Caret {
        nav::caret(ctx, &self.tree, self.root, offset)
    }

    /// The content offset nearest to the point `(x, y)` in document
    /// coordinates.
    #[must_use]
    pub fn view_to_model(&self, ctx: &LayoutContext<'_>, x: f32, y: f32) -> usize {
        nav::view_to_model(ctx, &self.tree, self.root, x, y)
    }

    /// The offset one line below `offset`, keeping the column near `x`, or
    /// `None` from the last line.
    #[must_use]
    pub fn next_line_offset(
        &self,
        ctx: &LayoutContext<'_>,
        offset: usize,
        x: f32,
    ) -> Option<usize> {
        nav::next_line_offset(ctx, &self.tree, self.root, offset, x)
    }

    /// The offset one line above `offset`, keeping the column near `x`, or
    /// `None` from the first line.
    #[must_use]
    pub fn previous_line_offset(
        &self,
        ctx: &LayoutContext<'_>,
        offset: usize,
        x: f32,
    ) -> Option<usize> {
        nav::previous_line_offset(ctx, &self.tree, self.root, offset, x)
    }
}
