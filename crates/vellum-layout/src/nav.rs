//! Caret placement, hit testing and line navigation over the box tree.
//!
//! All three walks share the same shape: find the child whose offsets or
//! band contain the query, recurse with translated coordinates, and fall
//! back to an estimate for boxes that have not been laid out yet.

use vellum_dom::Document;

use crate::context::LayoutContext;
use crate::geometry::Caret;
use crate::tree::{BoxId, BoxKind, BoxTree, LayoutState};

/// Caret geometry for `offset`, relative to the given box.
#[must_use]
pub fn caret(ctx: &LayoutContext<'_>, tree: &BoxTree, id: BoxId, offset: usize) -> Caret {
    let doc = ctx.document;
    match &tree[id].kind {
        BoxKind::Text { text } => {
            let start = tree.start_offset(doc, id);
            let styles = ctx.containing_styles(tree, id);
            let prefix: String = text.chars().take(offset.saturating_sub(start)).collect();
            Caret::new(
                ctx.metrics.text_width(&prefix, styles.font_size),
                0.0,
                tree[id].height,
            )
        }
        BoxKind::Placeholder => Caret::new(0.0, 0.0, tree[id].height),
        BoxKind::InlineElement { .. } => {
            let x = if offset >= tree.end_offset(doc, id) {
                tree[id].width
            } else {
                0.0
            };
            Caret::new(x, 0.0, tree[id].height)
        }
        BoxKind::Paragraph => paragraph_caret(ctx, tree, id, offset),
        BoxKind::Root | BoxKind::Block | BoxKind::Table => block_caret(ctx, tree, id, offset),
    }
}

fn estimated_caret(tree: &BoxTree, doc: &Document, id: BoxId, offset: usize) -> Caret {
    let start = tree.start_offset(doc, id);
    let size = tree.end_offset(doc, id).saturating_sub(start).max(1);
    let y = tree[id].height * offset.saturating_sub(start) as f32 / size as f32;
    Caret::horizontal(y)
}

fn block_caret(ctx: &LayoutContext<'_>, tree: &BoxTree, id: BoxId, offset: usize) -> Caret {
    let doc = ctx.document;
    if tree[id].state != LayoutState::Ok {
        return estimated_caret(tree, doc, id, offset);
    }
    let mut previous_bottom = 0.0;
    for &child in &tree[id].children {
        if !tree.has_content(child) {
            continue;
        }
        let child_start = tree.start_offset(doc, child);
        if offset < child_start {
            // Between two blocks: a horizontal caret in the gap.
            return Caret::horizontal((previous_bottom + tree[child].y) / 2.0);
        }
        if offset <= tree.end_offset(doc, child) {
            return caret(ctx, tree, child, offset).translated(tree[child].x, tree[child].y);
        }
        previous_bottom = tree[child].y + tree[child].height;
    }
    Caret::horizontal(tree[id].height)
}

fn paragraph_caret(ctx: &LayoutContext<'_>, tree: &BoxTree, id: BoxId, offset: usize) -> Caret {
    let doc = ctx.document;
    if tree[id].state != LayoutState::Ok {
        return estimated_caret(tree, doc, id, offset);
    }
    let mut last = None;
    for &fragment in &tree[id].children {
        if offset < tree.start_offset(doc, fragment) {
            return Caret::new(tree[fragment].x, tree[fragment].y, tree[fragment].height);
        }
        if offset <= tree.end_offset(doc, fragment) {
            return caret(ctx, tree, fragment, offset)
                .translated(tree[fragment].x, tree[fragment].y);
        }
        last = Some(fragment);
    }
    match last {
        Some(fragment) => Caret::new(
            tree[fragment].x + tree[fragment].width,
            tree[fragment].y,
            tree[fragment].height,
        ),
        None => Caret::horizontal(0.0),
    }
}

/// The content offset nearest to the point `(x, y)`, in box-relative
/// coordinates.
#[must_use]
pub fn view_to_model(
    ctx: &LayoutContext<'_>,
    tree: &BoxTree,
    id: BoxId,
    x: f32,
    y: f32,
) -> usize {
    let doc = ctx.document;
    let start = tree.start_offset(doc, id);
    let end = tree.end_offset(doc, id);
    match &tree[id].kind {
        BoxKind::Placeholder => start,
        BoxKind::InlineElement { .. } => {
            if x > tree[id].width / 2.0 {
                end
            } else {
                start
            }
        }
        BoxKind::Text { text } => {
            let styles = ctx.containing_styles(tree, id);
            let mut cumulative = 0.0;
            for (index, ch) in text.chars().enumerate() {
                let char_width = ctx
                    .metrics
                    .text_width(&ch.to_string(), styles.font_size);
                if x < cumulative + char_width / 2.0 {
                    return start + index;
                }
                cumulative += char_width;
            }
            end
        }
        BoxKind::Paragraph if tree[id].state == LayoutState::Ok => {
            paragraph_view_to_model(ctx, tree, id, x, y)
        }
        _ => block_view_to_model(ctx, tree, id, x, y),
    }
}

fn block_view_to_model(
    ctx: &LayoutContext<'_>,
    tree: &BoxTree,
    id: BoxId,
    x: f32,
    y: f32,
) -> usize {
    let doc = ctx.document;
    let start = tree.start_offset(doc, id);
    let end = tree.end_offset(doc, id);
    let laid_out = tree[id].state == LayoutState::Ok && !tree[id].children.is_empty();
    if !laid_out {
        // Proportional estimate across the box's character count.
        let char_count = end.saturating_sub(start).saturating_sub(1);
        if char_count == 0 || tree[id].height <= 0.0 {
            return start;
        }
        let estimated = (char_count as f32 * y.max(0.0) / tree[id].height) as usize;
        return (start + estimated).min(end);
    }
    for &child in &tree[id].children {
        if !tree.has_content(child) {
            continue;
        }
        if y < tree[child].y {
            return tree.start_offset(doc, child).saturating_sub(1);
        }
        if y < tree[child].y + tree[child].height {
            return view_to_model(ctx, tree, child, x - tree[child].x, y - tree[child].y);
        }
    }
    end
}

fn paragraph_view_to_model(
    ctx: &LayoutContext<'_>,
    tree: &BoxTree,
    id: BoxId,
    x: f32,
    y: f32,
) -> usize {
    let doc = ctx.document;
    let end = tree.end_offset(doc, id);
    let children = &tree[id].children;
    let Some(line_top) = children
        .iter()
        .find(|&&fragment| y < tree[fragment].y + tree[fragment].height)
        .map(|&fragment| tree[fragment].y)
    else {
        return end;
    };
    let line: Vec<BoxId> = children
        .iter()
        .copied()
        .filter(|&fragment| tree[fragment].y == line_top)
        .collect();
    for &fragment in &line {
        if x < tree[fragment].x + tree[fragment].width {
            return view_to_model(
                ctx,
                tree,
                fragment,
                x - tree[fragment].x,
                y - tree[fragment].y,
            );
        }
    }
    line.last()
        .map_or(end, |&fragment| tree.end_offset(doc, fragment))
}

/// The offset one line below `offset`, keeping the column near `x`, or
/// `None` when the offset already sits on the box's last line.
#[must_use]
pub fn next_line_offset(
    ctx: &LayoutContext<'_>,
    tree: &BoxTree,
    id: BoxId,
    offset: usize,
    x: f32,
) -> Option<usize> {
    let doc = ctx.document;
    match tree[id].kind {
        BoxKind::Paragraph => paragraph_line_step(ctx, tree, id, offset, x, true),
        BoxKind::Root | BoxKind::Block | BoxKind::Table => {
            let end = tree.end_offset(doc, id);
            if offset == end {
                return None;
            }
            for &child in &tree[id].children {
                if !tree.has_content(child) {
                    continue;
                }
                let child_start = tree.start_offset(doc, child);
                if offset < child_start {
                    return Some(child_start);
                }
                let child_end = tree.end_offset(doc, child);
                if offset <= child_end {
                    return match next_line_offset(ctx, tree, child, offset, x - tree[child].x) {
                        Some(found) => Some(found),
                        None => Some((child_end + 1).min(end)),
                    };
                }
            }
            Some(end)
        }
        _ => None,
    }
}

/// The offset one line above `offset`, or `None` from the box's first line.
#[must_use]
pub fn previous_line_offset(
    ctx: &LayoutContext<'_>,
    tree: &BoxTree,
    id: BoxId,
    offset: usize,
    x: f32,
) -> Option<usize> {
    let doc = ctx.document;
    match tree[id].kind {
        BoxKind::Paragraph => paragraph_line_step(ctx, tree, id, offset, x, false),
        BoxKind::Root | BoxKind::Block | BoxKind::Table => {
            let start = tree.start_offset(doc, id);
            if offset == start {
                return None;
            }
            for &child in tree[id].children.iter().rev() {
                if !tree.has_content(child) {
                    continue;
                }
                let child_end = tree.end_offset(doc, child);
                if offset > child_end {
                    return Some(child_end);
                }
                let child_start = tree.start_offset(doc, child);
                if offset >= child_start {
                    return match previous_line_offset(ctx, tree, child, offset, x - tree[child].x)
                    {
                        Some(found) => Some(found),
                        None => Some(child_start.saturating_sub(1).max(start)),
                    };
                }
            }
            Some(start)
        }
        _ => None,
    }
}

/// Moves to the adjacent line inside a paragraph, picking the fragment under
/// the preserved column.
fn paragraph_line_step(
    ctx: &LayoutContext<'_>,
    tree: &BoxTree,
    id: BoxId,
    offset: usize,
    x: f32,
    downward: bool,
) -> Option<usize> {
    let doc = ctx.document;
    let children = &tree[id].children;
    let current = children.iter().copied().find(|&fragment| {
        tree.start_offset(doc, fragment) <= offset && offset <= tree.end_offset(doc, fragment)
    })?;
    let current_top = tree[current].y;
    let target_top = if downward {
        children
            .iter()
            .map(|&fragment| tree[fragment].y)
            .filter(|&top| top > current_top)
            .fold(None, |best: Option<f32>, top| {
                Some(best.map_or(top, |b| b.min(top)))
            })?
    } else {
        children
            .iter()
            .map(|&fragment| tree[fragment].y)
            .filter(|&top| top < current_top)
            .fold(None, |best: Option<f32>, top| {
                Some(best.map_or(top, |b| b.max(top)))
            })?
    };
    let line: Vec<BoxId> = children
        .iter()
        .copied()
        .filter(|&fragment| tree[fragment].y == target_top)
        .collect();
    for &fragment in &line {
        if x < tree[fragment].x + tree[fragment].width {
            return Some(view_to_model(
                ctx,
                tree,
                fragment,
                x - tree[fragment].x,
                0.0,
            ));
        }
    }
    line.last().map(|&fragment| tree.end_offset(doc, fragment))
}
