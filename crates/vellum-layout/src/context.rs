//! Shared state threaded through layout passes.

use std::rc::Rc;

use vellum_css::{Display, StyleSheet, Styles};
use vellum_dom::{Document, NodeId};

use crate::metrics::FontMetrics;
use crate::tree::{BoxData, BoxId, BoxKind, BoxTree};

/// Everything a layout pass needs besides the box tree itself.
pub struct LayoutContext<'a> {
    /// The document being laid out.
    pub document: &'a Document,
    /// The style sheet resolving node styles.
    pub sheet: &'a StyleSheet,
    /// Text measurement backend.
    pub metrics: &'a dyn FontMetrics,
    /// Creates boxes for block-level nodes.
    pub factory: &'a dyn BoxFactory,
}

impl LayoutContext<'_> {
    /// The resolved styles of the nearest node at or above the given box.
    /// The root box always anchors the walk.
    #[must_use]
    pub fn containing_styles(&self, tree: &BoxTree, id: BoxId) -> Rc<Styles> {
        let mut current = Some(id);
        while let Some(boxed) = current {
            if let Some(node) = tree[boxed].node {
                return self.sheet.styles(self.document, node);
            }
            current = tree[boxed].parent;
        }
        Rc::new(Styles::initial())
    }
}

/// Creates the box for one block-level node.
///
/// The factory is the seam where an embedder substitutes its own box kinds;
/// the engine only requires that created boxes anchor to the node and to the
/// given parent.
pub trait BoxFactory {
    /// Creates a box for `node` under `parent`. `containing_width` is the
    /// width margins and percentage paddings resolve against.
    fn create_box(
        &self,
        ctx: &LayoutContext<'_>,
        tree: &mut BoxTree,
        node: NodeId,
        parent: BoxId,
        containing_width: f32,
    ) -> BoxId;
}

/// The default factory: `display: table` elements become table boxes, every
/// other block-level node becomes a plain block box.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssBoxFactory;

impl BoxFactory for CssBoxFactory {
    fn create_box(
        &self,
        ctx: &LayoutContext<'_>,
        tree: &mut BoxTree,
        node: NodeId,
        parent: BoxId,
        containing_width: f32,
    ) -> BoxId {
        let styles = ctx.sheet.styles(ctx.document, node);
        let kind = if styles.display == Display::Table {
            BoxKind::Table
        } else {
            BoxKind::Block
        };
        let mut data = BoxData::new(kind);
        data.node = Some(node);
        data.parent = Some(parent);
        data.margin_top = styles.margin_top.resolve(containing_width);
        data.margin_bottom = styles.margin_bottom.resolve(containing_width);
        tree.push(data)
    }
}
