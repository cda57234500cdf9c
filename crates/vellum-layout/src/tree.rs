//! The box tree arena.
//!
//! Boxes live in a flat arena indexed by [`BoxId`], mirroring the document's
//! node arena. A box remembers its document anchor in one of three ways:
//! element boxes point at their node, anonymous containers track their edges
//! with document positions that follow edits, and inline fragments store
//! offsets relative to their node's start marker. Rebuilding a subtree
//! abandons the old boxes in the arena; only their tracked positions need
//! releasing.

use std::ops::{Index, IndexMut};

use vellum_dom::{Document, NodeId, PositionId};

/// Index of a box in its [`BoxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxId(pub usize);

/// What a box is and, for inline fragments, what it renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoxKind {
    /// The single box at the top of the tree, covering the whole document.
    Root,
    /// A block-level element box.
    Block,
    /// An anonymous paragraph wrapping a run of inline content into lines.
    Paragraph,
    /// A table box, either for a `display: table` element or anonymous
    /// around stray table children.
    Table,
    /// A fragment of document text on one line.
    Text {
        /// The fragment's characters.
        text: String,
    },
    /// A zero-width caret anchor terminating a run of inline content.
    Placeholder,
    /// An inline element rendered as one unbreakable fragment.
    InlineElement {
        /// The element's flattened text content.
        text: String,
    },
}

/// How much layout work a box needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutState {
    /// Geometry is valid.
    Ok,
    /// Geometry is valid but some descendant needs laying out.
    Propagate,
    /// Children must be rebuilt and laid out from scratch.
    #[default]
    Redo,
}

/// One box in the tree.
#[derive(Debug)]
pub struct BoxData {
    /// What the box is.
    pub kind: BoxKind,
    /// The containing box; `None` only for the root box.
    pub parent: Option<BoxId>,
    /// Child boxes in document order (for paragraphs, in line order).
    pub children: Vec<BoxId>,
    /// The document node this box represents, if any.
    pub node: Option<NodeId>,
    /// Tracked start edge of an anonymous container.
    pub start_pos: Option<PositionId>,
    /// Tracked end edge of an anonymous container.
    pub end_pos: Option<PositionId>,
    /// Offsets of an inline fragment, relative to its node's start marker.
    pub rel_range: Option<(usize, usize)>,
    /// Horizontal position relative to the parent box.
    pub x: f32,
    /// Vertical position relative to the parent box.
    pub y: f32,
    /// Outer width.
    pub width: f32,
    /// Outer height.
    pub height: f32,
    /// Top margin resolved at construction against the containing width.
    pub margin_top: f32,
    /// Bottom margin resolved at construction against the containing width.
    pub margin_bottom: f32,
    /// Pending layout work.
    pub state: LayoutState,
}

impl BoxData {
    /// Creates an unanchored box of the given kind, needing layout.
    #[must_use]
    pub fn new(kind: BoxKind) -> Self {
        BoxData {
            kind,
            parent: None,
            children: Vec::new(),
            node: None,
            start_pos: None,
            end_pos: None,
            rel_range: None,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            margin_top: 0.0,
            margin_bottom: 0.0,
            state: LayoutState::Redo,
        }
    }
}

/// The arena of boxes.
#[derive(Debug, Default)]
pub struct BoxTree {
    boxes: Vec<BoxData>,
}

impl BoxTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        BoxTree { boxes: Vec::new() }
    }

    /// Adds a box to the arena and returns its id.
    pub fn push(&mut self, data: BoxData) -> BoxId {
        let id = BoxId(self.boxes.len());
        self.boxes.push(data);
        id
    }

    /// Number of boxes ever allocated, abandoned subtrees included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// True if no box has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// True if the box has no document node of its own.
    #[must_use]
    pub fn is_anonymous(&self, id: BoxId) -> bool {
        self[id].node.is_none()
    }

    /// True if the box corresponds to a document range, directly or through
    /// tracked positions.
    #[must_use]
    pub fn has_content(&self, id: BoxId) -> bool {
        let data = &self[id];
        data.node.is_some() || data.start_pos.is_some()
    }

    /// First content offset covered by the box.
    ///
    /// # Panics
    /// Panics on an anonymous box without tracked positions; such boxes must
    /// never be asked for offsets.
    #[must_use]
    pub fn start_offset(&self, doc: &Document, id: BoxId) -> usize {
        let data = &self[id];
        if let Some(position) = data.start_pos {
            return doc.position_offset(position);
        }
        match (data.node, data.rel_range) {
            (Some(node), Some((start, _))) => doc.start_offset(node) + start,
            (Some(node), None) => doc.start_offset(node) + 1,
            (None, _) => panic!("anonymous box has no document range"),
        }
    }

    /// Last content offset covered by the box.
    ///
    /// # Panics
    /// Panics on an anonymous box without tracked positions.
    #[must_use]
    pub fn end_offset(&self, doc: &Document, id: BoxId) -> usize {
        let data = &self[id];
        if let Some(position) = data.end_pos {
            return doc.position_offset(position);
        }
        match (data.node, data.rel_range) {
            (Some(node), Some((_, end))) => doc.start_offset(node) + end,
            (Some(node), None) => doc.end_offset(node),
            (None, _) => panic!("anonymous box has no document range"),
        }
    }

    /// Releases the tracked positions of a subtree that is being rebuilt.
    /// The boxes themselves stay in the arena and are simply never reached
    /// again.
    pub fn release_subtree(&mut self, doc: &Document, id: BoxId) {
        let children = self[id].children.clone();
        for child in children {
            if let Some(position) = self[child].start_pos {
                doc.remove_position(position);
            }
            if let Some(position) = self[child].end_pos {
                doc.remove_position(position);
            }
            self.release_subtree(doc, child);
        }
        self[id].children.clear();
    }
}

impl Index<BoxId> for BoxTree {
    type Output = BoxData;

    fn index(&self, id: BoxId) -> &BoxData {
        &self.boxes[id.0]
    }
}

impl IndexMut<BoxId> for BoxTree {
    fn index_mut(&mut self, id: BoxId) -> &mut BoxData {
        &mut self.boxes[id.0]
    }
}
