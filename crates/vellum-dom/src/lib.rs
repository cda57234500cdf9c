//! Document model for the Vellum layout engine.
//!
//! A document is a single flattened content stream of character and marker
//! units, plus an arena of structural nodes (elements, comments, processing
//! instructions) indexed by [`NodeId`]. Every structural node owns exactly two
//! markers in the stream, bracketing its content, so any node can be addressed
//! by a contiguous offset range. Text is not stored in separate nodes; runs of
//! characters between markers are synthesized into [`Child::Text`] ranges on
//! traversal.
//!
//! # Design
//!
//! The arena uses plain index handles for all relationships, giving O(1)
//! access and traversal without borrow checker issues. Offsets are kept
//! directly on each node and shifted on every edit, together with any
//! [`PositionId`] registered through [`Document::create_position`].

use std::cell::RefCell;
use std::collections::HashMap;

use thiserror::Error;

/// Map of attribute names to values for an element.
pub type AttributeMap = HashMap<String, String>;

/// A type-safe index into the document's node arena.
///
/// `NodeId` provides O(1) access to any node in the tree without borrowing
/// issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The document node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// A handle to an offset registered with the document that tracks edits:
/// insertions at or before the tracked offset shift it right, deletions
/// shift it left or collapse it onto the deleted range's start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionId(usize);

/// Discriminates the structural node variants.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The document itself; the root element is its only child.
    Document,
    /// An element with a local name and an attribute map.
    Element {
        /// The element's local name.
        name: String,
        /// The element's attributes.
        attrs: AttributeMap,
    },
    /// A comment; its content is the character run between its markers.
    Comment,
    /// A processing instruction with its target.
    ProcessingInstruction {
        /// The processing instruction's target.
        target: String,
    },
}

/// A single unit of the flattened content stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentUnit {
    /// One character of text content.
    Char(char),
    /// An opening or closing delimiter of the given node.
    Marker(NodeId),
}

/// A half-open `[start, end)` range of content offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    /// First offset in the range.
    pub start: usize,
    /// First offset past the range.
    pub end: usize,
}

impl ContentRange {
    /// Creates a range covering `[start, end)`.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        ContentRange { start, end }
    }

    /// Number of content units in the range.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True if the range covers no units.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True if the range contains the given offset.
    #[must_use]
    pub const fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// True if the two ranges share at least one offset.
    #[must_use]
    pub const fn intersects(&self, other: &ContentRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A child encountered while traversing a node's content: either a structural
/// node or a synthesized run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child {
    /// A structural child node.
    Node(NodeId),
    /// A run of characters between structural children.
    Text(ContentRange),
}

/// Errors raised by document edit operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// The given offset lies outside the editable part of the document.
    #[error("offset {offset} out of bounds (valid range is 1..={max})")]
    OffsetOutOfBounds {
        /// The offending offset.
        offset: usize,
        /// The largest valid offset.
        max: usize,
    },

    /// The insertion point cannot accept the inserted kind of content,
    /// e.g. an element inside a comment.
    #[error("cannot insert at offset {offset}")]
    InvalidInsertionPoint {
        /// The offending offset.
        offset: usize,
    },

    /// The range to delete contains exactly one of some node's two markers.
    #[error("deletion range [{start}, {end}) crosses a node boundary")]
    RangeCrossesNodeBoundary {
        /// Start of the offending range.
        start: usize,
        /// End of the offending range.
        end: usize,
    },

    /// The operation requires an element node.
    #[error("node is not an element")]
    NotAnElement,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Offset of the node's opening marker.
    start: usize,
    /// Offset of the node's closing marker.
    end: usize,
}

#[derive(Debug, Default)]
struct PositionTable {
    offsets: HashMap<PositionId, usize>,
    next_id: usize,
}

/// A structured document over a flattened content stream.
///
/// Offsets are stable within one layout pass; every edit shifts node ranges
/// and tracked positions so that they keep addressing the same content.
#[derive(Debug)]
pub struct Document {
    content: Vec<ContentUnit>,
    nodes: Vec<NodeData>,
    positions: RefCell<PositionTable>,
}

impl Document {
    /// Creates a document containing a single empty root element with the
    /// given name.
    #[must_use]
    pub fn new(root_name: &str) -> Self {
        let document = NodeData {
            kind: NodeKind::Document,
            parent: None,
            children: vec![NodeId(1)],
            start: 0,
            end: 1,
        };
        let root = NodeData {
            kind: NodeKind::Element {
                name: root_name.to_string(),
                attrs: AttributeMap::new(),
            },
            parent: Some(NodeId::ROOT),
            children: Vec::new(),
            start: 0,
            end: 1,
        };
        Document {
            content: vec![ContentUnit::Marker(NodeId(1)), ContentUnit::Marker(NodeId(1))],
            nodes: vec![document, root],
            positions: RefCell::new(PositionTable::default()),
        }
    }

    /// The root element of the document.
    #[must_use]
    pub fn root_element(&self) -> NodeId {
        self.nodes[NodeId::ROOT.0].children[0]
    }

    /// Total number of units in the content stream.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// True if the content stream is empty. A well-formed document always
    /// holds at least the root element's two markers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The kind of the given node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// The local name of the given node, if it is an element.
    #[must_use]
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Looks up an attribute value on an element node.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            _ => None,
        }
    }

    /// Sets an attribute on an element node.
    ///
    /// # Errors
    /// Returns [`DocumentError::NotAnElement`] if the node is not an element.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: &str,
    ) -> Result<(), DocumentError> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => {
                let _ = attrs.insert(name.to_string(), value.to_string());
                Ok(())
            }
            _ => Err(DocumentError::NotAnElement),
        }
    }

    /// The parent of the given node, or `None` for the document node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// The structural children of the given node, in document order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Iterates over all ancestors of a node, from parent to the document
    /// node.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            document: self,
            current: self.parent(id),
        }
    }

    /// The structural sibling immediately preceding the given node, ignoring
    /// any text runs between them.
    #[must_use]
    pub fn preceding_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&c| c == id)?;
        if index == 0 { None } else { Some(siblings[index - 1]) }
    }

    /// Offset of the node's opening marker. The document node starts at 0.
    #[must_use]
    pub fn start_offset(&self, id: NodeId) -> usize {
        self.nodes[id.0].start
    }

    /// Offset of the node's closing marker. The document node ends at the
    /// last unit of the stream.
    #[must_use]
    pub fn end_offset(&self, id: NodeId) -> usize {
        self.nodes[id.0].end
    }

    /// The deepest node whose content contains the given insertion offset.
    /// A unit inserted at `offset` lands inside the returned node.
    ///
    /// # Errors
    /// Returns [`DocumentError::OffsetOutOfBounds`] if the offset lies on or
    /// outside the root element's markers.
    pub fn node_at(&self, offset: usize) -> Result<NodeId, DocumentError> {
        let max = self.content.len() - 1;
        if offset < 1 || offset > max {
            return Err(DocumentError::OffsetOutOfBounds { offset, max });
        }
        let mut current = self.root_element();
        'descend: loop {
            for &child in self.children(current) {
                let child_data = &self.nodes[child.0];
                if child_data.start < offset && offset <= child_data.end {
                    current = child;
                    continue 'descend;
                }
            }
            return Ok(current);
        }
    }

    /// The deepest node whose range covers both offsets.
    #[must_use]
    pub fn find_common_node(&self, start: usize, end: usize) -> NodeId {
        let mut current = NodeId::ROOT;
        'descend: loop {
            for &child in self.children(current) {
                let child_data = &self.nodes[child.0];
                if child_data.start <= start && end <= child_data.end {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// The children of `parent` whose ranges intersect `[start, end)`,
    /// including synthesized text runs between structural children. Partially
    /// covered structural children are included whole; text runs are clipped
    /// to the range.
    #[must_use]
    pub fn content_children(&self, parent: NodeId, start: usize, end: usize) -> Vec<Child> {
        let mut result = Vec::new();
        let mut cursor = start;
        for &child in self.children(parent) {
            let child_data = &self.nodes[child.0];
            if child_data.end < start {
                continue;
            }
            if child_data.start >= end {
                break;
            }
            let gap_end = child_data.start.min(end);
            if cursor < gap_end && self.has_chars(cursor, gap_end) {
                result.push(Child::Text(ContentRange::new(cursor, gap_end)));
            }
            result.push(Child::Node(child));
            cursor = child_data.end + 1;
        }
        if cursor < end && self.has_chars(cursor, end) {
            result.push(Child::Text(ContentRange::new(cursor, end)));
        }
        result
    }

    /// The text content of the given range. Marker units are skipped.
    #[must_use]
    pub fn text_between(&self, range: ContentRange) -> String {
        self.content[range.start..range.end.min(self.content.len())]
            .iter()
            .filter_map(|unit| match unit {
                ContentUnit::Char(c) => Some(*c),
                ContentUnit::Marker(_) => None,
            })
            .collect()
    }

    /// The text content between the given node's markers, including the text
    /// of any descendants.
    #[must_use]
    pub fn text_of(&self, id: NodeId) -> String {
        let data = &self.nodes[id.0];
        self.text_between(ContentRange::new(data.start + 1, data.end))
    }

    /// Inserts text at the given offset.
    ///
    /// # Errors
    /// Returns [`DocumentError::OffsetOutOfBounds`] if the offset lies
    /// outside the root element.
    pub fn insert_text(&mut self, offset: usize, text: &str) -> Result<(), DocumentError> {
        let _ = self.node_at(offset)?;
        let units: Vec<ContentUnit> = text.chars().map(ContentUnit::Char).collect();
        self.shift_right(offset, units.len());
        let _ = self.content.splice(offset..offset, units);
        Ok(())
    }

    /// Inserts a new empty element at the given offset and returns its id.
    ///
    /// # Errors
    /// Returns [`DocumentError::OffsetOutOfBounds`] if the offset lies
    /// outside the root element, or [`DocumentError::InvalidInsertionPoint`]
    /// if the insertion point is inside a comment or processing instruction.
    pub fn insert_element(&mut self, offset: usize, name: &str) -> Result<NodeId, DocumentError> {
        let kind = NodeKind::Element {
            name: name.to_string(),
            attrs: AttributeMap::new(),
        };
        self.insert_node(offset, kind)
    }

    /// Inserts a new empty comment at the given offset and returns its id.
    ///
    /// # Errors
    /// Same conditions as [`Document::insert_element`].
    pub fn insert_comment(&mut self, offset: usize) -> Result<NodeId, DocumentError> {
        self.insert_node(offset, NodeKind::Comment)
    }

    /// Inserts a new processing instruction at the given offset and returns
    /// its id.
    ///
    /// # Errors
    /// Same conditions as [`Document::insert_element`].
    pub fn insert_processing_instruction(
        &mut self,
        offset: usize,
        target: &str,
    ) -> Result<NodeId, DocumentError> {
        self.insert_node(
            offset,
            NodeKind::ProcessingInstruction {
                target: target.to_string(),
            },
        )
    }

    /// Deletes the content units in `range`. Nodes whose markers both lie in
    /// the range are removed from the tree.
    ///
    /// # Errors
    /// Returns [`DocumentError::OffsetOutOfBounds`] if the range reaches the
    /// root element's markers, or [`DocumentError::RangeCrossesNodeBoundary`]
    /// if it contains exactly one marker of some node.
    pub fn delete(&mut self, range: ContentRange) -> Result<(), DocumentError> {
        let max = self.content.len() - 1;
        if range.start < 1 || range.end > max || range.start > range.end {
            return Err(DocumentError::OffsetOutOfBounds {
                offset: range.end,
                max,
            });
        }
        if range.is_empty() {
            return Ok(());
        }
        // A node may only be affected symmetrically: both markers inside the
        // range (the node goes away) or both outside.
        for data in &self.nodes {
            if range.contains(data.start) != range.contains(data.end) {
                return Err(DocumentError::RangeCrossesNodeBoundary {
                    start: range.start,
                    end: range.end,
                });
            }
        }

        let removed: Vec<NodeId> = (0..self.nodes.len())
            .map(NodeId)
            .filter(|id| {
                let data = &self.nodes[id.0];
                range.contains(data.start) && range.contains(data.end)
            })
            .collect();
        for &id in &removed {
            if let Some(parent) = self.nodes[id.0].parent {
                self.nodes[parent.0].children.retain(|&c| c != id);
                self.nodes[id.0].parent = None;
            }
        }

        let _ = self.content.drain(range.start..range.end);
        self.shift_left(range);
        Ok(())
    }

    /// Registers a tracked position at the given offset.
    #[must_use]
    pub fn create_position(&self, offset: usize) -> PositionId {
        let mut table = self.positions.borrow_mut();
        let id = PositionId(table.next_id);
        table.next_id += 1;
        let _ = table.offsets.insert(id, offset);
        id
    }

    /// The current offset of a tracked position.
    ///
    /// # Panics
    /// Panics if the position has been removed.
    #[must_use]
    pub fn position_offset(&self, id: PositionId) -> usize {
        self.positions.borrow().offsets[&id]
    }

    /// Unregisters a tracked position.
    pub fn remove_position(&self, id: PositionId) {
        let _ = self.positions.borrow_mut().offsets.remove(&id);
    }

    // ==================================================== PRIVATE

    fn insert_node(&mut self, offset: usize, kind: NodeKind) -> Result<NodeId, DocumentError> {
        let parent = self.node_at(offset)?;
        match (&self.nodes[parent.0].kind, &kind) {
            // Only elements can contain structural children.
            (NodeKind::Element { .. }, _) => {}
            _ => return Err(DocumentError::InvalidInsertionPoint { offset }),
        }

        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| self.nodes[c.0].start >= offset)
            .unwrap_or(self.nodes[parent.0].children.len());

        self.shift_right(offset, 2);

        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            start: offset,
            end: offset + 1,
        });
        let _ = self
            .content
            .splice(offset..offset, [ContentUnit::Marker(id), ContentUnit::Marker(id)]);
        self.nodes[parent.0].children.insert(index, id);
        Ok(id)
    }

    fn has_chars(&self, start: usize, end: usize) -> bool {
        self.content[start..end]
            .iter()
            .any(|unit| matches!(unit, ContentUnit::Char(_)))
    }

    /// Shifts node ranges and tracked positions right after an insertion of
    /// `count` units at `offset`.
    fn shift_right(&mut self, offset: usize, count: usize) {
        for data in &mut self.nodes {
            if data.start >= offset {
                data.start += count;
            }
            if data.end >= offset {
                data.end += count;
            }
        }
        for tracked in self.positions.borrow_mut().offsets.values_mut() {
            if *tracked >= offset {
                *tracked += count;
            }
        }
    }

    /// Shifts node ranges and tracked positions left after a deletion.
    /// Positions inside the deleted range collapse onto its start.
    fn shift_left(&mut self, range: ContentRange) {
        let count = range.len();
        for data in &mut self.nodes {
            if data.start >= range.end {
                data.start -= count;
            }
            if data.end >= range.end {
                data.end -= count;
            }
        }
        for tracked in self.positions.borrow_mut().offsets.values_mut() {
            if *tracked >= range.end {
                *tracked -= count;
            } else if *tracked > range.start {
                *tracked = range.start;
            }
        }
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    document: &'a Document,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.document.parent(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_brackets_root() {
        let doc = Document::new("article");
        let root = doc.root_element();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.start_offset(root), 0);
        assert_eq!(doc.end_offset(root), 1);
        assert_eq!(doc.local_name(root), Some("article"));
        assert_eq!(doc.parent(root), Some(NodeId::ROOT));
    }

    #[test]
    fn insert_text_shifts_markers() {
        let mut doc = Document::new("article");
        doc.insert_text(1, "hello").unwrap();
        let root = doc.root_element();
        assert_eq!(doc.start_offset(root), 0);
        assert_eq!(doc.end_offset(root), 6);
        assert_eq!(doc.text_of(root), "hello");
    }

    #[test]
    fn insert_element_nests_under_containing_node() {
        let mut doc = Document::new("article");
        let para = doc.insert_element(1, "para").unwrap();
        doc.insert_text(2, "abc").unwrap();
        let root = doc.root_element();
        assert_eq!(doc.children(root), &[para]);
        assert_eq!(doc.start_offset(para), 1);
        assert_eq!(doc.end_offset(para), 5);
        assert_eq!(doc.text_of(para), "abc");
        assert_eq!(doc.end_offset(root), 6);
    }

    #[test]
    fn insert_before_start_marker_stays_outside() {
        let mut doc = Document::new("article");
        let para = doc.insert_element(1, "para").unwrap();
        // Offset 1 is the para's start marker; text inserted there belongs
        // to the root, not to para.
        doc.insert_text(1, "xy").unwrap();
        assert_eq!(doc.start_offset(para), 3);
        assert_eq!(doc.text_of(para), "");
        assert_eq!(doc.text_of(doc.root_element()), "xy");
    }

    #[test]
    fn node_at_picks_deepest_node() {
        let mut doc = Document::new("article");
        let para = doc.insert_element(1, "para").unwrap();
        doc.insert_text(2, "abc").unwrap();
        assert_eq!(doc.node_at(3).unwrap(), para);
        assert_eq!(doc.node_at(1).unwrap(), doc.root_element());
        // The para's end marker is at 5; inserting there lands inside para.
        assert_eq!(doc.node_at(5).unwrap(), para);
        assert_eq!(doc.node_at(6).unwrap(), doc.root_element());
        assert!(matches!(
            doc.node_at(7),
            Err(DocumentError::OffsetOutOfBounds { .. })
        ));
    }

    #[test]
    fn find_common_node_covers_both_offsets() {
        let mut doc = Document::new("article");
        let para = doc.insert_element(1, "para").unwrap();
        doc.insert_text(2, "abc").unwrap();
        assert_eq!(doc.find_common_node(2, 5), para);
        assert_eq!(doc.find_common_node(1, 6), doc.root_element());
    }

    #[test]
    fn content_children_synthesizes_text_runs() {
        let mut doc = Document::new("article");
        doc.insert_text(1, "ab").unwrap();
        let para = doc.insert_element(3, "para").unwrap();
        doc.insert_text(5, "cd").unwrap();
        let root = doc.root_element();
        let children = doc.content_children(root, 1, doc.end_offset(root));
        assert_eq!(
            children,
            vec![
                Child::Text(ContentRange::new(1, 3)),
                Child::Node(para),
                Child::Text(ContentRange::new(5, 7)),
            ]
        );
    }

    #[test]
    fn cannot_insert_element_into_comment() {
        let mut doc = Document::new("article");
        let comment = doc.insert_comment(1).unwrap();
        doc.insert_text(2, "note").unwrap();
        assert_eq!(doc.text_of(comment), "note");
        assert!(matches!(
            doc.insert_element(3, "para"),
            Err(DocumentError::InvalidInsertionPoint { .. })
        ));
    }

    #[test]
    fn delete_rejects_partial_node() {
        let mut doc = Document::new("article");
        let _ = doc.insert_element(1, "para").unwrap();
        doc.insert_text(2, "abc").unwrap();
        // [1, 3) contains para's start marker but not its end marker.
        assert_eq!(
            doc.delete(ContentRange::new(1, 3)),
            Err(DocumentError::RangeCrossesNodeBoundary { start: 1, end: 3 })
        );
    }

    #[test]
    fn delete_removes_covered_nodes() {
        let mut doc = Document::new("article");
        let para = doc.insert_element(1, "para").unwrap();
        doc.insert_text(2, "abc").unwrap();
        doc.delete(ContentRange::new(1, 6)).unwrap();
        let root = doc.root_element();
        assert!(doc.children(root).is_empty());
        assert_eq!(doc.parent(para), None);
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn delete_text_shifts_following_content() {
        let mut doc = Document::new("article");
        doc.insert_text(1, "abcdef").unwrap();
        let para = doc.insert_element(7, "para").unwrap();
        doc.delete(ContentRange::new(2, 5)).unwrap();
        assert_eq!(doc.text_of(doc.root_element()), "aef");
        assert_eq!(doc.start_offset(para), 4);
    }

    #[test]
    fn positions_track_edits() {
        let mut doc = Document::new("article");
        doc.insert_text(1, "abcdef").unwrap();
        let before = doc.create_position(2);
        let inside = doc.create_position(4);
        let after = doc.create_position(6);
        doc.delete(ContentRange::new(3, 5)).unwrap();
        assert_eq!(doc.position_offset(before), 2);
        assert_eq!(doc.position_offset(inside), 3);
        assert_eq!(doc.position_offset(after), 4);
        doc.insert_text(2, "xx").unwrap();
        assert_eq!(doc.position_offset(before), 4);
    }

    #[test]
    fn preceding_sibling_skips_text() {
        let mut doc = Document::new("article");
        let first = doc.insert_element(1, "para").unwrap();
        doc.insert_text(3, "gap").unwrap();
        let second = doc.insert_element(6, "para").unwrap();
        assert_eq!(doc.preceding_sibling(second), Some(first));
        assert_eq!(doc.preceding_sibling(first), None);
    }
}
