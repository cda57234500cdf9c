//! Incremental box layout over Vellum documents.
//!
//! The crate builds a box tree from a document and a resolved style sheet,
//! lays it out band by band, and answers geometric queries against it:
//!
//! - [`builder`] turns content ranges into block boxes, anonymous paragraphs
//!   and anonymous tables,
//! - [`engine`] runs the demand-driven layout state machine with vertical
//!   margin collapsing and edit invalidation,
//! - [`text`] breaks text at whitespace boundaries for line filling,
//! - [`nav`] maps between content offsets and coordinates for carets, mouse
//!   hits and line-wise cursor movement.
//!
//! Everything is single threaded; callers serialize document edits and
//! layout passes.

pub mod builder;
pub mod context;
pub mod engine;
pub mod geometry;
pub mod metrics;
pub mod nav;
pub mod text;
pub mod tree;

pub use context::{BoxFactory, CssBoxFactory, LayoutContext};
pub use engine::LayoutEngine;
pub use geometry::{Caret, Insets, VerticalRange};
pub use metrics::{ApproximateFontMetrics, FixedFontMetrics, FontMetrics};
pub use text::split_text;
pub use tree::{BoxData, BoxId, BoxKind, BoxTree, LayoutState};
