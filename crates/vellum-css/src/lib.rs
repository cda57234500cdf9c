//! CSS selector matching and cascade resolution for the Vellum layout engine.
//!
//! This crate provides the style side of layout: a closed selector model with
//! CSS-like specificity ([`selector`]), resolved style records ([`styles`]),
//! and an ordered rule set that cascades matching declarations into a single
//! [`Styles`] record per node ([`sheet`]).
//!
//! Style sheet source parsing is out of scope; rules are built
//! programmatically by the embedding application.

pub mod selector;
pub mod sheet;
pub mod styles;

pub use selector::{Condition, MatchTarget, Selector, Specificity, COMMENT_NAME};
pub use sheet::{Declaration, Rule, StyleSheet};
pub use styles::{Display, Length, Property, Styles, Value};
