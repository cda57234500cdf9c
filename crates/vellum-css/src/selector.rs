//! Selector model, matching and specificity.
//!
//! Selectors form a closed tagged union so that every combinator and
//! condition is handled in one exhaustive match. Several selector kinds that
//! the grammar admits but this engine does not support (negation and the
//! node-type selectors) deliberately never match; they are reported once
//! through the warning system instead of failing the cascade.

use std::fmt;

use vellum_common::warning::warn_once;
use vellum_dom::{Child, Document, NodeId, NodeKind};

/// The synthetic element name under which comment nodes participate in
/// pseudo-class matching, e.g. `para:COMMENT`.
pub const COMMENT_NAME: &str = "COMMENT";

/// Cascade priority of a rule. Higher wins; ties are broken by source order.
///
/// The weighting approximates CSS id/class/element counting in a single
/// integer: an id condition scores 1\_000\_000, any other condition 1\_000 and
/// a named element 1. Distinct selectors may tie, so this ordering is not
/// consistent with equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity(pub i32);

/// What a selector is being matched against: a real document node, or a
/// synthetic pseudo-element attached to a parent node.
#[derive(Debug, Clone, Copy)]
pub enum MatchTarget<'a> {
    /// A structural document node.
    Node(NodeId),
    /// A pseudo-element such as `:before`, carried by its parent node.
    Pseudo {
        /// The node the pseudo-element is attached to.
        parent: NodeId,
        /// The pseudo-element's name.
        name: &'a str,
    },
}

/// A selector over document nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// A named element, or any node when the name is `None` (the wildcard
    /// `*` parses to an element selector without a local name).
    Element {
        /// The element's local name; `None` matches any node.
        name: Option<String>,
    },
    /// Matches any node.
    AnyNode,
    /// Matches the document's root element.
    Root,
    /// `ancestor simple` - the simple selector with some strict ancestor
    /// matching the ancestor selector.
    Descendant {
        /// Selector any ancestor must match.
        ancestor: Box<Selector>,
        /// Selector the node itself must match.
        simple: Box<Selector>,
    },
    /// `parent > simple`
    Child {
        /// Selector the immediate parent must match.
        parent: Box<Selector>,
        /// Selector the node itself must match.
        simple: Box<Selector>,
    },
    /// `previous + simple`
    DirectAdjacent {
        /// Selector the immediately preceding sibling must match.
        previous: Box<Selector>,
        /// Selector the node itself must match.
        simple: Box<Selector>,
    },
    /// `simple[condition]`, `simple.class`, `simple#id`, `simple:name`
    Conditional {
        /// The simple selector part.
        simple: Box<Selector>,
        /// The attached condition.
        condition: Condition,
    },
    /// `:not(simple)` - unsupported, never matches.
    Negative {
        /// The negated simple selector.
        simple: Box<Selector>,
    },
    /// A pseudo-element selector; matches an element of the same name.
    PseudoElement {
        /// The pseudo-element's name.
        name: String,
    },
    /// A text-node selector - unsupported, never matches.
    TextNode,
    /// A CDATA-section selector - unsupported, never matches.
    CdataNode,
    /// A comment-node selector - unsupported, never matches.
    CommentNode,
    /// A processing-instruction selector - unsupported, never matches.
    ProcessingInstructionNode,
}

/// A condition attached to a [`Selector::Conditional`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `[name]`, `[name=value]` or `#id`.
    Attribute {
        /// The attribute's local name.
        name: String,
        /// Expected value; `None` means a presence check.
        value: Option<String>,
        /// True for an id condition (`#id`), which dominates specificity.
        is_id: bool,
    },
    /// `[name~=value]` or `.class` (implicit attribute name "class").
    OneOfAttribute {
        /// The attribute's local name; `None` means the class attribute.
        name: Option<String>,
        /// The token that must appear in the whitespace-separated value.
        value: String,
    },
    /// Conjunction of two conditions.
    And(Box<Condition>, Box<Condition>),
    /// A pseudo-class condition. Standalone it never matches; combined with
    /// a simple selector it matches pseudo-elements and comments of the
    /// given name (see [`matches`]).
    PseudoClass {
        /// The pseudo-class name.
        value: String,
    },
}

/// Returns true if the target matches the given selector.
///
/// Matching above the document root returns false: probing rules like
/// `foo > *` against the root element asks for the root's parent's parent,
/// which does not exist. A pseudo-element target behaves like a virtual
/// element named after the pseudo-element, attached below its parent node,
/// with no attributes and no siblings.
#[must_use]
pub fn matches(selector: &Selector, doc: &Document, target: MatchTarget<'_>) -> bool {
    match selector {
        Selector::Conditional { simple, condition } => {
            // Mismatch between the CSS model and the selector grammar: CSS
            // treats pseudo-elements as elements attached to their parents,
            // the grammar delivers them as conditions. Comments take part
            // under the synthetic COMMENT name.
            if let Condition::PseudoClass { value } = condition {
                return match target {
                    MatchTarget::Pseudo { parent, name } => {
                        value == name && matches(simple, doc, MatchTarget::Node(parent))
                    }
                    MatchTarget::Node(node) if matches!(doc.kind(node), NodeKind::Comment) => {
                        value == COMMENT_NAME && parent_matches(simple, doc, target)
                    }
                    MatchTarget::Node(_) => false,
                };
            }
            let condition_holds = match target {
                MatchTarget::Node(node) => matches_condition(condition, doc, node),
                // Pseudo-elements carry no attributes.
                MatchTarget::Pseudo { .. } => false,
            };
            condition_holds && matches(simple, doc, target)
        }

        Selector::AnyNode => true,

        Selector::Root => match target {
            MatchTarget::Node(node) => doc.parent(node) == Some(NodeId::ROOT),
            MatchTarget::Pseudo { .. } => false,
        },

        Selector::Element { name } => match name {
            // A wildcard, or a condition without an element name, e.g.
            // `[attr=value]` or `:before`.
            None => true,
            Some(name) => local_name_of(doc, target) == Some(name.as_str()),
        },

        Selector::PseudoElement { name } => local_name_of(doc, target) == Some(name.as_str()),

        Selector::Descendant { ancestor, simple } => {
            matches(simple, doc, target) && ancestor_matches(ancestor, doc, target)
        }

        Selector::Child { parent, simple } => {
            matches(simple, doc, target) && parent_matches(parent, doc, target)
        }

        Selector::DirectAdjacent { previous, simple } => {
            matches(simple, doc, target)
                && match target {
                    MatchTarget::Node(node) => sibling_matches(previous, doc, node),
                    MatchTarget::Pseudo { .. } => false,
                }
        }

        Selector::Negative { .. }
        | Selector::TextNode
        | Selector::CdataNode
        | Selector::CommentNode
        | Selector::ProcessingInstructionNode => {
            warn_once("CSS", &format!("unsupported selector '{selector}'"));
            false
        }
    }
}

/// Returns true if the node satisfies the given condition.
#[must_use]
pub fn matches_condition(condition: &Condition, doc: &Document, node: NodeId) -> bool {
    match condition {
        Condition::Attribute { name, value, .. } => {
            let actual = doc.attribute(node, name);
            match value {
                Some(expected) => actual == Some(expected.as_str()),
                None => actual.is_some(),
            }
        }

        Condition::OneOfAttribute { name, value } => {
            let attribute_name = name.as_deref().unwrap_or("class");
            match doc.attribute(node, attribute_name) {
                Some(actual) => actual.split_whitespace().any(|token| token == value),
                None => false,
            }
        }

        Condition::And(first, second) => {
            matches_condition(first, doc, node) && matches_condition(second, doc, node)
        }

        // Standalone pseudo-class conditions never match; they only take
        // effect through the pseudo-element integration in `matches`.
        Condition::PseudoClass { .. } => false,
    }
}

/// Computes the cascade specificity of a selector.
#[must_use]
pub fn specificity(selector: &Selector) -> Specificity {
    Specificity(selector_weight(selector))
}

fn selector_weight(selector: &Selector) -> i32 {
    match selector {
        Selector::Element { name } => i32::from(name.is_some()),
        Selector::PseudoElement { .. } => 1,
        Selector::Descendant { ancestor, simple } => {
            selector_weight(ancestor) + selector_weight(simple)
        }
        Selector::Child { parent, simple } => selector_weight(parent) + selector_weight(simple),
        Selector::DirectAdjacent { previous, simple } => {
            selector_weight(previous) + selector_weight(simple)
        }
        Selector::Negative { simple } => selector_weight(simple),
        Selector::Conditional { simple, condition } => {
            condition_weight(condition) + selector_weight(simple)
        }
        Selector::AnyNode
        | Selector::Root
        | Selector::TextNode
        | Selector::CdataNode
        | Selector::CommentNode
        | Selector::ProcessingInstructionNode => 0,
    }
}

fn condition_weight(condition: &Condition) -> i32 {
    match condition {
        Condition::And(first, second) => condition_weight(first) + condition_weight(second),
        Condition::Attribute { is_id: true, .. } => 1_000_000,
        Condition::Attribute { is_id: false, .. }
        | Condition::OneOfAttribute { .. }
        | Condition::PseudoClass { .. } => 1_000,
    }
}

fn local_name_of<'a>(doc: &'a Document, target: MatchTarget<'a>) -> Option<&'a str> {
    match target {
        MatchTarget::Node(node) => doc.local_name(node),
        MatchTarget::Pseudo { name, .. } => Some(name),
    }
}

fn parent_of(doc: &Document, target: MatchTarget<'_>) -> Option<NodeId> {
    match target {
        MatchTarget::Node(node) => doc.parent(node),
        MatchTarget::Pseudo { parent, .. } => Some(parent),
    }
}

fn parent_matches(selector: &Selector, doc: &Document, target: MatchTarget<'_>) -> bool {
    match parent_of(doc, target) {
        Some(parent) => matches(selector, doc, MatchTarget::Node(parent)),
        None => false,
    }
}

fn ancestor_matches(selector: &Selector, doc: &Document, target: MatchTarget<'_>) -> bool {
    let mut current = parent_of(doc, target);
    while let Some(node) = current {
        if matches(selector, doc, MatchTarget::Node(node)) {
            return true;
        }
        current = doc.parent(node);
    }
    false
}

/// Checks the sibling immediately preceding `node`, text runs included: a run
/// of text between two elements counts as the preceding sibling and only
/// nameless selectors can match it.
fn sibling_matches(selector: &Selector, doc: &Document, node: NodeId) -> bool {
    let Some(parent) = doc.parent(node) else {
        return false;
    };
    let siblings = doc.content_children(
        parent,
        doc.start_offset(parent) + 1,
        doc.end_offset(parent),
    );
    let Some(index) = siblings
        .iter()
        .position(|child| matches!(child, Child::Node(id) if *id == node))
    else {
        return false;
    };
    if index == 0 {
        return false;
    }
    match siblings[index - 1] {
        Child::Node(previous) => matches(selector, doc, MatchTarget::Node(previous)),
        Child::Text(_) => {
            matches!(selector, Selector::Element { name: None } | Selector::AnyNode)
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Element { name: Some(name) } => write!(f, "{name}"),
            Selector::Element { name: None } | Selector::AnyNode => write!(f, "*"),
            Selector::Root => write!(f, ":root"),
            Selector::Descendant { ancestor, simple } => write!(f, "{ancestor} {simple}"),
            Selector::Child { parent, simple } => write!(f, "{parent} > {simple}"),
            Selector::DirectAdjacent { previous, simple } => write!(f, "{previous} + {simple}"),
            Selector::Conditional { simple, condition } => write!(f, "{simple}{condition}"),
            Selector::Negative { simple } => write!(f, ":not({simple})"),
            Selector::PseudoElement { name } => write!(f, "::{name}"),
            Selector::TextNode => write!(f, ":text"),
            Selector::CdataNode => write!(f, ":cdata"),
            Selector::CommentNode => write!(f, ":comment"),
            Selector::ProcessingInstructionNode => write!(f, ":processing-instruction"),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Attribute {
                is_id: true,
                value: Some(value),
                ..
            } => write!(f, "#{value}"),
            Condition::Attribute {
                name,
                value: Some(value),
                ..
            } => write!(f, "[{name}={value}]"),
            Condition::Attribute { name, value: None, .. } => write!(f, "[{name}]"),
            Condition::OneOfAttribute { name: None, value } => write!(f, ".{value}"),
            Condition::OneOfAttribute {
                name: Some(name),
                value,
            } => write!(f, "[{name}~={value}]"),
            Condition::And(first, second) => write!(f, "{first}{second}"),
            Condition::PseudoClass { value } => write!(f, ":{value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Selector {
        Selector::Element {
            name: Some(name.to_string()),
        }
    }

    fn wildcard() -> Selector {
        Selector::Element { name: None }
    }

    #[test]
    fn specificity_weights() {
        assert_eq!(specificity(&wildcard()), Specificity(0));
        assert_eq!(specificity(&named("para")), Specificity(1));

        let class = Selector::Conditional {
            simple: Box::new(named("para")),
            condition: Condition::OneOfAttribute {
                name: None,
                value: "note".to_string(),
            },
        };
        assert_eq!(specificity(&class), Specificity(1_001));

        let id = Selector::Conditional {
            simple: Box::new(wildcard()),
            condition: Condition::Attribute {
                name: "id".to_string(),
                value: Some("main".to_string()),
                is_id: true,
            },
        };
        assert_eq!(specificity(&id), Specificity(1_000_000));
    }

    #[test]
    fn id_dominates_any_class_and_element_count() {
        // A long chain of classes and elements must never outrank one id.
        let mut chain = Selector::Conditional {
            simple: Box::new(named("para")),
            condition: Condition::OneOfAttribute {
                name: None,
                value: "a".to_string(),
            },
        };
        for _ in 0..500 {
            chain = Selector::Descendant {
                ancestor: Box::new(chain),
                simple: Box::new(Selector::Conditional {
                    simple: Box::new(named("para")),
                    condition: Condition::OneOfAttribute {
                        name: None,
                        value: "b".to_string(),
                    },
                }),
            };
        }
        let id = Selector::Conditional {
            simple: Box::new(wildcard()),
            condition: Condition::Attribute {
                name: "id".to_string(),
                value: Some("x".to_string()),
                is_id: true,
            },
        };
        assert!(specificity(&id) > specificity(&chain));
    }

    #[test]
    fn combinators_sum_both_sides() {
        let child = Selector::Child {
            parent: Box::new(named("section")),
            simple: Box::new(named("para")),
        };
        assert_eq!(specificity(&child), Specificity(2));

        let sibling = Selector::DirectAdjacent {
            previous: Box::new(named("title")),
            simple: Box::new(wildcard()),
        };
        assert_eq!(specificity(&sibling), Specificity(1));
    }

    #[test]
    fn negative_forwards_inner_specificity() {
        let negative = Selector::Negative {
            simple: Box::new(named("para")),
        };
        assert_eq!(specificity(&negative), Specificity(1));
    }
}
