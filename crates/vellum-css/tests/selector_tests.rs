//! Selector matching against real documents.

use vellum_css::{Condition, MatchTarget, Selector, StyleSheet};
use vellum_dom::{Document, NodeId};

fn named(name: &str) -> Selector {
    Selector::Element {
        name: Some(name.to_string()),
    }
}

fn wildcard() -> Selector {
    Selector::Element { name: None }
}

fn with_class(simple: Selector, class: &str) -> Selector {
    Selector::Conditional {
        simple: Box::new(simple),
        condition: Condition::OneOfAttribute {
            name: None,
            value: class.to_string(),
        },
    }
}

fn with_pseudo_class(simple: Selector, name: &str) -> Selector {
    Selector::Conditional {
        simple: Box::new(simple),
        condition: Condition::PseudoClass {
            value: name.to_string(),
        },
    }
}

/// Builds
/// ```text
/// <article>
///   <title>Hi</title>
///   <section><para class="note intro"/><para id="main"/></section>
///   <!-- -->
/// </article>
/// ```
/// and returns (doc, title, section, first para, second para, comment).
fn fixture() -> (Document, NodeId, NodeId, NodeId, NodeId, NodeId) {
    let mut doc = Document::new("article");
    let title = doc.insert_element(1, "title").unwrap();
    doc.insert_text(2, "Hi").unwrap();
    let section = doc.insert_element(5, "section").unwrap();
    let para1 = doc.insert_element(6, "para").unwrap();
    let para2 = doc.insert_element(8, "para").unwrap();
    let comment = doc.insert_comment(11).unwrap();
    doc.set_attribute(para1, "class", "note intro").unwrap();
    doc.set_attribute(para2, "id", "main").unwrap();
    (doc, title, section, para1, para2, comment)
}

fn node_matches(selector: &Selector, doc: &Document, node: NodeId) -> bool {
    vellum_css::selector::matches(selector, doc, MatchTarget::Node(node))
}

#[test]
fn root_selector_matches_only_the_root_element() {
    let (doc, _, section, para1, _, _) = fixture();
    assert!(node_matches(&Selector::Root, &doc, doc.root_element()));
    assert!(!node_matches(&Selector::Root, &doc, section));
    assert!(!node_matches(&Selector::Root, &doc, para1));
}

#[test]
fn named_elements_match_by_local_name() {
    let (doc, title, section, para1, _, comment) = fixture();
    let para = named("para");
    assert!(node_matches(&para, &doc, para1));
    assert!(!node_matches(&para, &doc, section));
    assert!(!node_matches(&para, &doc, title));
    // Comments carry no local name.
    assert!(!node_matches(&para, &doc, comment));
}

#[test]
fn the_wildcard_matches_every_node_kind() {
    let (doc, _, section, _, _, comment) = fixture();
    assert!(node_matches(&wildcard(), &doc, section));
    assert!(node_matches(&wildcard(), &doc, comment));
    assert!(node_matches(&Selector::AnyNode, &doc, comment));
}

#[test]
fn descendant_matching_walks_all_ancestors() {
    let (doc, _, _, para1, _, _) = fixture();
    let deep = Selector::Descendant {
        ancestor: Box::new(named("article")),
        simple: Box::new(named("para")),
    };
    assert!(node_matches(&deep, &doc, para1));

    let wrong = Selector::Descendant {
        ancestor: Box::new(named("title")),
        simple: Box::new(named("para")),
    };
    assert!(!node_matches(&wrong, &doc, para1));
}

#[test]
fn child_matching_checks_only_the_immediate_parent() {
    let (doc, _, _, para1, _, _) = fixture();
    let direct = Selector::Child {
        parent: Box::new(named("section")),
        simple: Box::new(named("para")),
    };
    assert!(node_matches(&direct, &doc, para1));

    let skipping = Selector::Child {
        parent: Box::new(named("article")),
        simple: Box::new(named("para")),
    };
    assert!(!node_matches(&skipping, &doc, para1));
}

#[test]
fn adjacent_sibling_matching_between_elements() {
    let (doc, _, _, para1, para2, _) = fixture();
    let adjacent = Selector::DirectAdjacent {
        previous: Box::new(named("para")),
        simple: Box::new(named("para")),
    };
    assert!(node_matches(&adjacent, &doc, para2));
    // The first para has no preceding sibling.
    assert!(!node_matches(&adjacent, &doc, para1));
}

#[test]
fn a_text_run_counts_as_a_nameless_preceding_sibling() {
    let mut doc = Document::new("article");
    let _first = doc.insert_element(1, "item").unwrap();
    doc.insert_text(3, " ").unwrap();
    let second = doc.insert_element(4, "item").unwrap();

    let after_anything = Selector::DirectAdjacent {
        previous: Box::new(wildcard()),
        simple: Box::new(named("item")),
    };
    assert!(node_matches(&after_anything, &doc, second));

    let after_item = Selector::DirectAdjacent {
        previous: Box::new(named("item")),
        simple: Box::new(named("item")),
    };
    assert!(!node_matches(&after_item, &doc, second));
}

#[test]
fn class_conditions_match_any_token_of_the_class_attribute() {
    let (doc, _, _, para1, para2, _) = fixture();
    assert!(node_matches(&with_class(named("para"), "note"), &doc, para1));
    assert!(node_matches(&with_class(wildcard(), "intro"), &doc, para1));
    assert!(!node_matches(&with_class(named("para"), "other"), &doc, para1));
    assert!(!node_matches(&with_class(named("para"), "note"), &doc, para2));
}

#[test]
fn attribute_conditions_check_presence_or_exact_value() {
    let (doc, _, _, _, para2, _) = fixture();
    let present = Selector::Conditional {
        simple: Box::new(wildcard()),
        condition: Condition::Attribute {
            name: "id".to_string(),
            value: None,
            is_id: false,
        },
    };
    assert!(node_matches(&present, &doc, para2));

    let exact = Selector::Conditional {
        simple: Box::new(wildcard()),
        condition: Condition::Attribute {
            name: "id".to_string(),
            value: Some("other".to_string()),
            is_id: false,
        },
    };
    assert!(!node_matches(&exact, &doc, para2));
}

#[test]
fn comments_match_pseudo_class_rules_named_comment() {
    let (doc, _, _, _, _, comment) = fixture();
    let styled = with_pseudo_class(named("article"), vellum_css::COMMENT_NAME);
    assert!(node_matches(&styled, &doc, comment));

    // The host selector is checked against the comment's parent.
    let elsewhere = with_pseudo_class(named("section"), vellum_css::COMMENT_NAME);
    assert!(!node_matches(&elsewhere, &doc, comment));

    // Ordinary pseudo-class names do not style comments.
    let before = with_pseudo_class(named("article"), "before");
    assert!(!node_matches(&before, &doc, comment));
}

#[test]
fn pseudo_element_targets_match_through_their_parent() {
    let (doc, _, _, para1, _, _) = fixture();
    let target = MatchTarget::Pseudo {
        parent: para1,
        name: "before",
    };

    let before = with_pseudo_class(named("para"), "before");
    assert!(vellum_css::selector::matches(&before, &doc, target));

    let after = with_pseudo_class(named("para"), "after");
    assert!(!vellum_css::selector::matches(&after, &doc, target));

    // Combinators see the pseudo-element as a child of its parent.
    let nested = Selector::Child {
        parent: Box::new(named("section")),
        simple: Box::new(with_pseudo_class(wildcard(), "before")),
    };
    assert!(!vellum_css::selector::matches(&nested, &doc, target));
    let hosted = Selector::Descendant {
        ancestor: Box::new(named("section")),
        simple: Box::new(with_pseudo_class(named("para"), "before")),
    };
    assert!(vellum_css::selector::matches(&hosted, &doc, target));
}

#[test]
fn unsupported_selector_kinds_never_match() {
    let (doc, _, _, para1, _, comment) = fixture();
    assert!(!node_matches(&Selector::TextNode, &doc, para1));
    assert!(!node_matches(&Selector::CommentNode, &doc, comment));
    let negation = Selector::Negative {
        simple: Box::new(named("title")),
    };
    assert!(!node_matches(&negation, &doc, para1));
}

#[test]
fn standalone_pseudo_class_conditions_never_match_real_nodes() {
    let (doc, _, _, para1, _, _) = fixture();
    assert!(!node_matches(&with_pseudo_class(named("para"), "before"), &doc, para1));
}

#[test]
fn sheets_expose_their_rules_in_source_order() {
    let sheet = StyleSheet::new(vec![
        vellum_css::Rule::new(named("para"), vec![]),
        vellum_css::Rule::new(wildcard(), vec![]),
    ]);
    assert_eq!(sheet.rules().len(), 2);
    assert_eq!(sheet.rules()[0].selector, named("para"));
}
