//! Ordered rule sets and the cascade.
//!
//! A [`StyleSheet`] holds rules in source order and resolves, for any node,
//! the declarations that win the cascade into one [`Styles`] record. Matching
//! rules are sorted by ascending specificity with a stable sort, then applied
//! in order, so later and more specific declarations override earlier ones.
//! Resolved records are cached per node and shared behind `Rc`; the cache
//! must be flushed whenever the document or the sheet changes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use vellum_dom::{Document, NodeId};

use crate::selector::{self, MatchTarget, Selector, Specificity};
use crate::styles::{Display, Length, Property, Styles, Value};

/// A single property declaration inside a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// The declared property.
    pub property: Property,
    /// The declared value.
    pub value: Value,
}

/// A pairing of one selector with an ordered list of declarations.
///
/// A source rule with several comma-separated selectors becomes several
/// `Rule` values, one per selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// The rule's selector.
    pub selector: Selector,
    /// The rule's declarations, in source order.
    pub declarations: Vec<Declaration>,
}

impl Rule {
    /// Creates a rule from a selector and its declarations.
    #[must_use]
    pub fn new(selector: Selector, declarations: Vec<Declaration>) -> Self {
        Rule {
            selector,
            declarations,
        }
    }

    /// The cascade specificity of this rule's selector.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        selector::specificity(&self.selector)
    }
}

/// An ordered set of rules with a per-node cache of resolved styles.
#[derive(Debug, Default)]
pub struct StyleSheet {
    rules: Vec<Rule>,
    cache: RefCell<HashMap<NodeId, Rc<Styles>>>,
}

impl StyleSheet {
    /// Creates a style sheet from rules in source order.
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        StyleSheet {
            rules,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// The rules of this sheet, in source order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Resolves the styles for a document node, caching the result.
    ///
    /// Inherited properties (font size, line height) come from the nearest
    /// ancestor's resolved record; everything else starts at its initial
    /// value and is overridden by the winning declarations.
    #[must_use]
    pub fn styles(&self, doc: &Document, node: NodeId) -> Rc<Styles> {
        if let Some(hit) = self.cache.borrow().get(&node) {
            return Rc::clone(hit);
        }
        let parent_styles = match doc.parent(node) {
            Some(parent) => self.styles(doc, parent),
            None => Rc::new(Styles::initial()),
        };
        let resolved = Rc::new(self.compute(doc, MatchTarget::Node(node), &parent_styles));
        let _ = self
            .cache
            .borrow_mut()
            .insert(node, Rc::clone(&resolved));
        resolved
    }

    /// Resolves the styles for a pseudo-element of the given parent node.
    /// Pseudo-element records are not cached.
    #[must_use]
    pub fn pseudo_styles(&self, doc: &Document, parent: NodeId, name: &str) -> Rc<Styles> {
        let parent_styles = self.styles(doc, parent);
        Rc::new(self.compute(doc, MatchTarget::Pseudo { parent, name }, &parent_styles))
    }

    /// Drops the cached record for one node.
    pub fn flush(&self, node: NodeId) {
        let _ = self.cache.borrow_mut().remove(&node);
    }

    /// Drops every cached record. Call after any document edit or when the
    /// sheet itself is replaced.
    pub fn flush_all(&self) {
        self.cache.borrow_mut().clear();
    }

    fn compute(&self, doc: &Document, target: MatchTarget<'_>, parent: &Styles) -> Styles {
        let mut matched: Vec<(Specificity, &Rule)> = self
            .rules
            .iter()
            .filter(|rule| selector::matches(&rule.selector, doc, target))
            .map(|rule| (rule.specificity(), rule))
            .collect();
        // Stable sort, lowest specificity first, so that applying in order
        // makes the most specific rule win and source order break ties.
        matched.sort_by_key(|(specificity, _)| *specificity);

        let mut styles = Styles::inheriting(parent);
        let mut line_height = None;
        for (_, rule) in matched {
            for declaration in &rule.declarations {
                apply(declaration.property, declaration.value, &mut styles, &mut line_height);
            }
        }
        styles.line_height = match line_height {
            Some(Value::Number(factor)) => styles.font_size * factor,
            Some(Value::Length(Length::Px(px))) => px,
            Some(Value::Length(Length::Percent(pct))) => pct / 100.0 * styles.font_size,
            Some(Value::Display(_)) | None => styles.line_height,
        };
        styles
    }
}

/// Applies one declaration to a partially resolved record. Line height is
/// deferred until the final font size is known. Value/property mismatches
/// are ignored, degrading gracefully like unsupported selectors do.
fn apply(property: Property, value: Value, styles: &mut Styles, line_height: &mut Option<Value>) {
    match (property, value) {
        (Property::Display, Value::Display(display)) => styles.display = display,
        (Property::MarginTop, Value::Length(length)) => styles.margin_top = length,
        (Property::MarginRight, Value::Length(length)) => styles.margin_right = length,
        (Property::MarginBottom, Value::Length(length)) => styles.margin_bottom = length,
        (Property::MarginLeft, Value::Length(length)) => styles.margin_left = length,
        (Property::PaddingTop, Value::Length(length)) => styles.padding_top = length,
        (Property::PaddingRight, Value::Length(length)) => styles.padding_right = length,
        (Property::PaddingBottom, Value::Length(length)) => styles.padding_bottom = length,
        (Property::PaddingLeft, Value::Length(length)) => styles.padding_left = length,
        (Property::BorderTopWidth, Value::Length(Length::Px(px))) => {
            styles.border_top_width = px;
        }
        (Property::BorderRightWidth, Value::Length(Length::Px(px))) => {
            styles.border_right_width = px;
        }
        (Property::BorderBottomWidth, Value::Length(Length::Px(px))) => {
            styles.border_bottom_width = px;
        }
        (Property::BorderLeftWidth, Value::Length(Length::Px(px))) => {
            styles.border_left_width = px;
        }
        (Property::FontSize, Value::Length(Length::Px(px))) => styles.font_size = px,
        (Property::LineHeight, value) => *line_height = Some(value),
        _ => {}
    }
}

/// Convenience: a `display` declaration.
#[must_use]
pub fn display(value: Display) -> Declaration {
    Declaration {
        property: Property::Display,
        value: Value::Display(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Condition;

    fn named(name: &str) -> Selector {
        Selector::Element {
            name: Some(name.to_string()),
        }
    }

    fn class_rule(class: &str, declarations: Vec<Declaration>) -> Rule {
        Rule::new(
            Selector::Conditional {
                simple: Box::new(Selector::Element { name: None }),
                condition: Condition::OneOfAttribute {
                    name: None,
                    value: class.to_string(),
                },
            },
            declarations,
        )
    }

    fn px(property: Property, value: f32) -> Declaration {
        Declaration {
            property,
            value: Value::Length(Length::Px(value)),
        }
    }

    #[test]
    fn more_specific_rule_wins() {
        let mut doc = Document::new("article");
        let para = doc.insert_element(1, "para").unwrap();
        doc.set_attribute(para, "class", "note").unwrap();

        let sheet = StyleSheet::new(vec![
            class_rule("note", vec![px(Property::MarginTop, 24.0)]),
            Rule::new(named("para"), vec![px(Property::MarginTop, 8.0)]),
        ]);

        let styles = sheet.styles(&doc, para);
        assert_eq!(styles.margin_top, Length::Px(24.0));
    }

    #[test]
    fn ties_break_by_source_order() {
        let mut doc = Document::new("article");
        let para = doc.insert_element(1, "para").unwrap();

        let sheet = StyleSheet::new(vec![
            Rule::new(named("para"), vec![px(Property::MarginTop, 8.0)]),
            Rule::new(named("para"), vec![px(Property::MarginTop, 16.0)]),
        ]);

        let styles = sheet.styles(&doc, para);
        assert_eq!(styles.margin_top, Length::Px(16.0));
    }

    #[test]
    fn font_metrics_inherit_and_edges_do_not() {
        let mut doc = Document::new("article");
        let para = doc.insert_element(1, "para").unwrap();

        let sheet = StyleSheet::new(vec![Rule::new(
            named("article"),
            vec![
                px(Property::FontSize, 20.0),
                px(Property::MarginTop, 12.0),
            ],
        )]);

        let styles = sheet.styles(&doc, para);
        assert!((styles.font_size - 20.0).abs() < 0.01);
        assert_eq!(styles.margin_top, Length::ZERO);
    }

    #[test]
    fn line_height_factor_uses_final_font_size() {
        let mut doc = Document::new("article");
        let para = doc.insert_element(1, "para").unwrap();

        let sheet = StyleSheet::new(vec![Rule::new(
            named("para"),
            vec![
                Declaration {
                    property: Property::LineHeight,
                    value: Value::Number(1.5),
                },
                px(Property::FontSize, 20.0),
            ],
        )]);

        let styles = sheet.styles(&doc, para);
        assert!((styles.line_height - 30.0).abs() < 0.01);
    }

    #[test]
    fn comments_style_through_the_comment_name() {
        let mut doc = Document::new("article");
        let comment = doc.insert_comment(1).unwrap();

        let sheet = StyleSheet::new(vec![Rule::new(
            Selector::Conditional {
                simple: Box::new(Selector::Element { name: None }),
                condition: Condition::PseudoClass {
                    value: selector::COMMENT_NAME.to_string(),
                },
            },
            vec![display(Display::Block)],
        )]);

        let styles = sheet.styles(&doc, comment);
        assert_eq!(styles.display, Display::Block);
    }

    #[test]
    fn cache_serves_identical_records_until_flushed() {
        let mut doc = Document::new("article");
        let para = doc.insert_element(1, "para").unwrap();

        let sheet = StyleSheet::new(vec![Rule::new(
            named("para"),
            vec![display(Display::Block)],
        )]);

        let first = sheet.styles(&doc, para);
        let second = sheet.styles(&doc, para);
        assert!(Rc::ptr_eq(&first, &second));

        doc.set_attribute(para, "class", "note").unwrap();
        sheet.flush_all();
        let third = sheet.styles(&doc, para);
        assert!(!Rc::ptr_eq(&first, &third));
        assert_eq!(*first, *third);
    }

    #[test]
    fn pseudo_element_styles_resolve_against_parent() {
        let mut doc = Document::new("article");
        let para = doc.insert_element(1, "para").unwrap();

        let sheet = StyleSheet::new(vec![
            Rule::new(named("para"), vec![px(Property::FontSize, 20.0)]),
            Rule::new(
                Selector::Conditional {
                    simple: Box::new(named("para")),
                    condition: Condition::PseudoClass {
                        value: "before".to_string(),
                    },
                },
                vec![px(Property::MarginTop, 4.0)],
            ),
        ]);

        let styles = sheet.pseudo_styles(&doc, para, "before");
        assert!((styles.font_size - 20.0).abs() < 0.01);
        assert_eq!(styles.margin_top, Length::Px(4.0));
    }
}
