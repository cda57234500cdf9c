//! Splitting vectors with one-pixel-wide characters, so budgets read as
//! character counts.

use vellum_layout::{split_text, FixedFontMetrics};

const SAMPLE: &str = "baggy orange trousers";

fn split(text: &str, budget: f32, force: bool) -> (Option<&str>, &str) {
    split_text(text, budget, force, &FixedFontMetrics::unit(), 10.0)
}

#[test]
fn splits_at_the_furthest_fitting_boundary() {
    for budget in [22.0, 21.0, 20.0, 13.0] {
        assert_eq!(
            split(SAMPLE, budget, false),
            (Some("baggy orange "), "trousers"),
            "budget {budget}"
        );
    }
}

#[test]
fn falls_back_to_earlier_boundaries_as_the_budget_shrinks() {
    for budget in [12.0, 6.0] {
        assert_eq!(
            split(SAMPLE, budget, false),
            (Some("baggy "), "orange trousers"),
            "budget {budget}"
        );
    }
}

#[test]
fn refuses_to_split_mid_word_without_force() {
    for budget in [5.0, 1.0, 0.0, -1.0] {
        assert_eq!(split(SAMPLE, budget, false), (None, SAMPLE), "budget {budget}");
    }
}

#[test]
fn force_takes_the_widest_fitting_prefix() {
    assert_eq!(split(SAMPLE, 4.0, true), (Some("bagg"), "y orange trousers"));
    assert_eq!(split(SAMPLE, 3.0, true), (Some("bag"), "gy orange trousers"));
    assert_eq!(split(SAMPLE, 2.0, true), (Some("ba"), "ggy orange trousers"));
}

#[test]
fn force_never_yields_an_empty_left_part() {
    for budget in [1.0, 0.0, -1.0] {
        assert_eq!(
            split(SAMPLE, budget, true),
            (Some("b"), "aggy orange trousers"),
            "budget {budget}"
        );
    }
}

#[test]
fn force_absorbs_the_whitespace_after_a_full_word() {
    // The word itself fits in 5 but the boundary needs 6; force takes the
    // word and drags the following space with it.
    assert_eq!(split(SAMPLE, 5.0, true), (Some("baggy "), "orange trousers"));
}

#[test]
fn a_whitespace_run_moves_whole_with_the_left_part() {
    for budget in 5..=11 {
        assert_eq!(
            split("red  green", budget as f32, false),
            (Some("red  "), "green"),
            "budget {budget}"
        );
    }
}

#[test]
fn text_without_boundaries_only_splits_under_force() {
    assert_eq!(split("unbreakable", 4.0, false), (None, "unbreakable"));
    assert_eq!(split("unbreakable", 4.0, true), (Some("unbr"), "eakable"));
}
