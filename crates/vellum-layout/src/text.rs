//! Whitespace-aware text splitting for line breaking.

use crate::metrics::FontMetrics;

/// Splits `text` so that the left part fits into `budget` pixels.
///
/// Break opportunities sit after each whitespace run, before the following
/// non-whitespace character. The split happens at the furthest opportunity
/// whose left part, trailing whitespace included, fits the budget. Note that
/// this splits even when the whole text would fit: trailing whitespace beyond
/// the last opportunity never travels with the left part.
///
/// When no opportunity fits and `force` is false, the result is
/// `(None, text)`. When `force` is true the widest fitting character prefix
/// is taken instead, at least one character, and any whitespace run
/// immediately following it is absorbed into the left part even though that
/// may exceed the budget.
#[must_use]
pub fn split_text<'a>(
    text: &'a str,
    budget: f32,
    force: bool,
    metrics: &dyn FontMetrics,
    font_size: f32,
) -> (Option<&'a str>, &'a str) {
    let mut best = None;
    let mut prev_was_whitespace = false;
    for (index, ch) in text.char_indices() {
        if prev_was_whitespace && !ch.is_whitespace() {
            // Prefix widths grow monotonically, so the first opportunity
            // over budget ends the search.
            if metrics.text_width(&text[..index], font_size) > budget {
                break;
            }
            best = Some(index);
        }
        prev_was_whitespace = ch.is_whitespace();
    }
    if let Some(split) = best {
        return (Some(&text[..split]), &text[split..]);
    }
    if !force {
        return (None, text);
    }

    let mut end = 0;
    for (index, ch) in text.char_indices() {
        let candidate = index + ch.len_utf8();
        if end > 0 && metrics.text_width(&text[..candidate], font_size) > budget {
            break;
        }
        end = candidate;
    }
    while let Some(ch) = text[end..].chars().next() {
        if !ch.is_whitespace() {
            break;
        }
        end += ch.len_utf8();
    }
    (Some(&text[..end]), &text[end..])
}
