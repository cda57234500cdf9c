//! Text measurement.
//!
//! Layout never talks to a rendering backend directly; it measures text
//! through the [`FontMetrics`] trait so that the same passes drive a real
//! renderer, the width heuristic used for estimation, and deterministic
//! fixed-width metrics in tests.

/// Measures text for line breaking and caret placement.
pub trait FontMetrics {
    /// Width in pixels of the given text at the given font size.
    fn text_width(&self, text: &str, font_size: f32) -> f32;

    /// Height in pixels of one line at the given font size.
    fn line_height(&self, font_size: f32) -> f32;
}

/// Heuristic metrics for proportional text: an average glyph is 0.6em wide
/// and a line is 1.2em tall.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproximateFontMetrics;

impl FontMetrics for ApproximateFontMetrics {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * 0.6 * font_size
    }

    fn line_height(&self, font_size: f32) -> f32 {
        font_size * 1.2
    }
}

/// Fixed-width metrics where every character is exactly `char_width` pixels
/// wide, independent of font size. Makes break positions exact in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedFontMetrics {
    /// Width of every character.
    pub char_width: f32,
    /// Height of every line.
    pub line_height: f32,
}

impl FixedFontMetrics {
    /// One-pixel-wide characters, so widths equal character counts.
    #[must_use]
    pub const fn unit() -> Self {
        FixedFontMetrics {
            char_width: 1.0,
            line_height: 1.0,
        }
    }
}

impl FontMetrics for FixedFontMetrics {
    fn text_width(&self, text: &str, _font_size: f32) -> f32 {
        text.chars().count() as f32 * self.char_width
    }

    fn line_height(&self, _font_size: f32) -> f32 {
        self.line_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approximate_widths_scale_with_font_size() {
        let metrics = ApproximateFontMetrics;
        assert!((metrics.text_width("abcd", 10.0) - 24.0).abs() < 0.001);
        assert!((metrics.line_height(10.0) - 12.0).abs() < 0.001);
    }

    #[test]
    fn fixed_widths_count_characters() {
        let metrics = FixedFontMetrics::unit();
        assert!((metrics.text_width("héllo", 99.0) - 5.0).abs() < 0.001);
    }
}
