//! Small geometric value types used throughout layout.

use serde::Serialize;

/// A vertical band, in coordinates relative to some box. Layout passes take
/// the band that needs laying out and report back the band that needs
/// repainting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VerticalRange {
    /// Top edge of the band.
    pub top: f32,
    /// Bottom edge of the band.
    pub bottom: f32,
}

impl VerticalRange {
    /// Creates a band from its edges.
    #[must_use]
    pub const fn new(top: f32, bottom: f32) -> Self {
        VerticalRange { top, bottom }
    }

    /// The smallest band covering both operands.
    #[must_use]
    pub fn union(self, other: VerticalRange) -> VerticalRange {
        VerticalRange {
            top: self.top.min(other.top),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Translates the band vertically.
    #[must_use]
    pub fn move_by(self, delta: f32) -> VerticalRange {
        VerticalRange {
            top: self.top + delta,
            bottom: self.bottom + delta,
        }
    }

    /// True if the band covers nothing.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.bottom <= self.top
    }
}

/// Caret geometry in coordinates relative to some box.
///
/// A height of zero marks a horizontal caret, drawn as a line across the
/// containing box between two block children.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Caret {
    /// Horizontal position.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Height; zero for a horizontal caret.
    pub height: f32,
}

impl Caret {
    /// Creates a vertical caret.
    #[must_use]
    pub const fn new(x: f32, y: f32, height: f32) -> Self {
        Caret { x, y, height }
    }

    /// Creates a horizontal between-blocks caret at the given vertical
    /// position.
    #[must_use]
    pub const fn horizontal(y: f32) -> Self {
        Caret { x: 0.0, y, height: 0.0 }
    }

    /// Translates the caret by the given offsets.
    #[must_use]
    pub fn translated(self, dx: f32, dy: f32) -> Caret {
        Caret {
            x: self.x + dx,
            y: self.y + dy,
            height: self.height,
        }
    }
}

/// Resolved spacing around a box edge: margin, border and padding summed per
/// side, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Insets {
    /// Spacing above the content.
    pub top: f32,
    /// Spacing left of the content.
    pub left: f32,
    /// Spacing below the content.
    pub bottom: f32,
    /// Spacing right of the content.
    pub right: f32,
}

impl Insets {
    /// No spacing on any side.
    pub const ZERO: Insets = Insets {
        top: 0.0,
        left: 0.0,
        bottom: 0.0,
        right: 0.0,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_covers_both_bands() {
        let a = VerticalRange::new(10.0, 20.0);
        let b = VerticalRange::new(15.0, 40.0);
        assert_eq!(a.union(b), VerticalRange::new(10.0, 40.0));
    }

    #[test]
    fn moved_bands_keep_their_extent() {
        let band = VerticalRange::new(5.0, 15.0).move_by(-5.0);
        assert_eq!(band, VerticalRange::new(0.0, 10.0));
        assert!(!band.is_empty());
        assert!(VerticalRange::new(3.0, 3.0).is_empty());
    }
}
