//! Resolved style values consumed by layout.
//!
//! A [`Styles`] record holds the computed values of every property the layout
//! engine reads: the display keyword, edge lengths, border widths and font
//! metrics. Lengths stay unresolved until a container width is known, so one
//! record per node can be cached and shared.

use serde::Serialize;

/// A CSS length, resolvable against a containing width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Length {
    /// An absolute length in pixels.
    Px(f32),
    /// A percentage of the containing width.
    Percent(f32),
}

impl Length {
    /// A zero-pixel length.
    pub const ZERO: Length = Length::Px(0.0);

    /// Resolves the length against the given container width.
    #[must_use]
    pub fn resolve(&self, container_width: f32) -> f32 {
        match *self {
            Length::Px(v) => v,
            Length::Percent(p) => p / 100.0 * container_width,
        }
    }
}

/// The CSS `display` keyword subset recognized by the box tree builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display, strum_macros::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Display {
    /// `display: inline`
    Inline,
    /// `display: block`
    Block,
    /// `display: table`
    Table,
    /// `display: table-row`
    TableRow,
    /// `display: table-cell`
    TableCell,
    /// `display: table-row-group`
    TableRowGroup,
    /// `display: table-header-group`
    TableHeaderGroup,
    /// `display: table-footer-group`
    TableFooterGroup,
    /// `display: table-column`
    TableColumn,
    /// `display: table-column-group`
    TableColumnGroup,
    /// `display: table-caption`
    TableCaption,
    /// `display: none` - the node generates no boxes at all
    None,
}

impl Display {
    /// True for the display values that may only appear under a specific
    /// table-model parent.
    #[must_use]
    pub fn is_table_child(self) -> bool {
        matches!(
            self,
            Display::TableCaption
                | Display::TableCell
                | Display::TableColumn
                | Display::TableColumnGroup
                | Display::TableRow
                | Display::TableRowGroup
                | Display::TableHeaderGroup
                | Display::TableFooterGroup
        )
    }
}

/// The properties the layout engine consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    /// `display`
    Display,
    /// `margin-top`
    MarginTop,
    /// `margin-right`
    MarginRight,
    /// `margin-bottom`
    MarginBottom,
    /// `margin-left`
    MarginLeft,
    /// `padding-top`
    PaddingTop,
    /// `padding-right`
    PaddingRight,
    /// `padding-bottom`
    PaddingBottom,
    /// `padding-left`
    PaddingLeft,
    /// `border-top-width`
    BorderTopWidth,
    /// `border-right-width`
    BorderRightWidth,
    /// `border-bottom-width`
    BorderBottomWidth,
    /// `border-left-width`
    BorderLeftWidth,
    /// `font-size`
    FontSize,
    /// `line-height`
    LineHeight,
}

/// A declared property value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// A length value.
    Length(Length),
    /// A display keyword.
    Display(Display),
    /// A unitless number, e.g. a line-height multiplier.
    Number(f32),
}

/// Default font size in pixels when no rule sets one.
pub const DEFAULT_FONT_SIZE: f32 = 16.0;

/// Default line height as a multiple of the font size.
pub const DEFAULT_LINE_HEIGHT_FACTOR: f32 = 1.2;

/// The resolved style record for a single node.
///
/// Derived from the cascade; never mutated in place once handed to the layout
/// engine for a layout pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Styles {
    /// The display keyword.
    pub display: Display,
    /// Top margin.
    pub margin_top: Length,
    /// Right margin.
    pub margin_right: Length,
    /// Bottom margin.
    pub margin_bottom: Length,
    /// Left margin.
    pub margin_left: Length,
    /// Top padding.
    pub padding_top: Length,
    /// Right padding.
    pub padding_right: Length,
    /// Bottom padding.
    pub padding_bottom: Length,
    /// Left padding.
    pub padding_left: Length,
    /// Top border width in pixels.
    pub border_top_width: f32,
    /// Right border width in pixels.
    pub border_right_width: f32,
    /// Bottom border width in pixels.
    pub border_bottom_width: f32,
    /// Left border width in pixels.
    pub border_left_width: f32,
    /// Font size in pixels. Inherited.
    pub font_size: f32,
    /// Line height in pixels. Inherited.
    pub line_height: f32,
}

impl Styles {
    /// The initial style record: inline display, zero edges, default font
    /// metrics.
    #[must_use]
    pub fn initial() -> Self {
        Styles {
            display: Display::Inline,
            margin_top: Length::ZERO,
            margin_right: Length::ZERO,
            margin_bottom: Length::ZERO,
            margin_left: Length::ZERO,
            padding_top: Length::ZERO,
            padding_right: Length::ZERO,
            padding_bottom: Length::ZERO,
            padding_left: Length::ZERO,
            border_top_width: 0.0,
            border_right_width: 0.0,
            border_bottom_width: 0.0,
            border_left_width: 0.0,
            font_size: DEFAULT_FONT_SIZE,
            line_height: DEFAULT_FONT_SIZE * DEFAULT_LINE_HEIGHT_FACTOR,
        }
    }

    /// A fresh record inheriting font metrics from a parent record. All
    /// non-inherited properties start at their initial values.
    #[must_use]
    pub fn inheriting(parent: &Styles) -> Self {
        Styles {
            font_size: parent.font_size,
            line_height: parent.line_height,
            ..Styles::initial()
        }
    }
}

impl Default for Styles {
    fn default() -> Self {
        Styles::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn length_resolution() {
        assert!((Length::Px(12.0).resolve(400.0) - 12.0).abs() < 0.01);
        assert!((Length::Percent(25.0).resolve(400.0) - 100.0).abs() < 0.01);
    }

    #[test]
    fn display_keyword_round_trip() {
        assert_eq!(Display::TableRowGroup.to_string(), "table-row-group");
        assert_eq!(Display::from_str("table-cell").unwrap(), Display::TableCell);
        assert!(Display::from_str("flex").is_err());
    }

    #[test]
    fn styles_serialize_for_debug_dumps() {
        let styles = Styles::initial();
        let json = serde_json::to_value(&styles).unwrap();
        assert_eq!(json["display"], "Inline");
        assert!((json["font_size"].as_f64().unwrap() - 16.0).abs() < 0.01);
    }
}
