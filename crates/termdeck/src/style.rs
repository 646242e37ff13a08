use crossterm::style::{Color, Stylize};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::ansi;
use crate::theme::{Theme, parse_color};

/// Border color used when neither the slide nor the theme provides one.
pub const DEFAULT_BORDER_COLOR: &str = "#9999CC";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StyleDecodeError {
    #[error("invalid layout configuration: {0}")]
    Layout(String),
    #[error("invalid position: {0}")]
    Position(String),
}

/// Where content sits along one axis of the slide box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
}

impl Align {
    fn from_token(token: &str) -> Result<Self, StyleDecodeError> {
        match token.trim() {
            "left" | "top" => Ok(Self::Start),
            "center" => Ok(Self::Center),
            "right" | "bottom" => Ok(Self::End),
            other => Err(StyleDecodeError::Position(other.to_string())),
        }
    }

    /// Split `free` cells into (before, after) padding.
    fn split(self, free: usize) -> (usize, usize) {
        match self {
            Self::Start => (0, free),
            Self::Center => (free / 2, free - free / 2),
            Self::End => (free, 0),
        }
    }
}

/// Horizontal and vertical alignment of slide content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Layout {
    pub horizontal: Align,
    pub vertical: Align,
}

impl Layout {
    /// Parse `"center"`, `"left, top"` and friends. A single token applies
    /// to both axes.
    pub fn parse(layout: &str) -> Result<Self, StyleDecodeError> {
        let layout = layout.trim();
        if layout.is_empty() {
            return Ok(Self::default());
        }

        let positions: Vec<&str> = layout.split(',').collect();
        match positions.as_slice() {
            [both] => {
                let align = Align::from_token(both)?;
                Ok(Self {
                    horizontal: align,
                    vertical: align,
                })
            }
            [horizontal, vertical] => Ok(Self {
                horizontal: Align::from_token(horizontal)?,
                vertical: Align::from_token(vertical)?,
            }),
            _ => Err(StyleDecodeError::Layout(layout.to_string())),
        }
    }

    /// The explicit two-token form, accepted back by [`Layout::parse`].
    pub fn to_expression(self) -> String {
        let horizontal = match self.horizontal {
            Align::Start => "left",
            Align::Center => "center",
            Align::End => "right",
        };
        let vertical = match self.vertical {
            Align::Start => "top",
            Align::Center => "center",
            Align::End => "bottom",
        };
        format!("{horizontal}, {vertical}")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BorderKind {
    #[default]
    Normal,
    Rounded,
    Double,
    Thick,
    Hidden,
    Block,
    InnerHalfBlock,
    OuterHalfBlock,
}

/// Glyphs for one border kind: top, bottom, left, right, then the corners
/// top-left, top-right, bottom-left, bottom-right.
struct BorderGlyphs([char; 8]);

impl BorderKind {
    /// Unknown names fall back to the normal border.
    pub fn from_name(name: &str) -> Self {
        match name {
            "rounded" => Self::Rounded,
            "double" => Self::Double,
            "thick" => Self::Thick,
            "hidden" => Self::Hidden,
            "block" => Self::Block,
            "innerHalfBlock" => Self::InnerHalfBlock,
            "outerHalfBlock" => Self::OuterHalfBlock,
            _ => Self::Normal,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Rounded => "rounded",
            Self::Double => "double",
            Self::Thick => "thick",
            Self::Hidden => "hidden",
            Self::Block => "block",
            Self::InnerHalfBlock => "innerHalfBlock",
            Self::OuterHalfBlock => "outerHalfBlock",
        }
    }

    fn glyphs(self) -> BorderGlyphs {
        BorderGlyphs(match self {
            Self::Normal => ['─', '─', '│', '│', '┌', '┐', '└', '┘'],
            Self::Rounded => ['─', '─', '│', '│', '╭', '╮', '╰', '╯'],
            Self::Double => ['═', '═', '║', '║', '╔', '╗', '╚', '╝'],
            Self::Thick => ['━', '━', '┃', '┃', '┏', '┓', '┗', '┛'],
            Self::Hidden => [' '; 8],
            Self::Block => ['█'; 8],
            Self::InnerHalfBlock => ['▄', '▀', '▐', '▌', '▗', '▖', '▝', '▘'],
            Self::OuterHalfBlock => ['▀', '▄', '▌', '▐', '▛', '▜', '▙', '▟'],
        })
    }
}

/// One layer of style settings as written in the config file or in a
/// slide's front matter. `None` (or an empty string) means "not set here"
/// and lets a broader layer show through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
}

fn explicit(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.is_empty())
}

impl StyleLayer {
    pub fn border(&self) -> Option<&str> {
        explicit(&self.border)
    }

    pub fn border_color(&self) -> Option<&str> {
        explicit(&self.border_color)
    }

    pub fn layout(&self) -> Option<&str> {
        explicit(&self.layout)
    }

    pub fn theme(&self) -> Option<&str> {
        explicit(&self.theme)
    }

    pub fn preset(&self) -> Option<&str> {
        explicit(&self.preset)
    }

    /// Check the one field that can be malformed.
    pub fn validate(&self) -> Result<(), StyleDecodeError> {
        if let Some(layout) = self.layout() {
            Layout::parse(layout)?;
        }
        Ok(())
    }
}

/// Effective style of one slide after merging every layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleConfig {
    pub border: BorderKind,
    pub border_color: Option<String>,
    pub layout: Layout,
    pub theme: Theme,
    pub preset: Option<String>,
}

impl StyleConfig {
    /// Every field written out explicitly, so merging this layer on top of
    /// anything reproduces `self`.
    pub fn to_layer(&self) -> StyleLayer {
        StyleLayer {
            border: Some(self.border.name().to_string()),
            border_color: self.border_color.clone(),
            layout: Some(self.layout.to_expression()),
            theme: Some(self.theme.name.clone()),
            preset: self.preset.clone(),
        }
    }

    fn resolved_border_color(&self) -> Option<Color> {
        let color = match self.border_color.as_deref() {
            Some("default") => DEFAULT_BORDER_COLOR,
            Some(color) => color,
            None => self
                .theme
                .h1_background
                .as_deref()
                .unwrap_or(DEFAULT_BORDER_COLOR),
        };
        parse_color(color)
    }

    /// Size the slide box for a `width` x `height` viewport.
    pub fn apply(&self, width: usize, height: usize) -> SlideStyle {
        SlideStyle {
            border: self.border,
            border_color: self.resolved_border_color(),
            layout: self.layout,
            inner_width: width.saturating_sub(4),
            inner_height: height.saturating_sub(2),
        }
    }
}

/// A style sized for the current viewport.
///
/// Every frame it renders has exactly `inner_height + 2` lines, each
/// exactly `inner_width + 2` cells wide: content is clipped or padded to
/// fit. The transition composers rely on that.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SlideStyle {
    pub border: BorderKind,
    pub border_color: Option<Color>,
    pub layout: Layout,
    pub inner_width: usize,
    pub inner_height: usize,
}

impl SlideStyle {
    /// Width available to the slide body.
    pub fn content_width(&self) -> usize {
        self.inner_width
    }

    fn paint(&self, s: String) -> String {
        match self.border_color {
            Some(color) => s.with(color).to_string(),
            None => s,
        }
    }

    pub fn render(&self, content: &str) -> String {
        let BorderGlyphs([top, bottom, left, right, top_left, top_right, bottom_left, bottom_right]) =
            self.border.glyphs();

        let mut body: Vec<String> = content
            .trim_end_matches('\n')
            .split('\n')
            .take(self.inner_height)
            .map(|line| {
                let line = ansi::truncate(line, self.inner_width);
                let (before, after) = self
                    .layout
                    .horizontal
                    .split(self.inner_width - ansi::width(&line));
                format!("{}{line}{}", " ".repeat(before), " ".repeat(after))
            })
            .collect();

        let (above, below) = self
            .layout
            .vertical
            .split(self.inner_height - body.len());
        let blank = " ".repeat(self.inner_width);
        let mut rows = Vec::with_capacity(self.inner_height + 2);
        rows.extend(std::iter::repeat_n(blank.clone(), above));
        rows.append(&mut body);
        rows.extend(std::iter::repeat_n(blank, below));

        let left = self.paint(left.to_string());
        let right = self.paint(right.to_string());

        let mut out = Vec::with_capacity(rows.len() + 2);
        out.push(self.paint(format!(
            "{top_left}{}{top_right}",
            top.to_string().repeat(self.inner_width)
        )));
        out.extend(rows.into_iter().map(|row| format!("{left}{row}{right}")));
        out.push(self.paint(format!(
            "{bottom_left}{}{bottom_right}",
            bottom.to_string().repeat(self.inner_width)
        )));
        out.join("\n")
    }
}

/// Center `frame` in a `width` x `height` viewport.
///
/// A frame taller than the viewport shows its bottom-most lines, so a slide
/// pushed in from below scrolls the old one out of the top. Lines wider
/// than the viewport are cut.
pub fn place(frame: &str, width: usize, height: usize) -> Vec<String> {
    let lines: Vec<&str> = frame.split('\n').collect();
    let visible = &lines[lines.len().saturating_sub(height)..];

    let (above, below) = Align::Center.split(height - visible.len());
    let blank = " ".repeat(width);
    let mut out = Vec::with_capacity(height);
    out.extend(std::iter::repeat_n(blank.clone(), above));
    for line in visible {
        let line = ansi::truncate(line, width);
        let (before, after) = Align::Center.split(width - ansi::width(&line));
        out.push(format!("{}{line}{}", " ".repeat(before), " ".repeat(after)));
    }
    out.extend(std::iter::repeat_n(blank, below));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_style(layout: &str, width: usize, height: usize) -> SlideStyle {
        StyleConfig {
            layout: Layout::parse(layout).unwrap(),
            ..StyleConfig::default()
        }
        .apply(width, height)
    }

    #[test]
    fn test_layout_single_token() {
        let layout = Layout::parse("center").unwrap();
        assert_eq!(layout.horizontal, Align::Center);
        assert_eq!(layout.vertical, Align::Center);
    }

    #[test]
    fn test_layout_two_tokens() {
        let layout = Layout::parse(" right , bottom ").unwrap();
        assert_eq!(layout.horizontal, Align::End);
        assert_eq!(layout.vertical, Align::End);
    }

    #[test]
    fn test_layout_errors() {
        assert_eq!(
            Layout::parse("center,left,right"),
            Err(StyleDecodeError::Layout("center,left,right".to_string()))
        );
        assert_eq!(
            Layout::parse("middle"),
            Err(StyleDecodeError::Position("middle".to_string()))
        );
    }

    #[test]
    fn test_layout_expression_round_trips() {
        for expr in ["center", "left", "right", "top", "bottom", "left, bottom", "right,center"] {
            let layout = Layout::parse(expr).unwrap();
            assert_eq!(Layout::parse(&layout.to_expression()).unwrap(), layout);
        }
    }

    #[test]
    fn test_border_fallback() {
        assert_eq!(BorderKind::from_name("double"), BorderKind::Double);
        assert_eq!(BorderKind::from_name("wobbly"), BorderKind::Normal);
        assert_eq!(BorderKind::from_name(""), BorderKind::Normal);
    }

    #[test]
    fn test_empty_fields_are_unset() {
        let layer = StyleLayer {
            border: Some(String::new()),
            theme: Some("dark".to_string()),
            ..StyleLayer::default()
        };
        assert_eq!(layer.border(), None);
        assert_eq!(layer.theme(), Some("dark"));
    }

    #[test]
    fn test_render_has_fixed_geometry() {
        let style = plain_style("center", 20, 8);
        for content in ["", "one line", "a\nb\nc\nd\ne\nf\ng\nh\ni\nj", "a line much longer than the box"] {
            let frame = style.render(content);
            let lines: Vec<&str> = frame.split('\n').collect();
            assert_eq!(lines.len(), 8, "content {content:?}");
            for line in lines {
                assert_eq!(ansi::width(line), 18, "content {content:?}");
            }
        }
    }

    #[test]
    fn test_render_alignment() {
        let frame = ansi::strip(&plain_style("right, bottom", 10, 5).render("ab"));
        let lines: Vec<&str> = frame.split('\n').collect();
        assert_eq!(lines[0], "┌──────┐");
        assert_eq!(lines[3], "│    ab│");
        assert_eq!(lines[4], "└──────┘");

        let frame = ansi::strip(&plain_style("left, top", 10, 5).render("ab"));
        let lines: Vec<&str> = frame.split('\n').collect();
        assert_eq!(lines[1], "│ab    │");
    }

    #[test]
    fn test_border_color_precedence() {
        let mut style = StyleConfig::default();
        // Theme H1 background wins over the built-in default
        assert_eq!(style.resolved_border_color(), Some(Color::AnsiValue(63)));

        style.border_color = Some("9".to_string());
        assert_eq!(style.resolved_border_color(), Some(Color::AnsiValue(9)));

        style.border_color = Some("default".to_string());
        assert_eq!(style.resolved_border_color(), parse_color(DEFAULT_BORDER_COLOR));

        style.border_color = None;
        style.theme = Theme::notty();
        assert_eq!(style.resolved_border_color(), parse_color(DEFAULT_BORDER_COLOR));
    }

    #[test]
    fn test_place_centers_small_frames() {
        let lines = place("ab", 6, 3);
        assert_eq!(lines, vec!["      ", "  ab  ", "      "]);
    }

    #[test]
    fn test_place_keeps_bottom_of_tall_frames() {
        let lines = place("1\n2\n3\n4", 1, 2);
        assert_eq!(lines, vec!["3", "4"]);
    }
}
