use std::path::Path;

use anyhow::{Context, Result};
use crossterm::style::{Attribute, Color, ContentStyle};
use serde::{Deserialize, Serialize};

/// Terminal palette used to render slide bodies.
///
/// Colors are stored as written in theme files: `#RRGGBB`, `#RGB` or an
/// ANSI palette index (`"63"`). Custom themes are JSON files with the same
/// field names; missing fields fall back to the dark palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub name: String,
    pub text: Option<String>,
    pub heading: Option<String>,
    pub h1_foreground: Option<String>,
    pub h1_background: Option<String>,
    pub code: Option<String>,
    pub code_background: Option<String>,
    pub link: Option<String>,
    pub quote: Option<String>,
    pub rule: Option<String>,
    pub list_marker: Option<String>,
    /// syntect theme used for fenced code blocks.
    pub code_theme: Option<String>,
    /// Emit bold/italic/underline attributes.
    pub attributes: bool,
    /// Restrict decorations to plain ASCII.
    pub ascii: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

fn color(value: &str) -> Option<String> {
    Some(value.to_string())
}

impl Theme {
    pub const BUILTIN: &'static [&'static str] = &[
        "dark",
        "light",
        "dracula",
        "tokyo-night",
        "pink",
        "notty",
        "ascii",
    ];

    pub fn dark() -> Self {
        Self {
            name: "dark".to_string(),
            text: color("252"),
            heading: color("39"),
            h1_foreground: color("228"),
            h1_background: color("63"),
            code: color("203"),
            code_background: color("236"),
            link: color("30"),
            quote: color("244"),
            rule: color("240"),
            list_marker: color("39"),
            code_theme: Some("base16-ocean.dark".to_string()),
            attributes: true,
            ascii: false,
        }
    }

    pub fn light() -> Self {
        Self {
            name: "light".to_string(),
            text: color("234"),
            heading: color("27"),
            h1_foreground: color("228"),
            h1_background: color("63"),
            code: color("203"),
            code_background: color("254"),
            link: color("36"),
            quote: color("242"),
            rule: color("249"),
            list_marker: color("27"),
            code_theme: Some("InspiredGitHub".to_string()),
            attributes: true,
            ascii: false,
        }
    }

    pub fn dracula() -> Self {
        Self {
            name: "dracula".to_string(),
            text: color("#f8f8f2"),
            heading: color("#bd93f9"),
            h1_foreground: color("#bd93f9"),
            h1_background: None,
            code: color("#50fa7b"),
            code_background: None,
            link: color("#8be9fd"),
            quote: color("#f1fa8c"),
            rule: color("#6272a4"),
            list_marker: color("#ff79c6"),
            code_theme: Some("base16-eighties.dark".to_string()),
            attributes: true,
            ascii: false,
        }
    }

    pub fn tokyo_night() -> Self {
        Self {
            name: "tokyo-night".to_string(),
            text: color("#a9b1d6"),
            heading: color("#bb9af7"),
            h1_foreground: color("#bb9af7"),
            h1_background: None,
            code: color("#7aa2f7"),
            code_background: None,
            link: color("#7aa2f7"),
            quote: color("#565f89"),
            rule: color("#565f89"),
            list_marker: color("#7dcfff"),
            code_theme: Some("base16-mocha.dark".to_string()),
            attributes: true,
            ascii: false,
        }
    }

    pub fn pink() -> Self {
        Self {
            name: "pink".to_string(),
            text: None,
            heading: color("212"),
            h1_foreground: color("212"),
            h1_background: None,
            code: color("212"),
            code_background: None,
            link: color("219"),
            quote: color("218"),
            rule: color("212"),
            list_marker: color("212"),
            code_theme: Some("base16-ocean.dark".to_string()),
            attributes: true,
            ascii: false,
        }
    }

    /// No colors and no attributes.
    pub fn notty() -> Self {
        Self {
            name: "notty".to_string(),
            text: None,
            heading: None,
            h1_foreground: None,
            h1_background: None,
            code: None,
            code_background: None,
            link: None,
            quote: None,
            rule: None,
            list_marker: None,
            code_theme: None,
            attributes: false,
            ascii: false,
        }
    }

    pub fn ascii() -> Self {
        Self {
            name: "ascii".to_string(),
            ascii: true,
            ..Self::notty()
        }
    }

    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "dark" | "auto" => Some(Self::dark()),
            "light" => Some(Self::light()),
            "dracula" => Some(Self::dracula()),
            "tokyo-night" => Some(Self::tokyo_night()),
            "pink" => Some(Self::pink()),
            "notty" => Some(Self::notty()),
            "ascii" => Some(Self::ascii()),
            _ => None,
        }
    }

    /// Resolve a theme setting: a built-in name or a path to a JSON theme.
    /// Anything that cannot be loaded falls back to the dark theme.
    pub fn resolve(value: &str) -> Self {
        if let Some(theme) = Self::builtin(value) {
            return theme;
        }
        if value.is_empty() {
            return Self::dark();
        }
        match Self::load_file(Path::new(value)) {
            Ok(theme) => theme,
            Err(e) => {
                log::warn!("Falling back to dark theme: {e:#}");
                Self::dark()
            }
        }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read theme {}", path.display()))?;
        let mut theme: Theme = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid theme {}", path.display()))?;
        theme.name = path.display().to_string();
        Ok(theme)
    }

    /// Plain text style for this theme with the given foreground.
    pub fn style(&self, foreground: Option<&str>) -> ContentStyle {
        ContentStyle {
            foreground_color: foreground.and_then(parse_color),
            ..ContentStyle::default()
        }
    }

    pub fn text_style(&self) -> ContentStyle {
        self.style(self.text.as_deref())
    }

    pub fn heading_style(&self, level: u8) -> ContentStyle {
        let mut style = if level == 1 {
            ContentStyle {
                foreground_color: self.h1_foreground.as_deref().and_then(parse_color),
                background_color: self.h1_background.as_deref().and_then(parse_color),
                ..ContentStyle::default()
            }
        } else {
            self.style(self.heading.as_deref())
        };
        self.add_attribute(&mut style, Attribute::Bold);
        style
    }

    pub fn code_style(&self) -> ContentStyle {
        ContentStyle {
            foreground_color: self.code.as_deref().and_then(parse_color),
            background_color: self.code_background.as_deref().and_then(parse_color),
            ..ContentStyle::default()
        }
    }

    pub fn link_style(&self) -> ContentStyle {
        let mut style = self.style(self.link.as_deref());
        self.add_attribute(&mut style, Attribute::Underlined);
        style
    }

    /// Set an attribute when this theme renders attributes at all.
    pub fn add_attribute(&self, style: &mut ContentStyle, attribute: Attribute) {
        if self.attributes {
            style.attributes.set(attribute);
        }
    }

    pub fn bullet(&self) -> &'static str {
        if self.ascii { "* " } else { "• " }
    }

    pub fn rule_char(&self) -> char {
        if self.ascii { '-' } else { '─' }
    }

    pub fn quote_bar(&self) -> &'static str {
        if self.ascii { "| " } else { "│ " }
    }
}

/// Parse `#RRGGBB`, `#RGB` or an ANSI palette index.
pub fn parse_color(value: &str) -> Option<Color> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        return match hex.len() {
            6 => Some(Color::Rgb {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
            }),
            3 => {
                let expand = |i: usize| channel(&hex[i..=i].repeat(2));
                Some(Color::Rgb {
                    r: expand(0)?,
                    g: expand(1)?,
                    b: expand(2)?,
                })
            }
            _ => None,
        };
    }
    value.parse::<u8>().ok().map(Color::AnsiValue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_names_resolve() {
        for name in Theme::BUILTIN {
            assert_eq!(Theme::resolve(name).name, *name);
        }
        assert_eq!(Theme::resolve("auto").name, "dark");
    }

    #[test]
    fn test_unknown_theme_falls_back_to_dark() {
        assert_eq!(Theme::resolve("/definitely/not/here.json"), Theme::dark());
        assert_eq!(Theme::resolve(""), Theme::dark());
    }

    #[test]
    fn test_custom_theme_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r##"{{"heading": "#ff0000", "h1_background": "21"}}"##).unwrap();
        let path = file.path().display().to_string();

        let theme = Theme::resolve(&path);
        assert_eq!(theme.name, path);
        assert_eq!(theme.heading.as_deref(), Some("#ff0000"));
        assert_eq!(theme.h1_background.as_deref(), Some("21"));
        // Unset fields come from the dark palette
        assert_eq!(theme.code, Theme::dark().code);
    }

    #[test]
    fn test_invalid_theme_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let theme = Theme::resolve(&file.path().display().to_string());
        assert_eq!(theme, Theme::dark());
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(
            parse_color("#9999CC"),
            Some(Color::Rgb {
                r: 0x99,
                g: 0x99,
                b: 0xCC
            })
        );
        assert_eq!(
            parse_color("#fff"),
            Some(Color::Rgb {
                r: 255,
                g: 255,
                b: 255
            })
        );
        assert_eq!(parse_color("9"), Some(Color::AnsiValue(9)));
        assert_eq!(parse_color("256"), None);
        assert_eq!(parse_color("#zzzzzz"), None);
        assert_eq!(parse_color("blue"), None);
    }

    #[test]
    fn test_notty_has_no_styles() {
        let theme = Theme::notty();
        assert_eq!(theme.heading_style(1), ContentStyle::default());
        assert_eq!(theme.link_style(), ContentStyle::default());
    }
}
