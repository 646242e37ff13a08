use std::sync::LazyLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::{LinesWithEndings, as_24_bit_terminal_escaped};

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEMES: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const RESET: &str = "\x1b[0m";

/// Tabs have no fixed cell width, so code is laid out with spaces.
const TAB: &str = "    ";

/// Highlight `code` as `language` with the named syntect theme, one
/// escaped string per source line.
///
/// Unknown languages are highlighted as plain text. An unknown theme (or
/// none) returns the lines unstyled. Tabs are expanded to four spaces.
pub fn highlight(
    code: &str,
    language: Option<&str>,
    theme: Option<&str>,
) -> Result<Vec<String>, syntect::Error> {
    let code = code.trim_end_matches('\n').replace('\t', TAB);
    let Some(theme) = theme.and_then(|name| THEMES.themes.get(name)) else {
        return Ok(code.split('\n').map(String::from).collect());
    };

    let syntax = language
        .and_then(|token| SYNTAXES.find_syntax_by_token(token))
        .unwrap_or_else(|| SYNTAXES.find_syntax_plain_text());
    let mut highlighter = HighlightLines::new(syntax, theme);

    let mut lines = Vec::new();
    for line in LinesWithEndings::from(&code) {
        let ranges = highlighter.highlight_line(line, &SYNTAXES)?;
        let escaped = as_24_bit_terminal_escaped(&ranges, false);
        lines.push(format!("{}{RESET}", escaped.trim_end_matches('\n')));
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ansi;

    #[test]
    fn test_highlight_keeps_text() {
        let code = "fn main() {\n    println!(\"hi\");\n}\n";
        let lines = highlight(code, Some("rust"), Some("base16-ocean.dark")).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(ansi::strip(&lines[0]), "fn main() {");
        assert_eq!(ansi::strip(&lines[1]), "    println!(\"hi\");");
        assert!(lines[0].contains("\x1b[38;2;"));
    }

    #[test]
    fn test_unknown_language_is_plain_text() {
        let lines = highlight("a b c", Some("no-such-lang"), Some("InspiredGitHub")).unwrap();
        assert_eq!(ansi::strip(&lines[0]), "a b c");
    }

    #[test]
    fn test_no_theme_is_unstyled() {
        let lines = highlight("x = 1\ny = 2\n", Some("python"), None).unwrap();
        assert_eq!(lines, vec!["x = 1", "y = 2"]);
        let lines = highlight("x", None, Some("not-a-theme")).unwrap();
        assert_eq!(lines, vec!["x"]);
    }

    #[test]
    fn test_tabs_become_spaces() {
        let lines = highlight("if x {\n\treturn;\n}", Some("rust"), None).unwrap();
        assert_eq!(lines[1], "    return;");

        let lines = highlight("\tx = 1", Some("python"), Some("base16-ocean.dark")).unwrap();
        assert_eq!(ansi::strip(&lines[0]), "    x = 1");
        assert_eq!(ansi::width(&lines[0]), 9);
    }

    #[test]
    fn test_empty_code() {
        let lines = highlight("", Some("rust"), Some("base16-ocean.dark")).unwrap();
        assert_eq!(lines, vec![String::new()]);
    }
}
