//! ANSI-aware text measurement and slicing.
//!
//! Rendered slides carry escape sequences for colors and attributes. The
//! transition composers cut those lines at column offsets, so every
//! operation here counts terminal cells and never splits or drops an escape
//! sequence:
//! - CSI sequences: `ESC [` ... final byte (0x40-0x7E)
//! - OSC sequences: `ESC ]` ... BEL or ST (`ESC \`)
//! - Two-character sequences: `ESC` + single char

use unicode_width::UnicodeWidthChar;

const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Escape(&'a str),
    Char(char),
}

struct Tokens<'a> {
    s: &'a str,
    pos: usize,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let rest = &self.s[self.pos..];
        let first = rest.chars().next()?;
        if first == '\x1b' {
            let end = skip_escape_sequence(self.s.as_bytes(), self.pos);
            let token = Token::Escape(&self.s[self.pos..end]);
            self.pos = end;
            Some(token)
        } else {
            self.pos += first.len_utf8();
            Some(Token::Char(first))
        }
    }
}

fn tokens(s: &str) -> Tokens<'_> {
    Tokens { s, pos: 0 }
}

/// Returns the byte index after the escape sequence starting at `pos`.
fn skip_escape_sequence(bytes: &[u8], pos: usize) -> usize {
    let next = pos + 1;
    if next >= bytes.len() {
        return bytes.len();
    }
    match bytes[next] {
        b'[' => skip_csi(bytes, next + 1),
        b']' => skip_string_terminated(bytes, next + 1),
        b if b.is_ascii() => next + 1,
        // ESC followed by a multi-byte char: only the ESC is consumed
        _ => next,
    }
}

fn skip_csi(bytes: &[u8], pos: usize) -> usize {
    let mut i = pos;
    while i < bytes.len() {
        let b = bytes[i];
        if (0x40..=0x7E).contains(&b) {
            return i + 1;
        }
        if !(0x20..=0x7E).contains(&b) {
            return i;
        }
        i += 1;
    }
    bytes.len()
}

fn skip_string_terminated(bytes: &[u8], pos: usize) -> usize {
    let mut i = pos;
    while i < bytes.len() {
        match bytes[i] {
            0x07 => return i + 1,
            0x1B if i + 1 < bytes.len() && bytes[i + 1] == b'\\' => return i + 2,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn char_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Number of terminal cells `s` occupies, ignoring escape sequences.
pub fn width(s: &str) -> usize {
    tokens(s)
        .map(|t| match t {
            Token::Char(c) => char_width(c),
            Token::Escape(_) => 0,
        })
        .sum()
}

/// Remove every escape sequence.
pub fn strip(s: &str) -> String {
    tokens(s)
        .filter_map(|t| match t {
            Token::Char(c) => Some(c),
            Token::Escape(_) => None,
        })
        .collect()
}

/// Keep the first `cells` columns of `s`.
pub fn truncate(s: &str, cells: usize) -> String {
    let mut out = String::with_capacity(s.len());
    let mut used = 0;
    let mut styled = false;
    for token in tokens(s) {
        match token {
            Token::Escape(seq) => {
                styled = true;
                out.push_str(seq);
            }
            Token::Char(c) => {
                let w = char_width(c);
                if used + w > cells {
                    if styled {
                        out.push_str(RESET);
                    }
                    return out;
                }
                used += w;
                out.push(c);
            }
        }
    }
    out
}

/// Drop the first `cells` columns of `s`, keeping every escape sequence so
/// the remainder is drawn with the style it had.
pub fn skip(s: &str, cells: usize) -> String {
    let mut out = String::with_capacity(s.len());
    let mut skipped = 0;
    for token in tokens(s) {
        match token {
            Token::Escape(seq) => out.push_str(seq),
            Token::Char(c) => {
                if skipped < cells {
                    skipped += char_width(c);
                } else {
                    out.push(c);
                }
            }
        }
    }
    out
}

/// Pad `s` with spaces up to `cells` columns.
pub fn pad_right(s: &str, cells: usize) -> String {
    let w = width(s);
    if w >= cells {
        return s.to_string();
    }
    format!("{s}{}", " ".repeat(cells - w))
}

/// Word-wrap `s` at spaces so no line is wider than `limit`, unless a single
/// word is wider. A limit of zero disables wrapping.
pub fn word_wrap(s: &str, limit: usize) -> Vec<String> {
    if limit == 0 {
        return vec![s.to_string()];
    }

    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_width = 0;
    let mut word = String::new();
    let mut word_width = 0;

    let mut flush_word = |line: &mut String,
                          line_width: &mut usize,
                          word: &mut String,
                          word_width: &mut usize| {
        if word.is_empty() {
            return;
        }
        if *line_width > 0 && *line_width + 1 + *word_width > limit {
            lines.push(std::mem::take(line));
            *line_width = 0;
        }
        if *line_width > 0 {
            line.push(' ');
            *line_width += 1;
        }
        line.push_str(word);
        *line_width += *word_width;
        word.clear();
        *word_width = 0;
    };

    for token in tokens(s) {
        match token {
            Token::Char(' ') => {
                flush_word(&mut line, &mut line_width, &mut word, &mut word_width);
            }
            Token::Char(c) => {
                word.push(c);
                word_width += char_width(c);
            }
            Token::Escape(seq) => word.push_str(seq),
        }
    }
    flush_word(&mut line, &mut line_width, &mut word, &mut word_width);
    lines.push(line);
    lines
}
