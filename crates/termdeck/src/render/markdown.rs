use crossterm::style::{Attribute, ContentStyle};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use unicode_width::UnicodeWidthStr;

use super::{RenderError, ansi, syntax};
use crate::theme::Theme;

/// Render a slide body to terminal lines no wider than `width` where the
/// text can be wrapped. Code blocks and tables are left to the caller to
/// clip.
pub fn render_markdown(text: &str, theme: &Theme, width: usize) -> Result<String, RenderError> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut renderer = MarkdownRenderer::new(theme, width);
    for event in Parser::new_ext(text, options) {
        renderer.process_event(event)?;
    }
    Ok(renderer.finish())
}

#[derive(Debug, Default)]
struct TableBuffer {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    current_row: Vec<String>,
    current_cell: String,
}

impl TableBuffer {
    fn finish_cell(&mut self) {
        let cell = std::mem::take(&mut self.current_cell);
        self.current_row.push(cell.trim().to_string());
    }

    fn finish_row(&mut self, is_header: bool) {
        let row = std::mem::take(&mut self.current_row);
        if is_header {
            self.header = row;
        } else {
            self.rows.push(row);
        }
    }

    fn column_widths(&self, available: usize) -> Vec<usize> {
        let columns = std::iter::once(&self.header)
            .chain(&self.rows)
            .map(Vec::len)
            .max()
            .unwrap_or(0);
        let mut widths = vec![0; columns];
        for row in std::iter::once(&self.header).chain(&self.rows) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.width());
            }
        }

        // Separators take three cells per column boundary
        let budget = available.saturating_sub(3 * columns.saturating_sub(1));
        while widths.iter().sum::<usize>() > budget {
            match widths.iter_mut().max() {
                Some(widest) if *widest > 1 => *widest -= 1,
                _ => break,
            }
        }
        widths
    }

    fn render(&self, theme: &Theme, available: usize) -> Vec<String> {
        let widths = self.column_widths(available);
        let (bar, cross) = if theme.ascii {
            (" | ", "-+-")
        } else {
            (" │ ", "─┼─")
        };
        let row_line = |row: &[String]| {
            widths
                .iter()
                .enumerate()
                .map(|(i, &w)| {
                    let cell = row.get(i).map(String::as_str).unwrap_or_default();
                    ansi::pad_right(&ansi::truncate(cell, w), w)
                })
                .collect::<Vec<_>>()
                .join(bar)
        };

        let mut lines = Vec::new();
        if !self.header.is_empty() {
            let header_style = theme.heading_style(2);
            lines.push(header_style.apply(row_line(&self.header)).to_string());
            let rule = widths
                .iter()
                .map(|&w| theme.rule_char().to_string().repeat(w))
                .collect::<Vec<_>>()
                .join(cross);
            lines.push(theme.style(theme.rule.as_deref()).apply(rule).to_string());
        }
        for row in &self.rows {
            lines.push(theme.text_style().apply(row_line(row)).to_string());
        }
        lines
    }
}

#[derive(Debug, Clone)]
struct ListState {
    /// `None` for bullets, the next number for ordered lists.
    next_number: Option<u64>,
    /// Indentation of wrapped item lines.
    hang: usize,
}

struct CodeBlock {
    language: Option<String>,
    text: String,
}

struct MarkdownRenderer<'a> {
    theme: &'a Theme,
    width: usize,
    lines: Vec<String>,
    spans: Vec<(String, ContentStyle)>,
    style_stack: Vec<ContentStyle>,
    heading: Option<usize>,
    code_block: Option<CodeBlock>,
    list_stack: Vec<ListState>,
    /// Marker waiting to be drawn on the first line of the current item.
    pending_marker: Option<String>,
    quote_depth: usize,
    /// Span index where the current link's text starts, and its target.
    links: Vec<(usize, String)>,
    table: Option<TableBuffer>,
    in_table_head: bool,
}

impl<'a> MarkdownRenderer<'a> {
    fn new(theme: &'a Theme, width: usize) -> Self {
        Self {
            theme,
            width,
            lines: Vec::new(),
            spans: Vec::new(),
            style_stack: vec![theme.text_style()],
            heading: None,
            code_block: None,
            list_stack: Vec::new(),
            pending_marker: None,
            quote_depth: 0,
            links: Vec::new(),
            table: None,
            in_table_head: false,
        }
    }

    fn current_style(&self) -> ContentStyle {
        self.style_stack.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, style: ContentStyle) {
        self.style_stack.push(style);
    }

    fn push_attribute(&mut self, attribute: Attribute) {
        let mut style = self.current_style();
        self.theme.add_attribute(&mut style, attribute);
        self.push_style(style);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn blank_line(&mut self) {
        if self.lines.last().is_some_and(|l| !l.is_empty()) {
            self.lines.push(String::new());
        }
    }

    fn process_event(&mut self, event: Event) -> Result<(), RenderError> {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag)?,
            Event::Text(text) => self.add_text(&text),
            Event::Code(code) => self.add_inline_code(&code),
            Event::SoftBreak => self.add_text(" "),
            Event::HardBreak => self.add_text("\n"),
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                let style = self.theme.style(self.theme.list_marker.as_deref());
                self.spans.push((marker.to_string(), style));
            }
            Event::Rule => {
                self.flush_paragraph();
                let rule = self.theme.rule_char().to_string().repeat(self.width);
                let style = self.theme.style(self.theme.rule.as_deref());
                self.lines.push(style.apply(rule).to_string());
                self.lines.push(String::new());
            }
            // Raw HTML, footnotes and math have no terminal rendering
            _ => {}
        }
        Ok(())
    }

    fn start_tag(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_paragraph();
                let level = heading_number(level);
                self.heading = Some(level);
                self.push_style(self.theme.heading_style(level as u8));
                if level > 1 {
                    self.add_text(&format!("{} ", "#".repeat(level)));
                }
            }
            Tag::CodeBlock(kind) => {
                self.flush_paragraph();
                let language = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                };
                self.code_block = Some(CodeBlock {
                    language,
                    text: String::new(),
                });
            }
            Tag::List(start) => {
                self.flush_paragraph();
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
                self.list_stack.push(ListState {
                    next_number: start,
                    hang: 0,
                });
            }
            Tag::Item => {
                self.flush_paragraph();
                let indent = 2 * self.list_stack.len().saturating_sub(1);
                let Some(list) = self.list_stack.last_mut() else {
                    return;
                };
                let marker = match list.next_number.as_mut() {
                    Some(n) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    None => self.theme.bullet().to_string(),
                };
                list.hang = indent + marker.width();
                let style = self.theme.style(self.theme.list_marker.as_deref());
                self.pending_marker = Some(format!(
                    "{}{}",
                    " ".repeat(indent),
                    style.apply(marker)
                ));
            }
            Tag::BlockQuote(_) => {
                self.flush_paragraph();
                self.quote_depth += 1;
                let mut style = self.theme.style(self.theme.quote.as_deref());
                self.theme.add_attribute(&mut style, Attribute::Italic);
                self.push_style(style);
            }
            Tag::Emphasis => self.push_attribute(Attribute::Italic),
            Tag::Strong => self.push_attribute(Attribute::Bold),
            Tag::Strikethrough => self.push_attribute(Attribute::CrossedOut),
            Tag::Link { dest_url, .. } => {
                self.links.push((self.spans.len(), dest_url.to_string()));
                self.push_style(self.theme.link_style());
            }
            Tag::Image { dest_url, .. } => {
                self.links.push((self.spans.len(), dest_url.to_string()));
                self.push_style(self.theme.link_style());
                self.add_text("Image: ");
            }
            Tag::Table(_) => {
                self.flush_paragraph();
                self.table = Some(TableBuffer::default());
            }
            Tag::TableHead => self.in_table_head = true,
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) -> Result<(), RenderError> {
        match tag {
            TagEnd::Paragraph => {
                self.flush_paragraph();
                if self.list_stack.is_empty() {
                    self.lines.push(String::new());
                }
            }
            TagEnd::Heading(_) => {
                if self.heading == Some(1) {
                    self.flush_title();
                } else {
                    self.flush_paragraph();
                }
                self.pop_style();
                self.heading = None;
                self.lines.push(String::new());
            }
            TagEnd::CodeBlock => {
                if let Some(block) = self.code_block.take() {
                    self.flush_code_block(&block)?;
                }
                self.lines.push(String::new());
            }
            TagEnd::List(_) => {
                self.flush_paragraph();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.lines.push(String::new());
                }
            }
            TagEnd::Item => self.flush_paragraph(),
            TagEnd::BlockQuote(_) => {
                self.flush_paragraph();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.pop_style();
                if self.quote_depth == 0 {
                    self.blank_line();
                }
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                if let Some((start, url)) = self.links.pop() {
                    let text: String = self
                        .spans
                        .get(start..)
                        .unwrap_or_default()
                        .iter()
                        .map(|(t, _)| t.as_str())
                        .collect();
                    if !url.is_empty() && text != url {
                        let style = self.theme.style(self.theme.quote.as_deref());
                        self.spans.push((format!(" ({url})"), style));
                    }
                }
            }
            TagEnd::Image => {
                self.pop_style();
                if let Some((_, url)) = self.links.pop() {
                    let arrow = if self.theme.ascii { "->" } else { "→" };
                    let style = self.theme.style(self.theme.quote.as_deref());
                    self.spans.push((format!(" {arrow} {url}"), style));
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    let lines = table.render(self.theme, self.width);
                    self.lines.extend(lines);
                }
                self.lines.push(String::new());
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_row(true);
                }
                self.in_table_head = false;
            }
            TagEnd::TableRow if !self.in_table_head => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_row(false);
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_cell();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(block) = self.code_block.as_mut() {
            block.text.push_str(text);
            return;
        }
        if let Some(table) = self.table.as_mut() {
            table.current_cell.push_str(&text.replace('\n', " "));
            return;
        }
        let style = self.current_style();
        self.spans.push((text.to_string(), style));
    }

    fn add_inline_code(&mut self, code: &str) {
        if let Some(table) = self.table.as_mut() {
            table.current_cell.push_str(code);
            return;
        }
        self.spans.push((code.to_string(), self.theme.code_style()));
    }

    fn quote_prefix(&self) -> String {
        if self.quote_depth == 0 {
            return String::new();
        }
        let bars = self.theme.quote_bar().repeat(self.quote_depth);
        self.theme
            .style(self.theme.quote.as_deref())
            .apply(bars)
            .to_string()
    }

    /// Wrap the collected spans and emit them with list and quote prefixes.
    fn flush_paragraph(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.spans);

        // Style word by word so a wrapped line never carries an open style
        let mut text = String::new();
        for (span, style) in &spans {
            for (i, segment) in span.split('\n').enumerate() {
                if i > 0 {
                    text.push('\n');
                }
                let words: Vec<String> = segment
                    .split(' ')
                    .map(|word| {
                        if word.is_empty() {
                            String::new()
                        } else {
                            style.apply(word).to_string()
                        }
                    })
                    .collect();
                text.push_str(&words.join(" "));
            }
        }

        let quote = self.quote_prefix();
        let hang = self.list_stack.last().map(|l| l.hang).unwrap_or(0);
        let mut first = match self.pending_marker.take() {
            Some(marker) => format!("{quote}{marker}"),
            None => format!("{quote}{}", " ".repeat(hang)),
        };
        let rest = format!("{quote}{}", " ".repeat(hang));
        let available = self.width.saturating_sub(ansi::width(&rest)).max(1);

        for segment in text.split('\n') {
            for line in ansi::word_wrap(segment.trim_start_matches(' '), available) {
                let prefix = std::mem::replace(&mut first, rest.clone());
                self.lines.push(format!("{prefix}{line}"));
            }
        }
    }

    /// Level-one headings sit on a colored band, unwrapped.
    fn flush_title(&mut self) {
        let text: String = std::mem::take(&mut self.spans)
            .into_iter()
            .map(|(t, _)| t)
            .collect();
        let style = self.theme.heading_style(1);
        self.lines.push(style.apply(format!(" {} ", text.trim())).to_string());
    }

    fn flush_code_block(&mut self, block: &CodeBlock) -> Result<(), RenderError> {
        let code_lines = match self.theme.code_theme.as_deref() {
            Some(name) => syntax::highlight(&block.text, block.language.as_deref(), Some(name))?,
            None => syntax::highlight(&block.text, None, None)?
                .into_iter()
                .map(|line| self.theme.code_style().apply(line).to_string())
                .collect(),
        };
        let prefix = format!("{}  ", self.quote_prefix());
        self.lines
            .extend(code_lines.into_iter().map(|line| format!("{prefix}{line}")));
        Ok(())
    }

    fn finish(mut self) -> String {
        self.flush_paragraph();
        while self.lines.last().is_some_and(|l| l.is_empty()) {
            self.lines.pop();
        }
        self.lines.join("\n")
    }
}

fn heading_number(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
