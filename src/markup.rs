use html5ever::tendril::TendrilSink;
use html5ever::{Attribute, LocalName, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::cell::RefCell;

use crate::error::{PipelineError, Result};

/// Renders HTML as the text a reader would see on the page.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkupConverter;

/// Accumulates rendered text, tracking whether a separator is owed before
/// the next word.
#[derive(Debug, Default)]
struct TextSink {
    out: String,
    pending_space: bool,
}

impl TextSink {
    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    fn needs_separator(&self) -> bool {
        self.pending_space && !self.out.is_empty() && !self.out.ends_with(char::is_whitespace)
    }

    fn push_words(&mut self, text: &str) {
        let mut words = text.split_whitespace().peekable();
        if text.starts_with(char::is_whitespace) {
            self.pending_space = true;
        }
        while let Some(word) = words.next() {
            if self.needs_separator() {
                self.out.push(' ');
            }
            self.out.push_str(word);
            self.pending_space = words.peek().is_some();
        }
        if text.ends_with(char::is_whitespace) {
            self.pending_space = true;
        }
    }

    fn push_verbatim(&mut self, text: &str) {
        if self.needs_separator() {
            self.out.push(' ');
        }
        self.out.push_str(text);
        self.pending_space = false;
    }

    fn push_raw(&mut self, text: &str) {
        self.out.push_str(text);
        self.pending_space = false;
    }

    fn line_break(&mut self) {
        self.out.push('\n');
        self.pending_space = false;
    }

    fn ensure_line_start(&mut self) {
        if !self.at_line_start() {
            self.line_break();
        }
        self.pending_space = false;
    }

    fn finish(self) -> String {
        normalize_lines(&self.out)
    }
}

impl MarkupConverter {
    pub fn get_dom(html: &str) -> Result<RcDom> {
        parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut std::io::Cursor::new(html))
            .map_err(|e| PipelineError::ConversionFailure(e.to_string()))
    }

    pub fn convert(&self, html: &str) -> Result<String> {
        if html.trim().is_empty() {
            return Ok(String::new());
        }
        let dom = Self::get_dom(html)?;
        let mut sink = TextSink::default();
        Self::walk(&dom.document, false, &mut sink);
        Ok(sink.finish())
    }

    fn is_invisible(local: &LocalName) -> bool {
        matches!(
            &**local,
            "head" | "script" | "style" | "noscript" | "template" | "iframe" | "object" | "svg"
        )
    }

    fn is_block_like(local: &LocalName) -> bool {
        matches!(
            &**local,
            "p" | "div"
                | "section"
                | "article"
                | "main"
                | "nav"
                | "aside"
                | "header"
                | "footer"
                | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
                | "ul"
                | "ol"
                | "li"
                | "dl"
                | "dt"
                | "dd"
                | "table"
                | "thead"
                | "tbody"
                | "tfoot"
                | "tr"
                | "caption"
                | "blockquote"
                | "pre"
                | "form"
                | "fieldset"
                | "figure"
                | "figcaption"
                | "address"
                | "details"
                | "summary"
                | "body"
        )
    }

    fn has_hidden_attr(attrs: &RefCell<Vec<Attribute>>) -> bool {
        attrs
            .borrow()
            .iter()
            .any(|attr| &*attr.name.local == "hidden")
    }

    fn walk(handle: &Handle, preformatted: bool, out: &mut TextSink) {
        match &handle.data {
            NodeData::Text { contents } => {
                let contents = contents.borrow();
                if preformatted {
                    out.push_verbatim(&contents);
                } else {
                    out.push_words(&contents);
                }
            }
            NodeData::Element { name, attrs, .. } => {
                let local = &name.local;
                if Self::is_invisible(local) || Self::has_hidden_attr(attrs) {
                    return;
                }

                match &**local {
                    "br" => {
                        out.line_break();
                        return;
                    }
                    "hr" => {
                        out.ensure_line_start();
                        out.line_break();
                        return;
                    }
                    "td" | "th" => {
                        if !out.at_line_start() {
                            out.push_raw("  ");
                        }
                    }
                    _ => {}
                }

                let block = Self::is_block_like(local);
                if block {
                    out.ensure_line_start();
                }
                if &**local == "li" {
                    out.push_raw("* ");
                }

                let preformatted = preformatted || &**local == "pre";
                for child in handle.children.borrow().iter() {
                    Self::walk(child, preformatted, out);
                }

                if block {
                    out.ensure_line_start();
                }
            }
            NodeData::Comment { .. } | NodeData::ProcessingInstruction { .. } => {}
            _ => {
                for child in handle.children.borrow().iter() {
                    Self::walk(child, preformatted, out);
                }
            }
        }
    }
}

/// Strips trailing spaces, folds runs of blank lines into one and drops
/// blank lines at either end.
fn normalize_lines(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut last_was_blank = true;
    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            if !last_was_blank {
                lines.push("");
                last_was_blank = true;
            }
        } else {
            lines.push(line);
            last_was_blank = false;
        }
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
