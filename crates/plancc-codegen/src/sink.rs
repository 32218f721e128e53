//! Append-only destinations for generated code

use std::fmt;

/// Output channel the translators write to; never read back during translation
pub trait CodeSink {
    /// Append one statement at the current nesting depth
    fn emit(&mut self, line: &str);

    fn indent(&mut self);

    fn dedent(&mut self);

    fn open_block(&mut self, header: &str) {
        self.emit(&format!("{} {{", header));
        self.indent();
    }

    fn close_block(&mut self) {
        self.dedent();
        self.emit("}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub depth: usize,
    pub text: String,
}

/// In-memory sink keeping each line with its nesting depth
#[derive(Debug, Clone)]
pub struct CodeBuffer {
    lines: Vec<Line>,
    depth: usize,
    indent_width: usize,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::with_indent(4)
    }

    pub fn with_indent(indent_width: usize) -> Self {
        Self {
            lines: Vec::new(),
            depth: 0,
            indent_width,
        }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Index of the first line containing `needle`
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.text.contains(needle))
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&" ".repeat(line.depth * self.indent_width));
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }
}

impl Default for CodeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeSink for CodeBuffer {
    fn emit(&mut self, line: &str) {
        self.lines.push(Line {
            depth: self.depth,
            text: line.to_string(),
        });
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

impl fmt::Display for CodeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
