// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Simple line-based writer for generating Java code with proper indentation.

use std::fmt::Display;

const INDENT: &str = "    ";

/// Writer context for generating Java code.
/// Tracks indentation and handles line-based output.
pub struct JavaWriter {
    out: String,
    indent: usize,
    at_line_start: bool,
}

impl Default for JavaWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl JavaWriter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
            at_line_start: true,
        }
    }

    /// Write a string, handling indentation at line starts.
    pub fn write(&mut self, s: &str) {
        for c in s.chars() {
            if c == '\n' {
                self.out.push('\n');
                self.at_line_start = true;
            } else {
                if self.at_line_start {
                    for _ in 0..self.indent {
                        self.out.push_str(INDENT);
                    }
                }
                self.at_line_start = false;
                self.out.push(c);
            }
        }
    }

    /// Write a complete line (adds newline at end).
    pub fn line(&mut self, s: &str) {
        self.write(s);
        self.newline();
    }

    pub fn write_fmt(&mut self, args: std::fmt::Arguments<'_>) {
        self.write(&args.to_string());
    }

    pub fn line_fmt(&mut self, args: std::fmt::Arguments<'_>) {
        self.line(&args.to_string());
    }

    pub fn space(&mut self) {
        self.write(" ");
    }

    pub fn newline(&mut self) {
        self.write("\n");
    }

    /// Write ` {`, end the line and indent the lines that follow
    pub fn open_brace(&mut self) {
        self.write(" {");
        self.newline();
        self.indent += 1;
    }

    /// Dedent and write `}` without ending the line
    pub fn close_brace(&mut self) {
        if self.indent == 0 {
            panic!("BUG: unbalanced braces in Java writer");
        }
        self.indent -= 1;
        self.write("}");
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        if self.indent > 0 {
            self.indent -= 1;
        }
    }

    pub fn into_inner(self) -> String {
        self.out
    }

    /// Write items separated by a separator string.
    pub fn sep<I, T>(&mut self, separator: &str, items: I)
    where
        I: IntoIterator<Item = T>,
        T: Display,
    {
        self.sep_with(separator, items, |w, item| w.write(&item.to_string()));
    }

    /// Write items with a separator, using a custom render function for each item.
    pub fn sep_with<I, T, F>(&mut self, separator: &str, items: I, mut render: F)
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&mut Self, T),
    {
        let mut first = true;
        for item in items {
            if !first {
                self.write(separator);
            }
            first = false;
            render(self, item);
        }
    }
}

/// Render to a string using a fresh writer.
pub fn render_to_string<F>(f: F) -> String
where
    F: FnOnce(&mut JavaWriter),
{
    let mut writer = JavaWriter::new();
    f(&mut writer);
    writer.into_inner()
}
