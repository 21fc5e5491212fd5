use std::path::PathBuf;

use colored::Colorize;

use self::lexer::Location;

pub mod ast;
pub mod intern;
pub mod lexer;
pub mod parser;

#[derive(Debug)]
pub struct SourceFile {
    pub contents: String,
    pub origin: SourceFileOrigin,
}

impl SourceFile {
    pub fn from_memory(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            origin: SourceFileOrigin::Memory,
        }
    }

    /// Returns the text of a 1-based line number (without the line break)
    pub fn line(&self, line_number: usize) -> Option<&str> {
        self.contents.lines().nth(line_number.checked_sub(1)?)
    }

    pub fn format_location(&self, location: Location) -> String {
        format!("{}:{}:{}", self.origin, location.line, location.column)
    }

    /// Renders the source line containing `location` with a caret under the
    /// offending column
    pub fn highlight_location(&self, location: Location) -> Option<String> {
        let line = self.line(location.line)?;
        let gutter = location.line.to_string();

        let marker = format!(
            "{}{}",
            " ".repeat(location.column.saturating_sub(1)),
            "^".red().bold()
        );

        Some(format!(
            "{} {} {line}\n{} {} {marker}",
            gutter.blue(),
            "|".blue(),
            " ".repeat(gutter.len()),
            "|".blue(),
        ))
    }
}

#[derive(Debug)]
pub enum SourceFileOrigin {
    Memory,
    Stdin,
    File(PathBuf),
}

impl core::fmt::Display for SourceFileOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFileOrigin::Memory => f.write_str("<memory>"),
            SourceFileOrigin::Stdin => f.write_str("<stdin>"),
            SourceFileOrigin::File(path) => f.write_fmt(format_args!("{}", path.display())),
        }
    }
}
