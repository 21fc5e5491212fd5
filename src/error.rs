//! The error taxonomy shared by every compilation stage.
//!
//! Every stage stops at its first error and hands it back to the caller as a
//! [`CompileError`]. Rendering (colours, the highlighted source line, and the
//! compiler backtrace when the `error-backtrace` feature is on) happens only
//! at the edge in [`CompileError::render`].

use colored::Colorize;

use crate::frontend::{SourceFile, lexer::Location};

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum CompileErrorKind {
    /// No token pattern matches the input
    Lex,
    /// Unexpected or missing token
    Parse,
    /// Redeclaration in the same frame or lookup of an undeclared name
    Scope,
    /// Operand, branch, or declaration type mismatch
    Type,
    /// Unsupported construct or loop control outside of a loop
    Ir,
    /// Unsupported instruction or a variable missing from the slot map
    Codegen,
    /// Failure while interpreting IR (division by zero, bad input, ...)
    Runtime,
    /// The external assembler or linker failed
    Build,
}

#[derive(Debug, Clone)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub location: Option<Location>,
    pub message: String,
    /// Position in the compiler which raised the error
    pub origin: Option<&'static str>,
}

/// Builds a [`CompileError`] of the given kind, recording where in the
/// compiler it was raised when the `error-backtrace` feature is enabled.
///
/// ```ignore
/// return Err(error_at!(Type, expression.location, "expected {expected}"));
/// ```
macro_rules! error_at {
    ($kind:ident, $location:expr, $($arg:tt)+) => {{
        let error = $crate::error::CompileError::new(
            $crate::error::CompileErrorKind::$kind,
            $location,
            format!($($arg)+),
        );

        #[cfg(feature = "error-backtrace")]
        let error = error.with_origin(concat!(
            module_path!(),
            " (at ",
            file!(),
            ":",
            line!(),
            ")"
        ));

        error
    }};
}

pub(crate) use error_at;

impl CompileError {
    pub fn new(
        kind: CompileErrorKind,
        location: impl Into<Option<Location>>,
        message: String,
    ) -> Self {
        Self {
            kind,
            location: location.into(),
            message,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: &'static str) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Formats the error for a terminal, including the offending source line
    pub fn render(&self, source_file: &SourceFile) -> String {
        let mut output = format!(
            "{}: {}",
            format!("error[{}]", self.kind).red().bold(),
            self.message
        );

        match self.location {
            Some(location) => {
                output.push_str(&format!(
                    " {}",
                    format!("(at {})", source_file.format_location(location)).white()
                ));

                if let Some(highlight) = source_file.highlight_location(location) {
                    output.push('\n');
                    output.push_str(&highlight);
                }
            }
            None => {
                output.push_str(&format!(" {}", format!("(in {})", source_file.origin).white()));
            }
        }

        if let Some(origin) = self.origin {
            output.push_str(&format!("\n{}: {}", "backtrace".blue(), origin));
        }

        output
    }
}

impl core::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)?;

        if let Some(location) = self.location {
            write!(f, " (at line {}, column {})", location.line, location.column)?;
        }

        Ok(())
    }
}

impl std::error::Error for CompileError {}
