//! Compiler boundary: whatever turns source text into a [`Chunk`] plugs in
//! here, and reports failures as a list of line-tagged diagnostics.

use core::fmt;

use crate::bytecode::Chunk;

/// Where in the source a diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// No lexeme to show (lexical errors carry their own message).
    None,
    /// The error was detected at end of input.
    End,
    /// The error was detected at this lexeme.
    Lexeme(String),
}

/// One compile diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Source line the error was detected on.
    pub line: u32,
    /// Offending position.
    pub location: Location,
    /// Human readable message.
    pub message: String,
}

impl Diagnostic {
    /// Build a diagnostic.
    pub fn new(line: u32, location: Location, message: impl Into<String>) -> Self {
        Self { line, location, message: message.into() }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error", self.line)?;
        match &self.location {
            Location::None => {}
            Location::End => f.write_str(" at end")?,
            Location::Lexeme(lexeme) => write!(f, " at '{lexeme}'")?,
        }
        write!(f, ": {}", self.message)
    }
}

/// Compilation failed; carries every diagnostic that was collected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileError {
    diagnostics: Vec<Diagnostic>,
}

impl CompileError {
    /// Empty error, ready to collect diagnostics.
    pub const fn new() -> Self { Self { diagnostics: Vec::new() } }
    /// Record one more diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) { self.diagnostics.push(diagnostic); }
    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool { self.diagnostics.is_empty() }
    /// Number of diagnostics.
    pub fn len(&self) -> usize { self.diagnostics.len() }
    /// Diagnostics in the order they were reported.
    pub fn diagnostics(&self) -> &[Diagnostic] { &self.diagnostics }
}

impl From<Diagnostic> for CompileError {
    fn from(diagnostic: Diagnostic) -> Self { Self { diagnostics: vec![diagnostic] } }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diag) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{diag}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

/// Produces bytecode from source text.
///
/// On success the chunk holds the emitted code. On failure its contents are
/// unspecified and the caller must not execute it.
pub trait Compiler {
    /// Compile `source` into `chunk`.
    fn compile(&mut self, source: &str, chunk: &mut Chunk) -> Result<(), CompileError>;
}

impl<F> Compiler for F
where
    F: FnMut(&str, &mut Chunk) -> Result<(), CompileError>,
{
    fn compile(&mut self, source: &str, chunk: &mut Chunk) -> Result<(), CompileError> { self(source, chunk) }
}
