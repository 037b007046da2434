//! lox-compiler: assembleur de bytecode Lox
//!
//! - Entrée : texte source, lu jeton par jeton via `lox_lexer::Scanner`
//! - Sortie : un `lox_core::Chunk` rempli par `write`/`add_constant`
//! - Diagnostics : tous collectés (mode panique + resynchronisation)
//!
//! Syntaxe acceptée, une instruction plate après l'autre :
//! ```text
//! constant 1.2      // OP_CONSTANT, opérande optionnellement négatif
//! const -3; add     // `;` facultatif entre instructions
//! OP_NEGATE
//! return
//! ```
//!
//! API principale :
//! ```
//! use lox_compiler::assemble;
//!
//! let chunk = assemble("const 2; const 3; add").unwrap();
//! assert_eq!(chunk.constants().len(), 2);
//! ```

#![deny(missing_docs)]

use lox_core::{Chunk, CompileError, Compiler, Diagnostic, Location, OpCode, Value};
use lox_lexer::{Scanner, Token, TokenKind};
use tracing::debug;

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Options de l'assembleur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsmOptions {
    /// Ajouter `OP_RETURN` si le programme ne finit pas déjà par un retour
    pub implicit_return: bool,
}

impl Default for AsmOptions {
    fn default() -> Self { Self { implicit_return: true } }
}

impl AsmOptions {
    /// Active/désactive le retour implicite.
    #[must_use]
    pub const fn with_implicit_return(mut self, on: bool) -> Self {
        self.implicit_return = on;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Assembleur
// ─────────────────────────────────────────────────────────────────────────────

/// Producteur de bytecode par défaut de l'hôte.
#[derive(Debug, Clone, Copy, Default)]
pub struct Assembler {
    opts: AsmOptions,
}

impl Assembler {
    /// Nouvel assembleur
    pub const fn new(opts: AsmOptions) -> Self { Self { opts } }

    /// Options courantes
    pub const fn options(&self) -> AsmOptions { self.opts }
}

impl Compiler for Assembler {
    fn compile(&mut self, source: &str, chunk: &mut Chunk) -> Result<(), CompileError> {
        let mut parser = Parser::new(source, chunk);
        parser.program(self.opts);
        parser.finish()
    }
}

/// Assemble `source` dans un chunk neuf avec les options par défaut.
pub fn assemble(source: &str) -> Result<Chunk, CompileError> {
    let mut chunk = Chunk::new();
    Assembler::default().compile(source, &mut chunk)?;
    Ok(chunk)
}

// ─────────────────────────────────────────────────────────────────────────────
// Mnémoniques
// ─────────────────────────────────────────────────────────────────────────────

/// Résout un mnémonique (insensible à la casse, préfixe `OP_` facultatif).
pub fn mnemonic(word: &str) -> Option<OpCode> {
    let lower = word.to_ascii_lowercase();
    let bare = lower.strip_prefix("op_").unwrap_or(&lower);
    Some(match bare {
        "constant" | "const" => OpCode::Constant,
        "negate" | "neg" => OpCode::Negate,
        "add" => OpCode::Add,
        "subtract" | "sub" => OpCode::Subtract,
        "multiply" | "mul" => OpCode::Multiply,
        "divide" | "div" => OpCode::Divide,
        "return" | "ret" => OpCode::Return,
        _ => return None,
    })
}

/// Les mots-clés du langage (`return`, …) sont scannés à part des identifiants.
fn is_word(kind: TokenKind) -> bool { kind == TokenKind::Identifier || kind.is_keyword() }

// ─────────────────────────────────────────────────────────────────────────────
// Parser
// ─────────────────────────────────────────────────────────────────────────────

struct Parser<'src, 'c> {
    scanner: Scanner<'src>,
    chunk: &'c mut Chunk,
    current: Token<'src>,
    previous: Token<'src>,
    errors: CompileError,
    panic_mode: bool,
    last_op: Option<OpCode>,
}

impl<'src, 'c> Parser<'src, 'c> {
    fn new(source: &'src str, chunk: &'c mut Chunk) -> Self {
        let placeholder = Token { kind: TokenKind::Eof, lexeme: "", offset: 0, line: 1 };
        let mut parser = Self {
            scanner: Scanner::new(source),
            chunk,
            current: placeholder,
            previous: placeholder,
            errors: CompileError::new(),
            panic_mode: false,
            last_op: None,
        };
        parser.advance();
        parser
    }

    fn program(&mut self, opts: AsmOptions) {
        while self.current.kind != TokenKind::Eof {
            self.instruction();
            if self.panic_mode {
                self.synchronize();
            }
        }
        if opts.implicit_return && self.last_op != Some(OpCode::Return) {
            let line = self.previous.line;
            self.emit(OpCode::Return, line);
        }
    }

    fn finish(self) -> Result<(), CompileError> {
        if self.errors.is_empty() {
            debug!(bytes = self.chunk.len(), constants = self.chunk.constants().len(), "assembled chunk");
            Ok(())
        } else {
            debug!(errors = self.errors.len(), "assembly failed");
            Err(self.errors)
        }
    }

    /* ────────── Instructions ────────── */

    fn instruction(&mut self) {
        if self.matches(TokenKind::Semicolon) {
            return;
        }
        if !is_word(self.current.kind) {
            self.error_at_current("Expect mnemonic.");
            return;
        }
        self.advance();
        let word = self.previous;
        let Some(op) = mnemonic(word.lexeme) else {
            self.error_at_previous("Unknown mnemonic.");
            return;
        };

        match op {
            OpCode::Constant | OpCode::ConstantLong => self.constant(word.line),
            _ => self.emit(op, word.line),
        }
        self.matches(TokenKind::Semicolon);
    }

    fn constant(&mut self, line: u32) {
        let negative = self.matches(TokenKind::Minus);
        if !self.matches(TokenKind::Number) {
            self.error_at_current("Expect number after 'constant'.");
            return;
        }
        let Ok(n) = self.previous.lexeme.parse::<f64>() else {
            self.error_at_previous("Invalid number.");
            return;
        };
        let value = Value::Number(if negative { -n } else { n });
        match self.chunk.write_constant(value, line) {
            Ok(_) => self.last_op = Some(OpCode::Constant),
            Err(e) => self.error_at_previous(&e.to_string()),
        }
    }

    fn emit(&mut self, op: OpCode, line: u32) {
        self.chunk.write_op(op, line);
        self.last_op = Some(op);
    }

    /* ────────── Jetons ────────── */

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.scan_token();
            let TokenKind::Error(kind) = self.current.kind else { break };
            let line = self.current.line;
            self.report(Diagnostic::new(line, Location::None, kind.message()));
        }
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.current.kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Saute jusqu'au prochain mnémonique situé sur une ligne ultérieure.
    fn synchronize(&mut self) {
        let line = self.previous.line.max(self.error_line());
        while self.current.kind != TokenKind::Eof {
            if is_word(self.current.kind) && self.current.line > line {
                break;
            }
            self.advance();
        }
        self.panic_mode = false;
    }

    fn error_line(&self) -> u32 { self.errors.diagnostics().last().map_or(0, |d| d.line) }

    /* ────────── Diagnostics ────────── */

    fn error_at_current(&mut self, message: &str) {
        let tok = self.current;
        self.error_at(tok, message);
    }

    fn error_at_previous(&mut self, message: &str) {
        let tok = self.previous;
        self.error_at(tok, message);
    }

    fn error_at(&mut self, tok: Token<'src>, message: &str) {
        let location = match tok.kind {
            TokenKind::Eof => Location::End,
            _ => Location::Lexeme(tok.lexeme.to_owned()),
        };
        self.report(Diagnostic::new(tok.line, location, message));
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.errors.push(diagnostic);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn messages(src: &str) -> Vec<String> {
        assemble(src).unwrap_err().diagnostics().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn flat_program_encodes_in_order() {
        let chunk = assemble("constant 1.2\nconstant 3.4\nadd\nreturn").unwrap();
        assert_eq!(chunk.code(), &[0x01, 0x00, 0x01, 0x01, 0x03, 0x00]);
        assert_eq!(chunk.lines().as_slice(), &[1, 1, 2, 2, 3, 4]);
        assert_eq!(chunk.constants().as_slice(), &[Value::Number(1.2), Value::Number(3.4)]);
    }

    #[test]
    fn mnemonic_spellings() {
        for (word, op) in [
            ("OP_CONSTANT", OpCode::Constant),
            ("Const", OpCode::Constant),
            ("neg", OpCode::Negate),
            ("OP_NEGATE", OpCode::Negate),
            ("sub", OpCode::Subtract),
            ("MUL", OpCode::Multiply),
            ("div", OpCode::Divide),
            ("ret", OpCode::Return),
        ] {
            assert_eq!(mnemonic(word), Some(op), "{word}");
        }
        assert_eq!(mnemonic("jump"), None);
    }

    #[test]
    fn negative_operand_and_implicit_return() {
        let chunk = assemble("const -4; neg").unwrap();
        assert_eq!(chunk.constant(0), Some(Value::Number(-4.0)));
        assert_eq!(chunk.code(), &[0x01, 0x00, 0x02, 0x00]);
        assert_eq!(chunk.line_at(3), Some(1));
    }

    #[test]
    fn explicit_return_is_not_doubled() {
        let chunk = assemble("const 1\nreturn\n").unwrap();
        assert_eq!(chunk.code(), &[0x01, 0x00, 0x00]);
    }

    #[test]
    fn implicit_return_can_be_disabled() {
        let mut chunk = Chunk::new();
        let mut asm = Assembler::new(AsmOptions::default().with_implicit_return(false));
        asm.compile("const 1", &mut chunk).unwrap();
        assert_eq!(chunk.code(), &[0x01, 0x00]);
    }

    #[test]
    fn empty_source_is_a_lone_return() {
        let chunk = assemble("// nothing\n").unwrap();
        assert_eq!(chunk.code(), &[0x00]);
    }

    #[test]
    fn many_constants_switch_to_long_form() {
        let src: String = (0..300).map(|i| format!("const {i}\n")).collect();
        let chunk = assemble(&src).unwrap();
        let ins = chunk.instructions().map(Result::unwrap).nth(256).unwrap();
        assert_eq!(ins.op, OpCode::ConstantLong);
        assert_eq!(ins.constant, Some(Value::Number(256.0)));
        assert_eq!(ins.line, 257);
    }

    #[test]
    fn diagnostics_point_at_lexemes() {
        assert_eq!(messages("jump"), ["[line 1] Error at 'jump': Unknown mnemonic."]);
        assert_eq!(messages("const"), ["[line 1] Error at end: Expect number after 'constant'."]);
        assert_eq!(messages("const x"), ["[line 1] Error at 'x': Expect number after 'constant'."]);
        assert_eq!(messages("+"), ["[line 1] Error at '+': Expect mnemonic."]);
    }

    #[test]
    fn lexical_errors_have_no_location() {
        assert_eq!(messages("const 1\n\"abc"), ["[line 2] Error: Unterminated string"]);
        assert_eq!(messages("add @"), ["[line 1] Error: Unexpected character"]);
    }

    #[test]
    fn resynchronises_on_next_line() {
        let errs = messages("bogus 1 2\nadd\nconst\nfoo");
        assert_eq!(
            errs,
            [
                "[line 1] Error at 'bogus': Unknown mnemonic.",
                "[line 4] Error at 'foo': Expect number after 'constant'.",
            ]
        );
    }
}
