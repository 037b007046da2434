//! lox-lexer: analyse lexicale paresseuse pour Lox
//!
//! Faits saillants :
//! - `Scanner` : curseur explicite (start/current/line) sur un `&str` immuable,
//!   aucune globale ; plusieurs scanners peuvent coexister
//! - `Token` : genre + lexème emprunté à la source + offset + ligne de début
//! - Erreurs lexicales rendues comme jetons `TokenKind::Error`, jamais de panique
//!
//! Exemple éclair :
//! ```
//! use lox_lexer::{Scanner, TokenKind};
//!
//! let kinds: Vec<_> = Scanner::new("1 + 2").map(|t| t.kind).collect();
//! assert_eq!(
//!     kinds,
//!     [TokenKind::Number, TokenKind::Plus, TokenKind::Number, TokenKind::Eof]
//! );
//! ```

#![deny(missing_docs)]

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ─────────────────────────── Tokens ─────────────────────────── */

/// Genre de jeton lexical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TokenKind {
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `;`
    Semicolon,
    /// `/`
    Slash,
    /// `*`
    Star,
    /// `!`
    Bang,
    /// `!=`
    BangEqual,
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// Identifiant.
    Identifier,
    /// Littéral chaîne, guillemets compris dans le lexème.
    String,
    /// Littéral numérique.
    Number,
    /// `and`
    And,
    /// `class`
    Class,
    /// `else`
    Else,
    /// `false`
    False,
    /// `for`
    For,
    /// `fun`
    Fun,
    /// `if`
    If,
    /// `nil`
    Nil,
    /// `or`
    Or,
    /// `print`
    Print,
    /// `return`
    Return,
    /// `super`
    Super,
    /// `this`
    This,
    /// `true`
    True,
    /// `var`
    Var,
    /// `while`
    While,
    /// Erreur lexicale ; le lexème couvre la portion fautive.
    Error(LexErrorKind),
    /// Fin d'entrée.
    Eof,
}

impl TokenKind {
    /// Nom stable, en majuscules, utilisé par les dumps de jetons.
    pub const fn name(self) -> &'static str {
        use TokenKind::*;
        match self {
            LeftParen => "LEFT_PAREN",
            RightParen => "RIGHT_PAREN",
            LeftBrace => "LEFT_BRACE",
            RightBrace => "RIGHT_BRACE",
            Comma => "COMMA",
            Dot => "DOT",
            Minus => "MINUS",
            Plus => "PLUS",
            Semicolon => "SEMICOLON",
            Slash => "SLASH",
            Star => "STAR",
            Bang => "BANG",
            BangEqual => "BANG_EQUAL",
            Equal => "EQUAL",
            EqualEqual => "EQUAL_EQUAL",
            Greater => "GREATER",
            GreaterEqual => "GREATER_EQUAL",
            Less => "LESS",
            LessEqual => "LESS_EQUAL",
            Identifier => "IDENTIFIER",
            String => "STRING",
            Number => "NUMBER",
            And => "AND",
            Class => "CLASS",
            Else => "ELSE",
            False => "FALSE",
            For => "FOR",
            Fun => "FUN",
            If => "IF",
            Nil => "NIL",
            Or => "OR",
            Print => "PRINT",
            Return => "RETURN",
            Super => "SUPER",
            This => "THIS",
            True => "TRUE",
            Var => "VAR",
            While => "WHILE",
            Error(_) => "ERROR",
            Eof => "EOF",
        }
    }

    /// Vrai pour les mots-clés réservés.
    pub const fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            And | Class | Else | False | For | Fun | If | Nil | Or | Print | Return | Super | This
                | True | Var | While
        )
    }

    /// Vrai pour un jeton d'erreur lexicale.
    pub const fn is_error(self) -> bool { matches!(self, TokenKind::Error(_)) }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// Jeton : genre, lexème (tranche de la source), offset et ligne de début.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    /// Genre du jeton.
    pub kind: TokenKind,
    /// Texte source exact du jeton (vide pour `Eof`).
    pub lexeme: &'src str,
    /// Offset en octets du début du lexème.
    pub offset: usize,
    /// Ligne (1-based) où le lexème commence.
    pub line: u32,
}

impl Token<'_> {
    /// Longueur du lexème en octets.
    pub const fn len(&self) -> usize { self.lexeme.len() }

    /// Vrai si le lexème est vide (seul `Eof` l'est).
    pub const fn is_empty(&self) -> bool { self.lexeme.is_empty() }

    /// Message de l'erreur lexicale portée par ce jeton, le cas échéant.
    pub const fn error_message(&self) -> Option<&'static str> {
        match self.kind {
            TokenKind::Error(kind) => Some(kind.message()),
            _ => None,
        }
    }
}

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Genre d'erreur lexicale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LexErrorKind {
    /// Fin d'entrée avant le `"` fermant.
    UnterminatedString,
    /// Caractère hors de l'alphabet du langage.
    UnexpectedChar(char),
}

impl LexErrorKind {
    /// Message affiché dans les diagnostics.
    pub const fn message(self) -> &'static str {
        match self {
            LexErrorKind::UnterminatedString => "Unterminated string",
            LexErrorKind::UnexpectedChar(_) => "Unexpected character",
        }
    }
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.message()) }
}

/* ─────────────────────────── Scanner ─────────────────────────── */

/// Analyseur lexical : produit un jeton par appel à [`Scanner::scan_token`].
///
/// Une fois la fin atteinte, chaque appel suivant rend encore `Eof`.
/// Comme [`Iterator`], il s'arrête juste après le premier `Eof`.
#[derive(Debug, Clone)]
pub struct Scanner<'src> {
    src: &'src str,
    bytes: &'src [u8],
    /// Début du lexème en cours.
    start: usize,
    /// Prochain octet non lu.
    current: usize,
    line: u32,
    /// Ligne au début du lexème en cours.
    start_line: u32,
    done: bool,
}

impl<'src> Scanner<'src> {
    /// Lie un scanner à `src`, curseur au début, ligne 1.
    pub const fn new(src: &'src str) -> Self {
        Self { src, bytes: src.as_bytes(), start: 0, current: 0, line: 1, start_line: 1, done: false }
    }

    /// Source analysée.
    pub const fn source(&self) -> &'src str { self.src }

    /// Ligne courante du curseur.
    pub const fn line(&self) -> u32 { self.line }

    /// Prochain jeton.
    pub fn scan_token(&mut self) -> Token<'src> {
        self.skip_whitespace();
        self.start = self.current;
        self.start_line = self.line;

        let Some(c) = self.advance() else {
            return self.make(TokenKind::Eof);
        };

        let tok = match c {
            b'0'..=b'9' => self.number(),
            c if is_alpha(c) => self.identifier(),
            b'"' => self.string(),
            b'(' => self.make(TokenKind::LeftParen),
            b')' => self.make(TokenKind::RightParen),
            b'{' => self.make(TokenKind::LeftBrace),
            b'}' => self.make(TokenKind::RightBrace),
            b',' => self.make(TokenKind::Comma),
            b'.' => self.make(TokenKind::Dot),
            b'-' => self.make(TokenKind::Minus),
            b'+' => self.make(TokenKind::Plus),
            b';' => self.make(TokenKind::Semicolon),
            b'/' => self.make(TokenKind::Slash),
            b'*' => self.make(TokenKind::Star),
            b'!' => self.pair(b'=', TokenKind::BangEqual, TokenKind::Bang),
            b'=' => self.pair(b'=', TokenKind::EqualEqual, TokenKind::Equal),
            b'<' => self.pair(b'=', TokenKind::LessEqual, TokenKind::Less),
            b'>' => self.pair(b'=', TokenKind::GreaterEqual, TokenKind::Greater),
            _ => self.unexpected(),
        };

        #[cfg(feature = "trace")]
        log::trace!("token {} {:?} line {}", tok.kind, tok.lexeme, tok.line);

        tok
    }

    /* ────────── Primitives internes ────────── */

    #[inline] fn is_at_end(&self) -> bool { self.current >= self.bytes.len() }
    #[inline] fn peek(&self) -> Option<u8> { self.bytes.get(self.current).copied() }
    #[inline] fn peek_next(&self) -> Option<u8> { self.bytes.get(self.current + 1).copied() }

    #[inline]
    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.current += 1;
        Some(b)
    }

    #[inline]
    fn matches(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn make(&self, kind: TokenKind) -> Token<'src> {
        Token { kind, lexeme: &self.src[self.start..self.current], offset: self.start, line: self.start_line }
    }

    fn pair(&mut self, second: u8, both: TokenKind, single: TokenKind) -> Token<'src> {
        let kind = if self.matches(second) { both } else { single };
        self.make(kind)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                b' ' | b'\r' | b'\t' => self.current += 1,
                b'\n' => {
                    self.line += 1;
                    self.current += 1;
                }
                b'/' if self.peek_next() == Some(b'/') => {
                    while self.peek().is_some_and(|b| b != b'\n') {
                        self.current += 1;
                    }
                }
                _ => return,
            }
        }
    }

    fn number(&mut self) -> Token<'src> {
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.current += 1;
        }
        if self.peek() == Some(b'.') && self.peek_next().is_some_and(|b| b.is_ascii_digit()) {
            self.current += 1;
            while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.current += 1;
            }
        }
        self.make(TokenKind::Number)
    }

    fn identifier(&mut self) -> Token<'src> {
        while self.peek().is_some_and(|b| is_alpha(b) || b.is_ascii_digit()) {
            self.current += 1;
        }
        let kind = keyword(&self.src[self.start..self.current]).unwrap_or(TokenKind::Identifier);
        self.make(kind)
    }

    fn string(&mut self) -> Token<'src> {
        while let Some(c) = self.peek() {
            if c == b'"' {
                break;
            }
            if c == b'\n' {
                self.line += 1;
            }
            self.current += 1;
        }
        if self.is_at_end() {
            return self.make(TokenKind::Error(LexErrorKind::UnterminatedString));
        }
        self.current += 1;
        self.make(TokenKind::String)
    }

    /// Consomme le caractère complet (UTF-8) commencé en `start`.
    fn unexpected(&mut self) -> Token<'src> {
        let ch = self.src[self.start..].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
        self.current = self.start + ch.len_utf8();
        self.make(TokenKind::Error(LexErrorKind::UnexpectedChar(ch)))
    }
}

impl<'src> Iterator for Scanner<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let tok = self.scan_token();
        self.done = tok.kind == TokenKind::Eof;
        Some(tok)
    }
}

impl core::iter::FusedIterator for Scanner<'_> {}

/* ─────────────────────────── Helpers ─────────────────────────── */

#[inline]
const fn is_alpha(c: u8) -> bool { c == b'_' || c.is_ascii_alphabetic() }

fn keyword(s: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match s {
        "and" => And,
        "class" => Class,
        "else" => Else,
        "false" => False,
        "for" => For,
        "fun" => Fun,
        "if" => If,
        "nil" => Nil,
        "or" => Or,
        "print" => Print,
        "return" => Return,
        "super" => Super,
        "this" => This,
        "true" => True,
        "var" => Var,
        "while" => While,
        _ => return None,
    })
}

/* ─────────────────────────── Tests ─────────────────────────── */

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn kinds(src: &str) -> Vec<TokenKind> { Scanner::new(src).map(|t| t.kind).collect() }

    #[test]
    fn empty_source_is_just_eof() {
        let toks: Vec<_> = Scanner::new("").collect();
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::Eof);
        assert_eq!(toks[0].line, 1);
        assert!(toks[0].is_empty());
    }

    #[test]
    fn numbers_and_plus() {
        let toks: Vec<_> = Scanner::new("123 + 45.6").collect();
        assert_eq!(toks.len(), 4);
        assert_eq!((toks[0].kind, toks[0].lexeme, toks[0].offset), (TokenKind::Number, "123", 0));
        assert_eq!(toks[1].kind, TokenKind::Plus);
        assert_eq!((toks[2].kind, toks[2].lexeme, toks[2].offset), (TokenKind::Number, "45.6", 6));
        assert_eq!(toks[3].kind, TokenKind::Eof);
    }

    #[test]
    fn number_edges() {
        // pas de point final ni de point initial
        assert_eq!(kinds("1."), [TokenKind::Number, TokenKind::Dot, TokenKind::Eof]);
        assert_eq!(kinds(".5"), [TokenKind::Dot, TokenKind::Number, TokenKind::Eof]);
        let toks: Vec<_> = Scanner::new("1.2.3").collect();
        assert_eq!(toks[0].lexeme, "1.2");
        assert_eq!(toks[1].kind, TokenKind::Dot);
        assert_eq!(toks[2].lexeme, "3");
    }

    #[test]
    fn keywords_need_exact_match() {
        assert_eq!(kinds("while"), [TokenKind::While, TokenKind::Eof]);
        assert_eq!(kinds("whilex"), [TokenKind::Identifier, TokenKind::Eof]);
        assert_eq!(kinds("an"), [TokenKind::Identifier, TokenKind::Eof]);
        assert_eq!(kinds("_fun1 fun"), [TokenKind::Identifier, TokenKind::Fun, TokenKind::Eof]);
        for kw in ["and", "class", "else", "false", "for", "fun", "if", "nil", "or", "print", "return", "super", "this", "true", "var", "while"] {
            let tok = Scanner::new(kw).scan_token();
            assert!(tok.kind.is_keyword(), "{kw}");
            assert_eq!(tok.kind.name().to_ascii_lowercase(), kw);
        }
    }

    #[test]
    fn operators_prefer_two_chars() {
        assert_eq!(
            kinds("!= ! == = <= < >= >"),
            [
                TokenKind::BangEqual,
                TokenKind::Bang,
                TokenKind::EqualEqual,
                TokenKind::Equal,
                TokenKind::LessEqual,
                TokenKind::Less,
                TokenKind::GreaterEqual,
                TokenKind::Greater,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("(){},.-+;/*"),
            [
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Minus,
                TokenKind::Plus,
                TokenKind::Semicolon,
                TokenKind::Slash,
                TokenKind::Star,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error_token() {
        let mut sc = Scanner::new("\"abc");
        let tok = sc.scan_token();
        assert_eq!(tok.kind, TokenKind::Error(LexErrorKind::UnterminatedString));
        assert_eq!(tok.error_message(), Some("Unterminated string"));
        assert_eq!(tok.lexeme, "\"abc");
        assert_eq!(sc.scan_token().kind, TokenKind::Eof);
    }

    #[test]
    fn unexpected_character_keeps_scanning() {
        let toks: Vec<_> = Scanner::new("1 @ é 2").collect();
        assert_eq!(toks[1].kind, TokenKind::Error(LexErrorKind::UnexpectedChar('@')));
        assert_eq!(toks[1].error_message(), Some("Unexpected character"));
        assert_eq!(toks[2].kind, TokenKind::Error(LexErrorKind::UnexpectedChar('é')));
        assert_eq!(toks[2].lexeme, "é");
        assert_eq!(toks[3].lexeme, "2");
    }

    #[test]
    fn comments_and_lines() {
        let toks: Vec<_> = Scanner::new("// head\n  1 // tail\n// only\n\n2 / 3").collect();
        let seen: Vec<_> = toks.iter().map(|t| (t.kind, t.line)).collect();
        assert_eq!(
            seen,
            [
                (TokenKind::Number, 2),
                (TokenKind::Number, 5),
                (TokenKind::Slash, 5),
                (TokenKind::Number, 5),
                (TokenKind::Eof, 5),
            ]
        );
    }

    #[test]
    fn multiline_string_reports_start_line() {
        let toks: Vec<_> = Scanner::new("\"a\nb\" x").collect();
        assert_eq!((toks[0].kind, toks[0].line), (TokenKind::String, 1));
        assert_eq!(toks[0].lexeme, "\"a\nb\"");
        assert_eq!((toks[1].kind, toks[1].line), (TokenKind::Identifier, 2));
    }

    #[test]
    fn eof_repeats_after_end() {
        let mut sc = Scanner::new("x");
        assert_eq!(sc.scan_token().kind, TokenKind::Identifier);
        for _ in 0..3 {
            assert_eq!(sc.scan_token().kind, TokenKind::Eof);
        }
        let mut it = Scanner::new("");
        assert!(it.next().is_some());
        assert!(it.next().is_none());
    }

    #[test]
    fn independent_scanners_do_not_share_state() {
        let mut a = Scanner::new("1\n2");
        let mut b = Scanner::new("x");
        assert_eq!(a.scan_token().lexeme, "1");
        assert_eq!(b.scan_token().lexeme, "x");
        let second = a.scan_token();
        assert_eq!((second.lexeme, second.line), ("2", 2));
    }

    proptest! {
        #[test]
        fn lexemes_match_source_spans(src in "[ -~\n]{0,80}") {
            let mut count = 0usize;
            for tok in Scanner::new(&src) {
                prop_assert_eq!(&src[tok.offset..tok.offset + tok.len()], tok.lexeme);
                count += 1;
            }
            prop_assert!(count >= 1);
        }
    }
}
