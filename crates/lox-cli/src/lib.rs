//! lox-cli: bibliothèque interne du binaire `clox`
//!
//! But : garder `main.rs` réduit au parsing d'arguments et offrir ici une API
//! **testable** pour les modes d'exécution.
//!
//! Points clés :
//! - `Session` : une VM (+ assembleur) réutilisée pour un fichier ou tout un REPL
//! - Codes de sortie sysexits : 65 (compilation), 70 (exécution), 74 (E/S)
//! - Outils : `dump_tokens` (flux du scanner), `disasm_source` (désassemblage)
//! - Traces (`feature = "trace"`) et couleurs (`feature = "color"`) optionnelles

#![deny(unused_must_use)]
#![forbid(unsafe_code)]

use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use lox_compiler::{AsmOptions, Assembler};
use lox_core::{disasm::disassemble_chunk, helpers::validate_chunk, CompileError, Compiler};
use lox_lexer::{Scanner, TokenKind};
use lox_vm::{Captured, InterpretError, Vm, VmConfig};
use rustyline::{error::ReadlineError, DefaultEditor};

#[cfg(feature = "color")]
use owo_colors::OwoColorize;

// ───────────────────────────── Codes de sortie ─────────────────────────────

/// Succès.
pub const EX_OK: u8 = 0;
/// Source rejetée par le compilateur.
pub const EX_DATAERR: u8 = 65;
/// Erreur pendant l'exécution.
pub const EX_SOFTWARE: u8 = 70;
/// Lecture/écriture impossible.
pub const EX_IOERR: u8 = 74;

/// Code de sortie associé à une issue d'`interpret`.
pub const fn exit_code(err: &InterpretError) -> u8 {
    match err {
        InterpretError::Compile(_) => EX_DATAERR,
        InterpretError::Runtime(_) => EX_SOFTWARE,
    }
}

// ───────────────────────────── Initialisation ─────────────────────────────

/// Initialise le logger selon la feature `trace`.
pub fn init_logger() {
    #[cfg(feature = "trace")]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
            .format_timestamp_secs()
            .try_init();
    }
}

// ───────────────────────────── Session ─────────────────────────────

/// Ce que le REPL doit faire après une ligne.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplStep {
    /// Lire la ligne suivante.
    Continue,
    /// Quitter la boucle.
    Quit,
}

/// VM + assembleur partagés par toutes les exécutions d'un processus.
pub struct Session {
    vm: Vm<Assembler>,
}

impl Session {
    /// Session écrivant sur stdout.
    pub fn new(config: VmConfig, asm: AsmOptions) -> Self {
        Self { vm: Vm::new(Assembler::new(asm)).with_config(config) }
    }

    /// Variante utile pour tests : sortie de la VM capturée.
    pub fn captured(config: VmConfig) -> (Self, Captured) {
        let (vm, cap) = Vm::with_captured_stdout(Assembler::default());
        (Self { vm: vm.with_config(config) }, cap)
    }

    /// Interprète `source`, rapporte l'erreur éventuelle sur stderr et rend le code de sortie.
    pub fn run_source(&mut self, source: &str) -> u8 {
        match self.vm.interpret(source) {
            Ok(value) => {
                log::debug!("result: {value}");
                EX_OK
            }
            Err(err) => {
                report(&err);
                exit_code(&err)
            }
        }
    }

    /// Lit puis interprète un fichier. Les échecs de lecture remontent en `Err`.
    pub fn run_file(&mut self, path: &Path) -> Result<u8> {
        let source = read_source(path)?;
        Ok(self.run_source(&source))
    }

    /// Traite une ligne du REPL.
    pub fn repl_line(&mut self, line: &str) -> ReplStep {
        match line.trim() {
            "" => ReplStep::Continue,
            ":q" | ":quit" => ReplStep::Quit,
            src => {
                self.run_source(src);
                ReplStep::Continue
            }
        }
    }

    /// Boucle interactive avec édition de ligne et historique persistant.
    pub fn repl(&mut self) -> Result<u8> {
        let mut rl = DefaultEditor::new().context("initialisation de l'éditeur de ligne")?;
        let history = history_path();
        if let Some(path) = &history {
            if rl.load_history(path).is_err() {
                log::debug!("pas d'historique dans {}", display(path));
            }
        }

        status_info("clox", &format!("{} (:q pour quitter)", env!("CARGO_PKG_VERSION")));
        loop {
            match rl.readline("> ") {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = rl.add_history_entry(line.as_str());
                    }
                    if self.repl_line(&line) == ReplStep::Quit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e).context("lecture de la ligne"),
            }
        }
        println!("Goodbye.");

        if let Some(path) = &history {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).with_context(|| format!("création de {}", display(parent)))?;
            }
            rl.save_history(path).with_context(|| format!("écriture de {}", display(path)))?;
        }
        Ok(EX_OK)
    }
}

/// Emplacement de l'historique du REPL (`<data_dir>/clox/history.txt`).
pub fn history_path() -> Option<PathBuf> { dirs::data_dir().map(|d| d.join("clox").join("history.txt")) }

// ───────────────────────────── Outils ─────────────────────────────

/// Une ligne par jeton : ligne (ou `   |` si inchangée), genre, lexème.
pub fn dump_tokens(source: &str) -> String {
    let mut out = String::new();
    let mut line = 0;
    for tok in Scanner::new(source) {
        if tok.line == line {
            out.push_str("   | ");
        } else {
            let _ = write!(out, "{:4} ", tok.line);
            line = tok.line;
        }
        let _ = write!(out, "{:<14} '{}'", tok.kind.name(), tok.lexeme);
        if let TokenKind::Error(kind) = tok.kind {
            let _ = write!(out, " {kind}");
        }
        out.push('\n');
    }
    out
}

/// Assemble `source` puis rend son désassemblage sous l'en-tête `name`.
pub fn disasm_source(source: &str, name: &str) -> Result<String, CompileError> {
    let mut chunk = lox_core::Chunk::new();
    Assembler::default().compile(source, &mut chunk)?;
    if let Err(e) = validate_chunk(&chunk) {
        log::warn!("chunk invalide: {e}");
    }
    Ok(disassemble_chunk(&chunk, name))
}

/// Sous-commande `disasm <file>`.
pub fn disasm_file(path: &Path) -> Result<u8> {
    let source = read_source(path)?;
    match disasm_source(&source, &display(path)) {
        Ok(text) => {
            print!("{text}");
            status_ok("DISASM", "ok");
            Ok(EX_OK)
        }
        Err(err) => {
            report(&InterpretError::Compile(err));
            Ok(EX_DATAERR)
        }
    }
}

/// Sous-commande `tokens <file>`.
pub fn tokens_file(path: &Path) -> Result<u8> {
    let source = read_source(path)?;
    print!("{}", dump_tokens(&source));
    Ok(EX_OK)
}

// ───────────────────────────── Utilitaires E/S ─────────────────────────────

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("lecture de {}", display(path)))
}

fn display(p: &Path) -> String { p.to_string_lossy().to_string() }

// ───────────────────────────── Sorties jolies ─────────────────────────────

/// Écrit l'erreur sur stderr (une ligne par diagnostic).
pub fn report(err: &InterpretError) {
    let tag = match err {
        InterpretError::Compile(_) => "compile error",
        InterpretError::Runtime(_) => "runtime error",
    };
    log::debug!("{tag}");
    eprintln!("{err}");
}

fn status_ok(tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        eprintln!("{} {}", tag.green().bold(), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("{tag} {msg}");
    }
}

fn status_info(tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        eprintln!("{} {}", tag.blue().bold(), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("{tag} {msg}");
    }
}

// ───────────────────────────── Tests ─────────────────────────────
