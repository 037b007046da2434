//! `clox`: hôte en ligne de commande de la VM Lox
//!
//! Ici on fait uniquement : parsing d'arguments, initialisation (logger,
//! couleur), et délégation à `lox_cli` (lib).

#![forbid(unsafe_code)]

use std::{ffi::OsString, path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::{builder::RangedU64ValueParser, error::ErrorKind, ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};

use lox_cli as cli;
use lox_compiler::AsmOptions;
use lox_vm::VmConfig;

// ──────────────────────────── CLI (clap) ────────────────────────────

/// Borne haute acceptée pour `--stack-max`.
const STACK_MAX_LIMIT: u64 = 1 << 20;

#[derive(Debug, Parser)]
#[command(
    name = "clox",
    version,
    about = "VM à bytecode Lox : exécuter, REPL, désassembler",
    long_about = None
)]
struct Opt {
    /// Augmente la verbosité (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux (casse la verbosité)
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue, global = true)]
    quiet: bool,

    /// Trace d'exécution (pile + instruction) sur stderr
    #[arg(long = "trace", global = true)]
    trace: bool,

    /// Capacité de la pile d'opérandes
    #[arg(
        long = "stack-max",
        default_value_t = lox_vm::STACK_MAX,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=STACK_MAX_LIMIT),
        global = true
    )]
    stack_max: usize,

    /// Force la couleur (si la feature `color` est compilée)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto, global = true)]
    color: ColorChoice,

    /// Script à exécuter (REPL si omis)
    script: Option<PathBuf>,

    /// Sous-commandes
    #[command(subcommand)]
    cmd: Option<Command>,
}

impl Opt {
    /// Parse, puis refuse un script positionnel combiné à une sous-commande.
    fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let opt = Self::try_parse_from(args)?;
        if opt.script.is_some() && opt.cmd.is_some() {
            return Err(Self::command()
                .error(ErrorKind::ArgumentConflict, "un script positionnel ne se combine pas avec une sous-commande"));
        }
        Ok(opt)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Exécuter un fichier source
    Run {
        /// Fichier source
        file: PathBuf,
    },
    /// Lancer le REPL
    Repl,
    /// Assembler un fichier et afficher son désassemblage
    Disasm {
        /// Fichier source
        file: PathBuf,
    },
    /// Afficher le flux de jetons du scanner
    Tokens {
        /// Fichier source
        file: PathBuf,
    },
}

// ──────────────────────────── Logger / Verbosité ────────────────────────────

fn init_telemetry(verbose: u8, quiet: bool) {
    #[cfg(feature = "trace")]
    {
        let level = if quiet {
            "error"
        } else {
            match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        };
        std::env::set_var("RUST_LOG", std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string()));
        cli::init_logger();
    }
    #[cfg(not(feature = "trace"))]
    let _ = (verbose, quiet);
}

fn init_color(choice: ColorChoice) {
    // `owo-colors` détecte seul le TTY ; on ne force que sur demande.
    match choice {
        ColorChoice::Auto => {}
        ColorChoice::Always => {
            std::env::set_var("CLICOLOR_FORCE", "1");
            std::env::remove_var("NO_COLOR");
        }
        ColorChoice::Never => {
            std::env::set_var("NO_COLOR", "1");
            std::env::remove_var("CLICOLOR_FORCE");
        }
    }
}

// ──────────────────────────── main ────────────────────────────

fn main() -> ExitCode {
    let opt = Opt::try_parse_args(std::env::args_os()).unwrap_or_else(|e| e.exit());

    init_color(opt.color);
    init_telemetry(opt.verbose, opt.quiet);

    match real_main(opt) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(cli::EX_IOERR)
        }
    }
}

fn real_main(opt: Opt) -> Result<u8> {
    let config = VmConfig::default().with_stack_max(opt.stack_max).with_trace(opt.trace);
    let mut session = cli::Session::new(config, AsmOptions::default());

    match (opt.cmd, opt.script) {
        (Some(Command::Run { file }), _) | (None, Some(file)) => session.run_file(&file),
        (Some(Command::Repl), _) | (None, None) => session.repl(),
        (Some(Command::Disasm { file }), _) => cli::disasm_file(&file),
        (Some(Command::Tokens { file }), _) => cli::tokens_file(&file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Opt, clap::Error> { Opt::try_parse_args(std::iter::once("clox").chain(args.iter().copied())) }

    #[test]
    fn global_flags_before_a_subcommand() {
        let opt = parse(&["--trace", "run", "f.lox"]).unwrap();
        assert!(opt.trace);
        assert!(matches!(opt.cmd, Some(Command::Run { ref file }) if file == &PathBuf::from("f.lox")));

        let opt = parse(&["-v", "disasm", "f.lox"]).unwrap();
        assert_eq!(opt.verbose, 1);
        assert!(matches!(opt.cmd, Some(Command::Disasm { .. })));

        let opt = parse(&["tokens", "f.lox", "-q"]).unwrap();
        assert!(opt.quiet);
    }

    #[test]
    fn flags_after_a_script() {
        let opt = parse(&["f.lox", "--trace"]).unwrap();
        assert!(opt.trace);
        assert_eq!(opt.script, Some(PathBuf::from("f.lox")));
        assert!(opt.cmd.is_none());
    }

    #[test]
    fn script_and_subcommand_conflict() {
        let err = parse(&["f.lox", "run", "g.lox"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn stack_max_is_bounded() {
        assert_eq!(parse(&["--stack-max", "1024", "f.lox"]).unwrap().stack_max, 1024);
        assert_eq!(parse(&[]).unwrap().stack_max, lox_vm::STACK_MAX);
        assert!(parse(&["--stack-max", "99999999999999999", "f.lox"]).is_err());
        assert!(parse(&["--stack-max", "0", "f.lox"]).is_err());
    }

    #[test]
    fn clap_definition_is_consistent() { Opt::command().debug_assert(); }
}
