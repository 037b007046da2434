//! lox-vm: machine virtuelle à pile pour le bytecode Lox
//!
//! - `Vm<C>` : boucle fetch-decode-execute sur un `Chunk` emprunté, pile bornée,
//!   sortie injectable (stdout par défaut), trace d'exécution optionnelle
//! - `C: Compiler` : le producteur de bytecode est branché de l'extérieur
//! - `InterpretError` : `Compile` (rien n'est exécuté) ou `Runtime` (ligne fautive)
//!
//! Le bytecode malformé (opcode inconnu, constante absente, pile vide ou pleine,
//! fin de code sans retour) donne une `RuntimeError`, jamais une panique.
//!
//! ```
//! use lox_core::{Chunk, OpCode, Value};
//! use lox_vm::Vm;
//!
//! let mut chunk = Chunk::new();
//! chunk.write_constant(Value::Number(4.0), 1).unwrap();
//! chunk.write_op(OpCode::Negate, 1);
//! chunk.write_op(OpCode::Return, 1);
//!
//! let (mut vm, out) = Vm::with_captured_stdout(());
//! assert_eq!(vm.run(&chunk), Ok(Value::Number(-4.0)));
//! assert_eq!(out.get(), "-4\n");
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms, unused_must_use)]
#![cfg_attr(not(debug_assertions), warn(missing_docs))]

mod capture;
mod config;
mod error;
mod stack;
mod vm;

pub use capture::Captured;
pub use config::{VmConfig, STACK_MAX};
pub use error::{InterpretError, RuntimeError, RuntimeErrorKind};
pub use stack::Stack;
pub use vm::{Vm, VmState};

/* -------------------------------- Prelude -------------------------------- */

/// Prelude pratique pour importer d'un coup.
pub mod prelude {
    pub use crate::{Captured, InterpretError, RuntimeError, RuntimeErrorKind, Vm, VmConfig, VmState};
}
