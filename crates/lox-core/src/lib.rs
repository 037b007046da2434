//! lox-core: primitives partagées du bytecode Lox
//!
//! Fournit :
//! - `Value` (modèle de valeurs) + `ValueArray` (pool de constantes)
//! - `OpCode`, `Chunk`, `LineTable`, `Instruction` (décodage pour l'outillage)
//! - Désassembleur textuel (`disasm`) et validation structurelle (`helpers`)
//! - Frontière compilateur : trait `Compiler` + `CompileError`/`Diagnostic`
//!
//! Features :
//! - `serde` : derive (dé)sérialisation sur `Value` et `OpCode`

#![deny(missing_docs)]

/* ─────────────────────────── Modules publics ─────────────────────────── */

/// Primitives de bytecode (opcodes, chunk, désassembleur, validation).
pub mod bytecode;
/// Frontière entre le producteur de bytecode et la VM.
pub mod compiler;
/// Politique de croissance des tableaux dynamiques.
pub mod memory;
/// Valeurs runtime et tableau de valeurs.
pub mod value;

/// Ré-exporte le désassembleur textuel.
pub use bytecode::disasm;
/// Ré-exporte les helpers de validation.
pub use bytecode::helpers;

pub use bytecode::{Chunk, ChunkError, Instruction, LineTable, OpCode, MAX_CONSTANTS};
pub use compiler::{CompileError, Compiler, Diagnostic, Location};
pub use value::{Value, ValueArray};

/* ─────────────────────────── Prélude (reexports utiles) ─────────────────────────── */

/// Prélude pratique pour importer les types/funcs clés du crate.
pub mod prelude {
    /// Réexports utiles pour une importation rapide.
    pub use super::{
        disasm::{disassemble_chunk, disassemble_instruction},
        Chunk, ChunkError, CompileError, Compiler, Diagnostic, Instruction, LineTable, Location,
        OpCode, Value, ValueArray,
    };
}
