//! Erreurs d'exécution et issue d'un `interpret`.

use lox_core::CompileError;
use thiserror::Error;

/// Ce qui a mal tourné pendant la boucle de dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeErrorKind {
    /// Octet sans opcode correspondant.
    #[error("Unknown opcode {0}.")]
    UnknownOpcode(u8),

    /// Push sur une pile pleine.
    #[error("Stack overflow.")]
    StackOverflow,

    /// Pop sur une pile vide.
    #[error("Stack underflow.")]
    StackUnderflow,

    /// Chargement d'une constante absente du pool.
    #[error("Constant index {0} out of range.")]
    ConstantOutOfRange(usize),

    /// Fin du code atteinte sans `OP_RETURN` (ou opérande tronqué).
    #[error("Unexpected end of bytecode.")]
    UnexpectedEnd,

    /// Échec d'écriture sur la sortie de la VM.
    #[error("Cannot write output: {0}")]
    Output(String),
}

/// Erreur runtime, rattachée à la ligne source de l'instruction fautive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}\n[line {line}] in script")]
pub struct RuntimeError {
    /// Genre d'erreur.
    pub kind: RuntimeErrorKind,
    /// Ligne source (0 si le chunk n'a pas de table de lignes exploitable).
    pub line: u32,
}

impl RuntimeError {
    /// Construit une erreur.
    pub const fn new(kind: RuntimeErrorKind, line: u32) -> Self { Self { kind, line } }
}

/// Issue en échec d'un appel à `interpret`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpretError {
    /// Le compilateur a rejeté la source ; rien n'a été exécuté.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// La boucle de dispatch a échoué.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl InterpretError {
    /// Vrai pour une erreur de compilation.
    pub const fn is_compile(&self) -> bool { matches!(self, Self::Compile(_)) }

    /// Vrai pour une erreur d'exécution.
    pub const fn is_runtime(&self) -> bool { matches!(self, Self::Runtime(_)) }
}
