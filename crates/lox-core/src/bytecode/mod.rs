//! Bytecode primitives: opcodes, chunk storage, decoding, disassembly and
//! structural validation.

/// Chunk representation plus its line table.
pub mod chunk;
pub mod disasm;
pub mod helpers;
/// Instruction set.
pub mod opcode;

pub use chunk::{Chunk, ChunkError, Instruction, LineTable, MAX_CONSTANTS};
pub use opcode::OpCode;
