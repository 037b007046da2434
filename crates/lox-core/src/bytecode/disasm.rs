//! Textual disassembly used by the CLI tooling and by execution tracing.

use core::fmt::Write;

use crate::bytecode::chunk::{Chunk, ChunkError};

/// Disassemble a whole chunk under a `== name ==` header.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {name} ==");

    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, offset, &mut out);
    }
    out
}

/// Append the instruction at `offset` to `out` and return the offset of the
/// next instruction.
///
/// The line column shows `   |` when the byte shares the previous byte's line.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize, out: &mut String) -> usize {
    let _ = write!(out, "{offset:04} ");
    let line = chunk.line_at(offset).unwrap_or_default();
    if offset > 0 && chunk.line_at(offset - 1) == Some(line) {
        out.push_str("   | ");
    } else {
        let _ = write!(out, "{line:4} ");
    }

    match chunk.instruction_at(offset) {
        Ok(ins) => {
            match ins.operand {
                Some(idx) => {
                    let shown = ins.constant.map_or_else(|| "<invalid>".into(), |v| v.to_string());
                    let _ = writeln!(out, "{:<16} {idx:4} '{shown}'", ins.op.mnemonic());
                }
                None => {
                    let _ = writeln!(out, "{}", ins.op.mnemonic());
                }
            }
            ins.next_offset()
        }
        Err(ChunkError::UnknownOpcode { byte, .. }) => {
            let _ = writeln!(out, "Unknown opcode {byte}");
            offset + 1
        }
        Err(ChunkError::Truncated { op, .. }) => {
            let _ = writeln!(out, "{:<16} <truncated>", op.mnemonic());
            chunk.len()
        }
        Err(other) => {
            let _ = writeln!(out, "{other}");
            chunk.len().max(offset + 1)
        }
    }
}
