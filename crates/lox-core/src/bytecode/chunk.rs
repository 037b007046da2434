//! Core bytecode container: code bytes, a parallel line table and an owned
//! constant pool.

use core::{fmt, ops::Range};

use crate::{bytecode::opcode::OpCode, memory::push_grow, value::{Value, ValueArray}};

/// Largest constant pool addressable by `OP_CONSTANT_LONG` (24-bit index).
pub const MAX_CONSTANTS: usize = 1 << 24;

/// Largest index encodable by the one-byte `OP_CONSTANT` operand, plus one.
const SHORT_CONSTANTS: usize = 1 << 8;

/// Line table (offset → source line), one entry per code byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineTable {
    lines: Vec<u32>,
}

impl LineTable {
    /// Create an empty line table.
    pub const fn new() -> Self { Self { lines: Vec::new() } }
    /// Number of stored line entries.
    pub fn len(&self) -> usize { self.lines.len() }
    /// Whether no entry was recorded yet.
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    /// Source line of the byte at `offset`.
    pub fn get(&self, offset: usize) -> Option<u32> { self.lines.get(offset).copied() }
    /// Raw per-byte lines.
    pub fn as_slice(&self) -> &[u32] { &self.lines }
    /// Iterate over contiguous ranges of the same line number.
    pub fn runs(&self) -> LineRunIter<'_> { LineRunIter { lines: &self.lines, index: 0 } }
    fn push(&mut self, line: u32) { push_grow(&mut self.lines, line); }
    fn clear(&mut self) { self.lines = Vec::new(); }
}

/// Iterator yielding contiguous line ranges `(start..end, line)`.
pub struct LineRunIter<'a> {
    lines: &'a [u32],
    index: usize,
}

impl Iterator for LineRunIter<'_> {
    type Item = (Range<usize>, u32);

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.index;
        let line = *self.lines.get(start)?;
        self.index += 1;
        while self.lines.get(self.index) == Some(&line) {
            self.index += 1;
        }
        Some((start..self.index, line))
    }
}

/// Errors returned when building or decoding a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    /// The constant pool already holds [`MAX_CONSTANTS`] entries.
    TooManyConstants,
    /// Byte at `offset` is not an opcode.
    UnknownOpcode {
        /// Offset of the rejected byte.
        offset: usize,
        /// Rejected byte.
        byte: u8,
    },
    /// Operand bytes of the instruction at `offset` run past the end of code.
    Truncated {
        /// Offset of the opcode byte.
        offset: usize,
        /// Opcode whose operand is cut short.
        op: OpCode,
    },
    /// `offset` is past the end of code.
    OutOfBounds {
        /// Requested offset.
        offset: usize,
    },
    /// A constant load references an index past the end of the pool.
    ConstantOutOfRange {
        /// Offset of the opcode byte.
        offset: usize,
        /// Referenced index.
        index: usize,
        /// Pool size.
        len: usize,
    },
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkError::TooManyConstants => write!(f, "Too many constants in one chunk."),
            ChunkError::UnknownOpcode { offset, byte } => write!(f, "unknown opcode {byte} at {offset:04}"),
            ChunkError::Truncated { offset, op } => write!(f, "truncated {op} operand at {offset:04}"),
            ChunkError::OutOfBounds { offset } => write!(f, "offset {offset:04} is past the end of code"),
            ChunkError::ConstantOutOfRange { offset, index, len } => write!(
                f,
                "constant index {index} at {offset:04} out of range (pool size {len})"
            ),
        }
    }
}

impl std::error::Error for ChunkError {}

/// Decoded view of one instruction, used by tooling and tracing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instruction {
    /// Offset of the opcode byte.
    pub offset: usize,
    /// Decoded opcode.
    pub op: OpCode,
    /// Constant index operand, for constant loads.
    pub operand: Option<usize>,
    /// Resolved constant, when the operand is in range.
    pub constant: Option<Value>,
    /// Source line of the opcode byte.
    pub line: u32,
}

impl Instruction {
    /// Encoded size in bytes.
    pub const fn size(&self) -> usize { 1 + self.op.operand_len() }
    /// Offset of the following instruction.
    pub const fn next_offset(&self) -> usize { self.offset + self.size() }
}

/// Bytecode chunk: code bytes, per-byte source lines and a constant pool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    code: Vec<u8>,
    lines: LineTable,
    constants: ValueArray,
}

impl Chunk {
    /// Create an empty chunk.
    pub const fn new() -> Self {
        Self { code: Vec::new(), lines: LineTable::new(), constants: ValueArray::new() }
    }

    /// Append one byte and the source line it came from.
    pub fn write(&mut self, byte: u8, line: u32) {
        push_grow(&mut self.code, byte);
        self.lines.push(line);
    }

    /// Append an opcode byte.
    pub fn write_op(&mut self, op: OpCode, line: u32) { self.write(op.into(), line); }

    /// Append a constant to the pool and return its index.
    pub fn add_constant(&mut self, value: Value) -> usize { self.constants.write(value) }

    /// Add `value` to the pool and emit the load for it, choosing the short
    /// or long encoding from the resulting index.
    pub fn write_constant(&mut self, value: Value, line: u32) -> Result<usize, ChunkError> {
        if self.constants.len() >= MAX_CONSTANTS {
            return Err(ChunkError::TooManyConstants);
        }
        let idx = self.add_constant(value);
        if idx < SHORT_CONSTANTS {
            self.write_op(OpCode::Constant, line);
            self.write(idx as u8, line);
        } else {
            self.write_op(OpCode::ConstantLong, line);
            for byte in &(idx as u32).to_le_bytes()[..3] {
                self.write(*byte, line);
            }
        }
        Ok(idx)
    }

    /// Code bytes.
    pub fn code(&self) -> &[u8] { &self.code }

    /// Per-byte line table.
    pub const fn lines(&self) -> &LineTable { &self.lines }

    /// Constant pool.
    pub const fn constants(&self) -> &ValueArray { &self.constants }

    /// Number of code bytes.
    pub fn len(&self) -> usize { self.code.len() }

    /// Whether no byte was written.
    pub fn is_empty(&self) -> bool { self.code.is_empty() }

    /// Constant at `idx`.
    pub fn constant(&self, idx: usize) -> Option<Value> { self.constants.get(idx) }

    /// Source line of the byte at `offset`.
    pub fn line_at(&self, offset: usize) -> Option<u32> { self.lines.get(offset) }

    /// Read the constant-index operand of `op` whose opcode byte sits at `offset`.
    pub fn read_operand(&self, offset: usize, op: OpCode) -> Result<Option<usize>, ChunkError> {
        let width = op.operand_len();
        if width == 0 {
            return Ok(None);
        }
        let bytes = self
            .code
            .get(offset + 1..offset + 1 + width)
            .ok_or(ChunkError::Truncated { offset, op })?;
        Ok(Some(bytes.iter().rev().fold(0usize, |acc, b| (acc << 8) | usize::from(*b))))
    }

    /// Decode the instruction starting at `offset`.
    pub fn instruction_at(&self, offset: usize) -> Result<Instruction, ChunkError> {
        let byte = *self.code.get(offset).ok_or(ChunkError::OutOfBounds { offset })?;
        let op = OpCode::try_from(byte).map_err(|byte| ChunkError::UnknownOpcode { offset, byte })?;
        let operand = self.read_operand(offset, op)?;
        Ok(Instruction {
            offset,
            op,
            operand,
            constant: operand.and_then(|idx| self.constant(idx)),
            line: self.line_at(offset).unwrap_or_default(),
        })
    }

    /// Iterate over decoded instructions until the end of code or the first
    /// undecodable byte (which is yielded as an error).
    pub fn instructions(&self) -> Instructions<'_> { Instructions { chunk: self, offset: 0, done: false } }

    /// Release the code, the line table and the pool; the chunk is empty again.
    pub fn clear(&mut self) {
        self.code = Vec::new();
        self.lines.clear();
        self.constants.clear();
    }
}

/// Iterator returned by [`Chunk::instructions`].
pub struct Instructions<'a> {
    chunk: &'a Chunk,
    offset: usize,
    done: bool,
}

impl Iterator for Instructions<'_> {
    type Item = Result<Instruction, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.chunk.len() {
            return None;
        }
        match self.chunk.instruction_at(self.offset) {
            Ok(ins) => {
                self.offset = ins.next_offset();
                Some(Ok(ins))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn new_chunk_is_empty() {
        let chunk = Chunk::new();
        assert!(chunk.is_empty());
        assert!(chunk.lines().is_empty());
        assert!(chunk.constants().is_empty());
    }

    #[test]
    fn write_constant_uses_short_form() {
        let mut chunk = Chunk::new();
        let idx = chunk.write_constant(Value::Number(1.2), 123).unwrap();
        chunk.write_op(OpCode::Return, 123);
        assert_eq!(idx, 0);
        assert_eq!(chunk.code(), &[0x01, 0x00, 0x00]);
        assert_eq!(chunk.lines().as_slice(), &[123, 123, 123]);
    }

    #[test]
    fn write_constant_switches_to_long_form() {
        let mut chunk = Chunk::new();
        for i in 0..256 {
            chunk.add_constant(Value::Number(f64::from(i)));
        }
        let idx = chunk.write_constant(Value::Number(9.5), 4).unwrap();
        assert_eq!(idx, 256);
        assert_eq!(chunk.code(), &[0x07, 0x00, 0x01, 0x00]);
        let ins = chunk.instruction_at(0).unwrap();
        assert_eq!(ins.op, OpCode::ConstantLong);
        assert_eq!(ins.operand, Some(256));
        assert_eq!(ins.constant, Some(Value::Number(9.5)));
        assert_eq!(ins.next_offset(), 4);
    }

    #[test]
    fn write_constant_refuses_a_full_pool() {
        let mut chunk = Chunk::new();
        for i in 0..MAX_CONSTANTS {
            chunk.add_constant(Value::Number(i as f64));
        }
        chunk.write_op(OpCode::Return, 1);
        assert_eq!(chunk.write_constant(Value::Number(0.5), 2), Err(ChunkError::TooManyConstants));
        assert_eq!(chunk.constants().len(), MAX_CONSTANTS);
        assert_eq!(chunk.code(), &[u8::from(OpCode::Return)]);
        assert_eq!(chunk.lines().len(), 1);
    }

    #[test]
    fn decode_reports_unknown_and_truncated() {
        let mut chunk = Chunk::new();
        chunk.write(0x42, 1);
        assert_eq!(chunk.instruction_at(0), Err(ChunkError::UnknownOpcode { offset: 0, byte: 0x42 }));

        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Constant, 1);
        assert_eq!(
            chunk.instruction_at(0),
            Err(ChunkError::Truncated { offset: 0, op: OpCode::Constant })
        );
    }

    #[test]
    fn line_runs_group_equal_lines() {
        let mut chunk = Chunk::new();
        chunk.write_op(OpCode::Add, 1);
        chunk.write_op(OpCode::Add, 1);
        chunk.write_op(OpCode::Add, 3);
        let runs: Vec<_> = chunk.lines().runs().collect();
        assert_eq!(runs, vec![(0..2, 1), (2..3, 3)]);
    }

    #[test]
    fn clear_returns_to_initial_state() {
        let mut chunk = Chunk::new();
        chunk.write_constant(Value::Number(2.0), 1).unwrap();
        chunk.clear();
        assert_eq!(chunk, Chunk::new());
        chunk.clear();
        assert!(chunk.is_empty());
    }

    proptest! {
        #[test]
        fn code_and_lines_stay_parallel(writes in proptest::collection::vec((any::<u8>(), 1u32..10_000), 0..200)) {
            let mut chunk = Chunk::new();
            for (byte, line) in writes {
                chunk.write(byte, line);
                prop_assert_eq!(chunk.code().len(), chunk.lines().len());
                prop_assert_eq!(chunk.line_at(chunk.len() - 1), Some(line));
            }
        }

        #[test]
        fn constants_roundtrip(values in proptest::collection::vec(-1.0e6f64..1.0e6, 1..64)) {
            let mut chunk = Chunk::new();
            let indices: Vec<_> = values.iter().map(|v| chunk.add_constant(Value::Number(*v))).collect();
            prop_assert_eq!(indices, (0..values.len()).collect::<Vec<_>>());
            for (idx, v) in values.iter().enumerate() {
                prop_assert_eq!(chunk.constant(idx), Some(Value::Number(*v)));
            }
        }
    }
}
