use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One-byte operation codes understood by the VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum OpCode {
    /// Pop the top of the stack, print it and stop.
    Return = 0x00,
    /// Push `constants[idx]`; operand: one byte index.
    Constant = 0x01,
    /// Replace the top of the stack with its negation.
    Negate = 0x02,
    /// `a + b`
    Add = 0x03,
    /// `a - b`
    Subtract = 0x04,
    /// `a * b`
    Multiply = 0x05,
    /// `a / b` (IEEE-754: division by zero yields `inf`/`NaN`).
    Divide = 0x06,
    /// Push `constants[idx]`; operand: three byte little-endian index.
    ConstantLong = 0x07,
}

impl OpCode {
    /// Every opcode, in encoding order.
    pub const ALL: [OpCode; 8] = [
        OpCode::Return,
        OpCode::Constant,
        OpCode::Negate,
        OpCode::Add,
        OpCode::Subtract,
        OpCode::Multiply,
        OpCode::Divide,
        OpCode::ConstantLong,
    ];

    /// Name printed by the disassembler.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Return => "OP_RETURN",
            OpCode::Constant => "OP_CONSTANT",
            OpCode::Negate => "OP_NEGATE",
            OpCode::Add => "OP_ADD",
            OpCode::Subtract => "OP_SUBTRACT",
            OpCode::Multiply => "OP_MULTIPLY",
            OpCode::Divide => "OP_DIVIDE",
            OpCode::ConstantLong => "OP_CONSTANT_LONG",
        }
    }

    /// Number of logical operands (0 for simple ops, 1 for constant loads).
    pub const fn operand_count(self) -> usize {
        match self {
            OpCode::Constant | OpCode::ConstantLong => 1,
            _ => 0,
        }
    }

    /// Number of operand bytes following the opcode byte.
    pub const fn operand_len(self) -> usize {
        match self {
            OpCode::Constant => 1,
            OpCode::ConstantLong => 3,
            _ => 0,
        }
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self { op as u8 }
}

impl TryFrom<u8> for OpCode {
    /// The rejected byte.
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        OpCode::ALL.get(usize::from(byte)).copied().ok_or(byte)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.mnemonic()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_encoding_matches_table() {
        for op in OpCode::ALL {
            assert_eq!(OpCode::try_from(u8::from(op)), Ok(op));
        }
    }

    #[test]
    fn unknown_bytes_are_rejected() {
        assert_eq!(OpCode::try_from(0x08), Err(0x08));
        assert_eq!(OpCode::try_from(0xFF), Err(0xFF));
    }

    #[test]
    fn operand_widths() {
        assert_eq!(OpCode::Return.operand_len(), 0);
        assert_eq!(OpCode::Constant.operand_len(), 1);
        assert_eq!(OpCode::ConstantLong.operand_len(), 3);
        assert_eq!(OpCode::ConstantLong.operand_count(), 1);
        assert_eq!(OpCode::Add.operand_count(), 0);
    }
}
