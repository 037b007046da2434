//! Helper validations reused by tooling.

use crate::bytecode::chunk::{Chunk, ChunkError};

/// Basic structural validation of a chunk.
///
/// Every byte must decode into a complete instruction and every constant
/// load must reference an existing pool entry.
pub fn validate_chunk(chunk: &Chunk) -> Result<(), ChunkError> {
    let pool = chunk.constants().len();
    for ins in chunk.instructions() {
        let ins = ins?;
        if let Some(index) = ins.operand {
            if index >= pool {
                return Err(ChunkError::ConstantOutOfRange { offset: ins.offset, index, len: pool });
            }
        }
    }
    Ok(())
}
