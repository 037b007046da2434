//! Growth policy shared by every growable buffer of a chunk.
//!
//! Buffers start with no storage. When an append would exceed capacity the
//! buffer is reserved to [`grow_capacity`] of its current capacity:
//! `0 -> 8 -> 16 -> 32 -> ...`.

/// First non-zero capacity of a growable buffer.
pub const MIN_CAPACITY: usize = 8;

/// Next capacity for a buffer that is full at `capacity`.
pub const fn grow_capacity(capacity: usize) -> usize {
    if capacity < MIN_CAPACITY {
        MIN_CAPACITY
    } else {
        capacity * 2
    }
}

/// Append `item`, growing `buf` by the documented policy when it is full.
pub(crate) fn push_grow<T>(buf: &mut Vec<T>, item: T) {
    if buf.len() == buf.capacity() {
        let target = grow_capacity(buf.capacity());
        buf.reserve_exact(target - buf.len());
    }
    buf.push(item);
}
