//! Helpers for extracting operands from raw opcode bytes.
//!
//! Every helper reads the two bytes at `cursor` and `cursor + 1`, wrapping
//! both positions into the 12-bit address space.
use crate::constants::{Opcode, ADDRESS_MASK};

#[inline(always)]
fn pair(bytecode: &[u8], cursor: usize) -> (u8, u8) {
    (
        bytecode[cursor & ADDRESS_MASK],
        bytecode[(cursor + 1) & ADDRESS_MASK],
    )
}

/// Extract the full big-endian opcode from the buffer at the cursor.
#[inline(always)]
pub fn op_word(bytecode: &[u8], cursor: usize) -> Opcode {
    let (a, b) = pair(bytecode, cursor);
    ((a as u16) << 8) | b as u16
}

/// Extract operand NNN from the buffer at the cursor.
#[inline(always)]
pub fn op_nnn(bytecode: &[u8], cursor: usize) -> u16 {
    let (a, b) = pair(bytecode, cursor);
    ((a as u16 & 0b1111) << 8) | b as u16
}

/// Extract operand VX from the buffer at the cursor.
#[inline(always)]
pub fn op_x(bytecode: &[u8], cursor: usize) -> u8 {
    bytecode[cursor & ADDRESS_MASK] & 0b1111
}

/// Extract operands VX and NN from the buffer at the cursor.
#[inline(always)]
pub fn op_xnn(bytecode: &[u8], cursor: usize) -> (u8, u8) {
    // Opcode is in upper nibble and needs to be masked out.
    let (a, b) = pair(bytecode, cursor);
    (a & 0b1111, b)
}

/// Extract operands VX, VY and N from the buffer at the cursor.
#[inline(always)]
pub fn op_xyn(bytecode: &[u8], cursor: usize) -> (u8, u8, u8) {
    let (a, b) = pair(bytecode, cursor);
    (a & 0b1111, (b & 0b1111_0000) >> 4, b & 0b1111)
}

/// Extract operands VX and VY from the buffer at the cursor.
#[inline(always)]
pub fn op_xy(bytecode: &[u8], cursor: usize) -> (u8, u8) {
    // Lower nibble selects the operation, and is not an operand.
    let (x, y, _) = op_xyn(bytecode, cursor);
    (x, y)
}
