//! Decode errors for stackvm bytecode.

use thiserror::Error;

/// Errors that occur while decoding a bytecode image outside the VM.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Byte has no opcode assigned.
    #[error("unknown opcode: {0:#04x}")]
    UnknownOpcode(u8),

    /// Unknown opcode found at a known position in a bytecode image.
    #[error("unknown opcode {opcode:#04x} at address {at}")]
    InvalidInstruction { at: usize, opcode: u8 },

    /// Operand runs past the end of the bytecode image.
    #[error("truncated operand at address {at}: {width} bytes needed")]
    Truncated { at: usize, width: usize },
}
