//! stackvm common types and bytecode encoding.
//!
//! This crate provides the instruction-set contract shared by the VM and
//! its tooling:
//!
//! - [`Opcode`]: the 69 opcode bytes and their operand shapes
//! - [`Instruction`]: typed, decoded instructions
//! - [`Scalar`]: little-endian codec for byte / int / float values
//! - [`ProgramBuilder`], [`disassemble`], [`listing`]: bytecode images
//! - [`DecodeError`]: errors from decoding byte streams
//!
//! # Dependencies
//!
//! This crate uses `thiserror` (compile-time proc-macro, zero runtime cost)
//! and has no other dependencies.

pub mod codec;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod program;

// Re-export commonly used types at the crate root.
pub use codec::Scalar;
pub use error::DecodeError;
pub use instruction::{
    ArithOp, BitOp, CompareOp, Condition, Instruction, Literal, OperandReader, ValueType,
};
pub use opcode::{Opcode, OperandKind};
pub use program::{disassemble, listing, ProgramBuilder};
