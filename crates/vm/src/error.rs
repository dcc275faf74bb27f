//! Errors for the stackvm engine.
//!
//! Runtime variants carry `at`, the address of the instruction that failed.
//! Every runtime error is fatal: the machine keeps it and reports it again on
//! any further `step`.

use crate::memory::MemoryError;
use crate::stack::StackError;
use thiserror::Error;

/// Errors surfaced by [`crate::VirtualMachine`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// Stack window larger than memory, or memory not addressable by i64.
    #[error("invalid configuration: memory {memory_size} bytes, stack {stack_size} bytes")]
    InvalidConfiguration {
        memory_size: usize,
        stack_size: usize,
    },

    /// Program does not fit in memory.
    #[error("program of {len} bytes does not fit in {capacity} bytes of memory")]
    ProgramTooLarge { len: usize, capacity: usize },

    /// Memory access out of bounds, or stack peek/poke outside the window.
    #[error("memory error at {at}: {source}")]
    Memory {
        at: usize,
        #[source]
        source: MemoryError,
    },

    /// First push that did not fit on the stack.
    #[error("stack overflow at {at}")]
    StackOverflow { at: usize },

    /// First pop from an empty (or too shallow) stack.
    #[error("stack underflow at {at}")]
    StackUnderflow { at: usize },

    /// Stack operation after an earlier overflow or underflow.
    #[error("stack blocked at {at}")]
    Blocked { at: usize },

    /// Jump, call, or return target outside memory.
    #[error("illegal address {address} at {at}")]
    IllegalAddress { at: usize, address: i64 },

    /// Byte at pc is not a known opcode.
    #[error("unknown opcode {opcode:#04x} at {at}")]
    UnknownOpcode { at: usize, opcode: u8 },

    /// Byte or int division with a zero divisor.
    #[error("division by zero at {at}")]
    DivisionByZero { at: usize },

    /// Configured step budget used up before the program ended.
    #[error("step limit of {limit} exceeded at {at}")]
    StepLimitExceeded { at: usize, limit: u64 },
}

/// A failure inside one instruction, before the engine attaches the pc.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Fault {
    Memory(MemoryError),
    Stack(StackError),
    IllegalAddress(i64),
    UnknownOpcode(u8),
    DivisionByZero,
}

impl From<MemoryError> for Fault {
    fn from(err: MemoryError) -> Self {
        Fault::Memory(err)
    }
}

impl From<StackError> for Fault {
    fn from(err: StackError) -> Self {
        Fault::Stack(err)
    }
}

impl Fault {
    /// Attach the address of the failing instruction.
    pub(crate) fn at(self, at: usize) -> VmError {
        match self {
            Fault::Memory(source) | Fault::Stack(StackError::Memory(source)) => {
                VmError::Memory { at, source }
            }
            Fault::Stack(StackError::Overflow) => VmError::StackOverflow { at },
            Fault::Stack(StackError::Underflow) => VmError::StackUnderflow { at },
            Fault::Stack(StackError::Blocked) => VmError::Blocked { at },
            Fault::IllegalAddress(address) => VmError::IllegalAddress { at, address },
            Fault::UnknownOpcode(opcode) => VmError::UnknownOpcode { at, opcode },
            Fault::DivisionByZero => VmError::DivisionByZero { at },
        }
    }
}
