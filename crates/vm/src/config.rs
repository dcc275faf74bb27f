//! Construction parameters for a [`crate::VirtualMachine`].

use crate::error::VmError;

/// Default memory size in bytes.
pub const DEFAULT_MEMORY_SIZE: usize = 256;

/// Default stack window size in bytes.
pub const DEFAULT_STACK_SIZE: usize = 64;

/// Sizes and limits for one machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Total memory in bytes, program and stack included.
    pub memory_size: usize,
    /// Stack window in bytes, carved from the top of memory.
    pub stack_size: usize,
    /// Maximum instructions executed by `run`, or unlimited.
    pub max_steps: Option<u64>,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            stack_size: DEFAULT_STACK_SIZE,
            max_steps: None,
        }
    }
}

impl VmConfig {
    pub fn new(memory_size: usize, stack_size: usize) -> Self {
        Self {
            memory_size,
            stack_size,
            max_steps: None,
        }
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// The stack must fit in memory, and every memory address must be
    /// representable as the i64 used by address operands.
    pub fn validate(&self) -> Result<(), VmError> {
        if self.stack_size > self.memory_size || i64::try_from(self.memory_size).is_err() {
            return Err(VmError::InvalidConfiguration {
                memory_size: self.memory_size,
                stack_size: self.stack_size,
            });
        }
        Ok(())
    }
}
