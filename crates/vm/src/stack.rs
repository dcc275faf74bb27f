//! The operand stack: a window over the top of [`Memory`].
//!
//! The stack owns no bytes. It tracks a base address, a window size, and a
//! pointer one past the top element; every value it pushes or peeks lives in
//! the memory passed to each call. Slot `i` is absolute address `base + i`.
//!
//! The first push past the window or pop below it latches the stack into a
//! failed state. From then on every operation, including peek and poke,
//! fails with [`StackError::Blocked`].

use crate::memory::{Memory, MemoryError};
use stackvm_common::Scalar;
use thiserror::Error;

/// Errors from stack operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackError {
    /// A push did not fit. Latches the stack.
    #[error("stack overflow")]
    Overflow,

    /// A pop found too few bytes. Latches the stack.
    #[error("stack underflow")]
    Underflow,

    /// Operation attempted after the stack latched.
    #[error("stack blocked after earlier overflow or underflow")]
    Blocked,

    /// Peek or poke outside the window, or the window itself outside memory.
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Latch state. Leaves `Active` at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackState {
    Active,
    Overflowed,
    Underflowed,
}

#[derive(Debug, Clone)]
pub struct Stack {
    base: usize,
    size: usize,
    pointer: usize,
    state: StackState,
}

impl Stack {
    /// A stack occupying the top `size` bytes of a memory of `memory_size`
    /// bytes. Returns `None` if the window does not fit.
    pub fn new(memory_size: usize, size: usize) -> Option<Self> {
        let base = memory_size.checked_sub(size)?;
        Some(Self {
            base,
            size,
            pointer: 0,
            state: StackState::Active,
        })
    }

    /// Absolute address of slot 0.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Window size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Offset one past the top element.
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn state(&self) -> StackState {
        self.state
    }

    pub fn is_blocked(&self) -> bool {
        self.state != StackState::Active
    }

    /// The occupied part of the window, bottom first.
    pub fn contents<'m>(&self, memory: &'m Memory) -> &'m [u8] {
        let bytes = memory.as_bytes();
        let end = (self.base + self.pointer).min(bytes.len());
        &bytes[self.base.min(end)..end]
    }

    /// Restore the pointer saved before a failed instruction. The latch is
    /// left alone.
    pub(crate) fn rewind(&mut self, pointer: usize) {
        self.pointer = pointer.min(self.size);
    }

    fn check(&self) -> Result<(), StackError> {
        match self.state {
            StackState::Active => Ok(()),
            StackState::Overflowed | StackState::Underflowed => Err(StackError::Blocked),
        }
    }

    fn absolute(&self, slot: usize) -> i64 {
        (self.base + slot) as i64
    }

    pub fn push<T: Scalar>(&mut self, memory: &mut Memory, value: T) -> Result<(), StackError> {
        self.check()?;
        if self.pointer + T::WIDTH > self.size {
            self.state = StackState::Overflowed;
            return Err(StackError::Overflow);
        }
        memory.put(self.absolute(self.pointer), value)?;
        self.pointer += T::WIDTH;
        Ok(())
    }

    pub fn pop<T: Scalar>(&mut self, memory: &Memory) -> Result<T, StackError> {
        self.check()?;
        if self.pointer < T::WIDTH {
            self.state = StackState::Underflowed;
            return Err(StackError::Underflow);
        }
        let value = memory.get(self.absolute(self.pointer - T::WIDTH))?;
        self.pointer -= T::WIDTH;
        Ok(value)
    }

    /// Window slot for `pointer + offset`, checked against `[0, size)`.
    fn slot(&self, offset: i64, width: usize) -> Result<usize, StackError> {
        let relative = (self.pointer as i64).checked_add(offset);
        let err = MemoryError {
            address: relative.unwrap_or(offset),
            width,
            limit: self.size,
        };
        let slot = relative
            .and_then(|r| usize::try_from(r).ok())
            .ok_or_else(|| err.clone())?;
        match slot.checked_add(width) {
            Some(end) if end <= self.size => Ok(slot),
            _ => Err(err.into()),
        }
    }

    /// Read the value at `pointer + offset` without moving the pointer.
    pub fn get<T: Scalar>(&self, memory: &Memory, offset: i64) -> Result<T, StackError> {
        self.check()?;
        let slot = self.slot(offset, T::WIDTH)?;
        Ok(memory.get(self.absolute(slot))?)
    }

    /// Write the value at `pointer + offset` without moving the pointer.
    pub fn put<T: Scalar>(
        &self,
        memory: &mut Memory,
        offset: i64,
        value: T,
    ) -> Result<(), StackError> {
        self.check()?;
        let slot = self.slot(offset, T::WIDTH)?;
        Ok(memory.put(self.absolute(slot), value)?)
    }

    pub fn push_byte(&mut self, memory: &mut Memory, value: u8) -> Result<(), StackError> {
        self.push(memory, value)
    }

    pub fn push_int(&mut self, memory: &mut Memory, value: i64) -> Result<(), StackError> {
        self.push(memory, value)
    }

    pub fn push_float(&mut self, memory: &mut Memory, value: f64) -> Result<(), StackError> {
        self.push(memory, value)
    }

    pub fn pop_byte(&mut self, memory: &Memory) -> Result<u8, StackError> {
        self.pop(memory)
    }

    pub fn pop_int(&mut self, memory: &Memory) -> Result<i64, StackError> {
        self.pop(memory)
    }

    pub fn pop_float(&mut self, memory: &Memory) -> Result<f64, StackError> {
        self.pop(memory)
    }

    pub fn get_byte(&self, memory: &Memory, offset: i64) -> Result<u8, StackError> {
        self.get(memory, offset)
    }

    pub fn get_int(&self, memory: &Memory, offset: i64) -> Result<i64, StackError> {
        self.get(memory, offset)
    }

    pub fn get_float(&self, memory: &Memory, offset: i64) -> Result<f64, StackError> {
        self.get(memory, offset)
    }

    pub fn put_byte(&self, memory: &mut Memory, offset: i64, value: u8) -> Result<(), StackError> {
        self.put(memory, offset, value)
    }

    pub fn put_int(&self, memory: &mut Memory, offset: i64, value: i64) -> Result<(), StackError> {
        self.put(memory, offset, value)
    }

    pub fn put_float(
        &self,
        memory: &mut Memory,
        offset: i64,
        value: f64,
    ) -> Result<(), StackError> {
        self.put(memory, offset, value)
    }
}
