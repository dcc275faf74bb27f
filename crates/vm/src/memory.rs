//! Fixed-size linear memory holding program, data, and the stack window.

use stackvm_common::Scalar;
use std::ops::Range;
use thiserror::Error;

/// An access that falls outside the addressable range.
///
/// `limit` is the size of the range that was checked: the memory size for
/// plain memory accesses, the window size for stack-relative accesses (in
/// which case `address` is window-relative too).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("access of {width} bytes at {address} outside [0, {limit})")]
pub struct MemoryError {
    pub address: i64,
    pub width: usize,
    pub limit: usize,
}

/// Bounds-checked byte-addressable memory of a size fixed at construction.
#[derive(Debug, Clone)]
pub struct Memory {
    bytes: Box<[u8]>,
}

impl Memory {
    /// Zero-filled memory of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0u8; size].into_boxed_slice(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Read-only view of the whole memory.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Resolve `[address, address + width)` or fail without side effects.
    fn range(&self, address: i64, width: usize) -> Result<Range<usize>, MemoryError> {
        let err = MemoryError {
            address,
            width,
            limit: self.size(),
        };
        let start = usize::try_from(address).map_err(|_| err.clone())?;
        let end = start.checked_add(width).ok_or_else(|| err.clone())?;
        if end > self.size() {
            return Err(err);
        }
        Ok(start..end)
    }

    pub fn get<T: Scalar>(&self, address: i64) -> Result<T, MemoryError> {
        let range = self.range(address, T::WIDTH)?;
        Ok(T::decode(&self.bytes[range]))
    }

    pub fn put<T: Scalar>(&mut self, address: i64, value: T) -> Result<(), MemoryError> {
        let range = self.range(address, T::WIDTH)?;
        value.encode(&mut self.bytes[range]);
        Ok(())
    }

    /// Copy `data` in starting at `address`. All or nothing.
    pub fn write_bytes(&mut self, address: i64, data: &[u8]) -> Result<(), MemoryError> {
        let range = self.range(address, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    pub fn get_byte(&self, address: i64) -> Result<u8, MemoryError> {
        self.get(address)
    }

    pub fn put_byte(&mut self, address: i64, value: u8) -> Result<(), MemoryError> {
        self.put(address, value)
    }

    pub fn get_int(&self, address: i64) -> Result<i64, MemoryError> {
        self.get(address)
    }

    pub fn put_int(&mut self, address: i64, value: i64) -> Result<(), MemoryError> {
        self.put(address, value)
    }

    pub fn get_float(&self, address: i64) -> Result<f64, MemoryError> {
        self.get(address)
    }

    pub fn put_float(&mut self, address: i64, value: f64) -> Result<(), MemoryError> {
        self.put(address, value)
    }
}
