//! Little-endian codec for the three scalar types the VM operates on.
//!
//! Every multi-byte value in memory, on the stack, and in the instruction
//! stream is encoded here. There is no pointer reinterpretation anywhere in
//! the workspace; the byte order is fixed regardless of host architecture.

use crate::instruction::{Literal, ValueType};

/// Width in bytes of a byte value.
pub const BYTE_WIDTH: usize = 1;
/// Width in bytes of an int value (and of every address or offset operand).
pub const INT_WIDTH: usize = 8;
/// Width in bytes of a float value.
pub const FLOAT_WIDTH: usize = 8;

/// A value type the VM can store in memory and move through the stack.
///
/// `decode` and `encode` operate on slices of exactly [`Scalar::WIDTH`]
/// bytes. Callers (memory and stack accessors) bounds-check first.
pub trait Scalar: Copy + PartialEq + PartialOrd + std::fmt::Debug {
    /// Encoded width in bytes.
    const WIDTH: usize;
    /// The value type tag used in opcodes.
    const TYPE: ValueType;

    /// Decode from exactly `WIDTH` little-endian bytes.
    fn decode(bytes: &[u8]) -> Self;

    /// Encode into exactly `WIDTH` bytes, little-endian.
    fn encode(self, out: &mut [u8]);

    /// Whether the value counts as zero for conditional jumps.
    fn is_zero(self) -> bool;

    /// Wrap the value as an instruction literal.
    fn literal(self) -> Literal;
}

impl Scalar for u8 {
    const WIDTH: usize = BYTE_WIDTH;
    const TYPE: ValueType = ValueType::Byte;

    fn decode(bytes: &[u8]) -> Self {
        bytes[0]
    }

    fn encode(self, out: &mut [u8]) {
        out[0] = self;
    }

    fn is_zero(self) -> bool {
        self == 0
    }

    fn literal(self) -> Literal {
        Literal::Byte(self)
    }
}

impl Scalar for i64 {
    const WIDTH: usize = INT_WIDTH;
    const TYPE: ValueType = ValueType::Int;

    fn decode(bytes: &[u8]) -> Self {
        i64::from_le_bytes(word(bytes))
    }

    fn encode(self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_le_bytes());
    }

    fn is_zero(self) -> bool {
        self == 0
    }

    fn literal(self) -> Literal {
        Literal::Int(self)
    }
}

impl Scalar for f64 {
    const WIDTH: usize = FLOAT_WIDTH;
    const TYPE: ValueType = ValueType::Float;

    fn decode(bytes: &[u8]) -> Self {
        f64::from_bits(u64::from_le_bytes(word(bytes)))
    }

    fn encode(self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_bits().to_le_bytes());
    }

    /// `-0.0` is zero; NaN is not.
    fn is_zero(self) -> bool {
        self == 0.0
    }

    fn literal(self) -> Literal {
        Literal::Float(self)
    }
}

fn word(bytes: &[u8]) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    buf
}

/// Encode a scalar into a freshly allocated byte vector.
pub fn to_bytes<T: Scalar>(value: T) -> Vec<u8> {
    let mut out = vec![0u8; T::WIDTH];
    value.encode(&mut out);
    out
}
