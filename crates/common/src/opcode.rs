//! Opcode table for the stackvm instruction set.
//!
//! Opcodes are laid out in families of three, one per [`ValueType`]: the
//! byte variant sits at the family base, the int variant at base + 1 and the
//! float variant at base + 2. Every byte without an entry here is unknown and
//! halts the VM.

use crate::codec::{BYTE_WIDTH, FLOAT_WIDTH, INT_WIDTH};
use crate::error::DecodeError;
use crate::instruction::ValueType;

/// Identifies the operation to perform.
///
/// The `#[repr(u8)]` attribute pins each variant to its encoded byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Control
    /// Stop execution cleanly.
    End = 0x00,

    // Stack literals
    /// Push a literal byte read from the instruction stream.
    PushByte = 0x08,
    /// Push a literal int read from the instruction stream.
    PushInt = 0x09,
    /// Push a literal float read from the instruction stream.
    PushFloat = 0x0A,
    /// Pop a byte and discard it.
    PopByte = 0x0C,
    /// Pop an int and discard it.
    PopInt = 0x0D,
    /// Pop a float and discard it.
    PopFloat = 0x0E,

    // Indirect memory access
    /// Pop an address, push the byte stored there.
    GetByte = 0x10,
    /// Pop an address, push the int stored there.
    GetInt = 0x11,
    /// Pop an address, push the float stored there.
    GetFloat = 0x12,
    /// Pop an address, then a byte; store the byte at the address.
    PutByte = 0x18,
    /// Pop an address, then an int; store the int at the address.
    PutInt = 0x19,
    /// Pop an address, then a float; store the float at the address.
    PutFloat = 0x1A,

    // Absolute memory access
    /// Push the byte stored at the literal address.
    GetByteAddress = 0x20,
    /// Push the int stored at the literal address.
    GetIntAddress = 0x21,
    /// Push the float stored at the literal address.
    GetFloatAddress = 0x22,
    /// Pop a byte and store it at the literal address.
    PutByteAddress = 0x28,
    /// Pop an int and store it at the literal address.
    PutIntAddress = 0x29,
    /// Pop a float and store it at the literal address.
    PutFloatAddress = 0x2A,

    // Stack-relative access
    /// Push a copy of the byte at the literal offset from the stack pointer.
    GetByteStack = 0x30,
    /// Push a copy of the int at the literal offset from the stack pointer.
    GetIntStack = 0x31,
    /// Push a copy of the float at the literal offset from the stack pointer.
    GetFloatStack = 0x32,
    /// Pop a byte and store it at the literal offset from the stack pointer.
    PutByteStack = 0x38,
    /// Pop an int and store it at the literal offset from the stack pointer.
    PutIntStack = 0x39,
    /// Pop a float and store it at the literal offset from the stack pointer.
    PutFloatStack = 0x3A,

    // Arithmetic
    /// Pop B, pop A, push A + B.
    AddByte = 0x40,
    /// Pop B, pop A, push A + B.
    AddInt = 0x41,
    /// Pop B, pop A, push A + B.
    AddFloat = 0x42,
    /// Pop B, pop A, push A - B.
    SubByte = 0x44,
    /// Pop B, pop A, push A - B.
    SubInt = 0x45,
    /// Pop B, pop A, push A - B.
    SubFloat = 0x46,
    /// Pop B, pop A, push A * B.
    MulByte = 0x48,
    /// Pop B, pop A, push A * B.
    MulInt = 0x49,
    /// Pop B, pop A, push A * B.
    MulFloat = 0x4A,
    /// Pop B, pop A, push A / B.
    DivByte = 0x4C,
    /// Pop B, pop A, push A / B.
    DivInt = 0x4D,
    /// Pop B, pop A, push A / B.
    DivFloat = 0x4E,

    // Comparison
    /// Pop B, pop A, push 0xFF if A == B else 0x00.
    EqualByte = 0x60,
    /// Pop B, pop A, push 0xFF if A == B else 0x00.
    EqualInt = 0x61,
    /// Pop B, pop A, push 0xFF if A == B else 0x00.
    EqualFloat = 0x62,
    /// Pop B, pop A, push 0xFF if A != B else 0x00.
    UnequalByte = 0x64,
    /// Pop B, pop A, push 0xFF if A != B else 0x00.
    UnequalInt = 0x65,
    /// Pop B, pop A, push 0xFF if A != B else 0x00.
    UnequalFloat = 0x66,
    /// Pop B, pop A, push 0xFF if A > B else 0x00.
    GreaterByte = 0x68,
    /// Pop B, pop A, push 0xFF if A > B else 0x00.
    GreaterInt = 0x69,
    /// Pop B, pop A, push 0xFF if A > B else 0x00.
    GreaterFloat = 0x6A,
    /// Pop B, pop A, push 0xFF if A < B else 0x00.
    SmallerByte = 0x6C,
    /// Pop B, pop A, push 0xFF if A < B else 0x00.
    SmallerInt = 0x6D,
    /// Pop B, pop A, push 0xFF if A < B else 0x00.
    SmallerFloat = 0x6E,

    // Bitwise (byte only)
    /// Pop B, pop A, push A & B.
    And = 0x70,
    /// Pop B, pop A, push A | B.
    Or = 0x71,
    /// Pop A, push !A.
    Not = 0x72,
    /// Pop B, pop A, push A ^ B.
    Xor = 0x73,

    // Control flow
    /// Pop an address and jump there.
    Ret = 0xE0,
    /// Jump to the literal address.
    Jmp = 0xE1,
    /// Pop an address, then a byte; jump if the byte is zero.
    JmpzByte = 0xE4,
    /// Pop an address, then an int; jump if the int is zero.
    JmpzInt = 0xE5,
    /// Pop an address, then a float; jump if the float is zero.
    JmpzFloat = 0xE6,
    /// Pop a byte; jump to the literal address if it is zero.
    JmpzByteAddress = 0xE8,
    /// Pop an int; jump to the literal address if it is zero.
    JmpzIntAddress = 0xE9,
    /// Pop a float; jump to the literal address if it is zero.
    JmpzFloatAddress = 0xEA,
    /// Pop an address, then a byte; jump if the byte is not zero.
    JmpnzByte = 0xEC,
    /// Pop an address, then an int; jump if the int is not zero.
    JmpnzInt = 0xED,
    /// Pop an address, then a float; jump if the float is not zero.
    JmpnzFloat = 0xEE,
    /// Pop a byte; jump to the literal address if it is not zero.
    JmpnzByteAddress = 0xF0,
    /// Pop an int; jump to the literal address if it is not zero.
    JmpnzIntAddress = 0xF1,
    /// Pop a float; jump to the literal address if it is not zero.
    JmpnzFloatAddress = 0xF2,
    /// Pop an address, push the return address, jump.
    Call = 0xF8,
    /// Push the return address, jump to the literal address.
    CallAddress = 0xF9,
}

/// All valid opcodes, in byte order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; 69] = [
    Opcode::End,
    Opcode::PushByte,
    Opcode::PushInt,
    Opcode::PushFloat,
    Opcode::PopByte,
    Opcode::PopInt,
    Opcode::PopFloat,
    Opcode::GetByte,
    Opcode::GetInt,
    Opcode::GetFloat,
    Opcode::PutByte,
    Opcode::PutInt,
    Opcode::PutFloat,
    Opcode::GetByteAddress,
    Opcode::GetIntAddress,
    Opcode::GetFloatAddress,
    Opcode::PutByteAddress,
    Opcode::PutIntAddress,
    Opcode::PutFloatAddress,
    Opcode::GetByteStack,
    Opcode::GetIntStack,
    Opcode::GetFloatStack,
    Opcode::PutByteStack,
    Opcode::PutIntStack,
    Opcode::PutFloatStack,
    Opcode::AddByte,
    Opcode::AddInt,
    Opcode::AddFloat,
    Opcode::SubByte,
    Opcode::SubInt,
    Opcode::SubFloat,
    Opcode::MulByte,
    Opcode::MulInt,
    Opcode::MulFloat,
    Opcode::DivByte,
    Opcode::DivInt,
    Opcode::DivFloat,
    Opcode::EqualByte,
    Opcode::EqualInt,
    Opcode::EqualFloat,
    Opcode::UnequalByte,
    Opcode::UnequalInt,
    Opcode::UnequalFloat,
    Opcode::GreaterByte,
    Opcode::GreaterInt,
    Opcode::GreaterFloat,
    Opcode::SmallerByte,
    Opcode::SmallerInt,
    Opcode::SmallerFloat,
    Opcode::And,
    Opcode::Or,
    Opcode::Not,
    Opcode::Xor,
    Opcode::Ret,
    Opcode::Jmp,
    Opcode::JmpzByte,
    Opcode::JmpzInt,
    Opcode::JmpzFloat,
    Opcode::JmpzByteAddress,
    Opcode::JmpzIntAddress,
    Opcode::JmpzFloatAddress,
    Opcode::JmpnzByte,
    Opcode::JmpnzInt,
    Opcode::JmpnzFloat,
    Opcode::JmpnzByteAddress,
    Opcode::JmpnzIntAddress,
    Opcode::JmpnzFloatAddress,
    Opcode::Call,
    Opcode::CallAddress,
];

/// Shape of the literal that follows an opcode in the instruction stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// No operand; the instruction is a single byte.
    None,
    /// One literal byte.
    Byte,
    /// An 8-byte little-endian int literal.
    Int,
    /// An 8-byte IEEE-754 float literal.
    Float,
    /// An 8-byte absolute memory address.
    Address,
    /// An 8-byte signed offset from the stack pointer.
    Offset,
}

impl OperandKind {
    /// Encoded width of the operand in bytes.
    pub fn width(self) -> usize {
        match self {
            OperandKind::None => 0,
            OperandKind::Byte => BYTE_WIDTH,
            OperandKind::Int | OperandKind::Address | OperandKind::Offset => INT_WIDTH,
            OperandKind::Float => FLOAT_WIDTH,
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            // Control
            0x00 => Ok(Opcode::End),

            // Stack literals
            0x08 => Ok(Opcode::PushByte),
            0x09 => Ok(Opcode::PushInt),
            0x0A => Ok(Opcode::PushFloat),
            0x0C => Ok(Opcode::PopByte),
            0x0D => Ok(Opcode::PopInt),
            0x0E => Ok(Opcode::PopFloat),

            // Indirect memory access
            0x10 => Ok(Opcode::GetByte),
            0x11 => Ok(Opcode::GetInt),
            0x12 => Ok(Opcode::GetFloat),
            0x18 => Ok(Opcode::PutByte),
            0x19 => Ok(Opcode::PutInt),
            0x1A => Ok(Opcode::PutFloat),

            // Absolute memory access
            0x20 => Ok(Opcode::GetByteAddress),
            0x21 => Ok(Opcode::GetIntAddress),
            0x22 => Ok(Opcode::GetFloatAddress),
            0x28 => Ok(Opcode::PutByteAddress),
            0x29 => Ok(Opcode::PutIntAddress),
            0x2A => Ok(Opcode::PutFloatAddress),

            // Stack-relative access
            0x30 => Ok(Opcode::GetByteStack),
            0x31 => Ok(Opcode::GetIntStack),
            0x32 => Ok(Opcode::GetFloatStack),
            0x38 => Ok(Opcode::PutByteStack),
            0x39 => Ok(Opcode::PutIntStack),
            0x3A => Ok(Opcode::PutFloatStack),

            // Arithmetic
            0x40 => Ok(Opcode::AddByte),
            0x41 => Ok(Opcode::AddInt),
            0x42 => Ok(Opcode::AddFloat),
            0x44 => Ok(Opcode::SubByte),
            0x45 => Ok(Opcode::SubInt),
            0x46 => Ok(Opcode::SubFloat),
            0x48 => Ok(Opcode::MulByte),
            0x49 => Ok(Opcode::MulInt),
            0x4A => Ok(Opcode::MulFloat),
            0x4C => Ok(Opcode::DivByte),
            0x4D => Ok(Opcode::DivInt),
            0x4E => Ok(Opcode::DivFloat),

            // Comparison
            0x60 => Ok(Opcode::EqualByte),
            0x61 => Ok(Opcode::EqualInt),
            0x62 => Ok(Opcode::EqualFloat),
            0x64 => Ok(Opcode::UnequalByte),
            0x65 => Ok(Opcode::UnequalInt),
            0x66 => Ok(Opcode::UnequalFloat),
            0x68 => Ok(Opcode::GreaterByte),
            0x69 => Ok(Opcode::GreaterInt),
            0x6A => Ok(Opcode::GreaterFloat),
            0x6C => Ok(Opcode::SmallerByte),
            0x6D => Ok(Opcode::SmallerInt),
            0x6E => Ok(Opcode::SmallerFloat),

            // Bitwise (byte only)
            0x70 => Ok(Opcode::And),
            0x71 => Ok(Opcode::Or),
            0x72 => Ok(Opcode::Not),
            0x73 => Ok(Opcode::Xor),

            // Control flow
            0xE0 => Ok(Opcode::Ret),
            0xE1 => Ok(Opcode::Jmp),
            0xE4 => Ok(Opcode::JmpzByte),
            0xE5 => Ok(Opcode::JmpzInt),
            0xE6 => Ok(Opcode::JmpzFloat),
            0xE8 => Ok(Opcode::JmpzByteAddress),
            0xE9 => Ok(Opcode::JmpzIntAddress),
            0xEA => Ok(Opcode::JmpzFloatAddress),
            0xEC => Ok(Opcode::JmpnzByte),
            0xED => Ok(Opcode::JmpnzInt),
            0xEE => Ok(Opcode::JmpnzFloat),
            0xF0 => Ok(Opcode::JmpnzByteAddress),
            0xF1 => Ok(Opcode::JmpnzIntAddress),
            0xF2 => Ok(Opcode::JmpnzFloatAddress),
            0xF8 => Ok(Opcode::Call),
            0xF9 => Ok(Opcode::CallAddress),

            _ => Err(DecodeError::UnknownOpcode(value)),
        }
    }
}

impl Opcode {
    /// Returns the mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::End => "end",
            Opcode::PushByte => "push-byte",
            Opcode::PushInt => "push-int",
            Opcode::PushFloat => "push-float",
            Opcode::PopByte => "pop-byte",
            Opcode::PopInt => "pop-int",
            Opcode::PopFloat => "pop-float",
            Opcode::GetByte => "get-byte",
            Opcode::GetInt => "get-int",
            Opcode::GetFloat => "get-float",
            Opcode::PutByte => "put-byte",
            Opcode::PutInt => "put-int",
            Opcode::PutFloat => "put-float",
            Opcode::GetByteAddress => "get-byte-address",
            Opcode::GetIntAddress => "get-int-address",
            Opcode::GetFloatAddress => "get-float-address",
            Opcode::PutByteAddress => "put-byte-address",
            Opcode::PutIntAddress => "put-int-address",
            Opcode::PutFloatAddress => "put-float-address",
            Opcode::GetByteStack => "get-byte-stack",
            Opcode::GetIntStack => "get-int-stack",
            Opcode::GetFloatStack => "get-float-stack",
            Opcode::PutByteStack => "put-byte-stack",
            Opcode::PutIntStack => "put-int-stack",
            Opcode::PutFloatStack => "put-float-stack",
            Opcode::AddByte => "add-byte",
            Opcode::AddInt => "add-int",
            Opcode::AddFloat => "add-float",
            Opcode::SubByte => "sub-byte",
            Opcode::SubInt => "sub-int",
            Opcode::SubFloat => "sub-float",
            Opcode::MulByte => "mul-byte",
            Opcode::MulInt => "mul-int",
            Opcode::MulFloat => "mul-float",
            Opcode::DivByte => "div-byte",
            Opcode::DivInt => "div-int",
            Opcode::DivFloat => "div-float",
            Opcode::EqualByte => "equal-byte",
            Opcode::EqualInt => "equal-int",
            Opcode::EqualFloat => "equal-float",
            Opcode::UnequalByte => "unequal-byte",
            Opcode::UnequalInt => "unequal-int",
            Opcode::UnequalFloat => "unequal-float",
            Opcode::GreaterByte => "greater-byte",
            Opcode::GreaterInt => "greater-int",
            Opcode::GreaterFloat => "greater-float",
            Opcode::SmallerByte => "smaller-byte",
            Opcode::SmallerInt => "smaller-int",
            Opcode::SmallerFloat => "smaller-float",
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Not => "not",
            Opcode::Xor => "xor",
            Opcode::Ret => "ret",
            Opcode::Jmp => "jmp",
            Opcode::JmpzByte => "jmpz-byte",
            Opcode::JmpzInt => "jmpz-int",
            Opcode::JmpzFloat => "jmpz-float",
            Opcode::JmpzByteAddress => "jmpz-byte-address",
            Opcode::JmpzIntAddress => "jmpz-int-address",
            Opcode::JmpzFloatAddress => "jmpz-float-address",
            Opcode::JmpnzByte => "jmpnz-byte",
            Opcode::JmpnzInt => "jmpnz-int",
            Opcode::JmpnzFloat => "jmpnz-float",
            Opcode::JmpnzByteAddress => "jmpnz-byte-address",
            Opcode::JmpnzIntAddress => "jmpnz-int-address",
            Opcode::JmpnzFloatAddress => "jmpnz-float-address",
            Opcode::Call => "call",
            Opcode::CallAddress => "call-address",
        }
    }

    /// The literal operand this opcode expects after it.
    pub fn operand(&self) -> OperandKind {
        match self {
            Opcode::PushByte => OperandKind::Byte,
            Opcode::PushInt => OperandKind::Int,
            Opcode::PushFloat => OperandKind::Float,

            Opcode::GetByteAddress
            | Opcode::GetIntAddress
            | Opcode::GetFloatAddress
            | Opcode::PutByteAddress
            | Opcode::PutIntAddress
            | Opcode::PutFloatAddress
            | Opcode::Jmp
            | Opcode::JmpzByteAddress
            | Opcode::JmpzIntAddress
            | Opcode::JmpzFloatAddress
            | Opcode::JmpnzByteAddress
            | Opcode::JmpnzIntAddress
            | Opcode::JmpnzFloatAddress
            | Opcode::CallAddress => OperandKind::Address,

            Opcode::GetByteStack
            | Opcode::GetIntStack
            | Opcode::GetFloatStack
            | Opcode::PutByteStack
            | Opcode::PutIntStack
            | Opcode::PutFloatStack => OperandKind::Offset,

            _ => OperandKind::None,
        }
    }

    /// Total encoded length: the opcode byte plus its operand.
    pub fn encoded_len(&self) -> usize {
        1 + self.operand().width()
    }

    /// The value type a typed family member operates on.
    ///
    /// `None` for the untyped opcodes (`end`, bitwise ops, `ret`, `jmp`,
    /// `call`, `call-address`).
    pub fn value_type(&self) -> Option<ValueType> {
        let byte = *self as u8;
        match self {
            Opcode::End
            | Opcode::And
            | Opcode::Or
            | Opcode::Not
            | Opcode::Xor
            | Opcode::Ret
            | Opcode::Jmp
            | Opcode::Call
            | Opcode::CallAddress => None,
            _ => ValueType::from_index(byte & 0x03),
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
