//! Typed instructions for the stackvm instruction set.
//!
//! An instruction is one opcode byte optionally followed by a fixed-width
//! literal. The width depends only on the opcode:
//! ```text
//! push-byte                     0x08 VV               (2 bytes)
//! push-int / push-float         0x09 VV VV .. VV      (9 bytes)
//! *-address, *-stack, jmp, ...  op   AA AA .. AA      (9 bytes, i64 LE)
//! everything else               op                    (1 byte)
//! ```
//!
//! [`Instruction`] is the decoded form: one variant per opcode family,
//! parameterized by [`ValueType`] and carrying its literal.

use crate::codec::Scalar;
use crate::error::DecodeError;
use crate::opcode::Opcode;

/// The scalar type a typed opcode operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Unsigned 8-bit value.
    Byte,
    /// Signed 64-bit two's complement value.
    Int,
    /// IEEE-754 double.
    Float,
}

impl ValueType {
    /// Maps the low two bits of a typed opcode to its value type.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(ValueType::Byte),
            1 => Some(ValueType::Int),
            2 => Some(ValueType::Float),
            _ => None,
        }
    }

    /// Encoded width in bytes.
    pub fn width(self) -> usize {
        match self {
            ValueType::Byte => u8::WIDTH,
            ValueType::Int => i64::WIDTH,
            ValueType::Float => f64::WIDTH,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::Byte => "byte",
            ValueType::Int => "int",
            ValueType::Float => "float",
        }
    }
}

/// A literal embedded in the instruction stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Byte(u8),
    Int(i64),
    Float(f64),
}

impl Literal {
    pub fn value_type(&self) -> ValueType {
        match self {
            Literal::Byte(_) => ValueType::Byte,
            Literal::Int(_) => ValueType::Int,
            Literal::Float(_) => ValueType::Float,
        }
    }

    /// Append the little-endian encoding to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.resize(start + self.value_type().width(), 0);
        match *self {
            Literal::Byte(v) => v.encode(&mut out[start..]),
            Literal::Int(v) => v.encode(&mut out[start..]),
            Literal::Float(v) => v.encode(&mut out[start..]),
        }
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Byte(v) => write!(f, "{v:#04x}"),
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Float(v) => write!(f, "{v:?}"),
        }
    }
}

/// Binary arithmetic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Binary comparisons. All push `0xFF` for true and `0x00` for false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Equal,
    Unequal,
    Greater,
    Smaller,
}

impl CompareOp {
    /// Evaluate `a <op> b`, where `a` was pushed before `b`.
    pub fn eval<T: PartialOrd>(self, a: T, b: T) -> bool {
        match self {
            CompareOp::Equal => a == b,
            CompareOp::Unequal => a != b,
            CompareOp::Greater => a > b,
            CompareOp::Smaller => a < b,
        }
    }
}

/// Two-operand bitwise operations on bytes. `not` is [`Instruction::Not`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitOp {
    And,
    Or,
    Xor,
}

impl BitOp {
    pub fn eval(self, a: u8, b: u8) -> u8 {
        match self {
            BitOp::And => a & b,
            BitOp::Or => a | b,
            BitOp::Xor => a ^ b,
        }
    }
}

/// When a conditional jump is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// `jmpz`: jump when the popped value is zero.
    Zero,
    /// `jmpnz`: jump when the popped value is not zero.
    NonZero,
}

impl Condition {
    pub fn is_taken(self, value_is_zero: bool) -> bool {
        match self {
            Condition::Zero => value_is_zero,
            Condition::NonZero => !value_is_zero,
        }
    }
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instruction {
    /// `end`: halt cleanly.
    End,
    /// `push-*`: push the literal.
    Push(Literal),
    /// `pop-*`: pop and discard.
    Pop(ValueType),
    /// `get-*`: pop an address, push the value stored there.
    Get(ValueType),
    /// `put-*`: pop an address, pop a value, store it.
    Put(ValueType),
    /// `get-*-address`: push the value at the literal address.
    GetAddress(ValueType, i64),
    /// `put-*-address`: pop a value, store it at the literal address.
    PutAddress(ValueType, i64),
    /// `get-*-stack`: push a copy of the value at the literal stack offset.
    GetStack(ValueType, i64),
    /// `put-*-stack`: pop a value, store it at the literal stack offset.
    PutStack(ValueType, i64),
    Arith(ArithOp, ValueType),
    Compare(CompareOp, ValueType),
    Bitwise(BitOp),
    Not,
    /// Pop an address and jump there.
    Ret,
    /// Jump to the literal address.
    Jmp(i64),
    /// `jmpz-*` / `jmpnz-*`: pop an address, pop a value, maybe jump.
    Branch(Condition, ValueType),
    /// `jmpz-*-address` / `jmpnz-*-address`: pop a value, maybe jump to the literal.
    BranchAddress(Condition, ValueType, i64),
    /// Pop an address, push the return address, jump.
    Call,
    /// Push the return address, jump to the literal address.
    CallAddress(i64),
}

/// Source of the literal operand that follows an opcode.
///
/// Implemented over a plain byte slice for disassembly and over VM memory
/// for execution, so both decode through [`Instruction::read`].
pub trait OperandReader {
    type Error;

    /// Read the next `T::WIDTH` bytes as a little-endian `T`.
    fn read<T: Scalar>(&mut self) -> Result<T, Self::Error>;
}

impl Instruction {
    /// Decode the operand for `opcode` from `reader`.
    pub fn read<R: OperandReader>(opcode: Opcode, reader: &mut R) -> Result<Self, R::Error> {
        Ok(match opcode {
            Opcode::End => Instruction::End,
            Opcode::PushByte => Instruction::Push(Literal::Byte(reader.read::<u8>()?)),
            Opcode::PushInt => Instruction::Push(Literal::Int(reader.read::<i64>()?)),
            Opcode::PushFloat => Instruction::Push(Literal::Float(reader.read::<f64>()?)),
            Opcode::PopByte => Instruction::Pop(ValueType::Byte),
            Opcode::PopInt => Instruction::Pop(ValueType::Int),
            Opcode::PopFloat => Instruction::Pop(ValueType::Float),
            Opcode::GetByte => Instruction::Get(ValueType::Byte),
            Opcode::GetInt => Instruction::Get(ValueType::Int),
            Opcode::GetFloat => Instruction::Get(ValueType::Float),
            Opcode::PutByte => Instruction::Put(ValueType::Byte),
            Opcode::PutInt => Instruction::Put(ValueType::Int),
            Opcode::PutFloat => Instruction::Put(ValueType::Float),
            Opcode::GetByteAddress => Instruction::GetAddress(
                ValueType::Byte,
                reader.read::<i64>()?,
            ),
            Opcode::GetIntAddress => Instruction::GetAddress(ValueType::Int, reader.read::<i64>()?),
            Opcode::GetFloatAddress => Instruction::GetAddress(
                ValueType::Float,
                reader.read::<i64>()?,
            ),
            Opcode::PutByteAddress => Instruction::PutAddress(
                ValueType::Byte,
                reader.read::<i64>()?,
            ),
            Opcode::PutIntAddress => Instruction::PutAddress(ValueType::Int, reader.read::<i64>()?),
            Opcode::PutFloatAddress => Instruction::PutAddress(
                ValueType::Float,
                reader.read::<i64>()?,
            ),
            Opcode::GetByteStack => Instruction::GetStack(ValueType::Byte, reader.read::<i64>()?),
            Opcode::GetIntStack => Instruction::GetStack(ValueType::Int, reader.read::<i64>()?),
            Opcode::GetFloatStack => Instruction::GetStack(ValueType::Float, reader.read::<i64>()?),
            Opcode::PutByteStack => Instruction::PutStack(ValueType::Byte, reader.read::<i64>()?),
            Opcode::PutIntStack => Instruction::PutStack(ValueType::Int, reader.read::<i64>()?),
            Opcode::PutFloatStack => Instruction::PutStack(ValueType::Float, reader.read::<i64>()?),
            Opcode::AddByte => Instruction::Arith(ArithOp::Add, ValueType::Byte),
            Opcode::AddInt => Instruction::Arith(ArithOp::Add, ValueType::Int),
            Opcode::AddFloat => Instruction::Arith(ArithOp::Add, ValueType::Float),
            Opcode::SubByte => Instruction::Arith(ArithOp::Sub, ValueType::Byte),
            Opcode::SubInt => Instruction::Arith(ArithOp::Sub, ValueType::Int),
            Opcode::SubFloat => Instruction::Arith(ArithOp::Sub, ValueType::Float),
            Opcode::MulByte => Instruction::Arith(ArithOp::Mul, ValueType::Byte),
            Opcode::MulInt => Instruction::Arith(ArithOp::Mul, ValueType::Int),
            Opcode::MulFloat => Instruction::Arith(ArithOp::Mul, ValueType::Float),
            Opcode::DivByte => Instruction::Arith(ArithOp::Div, ValueType::Byte),
            Opcode::DivInt => Instruction::Arith(ArithOp::Div, ValueType::Int),
            Opcode::DivFloat => Instruction::Arith(ArithOp::Div, ValueType::Float),
            Opcode::EqualByte => Instruction::Compare(CompareOp::Equal, ValueType::Byte),
            Opcode::EqualInt => Instruction::Compare(CompareOp::Equal, ValueType::Int),
            Opcode::EqualFloat => Instruction::Compare(CompareOp::Equal, ValueType::Float),
            Opcode::UnequalByte => Instruction::Compare(CompareOp::Unequal, ValueType::Byte),
            Opcode::UnequalInt => Instruction::Compare(CompareOp::Unequal, ValueType::Int),
            Opcode::UnequalFloat => Instruction::Compare(CompareOp::Unequal, ValueType::Float),
            Opcode::GreaterByte => Instruction::Compare(CompareOp::Greater, ValueType::Byte),
            Opcode::GreaterInt => Instruction::Compare(CompareOp::Greater, ValueType::Int),
            Opcode::GreaterFloat => Instruction::Compare(CompareOp::Greater, ValueType::Float),
            Opcode::SmallerByte => Instruction::Compare(CompareOp::Smaller, ValueType::Byte),
            Opcode::SmallerInt => Instruction::Compare(CompareOp::Smaller, ValueType::Int),
            Opcode::SmallerFloat => Instruction::Compare(CompareOp::Smaller, ValueType::Float),
            Opcode::And => Instruction::Bitwise(BitOp::And),
            Opcode::Or => Instruction::Bitwise(BitOp::Or),
            Opcode::Xor => Instruction::Bitwise(BitOp::Xor),
            Opcode::Not => Instruction::Not,
            Opcode::Ret => Instruction::Ret,
            Opcode::Jmp => Instruction::Jmp(reader.read::<i64>()?),
            Opcode::JmpzByte => Instruction::Branch(Condition::Zero, ValueType::Byte),
            Opcode::JmpzInt => Instruction::Branch(Condition::Zero, ValueType::Int),
            Opcode::JmpzFloat => Instruction::Branch(Condition::Zero, ValueType::Float),
            Opcode::JmpzByteAddress => Instruction::BranchAddress(
                Condition::Zero,
                ValueType::Byte,
                reader.read::<i64>()?,
            ),
            Opcode::JmpzIntAddress => Instruction::BranchAddress(
                Condition::Zero,
                ValueType::Int,
                reader.read::<i64>()?,
            ),
            Opcode::JmpzFloatAddress => Instruction::BranchAddress(
                Condition::Zero,
                ValueType::Float,
                reader.read::<i64>()?,
            ),
            Opcode::JmpnzByte => Instruction::Branch(Condition::NonZero, ValueType::Byte),
            Opcode::JmpnzInt => Instruction::Branch(Condition::NonZero, ValueType::Int),
            Opcode::JmpnzFloat => Instruction::Branch(Condition::NonZero, ValueType::Float),
            Opcode::JmpnzByteAddress => Instruction::BranchAddress(
                Condition::NonZero,
                ValueType::Byte,
                reader.read::<i64>()?,
            ),
            Opcode::JmpnzIntAddress => Instruction::BranchAddress(
                Condition::NonZero,
                ValueType::Int,
                reader.read::<i64>()?,
            ),
            Opcode::JmpnzFloatAddress => Instruction::BranchAddress(
                Condition::NonZero,
                ValueType::Float,
                reader.read::<i64>()?,
            ),
            Opcode::Call => Instruction::Call,
            Opcode::CallAddress => Instruction::CallAddress(reader.read::<i64>()?),
        })
    }

    /// Decode the instruction starting at `at` in a bytecode image.
    pub fn decode(bytes: &[u8], at: usize) -> Result<Self, DecodeError> {
        let byte = *bytes
            .get(at)
            .ok_or(DecodeError::Truncated { at, width: 1 })?;
        let opcode = Opcode::try_from(byte)
            .map_err(|_| DecodeError::InvalidInstruction { at, opcode: byte })?;
        let mut reader = SliceReader { bytes, pos: at + 1 };
        Instruction::read(opcode, &mut reader)
    }

    /// The opcode this instruction encodes to.
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::End => Opcode::End,
            Instruction::Push(Literal::Byte(_)) => Opcode::PushByte,
            Instruction::Push(Literal::Int(_)) => Opcode::PushInt,
            Instruction::Push(Literal::Float(_)) => Opcode::PushFloat,
            Instruction::Pop(ValueType::Byte) => Opcode::PopByte,
            Instruction::Pop(ValueType::Int) => Opcode::PopInt,
            Instruction::Pop(ValueType::Float) => Opcode::PopFloat,
            Instruction::Get(ValueType::Byte) => Opcode::GetByte,
            Instruction::Get(ValueType::Int) => Opcode::GetInt,
            Instruction::Get(ValueType::Float) => Opcode::GetFloat,
            Instruction::Put(ValueType::Byte) => Opcode::PutByte,
            Instruction::Put(ValueType::Int) => Opcode::PutInt,
            Instruction::Put(ValueType::Float) => Opcode::PutFloat,
            Instruction::GetAddress(ValueType::Byte, _) => Opcode::GetByteAddress,
            Instruction::GetAddress(ValueType::Int, _) => Opcode::GetIntAddress,
            Instruction::GetAddress(ValueType::Float, _) => Opcode::GetFloatAddress,
            Instruction::PutAddress(ValueType::Byte, _) => Opcode::PutByteAddress,
            Instruction::PutAddress(ValueType::Int, _) => Opcode::PutIntAddress,
            Instruction::PutAddress(ValueType::Float, _) => Opcode::PutFloatAddress,
            Instruction::GetStack(ValueType::Byte, _) => Opcode::GetByteStack,
            Instruction::GetStack(ValueType::Int, _) => Opcode::GetIntStack,
            Instruction::GetStack(ValueType::Float, _) => Opcode::GetFloatStack,
            Instruction::PutStack(ValueType::Byte, _) => Opcode::PutByteStack,
            Instruction::PutStack(ValueType::Int, _) => Opcode::PutIntStack,
            Instruction::PutStack(ValueType::Float, _) => Opcode::PutFloatStack,
            Instruction::Arith(ArithOp::Add, ValueType::Byte) => Opcode::AddByte,
            Instruction::Arith(ArithOp::Add, ValueType::Int) => Opcode::AddInt,
            Instruction::Arith(ArithOp::Add, ValueType::Float) => Opcode::AddFloat,
            Instruction::Arith(ArithOp::Sub, ValueType::Byte) => Opcode::SubByte,
            Instruction::Arith(ArithOp::Sub, ValueType::Int) => Opcode::SubInt,
            Instruction::Arith(ArithOp::Sub, ValueType::Float) => Opcode::SubFloat,
            Instruction::Arith(ArithOp::Mul, ValueType::Byte) => Opcode::MulByte,
            Instruction::Arith(ArithOp::Mul, ValueType::Int) => Opcode::MulInt,
            Instruction::Arith(ArithOp::Mul, ValueType::Float) => Opcode::MulFloat,
            Instruction::Arith(ArithOp::Div, ValueType::Byte) => Opcode::DivByte,
            Instruction::Arith(ArithOp::Div, ValueType::Int) => Opcode::DivInt,
            Instruction::Arith(ArithOp::Div, ValueType::Float) => Opcode::DivFloat,
            Instruction::Compare(CompareOp::Equal, ValueType::Byte) => Opcode::EqualByte,
            Instruction::Compare(CompareOp::Equal, ValueType::Int) => Opcode::EqualInt,
            Instruction::Compare(CompareOp::Equal, ValueType::Float) => Opcode::EqualFloat,
            Instruction::Compare(CompareOp::Unequal, ValueType::Byte) => Opcode::UnequalByte,
            Instruction::Compare(CompareOp::Unequal, ValueType::Int) => Opcode::UnequalInt,
            Instruction::Compare(CompareOp::Unequal, ValueType::Float) => Opcode::UnequalFloat,
            Instruction::Compare(CompareOp::Greater, ValueType::Byte) => Opcode::GreaterByte,
            Instruction::Compare(CompareOp::Greater, ValueType::Int) => Opcode::GreaterInt,
            Instruction::Compare(CompareOp::Greater, ValueType::Float) => Opcode::GreaterFloat,
            Instruction::Compare(CompareOp::Smaller, ValueType::Byte) => Opcode::SmallerByte,
            Instruction::Compare(CompareOp::Smaller, ValueType::Int) => Opcode::SmallerInt,
            Instruction::Compare(CompareOp::Smaller, ValueType::Float) => Opcode::SmallerFloat,
            Instruction::Bitwise(BitOp::And) => Opcode::And,
            Instruction::Bitwise(BitOp::Or) => Opcode::Or,
            Instruction::Bitwise(BitOp::Xor) => Opcode::Xor,
            Instruction::Not => Opcode::Not,
            Instruction::Ret => Opcode::Ret,
            Instruction::Jmp(_) => Opcode::Jmp,
            Instruction::Branch(Condition::Zero, ValueType::Byte) => Opcode::JmpzByte,
            Instruction::Branch(Condition::Zero, ValueType::Int) => Opcode::JmpzInt,
            Instruction::Branch(Condition::Zero, ValueType::Float) => Opcode::JmpzFloat,
            Instruction::BranchAddress(Condition::Zero, ValueType::Byte, _) => {
                Opcode::JmpzByteAddress
            }
            Instruction::BranchAddress(Condition::Zero, ValueType::Int, _) => {
                Opcode::JmpzIntAddress
            }
            Instruction::BranchAddress(Condition::Zero, ValueType::Float, _) => {
                Opcode::JmpzFloatAddress
            }
            Instruction::Branch(Condition::NonZero, ValueType::Byte) => Opcode::JmpnzByte,
            Instruction::Branch(Condition::NonZero, ValueType::Int) => Opcode::JmpnzInt,
            Instruction::Branch(Condition::NonZero, ValueType::Float) => Opcode::JmpnzFloat,
            Instruction::BranchAddress(Condition::NonZero, ValueType::Byte, _) => {
                Opcode::JmpnzByteAddress
            }
            Instruction::BranchAddress(Condition::NonZero, ValueType::Int, _) => {
                Opcode::JmpnzIntAddress
            }
            Instruction::BranchAddress(Condition::NonZero, ValueType::Float, _) => {
                Opcode::JmpnzFloatAddress
            }
            Instruction::Call => Opcode::Call,
            Instruction::CallAddress(_) => Opcode::CallAddress,
        }
    }

    /// The literal operand, if the instruction carries one.
    ///
    /// Addresses and offsets are reported as [`Literal::Int`].
    pub fn operand(&self) -> Option<Literal> {
        match *self {
            Instruction::Push(literal) => Some(literal),
            Instruction::GetAddress(_, a)
            | Instruction::PutAddress(_, a)
            | Instruction::GetStack(_, a)
            | Instruction::PutStack(_, a)
            | Instruction::Jmp(a)
            | Instruction::BranchAddress(_, _, a)
            | Instruction::CallAddress(a) => Some(Literal::Int(a)),
            _ => None,
        }
    }

    /// Encoded length: opcode byte plus operand.
    pub fn encoded_len(&self) -> usize {
        self.opcode().encoded_len()
    }

    /// Append the encoded instruction to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.opcode() as u8);
        if let Some(literal) = self.operand() {
            literal.encode_into(out);
        }
    }

    /// Encode to a fresh byte vector.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.opcode().mnemonic())?;
        if let Some(literal) = self.operand() {
            write!(f, " {literal}")?;
        }
        Ok(())
    }
}

/// Reads operands from a byte slice, reporting truncation.
struct SliceReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl OperandReader for SliceReader<'_> {
    type Error = DecodeError;

    fn read<T: Scalar>(&mut self) -> Result<T, DecodeError> {
        let end = self.pos + T::WIDTH;
        let slice = self
            .bytes
            .get(self.pos..end)
            .ok_or(DecodeError::Truncated {
                at: self.pos,
                width: T::WIDTH,
            })?;
        self.pos = end;
        Ok(T::decode(slice))
    }
}
