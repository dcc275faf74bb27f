//! Bytecode images: building them and reading them back.
//!
//! A program is a flat byte sequence loaded at memory address 0. There is no
//! header; execution starts wherever the caller points the program counter.

use crate::codec::{self, Scalar};
use crate::error::DecodeError;
use crate::instruction::{Instruction, Literal};
use crate::opcode::Opcode;

/// Incrementally assembles a bytecode image.
///
/// Typed instructions go through [`ProgramBuilder::emit`]; the raw writers
/// exist so tests can build deliberately malformed streams.
#[derive(Debug, Clone, Default)]
pub struct ProgramBuilder {
    bytes: Vec<u8>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current length of the image, i.e. the address the next byte lands at.
    pub fn here(&self) -> usize {
        self.bytes.len()
    }

    /// Append an encoded instruction.
    pub fn emit(&mut self, instr: Instruction) -> &mut Self {
        instr.encode_into(&mut self.bytes);
        self
    }

    /// Append a bare opcode byte. Operand bytes, if any, are not written.
    pub fn op(&mut self, opcode: Opcode) -> &mut Self {
        self.bytes.push(opcode as u8);
        self
    }

    pub fn byte(&mut self, value: u8) -> &mut Self {
        self.bytes.push(value);
        self
    }

    pub fn int(&mut self, value: i64) -> &mut Self {
        self.bytes.extend_from_slice(&codec::to_bytes(value));
        self
    }

    pub fn float(&mut self, value: f64) -> &mut Self {
        self.bytes.extend_from_slice(&codec::to_bytes(value));
        self
    }

    pub fn push_byte(&mut self, value: u8) -> &mut Self {
        self.emit(Instruction::Push(Literal::Byte(value)))
    }

    pub fn push_int(&mut self, value: i64) -> &mut Self {
        self.emit(Instruction::Push(Literal::Int(value)))
    }

    pub fn push_float(&mut self, value: f64) -> &mut Self {
        self.emit(Instruction::Push(Literal::Float(value)))
    }

    pub fn end(&mut self) -> &mut Self {
        self.emit(Instruction::End)
    }

    /// Overwrite the int stored at `at`, typically a forward jump target.
    ///
    /// # Panics
    ///
    /// Panics if `at + 8` is past the end of the image.
    pub fn patch_int(&mut self, at: usize, value: i64) -> &mut Self {
        value.encode(&mut self.bytes[at..at + i64::WIDTH]);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

/// Decode a bytecode image linearly from address 0.
///
/// Decoding stops after the first `end` or at the end of the image, since
/// whatever follows an `end` is usually data or unreachable.
pub fn disassemble(bytes: &[u8]) -> Result<Vec<(usize, Instruction)>, DecodeError> {
    let mut out = Vec::new();
    let mut at = 0;

    while at < bytes.len() {
        let instr = Instruction::decode(bytes, at)?;
        out.push((at, instr));
        at += instr.encoded_len();
        if instr == Instruction::End {
            break;
        }
    }

    Ok(out)
}

/// Render a listing, one instruction per line:
/// ```text
/// 0000  09 0c 00 00 00 00 00 00 00  push-int 12
/// ```
pub fn listing(bytes: &[u8]) -> Result<String, DecodeError> {
    let mut text = String::new();
    for (at, instr) in disassemble(bytes)? {
        let raw = &bytes[at..at + instr.encoded_len()];
        let hex: Vec<String> = raw.iter().map(|b| format!("{b:02x}")).collect();
        text.push_str(&format!("{at:04x}  {:<26}  {instr}\n", hex.join(" ")));
    }
    Ok(text)
}
