//! Opcode dispatch and the operation handlers.
//!
//! Handlers are generic over the scalar type; [`typed!`] picks the concrete
//! type from the instruction's [`ValueType`]. Binary operations pop B (the
//! top) first, then A, and compute `A op B`.

use crate::error::Fault;
use crate::machine::VirtualMachine;
use crate::trace::TraceSink;
use stackvm_common::{
    ArithOp, BitOp, CompareOp, Condition, Instruction, Literal, Opcode, Scalar, ValueType,
};

/// Where the pc goes after a handler succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Fall through to the next instruction.
    Next,
    /// Continue at a validated address.
    Jump(usize),
    /// `end`.
    Halt,
}

/// Value pushed by comparisons.
const TRUE: u8 = 0xFF;
const FALSE: u8 = 0x00;

/// Bind `$T` to the Rust type for a [`ValueType`] and evaluate `$body`.
macro_rules! typed {
    ($ty:expr, $T:ident => $body:expr) => {
        match $ty {
            ValueType::Byte => {
                type $T = u8;
                $body
            }
            ValueType::Int => {
                type $T = i64;
                $body
            }
            ValueType::Float => {
                type $T = f64;
                $body
            }
        }
    };
}

/// Arithmetic with the wrapping / IEEE-754 rules of each value type.
pub(crate) trait Arithmetic: Scalar {
    /// `None` when the operation has no defined result (integer division
    /// by zero).
    fn apply(op: ArithOp, a: Self, b: Self) -> Option<Self>;
}

impl Arithmetic for u8 {
    fn apply(op: ArithOp, a: u8, b: u8) -> Option<u8> {
        match op {
            ArithOp::Add => Some(a.wrapping_add(b)),
            ArithOp::Sub => Some(a.wrapping_sub(b)),
            ArithOp::Mul => Some(a.wrapping_mul(b)),
            ArithOp::Div => a.checked_div(b),
        }
    }
}

impl Arithmetic for i64 {
    fn apply(op: ArithOp, a: i64, b: i64) -> Option<i64> {
        match op {
            ArithOp::Add => Some(a.wrapping_add(b)),
            ArithOp::Sub => Some(a.wrapping_sub(b)),
            ArithOp::Mul => Some(a.wrapping_mul(b)),
            // i64::MIN / -1 wraps to i64::MIN.
            ArithOp::Div => (b != 0).then(|| a.wrapping_div(b)),
        }
    }
}

impl Arithmetic for f64 {
    fn apply(op: ArithOp, a: f64, b: f64) -> Option<f64> {
        Some(match op {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
        })
    }
}

impl<S: TraceSink> VirtualMachine<S> {
    /// Execute one decoded instruction located at `self.pc`.
    pub(crate) fn execute(&mut self, instr: &Instruction) -> Result<Flow, Fault> {
        match *instr {
            Instruction::End => Ok(Flow::Halt),

            // Stack literals
            Instruction::Push(Literal::Byte(v)) => self.exec_push(v),
            Instruction::Push(Literal::Int(v)) => self.exec_push(v),
            Instruction::Push(Literal::Float(v)) => self.exec_push(v),
            Instruction::Pop(ty) => typed!(ty, T => self.exec_pop::<T>()),

            // Memory access
            Instruction::Get(ty) => typed!(ty, T => self.exec_get::<T>()),
            Instruction::Put(ty) => typed!(ty, T => self.exec_put::<T>()),
            Instruction::GetAddress(ty, address) => {
                typed!(ty, T => self.exec_get_address::<T>(address))
            }
            Instruction::PutAddress(ty, address) => {
                typed!(ty, T => self.exec_put_address::<T>(address))
            }
            Instruction::GetStack(ty, offset) => typed!(ty, T => self.exec_get_stack::<T>(offset)),
            Instruction::PutStack(ty, offset) => typed!(ty, T => self.exec_put_stack::<T>(offset)),

            // Arithmetic & logic
            Instruction::Arith(op, ty) => typed!(ty, T => self.exec_arith::<T>(op)),
            Instruction::Compare(op, ty) => typed!(ty, T => self.exec_compare::<T>(op)),
            Instruction::Bitwise(op) => self.exec_bitwise(op),
            Instruction::Not => self.exec_not(),

            // Control flow
            Instruction::Ret => self.exec_ret(),
            Instruction::Jmp(address) => self.exec_jmp(address),
            Instruction::Branch(cond, ty) => typed!(ty, T => self.exec_branch::<T>(cond)),
            Instruction::BranchAddress(cond, ty, address) => {
                typed!(ty, T => self.exec_branch_address::<T>(cond, address))
            }
            Instruction::Call => self.exec_call(),
            Instruction::CallAddress(address) => self.exec_call_address(address),
        }
    }

    fn push<T: Scalar>(&mut self, value: T) -> Result<(), Fault> {
        Ok(self.stack.push(&mut self.memory, value)?)
    }

    fn pop<T: Scalar>(&mut self) -> Result<T, Fault> {
        Ok(self.stack.pop(&self.memory)?)
    }

    /// Validate a jump target: `0 <= address < memory size`.
    fn target(&self, address: i64) -> Result<usize, Fault> {
        usize::try_from(address)
            .ok()
            .filter(|&target| target < self.memory.size())
            .ok_or(Fault::IllegalAddress(address))
    }

    // ---- Stack literals ----

    fn exec_push<T: Scalar>(&mut self, value: T) -> Result<Flow, Fault> {
        self.push(value)?;
        Ok(Flow::Next)
    }

    fn exec_pop<T: Scalar>(&mut self) -> Result<Flow, Fault> {
        self.pop::<T>()?;
        Ok(Flow::Next)
    }

    // ---- Memory access ----

    fn exec_get<T: Scalar>(&mut self) -> Result<Flow, Fault> {
        let address = self.pop::<i64>()?;
        let value: T = self.memory.get(address)?;
        self.push(value)?;
        Ok(Flow::Next)
    }

    fn exec_put<T: Scalar>(&mut self) -> Result<Flow, Fault> {
        let address = self.pop::<i64>()?;
        let value: T = self.pop()?;
        self.memory.put(address, value)?;
        Ok(Flow::Next)
    }

    fn exec_get_address<T: Scalar>(&mut self, address: i64) -> Result<Flow, Fault> {
        let value: T = self.memory.get(address)?;
        self.push(value)?;
        Ok(Flow::Next)
    }

    fn exec_put_address<T: Scalar>(&mut self, address: i64) -> Result<Flow, Fault> {
        let value: T = self.pop()?;
        self.memory.put(address, value)?;
        Ok(Flow::Next)
    }

    fn exec_get_stack<T: Scalar>(&mut self, offset: i64) -> Result<Flow, Fault> {
        let value: T = self.stack.get(&self.memory, offset)?;
        self.push(value)?;
        Ok(Flow::Next)
    }

    /// The offset is applied after the value is popped.
    fn exec_put_stack<T: Scalar>(&mut self, offset: i64) -> Result<Flow, Fault> {
        let value: T = self.pop()?;
        self.stack.put(&mut self.memory, offset, value)?;
        Ok(Flow::Next)
    }

    // ---- Arithmetic & logic ----

    fn exec_arith<T: Arithmetic>(&mut self, op: ArithOp) -> Result<Flow, Fault> {
        let b: T = self.pop()?;
        let a: T = self.pop()?;
        let result = T::apply(op, a, b).ok_or(Fault::DivisionByZero)?;
        self.push(result)?;
        Ok(Flow::Next)
    }

    fn exec_compare<T: Scalar>(&mut self, op: CompareOp) -> Result<Flow, Fault> {
        let b: T = self.pop()?;
        let a: T = self.pop()?;
        self.push(if op.eval(a, b) { TRUE } else { FALSE })?;
        Ok(Flow::Next)
    }

    fn exec_bitwise(&mut self, op: BitOp) -> Result<Flow, Fault> {
        let b: u8 = self.pop()?;
        let a: u8 = self.pop()?;
        self.push(op.eval(a, b))?;
        Ok(Flow::Next)
    }

    fn exec_not(&mut self) -> Result<Flow, Fault> {
        let a: u8 = self.pop()?;
        self.push(!a)?;
        Ok(Flow::Next)
    }

    // ---- Control flow ----

    fn exec_ret(&mut self) -> Result<Flow, Fault> {
        let address = self.pop::<i64>()?;
        Ok(Flow::Jump(self.target(address)?))
    }

    fn exec_jmp(&mut self, address: i64) -> Result<Flow, Fault> {
        Ok(Flow::Jump(self.target(address)?))
    }

    /// Not taken falls through one byte: the target came off the stack, not
    /// the instruction stream.
    fn exec_branch<T: Scalar>(&mut self, cond: Condition) -> Result<Flow, Fault> {
        let address = self.pop::<i64>()?;
        let value: T = self.pop()?;
        let target = self.target(address)?;
        Ok(if cond.is_taken(value.is_zero()) {
            Flow::Jump(target)
        } else {
            Flow::Next
        })
    }

    fn exec_branch_address<T: Scalar>(
        &mut self,
        cond: Condition,
        address: i64,
    ) -> Result<Flow, Fault> {
        let value: T = self.pop()?;
        let target = self.target(address)?;
        Ok(if cond.is_taken(value.is_zero()) {
            Flow::Jump(target)
        } else {
            Flow::Next
        })
    }

    fn exec_call(&mut self) -> Result<Flow, Fault> {
        let address = self.pop::<i64>()?;
        let target = self.target(address)?;
        let return_to = self.pc + Opcode::Call.encoded_len();
        self.push(return_to as i64)?;
        Ok(Flow::Jump(target))
    }

    fn exec_call_address(&mut self, address: i64) -> Result<Flow, Fault> {
        let target = self.target(address)?;
        let return_to = self.pc + Opcode::CallAddress.encoded_len();
        self.push(return_to as i64)?;
        Ok(Flow::Jump(target))
    }
}
