//! VM state management: memory, stack, program counter, run state.

use crate::config::VmConfig;
use crate::error::{Fault, VmError};
use crate::execute::Flow;
use crate::memory::{Memory, MemoryError};
use crate::stack::Stack;
use crate::trace::{NoopSink, Outcome, TraceEvent, TraceSink};
use stackvm_common::{Instruction, Opcode, OperandReader, Scalar};

/// Result of a single [`VirtualMachine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// More instructions to execute.
    Running,
    /// `end` reached. Terminal.
    Halted,
}

#[derive(Debug, Clone)]
enum RunState {
    Running,
    Halted,
    Faulted(VmError),
}

/// The stackvm virtual machine.
///
/// Owns one [`Memory`] and the [`Stack`] window at its top. Generic over the
/// trace sink so the default [`NoopSink`] costs nothing.
pub struct VirtualMachine<S = NoopSink> {
    pub(crate) memory: Memory,
    pub(crate) stack: Stack,
    /// Address of the next opcode to fetch.
    pub(crate) pc: usize,
    state: RunState,
    steps: u64,
    max_steps: Option<u64>,
    sink: S,
}

impl VirtualMachine<NoopSink> {
    /// Create a machine with `memory_size` bytes of memory, the top
    /// `stack_size` of which form the stack.
    pub fn new(memory_size: usize, stack_size: usize) -> Result<Self, VmError> {
        Self::with_config(VmConfig::new(memory_size, stack_size))
    }

    pub fn with_config(config: VmConfig) -> Result<Self, VmError> {
        config.validate()?;
        let stack = Stack::new(config.memory_size, config.stack_size).ok_or(
            VmError::InvalidConfiguration {
                memory_size: config.memory_size,
                stack_size: config.stack_size,
            },
        )?;
        Ok(Self {
            memory: Memory::new(config.memory_size),
            stack,
            pc: 0,
            state: RunState::Running,
            steps: 0,
            max_steps: config.max_steps,
            sink: NoopSink,
        })
    }
}

impl<S: TraceSink> VirtualMachine<S> {
    /// Replace the trace sink.
    pub fn with_sink<T: TraceSink>(self, sink: T) -> VirtualMachine<T> {
        VirtualMachine {
            memory: self.memory,
            stack: self.stack,
            pc: self.pc,
            state: self.state,
            steps: self.steps,
            max_steps: self.max_steps,
            sink,
        }
    }

    /// Copy `program` into memory at address 0. The pc is left alone.
    pub fn load(&mut self, program: &[u8]) -> Result<(), VmError> {
        let too_large = VmError::ProgramTooLarge {
            len: program.len(),
            capacity: self.memory.size(),
        };
        if program.len() > self.memory.size() {
            return Err(too_large);
        }
        self.memory.write_bytes(0, program).map_err(|_| too_large)
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Set the entry point before running.
    pub fn set_pc(&mut self, pc: usize) {
        self.pc = pc;
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Occupied stack bytes, bottom first.
    pub fn stack_contents(&self) -> &[u8] {
        self.stack.contents(&self.memory)
    }

    /// Instructions executed so far, `end` included.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.state, RunState::Halted)
    }

    /// Current run state: what the next [`step`](Self::step) would report
    /// without executing anything new.
    pub fn status(&self) -> Result<Status, &VmError> {
        match &self.state {
            RunState::Running => Ok(Status::Running),
            RunState::Halted => Ok(Status::Halted),
            RunState::Faulted(err) => Err(err),
        }
    }

    /// The error that stopped the machine, if any.
    pub fn error(&self) -> Option<&VmError> {
        match &self.state {
            RunState::Faulted(err) => Some(err),
            _ => None,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Execute one instruction.
    ///
    /// Once the machine has halted or failed, it stays that way: further
    /// calls return `Ok(Status::Halted)` or the same error again.
    pub fn step(&mut self) -> Result<Status, VmError> {
        match &self.state {
            RunState::Running => {}
            RunState::Halted => return Ok(Status::Halted),
            RunState::Faulted(err) => return Err(err.clone()),
        }

        let at = self.pc;
        if let Some(limit) = self.max_steps {
            if self.steps >= limit {
                return self.fail(None, VmError::StepLimitExceeded { at, limit });
            }
        }

        let instr = match self.fetch() {
            Ok(instr) => instr,
            Err(fault) => return self.fail(None, fault.at(at)),
        };
        self.steps += 1;

        let saved_pointer = self.stack.pointer();
        let status = match self.execute(&instr) {
            Ok(Flow::Next) => {
                self.pc = at + instr.encoded_len();
                Status::Running
            }
            Ok(Flow::Jump(target)) => {
                self.pc = target;
                Status::Running
            }
            Ok(Flow::Halt) => {
                self.state = RunState::Halted;
                Status::Halted
            }
            Err(fault) => {
                self.stack.rewind(saved_pointer);
                return self.fail(Some(instr), fault.at(at));
            }
        };

        let outcome = match status {
            Status::Running => Outcome::Continued,
            Status::Halted => Outcome::Halted,
        };
        self.sink.record(&TraceEvent {
            at,
            instruction: Some(instr),
            stack_pointer: self.stack.pointer(),
            outcome,
        });
        Ok(status)
    }

    /// Step until `end` or the first error.
    pub fn run(&mut self) -> Result<(), VmError> {
        tracing::debug!(pc = self.pc, "run start");
        let result = loop {
            match self.step() {
                Ok(Status::Running) => {}
                Ok(Status::Halted) => break Ok(()),
                Err(err) => break Err(err),
            }
        };
        tracing::debug!(
            pc = self.pc,
            steps = self.steps,
            sp = self.stack.pointer(),
            ok = result.is_ok(),
            "run end"
        );
        result
    }

    /// Decode the instruction at pc, operand included.
    fn fetch(&self) -> Result<Instruction, Fault> {
        // A pc beyond i64::MAX is beyond any memory that passed validation.
        let at = i64::try_from(self.pc).map_err(|_| MemoryError {
            address: i64::MAX,
            width: 1,
            limit: self.memory.size(),
        })?;
        let byte = self.memory.get_byte(at)?;
        let opcode = Opcode::try_from(byte).map_err(|_| Fault::UnknownOpcode(byte))?;
        let mut reader = MemoryReader {
            memory: &self.memory,
            pos: at + 1,
        };
        Ok(Instruction::read(opcode, &mut reader)?)
    }

    fn fail(&mut self, instruction: Option<Instruction>, err: VmError) -> Result<Status, VmError> {
        self.sink.record(&TraceEvent {
            at: self.pc,
            instruction,
            stack_pointer: self.stack.pointer(),
            outcome: Outcome::Failed(&err),
        });
        self.state = RunState::Faulted(err.clone());
        Err(err)
    }
}

/// Reads instruction operands straight out of VM memory.
struct MemoryReader<'a> {
    memory: &'a Memory,
    pos: i64,
}

impl OperandReader for MemoryReader<'_> {
    type Error = MemoryError;

    fn read<T: Scalar>(&mut self) -> Result<T, MemoryError> {
        let value = self.memory.get(self.pos)?;
        self.pos += T::WIDTH as i64;
        Ok(value)
    }
}
