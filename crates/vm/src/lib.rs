//! stackvm virtual machine: executes bytecode from a fixed linear memory.
//!
//! The machine has:
//! - One byte-addressable [`Memory`] holding program, data, and stack
//! - An operand [`Stack`] occupying the top of that memory
//! - A program counter and a run state (running, halted, failed)
//!
//! # Usage
//!
//! ```
//! use stackvm::VirtualMachine;
//! use stackvm_common::{Opcode, ProgramBuilder};
//!
//! let program = ProgramBuilder::new()
//!     .push_int(40)
//!     .push_int(2)
//!     .op(Opcode::AddInt)
//!     .end()
//!     .build();
//!
//! let mut vm = VirtualMachine::new(256, 64).unwrap();
//! vm.load(&program).unwrap();
//! vm.run().unwrap();
//! assert_eq!(vm.stack_contents(), &42i64.to_le_bytes());
//! ```

pub mod config;
pub mod error;
mod execute;
pub mod machine;
pub mod memory;
pub mod stack;
pub mod trace;

pub use config::{VmConfig, DEFAULT_MEMORY_SIZE, DEFAULT_STACK_SIZE};
pub use error::VmError;
pub use machine::{Status, VirtualMachine};
pub use memory::{Memory, MemoryError};
pub use stack::{Stack, StackError, StackState};
pub use trace::{NoopSink, Outcome, TraceEvent, TraceSink, TracingSink};

/// Load `program` at address 0 of a machine built from `config` and run it
/// from address 0.
///
/// The machine is returned on success so callers can inspect the stack and
/// memory.
///
/// # Errors
///
/// Returns [`VmError`] if the configuration is invalid, the program does not
/// fit, or execution fails.
pub fn run(program: &[u8], config: VmConfig) -> Result<VirtualMachine, VmError> {
    let mut vm = VirtualMachine::with_config(config)?;
    vm.load(program)?;
    vm.run()?;
    Ok(vm)
}
