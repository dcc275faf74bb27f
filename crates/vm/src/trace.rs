//! Per-instruction diagnostics.
//!
//! The machine hands every executed step to a [`TraceSink`]. Sinks observe
//! only; nothing they do can change what the machine executes next.

use crate::error::VmError;
use stackvm_common::Instruction;

/// What happened to the instruction at `at`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome<'a> {
    /// Executed; pc moved on.
    Continued,
    /// `end` reached.
    Halted,
    /// The instruction failed and the machine stopped.
    Failed(&'a VmError),
}

/// One executed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceEvent<'a> {
    /// Address of the instruction.
    pub at: usize,
    /// The decoded instruction; `None` if decoding itself failed.
    pub instruction: Option<Instruction>,
    /// Stack pointer after the step.
    pub stack_pointer: usize,
    pub outcome: Outcome<'a>,
}

pub trait TraceSink {
    fn record(&mut self, event: &TraceEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {
    fn record(&mut self, _event: &TraceEvent<'_>) {}
}

/// Forwards events to `tracing`: executed steps at TRACE, the halt at DEBUG,
/// failures at WARN.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn record(&mut self, event: &TraceEvent<'_>) {
        let instruction = match &event.instruction {
            Some(instr) => instr.to_string(),
            None => "<undecoded>".to_string(),
        };
        let at = event.at;
        let sp = event.stack_pointer;
        match event.outcome {
            Outcome::Continued => tracing::trace!(at, sp, %instruction, "step"),
            Outcome::Halted => tracing::debug!(at, sp, "end"),
            Outcome::Failed(err) => tracing::warn!(at, sp, %instruction, error = %err, "fault"),
        }
    }
}

impl<F> TraceSink for F
where
    F: FnMut(&TraceEvent<'_>),
{
    fn record(&mut self, event: &TraceEvent<'_>) {
        self(event)
    }
}
