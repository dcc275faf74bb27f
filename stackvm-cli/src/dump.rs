//! Hex dumps of machine state for `run --dump`.
//!
//! Rows hold 16 bytes. The marked cell is bracketed: the pc byte in the
//! memory dump, the stack pointer slot in the stack dump.

use stackvm::{Memory, Stack, StackState};

const ROW: usize = 16;

/// Whole memory, with the byte at `pc` bracketed.
pub fn memory(memory: &Memory, pc: usize) -> String {
    let mut out = header("Memory");
    rows(&mut out, memory.as_bytes(), 0, Some(pc));
    out
}

/// The whole stack window, with the slot at the stack pointer bracketed.
pub fn stack(stack: &Stack, memory: &Memory) -> String {
    let title = match stack.state() {
        StackState::Active => "Stack",
        StackState::Overflowed => "Stack (overflow)",
        StackState::Underflowed => "Stack (underflow)",
    };
    let mut out = header(title);
    let window = memory
        .as_bytes()
        .get(stack.base()..stack.base() + stack.size())
        .unwrap_or(&[]);
    rows(&mut out, window, stack.base(), Some(stack.pointer()));
    out
}

fn header(title: &str) -> String {
    format!("{title:^width$}\n", width = ROW * 4 + 6)
}

/// `marked` is relative to `bytes`; row labels start at `origin`.
fn rows(out: &mut String, bytes: &[u8], origin: usize, marked: Option<usize>) {
    for (row, chunk) in bytes.chunks(ROW).enumerate() {
        let start = row * ROW;
        out.push_str(&format!("{:04x}: ", origin + start));
        for (i, byte) in chunk.iter().enumerate() {
            let cell = if marked == Some(start + i) {
                format!("[{byte:02x}]")
            } else {
                format!(" {byte:02x} ")
            };
            out.push_str(&cell);
        }
        out.push('\n');
    }
}
