//! Integration tests for the stackvm engine.
//!
//! Organized by instruction group. Programs are built with
//! `ProgramBuilder` or written out as raw bytes.

use stackvm::{
    Memory, MemoryError, Outcome, Stack, StackError, StackState, Status, TraceEvent, TraceSink,
    VirtualMachine, VmConfig, VmError,
};
use stackvm_common::{Instruction, Literal, Opcode, ProgramBuilder, ValueType};

const MEMORY_SIZE: usize = 256;
const STACK_SIZE: usize = 64;
const SENTINEL: i64 = 0x5A5A_5A5A_5A5A_5A5A;

// ============================================================
// Helper functions
// ============================================================

/// A default-sized machine with `program` loaded at address 0.
fn vm_with(program: &[u8]) -> VirtualMachine {
    let mut vm = VirtualMachine::new(MEMORY_SIZE, STACK_SIZE).unwrap();
    vm.load(program).unwrap();
    vm
}

/// Run `program` to completion and return the final stack bytes.
fn run_program(program: &[u8]) -> Result<Vec<u8>, VmError> {
    let mut vm = vm_with(program);
    vm.run()?;
    Ok(vm.stack_contents().to_vec())
}

fn int(value: i64) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

fn float(value: f64) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

/// `push-int a`, `push-int b`, `op`, `end`.
fn binary_int(a: i64, b: i64, op: Opcode) -> Vec<u8> {
    ProgramBuilder::new()
        .push_int(a)
        .push_int(b)
        .op(op)
        .end()
        .build()
}

fn binary_byte(a: u8, b: u8, op: Opcode) -> Vec<u8> {
    ProgramBuilder::new()
        .push_byte(a)
        .push_byte(b)
        .op(op)
        .end()
        .build()
}

fn binary_float(a: f64, b: f64, op: Opcode) -> Vec<u8> {
    ProgramBuilder::new()
        .push_float(a)
        .push_float(b)
        .op(op)
        .end()
        .build()
}

// ============================================================
// Acceptance scenarios
// ============================================================

#[test]
fn scenario_a_add_int() {
    let program = [
        0x09, 0x0C, 0, 0, 0, 0, 0, 0, 0, //
        0x09, 0x06, 0, 0, 0, 0, 0, 0, 0, //
        0x41, 0x00,
    ];
    assert_eq!(run_program(&program), Ok(int(18)));
}

#[test]
fn scenario_b_sub_byte_wraps() {
    let program = [0x08, 0x04, 0x08, 0x06, 0x44, 0x00];
    assert_eq!(run_program(&program), Ok(vec![0xFE]));
}

#[test]
fn scenario_c_overflow_latches_then_blocks() {
    let mut memory = Memory::new(MEMORY_SIZE);
    let mut stack = Stack::new(MEMORY_SIZE, STACK_SIZE).unwrap();
    for i in 0..STACK_SIZE {
        stack.push_byte(&mut memory, i as u8).unwrap();
    }
    assert_eq!(stack.push_byte(&mut memory, 0), Err(StackError::Overflow));
    assert_eq!(stack.pop_byte(&memory), Err(StackError::Blocked));
    assert_eq!(stack.state(), StackState::Overflowed);
}

#[test]
fn scenario_c_through_the_engine() {
    let mut builder = ProgramBuilder::new();
    for i in 0..=STACK_SIZE {
        builder.push_byte(i as u8);
    }
    let program = builder.end().build();
    let mut vm = vm_with(&program);
    let overflow_at = 2 * STACK_SIZE;
    assert_eq!(vm.run(), Err(VmError::StackOverflow { at: overflow_at }));
    assert_eq!(vm.stack().state(), StackState::Overflowed);
    assert_eq!(vm.stack().pointer(), STACK_SIZE);
    assert_eq!(vm.pc(), overflow_at);
}

#[test]
fn scenario_d_call_address_returns_after_operand() {
    let mut builder = ProgramBuilder::new();
    builder.op(Opcode::CallAddress);
    let patch = builder.here();
    builder.int(0).push_int(SENTINEL).end();
    let subroutine = builder.here();
    builder.op(Opcode::Ret).patch_int(patch, subroutine as i64);

    assert_eq!(run_program(&builder.build()), Ok(int(SENTINEL)));
}

#[test]
fn scenario_d_return_address_is_pushed() {
    let program = ProgramBuilder::new()
        .emit(Instruction::CallAddress(20))
        .build();
    let mut vm = vm_with(&program);
    assert_eq!(vm.step(), Ok(Status::Running));
    assert_eq!(vm.pc(), 20);
    assert_eq!(vm.stack_contents(), &int(9)[..]);
}

/// value, target, jmpz-int, push-byte 1, end, [target:] push-byte 2, end
fn jmpz_int_program(value: i64) -> Vec<u8> {
    let mut builder = ProgramBuilder::new();
    builder.push_int(value).op(Opcode::PushInt);
    let patch = builder.here();
    builder.int(0).op(Opcode::JmpzInt).push_byte(1).end();
    let target = builder.here();
    builder.push_byte(2).end().patch_int(patch, target as i64);
    builder.build()
}

#[test]
fn scenario_e_jmpz_int_taken() {
    assert_eq!(run_program(&jmpz_int_program(0)), Ok(vec![2]));
}

#[test]
fn scenario_e_jmpz_int_falls_through_one_byte() {
    let mut vm = vm_with(&jmpz_int_program(-1));
    vm.step().unwrap();
    vm.step().unwrap();
    assert_eq!(vm.pc(), 18);
    vm.step().unwrap();
    assert_eq!(vm.pc(), 19);
    assert_eq!(vm.stack().pointer(), 0);
    vm.run().unwrap();
    assert_eq!(vm.stack_contents(), &[1]);
}

// ============================================================
// Arithmetic
// ============================================================

#[test]
fn operand_order_is_a_op_b() {
    assert_eq!(run_program(&binary_int(10, 3, Opcode::SubInt)), Ok(int(7)));
    assert_eq!(run_program(&binary_int(7, 2, Opcode::DivInt)), Ok(int(3)));
    assert_eq!(
        run_program(&binary_byte(9, 3, Opcode::DivByte)),
        Ok(vec![3])
    );
    assert_eq!(
        run_program(&binary_float(1.0, 4.0, Opcode::DivFloat)),
        Ok(float(0.25))
    );
}

#[test]
fn int_arithmetic_wraps() {
    assert_eq!(
        run_program(&binary_int(i64::MAX, 1, Opcode::AddInt)),
        Ok(int(i64::MIN))
    );
    assert_eq!(
        run_program(&binary_int(i64::MIN, -1, Opcode::DivInt)),
        Ok(int(i64::MIN))
    );
    assert_eq!(
        run_program(&binary_int(-6, 7, Opcode::MulInt)),
        Ok(int(-42))
    );
}

#[test]
fn byte_arithmetic_wraps() {
    assert_eq!(
        run_program(&binary_byte(200, 100, Opcode::AddByte)),
        Ok(vec![44])
    );
    assert_eq!(
        run_program(&binary_byte(16, 17, Opcode::MulByte)),
        Ok(vec![16])
    );
}

#[test]
fn float_arithmetic() {
    assert_eq!(
        run_program(&binary_float(1.5, 2.25, Opcode::AddFloat)),
        Ok(float(3.75))
    );
    assert_eq!(
        run_program(&binary_float(1.0, 0.0, Opcode::DivFloat)),
        Ok(float(f64::INFINITY))
    );
    let nan = run_program(&binary_float(0.0, 0.0, Opcode::DivFloat)).unwrap();
    assert!(f64::from_le_bytes(nan.try_into().unwrap()).is_nan());
}

#[test]
fn int_division_by_zero_fails_and_rewinds() {
    let mut vm = vm_with(&binary_int(1, 0, Opcode::DivInt));
    assert_eq!(vm.run(), Err(VmError::DivisionByZero { at: 18 }));
    // Both operands are back on the stack.
    let mut expected = int(1);
    expected.extend(int(0));
    assert_eq!(vm.stack_contents(), &expected[..]);
    assert_eq!(vm.stack().state(), StackState::Active);
}

#[test]
fn byte_division_by_zero_fails() {
    assert_eq!(
        run_program(&binary_byte(1, 0, Opcode::DivByte)),
        Err(VmError::DivisionByZero { at: 4 })
    );
}

// ============================================================
// Comparison & logic
// ============================================================

#[test]
fn comparisons_push_ff_or_00() {
    assert_eq!(
        run_program(&binary_int(5, 3, Opcode::GreaterInt)),
        Ok(vec![0xFF])
    );
    assert_eq!(
        run_program(&binary_int(5, 3, Opcode::SmallerInt)),
        Ok(vec![0x00])
    );
    assert_eq!(
        run_program(&binary_int(-1, -1, Opcode::EqualInt)),
        Ok(vec![0xFF])
    );
    assert_eq!(
        run_program(&binary_int(-1, -1, Opcode::UnequalInt)),
        Ok(vec![0x00])
    );
    assert_eq!(
        run_program(&binary_float(-0.5, 0.5, Opcode::SmallerFloat)),
        Ok(vec![0xFF])
    );
}

#[test]
fn byte_comparison_is_unsigned() {
    assert_eq!(
        run_program(&binary_byte(0x80, 0x01, Opcode::GreaterByte)),
        Ok(vec![0xFF])
    );
}

#[test]
fn nan_is_unequal_to_itself() {
    assert_eq!(
        run_program(&binary_float(f64::NAN, f64::NAN, Opcode::EqualFloat)),
        Ok(vec![0x00])
    );
    assert_eq!(
        run_program(&binary_float(f64::NAN, f64::NAN, Opcode::UnequalFloat)),
        Ok(vec![0xFF])
    );
}

#[test]
fn bitwise_ops() {
    assert_eq!(
        run_program(&binary_byte(0b1100, 0b1010, Opcode::And)),
        Ok(vec![0b1000])
    );
    assert_eq!(
        run_program(&binary_byte(0b1100, 0b1010, Opcode::Or)),
        Ok(vec![0b1110])
    );
    assert_eq!(
        run_program(&binary_byte(0b1100, 0b1010, Opcode::Xor)),
        Ok(vec![0b0110])
    );
    let not = ProgramBuilder::new()
        .push_byte(0x0F)
        .op(Opcode::Not)
        .end()
        .build();
    assert_eq!(run_program(&not), Ok(vec![0xF0]));
}

// ============================================================
// Memory access
// ============================================================

#[test]
fn put_then_get_int_address() {
    let program = ProgramBuilder::new()
        .push_int(77)
        .emit(Instruction::PutAddress(ValueType::Int, 100))
        .emit(Instruction::GetAddress(ValueType::Int, 100))
        .end()
        .build();
    let mut vm = vm_with(&program);
    vm.run().unwrap();
    assert_eq!(vm.stack_contents(), &int(77)[..]);
    assert_eq!(vm.memory().get_int(100), Ok(77));
}

#[test]
fn put_then_get_byte_address() {
    let program = ProgramBuilder::new()
        .push_byte(0xC3)
        .emit(Instruction::PutAddress(ValueType::Byte, 100))
        .emit(Instruction::GetAddress(ValueType::Byte, 100))
        .end()
        .build();
    let mut vm = vm_with(&program);
    vm.run().unwrap();
    assert_eq!(vm.stack_contents(), &[0xC3][..]);
    assert_eq!(vm.memory().get_byte(100), Ok(0xC3));
    assert_eq!(vm.memory().get_byte(101), Ok(0));
}

#[test]
fn put_then_get_float_address() {
    let program = ProgramBuilder::new()
        .push_float(-2.25)
        .emit(Instruction::PutAddress(ValueType::Float, 100))
        .emit(Instruction::GetAddress(ValueType::Float, 100))
        .end()
        .build();
    let mut vm = vm_with(&program);
    vm.run().unwrap();
    assert_eq!(vm.stack_contents(), &float(-2.25)[..]);
    assert_eq!(vm.memory().get_float(100), Ok(-2.25));
}

#[test]
fn put_and_get_with_address_on_stack() {
    let program = ProgramBuilder::new()
        .push_int(123)
        .push_int(100)
        .op(Opcode::PutInt)
        .push_int(100)
        .op(Opcode::GetInt)
        .end()
        .build();
    assert_eq!(run_program(&program), Ok(int(123)));
}

#[test]
fn int_bytes_are_visible_as_bytes() {
    let program = ProgramBuilder::new()
        .push_int(0x0102)
        .emit(Instruction::PutAddress(ValueType::Int, 100))
        .emit(Instruction::GetAddress(ValueType::Byte, 100))
        .emit(Instruction::GetAddress(ValueType::Byte, 101))
        .end()
        .build();
    assert_eq!(run_program(&program), Ok(vec![0x02, 0x01]));
}

#[test]
fn out_of_bounds_memory_access() {
    let program = ProgramBuilder::new()
        .emit(Instruction::GetAddress(ValueType::Int, 250))
        .end()
        .build();
    assert_eq!(
        run_program(&program),
        Err(VmError::Memory {
            at: 0,
            source: MemoryError {
                address: 250,
                width: 8,
                limit: MEMORY_SIZE,
            },
        })
    );
}

#[test]
fn program_can_overwrite_itself() {
    // Turn the trailing push-byte into end before reaching it.
    let mut builder = ProgramBuilder::new();
    builder.push_byte(0x00).op(Opcode::PutByteAddress);
    let patch = builder.here();
    builder.int(0);
    let target = builder.here();
    builder.push_byte(7).end().patch_int(patch, target as i64);
    assert_eq!(run_program(&builder.build()), Ok(vec![]));
}

// ============================================================
// Stack-relative access
// ============================================================

#[test]
fn get_int_stack_copies_below_top() {
    let program = ProgramBuilder::new()
        .push_int(5)
        .push_int(6)
        .emit(Instruction::GetStack(ValueType::Int, -16))
        .end()
        .build();
    let mut expected = int(5);
    expected.extend(int(6));
    expected.extend(int(5));
    assert_eq!(run_program(&program), Ok(expected));
}

#[test]
fn put_byte_stack_offset_applies_after_pop() {
    let program = ProgramBuilder::new()
        .push_byte(1)
        .push_byte(2)
        .push_byte(9)
        .emit(Instruction::PutStack(ValueType::Byte, -2))
        .end()
        .build();
    assert_eq!(run_program(&program), Ok(vec![9, 2]));
}

#[test]
fn stack_access_outside_window() {
    let program = ProgramBuilder::new()
        .emit(Instruction::GetStack(ValueType::Byte, -1))
        .end()
        .build();
    assert_eq!(
        run_program(&program),
        Err(VmError::Memory {
            at: 0,
            source: MemoryError {
                address: -1,
                width: 1,
                limit: STACK_SIZE,
            },
        })
    );
}

// ============================================================
// Stack faults
// ============================================================

#[test]
fn underflow_rewinds_partial_pops() {
    let program = ProgramBuilder::new()
        .push_int(5)
        .op(Opcode::AddInt)
        .end()
        .build();
    let mut vm = vm_with(&program);
    assert_eq!(vm.run(), Err(VmError::StackUnderflow { at: 9 }));
    assert_eq!(vm.stack().state(), StackState::Underflowed);
    assert_eq!(vm.stack_contents(), &int(5)[..]);
}

#[test]
fn overflow_on_small_stack() {
    let program = ProgramBuilder::new()
        .push_int(1)
        .push_byte(1)
        .end()
        .build();
    let mut vm = VirtualMachine::new(64, 8).unwrap();
    vm.load(&program).unwrap();
    assert_eq!(vm.run(), Err(VmError::StackOverflow { at: 9 }));
    assert_eq!(vm.stack_contents(), &int(1)[..]);
}

#[test]
fn failure_is_terminal() {
    let mut vm = vm_with(&[Opcode::PopByte as u8, 0x00]);
    let err = VmError::StackUnderflow { at: 0 };
    assert_eq!(vm.step(), Err(err.clone()));
    assert_eq!(vm.step(), Err(err));
    assert_eq!(vm.pc(), 0);
}

// ============================================================
// Control flow
// ============================================================

#[test]
fn jmp_to_last_address_is_legal() {
    let last = MEMORY_SIZE as i64 - 1;
    let program = ProgramBuilder::new().emit(Instruction::Jmp(last)).build();
    let mut vm = vm_with(&program);
    vm.run().unwrap();
    assert_eq!(vm.pc(), MEMORY_SIZE - 1);
    assert!(vm.is_halted());
}

#[test]
fn illegal_addresses_are_rejected_everywhere() {
    let size = MEMORY_SIZE as i64;
    let cases: Vec<(Vec<u8>, usize, i64)> = vec![
        (ProgramBuilder::new().emit(Instruction::Jmp(-1)).build(), 0, -1),
        (ProgramBuilder::new().emit(Instruction::Jmp(size)).build(), 0, size),
        (
            ProgramBuilder::new()
                .emit(Instruction::CallAddress(size))
                .build(),
            0,
            size,
        ),
        (
            ProgramBuilder::new()
                .push_int(size)
                .op(Opcode::Call)
                .build(),
            9,
            size,
        ),
        (
            ProgramBuilder::new().push_int(-1).op(Opcode::Ret).build(),
            9,
            -1,
        ),
        // Not taken, but the target is still checked.
        (
            ProgramBuilder::new()
                .push_int(1)
                .push_int(999)
                .op(Opcode::JmpzInt)
                .build(),
            18,
            999,
        ),
        (
            ProgramBuilder::new()
                .push_byte(0)
                .push_int(-5)
                .op(Opcode::JmpnzByte)
                .build(),
            11,
            -5,
        ),
        (
            ProgramBuilder::new()
                .push_int(0)
                .op(Opcode::JmpnzIntAddress)
                .int(size)
                .build(),
            9,
            size,
        ),
        (
            ProgramBuilder::new()
                .push_float(0.0)
                .op(Opcode::JmpzFloatAddress)
                .int(-1)
                .build(),
            9,
            -1,
        ),
    ];
    for (program, at, address) in cases {
        assert_eq!(
            run_program(&program),
            Err(VmError::IllegalAddress { at, address }),
            "program {program:02x?}"
        );
    }
}

#[test]
fn call_pushes_next_address() {
    // push-int target, call, end, [target:] end
    let program = ProgramBuilder::new()
        .push_int(11)
        .op(Opcode::Call)
        .end()
        .end()
        .build();
    let mut vm = vm_with(&program);
    vm.run().unwrap();
    assert_eq!(vm.pc(), 11);
    assert_eq!(vm.stack_contents(), &int(10)[..]);
}

#[test]
fn call_and_ret_through_stack_address() {
    // push-int sub, call, push-int SENTINEL, end, [sub:] ret
    let mut builder = ProgramBuilder::new();
    builder.op(Opcode::PushInt);
    let patch = builder.here();
    builder.int(0).op(Opcode::Call).push_int(SENTINEL).end();
    let subroutine = builder.here();
    builder.op(Opcode::Ret).patch_int(patch, subroutine as i64);
    assert_eq!(run_program(&builder.build()), Ok(int(SENTINEL)));
}

#[test]
fn jmpz_address_variant_skips_operand_when_not_taken() {
    let program = ProgramBuilder::new()
        .push_byte(1)
        .emit(Instruction::BranchAddress(
            stackvm_common::Condition::Zero,
            ValueType::Byte,
            0,
        ))
        .end()
        .build();
    let mut vm = vm_with(&program);
    vm.step().unwrap();
    vm.step().unwrap();
    assert_eq!(vm.pc(), 11);
    assert_eq!(vm.step(), Ok(Status::Halted));
}

#[test]
fn jmpnz_int_address_taken() {
    // push-int 3, jmpnz-int-address skip, push-byte 1, [skip:] end
    let mut builder = ProgramBuilder::new();
    builder.push_int(3).op(Opcode::JmpnzIntAddress);
    let patch = builder.here();
    builder.int(0).push_byte(1);
    let skip = builder.here();
    builder.end().patch_int(patch, skip as i64);
    assert_eq!(run_program(&builder.build()), Ok(vec![]));
}

#[test]
fn float_zero_test_accepts_negative_zero_and_rejects_nan() {
    let branch = |value: f64| {
        let mut builder = ProgramBuilder::new();
        builder.push_float(value).op(Opcode::JmpzFloatAddress);
        let patch = builder.here();
        builder.int(0).push_byte(1).end();
        let target = builder.here();
        builder.push_byte(2).end().patch_int(patch, target as i64);
        run_program(&builder.build())
    };
    assert_eq!(branch(-0.0), Ok(vec![2]));
    assert_eq!(branch(0.0), Ok(vec![2]));
    assert_eq!(branch(f64::NAN), Ok(vec![1]));
    assert_eq!(branch(1e-300), Ok(vec![1]));
}

#[test]
fn countdown_loop() {
    // counter = 3; loop: counter -= 1; jmpnz-int-address loop
    let mut builder = ProgramBuilder::new();
    builder.push_int(3);
    let top = builder.here();
    builder
        .push_int(1)
        .op(Opcode::SubInt)
        .emit(Instruction::GetStack(ValueType::Int, -8))
        .emit(Instruction::BranchAddress(
            stackvm_common::Condition::NonZero,
            ValueType::Int,
            top as i64,
        ))
        .end();
    let mut vm = vm_with(&builder.build());
    vm.run().unwrap();
    assert_eq!(vm.stack_contents(), &int(0)[..]);
    // push + 3 * (push, sub, get, jmpnz) + end
    assert_eq!(vm.steps(), 1 + 3 * 4 + 1);
}

// ============================================================
// Decoding
// ============================================================

#[test]
fn unknown_opcode() {
    assert_eq!(
        run_program(&[0x01]),
        Err(VmError::UnknownOpcode {
            at: 0,
            opcode: 0x01
        })
    );
    let program = ProgramBuilder::new().push_byte(0).byte(0xFF).build();
    assert_eq!(
        run_program(&program),
        Err(VmError::UnknownOpcode {
            at: 2,
            opcode: 0xFF
        })
    );
}

#[test]
fn entry_point_other_than_zero() {
    let program = ProgramBuilder::new()
        .op(Opcode::PopByte)
        .push_byte(4)
        .end()
        .build();
    let mut vm = vm_with(&program);
    vm.set_pc(1);
    vm.run().unwrap();
    assert_eq!(vm.stack_contents(), &[4]);
}

#[test]
fn run_helper_uses_config() {
    let program = ProgramBuilder::new().push_int(1).end().build();
    let vm = stackvm::run(&program, VmConfig::default()).unwrap();
    assert_eq!(vm.stack_contents(), &int(1)[..]);
    assert!(matches!(
        stackvm::run(&program, VmConfig::new(8, 16)),
        Err(VmError::InvalidConfiguration { .. })
    ));
}

// ============================================================
// Trace sink
// ============================================================

#[derive(Default)]
struct Recorder {
    steps: Vec<(usize, Option<Opcode>, bool)>,
}

impl TraceSink for Recorder {
    fn record(&mut self, event: &TraceEvent<'_>) {
        let failed = matches!(event.outcome, Outcome::Failed(_));
        self.steps
            .push((event.at, event.instruction.map(|i| i.opcode()), failed));
    }
}

#[test]
fn sink_sees_every_step() {
    let program = ProgramBuilder::new()
        .push_byte(1)
        .push_byte(0)
        .op(Opcode::DivByte)
        .build();
    let mut vm = vm_with(&program).with_sink(Recorder::default());
    assert!(vm.run().is_err());
    let recorder = vm.into_sink();
    assert_eq!(
        recorder.steps,
        vec![
            (0, Some(Opcode::PushByte), false),
            (2, Some(Opcode::PushByte), false),
            (4, Some(Opcode::DivByte), true),
        ]
    );
}

#[test]
fn closure_sink() {
    let mut count = 0;
    let mut vm = vm_with(&ProgramBuilder::new().push_byte(1).end().build())
        .with_sink(|_: &TraceEvent<'_>| count += 1);
    vm.run().unwrap();
    drop(vm);
    assert_eq!(count, 2);
}

// ============================================================
// Property tests
// ============================================================

mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Push a value, store it at `address` and load it back. The data range
    /// used here sits between the program and the stack window.
    fn store_and_load(push: Instruction, ty: ValueType, address: i64) -> Result<Vec<u8>, VmError> {
        let program = ProgramBuilder::new()
            .emit(push)
            .emit(Instruction::PutAddress(ty, address))
            .emit(Instruction::GetAddress(ty, address))
            .end()
            .build();
        run_program(&program)
    }

    proptest! {
        #[test]
        fn push_int_round_trips(value in any::<i64>()) {
            let program = ProgramBuilder::new().push_int(value).end().build();
            prop_assert_eq!(run_program(&program), Ok(int(value)));
        }

        #[test]
        fn push_byte_round_trips(value in any::<u8>()) {
            let program = ProgramBuilder::new().push_byte(value).end().build();
            prop_assert_eq!(run_program(&program), Ok(vec![value]));
        }

        #[test]
        fn push_float_round_trips(bits in any::<u64>()) {
            let value = f64::from_bits(bits);
            let program = ProgramBuilder::new().push_float(value).end().build();
            prop_assert_eq!(run_program(&program), Ok(bits.to_le_bytes().to_vec()));
        }

        #[test]
        fn put_byte_address_round_trips(address in 32i64..192, value in any::<u8>()) {
            let push = Instruction::Push(Literal::Byte(value));
            prop_assert_eq!(
                store_and_load(push, ValueType::Byte, address),
                Ok(vec![value])
            );
        }

        #[test]
        fn put_int_address_round_trips(address in 32i64..185, value in any::<i64>()) {
            let push = Instruction::Push(Literal::Int(value));
            prop_assert_eq!(
                store_and_load(push, ValueType::Int, address),
                Ok(int(value))
            );
        }

        #[test]
        fn put_float_address_round_trips(address in 32i64..185, bits in any::<u64>()) {
            let push = Instruction::Push(Literal::Float(f64::from_bits(bits)));
            prop_assert_eq!(
                store_and_load(push, ValueType::Float, address),
                Ok(bits.to_le_bytes().to_vec())
            );
        }

        #[test]
        fn add_int_wraps(a in any::<i64>(), b in any::<i64>()) {
            prop_assert_eq!(
                run_program(&binary_int(a, b, Opcode::AddInt)),
                Ok(int(a.wrapping_add(b)))
            );
        }

        #[test]
        fn sub_byte_wraps(a in any::<u8>(), b in any::<u8>()) {
            prop_assert_eq!(
                run_program(&binary_byte(a, b, Opcode::SubByte)),
                Ok(vec![a.wrapping_sub(b)])
            );
        }

        #[test]
        fn mul_float_matches_host(a in -1e150f64..1e150, b in -1e150f64..1e150) {
            prop_assert_eq!(
                run_program(&binary_float(a, b, Opcode::MulFloat)),
                Ok(float(a * b))
            );
        }

        #[test]
        fn random_bytes_never_panic(program in prop::collection::vec(any::<u8>(), 0..128)) {
            let mut vm = VirtualMachine::with_config(
                VmConfig::new(MEMORY_SIZE, STACK_SIZE).with_max_steps(1_000),
            )
            .unwrap();
            vm.load(&program).unwrap();
            let _ = vm.run();
            prop_assert!(vm.stack().pointer() <= STACK_SIZE);
        }
    }
}
