//! CLI command implementations.

use crate::dump;
use stackvm::{TraceSink, TracingSink, VirtualMachine, VmConfig};
use std::fs;

/// Parsed `run` arguments.
#[derive(Debug)]
struct RunOptions {
    input: String,
    config: VmConfig,
    entry: usize,
    trace: bool,
    dump: bool,
}

/// Load and execute a bytecode image.
pub fn run(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: run requires an input file");
        eprintln!("Usage: stackvm run <program.bin> [--memory N] [--stack N] [--entry N] [--max-steps N] [--trace] [--dump]");
        return Err(1);
    }

    let options = parse_run_args(args)?;
    let program = read_binary(&options.input)?;

    let mut vm = VirtualMachine::with_config(options.config).map_err(|e| {
        eprintln!("error: {e}");
        1
    })?;
    vm.load(&program).map_err(|e| {
        eprintln!("error: {e}");
        1
    })?;
    vm.set_pc(options.entry);

    if options.trace {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
        execute(vm.with_sink(TracingSink), options.dump)
    } else {
        execute(vm, options.dump)
    }
}

fn execute<S: TraceSink>(mut vm: VirtualMachine<S>, show_state: bool) -> Result<(), i32> {
    let result = vm.run();

    if result.is_ok() {
        println!("stack:{}", hex_bytes(vm.stack_contents()));
    }
    if show_state {
        print!("{}", dump::memory(vm.memory(), vm.pc()));
        print!("{}", dump::stack(vm.stack(), vm.memory()));
    }

    result.map_err(|e| {
        eprintln!("runtime error: {e}");
        3
    })
}

/// Print the instruction listing of a bytecode image.
pub fn disassemble(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: disassemble requires an input file");
        eprintln!("Usage: stackvm disassemble <program.bin>");
        return Err(1);
    }

    let bytes = read_binary(&args[0])?;
    let text = stackvm_common::listing(&bytes).map_err(|e| {
        eprintln!("error: invalid bytecode: {e}");
        1
    })?;
    print!("{text}");
    Ok(())
}

fn read_binary(path: &str) -> Result<Vec<u8>, i32> {
    fs::read(path).map_err(|e| {
        eprintln!("error: cannot read '{path}': {e}");
        1
    })
}

fn parse_run_args(args: &[String]) -> Result<RunOptions, i32> {
    let mut options = RunOptions {
        input: args[0].clone(),
        config: VmConfig::default(),
        entry: 0,
        trace: false,
        dump: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--trace" => options.trace = true,
            "--dump" => options.dump = true,
            flag @ ("--memory" | "--stack" | "--entry" | "--max-steps") => {
                let value = args.get(i + 1).ok_or_else(|| {
                    eprintln!("error: {flag} requires a value");
                    1
                })?;
                let n = parse_number(flag, value)?;
                match flag {
                    "--memory" => options.config.memory_size = n,
                    "--stack" => options.config.stack_size = n,
                    "--entry" => options.entry = n,
                    _ => options.config.max_steps = Some(n as u64),
                }
                i += 1;
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                return Err(1);
            }
        }
        i += 1;
    }

    Ok(options)
}

/// Decimal, or hex with a `0x` prefix.
fn parse_number(flag: &str, value: &str) -> Result<usize, i32> {
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|_| {
        eprintln!("error: invalid value '{value}' for {flag}");
        1
    })
}

/// ` 0c 00 ff`, one leading space per byte.
fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!(" {b:02x}")).collect()
}
