//! stackvm CLI: run and disassemble bytecode images.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Input/configuration/decode error
//! - 3: Runtime error

mod commands;
mod dump;

use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "run" => commands::run(&args[2..]),
        "disassemble" => commands::disassemble(&args[2..]),
        "--help" | "-h" | "help" => {
            print_usage();
            process::exit(0);
        }
        other => {
            eprintln!("error: unknown command '{other}'");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    if let Err(code) = result {
        process::exit(code);
    }
}

fn print_usage() {
    eprintln!("Usage: stackvm <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  run <program.bin> [options]     Load at address 0 and execute");
    eprintln!("  disassemble <program.bin>       Print an instruction listing");
    eprintln!();
    eprintln!("Run options:");
    eprintln!("  --memory N      Memory size in bytes (default 256)");
    eprintln!("  --stack N       Stack size in bytes (default 64)");
    eprintln!("  --entry N       Start address (default 0)");
    eprintln!("  --max-steps N   Fail after N instructions");
    eprintln!("  --trace         Log every instruction to stderr");
    eprintln!("  --dump          Print memory and stack after the run");
}
