//! # `lc3vm` — the LC-3 virtual machine command-line front end
//!
//! Loads an assembled object image and runs it against real stdio. Halts
//! normally either on a `HALT` trap or when `PC` walks off the top of
//! memory; an unimplemented opcode or trap vector aborts with a non-zero
//! exit and a message naming what it hit.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use lc3_assembler::isa;
use lc3_assembler::vm::console::StdConsoleIo;
use lc3_assembler::vm::{format_register_dump, Machine};

/// Load and execute an LC-3 object file.
#[derive(Parser, Debug)]
#[command(name = "lc3vm", version, about)]
struct Args {
    /// Path to a `.obj` file produced by `lc3as`.
    object: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let bytes = match fs::read(&args.object) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("failed to read {}: {}", args.object.display(), err);
            return ExitCode::FAILURE;
        }
    };

    if bytes.len() < 2 {
        eprintln!("{}: object file is missing its origin header", args.object.display());
        return ExitCode::FAILURE;
    }

    let origin = u16::from_be_bytes([bytes[0], bytes[1]]);
    let mut machine = Machine::new();
    machine.load_memory(&bytes[2..], origin);
    machine.registers[isa::R_PC] = origin;
    info!("loaded {} word(s) at origin {:#06x}", (bytes.len() - 2) / 2, origin);

    let mut console = StdConsoleIo;
    match machine.run(&mut console) {
        Ok(_reason) => {
            println!("{}", format_register_dump(&machine));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
