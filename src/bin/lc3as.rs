//! # `lc3as` — the LC-3 assembler command-line front end
//!
//! Thin glue over the library pipeline: read source, run
//! scan → parse → analyze → emit, and either write the object image or
//! print the accumulated error list and exit non-zero. No object file is
//! ever written when any pre-execution error was found.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, info};

use lc3_assembler::analyzer::analyze;
use lc3_assembler::emitter::emit;
use lc3_assembler::error::ErrorList;
use lc3_assembler::parser::parse;

/// Assemble an LC-3 source file into a big-endian object image.
#[derive(Parser, Debug)]
#[command(name = "lc3as", version, about)]
struct Args {
    /// Path to the `.asm` source file.
    input: PathBuf,

    /// Output object file path. Defaults to the input path with its
    /// extension replaced by `.obj`.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let source = match fs::read_to_string(&args.input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("failed to read {}: {}", args.input.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let file_name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.input.to_string_lossy().into_owned());

    let (listing, mut syntax_errors) = parse(source, file_name);
    debug!("parsed {} line(s)", listing.lines.len());

    let program = analyze(&listing, &mut syntax_errors);
    debug!("symbol table has {} label(s)", program.symbol_table.len());

    if !syntax_errors.is_empty() {
        print_errors(&syntax_errors);
        return ExitCode::FAILURE;
    }

    let mut emit_errors = ErrorList::new("Emit");
    let result = emit(&program, &mut emit_errors);

    if !emit_errors.is_empty() {
        print_errors(&emit_errors);
        return ExitCode::FAILURE;
    }

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("obj"));

    let bytes = result.to_bytes();
    if let Err(err) = fs::write(&output_path, &bytes) {
        eprintln!("failed to write {}: {}", output_path.display(), err);
        return ExitCode::FAILURE;
    }

    info!(
        "wrote {} byte(s) to {} (origin {:#06x})",
        bytes.len(),
        output_path.display(),
        result.origin
    );
    ExitCode::SUCCESS
}

fn print_errors(errors: &ErrorList) {
    eprintln!("{}", errors);
}
