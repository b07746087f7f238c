//! CLI for sfi-verifier
//!
//! Validates the code section of each input against a precomputed DFA
//! table, reporting per-file verdicts.
//!
//! # Usage
//!
//! ```bash
//! sfi-verifier --table subset.dfa program.o other.bin
//! ```
//!
//! Inputs that parse as object files contribute their `.text` (or Mach-O
//! `__text`) section at its stated address; anything else is validated as
//! one raw chunk. The exit code is 0 when every file passes and 1
//! otherwise; one failing file does not stop the remaining files from
//! being checked.

use std::{env, fs, process};

use dfa::{DfaTable, InstructionDfa};
use object::{Object, ObjectSection};
use sfi_verifier::ChunkValidator;

/// Load address assumed for raw (non-object) inputs.
const RAW_CHUNK_LOAD_ADDR: u64 = 0x8000_0000;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 || args[1] != "--table" {
        eprintln!("Usage: {} --table <table.dfa> <binary>...", args[0]);
        process::exit(1);
    }

    let table_path = &args[2];
    let table_bytes = fs::read(table_path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", table_path, e);
        process::exit(1);
    });
    let table = DfaTable::from_bytes(&table_bytes).unwrap_or_else(|e| {
        eprintln!("Failed to load DFA table {}: {}", table_path, e);
        process::exit(1);
    });
    let validator = ChunkValidator::new(&table);

    let mut failed = false;
    for path in &args[3..] {
        match validate_file(&validator, path) {
            Ok(()) => println!("{path}: ok"),
            Err(message) => {
                eprintln!("{path}: {message}");
                failed = true;
            }
        }
    }

    if failed {
        process::exit(1);
    }
}

/// Extracts the code chunk from `path` and validates it.
fn validate_file<D: InstructionDfa>(
    validator: &ChunkValidator<'_, D>,
    path: &str,
) -> Result<(), String> {
    let data = fs::read(path).map_err(|e| format!("failed to read: {e}"))?;

    let (chunk, load_addr) = match object::File::parse(&*data) {
        Ok(file) => {
            let section = file
                .section_by_name(".text")
                .or_else(|| file.section_by_name("__text"))
                .ok_or_else(|| "no code section found".to_string())?;
            let addr = section.address();
            let bytes = section
                .data()
                .map_err(|e| format!("failed to read code section: {e}"))?;
            (bytes.to_vec(), addr)
        }
        Err(_) => (data, RAW_CHUNK_LOAD_ADDR),
    };

    validator
        .validate(&chunk, load_addr)
        .map_err(|e| format!("failed validation: {e}"))
}
