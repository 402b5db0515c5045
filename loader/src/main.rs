//! Thin loader: executes a packed `.astc` bytecode image, or compiles and
//! runs a `.c` source on the fly. The process exit status is the program's
//! return value.

use std::env;
use std::fs;
use std::process;

use c99_astc::bytecode::file::decode_packed;
use c99_astc::ffi::FfiRegistry;
use c99_astc::pipeline::Pipeline;
use c99_astc::vm::Vm;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: simple_loader <file.astc|file.c> [args...]");
        process::exit(1);
    }

    let path = &args[1];
    let result = if path.ends_with(".astc") {
        run_astc(path)
    } else {
        run_c(path)
    };

    match result {
        Ok(value) => process::exit(value as i32),
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    }
}

fn run_astc(path: &str) -> Result<i64, String> {
    let bytes = fs::read(path).map_err(|err| format!("Failed to read {}: {}", path, err))?;
    let program = decode_packed(&bytes).map_err(|err| err.to_string())?;
    let ffi = FfiRegistry::with_baseline();
    let mut vm = Vm::new(&program, &ffi);
    vm.execute().map_err(|err| err.to_string())
}

fn run_c(path: &str) -> Result<i64, String> {
    let source =
        fs::read_to_string(path).map_err(|err| format!("Failed to read {}: {}", path, err))?;
    let mut pipeline = Pipeline::new();
    pipeline.compile_and_run(&source)
}
