use std::env;
use std::fs;
use std::path::Path;
use std::process;

use c99_astc::emitter::Target;
use c99_astc::pipeline::Pipeline;

fn usage() -> ! {
    eprintln!("Usage: c99-astc <file.c> [--jit] [--asm <target>] [--astc <out>] [--native <out>]");
    eprintln!("  default      compile and interpret, exit with the program's return value");
    eprintln!("  --jit        execute through the JIT instead of the interpreter");
    eprintln!("  --asm        print assembly for one of: x86_64 x86 arm64 arm32 riscv64 riscv32");
    eprintln!("  --astc       write the packed bytecode image");
    eprintln!("  --native     write a standalone ELF64 executable");
    process::exit(1);
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
    }

    let source_path = &args[1];
    let mut use_jit = false;
    let mut asm_target: Option<Target> = None;
    let mut astc_out: Option<String> = None;
    let mut native_out: Option<String> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--jit" => use_jit = true,
            "--asm" => {
                i += 1;
                let name = args.get(i).unwrap_or_else(|| usage());
                match Target::parse(name) {
                    Some(target) => asm_target = Some(target),
                    None => {
                        eprintln!("Unknown target: {}", name);
                        process::exit(1);
                    }
                }
            }
            "--astc" => {
                i += 1;
                astc_out = Some(args.get(i).unwrap_or_else(|| usage()).clone());
            }
            "--native" => {
                i += 1;
                native_out = Some(args.get(i).unwrap_or_else(|| usage()).clone());
            }
            _ => usage(),
        }
        i += 1;
    }

    let source = fs::read_to_string(source_path).unwrap_or_else(|err| {
        eprintln!("Failed to read {}: {}", source_path, err);
        process::exit(1);
    });

    let mut pipeline = Pipeline::new();
    if let Err(err) = pipeline.compile(&source) {
        eprintln!("{}", err);
        process::exit(1);
    }

    if let Some(target) = asm_target {
        match pipeline.emit_assembly(Some(target)) {
            Ok(asm) => print!("{}", asm),
            Err(err) => {
                eprintln!("{}", err);
                process::exit(1);
            }
        }
        return;
    }

    if let Some(out) = astc_out {
        if let Err(err) = pipeline.write_astc(Path::new(&out)) {
            eprintln!("{}", err);
            process::exit(1);
        }
        return;
    }

    if let Some(out) = native_out {
        if let Err(err) = pipeline.astc_to_native(Path::new(&out)) {
            eprintln!("{}", err);
            process::exit(1);
        }
        return;
    }

    let result = if use_jit {
        pipeline.execute_jit()
    } else {
        pipeline.execute()
    };

    match result {
        Ok(value) => process::exit(value as i32),
        Err(err) => {
            eprintln!("{}", err);
            process::exit(1);
        }
    }
}
