//! # Pipeline facade
//!
//! The single entry point callers use: one owning object that carries all
//! per-compilation state (source, AST, bytecode, assembly, last result,
//! last error) plus the process-long FFI registry and JIT engine. There is
//! no global state anywhere in the toolchain; every operation goes through
//! an explicit `Pipeline` value.
//!
//! Each `compile` releases the previous compilation's resources before
//! installing new ones, and a failing stage leaves no partial state behind:
//! accessors only ever observe a fully compiled program or nothing.

use std::path::Path;

use crate::bytecode::{file, AstcProgram};
use crate::emitter::Target;
use crate::ffi::FfiRegistry;
use crate::jit::JitEngine;
use crate::lexer::tokenize;
use crate::lowering::lower;
use crate::parser::{parse, ast::TranslationUnit};
use crate::vm::Vm;

/// Per-compilation options.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    /// Target used by `emit_assembly` when none is given explicitly.
    pub default_target: Target,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            default_target: Target::X86_64,
        }
    }
}

pub struct Pipeline {
    options: CompileOptions,
    source: Option<String>,
    unit: Option<TranslationUnit>,
    program: Option<AstcProgram>,
    assembly: Option<String>,
    last_result: Option<i64>,
    error: Option<String>,
    ffi: FfiRegistry,
    jit: Option<JitEngine>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::with_options(CompileOptions::default())
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Self {
            options,
            source: None,
            unit: None,
            program: None,
            assembly: None,
            last_result: None,
            error: None,
            ffi: FfiRegistry::with_baseline(),
            jit: None,
        }
    }

    /// Drop everything owned by the previous compilation.
    fn reset(&mut self) {
        self.source = None;
        self.unit = None;
        self.program = None;
        self.assembly = None;
        self.last_result = None;
        self.error = None;
    }

    fn fail(&mut self, message: String) -> String {
        self.error = Some(message.clone());
        message
    }

    /// Compile C source down to an ASTC program.
    pub fn compile(&mut self, source: &str) -> Result<(), String> {
        self.reset();
        self.source = Some(source.to_string());

        let lexed = tokenize(source);
        if let Some(err) = lexed.errors.first() {
            return Err(self.fail(err.to_string()));
        }

        let parsed = parse(&lexed.tokens);
        if let Some(err) = parsed.errors.first() {
            return Err(self.fail(err.to_string()));
        }

        let lowered = lower(&parsed.unit);
        if let Some(err) = lowered.errors.first() {
            return Err(self.fail(err.to_string()));
        }

        self.unit = Some(parsed.unit);
        self.program = Some(lowered.program);
        Ok(())
    }

    /// Interpret the compiled program on the VM.
    pub fn execute(&mut self) -> Result<i64, String> {
        let Some(program) = self.program.as_ref() else {
            return Err(self.fail("Nothing compiled: call compile first".to_string()));
        };

        let result = {
            let mut vm = Vm::new(program, &self.ffi);
            vm.execute()
        };

        match result {
            Ok(value) => {
                self.last_result = Some(value);
                Ok(value)
            }
            Err(err) => Err(self.fail(err.to_string())),
        }
    }

    /// Execute through the JIT engine instead of the interpreter.
    pub fn execute_jit(&mut self) -> Result<i64, String> {
        if self.program.is_none() {
            return Err(self.fail("Nothing compiled: call compile first".to_string()));
        }

        if self.jit.is_none() {
            match JitEngine::new() {
                Ok(engine) => self.jit = Some(engine),
                Err(err) => return Err(self.fail(err.to_string())),
            }
        }

        let program = self.program.as_ref().expect("checked above");
        let jit = self.jit.as_mut().expect("installed above");
        match jit.execute(program) {
            Ok(value) => {
                self.last_result = Some(value);
                Ok(value)
            }
            Err(err) => {
                let message = err.to_string();
                self.error = Some(message.clone());
                Err(message)
            }
        }
    }

    /// Compile and interpret in one call; succeeds only when both do.
    pub fn compile_and_run(&mut self, source: &str) -> Result<i64, String> {
        self.compile(source)?;
        self.execute()
    }

    /// Emit textual assembly for the compiled unit.
    pub fn emit_assembly(&mut self, target: Option<Target>) -> Result<&str, String> {
        let Some(unit) = self.unit.as_ref() else {
            return Err(self.fail("Nothing compiled: call compile first".to_string()));
        };

        let target = target.unwrap_or(self.options.default_target);
        match crate::emitter::emit(unit, target) {
            Ok(asm) => {
                self.assembly = Some(asm);
                Ok(self.assembly.as_deref().expect("just installed"))
            }
            Err(err) => Err(self.fail(err.to_string())),
        }
    }

    /// Write the compiled program as a standalone ELF64 executable.
    pub fn astc_to_native(&mut self, path: &Path) -> Result<(), String> {
        let Some(program) = self.program.as_ref() else {
            return Err(self.fail("Nothing compiled: call compile first".to_string()));
        };
        match crate::aot::write_elf(program, path) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err.to_string())),
        }
    }

    /// Persist the compiled program in the packed `.astc` format.
    pub fn write_astc(&mut self, path: &Path) -> Result<(), String> {
        let Some(program) = self.program.as_ref() else {
            return Err(self.fail("Nothing compiled: call compile first".to_string()));
        };
        let bytes = match file::encode_packed(program) {
            Ok(bytes) => bytes,
            Err(err) => return Err(self.fail(err.to_string())),
        };
        match std::fs::write(path, bytes) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(format!("{}: {}", path.display(), err))),
        }
    }

    // === Read-only accessors ===

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn assembly(&self) -> Option<&str> {
        self.assembly.as_deref()
    }

    pub fn program(&self) -> Option<&AstcProgram> {
        self.program.as_ref()
    }

    pub fn last_result(&self) -> Option<i64> {
        self.last_result
    }

    pub fn ffi(&mut self) -> &mut FfiRegistry {
        &mut self.ffi
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
