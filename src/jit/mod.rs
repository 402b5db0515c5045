//! # JIT Engine
//!
//! Compiles ASTC programs to native machine code on demand.
//!
//! ## Shape
//!
//! - **Hash**: an FNV-1a mix over every `(opcode, operand)` pair identifies
//!   a program; identical instruction streams share one compilation.
//! - **Cache**: an LRU list capped at 100 entries (see [`cache`]); a hit
//!   returns the previously published code pointer.
//! - **Arena**: one writable+executable `mmap` region with a bump cursor
//!   (see [`memory`]); code pointers never move and eviction does not
//!   reclaim bytes.
//! - **Translators**: baseline x86-64 and AArch64 backends over a
//!   runtime-stack slot plan; other hosts report an unsupported-target
//!   error.
//!
//! Entry convention: the published code is called as
//! `extern "C" fn() -> i64`.

pub mod aarch64;
pub mod cache;
pub mod memory;
pub mod x86_64;


use crate::bytecode::AstcProgram;
use cache::CodeCache;
use memory::{ExecutableMemory, DEFAULT_ARENA_SIZE};

#[derive(Debug, Clone, PartialEq)]
pub struct JitError {
    pub kind: JitErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JitErrorKind {
    ArenaExhausted,
    UnsupportedTarget,
}

impl JitError {
    fn arena(message: impl Into<String>) -> Self {
        Self {
            kind: JitErrorKind::ArenaExhausted,
            message: message.into(),
        }
    }

    fn unsupported(message: impl Into<String>) -> Self {
        Self {
            kind: JitErrorKind::UnsupportedTarget,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for JitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JIT error: {}", self.message)
    }
}

impl std::error::Error for JitError {}

pub struct JitEngine {
    arena: ExecutableMemory,
    cache: CodeCache,
    compilations: u64,
}

impl JitEngine {
    pub fn new() -> Result<Self, JitError> {
        Self::with_arena_size(DEFAULT_ARENA_SIZE)
    }

    pub fn with_arena_size(size: usize) -> Result<Self, JitError> {
        Ok(Self {
            arena: ExecutableMemory::new(size)?,
            cache: CodeCache::new(),
            compilations: 0,
        })
    }

    /// FNV-1a-style rolling mix over the instruction stream.
    pub fn hash_program(program: &AstcProgram) -> u64 {
        const FNV_OFFSET: u64 = 0xCBF2_9CE4_8422_2325;
        const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

        let mut hash = FNV_OFFSET;
        for inst in &program.instructions {
            hash ^= inst.opcode as u8 as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
            hash ^= inst.operand.as_i64() as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        hash
    }

    /// Return cached machine code for the program, compiling on a miss.
    pub fn compile(&mut self, program: &AstcProgram) -> Result<(*const u8, usize), JitError> {
        let hash = Self::hash_program(program);
        if let Some(found) = self.cache.lookup(hash) {
            return Ok(found);
        }

        let code = translate_for_host(program)?;
        let ptr = self.arena.install(&code)?;
        self.compilations += 1;
        self.cache.insert(hash, ptr, code.len());
        Ok((ptr, code.len()))
    }

    /// Compile (or fetch) and execute the program.
    pub fn execute(&mut self, program: &AstcProgram) -> Result<i64, JitError> {
        let (code, _) = self.compile(program)?;
        let entry: extern "C" fn() -> i64 = unsafe { std::mem::transmute(code) };
        Ok(entry())
    }

    pub fn cache(&self) -> &CodeCache {
        &self.cache
    }

    pub fn compilations(&self) -> u64 {
        self.compilations
    }

    pub fn arena_used(&self) -> usize {
        self.arena.used()
    }
}

#[cfg(target_arch = "x86_64")]
fn translate_for_host(program: &AstcProgram) -> Result<Vec<u8>, JitError> {
    Ok(x86_64::translate(program, x86_64::Epilogue::Return))
}

#[cfg(target_arch = "aarch64")]
fn translate_for_host(program: &AstcProgram) -> Result<Vec<u8>, JitError> {
    Ok(aarch64::translate(program))
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn translate_for_host(_program: &AstcProgram) -> Result<Vec<u8>, JitError> {
    Err(JitError::unsupported(
        "no JIT backend for this host architecture",
    ))
}
