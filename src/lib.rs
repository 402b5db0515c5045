//! # c99-astc
//!
//! A self-contained C99 compile-and-execute toolchain built around the ASTC
//! stack bytecode.
//!
//! ## Pipeline
//!
//! Source flows through four front-end stages into one of four backends:
//!
//! 1. **Lexer** - Tokenizes C99 source into tokens
//! 2. **Parser** - Parses tokens into a typed Abstract Syntax Tree
//! 3. **Lowering** - Emits ASTC stack bytecode from the AST
//! 4. **Backends** - Interpret on the VM, JIT to native code, emit textual
//!    assembly for six ISAs, or write a standalone ELF64 executable
//!
//! ## Example
//!
//! ```rust
//! use c99_astc::pipeline::Pipeline;
//!
//! let mut pipeline = Pipeline::new();
//! let result = pipeline.compile_and_run("int main() { return 1 + 2 * 3; }");
//! assert_eq!(result, Ok(7));
//! ```
//!
//! The [`pipeline::Pipeline`] facade is the supported entry point; the stage
//! modules are public for tools that need a single stage (the `.astc`
//! loader, disassemblers, test harnesses).

pub mod aot;
pub mod bytecode;
pub mod emitter;
pub mod error;
pub mod ffi;
pub mod jit;
pub mod lexer;
pub mod lowering;
pub mod parser;
pub mod pipeline;
pub mod vm;
