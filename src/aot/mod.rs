//! # AOT ELF writer
//!
//! Turns a bytecode program into a freestanding x86-64 Linux executable:
//! the x86-64 translator runs with an exit-syscall epilogue (the program's
//! return value becomes the process exit status), and the result is wrapped
//! in a minimal ELF64 image — one 64-byte file header, one PT_LOAD program
//! header, code at file offset 0x1000 mapped at 0x401000.
//!
//! The writer emits x86-64 regardless of the build host; the output format
//! is fixed, only the JIT adapts to the machine it runs on.


use std::io::Write;
use std::path::Path;

use crate::bytecode::AstcProgram;
use crate::jit::x86_64::{translate, Epilogue};

/// Virtual address the single PT_LOAD segment maps at.
pub const ENTRY_VADDR: u64 = 0x40_1000;
/// File offset the code is placed at (one page, also the alignment).
pub const CODE_OFFSET: u64 = 0x1000;

const ELF_HEADER_SIZE: u16 = 64;
const PROGRAM_HEADER_SIZE: u16 = 56;

const ET_EXEC: u16 = 2;
const EM_X86_64: u16 = 0x3E;
const PT_LOAD: u32 = 1;
const PF_R: u32 = 4;
const PF_X: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct AotError {
    pub kind: AotErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AotErrorKind {
    Io,
}

impl AotError {
    fn io(path: &Path, err: std::io::Error) -> Self {
        Self {
            kind: AotErrorKind::Io,
            message: format!("{}: {}", path.display(), err),
        }
    }
}

impl std::fmt::Display for AotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AOT error: {}", self.message)
    }
}

impl std::error::Error for AotError {}

/// Compile the program to native code and write an ELF64 executable.
pub fn write_elf(program: &AstcProgram, path: &Path) -> Result<(), AotError> {
    let code = translate(program, Epilogue::ExitSyscall);
    let image = build_image(&code);

    let mut file = std::fs::File::create(path).map_err(|e| AotError::io(path, e))?;
    file.write_all(&image).map_err(|e| AotError::io(path, e))?;
    drop(file);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| AotError::io(path, e))?;
    }

    Ok(())
}

/// Assemble the full file image: ELF header, program header, padding, code.
fn build_image(code: &[u8]) -> Vec<u8> {
    let mut image = Vec::with_capacity(CODE_OFFSET as usize + code.len());

    // --- ELF64 file header (64 bytes) ---
    image.extend_from_slice(&[0x7F, b'E', b'L', b'F']); // magic
    image.push(2); // class: 64-bit
    image.push(1); // data: little-endian
    image.push(1); // version
    image.push(0); // OS ABI: SysV
    image.extend_from_slice(&[0; 8]); // padding
    image.extend_from_slice(&ET_EXEC.to_le_bytes());
    image.extend_from_slice(&EM_X86_64.to_le_bytes());
    image.extend_from_slice(&1u32.to_le_bytes()); // e_version
    image.extend_from_slice(&ENTRY_VADDR.to_le_bytes()); // e_entry
    image.extend_from_slice(&(ELF_HEADER_SIZE as u64).to_le_bytes()); // e_phoff
    image.extend_from_slice(&0u64.to_le_bytes()); // e_shoff
    image.extend_from_slice(&0u32.to_le_bytes()); // e_flags
    image.extend_from_slice(&ELF_HEADER_SIZE.to_le_bytes()); // e_ehsize
    image.extend_from_slice(&PROGRAM_HEADER_SIZE.to_le_bytes()); // e_phentsize
    image.extend_from_slice(&1u16.to_le_bytes()); // e_phnum
    image.extend_from_slice(&0u16.to_le_bytes()); // e_shentsize
    image.extend_from_slice(&0u16.to_le_bytes()); // e_shnum
    image.extend_from_slice(&0u16.to_le_bytes()); // e_shstrndx

    // --- Program header (56 bytes) ---
    image.extend_from_slice(&PT_LOAD.to_le_bytes());
    image.extend_from_slice(&(PF_R | PF_X).to_le_bytes());
    image.extend_from_slice(&CODE_OFFSET.to_le_bytes()); // p_offset
    image.extend_from_slice(&ENTRY_VADDR.to_le_bytes()); // p_vaddr
    image.extend_from_slice(&ENTRY_VADDR.to_le_bytes()); // p_paddr
    image.extend_from_slice(&(code.len() as u64).to_le_bytes()); // p_filesz
    image.extend_from_slice(&(code.len() as u64).to_le_bytes()); // p_memsz
    image.extend_from_slice(&CODE_OFFSET.to_le_bytes()); // p_align

    // --- Pad to the code offset, then the code itself ---
    image.resize(CODE_OFFSET as usize, 0);
    image.extend_from_slice(code);

    image
}
