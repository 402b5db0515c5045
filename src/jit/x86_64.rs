//! Baseline x86-64 translator.
//!
//! Template translation over a runtime-stack slot plan: every ASTC value
//! lives on the machine stack, locals live in the frame below `rbp`.
//! Nothing is register-allocated; correctness over cleverness.
//!
//! Translated subset: `i32.const`, `i32.add/sub/mul`, `local.get/set/tee`,
//! `drop`, `return`. Structural markers and everything else emit `nop` —
//! unknown opcodes never abort a translation.
//!
//! i32 operations work on `eax`/`ecx` (upper halves zeroed by the 32-bit
//! forms); the final return sign-extends `eax` so negative i32 results
//! round-trip through the `fn() -> i64` entry convention.

use crate::bytecode::{AstcProgram, Opcode, Operand};

/// What the translated code does when control leaves the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Epilogue {
    /// Standard function return (`ret`) — the JIT entry convention.
    Return,
    /// Linux `exit` syscall with the result as the status — the AOT path.
    ExitSyscall,
}

struct Asm {
    code: Vec<u8>,
}

impl Asm {
    fn new() -> Self {
        Self { code: Vec::new() }
    }

    fn emit(&mut self, bytes: &[u8]) {
        self.code.extend_from_slice(bytes);
    }

    fn emit_u32(&mut self, value: u32) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    // push rbp
    fn push_rbp(&mut self) {
        self.emit(&[0x55]);
    }
    // mov rbp, rsp
    fn mov_rbp_rsp(&mut self) {
        self.emit(&[0x48, 0x89, 0xE5]);
    }
    // sub rsp, imm32
    fn sub_rsp(&mut self, imm: u32) {
        self.emit(&[0x48, 0x81, 0xEC]);
        self.emit_u32(imm);
    }
    // mov eax, imm32
    fn mov_eax_imm(&mut self, imm: i32) {
        self.emit(&[0xB8]);
        self.emit_u32(imm as u32);
    }
    // push rax / pop rax / pop rcx
    fn push_rax(&mut self) {
        self.emit(&[0x50]);
    }
    fn pop_rax(&mut self) {
        self.emit(&[0x58]);
    }
    fn pop_rcx(&mut self) {
        self.emit(&[0x59]);
    }
    // add/sub/imul eax, ecx
    fn add_eax_ecx(&mut self) {
        self.emit(&[0x01, 0xC8]);
    }
    fn sub_eax_ecx(&mut self) {
        self.emit(&[0x29, 0xC8]);
    }
    fn imul_eax_ecx(&mut self) {
        self.emit(&[0x0F, 0xAF, 0xC1]);
    }
    // mov rax, [rbp + disp32]
    fn mov_rax_frame(&mut self, disp: i32) {
        self.emit(&[0x48, 0x8B, 0x85]);
        self.emit_u32(disp as u32);
    }
    // mov [rbp + disp32], rax
    fn mov_frame_rax(&mut self, disp: i32) {
        self.emit(&[0x48, 0x89, 0x85]);
        self.emit_u32(disp as u32);
    }
    // mov rax, [rsp]
    fn mov_rax_stack_top(&mut self) {
        self.emit(&[0x48, 0x8B, 0x04, 0x24]);
    }
    // add rsp, 8
    fn drop_cell(&mut self) {
        self.emit(&[0x48, 0x83, 0xC4, 0x08]);
    }
    // movsxd rax, eax
    fn sign_extend_eax(&mut self) {
        self.emit(&[0x48, 0x63, 0xC0]);
    }
    // xor eax, eax
    fn zero_eax(&mut self) {
        self.emit(&[0x31, 0xC0]);
    }
    // mov rsp, rbp; pop rbp
    fn leave_frame(&mut self) {
        self.emit(&[0x48, 0x89, 0xEC, 0x5D]);
    }
    fn ret(&mut self) {
        self.emit(&[0xC3]);
    }
    fn nop(&mut self) {
        self.emit(&[0x90]);
    }
    // mov edi, eax; mov eax, 60; syscall
    fn exit_syscall(&mut self) {
        self.emit(&[0x89, 0xC7]);
        self.emit(&[0xB8]);
        self.emit_u32(60);
        self.emit(&[0x0F, 0x05]);
    }
}

/// Frame displacement of a local slot (8 bytes per cell, below rbp).
fn slot_disp(slot: u32) -> i32 {
    -8 * (slot as i32 + 1)
}

/// Highest local slot referenced anywhere in the program, as a count.
fn local_frame_cells(program: &AstcProgram) -> u32 {
    let mut max = 0u32;
    for inst in &program.instructions {
        if matches!(
            inst.opcode,
            Opcode::LocalGet | Opcode::LocalSet | Opcode::LocalTee
        ) {
            if let Some(slot) = inst.operand.as_index() {
                max = max.max(slot + 1);
            }
        }
    }
    max
}

/// Translate a program to x86-64 machine code.
pub fn translate(program: &AstcProgram, epilogue: Epilogue) -> Vec<u8> {
    let mut asm = Asm::new();

    asm.push_rbp();
    asm.mov_rbp_rsp();
    let cells = local_frame_cells(program);
    if cells > 0 {
        // Round the frame to 16 bytes.
        asm.sub_rsp(((cells as u32 * 8) + 15) & !15);
    }

    let finish = |asm: &mut Asm| match epilogue {
        Epilogue::Return => {
            asm.leave_frame();
            asm.ret();
        }
        Epilogue::ExitSyscall => {
            asm.exit_syscall();
        }
    };

    let mut ended_with_return = false;
    for inst in &program.instructions {
        ended_with_return = false;
        match (inst.opcode, inst.operand) {
            (Opcode::I32Const, Operand::I32(v)) => {
                asm.mov_eax_imm(v);
                asm.push_rax();
            }
            (Opcode::I32Add, _) => {
                asm.pop_rcx();
                asm.pop_rax();
                asm.add_eax_ecx();
                asm.push_rax();
            }
            (Opcode::I32Sub, _) => {
                asm.pop_rcx();
                asm.pop_rax();
                asm.sub_eax_ecx();
                asm.push_rax();
            }
            (Opcode::I32Mul, _) => {
                asm.pop_rcx();
                asm.pop_rax();
                asm.imul_eax_ecx();
                asm.push_rax();
            }
            (Opcode::LocalGet, Operand::Index(slot)) => {
                asm.mov_rax_frame(slot_disp(slot));
                asm.push_rax();
            }
            (Opcode::LocalSet, Operand::Index(slot)) => {
                asm.pop_rax();
                asm.mov_frame_rax(slot_disp(slot));
            }
            (Opcode::LocalTee, Operand::Index(slot)) => {
                asm.mov_rax_stack_top();
                asm.mov_frame_rax(slot_disp(slot));
            }
            (Opcode::Drop, _) => {
                asm.drop_cell();
            }
            (Opcode::Return, _) => {
                asm.pop_rax();
                asm.sign_extend_eax();
                finish(&mut asm);
                ended_with_return = true;
            }
            // Structural markers and unsupported opcodes degrade to nop.
            _ => {
                asm.nop();
            }
        }
    }

    if !ended_with_return {
        // Zero-returning fallback epilogue.
        asm.zero_eax();
        finish(&mut asm);
    }

    asm.code
}
