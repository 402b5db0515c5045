//! Baseline AArch64 translator.
//!
//! Same runtime-stack slot plan as the x86-64 translator: values on the
//! machine stack (16-byte slots keep `sp` aligned), locals below the frame
//! pointer. Translated subset and nop-degradation rules are identical.

use crate::bytecode::{AstcProgram, Opcode, Operand};

const FP: u32 = 29;
const SP: u32 = 31;

struct Asm {
    code: Vec<u8>,
}

impl Asm {
    fn new() -> Self {
        Self { code: Vec::new() }
    }

    fn emit(&mut self, word: u32) {
        self.code.extend_from_slice(&word.to_le_bytes());
    }

    // stp x29, x30, [sp, #-16]!
    fn prologue_stp(&mut self) {
        self.emit(0xA9BF_7BFD);
    }
    // mov x29, sp
    fn mov_fp_sp(&mut self) {
        self.emit(0x9100_03FD);
    }
    // sub sp, sp, #imm12
    fn sub_sp(&mut self, imm: u32) {
        self.emit(0xD100_0000 | (imm & 0xFFF) << 10 | SP << 5 | SP);
    }
    // movz w0, #imm16
    fn movz_w0(&mut self, imm: u16) {
        self.emit(0x5280_0000 | (imm as u32) << 5);
    }
    // movk w0, #imm16, lsl #16
    fn movk_w0_lsl16(&mut self, imm: u16) {
        self.emit(0x72A0_0000 | (imm as u32) << 5);
    }
    // str x0, [sp, #-16]!  (push)
    fn push_x0(&mut self) {
        self.emit(0xF81F_0C00 | SP << 5);
    }
    // ldr x<rt>, [sp], #16  (pop)
    fn pop_x(&mut self, rt: u32) {
        self.emit(0xF841_0400 | SP << 5 | rt);
    }
    // ldr x0, [sp]  (peek)
    fn peek_x0(&mut self) {
        self.emit(0xF940_0000 | SP << 5);
    }
    // add sp, sp, #16  (drop one cell)
    fn drop_cell(&mut self) {
        self.emit(0x9100_0000 | 16 << 10 | SP << 5 | SP);
    }
    // add/sub w0, w0, w1
    fn add_w0_w1(&mut self) {
        self.emit(0x0B01_0000);
    }
    fn sub_w0_w1(&mut self) {
        self.emit(0x4B01_0000);
    }
    // mul w0, w0, w1  (madd w0, w0, w1, wzr)
    fn mul_w0_w1(&mut self) {
        self.emit(0x1B01_7C00);
    }
    // ldur x0, [x29, #simm9]
    fn load_local(&mut self, disp: i32) {
        self.emit(0xF840_0000 | ((disp as u32) & 0x1FF) << 12 | FP << 5);
    }
    // stur x0, [x29, #simm9]
    fn store_local(&mut self, disp: i32) {
        self.emit(0xF800_0000 | ((disp as u32) & 0x1FF) << 12 | FP << 5);
    }
    // sxtw x0, w0
    fn sign_extend_x0(&mut self) {
        self.emit(0x9340_7C00);
    }
    // mov w0, wzr
    fn zero_w0(&mut self) {
        self.emit(0x2A1F_03E0);
    }
    // mov sp, x29
    fn mov_sp_fp(&mut self) {
        self.emit(0x9100_03BF);
    }
    // ldp x29, x30, [sp], #16
    fn epilogue_ldp(&mut self) {
        self.emit(0xA8C1_7BFD);
    }
    fn ret(&mut self) {
        self.emit(0xD65F_03C0);
    }
    fn nop(&mut self) {
        self.emit(0xD503_201F);
    }
}

fn slot_disp(slot: u32) -> i32 {
    -8 * (slot as i32 + 1)
}

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

/// Translate a program to AArch64 machine code with the JIT `ret`
/// convention.
pub fn translate(program: &AstcProgram) -> Vec<u8> {
    let mut asm = Asm::new();

    asm.prologue_stp();
    asm.mov_fp_sp();
    let cells = local_frame_cells(program);
    if cells > 0 {
        asm.sub_sp((cells * 8 + 15) & !15);
    }

    let finish = |asm: &mut Asm| {
        asm.mov_sp_fp();
        asm.epilogue_ldp();
        asm.ret();
    };

    let mut ended_with_return = false;
    for inst in &program.instructions {
        ended_with_return = false;
        match (inst.opcode, inst.operand) {
            (Opcode::I32Const, Operand::I32(v)) => {
                let bits = v as u32;
                asm.movz_w0(bits as u16);
                if bits >> 16 != 0 {
                    asm.movk_w0_lsl16((bits >> 16) as u16);
                }
                asm.push_x0();
            }
            (Opcode::I32Add, _) => {
                asm.pop_x(1);
                asm.pop_x(0);
                asm.add_w0_w1();
                asm.push_x0();
            }
            (Opcode::I32Sub, _) => {
                asm.pop_x(1);
                asm.pop_x(0);
                asm.sub_w0_w1();
                asm.push_x0();
            }
            (Opcode::I32Mul, _) => {
                asm.pop_x(1);
                asm.pop_x(0);
                asm.mul_w0_w1();
                asm.push_x0();
            }
            (Opcode::LocalGet, Operand::Index(slot)) => {
                asm.load_local(slot_disp(slot));
                asm.push_x0();
            }
            (Opcode::LocalSet, Operand::Index(slot)) => {
                asm.pop_x(0);
                asm.store_local(slot_disp(slot));
            }
            (Opcode::LocalTee, Operand::Index(slot)) => {
                asm.peek_x0();
                asm.store_local(slot_disp(slot));
            }
            (Opcode::Drop, _) => {
                asm.drop_cell();
            }
            (Opcode::Return, _) => {
                asm.pop_x(0);
                asm.sign_extend_x0();
                finish(&mut asm);
                ended_with_return = true;
            }
            _ => {
                asm.nop();
            }
        }
    }

    if !ended_with_return {
        asm.zero_w0();
        finish(&mut asm);
    }

    asm.code
}
