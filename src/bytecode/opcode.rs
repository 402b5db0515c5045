//! The ASTC opcode table.
//!
//! One authoritative numbering for the whole toolchain: the lowering emits
//! these, the VM executes them, the JIT translates them and the packed file
//! format maps a three-opcode legacy subset onto them. The discriminants
//! follow the WebAssembly encoding where an equivalent instruction exists,
//! so a hexdump of an instruction stream reads like a wasm body; ASTC-only
//! instructions (`func`, `string.const`, the `c99.*` family) occupy a
//! private high range.

/// ASTC instruction opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    // === Control ===
    Unreachable = 0x00,
    Nop = 0x01,
    Block = 0x02,
    Loop = 0x03,
    If = 0x04,
    Else = 0x05,
    End = 0x0B,
    Br = 0x0C,
    BrIf = 0x0D,
    Return = 0x0F,
    Call = 0x10,
    Drop = 0x1A,

    // === Variables ===
    LocalGet = 0x20,
    LocalSet = 0x21,
    LocalTee = 0x22,
    GlobalGet = 0x23,
    GlobalSet = 0x24,

    // === Memory ===
    I32Load = 0x28,
    I64Load = 0x29,
    F32Load = 0x2A,
    F64Load = 0x2B,
    I32Store = 0x36,
    I64Store = 0x37,
    F32Store = 0x38,
    F64Store = 0x39,
    I32Store8 = 0x3A,
    I32Store16 = 0x3B,

    // === Constants ===
    I32Const = 0x41,
    I64Const = 0x42,
    F32Const = 0x43,
    F64Const = 0x44,

    // === Comparisons (i32) ===
    I32Eqz = 0x45,
    I32Eq = 0x46,
    I32Ne = 0x47,
    I32LtS = 0x48,
    I32LtU = 0x49,
    I32GtS = 0x4A,
    I32GtU = 0x4B,
    I32LeS = 0x4C,
    I32LeU = 0x4D,
    I32GeS = 0x4E,
    I32GeU = 0x4F,

    // === Arithmetic/logic (i32) ===
    I32Add = 0x6A,
    I32Sub = 0x6B,
    I32Mul = 0x6C,
    I32DivS = 0x6D,
    I32DivU = 0x6E,
    I32RemS = 0x6F,
    I32RemU = 0x70,
    I32And = 0x71,
    I32Or = 0x72,
    I32Xor = 0x73,
    I32Shl = 0x74,
    I32ShrS = 0x75,
    I32ShrU = 0x76,

    // === Conversions ===
    I32WrapI64 = 0xA7,
    I32TruncF32S = 0xA8,
    I32TruncF64S = 0xAA,

    // === ASTC extensions ===
    Func = 0xD0,
    StringConst = 0xD1,

    // === C99 meta (no-ops in the VM; hints for external emitters) ===
    C99Compile = 0xE0,
    C99Parse = 0xE1,
    C99Codegen = 0xE2,
    C99Optimize = 0xE3,
    C99Link = 0xE4,
}

impl Opcode {
    /// Textual mnemonic used by the disassembler and error messages.
    pub fn mnemonic(&self) -> &'static str {
        use Opcode::*;
        match self {
            Unreachable => "unreachable",
            Nop => "nop",
            Block => "block",
            Loop => "loop",
            If => "if",
            Else => "else",
            End => "end",
            Br => "br",
            BrIf => "br_if",
            Return => "return",
            Call => "call",
            Drop => "drop",
            LocalGet => "local.get",
            LocalSet => "local.set",
            LocalTee => "local.tee",
            GlobalGet => "global.get",
            GlobalSet => "global.set",
            I32Load => "i32.load",
            I64Load => "i64.load",
            F32Load => "f32.load",
            F64Load => "f64.load",
            I32Store => "i32.store",
            I64Store => "i64.store",
            F32Store => "f32.store",
            F64Store => "f64.store",
            I32Store8 => "i32.store8",
            I32Store16 => "i32.store16",
            I32Const => "i32.const",
            I64Const => "i64.const",
            F32Const => "f32.const",
            F64Const => "f64.const",
            I32Eqz => "i32.eqz",
            I32Eq => "i32.eq",
            I32Ne => "i32.ne",
            I32LtS => "i32.lt_s",
            I32LtU => "i32.lt_u",
            I32GtS => "i32.gt_s",
            I32GtU => "i32.gt_u",
            I32LeS => "i32.le_s",
            I32LeU => "i32.le_u",
            I32GeS => "i32.ge_s",
            I32GeU => "i32.ge_u",
            I32Add => "i32.add",
            I32Sub => "i32.sub",
            I32Mul => "i32.mul",
            I32DivS => "i32.div_s",
            I32DivU => "i32.div_u",
            I32RemS => "i32.rem_s",
            I32RemU => "i32.rem_u",
            I32And => "i32.and",
            I32Or => "i32.or",
            I32Xor => "i32.xor",
            I32Shl => "i32.shl",
            I32ShrS => "i32.shr_s",
            I32ShrU => "i32.shr_u",
            I32WrapI64 => "i32.wrap_i64",
            I32TruncF32S => "i32.trunc_f32_s",
            I32TruncF64S => "i32.trunc_f64_s",
            Func => "func",
            StringConst => "string.const",
            C99Compile => "c99.compile",
            C99Parse => "c99.parse",
            C99Codegen => "c99.codegen",
            C99Optimize => "c99.optimize",
            C99Link => "c99.link",
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
