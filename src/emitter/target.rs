//! Target descriptors for the textual assembly emitter.
//!
//! Each target supplies its conventional register subset, word size,
//! prologue/epilogue sequences and mnemonic syntax. The emitter itself is
//! target-independent; everything ISA-specific lives in these tables.

/// Supported instruction-set architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    X86_64,
    X86,
    Arm64,
    Arm32,
    RiscV64,
    RiscV32,
}

impl Target {
    pub const ALL: [Target; 6] = [
        Target::X86_64,
        Target::X86,
        Target::Arm64,
        Target::Arm32,
        Target::RiscV64,
        Target::RiscV32,
    ];

    /// Parse a target name as it appears on the CLI.
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "x86_64" | "x86-64" | "amd64" => Target::X86_64,
            "x86" | "i386" => Target::X86,
            "arm64" | "aarch64" => Target::Arm64,
            "arm32" | "arm" => Target::Arm32,
            "riscv64" => Target::RiscV64,
            "riscv32" => Target::RiscV32,
            _ => return None,
        })
    }

    pub fn descriptor(&self) -> &'static TargetDescriptor {
        match self {
            Target::X86_64 => &X86_64,
            Target::X86 => &X86,
            Target::Arm64 => &ARM64,
            Target::Arm32 => &ARM32,
            Target::RiscV64 => &RISCV64,
            Target::RiscV32 => &RISCV32,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.descriptor().name)
    }
}

/// Mnemonic family: decides operand order and immediate syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// Intel-style two-operand (`add eax, ebx`).
    Intel,
    /// ARM three-operand with `#` immediates (`add r0, r0, r1`).
    Arm,
    /// RISC-V three-operand with bare immediates (`add a0, a0, a1`).
    RiscV,
}

pub struct TargetDescriptor {
    pub name: &'static str,
    /// Conventional 8-register subset; index 0 is the expression register,
    /// index 1 the binary-op spill register.
    pub registers: [&'static str; 8],
    pub word_size: u8,
    /// Instruction indentation prefix.
    pub indent: &'static str,
    pub comment: &'static str,
    pub syntax: Syntax,
    pub prologue: &'static [&'static str],
    pub epilogue: &'static [&'static str],
}

pub static X86_64: TargetDescriptor = TargetDescriptor {
    name: "x86_64",
    registers: ["rax", "rbx", "rcx", "rdx", "rsi", "rdi", "r8", "r9"],
    word_size: 8,
    indent: "    ",
    comment: ";",
    syntax: Syntax::Intel,
    prologue: &["push rbp", "mov rbp, rsp"],
    epilogue: &["pop rbp", "ret"],
};

pub static X86: TargetDescriptor = TargetDescriptor {
    name: "x86",
    registers: ["eax", "ebx", "ecx", "edx", "esi", "edi", "esp", "ebp"],
    word_size: 4,
    indent: "    ",
    comment: ";",
    syntax: Syntax::Intel,
    prologue: &["push ebp", "mov ebp, esp"],
    epilogue: &["pop ebp", "ret"],
};

pub static ARM64: TargetDescriptor = TargetDescriptor {
    name: "arm64",
    registers: ["x0", "x1", "x2", "x3", "x4", "x5", "x6", "x7"],
    word_size: 8,
    indent: "    ",
    comment: "//",
    syntax: Syntax::Arm,
    prologue: &["stp x29, x30, [sp, #-16]!", "mov x29, sp"],
    epilogue: &["ldp x29, x30, [sp], #16", "ret"],
};

pub static ARM32: TargetDescriptor = TargetDescriptor {
    name: "arm32",
    registers: ["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7"],
    word_size: 4,
    indent: "    ",
    comment: "@",
    syntax: Syntax::Arm,
    prologue: &["push {lr}"],
    epilogue: &["pop {pc}"],
};

pub static RISCV64: TargetDescriptor = TargetDescriptor {
    name: "riscv64",
    registers: ["a0", "a1", "a2", "a3", "a4", "a5", "a6", "a7"],
    word_size: 8,
    indent: "    ",
    comment: "#",
    syntax: Syntax::RiscV,
    prologue: &["addi sp, sp, -16", "sd ra, 8(sp)"],
    epilogue: &["ld ra, 8(sp)", "addi sp, sp, 16", "ret"],
};

pub static RISCV32: TargetDescriptor = TargetDescriptor {
    name: "riscv32",
    registers: ["a0", "a1", "a2", "a3", "a4", "a5", "a6", "a7"],
    word_size: 4,
    indent: "    ",
    comment: "#",
    // RV32 has no sd/ld; the return address is a 4-byte word.
    syntax: Syntax::RiscV,
    prologue: &["addi sp, sp, -16", "sw ra, 12(sp)"],
    epilogue: &["lw ra, 12(sp)", "addi sp, sp, 16", "ret"],
};
