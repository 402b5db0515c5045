#[cfg(test)]
mod emitter_tests {
    use crate::emitter::{emit, Target};
    use crate::lexer::tokenize;
    use crate::parser::ast::TranslationUnit;
    use crate::parser::parse;

    fn parse_ok(input: &str) -> TranslationUnit {
        let lexed = tokenize(input);
        assert!(lexed.errors.is_empty(), "Lexer errors: {:?}", lexed.errors);
        let parsed = parse(&lexed.tokens);
        assert!(
            parsed.errors.is_empty(),
            "Parser errors: {:?}",
            parsed.errors
        );
        parsed.unit
    }

    const SOURCE: &str = "int main() { return 1 + 2 * 3; }";

    #[test]
    fn all_targets_emit_something() {
        let unit = parse_ok(SOURCE);
        for target in Target::ALL {
            let asm = emit(&unit, target).unwrap();
            assert!(asm.contains("main:"), "{} lacks the function label", target);
            assert!(!asm.trim().is_empty());
        }
    }

    #[test]
    fn x86_64_prologue_and_epilogue() {
        let unit = parse_ok(SOURCE);
        let asm = emit(&unit, Target::X86_64).unwrap();
        assert!(asm.contains("push rbp"));
        assert!(asm.contains("mov rbp, rsp"));
        assert!(asm.contains("pop rbp"));
        assert!(asm.contains("ret"));
        assert!(asm.contains("mov rax, 1"));
        assert!(asm.contains("imul rax, rbx"));
    }

    #[test]
    fn x86_32_uses_32_bit_registers() {
        let unit = parse_ok(SOURCE);
        let asm = emit(&unit, Target::X86).unwrap();
        assert!(asm.contains("push ebp"));
        assert!(asm.contains("mov eax, 1"));
    }

    #[test]
    fn arm64_prologue_and_immediates() {
        let unit = parse_ok(SOURCE);
        let asm = emit(&unit, Target::Arm64).unwrap();
        assert!(asm.contains("stp x29, x30, [sp, #-16]!"));
        assert!(asm.contains("mov x29, sp"));
        assert!(asm.contains("ldp x29, x30, [sp], #16"));
        assert!(asm.contains("mov x0, #1"));
        assert!(asm.contains("mul x0, x1, x0"));
    }

    #[test]
    fn arm32_link_register_discipline() {
        let unit = parse_ok(SOURCE);
        let asm = emit(&unit, Target::Arm32).unwrap();
        assert!(asm.contains("push {lr}"));
        assert!(asm.contains("pop {pc}"));
        assert!(asm.contains("mov r0, #1"));
    }

    #[test]
    fn riscv64_saves_return_address() {
        let unit = parse_ok(SOURCE);
        let asm = emit(&unit, Target::RiscV64).unwrap();
        assert!(asm.contains("addi sp, sp, -16"));
        assert!(asm.contains("sd ra, 8(sp)"));
        assert!(asm.contains("li a0, 1"));
        assert!(asm.contains("mul a0, a1, a0"));
    }

    #[test]
    fn riscv32_uses_word_stores() {
        let unit = parse_ok(SOURCE);
        let asm = emit(&unit, Target::RiscV32).unwrap();
        assert!(asm.contains("sw ra, 12(sp)"));
        assert!(asm.contains("lw ra, 12(sp)"));
        assert!(!asm.contains("sd ra"));
    }

    #[test]
    fn subtraction_preserves_operand_order_on_intel() {
        let unit = parse_ok("int main() { return 10 - 4; }");
        let asm = emit(&unit, Target::X86_64).unwrap();
        // Left operand sits in rbx; the result must come back to rax.
        assert!(asm.contains("sub rbx, rax"));
        assert!(asm.contains("mov rax, rbx"));
    }

    #[test]
    fn multiple_functions_each_get_labels() {
        let unit = parse_ok("int f() { return 1; }\nint g() { return 2; }");
        let asm = emit(&unit, Target::X86_64).unwrap();
        assert!(asm.contains("f:"));
        assert!(asm.contains("g:"));
    }

    #[test]
    fn target_parsing_accepts_aliases() {
        assert_eq!(Target::parse("amd64"), Some(Target::X86_64));
        assert_eq!(Target::parse("aarch64"), Some(Target::Arm64));
        assert_eq!(Target::parse("riscv32"), Some(Target::RiscV32));
        assert_eq!(Target::parse("m68k"), None);
    }
}
