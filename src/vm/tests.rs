#[cfg(test)]
mod vm_tests {
    use crate::bytecode::{AstcProgram, Opcode, Operand};
    use crate::ffi::FfiRegistry;
    use crate::lexer::tokenize;
    use crate::lowering::lower;
    use crate::parser::parse;
    use crate::vm::{Vm, VmErrorKind, VmState};

    /// Compile a source string down to bytecode, asserting no stage errors.
    fn compile(source: &str) -> AstcProgram {
        let lexed = tokenize(source);
        assert!(lexed.errors.is_empty(), "Lexer errors: {:?}", lexed.errors);
        let parsed = parse(&lexed.tokens);
        assert!(
            parsed.errors.is_empty(),
            "Parser errors: {:?}",
            parsed.errors
        );
        let lowered = lower(&parsed.unit);
        assert!(
            lowered.errors.is_empty(),
            "Lowering errors: {:?}",
            lowered.errors
        );
        lowered.program
    }

    fn run(source: &str) -> i64 {
        let program = compile(source);
        let ffi = FfiRegistry::with_baseline();
        let mut vm = Vm::new(&program, &ffi);
        vm.execute().expect("program should execute")
    }

    fn run_program(program: &AstcProgram) -> Result<i64, crate::vm::VmError> {
        let ffi = FfiRegistry::with_baseline();
        let mut vm = Vm::new(program, &ffi);
        vm.execute()
    }

    #[test]
    fn return_constant() {
        assert_eq!(run("int main() { return 42; }"), 42);
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(run("int main() { return 1 + 2 * 3; }"), 7);
        assert_eq!(run("int main() { return 10 - 4 / 2; }"), 8);
        assert_eq!(run("int main() { return (1 + 2) * 3; }"), 9);
        assert_eq!(run("int main() { return 17 % 5; }"), 2);
    }

    #[test]
    fn negative_results_sign_extend() {
        assert_eq!(run("int main() { return -7; }"), -7);
        assert_eq!(run("int main() { return 3 - 10; }"), -7);
    }

    #[test]
    fn bitwise_and_shifts() {
        assert_eq!(run("int main() { return 12 & 10; }"), 8);
        assert_eq!(run("int main() { return 12 | 3; }"), 15);
        assert_eq!(run("int main() { return 12 ^ 10; }"), 6);
        assert_eq!(run("int main() { return 1 << 5; }"), 32);
        assert_eq!(run("int main() { return -8 >> 1; }"), -4);
        assert_eq!(run("int main() { return ~0; }"), -1);
    }

    #[test]
    fn comparisons_produce_zero_or_one() {
        assert_eq!(run("int main() { return 1 < 2; }"), 1);
        assert_eq!(run("int main() { return 2 < 1; }"), 0);
        assert_eq!(run("int main() { return 2 <= 2; }"), 1);
        assert_eq!(run("int main() { return 3 == 3; }"), 1);
        assert_eq!(run("int main() { return 3 != 3; }"), 0);
        assert_eq!(run("int main() { return !5; }"), 0);
        assert_eq!(run("int main() { return !0; }"), 1);
    }

    #[test]
    fn locals_and_assignment() {
        assert_eq!(run("int main() { int x = 5; int y = 6; return x + y; }"), 11);
        assert_eq!(run("int main() { int x = 1; x = x + 41; return x; }"), 42);
        assert_eq!(run("int main() { int x = 1; x += 2; x *= 3; return x; }"), 9);
    }

    #[test]
    fn while_loop_counts_to_ten() {
        assert_eq!(
            run("int main() { int i = 0; while (i < 10) { i = i + 1; } return i; }"),
            10
        );
    }

    #[test]
    fn while_loop_never_entered() {
        assert_eq!(
            run("int main() { int i = 5; while (i < 5) { i = i + 1; } return i; }"),
            5
        );
    }

    #[test]
    fn for_loop_sums() {
        assert_eq!(
            run("int main() { int s = 0; for (int i = 1; i <= 4; i = i + 1) { s = s + i; } return s; }"),
            10
        );
    }

    #[test]
    fn for_loop_continue_still_increments() {
        // Skip even numbers; without a continue-target block this would
        // spin forever because the increment would be skipped.
        assert_eq!(
            run(
                "int main() { int s = 0; for (int i = 0; i < 5; i = i + 1) { \
                 if (i % 2 == 0) { continue; } s = s + i; } return s; }"
            ),
            4 // 1 + 3
        );
    }

    #[test]
    fn break_exits_loop() {
        assert_eq!(
            run(
                "int main() { int i = 0; while (1) { if (i == 3) { break; } i = i + 1; } return i; }"
            ),
            3
        );
    }

    #[test]
    fn if_else_branches() {
        assert_eq!(run("int main() { if (1 < 2) { return 1; } else { return 2; } }"), 1);
        assert_eq!(run("int main() { if (2 < 1) { return 1; } else { return 2; } }"), 2);
        assert_eq!(run("int main() { if (0) { return 1; } return 3; }"), 3);
    }

    #[test]
    fn short_circuit_values() {
        assert_eq!(run("int main() { return 2 && 3; }"), 1);
        assert_eq!(run("int main() { return 0 && 3; }"), 0);
        assert_eq!(run("int main() { return 0 || 7; }"), 1);
        assert_eq!(run("int main() { return 0 || 0; }"), 0);
    }

    #[test]
    fn short_circuit_skips_side_effects() {
        // The right-hand side would divide by zero; short-circuiting must
        // never evaluate it.
        assert_eq!(run("int main() { int x = 0; return x && 1 / x; }"), 0);
        assert_eq!(run("int main() { int x = 1; return x || 1 / 0; }"), 1);
    }

    #[test]
    fn nested_loops() {
        assert_eq!(
            run(
                "int main() { int s = 0; for (int i = 0; i < 3; i = i + 1) { \
                 for (int j = 0; j < 3; j = j + 1) { s = s + 1; } } return s; }"
            ),
            9
        );
    }

    #[test]
    fn user_function_call() {
        assert_eq!(
            run("int add(int a, int b) { return a + b; }\nint main() { return add(40, 2); }"),
            42
        );
    }

    #[test]
    fn recursive_function_call() {
        assert_eq!(
            run(
                "int fact(int n) { if (n <= 1) { return 1; } return n * fact(n - 1); }\n\
                 int main() { return fact(5); }"
            ),
            120
        );
    }

    #[test]
    fn callee_locals_do_not_clobber_caller() {
        assert_eq!(
            run(
                "int f(int a) { int t = a * 2; return t; }\n\
                 int main() { int x = 10; int y = f(3); return x + y; }"
            ),
            16
        );
    }

    #[test]
    fn function_without_return_yields_zero() {
        assert_eq!(run("int main() { int x = 5; }"), 0);
    }

    #[test]
    fn globals_read_and_write() {
        assert_eq!(run("int g = 3;\nint main() { g = g + 4; return g; }"), 7);
    }

    #[test]
    fn globals_reset_between_executions() {
        let program = compile("int g = 3;\nint main() { g = g + 1; return g; }");
        let ffi = FfiRegistry::with_baseline();
        let mut vm = Vm::new(&program, &ffi);
        assert_eq!(vm.execute().unwrap(), 4);
        let mut vm = Vm::new(&program, &ffi);
        assert_eq!(vm.execute().unwrap(), 4);
    }

    #[test]
    fn execution_is_deterministic() {
        let program = compile(
            "int main() { int s = 0; for (int i = 0; i < 10; i = i + 1) { s = s + i * i; } return s; }",
        );
        let first = run_program(&program).unwrap();
        let second = run_program(&program).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, 285);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let program = compile("int main() { return 1 / 0; }");
        let err = run_program(&program).unwrap_err();
        assert_eq!(err.kind, VmErrorKind::DivisionByZero);
    }

    #[test]
    fn remainder_by_zero_is_an_error() {
        let program = compile("int main() { return 1 % 0; }");
        let err = run_program(&program).unwrap_err();
        assert_eq!(err.kind, VmErrorKind::DivisionByZero);
    }

    #[test]
    fn stack_underflow_is_an_error() {
        let mut program = AstcProgram::new();
        program.emit(Opcode::Drop, Operand::None);
        let err = run_program(&program).unwrap_err();
        assert_eq!(err.kind, VmErrorKind::StackUnderflow);
        assert_eq!(err.pc, 0);
    }

    #[test]
    fn unreachable_is_an_error() {
        let mut program = AstcProgram::new();
        program.emit(Opcode::Unreachable, Operand::None);
        let err = run_program(&program).unwrap_err();
        assert_eq!(err.kind, VmErrorKind::Unreachable);
    }

    #[test]
    fn malformed_nesting_is_rejected_before_execution() {
        let mut program = AstcProgram::new();
        program.emit(Opcode::Block, Operand::None);
        // No matching end: the prepass must reject this even though the
        // first instruction alone would execute fine.
        let err = run_program(&program).unwrap_err();
        assert_eq!(err.kind, VmErrorKind::MalformedControl);
    }

    #[test]
    fn bad_string_offset_is_an_error() {
        let mut program = AstcProgram::new();
        program.emit(Opcode::StringConst, Operand::Index(99));
        program.emit(Opcode::Return, Operand::None);
        let err = run_program(&program).unwrap_err();
        assert_eq!(err.kind, VmErrorKind::BadStringOffset);
    }

    #[test]
    fn hand_built_packed_subset_runs() {
        // The packed-loader path: no func marker, bare const/return.
        let mut program = AstcProgram::new();
        program.emit(Opcode::Nop, Operand::None);
        program.emit(Opcode::I32Const, Operand::I32(42));
        program.emit(Opcode::Return, Operand::None);
        assert_eq!(run_program(&program).unwrap(), 42);
    }

    #[test]
    fn falling_off_the_end_returns_stack_top() {
        let mut program = AstcProgram::new();
        program.emit(Opcode::I32Const, Operand::I32(9));
        assert_eq!(run_program(&program).unwrap(), 9);
    }

    #[test]
    fn state_transitions() {
        let program = compile("int main() { return 0; }");
        let ffi = FfiRegistry::with_baseline();
        let mut vm = Vm::new(&program, &ffi);
        assert_eq!(vm.state(), VmState::Ready);
        vm.execute().unwrap();
        assert_eq!(vm.state(), VmState::Stopped);

        let bad = compile("int main() { return 1 / 0; }");
        let mut vm = Vm::new(&bad, &ffi);
        assert!(vm.execute().is_err());
        assert_eq!(vm.state(), VmState::Error);
        assert!(vm.error_message().unwrap().contains("division by zero"));
    }

    #[test]
    fn printf_through_ffi() {
        // S4: the string is interned at data offset 0 and dispatched to the
        // real printf; its return value is the byte count of "x=5\n".
        assert_eq!(
            run("int main() { printf(\"x=%d\\n\", 5); return 0; }"),
            0
        );
        assert_eq!(
            run("int main() { return printf(\"x=%d\\n\", 5); }"),
            4
        );
    }

    #[test]
    fn strlen_on_interned_string() {
        assert_eq!(run("int main() { return strlen(\"hello\"); }"), 5);
    }

    #[test]
    fn malloc_store_load_roundtrip() {
        assert_eq!(
            run(
                "int main() { int *p = malloc(16); p[0] = 41; p[1] = 1; \
                 int v = p[0] + p[1]; free(p); return v; }"
            ),
            42
        );
    }

    #[test]
    fn char_store_narrows_to_one_byte() {
        assert_eq!(
            run(
                "int main() { char *s = malloc(4); s[0] = 321; int v = s[0] & 255; \
                 free(s); return v; }"
            ),
            65 // 321 & 0xFF — only the low byte was stored
        );
    }

    #[test]
    fn cast_double_to_int() {
        assert_eq!(run("int main() { return (int) 3.9; }"), 3);
    }

    #[test]
    fn cast_long_to_int_wraps() {
        assert_eq!(run("int main() { long x = 4294967297L; return (int) x; }"), 1);
    }

    #[test]
    fn cast_to_char_masks() {
        assert_eq!(run("int main() { return (char) 300; }"), 44);
    }
}
