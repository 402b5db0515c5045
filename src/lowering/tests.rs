#[cfg(test)]
mod lowering_tests {
    use crate::bytecode::{unpack_call_operand, AstcProgram, Opcode, Operand, SymbolKind};
    use crate::error::ErrorKind;
    use crate::lexer::tokenize;
    use crate::lowering::{lower, LowerResult};
    use crate::parser::parse;

    fn lower_ok(input: &str) -> AstcProgram {
        let result = lower_source(input);
        assert!(
            result.errors.is_empty(),
            "Lowering errors: {:?}",
            result.errors
        );
        result.program
    }

    fn lower_source(input: &str) -> LowerResult {
        let lexed = tokenize(input);
        assert!(lexed.errors.is_empty(), "Lexer errors: {:?}", lexed.errors);
        let parsed = parse(&lexed.tokens);
        assert!(
            parsed.errors.is_empty(),
            "Parser errors: {:?}",
            parsed.errors
        );
        lower(&parsed.unit)
    }

    fn opcodes(program: &AstcProgram) -> Vec<Opcode> {
        program.instructions.iter().map(|i| i.opcode).collect()
    }

    /// Net stack effect of a linear walk over the instruction stream.
    ///
    /// Every lowered construct is balanced on all paths, so the straight-line
    /// sum must come out to zero for a whole translation unit.
    fn net_stack_effect(program: &AstcProgram) -> i64 {
        let mut depth: i64 = 0;
        for inst in &program.instructions {
            use Opcode::*;
            depth += match inst.opcode {
                I32Const | I64Const | F32Const | F64Const | StringConst | LocalGet
                | GlobalGet => 1,
                LocalSet | GlobalSet | Drop | BrIf | If | Return => -1,
                I32Add | I32Sub | I32Mul | I32DivS | I32DivU | I32RemS | I32RemU | I32And
                | I32Or | I32Xor | I32Shl | I32ShrS | I32ShrU | I32Eq | I32Ne | I32LtS
                | I32LtU | I32GtS | I32GtU | I32LeS | I32LeU | I32GeS | I32GeU => -1,
                I32Store | I64Store | F32Store | F64Store | I32Store8 | I32Store16 => -2,
                Call => {
                    let (_, argc) = unpack_call_operand(inst.operand.as_index().unwrap());
                    1 - argc as i64
                }
                // Loads pop an address and push a value; conversions and
                // tee rewrite the top in place.
                _ => 0,
            };
        }
        depth
    }

    #[test]
    fn minimal_return_sequence() {
        let program = lower_ok("int main() { return 42; }");
        assert_eq!(
            opcodes(&program),
            vec![Opcode::Func, Opcode::I32Const, Opcode::Return, Opcode::End]
        );
        assert_eq!(program.instructions[1].operand, Operand::I32(42));
        assert_eq!(program.entry_point, 0);
    }

    #[test]
    fn arithmetic_lowers_post_order() {
        let program = lower_ok("int main() { return 1 + 2 * 3; }");
        assert_eq!(
            opcodes(&program),
            vec![
                Opcode::Func,
                Opcode::I32Const,
                Opcode::I32Const,
                Opcode::I32Const,
                Opcode::I32Mul,
                Opcode::I32Add,
                Opcode::Return,
                Opcode::End
            ]
        );
        let operands: Vec<_> = program.instructions[1..4]
            .iter()
            .map(|i| i.operand)
            .collect();
        assert_eq!(
            operands,
            vec![Operand::I32(1), Operand::I32(2), Operand::I32(3)]
        );
    }

    #[test]
    fn while_loop_shape() {
        let program = lower_ok("int main() { int i = 0; while (i < 10) { i = i + 1; } return i; }");
        let ops = opcodes(&program);

        // The loop is wrapped in a block so the exit test can br_if out.
        let block_pos = ops.iter().position(|&o| o == Opcode::Block).unwrap();
        assert_eq!(ops[block_pos + 1], Opcode::Loop);

        // Exit test: cond; i32.const 0; i32.eq; br_if 1.
        let brif_pos = ops.iter().position(|&o| o == Opcode::BrIf).unwrap();
        assert_eq!(ops[brif_pos - 1], Opcode::I32Eq);
        assert_eq!(ops[brif_pos - 2], Opcode::I32Const);
        assert_eq!(program.instructions[brif_pos - 2].operand, Operand::I32(0));
        assert_eq!(program.instructions[brif_pos].operand, Operand::Index(1));

        // Back edge: br 0 just before the loop's end.
        let br_pos = ops.iter().rposition(|&o| o == Opcode::Br).unwrap();
        assert_eq!(program.instructions[br_pos].operand, Operand::Index(0));
    }

    #[test]
    fn for_loop_has_continue_block() {
        let program =
            lower_ok("int main() { int s = 0; for (int i = 0; i < 3; i = i + 1) { s = s + i; } return s; }");
        let ops = opcodes(&program);
        // block (break target), loop, cond..., block (continue target).
        let loop_pos = ops.iter().position(|&o| o == Opcode::Loop).unwrap();
        let inner_block = ops[loop_pos..]
            .iter()
            .position(|&o| o == Opcode::Block)
            .unwrap();
        assert!(inner_block > 0, "for body must sit in its own block");
    }

    #[test]
    fn break_and_continue_depths() {
        let program = lower_ok(
            "int main() { while (1) { if (x) { break; } continue; } return 0; }",
        );
        // Frames inside the break, innermost first: then-compound, if,
        // body-compound, loop head, break block → depth 4.
        let break_br = program
            .instructions
            .iter()
            .find(|i| i.opcode == Opcode::Br && i.operand == Operand::Index(4));
        assert!(break_br.is_some(), "break must reach the wrapping block");
        // continue sits in the body compound: loop head is 1 frame up.
        let continue_br = program
            .instructions
            .iter()
            .find(|i| i.opcode == Opcode::Br && i.operand == Operand::Index(1));
        assert!(continue_br.is_some(), "continue must reach the loop head");
    }

    #[test]
    fn break_outside_loop_is_an_error() {
        let result = lower_source("int main() { break; return 0; }");
        assert!(result
            .errors
            .iter()
            .any(|e| e.kind == ErrorKind::BreakOutsideLoop));
    }

    #[test]
    fn short_circuit_and_shape() {
        let program = lower_ok("int main() { return a && b; }");
        let ops = opcodes(&program);
        // block; lhs; tee; eqz; br_if 0; rhs; set; end; get; eqz; eqz.
        assert_eq!(
            ops,
            vec![
                Opcode::Func,
                Opcode::Block,
                Opcode::LocalGet,
                Opcode::LocalTee,
                Opcode::I32Eqz,
                Opcode::BrIf,
                Opcode::LocalGet,
                Opcode::LocalSet,
                Opcode::End,
                Opcode::LocalGet,
                Opcode::I32Eqz,
                Opcode::I32Eqz,
                Opcode::Return,
                Opcode::End
            ]
        );
        let brif = &program.instructions[5];
        assert_eq!(brif.operand, Operand::Index(0));
    }

    #[test]
    fn short_circuit_or_skips_eqz() {
        let program = lower_ok("int main() { return a || b; }");
        let ops = opcodes(&program);
        // `||` branches on the raw left value: tee is followed directly by
        // br_if with no eqz in between.
        let tee = ops.iter().position(|&o| o == Opcode::LocalTee).unwrap();
        assert_eq!(ops[tee + 1], Opcode::BrIf);
    }

    #[test]
    fn string_literals_intern_into_data_segment() {
        let program = lower_ok(
            "int main() { printf(\"x=%d\\n\", 5); printf(\"x=%d\\n\", 6); return 0; }",
        );
        // The same literal twice interns once, at offset 0.
        assert_eq!(program.string_count(), 1);
        let consts: Vec<_> = program
            .instructions
            .iter()
            .filter(|i| i.opcode == Opcode::StringConst)
            .collect();
        assert_eq!(consts.len(), 2);
        assert_eq!(consts[0].operand, Operand::Index(0));
        assert_eq!(consts[1].operand, Operand::Index(0));
        assert_eq!(program.data_cstr(0), Some("x=%d\n".as_bytes()));
    }

    #[test]
    fn host_call_packs_symbol_and_argc() {
        let program = lower_ok("int main() { printf(\"x=%d\\n\", 5); return 0; }");
        let call = program
            .instructions
            .iter()
            .find(|i| i.opcode == Opcode::Call)
            .unwrap();
        let (symbol, argc) = unpack_call_operand(call.operand.as_index().unwrap());
        assert_eq!(argc, 2);
        let entry = program.symbols.by_index(symbol).unwrap();
        assert_eq!(entry.name, "printf");
        assert_eq!(entry.kind, SymbolKind::Host);
    }

    #[test]
    fn user_call_interns_function_symbol() {
        let program = lower_ok(
            "int add(int a, int b) { return a + b; }\nint main() { return add(1, 2); }",
        );
        let entry = program.symbols.get("add").unwrap();
        assert_eq!(entry.kind, SymbolKind::Function);
        let info = program.function_by_symbol(entry.index).unwrap();
        assert_eq!(info.param_count, 2);
    }

    #[test]
    fn parameters_take_first_slots() {
        let program = lower_ok("int add(int a, int b) { int c = a + b; return c; }");
        // a=0, b=1, c=2: the local.set after the addition targets slot 2.
        let set = program
            .instructions
            .iter()
            .find(|i| i.opcode == Opcode::LocalSet)
            .unwrap();
        assert_eq!(set.operand, Operand::Index(2));
        assert_eq!(program.functions[0].local_count, 3);
        assert_eq!(program.functions[0].param_count, 2);
    }

    #[test]
    fn slot_counter_resets_per_function() {
        let program = lower_ok(
            "int f() { int x = 1; return x; }\nint g() { int y = 2; return y; }",
        );
        let sets: Vec<_> = program
            .instructions
            .iter()
            .filter(|i| i.opcode == Opcode::LocalSet)
            .collect();
        // Both x and y land in slot 0 of their own frames.
        assert_eq!(sets[0].operand, Operand::Index(0));
        assert_eq!(sets[1].operand, Operand::Index(0));
    }

    #[test]
    fn main_sets_entry_point_even_when_not_first() {
        let program = lower_ok(
            "int helper() { return 1; }\nint main() { return helper(); }",
        );
        let main_sym = program.symbols.get("main").unwrap().index;
        let info = program.function_by_symbol(main_sym).unwrap();
        assert_eq!(program.entry_point, info.entry_pc);
        assert!(program.entry_point > 0);
    }

    #[test]
    fn global_initializers_are_constant_folded() {
        let program = lower_ok("int base = 2 + 3 * 4;\nint main() { return base; }");
        assert_eq!(program.globals, vec![14]);
        // The reference compiles to global.get 0.
        assert!(program
            .instructions
            .iter()
            .any(|i| i.opcode == Opcode::GlobalGet && i.operand == Operand::Index(0)));
    }

    #[test]
    fn non_constant_global_initializer_is_an_error() {
        let result = lower_source("int bad = f();\nint main() { return 0; }");
        assert!(result
            .errors
            .iter()
            .any(|e| e.kind == ErrorKind::ConstantExpressionRequired));
    }

    #[test]
    fn member_access_refuses_without_layout() {
        let result = lower_source("int main() { return s.x; }");
        assert!(result
            .errors
            .iter()
            .any(|e| e.kind == ErrorKind::StructLayoutUnavailable
                && e.message.contains("struct layout unavailable")));
    }

    #[test]
    fn subscript_element_size_comes_from_declared_type() {
        let program = lower_ok("int main() { int *p; return p[2]; }");
        // element size 4 → i32.const 4; i32.mul; i32.add; i32.load.
        let ops = opcodes(&program);
        let mul = ops.iter().position(|&o| o == Opcode::I32Mul).unwrap();
        assert_eq!(program.instructions[mul - 1].operand, Operand::I32(4));
        assert_eq!(ops[mul + 1], Opcode::I32Add);
        assert_eq!(ops[mul + 2], Opcode::I32Load);
    }

    #[test]
    fn char_subscript_store_narrows() {
        let program = lower_ok("int main() { char *s; s[0] = 65; return 0; }");
        let ops = opcodes(&program);
        let mul = ops.iter().position(|&o| o == Opcode::I32Mul).unwrap();
        assert_eq!(program.instructions[mul - 1].operand, Operand::I32(1));
        assert!(ops.contains(&Opcode::I32Store8));
    }

    #[test]
    fn subscript_without_declared_type_is_an_error() {
        let result = lower_source("int main() { return q[1]; }");
        assert!(result
            .errors
            .iter()
            .any(|e| e.kind == ErrorKind::MissingElementType));
    }

    #[test]
    fn negation_lowers_as_zero_minus() {
        let program = lower_ok("int main() { return -7; }");
        assert_eq!(
            opcodes(&program),
            vec![
                Opcode::Func,
                Opcode::I32Const,
                Opcode::I32Const,
                Opcode::I32Sub,
                Opcode::Return,
                Opcode::End
            ]
        );
        assert_eq!(program.instructions[1].operand, Operand::I32(0));
        assert_eq!(program.instructions[2].operand, Operand::I32(7));
    }

    #[test]
    fn long_constants_use_i64() {
        let program = lower_ok("int main() { return 10L; }");
        assert!(program
            .instructions
            .iter()
            .any(|i| i.opcode == Opcode::I64Const && i.operand == Operand::I64(10)));
    }

    #[test]
    fn float_constants_carry_bit_patterns() {
        let program = lower_ok("int main() { double d = 2.5; float f = 1.5f; return 0; }");
        assert!(program
            .instructions
            .iter()
            .any(|i| i.opcode == Opcode::F64Const && i.operand == Operand::F64(2.5f64.to_bits())));
        assert!(program
            .instructions
            .iter()
            .any(|i| i.opcode == Opcode::F32Const && i.operand == Operand::F32(1.5f32.to_bits())));
    }

    #[test]
    fn cast_double_to_int_truncates() {
        let program = lower_ok("int main() { return (int) 3.9; }");
        assert!(opcodes(&program).contains(&Opcode::I32TruncF64S));
    }

    #[test]
    fn cast_long_to_int_wraps() {
        let program = lower_ok("int main() { long x = 5L; return (int) x; }");
        assert!(opcodes(&program).contains(&Opcode::I32WrapI64));
    }

    #[test]
    fn cast_to_char_masks() {
        let program = lower_ok("int main() { return (char) 300; }");
        let ops = opcodes(&program);
        let and = ops.iter().position(|&o| o == Opcode::I32And).unwrap();
        assert_eq!(program.instructions[and - 1].operand, Operand::I32(0xFF));
    }

    #[test]
    fn assignment_leaves_value_then_statement_drops_it() {
        let program = lower_ok("int main() { int i = 0; i = 5; return i; }");
        let ops = opcodes(&program);
        let tee = ops.iter().position(|&o| o == Opcode::LocalTee).unwrap();
        assert_eq!(ops[tee + 1], Opcode::Drop);
    }

    #[test]
    fn stack_balance_across_programs() {
        let sources = [
            "int main() { return 42; }",
            "int main() { return 1 + 2 * 3 - 4 / 2; }",
            "int main() { int i = 0; while (i < 10) { i = i + 1; } return i; }",
            "int main() { int s = 0; for (int i = 0; i < 5; i = i + 1) { s = s + i; } return s; }",
            "int main() { if (1 < 2) { return 1; } else { return 2; } }",
            "int main() { return a && b || c; }",
            "int main() { printf(\"x=%d\\n\", 5); return 0; }",
            "int g = 3;\nint main() { g = g + 1; return g; }",
            "int add(int a, int b) { return a + b; }\nint main() { return add(1, 2); }",
        ];
        for source in sources {
            let program = lower_ok(source);
            assert_eq!(
                net_stack_effect(&program),
                0,
                "unbalanced lowering for: {}",
                source
            );
        }
    }
}
