#[cfg(test)]
mod parser_tests {
    use crate::error::ErrorKind;
    use crate::lexer::tokenize;
    use crate::parser::ast::*;
    use crate::parser::{parse, ParseResult};

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

    fn parse_errors(input: &str) -> ParseResult {
        let lexed = tokenize(input);
        assert!(lexed.errors.is_empty(), "Lexer errors: {:?}", lexed.errors);
        parse(&lexed.tokens)
    }

    /// The single function body of a one-function translation unit.
    fn body_of(unit: &TranslationUnit) -> &[BlockItem] {
        match &unit.decls[0] {
            ExternalDecl::Function(f) => f.body.as_deref().expect("function has a body"),
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn empty_translation_unit() {
        let unit = parse_ok("");
        assert!(unit.decls.is_empty());
    }

    #[test]
    fn minimal_main() {
        let unit = parse_ok("int main() { return 42; }");
        assert_eq!(unit.decls.len(), 1);
        let body = body_of(&unit);
        assert_eq!(body.len(), 1);
        match &body[0] {
            BlockItem::Statement(Stmt::Return(Some(Expr::IntConst { value: 42, .. }), _)) => {}
            other => panic!("expected return 42, got {:?}", other),
        }
    }

    #[test]
    fn void_param_list_is_empty() {
        let unit = parse_ok("int main(void) { return 0; }");
        match &unit.decls[0] {
            ExternalDecl::Function(f) => assert!(f.params.is_empty()),
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn parameters_are_parsed_in_full() {
        let unit = parse_ok("int add(int a, int b) { return a + b; }");
        match &unit.decls[0] {
            ExternalDecl::Function(f) => {
                assert_eq!(f.params.len(), 2);
                assert_eq!(f.params[0].name, "a");
                assert_eq!(f.params[1].name, "b");
                assert_eq!(f.params[0].ty.base, PrimitiveType::Int);
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn prototype_without_body() {
        let unit = parse_ok("int helper(int x);");
        match &unit.decls[0] {
            ExternalDecl::Function(f) => assert!(f.body.is_none()),
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn file_scope_variable() {
        let unit = parse_ok("int counter = 7;");
        match &unit.decls[0] {
            ExternalDecl::Variable(v) => {
                assert_eq!(v.name, "counter");
                assert!(matches!(v.init, Some(Expr::IntConst { value: 7, .. })));
            }
            other => panic!("expected variable, got {:?}", other),
        }
    }

    #[test]
    fn precedence_mul_binds_tighter_than_add() {
        let unit = parse_ok("int main() { return 1 + 2 * 3; }");
        let body = body_of(&unit);
        match &body[0] {
            BlockItem::Statement(Stmt::Return(Some(Expr::Binary { op, lhs, rhs, .. }), _)) => {
                assert_eq!(*op, BinaryOp::Add);
                assert!(matches!(**lhs, Expr::IntConst { value: 1, .. }));
                assert!(matches!(**rhs, Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("expected return of binary add, got {:?}", other),
        }
    }

    #[test]
    fn comparison_below_shift() {
        let unit = parse_ok("int main() { return 1 << 2 < 3; }");
        let body = body_of(&unit);
        match &body[0] {
            BlockItem::Statement(Stmt::Return(Some(Expr::Binary { op, lhs, .. }), _)) => {
                assert_eq!(*op, BinaryOp::Lt);
                assert!(matches!(**lhs, Expr::Binary { op: BinaryOp::Shl, .. }));
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn logical_operators_nest_outermost() {
        let unit = parse_ok("int main() { return a == 1 && b == 2 || c; }");
        let body = body_of(&unit);
        match &body[0] {
            BlockItem::Statement(Stmt::Return(Some(Expr::Binary { op, lhs, .. }), _)) => {
                assert_eq!(*op, BinaryOp::LogicalOr);
                assert!(matches!(
                    **lhs,
                    Expr::Binary {
                        op: BinaryOp::LogicalAnd,
                        ..
                    }
                ));
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn local_declaration_with_initializer() {
        let unit = parse_ok("int main() { int i = 0; return i; }");
        let body = body_of(&unit);
        match &body[0] {
            BlockItem::Declaration(v) => {
                assert_eq!(v.name, "i");
                assert!(matches!(v.init, Some(Expr::IntConst { value: 0, .. })));
            }
            other => panic!("expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn while_loop_with_assignment() {
        let unit = parse_ok("int main() { int i = 0; while (i < 10) { i = i + 1; } return i; }");
        let body = body_of(&unit);
        match &body[1] {
            BlockItem::Statement(Stmt::While { body, .. }) => match &**body {
                Stmt::Compound(items, _) => {
                    assert!(matches!(
                        items[0],
                        BlockItem::Statement(Stmt::Expression(Expr::Assign { .. }, _))
                    ));
                }
                other => panic!("expected compound body, got {:?}", other),
            },
            other => panic!("expected while, got {:?}", other),
        }
    }

    #[test]
    fn for_loop_with_declaration_init() {
        let unit = parse_ok("int main() { for (int i = 0; i < 3; i = i + 1) ; return 0; }");
        let body = body_of(&unit);
        match &body[0] {
            BlockItem::Statement(Stmt::For {
                init: Some(ForInit::Declaration(v)),
                cond: Some(_),
                step: Some(_),
                ..
            }) => assert_eq!(v.name, "i"),
            other => panic!("expected for with declaration init, got {:?}", other),
        }
    }

    #[test]
    fn for_loop_all_clauses_empty() {
        let unit = parse_ok("int main() { for (;;) break; return 0; }");
        let body = body_of(&unit);
        assert!(matches!(
            body[0],
            BlockItem::Statement(Stmt::For {
                init: None,
                cond: None,
                step: None,
                ..
            })
        ));
    }

    #[test]
    fn if_else_chain() {
        let unit = parse_ok("int main() { if (x) return 1; else return 2; }");
        let body = body_of(&unit);
        assert!(matches!(
            body[0],
            BlockItem::Statement(Stmt::If {
                else_branch: Some(_),
                ..
            })
        ));
    }

    #[test]
    fn compound_assignment_desugars() {
        let unit = parse_ok("int main() { x += 2; return x; }");
        let body = body_of(&unit);
        match &body[0] {
            BlockItem::Statement(Stmt::Expression(Expr::Assign { target, value, .. }, _)) => {
                assert!(matches!(**target, Expr::Identifier { .. }));
                assert!(matches!(**value, Expr::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("expected desugared assignment, got {:?}", other),
        }
    }

    #[test]
    fn prefix_increment_desugars() {
        let unit = parse_ok("int main() { ++x; return x; }");
        let body = body_of(&unit);
        match &body[0] {
            BlockItem::Statement(Stmt::Expression(Expr::Assign { value, .. }, _)) => {
                assert!(matches!(**value, Expr::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("expected desugared increment, got {:?}", other),
        }
    }

    #[test]
    fn host_call_is_flagged() {
        let unit = parse_ok("int main() { printf(\"hi\"); return 0; }");
        let body = body_of(&unit);
        match &body[0] {
            BlockItem::Statement(Stmt::Expression(
                Expr::Call {
                    callee, is_host, ..
                },
                _,
            )) => {
                assert_eq!(callee, "printf");
                assert!(*is_host);
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn user_call_is_not_flagged() {
        let unit = parse_ok("int main() { helper(1, 2); return 0; }");
        let body = body_of(&unit);
        match &body[0] {
            BlockItem::Statement(Stmt::Expression(
                Expr::Call {
                    callee,
                    is_host,
                    args,
                    ..
                },
                _,
            )) => {
                assert_eq!(callee, "helper");
                assert!(!*is_host);
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn array_subscript_and_member_access() {
        let unit = parse_ok("int main() { return a[2] + s.x + p->y; }");
        let body = body_of(&unit);
        match &body[0] {
            BlockItem::Statement(Stmt::Return(Some(expr), _)) => {
                // ((a[2] + s.x) + p->y) — left-associative additive chain.
                match expr {
                    Expr::Binary { op: BinaryOp::Add, rhs, .. } => {
                        assert!(matches!(**rhs, Expr::Member { arrow: true, .. }));
                    }
                    other => panic!("unexpected shape: {:?}", other),
                }
            }
            other => panic!("expected return, got {:?}", other),
        }
    }

    #[test]
    fn cast_expression() {
        let unit = parse_ok("int main() { return (int) 3.5; }");
        let body = body_of(&unit);
        match &body[0] {
            BlockItem::Statement(Stmt::Return(Some(Expr::Cast { ty, operand, .. }), _)) => {
                assert_eq!(ty.base, PrimitiveType::Int);
                assert!(matches!(**operand, Expr::FloatConst { .. }));
            }
            other => panic!("expected cast, got {:?}", other),
        }
    }

    #[test]
    fn parenthesized_expression_is_not_a_cast() {
        let unit = parse_ok("int main() { return (1 + 2) * 3; }");
        let body = body_of(&unit);
        match &body[0] {
            BlockItem::Statement(Stmt::Return(Some(Expr::Binary { op, .. }), _)) => {
                assert_eq!(*op, BinaryOp::Mul);
            }
            other => panic!("unexpected shape: {:?}", other),
        }
    }

    #[test]
    fn pointer_types() {
        let unit = parse_ok("int main() { char *s; int **pp; return 0; }");
        let body = body_of(&unit);
        match (&body[0], &body[1]) {
            (BlockItem::Declaration(s), BlockItem::Declaration(pp)) => {
                assert_eq!(s.ty.pointer_depth, 1);
                assert_eq!(s.ty.base, PrimitiveType::Char);
                assert_eq!(pp.ty.pointer_depth, 2);
            }
            other => panic!("expected two declarations, got {:?}", other),
        }
    }

    #[test]
    fn long_and_unsigned_specifiers() {
        let unit = parse_ok("unsigned long big; long long wider;");
        match (&unit.decls[0], &unit.decls[1]) {
            (ExternalDecl::Variable(a), ExternalDecl::Variable(b)) => {
                assert_eq!(a.ty.base, PrimitiveType::Long);
                assert!(a.ty.unsigned);
                assert_eq!(b.ty.base, PrimitiveType::Long);
            }
            other => panic!("expected variables, got {:?}", other),
        }
    }

    #[test]
    fn numeric_literal_types() {
        let unit = parse_ok("int main() { return 0x2A; }");
        let body = body_of(&unit);
        assert!(matches!(
            body[0],
            BlockItem::Statement(Stmt::Return(
                Some(Expr::IntConst {
                    value: 42,
                    ty: PrimitiveType::Int,
                    ..
                }),
                _
            ))
        ));

        let unit = parse_ok("long x = 10L; float y = 1.5f; double z = 2.5;");
        match (&unit.decls[0], &unit.decls[1], &unit.decls[2]) {
            (
                ExternalDecl::Variable(x),
                ExternalDecl::Variable(y),
                ExternalDecl::Variable(z),
            ) => {
                assert!(matches!(
                    x.init,
                    Some(Expr::IntConst {
                        ty: PrimitiveType::Long,
                        ..
                    })
                ));
                assert!(matches!(
                    y.init,
                    Some(Expr::FloatConst {
                        ty: PrimitiveType::Float,
                        ..
                    })
                ));
                assert!(matches!(
                    z.init,
                    Some(Expr::FloatConst {
                        ty: PrimitiveType::Double,
                        ..
                    })
                ));
            }
            other => panic!("expected variables, got {:?}", other),
        }
    }

    #[test]
    fn char_literal_becomes_int_constant() {
        let unit = parse_ok("int main() { return 'A'; }");
        let body = body_of(&unit);
        assert!(matches!(
            body[0],
            BlockItem::Statement(Stmt::Return(
                Some(Expr::IntConst {
                    value: 65,
                    ty: PrimitiveType::Char,
                    ..
                }),
                _
            ))
        ));
    }

    #[test]
    fn missing_semicolon_is_reported() {
        let result = parse_errors("int main() { return 42 }");
        assert!(result
            .errors
            .iter()
            .any(|e| e.kind == ErrorKind::ExpectedToken));
    }

    #[test]
    fn error_recovery_keeps_later_declarations() {
        // The first declaration is broken; the second must still parse.
        let result = parse_errors("int = 3; int ok = 1;");
        assert!(!result.errors.is_empty());
        assert!(result.unit.decls.iter().any(|d| matches!(
            d,
            ExternalDecl::Variable(v) if v.name == "ok"
        )));
    }

    #[test]
    fn switch_is_rejected() {
        let result = parse_errors("int main() { switch (x) ; return 0; }");
        assert!(result
            .errors
            .iter()
            .any(|e| e.kind == ErrorKind::UnsupportedConstruct));
    }

    #[test]
    fn unary_operators_parse() {
        let unit = parse_ok("int main() { return -x + !y + ~z; }");
        let body = body_of(&unit);
        assert!(matches!(body[0], BlockItem::Statement(Stmt::Return(Some(_), _))));
    }

    #[test]
    fn deref_and_address_of() {
        let unit = parse_ok("int main() { int *p; *p = 5; return *p; }");
        let body = body_of(&unit);
        match &body[1] {
            BlockItem::Statement(Stmt::Expression(Expr::Assign { target, .. }, _)) => {
                assert!(matches!(
                    **target,
                    Expr::Unary {
                        op: UnaryOp::Deref,
                        ..
                    }
                ));
            }
            other => panic!("expected deref assignment, got {:?}", other),
        }
    }
}
