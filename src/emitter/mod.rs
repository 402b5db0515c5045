//! # Multi-target assembly emitter
//!
//! Emits a textual assembly rendition of a translation unit for one of six
//! ISAs. This is a template backend working at function granularity:
//! expressions evaluate into the target's first conventional register,
//! binary operations spill the left operand into the second register, and
//! each function is bracketed by the target's prologue/epilogue sequences.
//!
//! Control-flow statements are outside this backend's scope (the VM, JIT
//! and AOT paths handle them); they emit a comment so the surrounding
//! function still assembles around them.

pub mod target;

#[cfg(test)]
mod tests;

use crate::error::{CompileError, ErrorKind};
use crate::parser::ast::*;
pub use target::{Syntax, Target, TargetDescriptor};

/// Emit assembly for every function in the unit.
pub fn emit(unit: &TranslationUnit, target: Target) -> Result<String, CompileError> {
    let mut emitter = Emitter::new(target.descriptor());
    emitter.emit_unit(unit)?;
    Ok(emitter.out)
}

struct Emitter {
    desc: &'static TargetDescriptor,
    out: String,
}

impl Emitter {
    fn new(desc: &'static TargetDescriptor) -> Self {
        Self {
            desc,
            out: String::new(),
        }
    }

    fn line(&mut self, text: &str) {
        self.out.push_str(self.desc.indent);
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn label(&mut self, name: &str) {
        self.out.push_str(name);
        self.out.push_str(":\n");
    }

    fn comment(&mut self, text: &str) {
        self.out.push_str(self.desc.indent);
        self.out.push_str(self.desc.comment);
        self.out.push(' ');
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn emit_unit(&mut self, unit: &TranslationUnit) -> Result<(), CompileError> {
        self.comment(&format!(
            "generated for {} ({}-byte words)",
            self.desc.name, self.desc.word_size
        ));
        for decl in &unit.decls {
            if let ExternalDecl::Function(func) = decl {
                if func.body.is_some() {
                    self.emit_function(func)?;
                }
            }
        }
        Ok(())
    }

    fn emit_function(&mut self, func: &FunctionDecl) -> Result<(), CompileError> {
        self.out.push('\n');
        self.label(&func.name);
        for line in self.desc.prologue {
            self.line(line);
        }
        for item in func.body.as_deref().unwrap_or(&[]) {
            self.emit_block_item(item)?;
        }
        for line in self.desc.epilogue {
            self.line(line);
        }
        Ok(())
    }

    fn emit_block_item(&mut self, item: &BlockItem) -> Result<(), CompileError> {
        match item {
            BlockItem::Declaration(var) => {
                if let Some(init) = &var.init {
                    self.emit_expr(init)?;
                    self.comment(&format!("{} = {}", var.name, self.desc.registers[0]));
                }
                Ok(())
            }
            BlockItem::Statement(stmt) => self.emit_stmt(stmt),
        }
    }

    fn emit_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Compound(items, _) => {
                for item in items {
                    self.emit_block_item(item)?;
                }
                Ok(())
            }
            Stmt::Return(value, _) => {
                if let Some(expr) = value {
                    self.emit_expr(expr)?;
                } else {
                    self.emit_const(0);
                }
                for line in self.desc.epilogue {
                    self.line(line);
                }
                Ok(())
            }
            Stmt::Expression(expr, _) => self.emit_expr(expr),
            Stmt::Empty(_) => Ok(()),
            other => {
                self.comment(&format!(
                    "{} statement handled by the bytecode backends",
                    stmt_name(other)
                ));
                Ok(())
            }
        }
    }

    /// Evaluate an expression into the target's first register.
    fn emit_expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::IntConst { value, .. } => {
                self.emit_const(*value);
                Ok(())
            }
            Expr::Identifier { name, .. } => {
                // The template backend has no frame layout; variables read
                // as a commented placeholder load.
                self.comment(&format!("load {}", name));
                Ok(())
            }
            Expr::Binary { op, lhs, rhs, span } => {
                let mnemonic = match op {
                    BinaryOp::Add => "add",
                    BinaryOp::Sub => "sub",
                    BinaryOp::Mul => self.mul_mnemonic(),
                    _ => {
                        return Err(CompileError::new(
                            ErrorKind::UnsupportedConstruct,
                            "Only add/sub/mul are in the template emitter's repertoire",
                            *span,
                        ));
                    }
                };
                self.emit_expr(lhs)?;
                self.emit_move_to_spill();
                self.emit_expr(rhs)?;
                self.emit_binary(mnemonic, *op);
                Ok(())
            }
            Expr::Unary {
                op: UnaryOp::Neg,
                operand,
                span,
            } => {
                // -x emits as 0 - x through the spill register.
                let zero = Expr::IntConst {
                    value: 0,
                    ty: PrimitiveType::Int,
                    span: *span,
                };
                let sub = Expr::Binary {
                    op: BinaryOp::Sub,
                    lhs: Box::new(zero),
                    rhs: Box::new((**operand).clone()),
                    span: *span,
                };
                self.emit_expr(&sub)
            }
            other => Err(CompileError::new(
                ErrorKind::UnsupportedConstruct,
                "Expression is outside the template emitter's repertoire",
                other.span(),
            )),
        }
    }

    fn emit_const(&mut self, value: i64) {
        let r0 = self.desc.registers[0];
        let line = match self.desc.syntax {
            Syntax::Intel => format!("mov {}, {}", r0, value),
            Syntax::Arm => format!("mov {}, #{}", r0, value),
            Syntax::RiscV => format!("li {}, {}", r0, value),
        };
        self.line(&line);
    }

    fn emit_move_to_spill(&mut self) {
        let r0 = self.desc.registers[0];
        let r1 = self.desc.registers[1];
        let line = match self.desc.syntax {
            Syntax::Intel => format!("mov {}, {}", r1, r0),
            Syntax::Arm => format!("mov {}, {}", r1, r0),
            Syntax::RiscV => format!("mv {}, {}", r1, r0),
        };
        self.line(&line);
    }

    /// Combine spill (left operand) and first register (right operand).
    fn emit_binary(&mut self, mnemonic: &str, op: BinaryOp) {
        let r0 = self.desc.registers[0];
        let r1 = self.desc.registers[1];
        match self.desc.syntax {
            Syntax::Intel => {
                if op == BinaryOp::Sub {
                    // Left lives in the spill register: compute there, then
                    // move the result back.
                    self.line(&format!("{} {}, {}", mnemonic, r1, r0));
                    self.line(&format!("mov {}, {}", r0, r1));
                } else {
                    self.line(&format!("{} {}, {}", mnemonic, r0, r1));
                }
            }
            Syntax::Arm | Syntax::RiscV => {
                // Three-operand form expresses left-right directly.
                self.line(&format!("{} {}, {}, {}", mnemonic, r0, r1, r0));
            }
        }
    }

    fn mul_mnemonic(&self) -> &'static str {
        match self.desc.syntax {
            Syntax::Intel => "imul",
            Syntax::Arm | Syntax::RiscV => "mul",
        }
    }
}

fn stmt_name(stmt: &Stmt) -> &'static str {
    match stmt {
        Stmt::If { .. } => "if",
        Stmt::While { .. } => "while",
        Stmt::For { .. } => "for",
        Stmt::Break(_) => "break",
        Stmt::Continue(_) => "continue",
        _ => "statement",
    }
}
