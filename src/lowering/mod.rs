//! # AST → ASTC Lowering
//!
//! Translates the typed AST into ASTC instructions. The lowering is
//! structural: every expression nets exactly one value on the operand stack,
//! every statement nets zero, and no optimization happens here.
//!
//! ## Control flow
//!
//! Branch operands are block depths, never instruction offsets. Loops are
//! wrapped in an outer `block` so the exit test can `br_if` out of it;
//! `for` bodies get an inner block whose end lands on the increment, which
//! gives `continue` its C semantics. `break`/`continue` depths are computed
//! from the lowering-time control-frame stack — there are no hard-coded
//! branch constants anywhere in this module.
//!
//! ## Short-circuit `&&` / `||`
//!
//! Lowered with the `tee`/`br_if` pattern inside a dedicated block, using a
//! per-function scratch slot, and normalized to 0/1 with a double `i32.eqz`.
//!
//! ## Locals
//!
//! Each function has its own slot counter: parameters take the first slots
//! in declaration order, declarations append as they appear, and identifiers
//! that resolve to nothing are inserted as fresh locals. Element sizes for
//! subscripts come from declared types; a subscript on something with no
//! declared element type is an error, never a guess.

#[cfg(test)]
mod tests;

use crate::bytecode::{call_operand, AstcProgram, Opcode, Operand, SymbolKind};
use crate::error::{CompileError, ErrorKind, Span};
use crate::parser::ast::*;

pub struct LowerResult {
    pub program: AstcProgram,
    pub errors: Vec<CompileError>,
}

#[must_use]
pub fn lower(unit: &TranslationUnit) -> LowerResult {
    let mut lowerer = Lowerer::new();
    lowerer.lower_unit(unit);
    LowerResult {
        program: lowerer.program,
        errors: lowerer.errors,
    }
}

/// A file-scope variable: name, declared type, global-slot index by position.
struct GlobalVar {
    name: String,
    ty: TypeName,
}

/// One slot in a function's local frame.
struct LocalSlot {
    name: String,
    /// Declared type; `None` for auto-registered identifiers.
    ty: Option<TypeName>,
}

/// Lowering-time control frame. Mirrors the VM's runtime control stack so
/// branch depths can be computed statically.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Frame {
    /// Ordinary `block`/`if` nesting.
    Plain,
    /// The `loop` instruction; `continue` targets this in `while` loops.
    LoopHead,
    /// The block wrapping a loop; `break` targets this.
    BreakTarget,
    /// The inner block around a `for` body; `continue` targets this so the
    /// increment still runs.
    ContinueTarget,
}

/// Per-function lowering state.
struct FuncCtx {
    slots: Vec<LocalSlot>,
    /// Lazily allocated scratch slot for short-circuit lowering.
    scratch: Option<u32>,
    frames: Vec<Frame>,
}

impl FuncCtx {
    fn new(params: &[Param]) -> Self {
        Self {
            slots: params
                .iter()
                .map(|p| LocalSlot {
                    name: p.name.clone(),
                    ty: Some(p.ty),
                })
                .collect(),
            scratch: None,
            frames: Vec::new(),
        }
    }

    fn declare(&mut self, name: &str, ty: Option<TypeName>) -> u32 {
        let slot = self.slots.len() as u32;
        self.slots.push(LocalSlot {
            name: name.to_string(),
            ty,
        });
        slot
    }

    /// Innermost slot with this name (declarations shadow outer ones).
    fn resolve(&self, name: &str) -> Option<u32> {
        self.slots
            .iter()
            .rposition(|s| s.name == name)
            .map(|i| i as u32)
    }

    fn slot_type(&self, slot: u32) -> Option<TypeName> {
        self.slots.get(slot as usize).and_then(|s| s.ty)
    }

    fn scratch_slot(&mut self) -> u32 {
        if let Some(slot) = self.scratch {
            return slot;
        }
        // '$' cannot appear in a C identifier, so this never collides.
        let slot = self.declare("$sc", None);
        self.scratch = Some(slot);
        slot
    }

    /// Depth of the innermost frame matching `pred`, as a `br` operand.
    fn depth_where(&self, pred: impl Fn(Frame) -> bool) -> Option<u32> {
        self.frames
            .iter()
            .rev()
            .position(|&f| pred(f))
            .map(|d| d as u32)
    }
}

struct Lowerer {
    program: AstcProgram,
    errors: Vec<CompileError>,
    globals: Vec<GlobalVar>,
}

impl Lowerer {
    fn new() -> Self {
        Self {
            program: AstcProgram::new(),
            errors: Vec::new(),
            globals: Vec::new(),
        }
    }

    fn error(&mut self, kind: ErrorKind, message: impl Into<String>, span: Span) {
        self.errors.push(CompileError::new(kind, message, span));
    }

    fn emit(&mut self, opcode: Opcode, operand: Operand) -> usize {
        self.program.emit(opcode, operand)
    }

    fn lower_unit(&mut self, unit: &TranslationUnit) {
        // File-scope variables first: their initializers must be integer
        // constant expressions and their slots must exist before any
        // function body references them.
        for decl in &unit.decls {
            if let ExternalDecl::Variable(var) = decl {
                let value = match &var.init {
                    None => 0,
                    Some(init) => match eval_const(init) {
                        Some(v) => v,
                        None => {
                            self.error(
                                ErrorKind::ConstantExpressionRequired,
                                format!(
                                    "Initializer of file-scope variable '{}' is not an \
                                     integer constant expression",
                                    var.name
                                ),
                                var.span,
                            );
                            0
                        }
                    },
                };
                self.globals.push(GlobalVar {
                    name: var.name.clone(),
                    ty: var.ty,
                });
                self.program.globals.push(value);
            }
        }

        for decl in &unit.decls {
            if let ExternalDecl::Function(func) = decl {
                if func.body.is_some() {
                    self.lower_function(func);
                }
            }
        }
    }

    fn lower_function(&mut self, func: &FunctionDecl) {
        let symbol = self.program.symbols.intern(&func.name, SymbolKind::Function);
        let entry_pc = self.emit(Opcode::Func, Operand::Index(symbol));

        if func.name == "main" {
            self.program.entry_point = entry_pc;
        }

        let info_index = self.program.functions.len();
        self.program.functions.push(crate::bytecode::FunctionInfo {
            symbol,
            entry_pc,
            param_count: func.params.len() as u32,
            local_count: 0,
        });

        let mut ctx = FuncCtx::new(&func.params);
        for item in func.body.as_deref().unwrap_or(&[]) {
            self.lower_block_item(&mut ctx, item);
        }
        self.emit(Opcode::End, Operand::None);

        self.program.functions[info_index].local_count = ctx.slots.len() as u32;
    }

    fn lower_block_item(&mut self, ctx: &mut FuncCtx, item: &BlockItem) {
        match item {
            BlockItem::Declaration(var) => self.lower_local_decl(ctx, var),
            BlockItem::Statement(stmt) => self.lower_stmt(ctx, stmt),
        }
    }

    fn lower_local_decl(&mut self, ctx: &mut FuncCtx, var: &VarDecl) {
        let slot = ctx.declare(&var.name, Some(var.ty));
        if let Some(init) = &var.init {
            self.lower_expr(ctx, init);
            self.emit(Opcode::LocalSet, Operand::Index(slot));
        }
    }

    // === Statements (net stack effect: 0) ===

    fn lower_stmt(&mut self, ctx: &mut FuncCtx, stmt: &Stmt) {
        match stmt {
            Stmt::Compound(items, _) => {
                self.emit(Opcode::Block, Operand::None);
                ctx.frames.push(Frame::Plain);
                for item in items {
                    self.lower_block_item(ctx, item);
                }
                self.emit(Opcode::End, Operand::None);
                ctx.frames.pop();
            }
            Stmt::Return(value, _) => {
                match value {
                    Some(expr) => self.lower_expr(ctx, expr),
                    None => {
                        self.emit(Opcode::I32Const, Operand::I32(0));
                    }
                }
                self.emit(Opcode::Return, Operand::None);
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                self.lower_expr(ctx, cond);
                self.emit(Opcode::If, Operand::None);
                ctx.frames.push(Frame::Plain);
                self.lower_stmt(ctx, then_branch);
                if let Some(else_branch) = else_branch {
                    self.emit(Opcode::Else, Operand::None);
                    self.lower_stmt(ctx, else_branch);
                }
                self.emit(Opcode::End, Operand::None);
                ctx.frames.pop();
            }
            Stmt::While { cond, body, .. } => {
                self.emit(Opcode::Block, Operand::None);
                ctx.frames.push(Frame::BreakTarget);
                self.emit(Opcode::Loop, Operand::None);
                ctx.frames.push(Frame::LoopHead);

                self.lower_expr(ctx, cond);
                self.emit(Opcode::I32Const, Operand::I32(0));
                self.emit(Opcode::I32Eq, Operand::None);
                let exit = ctx
                    .depth_where(|f| f == Frame::BreakTarget)
                    .expect("loop pushed its break target");
                self.emit(Opcode::BrIf, Operand::Index(exit));

                self.lower_stmt(ctx, body);

                let back = ctx
                    .depth_where(|f| f == Frame::LoopHead)
                    .expect("loop pushed its head");
                self.emit(Opcode::Br, Operand::Index(back));

                self.emit(Opcode::End, Operand::None);
                ctx.frames.pop();
                self.emit(Opcode::End, Operand::None);
                ctx.frames.pop();
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
                ..
            } => {
                match init {
                    Some(ForInit::Declaration(var)) => self.lower_local_decl(ctx, var),
                    Some(ForInit::Expression(expr)) => {
                        self.lower_expr(ctx, expr);
                        self.emit(Opcode::Drop, Operand::None);
                    }
                    None => {}
                }

                self.emit(Opcode::Block, Operand::None);
                ctx.frames.push(Frame::BreakTarget);
                self.emit(Opcode::Loop, Operand::None);
                ctx.frames.push(Frame::LoopHead);

                if let Some(cond) = cond {
                    self.lower_expr(ctx, cond);
                    self.emit(Opcode::I32Const, Operand::I32(0));
                    self.emit(Opcode::I32Eq, Operand::None);
                    let exit = ctx
                        .depth_where(|f| f == Frame::BreakTarget)
                        .expect("loop pushed its break target");
                    self.emit(Opcode::BrIf, Operand::Index(exit));
                }

                // The body block's end is where `continue` lands: just
                // before the increment.
                self.emit(Opcode::Block, Operand::None);
                ctx.frames.push(Frame::ContinueTarget);
                self.lower_stmt(ctx, body);
                self.emit(Opcode::End, Operand::None);
                ctx.frames.pop();

                if let Some(step) = step {
                    self.lower_expr(ctx, step);
                    self.emit(Opcode::Drop, Operand::None);
                }

                let back = ctx
                    .depth_where(|f| f == Frame::LoopHead)
                    .expect("loop pushed its head");
                self.emit(Opcode::Br, Operand::Index(back));

                self.emit(Opcode::End, Operand::None);
                ctx.frames.pop();
                self.emit(Opcode::End, Operand::None);
                ctx.frames.pop();
            }
            Stmt::Break(span) => match ctx.depth_where(|f| f == Frame::BreakTarget) {
                Some(depth) => {
                    self.emit(Opcode::Br, Operand::Index(depth));
                }
                None => self.error(
                    ErrorKind::BreakOutsideLoop,
                    "'break' outside of a loop",
                    *span,
                ),
            },
            Stmt::Continue(span) => {
                let target = ctx
                    .depth_where(|f| matches!(f, Frame::LoopHead | Frame::ContinueTarget));
                match target {
                    Some(depth) => {
                        self.emit(Opcode::Br, Operand::Index(depth));
                    }
                    None => self.error(
                        ErrorKind::ContinueOutsideLoop,
                        "'continue' outside of a loop",
                        *span,
                    ),
                }
            }
            Stmt::Expression(expr, _) => {
                self.lower_expr(ctx, expr);
                self.emit(Opcode::Drop, Operand::None);
            }
            Stmt::Empty(_) => {}
        }
    }

    // === Expressions (net stack effect: +1) ===

    fn lower_expr(&mut self, ctx: &mut FuncCtx, expr: &Expr) {
        match expr {
            Expr::IntConst { value, ty, .. } => {
                if *ty == PrimitiveType::Long {
                    self.emit(Opcode::I64Const, Operand::I64(*value));
                } else {
                    self.emit(Opcode::I32Const, Operand::I32(*value as i32));
                }
            }
            Expr::FloatConst { value, ty, .. } => {
                if *ty == PrimitiveType::Float {
                    self.emit(Opcode::F32Const, Operand::F32((*value as f32).to_bits()));
                } else {
                    self.emit(Opcode::F64Const, Operand::F64(value.to_bits()));
                }
            }
            Expr::StringLit { value, span } => match self.program.intern_string(value) {
                Some(offset) => {
                    self.emit(Opcode::StringConst, Operand::Index(offset));
                }
                None => {
                    self.error(
                        ErrorKind::DataSegmentOverflow,
                        "Data segment overflow while interning string literal",
                        *span,
                    );
                    self.emit(Opcode::I32Const, Operand::I32(0));
                }
            },
            Expr::Identifier { name, .. } => {
                if let Some(slot) = ctx.resolve(name) {
                    self.emit(Opcode::LocalGet, Operand::Index(slot));
                } else if let Some(index) = self.global_index(name) {
                    self.emit(Opcode::GlobalGet, Operand::Index(index));
                } else {
                    // Unknown identifiers register as fresh locals; a
                    // zero-initialized slot is the lenient resolution for
                    // this dialect.
                    let slot = ctx.declare(name, None);
                    self.emit(Opcode::LocalGet, Operand::Index(slot));
                }
            }
            Expr::Unary { op, operand, .. } => match op {
                UnaryOp::Neg => {
                    self.emit(Opcode::I32Const, Operand::I32(0));
                    self.lower_expr(ctx, operand);
                    self.emit(Opcode::I32Sub, Operand::None);
                }
                UnaryOp::LogicalNot => {
                    self.lower_expr(ctx, operand);
                    self.emit(Opcode::I32Const, Operand::I32(0));
                    self.emit(Opcode::I32Eq, Operand::None);
                }
                UnaryOp::BitNot => {
                    self.lower_expr(ctx, operand);
                    self.emit(Opcode::I32Const, Operand::I32(-1));
                    self.emit(Opcode::I32Xor, Operand::None);
                }
                // Address-of collapses to the value itself in this dialect:
                // locals have no addressable storage.
                UnaryOp::AddrOf => {
                    self.lower_expr(ctx, operand);
                }
                UnaryOp::Deref => {
                    self.lower_expr(ctx, operand);
                    self.emit(Opcode::I32Load, Operand::None);
                }
            },
            Expr::Binary { op, lhs, rhs, .. } => match op {
                BinaryOp::LogicalAnd | BinaryOp::LogicalOr => {
                    self.lower_short_circuit(ctx, *op, lhs, rhs);
                }
                _ => {
                    self.lower_expr(ctx, lhs);
                    self.lower_expr(ctx, rhs);
                    self.emit(binary_opcode(*op), Operand::None);
                }
            },
            Expr::Assign { target, value, span } => {
                self.lower_assignment(ctx, target, value, *span);
            }
            Expr::Call {
                callee,
                args,
                is_host,
                ..
            } => {
                for arg in args {
                    self.lower_expr(ctx, arg);
                }
                let kind = if *is_host {
                    SymbolKind::Host
                } else {
                    SymbolKind::Function
                };
                let symbol = self.program.symbols.intern(callee, kind);
                self.emit(Opcode::Call, call_operand(symbol, args.len() as u32));
            }
            Expr::Member { span, .. } => {
                // No struct layout information exists in this subset;
                // refusing beats deriving offsets from member names.
                self.error(
                    ErrorKind::StructLayoutUnavailable,
                    "struct layout unavailable",
                    *span,
                );
                self.emit(Opcode::I32Const, Operand::I32(0));
            }
            Expr::Index { base, index, span } => {
                let element = self.lower_index_address(ctx, base, index, *span);
                match element.map(|e| e.size) {
                    Some(8) => self.emit(Opcode::I64Load, Operand::None),
                    _ => self.emit(Opcode::I32Load, Operand::None),
                };
            }
            Expr::Cast { ty, operand, .. } => {
                self.lower_expr(ctx, operand);
                self.lower_cast(ctx, *ty, operand);
            }
        }
    }

    fn lower_short_circuit(&mut self, ctx: &mut FuncCtx, op: BinaryOp, lhs: &Expr, rhs: &Expr) {
        let scratch = ctx.scratch_slot();

        self.emit(Opcode::Block, Operand::None);
        ctx.frames.push(Frame::Plain);

        self.lower_expr(ctx, lhs);
        self.emit(Opcode::LocalTee, Operand::Index(scratch));
        if op == BinaryOp::LogicalAnd {
            // Left operand zero already decides `&&`.
            self.emit(Opcode::I32Eqz, Operand::None);
        }
        self.emit(Opcode::BrIf, Operand::Index(0));

        self.lower_expr(ctx, rhs);
        self.emit(Opcode::LocalSet, Operand::Index(scratch));

        self.emit(Opcode::End, Operand::None);
        ctx.frames.pop();

        self.emit(Opcode::LocalGet, Operand::Index(scratch));
        self.emit(Opcode::I32Eqz, Operand::None);
        self.emit(Opcode::I32Eqz, Operand::None);
    }

    fn lower_assignment(&mut self, ctx: &mut FuncCtx, target: &Expr, value: &Expr, span: Span) {
        match target {
            Expr::Identifier { name, .. } => {
                if let Some(slot) = ctx.resolve(name) {
                    self.lower_expr(ctx, value);
                    self.emit(Opcode::LocalTee, Operand::Index(slot));
                } else if let Some(index) = self.global_index(name) {
                    self.lower_expr(ctx, value);
                    self.emit(Opcode::GlobalSet, Operand::Index(index));
                    self.emit(Opcode::GlobalGet, Operand::Index(index));
                } else {
                    let slot = ctx.declare(name, None);
                    self.lower_expr(ctx, value);
                    self.emit(Opcode::LocalTee, Operand::Index(slot));
                }
            }
            Expr::Unary {
                op: UnaryOp::Deref,
                operand,
                ..
            } => {
                let scratch = ctx.scratch_slot();
                self.lower_expr(ctx, operand);
                self.lower_expr(ctx, value);
                self.emit(Opcode::LocalTee, Operand::Index(scratch));
                self.emit(Opcode::I32Store, Operand::None);
                self.emit(Opcode::LocalGet, Operand::Index(scratch));
            }
            Expr::Index { base, index, span } => {
                let scratch = ctx.scratch_slot();
                let element = self.lower_index_address(ctx, base, index, *span);
                self.lower_expr(ctx, value);
                self.emit(Opcode::LocalTee, Operand::Index(scratch));
                let store = match element.map(|e| e.size) {
                    Some(1) => Opcode::I32Store8,
                    Some(2) => Opcode::I32Store16,
                    Some(8) => Opcode::I64Store,
                    _ => Opcode::I32Store,
                };
                self.emit(store, Operand::None);
                self.emit(Opcode::LocalGet, Operand::Index(scratch));
            }
            Expr::Member { .. } => {
                self.error(
                    ErrorKind::StructLayoutUnavailable,
                    "struct layout unavailable",
                    span,
                );
                self.emit(Opcode::I32Const, Operand::I32(0));
            }
            _ => {
                self.error(
                    ErrorKind::InvalidAssignmentTarget,
                    "Expression is not assignable",
                    span,
                );
                self.emit(Opcode::I32Const, Operand::I32(0));
            }
        }
    }

    /// Lower `base[index]` down to an address on the stack. Returns the
    /// element description, or `None` (after recording an error) when no
    /// declared type supplies an element size.
    fn lower_index_address(
        &mut self,
        ctx: &mut FuncCtx,
        base: &Expr,
        index: &Expr,
        span: Span,
    ) -> Option<ElementInfo> {
        let element = self.element_info(ctx, base);
        if element.is_none() {
            self.error(
                ErrorKind::MissingElementType,
                "Cannot determine element size: subscripted expression has no declared \
                 pointer type",
                span,
            );
        }
        let size = element.map(|e| e.size).unwrap_or(4);

        self.lower_expr(ctx, base);
        self.lower_expr(ctx, index);
        self.emit(Opcode::I32Const, Operand::I32(size as i32));
        self.emit(Opcode::I32Mul, Operand::None);
        self.emit(Opcode::I32Add, Operand::None);
        element
    }

    /// Declared element type of a subscripted expression, if any.
    fn element_info(&self, ctx: &FuncCtx, base: &Expr) -> Option<ElementInfo> {
        let ty = self.infer_type_name(ctx, base)?;
        let size = ty.element_size()?;
        Some(ElementInfo { size })
    }

    fn infer_type_name(&self, ctx: &FuncCtx, expr: &Expr) -> Option<TypeName> {
        match expr {
            Expr::Identifier { name, .. } => {
                if let Some(slot) = ctx.resolve(name) {
                    ctx.slot_type(slot)
                } else {
                    self.globals.iter().find(|g| g.name == *name).map(|g| g.ty)
                }
            }
            Expr::Cast { ty, .. } => Some(*ty),
            _ => None,
        }
    }

    fn lower_cast(&mut self, ctx: &FuncCtx, target: TypeName, operand: &Expr) {
        if target.pointer_depth > 0 {
            return; // Pointer casts are representation no-ops.
        }

        let source = self.infer_primitive(ctx, operand);
        match (source, target.base) {
            (Some(PrimitiveType::Float), t) if is_integer(t) => {
                self.emit(Opcode::I32TruncF32S, Operand::None);
            }
            (Some(PrimitiveType::Double), t) if is_integer(t) => {
                self.emit(Opcode::I32TruncF64S, Operand::None);
            }
            (Some(PrimitiveType::Long), t) if is_integer(t) && t != PrimitiveType::Long => {
                self.emit(Opcode::I32WrapI64, Operand::None);
            }
            _ => {}
        }

        // Narrowing integer casts mask down to the target width.
        match target.base {
            PrimitiveType::Char => {
                self.emit(Opcode::I32Const, Operand::I32(0xFF));
                self.emit(Opcode::I32And, Operand::None);
            }
            PrimitiveType::Short => {
                self.emit(Opcode::I32Const, Operand::I32(0xFFFF));
                self.emit(Opcode::I32And, Operand::None);
            }
            _ => {}
        }
    }

    /// Best-effort primitive type of an expression, for cast selection.
    fn infer_primitive(&self, ctx: &FuncCtx, expr: &Expr) -> Option<PrimitiveType> {
        match expr {
            Expr::IntConst { ty, .. } | Expr::FloatConst { ty, .. } => Some(*ty),
            Expr::Identifier { .. } => self
                .infer_type_name(ctx, expr)
                .filter(|t| t.pointer_depth == 0)
                .map(|t| t.base),
            Expr::Cast { ty, .. } => (ty.pointer_depth == 0).then_some(ty.base),
            Expr::Unary { operand, .. } => self.infer_primitive(ctx, operand),
            Expr::Binary { lhs, .. } => self.infer_primitive(ctx, lhs),
            Expr::Assign { value, .. } => self.infer_primitive(ctx, value),
            _ => None,
        }
    }

    fn global_index(&self, name: &str) -> Option<u32> {
        self.globals
            .iter()
            .position(|g| g.name == name)
            .map(|i| i as u32)
    }
}

#[derive(Debug, Clone, Copy)]
struct ElementInfo {
    size: u32,
}

fn is_integer(ty: PrimitiveType) -> bool {
    matches!(
        ty,
        PrimitiveType::Char | PrimitiveType::Short | PrimitiveType::Int | PrimitiveType::Long
    )
}

fn binary_opcode(op: BinaryOp) -> Opcode {
    match op {
        BinaryOp::Add => Opcode::I32Add,
        BinaryOp::Sub => Opcode::I32Sub,
        BinaryOp::Mul => Opcode::I32Mul,
        BinaryOp::Div => Opcode::I32DivS,
        BinaryOp::Rem => Opcode::I32RemS,
        BinaryOp::BitAnd => Opcode::I32And,
        BinaryOp::BitOr => Opcode::I32Or,
        BinaryOp::BitXor => Opcode::I32Xor,
        BinaryOp::Shl => Opcode::I32Shl,
        BinaryOp::Shr => Opcode::I32ShrS,
        BinaryOp::Eq => Opcode::I32Eq,
        BinaryOp::Ne => Opcode::I32Ne,
        BinaryOp::Lt => Opcode::I32LtS,
        BinaryOp::Le => Opcode::I32LeS,
        BinaryOp::Gt => Opcode::I32GtS,
        BinaryOp::Ge => Opcode::I32GeS,
        BinaryOp::LogicalAnd | BinaryOp::LogicalOr => {
            unreachable!("short-circuit operators lower through their own path")
        }
    }
}

/// Fold an integer constant expression, for file-scope initializers.
fn eval_const(expr: &Expr) -> Option<i64> {
    match expr {
        Expr::IntConst { value, .. } => Some(*value),
        Expr::Unary { op, operand, .. } => {
            let v = eval_const(operand)?;
            match op {
                UnaryOp::Neg => Some(-v),
                UnaryOp::BitNot => Some(!v),
                UnaryOp::LogicalNot => Some((v == 0) as i64),
                _ => None,
            }
        }
        Expr::Binary { op, lhs, rhs, .. } => {
            let a = eval_const(lhs)?;
            let b = eval_const(rhs)?;
            match op {
                BinaryOp::Add => Some(a.wrapping_add(b)),
                BinaryOp::Sub => Some(a.wrapping_sub(b)),
                BinaryOp::Mul => Some(a.wrapping_mul(b)),
                BinaryOp::Div => (b != 0).then(|| a.wrapping_div(b)),
                BinaryOp::Rem => (b != 0).then(|| a.wrapping_rem(b)),
                BinaryOp::BitAnd => Some(a & b),
                BinaryOp::BitOr => Some(a | b),
                BinaryOp::BitXor => Some(a ^ b),
                BinaryOp::Shl => Some(a.wrapping_shl(b as u32)),
                BinaryOp::Shr => Some(a.wrapping_shr(b as u32)),
                _ => None,
            }
        }
        Expr::Cast { operand, .. } => eval_const(operand),
        _ => None,
    }
}
