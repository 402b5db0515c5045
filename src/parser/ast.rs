//! # Abstract Syntax Tree (AST)
//!
//! Data structures representing parsed C99 source.
//!
//! ## Structure
//!
//! A translation unit is an ordered list of external declarations (functions
//! and file-scope variables). Statements and expressions are layered owned
//! enums: every node exclusively owns its children (`Box`/`Vec`, no sharing),
//! and every node carries the `Span` it came from for error reporting.
//!
//! ## Design Philosophy
//!
//! The tree maps directly onto the lowering rules: each expression variant
//! corresponds to one emission pattern, so the lowering pass is a plain
//! post-order walk with no auxiliary lookup structures.

use crate::error::Span;

/// Primitive (non-derived) C types in the accepted subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Void,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    /// Size in bytes when used as an array/pointer element.
    pub fn size(&self) -> Option<u32> {
        match self {
            PrimitiveType::Void => None,
            PrimitiveType::Char => Some(1),
            PrimitiveType::Short => Some(2),
            PrimitiveType::Int => Some(4),
            PrimitiveType::Long => Some(8),
            PrimitiveType::Float => Some(4),
            PrimitiveType::Double => Some(8),
        }
    }
}

/// A declared type: base specifier plus pointer depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeName {
    pub base: PrimitiveType,
    pub unsigned: bool,
    pub pointer_depth: u8,
    pub span: Span,
}

impl TypeName {
    /// Element size for one level of indirection (`p[i]`, `*p`).
    ///
    /// `int *p` → 4, `char *s` → 1, `int **q` → 8 (pointer element).
    pub fn element_size(&self) -> Option<u32> {
        if self.pointer_depth > 1 {
            Some(8)
        } else if self.pointer_depth == 1 {
            self.base.size()
        } else {
            None
        }
    }
}

/// Root of a parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationUnit {
    pub decls: Vec<ExternalDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExternalDecl {
    Function(FunctionDecl),
    Variable(VarDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub return_type: TypeName,
    pub params: Vec<Param>,
    /// `None` for a prototype (`int f(int);`).
    pub body: Option<Vec<BlockItem>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeName,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub ty: TypeName,
    pub init: Option<Expr>,
    pub span: Span,
}

/// One entry of a compound statement: C99 allows declarations anywhere in a
/// block, not just at the top.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockItem {
    Declaration(VarDecl),
    Statement(Stmt),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Compound(Vec<BlockItem>, Span),
    Return(Option<Expr>, Span),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
        span: Span,
    },
    For {
        init: Option<ForInit>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
        span: Span,
    },
    Break(Span),
    Continue(Span),
    Expression(Expr, Span),
    Empty(Span),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Declaration(VarDecl),
    Expression(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    LogicalNot,
    /// `~x`
    BitNot,
    /// `&x`
    AddrOf,
    /// `*x`
    Deref,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LogicalAnd,
    LogicalOr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Integer constant; `ty` distinguishes `int`/`long`/`char` origins.
    IntConst {
        value: i64,
        ty: PrimitiveType,
        span: Span,
    },
    /// Floating constant; `ty` is `Float` or `Double`.
    FloatConst {
        value: f64,
        ty: PrimitiveType,
        span: Span,
    },
    StringLit {
        value: String,
        span: Span,
    },
    Identifier {
        name: String,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    /// `target = value`; compound assignments are desugared before this node
    /// is built.
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
        /// True when the callee is one of the pre-registered host-library
        /// functions; lowering dispatches these through the FFI registry.
        is_host: bool,
        span: Span,
    },
    Member {
        object: Box<Expr>,
        field: String,
        /// `->` instead of `.`
        arrow: bool,
        span: Span,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    Cast {
        ty: TypeName,
        operand: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::IntConst { span, .. }
            | Expr::FloatConst { span, .. }
            | Expr::StringLit { span, .. }
            | Expr::Identifier { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Assign { span, .. }
            | Expr::Call { span, .. }
            | Expr::Member { span, .. }
            | Expr::Index { span, .. }
            | Expr::Cast { span, .. } => *span,
        }
    }
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Compound(_, span)
            | Stmt::Return(_, span)
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::For { span, .. }
            | Stmt::Break(span)
            | Stmt::Continue(span)
            | Stmt::Expression(_, span)
            | Stmt::Empty(span) => *span,
        }
    }
}
