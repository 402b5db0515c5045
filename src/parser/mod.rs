//! # C99 Parser
//!
//! Parses the token stream into a typed AST.
//!
//! ## Architecture
//!
//! Recursive descent with a single token of lookahead (two at the cast/paren
//! ambiguity). The parser borrows the token vector by index; it never owns
//! or copies tokens. Each production returns `Result<_, CompileError>`; an
//! error aborts the current external declaration only, and the
//! translation-unit loop skips one token and retries, so a bad declaration
//! cannot cascade into the ones after it.
//!
//! ## Accepted subset
//!
//! - declarations: `type ident;`, `type ident = expr;`, functions with full
//!   parameter lists and optional bodies
//! - statements: compound, `return`, `if`/`else`, `while`, `for`, `break`,
//!   `continue`, expression statements, empty statements
//! - expressions: the full C precedence ladder from assignment down to
//!   primary, calls, array subscripts, member access, casts, and prefix
//!   `++`/`--` (desugared to compound assignment)
//!
//! Numeric literal values are parsed here (base 10/16 inspection, suffix
//! stripping), not in the lexer.

pub mod ast;

#[cfg(test)]
mod tests;

use crate::error::{CompileError, ErrorKind, Span};
use crate::ffi::BASELINE_HOST_FUNCTIONS;
use crate::lexer::token::{Keyword, Token, TokenKind};
use ast::*;

pub struct ParseResult {
    pub unit: TranslationUnit,
    pub errors: Vec<CompileError>,
}

#[must_use]
pub fn parse(tokens: &[Token]) -> ParseResult {
    let mut parser = Parser::new(tokens);
    let unit = parser.translation_unit();
    ParseResult {
        unit,
        errors: parser.errors,
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    errors: Vec<CompileError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    // === Token plumbing ===

    fn peek(&self) -> &'a Token {
        // The lexer guarantees an EOF terminator, so clamping to the last
        // token keeps every lookahead in bounds.
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().expect("token stream has EOF"))
    }

    fn peek_ahead(&self, n: usize) -> &'a Token {
        self.tokens
            .get(self.pos + n)
            .unwrap_or_else(|| self.tokens.last().expect("token stream has EOF"))
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if !token.kind.is_eof() {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        self.peek().kind.is_eof()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<&'a Token, CompileError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.peek();
            Err(CompileError::expected(
                format!("Expected {} but found '{}'", what, describe(found)),
                found.span,
            ))
        }
    }

    fn is_type_start(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Keyword(k) if k.is_type_specifier())
    }

    // === Declarations ===

    fn translation_unit(&mut self) -> TranslationUnit {
        let mut decls = Vec::new();
        while !self.at_eof() {
            match self.external_declaration() {
                Ok(decl) => decls.push(decl),
                Err(err) => {
                    self.errors.push(err);
                    // Skip one token and retry at the translation-unit
                    // level; this bounds the damage of a malformed
                    // declaration to itself.
                    self.advance();
                }
            }
        }
        TranslationUnit { decls }
    }

    fn external_declaration(&mut self) -> Result<ExternalDecl, CompileError> {
        let start = self.peek().span;
        let ty = self.type_name()?;
        let name = self.identifier("declaration name")?;

        if self.check(&TokenKind::LParen) {
            self.function_suffix(ty, name, start).map(ExternalDecl::Function)
        } else {
            self.var_suffix(ty, name, start).map(ExternalDecl::Variable)
        }
    }

    /// `type-specifier+ '*'*`
    ///
    /// Multi-keyword specifiers (`unsigned long`, `long long int`) collapse
    /// onto one base type; `const`/`signed` are accepted and discarded.
    fn type_name(&mut self) -> Result<TypeName, CompileError> {
        let start = self.peek().span;
        let mut base: Option<PrimitiveType> = None;
        let mut unsigned = false;
        let mut long_count = 0u8;
        let mut short = false;
        let mut saw_any = false;

        loop {
            let kw = match self.peek().kind {
                TokenKind::Keyword(k) if k.is_type_specifier() => k,
                _ => break,
            };
            saw_any = true;
            self.advance();
            match kw {
                Keyword::Void => base = Some(PrimitiveType::Void),
                Keyword::Char => base = Some(PrimitiveType::Char),
                Keyword::Float => base = Some(PrimitiveType::Float),
                Keyword::Double => base = Some(PrimitiveType::Double),
                Keyword::Int => base = base.or(Some(PrimitiveType::Int)),
                Keyword::Long => long_count += 1,
                Keyword::Short => short = true,
                Keyword::Unsigned => unsigned = true,
                Keyword::Signed | Keyword::Const => {}
                _ => unreachable!("is_type_specifier covers the arms above"),
            }
        }

        if !saw_any {
            let found = self.peek();
            return Err(CompileError::new(
                ErrorKind::ExpectedTypeSpecifier,
                format!("Expected type specifier but found '{}'", describe(found)),
                found.span,
            ));
        }

        let base = if long_count > 0 {
            PrimitiveType::Long
        } else if short {
            PrimitiveType::Short
        } else {
            base.unwrap_or(PrimitiveType::Int)
        };

        let mut pointer_depth = 0u8;
        while self.eat(&TokenKind::Star) {
            pointer_depth += 1;
        }

        Ok(TypeName {
            base,
            unsigned,
            pointer_depth,
            span: start,
        })
    }

    fn identifier(&mut self, what: &str) -> Result<String, CompileError> {
        if matches!(self.peek().kind, TokenKind::Identifier) {
            Ok(self.advance().lexeme.clone())
        } else {
            let found = self.peek();
            Err(CompileError::new(
                ErrorKind::ExpectedIdentifier,
                format!("Expected {} but found '{}'", what, describe(found)),
                found.span,
            ))
        }
    }

    fn function_suffix(
        &mut self,
        return_type: TypeName,
        name: String,
        start: Span,
    ) -> Result<FunctionDecl, CompileError> {
        self.expect(&TokenKind::LParen, "'('")?;
        let params = self.param_list()?;
        self.expect(&TokenKind::RParen, "')' after parameter list")?;

        let body = if self.eat(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.compound_items()?)
        };

        Ok(FunctionDecl {
            name,
            return_type,
            params,
            body,
            span: start,
        })
    }

    fn param_list(&mut self) -> Result<Vec<Param>, CompileError> {
        if self.check(&TokenKind::RParen) {
            return Ok(Vec::new());
        }
        // `(void)` is the empty parameter list.
        if self.check(&TokenKind::Keyword(Keyword::Void))
            && self.peek_ahead(1).kind == TokenKind::RParen
        {
            self.advance();
            return Ok(Vec::new());
        }

        let mut params = Vec::new();
        loop {
            let start = self.peek().span;
            let ty = self.type_name()?;
            let name = self.identifier("parameter name")?;
            params.push(Param {
                name,
                ty,
                span: start,
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn var_suffix(
        &mut self,
        ty: TypeName,
        name: String,
        start: Span,
    ) -> Result<VarDecl, CompileError> {
        let init = if self.eat(&TokenKind::Assign) {
            Some(self.assignment_expr()?)
        } else {
            None
        };
        self.expect(&TokenKind::Semicolon, "';' after declaration")?;
        Ok(VarDecl {
            name,
            ty,
            init,
            span: start,
        })
    }

    // === Statements ===

    fn compound_items(&mut self) -> Result<Vec<BlockItem>, CompileError> {
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut items = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.at_eof() {
                let found = self.peek();
                return Err(CompileError::expected(
                    "Expected '}' before end of input",
                    found.span,
                ));
            }
            items.push(self.block_item()?);
        }
        self.advance(); // '}'
        Ok(items)
    }

    fn block_item(&mut self) -> Result<BlockItem, CompileError> {
        if self.is_type_start() {
            let start = self.peek().span;
            let ty = self.type_name()?;
            let name = self.identifier("variable name")?;
            self.var_suffix(ty, name, start).map(BlockItem::Declaration)
        } else {
            self.statement().map(BlockItem::Statement)
        }
    }

    fn statement(&mut self) -> Result<Stmt, CompileError> {
        let start = self.peek().span;
        match &self.peek().kind {
            TokenKind::LBrace => {
                let items = self.compound_items()?;
                Ok(Stmt::Compound(items, start))
            }
            TokenKind::Semicolon => {
                self.advance();
                Ok(Stmt::Empty(start))
            }
            TokenKind::Keyword(Keyword::Return) => {
                self.advance();
                let value = if self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.expect(&TokenKind::Semicolon, "';' after return value")?;
                Ok(Stmt::Return(value, start))
            }
            TokenKind::Keyword(Keyword::If) => {
                self.advance();
                self.expect(&TokenKind::LParen, "'(' after 'if'")?;
                let cond = self.expression()?;
                self.expect(&TokenKind::RParen, "')' after condition")?;
                let then_branch = Box::new(self.statement()?);
                let else_branch = if self.eat(&TokenKind::Keyword(Keyword::Else)) {
                    Some(Box::new(self.statement()?))
                } else {
                    None
                };
                Ok(Stmt::If {
                    cond,
                    then_branch,
                    else_branch,
                    span: start,
                })
            }
            TokenKind::Keyword(Keyword::While) => {
                self.advance();
                self.expect(&TokenKind::LParen, "'(' after 'while'")?;
                let cond = self.expression()?;
                self.expect(&TokenKind::RParen, "')' after condition")?;
                let body = Box::new(self.statement()?);
                Ok(Stmt::While {
                    cond,
                    body,
                    span: start,
                })
            }
            TokenKind::Keyword(Keyword::For) => {
                self.advance();
                self.expect(&TokenKind::LParen, "'(' after 'for'")?;
                let init = if self.eat(&TokenKind::Semicolon) {
                    None
                } else if self.is_type_start() {
                    let dstart = self.peek().span;
                    let ty = self.type_name()?;
                    let name = self.identifier("variable name")?;
                    let decl = self.var_suffix(ty, name, dstart)?;
                    Some(ForInit::Declaration(decl))
                } else {
                    let expr = self.expression()?;
                    self.expect(&TokenKind::Semicolon, "';' after for-initializer")?;
                    Some(ForInit::Expression(expr))
                };
                let cond = if self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.expect(&TokenKind::Semicolon, "';' after for-condition")?;
                let step = if self.check(&TokenKind::RParen) {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.expect(&TokenKind::RParen, "')' after for-clauses")?;
                let body = Box::new(self.statement()?);
                Ok(Stmt::For {
                    init,
                    cond,
                    step,
                    body,
                    span: start,
                })
            }
            TokenKind::Keyword(Keyword::Break) => {
                self.advance();
                self.expect(&TokenKind::Semicolon, "';' after 'break'")?;
                Ok(Stmt::Break(start))
            }
            TokenKind::Keyword(Keyword::Continue) => {
                self.advance();
                self.expect(&TokenKind::Semicolon, "';' after 'continue'")?;
                Ok(Stmt::Continue(start))
            }
            TokenKind::Keyword(kw @ (Keyword::Switch | Keyword::Do | Keyword::Goto)) => {
                let found = self.peek();
                Err(CompileError::new(
                    ErrorKind::UnsupportedConstruct,
                    format!("'{:?}' statements are not in the accepted subset", kw),
                    found.span,
                ))
            }
            _ => {
                let expr = self.expression()?;
                self.expect(&TokenKind::Semicolon, "';' after expression")?;
                Ok(Stmt::Expression(expr, start))
            }
        }
    }

    // === Expressions (precedence ladder, highest binding last) ===

    fn expression(&mut self) -> Result<Expr, CompileError> {
        self.assignment_expr()
    }

    fn assignment_expr(&mut self) -> Result<Expr, CompileError> {
        let lhs = self.logical_or_expr()?;

        let op = match self.peek().kind {
            TokenKind::Assign => None,
            TokenKind::PlusEq => Some(BinaryOp::Add),
            TokenKind::MinusEq => Some(BinaryOp::Sub),
            TokenKind::StarEq => Some(BinaryOp::Mul),
            TokenKind::SlashEq => Some(BinaryOp::Div),
            TokenKind::PercentEq => Some(BinaryOp::Rem),
            TokenKind::AmpEq => Some(BinaryOp::BitAnd),
            TokenKind::PipeEq => Some(BinaryOp::BitOr),
            TokenKind::CaretEq => Some(BinaryOp::BitXor),
            TokenKind::ShlEq => Some(BinaryOp::Shl),
            TokenKind::ShrEq => Some(BinaryOp::Shr),
            _ => return Ok(lhs),
        };

        let span = self.advance().span;
        let rhs = self.assignment_expr()?;

        // `x += e` desugars to `x = x + e`; lowering re-validates the target.
        let value = match op {
            None => rhs,
            Some(binop) => Expr::Binary {
                op: binop,
                lhs: Box::new(lhs.clone()),
                rhs: Box::new(rhs),
                span,
            },
        };

        Ok(Expr::Assign {
            target: Box::new(lhs),
            value: Box::new(value),
            span,
        })
    }

    fn logical_or_expr(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.logical_and_expr()?;
        while self.check(&TokenKind::PipePipe) {
            let span = self.advance().span;
            let rhs = self.logical_and_expr()?;
            lhs = binary(BinaryOp::LogicalOr, lhs, rhs, span);
        }
        Ok(lhs)
    }

    fn logical_and_expr(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.bit_or_expr()?;
        while self.check(&TokenKind::AmpAmp) {
            let span = self.advance().span;
            let rhs = self.bit_or_expr()?;
            lhs = binary(BinaryOp::LogicalAnd, lhs, rhs, span);
        }
        Ok(lhs)
    }

    fn bit_or_expr(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.bit_xor_expr()?;
        while self.check(&TokenKind::Pipe) {
            let span = self.advance().span;
            let rhs = self.bit_xor_expr()?;
            lhs = binary(BinaryOp::BitOr, lhs, rhs, span);
        }
        Ok(lhs)
    }

    fn bit_xor_expr(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.bit_and_expr()?;
        while self.check(&TokenKind::Caret) {
            let span = self.advance().span;
            let rhs = self.bit_and_expr()?;
            lhs = binary(BinaryOp::BitXor, lhs, rhs, span);
        }
        Ok(lhs)
    }

    fn bit_and_expr(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.equality_expr()?;
        while self.check(&TokenKind::Amp) {
            let span = self.advance().span;
            let rhs = self.equality_expr()?;
            lhs = binary(BinaryOp::BitAnd, lhs, rhs, span);
        }
        Ok(lhs)
    }

    fn equality_expr(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.relational_expr()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::BangEq => BinaryOp::Ne,
                _ => return Ok(lhs),
            };
            let span = self.advance().span;
            let rhs = self.relational_expr()?;
            lhs = binary(op, lhs, rhs, span);
        }
    }

    fn relational_expr(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.shift_expr()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::Ge,
                _ => return Ok(lhs),
            };
            let span = self.advance().span;
            let rhs = self.shift_expr()?;
            lhs = binary(op, lhs, rhs, span);
        }
    }

    fn shift_expr(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.additive_expr()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Shl => BinaryOp::Shl,
                TokenKind::Shr => BinaryOp::Shr,
                _ => return Ok(lhs),
            };
            let span = self.advance().span;
            let rhs = self.additive_expr()?;
            lhs = binary(op, lhs, rhs, span);
        }
    }

    fn additive_expr(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.multiplicative_expr()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            let span = self.advance().span;
            let rhs = self.multiplicative_expr()?;
            lhs = binary(op, lhs, rhs, span);
        }
    }

    fn multiplicative_expr(&mut self) -> Result<Expr, CompileError> {
        let mut lhs = self.unary_expr()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            let span = self.advance().span;
            let rhs = self.unary_expr()?;
            lhs = binary(op, lhs, rhs, span);
        }
    }

    fn unary_expr(&mut self) -> Result<Expr, CompileError> {
        let span = self.peek().span;
        let op = match self.peek().kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::LogicalNot),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Amp => Some(UnaryOp::AddrOf),
            TokenKind::Star => Some(UnaryOp::Deref),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.unary_expr()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                span,
            });
        }

        // Prefix increment/decrement desugar to compound assignment.
        if matches!(self.peek().kind, TokenKind::PlusPlus | TokenKind::MinusMinus) {
            let binop = if self.peek().kind == TokenKind::PlusPlus {
                BinaryOp::Add
            } else {
                BinaryOp::Sub
            };
            let span = self.advance().span;
            let operand = self.unary_expr()?;
            let one = Expr::IntConst {
                value: 1,
                ty: PrimitiveType::Int,
                span,
            };
            return Ok(Expr::Assign {
                target: Box::new(operand.clone()),
                value: Box::new(binary(binop, operand, one, span)),
                span,
            });
        }

        // `(type) expr` is a cast; `(expr)` is grouping. One extra token of
        // lookahead disambiguates.
        if self.check(&TokenKind::LParen)
            && matches!(self.peek_ahead(1).kind, TokenKind::Keyword(k) if k.is_type_specifier())
        {
            let span = self.advance().span; // '('
            let ty = self.type_name()?;
            self.expect(&TokenKind::RParen, "')' after cast type")?;
            let operand = self.unary_expr()?;
            return Ok(Expr::Cast {
                ty,
                operand: Box::new(operand),
                span,
            });
        }

        self.postfix_expr()
    }

    fn postfix_expr(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.primary_expr()?;

        loop {
            match self.peek().kind {
                TokenKind::LParen => {
                    let span = self.advance().span;
                    let callee = match expr {
                        Expr::Identifier { ref name, .. } => name.clone(),
                        _ => {
                            return Err(CompileError::new(
                                ErrorKind::UnsupportedConstruct,
                                "Calls through non-identifier expressions are not supported",
                                span,
                            ));
                        }
                    };
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.assignment_expr()?);
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(&TokenKind::RParen, "')' after call arguments")?;
                    let is_host = BASELINE_HOST_FUNCTIONS.contains(&callee.as_str());
                    expr = Expr::Call {
                        callee,
                        args,
                        is_host,
                        span,
                    };
                }
                TokenKind::LBracket => {
                    let span = self.advance().span;
                    let index = self.expression()?;
                    self.expect(&TokenKind::RBracket, "']' after subscript")?;
                    expr = Expr::Index {
                        base: Box::new(expr),
                        index: Box::new(index),
                        span,
                    };
                }
                TokenKind::Dot | TokenKind::Arrow => {
                    let arrow = self.peek().kind == TokenKind::Arrow;
                    let span = self.advance().span;
                    let field = self.identifier("member name")?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        field,
                        arrow,
                        span,
                    };
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let found = self.peek();
                    return Err(CompileError::new(
                        ErrorKind::UnsupportedConstruct,
                        "Postfix increment/decrement is not in the accepted subset",
                        found.span,
                    ));
                }
                _ => return Ok(expr),
            }
        }
    }

    fn primary_expr(&mut self) -> Result<Expr, CompileError> {
        let token = self.peek();
        let span = token.span;
        match &token.kind {
            TokenKind::Identifier => {
                let name = self.advance().lexeme.clone();
                Ok(Expr::Identifier { name, span })
            }
            TokenKind::Number => {
                let lexeme = self.advance().lexeme.clone();
                parse_number(&lexeme, span)
            }
            TokenKind::StringLiteral(value) => {
                let value = value.clone();
                self.advance();
                Ok(Expr::StringLit { value, span })
            }
            TokenKind::CharLiteral(value) => {
                let byte = value.as_bytes().first().copied();
                self.advance();
                match byte {
                    Some(b) => Ok(Expr::IntConst {
                        value: b as i64,
                        ty: PrimitiveType::Char,
                        span,
                    }),
                    None => Err(CompileError::new(
                        ErrorKind::InvalidNumericLiteral,
                        "Empty character literal",
                        span,
                    )),
                }
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            _ => Err(CompileError::new(
                ErrorKind::ExpectedExpression,
                format!("Expected expression but found '{}'", describe(token)),
                span,
            )),
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, span: Span) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        span,
    }
}

/// Parse a numeric literal's raw text into a typed constant.
///
/// Base is decided by the `0x` prefix, integer vs float by the presence of
/// `.`/`e` (outside hex) or an `f` suffix; `l`/`L` suffixes widen integers
/// to `long`, `u`/`U` is accepted and recorded nowhere (the dialect's
/// arithmetic is signed).
fn parse_number(text: &str, span: Span) -> Result<Expr, CompileError> {
    let is_hex = text.starts_with("0x") || text.starts_with("0X");
    // 'f'/'F' are digits in hex literals, suffixes everywhere else.
    let is_suffix = |c: char| matches!(c, 'u' | 'U' | 'l' | 'L') || (!is_hex && matches!(c, 'f' | 'F'));
    let suffix_start = text
        .rfind(|c: char| !is_suffix(c))
        .map(|i| i + 1)
        .unwrap_or(0);
    let (body, suffix) = text.split_at(suffix_start);

    let invalid = || {
        CompileError::new(
            ErrorKind::InvalidNumericLiteral,
            format!("Invalid numeric literal: {}", text),
            span,
        )
    };

    if body.is_empty() {
        return Err(invalid());
    }

    let has_float_suffix = suffix.contains(['f', 'F']);
    let looks_float = !is_hex && (body.contains('.') || body.contains(['e', 'E']));

    if looks_float || (has_float_suffix && !is_hex) {
        let value: f64 = body.parse().map_err(|_| invalid())?;
        let ty = if has_float_suffix {
            PrimitiveType::Float
        } else {
            PrimitiveType::Double
        };
        return Ok(Expr::FloatConst { value, ty, span });
    }

    let value = if is_hex {
        u64::from_str_radix(&body[2..], 16).map_err(|_| invalid())?
    } else {
        body.parse::<u64>().map_err(|_| invalid())?
    };

    let ty = if suffix.contains(['l', 'L']) {
        PrimitiveType::Long
    } else {
        PrimitiveType::Int
    };

    Ok(Expr::IntConst {
        value: value as i64,
        ty,
        span,
    })
}

/// Short human-readable description of a token for error messages.
fn describe(token: &Token) -> String {
    match &token.kind {
        TokenKind::Eof => "end of input".to_string(),
        _ if token.lexeme.is_empty() => format!("{:?}", token.kind),
        _ => token.lexeme.clone(),
    }
}
