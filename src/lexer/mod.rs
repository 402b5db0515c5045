//! # C99 Lexer
//!
//! Tokenizes C99 source code into a stream of tokens.
//!
//! ## Features
//!
//! - **Numeric Literals**: decimal (`42`), hex (`0x2A`), fractional (`3.14`),
//!   exponents (`1e9`, `2.5e-3`) and integer/float suffixes (`uUlLfF`), all
//!   collected as a single `Number` token carrying the raw text
//! - **String/Char Literals**: escape sequences (`\n`, `\r`, `\t`, `\\`,
//!   `\"`, `\'`, `\0`); any other escape (`\x41`, `\101`, `\a`, ...)
//!   consumes the backslash plus one byte and passes that byte through.
//!   The stored lexeme excludes the surrounding quotes
//! - **Comments**: line (`//`) and block (`/* */`) comments are skipped
//! - **Keywords**: the full 37-entry C99 keyword table
//! - **Operators**: maximal munch over one/two/three-char operators
//!   (`==`, `!=`, `<=`, `>=`, `&&`, `||`, `<<`, `>>`, `->`, `+=`, `<<=`, ...)
//!
//! ## Error Handling
//!
//! An unrecognized byte produces an error carrying its line/column and
//! tokenization halts; the token vector still ends with an EOF token so the
//! parser never runs off the end.

pub mod cursor;
pub mod token;


use crate::error::{CompileError, ErrorKind};
use cursor::Cursor;
use token::{Keyword, Token, TokenKind};

pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<CompileError>,
}

/// Translate one escape character. Escapes outside the known set pass the
/// raw byte through: `\x` and octal escapes consume the backslash plus one
/// byte and the remaining characters lex as ordinary string content.
#[inline]
fn process_escape_char(esc: u8) -> u8 {
    match esc {
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        b'0' => b'\0',
        other => other,
    }
}

#[must_use]
pub fn tokenize(source: &str) -> LexResult {
    let mut cursor = Cursor::new(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    while !cursor.is_at_end() {
        match lex_token(&mut cursor) {
            Ok(Some(token)) => tokens.push(token),
            Ok(None) => {}
            Err(err) => {
                // Unlike trailing-garbage recovery schemes, lexing halts on
                // the first bad byte: everything after it is untrustworthy.
                errors.push(err);
                break;
            }
        }
    }

    let (b, l, c) = cursor.current_pos();
    tokens.push(Token {
        kind: TokenKind::Eof,
        lexeme: String::new(),
        span: crate::error::Span::new(b, b, l, c),
    });

    LexResult { tokens, errors }
}

fn lex_token(cursor: &mut Cursor) -> Result<Option<Token>, CompileError> {
    // Skip whitespace (inlined)
    while matches!(cursor.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
        cursor.advance();
    }

    if cursor.is_at_end() {
        return Ok(None);
    }

    let (sb, sl, sc) = cursor.current_pos();
    let ch = cursor.peek().unwrap();

    match ch {
        b'/' if cursor.peek_next() == Some(b'/') => {
            while let Some(c) = cursor.peek() {
                if c == b'\n' {
                    break;
                }
                cursor.advance();
            }
            Ok(None)
        }
        b'/' if cursor.peek_next() == Some(b'*') => lex_block_comment(cursor, sb, sl, sc),
        b'"' => lex_string(cursor, sb, sl, sc),
        b'\'' => lex_char(cursor, sb, sl, sc),
        b'0'..=b'9' => Ok(Some(lex_number(cursor, sb, sl, sc))),
        // A leading '.' is a fractional literal only when a digit follows;
        // otherwise it is the member-access operator.
        b'.' if matches!(cursor.peek_next(), Some(b'0'..=b'9')) => {
            Ok(Some(lex_number(cursor, sb, sl, sc)))
        }
        c if c.is_ascii_alphabetic() || c == b'_' => Ok(Some(lex_word(cursor, sb, sl, sc))),
        c if is_operator_start(c) => lex_operator(cursor, sb, sl, sc),
        _ => {
            cursor.advance();
            Err(CompileError::new(
                ErrorKind::UnexpectedByte,
                format!("Unexpected byte 0x{:02X} in source", ch),
                cursor.make_span(sb, sl, sc),
            ))
        }
    }
}

fn lex_block_comment(
    cursor: &mut Cursor,
    sb: usize,
    sl: usize,
    sc: usize,
) -> Result<Option<Token>, CompileError> {
    cursor.advance(); // '/'
    cursor.advance(); // '*'
    loop {
        match cursor.peek() {
            None => {
                return Err(CompileError::new(
                    ErrorKind::UnterminatedComment,
                    "Unterminated block comment",
                    cursor.make_span(sb, sl, sc),
                ));
            }
            Some(b'*') if cursor.peek_next() == Some(b'/') => {
                cursor.advance();
                cursor.advance();
                return Ok(None);
            }
            Some(_) => {
                cursor.advance();
            }
        }
    }
}

fn lex_string(
    cursor: &mut Cursor,
    sb: usize,
    sl: usize,
    sc: usize,
) -> Result<Option<Token>, CompileError> {
    cursor.advance(); // opening quote
    let mut processed = String::new();
    let mut raw = String::new();

    loop {
        let ch = match cursor.peek() {
            None | Some(b'\n') => {
                return Err(CompileError::new(
                    ErrorKind::UnterminatedString,
                    "Unterminated string literal",
                    cursor.make_span(sb, sl, sc),
                ));
            }
            Some(c) => c,
        };

        if ch == b'"' {
            cursor.advance();
            break;
        }

        if ch == b'\\' {
            cursor.advance();
            raw.push('\\');
            let esc = match cursor.peek() {
                None => {
                    return Err(CompileError::new(
                        ErrorKind::UnterminatedString,
                        "Unterminated string literal",
                        cursor.make_span(sb, sl, sc),
                    ));
                }
                Some(c) => c,
            };
            cursor.advance();
            raw.push(esc as char);
            processed.push(process_escape_char(esc) as char);
        } else {
            cursor.advance();
            processed.push(ch as char);
            raw.push(ch as char);
        }
    }

    Ok(Some(Token {
        kind: TokenKind::StringLiteral(processed),
        lexeme: raw,
        span: cursor.make_span(sb, sl, sc),
    }))
}

fn lex_char(
    cursor: &mut Cursor,
    sb: usize,
    sl: usize,
    sc: usize,
) -> Result<Option<Token>, CompileError> {
    cursor.advance(); // opening quote
    let mut processed = String::new();
    let mut raw = String::new();

    loop {
        let ch = match cursor.peek() {
            None | Some(b'\n') => {
                return Err(CompileError::new(
                    ErrorKind::UnterminatedChar,
                    "Unterminated character literal",
                    cursor.make_span(sb, sl, sc),
                ));
            }
            Some(c) => c,
        };

        if ch == b'\'' {
            cursor.advance();
            break;
        }

        if ch == b'\\' {
            cursor.advance();
            raw.push('\\');
            let esc = match cursor.peek() {
                None => {
                    return Err(CompileError::new(
                        ErrorKind::UnterminatedChar,
                        "Unterminated character literal",
                        cursor.make_span(sb, sl, sc),
                    ));
                }
                Some(c) => c,
            };
            cursor.advance();
            raw.push(esc as char);
            processed.push(process_escape_char(esc) as char);
        } else {
            cursor.advance();
            processed.push(ch as char);
            raw.push(ch as char);
        }
    }

    Ok(Some(Token {
        kind: TokenKind::CharLiteral(processed),
        lexeme: raw,
        span: cursor.make_span(sb, sl, sc),
    }))
}

/// Collect one numeric literal as raw text.
///
/// The lexer does not distinguish integer from float; it consumes the widest
/// plausible literal (hex digits after `0x`, fraction, exponent, suffixes)
/// and the parser decides the value and type.
fn lex_number(cursor: &mut Cursor, sb: usize, sl: usize, sc: usize) -> Token {
    let mut text = String::new();

    let is_hex = cursor.peek() == Some(b'0') && matches!(cursor.peek_next(), Some(b'x' | b'X'));
    if is_hex {
        text.push(cursor.advance().unwrap() as char);
        text.push(cursor.advance().unwrap() as char);
        while matches!(cursor.peek(), Some(c) if c.is_ascii_hexdigit()) {
            text.push(cursor.advance().unwrap() as char);
        }
    } else {
        while matches!(cursor.peek(), Some(c) if c.is_ascii_digit()) {
            text.push(cursor.advance().unwrap() as char);
        }
        if cursor.peek() == Some(b'.')
            && (!text.is_empty() || matches!(cursor.peek_next(), Some(c) if c.is_ascii_digit()))
        {
            text.push(cursor.advance().unwrap() as char);
            while matches!(cursor.peek(), Some(c) if c.is_ascii_digit()) {
                text.push(cursor.advance().unwrap() as char);
            }
        }
        if matches!(cursor.peek(), Some(b'e' | b'E')) {
            text.push(cursor.advance().unwrap() as char);
            if matches!(cursor.peek(), Some(b'+' | b'-')) {
                text.push(cursor.advance().unwrap() as char);
            }
            while matches!(cursor.peek(), Some(c) if c.is_ascii_digit()) {
                text.push(cursor.advance().unwrap() as char);
            }
        }
    }

    // Integer/float suffixes: L l U u F f, in any combination the parser
    // will validate.
    while matches!(cursor.peek(), Some(b'l' | b'L' | b'u' | b'U' | b'f' | b'F')) {
        text.push(cursor.advance().unwrap() as char);
    }

    Token {
        kind: TokenKind::Number,
        lexeme: text,
        span: cursor.make_span(sb, sl, sc),
    }
}

fn lex_word(cursor: &mut Cursor, sb: usize, sl: usize, sc: usize) -> Token {
    let mut word = String::new();
    while matches!(cursor.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
        word.push(cursor.advance().unwrap() as char);
    }

    let kind = match Keyword::lookup(&word) {
        Some(kw) => TokenKind::Keyword(kw),
        None => TokenKind::Identifier,
    };

    Token {
        kind,
        lexeme: word,
        span: cursor.make_span(sb, sl, sc),
    }
}

fn is_operator_start(c: u8) -> bool {
    matches!(
        c,
        b'+' | b'-'
            | b'*'
            | b'/'
            | b'%'
            | b'='
            | b'<'
            | b'>'
            | b'!'
            | b'&'
            | b'|'
            | b'^'
            | b'~'
            | b'('
            | b')'
            | b'{'
            | b'}'
            | b'['
            | b']'
            | b';'
            | b','
            | b':'
            | b'?'
            | b'.'
    )
}

/// Maximal-munch operator/punctuator recognition.
///
/// Three-char forms (`<<=`, `>>=`) are checked before two-char forms, which
/// are checked before single-char forms.
fn lex_operator(
    cursor: &mut Cursor,
    sb: usize,
    sl: usize,
    sc: usize,
) -> Result<Option<Token>, CompileError> {
    use TokenKind::*;

    let first = cursor.advance().unwrap();
    let kind = match first {
        b'(' => LParen,
        b')' => RParen,
        b'{' => LBrace,
        b'}' => RBrace,
        b'[' => LBracket,
        b']' => RBracket,
        b';' => Semicolon,
        b',' => Comma,
        b':' => Colon,
        b'?' => Question,
        b'.' => Dot,
        b'~' => Tilde,
        b'+' => {
            if cursor.eat(b'+') {
                PlusPlus
            } else if cursor.eat(b'=') {
                PlusEq
            } else {
                Plus
            }
        }
        b'-' => {
            if cursor.eat(b'-') {
                MinusMinus
            } else if cursor.eat(b'=') {
                MinusEq
            } else if cursor.eat(b'>') {
                Arrow
            } else {
                Minus
            }
        }
        b'*' => {
            if cursor.eat(b'=') {
                StarEq
            } else {
                Star
            }
        }
        b'/' => {
            if cursor.eat(b'=') {
                SlashEq
            } else {
                Slash
            }
        }
        b'%' => {
            if cursor.eat(b'=') {
                PercentEq
            } else {
                Percent
            }
        }
        b'=' => {
            if cursor.eat(b'=') {
                EqEq
            } else {
                Assign
            }
        }
        b'!' => {
            if cursor.eat(b'=') {
                BangEq
            } else {
                Bang
            }
        }
        b'<' => {
            if cursor.eat(b'<') {
                if cursor.eat(b'=') {
                    ShlEq
                } else {
                    Shl
                }
            } else if cursor.eat(b'=') {
                LtEq
            } else {
                Lt
            }
        }
        b'>' => {
            if cursor.eat(b'>') {
                if cursor.eat(b'=') {
                    ShrEq
                } else {
                    Shr
                }
            } else if cursor.eat(b'=') {
                GtEq
            } else {
                Gt
            }
        }
        b'&' => {
            if cursor.eat(b'&') {
                AmpAmp
            } else if cursor.eat(b'=') {
                AmpEq
            } else {
                Amp
            }
        }
        b'|' => {
            if cursor.eat(b'|') {
                PipePipe
            } else if cursor.eat(b'=') {
                PipeEq
            } else {
                Pipe
            }
        }
        b'^' => {
            if cursor.eat(b'=') {
                CaretEq
            } else {
                Caret
            }
        }
        _ => {
            return Err(CompileError::new(
                ErrorKind::UnexpectedByte,
                format!("Unexpected byte 0x{:02X} in source", first),
                cursor.make_span(sb, sl, sc),
            ));
        }
    };

    let span = cursor.make_span(sb, sl, sc);
    Ok(Some(Token {
        kind,
        lexeme: cursor.slice(span.start, span.end),
        span,
    }))
}
