use logos::{Logos, SpannedIter};

use crate::span::Span;


#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\n\v\f\r]+")] // Whitespace separates tokens
#[logos(skip r"#[^\n\r]*")] // '#' comments run to the end of the line
#[derive(Clone)]
pub enum Token {
    #[token("def")]
    Def,

    #[token("extern")]
    Extern,

    #[token("if")]
    If,

    #[token("then")]
    Then,

    #[token("else")]
    Else,

    #[token("for")]
    For,

    #[token("in")]
    In,

    #[token("binary")]
    Binary,

    #[token("unary")]
    Unary,

    #[token("var")]
    Var,

    #[token("end")]
    End,

    #[regex(r"[A-Za-z][A-Za-z0-9]*", |lex| lex.slice().to_string(), priority = 3)]
    Identifier(String),

    #[regex(r"[0-9.]+", |lex| parse_number(lex.slice()), priority = 3)]
    Number(f64),

    // Everything else that is printable ASCII surfaces as an operator byte.
    #[regex(r"[!-~]", |lex| lex.slice().as_bytes()[0], priority = 1)]
    Char(u8),
}

/// Number literals are scanned as `[0-9.]+` and parsed the way `strtod`
/// would: the longest leading prefix with at most one '.' counts, the rest
/// is ignored. `1.1.1` parses as `1.1`, a bare `.` as `0.0`.
fn parse_number(slice: &str) -> f64 {
    let mut end = slice.len();
    let mut seen_dot = false;
    for (i, byte) in slice.bytes().enumerate() {
        if byte == b'.' {
            if seen_dot {
                end = i;
                break;
            }
            seen_dot = true;
        }
    }
    slice[..end].parse().unwrap_or(0.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Streaming tokenizer over an in-memory source buffer.
///
/// Wraps the generated [`Token`] lexer and turns its byte offsets into
/// `(line, column)` positions: the column bumps on every byte and a newline
/// or carriage return starts the next line at column 0. A token's span is
/// the position of its first byte.
///
/// The lexer cannot fail. Bytes the token definition rejects (control
/// characters, non-ASCII) come back as [`Token::Char`] of the first
/// offending byte. End of input is the `None` end of the stream and is
/// never consumed.
pub struct Lexer<'a> {
    tokens: SpannedIter<'a, Token>,
    src: &'a [u8],
    cursor: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            tokens: Token::lexer(source).spanned(),
            src: source.as_bytes(),
            cursor: 0,
            line: 1,
            column: 0,
        }
    }

    fn advance_to(&mut self, target: usize) {
        while self.cursor < target {
            match self.src[self.cursor] {
                b'\n' | b'\r' => {
                    self.line += 1;
                    self.column = 0;
                }
                _ => self.column += 1,
            }
            self.cursor += 1;
        }
    }

    pub fn next_token(&mut self) -> Option<SpannedToken> {
        let (result, range) = self.tokens.next()?;
        // Account for everything up to and including the token's first
        // byte, so line/column point at where the token starts.
        self.advance_to((range.start + 1).min(self.src.len()));
        let span = Span {
            line: self.line,
            column: self.column,
            start: range.start,
            end: range.end,
        };
        let token = match result {
            Ok(token) => token,
            Err(()) => Token::Char(self.src.get(range.start).copied().unwrap_or(0)),
        };
        Some(SpannedToken { token, span })
    }

    /// Span at the end of the input, for diagnostics about premature EOF.
    pub fn eof_span(&self) -> Span {
        Span {
            line: self.line,
            column: self.column,
            start: self.src.len(),
            end: self.src.len(),
        }
    }
}
