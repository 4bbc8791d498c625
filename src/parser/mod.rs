pub mod expression;
pub mod function;

#[cfg(test)]
pub mod test;

use std::ops::Range;

use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use yansi::Paint;

use crate::ast::AstContext;
use crate::lexer::{Lexer, SpannedToken, Token};
use crate::span::Span;

/// Recursive-descent parser with one token of lookahead.
///
/// The parser owns the shared [`AstContext`] for the duration of the parse:
/// it appends the functions it recognizes and installs precedences for
/// freshly declared binary operators, so an operator is usable in the
/// expressions that follow its prototype in the same file.
///
/// Syntax errors become [`ariadne`] reports; the failing routine returns
/// `None` and the top-level loop skips a single token before continuing,
/// so one bad construct does not take down the translation unit.
pub struct Parser<'src, 'ctx> {
    lexer: Lexer<'src>,
    cur: Option<SpannedToken>,
    ctx: &'ctx mut AstContext,
    file: String,
    errors: Vec<Report<'static, (String, Range<usize>)>>,
}

impl<'src, 'ctx> Parser<'src, 'ctx> {
    pub fn new(source: &'src str, ctx: &'ctx mut AstContext) -> Self {
        let mut lexer = Lexer::new(source);
        let cur = lexer.next_token();
        let file = ctx.file_name.clone();
        Parser {
            lexer,
            cur,
            ctx,
            file,
            errors: vec![],
        }
    }

    /// toplevel := (definition | extern | expression | ';')*
    pub fn parse_top_level(&mut self) {
        loop {
            match self.cur_token() {
                None => return,
                Some(Token::Char(b';')) => {
                    // Ignore top-level semicolons.
                    self.bump();
                }
                Some(Token::Def) => self.handle_definition(),
                Some(Token::Extern) => self.handle_extern(),
                _ => self.handle_top_level_expression(),
            }
        }
    }

    fn handle_definition(&mut self) {
        match self.parse_definition() {
            Some(function) => self.ctx.add_function(function),
            None => {
                // Skip token for error recovery.
                self.bump();
            }
        }
    }

    fn handle_extern(&mut self) {
        match self.parse_extern() {
            Some(function) => self.ctx.add_function(function),
            None => {
                self.bump();
            }
        }
    }

    fn handle_top_level_expression(&mut self) {
        // A bare expression becomes the body of a nullary `main`.
        match self.parse_top_level_expr() {
            Some(function) => self.ctx.add_function(function),
            None => {
                self.bump();
            }
        }
    }

    // Token plumbing ------------------------------------------------------

    /// Advances the lookahead, returning the token that was current.
    pub(crate) fn bump(&mut self) -> Option<SpannedToken> {
        std::mem::replace(&mut self.cur, self.lexer.next_token())
    }

    pub(crate) fn cur_token(&self) -> Option<&Token> {
        self.cur.as_ref().map(|spanned| &spanned.token)
    }

    pub(crate) fn cur_span(&self) -> Span {
        match &self.cur {
            Some(spanned) => spanned.span.clone(),
            None => self.lexer.eof_span(),
        }
    }

    /// The current token's operator byte, when it is one.
    pub(crate) fn cur_char(&self) -> Option<u8> {
        match self.cur_token() {
            Some(&Token::Char(op)) => Some(op),
            _ => None,
        }
    }

    /// Precedence of the pending binary operator, or -1 when the current
    /// token is not a declared operator.
    pub(crate) fn tok_precedence(&self) -> i32 {
        match self.cur_char() {
            Some(op) => self.ctx.precedence.get(op),
            None => -1,
        }
    }

    // Error reporting ------------------------------------------------------

    pub(crate) fn error(&mut self, span: Span, code: &str, message: &str, label: &str) {
        self.errors.push(
            Report::build(ReportKind::Error, (self.file.clone(), span.range()))
                .with_code(code)
                .with_label(
                    Label::new((self.file.clone(), span.range()))
                        .with_message(format!(
                            "{} Location: {}:{}",
                            label, span.line, span.column
                        ))
                        .with_color(ColorGenerator::new().next()),
                )
                .with_message(message)
                .finish(),
        );
    }

    pub(crate) fn error_with_note(
        &mut self,
        span: Span,
        code: &str,
        message: &str,
        label: &str,
        note: String,
    ) {
        self.errors.push(
            Report::build(ReportKind::Error, (self.file.clone(), span.range()))
                .with_code(code)
                .with_label(
                    Label::new((self.file.clone(), span.range()))
                        .with_message(format!(
                            "{} Location: {}:{}",
                            label, span.line, span.column
                        ))
                        .with_color(ColorGenerator::new().next()),
                )
                .with_note(note)
                .with_message(message)
                .finish(),
        );
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Prints every accumulated report to stderr. Returns whether the parse
    /// failed.
    pub fn report_errors(&self, source: &str) -> bool {
        let cache = Source::from(source.to_string());
        for error in &self.errors {
            let _ = error.eprint((self.file.clone(), cache.clone()));
        }
        if self.errors.is_empty() {
            return false;
        }
        eprintln!(
            "{}: {} parse error(s) in {}",
            "error".red().bold(),
            self.errors.len(),
            self.file
        );
        true
    }
}
