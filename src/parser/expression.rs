use ariadne::{Color, Fmt};
use yansi::Paint;

use crate::ast::Expr;
use crate::lexer::{SpannedToken, Token};
use crate::parser::Parser;
use crate::span::Span;

pub fn if_syntax() -> String {
    format!(
        "the syntax for 'if' is '{} condition {} expression {} expression {}'",
        Fmt::fg("if", Color::Yellow).bold(),
        Fmt::fg("then", Color::Yellow).bold(),
        Fmt::fg("else", Color::Yellow).bold(),
        Fmt::fg("end", Color::Yellow).bold(),
    )
}

pub fn for_syntax() -> String {
    format!(
        "the syntax for 'for' is '{} variable = start, condition(, step)? {} expression {}'",
        Fmt::fg("for", Color::Yellow).bold(),
        Fmt::fg("in", Color::Yellow).bold(),
        Fmt::fg("end", Color::Yellow).bold(),
    )
}

pub fn var_syntax() -> String {
    format!(
        "the syntax for 'var' is '{} name (= expression)?(, name (= expression)?)* {} expression {}'",
        Fmt::fg("var", Color::Yellow).bold(),
        Fmt::fg("in", Color::Yellow).bold(),
        Fmt::fg("end", Color::Yellow).bold(),
    )
}

impl Parser<'_, '_> {
    /// expression := unary binoprhs
    pub(crate) fn parse_expression(&mut self) -> Option<(Expr, Span)> {
        let lhs = self.parse_unary()?;
        self.parse_binop_rhs(0, lhs)
    }

    /// unary := primary | OP unary
    ///
    /// Any operator byte except '(' and ',' can open a prefix expression;
    /// whether a matching `unary OP` exists is the code generator's
    /// problem, not the parser's.
    fn parse_unary(&mut self) -> Option<(Expr, Span)> {
        match self.cur_char() {
            Some(op) if op != b'(' && op != b',' => {
                let span = self.cur_span();
                self.bump(); // eat the operator
                let operand = self.parse_unary()?;
                let full = span.to(&operand.1);
                Some((
                    Expr::Unary {
                        op,
                        operand: Box::new(operand),
                    },
                    full,
                ))
            }
            _ => self.parse_primary(),
        }
    }

    /// binoprhs := (binop unary)*
    ///
    /// Pratt loop. `min_prec` is the weakest operator this call is allowed
    /// to consume; a tighter-binding operator after the rhs takes the rhs
    /// for itself via the recursive call, which yields left associativity
    /// among operators of equal precedence.
    fn parse_binop_rhs(&mut self, min_prec: i32, mut lhs: (Expr, Span)) -> Option<(Expr, Span)> {
        loop {
            let tok_prec = self.tok_precedence();
            if tok_prec < min_prec {
                return Some(lhs);
            }

            let op = match self.cur_char() {
                Some(op) => op,
                None => return Some(lhs),
            };
            let op_span = self.cur_span();
            self.bump(); // eat the operator

            let mut rhs = self.parse_unary()?;

            let next_prec = self.tok_precedence();
            if tok_prec < next_prec {
                rhs = self.parse_binop_rhs(tok_prec + 1, rhs)?;
            }

            let span = Span {
                line: op_span.line,
                column: op_span.column,
                start: lhs.1.start,
                end: rhs.1.end,
            };
            lhs = (
                Expr::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
    }

    /// primary := identifierexpr | numberexpr | parenexpr
    ///          | ifexpr | forexpr | varexpr
    fn parse_primary(&mut self) -> Option<(Expr, Span)> {
        match self.cur_token() {
            Some(Token::Identifier(_)) => self.parse_identifier_expr(),
            Some(Token::Number(_)) => self.parse_number_expr(),
            Some(Token::Char(b'(')) => self.parse_paren_expr(),
            Some(Token::If) => self.parse_if_expr(),
            Some(Token::For) => self.parse_for_expr(),
            Some(Token::Var) => self.parse_var_expr(),
            Some(_) => {
                let span = self.cur_span();
                self.error(
                    span,
                    "SyntaxError",
                    "unknown token when expecting an expression",
                    "expected an expression here.",
                );
                None
            }
            None => {
                let span = self.cur_span();
                self.error(
                    span,
                    "EOF",
                    "reached end of file while parsing an expression",
                    "expected a valid expression but reached end of file.",
                );
                None
            }
        }
    }

    /// numberexpr := NUM
    fn parse_number_expr(&mut self) -> Option<(Expr, Span)> {
        let Some(SpannedToken {
            token: Token::Number(value),
            span,
        }) = self.bump()
        else {
            unreachable!()
        };
        Some((Expr::Number(value), span))
    }

    /// parenexpr := '(' expression ')'
    fn parse_paren_expr(&mut self) -> Option<(Expr, Span)> {
        let open = self.bump(); // eat '('
        let expr = self.parse_expression()?;

        if self.cur_char() != Some(b')') {
            let span = self.cur_span();
            self.error(
                span,
                "SyntaxError",
                "unclosed parenthesis",
                "expected ')' after this expression.",
            );
            return None;
        }
        let close = self.bump(); // eat ')'

        let (kind, _) = expr;
        let span = match (open, close) {
            (Some(open), Some(close)) => open.span.to(&close.span),
            (Some(open), None) => open.span,
            _ => unreachable!(),
        };
        Some((kind, span))
    }

    /// identifierexpr := ident | ident '(' (expression (',' expression)*)? ')'
    fn parse_identifier_expr(&mut self) -> Option<(Expr, Span)> {
        let Some(SpannedToken {
            token: Token::Identifier(name),
            span,
        }) = self.bump()
        else {
            unreachable!()
        };

        if self.cur_char() != Some(b'(') {
            // Simple variable reference.
            return Some((Expr::Variable(name), span));
        }

        self.bump(); // eat '('
        let mut args = vec![];
        if self.cur_char() != Some(b')') {
            loop {
                let arg = self.parse_expression()?;
                args.push(arg);

                if self.cur_char() == Some(b')') {
                    break;
                }
                if self.cur_char() != Some(b',') {
                    let err_span = self.cur_span();
                    self.error(
                        err_span,
                        "SyntaxError",
                        "unexpected token in call arguments",
                        "expected ')' or ',' in argument list.",
                    );
                    return None;
                }
                self.bump(); // eat ','
            }
        }
        let close = self.bump(); // eat ')'

        let full = match close {
            Some(close) => span.to(&close.span),
            None => span,
        };
        Some((Expr::Call { callee: name, args }, full))
    }

    /// ifexpr := 'if' expression 'then' expression 'else' expression 'end'
    fn parse_if_expr(&mut self) -> Option<(Expr, Span)> {
        let Some(if_token) = self.bump() else {
            unreachable!()
        };
        let span = if_token.span;

        let cond = self.parse_expression()?;

        if !matches!(self.cur_token(), Some(Token::Then)) {
            let err_span = self.cur_span();
            self.error_with_note(
                err_span,
                "SyntaxError",
                "malformed if expression",
                "expected 'then' after the condition.",
                if_syntax(),
            );
            return None;
        }
        self.bump(); // eat 'then'

        let then_branch = self.parse_expression()?;

        if !matches!(self.cur_token(), Some(Token::Else)) {
            let err_span = self.cur_span();
            self.error_with_note(
                err_span,
                "SyntaxError",
                "malformed if expression",
                "expected 'else' after the then branch.",
                if_syntax(),
            );
            return None;
        }
        self.bump(); // eat 'else'

        let else_branch = self.parse_expression()?;

        if !matches!(self.cur_token(), Some(Token::End)) {
            let err_span = self.cur_span();
            self.error_with_note(
                err_span,
                "SyntaxError",
                "malformed if expression",
                "expected 'end' after the else branch.",
                if_syntax(),
            );
            return None;
        }
        let end_token = self.bump(); // eat 'end'

        let full = match end_token {
            Some(end_token) => span.to(&end_token.span),
            None => span,
        };
        Some((
            Expr::If {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            full,
        ))
    }

    /// forexpr := 'for' ident '=' expression ',' expression (',' expression)?
    ///            'in' expression 'end'
    fn parse_for_expr(&mut self) -> Option<(Expr, Span)> {
        let Some(for_token) = self.bump() else {
            unreachable!()
        };
        let span = for_token.span;

        let var = match self.cur_token() {
            Some(Token::Identifier(_)) => {
                let Some(SpannedToken {
                    token: Token::Identifier(var),
                    ..
                }) = self.bump()
                else {
                    unreachable!()
                };
                var
            }
            _ => {
                let err_span = self.cur_span();
                self.error_with_note(
                    err_span,
                    "SyntaxError",
                    "malformed for expression",
                    "expected an identifier after 'for'.",
                    for_syntax(),
                );
                return None;
            }
        };

        if self.cur_char() != Some(b'=') {
            let err_span = self.cur_span();
            self.error_with_note(
                err_span,
                "SyntaxError",
                "malformed for expression",
                "expected '=' after the loop variable.",
                for_syntax(),
            );
            return None;
        }
        self.bump(); // eat '='

        let start = self.parse_expression()?;

        if self.cur_char() != Some(b',') {
            let err_span = self.cur_span();
            self.error_with_note(
                err_span,
                "SyntaxError",
                "malformed for expression",
                "expected ',' after the start value.",
                for_syntax(),
            );
            return None;
        }
        self.bump(); // eat ','

        let end = self.parse_expression()?;

        // The step value is optional.
        let step = if self.cur_char() == Some(b',') {
            self.bump(); // eat ','
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        if !matches!(self.cur_token(), Some(Token::In)) {
            let err_span = self.cur_span();
            self.error_with_note(
                err_span,
                "SyntaxError",
                "malformed for expression",
                "expected 'in' after the loop header.",
                for_syntax(),
            );
            return None;
        }
        self.bump(); // eat 'in'

        let body = self.parse_expression()?;

        if !matches!(self.cur_token(), Some(Token::End)) {
            let err_span = self.cur_span();
            self.error_with_note(
                err_span,
                "SyntaxError",
                "malformed for expression",
                "expected 'end' after the loop body.",
                for_syntax(),
            );
            return None;
        }
        let end_token = self.bump(); // eat 'end'

        let full = match end_token {
            Some(end_token) => span.to(&end_token.span),
            None => span,
        };
        Some((
            Expr::For {
                var,
                start: Box::new(start),
                end: Box::new(end),
                step,
                body: Box::new(body),
            },
            full,
        ))
    }

    /// varexpr := 'var' ident ('=' expression)?
    ///            (',' ident ('=' expression)?)* 'in' expression 'end'
    fn parse_var_expr(&mut self) -> Option<(Expr, Span)> {
        let Some(var_token) = self.bump() else {
            unreachable!()
        };
        let span = var_token.span;

        let mut bindings = vec![];

        // At least one variable name is required.
        if !matches!(self.cur_token(), Some(Token::Identifier(_))) {
            let err_span = self.cur_span();
            self.error_with_note(
                err_span,
                "SyntaxError",
                "malformed var expression",
                "expected an identifier after 'var'.",
                var_syntax(),
            );
            return None;
        }

        loop {
            let Some(SpannedToken {
                token: Token::Identifier(name),
                ..
            }) = self.bump()
            else {
                unreachable!()
            };

            // The initializer is optional; missing means 0.0.
            let init = if self.cur_char() == Some(b'=') {
                self.bump(); // eat '='
                Some(self.parse_expression()?)
            } else {
                None
            };

            bindings.push((name, init));

            if self.cur_char() != Some(b',') {
                break;
            }
            self.bump(); // eat ','

            if !matches!(self.cur_token(), Some(Token::Identifier(_))) {
                let err_span = self.cur_span();
                self.error_with_note(
                    err_span,
                    "SyntaxError",
                    "malformed var expression",
                    "expected an identifier after ',' in a var list.",
                    var_syntax(),
                );
                return None;
            }
        }

        if !matches!(self.cur_token(), Some(Token::In)) {
            let err_span = self.cur_span();
            self.error_with_note(
                err_span,
                "SyntaxError",
                "malformed var expression",
                "expected 'in' after the var bindings.",
                var_syntax(),
            );
            return None;
        }
        self.bump(); // eat 'in'

        let body = self.parse_expression()?;

        if !matches!(self.cur_token(), Some(Token::End)) {
            let err_span = self.cur_span();
            self.error_with_note(
                err_span,
                "SyntaxError",
                "malformed var expression",
                "expected 'end' after the var body.",
                var_syntax(),
            );
            return None;
        }
        let end_token = self.bump(); // eat 'end'

        let full = match end_token {
            Some(end_token) => span.to(&end_token.span),
            None => span,
        };
        Some((
            Expr::Var {
                bindings,
                body: Box::new(body),
            },
            full,
        ))
    }
}
