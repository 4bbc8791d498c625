use ariadne::{Color, Fmt};
use yansi::Paint;

use crate::ast::{Function, Prototype, PrototypeKind};
use crate::lexer::{SpannedToken, Token};
use crate::parser::Parser;

pub fn prototype_syntax() -> String {
    format!(
        "\
a prototype is one of:
    {} function_name({} {} ...) ... {}
    {} {} OP(operand) ... {}
    {} {} OP precedence?({} {}) ... {}",
        Fmt::fg("def", Color::Yellow).bold(),
        Fmt::fg("arg1", Color::Rgb(150, 200, 100)).bold(),
        Fmt::fg("arg2", Color::Rgb(150, 200, 100)).bold(),
        Fmt::fg("end", Color::Yellow).bold(),
        Fmt::fg("def", Color::Yellow).bold(),
        Fmt::fg("unary", Color::Yellow).bold(),
        Fmt::fg("end", Color::Yellow).bold(),
        Fmt::fg("def", Color::Yellow).bold(),
        Fmt::fg("binary", Color::Yellow).bold(),
        Fmt::fg("lhs", Color::Rgb(150, 200, 100)).bold(),
        Fmt::fg("rhs", Color::Rgb(150, 200, 100)).bold(),
        Fmt::fg("end", Color::Yellow).bold(),
    )
}

impl Parser<'_, '_> {
    /// prototype := ident '(' ident* ')'
    ///            | 'unary' OP '(' ident ')'
    ///            | 'binary' OP NUM? '(' ident ident ')'
    ///
    /// A `binary` prototype installs its precedence into the shared table
    /// right away, so the operator parses in the rest of the file.
    pub(crate) fn parse_prototype(&mut self) -> Option<Prototype> {
        let proto_span = self.cur_span();
        let line = proto_span.line;

        let (name, kind, precedence) = match self.cur_token() {
            Some(Token::Identifier(_)) => {
                let Some(SpannedToken {
                    token: Token::Identifier(name),
                    ..
                }) = self.bump()
                else {
                    unreachable!()
                };
                (name, PrototypeKind::Regular, 30)
            }
            Some(Token::Unary) => {
                self.bump(); // eat 'unary'
                let Some(op) = self.cur_char() else {
                    let err_span = self.cur_span();
                    self.error_with_note(
                        err_span,
                        "SyntaxError",
                        "expected unary operator",
                        "expected an ascii operator after 'unary'.",
                        prototype_syntax(),
                    );
                    return None;
                };
                self.bump(); // eat the operator
                (format!("unary{}", op as char), PrototypeKind::Unary, 30)
            }
            Some(Token::Binary) => {
                self.bump(); // eat 'binary'
                let Some(op) = self.cur_char() else {
                    let err_span = self.cur_span();
                    self.error_with_note(
                        err_span,
                        "SyntaxError",
                        "expected ascii binary operator",
                        "expected an ascii operator after 'binary'.",
                        prototype_syntax(),
                    );
                    return None;
                };
                self.bump(); // eat the operator

                // Optional precedence, 30 when absent.
                let mut precedence = 30;
                if let Some(Token::Number(value)) = self.cur_token() {
                    let value = *value;
                    if !(1.0..=100.0).contains(&value) {
                        let err_span = self.cur_span();
                        self.error(
                            err_span,
                            "SyntaxError",
                            "invalid precedence: must be 1..100",
                            "operator precedence is out of range.",
                        );
                        return None;
                    }
                    precedence = value as u32;
                    self.bump(); // eat the precedence
                }
                (
                    format!("binary{}", op as char),
                    PrototypeKind::Binary,
                    precedence,
                )
            }
            _ => {
                let err_span = self.cur_span();
                self.error_with_note(
                    err_span,
                    "SyntaxError",
                    "expected function name in prototype",
                    "expected a function name here.",
                    prototype_syntax(),
                );
                return None;
            }
        };

        if self.cur_char() != Some(b'(') {
            let err_span = self.cur_span();
            self.error_with_note(
                err_span,
                "SyntaxError",
                "expected '(' in prototype",
                "expected '(' after the function name.",
                prototype_syntax(),
            );
            return None;
        }
        self.bump(); // eat '('

        // Argument names are whitespace separated, no commas.
        let mut args = vec![];
        while matches!(self.cur_token(), Some(Token::Identifier(_))) {
            let Some(SpannedToken {
                token: Token::Identifier(arg),
                ..
            }) = self.bump()
            else {
                unreachable!()
            };
            args.push(arg);
        }

        if self.cur_char() != Some(b')') {
            let err_span = self.cur_span();
            self.error_with_note(
                err_span,
                "SyntaxError",
                "expected ')' in prototype",
                "expected ')' after the argument list.",
                prototype_syntax(),
            );
            return None;
        }
        self.bump(); // eat ')'

        // Operators take exactly the operand count their kind implies.
        let expected = match kind {
            PrototypeKind::Regular => None,
            PrototypeKind::Unary => Some(1),
            PrototypeKind::Binary => Some(2),
        };
        if let Some(expected) = expected {
            if args.len() != expected {
                self.error(
                    proto_span,
                    "SyntaxError",
                    "invalid number of operands for operator",
                    "an operator prototype has the wrong operand count.",
                );
                return None;
            }
        }

        let proto = Prototype {
            name,
            args,
            kind,
            precedence,
            line,
        };

        if proto.is_binary_op() {
            self.ctx
                .precedence
                .set(proto.operator_name(), proto.precedence as i32);
        }

        Some(proto)
    }

    /// definition := 'def' prototype expression (';' expression)* 'end'
    ///
    /// The body is an ordered sequence; its value is the last expression.
    pub(crate) fn parse_definition(&mut self) -> Option<Function> {
        self.bump(); // eat 'def'
        let proto = self.parse_prototype()?;

        let mut body = vec![];
        while !matches!(self.cur_token(), Some(Token::End)) {
            if self.cur_token().is_none() {
                let err_span = self.cur_span();
                self.error(
                    err_span,
                    "EOF",
                    "reached end of file inside a function definition",
                    "expected ';' or 'end' to finish the function body.",
                );
                return None;
            }

            let expr = self.parse_expression()?;
            body.push(expr);

            match self.cur_token() {
                Some(Token::Char(b';')) => {
                    self.bump(); // eat ';'
                }
                Some(Token::End) => {}
                _ => {
                    let err_span = self.cur_span();
                    self.error(
                        err_span,
                        "SyntaxError",
                        "expected ';' or 'end' after function definition",
                        "function body expressions are separated by ';'.",
                    );
                    return None;
                }
            }
        }

        if body.is_empty() {
            let err_span = self.cur_span();
            self.error(
                err_span,
                "SyntaxError",
                "empty function body",
                "expected at least one expression before 'end'.",
            );
            return None;
        }
        self.bump(); // eat 'end'

        Some(Function { proto, body })
    }

    /// external := 'extern' prototype
    ///
    /// Externs are prototypes with no body; codegen declares them and keeps
    /// them callable through the prototype table.
    pub(crate) fn parse_extern(&mut self) -> Option<Function> {
        self.bump(); // eat 'extern'
        let proto = self.parse_prototype()?;
        Some(Function {
            proto,
            body: vec![],
        })
    }

    /// toplevelexpr := expression
    pub(crate) fn parse_top_level_expr(&mut self) -> Option<Function> {
        let line = self.cur_span().line;
        let expr = self.parse_expression()?;

        // Wrap the expression in an anonymous nullary function. It is named
        // `main` so the emitted module is linkable as a program.
        let proto = Prototype {
            name: "main".to_string(),
            args: vec![],
            kind: PrototypeKind::Regular,
            precedence: 30,
            line,
        };
        Some(Function {
            proto,
            body: vec![expr],
        })
    }
}
