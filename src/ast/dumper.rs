use std::fmt::Write;

use crate::ast::{AstContext, Expr, Function, PrototypeKind};
use crate::span::Span;

/// Diagnostic pretty-printer: renders the parsed functions as an indented
/// tree, one node per line with its `line:column` position.
pub struct AstDumper;

impl AstDumper {
    pub fn run(&self, context: &AstContext) -> String {
        let mut out = String::new();
        for function in &context.functions {
            self.dump_function(&mut out, function);
        }
        out
    }

    fn dump_function(&self, out: &mut String, function: &Function) {
        let proto = &function.proto;
        let keyword = if function.is_declaration() {
            "extern"
        } else {
            "def"
        };
        let _ = write!(out, "{} {}({})", keyword, proto.name, proto.args.join(" "));
        match proto.kind {
            PrototypeKind::Regular => {}
            PrototypeKind::Unary => {
                let _ = write!(out, " unary");
            }
            PrototypeKind::Binary => {
                let _ = write!(out, " binary prec {}", proto.precedence);
            }
        }
        let _ = writeln!(out, " @ line {}", proto.line);

        for expr in &function.body {
            self.dump_expr(out, expr, 1);
        }
    }

    fn dump_expr(&self, out: &mut String, expr: &(Expr, Span), indent: usize) {
        let (kind, span) = expr;
        let pad = "  ".repeat(indent);
        let at = format!(":{}:{}", span.line, span.column);

        match kind {
            Expr::Number(value) => {
                let _ = writeln!(out, "{}Number {} {}", pad, value, at);
            }
            Expr::Variable(name) => {
                let _ = writeln!(out, "{}Variable {} {}", pad, name, at);
            }
            Expr::Unary { op, operand } => {
                let _ = writeln!(out, "{}Unary '{}' {}", pad, *op as char, at);
                self.dump_expr(out, operand, indent + 1);
            }
            Expr::Binary { op, lhs, rhs } => {
                let _ = writeln!(out, "{}Binary '{}' {}", pad, *op as char, at);
                self.dump_expr(out, lhs, indent + 1);
                self.dump_expr(out, rhs, indent + 1);
            }
            Expr::Call { callee, args } => {
                let _ = writeln!(out, "{}Call {} {}", pad, callee, at);
                for arg in args {
                    self.dump_expr(out, arg, indent + 1);
                }
            }
            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let _ = writeln!(out, "{}If {}", pad, at);
                self.dump_expr(out, cond, indent + 1);
                self.dump_expr(out, then_branch, indent + 1);
                self.dump_expr(out, else_branch, indent + 1);
            }
            Expr::For {
                var,
                start,
                end,
                step,
                body,
            } => {
                let _ = writeln!(out, "{}For {} {}", pad, var, at);
                self.dump_expr(out, start, indent + 1);
                self.dump_expr(out, end, indent + 1);
                if let Some(step) = step {
                    self.dump_expr(out, step, indent + 1);
                }
                self.dump_expr(out, body, indent + 1);
            }
            Expr::Var { bindings, body } => {
                let names: Vec<&str> = bindings.iter().map(|(name, _)| name.as_str()).collect();
                let _ = writeln!(out, "{}Var {} {}", pad, names.join(" "), at);
                for (_, init) in bindings {
                    if let Some(init) = init {
                        self.dump_expr(out, init, indent + 1);
                    }
                }
                self.dump_expr(out, body, indent + 1);
            }
            Expr::Compound(exprs) => {
                let _ = writeln!(out, "{}Compound {}", pad, at);
                for expr in exprs {
                    self.dump_expr(out, expr, indent + 1);
                }
            }
        }
    }
}
