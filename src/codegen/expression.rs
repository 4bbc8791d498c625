use crate::ast::Expr;
use crate::codegen::CodeGen;
use crate::ir::{IrType, Value};
use crate::span::Span;

impl CodeGen {
    pub(crate) fn codegen_expr(&mut self, expr: &(Expr, Span)) -> Option<Value> {
        let (kind, span) = expr;
        self.builder.set_current_location(span.clone());

        match kind {
            Expr::Number(value) => Some(self.builder.fp_const(*value)),

            Expr::Variable(name) => {
                let Some(slot) = self.named_values.get(name).cloned() else {
                    self.error(
                        span.clone(),
                        "Unknown variable name",
                        &format!("no variable named '{}' is in scope.", name),
                    );
                    return None;
                };
                Some(self.builder.build_load(slot))
            }

            Expr::Unary { op, operand } => {
                let operand_val = self.codegen_expr(operand)?;

                // Unary operators are ordinary functions with mangled names.
                let callee = format!("unary{}", *op as char);
                if self.get_function(&callee).is_none() {
                    self.error(
                        span.clone(),
                        "Unknown unary operator",
                        &format!("no 'unary{}' has been defined.", *op as char),
                    );
                    return None;
                }
                self.builder.set_current_location(span.clone());
                Some(self.builder.build_call(&callee, vec![operand_val], IrType::F64))
            }

            Expr::Binary { op, lhs, rhs } => self.codegen_binary(*op, lhs, rhs, span),

            Expr::Call { callee, args } => {
                let Some(arity) = self.get_function(callee) else {
                    self.error(
                        span.clone(),
                        "Unknown function referenced",
                        &format!("no function named '{}' is declared.", callee),
                    );
                    return None;
                };
                if arity != args.len() {
                    self.error(
                        span.clone(),
                        "Incorrect # arguments passed",
                        &format!(
                            "'{}' takes {} argument(s) but {} were supplied.",
                            callee,
                            arity,
                            args.len()
                        ),
                    );
                    return None;
                }

                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.codegen_expr(arg)?);
                }
                self.builder.set_current_location(span.clone());
                Some(self.builder.build_call(callee, arg_values, IrType::F64))
            }

            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => self.codegen_if(cond, then_branch, else_branch, span),

            Expr::For {
                var,
                start,
                end,
                step,
                body,
            } => self.codegen_for(var, start, end, step.as_deref(), body, span),

            Expr::Var { bindings, body } => self.codegen_var(bindings, body, span),

            Expr::Compound(exprs) => {
                let mut value = None;
                for expr in exprs {
                    value = Some(self.codegen_expr(expr)?);
                }
                value
            }
        }
    }

    fn codegen_binary(
        &mut self,
        op: u8,
        lhs: &(Expr, Span),
        rhs: &(Expr, Span),
        span: &Span,
    ) -> Option<Value> {
        // '=' doesn't evaluate its LHS as an expression; the destination
        // has to be a name with a stack slot.
        if op == b'=' {
            let Expr::Variable(name) = &lhs.0 else {
                self.error(
                    span.clone(),
                    "destination of '=' must be a variable",
                    "only a variable name can be assigned to.",
                );
                return None;
            };

            let value = self.codegen_expr(rhs)?;

            let Some(slot) = self.named_values.get(name).cloned() else {
                self.error(
                    lhs.1.clone(),
                    "Unknown variable name",
                    &format!("no variable named '{}' is in scope.", name),
                );
                return None;
            };
            self.builder.set_current_location(span.clone());
            self.builder.build_store(value.clone(), slot);
            return Some(value);
        }

        let lhs_val = self.codegen_expr(lhs)?;
        let rhs_val = self.codegen_expr(rhs)?;
        self.builder.set_current_location(span.clone());

        match op {
            b'+' => Some(self.builder.build_fadd(lhs_val, rhs_val)),
            b'-' => Some(self.builder.build_fsub(lhs_val, rhs_val)),
            b'*' => Some(self.builder.build_fmul(lhs_val, rhs_val)),
            b'<' => {
                // fcmp yields an i1; user code wants 0.0 or 1.0.
                let cmp = self.builder.build_fcmp_ult(lhs_val, rhs_val);
                Some(self.builder.build_uitofp(cmp, IrType::F64))
            }
            _ => {
                // Not a builtin, so it must be a user-defined operator.
                let callee = format!("binary{}", op as char);
                if self.get_function(&callee).is_none() {
                    self.error(
                        span.clone(),
                        "Unknown binary operator",
                        &format!("no 'binary{}' has been defined.", op as char),
                    );
                    return None;
                }
                self.builder.set_current_location(span.clone());
                Some(
                    self.builder
                        .build_call(&callee, vec![lhs_val, rhs_val], IrType::F64),
                )
            }
        }
    }

    fn codegen_if(
        &mut self,
        cond: &(Expr, Span),
        then_branch: &(Expr, Span),
        else_branch: &(Expr, Span),
        span: &Span,
    ) -> Option<Value> {
        let cond_val = self.codegen_expr(cond)?;
        self.builder.set_current_location(span.clone());

        // Truthiness is "not equal to 0.0".
        let zero = self.builder.fp_const(0.0);
        let cond_bool = self.builder.build_fcmp_one(cond_val, zero);

        let then_label = self.builder.new_label("then");
        let else_label = self.builder.new_label("else");
        let merge_label = self.builder.new_label("ifcont");

        self.builder
            .build_cond_br(cond_bool, &then_label, &else_label);

        let then_block = self.builder.create_block(then_label);
        self.builder.set_insert_point(then_block);
        let then_val = self.codegen_expr(then_branch)?;
        self.builder.build_br(&merge_label);
        // The branch body may have opened new blocks; the phi wants the
        // block that actually flows into the merge.
        let then_incoming = self.builder.insert_block_label()?;

        let else_block = self.builder.create_block(else_label);
        self.builder.set_insert_point(else_block);
        let else_val = self.codegen_expr(else_branch)?;
        self.builder.build_br(&merge_label);
        let else_incoming = self.builder.insert_block_label()?;

        let merge_block = self.builder.create_block(merge_label);
        self.builder.set_insert_point(merge_block);
        Some(self.builder.build_phi(
            IrType::F64,
            vec![(then_val, then_incoming), (else_val, else_incoming)],
        ))
    }

    fn codegen_for(
        &mut self,
        var: &str,
        start: &(Expr, Span),
        end: &(Expr, Span),
        step: Option<&(Expr, Span)>,
        body: &(Expr, Span),
        span: &Span,
    ) -> Option<Value> {
        // The induction variable lives in an entry-block slot like any
        // other mutable variable, so the body may assign to it.
        let slot = self.builder.build_entry_alloca(var);
        self.builder.set_current_location(span.clone());

        let start_val = self.codegen_expr(start)?;
        self.builder.build_store(start_val, slot.clone());

        let loop_label = self.builder.new_label("loop");
        let after_label = self.builder.new_label("afterloop");

        self.builder.build_br(&loop_label);
        let loop_block = self.builder.create_block(loop_label.clone());
        self.builder.set_insert_point(loop_block);

        // Shadow any existing binding for the loop variable.
        let shadowed = self.named_values.insert(var.to_string(), slot.clone());

        // The body's value is ignored, but an error in it still fails the
        // whole expression.
        self.codegen_expr(body)?;

        let step_val = match step {
            Some(step) => self.codegen_expr(step)?,
            None => self.builder.fp_const(1.0),
        };

        let end_val = self.codegen_expr(end)?;

        // Reload, increment, store: the body may have mutated the slot.
        self.builder.set_current_location(span.clone());
        let cur = self.builder.build_load(slot.clone());
        let next = self.builder.build_fadd(cur, step_val);
        self.builder.build_store(next, slot);

        let zero = self.builder.fp_const(0.0);
        let end_cond = self.builder.build_fcmp_one(end_val, zero);
        self.builder
            .build_cond_br(end_cond, &loop_label, &after_label);

        let after_block = self.builder.create_block(after_label);
        self.builder.set_insert_point(after_block);

        // Restore the unshadowed variable.
        match shadowed {
            Some(old) => {
                self.named_values.insert(var.to_string(), old);
            }
            None => {
                self.named_values.remove(var);
            }
        }

        // for/in always evaluates to 0.0.
        Some(self.builder.fp_const(0.0))
    }

    fn codegen_var(
        &mut self,
        bindings: &[(String, Option<(Expr, Span)>)],
        body: &(Expr, Span),
        span: &Span,
    ) -> Option<Value> {
        // Every initializer is evaluated before any binding is installed,
        // so initializers resolve names in the enclosing scope:
        //   var a = 2 in var a = a + 1 in a end end   evaluates to 3.0
        let mut slots = Vec::with_capacity(bindings.len());
        for (name, init) in bindings {
            let init_val = match init {
                Some(init) => self.codegen_expr(init)?,
                None => self.builder.fp_const(0.0),
            };
            let slot = self.builder.build_entry_alloca(name);
            self.builder.build_store(init_val, slot.clone());
            slots.push((name.clone(), slot));
        }

        let mut old_bindings = Vec::with_capacity(slots.len());
        for (name, slot) in slots {
            old_bindings.push((name.clone(), self.named_values.insert(name, slot)));
        }

        self.builder.set_current_location(span.clone());
        let body_val = self.codegen_expr(body)?;

        // Restore in reverse so duplicate names in one list unwind right.
        for (name, previous) in old_bindings.into_iter().rev() {
            match previous {
                Some(old) => {
                    self.named_values.insert(name, old);
                }
                None => {
                    self.named_values.remove(&name);
                }
            }
        }

        Some(body_val)
    }
}
