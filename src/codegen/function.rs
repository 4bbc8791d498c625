use crate::ast::{Expr, Function, PrecedenceTable, Prototype};
use crate::codegen::CodeGen;
use crate::ir::{IrType, IrValidator, Value};
use crate::span::Span;

impl CodeGen {
    /// Declares a function from its prototype: `f64^N -> f64`, except
    /// `main` which returns `i32`. External linkage, argument names taken
    /// from the prototype.
    pub(crate) fn codegen_prototype(&mut self, proto: &Prototype) {
        let return_type = if proto.name == "main" {
            IrType::I32
        } else {
            IrType::F64
        };
        self.builder
            .declare_function(&proto.name, &proto.args, return_type);
    }

    pub(crate) fn codegen_function(
        &mut self,
        function: &Function,
        precedence: &mut PrecedenceTable,
    ) -> bool {
        let proto = function.proto.clone();

        // Externs only declare. The prototype table keeps them callable
        // before anything referencing them lands in the module.
        if function.is_declaration() {
            if self.builder.get_function(&proto.name).is_none() {
                self.codegen_prototype(&proto);
            }
            self.function_protos.insert(proto.name.clone(), proto);
            return true;
        }

        // The prototype moves into the table first so recursive references
        // and later definitions resolve.
        self.function_protos
            .insert(proto.name.clone(), proto.clone());
        if self.builder.get_function(&proto.name).is_none() {
            self.codegen_prototype(&proto);
        }

        // A binary definition re-installs its precedence (the parser
        // already did, but the table must track emitted operators too).
        if proto.is_binary_op() {
            precedence.set(proto.operator_name(), proto.precedence as i32);
        }

        let body_span = function
            .body
            .first()
            .map(|(_, span)| span.clone())
            .unwrap_or_default();

        // A redefinition leaves the existing function, and any precedence
        // entry its own definition installed, untouched.
        if self
            .builder
            .get_function(&proto.name)
            .map_or(false, |f| f.is_defined())
        {
            self.error(
                body_span,
                "Function cannot be redefined.",
                "a function with this name already has a body.",
            );
            return false;
        }

        self.builder.position_at_function(&proto.name);
        let entry = self.builder.create_block("entry".to_string());
        self.builder.set_insert_point(entry);

        self.builder.create_function_debug_scope(proto.line);

        // Parameter setup is prologue; it carries no debug location.
        self.builder.clear_location();

        // Bind the parameters the declared function actually has (an
        // earlier extern may have fixed them already).
        let params: Vec<String> = self
            .builder
            .get_function(&proto.name)
            .map(|f| f.params.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default();

        self.named_values.clear();
        for (index, arg) in params.iter().enumerate() {
            let slot = self.builder.build_entry_alloca(arg);
            self.builder.declare_parameter(arg, index + 1, proto.line);
            self.builder
                .build_store(Value::Argument(arg.clone()), slot.clone());
            self.named_values.insert(arg.clone(), slot);
        }

        let result = self.codegen_body(&function.body);

        if let Some(mut ret_val) = result {
            // main always exits with status 0.
            if proto.name == "main" {
                ret_val = self.builder.i32_const(0);
            }
            self.builder.build_ret(Some(ret_val));

            let verify = {
                let module = self.builder.module();
                match module.get_function(&proto.name) {
                    Some(emitted) => IrValidator::validate_function(module, emitted).err(),
                    None => None,
                }
            };
            match verify {
                None => return true,
                Some(messages) => {
                    let last_span = function
                        .body
                        .last()
                        .map(|(_, span)| span.clone())
                        .unwrap_or_default();
                    for message in &messages {
                        self.error(last_span.clone(), "verifier rejected the function", message);
                    }
                }
            }
        }

        // Error reading the body: drop the half-built function and any
        // precedence entry this definition installed.
        self.builder.erase_function(&proto.name);
        if proto.is_binary_op() {
            precedence.remove(proto.operator_name());
        }
        false
    }

    /// Emits the body expressions in order; the value of the last one is
    /// the function's return value.
    pub(crate) fn codegen_body(&mut self, body: &[(Expr, Span)]) -> Option<Value> {
        let mut value = None;
        for expr in body {
            value = Some(self.codegen_expr(expr)?);
        }
        value
    }
}
