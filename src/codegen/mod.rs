pub mod expression;
pub mod function;


use std::collections::HashMap;
use std::ops::Range;

use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use yansi::Paint;

use crate::ast::{AstContext, Prototype};
use crate::ir::{IrBuilder, Module, Value};
use crate::span::Span;

/// Lowers parsed functions to SSA-form IR through an [`IrBuilder`].
///
/// All values are 64-bit floats except the implicit `i32 0` return of
/// `main`. Named variables live in entry-block stack slots; reads go
/// through `load`, writes through `store`, and the backend's mem2reg is
/// expected to promote them.
pub struct CodeGen {
    builder: IrBuilder,
    named_values: HashMap<String, Value>,
    function_protos: HashMap<String, Prototype>,
    file: String,
    errors: Vec<Report<'static, (String, Range<usize>)>>,
}

impl CodeGen {
    pub fn new(module_name: &str, file: &str) -> Self {
        let mut builder = IrBuilder::new(module_name);
        builder.create_compile_unit(file, "Yorkie Compiler");
        builder.add_module_flag("Debug Info Version", 3);

        CodeGen {
            builder,
            named_values: HashMap::new(),
            function_protos: HashMap::new(),
            file: file.to_string(),
            errors: vec![],
        }
    }

    /// Walks every parsed function in source order. The precedence table
    /// is shared with the parser; binary definitions re-install their
    /// entry and failed definitions uninstall it.
    pub fn run(&mut self, ctx: &mut AstContext) {
        let AstContext {
            functions,
            precedence,
            ..
        } = ctx;
        for function in functions.iter() {
            self.codegen_function(function, precedence);
        }
        self.builder.finalize_debug_info();
    }

    pub fn finish(self) -> Module {
        self.builder.into_module()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Prints every accumulated report to stderr. Returns whether code
    /// generation failed.
    pub fn report_errors(&self, source: &str) -> bool {
        let cache = Source::from(source.to_string());
        for error in &self.errors {
            let _ = error.eprint((self.file.clone(), cache.clone()));
        }
        if self.errors.is_empty() {
            return false;
        }
        eprintln!(
            "{}: {} codegen error(s) in {}",
            "error".red().bold(),
            self.errors.len(),
            self.file
        );
        true
    }

    pub(crate) fn error(&mut self, span: Span, message: &str, label: &str) {
        self.errors.push(
            Report::build(ReportKind::Error, (self.file.clone(), span.range()))
                .with_code("CodeGen")
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

    /// Resolves a callee to its arity. The module is consulted first; a
    /// function that is not there yet but has a known prototype gets its
    /// declaration materialized on the spot.
    pub(crate) fn get_function(&mut self, name: &str) -> Option<usize> {
        if let Some(function) = self.builder.get_function(name) {
            return Some(function.arity());
        }
        if let Some(proto) = self.function_protos.get(name).cloned() {
            self.codegen_prototype(&proto);
            return Some(proto.args.len());
        }
        None
    }
}
