
use thiserror::Error;

use crate::ast::AstContext;

#[derive(Debug, Error)]
#[error("{pass} pass failed: {message}")]
pub struct PassError {
    pub pass: String,
    pub message: String,
}

type PassFn<'a> = Box<dyn FnMut(&mut AstContext) -> Result<(), String> + 'a>;

/// A named unit of work over the shared [`AstContext`].
pub struct Pass<'a> {
    name: String,
    run: PassFn<'a>,
}

impl<'a> Pass<'a> {
    pub fn new(
        name: impl Into<String>,
        run: impl FnMut(&mut AstContext) -> Result<(), String> + 'a,
    ) -> Self {
        Pass {
            name: name.into(),
            run: Box::new(run),
        }
    }
}

/// Ordered pass pipeline. Passes execute in registration order; the first
/// failure stops the pipeline and later passes never run.
#[derive(Default)]
pub struct Driver<'a> {
    passes: Vec<Pass<'a>>,
}

impl<'a> Driver<'a> {
    pub fn new() -> Self {
        Driver { passes: Vec::new() }
    }

    pub fn add(&mut self, pass: Pass<'a>) {
        self.passes.push(pass);
    }

    pub fn run(&mut self, ctx: &mut AstContext) -> Result<(), PassError> {
        for pass in &mut self.passes {
            if let Err(message) = (pass.run)(ctx) {
                return Err(PassError {
                    pass: pass.name.clone(),
                    message,
                });
            }
        }
        Ok(())
    }
}
