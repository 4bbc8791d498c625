use std::collections::HashSet;

use super::{Function, Instruction, Module, Terminator};

/// Structural checks over emitted IR, run per function before a definition
/// is accepted.
pub struct IrValidator;

impl IrValidator {
    pub fn validate_module(module: &Module) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        for function in &module.functions {
            if let Err(mut function_errors) = Self::validate_function(module, function) {
                errors.append(&mut function_errors);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn validate_function(module: &Module, function: &Function) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        // Declarations have nothing to check.
        if !function.is_defined() {
            return Ok(());
        }

        let labels: HashSet<&str> = function
            .blocks
            .iter()
            .map(|block| block.label.as_str())
            .collect();

        for block in &function.blocks {
            match &block.terminator {
                None => errors.push(format!(
                    "{}: block '{}' has no terminator",
                    function.name, block.label
                )),
                Some(Terminator::Ret { value, .. }) => {
                    if value.is_none() {
                        errors.push(format!(
                            "{}: block '{}' returns void from a non-void function",
                            function.name, block.label
                        ));
                    }
                }
                Some(Terminator::Br { label, .. }) => {
                    if !labels.contains(label.as_str()) {
                        errors.push(format!(
                            "{}: branch to unknown block '{}'",
                            function.name, label
                        ));
                    }
                }
                Some(Terminator::CondBr {
                    then_label,
                    else_label,
                    ..
                }) => {
                    for label in [then_label, else_label] {
                        if !labels.contains(label.as_str()) {
                            errors.push(format!(
                                "{}: branch to unknown block '{}'",
                                function.name, label
                            ));
                        }
                    }
                }
            }

            for instruction in &block.instructions {
                match instruction {
                    Instruction::Phi { dest, incoming, .. } => {
                        if incoming.is_empty() {
                            errors.push(format!(
                                "{}: phi {} has no incoming values",
                                function.name, dest
                            ));
                        }
                        for (_, label) in incoming {
                            if !labels.contains(label.as_str()) {
                                errors.push(format!(
                                    "{}: phi {} names unknown block '{}'",
                                    function.name, dest, label
                                ));
                            }
                        }
                    }
                    Instruction::Call { callee, args, .. } => match module.get_function(callee) {
                        None => errors.push(format!(
                            "{}: call to undeclared function '{}'",
                            function.name, callee
                        )),
                        Some(target) if target.arity() != args.len() => errors.push(format!(
                            "{}: call to '{}' passes {} argument(s), expected {}",
                            function.name,
                            callee,
                            args.len(),
                            target.arity()
                        )),
                        Some(_) => {}
                    },
                    _ => {}
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
