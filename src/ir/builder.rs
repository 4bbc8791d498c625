use crate::span::Span;

use super::{
    BasicBlock, CompileUnit, Constant, FCmpCond, Function, FunctionDebug, Instruction, IrType,
    Module, ParamVar, Terminator, Value,
};

/// Instruction-level interface to a [`Module`] under construction.
///
/// Keeps cursors for the current function and insertion block, hands out
/// fresh registers and labels, and stamps every emitted instruction with
/// the current source location so the output carries a debug-location
/// stream.
pub struct IrBuilder {
    module: Module,
    current_function: Option<usize>,
    current_block: Option<usize>,
    register_counter: usize,
    label_counter: usize,
    cur_loc: Span,
}

impl IrBuilder {
    pub fn new(module_name: &str) -> Self {
        let mut builder = Self {
            module: Module {
                name: module_name.to_string(),
                ..Default::default()
            },
            current_function: None,
            current_block: None,
            register_counter: 0,
            label_counter: 0,
            cur_loc: Span::default(),
        };

        builder.declare_host_library();
        builder
    }

    /// Host functions linked into every program: `putchard` writes one
    /// byte to stderr, `printd` writes a value as "%f\n".
    fn declare_host_library(&mut self) {
        for name in ["putchard", "printd"] {
            self.declare_function(name, &["x".to_string()], IrType::F64);
        }
    }

    // Module lifecycle ----------------------------------------------------

    pub fn set_data_layout(&mut self, layout: &str) {
        self.module.data_layout = Some(layout.to_string());
    }

    pub fn add_module_flag(&mut self, name: &str, value: u32) {
        self.module.flags.push((name.to_string(), value));
    }

    pub fn create_compile_unit(&mut self, file: &str, producer: &str) {
        self.module.compile_unit = Some(CompileUnit {
            file: file.to_string(),
            producer: producer.to_string(),
        });
    }

    pub fn finalize_debug_info(&mut self) {
        self.module.debug_finalized = true;
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn into_module(self) -> Module {
        self.module
    }

    // Debug locations -----------------------------------------------------

    pub fn set_current_location(&mut self, loc: Span) {
        self.cur_loc = loc;
    }

    /// Prologue instructions carry no location, so a debugger breaking on
    /// the function steps past them.
    pub fn clear_location(&mut self) {
        self.cur_loc = Span::default();
    }

    // Functions and blocks ------------------------------------------------

    pub fn declare_function(&mut self, name: &str, params: &[String], return_type: IrType) {
        self.module.functions.push(Function {
            name: name.to_string(),
            params: params
                .iter()
                .map(|param| (param.clone(), IrType::F64))
                .collect(),
            return_type,
            blocks: Vec::new(),
            debug: None,
        });
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.module.get_function(name)
    }

    pub fn erase_function(&mut self, name: &str) {
        self.module.functions.retain(|f| f.name != name);
        self.current_function = None;
        self.current_block = None;
    }

    /// Makes `name` the function new blocks and instructions go into.
    pub fn position_at_function(&mut self, name: &str) -> bool {
        match self.module.functions.iter().position(|f| f.name == name) {
            Some(index) => {
                self.current_function = Some(index);
                self.current_block = None;
                true
            }
            None => false,
        }
    }

    pub fn create_function_debug_scope(&mut self, scope_line: usize) {
        if let Some(index) = self.current_function {
            self.module.functions[index].debug = Some(FunctionDebug {
                scope_line,
                params: Vec::new(),
            });
        }
    }

    pub fn declare_parameter(&mut self, name: &str, index: usize, line: usize) {
        if let Some(function) = self.current_function {
            if let Some(debug) = &mut self.module.functions[function].debug {
                debug.params.push(ParamVar {
                    name: name.to_string(),
                    index,
                    line,
                });
            }
        }
    }

    pub fn new_label(&mut self, prefix: &str) -> String {
        self.label_counter += 1;
        format!("{}{}", prefix, self.label_counter)
    }

    pub fn create_block(&mut self, label: String) -> usize {
        let Some(function) = self.current_function else {
            panic!("cannot create a block without a current function");
        };
        let blocks = &mut self.module.functions[function].blocks;
        blocks.push(BasicBlock {
            label,
            instructions: Vec::new(),
            terminator: None,
        });
        blocks.len() - 1
    }

    pub fn set_insert_point(&mut self, block: usize) {
        self.current_block = Some(block);
    }

    /// Label of the block instructions currently go into. Branch bodies can
    /// open new blocks, so phi plumbing re-queries this after emitting
    /// each branch.
    pub fn insert_block_label(&self) -> Option<String> {
        let function = self.current_function?;
        let block = self.current_block?;
        Some(self.module.functions[function].blocks[block].label.clone())
    }

    fn new_register(&mut self) -> String {
        self.register_counter += 1;
        format!("%{}", self.register_counter)
    }

    fn add_instruction(&mut self, instruction: Instruction) {
        if let (Some(function), Some(block)) = (self.current_function, self.current_block) {
            self.module.functions[function].blocks[block]
                .instructions
                .push(instruction);
        }
    }

    fn set_terminator(&mut self, terminator: Terminator) {
        if let (Some(function), Some(block)) = (self.current_function, self.current_block) {
            self.module.functions[function].blocks[block].terminator = Some(terminator);
        }
    }

    // Constants -----------------------------------------------------------

    pub fn fp_const(&self, value: f64) -> Value {
        Value::Constant(Constant::Float(value))
    }

    pub fn i32_const(&self, value: i32) -> Value {
        Value::Constant(Constant::Int32(value))
    }

    // Instructions --------------------------------------------------------

    /// Stack slot for a named mutable variable. Allocas always land at the
    /// top of the current function's entry block, wherever the insertion
    /// point happens to be.
    pub fn build_entry_alloca(&mut self, var: &str) -> Value {
        let dest = self.new_register();
        let instruction = Instruction::Alloca {
            dest: dest.clone(),
            ty: IrType::F64,
            var: var.to_string(),
            loc: self.cur_loc.clone(),
        };
        if let Some(function) = self.current_function {
            if let Some(entry) = self.module.functions[function].blocks.first_mut() {
                entry.instructions.insert(0, instruction);
            }
        }
        Value::Register(dest)
    }

    pub fn build_load(&mut self, ptr: Value) -> Value {
        let dest = self.new_register();
        self.add_instruction(Instruction::Load {
            dest: dest.clone(),
            ptr,
            ty: IrType::F64,
            loc: self.cur_loc.clone(),
        });
        Value::Register(dest)
    }

    pub fn build_store(&mut self, value: Value, ptr: Value) {
        self.add_instruction(Instruction::Store {
            value,
            ptr,
            ty: IrType::F64,
            loc: self.cur_loc.clone(),
        });
    }

    pub fn build_fadd(&mut self, lhs: Value, rhs: Value) -> Value {
        let dest = self.new_register();
        self.add_instruction(Instruction::FAdd {
            dest: dest.clone(),
            lhs,
            rhs,
            loc: self.cur_loc.clone(),
        });
        Value::Register(dest)
    }

    pub fn build_fsub(&mut self, lhs: Value, rhs: Value) -> Value {
        let dest = self.new_register();
        self.add_instruction(Instruction::FSub {
            dest: dest.clone(),
            lhs,
            rhs,
            loc: self.cur_loc.clone(),
        });
        Value::Register(dest)
    }

    pub fn build_fmul(&mut self, lhs: Value, rhs: Value) -> Value {
        let dest = self.new_register();
        self.add_instruction(Instruction::FMul {
            dest: dest.clone(),
            lhs,
            rhs,
            loc: self.cur_loc.clone(),
        });
        Value::Register(dest)
    }

    pub fn build_fcmp_ult(&mut self, lhs: Value, rhs: Value) -> Value {
        self.build_fcmp(FCmpCond::Ult, lhs, rhs)
    }

    pub fn build_fcmp_one(&mut self, lhs: Value, rhs: Value) -> Value {
        self.build_fcmp(FCmpCond::One, lhs, rhs)
    }

    fn build_fcmp(&mut self, cond: FCmpCond, lhs: Value, rhs: Value) -> Value {
        let dest = self.new_register();
        self.add_instruction(Instruction::FCmp {
            dest: dest.clone(),
            cond,
            lhs,
            rhs,
            loc: self.cur_loc.clone(),
        });
        Value::Register(dest)
    }

    pub fn build_uitofp(&mut self, value: Value, to: IrType) -> Value {
        let dest = self.new_register();
        self.add_instruction(Instruction::UiToFp {
            dest: dest.clone(),
            value,
            to,
            loc: self.cur_loc.clone(),
        });
        Value::Register(dest)
    }

    pub fn build_call(&mut self, callee: &str, args: Vec<Value>, return_type: IrType) -> Value {
        let dest = self.new_register();
        self.add_instruction(Instruction::Call {
            dest: Some(dest.clone()),
            callee: callee.to_string(),
            args,
            ty: return_type,
            loc: self.cur_loc.clone(),
        });
        Value::Register(dest)
    }

    pub fn build_phi(&mut self, ty: IrType, incoming: Vec<(Value, String)>) -> Value {
        let dest = self.new_register();
        self.add_instruction(Instruction::Phi {
            dest: dest.clone(),
            ty,
            incoming,
            loc: self.cur_loc.clone(),
        });
        Value::Register(dest)
    }

    pub fn build_br(&mut self, label: &str) {
        self.set_terminator(Terminator::Br {
            label: label.to_string(),
            loc: self.cur_loc.clone(),
        });
    }

    pub fn build_cond_br(&mut self, cond: Value, then_label: &str, else_label: &str) {
        self.set_terminator(Terminator::CondBr {
            cond,
            then_label: then_label.to_string(),
            else_label: else_label.to_string(),
            loc: self.cur_loc.clone(),
        });
    }

    pub fn build_ret(&mut self, value: Option<Value>) {
        self.set_terminator(Terminator::Ret {
            value,
            loc: self.cur_loc.clone(),
        });
    }
}
