use std::fmt::{self, Display, Formatter};

use crate::span::Span;

pub mod builder;
pub mod validator;

#[cfg(test)]
pub mod test;

pub use builder::IrBuilder;
pub use validator::IrValidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrType {
    F64,
    I32,
    I1,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Constant(Constant),
    Register(String),
    Argument(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Float(f64),
    Int32(i32),
}

#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub label: String,
    pub instructions: Vec<Instruction>,
    pub terminator: Option<Terminator>,
}

/// Non-terminator instructions. Every instruction remembers the source
/// location it was emitted for; that is the debug-location stream a DWARF
/// consumer would read.
#[derive(Debug, Clone)]
pub enum Instruction {
    Alloca {
        dest: String,
        ty: IrType,
        var: String,
        loc: Span,
    },
    Load {
        dest: String,
        ptr: Value,
        ty: IrType,
        loc: Span,
    },
    Store {
        value: Value,
        ptr: Value,
        ty: IrType,
        loc: Span,
    },
    FAdd {
        dest: String,
        lhs: Value,
        rhs: Value,
        loc: Span,
    },
    FSub {
        dest: String,
        lhs: Value,
        rhs: Value,
        loc: Span,
    },
    FMul {
        dest: String,
        lhs: Value,
        rhs: Value,
        loc: Span,
    },
    FCmp {
        dest: String,
        cond: FCmpCond,
        lhs: Value,
        rhs: Value,
        loc: Span,
    },
    UiToFp {
        dest: String,
        value: Value,
        to: IrType,
        loc: Span,
    },
    Call {
        dest: Option<String>,
        callee: String,
        args: Vec<Value>,
        ty: IrType,
        loc: Span,
    },
    Phi {
        dest: String,
        ty: IrType,
        incoming: Vec<(Value, String)>,
        loc: Span,
    },
}

#[derive(Debug, Clone)]
pub enum Terminator {
    Ret {
        value: Option<Value>,
        loc: Span,
    },
    Br {
        label: String,
        loc: Span,
    },
    CondBr {
        cond: Value,
        then_label: String,
        else_label: String,
        loc: Span,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FCmpCond {
    Ult,
    One,
}

/// Debug records for a defined function: the subprogram's scope line plus
/// one record per declared parameter variable.
#[derive(Debug, Clone, Default)]
pub struct FunctionDebug {
    pub scope_line: usize,
    pub params: Vec<ParamVar>,
}

#[derive(Debug, Clone)]
pub struct ParamVar {
    pub name: String,
    pub index: usize,
    pub line: usize,
}

/// A function in the module. External linkage throughout; a function with
/// no blocks is a declaration and prints as `declare`.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<(String, IrType)>,
    pub return_type: IrType,
    pub blocks: Vec<BasicBlock>,
    pub debug: Option<FunctionDebug>,
}

impl Function {
    pub fn is_defined(&self) -> bool {
        !self.blocks.is_empty()
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, Clone)]
pub struct CompileUnit {
    pub file: String,
    pub producer: String,
}

#[derive(Debug, Default)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
    pub data_layout: Option<String>,
    pub flags: Vec<(String, u32)>,
    pub compile_unit: Option<CompileUnit>,
    pub debug_finalized: bool,
}

impl Module {
    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }
}

// Display implementations

impl Display for IrType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            IrType::F64 => write!(f, "double"),
            IrType::I32 => write!(f, "i32"),
            IrType::I1 => write!(f, "i1"),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Constant(c) => write!(f, "{}", c),
            Value::Register(name) => write!(f, "{}", name),
            Value::Argument(name) => write!(f, "%{}", name),
        }
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Float(value) => write!(f, "{:.6}", value),
            Constant::Int32(value) => write!(f, "{}", value),
        }
    }
}

impl Display for FCmpCond {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FCmpCond::Ult => write!(f, "ult"),
            FCmpCond::One => write!(f, "one"),
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Alloca { dest, ty, var, .. } => {
                write!(f, "  {} = alloca {} ; var {}", dest, ty, var)
            }
            Instruction::Load { dest, ptr, ty, .. } => {
                write!(f, "  {} = load {}, ptr {}", dest, ty, ptr)
            }
            Instruction::Store { value, ptr, ty, .. } => {
                write!(f, "  store {} {}, ptr {}", ty, value, ptr)
            }
            Instruction::FAdd { dest, lhs, rhs, .. } => {
                write!(f, "  {} = fadd double {}, {}", dest, lhs, rhs)
            }
            Instruction::FSub { dest, lhs, rhs, .. } => {
                write!(f, "  {} = fsub double {}, {}", dest, lhs, rhs)
            }
            Instruction::FMul { dest, lhs, rhs, .. } => {
                write!(f, "  {} = fmul double {}, {}", dest, lhs, rhs)
            }
            Instruction::FCmp {
                dest,
                cond,
                lhs,
                rhs,
                ..
            } => {
                write!(f, "  {} = fcmp {} double {}, {}", dest, cond, lhs, rhs)
            }
            Instruction::UiToFp {
                dest, value, to, ..
            } => {
                write!(f, "  {} = uitofp i1 {} to {}", dest, value, to)
            }
            Instruction::Call {
                dest,
                callee,
                args,
                ty,
                ..
            } => {
                write!(f, "  ")?;
                if let Some(dest) = dest {
                    write!(f, "{} = ", dest)?;
                }
                write!(f, "call {} @{}(", ty, callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Instruction::Phi {
                dest, ty, incoming, ..
            } => {
                write!(f, "  {} = phi {}", dest, ty)?;
                for (i, (value, label)) in incoming.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " [ {}, %{} ]", value, label)?;
                }
                Ok(())
            }
        }
    }
}

impl Display for Terminator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::Ret {
                value: Some(value), ..
            } => {
                write!(f, "  ret {}", value)
            }
            Terminator::Ret { value: None, .. } => {
                write!(f, "  ret void")
            }
            Terminator::Br { label, .. } => {
                write!(f, "  br label %{}", label)
            }
            Terminator::CondBr {
                cond,
                then_label,
                else_label,
                ..
            } => {
                write!(
                    f,
                    "  br i1 {}, label %{}, label %{}",
                    cond, then_label, else_label
                )
            }
        }
    }
}

impl Display for BasicBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.label)?;
        for instruction in &self.instructions {
            writeln!(f, "{}", instruction)?;
        }
        if let Some(terminator) = &self.terminator {
            writeln!(f, "{}", terminator)?;
        }
        Ok(())
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let keyword = if self.is_defined() { "define" } else { "declare" };
        write!(f, "{} {} @{}(", keyword, self.return_type, self.name)?;
        for (i, (param_name, param_type)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} %{}", param_type, param_name)?;
        }
        write!(f, ")")?;

        if !self.is_defined() {
            return writeln!(f);
        }

        writeln!(f, " {{")?;
        if let Some(debug) = &self.debug {
            writeln!(f, "  ; dbg scope line {}", debug.scope_line)?;
            for param in &debug.params {
                writeln!(
                    f,
                    "  ; dbg parameter {} #{} line {}",
                    param.name, param.index, param.line
                )?;
            }
        }
        for block in &self.blocks {
            write!(f, "{}", block)?;
        }
        writeln!(f, "}}")
    }
}

impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;
        if let Some(unit) = &self.compile_unit {
            writeln!(
                f,
                "; compile unit: {} ({}{})",
                unit.file,
                unit.producer,
                if self.debug_finalized {
                    ", finalized"
                } else {
                    ""
                }
            )?;
        }
        if let Some(layout) = &self.data_layout {
            writeln!(f, "target datalayout = \"{}\"", layout)?;
        }
        for (name, value) in &self.flags {
            writeln!(f, "; module flag: {} = {}", name, value)?;
        }
        writeln!(f)?;

        for function in &self.functions {
            writeln!(f, "{}", function)?;
        }
        Ok(())
    }
}
