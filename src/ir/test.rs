use super::*;
use crate::span::Span;

fn builder_with_function(name: &str, params: &[&str]) -> IrBuilder {
    let mut builder = IrBuilder::new("test");
    let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
    builder.declare_function(name, &params, IrType::F64);
    builder.position_at_function(name);
    builder
}

#[test]
fn test_host_library_is_declared() {
    let builder = IrBuilder::new("test");
    let module = builder.into_module();

    for name in ["putchard", "printd"] {
        let function = module.get_function(name).expect("host function missing");
        assert!(!function.is_defined());
        assert_eq!(function.arity(), 1);
        assert_eq!(function.return_type, IrType::F64);
    }
}

#[test]
fn test_simple_function_roundtrip() {
    let mut builder = builder_with_function("f", &["a"]);
    let entry = builder.create_block("entry".to_string());
    builder.set_insert_point(entry);

    let slot = builder.build_entry_alloca("a");
    builder.build_store(Value::Argument("a".to_string()), slot.clone());
    let loaded = builder.build_load(slot);
    let one = builder.fp_const(1.0);
    let sum = builder.build_fadd(loaded, one);
    builder.build_ret(Some(sum));

    let module = builder.into_module();
    let f = module.get_function("f").unwrap();
    assert!(IrValidator::validate_function(&module, f).is_ok());

    let text = module.to_string();
    assert!(text.contains("define double @f(double %a)"));
    assert!(text.contains("alloca double"));
    assert!(text.contains("fadd double"));
    assert!(text.contains("ret %"));
}

#[test]
fn test_entry_alloca_lands_in_the_entry_block() {
    let mut builder = builder_with_function("f", &[]);
    let entry = builder.create_block("entry".to_string());
    builder.set_insert_point(entry);
    builder.build_br("next1");
    let next = builder.create_block("next1".to_string());
    builder.set_insert_point(next);

    // Emitted while inserting into 'next1', but it must land in 'entry'.
    builder.build_entry_alloca("v");

    let module = builder.into_module();
    let f = module.get_function("f").unwrap();
    assert!(matches!(
        f.blocks[0].instructions[0],
        Instruction::Alloca { ref var, .. } if var == "v"
    ));
    assert!(f.blocks[1].instructions.is_empty());
}

#[test]
fn test_labels_are_unique() {
    let mut builder = builder_with_function("f", &[]);
    let a = builder.new_label("then");
    let b = builder.new_label("then");
    assert_ne!(a, b);
}

#[test]
fn test_validator_rejects_missing_terminator() {
    let mut builder = builder_with_function("f", &[]);
    let entry = builder.create_block("entry".to_string());
    builder.set_insert_point(entry);

    let module = builder.into_module();
    let f = module.get_function("f").unwrap();
    let errors = IrValidator::validate_function(&module, f).unwrap_err();
    assert!(errors[0].contains("no terminator"));
}

#[test]
fn test_validator_rejects_unknown_branch_target() {
    let mut builder = builder_with_function("f", &[]);
    let entry = builder.create_block("entry".to_string());
    builder.set_insert_point(entry);
    builder.build_br("nowhere");

    let module = builder.into_module();
    let f = module.get_function("f").unwrap();
    let errors = IrValidator::validate_function(&module, f).unwrap_err();
    assert!(errors[0].contains("unknown block 'nowhere'"));
}

#[test]
fn test_validator_rejects_bad_phi_and_void_ret() {
    let mut builder = builder_with_function("f", &[]);
    let entry = builder.create_block("entry".to_string());
    builder.set_insert_point(entry);
    let one = builder.fp_const(1.0);
    builder.build_phi(IrType::F64, vec![(one, "ghost".to_string())]);
    builder.build_ret(None);

    let module = builder.into_module();
    let f = module.get_function("f").unwrap();
    let errors = IrValidator::validate_function(&module, f).unwrap_err();
    assert!(errors.iter().any(|e| e.contains("unknown block 'ghost'")));
    assert!(errors.iter().any(|e| e.contains("returns void")));
}

#[test]
fn test_validator_checks_call_targets() {
    let mut builder = builder_with_function("f", &[]);
    let entry = builder.create_block("entry".to_string());
    builder.set_insert_point(entry);
    let one = builder.fp_const(1.0);
    let result = builder.build_call("missing", vec![one], IrType::F64);
    builder.build_ret(Some(result));

    let module = builder.into_module();
    let f = module.get_function("f").unwrap();
    let errors = IrValidator::validate_function(&module, f).unwrap_err();
    assert!(errors[0].contains("undeclared function 'missing'"));

    // Arity mismatches against a declared callee are caught too.
    let mut builder = builder_with_function("g", &[]);
    let entry = builder.create_block("entry".to_string());
    builder.set_insert_point(entry);
    let result = builder.build_call("putchard", vec![], IrType::F64);
    builder.build_ret(Some(result));

    let module = builder.into_module();
    let g = module.get_function("g").unwrap();
    let errors = IrValidator::validate_function(&module, g).unwrap_err();
    assert!(errors[0].contains("expected 1"));
}

#[test]
fn test_validate_module_aggregates_function_errors() {
    let mut builder = builder_with_function("f", &[]);
    let entry = builder.create_block("entry".to_string());
    builder.set_insert_point(entry);

    builder.declare_function("g", &[], IrType::F64);
    builder.position_at_function("g");
    let entry = builder.create_block("entry".to_string());
    builder.set_insert_point(entry);
    builder.build_br("nowhere");

    let errors = IrValidator::validate_module(&builder.into_module()).unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e.starts_with("f:")));
    assert!(errors.iter().any(|e| e.starts_with("g:")));
}

#[test]
fn test_erase_function_removes_it() {
    let mut builder = builder_with_function("f", &[]);
    assert!(builder.get_function("f").is_some());
    builder.erase_function("f");
    assert!(builder.get_function("f").is_none());
}

#[test]
fn test_declarations_print_as_declare() {
    let builder = IrBuilder::new("test");
    let text = builder.into_module().to_string();
    assert!(text.contains("declare double @putchard(double %x)"));
    assert!(text.contains("declare double @printd(double %x)"));
}

#[test]
fn test_module_header_and_flags() {
    let mut builder = IrBuilder::new("demo");
    builder.create_compile_unit("demo.yk", "Yorkie Compiler");
    builder.add_module_flag("Debug Info Version", 3);
    builder.set_data_layout("e-m:e-i64:64");
    builder.finalize_debug_info();

    let text = builder.into_module().to_string();
    assert!(text.contains("; ModuleID = 'demo'"));
    assert!(text.contains("demo.yk"));
    assert!(text.contains("module flag: Debug Info Version = 3"));
    assert!(text.contains("target datalayout = \"e-m:e-i64:64\""));
    assert!(text.contains("finalized"));
}

#[test]
fn test_instruction_locations_follow_the_builder() {
    let mut builder = builder_with_function("f", &[]);
    let entry = builder.create_block("entry".to_string());
    builder.set_insert_point(entry);

    let loc = Span {
        line: 7,
        column: 3,
        start: 40,
        end: 41,
    };
    builder.set_current_location(loc.clone());
    let one = builder.fp_const(1.0);
    let two = builder.fp_const(2.0);
    builder.build_fadd(one, two);

    let module = builder.into_module();
    let f = module.get_function("f").unwrap();
    let Instruction::FAdd { loc: emitted, .. } = &f.blocks[0].instructions[0] else {
        panic!("expected an fadd");
    };
    assert_eq!(*emitted, loc);
}
