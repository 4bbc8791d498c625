use super::*;
use crate::ast::{Expr, Function, PrototypeKind};

// Helper to parse input without file I/O.
fn parse_str(input: &str) -> (AstContext, usize) {
    let mut ctx = AstContext::new("test.yk");
    let error_count;
    {
        let mut parser = Parser::new(input, &mut ctx);
        parser.parse_top_level();
        error_count = parser.errors.len();
    }
    (ctx, error_count)
}

fn single_function(ctx: &AstContext) -> &Function {
    assert_eq!(ctx.functions.len(), 1, "expected exactly one function");
    &ctx.functions[0]
}

#[test]
fn test_parse_simple_definition() {
    let (ctx, errors) = parse_str("def t() 42 end");
    assert_eq!(errors, 0);

    let function = single_function(&ctx);
    assert_eq!(function.proto.name, "t");
    assert_eq!(function.proto.kind, PrototypeKind::Regular);
    assert!(function.proto.args.is_empty());
    assert_eq!(function.body.len(), 1);
    assert_eq!(function.body[0].0, Expr::Number(42.0));
}

#[test]
fn test_arithmetic_precedence() {
    // 1 + 2 * 3 groups as 1 + (2 * 3)
    let (ctx, errors) = parse_str("def t() 1 + 2 * 3 end");
    assert_eq!(errors, 0);

    let function = single_function(&ctx);
    let Expr::Binary { op, lhs, rhs } = &function.body[0].0 else {
        panic!("expected a binary node, got {:?}", function.body[0].0);
    };
    assert_eq!(*op, b'+');
    assert_eq!(lhs.0, Expr::Number(1.0));
    let Expr::Binary { op, lhs, rhs } = &rhs.0 else {
        panic!("expected the rhs to be a binary node");
    };
    assert_eq!(*op, b'*');
    assert_eq!(lhs.0, Expr::Number(2.0));
    assert_eq!(rhs.0, Expr::Number(3.0));
}

#[test]
fn test_left_associativity() {
    // a - b - c groups as (a - b) - c
    let (ctx, errors) = parse_str("def t(a b c) a - b - c end");
    assert_eq!(errors, 0);

    let function = single_function(&ctx);
    let Expr::Binary { op, lhs, rhs } = &function.body[0].0 else {
        panic!("expected a binary node");
    };
    assert_eq!(*op, b'-');
    assert_eq!(rhs.0, Expr::Variable("c".to_string()));
    assert!(matches!(&lhs.0, Expr::Binary { op: b'-', .. }));
}

#[test]
fn test_parenthesized_grouping() {
    let (ctx, errors) = parse_str("def t() (1 + 2) * 3 end");
    assert_eq!(errors, 0);

    let function = single_function(&ctx);
    let Expr::Binary { op, lhs, .. } = &function.body[0].0 else {
        panic!("expected a binary node");
    };
    assert_eq!(*op, b'*');
    assert!(matches!(&lhs.0, Expr::Binary { op: b'+', .. }));
}

#[test]
fn test_user_defined_binary_operator() {
    let input = "def binary| 5 (a b) if a then 1 else b end end\ndef t() 0 | 7 end";
    let (ctx, errors) = parse_str(input);
    assert_eq!(errors, 0);
    assert_eq!(ctx.functions.len(), 2);

    // The prototype installed '|' with precedence 5.
    assert_eq!(ctx.precedence.get(b'|'), 5);

    let operator = &ctx.functions[0];
    assert_eq!(operator.proto.name, "binary|");
    assert_eq!(operator.proto.kind, PrototypeKind::Binary);
    assert_eq!(operator.proto.precedence, 5);
    assert!(operator.proto.is_binary_op());

    let Expr::Binary { op, lhs, rhs } = &ctx.functions[1].body[0].0 else {
        panic!("expected '|' to parse as a binary node");
    };
    assert_eq!(*op, b'|');
    assert_eq!(lhs.0, Expr::Number(0.0));
    assert_eq!(rhs.0, Expr::Number(7.0));
}

#[test]
fn test_user_operator_precedences_group_correctly() {
    // '&' binds tighter than '|', so a | b & c is a | (b & c).
    let input = "\
def binary& 6 (a b) a end
def binary| 5 (a b) a end
def t(a b c) a | b & c end";
    let (ctx, errors) = parse_str(input);
    assert_eq!(errors, 0);

    let Expr::Binary { op, rhs, .. } = &ctx.functions[2].body[0].0 else {
        panic!("expected a binary node");
    };
    assert_eq!(*op, b'|');
    assert!(matches!(&rhs.0, Expr::Binary { op: b'&', .. }));
}

#[test]
fn test_default_binary_precedence_is_30() {
    let (ctx, errors) = parse_str("def binary&(a b) a end");
    assert_eq!(errors, 0);
    assert_eq!(ctx.precedence.get(b'&'), 30);
    assert_eq!(single_function(&ctx).proto.precedence, 30);
}

#[test]
fn test_invalid_precedence_is_rejected() {
    let (ctx, errors) = parse_str("def binary| 200 (a b) a end");
    assert!(errors > 0);
    assert!(ctx.functions.iter().all(|f| f.proto.name != "binary|"));
    assert_eq!(ctx.precedence.get(b'|'), -1);
}

#[test]
fn test_operator_operand_count_is_checked() {
    let (ctx, errors) = parse_str("def binary| 5 (a) a end");
    assert!(errors > 0);
    assert!(ctx.functions.is_empty());

    let (ctx, errors) = parse_str("def unary!(a b) a end");
    assert!(errors > 0);
    assert!(ctx.functions.is_empty());
}

#[test]
fn test_unary_prototype_and_use() {
    let (ctx, errors) = parse_str("def unary!(v) 0 - v end\ndef t(x) !x end");
    assert_eq!(errors, 0);
    assert_eq!(ctx.functions.len(), 2);

    let operator = &ctx.functions[0];
    assert_eq!(operator.proto.name, "unary!");
    assert!(operator.proto.is_unary_op());
    assert_eq!(operator.proto.operator_name(), b'!');

    let Expr::Unary { op, operand } = &ctx.functions[1].body[0].0 else {
        panic!("expected a unary node");
    };
    assert_eq!(*op, b'!');
    assert_eq!(operand.0, Expr::Variable("x".to_string()));
}

#[test]
fn test_call_with_arguments() {
    let (ctx, errors) = parse_str("def t(a) foo(a, 1 + 2, bar()) end");
    assert_eq!(errors, 0);

    let Expr::Call { callee, args } = &single_function(&ctx).body[0].0 else {
        panic!("expected a call node");
    };
    assert_eq!(callee, "foo");
    assert_eq!(args.len(), 3);
    assert!(matches!(&args[2].0, Expr::Call { .. }));
}

#[test]
fn test_if_then_else() {
    let (ctx, errors) = parse_str("def t(a) if a then 1 else 2 end end");
    assert_eq!(errors, 0);

    let Expr::If {
        cond,
        then_branch,
        else_branch,
    } = &single_function(&ctx).body[0].0
    else {
        panic!("expected an if node");
    };
    assert_eq!(cond.0, Expr::Variable("a".to_string()));
    assert_eq!(then_branch.0, Expr::Number(1.0));
    assert_eq!(else_branch.0, Expr::Number(2.0));
}

#[test]
fn test_for_with_default_step() {
    let (ctx, errors) = parse_str("def loop(n) for i = 0, i < n in printd(i) end end");
    assert_eq!(errors, 0);

    let Expr::For {
        var,
        start,
        end,
        step,
        body,
    } = &single_function(&ctx).body[0].0
    else {
        panic!("expected a for node");
    };
    assert_eq!(var, "i");
    assert_eq!(start.0, Expr::Number(0.0));
    assert!(matches!(&end.0, Expr::Binary { op: b'<', .. }));
    assert!(step.is_none());
    assert!(matches!(&body.0, Expr::Call { .. }));
}

#[test]
fn test_for_with_explicit_step() {
    let (ctx, errors) = parse_str("def t(n) for i = 0, i < n, 2 in i end end");
    assert_eq!(errors, 0);

    let Expr::For { step, .. } = &single_function(&ctx).body[0].0 else {
        panic!("expected a for node");
    };
    assert_eq!(step.as_ref().unwrap().0, Expr::Number(2.0));
}

#[test]
fn test_var_bindings() {
    let (ctx, errors) = parse_str("def t() var a = 2, b in a end end");
    assert_eq!(errors, 0);

    let Expr::Var { bindings, body } = &single_function(&ctx).body[0].0 else {
        panic!("expected a var node");
    };
    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].0, "a");
    assert_eq!(bindings[0].1.as_ref().unwrap().0, Expr::Number(2.0));
    assert_eq!(bindings[1].0, "b");
    assert!(bindings[1].1.is_none());
    assert_eq!(body.0, Expr::Variable("a".to_string()));
}

#[test]
fn test_nested_var_shadowing_shape() {
    let (ctx, errors) = parse_str("def t() var a = 2 in var a = a + 1 in a end end end");
    assert_eq!(errors, 0);

    let Expr::Var { bindings, body } = &single_function(&ctx).body[0].0 else {
        panic!("expected a var node");
    };
    assert_eq!(bindings[0].1.as_ref().unwrap().0, Expr::Number(2.0));
    assert!(matches!(&body.0, Expr::Var { .. }));
}

#[test]
fn test_compound_body() {
    let (ctx, errors) = parse_str("def t() 1; 2; 3 end");
    assert_eq!(errors, 0);

    let function = single_function(&ctx);
    assert_eq!(function.body.len(), 3);
    assert_eq!(function.body[2].0, Expr::Number(3.0));
}

#[test]
fn test_trailing_semicolon_in_body() {
    let (ctx, errors) = parse_str("def t() 1; 2; end");
    assert_eq!(errors, 0);
    assert_eq!(single_function(&ctx).body.len(), 2);
}

#[test]
fn test_empty_body_is_an_error() {
    let (ctx, errors) = parse_str("def t() end");
    assert!(errors > 0);
    assert!(ctx.functions.is_empty());
}

#[test]
fn test_extern_declaration() {
    let (ctx, errors) = parse_str("extern sin(x)");
    assert_eq!(errors, 0);

    let function = single_function(&ctx);
    assert!(function.is_declaration());
    assert_eq!(function.proto.name, "sin");
    assert_eq!(function.proto.args, vec!["x".to_string()]);
}

#[test]
fn test_top_level_expression_becomes_main() {
    let (ctx, errors) = parse_str("4 + 5");
    assert_eq!(errors, 0);

    let function = single_function(&ctx);
    assert_eq!(function.proto.name, "main");
    assert!(function.proto.args.is_empty());
    assert_eq!(function.proto.kind, PrototypeKind::Regular);
    assert!(matches!(&function.body[0].0, Expr::Binary { op: b'+', .. }));
}

#[test]
fn test_top_level_semicolons_are_ignored() {
    let (ctx, errors) = parse_str("; ; def t() 1 end ;");
    assert_eq!(errors, 0);
    assert_eq!(ctx.functions.len(), 1);
}

#[test]
fn test_error_recovery_keeps_later_definitions() {
    // The first definition is broken; the parser reports it, skips, and
    // still produces the second one.
    let (ctx, errors) = parse_str("def bad( end\ndef good() 1 end");
    assert!(errors > 0);
    assert_eq!(ctx.functions.len(), 1);
    assert_eq!(ctx.functions[0].proto.name, "good");
}

#[test]
fn test_unclosed_paren_is_an_error() {
    let (_, errors) = parse_str("def t() (1 + 2 end");
    assert!(errors > 0);
}

#[test]
fn test_missing_then_is_an_error() {
    let (_, errors) = parse_str("def t(a) if a 1 else 2 end end");
    assert!(errors > 0);
}

#[test]
fn test_assignment_parses_without_lhs_restriction() {
    // The parser does not restrict the LHS shape of '='; that check
    // belongs to codegen.
    let (ctx, errors) = parse_str("def t(a) (a + 1) = 2 end");
    assert_eq!(errors, 0);

    let Expr::Binary { op, lhs, .. } = &single_function(&ctx).body[0].0 else {
        panic!("expected a binary node");
    };
    assert_eq!(*op, b'=');
    assert!(matches!(&lhs.0, Expr::Binary { op: b'+', .. }));
}

#[test]
fn test_undeclared_operator_does_not_parse_as_binop() {
    // '|' has no precedence entry here, so it cannot continue the
    // expression and the body loop sees an unexpected token.
    let (ctx, errors) = parse_str("def t() 0 | 7 end");
    assert!(errors > 0);
    assert!(ctx.functions.iter().all(|f| f.proto.name != "t"));
}

#[test]
fn test_node_spans_carry_positions() {
    let (ctx, errors) = parse_str("def t() 1 + 2 end");
    assert_eq!(errors, 0);

    let (_, span) = &single_function(&ctx).body[0];
    // The binary node is anchored at its operator.
    assert_eq!(span.line, 1);
    assert_eq!(span.column, 11);
}
