use eqclass_ir::expr::{Expr, Literal, OpKind};

#[test]
fn test_parse_literal_bool() {
    let expr: Expr = serde_json::from_value(serde_json::json!(true)).unwrap();
    assert_eq!(expr, Expr::Literal(Literal::Bool(true)));
}

#[test]
fn test_parse_literal_int() {
    let expr: Expr = serde_json::from_value(serde_json::json!(-7)).unwrap();
    assert_eq!(expr, Expr::Literal(Literal::Int(-7)));
}

#[test]
fn test_parse_literal_char() {
    let expr: Expr = serde_json::from_value(serde_json::json!("a")).unwrap();
    assert_eq!(expr, Expr::Literal(Literal::Char('a')));
}

#[test]
fn test_multi_char_string_rejected() {
    let result: Result<Expr, _> = serde_json::from_value(serde_json::json!("abc"));
    assert!(result.is_err());
}

#[test]
fn test_parse_value_reference() {
    let expr: Expr = serde_json::from_value(serde_json::json!(["value"])).unwrap();
    assert_eq!(expr, Expr::Value);
}

#[test]
fn test_parse_half_open_band() {
    let json = serde_json::json!(["and", ["gte", ["value"], 20], ["lt", ["value"], 40]]);
    let expr: Expr = serde_json::from_value(json).unwrap();
    match expr {
        Expr::Op { op: OpKind::And, args } => {
            assert_eq!(args.len(), 2);
            assert_eq!(
                args[1],
                Expr::Op {
                    op: OpKind::Lt,
                    args: vec![Expr::Value, Expr::Literal(Literal::Int(40))],
                }
            );
        }
        other => panic!("expected and-expression, got {other:?}"),
    }
}

#[test]
fn test_unknown_operator_rejected() {
    let result: Result<Expr, _> = serde_json::from_value(serde_json::json!(["xor", true, false]));
    assert!(result.is_err());
}

#[test]
fn test_wrong_arity_rejected() {
    let result: Result<Expr, _> = serde_json::from_value(serde_json::json!(["lt", ["value"]]));
    assert!(result.is_err());

    let result: Result<Expr, _> = serde_json::from_value(serde_json::json!(["not", true, false]));
    assert!(result.is_err());

    let result: Result<Expr, _> = serde_json::from_value(serde_json::json!(["or"]));
    assert!(result.is_err());
}

#[test]
fn test_empty_array_rejected() {
    let result: Result<Expr, _> = serde_json::from_value(serde_json::json!([]));
    assert!(result.is_err());
}
