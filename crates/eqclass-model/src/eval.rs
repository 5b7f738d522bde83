use eqclass_ir::expr::{Expr, Literal, OpKind};
use eqclass_ir::types::{DomainValue, Predicate};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("Type error: expected {expected}, got {actual}")]
    TypeError { expected: String, actual: String },

    #[error("Malformed expression: {reason}")]
    Malformed { reason: String },
}

/// Decide whether `value` satisfies a class predicate.
pub fn eval_predicate(predicate: &Predicate, value: &DomainValue) -> Result<bool, EvalError> {
    match predicate {
        Predicate::Range { min, max } => match value {
            DomainValue::Int(i) => Ok(min <= i && i <= max),
            other => Err(type_error("int", other)),
        },
        Predicate::OneOf { values } => {
            if let Some(bad) = values.iter().find(|v| v.kind() != value.kind()) {
                return Err(type_error(value.kind(), bad));
            }
            Ok(values.contains(value))
        }
        Predicate::Expr { expr } => match eval_expr(expr, value)? {
            DomainValue::Bool(b) => Ok(b),
            other => Err(type_error("bool", &other)),
        },
    }
}

/// Evaluate an expression with `["value"]` bound to `value`.
pub fn eval_expr(expr: &Expr, value: &DomainValue) -> Result<DomainValue, EvalError> {
    match expr {
        Expr::Literal(lit) => Ok(literal_value(lit)),
        Expr::Value => Ok(value.clone()),
        Expr::Op { op, args } => eval_op(*op, args, value),
    }
}

fn eval_op(op: OpKind, args: &[Expr], value: &DomainValue) -> Result<DomainValue, EvalError> {
    if let Some(n) = op.arity() {
        if args.len() != n {
            return Err(EvalError::Malformed {
                reason: format!("{op:?} takes {n} argument(s), got {}", args.len()),
            });
        }
    }

    match op {
        OpKind::Eq | OpKind::Neq => {
            let left = eval_expr(&args[0], value)?;
            let right = eval_expr(&args[1], value)?;
            if left.kind() != right.kind() {
                return Err(type_error(left.kind(), &right));
            }
            Ok(DomainValue::Bool((left == right) == (op == OpKind::Eq)))
        }
        OpKind::And => {
            for arg in args {
                if !eval_bool(arg, value)? {
                    return Ok(DomainValue::Bool(false));
                }
            }
            Ok(DomainValue::Bool(true))
        }
        OpKind::Or => {
            for arg in args {
                if eval_bool(arg, value)? {
                    return Ok(DomainValue::Bool(true));
                }
            }
            Ok(DomainValue::Bool(false))
        }
        OpKind::Not => Ok(DomainValue::Bool(!eval_bool(&args[0], value)?)),
        OpKind::Implies => {
            if eval_bool(&args[0], value)? {
                Ok(DomainValue::Bool(eval_bool(&args[1], value)?))
            } else {
                Ok(DomainValue::Bool(true))
            }
        }
        OpKind::Lt => eval_ordered_cmp(args, value, |o| o.is_lt()),
        OpKind::Lte => eval_ordered_cmp(args, value, |o| o.is_le()),
        OpKind::Gt => eval_ordered_cmp(args, value, |o| o.is_gt()),
        OpKind::Gte => eval_ordered_cmp(args, value, |o| o.is_ge()),
    }
}

fn eval_bool(expr: &Expr, value: &DomainValue) -> Result<bool, EvalError> {
    match eval_expr(expr, value)? {
        DomainValue::Bool(b) => Ok(b),
        other => Err(type_error("bool", &other)),
    }
}

/// Ordering comparisons are defined for int/int and char/char only.
fn eval_ordered_cmp(
    args: &[Expr],
    value: &DomainValue,
    cmp: fn(std::cmp::Ordering) -> bool,
) -> Result<DomainValue, EvalError> {
    let left = eval_expr(&args[0], value)?;
    let right = eval_expr(&args[1], value)?;
    match (&left, &right) {
        (DomainValue::Int(a), DomainValue::Int(b)) => Ok(DomainValue::Bool(cmp(a.cmp(b)))),
        (DomainValue::Char(a), DomainValue::Char(b)) => Ok(DomainValue::Bool(cmp(a.cmp(b)))),
        _ => Err(EvalError::TypeError {
            expected: "matching int or char operands".to_string(),
            actual: format!("{left:?}, {right:?}"),
        }),
    }
}

fn literal_value(lit: &Literal) -> DomainValue {
    match lit {
        Literal::Bool(b) => DomainValue::Bool(*b),
        Literal::Int(i) => DomainValue::Int(*i),
        Literal::Char(c) => DomainValue::Char(*c),
    }
}

fn type_error(expected: &str, actual: &DomainValue) -> EvalError {
    EvalError::TypeError {
        expected: expected.to_string(),
        actual: format!("{} ({actual})", actual.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> Expr {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_half_open_band() {
        let expr = parse(serde_json::json!(["and", ["gte", ["value"], 20], ["lt", ["value"], 40]]));
        let predicate = Predicate::Expr { expr };
        assert!(!eval_predicate(&predicate, &DomainValue::Int(19)).unwrap());
        assert!(eval_predicate(&predicate, &DomainValue::Int(20)).unwrap());
        assert!(eval_predicate(&predicate, &DomainValue::Int(39)).unwrap());
        assert!(!eval_predicate(&predicate, &DomainValue::Int(40)).unwrap());
    }

    #[test]
    fn test_range_is_inclusive() {
        let predicate = Predicate::Range { min: 0, max: 9 };
        assert!(eval_predicate(&predicate, &DomainValue::Int(0)).unwrap());
        assert!(eval_predicate(&predicate, &DomainValue::Int(9)).unwrap());
        assert!(!eval_predicate(&predicate, &DomainValue::Int(10)).unwrap());
    }

    #[test]
    fn test_range_on_char_is_type_error() {
        let predicate = Predicate::Range { min: 0, max: 9 };
        let result = eval_predicate(&predicate, &DomainValue::Char('a'));
        assert!(matches!(result, Err(EvalError::TypeError { .. })));
    }

    #[test]
    fn test_one_of_chars() {
        let predicate = Predicate::OneOf {
            values: vec![DomainValue::Char('a'), DomainValue::Char('b')],
        };
        assert!(eval_predicate(&predicate, &DomainValue::Char('b')).unwrap());
        assert!(!eval_predicate(&predicate, &DomainValue::Char('c')).unwrap());
    }

    #[test]
    fn test_one_of_mixed_kinds_rejected() {
        let predicate = Predicate::OneOf {
            values: vec![DomainValue::Int(1)],
        };
        assert!(eval_predicate(&predicate, &DomainValue::Char('a')).is_err());
    }

    #[test]
    fn test_char_comparisons() {
        let expr = parse(serde_json::json!(["and", ["gte", ["value"], "a"], ["lte", ["value"], "z"]]));
        assert_eq!(
            eval_expr(&expr, &DomainValue::Char('m')).unwrap(),
            DomainValue::Bool(true)
        );
        assert_eq!(
            eval_expr(&expr, &DomainValue::Char('A')).unwrap(),
            DomainValue::Bool(false)
        );
    }

    #[test]
    fn test_not_or_default_branch() {
        let expr = parse(serde_json::json!([
            "not",
            ["or", ["eq", ["value"], "a"], ["eq", ["value"], "b"]]
        ]));
        assert_eq!(
            eval_expr(&expr, &DomainValue::Char('a')).unwrap(),
            DomainValue::Bool(false)
        );
        assert_eq!(
            eval_expr(&expr, &DomainValue::Char('x')).unwrap(),
            DomainValue::Bool(true)
        );
    }

    #[test]
    fn test_implies() {
        let expr = parse(serde_json::json!(["implies", ["gt", ["value"], 5], ["lt", ["value"], 8]]));
        assert_eq!(eval_expr(&expr, &DomainValue::Int(3)).unwrap(), DomainValue::Bool(true));
        assert_eq!(eval_expr(&expr, &DomainValue::Int(7)).unwrap(), DomainValue::Bool(true));
        assert_eq!(eval_expr(&expr, &DomainValue::Int(9)).unwrap(), DomainValue::Bool(false));
    }

    #[test]
    fn test_eq_across_kinds_is_type_error() {
        let expr = parse(serde_json::json!(["eq", ["value"], 1]));
        assert!(eval_expr(&expr, &DomainValue::Char('a')).is_err());
    }

    #[test]
    fn test_non_bool_expr_predicate_rejected() {
        let predicate = Predicate::Expr { expr: Expr::Value };
        let result = eval_predicate(&predicate, &DomainValue::Int(4));
        assert!(matches!(result, Err(EvalError::TypeError { .. })));
    }

    #[test]
    fn test_bool_domain_identity() {
        let predicate = Predicate::Expr { expr: Expr::Value };
        assert!(eval_predicate(&predicate, &DomainValue::Bool(true)).unwrap());
        assert!(!eval_predicate(&predicate, &DomainValue::Bool(false)).unwrap());
    }
}
