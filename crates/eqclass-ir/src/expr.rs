use serde::{Deserialize, Serialize};

/// Predicate expression over a single variable's value.
///
/// JSON form is an array `["op", ...args]`, a bare literal, or `["value"]`
/// for the value under test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Literal(Literal),
    Value,
    Op { op: OpKind, args: Vec<Expr> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    Eq,
    Neq,
    And,
    Or,
    Not,
    Implies,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl OpKind {
    /// Required argument count, or `None` for variadic `and`/`or`.
    pub fn arity(self) -> Option<usize> {
        match self {
            OpKind::And | OpKind::Or => None,
            OpKind::Not => Some(1),
            _ => Some(2),
        }
    }
}

impl<'de> Deserialize<'de> for Expr {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        parse_expr(&value).map_err(serde::de::Error::custom)
    }
}

fn parse_expr(value: &serde_json::Value) -> Result<Expr, String> {
    match value {
        serde_json::Value::Bool(b) => Ok(Expr::Literal(Literal::Bool(*b))),
        serde_json::Value::Number(n) => {
            let i = n.as_i64().ok_or_else(|| format!("unsupported number: {n}"))?;
            Ok(Expr::Literal(Literal::Int(i)))
        }
        serde_json::Value::String(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Expr::Literal(Literal::Char(c))),
                _ => Err(format!(
                    "string literal must be a single character, got {s:?}"
                )),
            }
        }

        serde_json::Value::Array(arr) => {
            if arr.is_empty() {
                return Err("empty expression array".to_string());
            }
            let tag = arr[0].as_str().ok_or_else(|| {
                format!(
                    "first element of expression array must be a string, got: {:?}",
                    arr[0]
                )
            })?;

            if tag == "value" {
                if arr.len() != 1 {
                    return Err(format!(
                        "value expression takes no arguments, got {}",
                        arr.len() - 1
                    ));
                }
                return Ok(Expr::Value);
            }

            let op = match tag {
                "eq" => OpKind::Eq,
                "neq" => OpKind::Neq,
                "and" => OpKind::And,
                "or" => OpKind::Or,
                "not" => OpKind::Not,
                "implies" => OpKind::Implies,
                "lt" => OpKind::Lt,
                "lte" => OpKind::Lte,
                "gt" => OpKind::Gt,
                "gte" => OpKind::Gte,
                other => return Err(format!("unknown expression operator: {other}")),
            };
            let args = arr[1..]
                .iter()
                .map(parse_expr)
                .collect::<Result<Vec<_>, _>>()?;
            match op.arity() {
                Some(n) if args.len() != n => Err(format!(
                    "{tag} expression requires {n} argument(s), got {}",
                    args.len()
                )),
                None if args.is_empty() => {
                    Err(format!("{tag} expression requires at least one argument"))
                }
                _ => Ok(Expr::Op { op, args }),
            }
        }

        other => Err(format!("unsupported expression value: {other}")),
    }
}
