use serde::{Deserialize, Serialize};

use crate::expr::Expr;

/// Top-level partition configuration for one equivalence-class suite.
///
/// Variables are listed in the order the candidate programs consume them,
/// which is also the order values are fed on stdin or as arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionConfig {
    pub variables: Vec<VariableDef>,
}

// ── Variables ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDef {
    pub name: String,
    pub domain: DomainType,
    /// Nominal value held while other variables are varied.
    #[serde(default)]
    pub base: Option<DomainValue>,
    #[serde(default)]
    pub classes: Vec<ClassDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainType {
    /// Inclusive integer range.
    Int { min: i64, max: i64 },
    /// Enumerated character set.
    Char { values: Vec<char> },
    Bool,
}

impl DomainType {
    /// Number of values in the domain. Empty ranges report zero.
    pub fn size(&self) -> u64 {
        match self {
            DomainType::Int { min, max } => {
                if max < min {
                    0
                } else {
                    (*max as i128 - *min as i128 + 1).min(u64::MAX as i128) as u64
                }
            }
            DomainType::Char { values } => values.len() as u64,
            DomainType::Bool => 2,
        }
    }

    /// Whether `value` is a member of this domain.
    pub fn contains(&self, value: &DomainValue) -> bool {
        match (self, value) {
            (DomainType::Int { min, max }, DomainValue::Int(i)) => min <= i && i <= max,
            (DomainType::Char { values }, DomainValue::Char(c)) => values.contains(c),
            (DomainType::Bool, DomainValue::Bool(_)) => true,
            _ => false,
        }
    }

    /// Every value of the domain, in natural order (ascending ints,
    /// declaration order for chars, `false` before `true`).
    pub fn values(&self) -> Vec<DomainValue> {
        match self {
            DomainType::Int { min, max } => (*min..=*max).map(DomainValue::Int).collect(),
            DomainType::Char { values } => values.iter().copied().map(DomainValue::Char).collect(),
            DomainType::Bool => vec![DomainValue::Bool(false), DomainValue::Bool(true)],
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DomainType::Int { .. } => "int",
            DomainType::Char { .. } => "char",
            DomainType::Bool => "bool",
        }
    }
}

/// A concrete value from a domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DomainValue {
    Bool(bool),
    Int(i64),
    Char(char),
}

impl DomainValue {
    pub fn kind(&self) -> &'static str {
        match self {
            DomainValue::Bool(_) => "bool",
            DomainValue::Int(_) => "int",
            DomainValue::Char(_) => "char",
        }
    }
}

impl std::fmt::Display for DomainValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainValue::Bool(b) => write!(f, "{b}"),
            DomainValue::Int(i) => write!(f, "{i}"),
            DomainValue::Char(c) => write!(f, "{c}"),
        }
    }
}

// ── Classes ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDef {
    #[serde(default)]
    pub name: Option<String>,
    pub tag: ClassTag,
    pub predicate: Predicate,
    #[serde(default)]
    pub boundaries: Vec<DomainValue>,
    /// Derive `a-1, a, b, b+1` for each contiguous run `[a, b]` of an
    /// integer class, in addition to the declared boundaries.
    #[serde(default)]
    pub auto_boundaries: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassTag {
    Valid,
    Invalid,
}

impl std::fmt::Display for ClassTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassTag::Valid => f.write_str("valid"),
            ClassTag::Invalid => f.write_str("invalid"),
        }
    }
}

/// Membership rule selecting a class's subset of the domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// Inclusive integer range.
    Range { min: i64, max: i64 },
    /// Explicit enumeration.
    OneOf { values: Vec<DomainValue> },
    /// Boolean expression over `["value"]`.
    Expr { expr: Expr },
}
