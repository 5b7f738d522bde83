use serde::{Deserialize, Serialize};

use eqclass_ir::types::{ClassTag, DomainValue};

/// How a case's focus value was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseKind {
    Boundary,
    Interior,
    Sampled,
}

impl std::fmt::Display for CaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaseKind::Boundary => f.write_str("boundary"),
            CaseKind::Interior => f.write_str("interior"),
            CaseKind::Sampled => f.write_str("sampled"),
        }
    }
}

/// One variable's value within a case, with the class that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub variable: String,
    pub value: DomainValue,
    pub class: String,
    pub tag: ClassTag,
}

/// A concrete input tuple, one assignment per variable in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputCase {
    pub id: usize,
    /// Variable being varied; `None` for sampled cases.
    pub focus: Option<String>,
    pub kind: CaseKind,
    pub assignments: Vec<Assignment>,
}

impl InputCase {
    pub fn value_of(&self, variable: &str) -> Option<&DomainValue> {
        self.assignments
            .iter()
            .find(|a| a.variable == variable)
            .map(|a| &a.value)
    }

    pub fn values(&self) -> Vec<DomainValue> {
        self.assignments.iter().map(|a| a.value.clone()).collect()
    }

    /// Values rendered as text, in declaration order.
    pub fn rendered_values(&self) -> Vec<String> {
        self.assignments.iter().map(|a| a.value.to_string()).collect()
    }

    /// Short form like `x=4 y=48 z=40`.
    pub fn label(&self) -> String {
        self.assignments
            .iter()
            .map(|a| format!("{}={}", a.variable, a.value))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
