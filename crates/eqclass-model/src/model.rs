use std::collections::BTreeMap;

use eqclass_ir::types::{ClassTag, DomainType, DomainValue, PartitionConfig, Predicate};

use crate::eval::EvalError;
use crate::validate;

/// Domains larger than this are rejected; membership is checked by
/// enumerating every value.
pub const MAX_DOMAIN_VALUES: u64 = 65_536;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Duplicate variable: '{name}' is already registered")]
    DuplicateVariable { name: String },

    #[error("Unknown variable: '{name}'")]
    UnknownVariable { name: String },

    #[error("Invalid domain for '{variable}': {reason}")]
    InvalidDomain { variable: String, reason: String },

    #[error("Domain of '{variable}' has {size} values (limit {})", MAX_DOMAIN_VALUES)]
    DomainTooLarge { variable: String, size: u64 },

    #[error("Boundary {value} of '{variable}' is not a domain value")]
    BoundaryOutOfDomain { variable: String, value: DomainValue },

    #[error("Base value {value} of '{variable}' is not a domain value")]
    InvalidBase { variable: String, value: DomainValue },

    #[error("Variable '{variable}' has no classes")]
    NoClasses { variable: String },

    #[error("Class '{class}' of '{variable}' matches no domain value")]
    EmptyClass { variable: String, class: String },

    #[error("Partition gap in '{variable}': {} belong to no class", fmt_values(.values))]
    PartitionGap {
        variable: String,
        values: Vec<DomainValue>,
    },

    #[error(
        "Partition overlap in '{variable}': {} belong to both '{first}' and '{second}'",
        fmt_values(.values)
    )]
    PartitionOverlap {
        variable: String,
        first: String,
        second: String,
        values: Vec<DomainValue>,
    },

    #[error("Predicate of class '{class}' on '{variable}' failed: {source}")]
    Predicate {
        variable: String,
        class: String,
        #[source]
        source: EvalError,
    },

    #[error("Model has not been validated")]
    ModelNotValidated,
}

const SHOWN_VALUES: usize = 8;

fn fmt_values(values: &[DomainValue]) -> String {
    let shown: Vec<String> = values
        .iter()
        .take(SHOWN_VALUES)
        .map(ToString::to_string)
        .collect();
    let mut out = format!("values [{}]", shown.join(", "));
    if values.len() > SHOWN_VALUES {
        out.push_str(&format!(" ({} more)", values.len() - SHOWN_VALUES));
    }
    out
}

/// An input dimension with its domain and classes.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub domain: DomainType,
    pub base: Option<DomainValue>,
    pub classes: Vec<Class>,
}

impl Variable {
    pub fn class_index(&self, name: &str) -> Option<usize> {
        self.classes.iter().position(|c| c.name == name)
    }
}

/// One equivalence class of a variable's domain.
#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    pub tag: ClassTag,
    pub predicate: Predicate,
    /// Declared boundary points, in declaration order.
    pub boundaries: Vec<DomainValue>,
    pub auto_boundaries: bool,
}

/// Membership table of one validated variable.
#[derive(Debug, Clone)]
pub struct Partition {
    pub(crate) owner: BTreeMap<DomainValue, usize>,
    pub(crate) members: Vec<Vec<DomainValue>>,
    pub(crate) boundaries: Vec<Vec<DomainValue>>,
}

impl Partition {
    /// Index of the class owning `value`, if it is a domain value.
    pub fn class_of(&self, value: &DomainValue) -> Option<usize> {
        self.owner.get(value).copied()
    }

    /// Members of a class in domain order.
    pub fn members(&self, class: usize) -> &[DomainValue] {
        &self.members[class]
    }

    /// Effective boundary points of a class: declared first, then derived.
    pub fn boundaries(&self, class: usize) -> &[DomainValue] {
        &self.boundaries[class]
    }

    pub fn class_count(&self) -> usize {
        self.members.len()
    }
}

/// Variables, their classes, and (once validated) the membership tables.
///
/// Any mutation drops the validated state, so generation always sees a
/// model that passed `validate` as it currently stands.
#[derive(Debug, Clone, Default)]
pub struct PartitionModel {
    variables: Vec<Variable>,
    partitions: Option<Vec<Partition>>,
}

impl PartitionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an unvalidated model from a configuration document.
    pub fn from_config(config: &PartitionConfig) -> Result<Self, ModelError> {
        let mut model = Self::new();
        for def in &config.variables {
            model.add_variable(&def.name, def.domain.clone())?;
            if let Some(base) = &def.base {
                model.set_base(&def.name, base.clone())?;
            }
            for class_def in &def.classes {
                let class = model.add_class(
                    &def.name,
                    class_def.predicate.clone(),
                    class_def.tag,
                    class_def.boundaries.clone(),
                )?;
                if let Some(name) = &class_def.name {
                    class.name = name.clone();
                }
                class.auto_boundaries = class_def.auto_boundaries;
            }
        }
        Ok(model)
    }

    pub fn add_variable(&mut self, name: &str, domain: DomainType) -> Result<(), ModelError> {
        if self.variables.iter().any(|v| v.name == name) {
            return Err(ModelError::DuplicateVariable {
                name: name.to_string(),
            });
        }
        check_domain(name, &domain)?;
        self.partitions = None;
        self.variables.push(Variable {
            name: name.to_string(),
            domain,
            base: None,
            classes: Vec::new(),
        });
        Ok(())
    }

    /// Set the nominal value; domain membership is checked by `validate`.
    pub fn set_base(&mut self, variable: &str, value: DomainValue) -> Result<(), ModelError> {
        let var = self.variable_mut(variable)?;
        var.base = Some(value);
        self.partitions = None;
        Ok(())
    }

    pub fn add_class(
        &mut self,
        variable: &str,
        predicate: Predicate,
        tag: ClassTag,
        boundaries: Vec<DomainValue>,
    ) -> Result<&mut Class, ModelError> {
        self.partitions = None;
        let var = self.variable_mut(variable)?;
        if let Some(bad) = boundaries.iter().find(|b| !var.domain.contains(b)) {
            return Err(ModelError::BoundaryOutOfDomain {
                variable: variable.to_string(),
                value: bad.clone(),
            });
        }
        let name = format!("{}#{}", var.name, var.classes.len());
        var.classes.push(Class {
            name,
            tag,
            predicate,
            boundaries,
            auto_boundaries: false,
        });
        let last = var.classes.len() - 1;
        Ok(&mut var.classes[last])
    }

    /// Check every variable's classes for coverage and disjointness.
    ///
    /// All violations are collected. On success the membership tables
    /// are cached and the model is marked validated.
    pub fn validate(&mut self) -> Result<(), Vec<ModelError>> {
        self.partitions = None;
        let mut errors = Vec::new();
        let mut partitions = Vec::with_capacity(self.variables.len());
        for var in &self.variables {
            if let Some(partition) = validate::check_variable(var, &mut errors) {
                partitions.push(partition);
            }
        }
        if errors.is_empty() {
            self.partitions = Some(partitions);
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn is_validated(&self) -> bool {
        self.partitions.is_some()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Membership tables, one per variable in declaration order.
    pub fn partitions(&self) -> Result<&[Partition], ModelError> {
        self.partitions
            .as_deref()
            .ok_or(ModelError::ModelNotValidated)
    }

    fn variable_mut(&mut self, name: &str) -> Result<&mut Variable, ModelError> {
        self.variables
            .iter_mut()
            .find(|v| v.name == name)
            .ok_or_else(|| ModelError::UnknownVariable {
                name: name.to_string(),
            })
    }
}

fn check_domain(name: &str, domain: &DomainType) -> Result<(), ModelError> {
    let invalid = |reason: &str| ModelError::InvalidDomain {
        variable: name.to_string(),
        reason: reason.to_string(),
    };
    match domain {
        DomainType::Int { min, max } if max < min => {
            return Err(invalid(&format!("empty range {min}..={max}")));
        }
        DomainType::Char { values } => {
            if values.is_empty() {
                return Err(invalid("empty character set"));
            }
            let mut seen = std::collections::HashSet::new();
            if let Some(dup) = values.iter().find(|c| !seen.insert(**c)) {
                return Err(invalid(&format!("duplicate character {dup:?}")));
            }
        }
        _ => {}
    }
    let size = domain.size();
    if size > MAX_DOMAIN_VALUES {
        return Err(ModelError::DomainTooLarge {
            variable: name.to_string(),
            size,
        });
    }
    Ok(())
}
