//! Deterministic case generation over a validated partition model.
//!
//! Per variable, representatives are listed in class order: the class's
//! boundary points first (deduplicated across the variable), then one
//! interior value, the middle member that is not a boundary point.
//!
//! Cases follow each-choice coverage anchored on a base choice: every
//! variable has a base value, and each representative of each variable is
//! tested with all other variables held at their bases. A boundary of one
//! variable is therefore always exercised against nominal values of the
//! others, and the case count stays linear in the number of representatives.

use std::collections::HashSet;

use eqclass_ir::types::{ClassTag, DomainValue};
use eqclass_model::model::{ModelError, Partition, PartitionModel};

use crate::case::{Assignment, CaseKind, InputCase};

/// A candidate value for one variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Representative {
    pub value: DomainValue,
    /// Index of the class owning `value`.
    pub class: usize,
    pub kind: CaseKind,
}

pub struct CaseGenerator<'m> {
    model: &'m PartitionModel,
    partitions: &'m [Partition],
    representatives: Vec<Vec<Representative>>,
    base: Vec<DomainValue>,
}

impl<'m> CaseGenerator<'m> {
    /// Fails with `ModelNotValidated` unless `validate` succeeded on the
    /// model as it currently stands.
    pub fn new(model: &'m PartitionModel) -> Result<Self, ModelError> {
        let partitions = model.partitions()?;
        let mut representatives = Vec::with_capacity(partitions.len());
        let mut base = Vec::with_capacity(partitions.len());

        for (var, partition) in model.variables().iter().zip(partitions) {
            let reps = variable_representatives(partition);
            let chosen = match &var.base {
                Some(value) => value.clone(),
                None => {
                    let anchor = var
                        .classes
                        .iter()
                        .position(|c| c.tag == ClassTag::Valid)
                        .unwrap_or(0);
                    nominal_value(partition, anchor)
                }
            };
            representatives.push(reps);
            base.push(chosen);
        }

        Ok(Self {
            model,
            partitions,
            representatives,
            base,
        })
    }

    pub fn model(&self) -> &'m PartitionModel {
        self.model
    }

    /// Representatives of the variable at `index`, in emission order.
    pub fn representatives(&self, index: usize) -> &[Representative] {
        &self.representatives[index]
    }

    /// Base value of every variable, in declaration order.
    pub fn base(&self) -> &[DomainValue] {
        &self.base
    }

    /// A fresh pass over the cases. Each call restarts from the first case.
    pub fn iter(&self) -> Cases<'_, 'm> {
        Cases {
            generator: self,
            variable: 0,
            rep: 0,
            next_id: 0,
            seen: HashSet::new(),
        }
    }

    pub fn cases(&self) -> Vec<InputCase> {
        self.iter().collect()
    }

    /// Build a case from a full tuple, tagging each value with its owning class.
    pub fn make_case(
        &self,
        id: usize,
        focus: Option<&str>,
        kind: CaseKind,
        values: &[DomainValue],
    ) -> InputCase {
        let assignments = self
            .model
            .variables()
            .iter()
            .zip(self.partitions)
            .zip(values)
            .map(|((var, partition), value)| {
                // Every tuple value comes from the variable's domain.
                let class = &var.classes[partition.class_of(value).unwrap_or(0)];
                Assignment {
                    variable: var.name.clone(),
                    value: value.clone(),
                    class: class.name.clone(),
                    tag: class.tag,
                }
            })
            .collect();
        InputCase {
            id,
            focus: focus.map(str::to_string),
            kind,
            assignments,
        }
    }
}

impl<'a, 'm> IntoIterator for &'a CaseGenerator<'m> {
    type Item = InputCase;
    type IntoIter = Cases<'a, 'm>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy case sequence; identical tuples are yielded once, first wins.
pub struct Cases<'a, 'm> {
    generator: &'a CaseGenerator<'m>,
    variable: usize,
    rep: usize,
    next_id: usize,
    seen: HashSet<Vec<DomainValue>>,
}

impl Iterator for Cases<'_, '_> {
    type Item = InputCase;

    fn next(&mut self) -> Option<InputCase> {
        let generator = self.generator;
        while self.variable < generator.representatives.len() {
            let reps = &generator.representatives[self.variable];
            if self.rep >= reps.len() {
                self.variable += 1;
                self.rep = 0;
                continue;
            }
            let rep = &reps[self.rep];
            self.rep += 1;

            let mut tuple = generator.base.clone();
            tuple[self.variable] = rep.value.clone();
            if !self.seen.insert(tuple.clone()) {
                continue;
            }

            let focus = &generator.model.variables()[self.variable].name;
            let case = generator.make_case(self.next_id, Some(focus.as_str()), rep.kind, &tuple);
            self.next_id += 1;
            return Some(case);
        }
        None
    }
}

fn variable_representatives(partition: &Partition) -> Vec<Representative> {
    let classes = partition.class_count();
    let boundary_set: HashSet<&DomainValue> = (0..classes)
        .flat_map(|c| partition.boundaries(c).iter())
        .collect();

    let mut reps = Vec::new();
    let mut emitted = HashSet::new();
    for class in 0..classes {
        for point in partition.boundaries(class) {
            if emitted.insert(point.clone()) {
                reps.push(Representative {
                    value: point.clone(),
                    class: partition.class_of(point).unwrap_or(class),
                    kind: CaseKind::Boundary,
                });
            }
        }
        if let Some(value) = interior_value(partition, class, &boundary_set) {
            if emitted.insert(value.clone()) {
                reps.push(Representative {
                    value,
                    class,
                    kind: CaseKind::Interior,
                });
            }
        }
    }
    reps
}

/// Middle member of the class that is not a boundary point of the variable.
fn interior_value(
    partition: &Partition,
    class: usize,
    boundary_set: &HashSet<&DomainValue>,
) -> Option<DomainValue> {
    let inner: Vec<&DomainValue> = partition
        .members(class)
        .iter()
        .filter(|v| !boundary_set.contains(v))
        .collect();
    inner.get(inner.len() / 2).map(|v| (*v).clone())
}

/// Interior value of the class, or its middle member when all members are
/// boundary points.
fn nominal_value(partition: &Partition, class: usize) -> DomainValue {
    let boundary_set: HashSet<&DomainValue> = (0..partition.class_count())
        .flat_map(|c| partition.boundaries(c).iter())
        .collect();
    interior_value(partition, class, &boundary_set).unwrap_or_else(|| {
        let members = partition.members(class);
        members[members.len() / 2].clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqclass_ir::types::{DomainType, Predicate};

    fn ints(v: &[i64]) -> Vec<DomainValue> {
        v.iter().copied().map(DomainValue::Int).collect()
    }

    #[test]
    fn test_single_class_yields_one_representative() {
        let mut model = PartitionModel::new();
        model
            .add_variable("n", DomainType::Int { min: 0, max: 9 })
            .unwrap();
        model
            .add_class("n", Predicate::Range { min: 0, max: 9 }, ClassTag::Valid, vec![])
            .unwrap();
        model.validate().unwrap();

        let generator = CaseGenerator::new(&model).unwrap();
        assert_eq!(
            generator.representatives(0),
            &[Representative {
                value: DomainValue::Int(5),
                class: 0,
                kind: CaseKind::Interior,
            }]
        );
        assert_eq!(generator.cases().len(), 1);
    }

    #[test]
    fn test_single_class_with_boundaries() {
        let mut model = PartitionModel::new();
        model
            .add_variable("n", DomainType::Int { min: 0, max: 9 })
            .unwrap();
        model
            .add_class(
                "n",
                Predicate::Range { min: 0, max: 9 },
                ClassTag::Valid,
                ints(&[0, 9]),
            )
            .unwrap();
        model.validate().unwrap();

        let generator = CaseGenerator::new(&model).unwrap();
        let values: Vec<DomainValue> = generator
            .representatives(0)
            .iter()
            .map(|r| r.value.clone())
            .collect();
        assert_eq!(values, ints(&[0, 9, 5]));
    }

    #[test]
    fn test_all_boundary_class_has_no_extra_interior() {
        let mut model = PartitionModel::new();
        model
            .add_variable("n", DomainType::Int { min: 0, max: 4 })
            .unwrap();
        model
            .add_class("n", Predicate::Range { min: 0, max: 1 }, ClassTag::Invalid, vec![])
            .unwrap();
        model
            .add_class(
                "n",
                Predicate::Range { min: 2, max: 4 },
                ClassTag::Valid,
                ints(&[0, 1, 2]),
            )
            .unwrap();
        model.validate().unwrap();

        let generator = CaseGenerator::new(&model).unwrap();
        let reps = generator.representatives(0);
        let values: Vec<DomainValue> = reps.iter().map(|r| r.value.clone()).collect();
        assert_eq!(values, ints(&[0, 1, 2, 4]));
        assert_eq!(reps[0].class, 0);
        assert_eq!(reps[1].class, 0);
        assert!(reps
            .iter()
            .all(|r| r.class != 0 || r.kind == CaseKind::Boundary));
    }
}
