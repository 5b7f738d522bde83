use std::collections::{BTreeMap, HashSet};

use eqclass_ir::types::DomainValue;

use crate::eval::eval_predicate;
use crate::model::{ModelError, Partition, Variable};

/// Validate one variable, pushing every violation into `errors`.
///
/// Returns the membership table when the variable is clean.
pub(crate) fn check_variable(var: &Variable, errors: &mut Vec<ModelError>) -> Option<Partition> {
    let before = errors.len();

    if var.classes.is_empty() {
        errors.push(ModelError::NoClasses {
            variable: var.name.clone(),
        });
        return None;
    }
    if let Some(base) = &var.base {
        if !var.domain.contains(base) {
            errors.push(ModelError::InvalidBase {
                variable: var.name.clone(),
                value: base.clone(),
            });
        }
    }

    let domain = var.domain.values();
    let matches = class_matches(var, &domain, errors)?;

    check_gaps(var, &domain, &matches, errors);
    check_overlaps(var, &domain, &matches, errors);

    let mut members = vec![Vec::new(); var.classes.len()];
    let mut owners = vec![0usize; domain.len()];
    for (i, owning) in matches.iter().enumerate() {
        if let [only] = owning.as_slice() {
            members[*only].push(domain[i].clone());
            owners[i] = *only;
        }
    }
    for (idx, class) in var.classes.iter().enumerate() {
        if !matches.iter().any(|owning| owning.contains(&idx)) {
            errors.push(ModelError::EmptyClass {
                variable: var.name.clone(),
                class: class.name.clone(),
            });
        }
    }

    if errors.len() > before {
        return None;
    }

    let boundaries = var
        .classes
        .iter()
        .enumerate()
        .map(|(idx, class)| {
            let mut points = Vec::new();
            let mut seen = HashSet::new();
            let derived = if class.auto_boundaries {
                run_boundaries(&domain, &owners, idx)
            } else {
                Vec::new()
            };
            for point in class.boundaries.iter().chain(derived.iter()) {
                if seen.insert(point.clone()) {
                    points.push(point.clone());
                }
            }
            points
        })
        .collect();

    let owner = domain.into_iter().zip(owners).collect::<BTreeMap<_, _>>();
    Some(Partition {
        owner,
        members,
        boundaries,
    })
}

/// For each domain value, the indices of the classes whose predicate holds.
fn class_matches(
    var: &Variable,
    domain: &[DomainValue],
    errors: &mut Vec<ModelError>,
) -> Option<Vec<Vec<usize>>> {
    let mut matches = vec![Vec::new(); domain.len()];
    let mut failed = false;
    for (idx, class) in var.classes.iter().enumerate() {
        for (i, value) in domain.iter().enumerate() {
            match eval_predicate(&class.predicate, value) {
                Ok(true) => matches[i].push(idx),
                Ok(false) => {}
                Err(source) => {
                    errors.push(ModelError::Predicate {
                        variable: var.name.clone(),
                        class: class.name.clone(),
                        source,
                    });
                    failed = true;
                    break;
                }
            }
        }
    }
    if failed {
        None
    } else {
        Some(matches)
    }
}

fn check_gaps(
    var: &Variable,
    domain: &[DomainValue],
    matches: &[Vec<usize>],
    errors: &mut Vec<ModelError>,
) {
    let uncovered: Vec<DomainValue> = matches
        .iter()
        .zip(domain)
        .filter(|(owning, _)| owning.is_empty())
        .map(|(_, value)| value.clone())
        .collect();
    if !uncovered.is_empty() {
        errors.push(ModelError::PartitionGap {
            variable: var.name.clone(),
            values: uncovered,
        });
    }
}

/// One error per overlapping class pair, listing the shared values.
fn check_overlaps(
    var: &Variable,
    domain: &[DomainValue],
    matches: &[Vec<usize>],
    errors: &mut Vec<ModelError>,
) {
    let mut shared: BTreeMap<(usize, usize), Vec<DomainValue>> = BTreeMap::new();
    for (owning, value) in matches.iter().zip(domain) {
        for (n, first) in owning.iter().enumerate() {
            for second in &owning[n + 1..] {
                shared
                    .entry((*first, *second))
                    .or_default()
                    .push(value.clone());
            }
        }
    }
    for ((first, second), values) in shared {
        errors.push(ModelError::PartitionOverlap {
            variable: var.name.clone(),
            first: var.classes[first].name.clone(),
            second: var.classes[second].name.clone(),
            values,
        });
    }
}

/// `before, first, last, after` for each maximal run of consecutive
/// domain positions owned by `class`.
fn run_boundaries(domain: &[DomainValue], owners: &[usize], class: usize) -> Vec<DomainValue> {
    let mut points = Vec::new();
    let mut i = 0;
    while i < owners.len() {
        if owners[i] != class {
            i += 1;
            continue;
        }
        let start = i;
        while i + 1 < owners.len() && owners[i + 1] == class {
            i += 1;
        }
        let end = i;
        if start > 0 {
            points.push(domain[start - 1].clone());
        }
        points.push(domain[start].clone());
        points.push(domain[end].clone());
        if end + 1 < domain.len() {
            points.push(domain[end + 1].clone());
        }
        i += 1;
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(v: &[i64]) -> Vec<DomainValue> {
        v.iter().copied().map(DomainValue::Int).collect()
    }

    #[test]
    fn test_run_boundaries_single_run() {
        let domain = ints(&[0, 1, 2, 3, 4, 5]);
        let owners = vec![0, 0, 1, 1, 1, 0];
        assert_eq!(run_boundaries(&domain, &owners, 1), ints(&[1, 2, 4, 5]));
    }

    #[test]
    fn test_run_boundaries_clipped_at_domain_edges() {
        let domain = ints(&[0, 1, 2, 3, 4, 5]);
        let owners = vec![0, 0, 1, 1, 1, 0];
        assert_eq!(
            run_boundaries(&domain, &owners, 0),
            ints(&[0, 1, 2, 4, 5, 5])
        );
    }
}
