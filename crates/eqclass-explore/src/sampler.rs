use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use eqclass_ir::types::DomainValue;

use crate::case::{CaseKind, InputCase};
use crate::generator::CaseGenerator;

pub const DEFAULT_SEED: u64 = 42;

/// Seeded uniform sampling of whole tuples, layered after the
/// deterministic cases. Same seed, same samples.
#[derive(Debug, Clone, Copy)]
pub struct RandomSampler {
    pub seed: u64,
    pub count: usize,
}

impl RandomSampler {
    pub fn new(seed: u64, count: usize) -> Self {
        Self { seed, count }
    }

    /// Draw `count` tuples and append the ones not already in `cases`.
    /// Appended cases continue the id sequence and carry kind `sampled`.
    pub fn extend(&self, generator: &CaseGenerator<'_>, cases: &mut Vec<InputCase>) {
        let domains: Vec<Vec<DomainValue>> = generator
            .model()
            .variables()
            .iter()
            .map(|v| v.domain.values())
            .collect();
        let mut seen: HashSet<Vec<DomainValue>> = cases.iter().map(InputCase::values).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        for _ in 0..self.count {
            let tuple: Vec<DomainValue> = domains
                .iter()
                .map(|values| values[rng.gen_range(0..values.len())].clone())
                .collect();
            if !seen.insert(tuple.clone()) {
                continue;
            }
            let id = cases.len();
            cases.push(generator.make_case(id, None, CaseKind::Sampled, &tuple));
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new(DEFAULT_SEED, 0)
    }
}

/// Deterministic cases, followed by seeded samples when `sampler` is set.
pub fn generate_cases(generator: &CaseGenerator<'_>, sampler: Option<&RandomSampler>) -> Vec<InputCase> {
    let mut cases = generator.cases();
    if let Some(sampler) = sampler {
        sampler.extend(generator, &mut cases);
    }
    cases
}
