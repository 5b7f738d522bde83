use std::time::{Duration, Instant};

use eqclass_core::error::HarnessError;
use eqclass_core::limits::RunLimits;
use eqclass_core::pipeline::{build_cases, validated_model};
use eqclass_explore::sampler::RandomSampler;
use eqclass_ir::parse::parse_config;

const INSIDE_OUTSIDE: &str = include_str!("../../eqclass-ir/tests/fixtures/inside_outside.json");

#[test]
fn test_build_cases_with_samples() {
    let model = validated_model(&parse_config(INSIDE_OUTSIDE).unwrap()).unwrap();
    let cases = build_cases(&model, Some(&RandomSampler::new(3, 4)), &RunLimits::default()).unwrap();
    assert!(cases.len() > 13 && cases.len() <= 17);
}

#[test]
fn test_oversized_sample_rejected_before_drawing() {
    let model = validated_model(&parse_config(INSIDE_OUTSIDE).unwrap()).unwrap();
    let start = Instant::now();
    let err = build_cases(
        &model,
        Some(&RandomSampler::new(42, 3_000_000)),
        &RunLimits::default(),
    )
    .unwrap_err();
    assert!(matches!(err, HarnessError::LimitExceeded(_)));
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_sample_count_at_custom_limit() {
    let model = validated_model(&parse_config(INSIDE_OUTSIDE).unwrap()).unwrap();
    let limits = RunLimits {
        max_cases: 10,
        ..RunLimits::default()
    };
    let err = build_cases(&model, Some(&RandomSampler::new(42, 11)), &limits).unwrap_err();
    assert!(matches!(err, HarnessError::LimitExceeded(_)));
    // Deterministic cases alone already exceed the cap.
    assert!(matches!(
        build_cases(&model, None, &limits),
        Err(HarnessError::LimitExceeded(_))
    ));
}
