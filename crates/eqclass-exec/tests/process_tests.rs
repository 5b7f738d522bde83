#![cfg(unix)]

use std::time::{Duration, Instant};

use eqclass_exec::config::{ExecConfig, InputMode};
use eqclass_exec::implementation::Implementation;
use eqclass_exec::process::{ExecError, ProcessImplementation};
use eqclass_exec::result::ExecStatus;
use eqclass_explore::case::{Assignment, CaseKind, InputCase};
use eqclass_ir::types::{ClassTag, DomainValue};

fn case(values: &[(&str, DomainValue)]) -> InputCase {
    InputCase {
        id: 0,
        focus: None,
        kind: CaseKind::Interior,
        assignments: values
            .iter()
            .map(|(name, value)| Assignment {
                variable: name.to_string(),
                value: value.clone(),
                class: format!("{name}#0"),
                tag: ClassTag::Valid,
            })
            .collect(),
    }
}

fn sh(script: &str) -> ProcessImplementation {
    ProcessImplementation::new("sh", vec!["-c".to_string(), script.to_string()])
}

const TIMEOUT: Duration = Duration::from_secs(10);

#[test]
fn test_values_fed_on_stdin() {
    let imp = sh("read a; read b; read c; echo \"$a|$b|$c\"");
    let input = case(&[
        ("x", DomainValue::Int(5)),
        ("y", DomainValue::Int(46)),
        ("c", DomainValue::Char('q')),
    ]);
    let result = imp.execute(&input, TIMEOUT);
    assert_eq!(result.status, ExecStatus::Completed);
    assert_eq!(result.output, "5|46|q\n");
    assert_eq!(result.exit_code, Some(0));
    assert_eq!(result.detail, None);
}

#[test]
fn test_values_fed_as_args() {
    let imp = ProcessImplementation::new(
        "sh",
        vec!["-c".to_string(), "echo \"$1-$2\"".to_string(), "sh".to_string()],
    )
    .with_config(ExecConfig {
        input: InputMode::Args,
        ..ExecConfig::default()
    });
    let input = case(&[("x", DomainValue::Int(3)), ("flag", DomainValue::Bool(true))]);
    let result = imp.execute(&input, TIMEOUT);
    assert_eq!(result.output, "3-true\n");
}

#[test]
fn test_nonzero_exit_is_observable() {
    let result = sh("echo out; exit 3").execute(&case(&[]), TIMEOUT);
    assert_eq!(result.status, ExecStatus::Completed);
    assert_eq!(result.exit_code, Some(3));
    assert_eq!(result.output, "out\n");
}

#[test]
fn test_stderr_reported_in_detail() {
    let result = sh("echo oops >&2").execute(&case(&[]), TIMEOUT);
    assert_eq!(result.status, ExecStatus::Completed);
    assert_eq!(result.output, "");
    assert_eq!(result.detail.as_deref(), Some("stderr: oops"));
}

#[test]
fn test_spawn_failure_is_crash() {
    let imp = ProcessImplementation::new("/nonexistent/eqclass-candidate", vec![]);
    let result = imp.execute(&case(&[]), TIMEOUT);
    assert_eq!(result.status, ExecStatus::Crashed);
    assert!(result.detail.unwrap().contains("failed to spawn"));
}

#[test]
fn test_signal_death_is_crash() {
    let result = sh("kill -9 $$").execute(&case(&[]), TIMEOUT);
    assert_eq!(result.status, ExecStatus::Crashed);
    assert!(result.detail.unwrap().contains("signal 9"));
}

#[test]
fn test_timeout_kills_child() {
    let imp = ProcessImplementation::new("sleep", vec!["10".to_string()]);
    let start = Instant::now();
    let result = imp.execute(&case(&[]), Duration::from_millis(200));
    assert_eq!(result.status, ExecStatus::TimedOut);
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_partial_output_discarded_on_timeout() {
    let result = sh("echo partial; sleep 10").execute(&case(&[]), Duration::from_millis(300));
    assert_eq!(result.status, ExecStatus::TimedOut);
    assert!(result.output.is_empty());
    assert_eq!(result.exit_code, None);
}

#[test]
fn test_output_truncated_at_cap() {
    let imp = sh("i=0; while [ $i -lt 200 ]; do echo 0123456789; i=$((i+1)); done").with_config(
        ExecConfig {
            max_output_bytes: 100,
            ..ExecConfig::default()
        },
    );
    let result = imp.execute(&case(&[]), TIMEOUT);
    assert_eq!(result.status, ExecStatus::Completed);
    assert_eq!(result.output.len(), 100);
    assert!(result.detail.unwrap().contains("truncated"));
}

#[test]
fn test_command_line_split() {
    let imp = ProcessImplementation::from_command_line("  sh   -c  true ").unwrap();
    assert_eq!(imp.name(), "sh -c true");
    let result = imp.execute(&case(&[]), TIMEOUT);
    assert_eq!(result.exit_code, Some(0));

    assert!(matches!(
        ProcessImplementation::from_command_line("   "),
        Err(ExecError::EmptyCommand)
    ));
}

#[test]
fn test_custom_name() {
    let imp = sh("true").with_name("reference");
    assert_eq!(imp.name(), "reference");
}
