use eqclass_ir::types::{DomainType, DomainValue, Predicate};

#[test]
fn test_domain_value_untagged_forms() {
    let values: Vec<DomainValue> =
        serde_json::from_value(serde_json::json!([true, 12, "q"])).unwrap();
    assert_eq!(
        values,
        vec![
            DomainValue::Bool(true),
            DomainValue::Int(12),
            DomainValue::Char('q')
        ]
    );
}

#[test]
fn test_domain_size() {
    assert_eq!(DomainType::Int { min: 0, max: 49 }.size(), 50);
    assert_eq!(DomainType::Int { min: 5, max: 4 }.size(), 0);
    assert_eq!(DomainType::Bool.size(), 2);
    assert_eq!(
        DomainType::Char {
            values: vec!['a', 'b']
        }
        .size(),
        2
    );
    assert_eq!(
        DomainType::Int {
            min: i64::MIN,
            max: i64::MAX
        }
        .size(),
        u64::MAX
    );
}

#[test]
fn test_domain_contains() {
    let int = DomainType::Int { min: 0, max: 9 };
    assert!(int.contains(&DomainValue::Int(0)));
    assert!(int.contains(&DomainValue::Int(9)));
    assert!(!int.contains(&DomainValue::Int(10)));
    assert!(!int.contains(&DomainValue::Bool(true)));

    let chars = DomainType::Char {
        values: vec!['a', 'b'],
    };
    assert!(chars.contains(&DomainValue::Char('b')));
    assert!(!chars.contains(&DomainValue::Char('c')));
}

#[test]
fn test_domain_values_order() {
    assert_eq!(
        DomainType::Bool.values(),
        vec![DomainValue::Bool(false), DomainValue::Bool(true)]
    );
    assert_eq!(
        DomainType::Int { min: -1, max: 1 }.values(),
        vec![DomainValue::Int(-1), DomainValue::Int(0), DomainValue::Int(1)]
    );
}

#[test]
fn test_predicate_tagging() {
    let json = serde_json::json!({ "kind": "range", "min": 20, "max": 39 });
    let predicate: Predicate = serde_json::from_value(json).unwrap();
    assert_eq!(predicate, Predicate::Range { min: 20, max: 39 });

    let json = serde_json::json!({ "kind": "one_of", "values": ["a", "b"] });
    let predicate: Predicate = serde_json::from_value(json).unwrap();
    assert_eq!(
        predicate,
        Predicate::OneOf {
            values: vec![DomainValue::Char('a'), DomainValue::Char('b')]
        }
    );
}

#[test]
fn test_display_values() {
    assert_eq!(DomainValue::Int(-3).to_string(), "-3");
    assert_eq!(DomainValue::Char('x').to_string(), "x");
    assert_eq!(DomainValue::Bool(false).to_string(), "false");
}
