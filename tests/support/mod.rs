use time::macros::{date, datetime};
use time::PrimitiveDateTime;

use unifuse_rs::{AnnotatedValue, Source};

use crate::test_support::{Gender, Person};

#[allow(dead_code)]
pub fn joanna() -> Person {
    Person {
        id: Some("id1".to_string()),
        first_name: Some("Joanna".to_string()),
        last_name: Some("Doe".to_string()),
        gender: Some(Gender::Female),
        birth_date: Some(date!(2017 - 12 - 31)),
        last_modified: Some(PrimitiveDateTime::MAX),
        ..Person::default()
    }
}

#[allow(dead_code)]
pub fn john() -> Person {
    Person {
        id: Some("id2".to_string()),
        first_name: Some("John".to_string()),
        last_name: Some("Smith".to_string()),
        gender: Some(Gender::Male),
        birth_date: Some(date!(2018 - 01 - 01)),
        last_modified: Some(PrimitiveDateTime::MIN),
        ..Person::default()
    }
}

/// Joanna from source1 and John from source2, both stamped at the same instant
#[allow(dead_code)]
pub fn scenario_values() -> Vec<AnnotatedValue<Person>> {
    let timestamp = datetime!(2019-01-01 0:00 UTC);
    vec![
        AnnotatedValue::at_utc(joanna(), Source::new("source1", 1.0), timestamp),
        AnnotatedValue::at_utc(john(), Source::new("source2", 2.0), timestamp),
    ]
}

#[allow(dead_code)]
pub fn expected_fusion() -> Person {
    Person {
        id: Some("id1".to_string()),
        first_name: Some("Joanna".to_string()),
        last_name: Some("Doe".to_string()),
        gender: None,
        birth_date: Some(date!(2018 - 01 - 01)),
        last_modified: Some(PrimitiveDateTime::MAX),
        fused_ids: ["id1", "id2"].into_iter().map(String::from).collect(),
        ..Person::default()
    }
}
