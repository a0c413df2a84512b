#[path = "../src/test_support.rs"]
mod test_support;

mod support;

use std::collections::BTreeSet;

use support::{expected_fusion, scenario_values};
use test_support::{fused_ids_with_id, person_merge, Gender, Person};
use time::{Date, PrimitiveDateTime};
use unifuse_rs::common::{assume_equal_value, latest, longest, max, min, union, vote};
use unifuse_rs::{
    merge, merge_with, ConfigError, ConflictResolution, FieldTable, Fusable, FusionContext, Merge, ResolutionError,
};

fn assert_scenario(merge: &Merge<Person>) {
    let mut context = FusionContext::new();
    let resolved = merge.resolve(&scenario_values(), &mut context).unwrap();
    assert_eq!(resolved, Some(expected_fusion()));

    let errors = context.errors();
    assert_eq!(errors.len(), 1);
    let message = errors[0].to_string();
    assert!(message.contains("Could not fully resolve"), "{message}");
    assert!(message.contains("Female"), "{message}");
    assert!(message.contains("Male"), "{message}");
    assert!(matches!(errors[0].cause, ResolutionError::Unresolved { .. }));
    assert_eq!(errors[0].field, "gender");
}

#[test]
fn test_fusion_by_getter_and_setter() {
    let merge = merge_with(Person::default)
        .field(|p: &Person| p.id.clone(), |p: &mut Person, v| p.id = Some(v))
        .with(min())
        .field(|p: &Person| p.first_name.clone(), |p: &mut Person, v| p.first_name = Some(v))
        .with(longest())
        .then(vote())
        .field(|p: &Person| p.last_name.clone(), |p: &mut Person, v| p.last_name = Some(v))
        .corresponding_to_previous()
        .unwrap()
        .field(|p: &Person| p.gender, |p: &mut Person, v| p.gender = Some(v))
        .with(assume_equal_value())
        .field(|p: &Person| p.birth_date, |p: &mut Person, v| p.birth_date = Some(v))
        .with(vote())
        .then(latest())
        .field(|p: &Person| p.last_modified, |p: &mut Person, v| p.last_modified = Some(v))
        .with(max())
        .field(fused_ids_with_id, |p: &mut Person, v| p.fused_ids = v)
        .with(union())
        .build();

    let mut context = FusionContext::new();
    let resolved = merge.resolve(&scenario_values(), &mut context).unwrap();
    assert_eq!(resolved, Some(expected_fusion()));
    assert_eq!(context.errors().len(), 1);
    assert!(context.errors()[0].field.starts_with("field #"));
}

#[test]
fn test_fusion_by_name() {
    let merge = person_merge().unwrap();
    assert_eq!(
        merge.field_names(),
        vec!["id", "first_name", "last_name", "gender", "birth_date", "last_modified", "field #6"]
    );
    assert!(merge.field_tag("first_name").is_some());
    assert_scenario(&merge);
}

#[test]
fn test_fusion_by_reused_accessors() -> anyhow::Result<()> {
    let table = Person::field_table();
    let id = table.lookup::<String>("id")?;
    let first_name = table.lookup::<String>("first_name")?;
    let last_name = table.lookup::<String>("last_name")?;
    let gender = table.lookup::<Gender>("gender")?;
    let birth_date = table.lookup::<Date>("birth_date")?;
    let last_modified = table.lookup::<PrimitiveDateTime>("last_modified")?;

    let merge = merge::<Person>()
        .field_accessor(id)
        .with(min())
        .field_accessor(first_name)
        .with(longest())
        .then(vote())
        .field_accessor(last_name)
        .corresponding_to_previous()?
        .field_accessor(gender)
        .with(assume_equal_value())
        .field_accessor(birth_date)
        .with(vote())
        .then(latest())
        .field_accessor(last_modified)
        .with(max())
        .field(fused_ids_with_id, |p: &mut Person, v| p.fused_ids = v)
        .with(union())
        .build();

    assert_scenario(&merge);
    Ok(())
}

#[test]
fn test_merge_is_reusable() {
    let merge = person_merge().unwrap();
    for _ in 0..3 {
        assert_scenario(&merge);
    }
}

#[test]
fn test_fused_ids_accumulate() {
    let merge = person_merge().unwrap();
    let mut context = FusionContext::new();
    let mut values = scenario_values();
    values[1].value.fused_ids = BTreeSet::from(["id7".to_string()]);
    let fused = merge.resolve(&values, &mut context).unwrap().unwrap();
    assert_eq!(
        fused.fused_ids,
        BTreeSet::from(["id1".to_string(), "id2".to_string(), "id7".to_string()])
    );
}

#[test]
fn test_wrong_name_is_config_error() {
    let Err(err) = merge::<Person>().field_by_name::<String>("i") else {
        panic!("expected lookup to fail");
    };
    assert_eq!(
        err,
        ConfigError::UnknownField {
            record: "Person",
            field: "i".to_string()
        }
    );
    assert!(err.to_string().contains("`i`"));
}

#[test]
fn test_wrong_nested_name_is_config_error() {
    let result = merge::<Person>()
        .field_by_name::<String>("id")
        .unwrap()
        .with(min())
        .field_by_name::<String>("fistName");
    let Err(err) = result else {
        panic!("expected lookup to fail");
    };
    assert!(err.to_string().contains("fistName"));
}

#[test]
fn test_wrong_type_is_config_error() {
    let Err(err) = merge::<Person>().field_by_name::<u32>("birth_date") else {
        panic!("expected lookup to fail");
    };
    assert!(matches!(err, ConfigError::FieldTypeMismatch { .. }));
}

#[derive(Debug, Default)]
struct PersonWithoutGetter {
    id: Option<String>,
}

impl Fusable for PersonWithoutGetter {
    fn field_table() -> FieldTable<Self> {
        FieldTable::builder()
            .setter("id", |p: &mut PersonWithoutGetter, v: String| p.id = Some(v))
            .build()
    }
}

#[derive(Debug, Default)]
struct PersonWithoutSetter {
    id: Option<String>,
}

impl Fusable for PersonWithoutSetter {
    fn field_table() -> FieldTable<Self> {
        FieldTable::builder()
            .getter("id", |p: &PersonWithoutSetter| p.id.clone())
            .build()
    }
}

#[test]
fn test_missing_getter_is_config_error() {
    let Err(err) = merge::<PersonWithoutGetter>().field_by_name::<String>("id") else {
        panic!("expected lookup to fail");
    };
    assert_eq!(
        err,
        ConfigError::MissingGetter {
            record: "PersonWithoutGetter",
            field: "id".to_string()
        }
    );
    assert!(err.to_string().contains("getter not found"));
}

#[test]
fn test_missing_setter_is_config_error() {
    let Err(err) = merge::<PersonWithoutSetter>().field_by_name::<String>("id") else {
        panic!("expected lookup to fail");
    };
    assert_eq!(
        err,
        ConfigError::MissingSetter {
            record: "PersonWithoutSetter",
            field: "id".to_string()
        }
    );
    assert!(err.to_string().contains("setter not found"));
}

#[test]
fn test_name_lookup_without_table_is_config_error() {
    let Err(err) = merge_with(Person::default).field_by_name::<String>("id") else {
        panic!("expected lookup to fail");
    };
    assert_eq!(err, ConfigError::NoAccessorTable { record: "Person" });
}
