#![allow(dead_code)]

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use time::{Date, Month, PrimitiveDateTime, Time};

use unifuse_rs::common::{assume_equal_value, latest, longest, max, min, union, vote};
use unifuse_rs::{
    merge, AnnotatedValue, Cluster, ConfigError, FieldTable, FieldValue, Fusable, Merge, SequentialIds, Source,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Gender {
    Male,
    Female,
}

impl FieldValue for Gender {}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<Date>,
    pub gender: Option<Gender>,
    // lineage
    pub source: Option<String>,
    pub original_id: Option<String>,
    pub last_modified: Option<PrimitiveDateTime>,
    // fusion information
    pub fused_ids: BTreeSet<String>,
}

impl FieldValue for Person {}

impl Fusable for Person {
    fn field_table() -> FieldTable<Self> {
        FieldTable::builder()
            .field("id", |p: &Person| p.id.clone(), |p: &mut Person, v| p.id = Some(v))
            .field(
                "first_name",
                |p: &Person| p.first_name.clone(),
                |p: &mut Person, v| p.first_name = Some(v),
            )
            .field(
                "last_name",
                |p: &Person| p.last_name.clone(),
                |p: &mut Person, v| p.last_name = Some(v),
            )
            .field("birth_date", |p: &Person| p.birth_date, |p: &mut Person, v| p.birth_date = Some(v))
            .field("gender", |p: &Person| p.gender, |p: &mut Person, v| p.gender = Some(v))
            .field("source", |p: &Person| p.source.clone(), |p: &mut Person, v| p.source = Some(v))
            .field(
                "original_id",
                |p: &Person| p.original_id.clone(),
                |p: &mut Person, v| p.original_id = Some(v),
            )
            .field(
                "last_modified",
                |p: &Person| p.last_modified,
                |p: &mut Person, v| p.last_modified = Some(v),
            )
            .field(
                "fused_ids",
                |p: &Person| Some(p.fused_ids.clone()),
                |p: &mut Person, v| p.fused_ids = v,
            )
            .build()
    }
}

/// Ids this record already stands for, including its own
pub fn fused_ids_with_id(person: &Person) -> Option<BTreeSet<String>> {
    let mut ids = person.fused_ids.clone();
    ids.extend(person.id.clone());
    Some(ids)
}

/// The reference person merge, declared by field name
pub fn person_merge() -> Result<Merge<Person>, ConfigError> {
    Ok(merge::<Person>()
        .field_by_name::<String>("id")?
        .with(min())
        .field_by_name::<String>("first_name")?
        .with(longest())
        .then(vote())
        .field_by_name::<String>("last_name")?
        .corresponding_to_previous()?
        .field_by_name::<Gender>("gender")?
        .with(assume_equal_value())
        .field_by_name::<Date>("birth_date")?
        .with(vote())
        .then(latest())
        .field_by_name::<PrimitiveDateTime>("last_modified")?
        .with(max())
        .field(fused_ids_with_id, |p: &mut Person, v| p.fused_ids = v)
        .with(union())
        .build())
}

const SOURCES: [&str; 5] = ["crm", "erp", "web", "mobile", "api"];
const FIRST_NAMES: [&str; 6] = ["Joanna", "John", "Jo", "Maria", "Marie", "Max"];
const LAST_NAMES: [&str; 4] = ["Doe", "Smith", "Miller", "Schmidt"];

pub fn source(name: &str) -> Source {
    let weight = SOURCES.iter().position(|s| *s == name).map_or(1.0, |i| (i + 1) as f32);
    Source::new(name, weight)
}

fn random_person(rng: &mut StdRng, index: u64, source_name: &str, gender: Gender) -> Person {
    let birth_date = Date::from_calendar_date(
        rng.random_range(1950..2005),
        Month::January.nth_next(rng.random_range(0..12)),
        rng.random_range(1..=28),
    )
    .expect("valid date");
    let last_modified = PrimitiveDateTime::new(
        Date::from_calendar_date(2024, Month::March, rng.random_range(1..=31)).expect("valid date"),
        Time::from_hms(rng.random_range(0..24), rng.random_range(0..60), 0).expect("valid time"),
    );
    let uid = format!("{}_{:06}", source_name, index);
    Person {
        id: Some(uid.clone()),
        first_name: Some(FIRST_NAMES[rng.random_range(0..FIRST_NAMES.len())].to_string()),
        last_name: Some(LAST_NAMES[rng.random_range(0..LAST_NAMES.len())].to_string()),
        birth_date: Some(birth_date),
        gender: Some(gender),
        source: Some(source_name.to_string()),
        original_id: Some(uid),
        last_modified: Some(last_modified),
        fused_ids: BTreeSet::new(),
    }
}

/// Generate `count` clusters of `size` records each.
///
/// Roughly one cluster in `conflict_every` carries a gender conflict and therefore
/// only fuses partially; zero disables conflicts.
pub fn generate_clusters(
    count: usize,
    size: usize,
    conflict_every: usize,
    seed: u64,
) -> Vec<Cluster<u64, AnnotatedValue<Person>>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut ids = SequentialIds::<u64>::default();
    let mut index = 0u64;
    let mut clusters = Vec::with_capacity(count);

    for _ in 0..count {
        let conflicting = conflict_every > 0 && rng.random_range(0..conflict_every) == 0;
        let gender = if rng.random_bool(0.5) { Gender::Female } else { Gender::Male };
        let mut cluster = Cluster::new(ids.allocate());
        for position in 0..size {
            index += 1;
            let source_name = SOURCES[rng.random_range(0..SOURCES.len())];
            let record_gender = match (conflicting, position % 2, gender) {
                (true, 1, Gender::Female) => Gender::Male,
                (true, 1, Gender::Male) => Gender::Female,
                _ => gender,
            };
            let person = random_person(&mut rng, index, source_name, record_gender);
            cluster.add(AnnotatedValue::sourced(
                person,
                source(source_name),
                rng.random_range(0..1_000_000),
            ));
        }
        clusters.push(cluster);
    }
    clusters
}
