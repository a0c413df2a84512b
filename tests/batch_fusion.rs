#[path = "../src/test_support.rs"]
mod test_support;

mod support;

use std::io::Write;

use support::{expected_fusion, scenario_values};
use test_support::{generate_clusters, person_merge, Gender, Person};
use unifuse_rs::common::{longest, min};
use unifuse_rs::config::{BatchOverrides, ConfigOverrides};
use unifuse_rs::{merge, AcceptPartial, Cluster, FusedValue, FusionConfig, Unifuse};

fn config(threads: usize, min_parallel_clusters: usize) -> FusionConfig {
    let overrides = ConfigOverrides {
        batch: Some(BatchOverrides {
            threads: Some(threads),
            min_parallel_clusters: Some(min_parallel_clusters),
        }),
        tags: None,
    };
    FusionConfig::load(None, overrides).unwrap()
}

fn summary(results: &[Option<FusedValue<Person>>]) -> Vec<Option<(Person, usize)>> {
    results
        .iter()
        .map(|fused| fused.as_ref().map(|f| (f.value.clone(), f.errors.len())))
        .collect()
}

#[test]
fn test_parallel_matches_sequential() -> anyhow::Result<()> {
    let clusters = generate_clusters(300, 3, 4, 42);
    let sequential = Unifuse::new(person_merge()?)
        .with_hard_fusion_handler(AcceptPartial)
        .with_config(config(0, usize::MAX))?
        .fuse_clusters(&clusters);
    let global_pool = Unifuse::new(person_merge()?)
        .with_hard_fusion_handler(AcceptPartial)
        .with_config(config(0, 1))?
        .fuse_clusters(&clusters);
    let dedicated_pool = Unifuse::new(person_merge()?)
        .with_hard_fusion_handler(AcceptPartial)
        .with_config(config(2, 1))?
        .fuse_clusters(&clusters);

    assert_eq!(sequential.len(), clusters.len());
    assert!(sequential.iter().all(Option::is_some));
    assert_eq!(summary(&sequential), summary(&global_pool));
    assert_eq!(summary(&sequential), summary(&dedicated_pool));
    Ok(())
}

#[test]
fn test_results_keep_input_order() -> anyhow::Result<()> {
    let clusters = generate_clusters(128, 2, 0, 7);
    let engine = Unifuse::new(person_merge()?)
        .with_hard_fusion_handler(AcceptPartial)
        .with_config(config(0, 1))?;
    let results = engine.fuse_clusters(&clusters);

    for (cluster, fused) in clusters.iter().zip(&results) {
        let fused = fused.as_ref().unwrap();
        assert_eq!(fused.originals, cluster.elements);
        let expected_ids: Vec<String> = cluster.iter().filter_map(|a| a.value.id.clone()).collect();
        assert!(expected_ids.iter().all(|id| fused.value.fused_ids.contains(id)));
    }
    Ok(())
}

#[test]
fn test_conflicting_clusters_are_declined_by_default() -> anyhow::Result<()> {
    let clusters = generate_clusters(50, 2, 1, 3);
    let results = Unifuse::new(person_merge()?).fuse_clusters(&clusters);
    assert!(results.iter().all(Option::is_none));
    Ok(())
}

#[test]
fn test_hard_fusion_handler_repairs_gender() -> anyhow::Result<()> {
    let cluster = Cluster::with_elements(1u64, scenario_values());
    let engine = Unifuse::new(person_merge()?).with_hard_fusion_handler(|mut fused: FusedValue<Person>| {
        if fused.unresolved_fields() != ["gender"] {
            return None;
        }
        fused.value.gender = Some(Gender::Female);
        fused.errors.clear();
        Some(fused)
    });

    let fused = engine.fuse_cluster(&cluster).unwrap();
    assert!(fused.is_clean());
    assert_eq!(
        fused.value,
        Person {
            gender: Some(Gender::Female),
            ..expected_fusion()
        }
    );
    Ok(())
}

#[test]
fn test_fuse_reports_errors_without_handler() -> anyhow::Result<()> {
    let engine = Unifuse::new(person_merge()?);
    let outcome = engine.fuse(&scenario_values());
    assert_eq!(outcome.value, Some(expected_fusion()));
    assert_eq!(outcome.errors.len(), 1);
    assert!(!outcome.is_clean());

    let empty: Vec<Cluster<u64, _>> = vec![Cluster::new(9)];
    assert_eq!(summary(&engine.fuse_clusters(&empty)), vec![None]);
    Ok(())
}

#[test]
fn test_configured_tag_prefix() -> anyhow::Result<()> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    writeln!(file, "[tags]\nprefix = \"person\"\n\n[batch]\nmin_parallel_clusters = 8")?;
    let config = FusionConfig::from_env(Some(file.path()))?;
    assert_eq!(config.batch.min_parallel_clusters, 8);

    let merge = merge::<Person>()
        .with_tag_generator(config.tag_generator())
        .field_by_name::<String>("id")?
        .with(min())
        .field_by_name::<String>("first_name")?
        .with(longest())
        .field_by_name::<String>("last_name")?
        .corresponding_to_previous()?
        .build();
    assert_eq!(merge.field_tag("first_name").map(|t| t.name.as_str()), Some("person-0"));
    assert_eq!(merge.field_tag("id"), None);

    let engine = Unifuse::new(merge).with_config(config)?;
    let fused = engine.fuse_cluster(&Cluster::with_elements(1u64, scenario_values())).unwrap();
    assert_eq!(fused.value.last_name.as_deref(), Some("Doe"));
    Ok(())
}

#[test]
fn test_dedicated_pool_is_built_once() -> anyhow::Result<()> {
    let clusters = generate_clusters(40, 2, 0, 11);
    let engine = Unifuse::new(person_merge()?)
        .with_hard_fusion_handler(AcceptPartial)
        .with_config(config(3, 1))?;
    assert_eq!(engine.pool_threads(), Some(3));

    let first = engine.fuse_clusters(&clusters);
    let second = engine.fuse_clusters(&clusters);
    assert_eq!(summary(&first), summary(&second));
    assert_eq!(engine.pool_threads(), Some(3));

    let global = Unifuse::new(person_merge()?).with_config(config(0, 1))?;
    assert_eq!(global.pool_threads(), None);
    Ok(())
}
