//! # Unifuse
//!
//! Composable conflict resolution and record fusion for entity resolution pipelines.
//!
//! Upstream matching groups records describing the same real-world entity into
//! clusters. This library fuses each cluster into a single record, field by field,
//! with declarative resolution strategies. Fields that cannot be resolved are
//! recorded instead of aborting the merge, and partially fused records are handed
//! to a [`HardFusionHandler`] for a final decision.

pub mod accessor;
pub mod cluster;
pub mod common;
pub mod config;
pub mod context;
pub mod error;
pub mod hard_fusion;
pub mod merge;
pub mod model;
pub mod resolution;
pub mod tag;

// Re-export main types for convenience
pub use accessor::{FieldAccessor, FieldTable, Fusable};
pub use cluster::{Cluster, ClusterIdGenerator, SequentialIds};
pub use config::{ConfigLoadError, ConfigOverrides, FusionConfig};
pub use context::FusionContext;
pub use error::{ConfigError, FusionError, ResolutionError};
pub use hard_fusion::{AcceptPartial, DontFuse, FusedValue, HardFusionHandler};
pub use merge::{merge, merge_with, Merge, MergeBuilder};
pub use model::{AnnotatedValue, FieldValue, Instant, Provenance, Source};
pub use resolution::{from_fn, BoxedResolution, ConflictResolution, ResolutionExt};
pub use tag::{ResolutionTag, TagGenerator};

use anyhow::Context as _;
use rayon::prelude::*;
use std::fmt;
use tracing::{debug, instrument, warn};

/// Result of fusing one group of records
#[derive(Debug)]
pub struct FusionOutcome<R> {
    /// The fused record; `None` only when there was nothing to fuse
    pub value: Option<R>,
    /// Fields that could not be resolved
    pub errors: Vec<FusionError>,
}

impl<R> FusionOutcome<R> {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Main API for record fusion
pub struct Unifuse<R> {
    merge: Merge<R>,
    handler: Box<dyn HardFusionHandler<R>>,
    config: FusionConfig,
    pool: Option<rayon::ThreadPool>,
}

impl<R: FieldValue> Unifuse<R> {
    /// Create an engine that declines partially fused records
    pub fn new(merge: Merge<R>) -> Self {
        Self {
            merge,
            handler: Box::new(DontFuse),
            config: FusionConfig::default(),
            pool: None,
        }
    }

    pub fn with_hard_fusion_handler(mut self, handler: impl HardFusionHandler<R> + 'static) -> Self {
        self.handler = Box::new(handler);
        self
    }

    /// Apply batch settings, building the dedicated pool when `batch.threads > 0`.
    ///
    /// The `tags` section is not read here: tags are generated while the merge is
    /// built, so pass [`FusionConfig::tag_generator`] to the builder instead.
    pub fn with_config(mut self, config: FusionConfig) -> anyhow::Result<Self> {
        self.pool = match config.batch.threads {
            0 => None,
            threads => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .context("failed to build fusion thread pool")?,
            ),
        };
        self.config = config;
        Ok(self)
    }

    pub fn merge(&self) -> &Merge<R> {
        &self.merge
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Size of the dedicated pool, if batches do not use the global one
    pub fn pool_threads(&self) -> Option<usize> {
        self.pool.as_ref().map(rayon::ThreadPool::current_num_threads)
    }

    /// Fuse `values` with a fresh context.
    ///
    /// Never fails: unresolved fields are reported in the outcome and keep whatever
    /// the record constructor put there.
    pub fn fuse(&self, values: &[AnnotatedValue<R>]) -> FusionOutcome<R> {
        let mut context = FusionContext::new();
        let value = context.safe_execute(self.merge.record(), values, |context| {
            self.merge.resolve(values, context)
        });
        FusionOutcome {
            value,
            errors: context.into_errors(),
        }
    }

    /// Fuse one cluster.
    ///
    /// A cleanly fused cluster is returned as is; a partially fused one goes to the
    /// hard fusion handler. Empty clusters yield `None`.
    pub fn fuse_cluster<C: fmt::Debug>(&self, cluster: &Cluster<C, AnnotatedValue<R>>) -> Option<FusedValue<R>> {
        let outcome = self.fuse(&cluster.elements);
        let Some(value) = outcome.value else {
            debug!(cluster = ?cluster.id, errors = outcome.errors.len(), "nothing fused");
            return None;
        };
        let fused = FusedValue::new(value, cluster.elements.clone(), outcome.errors);
        if fused.is_clean() {
            return Some(fused);
        }
        warn!(
            cluster = ?cluster.id,
            unresolved = ?fused.unresolved_fields(),
            "cluster only partially fused"
        );
        self.handler.handle_partially_fused_value(fused)
    }

    /// Fuse independent clusters, in parallel for large batches.
    ///
    /// Results are in input order. Each cluster gets its own context.
    #[instrument(skip_all, fields(clusters = clusters.len()), level = "debug")]
    pub fn fuse_clusters<C>(&self, clusters: &[Cluster<C, AnnotatedValue<R>>]) -> Vec<Option<FusedValue<R>>>
    where
        C: fmt::Debug + Sync,
    {
        if clusters.len() < self.config.batch.min_parallel_clusters {
            debug!("fusing sequentially");
            return clusters.iter().map(|cluster| self.fuse_cluster(cluster)).collect();
        }

        let fuse_all = || {
            clusters
                .par_iter()
                .map(|cluster| self.fuse_cluster(cluster))
                .collect::<Vec<_>>()
        };
        match &self.pool {
            Some(pool) => {
                debug!(threads = pool.current_num_threads(), "fusing on dedicated pool");
                pool.install(fuse_all)
            }
            None => fuse_all(),
        }
    }
}

impl<R> fmt::Debug for Unifuse<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unifuse")
            .field("merge", &self.merge)
            .field("config", &self.config)
            .finish()
    }
}
