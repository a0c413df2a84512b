//! Default constants for unifuse configuration.
//!
//! All magic numbers are centralized here with documentation.

// =============================================================================
// Tag Defaults
// =============================================================================

/// Prefix of tags generated for anonymous `save_as` correlations.
/// Generated tags read `<prefix>-<n>` with `n` counting from zero per builder.
pub const DEFAULT_TAG_PREFIX: &str = "tag";

// =============================================================================
// Batch Fusion Defaults
// =============================================================================

/// Worker threads for batch fusion. Zero uses the global rayon pool.
pub const DEFAULT_BATCH_THREADS: usize = 0;

/// Batches smaller than this are fused on the calling thread.
/// Spawning work for a handful of clusters costs more than fusing them.
pub const DEFAULT_MIN_PARALLEL_CLUSTERS: usize = 64;

// =============================================================================
// Environment
// =============================================================================

/// Prefix of environment variables read by [`super::FusionConfig::load`].
/// Nested keys are separated by a double underscore, e.g. `UNIFUSE_BATCH__THREADS`.
pub const ENV_PREFIX: &str = "UNIFUSE_";

/// Separator between nested keys in environment variable names
pub const ENV_SPLIT: &str = "__";
