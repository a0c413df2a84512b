//! # Resolution Tags
//!
//! Tags correlate decisions across fields: a tagged resolution records which sources
//! supplied its winning value, and a later field can pick its own value from the same
//! sources instead of resolving independently.

use crate::config::DEFAULT_TAG_PREFIX;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlation handle, equal by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResolutionTag {
    pub name: String,
}

impl ResolutionTag {
    /// Create a tag. Uniqueness of manually named tags is up to the caller.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for ResolutionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.name)
    }
}

/// Generates tags that are unique for the lifetime of the generator.
///
/// Each merge builder owns one, so generated names are deterministic: the n-th
/// synthesized tag of a builder is always `<prefix>-<n>`.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    prefix: String,
    next: u32,
}

impl TagGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }

    /// Produce the next tag
    pub fn next_tag(&mut self) -> ResolutionTag {
        let tag = ResolutionTag::new(format!("{}-{}", self.prefix, self.next));
        self.next += 1;
        tag
    }

    /// Number of tags generated so far
    pub fn generated(&self) -> u32 {
        self.next
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_PREFIX)
    }
}
