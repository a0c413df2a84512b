//! # Data Model
//!
//! Core data structures for record fusion: sources, provenance, and annotated values.
//! Every candidate value that enters a conflict resolution carries the source system
//! it came from and the UTC instant at which it became effective.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use time::OffsetDateTime;

/// A temporal instant as UTC epoch seconds
pub type Instant = i64;

/// An upstream source system that supplied a record.
///
/// Sources are identified by name; the weight expresses how much the source is
/// trusted relative to others and is only consulted by source-preference strategies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Unique name of the source system (e.g., "crm", "erp")
    pub name: String,
    /// Relative trust in this source
    pub weight: f32,
}

impl Source {
    /// Create a new source
    pub fn new(name: impl Into<String>, weight: f32) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

impl PartialEq for Source {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Source {}

impl Hash for Source {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Where an annotated value came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Provenance {
    /// Supplied by an upstream source at a specific instant
    Sourced { source: Source, timestamp: Instant },
    /// Computed by a resolution; not attributable to a single input
    Calculated,
}

impl Provenance {
    pub fn is_calculated(&self) -> bool {
        matches!(self, Self::Calculated)
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sourced { source, timestamp } => write!(f, "{}@{}", source, timestamp),
            Self::Calculated => write!(f, "calculated"),
        }
    }
}

/// A value paired with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedValue<T> {
    /// The candidate value
    pub value: T,
    /// Source and timestamp of the value
    pub provenance: Provenance,
}

impl<T> AnnotatedValue<T> {
    /// Create a value supplied by `source` at `timestamp`
    pub fn sourced(value: T, source: Source, timestamp: Instant) -> Self {
        Self {
            value,
            provenance: Provenance::Sourced { source, timestamp },
        }
    }

    /// Create a sourced value from a UTC date-time
    pub fn at_utc(value: T, source: Source, timestamp: OffsetDateTime) -> Self {
        Self::sourced(value, source, timestamp.unix_timestamp())
    }

    /// Create a derived value produced by a resolution
    pub fn calculated(value: T) -> Self {
        Self {
            value,
            provenance: Provenance::Calculated,
        }
    }

    /// Replace the value while keeping the provenance
    pub fn with_value<U>(&self, value: U) -> AnnotatedValue<U> {
        AnnotatedValue {
            value,
            provenance: self.provenance.clone(),
        }
    }

    /// Convert the value in place, keeping the provenance
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AnnotatedValue<U> {
        AnnotatedValue {
            value: f(self.value),
            provenance: self.provenance,
        }
    }

    /// The originating source, if the value is not calculated
    pub fn source(&self) -> Option<&Source> {
        match &self.provenance {
            Provenance::Sourced { source, .. } => Some(source),
            Provenance::Calculated => None,
        }
    }

    /// The effective timestamp, if the value is not calculated
    pub fn timestamp(&self) -> Option<Instant> {
        match &self.provenance {
            Provenance::Sourced { timestamp, .. } => Some(*timestamp),
            Provenance::Calculated => None,
        }
    }

    pub fn is_calculated(&self) -> bool {
        self.provenance.is_calculated()
    }
}

/// A value that can take part in conflict resolution.
///
/// `is_absent` is the value-level emptiness predicate used to discard projections
/// before a field is resolved: empty strings, empty collections and `None` never
/// compete with real values.
pub trait FieldValue: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    fn is_absent(&self) -> bool {
        false
    }
}

macro_rules! present_field_values {
    ($($ty:ty),* $(,)?) => {
        $(impl FieldValue for $ty {})*
    };
}

present_field_values!(
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    time::Date,
    time::Time,
    time::PrimitiveDateTime,
    time::OffsetDateTime,
    Source,
);

impl FieldValue for String {
    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

impl FieldValue for &'static str {
    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn is_absent(&self) -> bool {
        self.as_ref().map_or(true, FieldValue::is_absent)
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

impl<T: FieldValue> FieldValue for VecDeque<T> {
    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

impl<T: FieldValue + Ord> FieldValue for BTreeSet<T> {
    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

impl<T: FieldValue + Eq + Hash> FieldValue for HashSet<T> {
    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

impl<K: FieldValue + Ord, V: FieldValue> FieldValue for BTreeMap<K, V> {
    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

impl<K: FieldValue + Eq + Hash, V: FieldValue> FieldValue for HashMap<K, V> {
    fn is_absent(&self) -> bool {
        self.is_empty()
    }
}

impl<A: FieldValue, B: FieldValue> FieldValue for (A, B) {}

impl<A: FieldValue, B: FieldValue, C: FieldValue> FieldValue for (A, B, C) {}
