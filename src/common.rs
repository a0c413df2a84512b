//! # Common Conflict Resolutions
//!
//! A small library of reusable strategies. Most keep every candidate that is
//! equally good, so strategies can be chained: `longest().and_then(vote())` picks
//! the most frequent among the longest values. `latest`, `earliest` and `first`
//! always settle on one candidate and make good final links in a chain.

use crate::context::FusionContext;
use crate::error::ResolutionError;
use crate::model::{AnnotatedValue, FieldValue, Instant, Source};
use crate::resolution::{ConflictResolution, Partial};
use crate::tag::ResolutionTag;
use hashbrown::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;

/// Keep every candidate whose key equals the best key under `better`
fn retain_best<T, K, F, B>(values: &[AnnotatedValue<T>], key: F, better: B) -> Vec<AnnotatedValue<T>>
where
    T: Clone,
    K: PartialEq,
    F: Fn(&AnnotatedValue<T>) -> K,
    B: Fn(&K, &K) -> bool,
{
    let mut best: Option<K> = None;
    let mut kept = Vec::new();
    for annotated in values {
        let candidate = key(annotated);
        if let Some(current) = &best {
            if better(current, &candidate) {
                continue;
            }
            if *current == candidate {
                kept.push(annotated.clone());
                continue;
            }
        }
        best = Some(candidate);
        kept.clear();
        kept.push(annotated.clone());
    }
    kept
}

macro_rules! marker_strategy {
    ($(#[$meta:meta])* $name:ident, $ctor:ident) => {
        $(#[$meta])*
        pub struct $name<T>(PhantomData<fn() -> T>);

        $(#[$meta])*
        pub fn $ctor<T>() -> $name<T> {
            $name(PhantomData)
        }
    };
}

marker_strategy!(
    /// Smallest value
    Min, min
);
marker_strategy!(
    /// Largest value
    Max, max
);
marker_strategy!(
    /// Value with the most characters
    Longest, longest
);
marker_strategy!(
    /// Value with the fewest characters
    Shortest, shortest
);
marker_strategy!(
    /// Most frequent value
    Vote, vote
);
marker_strategy!(
    /// Most recently timestamped value
    Latest, latest
);
marker_strategy!(
    /// Least recently timestamped value
    Earliest, earliest
);
marker_strategy!(
    /// The single value all candidates agree on
    AssumeEqualValue, assume_equal_value
);
marker_strategy!(
    /// Union of all collection-valued candidates
    Union, union
);
marker_strategy!(
    /// The first candidate
    First, first
);
marker_strategy!(
    /// Values from the most trusted source
    PreferSource, prefer_source
);

impl<T: FieldValue + Ord> ConflictResolution<T, T> for Min<T> {
    fn resolve_partially(&self, values: &[AnnotatedValue<T>], _: &mut FusionContext) -> Partial<T> {
        Ok(retain_best(values, |a| a.value.clone(), |best, c| best < c))
    }
}

impl<T: FieldValue + Ord> ConflictResolution<T, T> for Max<T> {
    fn resolve_partially(&self, values: &[AnnotatedValue<T>], _: &mut FusionContext) -> Partial<T> {
        Ok(retain_best(values, |a| a.value.clone(), |best, c| best > c))
    }
}

impl<T: FieldValue + AsRef<str>> ConflictResolution<T, T> for Longest<T> {
    fn resolve_partially(&self, values: &[AnnotatedValue<T>], _: &mut FusionContext) -> Partial<T> {
        Ok(retain_best(values, |a| a.value.as_ref().chars().count(), |best, c| best > c))
    }
}

impl<T: FieldValue + AsRef<str>> ConflictResolution<T, T> for Shortest<T> {
    fn resolve_partially(&self, values: &[AnnotatedValue<T>], _: &mut FusionContext) -> Partial<T> {
        Ok(retain_best(values, |a| a.value.as_ref().chars().count(), |best, c| best < c))
    }
}

impl<T: FieldValue + Eq + Hash> ConflictResolution<T, T> for Vote<T> {
    fn resolve_partially(&self, values: &[AnnotatedValue<T>], _: &mut FusionContext) -> Partial<T> {
        let mut counts: HashMap<&T, usize> = HashMap::new();
        for annotated in values {
            *counts.entry(&annotated.value).or_insert(0) += 1;
        }
        let Some(top) = counts.values().copied().max() else {
            return Ok(Vec::new());
        };
        Ok(values
            .iter()
            .filter(|a| counts.get(&a.value).copied() == Some(top))
            .cloned()
            .collect())
    }
}

// Calculated values have no timestamp and rank below every sourced value.
fn timestamp_key<T>(annotated: &AnnotatedValue<T>) -> Option<Instant> {
    annotated.timestamp()
}

// Among equally recent values the last one wins.
impl<T: FieldValue> ConflictResolution<T, T> for Latest<T> {
    fn resolve_partially(&self, values: &[AnnotatedValue<T>], _: &mut FusionContext) -> Partial<T> {
        Ok(values.iter().max_by_key(|a| timestamp_key(a)).cloned().into_iter().collect())
    }
}

// Among equally old values the first one wins.
impl<T: FieldValue> ConflictResolution<T, T> for Earliest<T> {
    fn resolve_partially(&self, values: &[AnnotatedValue<T>], _: &mut FusionContext) -> Partial<T> {
        let sourced: Vec<AnnotatedValue<T>> = values.iter().filter(|a| !a.is_calculated()).cloned().collect();
        let pool = if sourced.is_empty() { values } else { &sourced[..] };
        Ok(pool.iter().min_by_key(|a| timestamp_key(a)).cloned().into_iter().collect())
    }
}

impl<T: FieldValue> ConflictResolution<T, T> for AssumeEqualValue<T> {
    fn resolve_partially(&self, values: &[AnnotatedValue<T>], _: &mut FusionContext) -> Partial<T> {
        let Some(first) = values.first() else {
            return Ok(Vec::new());
        };
        if values.iter().all(|a| a.value == first.value) {
            return Ok(vec![first.clone()]);
        }
        let mut distinct: Vec<&T> = Vec::new();
        for annotated in values {
            if !distinct.contains(&&annotated.value) {
                distinct.push(&annotated.value);
            }
        }
        Err(ResolutionError::unresolved(distinct))
    }
}

impl<C> ConflictResolution<C, C> for Union<C>
where
    C: FieldValue + Default + Extend<<C as IntoIterator>::Item> + IntoIterator,
{
    fn resolve_partially(&self, values: &[AnnotatedValue<C>], _: &mut FusionContext) -> Partial<C> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let mut merged = C::default();
        for annotated in values {
            merged.extend(annotated.value.clone());
        }
        Ok(vec![AnnotatedValue::calculated(merged)])
    }
}

impl<T: FieldValue> ConflictResolution<T, T> for First<T> {
    fn resolve_partially(&self, values: &[AnnotatedValue<T>], _: &mut FusionContext) -> Partial<T> {
        Ok(values.first().cloned().into_iter().collect())
    }
}

impl<T: FieldValue> ConflictResolution<T, T> for PreferSource<T> {
    fn resolve_partially(&self, values: &[AnnotatedValue<T>], _: &mut FusionContext) -> Partial<T> {
        let weight = |a: &AnnotatedValue<T>| a.source().map(|s| s.weight);
        Ok(retain_best(values, weight, |best, c| match (best, c) {
            (Some(best), Some(c)) => best > c,
            (Some(_), None) => true,
            _ => false,
        }))
    }
}

/// Value-level conversion that keeps each candidate's provenance
pub struct Transform<T, R, F> {
    f: F,
    _types: PhantomData<fn(T) -> R>,
}

/// Convert every candidate with `f`, e.g. a date into a sortable day number
pub fn transform<T, R, F>(f: F) -> Transform<T, R, F>
where
    F: Fn(&T) -> R + Send + Sync,
{
    Transform {
        f,
        _types: PhantomData,
    }
}

impl<T, R, F> ConflictResolution<T, R> for Transform<T, R, F>
where
    T: FieldValue,
    R: FieldValue,
    F: Fn(&T) -> R + Send + Sync,
{
    fn resolve_partially(&self, values: &[AnnotatedValue<T>], _: &mut FusionContext) -> Partial<R> {
        Ok(values.iter().map(|a| a.with_value((self.f)(&a.value))).collect())
    }
}

/// Decorator that records which sources supplied the winning values
pub struct TaggedResolution<S> {
    inner: S,
    tag: ResolutionTag,
}

impl<S> TaggedResolution<S> {
    pub fn tag(&self) -> &ResolutionTag {
        &self.tag
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

/// Run `resolution` and save the sources of its partial results under `tag`
pub fn save_as<S>(resolution: S, tag: ResolutionTag) -> TaggedResolution<S> {
    TaggedResolution { inner: resolution, tag }
}

impl<T, R, S> ConflictResolution<T, R> for TaggedResolution<S>
where
    T: FieldValue,
    R: FieldValue,
    S: ConflictResolution<T, R>,
{
    fn resolve_partially(&self, values: &[AnnotatedValue<T>], context: &mut FusionContext) -> Partial<R> {
        let resolved = self.inner.resolve_partially(values, context)?;
        let mut sources: Vec<Source> = Vec::new();
        for source in resolved.iter().filter_map(AnnotatedValue::source) {
            if !sources.contains(source) {
                sources.push(source.clone());
            }
        }
        context.store_tag(&self.tag, sources);
        Ok(resolved)
    }

    fn resolution_tag(&self) -> Option<&ResolutionTag> {
        Some(&self.tag)
    }
}

/// Selects the candidates that come from the sources saved under a tag
pub struct Corresponding<T> {
    tag: ResolutionTag,
    _type: PhantomData<fn() -> T>,
}

/// Take this field's values from whichever sources won the tagged resolution.
///
/// If the tagged resolution never ran (for example, its field had no candidates)
/// nothing is selected.
pub fn corresponding<T>(tag: ResolutionTag) -> Corresponding<T> {
    Corresponding {
        tag,
        _type: PhantomData,
    }
}

impl<T: FieldValue> ConflictResolution<T, T> for Corresponding<T> {
    fn resolve_partially(&self, values: &[AnnotatedValue<T>], context: &mut FusionContext) -> Partial<T> {
        let Some(sources) = context.tag_sources(&self.tag) else {
            return Ok(Vec::new());
        };
        Ok(values
            .iter()
            .filter(|a| a.source().is_some_and(|s| sources.contains(s)))
            .cloned()
            .collect())
    }
}
