//! # Conflict Resolution
//!
//! The strategy abstraction. A [`ConflictResolution`] narrows a list of annotated
//! candidates for one field down to (ideally) a single agreed value. Strategies
//! compose: [`ResolutionExt::and_then`] feeds the partial results of one strategy
//! into the next, which also lets the value type change along the way
//! (`ConflictResolution<F, I>` followed by `ConflictResolution<I, F>`).

use crate::context::FusionContext;
use crate::error::ResolutionError;
use crate::model::{AnnotatedValue, FieldValue};
use crate::tag::ResolutionTag;
use std::marker::PhantomData;
use std::sync::Arc;

/// Result of a partial resolution
pub type Partial<R> = Result<Vec<AnnotatedValue<R>>, ResolutionError>;

/// A boxed, type-erased strategy
pub type BoxedResolution<T, R> = Box<dyn ConflictResolution<T, R>>;

/// Resolves candidate values of type `T` into at most one value of type `R`.
pub trait ConflictResolution<T: FieldValue, R: FieldValue>: Send + Sync {
    /// Narrow the candidates without forcing a single result.
    ///
    /// Strategies keep ties (all values that are equally good) so that a chained
    /// strategy can break them. An empty input yields an empty output.
    fn resolve_partially(&self, values: &[AnnotatedValue<T>], context: &mut FusionContext) -> Partial<R>;

    /// Resolve to a single value.
    ///
    /// No partial results means no value. Several partial results are accepted only
    /// when they all carry the same value; otherwise the resolution is
    /// [`ResolutionError::Unresolved`].
    fn resolve(
        &self,
        values: &[AnnotatedValue<T>],
        context: &mut FusionContext,
    ) -> Result<Option<R>, ResolutionError> {
        let mut resolved = self.resolve_partially(values, context)?;
        if resolved.len() <= 1 {
            return Ok(resolved.pop().map(|annotated| annotated.value));
        }
        let mut distinct: Vec<&R> = Vec::new();
        for annotated in &resolved {
            if !distinct.contains(&&annotated.value) {
                distinct.push(&annotated.value);
            }
        }
        if distinct.len() > 1 {
            return Err(ResolutionError::unresolved(distinct));
        }
        Ok(Some(resolved.swap_remove(0).value))
    }

    /// The tag under which this strategy records its choice, if it does
    fn resolution_tag(&self) -> Option<&ResolutionTag> {
        None
    }
}

/// Combinators available on every strategy
pub trait ResolutionExt<T: FieldValue, R: FieldValue>: ConflictResolution<T, R> + Sized {
    /// Feed the partial results of `self` into `next`
    fn and_then<J, S>(self, next: S) -> Sequence<Self, S, R>
    where
        J: FieldValue,
        S: ConflictResolution<R, J>,
    {
        Sequence {
            first: self,
            second: next,
            _intermediate: PhantomData,
        }
    }

    fn boxed(self) -> BoxedResolution<T, R>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<T: FieldValue, R: FieldValue, S: ConflictResolution<T, R>> ResolutionExt<T, R> for S {}

/// Two strategies run back to back
pub struct Sequence<A, B, I> {
    first: A,
    second: B,
    _intermediate: PhantomData<fn() -> I>,
}

impl<T, I, J, A, B> ConflictResolution<T, J> for Sequence<A, B, I>
where
    T: FieldValue,
    I: FieldValue,
    J: FieldValue,
    A: ConflictResolution<T, I>,
    B: ConflictResolution<I, J>,
{
    fn resolve_partially(&self, values: &[AnnotatedValue<T>], context: &mut FusionContext) -> Partial<J> {
        let intermediate = self.first.resolve_partially(values, context)?;
        self.second.resolve_partially(&intermediate, context)
    }
}

impl<T, R, S> ConflictResolution<T, R> for Box<S>
where
    T: FieldValue,
    R: FieldValue,
    S: ConflictResolution<T, R> + ?Sized,
{
    fn resolve_partially(&self, values: &[AnnotatedValue<T>], context: &mut FusionContext) -> Partial<R> {
        (**self).resolve_partially(values, context)
    }

    fn resolve(
        &self,
        values: &[AnnotatedValue<T>],
        context: &mut FusionContext,
    ) -> Result<Option<R>, ResolutionError> {
        (**self).resolve(values, context)
    }

    fn resolution_tag(&self) -> Option<&ResolutionTag> {
        (**self).resolution_tag()
    }
}

impl<T, R, S> ConflictResolution<T, R> for Arc<S>
where
    T: FieldValue,
    R: FieldValue,
    S: ConflictResolution<T, R> + ?Sized,
{
    fn resolve_partially(&self, values: &[AnnotatedValue<T>], context: &mut FusionContext) -> Partial<R> {
        (**self).resolve_partially(values, context)
    }

    fn resolve(
        &self,
        values: &[AnnotatedValue<T>],
        context: &mut FusionContext,
    ) -> Result<Option<R>, ResolutionError> {
        (**self).resolve(values, context)
    }

    fn resolution_tag(&self) -> Option<&ResolutionTag> {
        (**self).resolution_tag()
    }
}

/// A strategy backed by a closure
pub struct FnResolution<T, R, F> {
    f: F,
    _types: PhantomData<fn(T) -> R>,
}

/// Build a strategy from a closure returning partial results
pub fn from_fn<T, R, F>(f: F) -> FnResolution<T, R, F>
where
    T: FieldValue,
    R: FieldValue,
    F: Fn(&[AnnotatedValue<T>], &mut FusionContext) -> Partial<R> + Send + Sync,
{
    FnResolution {
        f,
        _types: PhantomData,
    }
}

impl<T, R, F> ConflictResolution<T, R> for FnResolution<T, R, F>
where
    T: FieldValue,
    R: FieldValue,
    F: Fn(&[AnnotatedValue<T>], &mut FusionContext) -> Partial<R> + Send + Sync,
{
    fn resolve_partially(&self, values: &[AnnotatedValue<T>], context: &mut FusionContext) -> Partial<R> {
        (self.f)(values, context)
    }
}
