//! # Fusion Context
//!
//! Per-merge accumulator of field-level failures and tagged decisions. A context is
//! created for one merge (one cluster) and inspected afterwards; it is not shared
//! between concurrently running merges.

use crate::error::{FusionError, ResolutionError};
use crate::model::{AnnotatedValue, Source};
use crate::tag::ResolutionTag;
use hashbrown::HashMap;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

#[derive(Debug, Default)]
pub struct FusionContext {
    errors: Vec<FusionError>,
    tags: HashMap<ResolutionTag, Vec<Source>>,
}

impl FusionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one field resolution in isolation.
    ///
    /// An `Err` or a panic inside `operation` is recorded as a [`FusionError`] naming
    /// `field` and the rendered `candidates`; the call then returns `None` so the
    /// caller can carry on with the next field.
    pub fn safe_execute<T, R, F>(
        &mut self,
        field: &str,
        candidates: &[AnnotatedValue<T>],
        operation: F,
    ) -> Option<R>
    where
        T: fmt::Debug,
        F: FnOnce(&mut Self) -> Result<Option<R>, ResolutionError>,
    {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| operation(&mut *self)))
            .unwrap_or_else(|payload| Err(ResolutionError::Panicked(panic_message(payload))));
        match outcome {
            Ok(value) => value,
            Err(cause) => {
                let conflicting_values: Vec<String> = candidates
                    .iter()
                    .map(|candidate| format!("{:?}", candidate.value))
                    .collect();
                let error = FusionError::new(field, conflicting_values, cause);
                debug!(field, error = %error, "field left unresolved");
                self.errors.push(error);
                None
            }
        }
    }

    /// Record the sources that supplied the winning value under `tag`
    pub fn store_tag(&mut self, tag: &ResolutionTag, sources: Vec<Source>) {
        self.tags.insert(tag.clone(), sources);
    }

    /// Sources recorded under `tag`, if the tagged resolution has run
    pub fn tag_sources(&self, tag: &ResolutionTag) -> Option<&[Source]> {
        self.tags.get(tag).map(Vec::as_slice)
    }

    /// Record a failure that did not go through [`safe_execute`](Self::safe_execute)
    pub fn record_error(&mut self, error: FusionError) {
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[FusionError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<FusionError> {
        self.errors
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
