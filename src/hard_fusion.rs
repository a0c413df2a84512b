//! # Hard Fusion
//!
//! When automatic fusion leaves fields unresolved, the partially fused record is
//! handed to a [`HardFusionHandler`], which may accept a replacement (possibly after
//! manual or domain-specific repair) or decline.

use crate::error::FusionError;
use crate::model::AnnotatedValue;

/// A fused record with the inputs it came from and the failures it carries
#[derive(Debug)]
pub struct FusedValue<R> {
    pub value: R,
    pub originals: Vec<AnnotatedValue<R>>,
    pub errors: Vec<FusionError>,
}

impl<R> FusedValue<R> {
    pub fn new(value: R, originals: Vec<AnnotatedValue<R>>, errors: Vec<FusionError>) -> Self {
        Self {
            value,
            originals,
            errors,
        }
    }

    /// True if every field was resolved without failure
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Names of the fields that could not be resolved
    pub fn unresolved_fields(&self) -> Vec<&str> {
        self.errors.iter().map(|error| error.field.as_str()).collect()
    }
}

/// Decides what happens to a partially fused record
pub trait HardFusionHandler<R>: Send + Sync {
    /// Return the accepted record, or `None` to leave the cluster unfused
    fn handle_partially_fused_value(&self, partially_fused: FusedValue<R>) -> Option<FusedValue<R>>;
}

impl<R, F> HardFusionHandler<R> for F
where
    F: Fn(FusedValue<R>) -> Option<FusedValue<R>> + Send + Sync,
{
    fn handle_partially_fused_value(&self, partially_fused: FusedValue<R>) -> Option<FusedValue<R>> {
        self(partially_fused)
    }
}

/// Declines every partially fused record
#[derive(Debug, Clone, Copy, Default)]
pub struct DontFuse;

impl<R> HardFusionHandler<R> for DontFuse {
    fn handle_partially_fused_value(&self, _partially_fused: FusedValue<R>) -> Option<FusedValue<R>> {
        None
    }
}

/// Accepts partially fused records as they are, unresolved fields included
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptPartial;

impl<R> HardFusionHandler<R> for AcceptPartial {
    fn handle_partially_fused_value(&self, partially_fused: FusedValue<R>) -> Option<FusedValue<R>> {
        Some(partially_fused)
    }
}
