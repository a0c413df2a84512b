//! # Merge
//!
//! Field-by-field fusion of a cluster of records into one record, plus the builder
//! DSL that assembles a merge:
//!
//! ```text
//! merge_with(Person::default)
//!     .field(getter, setter).with(min())                      // MergeBuilder -> FieldMergeBuilder
//!     .field_by_name("first_name")?.with(longest()).then(vote())
//!     .field_by_name("last_name")?.corresponding_to_previous()?
//!     .field_by_name("birth_date")?
//!         .converting_with(transform(to_day)).then(max()).converting_back(transform(from_day))
//!     .build()
//! ```
//!
//! Fields are resolved in declaration order. The most recently finished field is
//! held in a pending slot until the next field finishes (or `build()` is called),
//! which is where a later `corresponding_to_previous()` attaches its tag.

use crate::accessor::{record_name, FieldAccessor, FieldTable, Fusable};
use crate::common::{corresponding, save_as};
use crate::context::FusionContext;
use crate::error::ConfigError;
use crate::model::{AnnotatedValue, FieldValue};
use crate::resolution::{BoxedResolution, ConflictResolution, Partial, ResolutionExt};
use crate::tag::{ResolutionTag, TagGenerator};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Creates an empty target record
pub type Constructor<R> = Arc<dyn Fn() -> R + Send + Sync>;

/// Start a merge for a record type that declares its fields
pub fn merge<R: Fusable>() -> MergeBuilder<R> {
    MergeBuilder::new(R::default).with_field_table(R::field_table())
}

/// Start a merge from an explicit constructor
pub fn merge_with<R: 'static>(ctor: impl Fn() -> R + Send + Sync + 'static) -> MergeBuilder<R> {
    MergeBuilder::new(ctor)
}

/// One field's part of a merge, with the field type erased
trait FieldMergeOp<R>: Send + Sync {
    fn name(&self) -> &str;

    fn merge_into(&self, target: &mut R, values: &[AnnotatedValue<R>], context: &mut FusionContext);

    fn resolution_tag(&self) -> Option<&ResolutionTag>;

    /// Decorate the resolution so it saves its choice under `tag`
    fn tagged(self: Box<Self>, tag: ResolutionTag) -> Box<dyn FieldMergeOp<R>>;
}

struct FieldMerge<R, F> {
    accessor: FieldAccessor<R, F>,
    resolution: BoxedResolution<F, F>,
}

impl<R: 'static, F: FieldValue> FieldMergeOp<R> for FieldMerge<R, F> {
    fn name(&self) -> &str {
        self.accessor.name()
    }

    fn merge_into(&self, target: &mut R, values: &[AnnotatedValue<R>], context: &mut FusionContext) {
        let candidates: Vec<AnnotatedValue<F>> = values
            .iter()
            .filter_map(|annotated| {
                self.accessor
                    .get(&annotated.value)
                    .map(|field| annotated.with_value(field))
            })
            .filter(|annotated| !annotated.value.is_absent())
            .collect();
        trace!(field = self.accessor.name(), candidates = candidates.len(), "resolving field");

        // Setters run user code too, so they share the failure isolation.
        context.safe_execute(self.accessor.name(), &candidates, |context| {
            if let Some(value) = self.resolution.resolve(&candidates, context)? {
                self.accessor.set(target, value);
            }
            Ok(Some(()))
        });
    }

    fn resolution_tag(&self) -> Option<&ResolutionTag> {
        self.resolution.resolution_tag()
    }

    fn tagged(self: Box<Self>, tag: ResolutionTag) -> Box<dyn FieldMergeOp<R>> {
        let FieldMerge { accessor, resolution } = *self;
        Box::new(FieldMerge {
            accessor,
            resolution: Box::new(save_as(resolution, tag)),
        })
    }
}

/// An immutable, reusable merge of records of type `R`
pub struct Merge<R> {
    record: &'static str,
    ctor: Constructor<R>,
    field_merges: Arc<[Box<dyn FieldMergeOp<R>>]>,
}

impl<R> Merge<R> {
    /// Short type name of the merged record
    pub fn record(&self) -> &'static str {
        self.record
    }

    /// Names of the merged fields, in resolution order
    pub fn field_names(&self) -> Vec<&str> {
        self.field_merges.iter().map(|field| field.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.field_merges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field_merges.is_empty()
    }

    /// Tag attached to a field's resolution, if any
    pub fn field_tag(&self, name: &str) -> Option<&ResolutionTag> {
        self.field_merges
            .iter()
            .find(|field| field.name() == name)
            .and_then(|field| field.resolution_tag())
    }
}

impl<R> Clone for Merge<R> {
    fn clone(&self) -> Self {
        Self {
            record: self.record,
            ctor: Arc::clone(&self.ctor),
            field_merges: Arc::clone(&self.field_merges),
        }
    }
}

impl<R> fmt::Debug for Merge<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Merge")
            .field("record", &self.record)
            .field("fields", &self.field_names())
            .finish()
    }
}

impl<R: FieldValue> ConflictResolution<R, R> for Merge<R> {
    fn resolve_partially(&self, values: &[AnnotatedValue<R>], context: &mut FusionContext) -> Partial<R> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let mut target = (self.ctor)();
        for field_merge in self.field_merges.iter() {
            field_merge.merge_into(&mut target, values, context);
        }
        Ok(vec![AnnotatedValue::calculated(target)])
    }
}

/// Entry state of the builder: no field is open
pub struct MergeBuilder<R> {
    record: &'static str,
    ctor: Constructor<R>,
    table: Option<Arc<FieldTable<R>>>,
    finished: Vec<Box<dyn FieldMergeOp<R>>>,
    previous: Option<Box<dyn FieldMergeOp<R>>>,
    tags: TagGenerator,
}

impl<R: 'static> MergeBuilder<R> {
    pub fn new(ctor: impl Fn() -> R + Send + Sync + 'static) -> Self {
        Self {
            record: record_name::<R>(),
            ctor: Arc::new(ctor),
            table: None,
            finished: Vec::new(),
            previous: None,
            tags: TagGenerator::default(),
        }
    }

    /// Fields can then be looked up by name
    pub fn with_field_table(mut self, table: FieldTable<R>) -> Self {
        self.record = table.record();
        self.table = Some(Arc::new(table));
        self
    }

    /// Use `tags` for tags synthesized by `corresponding_to_previous`
    pub fn with_tag_generator(mut self, tags: TagGenerator) -> Self {
        self.tags = tags;
        self
    }

    /// Open a field given by getter and setter
    pub fn field<F: FieldValue>(
        self,
        getter: impl Fn(&R) -> Option<F> + Send + Sync + 'static,
        setter: impl Fn(&mut R, F) + Send + Sync + 'static,
    ) -> FieldMergeBuilder<R, F> {
        let name = format!("field #{}", self.declared());
        self.field_accessor(FieldAccessor::new(name, getter, setter))
    }

    /// Open a field through an accessor obtained earlier
    pub fn field_accessor<F: FieldValue>(self, accessor: FieldAccessor<R, F>) -> FieldMergeBuilder<R, F> {
        FieldMergeBuilder {
            merge: self,
            accessor,
        }
    }

    /// Open a field by name through the record's field table
    pub fn field_by_name<F: FieldValue>(self, name: &str) -> Result<FieldMergeBuilder<R, F>, ConfigError> {
        let table = self.table.as_ref().ok_or(ConfigError::NoAccessorTable { record: self.record })?;
        let accessor = table.lookup::<F>(name)?;
        Ok(self.field_accessor(accessor))
    }

    /// Finish with the fields declared so far
    pub fn build(mut self) -> Merge<R> {
        self.flush_previous();
        debug!(record = self.record, fields = self.finished.len(), "merge built");
        Merge {
            record: self.record,
            ctor: self.ctor,
            field_merges: self.finished.into(),
        }
    }

    fn declared(&self) -> usize {
        self.finished.len() + usize::from(self.previous.is_some())
    }

    fn flush_previous(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.finished.push(previous);
        }
    }

    fn push_field<F: FieldValue>(&mut self, accessor: FieldAccessor<R, F>, resolution: BoxedResolution<F, F>) {
        self.flush_previous();
        self.previous = Some(Box::new(FieldMerge { accessor, resolution }));
    }

    /// Tag of the immediately preceding field, tagging it first if necessary
    fn tag_previous(&mut self) -> Result<ResolutionTag, ConfigError> {
        let previous = self
            .previous
            .take()
            .ok_or(ConfigError::NoPreviousField { record: self.record })?;
        if let Some(tag) = previous.resolution_tag().cloned() {
            self.previous = Some(previous);
            return Ok(tag);
        }
        let tag = self.tags.next_tag();
        debug!(field = previous.name(), tag = %tag, "saving field choice for correspondence");
        self.previous = Some(previous.tagged(tag.clone()));
        Ok(tag)
    }
}

/// A field is open and waits for its resolution
pub struct FieldMergeBuilder<R, F> {
    merge: MergeBuilder<R>,
    accessor: FieldAccessor<R, F>,
}

impl<R: 'static, F: FieldValue> FieldMergeBuilder<R, F> {
    pub fn with(self, resolution: impl ConflictResolution<F, F> + 'static) -> AdditionalFieldMergeBuilder<R, F> {
        AdditionalFieldMergeBuilder {
            inner: self.converting_with(resolution),
        }
    }

    /// Several strategies applied left to right, like repeated `then`
    pub fn with_all(
        self,
        first: impl ConflictResolution<F, F> + 'static,
        rest: impl IntoIterator<Item = BoxedResolution<F, F>>,
    ) -> AdditionalFieldMergeBuilder<R, F> {
        let resolution = rest
            .into_iter()
            .fold(first.boxed(), |chain, next| chain.and_then(next).boxed());
        self.with(resolution)
    }

    /// Resolve through an intermediate representation `I`
    pub fn converting_with<I: FieldValue>(
        self,
        resolution: impl ConflictResolution<F, I> + 'static,
    ) -> IntermediateFieldMergeBuilder<R, F, I> {
        IntermediateFieldMergeBuilder {
            field: self,
            resolution: Box::new(resolution),
        }
    }

    /// Take this field from the sources saved under `tag`
    pub fn corresponding(self, tag: ResolutionTag) -> AdditionalFieldMergeBuilder<R, F> {
        self.with(corresponding(tag))
    }

    /// Take this field from whichever sources won the immediately preceding field
    pub fn corresponding_to_previous(mut self) -> Result<AdditionalFieldMergeBuilder<R, F>, ConfigError> {
        let tag = self.merge.tag_previous()?;
        Ok(self.corresponding(tag))
    }
}

/// A field's resolution chain currently produces `I` instead of the field type
pub struct IntermediateFieldMergeBuilder<R, F, I> {
    field: FieldMergeBuilder<R, F>,
    resolution: BoxedResolution<F, I>,
}

impl<R: 'static, F: FieldValue, I: FieldValue> IntermediateFieldMergeBuilder<R, F, I> {
    pub fn then<J: FieldValue>(
        self,
        resolution: impl ConflictResolution<I, J> + 'static,
    ) -> IntermediateFieldMergeBuilder<R, F, J> {
        IntermediateFieldMergeBuilder {
            field: self.field,
            resolution: Box::new(self.resolution.and_then(resolution)),
        }
    }

    /// Return to the field type, closing the conversion
    pub fn converting_back(
        self,
        resolution: impl ConflictResolution<I, F> + 'static,
    ) -> AdditionalFieldMergeBuilder<R, F> {
        AdditionalFieldMergeBuilder {
            inner: self.then(resolution),
        }
    }
}

/// A field has a complete resolution; extend it, start the next field, or build
pub struct AdditionalFieldMergeBuilder<R, F> {
    inner: IntermediateFieldMergeBuilder<R, F, F>,
}

impl<R: 'static, F: FieldValue> AdditionalFieldMergeBuilder<R, F> {
    pub fn then(self, resolution: impl ConflictResolution<F, F> + 'static) -> Self {
        Self {
            inner: self.inner.then(resolution),
        }
    }

    pub fn converting_with<I: FieldValue>(
        self,
        resolution: impl ConflictResolution<F, I> + 'static,
    ) -> IntermediateFieldMergeBuilder<R, F, I> {
        self.inner.then(resolution)
    }

    pub fn field<F2: FieldValue>(
        self,
        getter: impl Fn(&R) -> Option<F2> + Send + Sync + 'static,
        setter: impl Fn(&mut R, F2) + Send + Sync + 'static,
    ) -> FieldMergeBuilder<R, F2> {
        self.finish().field(getter, setter)
    }

    pub fn field_accessor<F2: FieldValue>(self, accessor: FieldAccessor<R, F2>) -> FieldMergeBuilder<R, F2> {
        self.finish().field_accessor(accessor)
    }

    pub fn field_by_name<F2: FieldValue>(self, name: &str) -> Result<FieldMergeBuilder<R, F2>, ConfigError> {
        self.finish().field_by_name(name)
    }

    pub fn build(self) -> Merge<R> {
        self.finish().build()
    }

    fn finish(self) -> MergeBuilder<R> {
        let IntermediateFieldMergeBuilder {
            field: FieldMergeBuilder { mut merge, accessor },
            resolution,
        } = self.inner;
        merge.push_field(accessor, resolution);
        merge
    }
}
