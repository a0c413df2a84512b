//! # Field Accessors
//!
//! Statically declared getter/setter pairs for the fields of a record type. A
//! [`FieldTable`] lets fields be looked up by name when a merge is built; a missing
//! or mistyped field is a configuration error reported immediately.

use crate::error::ConfigError;
use hashbrown::HashMap;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// Reads a field; `None` means the field is absent on the record
pub type Getter<R, F> = Arc<dyn Fn(&R) -> Option<F> + Send + Sync>;

/// Writes a field
pub type Setter<R, F> = Arc<dyn Fn(&mut R, F) + Send + Sync>;

/// A named getter/setter pair for one field of `R`
pub struct FieldAccessor<R, F> {
    name: String,
    getter: Getter<R, F>,
    setter: Setter<R, F>,
}

impl<R, F> FieldAccessor<R, F> {
    pub fn new(
        name: impl Into<String>,
        getter: impl Fn(&R) -> Option<F> + Send + Sync + 'static,
        setter: impl Fn(&mut R, F) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            getter: Arc::new(getter),
            setter: Arc::new(setter),
        }
    }

    fn from_parts(name: String, getter: Getter<R, F>, setter: Setter<R, F>) -> Self {
        Self { name, getter, setter }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, record: &R) -> Option<F> {
        (self.getter)(record)
    }

    pub fn set(&self, record: &mut R, value: F) {
        (self.setter)(record, value)
    }
}

impl<R, F> Clone for FieldAccessor<R, F> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            getter: Arc::clone(&self.getter),
            setter: Arc::clone(&self.setter),
        }
    }
}

impl<R, F> fmt::Debug for FieldAccessor<R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("name", &self.name)
            .field("type", &type_name::<F>())
            .finish()
    }
}

struct FieldEntry {
    type_name: &'static str,
    getter: Option<Box<dyn Any + Send + Sync>>,
    setter: Option<Box<dyn Any + Send + Sync>>,
}

impl FieldEntry {
    fn new<F>() -> Self {
        Self {
            type_name: type_name::<F>(),
            getter: None,
            setter: None,
        }
    }
}

/// Name-addressed accessors for the fields of `R`
pub struct FieldTable<R> {
    record: &'static str,
    entries: HashMap<String, FieldEntry>,
    _record: std::marker::PhantomData<fn(R)>,
}

impl<R: 'static> FieldTable<R> {
    pub fn builder() -> FieldTableBuilder<R> {
        FieldTableBuilder {
            table: FieldTable {
                record: record_name::<R>(),
                entries: HashMap::new(),
                _record: std::marker::PhantomData,
            },
        }
    }

    /// Short type name of the record, used in error messages
    pub fn record(&self) -> &'static str {
        self.record
    }

    /// Declared field names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve `name` to a readable and writable accessor of type `F`
    pub fn lookup<F: 'static>(&self, name: &str) -> Result<FieldAccessor<R, F>, ConfigError> {
        let entry = self.entries.get(name).ok_or_else(|| ConfigError::UnknownField {
            record: self.record,
            field: name.to_string(),
        })?;
        let mismatch = || ConfigError::FieldTypeMismatch {
            record: self.record,
            field: name.to_string(),
            actual: entry.type_name,
            requested: type_name::<F>(),
        };
        let getter = entry
            .getter
            .as_ref()
            .ok_or_else(|| ConfigError::MissingGetter {
                record: self.record,
                field: name.to_string(),
            })?
            .downcast_ref::<Getter<R, F>>()
            .ok_or_else(mismatch)?;
        let setter = entry
            .setter
            .as_ref()
            .ok_or_else(|| ConfigError::MissingSetter {
                record: self.record,
                field: name.to_string(),
            })?
            .downcast_ref::<Setter<R, F>>()
            .ok_or_else(mismatch)?;
        Ok(FieldAccessor::from_parts(
            name.to_string(),
            Arc::clone(getter),
            Arc::clone(setter),
        ))
    }
}

impl<R> fmt::Debug for FieldTable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldTable")
            .field("record", &self.record)
            .field("fields", &self.entries.len())
            .finish()
    }
}

pub struct FieldTableBuilder<R> {
    table: FieldTable<R>,
}

impl<R: 'static> FieldTableBuilder<R> {
    /// Declare a readable and writable field
    pub fn field<F: 'static>(
        self,
        name: &str,
        getter: impl Fn(&R) -> Option<F> + Send + Sync + 'static,
        setter: impl Fn(&mut R, F) + Send + Sync + 'static,
    ) -> Self {
        self.getter(name, getter).setter(name, setter)
    }

    /// Declare a read-only field, or the read half of a field
    pub fn getter<F: 'static>(mut self, name: &str, getter: impl Fn(&R) -> Option<F> + Send + Sync + 'static) -> Self {
        let getter: Getter<R, F> = Arc::new(getter);
        self.table
            .entries
            .entry(name.to_string())
            .or_insert_with(FieldEntry::new::<F>)
            .getter = Some(Box::new(getter));
        self
    }

    /// Declare a write-only field, or the write half of a field
    pub fn setter<F: 'static>(mut self, name: &str, setter: impl Fn(&mut R, F) + Send + Sync + 'static) -> Self {
        let setter: Setter<R, F> = Arc::new(setter);
        self.table
            .entries
            .entry(name.to_string())
            .or_insert_with(FieldEntry::new::<F>)
            .setter = Some(Box::new(setter));
        self
    }

    pub fn build(self) -> FieldTable<R> {
        self.table
    }
}

/// A record type that can be constructed empty and exposes its fields by name
pub trait Fusable: Default + Sized + 'static {
    fn field_table() -> FieldTable<Self>;
}

/// Short type name of `R`, without module path or generic arguments
pub(crate) fn record_name<R>() -> &'static str {
    let full = type_name::<R>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
