//! # Form State
//!
//! Per-field error messages and touched flags shared by both flows.
//!
//! ## Rules
//! - An edit clears that field's error, nothing else.
//! - A blur marks the field touched and re-validates only that field.
//! - A failed "Continue" replaces the whole error map with the step's errors.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use shield_core::{ValidationError, ValidationResult};

/// A field of a flow's draft.
pub trait FormField: Copy + Ord + fmt::Debug {
    /// Name used in error maps and for validation dispatch (`"email"`).
    fn name(&self) -> &'static str;
}

/// Error map and touched set for one draft.
#[derive(Debug, Clone)]
pub struct FormState<F> {
    errors: BTreeMap<F, ValidationError>,
    touched: BTreeSet<F>,
}

impl<F> Default for FormState<F> {
    fn default() -> Self {
        Self {
            errors: BTreeMap::new(),
            touched: BTreeSet::new(),
        }
    }
}

impl<F: FormField> FormState<F> {
    pub fn error(&self, field: F) -> Option<&ValidationError> {
        self.errors.get(&field)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_touched(&self, field: F) -> bool {
        self.touched.contains(&field)
    }

    pub fn clear(&mut self, field: F) {
        self.errors.remove(&field);
    }

    pub fn touch(&mut self, field: F) {
        self.touched.insert(field);
    }

    /// Stores or clears the error for one field.
    pub fn record(&mut self, field: F, result: ValidationResult<()>) {
        match result {
            Ok(()) => {
                self.errors.remove(&field);
            }
            Err(e) => {
                self.errors.insert(field, e);
            }
        }
    }

    /// Replaces the whole map; returns the number of errors now stored.
    pub fn replace(&mut self, errors: impl IntoIterator<Item = (F, ValidationError)>) -> usize {
        self.errors = errors.into_iter().collect();
        self.errors.len()
    }

    /// Files an error raised outside the per-field checks under the field
    /// it names. Hands the error back if none of `fields` carries that name.
    pub fn file(&mut self, fields: &[F], error: ValidationError) -> Result<F, ValidationError> {
        match fields.iter().find(|f| f.name() == error.field()) {
            Some(field) => {
                self.errors.insert(*field, error);
                Ok(*field)
            }
            None => Err(error),
        }
    }

    pub fn reset(&mut self) {
        self.errors.clear();
        self.touched.clear();
    }

    /// Messages keyed by field name, for rendering.
    pub fn messages(&self) -> BTreeMap<String, String> {
        self.errors
            .iter()
            .map(|(f, e)| (f.name().to_string(), e.to_string()))
            .collect()
    }

    /// Touched field names, for rendering.
    pub fn touched_names(&self) -> Vec<String> {
        self.touched.iter().map(|f| f.name().to_string()).collect()
    }
}
