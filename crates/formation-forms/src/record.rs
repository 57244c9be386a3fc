//! The bound record a form reads its default values from.
//!
//! Formation never owns or writes the record; it holds a shared borrow for as
//! long as the form lives, so one record can back several forms at once.

use formation_core::CollaboratorError;

use crate::declaration::FieldInput;
use crate::value::FieldValue;

/// Read-only access to the data record behind a form.
pub trait BoundRecord {
    /// Returns the attribute stored under `name`, or `None` if unset.
    ///
    /// Returning `Some(FieldValue::Null)` is treated the same as `None`.
    fn attribute(&self, name: &str) -> Option<FieldValue>;

    /// Returns the identifiers of the records related through `relationship`.
    fn related_ids(&self, relationship: &str) -> Result<Vec<FieldValue>, CollaboratorError>;

    /// Returns the fields this record declares as editable, if it declares any.
    ///
    /// Binding a record that returns `Some` replaces the form's field list.
    fn editable_fields(&self) -> Option<Vec<FieldInput>> {
        None
    }
}
