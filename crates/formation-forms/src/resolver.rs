//! Field value resolution.
//!
//! A [`ResolverChain`] asks each [`ValueSource`] in order for a field's value.
//! The first source that answers wins; if every source defers, the value
//! stored on the spec is used.
//!
//! Two chains are used:
//!
//! - At bind time ([`ResolverChain::binding`]): the record attribute, then the
//!   related identifiers for multi-valued relation fields.
//! - At render time ([`ResolverChain::rendering`]): submitted form state.
//!
//! Every built-in source defers for password fields.

use std::fmt;

use formation_core::utils::text::is_multi_value_name;
use formation_core::{FormationError, FormationResult};

use crate::context::{RenderContext, SubmittedState};
use crate::record::BoundRecord;
use crate::spec::FieldSpec;
use crate::value::FieldValue;

/// The answer of a single [`ValueSource`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The source supplies this value.
    Value(FieldValue),
    /// The source has nothing to say; ask the next one.
    Defer,
}

/// One step of a resolver chain.
pub trait ValueSource {
    /// A short name used in log output.
    fn name(&self) -> &'static str;

    /// Resolves `field`, or defers to the next source.
    fn resolve(&self, field: &FieldSpec) -> FormationResult<Resolution>;
}

/// The bound record's attribute with the same name as the field. Password
/// fields defer.
pub struct RecordAttribute<'a> {
    record: &'a dyn BoundRecord,
}

impl<'a> RecordAttribute<'a> {
    pub fn new(record: &'a dyn BoundRecord) -> Self {
        Self { record }
    }
}

impl ValueSource for RecordAttribute<'_> {
    fn name(&self) -> &'static str {
        "record attribute"
    }

    fn resolve(&self, field: &FieldSpec) -> FormationResult<Resolution> {
        if field.is_secret() {
            return Ok(Resolution::Defer);
        }
        Ok(match self.record.attribute(&field.name) {
            Some(FieldValue::Null) | None => Resolution::Defer,
            Some(value) => Resolution::Value(value),
        })
    }
}

/// Identifiers of the related records, for `name[]` fields that declare a
/// relationship.
pub struct RelationshipIds<'a> {
    record: &'a dyn BoundRecord,
}

impl<'a> RelationshipIds<'a> {
    pub fn new(record: &'a dyn BoundRecord) -> Self {
        Self { record }
    }
}

impl ValueSource for RelationshipIds<'_> {
    fn name(&self) -> &'static str {
        "relationship ids"
    }

    fn resolve(&self, field: &FieldSpec) -> FormationResult<Resolution> {
        let Some(relationship) = field.relationship.as_deref() else {
            return Ok(Resolution::Defer);
        };
        if field.is_secret() || !is_multi_value_name(&field.name) {
            return Ok(Resolution::Defer);
        }
        let ids = self
            .record
            .related_ids(relationship)
            .map_err(|e| FormationError::collaborator("bound record", e))?;
        Ok(Resolution::Value(FieldValue::List(ids)))
    }
}

/// Non-empty submitted form state. Password fields always defer.
pub struct SubmittedInput<'a> {
    submitted: &'a dyn SubmittedState,
}

impl<'a> SubmittedInput<'a> {
    pub fn new(submitted: &'a dyn SubmittedState) -> Self {
        Self { submitted }
    }
}

impl ValueSource for SubmittedInput<'_> {
    fn name(&self) -> &'static str {
        "submitted input"
    }

    fn resolve(&self, field: &FieldSpec) -> FormationResult<Resolution> {
        if field.is_secret() {
            return Ok(Resolution::Defer);
        }
        Ok(match self.submitted.old(&field.name) {
            Some(value) if !value.is_empty() => Resolution::Value(value),
            _ => Resolution::Defer,
        })
    }
}

/// An ordered list of value sources.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use formation_forms::context::RenderContext;
/// use formation_forms::resolver::ResolverChain;
/// use formation_forms::spec::FieldSpec;
/// use formation_forms::value::FieldValue;
///
/// let mut submitted = HashMap::new();
/// submitted.insert("title".to_string(), "Typed".to_string());
/// let ctx = RenderContext::new().with_submitted(&submitted);
///
/// let mut field = FieldSpec::text("title");
/// field.value = FieldValue::from("Stored");
/// let value = ResolverChain::rendering(&ctx).resolve(&field).unwrap();
/// assert_eq!(value, FieldValue::from("Typed"));
/// ```
#[derive(Default)]
pub struct ResolverChain<'a> {
    sources: Vec<Box<dyn ValueSource + 'a>>,
}

impl<'a> ResolverChain<'a> {
    /// Creates an empty chain; it always yields the stored value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source to the end of the chain.
    #[must_use]
    pub fn with_source(mut self, source: impl ValueSource + 'a) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// The chain used when a record is bound.
    pub fn binding(record: &'a dyn BoundRecord) -> Self {
        Self::new()
            .with_source(RecordAttribute::new(record))
            .with_source(RelationshipIds::new(record))
    }

    /// The chain used on every render pass.
    pub fn rendering(ctx: &RenderContext<'a>) -> Self {
        match ctx.submitted {
            Some(submitted) => Self::new().with_source(SubmittedInput::new(submitted)),
            None => Self::new(),
        }
    }

    /// Returns `true` if the chain has no sources.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Returns the first answer from a source, or `None` if all deferred.
    pub fn resolve_source(&self, field: &FieldSpec) -> FormationResult<Option<FieldValue>> {
        for source in &self.sources {
            if let Resolution::Value(value) = source.resolve(field)? {
                tracing::trace!(field = field.name.as_str(), source = source.name(), "value resolved");
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Resolves `field`, falling back to its stored value.
    pub fn resolve(&self, field: &FieldSpec) -> FormationResult<FieldValue> {
        Ok(self
            .resolve_source(field)?
            .unwrap_or_else(|| field.value.clone()))
    }
}

impl fmt::Debug for ResolverChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();
        f.debug_struct("ResolverChain")
            .field("sources", &names)
            .finish()
    }
}
