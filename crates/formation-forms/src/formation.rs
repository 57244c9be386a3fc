//! The [`Formation`] aggregate: an ordered set of field specs, an optional
//! bound record, and the render pipeline that turns them into markup.
//!
//! A render pass walks the fields in insertion order:
//!
//! 1. exclusion list and single-field filter
//! 2. per-call overrides (on a copy; stored specs are never touched)
//! 3. role check against the context's permission checker
//! 4. value resolution (submitted state, then the stored value)
//! 5. per-type dispatch into a widget
//! 6. layout composition

use std::collections::HashSet;
use std::fmt;

use formation_core::logging::render_span;
use formation_core::{FormationError, FormationResult, FormationSettings};

use crate::context::RenderContext;
use crate::declaration::FieldInput;
use crate::dispatch::dispatch;
use crate::layout::{compose, submit_block};
use crate::record::BoundRecord;
use crate::resolver::ResolverChain;
use crate::spec::{FieldKind, FieldOverrides, FieldSpec};
use crate::value::FieldValue;

/// Encoding type for forms without file uploads.
pub const URLENCODED: &str = "application/x-www-form-urlencoded";

/// Encoding type for forms with file uploads.
pub const MULTIPART: &str = "multipart/form-data";

/// Per-call render options.
///
/// # Examples
///
/// ```
/// use formation_forms::formation::RenderOptions;
///
/// let options = RenderOptions::new().except(["password"]);
/// assert!(options.except.contains("password"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Render only the field with this name.
    pub only: Option<String>,
    /// Names of fields to leave out.
    pub except: HashSet<String>,
    /// Overrides merged onto every rendered field.
    pub overrides: FieldOverrides,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the render to a single field.
    #[must_use]
    pub fn only(mut self, name: impl Into<String>) -> Self {
        self.only = Some(name.into());
        self
    }

    /// Adds names to the exclusion list.
    #[must_use]
    pub fn except<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.except.extend(names.into_iter().map(Into::into));
        self
    }

    /// Sets the per-call overrides.
    #[must_use]
    pub fn overrides(mut self, overrides: FieldOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// A declarative form.
///
/// The bound record is borrowed for the lifetime `'r` and only ever read.
///
/// # Examples
///
/// ```
/// use formation_forms::context::RenderContext;
/// use formation_forms::formation::{Formation, RenderOptions};
///
/// let form = Formation::from_inputs(["first_name", "email"]).unwrap();
/// let html = form.render(&RenderContext::new(), &RenderOptions::new()).unwrap();
/// assert!(html.contains(">First Name</label>"));
/// assert!(html.contains(r#"name="email""#));
/// ```
#[derive(Default)]
pub struct Formation<'r> {
    fields: Vec<FieldSpec>,
    record: Option<&'r dyn BoundRecord>,
    settings: FormationSettings,
}

impl<'r> Formation<'r> {
    /// Creates an empty form with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the rendering settings.
    #[must_use]
    pub fn with_settings(mut self, settings: FormationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Creates a form from field inputs.
    pub fn from_inputs<I, T>(inputs: I) -> FormationResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<FieldInput>,
    {
        let mut form = Self::new();
        form.set_fields(inputs, true)?;
        Ok(form)
    }

    /// Creates a form bound to `record`, loading the record's editable
    /// fields if it declares any.
    pub fn for_record(record: &'r dyn BoundRecord) -> FormationResult<Self> {
        let mut form = Self::new();
        form.bind_record(record)?;
        Ok(form)
    }

    /// Loads field inputs, replacing the current fields when `reset_existing`
    /// is set and appending to them otherwise.
    ///
    /// Inputs with an empty name are skipped. When a record is bound, the
    /// new fields take their values from it.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid declaration or duplicate name. The field
    /// list is left unchanged on error.
    pub fn set_fields<I, T>(&mut self, inputs: I, reset_existing: bool) -> FormationResult<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<FieldInput>,
    {
        let taken: HashSet<&str> = if reset_existing {
            HashSet::new()
        } else {
            self.fields.iter().map(|f| f.name.as_str()).collect()
        };
        let mut fields = build_fields(inputs, &taken)?;
        if let Some(record) = self.record {
            apply_binding(&mut fields, record)?;
        }

        tracing::debug!(count = fields.len(), reset_existing, "fields loaded");
        if reset_existing {
            self.fields = fields;
        } else {
            self.fields.extend(fields);
        }
        Ok(())
    }

    /// Binds a record and resolves every field's default value from it.
    ///
    /// If the record declares editable fields they replace the current ones.
    ///
    /// # Errors
    ///
    /// Fails if the record's field declarations are invalid or a relationship
    /// lookup fails. The form is left unchanged on error.
    pub fn bind_record(&mut self, record: &'r dyn BoundRecord) -> FormationResult<()> {
        let mut fields = match record.editable_fields() {
            Some(inputs) => build_fields(inputs, &HashSet::new())?,
            None => self.fields.clone(),
        };
        apply_binding(&mut fields, record)?;
        self.fields = fields;
        self.record = Some(record);
        Ok(())
    }

    /// Overwrites the stored value of the named field.
    ///
    /// Returns `false` if no field has that name.
    pub fn set_field_value(&mut self, name: &str, value: impl Into<FieldValue>) -> bool {
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => {
                field.value = value.into();
                true
            }
            None => false,
        }
    }

    /// Returns `true` if any field is a file upload.
    pub fn has_file_field(&self) -> bool {
        self.fields
            .iter()
            .any(|f| matches!(f.kind, FieldKind::File { .. }))
    }

    /// Returns the `enctype` the surrounding `<form>` element needs.
    pub fn enctype(&self) -> &'static str {
        if self.has_file_field() {
            MULTIPART
        } else {
            URLENCODED
        }
    }

    /// Returns the fields in render order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Returns the named field.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the bound record.
    pub fn record(&self) -> Option<&'r dyn BoundRecord> {
        self.record
    }

    pub fn settings(&self) -> &FormationSettings {
        &self.settings
    }

    /// Resolves the value the named field would render with.
    ///
    /// Returns `Ok(None)` if no field has that name.
    pub fn resolve_value(
        &self,
        name: &str,
        ctx: &RenderContext<'_>,
    ) -> FormationResult<Option<FieldValue>> {
        self.field(name)
            .map(|field| ResolverChain::rendering(ctx).resolve(field))
            .transpose()
    }

    /// Renders the form's fields.
    ///
    /// # Errors
    ///
    /// Fails when a select's option source or another collaborator fails.
    pub fn render(&self, ctx: &RenderContext<'_>, options: &RenderOptions) -> FormationResult<String> {
        let span = render_span(self.fields.len(), options.only.as_deref());
        let _guard = span.enter();

        let chain = ResolverChain::rendering(ctx);
        let mut html = String::new();
        for stored in &self.fields {
            if options.except.contains(&stored.name) {
                tracing::debug!(field = stored.name.as_str(), "excluded");
                continue;
            }
            if options.only.as_ref().is_some_and(|only| *only != stored.name) {
                continue;
            }

            let field = stored.with_overrides(&options.overrides);
            if !ctx.allows(&field.roles) {
                tracing::debug!(field = field.name.as_str(), roles = ?field.roles, "not permitted");
                continue;
            }

            let value = chain.resolve(&field)?;
            if let Some(widget) = dispatch(&field, &value, ctx, self.record, &self.settings)? {
                html.push_str(&compose(&field, &widget, &self.settings));
            }
        }
        Ok(html)
    }

    /// Renders a single field, or an empty string if it is hidden, unknown,
    /// or not permitted.
    pub fn render_field(&self, name: &str, ctx: &RenderContext<'_>) -> FormationResult<String> {
        self.render(ctx, &RenderOptions::new().only(name))
    }

    /// Renders the cancel/save block.
    pub fn render_submit(&self, cancel_url: &str) -> String {
        submit_block(cancel_url, &self.settings)
    }
}

impl fmt::Debug for Formation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();
        f.debug_struct("Formation")
            .field("fields", &names)
            .field("bound", &self.record.is_some())
            .finish_non_exhaustive()
    }
}

fn build_fields<I, T>(inputs: I, taken: &HashSet<&str>) -> FormationResult<Vec<FieldSpec>>
where
    I: IntoIterator<Item = T>,
    T: Into<FieldInput>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut fields = Vec::new();
    for input in inputs {
        let Some(spec) = FieldSpec::from_input(input.into())? else {
            tracing::warn!("skipping field declaration with an empty name");
            continue;
        };
        if taken.contains(spec.name.as_str()) || !seen.insert(spec.name.clone()) {
            return Err(FormationError::DuplicateField(spec.name));
        }
        fields.push(spec);
    }
    Ok(fields)
}

fn apply_binding(fields: &mut [FieldSpec], record: &dyn BoundRecord) -> FormationResult<()> {
    let chain = ResolverChain::binding(record);
    for field in fields {
        if let Some(value) = chain.resolve_source(field)? {
            field.value = value;
        }
    }
    Ok(())
}
