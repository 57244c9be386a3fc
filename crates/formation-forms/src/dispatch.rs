//! Per-type rendering policies.
//!
//! [`dispatch`] turns one visible field and its resolved value into a
//! [`RenderedWidget`]: the control markup plus how the layout composer should
//! place it. Labels, help text, and wrappers are added later by
//! [`layout`](crate::layout).

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use formation_core::utils::text::MULTI_VALUE_MARKER;
use formation_core::{FormationError, FormationResult, FormationSettings};

use crate::context::RenderContext;
use crate::declaration::DateHints;
use crate::options::{resolve_options, ResolvedOptions};
use crate::record::BoundRecord;
use crate::spec::{FieldKind, FieldSpec, SelectConfig};
use crate::value::FieldValue;
use crate::widgets::{
    add_class, Attrs, CheckboxInput, DateInput, FileInput, HiddenInput, PasswordInput, Select,
    SelectMultiple, TextInput, Textarea, Widget, WidgetType,
};

/// Suffix of the checkbox that asks for a stored file to be removed.
pub const DELETE_FILE_SUFFIX: &str = "_delete_file";

/// The currently stored file shown next to a file input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingFile {
    /// Browsable URL of the stored file.
    pub url: String,
    /// Link text: the stored reference.
    pub label: String,
    /// Markup of the `<name>_delete_file` checkbox.
    pub delete_checkbox: String,
}

/// How a rendered widget is placed in the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Label, widget, and help in a two-column row.
    Row,
    /// Like [`Placement::Row`], with the file wrapper and existing-file block.
    FileRow {
        /// The stored file, if the field has a value.
        existing: Option<ExistingFile>,
    },
    /// The widget alone, without label or wrapper.
    Bare,
}

/// The intermediate output of dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedWidget {
    /// The wire name of the control (may carry a `[]` suffix).
    pub name: String,
    /// The kind of control.
    pub widget_type: WidgetType,
    /// The control markup.
    pub html: String,
    /// Where the layout composer puts it.
    pub placement: Placement,
}

/// Renders one field as a widget.
///
/// Returns `Ok(None)` for fields that produce no widget: unrecognized types,
/// and location fields when no location renderer is available.
///
/// # Errors
///
/// Returns an error when an option source or a collaborator fails.
pub fn dispatch(
    field: &FieldSpec,
    value: &FieldValue,
    ctx: &RenderContext<'_>,
    record: Option<&dyn BoundRecord>,
    settings: &FormationSettings,
) -> FormationResult<Option<RenderedWidget>> {
    let name = field.name.as_str();
    let rendered = match &field.kind {
        FieldKind::Text => row(name, &TextInput, value, &control_attrs(field, settings)),
        FieldKind::Password => row(
            name,
            &PasswordInput,
            &FieldValue::Null,
            &control_attrs(field, settings),
        ),
        FieldKind::Textarea => row(name, &Textarea, value, &control_attrs(field, settings)),
        FieldKind::Date(hints) => render_date(field, hints, value, settings),
        FieldKind::Select(select) => render_select(field, select, value, ctx, settings)?,
        FieldKind::File { disk } => {
            render_file(field, disk.as_deref(), value, ctx, settings)?
        }
        FieldKind::Hidden { attributes } => {
            let mut attrs = field.attributes.clone();
            attrs.extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
            RenderedWidget {
                name: name.to_string(),
                widget_type: WidgetType::HiddenInput,
                html: HiddenInput.render(name, value, &attrs),
                placement: Placement::Bare,
            }
        }
        FieldKind::Location { config } => {
            let Some(location) = ctx.location else {
                tracing::warn!(field = name, "no location renderer supplied; skipping field");
                return Ok(None);
            };
            let html = location
                .render(config.as_ref(), record)
                .map_err(|e| FormationError::collaborator("location renderer", e))?;
            RenderedWidget {
                name: name.to_string(),
                widget_type: WidgetType::Location,
                html,
                placement: Placement::Row,
            }
        }
        FieldKind::Custom(type_name) => {
            tracing::debug!(field = name, field_type = type_name.as_str(), "unrecognized field type; skipping");
            return Ok(None);
        }
    };
    Ok(Some(rendered))
}

fn row(name: &str, widget: &dyn Widget, value: &FieldValue, attrs: &Attrs) -> RenderedWidget {
    RenderedWidget {
        name: name.to_string(),
        widget_type: widget.widget_type(),
        html: widget.render(name, value, attrs),
        placement: Placement::Row,
    }
}

/// Builds the attributes shared by every labelled control.
///
/// Declared attributes come first. The control class replaces any declared
/// `class` and the field's extra classes are appended to it.
fn control_attrs(field: &FieldSpec, settings: &FormationSettings) -> Attrs {
    let mut attrs = field.attributes.clone();
    attrs.insert("class".to_string(), settings.control_class.clone());
    if let Some(class) = &field.class {
        add_class(&mut attrs, class);
    }
    if !field.placeholder.is_empty() {
        attrs.insert("placeholder".to_string(), field.placeholder.clone());
    }
    attrs
        .entry("id".to_string())
        .or_insert_with(|| field.name.clone());
    attrs
}

// ── Date ────────────────────────────────────────────────────────────────

fn render_date(
    field: &FieldSpec,
    hints: &DateHints,
    value: &FieldValue,
    settings: &FormationSettings,
) -> RenderedWidget {
    let mut attrs = control_attrs(field, settings);
    add_class(&mut attrs, &settings.date_picker_class);
    attrs.insert(
        "data-date-format".to_string(),
        non_empty(hints.date_format.as_deref()).unwrap_or(&settings.date_picker_format).to_string(),
    );
    if let Some(min) = non_empty(hints.min_date.as_deref()) {
        attrs.insert("data-min-date".to_string(), min.to_string());
    }
    if let Some(max) = non_empty(hints.max_date.as_deref()) {
        attrs.insert("data-max-date".to_string(), max.to_string());
    }

    let display = match value {
        FieldValue::Date(date) => {
            let formatted = format_date(date, &settings.date_display_format);
            attrs.insert("data-default-date".to_string(), formatted.clone());
            formatted
        }
        FieldValue::DateTime(datetime) => {
            let formatted = format_date(datetime, &settings.date_display_format);
            attrs.insert("data-default-date".to_string(), formatted.clone());
            formatted
        }
        other if other.is_empty() => String::new(),
        other => {
            let raw = other.to_string();
            reformat_date_string(&raw, &settings.date_display_format).unwrap_or(raw)
        }
    };

    row(&field.name, &DateInput, &FieldValue::String(display), &attrs)
}

trait DateFormat {
    fn write_formatted(&self, out: &mut String, format: &str) -> std::fmt::Result;
    fn fallback(&self) -> String;
}

impl DateFormat for NaiveDate {
    fn write_formatted(&self, out: &mut String, format: &str) -> std::fmt::Result {
        write!(out, "{}", self.format(format))
    }

    fn fallback(&self) -> String {
        self.to_string()
    }
}

impl DateFormat for NaiveDateTime {
    fn write_formatted(&self, out: &mut String, format: &str) -> std::fmt::Result {
        write!(out, "{}", self.format(format))
    }

    fn fallback(&self) -> String {
        self.to_string()
    }
}

/// Formats a date with a strftime pattern. An invalid pattern falls back to
/// ISO 8601.
fn format_date(date: &impl DateFormat, format: &str) -> String {
    let mut out = String::new();
    match date.write_formatted(&mut out, format) {
        Ok(()) => out,
        Err(_) => {
            tracing::warn!(format, "invalid date display format; using ISO 8601");
            date.fallback()
        }
    }
}

const DATETIME_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d/%b/%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
];

/// Parses a freeform date string and reformats it, or returns `None` when
/// no known format matches.
fn reformat_date_string(raw: &str, format: &str) -> Option<String> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(format_date(&dt.naive_local(), format));
    }
    if let Some(dt) = DATETIME_INPUT_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(format_date(&dt, format));
    }
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .map(|d| format_date(&d, format))
}

// ── Select ──────────────────────────────────────────────────────────────

fn render_select(
    field: &FieldSpec,
    select: &SelectConfig,
    value: &FieldValue,
    ctx: &RenderContext<'_>,
    settings: &FormationSettings,
) -> FormationResult<RenderedWidget> {
    let mut attrs = control_attrs(field, settings);
    let placeholder = attrs.remove("placeholder");

    let choices = match resolve_options(&field.name, &select.source, ctx)? {
        ResolvedOptions::Eager(choices) => choices,
        ResolvedOptions::Deferred { url } => {
            if field.class.is_none() {
                add_class(&mut attrs, &settings.ajax_select_class);
            }
            attrs.insert("data-ajax-route".to_string(), url);
            Vec::new()
        }
    };

    let mut name = field.name.clone();
    if select.multiple && select.group_as_array && !name.ends_with(MULTI_VALUE_MARKER) {
        name.push_str(MULTI_VALUE_MARKER);
    }

    let html = if select.multiple {
        let mut widget = SelectMultiple::new(choices);
        widget.placeholder = placeholder;
        widget.render(&name, value, &attrs)
    } else {
        let mut widget = Select::new(choices);
        widget.placeholder = placeholder;
        widget.render(&name, value, &attrs)
    };

    Ok(RenderedWidget {
        name,
        widget_type: if select.multiple {
            WidgetType::SelectMultiple
        } else {
            WidgetType::Select
        },
        html,
        placement: Placement::Row,
    })
}

// ── File ────────────────────────────────────────────────────────────────

fn render_file(
    field: &FieldSpec,
    disk: Option<&str>,
    value: &FieldValue,
    ctx: &RenderContext<'_>,
    settings: &FormationSettings,
) -> FormationResult<RenderedWidget> {
    let name = field.name.as_str();
    let html = FileInput.render(name, value, &control_attrs(field, settings));

    let existing = if value.is_empty() {
        None
    } else {
        let reference = value.to_string();
        let url = file_url(name, &reference, disk, ctx)?;
        let delete_checkbox = CheckboxInput::default().render(
            &format!("{name}{DELETE_FILE_SUFFIX}"),
            &FieldValue::Null,
            &Attrs::new(),
        );
        Some(ExistingFile {
            url,
            label: reference,
            delete_checkbox,
        })
    };

    Ok(RenderedWidget {
        name: name.to_string(),
        widget_type: WidgetType::FileInput,
        html,
        placement: Placement::FileRow { existing },
    })
}

/// Absolute `http…` references are used verbatim; others go through the
/// storage resolver when the field names a disk.
fn file_url(
    field: &str,
    reference: &str,
    disk: Option<&str>,
    ctx: &RenderContext<'_>,
) -> FormationResult<String> {
    if reference.starts_with("http") {
        return Ok(reference.to_string());
    }
    let Some(disk) = disk else {
        return Ok(reference.to_string());
    };
    match ctx.storage {
        Some(storage) => storage
            .url(disk, reference)
            .map_err(|e| FormationError::collaborator("storage resolver", e)),
        None => {
            tracing::warn!(field, disk, "no storage resolver supplied; showing raw file reference");
            Ok(reference.to_string())
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
