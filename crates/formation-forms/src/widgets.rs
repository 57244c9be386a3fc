//! Widgets that turn a field name and value into a single HTML control.
//!
//! Widgets know nothing about labels, layout, or where a value came from;
//! they only produce the element itself. Attribute values and text content
//! are HTML-escaped, and attributes render in sorted order so output is
//! deterministic.

use std::collections::BTreeMap;
use std::fmt;

use formation_core::utils::text::escape_html;

use crate::options::OptionList;
use crate::value::FieldValue;

/// HTML attributes, kept sorted by name.
pub type Attrs = BTreeMap<String, String>;

/// Enumerates the controls a field can render as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetType {
    /// `<input type="text">`.
    TextInput,
    /// `<input type="password">`.
    PasswordInput,
    /// `<input type="hidden">`.
    HiddenInput,
    /// `<textarea>`.
    Textarea,
    /// `<input type="text">` driven by a client-side date picker.
    DateInput,
    /// `<input type="checkbox">`.
    CheckboxInput,
    /// `<select>`.
    Select,
    /// `<select multiple="multiple">`.
    SelectMultiple,
    /// `<input type="file">`.
    FileInput,
    /// Markup produced by a location collaborator.
    Location,
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "TextInput",
            Self::PasswordInput => "PasswordInput",
            Self::HiddenInput => "HiddenInput",
            Self::Textarea => "Textarea",
            Self::DateInput => "DateInput",
            Self::CheckboxInput => "CheckboxInput",
            Self::Select => "Select",
            Self::SelectMultiple => "SelectMultiple",
            Self::FileInput => "FileInput",
            Self::Location => "Location",
        };
        write!(f, "{name}")
    }
}

/// An HTML form control.
pub trait Widget: fmt::Debug {
    /// Returns the widget type enum variant.
    fn widget_type(&self) -> WidgetType;

    /// Renders the control.
    ///
    /// # Arguments
    /// - `name` - The HTML `name` attribute
    /// - `value` - The value to display
    /// - `attrs` - Additional HTML attributes
    fn render(&self, name: &str, value: &FieldValue, attrs: &Attrs) -> String;
}

/// Formats attributes as ` key="value" key2="value2"`, escaping the values.
pub fn render_attrs(attrs: &Attrs) -> String {
    let mut out = String::new();
    for (k, v) in attrs {
        out.push_str(&format!(r#" {}="{}""#, escape_html(k), escape_html(v)));
    }
    out
}

/// Appends `class` to the `class` attribute, creating it if needed.
pub fn add_class(attrs: &mut Attrs, class: &str) {
    let class = class.trim();
    if class.is_empty() {
        return;
    }
    attrs
        .entry("class".to_string())
        .and_modify(|existing| {
            if existing.is_empty() {
                existing.push_str(class);
            } else {
                existing.push(' ');
                existing.push_str(class);
            }
        })
        .or_insert_with(|| class.to_string());
}

fn input(kind: &str, name: &str, value: &str, attrs: &Attrs) -> String {
    format!(
        r#"<input type="{kind}" name="{}" value="{}"{} />"#,
        escape_html(name),
        escape_html(value),
        render_attrs(attrs)
    )
}

// ---------------------------------------------------------------------------
// Built-in widgets
// ---------------------------------------------------------------------------

/// A basic `<input type="text">` widget.
#[derive(Debug, Clone)]
pub struct TextInput;

impl Widget for TextInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::TextInput
    }

    fn render(&self, name: &str, value: &FieldValue, attrs: &Attrs) -> String {
        input("text", name, &value.to_string(), attrs)
    }
}

/// A `<input type="password">` widget. Never renders its value.
#[derive(Debug, Clone)]
pub struct PasswordInput;

impl Widget for PasswordInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::PasswordInput
    }

    fn render(&self, name: &str, _value: &FieldValue, attrs: &Attrs) -> String {
        input("password", name, "", attrs)
    }
}

/// A `<input type="hidden">` widget.
#[derive(Debug, Clone)]
pub struct HiddenInput;

impl Widget for HiddenInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::HiddenInput
    }

    fn render(&self, name: &str, value: &FieldValue, attrs: &Attrs) -> String {
        input("hidden", name, &value.to_string(), attrs)
    }
}

/// A `<textarea>` widget.
#[derive(Debug, Clone)]
pub struct Textarea;

impl Widget for Textarea {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Textarea
    }

    fn render(&self, name: &str, value: &FieldValue, attrs: &Attrs) -> String {
        format!(
            r#"<textarea name="{}"{}>{}</textarea>"#,
            escape_html(name),
            render_attrs(attrs),
            escape_html(&value.to_string())
        )
    }
}

/// A text input for an already formatted date string.
#[derive(Debug, Clone)]
pub struct DateInput;

impl Widget for DateInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::DateInput
    }

    fn render(&self, name: &str, value: &FieldValue, attrs: &Attrs) -> String {
        input("text", name, &value.to_string(), attrs)
    }
}

/// A `<input type="checkbox">` widget submitting `submit_value` when ticked.
#[derive(Debug, Clone)]
pub struct CheckboxInput {
    /// The value posted when the box is ticked.
    pub submit_value: String,
}

impl Default for CheckboxInput {
    fn default() -> Self {
        Self {
            submit_value: "1".to_string(),
        }
    }
}

impl Widget for CheckboxInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::CheckboxInput
    }

    fn render(&self, name: &str, value: &FieldValue, attrs: &Attrs) -> String {
        let checked = match value {
            FieldValue::Bool(b) => *b,
            FieldValue::Null => false,
            other => {
                let v = other.to_string();
                v == self.submit_value || v == "true" || v == "on"
            }
        };
        let checked_attr = if checked { r#" checked="checked""# } else { "" };
        format!(
            r#"<input type="checkbox" name="{}" value="{}"{checked_attr}{} />"#,
            escape_html(name),
            escape_html(&self.submit_value),
            render_attrs(attrs)
        )
    }
}

fn render_options(choices: &OptionList, selected: &[String], placeholder: Option<&str>) -> String {
    let mut options = String::new();
    if let Some(placeholder) = placeholder.filter(|p| !p.is_empty()) {
        options.push_str(&format!(r#"<option value="">{}</option>"#, escape_html(placeholder)));
    }
    for (val, label) in choices {
        let selected = if selected.iter().any(|s| s == val) {
            r#" selected="selected""#
        } else {
            ""
        };
        options.push_str(&format!(
            r#"<option value="{}"{selected}>{}</option>"#,
            escape_html(val),
            escape_html(label)
        ));
    }
    options
}

/// A `<select>` widget.
#[derive(Debug, Clone, Default)]
pub struct Select {
    /// The available choices as `(value, display_label)` pairs.
    pub choices: OptionList,
    /// Label of a leading empty option; `None` for no such option.
    pub placeholder: Option<String>,
}

impl Select {
    /// Creates a new `Select` widget with the given choices.
    pub fn new(choices: OptionList) -> Self {
        Self {
            choices,
            placeholder: None,
        }
    }

    /// Adds a leading empty option labelled `placeholder`.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

impl Widget for Select {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Select
    }

    fn render(&self, name: &str, value: &FieldValue, attrs: &Attrs) -> String {
        let selected = value.as_strings();
        let selected = &selected[..selected.len().min(1)];
        format!(
            r#"<select name="{}"{}>{}</select>"#,
            escape_html(name),
            render_attrs(attrs),
            render_options(&self.choices, selected, self.placeholder.as_deref())
        )
    }
}

/// A `<select multiple="multiple">` widget.
#[derive(Debug, Clone, Default)]
pub struct SelectMultiple {
    /// The available choices as `(value, display_label)` pairs.
    pub choices: OptionList,
    /// Label of a leading empty option; `None` for no such option.
    pub placeholder: Option<String>,
}

impl SelectMultiple {
    /// Creates a new `SelectMultiple` widget with the given choices.
    pub fn new(choices: OptionList) -> Self {
        Self {
            choices,
            placeholder: None,
        }
    }

    /// Adds a leading empty option labelled `placeholder`.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }
}

impl Widget for SelectMultiple {
    fn widget_type(&self) -> WidgetType {
        WidgetType::SelectMultiple
    }

    fn render(&self, name: &str, value: &FieldValue, attrs: &Attrs) -> String {
        let selected = value.as_strings();
        format!(
            r#"<select name="{}" multiple="multiple"{}>{}</select>"#,
            escape_html(name),
            render_attrs(attrs),
            render_options(&self.choices, &selected, self.placeholder.as_deref())
        )
    }
}

/// A `<input type="file">` widget. File inputs never carry a value.
#[derive(Debug, Clone)]
pub struct FileInput;

impl Widget for FileInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::FileInput
    }

    fn render(&self, name: &str, _value: &FieldValue, attrs: &Attrs) -> String {
        format!(
            r#"<input type="file" name="{}"{} />"#,
            escape_html(name),
            render_attrs(attrs)
        )
    }
}
