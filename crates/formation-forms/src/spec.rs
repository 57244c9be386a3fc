//! Validated field specifications.
//!
//! A [`FieldSpec`] is a declaration that passed configuration checks. The
//! field type is a [`FieldKind`] variant carrying only the attributes that
//! type uses, so a select without an option source, or with two of them,
//! cannot be represented.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use formation_core::utils::text::label_from_field_name;
use formation_core::{FormationError, FormationResult};

use crate::declaration::{json_scalar_to_string, json_to_attrs, DateHints, FieldDeclaration, FieldInput};
use crate::options::OptionList;
use crate::value::FieldValue;

/// A reference to a remote procedure, written `Target@method`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRef {
    /// The provider to resolve.
    pub target: String,
    /// The method to invoke on it.
    pub method: String,
    /// Arguments passed to the method; empty means "call with none".
    pub args: Vec<serde_json::Value>,
}

impl ActionRef {
    /// Parses `Target@method` for the named field.
    ///
    /// # Errors
    ///
    /// Returns [`FormationError::InvalidAction`] unless the reference has a
    /// non-empty target and method separated by exactly one `@`.
    pub fn parse(
        field: &str,
        action: &str,
        args: Vec<serde_json::Value>,
    ) -> FormationResult<Self> {
        static ACTION_RE: OnceLock<Regex> = OnceLock::new();
        let re = ACTION_RE.get_or_init(|| Regex::new(r"^([^@]+)@([^@]+)$").unwrap());

        let caps = re
            .captures(action.trim())
            .ok_or_else(|| FormationError::InvalidAction {
                field: field.to_string(),
                action: action.to_string(),
            })?;
        Ok(Self {
            target: caps[1].to_string(),
            method: caps[2].to_string(),
            args,
        })
    }
}

/// Where a select field's options come from.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionSource {
    /// An inline id → label list.
    Static(OptionList),
    /// A remote procedure returning the option list.
    RemoteCall(ActionRef),
    /// Every member of a named entity collection, projected to id → name.
    EntityList(String),
    /// A named route the client loads options from later.
    Deferred(String),
}

/// Select-specific configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectConfig {
    /// The single option source.
    pub source: OptionSource,
    /// Whether several values may be selected.
    pub multiple: bool,
    /// Whether a multiple select posts its values under `name[]`.
    pub group_as_array: bool,
}

/// The type of a field and its type-specific attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Single-line text input.
    Text,
    /// Password input; never shows a value.
    Password,
    /// Multi-line text input.
    Textarea,
    /// Date input driven by a client-side picker.
    Date(DateHints),
    /// Selection from a list of options.
    Select(SelectConfig),
    /// File upload, optionally showing the currently stored file.
    File {
        /// Storage backend the stored reference lives on.
        disk: Option<String>,
    },
    /// A bare value carrier without label or layout.
    Hidden {
        /// Extra HTML attributes.
        attributes: BTreeMap<String, String>,
    },
    /// A map/location widget rendered by an external collaborator.
    Location {
        /// Collaborator configuration, passed through untouched.
        config: Option<serde_json::Value>,
    },
    /// An unrecognized type; such fields are never rendered.
    Custom(String),
}

impl FieldKind {
    /// Returns the declared type name.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Password => "password",
            Self::Textarea => "textarea",
            Self::Date(_) => "date",
            Self::Select(_) => "select",
            Self::File { .. } => "file",
            Self::Hidden { .. } => "hidden",
            Self::Location { .. } => "location",
            Self::Custom(name) => name,
        }
    }
}

/// A validated form field specification.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// The field name, unique within a form.
    pub name: String,
    /// Human-readable label.
    pub display_name: String,
    /// The current (default or bound) value.
    pub value: FieldValue,
    /// Placeholder text; empty for none.
    pub placeholder: String,
    /// Extra HTML attributes for the widget.
    pub attributes: BTreeMap<String, String>,
    /// Extra CSS classes appended to the control class.
    pub class: Option<String>,
    /// Role tokens required to see this field; empty means everyone.
    pub roles: Vec<String>,
    /// Help text shown under the widget.
    pub help: Option<String>,
    /// Relationship supplying identifiers for a multi-valued field.
    pub relationship: Option<String>,
    /// The field type.
    pub kind: FieldKind,
}

impl FieldSpec {
    /// Creates a text field with a derived label and empty value.
    ///
    /// # Examples
    ///
    /// ```
    /// use formation_forms::spec::{FieldKind, FieldSpec};
    ///
    /// let spec = FieldSpec::text("first_name");
    /// assert_eq!(spec.display_name, "First Name");
    /// assert_eq!(spec.kind, FieldKind::Text);
    /// ```
    pub fn text(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: label_from_field_name(&name),
            name,
            value: FieldValue::from(""),
            placeholder: String::new(),
            attributes: BTreeMap::new(),
            class: None,
            roles: Vec::new(),
            help: None,
            relationship: None,
            kind: FieldKind::Text,
        }
    }

    /// Validates an input into a spec.
    ///
    /// Returns `Ok(None)` for declarations with an empty name; those are
    /// dropped rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a select without exactly one option
    /// source, or with a malformed `options_action`.
    pub fn from_input(input: FieldInput) -> FormationResult<Option<Self>> {
        match input {
            FieldInput::Name(name) if name.trim().is_empty() => Ok(None),
            FieldInput::Name(name) => Ok(Some(Self::text(name))),
            FieldInput::Declaration(decl) => Self::from_declaration(*decl),
        }
    }

    /// Validates a full declaration into a spec. See [`FieldSpec::from_input`].
    ///
    /// # Errors
    ///
    /// See [`FieldSpec::from_input`].
    pub fn from_declaration(decl: FieldDeclaration) -> FormationResult<Option<Self>> {
        if decl.name.trim().is_empty() {
            return Ok(None);
        }

        let kind = kind_from_declaration(&decl)?;
        let attributes = decl.attribute_map();
        let display_name = decl
            .display_name
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| label_from_field_name(&decl.name));
        let value = match FieldValue::from_json(&decl.value) {
            FieldValue::Null => FieldValue::from(""),
            other => other,
        };

        Ok(Some(Self {
            name: decl.name,
            display_name,
            value,
            placeholder: decl.placeholder.unwrap_or_default(),
            attributes,
            class: decl.class.filter(|class| !class.is_empty()),
            roles: decl.roles,
            help: decl.help.filter(|help| !help.is_empty()),
            relationship: decl.relationship.filter(|rel| !rel.is_empty()),
            kind,
        }))
    }

    /// Returns `true` for password fields, whose values are never shown.
    pub const fn is_secret(&self) -> bool {
        matches!(self.kind, FieldKind::Password)
    }

    /// Applies per-call overrides, borrowing when there is nothing to apply.
    pub fn with_overrides(&self, overrides: &FieldOverrides) -> Cow<'_, Self> {
        if overrides.is_empty() {
            return Cow::Borrowed(self);
        }

        let mut spec = self.clone();
        if let Some(label) = &overrides.display_name {
            spec.display_name.clone_from(label);
        }
        if let Some(value) = &overrides.value {
            spec.value = value.clone();
        }
        if let Some(placeholder) = &overrides.placeholder {
            spec.placeholder.clone_from(placeholder);
        }
        if let Some(class) = &overrides.class {
            spec.class = Some(class.clone());
        }
        if let Some(help) = &overrides.help {
            spec.help = Some(help.clone());
        }
        if let Some(roles) = &overrides.roles {
            spec.roles.clone_from(roles);
        }
        if let Some(attributes) = &overrides.attributes {
            spec.attributes.clone_from(attributes);
        }
        if let (Some(options), FieldKind::Select(select)) = (&overrides.options, &mut spec.kind) {
            select.source = OptionSource::Static(options.clone());
        }
        Cow::Owned(spec)
    }
}

/// Per-render overrides, shallow-merged onto each rendered field.
///
/// Stored specs are never modified; pair with a single-field filter to tweak
/// one field for one render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOverrides {
    /// Replacement label.
    pub display_name: Option<String>,
    /// Replacement value (submitted form state still wins).
    pub value: Option<FieldValue>,
    /// Replacement placeholder.
    pub placeholder: Option<String>,
    /// Replacement extra classes.
    pub class: Option<String>,
    /// Replacement help text.
    pub help: Option<String>,
    /// Replacement role tokens.
    pub roles: Option<Vec<String>>,
    /// Replacement attribute map.
    pub attributes: Option<BTreeMap<String, String>>,
    /// Replacement static options for select fields.
    pub options: Option<OptionList>,
}

impl FieldOverrides {
    /// Returns `true` if no override is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn kind_from_declaration(decl: &FieldDeclaration) -> FormationResult<FieldKind> {
    let kind = match decl.field_type.as_deref().map(str::trim) {
        None | Some("" | "text") => FieldKind::Text,
        Some("password") => FieldKind::Password,
        Some("textarea") => FieldKind::Textarea,
        Some("date") => FieldKind::Date(decl.data.clone().unwrap_or_default()),
        Some("select") => FieldKind::Select(select_from_declaration(decl)?),
        Some("file") => FieldKind::File {
            disk: decl
                .options
                .as_ref()
                .and_then(|options| options.get("disk"))
                .map(json_scalar_to_string)
                .filter(|disk| !disk.is_empty()),
        },
        Some("hidden") => FieldKind::Hidden {
            attributes: decl.options.as_ref().map(json_to_attrs).unwrap_or_default(),
        },
        Some("location") => FieldKind::Location {
            config: decl.config.clone(),
        },
        Some(other) => FieldKind::Custom(other.to_string()),
    };
    Ok(kind)
}

fn select_from_declaration(decl: &FieldDeclaration) -> FormationResult<SelectConfig> {
    let mut sources: Vec<(&str, OptionSource)> = Vec::new();

    let static_options = decl.options.as_ref().map(options_from_json).unwrap_or_default();
    if !static_options.is_empty() {
        sources.push(("options", OptionSource::Static(static_options)));
    }
    if let Some(action) = non_empty(decl.options_action.as_deref()) {
        let args = decl.options_action_params.clone().unwrap_or_default();
        sources.push((
            "options_action",
            OptionSource::RemoteCall(ActionRef::parse(&decl.name, action, args)?),
        ));
    }
    if let Some(entity) = non_empty(decl.options_entity.as_deref()) {
        sources.push(("options_entity", OptionSource::EntityList(entity.to_string())));
    }
    if let Some(route) = non_empty(decl.options_ajax_data_route.as_deref()) {
        sources.push(("options_ajax_data_route", OptionSource::Deferred(route.to_string())));
    }

    if sources.len() > 1 {
        return Err(FormationError::AmbiguousOptionSource {
            field: decl.name.clone(),
            sources: sources.iter().map(|(key, _)| (*key).to_string()).collect(),
        });
    }
    let (_, source) = sources
        .pop()
        .ok_or_else(|| FormationError::MissingOptionSource {
            field: decl.name.clone(),
        })?;

    Ok(SelectConfig {
        source,
        multiple: decl.multiple,
        group_as_array: decl.group_as_array,
    })
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Reads a static option list from JSON.
///
/// Objects map id → label in document order. Arrays hold either `[id, label]`
/// pairs or bare labels keyed by position.
fn options_from_json(value: &serde_json::Value) -> OptionList {
    match value {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(id, label)| (id.clone(), json_scalar_to_string(label)))
            .collect(),
        serde_json::Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item.as_array().map(Vec::as_slice) {
                Some([id, label]) => (json_scalar_to_string(id), json_scalar_to_string(label)),
                _ => (i.to_string(), json_scalar_to_string(item)),
            })
            .collect(),
        _ => Vec::new(),
    }
}
