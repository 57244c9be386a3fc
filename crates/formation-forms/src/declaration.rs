//! Field declarations: the loose input format for field specifications.
//!
//! A declaration is what a caller writes down: a bare field name, or a record
//! of optional keys (`type`, `display_name`, `options_action`, ...). It is
//! deliberately permissive so it can be read straight from JSON or TOML.
//! [`FieldSpec`](crate::spec::FieldSpec) is the validated form; conversion
//! happens when fields are loaded into a [`Formation`](crate::formation::Formation).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use formation_core::settings_loader::toml_to_json;
use formation_core::{FormationError, FormationResult};

/// One entry of a field list: a bare name or a full declaration.
///
/// # Examples
///
/// ```
/// use formation_forms::declaration::FieldInput;
///
/// let inputs: Vec<FieldInput> =
///     serde_json::from_str(r#"["first_name", {"name": "bio", "type": "textarea"}]"#).unwrap();
/// assert_eq!(inputs.len(), 2);
/// assert_eq!(inputs[0].name(), "first_name");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldInput {
    /// Just a field name; everything else is defaulted.
    Name(String),
    /// A full declaration.
    Declaration(Box<FieldDeclaration>),
}

impl FieldInput {
    /// Returns the declared field name.
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Declaration(decl) => &decl.name,
        }
    }
}

impl From<&str> for FieldInput {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for FieldInput {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<FieldDeclaration> for FieldInput {
    fn from(decl: FieldDeclaration) -> Self {
        Self::Declaration(Box::new(decl))
    }
}

/// Date picker hints declared under a date field's `data` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateHints {
    /// Earliest selectable date, passed through to the picker.
    pub min_date: Option<String>,
    /// Latest selectable date, passed through to the picker.
    pub max_date: Option<String>,
    /// Client-side picker format overriding the configured default.
    pub date_format: Option<String>,
}

/// A loosely-typed field declaration.
///
/// Every key is optional except `name`. `options` means different things per
/// type: an id → label map for selects, `{"disk": ...}` for files, and extra
/// HTML attributes for hidden fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDeclaration {
    /// The field name.
    pub name: String,
    /// The field type (`text` when absent).
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    /// Human-readable label.
    pub display_name: Option<String>,
    /// Default value.
    pub value: serde_json::Value,
    /// Placeholder text.
    pub placeholder: Option<String>,
    /// Extra HTML attributes: a map, a list of bare attribute names, or one name.
    pub attributes: Option<serde_json::Value>,
    /// Extra CSS classes appended to the control class.
    pub class: Option<String>,
    /// Role tokens required to see this field.
    #[serde(deserialize_with = "one_or_many")]
    pub roles: Vec<String>,
    /// Help text shown under the widget.
    pub help: Option<String>,
    /// Relationship supplying identifiers for a multi-valued field.
    pub relationship: Option<String>,
    /// Type-dependent options (see the type docs above).
    pub options: Option<serde_json::Value>,
    /// Remote procedure reference of the form `Target@method`.
    pub options_action: Option<String>,
    /// Arguments passed to the remote procedure.
    pub options_action_params: Option<Vec<serde_json::Value>>,
    /// Entity collection listed for options.
    pub options_entity: Option<String>,
    /// Named route loaded client-side for options.
    pub options_ajax_data_route: Option<String>,
    /// Whether a select accepts several values.
    #[serde(deserialize_with = "flag")]
    pub multiple: bool,
    /// Whether a multiple select posts its values as an array.
    #[serde(deserialize_with = "flag")]
    pub group_as_array: bool,
    /// Date picker hints.
    pub data: Option<DateHints>,
    /// Configuration handed to the location collaborator.
    pub config: Option<serde_json::Value>,
}

impl FieldDeclaration {
    /// Creates a declaration with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the field type.
    #[must_use]
    pub fn field_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = Some(field_type.into());
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn display_name(mut self, label: impl Into<String>) -> Self {
        self.display_name = Some(label.into());
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn value(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.value = value.into();
        self
    }

    /// Sets the placeholder.
    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Sets extra CSS classes.
    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Sets the required role tokens.
    #[must_use]
    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the relationship supplying identifiers.
    #[must_use]
    pub fn relationship(mut self, relationship: impl Into<String>) -> Self {
        self.relationship = Some(relationship.into());
        self
    }

    /// Sets the raw `options` value.
    #[must_use]
    pub fn options(mut self, options: serde_json::Value) -> Self {
        self.options = Some(options);
        self
    }

    /// Sets a static id → label option list, keeping the given order.
    #[must_use]
    pub fn static_options<I, K, V>(self, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: serde_json::Map<String, serde_json::Value> = options
            .into_iter()
            .map(|(k, v)| (k.into(), serde_json::Value::String(v.into())))
            .collect();
        self.options(serde_json::Value::Object(map))
    }

    /// Sets a remote procedure option source.
    #[must_use]
    pub fn options_action(mut self, action: impl Into<String>) -> Self {
        self.options_action = Some(action.into());
        self
    }

    /// Sets the remote procedure arguments.
    #[must_use]
    pub fn options_action_params(mut self, params: Vec<serde_json::Value>) -> Self {
        self.options_action_params = Some(params);
        self
    }

    /// Sets an entity collection option source.
    #[must_use]
    pub fn options_entity(mut self, entity: impl Into<String>) -> Self {
        self.options_entity = Some(entity.into());
        self
    }

    /// Sets a deferred (AJAX) option source.
    #[must_use]
    pub fn options_ajax_data_route(mut self, route: impl Into<String>) -> Self {
        self.options_ajax_data_route = Some(route.into());
        self
    }

    /// Marks a select as accepting several values.
    #[must_use]
    pub const fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Sets whether a multiple select posts its values as an array.
    #[must_use]
    pub const fn group_as_array(mut self, group: bool) -> Self {
        self.group_as_array = group;
        self
    }

    /// Sets date picker hints.
    #[must_use]
    pub fn date_hints(mut self, hints: DateHints) -> Self {
        self.data = Some(hints);
        self
    }

    /// Sets the storage disk of a file field.
    #[must_use]
    pub fn disk(self, disk: impl Into<String>) -> Self {
        self.options(serde_json::json!({ "disk": disk.into() }))
    }

    /// Sets the location collaborator configuration.
    #[must_use]
    pub fn config(mut self, config: serde_json::Value) -> Self {
        self.config = Some(config);
        self
    }

    /// Normalizes `attributes` into an attribute map.
    ///
    /// List entries and a bare string become boolean-style attributes whose
    /// value repeats the name (`required="required"`).
    pub fn attribute_map(&self) -> BTreeMap<String, String> {
        self.attributes
            .as_ref()
            .map(json_to_attrs)
            .unwrap_or_default()
    }
}

/// Converts a JSON attribute specification into an attribute map.
pub(crate) fn json_to_attrs(value: &serde_json::Value) -> BTreeMap<String, String> {
    let mut attrs = BTreeMap::new();
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                attrs.insert(key.clone(), json_scalar_to_string(val));
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                let name = json_scalar_to_string(item);
                attrs.insert(name.clone(), name);
            }
        }
        serde_json::Value::Null => {}
        other => {
            let name = json_scalar_to_string(other);
            attrs.insert(name.clone(), name);
        }
    }
    attrs
}

/// Renders a JSON scalar without the quotes `to_string` puts around strings.
pub(crate) fn json_scalar_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Accepts either a single string or a list of strings.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        None(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::None(()) => Vec::new(),
    })
}

/// Accepts a boolean or a truthy scalar (`"multiple"`, `1`, `"yes"`).
///
/// Null, `0`, `""`, `"0"` and `"false"` are false.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(false),
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::Number(n) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
        serde_json::Value::String(s) => Ok(!matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "" | "0" | "false"
        )),
        other => Err(D::Error::custom(format!(
            "expected a boolean flag, found {other}"
        ))),
    }
}

/// A declaration document: either a bare list or `{ "fields": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    List(Vec<FieldInput>),
    Table { fields: Vec<FieldInput> },
}

impl From<Document> for Vec<FieldInput> {
    fn from(doc: Document) -> Self {
        match doc {
            Document::List(fields) | Document::Table { fields } => fields,
        }
    }
}

/// Parses field declarations from a JSON document.
///
/// The document is either an array of inputs or an object with a `fields`
/// array.
///
/// # Errors
///
/// Returns [`FormationError::Declaration`] if the document is malformed.
pub fn declarations_from_json(json: &str) -> FormationResult<Vec<FieldInput>> {
    let doc: Document = serde_json::from_str(json)
        .map_err(|e| FormationError::Declaration(format!("Failed to parse JSON: {e}")))?;
    Ok(doc.into())
}

/// Parses field declarations from a TOML document with a `fields` array.
///
/// ```toml
/// [[fields]]
/// name = "first_name"
///
/// [[fields]]
/// name = "status"
/// type = "select"
/// options = { draft = "Draft", live = "Live" }
/// ```
///
/// # Errors
///
/// Returns [`FormationError::Declaration`] if the document is malformed.
pub fn declarations_from_toml(toml_str: &str) -> FormationResult<Vec<FieldInput>> {
    let value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| FormationError::Declaration(format!("Failed to parse TOML: {e}")))?;
    let doc: Document = serde_json::from_value(toml_to_json(value)).map_err(|e| {
        FormationError::Declaration(format!("Failed to read declarations from TOML: {e}"))
    })?;
    Ok(doc.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_json_list() {
        let inputs = declarations_from_json(
            r#"[
                "first_name",
                {"name": "status", "type": "select", "options": {"2": "Live", "1": "Draft"}},
                {"name": "admin_note", "roles": "admin"}
            ]"#,
        )
        .unwrap();
        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs[0], FieldInput::Name("first_name".into()));
        let FieldInput::Declaration(status) = &inputs[1] else {
            panic!("expected a declaration");
        };
        assert_eq!(status.field_type.as_deref(), Some("select"));
        // document order survives
        let keys: Vec<&String> = status.options.as_ref().unwrap().as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["2", "1"]);
        let FieldInput::Declaration(note) = &inputs[2] else {
            panic!("expected a declaration");
        };
        assert_eq!(note.roles, vec!["admin".to_string()]);
    }

    #[test]
    fn test_parse_json_fields_table() {
        let inputs = declarations_from_json(r#"{"fields": ["a", "b"]}"#).unwrap();
        let names: Vec<&str> = inputs.iter().map(FieldInput::name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_json_invalid() {
        let err = declarations_from_json(r#"{"fields": 3}"#).unwrap_err();
        assert!(matches!(err, FormationError::Declaration(_)));
    }

    #[test]
    fn test_parse_toml() {
        let inputs = declarations_from_toml(
            r#"
            [[fields]]
            name = "published_on"
            type = "date"
            data = { min_date = "2020-01-01" }

            [[fields]]
            name = "tags[]"
            type = "select"
            options_entity = "Tag"
            multiple = true
            relationship = "tags"
            "#,
        )
        .unwrap();
        assert_eq!(inputs.len(), 2);
        let FieldInput::Declaration(date) = &inputs[0] else {
            panic!("expected a declaration");
        };
        assert_eq!(
            date.data.as_ref().and_then(|d| d.min_date.as_deref()),
            Some("2020-01-01")
        );
        let FieldInput::Declaration(tags) = &inputs[1] else {
            panic!("expected a declaration");
        };
        assert!(tags.multiple);
        assert_eq!(tags.relationship.as_deref(), Some("tags"));
    }

    #[test]
    fn test_parse_toml_invalid() {
        assert!(declarations_from_toml("fields = [").is_err());
    }

    #[test]
    fn test_truthy_flags() {
        let inputs = declarations_from_json(
            r#"[
                {"name": "tags", "type": "select", "options": {"1": "a"}, "multiple": "multiple"},
                {"name": "labels", "type": "select", "options": {"1": "a"}, "multiple": 1, "group_as_array": "1"},
                {"name": "owner", "type": "select", "options": {"1": "a"}, "multiple": 0, "group_as_array": null},
                {"name": "status", "type": "select", "options": {"1": "a"}, "multiple": "false"}
            ]"#,
        )
        .unwrap();
        let flags: Vec<(bool, bool)> = inputs
            .iter()
            .map(|input| match input {
                FieldInput::Declaration(decl) => (decl.multiple, decl.group_as_array),
                FieldInput::Name(_) => panic!("expected a declaration"),
            })
            .collect();
        assert_eq!(flags, vec![(true, false), (true, true), (false, false), (false, false)]);
    }

    #[test]
    fn test_flag_rejects_structures() {
        let err = declarations_from_json(r#"[{"name": "tags", "multiple": {"on": true}}]"#).unwrap_err();
        assert!(matches!(err, FormationError::Declaration(_)));
    }

    #[test]
    fn test_attribute_map_shapes() {
        let decl = FieldDeclaration {
            attributes: Some(serde_json::json!({"maxlength": 20, "data-x": "y"})),
            ..FieldDeclaration::new("a")
        };
        let attrs = decl.attribute_map();
        assert_eq!(attrs.get("maxlength").map(String::as_str), Some("20"));
        assert_eq!(attrs.get("data-x").map(String::as_str), Some("y"));

        let decl = FieldDeclaration {
            attributes: Some(serde_json::json!("required")),
            ..FieldDeclaration::new("a")
        };
        assert_eq!(
            decl.attribute_map().get("required").map(String::as_str),
            Some("required")
        );

        let decl = FieldDeclaration {
            attributes: Some(serde_json::json!(["readonly", "autofocus"])),
            ..FieldDeclaration::new("a")
        };
        assert_eq!(decl.attribute_map().len(), 2);
    }

    #[test]
    fn test_builder() {
        let decl = FieldDeclaration::new("status")
            .field_type("select")
            .static_options([("b", "Beta"), ("a", "Alpha")])
            .multiple()
            .group_as_array(true)
            .roles(["admin", "editor"]);
        assert!(decl.multiple && decl.group_as_array);
        assert_eq!(decl.roles.len(), 2);
        let keys: Vec<&String> = decl.options.as_ref().unwrap().as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
