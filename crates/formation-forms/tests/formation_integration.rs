//! Integration tests for the declaration -> Formation -> markup pipeline.
//!
//! These tests exercise the public API end to end, covering:
//! 1. Loading fields from names, builders, and JSON/TOML documents
//! 2. Binding records and resolving values
//! 3. Rendering every field type with collaborator fakes
//! 4. Visibility, filters, and overrides

use std::collections::HashMap;

use chrono::NaiveDate;

use formation_core::{CollaboratorError, FormationError, FormationSettings};
use formation_forms::context::{
    CallerRoles, EndpointResolver, LocationRenderer, RenderContext, StorageResolver,
};
use formation_forms::declaration::{declarations_from_json, declarations_from_toml, FieldDeclaration, FieldInput};
use formation_forms::formation::{Formation, RenderOptions};
use formation_forms::options::{EntityLister, ProcedureRegistry};
use formation_forms::record::BoundRecord;
use formation_forms::spec::FieldOverrides;
use formation_forms::value::FieldValue;

// ============================================================================
// Shared helpers
// ============================================================================

/// A project record with a few attributes and a `members` relationship.
struct Project {
    attrs: HashMap<&'static str, FieldValue>,
}

impl Project {
    fn new() -> Self {
        let mut attrs = HashMap::new();
        attrs.insert("title", FieldValue::from("Apollo"));
        attrs.insert("password", FieldValue::from("s3cret-hash"));
        attrs.insert(
            "starts_on",
            FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()),
        );
        attrs.insert("status_id", FieldValue::Int(2));
        attrs.insert("cover", FieldValue::from("covers/apollo.png"));
        Self { attrs }
    }
}

impl BoundRecord for Project {
    fn attribute(&self, name: &str) -> Option<FieldValue> {
        self.attrs.get(name).cloned()
    }

    fn related_ids(&self, relationship: &str) -> Result<Vec<FieldValue>, CollaboratorError> {
        match relationship {
            "members" => Ok(vec![FieldValue::Int(4), FieldValue::Int(6)]),
            other => Err(format!("unknown relationship {other}").into()),
        }
    }
}

struct Storage;

impl StorageResolver for Storage {
    fn url(&self, disk: &str, path: &str) -> Result<String, CollaboratorError> {
        Ok(format!("https://files.example.com/{disk}/{path}"))
    }
}

struct Users;

impl EntityLister for Users {
    fn list_all(&self, entity: &str) -> Result<Vec<serde_json::Value>, CollaboratorError> {
        match entity {
            "User" => Ok((1..=6)
                .map(|id| serde_json::json!({"id": id, "name": format!("User {id}")}))
                .collect()),
            other => Err(format!("no such entity {other}").into()),
        }
    }
}

struct Routes;

impl EndpointResolver for Routes {
    fn route_url(&self, route: &str) -> Result<String, CollaboratorError> {
        Ok(format!("/api/{}", route.replace('.', "/")))
    }
}

struct Map;

impl LocationRenderer for Map {
    fn render(
        &self,
        _config: Option<&serde_json::Value>,
        record: Option<&dyn BoundRecord>,
    ) -> Result<String, CollaboratorError> {
        let title = record
            .and_then(|r| r.attribute("title"))
            .unwrap_or_default();
        Ok(format!(r#"<div class="map">{title}</div>"#))
    }
}

fn statuses() -> ProcedureRegistry {
    let mut registry = ProcedureRegistry::new();
    registry.register("ProjectStatusesRepository", "allAsList", |_args| {
        Ok(vec![
            ("1".to_string(), "Upcoming".to_string()),
            ("2".to_string(), "Active".to_string()),
        ])
    });
    registry
}

/// The full project form used by most tests.
fn project_fields() -> Vec<FieldInput> {
    vec![
        "title".into(),
        FieldDeclaration::new("password").field_type("password").into(),
        FieldDeclaration::new("starts_on").field_type("date").into(),
        FieldDeclaration::new("status_id")
            .field_type("select")
            .options_action("ProjectStatusesRepository@allAsList")
            .into(),
        FieldDeclaration::new("members[]")
            .field_type("select")
            .options_entity("User")
            .relationship("members")
            .multiple()
            .group_as_array(true)
            .into(),
        FieldDeclaration::new("cover")
            .field_type("file")
            .disk("public")
            .into(),
        FieldDeclaration::new("project_id")
            .field_type("hidden")
            .value(42)
            .into(),
    ]
}

fn count_groups(html: &str) -> usize {
    html.matches(r#"<div class="form-group row">"#).count()
}

// ============================================================================
// 1. Loading fields
// ============================================================================

#[test]
fn test_bare_name_renders_text_field() {
    let form = Formation::from_inputs(["first_name"]).unwrap();
    let html = form
        .render(&RenderContext::new(), &RenderOptions::new())
        .unwrap();
    assert_eq!(
        html,
        r#"<div class="form-group row"><label for="first_name" class="col-sm-4 control-label">First Name</label><div class="col-sm-8"><input type="text" name="first_name" value="" class="form-control" id="first_name" /></div></div>"#
    );
}

#[test]
fn test_select_without_source_always_fails() {
    for decl in [
        FieldDeclaration::new("status").field_type("select"),
        FieldDeclaration::new("status")
            .field_type("select")
            .options(serde_json::json!({})),
        FieldDeclaration::new("status")
            .field_type("select")
            .options_entity("  "),
    ] {
        let err = Formation::from_inputs([decl]).unwrap_err();
        assert!(
            matches!(err, FormationError::MissingOptionSource { ref field } if field == "status")
        );
        assert!(err.is_configuration());
    }
}

#[test]
fn test_load_from_json_document() {
    let inputs = declarations_from_json(
        r#"{"fields": [
            "first_name",
            {"name": "bio", "type": "textarea", "help": "Keep it short"},
            {"name": "role", "type": "select", "options": {"admin": "Admin", "editor": "Editor"}}
        ]}"#,
    )
    .unwrap();
    let form = Formation::from_inputs(inputs).unwrap();
    let html = form
        .render(&RenderContext::new(), &RenderOptions::new())
        .unwrap();
    assert_eq!(count_groups(&html), 3);
    assert!(html.contains(r#"<textarea name="bio" class="form-control" id="bio"></textarea>"#));
    assert!(html.contains(r#"<small class="form-text text-muted">Keep it short</small>"#));
    let admin = html.find(r#"value="admin""#).unwrap();
    let editor = html.find(r#"value="editor""#).unwrap();
    assert!(admin < editor);
}

#[test]
fn test_load_from_toml_document() {
    let inputs = declarations_from_toml(
        r#"
        [[fields]]
        name = "size"
        type = "select"
        options = { s = "Small", m = "Medium", l = "Large" }

        [[fields]]
        name = "notes"
        type = "textarea"
        "#,
    )
    .unwrap();
    let form = Formation::from_inputs(inputs).unwrap();
    let html = form
        .render(&RenderContext::new(), &RenderOptions::new())
        .unwrap();
    let s = html.find(r#"value="s""#).unwrap();
    let m = html.find(r#"value="m""#).unwrap();
    let l = html.find(r#"value="l""#).unwrap();
    assert!(s < m && m < l);
}

#[test]
fn test_duplicate_names_fail_configuration() {
    let err = Formation::from_inputs([
        FieldInput::from("email"),
        FieldDeclaration::new("email").field_type("textarea").into(),
    ])
    .unwrap_err();
    assert!(matches!(err, FormationError::DuplicateField(ref n) if n == "email"));
}

// ============================================================================
// 2. Binding and value resolution
// ============================================================================

#[test]
fn test_bind_resolves_record_values() {
    let project = Project::new();
    let mut form = Formation::from_inputs(project_fields()).unwrap();
    form.bind_record(&project).unwrap();

    assert_eq!(form.field("title").unwrap().value, FieldValue::from("Apollo"));
    assert_eq!(
        form.field("members[]").unwrap().value,
        FieldValue::from(vec![4_i64, 6])
    );
    // no attribute: the declared default survives
    assert_eq!(form.field("project_id").unwrap().value, FieldValue::Int(42));
}

#[test]
fn test_set_field_value_then_resolve() {
    let mut form = Formation::from_inputs(["title"]).unwrap();
    assert!(form.set_field_value("title", "Gemini"));
    assert_eq!(
        form.resolve_value("title", &RenderContext::new()).unwrap(),
        Some(FieldValue::from("Gemini"))
    );
}

#[test]
fn test_submitted_value_beats_bound_value() {
    let project = Project::new();
    let form = {
        let mut form = Formation::from_inputs(["title"]).unwrap();
        form.bind_record(&project).unwrap();
        form
    };
    let mut submitted = HashMap::new();
    submitted.insert("title".to_string(), "Apollo 11".to_string());
    let ctx = RenderContext::new().with_submitted(&submitted);

    let html = form.render(&ctx, &RenderOptions::new()).unwrap();
    assert!(html.contains(r#"value="Apollo 11""#));
    assert!(!html.contains(r#"value="Apollo""#));
}

#[test]
fn test_password_never_output() {
    let project = Project::new();
    let form = Formation::from_inputs([FieldDeclaration::new("password").field_type("password")]);
    let mut form = form.unwrap();
    form.bind_record(&project).unwrap();

    let mut submitted = HashMap::new();
    submitted.insert("password".to_string(), "typed-secret".to_string());
    let ctx = RenderContext::new().with_submitted(&submitted);

    let html = form.render(&ctx, &RenderOptions::new()).unwrap();
    assert!(!html.contains("s3cret-hash"));
    assert!(!html.contains("typed-secret"));
    assert!(html.contains(r#"<input type="password" name="password" value="""#));
}

// ============================================================================
// 3. Field types
// ============================================================================

#[test]
fn test_full_project_form() {
    let project = Project::new();
    let registry = statuses();
    let mut form = Formation::from_inputs(project_fields()).unwrap();
    form.bind_record(&project).unwrap();

    let ctx = RenderContext::new()
        .with_procedures(&registry)
        .with_entities(&Users)
        .with_storage(&Storage);
    let html = form.render(&ctx, &RenderOptions::new()).unwrap();

    // every field except the hidden one gets a group
    assert_eq!(count_groups(&html), 6);
    assert!(html.ends_with(r#"<input type="hidden" name="project_id" value="42" />"#));

    // date
    assert!(html.contains(r#"value="09/Mar/2024""#));
    assert!(html.contains(r#"data-default-date="09/Mar/2024""#));

    // select from a procedure
    assert!(html.contains(r#"<option value="2" selected="selected">Active</option>"#));

    // multi-select from an entity list, with relationship ids selected
    assert!(html.contains(r#"<select name="members[]" multiple="multiple""#));
    assert!(html.contains(r#"<option value="4" selected="selected">User 4</option>"#));
    assert!(html.contains(r#"<option value="5">User 5</option>"#));

    // file through the storage resolver
    assert!(html.contains(
        r#"Current File: <a href="https://files.example.com/public/covers/apollo.png" target="_blank">covers/apollo.png</a>"#
    ));
    assert!(html.contains(r#"name="cover_delete_file""#));
    assert_eq!(form.enctype(), "multipart/form-data");
}

#[test]
fn test_file_raw_reference_verbatim() {
    let mut form = Formation::from_inputs([FieldDeclaration::new("photo").field_type("file")]).unwrap();
    form.set_field_value("photo", "photo.png");
    let html = form
        .render(&RenderContext::new(), &RenderOptions::new())
        .unwrap();
    assert!(html.contains(r#"<a href="photo.png" target="_blank">photo.png</a>"#));
}

#[test]
fn test_file_absolute_url_ignores_disk() {
    let mut form = Formation::from_inputs([FieldDeclaration::new("photo")
        .field_type("file")
        .disk("s3")])
    .unwrap();
    form.set_field_value("photo", "http://x/y.png");
    let ctx = RenderContext::new().with_storage(&Storage);
    let html = form.render(&ctx, &RenderOptions::new()).unwrap();
    assert!(html.contains(r#"<a href="http://x/y.png" target="_blank">http://x/y.png</a>"#));
}

#[test]
fn test_unparseable_date_kept() {
    let mut form = Formation::from_inputs([FieldDeclaration::new("due").field_type("date")]).unwrap();
    form.set_field_value("due", "not-a-date");
    let html = form
        .render(&RenderContext::new(), &RenderOptions::new())
        .unwrap();
    assert!(html.contains(r#"value="not-a-date""#));
}

#[test]
fn test_deferred_select_attaches_route() {
    let form = Formation::from_inputs([
        FieldDeclaration::new("owner_id")
            .field_type("select")
            .options_ajax_data_route("users.search"),
        FieldDeclaration::new("reviewer_id")
            .field_type("select")
            .options_ajax_data_route("users.search")
            .class("custom-picker"),
    ])
    .unwrap();
    let ctx = RenderContext::new().with_endpoints(&Routes);
    let html = form.render(&ctx, &RenderOptions::new()).unwrap();
    assert!(html.contains(
        r#"<select name="owner_id" class="form-control select2 js-select2-ajax" data-ajax-route="/api/users/search" id="owner_id"></select>"#
    ));
    assert!(html.contains(r#"class="form-control custom-picker" data-ajax-route="/api/users/search""#));
}

#[test]
fn test_missing_procedure_provider_is_configuration_error() {
    let form = Formation::from_inputs([FieldDeclaration::new("status_id")
        .field_type("select")
        .options_action("ProjectStatusesRepository@allAsList")])
    .unwrap();
    let err = form
        .render(&RenderContext::new(), &RenderOptions::new())
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_collaborator_failure_propagates() {
    let form = Formation::from_inputs([FieldDeclaration::new("team")
        .field_type("select")
        .options_entity("Team")])
    .unwrap();
    let ctx = RenderContext::new().with_entities(&Users);
    let err = form.render(&ctx, &RenderOptions::new()).unwrap_err();
    assert!(matches!(err, FormationError::Collaborator { .. }));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_location_uses_bound_record() {
    let project = Project::new();
    let form = {
        let mut form = Formation::from_inputs([
            FieldInput::from("title"),
            FieldDeclaration::new("venue").field_type("location").into(),
        ])
        .unwrap();
        form.bind_record(&project).unwrap();
        form
    };

    let without = form
        .render(&RenderContext::new(), &RenderOptions::new())
        .unwrap();
    assert_eq!(count_groups(&without), 1);

    let ctx = RenderContext::new().with_location(&Map);
    let with = form.render(&ctx, &RenderOptions::new()).unwrap();
    assert_eq!(count_groups(&with), 2);
    assert!(with.contains(r#"<div class="map">Apollo</div>"#));
}

#[test]
fn test_unknown_type_silently_skipped() {
    let form = Formation::from_inputs([
        FieldInput::from("title"),
        FieldDeclaration::new("swatch").field_type("colour").into(),
    ])
    .unwrap();
    let html = form
        .render(&RenderContext::new(), &RenderOptions::new())
        .unwrap();
    assert_eq!(count_groups(&html), 1);
    assert!(!html.contains("swatch"));
}

// ============================================================================
// 4. Visibility, filters, overrides
// ============================================================================

#[test]
fn test_render_excludes_and_unauthorized() {
    let form = Formation::from_inputs([
        FieldInput::from("a"),
        FieldDeclaration::new("b").roles(["admin"]).into(),
        FieldInput::from("c"),
        FieldDeclaration::new("d").roles(["admin", "owner"]).into(),
        FieldInput::from("e"),
    ])
    .unwrap();
    let owner = CallerRoles::new(["owner"]);
    let ctx = RenderContext::new().with_permissions(&owner);
    let html = form
        .render(&ctx, &RenderOptions::new().except(["c"]))
        .unwrap();

    assert_eq!(count_groups(&html), 3);
    let order: Vec<usize> = ["a", "d", "e"]
        .iter()
        .map(|n| html.find(&format!(r#"name="{n}""#)).unwrap())
        .collect();
    assert!(order.windows(2).all(|w| w[0] < w[1]));
    assert!(!html.contains(r#"name="b""#));
    assert!(!html.contains(r#"name="c""#));
}

#[test]
fn test_single_field_override() {
    let form = Formation::from_inputs(["title", "summary"]).unwrap();
    let options = RenderOptions::new().only("summary").overrides(FieldOverrides {
        display_name: Some("Abstract".into()),
        placeholder: Some("One paragraph".into()),
        ..FieldOverrides::default()
    });
    let html = form.render(&RenderContext::new(), &options).unwrap();
    assert_eq!(count_groups(&html), 1);
    assert!(html.contains(">Abstract</label>"));
    assert!(html.contains(r#"placeholder="One paragraph""#));
    assert_eq!(form.field("summary").unwrap().display_name, "Summary");
}

#[test]
fn test_has_file_field() {
    let plain = Formation::from_inputs(["title"]).unwrap();
    assert!(!plain.has_file_field());
    let with_file = Formation::from_inputs(project_fields()).unwrap();
    assert!(with_file.has_file_field());
}

#[test]
fn test_custom_settings_flow_into_markup() {
    let settings = FormationSettings {
        label_class: "col-md-2".into(),
        field_class: "col-md-10".into(),
        cancel_label: "Back".into(),
        ..FormationSettings::default()
    };
    let form = Formation::from_inputs(["title"])
        .unwrap()
        .with_settings(settings);
    let html = form
        .render(&RenderContext::new(), &RenderOptions::new())
        .unwrap();
    assert!(html.contains(r#"class="col-md-2 control-label""#));
    assert!(html.contains(r#"<div class="col-md-10">"#));
    let submit = form.render_submit("/projects");
    assert!(submit.contains(r#"<div class="col-md-10 offset-md-2">"#));
    assert!(submit.contains(r#"<a href="/projects" class="btn btn-secondary pull-right">Back</a>"#));
}
