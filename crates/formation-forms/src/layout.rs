//! Layout composition: labels, help text, and the two-column grid.

use formation_core::utils::text::escape_html;
use formation_core::FormationSettings;

use crate::dispatch::{ExistingFile, Placement, RenderedWidget};
use crate::spec::FieldSpec;

/// Renders the `<label>` for a field.
pub fn label_tag(name: &str, label: &str, settings: &FormationSettings) -> String {
    format!(
        r#"<label for="{}" class="{} control-label">{}</label>"#,
        escape_html(name),
        escape_html(&settings.label_class),
        escape_html(label)
    )
}

/// Renders help text shown under a widget.
pub fn help_tag(help: &str) -> String {
    format!(
        r#"<small class="form-text text-muted">{}</small>"#,
        escape_html(help)
    )
}

/// Wraps a file input with the block showing the currently stored file.
pub fn file_block(input: &str, existing: Option<&ExistingFile>) -> String {
    let mut html = format!(r#"<div><div class="row"><div class="col-md-12">{input}</div></div>"#);
    if let Some(file) = existing {
        html.push_str(&format!(
            r#"<div class="row"><div class="col-sm-2">{} Delete File</div><div class="col-sm-10">Current File: <a href="{}" target="_blank">{}</a></div></div>"#,
            file.delete_checkbox,
            escape_html(&file.url),
            escape_html(&file.label)
        ));
    }
    html.push_str("</div>");
    html
}

/// Composes the final markup for one dispatched field.
///
/// Bare widgets are returned as-is. Everything else becomes
///
/// ```text
/// <div class="form-group row">
///   <label ...>Label</label>
///   <div class="col-sm-8">WIDGET [help]</div>
/// </div>
/// ```
///
/// (without the whitespace).
pub fn compose(field: &FieldSpec, widget: &RenderedWidget, settings: &FormationSettings) -> String {
    let content = match &widget.placement {
        Placement::Bare => return widget.html.clone(),
        Placement::Row => widget.html.clone(),
        Placement::FileRow { existing } => file_block(&widget.html, existing.as_ref()),
    };

    let mut column = content;
    if let Some(help) = field.help.as_deref().filter(|h| !h.is_empty()) {
        column.push('\n');
        column.push_str(&help_tag(help));
    }

    format!(
        r#"<div class="form-group row">{}<div class="{}">{column}</div></div>"#,
        label_tag(&field.name, &field.display_name, settings),
        escape_html(&settings.field_class)
    )
}

/// Renders the cancel/save button block placed after the fields.
pub fn submit_block(cancel_url: &str, settings: &FormationSettings) -> String {
    format!(
        r#"<div class="form-group row"><div class="{} {}"><a href="{}" class="btn btn-secondary pull-right">{}</a><button type="submit" class="btn btn-success text-right">{}</button></div></div>"#,
        escape_html(&settings.field_class),
        escape_html(&settings.label_offset_class()),
        escape_html(cancel_url),
        escape_html(&settings.cancel_label),
        escape_html(&settings.submit_label)
    )
}
