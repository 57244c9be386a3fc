//! Rendering settings for formation.
//!
//! [`FormationSettings`] holds the CSS classes, date formats and labels that
//! shape the generated markup. Every form carries its own copy, so two forms
//! on one page can use different layouts. The defaults produce a Bootstrap
//! horizontal form (`col-sm-4` labels, `col-sm-8` controls).

use serde::{Deserialize, Serialize};

/// The complete set of rendering settings.
///
/// # Examples
///
/// ```
/// use formation_core::settings::FormationSettings;
///
/// let settings = FormationSettings::default();
/// assert_eq!(settings.label_class, "col-sm-4");
/// assert_eq!(settings.field_class, "col-sm-8");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationSettings {
    // ── Layout ───────────────────────────────────────────────────────

    /// Column class applied to every `<label>`.
    pub label_class: String,
    /// Column class applied to the content column holding the widget.
    pub field_class: String,
    /// Class applied to every form control.
    pub control_class: String,

    // ── Dates ────────────────────────────────────────────────────────

    /// `chrono` format used to display date values.
    pub date_display_format: String,
    /// Client-side date picker format sent as `data-date-format`.
    pub date_picker_format: String,
    /// Marker class that activates the client-side date picker.
    pub date_picker_class: String,

    // ── Selects ──────────────────────────────────────────────────────

    /// Classes added to deferred (AJAX) selects that carry no custom class.
    pub ajax_select_class: String,

    // ── Actions ──────────────────────────────────────────────────────

    /// Label of the submit button.
    pub submit_label: String,
    /// Label of the cancel link.
    pub cancel_label: String,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level (e.g. "info", "debug", "warn").
    pub log_level: String,
    /// Whether debug mode is enabled (human-readable logs).
    pub debug: bool,
}

impl Default for FormationSettings {
    fn default() -> Self {
        Self {
            // Layout
            label_class: "col-sm-4".to_string(),
            field_class: "col-sm-8".to_string(),
            control_class: "form-control".to_string(),

            // Dates
            date_display_format: "%d/%b/%Y".to_string(),
            date_picker_format: "DD/MMM/YYYY".to_string(),
            date_picker_class: "js-datepicker".to_string(),

            // Selects
            ajax_select_class: "select2 js-select2-ajax".to_string(),

            // Actions
            submit_label: "Save".to_string(),
            cancel_label: "Cancel".to_string(),

            // Logging
            log_level: "info".to_string(),
            debug: false,
        }
    }
}

impl FormationSettings {
    /// Returns the offset class that aligns a label-less row with the
    /// content column, e.g. `offset-sm-4` for `col-sm-4`.
    pub fn label_offset_class(&self) -> String {
        self.label_class
            .strip_prefix("col-")
            .map_or_else(String::new, |rest| format!("offset-{rest}"))
    }
}
