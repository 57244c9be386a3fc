//! Logging integration for formation.
//!
//! Provides a helper for installing a [`tracing`] subscriber from
//! [`FormationSettings`](crate::settings::FormationSettings) and the span
//! that wraps a single render pass.

use crate::settings::FormationSettings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level` (e.g. "debug", "info",
/// "formation_forms=trace"). In debug mode a pretty, human-readable format is
/// used; otherwise a structured JSON format is used. Installing a second
/// subscriber is a no-op.
pub fn setup_logging(settings: &FormationSettings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates the tracing span for one render pass over a form.
///
/// # Examples
///
/// ```
/// use formation_core::logging::render_span;
///
/// let span = render_span(3, Some("email"));
/// let _guard = span.enter();
/// tracing::debug!("rendering");
/// ```
pub fn render_span(field_count: usize, only: Option<&str>) -> tracing::Span {
    tracing::debug_span!("render", fields = field_count, only = only.unwrap_or("*"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_twice_is_harmless() {
        let settings = FormationSettings {
            log_level: "not a valid filter [".into(),
            ..FormationSettings::default()
        };
        setup_logging(&settings);
        setup_logging(&FormationSettings::default());
    }

    #[test]
    fn test_render_span_enters() {
        let span = render_span(2, None);
        let _guard = span.enter();
        tracing::debug!("inside render span");
    }
}
