//! Core error types for formation.
//!
//! [`FormationError`] covers the three ways a form can fail to come together:
//! a field declaration that cannot be turned into a field specification
//! (configuration), a declaration document that cannot be parsed, and an
//! external collaborator (record, option provider, storage) that reported a
//! failure of its own.
//!
//! Fallbacks and silent skips (unparseable dates, unauthorized fields, unknown
//! field types) are not errors and never surface here.

use thiserror::Error;

/// The error type returned by collaborators plugged into a form.
///
/// Collaborators live outside this workspace, so their failures are carried
/// as boxed trait objects and surfaced through
/// [`FormationError::Collaborator`] as the error `source`.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The primary error type for formation.
#[derive(Error, Debug)]
pub enum FormationError {
    // ── Configuration ────────────────────────────────────────────────

    /// A field declaration or setting is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A select field declared none of the supported option sources.
    #[error("Configuration error: select field `{field}` must declare an option source")]
    MissingOptionSource {
        /// The offending field name.
        field: String,
    },

    /// A select field declared more than one option source.
    #[error("Configuration error: select field `{field}` declares several option sources ({})", .sources.join(", "))]
    AmbiguousOptionSource {
        /// The offending field name.
        field: String,
        /// The declared source keys, in declaration order.
        sources: Vec<String>,
    },

    /// An `options_action` reference did not match `Target@method`.
    #[error("Configuration error: invalid action `{action}` on field `{field}`")]
    InvalidAction {
        /// The offending field name.
        field: String,
        /// The action reference as declared.
        action: String,
    },

    /// Two declarations share a field name.
    #[error("Configuration error: duplicate field `{0}`")]
    DuplicateField(String),

    // ── Declarations ─────────────────────────────────────────────────

    /// A declaration document could not be parsed.
    #[error("Declaration error: {0}")]
    Declaration(String),

    // ── Collaborators ────────────────────────────────────────────────

    /// An external collaborator failed.
    #[error("{collaborator} failed: {source}")]
    Collaborator {
        /// Which collaborator failed (e.g. "entity lister").
        collaborator: &'static str,
        /// The collaborator's own error.
        #[source]
        source: CollaboratorError,
    },
}

impl FormationError {
    /// Wraps a collaborator failure.
    pub fn collaborator(collaborator: &'static str, source: CollaboratorError) -> Self {
        Self::Collaborator {
            collaborator,
            source,
        }
    }

    /// Returns `true` for errors raised while loading field declarations.
    ///
    /// These are fatal: the caller has to fix the declaration, retrying will
    /// not help.
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::MissingOptionSource { .. }
                | Self::AmbiguousOptionSource { .. }
                | Self::InvalidAction { .. }
                | Self::DuplicateField(_)
                | Self::Declaration(_)
        )
    }
}

/// A convenience type alias for `Result<T, FormationError>`.
pub type FormationResult<T> = Result<T, FormationError>;
