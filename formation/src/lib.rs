//! # formation
//!
//! A declarative form-field rendering engine.
//!
//! This is the meta-crate that re-exports the sub-crates. Depend on
//! `formation` for everything, or on the individual crates for finer-grained
//! control.
//!
//! ```
//! use formation::prelude::*;
//!
//! let form = Formation::from_inputs(["first_name", "email"]).unwrap();
//! let html = form.render(&RenderContext::new(), &RenderOptions::new()).unwrap();
//! assert!(html.contains("First Name"));
//! ```

/// Error types, settings, logging, and text helpers.
pub use formation_core as core;

/// Field specifications, value resolution, widgets, and layout.
pub use formation_forms as forms;

/// Date types used by [`FieldValue`](formation_forms::FieldValue).
pub use chrono;

/// JSON values used in declarations and collaborator calls.
pub use serde_json;

/// The types most applications need.
pub mod prelude {
    pub use formation_core::{CollaboratorError, FormationError, FormationResult, FormationSettings};
    pub use formation_forms::{
        BoundRecord, CallerRoles, FieldDeclaration, FieldInput, FieldOverrides, FieldValue,
        Formation, RenderContext, RenderOptions,
    };
}
