//! # formation-forms
//!
//! Declarative form fields for formation: field specifications in, form
//! markup out.
//!
//! ## Modules
//!
//! - [`value`] - Field values
//! - [`declaration`] - Serde-friendly field declarations and document loading
//! - [`spec`] - Validated field specifications and per-type attributes
//! - [`record`] - The bound record trait
//! - [`context`] - Render context and collaborator traits
//! - [`resolver`] - Value resolution chains
//! - [`options`] - Select option sources
//! - [`widgets`] - HTML controls
//! - [`dispatch`] - Per-type rendering policies
//! - [`layout`] - Labels, help text, and the grid wrapper
//! - [`formation`] - The [`Formation`] aggregate

pub mod context;
pub mod declaration;
pub mod dispatch;
pub mod formation;
pub mod layout;
pub mod options;
pub mod record;
pub mod resolver;
pub mod spec;
pub mod value;
pub mod widgets;

pub use context::{
    CallerRoles, EndpointResolver, LocationRenderer, PermissionChecker, RenderContext,
    StorageResolver, SubmittedState,
};
pub use declaration::{declarations_from_json, declarations_from_toml, DateHints, FieldDeclaration, FieldInput};
pub use formation::{Formation, RenderOptions};
pub use options::{EntityLister, OptionList, ProcedureProvider, ProcedureRegistry};
pub use record::BoundRecord;
pub use spec::{ActionRef, FieldKind, FieldOverrides, FieldSpec, OptionSource, SelectConfig};
pub use value::FieldValue;
