//! # formation-core
//!
//! Core types, settings, logging, and error types for formation.
//! This crate knows nothing about fields or widgets; it is the foundation the
//! forms crate builds on.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Rendering settings
//! - [`settings_loader`] - Loading settings from TOML/JSON and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`utils`] - Text helpers (label derivation)

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{CollaboratorError, FormationError, FormationResult};
pub use settings::FormationSettings;
