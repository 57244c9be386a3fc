//! Utility functions for formation.
//!
//! - [`text`]: label derivation and string helpers.

pub mod text;
