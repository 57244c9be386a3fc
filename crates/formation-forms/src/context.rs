//! The render context: everything a render pass needs from the outside world.
//!
//! Collaborators are passed explicitly instead of being looked up globally,
//! which keeps visibility and value resolution pure functions of the field
//! and the context. Every collaborator is optional; what happens when one is
//! missing is documented on the matching [`RenderContext`] field.

use std::collections::{HashMap, HashSet};

use formation_core::CollaboratorError;

use crate::options::{EntityLister, ProcedureProvider};
use crate::record::BoundRecord;
use crate::value::FieldValue;

/// Values the user submitted on a previous, failed round trip.
pub trait SubmittedState {
    /// Returns the last submitted value for `name`, if any.
    fn old(&self, name: &str) -> Option<FieldValue>;
}

impl SubmittedState for HashMap<String, FieldValue> {
    fn old(&self, name: &str) -> Option<FieldValue> {
        self.get(name).cloned()
    }
}

impl SubmittedState for HashMap<String, String> {
    fn old(&self, name: &str) -> Option<FieldValue> {
        self.get(name).map(|v| FieldValue::from(v.as_str()))
    }
}

/// Decides whether the current caller may see a role-restricted field.
pub trait PermissionChecker {
    /// Returns `true` if the caller satisfies `roles`.
    fn permits(&self, roles: &[String]) -> bool;
}

/// The roles held by the current caller.
///
/// A field is visible if the caller holds at least one of its roles.
///
/// # Examples
///
/// ```
/// use formation_forms::context::{CallerRoles, PermissionChecker};
///
/// let caller = CallerRoles::new(["editor"]);
/// assert!(caller.permits(&["admin".to_string(), "editor".to_string()]));
/// assert!(!caller.permits(&["admin".to_string()]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerRoles {
    roles: HashSet<String>,
}

impl CallerRoles {
    /// Creates the role set of a caller.
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` if the caller holds `role`.
    pub fn has(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

impl PermissionChecker for CallerRoles {
    fn permits(&self, roles: &[String]) -> bool {
        roles.iter().any(|role| self.has(role))
    }
}

/// Turns a stored file reference into a browsable URL.
pub trait StorageResolver {
    /// Returns the URL of `path` on storage backend `disk`.
    fn url(&self, disk: &str, path: &str) -> Result<String, CollaboratorError>;
}

/// Turns a named route into a concrete URL.
pub trait EndpointResolver {
    /// Returns the URL for `route`.
    fn route_url(&self, route: &str) -> Result<String, CollaboratorError>;
}

/// Renders location (map) fields.
pub trait LocationRenderer {
    /// Renders the widget markup from the field's config and the bound record.
    fn render(
        &self,
        config: Option<&serde_json::Value>,
        record: Option<&dyn BoundRecord>,
    ) -> Result<String, CollaboratorError>;
}

/// Collaborators available to a render pass.
///
/// Built with [`RenderContext::new`] and the `with_*` methods:
///
/// ```
/// use std::collections::HashMap;
/// use formation_forms::context::{CallerRoles, RenderContext};
///
/// let submitted: HashMap<String, String> = HashMap::new();
/// let caller = CallerRoles::new(["admin"]);
/// let ctx = RenderContext::new()
///     .with_submitted(&submitted)
///     .with_permissions(&caller);
/// assert!(ctx.permissions.is_some());
/// ```
#[derive(Clone, Copy, Default)]
pub struct RenderContext<'a> {
    /// Previously submitted input; without it no override happens.
    pub submitted: Option<&'a dyn SubmittedState>,
    /// Permission checks; without it every role-restricted field is hidden.
    pub permissions: Option<&'a dyn PermissionChecker>,
    /// File URL resolution; without it stored references are shown raw.
    pub storage: Option<&'a dyn StorageResolver>,
    /// Remote procedures; required by selects using `options_action`.
    pub procedures: Option<&'a dyn ProcedureProvider>,
    /// Entity listing; required by selects using `options_entity`.
    pub entities: Option<&'a dyn EntityLister>,
    /// Route resolution; required by selects using `options_ajax_data_route`.
    pub endpoints: Option<&'a dyn EndpointResolver>,
    /// Location rendering; without it location fields are skipped.
    pub location: Option<&'a dyn LocationRenderer>,
}

impl<'a> RenderContext<'a> {
    /// Creates a context with no collaborators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the submitted form state.
    #[must_use]
    pub fn with_submitted(mut self, submitted: &'a dyn SubmittedState) -> Self {
        self.submitted = Some(submitted);
        self
    }

    /// Sets the permission checker.
    #[must_use]
    pub fn with_permissions(mut self, permissions: &'a dyn PermissionChecker) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Sets the storage resolver.
    #[must_use]
    pub fn with_storage(mut self, storage: &'a dyn StorageResolver) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets the procedure provider.
    #[must_use]
    pub fn with_procedures(mut self, procedures: &'a dyn ProcedureProvider) -> Self {
        self.procedures = Some(procedures);
        self
    }

    /// Sets the entity lister.
    #[must_use]
    pub fn with_entities(mut self, entities: &'a dyn EntityLister) -> Self {
        self.entities = Some(entities);
        self
    }

    /// Sets the endpoint resolver.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: &'a dyn EndpointResolver) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Sets the location renderer.
    #[must_use]
    pub fn with_location(mut self, location: &'a dyn LocationRenderer) -> Self {
        self.location = Some(location);
        self
    }

    /// Returns `true` if the caller may see a field restricted to `roles`.
    ///
    /// Unrestricted fields are always visible; restricted ones need a
    /// permission checker that accepts them.
    pub fn allows(&self, roles: &[String]) -> bool {
        roles.is_empty() || self.permissions.is_some_and(|p| p.permits(roles))
    }
}
