//! Option source resolution for select fields.
//!
//! Each [`OptionSource`] variant maps to one way of producing the option
//! list: used as declared, fetched from a [`ProcedureProvider`], listed from an
//! [`EntityLister`], or deferred to the client through an
//! [`EndpointResolver`](crate::context::EndpointResolver).

use std::collections::HashMap;
use std::fmt;

use formation_core::{CollaboratorError, FormationError, FormationResult};

use crate::context::RenderContext;
use crate::declaration::json_scalar_to_string;
use crate::spec::{ActionRef, OptionSource};
use crate::value::FieldValue;

/// Options as `(value, display_label)` pairs, in display order.
pub type OptionList = Vec<(String, String)>;

/// Invokes named procedures that produce option lists.
pub trait ProcedureProvider {
    /// Calls `method` on `target` with `args` (empty for a no-argument call).
    fn call(
        &self,
        target: &str,
        method: &str,
        args: &[serde_json::Value],
    ) -> Result<OptionList, CollaboratorError>;
}

/// Lists every member of a named entity collection.
pub trait EntityLister {
    /// Returns all rows of `entity`. Rows are JSON objects with at least an
    /// `id` and usually a `name`.
    fn list_all(&self, entity: &str) -> Result<Vec<serde_json::Value>, CollaboratorError>;
}

type Procedure = Box<dyn Fn(&[serde_json::Value]) -> Result<OptionList, CollaboratorError>>;

/// A [`ProcedureProvider`] backed by closures registered per `Target@method`.
///
/// # Examples
///
/// ```
/// use formation_forms::options::{ProcedureProvider, ProcedureRegistry};
///
/// let mut registry = ProcedureRegistry::new();
/// registry.register("StatusRepository", "allAsList", |_args| {
///     Ok(vec![("1".to_string(), "Upcoming".to_string())])
/// });
/// let options = registry.call("StatusRepository", "allAsList", &[]).unwrap();
/// assert_eq!(options[0].1, "Upcoming");
/// ```
#[derive(Default)]
pub struct ProcedureRegistry {
    procedures: HashMap<(String, String), Procedure>,
}

impl ProcedureRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a procedure, replacing any previous one under the same name.
    pub fn register<F>(&mut self, target: impl Into<String>, method: impl Into<String>, f: F)
    where
        F: Fn(&[serde_json::Value]) -> Result<OptionList, CollaboratorError> + 'static,
    {
        self.procedures
            .insert((target.into(), method.into()), Box::new(f));
    }

    /// Returns `true` if `target@method` is registered.
    pub fn contains(&self, target: &str, method: &str) -> bool {
        self.procedures
            .contains_key(&(target.to_string(), method.to_string()))
    }
}

impl fmt::Debug for ProcedureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self
            .procedures
            .keys()
            .map(|(target, method)| format!("{target}@{method}"))
            .collect();
        names.sort();
        f.debug_struct("ProcedureRegistry")
            .field("procedures", &names)
            .finish()
    }
}

impl ProcedureProvider for ProcedureRegistry {
    fn call(
        &self,
        target: &str,
        method: &str,
        args: &[serde_json::Value],
    ) -> Result<OptionList, CollaboratorError> {
        let procedure = self
            .procedures
            .get(&(target.to_string(), method.to_string()))
            .ok_or_else(|| format!("no procedure registered for {target}@{method}"))?;
        procedure(args)
    }
}

/// The outcome of resolving a select's option source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedOptions {
    /// Options available now.
    Eager(OptionList),
    /// Options loaded later by the client from this URL.
    Deferred {
        /// The resolved endpoint URL.
        url: String,
    },
}

/// Resolves a select field's option source.
///
/// # Errors
///
/// Returns a configuration error when the source needs a collaborator the
/// context does not provide, and [`FormationError::Collaborator`] when the
/// collaborator itself fails.
pub fn resolve_options(
    field: &str,
    source: &OptionSource,
    ctx: &RenderContext<'_>,
) -> FormationResult<ResolvedOptions> {
    match source {
        OptionSource::Static(options) => Ok(ResolvedOptions::Eager(options.clone())),
        OptionSource::RemoteCall(action) => {
            let provider = ctx.procedures.ok_or_else(|| missing(field, "procedure provider"))?;
            call_action(provider, action).map(ResolvedOptions::Eager)
        }
        OptionSource::EntityList(entity) => {
            let lister = ctx.entities.ok_or_else(|| missing(field, "entity lister"))?;
            tracing::debug!(field, entity = entity.as_str(), "listing option entity");
            let rows = lister
                .list_all(entity)
                .map_err(|e| FormationError::collaborator("entity lister", e))?;
            Ok(ResolvedOptions::Eager(project_id_name(&rows)))
        }
        OptionSource::Deferred(route) => {
            let endpoints = ctx.endpoints.ok_or_else(|| missing(field, "endpoint resolver"))?;
            let url = endpoints
                .route_url(route)
                .map_err(|e| FormationError::collaborator("endpoint resolver", e))?;
            tracing::debug!(field, route = route.as_str(), "deferring options to client");
            Ok(ResolvedOptions::Deferred { url })
        }
    }
}

fn call_action(
    provider: &dyn ProcedureProvider,
    action: &ActionRef,
) -> FormationResult<OptionList> {
    tracing::debug!(
        target_name = action.target.as_str(),
        method = action.method.as_str(),
        args = action.args.len(),
        "calling option procedure"
    );
    provider
        .call(&action.target, &action.method, &action.args)
        .map_err(|e| FormationError::collaborator("procedure provider", e))
}

fn missing(field: &str, collaborator: &str) -> FormationError {
    FormationError::Configuration(format!(
        "select field `{field}` needs a {collaborator}, but none was supplied"
    ))
}

/// Projects entity rows to `(id, name)` pairs.
///
/// Rows without an `id` are skipped; a missing `name` becomes an empty label.
pub fn project_id_name(rows: &[serde_json::Value]) -> OptionList {
    rows.iter()
        .filter_map(|row| {
            let id = row.get("id").filter(|id| !id.is_null())?;
            let name = row.get("name").map(json_scalar_to_string).unwrap_or_default();
            Some((FieldValue::from_json(id).to_string(), name))
        })
        .collect()
}
