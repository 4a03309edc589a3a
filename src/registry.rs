//! Controller registry: maps controller identifiers to factories.
//!
//! Routes declared as `"PostController@show_post"` or
//! `("PostController", "show_post")` only carry names. At dispatch time the
//! dispatcher asks this registry for a fresh instance of the named controller.
//! Every controller type must be registered up front; there is no reflection.

use crate::dispatcher::HandlerRequest;
use crate::handlers::Controller;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds one controller instance for one request.
///
/// A factory may do I/O (opening a database handle, reading the session). A failing
/// factory is treated like a failing handler: the error propagates to the host.
pub type ControllerFactory =
    Arc<dyn Fn(&HandlerRequest) -> anyhow::Result<Box<dyn Controller>> + Send + Sync>;

#[derive(Clone, Default)]
pub struct ControllerRegistry {
    factories: HashMap<String, ControllerFactory>,
}

impl ControllerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the factory for `name`.
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&HandlerRequest) -> anyhow::Result<Box<dyn Controller>> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_owned(), Arc::new(factory));
        self
    }

    /// Register a controller built with `Default::default()`.
    pub fn register_default<C>(&mut self, name: &str) -> &mut Self
    where
        C: Controller + Default + 'static,
    {
        self.register(name, |_| Ok(Box::new(C::default()) as Box<dyn Controller>))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered controller names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Build a controller. `None` when `name` is not registered.
    pub fn instantiate(
        &self,
        name: &str,
        req: &HandlerRequest,
    ) -> Option<anyhow::Result<Box<dyn Controller>>> {
        self.factories.get(name).map(|factory| factory(req))
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("controllers", &self.names())
            .finish()
    }
}
