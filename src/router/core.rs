//! Route table: ordered registrations, first match wins.

use crate::handlers::{HandlerDescriptor, IntoHandler};
use crate::registry::ControllerRegistry;
use http::Method;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use super::pattern::{compile, Matcher, PatternError};

/// Maximum number of captures kept inline before spilling to the heap.
/// Blog routes carry at most two placeholders.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Positional capture values of a matched route, left to right.
///
/// Values are raw path substrings. Handlers convert them with [`Captures::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures(SmallVec<[String; MAX_INLINE_PARAMS]>);

impl Captures {
    #[must_use]
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self(SmallVec::with_capacity(capacity))
    }

    pub fn push(&mut self, value: String) {
        self.0.push(value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        self.0.as_slice()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Capture at `index`, if present.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Capture at `index`, or an error naming the missing position.
    ///
    /// # Errors
    ///
    /// Fails when the route declared fewer placeholders than the handler expects.
    pub fn arg(&self, index: usize) -> anyhow::Result<&str> {
        self.get(index).ok_or_else(|| {
            anyhow::anyhow!(
                "handler expects argument #{} but the route captured {}",
                index + 1,
                self.len()
            )
        })
    }

    /// Parse the capture at `index`.
    ///
    /// # Errors
    ///
    /// Fails when the argument is missing or does not parse as `T`.
    pub fn parse<T>(&self, index: usize) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let raw = self.arg(index)?;
        raw.parse::<T>()
            .map_err(|e| anyhow::Error::new(e).context(format!("argument #{} = '{raw}'", index + 1)))
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0.into_vec()
    }
}

impl FromIterator<String> for Captures {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for Captures {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_owned).collect())
    }
}

/// Error raised while populating the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The route declaration did not compile.
    Pattern(PatternError),
    /// The handler reference could not be parsed, e.g. `"PostController"` without `@`.
    InvalidHandler(String),
    /// The method name is not a valid HTTP token.
    InvalidMethod(String),
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationError::Pattern(e) => write!(f, "{e}"),
            RegistrationError::InvalidHandler(spec) => write!(
                f,
                "invalid handler reference '{spec}': expected 'Controller@action'"
            ),
            RegistrationError::InvalidMethod(method) => write!(f, "invalid HTTP method '{method}'"),
        }
    }
}

impl std::error::Error for RegistrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistrationError::Pattern(e) => Some(e),
            RegistrationError::InvalidHandler(_) | RegistrationError::InvalidMethod(_) => None,
        }
    }
}

impl From<PatternError> for RegistrationError {
    fn from(e: PatternError) -> Self {
        RegistrationError::Pattern(e)
    }
}

/// One registered endpoint.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    /// Declaration as registered, kept for diagnostics.
    pub pattern: String,
    pub matcher: Matcher,
    pub handler: HandlerDescriptor,
}

/// Result of matching a normalised path against the table.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    /// Position of the route in registration order.
    pub index: usize,
    pub route: &'a Route,
    pub captures: Captures,
}

impl RouteMatch<'_> {
    /// Look up a capture by placeholder name.
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.route
            .matcher
            .param_names()
            .position(|n| n == name)
            .and_then(|i| self.captures.get(i))
    }
}

/// Ordered route table.
///
/// Populated once at startup, then shared read-only (usually behind an `Arc`).
/// Registration never deduplicates: when two entries match the same request the
/// one registered first wins.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Compile `pattern` and append a route for `method`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] when the pattern or the handler reference is
    /// malformed. Nothing is appended in that case.
    pub fn register<H: IntoHandler>(
        &mut self,
        method: Method,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RegistrationError> {
        let matcher = compile(pattern)?;
        let handler = handler.into_handler()?;
        self.routes.push(Route {
            method,
            pattern: pattern.to_owned(),
            matcher,
            handler,
        });
        Ok(self)
    }

    /// Register a route for an arbitrary method name, e.g. `"DELETE"`.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::InvalidMethod`] when `method` is not an HTTP token, plus
    /// everything [`Router::register`] reports.
    pub fn route<H: IntoHandler>(
        &mut self,
        method: &str,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RegistrationError> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| RegistrationError::InvalidMethod(method.to_owned()))?;
        self.register(method, pattern, handler)
    }

    /// Register a `GET` route.
    ///
    /// # Errors
    ///
    /// See [`Router::register`].
    pub fn get<H: IntoHandler>(
        &mut self,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RegistrationError> {
        self.register(Method::GET, pattern, handler)
    }

    /// Register a `POST` route.
    ///
    /// # Errors
    ///
    /// See [`Router::register`].
    pub fn post<H: IntoHandler>(
        &mut self,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RegistrationError> {
        self.register(Method::POST, pattern, handler)
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Every registered declaration, in registration order.
    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        self.routes.iter().map(|r| r.pattern.as_str()).collect()
    }

    /// First route whose method equals `method` and whose matcher accepts `path`.
    ///
    /// `path` must already be normalised. Method comparison is exact and
    /// case-sensitive.
    #[must_use]
    pub fn find(&self, method: &str, path: &str) -> Option<RouteMatch<'_>> {
        self.find_with(method, path, |_| {})
    }

    /// Same as [`Router::find`], calling `on_candidate` for each route whose method
    /// matched before its pattern is tested.
    pub fn find_with<F>(&self, method: &str, path: &str, mut on_candidate: F) -> Option<RouteMatch<'_>>
    where
        F: FnMut(&Route),
    {
        self.routes
            .iter()
            .enumerate()
            .filter(|(_, route)| route.method.as_str() == method)
            .find_map(|(index, route)| {
                on_candidate(route);
                route.matcher.captures(path).map(|captures| RouteMatch {
                    index,
                    route,
                    captures,
                })
            })
    }

    /// Routes that reference a controller the registry cannot build.
    #[must_use]
    pub fn unresolved<'a>(&'a self, registry: &ControllerRegistry) -> Vec<&'a Route> {
        self.routes
            .iter()
            .filter(|r| match &r.handler {
                HandlerDescriptor::Controller { controller, .. } => !registry.contains(controller),
                HandlerDescriptor::Inline(_) => false,
            })
            .collect()
    }
}
