//! Dispatcher core: request context, response value and the dispatch state machine.
//!
//! ```text
//! Idle -> PathNormalized -> Scanning -> MatchedDispatching -> Terminal
//!                                    \-> NotFound ----------/
//! ```
//!
//! Every call to [`Dispatcher::dispatch`] walks this sequence once. Nothing is kept
//! between calls apart from the read-only route table and controller registry.

use crate::handlers::HandlerDescriptor;
use crate::ids::RequestId;
use crate::observe::{DispatchLogger, LogLevel};
use crate::registry::ControllerRegistry;
use crate::responder::{ErrorPages, FallbackResponder};
use crate::router::{Captures, Route, RouteMatch, Router};
use serde_json::{json, Value};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

use super::path::{normalize_path, MountPrefix};

/// Maximum inline headers/cookies before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header or cookie storage: `(name, value)` pairs.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Query-string and form-field storage: `(name, value)` pairs.
pub type ParamVec = SmallVec<[(Arc<str>, String); 8]>;

/// Everything a handler may look at for one request.
///
/// Built by the hosting adapter and passed explicitly down to handlers; there is no
/// ambient request state anywhere in the crate.
#[derive(Debug, Clone, Default)]
pub struct HandlerRequest {
    /// Id used to correlate log lines
    pub request_id: RequestId,
    /// Method exactly as received (`GET`, `POST`, ...)
    pub method: String,
    /// Raw request target, query string included
    pub target: String,
    /// Mount prefix the application is served under; handlers use it for links
    pub base_path: MountPrefix,
    /// Headers, lowercase names
    pub headers: HeaderVec,
    /// Cookies parsed from the `Cookie` header
    pub cookies: HeaderVec,
    /// Decoded query string
    pub query_params: ParamVec,
    /// Decoded `application/x-www-form-urlencoded` body
    pub form: ParamVec,
    /// Raw body, when one was sent
    pub body: Option<String>,
}

fn last_value<'a>(pairs: &'a [(Arc<str>, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rfind(|(k, _)| k.as_ref() == name)
        .map(|(_, v)| v.as_str())
}

impl HandlerRequest {
    #[must_use]
    pub fn new(method: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            target: target.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_base_path(mut self, base_path: MountPrefix) -> Self {
        self.base_path = base_path;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .push((Arc::from(name.to_ascii_lowercase()), value.into()));
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, name: &str, value: impl Into<String>) -> Self {
        self.cookies.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_form_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.form.push((Arc::from(name), value.into()));
        self
    }

    /// Header by name, case-insensitive.
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn get_cookie(&self, name: &str) -> Option<&str> {
        last_value(&self.cookies, name)
    }

    /// Query parameter by name; the last occurrence wins.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        last_value(&self.query_params, name)
    }

    /// Form field by name; the last occurrence wins.
    #[inline]
    #[must_use]
    pub fn get_form_field(&self, name: &str) -> Option<&str> {
        last_value(&self.form, name)
    }
}

/// Response produced by a handler or a fallback page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResponse {
    pub status: u16,
    pub headers: HeaderVec,
    pub body: String,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: String) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn html(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, HeaderVec::new(), body.into())
            .with_header("content-type", "text/html; charset=utf-8")
    }

    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, HeaderVec::new(), body.into())
            .with_header("content-type", "text/plain; charset=utf-8")
    }

    /// Empty-bodied redirect to `location`.
    #[must_use]
    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self::new(status, HeaderVec::new(), String::new()).with_header("location", location)
    }

    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replace every header called `name` with a single value.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value.into()));
    }

    /// Append a header, keeping existing ones (`set-cookie` may repeat).
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((Arc::from(name), value.into()));
        self
    }
}

/// Why a dispatch did not produce a handler response.
#[derive(Debug)]
pub enum DispatchError {
    /// No route with this method accepts the path (404).
    NoRouteMatch { method: String, path: String },
    /// The route names a controller the registry does not know (500).
    HandlerNotFound { controller: String, action: String },
    /// The controller exists but has no such action (500).
    MethodNotFound { controller: String, action: String },
    /// The handler (or controller factory) itself failed; passed through untouched.
    Handler(anyhow::Error),
}

impl DispatchError {
    /// HTTP status the host should answer with.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::NoRouteMatch { .. } => 404,
            DispatchError::HandlerNotFound { .. }
            | DispatchError::MethodNotFound { .. }
            | DispatchError::Handler(_) => 500,
        }
    }

    /// True for failures raised while resolving the route target, before any
    /// application code ran.
    #[must_use]
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            DispatchError::HandlerNotFound { .. } | DispatchError::MethodNotFound { .. }
        )
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::NoRouteMatch { method, path } => {
                write!(f, "no route matches {method} {path}")
            }
            DispatchError::HandlerNotFound { controller, .. } => {
                write!(f, "controller '{controller}' not found")
            }
            DispatchError::MethodNotFound { controller, action } => {
                write!(f, "action '{action}' not found on controller '{controller}'")
            }
            DispatchError::Handler(e) => write!(f, "handler failed: {e}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Handler(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Resolves requests against a read-only route table.
///
/// Cloning is cheap; every clone shares the same table, registry and hooks, so one
/// dispatcher can be handed to each server worker.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    controllers: Arc<ControllerRegistry>,
    base_path: MountPrefix,
    logger: Option<Arc<dyn DispatchLogger>>,
    responder: Arc<dyn FallbackResponder>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.router.len())
            .field("controllers", &self.controllers)
            .field("base_path", &self.base_path)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new(router: Router, controllers: ControllerRegistry, base_path: MountPrefix) -> Self {
        Self {
            router: Arc::new(router),
            controllers: Arc::new(controllers),
            base_path,
            logger: None,
            responder: Arc::new(ErrorPages::new()),
        }
    }

    /// Attach the observability hook. It is told about its own installation
    /// together with the resolved mount prefix.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn DispatchLogger>) -> Self {
        logger.info(
            "router initialised",
            &json!({ "base_path": self.base_path.as_str(), "routes": self.router.len() }),
        );
        self.logger = Some(logger);
        self
    }

    #[must_use]
    pub fn with_responder(mut self, responder: Arc<dyn FallbackResponder>) -> Self {
        self.responder = responder;
        self
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    #[must_use]
    pub fn base_path(&self) -> &MountPrefix {
        &self.base_path
    }

    #[inline]
    fn notify(&self, level: LogLevel, message: &str, context: impl FnOnce() -> Value) {
        if let Some(logger) = &self.logger {
            logger.log(level, message, &context());
        }
    }

    /// Which route `method raw_target` would reach, without invoking anything.
    ///
    /// The scan is reported to the logger exactly as during a dispatch.
    #[must_use]
    pub fn match_route(&self, method: &str, raw_target: &str) -> Option<RouteMatch<'_>> {
        let path = normalize_path(raw_target, &self.base_path);
        self.scan(method, &path)
    }

    fn scan(&self, method: &str, path: &str) -> Option<RouteMatch<'_>> {
        let found = self.router.find_with(method, path, |route| {
            self.notify(LogLevel::Info, "checking route", || {
                json!({ "method": route.method.as_str(), "pattern": route.pattern, "path": path })
            });
        });
        match &found {
            Some(m) => self.notify(LogLevel::Info, "route matched", || {
                json!({ "pattern": m.route.pattern, "path": path, "params": m.captures.as_slice() })
            }),
            None => self.notify(LogLevel::Warning, "no route matched", || {
                json!({ "path": path, "method": method, "routes": self.router.patterns() })
            }),
        }
        found
    }

    /// Dispatch a bare `method raw_target` request.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::dispatch`].
    pub fn dispatch_target(
        &self,
        method: &str,
        raw_target: &str,
    ) -> Result<HandlerResponse, DispatchError> {
        let req = HandlerRequest::new(method, raw_target).with_base_path(self.base_path.clone());
        self.dispatch(&req)
    }

    /// Resolve `req` to a handler and run it.
    ///
    /// The first route (in registration order) whose method equals `req.method`
    /// and whose pattern accepts the normalised path is used; later routes are never
    /// tried, even when the handler fails.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::NoRouteMatch`] when nothing matches; no handler ran.
    /// - [`DispatchError::HandlerNotFound`] / [`DispatchError::MethodNotFound`] when
    ///   the controller target cannot be resolved.
    /// - [`DispatchError::Handler`] with the handler's own error.
    pub fn dispatch(&self, req: &HandlerRequest) -> Result<HandlerResponse, DispatchError> {
        let path = normalize_path(&req.target, &self.base_path);
        self.notify(LogLevel::Info, "dispatch started", || {
            json!({
                "request_id": req.request_id.to_string(),
                "raw_target": req.target,
                "path": path,
                "method": req.method,
            })
        });

        let Some(RouteMatch { route, captures, .. }) = self.scan(&req.method, &path) else {
            return Err(DispatchError::NoRouteMatch {
                method: req.method.clone(),
                path,
            });
        };

        self.invoke(route, req, &captures)
    }

    fn invoke(
        &self,
        route: &Route,
        req: &HandlerRequest,
        captures: &Captures,
    ) -> Result<HandlerResponse, DispatchError> {
        let (controller, action) = match &route.handler {
            HandlerDescriptor::Inline(handler) => {
                return handler.call(req, captures).map_err(DispatchError::Handler);
            }
            HandlerDescriptor::Controller { controller, action } => (controller, action),
        };

        let resolution_context = || {
            json!({ "controller": controller, "action": action, "pattern": route.pattern })
        };

        let mut instance = match self.controllers.instantiate(controller, req) {
            Some(built) => built.map_err(DispatchError::Handler)?,
            None => {
                self.notify(LogLevel::Error, "controller not found", resolution_context);
                return Err(DispatchError::HandlerNotFound {
                    controller: controller.clone(),
                    action: action.clone(),
                });
            }
        };

        match instance.invoke(action, req, captures) {
            Some(result) => result.map_err(DispatchError::Handler),
            None => {
                self.notify(LogLevel::Error, "action not found", resolution_context);
                Err(DispatchError::MethodNotFound {
                    controller: controller.clone(),
                    action: action.clone(),
                })
            }
        }
    }

    /// The fallback server-error page, for hosts translating handler failures.
    #[must_use]
    pub fn server_error_page(&self) -> HandlerResponse {
        self.responder.respond(500, &self.base_path)
    }

    /// Host entry point.
    ///
    /// Unmatched requests get the not-found page and unresolvable targets get the
    /// server-error page, both from the fallback responder. Only handler-internal
    /// failures come back as `Err`, for the host to translate.
    ///
    /// # Errors
    ///
    /// The handler's own error, unchanged.
    pub fn handle(&self, req: &HandlerRequest) -> anyhow::Result<HandlerResponse> {
        match self.dispatch(req) {
            Ok(response) => Ok(response),
            Err(DispatchError::Handler(e)) => Err(e),
            Err(other) => Ok(self.responder.respond(other.status(), &self.base_path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{Controller, HandlerResult};
    use crate::observe::MemoryLogger;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Posts;

    impl Controller for Posts {
        fn invoke(&mut self, action: &str, _: &HandlerRequest, args: &Captures) -> Option<HandlerResult> {
            let result = match action {
                "show" => args.arg(0).map(|slug| HandlerResponse::text(200, format!("post {slug}"))),
                "fail" => Err(anyhow::anyhow!("boom")),
                _ => return None,
            };
            Some(result)
        }
    }

    fn dispatcher(prefix: &str) -> Dispatcher {
        let mut router = Router::new();
        router
            .get("/", HandlerDescriptor::inline(|_, _| Ok(HandlerResponse::text(200, "home"))))
            .unwrap()
            .get("/posts/{slug}", "Posts@show")
            .unwrap()
            .get("/fail", "Posts@fail")
            .unwrap()
            .get("/nope", "Posts@missing")
            .unwrap()
            .get("/ghost", "Ghost@index")
            .unwrap();
        let mut controllers = ControllerRegistry::new();
        controllers.register("Posts", |_| Ok(Box::new(Posts) as Box<dyn Controller>));
        Dispatcher::new(router, controllers, MountPrefix::new(prefix))
    }

    #[test]
    fn test_inline_and_controller_targets() {
        let d = dispatcher("");
        assert_eq!(d.dispatch_target("GET", "/").unwrap().body, "home");
        assert_eq!(d.dispatch_target("GET", "/posts/hello/").unwrap().body, "post hello");
    }

    #[test]
    fn test_mount_prefix_is_stripped_before_matching() {
        let d = dispatcher("/blog");
        assert_eq!(d.dispatch_target("GET", "/blog").unwrap().body, "home");
        assert_eq!(d.dispatch_target("GET", "/blog/posts/a?x=1").unwrap().body, "post a");
    }

    #[test]
    fn test_error_taxonomy() {
        let d = dispatcher("");
        let err = d.dispatch_target("GET", "/missing").unwrap_err();
        assert!(matches!(err, DispatchError::NoRouteMatch { ref path, .. } if path == "/missing"));
        assert_eq!(err.status(), 404);

        let err = d.dispatch_target("GET", "/ghost").unwrap_err();
        assert!(matches!(err, DispatchError::HandlerNotFound { .. }));
        assert!(err.is_resolution_failure());

        let err = d.dispatch_target("GET", "/nope").unwrap_err();
        assert!(matches!(err, DispatchError::MethodNotFound { ref action, .. } if action == "missing"));
        assert_eq!(err.status(), 500);

        let err = d.dispatch_target("GET", "/fail").unwrap_err();
        assert!(matches!(err, DispatchError::Handler(ref e) if e.to_string() == "boom"));
        assert!(!err.is_resolution_failure());
    }

    #[test]
    fn test_handle_renders_fallback_pages() {
        let d = dispatcher("");
        let res = d.handle(&HandlerRequest::new("GET", "/missing")).unwrap();
        assert_eq!(res.status, 404);
        assert!(!res.body.contains("/ghost"));

        let res = d.handle(&HandlerRequest::new("GET", "/ghost")).unwrap();
        assert_eq!(res.status, 500);

        let err = d.handle(&HandlerRequest::new("GET", "/fail")).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_logger_sees_lifecycle() {
        let logger = Arc::new(MemoryLogger::new());
        let d = dispatcher("/blog").with_logger(logger.clone());

        d.dispatch_target("GET", "/blog/posts/x").unwrap();
        let records = logger.records();
        assert_eq!(
            logger.messages(),
            vec![
                "router initialised",
                "dispatch started",
                "checking route",
                "checking route",
                "route matched",
            ]
        );
        assert_eq!(records[0].context["base_path"], "/blog");
        assert_eq!(records[1].context["raw_target"], "/blog/posts/x");
        assert_eq!(records[1].context["path"], "/posts/x");
        assert_eq!(records[4].context["params"], json!(["x"]));

        logger.clear();
        let _ = d.dispatch_target("POST", "/blog/posts/x");
        let records = logger.records();
        let last = records.last().unwrap();
        assert_eq!(last.level, LogLevel::Warning);
        assert_eq!(last.message, "no route matched");
        assert_eq!(last.context["routes"].as_array().unwrap().len(), 5);

        logger.clear();
        let _ = d.dispatch_target("GET", "/ghost");
        assert_eq!(logger.records().last().unwrap().message, "controller not found");
    }

    #[test]
    fn test_match_stops_at_first_hit_even_if_handler_fails() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let mut router = Router::new();
        router
            .get("/x", HandlerDescriptor::inline(|_, _| Err(anyhow::anyhow!("first"))))
            .unwrap()
            .get(
                "/x",
                HandlerDescriptor::inline(|_, _| {
                    CALLS.fetch_add(1, Ordering::SeqCst);
                    Ok(HandlerResponse::text(200, "second"))
                }),
            )
            .unwrap();
        let d = Dispatcher::new(router, ControllerRegistry::new(), MountPrefix::default());
        assert!(d.dispatch_target("GET", "/x").is_err());
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_request_accessors() {
        let req = HandlerRequest::new("POST", "/login")
            .with_header("Referer", "/posts")
            .with_cookie("flash_success", "ok")
            .with_form_field("email", "a@b.c")
            .with_form_field("email", "d@e.f");
        assert_eq!(req.get_header("referer"), Some("/posts"));
        assert_eq!(req.get_cookie("flash_success"), Some("ok"));
        assert_eq!(req.get_form_field("email"), Some("d@e.f"));
        assert_eq!(req.get_query_param("page"), None);
    }

    #[test]
    fn test_set_header_replaces() {
        let mut res = HandlerResponse::text(200, "x");
        res.set_header("Content-Type", "text/html");
        assert_eq!(res.get_header("content-type"), Some("text/html"));
        assert_eq!(res.headers.len(), 1);
    }
}
