//! Tests for the request dispatcher
//!
//! # Test Coverage
//!
//! - first-match-wins resolution, including when the winning handler fails
//! - not-found handling: no handler runs and the fallback page is returned
//! - mount prefix, query string and trailing slash normalisation
//! - controller/action resolution failures
//! - logger notifications, and identical outcomes without a logger

mod common;

use blogrouter::dispatcher::{DispatchError, Dispatcher, HandlerRequest, HandlerResponse, MountPrefix};
use blogrouter::handlers::{Controller, HandlerDescriptor, HandlerResult};
use blogrouter::observe::{LogLevel, MemoryLogger};
use blogrouter::registry::ControllerRegistry;
use blogrouter::router::{Captures, Router};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Records which of four handlers ran and with which captures.
fn scenario() -> (Dispatcher, Arc<Mutex<Vec<(usize, Vec<String>)>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut router = Router::new();
    let patterns = [("GET", "/"), ("GET", "/posts"), ("GET", "/posts/{slug}"), ("POST", "/posts/{id}")];
    for (n, (method, pattern)) in patterns.into_iter().enumerate() {
        let calls = Arc::clone(&calls);
        let handler = HandlerDescriptor::inline(move |_, args: &Captures| {
            calls.lock().unwrap().push((n + 1, args.iter().map(str::to_owned).collect()));
            Ok(HandlerResponse::text(200, format!("handler {}", n + 1)))
        });
        router.route(method, pattern, handler).unwrap();
    }
    let dispatcher = Dispatcher::new(router, ControllerRegistry::new(), MountPrefix::default());
    (dispatcher, calls)
}

#[test]
fn test_end_to_end_scenario() {
    let (dispatcher, calls) = scenario();

    dispatcher.dispatch_target("GET", "/posts/my-first-post").unwrap();
    dispatcher.dispatch_target("POST", "/posts/17").unwrap();
    dispatcher.dispatch_target("GET", "/posts/17/").unwrap();
    dispatcher.dispatch_target("GET", "/").unwrap();
    dispatcher.dispatch_target("GET", "/posts").unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![
            (3, vec!["my-first-post".to_string()]),
            (4, vec!["17".to_string()]),
            (3, vec!["17".to_string()]),
            (1, vec![]),
            (2, vec![]),
        ]
    );
}

#[test]
fn test_no_match_runs_nothing() {
    let (dispatcher, calls) = scenario();
    for (method, target) in [("GET", "/nope"), ("PUT", "/posts/1"), ("POST", "/posts/abc"), ("get", "/")] {
        let err = dispatcher.dispatch_target(method, target).unwrap_err();
        assert!(matches!(err, DispatchError::NoRouteMatch { .. }), "{method} {target}");
        assert_eq!(err.status(), 404);
    }
    assert!(calls.lock().unwrap().is_empty());

    let res = dispatcher.handle(&HandlerRequest::new("GET", "/nope")).unwrap();
    assert_eq!(res.status, 404);
    assert!(res.body.contains("Page not found"));
    assert!(!res.body.contains("/posts/{slug}"));
}

#[test]
fn test_first_registration_wins() {
    static SECOND: AtomicUsize = AtomicUsize::new(0);
    let mut router = Router::new();
    router
        .get("/posts/create", HandlerDescriptor::inline(|_, _| Ok(HandlerResponse::text(200, "create"))))
        .unwrap()
        .get(
            "/posts/{slug}",
            HandlerDescriptor::inline(|_, _| {
                SECOND.fetch_add(1, Ordering::SeqCst);
                Ok(HandlerResponse::text(200, "show"))
            }),
        )
        .unwrap();
    let dispatcher = Dispatcher::new(router, ControllerRegistry::new(), MountPrefix::default());

    assert_eq!(dispatcher.dispatch_target("GET", "/posts/create").unwrap().body, "create");
    assert_eq!(SECOND.load(Ordering::SeqCst), 0);
    assert_eq!(dispatcher.dispatch_target("GET", "/posts/other").unwrap().body, "show");
}

#[test]
fn test_mount_prefix_and_query_are_ignored_for_matching() {
    let dispatcher = common::blog_dispatcher("/blog");
    let m = dispatcher.match_route("GET", "/blog/posts/hello/?utm=x#comments").unwrap();
    assert_eq!(m.route.pattern, "/posts/{slug}");
    assert_eq!(m.captures.as_slice(), ["hello"]);

    assert_eq!(dispatcher.match_route("GET", "/blog").unwrap().route.pattern, "/");
    assert_eq!(dispatcher.match_route("GET", "/blog/").unwrap().route.pattern, "/");
    assert!(dispatcher.match_route("GET", "/blogger/posts").is_none());
}

#[derive(Default)]
struct Flaky;

impl Controller for Flaky {
    fn invoke(&mut self, action: &str, _req: &HandlerRequest, args: &Captures) -> Option<HandlerResult> {
        match action {
            "explode" => Some(Err(anyhow::anyhow!("explode #{}", args.arg(0).unwrap_or("?")))),
            _ => None,
        }
    }
}

fn flaky_dispatcher() -> Dispatcher {
    let mut router = Router::new();
    router
        .get("/explode/{id}", "Flaky@explode")
        .unwrap()
        .get("/missing-action", "Flaky@vanish")
        .unwrap()
        .get("/missing-controller", "Ghost@index")
        .unwrap()
        .get("/broken-factory", "Broken@index")
        .unwrap();
    let mut controllers = ControllerRegistry::new();
    controllers
        .register_default::<Flaky>("Flaky")
        .register("Broken", |_| Err(anyhow::anyhow!("no database")));
    Dispatcher::new(router, controllers, MountPrefix::default())
}

#[test]
fn test_resolution_failures_are_server_errors() {
    let dispatcher = flaky_dispatcher();

    let err = dispatcher.dispatch_target("GET", "/missing-controller").unwrap_err();
    assert!(matches!(err, DispatchError::HandlerNotFound { ref controller, .. } if controller == "Ghost"));
    let err = dispatcher.dispatch_target("GET", "/missing-action").unwrap_err();
    assert!(matches!(err, DispatchError::MethodNotFound { ref action, .. } if action == "vanish"));

    for target in ["/missing-controller", "/missing-action"] {
        let res = dispatcher.handle(&HandlerRequest::new("GET", target)).unwrap();
        assert_eq!(res.status, 500);
        assert!(!res.body.contains("Ghost"));
        assert!(!res.body.contains("vanish"));
    }
}

#[test]
fn test_handler_errors_propagate_unchanged() {
    let dispatcher = flaky_dispatcher();
    let err = dispatcher.handle(&HandlerRequest::new("GET", "/explode/5")).unwrap_err();
    assert_eq!(err.to_string(), "explode #5");

    let err = dispatcher.handle(&HandlerRequest::new("GET", "/broken-factory")).unwrap_err();
    assert_eq!(err.to_string(), "no database");
}

#[test]
fn test_logger_records_dispatch() {
    let (dispatcher, logger) = common::logged_blog_dispatcher("/blog");
    logger.clear();

    dispatcher.dispatch_target("GET", "/blog/posts/hello").unwrap();
    let records = logger.records();
    assert_eq!(records.first().unwrap().message, "dispatch started");
    assert_eq!(records[0].context["raw_target"], "/blog/posts/hello");
    assert_eq!(records[0].context["path"], "/posts/hello");
    assert!(records.iter().any(|r| r.message == "checking route" && r.context["pattern"] == "/posts"));
    let matched = records.last().unwrap();
    assert_eq!(matched.message, "route matched");
    assert_eq!(matched.context["pattern"], "/posts/{slug}");
    assert_eq!(matched.context["params"][0], "hello");

    // Only routes with an equal method are checked.
    logger.clear();
    let _ = dispatcher.dispatch_target("POST", "/blog/nowhere");
    let records = logger.records();
    assert!(records
        .iter()
        .filter(|r| r.message == "checking route")
        .all(|r| r.context["method"] == "POST"));
    let miss = records.last().unwrap();
    assert_eq!(miss.level, LogLevel::Warning);
    assert_eq!(miss.message, "no route matched");
    assert_eq!(
        miss.context["routes"].as_array().unwrap().len(),
        dispatcher.router().len()
    );
}

#[test]
fn test_logger_is_told_about_initialisation() {
    let logger = Arc::new(MemoryLogger::new());
    let _dispatcher = common::blog_dispatcher("/blog/").with_logger(logger.clone());
    let records = logger.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message, "router initialised");
    assert_eq!(records[0].context["base_path"], "/blog");
}

#[test]
fn test_outcomes_do_not_depend_on_logger() {
    let plain = common::blog_dispatcher("/blog");
    let (logged, _logger) = common::logged_blog_dispatcher("/blog");
    let requests = [
        ("GET", "/blog/"),
        ("GET", "/blog/posts/hello"),
        ("GET", "/blog/author/x"),
        ("POST", "/blog/logout"),
        ("DELETE", "/blog/posts/1"),
        ("GET", "/elsewhere"),
    ];
    for (method, target) in requests {
        let a = plain.handle(&HandlerRequest::new(method, target).with_base_path(MountPrefix::new("/blog")));
        let b = logged.handle(&HandlerRequest::new(method, target).with_base_path(MountPrefix::new("/blog")));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.status, b.status, "{method} {target}");
        assert_eq!(a.get_header("location"), b.get_header("location"));
    }
}
