//! # Dispatcher Module
//!
//! Turns an incoming request into exactly one outcome: a handler response, a
//! not-found page, or a server-error page.
//!
//! ## Request Flow
//!
//! 1. The raw request target is reduced to its path and the mount prefix is removed
//!    ([`normalize_path`]).
//! 2. The route table is scanned in registration order; the first route whose method
//!    and pattern both match wins ([`crate::router::Router::find_with`]).
//! 3. The route target is resolved: inline handlers are called directly; controller
//!    targets are instantiated from the [`crate::registry::ControllerRegistry`] and
//!    asked to run the named action with the captured values in order.
//! 4. The outcome goes back to the host. [`Dispatcher::handle`] renders fallback
//!    pages for routing failures and returns handler errors untouched.
//!
//! ## Error Handling
//!
//! | Situation                          | Result                          | Status |
//! |------------------------------------|---------------------------------|--------|
//! | nothing matches                    | [`DispatchError::NoRouteMatch`]   | 404    |
//! | controller not registered          | [`DispatchError::HandlerNotFound`]| 500    |
//! | controller lacks the action        | [`DispatchError::MethodNotFound`] | 500    |
//! | handler returned an error          | [`DispatchError::Handler`]        | host   |
//!
//! ```rust
//! use blogrouter::dispatcher::{Dispatcher, HandlerResponse, MountPrefix};
//! use blogrouter::handlers::HandlerDescriptor;
//! use blogrouter::registry::ControllerRegistry;
//! use blogrouter::router::Router;
//!
//! let mut router = Router::new();
//! router
//!     .get("/posts/{slug}", HandlerDescriptor::inline(|_, args| {
//!         Ok(HandlerResponse::text(200, format!("post {}", args.arg(0)?)))
//!     }))
//!     .unwrap();
//!
//! let dispatcher = Dispatcher::new(router, ControllerRegistry::new(), MountPrefix::new("/blog"));
//! let res = dispatcher.dispatch_target("GET", "/blog/posts/hello?ref=home").unwrap();
//! assert_eq!(res.body, "post hello");
//! assert!(dispatcher.dispatch_target("GET", "/blog/nothing").is_err());
//! ```

mod core;
mod path;

pub use core::{
    DispatchError, Dispatcher, HandlerRequest, HandlerResponse, HeaderVec, ParamVec,
    MAX_INLINE_HEADERS,
};
pub use path::{normalize_path, path_component, MountPrefix};
