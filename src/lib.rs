//! # blogrouter
//!
//! Routing and dispatch core of a server-rendered blog: route declarations with
//! `{placeholder}` segments, ordered first-match-wins lookup, controller/action
//! resolution, and the request lifecycle `match → resolve → invoke → error/404`.
//!
//! ## Architecture
//!
//! - **[`router`]** - pattern compilation and the ordered route table
//! - **[`handlers`]** - handler descriptors (inline callables, `Controller@action`)
//!   and the [`Controller`](handlers::Controller) trait
//! - **[`registry`]** - controller identifiers mapped to per-request factories
//! - **[`dispatcher`]** - path normalisation, scan, resolution and invocation
//! - **[`observe`]** - the optional dispatch logger hook
//! - **[`responder`]** - not-found and server-error pages
//! - **[`redirect`]** - redirects and flash messages
//! - **[`controllers`]** / **[`routes`]** - the blog application's controllers and route table
//! - **[`server`]** - `may_minihttp` hosting adapter
//! - **[`runtime_config`]**, **[`logging`]**, **[`cli`]** - process plumbing
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as AppService
//!     participant Dispatcher
//!     participant Router
//!     participant Registry as ControllerRegistry
//!     participant Controller
//!
//!     Client->>Server: GET /blog/posts/hello?ref=home
//!     Server->>Dispatcher: handle(HandlerRequest)
//!     Dispatcher->>Dispatcher: normalize_path → /posts/hello
//!     Dispatcher->>Router: find_with(GET, /posts/hello)
//!     Router-->>Dispatcher: RouteMatch { /posts/{slug}, ["hello"] }
//!     Dispatcher->>Registry: instantiate("PostController")
//!     Registry-->>Dispatcher: Box<dyn Controller>
//!     Dispatcher->>Controller: invoke("show_post", req, ["hello"])
//!     Controller-->>Dispatcher: HandlerResponse
//!     Dispatcher-->>Server: HandlerResponse
//!     Server-->>Client: 200 OK
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use blogrouter::dispatcher::{Dispatcher, MountPrefix};
//! use blogrouter::routes::build_app;
//!
//! let (router, controllers) = build_app().unwrap();
//! let dispatcher = Dispatcher::new(router, controllers, MountPrefix::new("/blog"));
//!
//! let m = dispatcher.match_route("GET", "/blog/posts/hello/").unwrap();
//! assert_eq!(m.route.pattern, "/posts/{slug}");
//! assert_eq!(m.captures.as_slice(), ["hello"]);
//!
//! let res = dispatcher.dispatch_target("POST", "/blog/logout").unwrap();
//! assert_eq!(res.status, 302);
//! ```

pub mod cli;
pub mod controllers;
pub mod dispatcher;
pub mod handlers;
pub mod ids;
pub mod logging;
pub mod observe;
pub mod redirect;
pub mod registry;
pub mod responder;
pub mod router;
pub mod routes;
pub mod runtime_config;
pub mod server;

pub use dispatcher::{DispatchError, Dispatcher, HandlerRequest, HandlerResponse, MountPrefix};
pub use router::{PatternError, RegistrationError, Router};
