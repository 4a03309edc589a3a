//! # Router Module
//!
//! Pattern compilation and the ordered route table.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling route declarations such as `/posts/{slug}` into matchers
//! - Keeping registrations in the order they were made
//! - Finding the first route whose method and pattern accept a request path
//! - Extracting positional captures for the handler
//!
//! ## Architecture
//!
//! The router uses a two-phase approach:
//!
//! 1. **Compilation**: at startup every declaration is turned into an anchored regex.
//!    A placeholder named `id` only accepts digits; every other placeholder accepts
//!    letters, digits, `-` and `_`. Malformed declarations are rejected here, so a bad
//!    route table stops the process before it serves anything.
//!
//! 2. **Matching**: for each request the table is scanned in registration order. The
//!    first entry with an equal method and a matching pattern wins, which lets literal
//!    routes such as `/posts/create` shadow `/posts/{slug}` when declared first.
//!
//! ## Example
//!
//! ```rust
//! use blogrouter::router::Router;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut router = Router::new();
//! router.get("/posts/{slug}", "PostController@show_post")?;
//! router.post("/posts/{id}", ("PostController", "update"))?;
//!
//! let m = router.find("GET", "/posts/hello-world").expect("route");
//! assert_eq!(m.captures.as_slice(), ["hello-world"]);
//! assert!(router.find("GET", "/posts/hello-world/extra").is_none());
//! # Ok(())
//! # }
//! ```

mod core;
pub mod pattern;

pub use core::{Captures, RegistrationError, Route, RouteMatch, Router, MAX_INLINE_PARAMS};
pub use pattern::{compile, CaptureKind, Matcher, PatternError, Segment};
