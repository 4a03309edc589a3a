//! # CLI Module
//!
//! ## Commands
//!
//! ### `serve`
//!
//! ```bash
//! blogrouter serve --config blog.yaml --base-path /blog --addr 0.0.0.0:8080
//! ```
//!
//! Loads [`RuntimeConfig`](crate::runtime_config::RuntimeConfig), initialises logging,
//! builds the application dispatcher and serves until SIGINT/SIGTERM.
//!
//! ### `routes`
//!
//! ```bash
//! blogrouter routes
//! ```
//!
//! Prints the route table in precedence order. Routes naming a controller with no
//! registered factory are flagged `(unresolved controller)`.
//!
//! ### `match`
//!
//! ```bash
//! blogrouter match GET '/blog/posts/hello?ref=home' --base-path /blog --explain
//! ```
//!
//! Shows the route a request would reach and its captures, without running the
//! handler. `--explain` adds the dispatch log records of the scan.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{execute, run_cli, Cli, Commands};
