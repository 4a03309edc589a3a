//! Handler descriptors and the controller contract.
//!
//! A route points at one of two kinds of target:
//!
//! - an inline callable, invoked directly with the request and its captures;
//! - a `(controller, action)` pair, resolved through the
//!   [`ControllerRegistry`](crate::registry::ControllerRegistry) when the route is
//!   dispatched. The `"Controller@action"` string form is parsed into the same pair
//!   at registration time.

mod types;

pub use types::{
    Controller, HandlerDescriptor, HandlerFn, HandlerResult, InlineHandler, IntoHandler,
};
