//! HTTP hosting adapter on `may_minihttp`.
//!
//! Wire requests become [`HandlerRequest`](crate::dispatcher::HandlerRequest)s,
//! go through [`Dispatcher::handle`](crate::dispatcher::Dispatcher::handle), and the
//! resulting [`HandlerResponse`](crate::dispatcher::HandlerResponse) is written back.
//! `GET /health` is answered here without touching the route table.

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_cookies, parse_query_params, parse_request, parse_urlencoded};
pub use response::{
    interned_line_count, status_reason, write_handler_response, HeaderLines, MAX_INTERNED_LINES,
    MAX_RESPONSE_HEADERS,
};
pub use service::{health_response, AppService, HEALTH_PATH};
