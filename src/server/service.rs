use super::request::parse_request;
use super::response::{write_handler_response, HeaderLines};
use crate::dispatcher::{path_component, Dispatcher, HandlerResponse};
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::time::Instant;
use tracing::{error, info};

pub const HEALTH_PATH: &str = "/health";

/// `may_minihttp` service: health probe plus the blog dispatcher.
///
/// One clone per connection; all clones share the dispatcher's route table.
#[derive(Clone, Debug)]
pub struct AppService {
    pub dispatcher: Dispatcher,
    lines: HeaderLines,
}

impl AppService {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            lines: HeaderLines::new(),
        }
    }

    /// Run one parsed request through the dispatcher.
    ///
    /// Handler failures are logged here and answered with the server-error page;
    /// the error text never reaches the client.
    pub fn respond(&self, req: &crate::dispatcher::HandlerRequest) -> HandlerResponse {
        match self.dispatcher.handle(req) {
            Ok(response) => response,
            Err(e) => {
                error!(
                    request_id = %req.request_id,
                    method = %req.method,
                    target = %req.target,
                    error = %format!("{e:#}"),
                    "Handler failed"
                );
                self.dispatcher.server_error_page()
            }
        }
    }
}

pub fn health_response() -> HandlerResponse {
    HandlerResponse::new(
        200,
        Default::default(),
        serde_json::json!({ "status": "ok" }).to_string(),
    )
    .with_header("content-type", "application/json")
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let start = Instant::now();
        let req = parse_request(req, self.dispatcher.base_path());

        if req.method == "GET" && path_component(&req.target) == HEALTH_PATH {
            write_handler_response(res, health_response(), &mut self.lines);
            return Ok(());
        }

        let response = self.respond(&req);
        info!(
            request_id = %req.request_id,
            method = %req.method,
            target = %req.target,
            status = response.status,
            latency_us = start.elapsed().as_micros() as u64,
            "Request handled"
        );
        write_handler_response(res, response, &mut self.lines);
        Ok(())
    }
}
