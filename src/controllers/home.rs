use crate::dispatcher::HandlerRequest;
use crate::handlers::{Controller, HandlerResult};
use crate::router::Captures;

use super::render_page;

/// Landing page.
#[derive(Debug, Default)]
pub struct HomeController;

impl HomeController {
    pub const NAME: &'static str = "HomeController";

    fn index(req: &HandlerRequest) -> HandlerResult {
        render_page(req, "home/index", &[])
    }
}

impl Controller for HomeController {
    fn invoke(&mut self, action: &str, req: &HandlerRequest, _args: &Captures) -> Option<HandlerResult> {
        match action {
            "index" => Some(Self::index(req)),
            _ => None,
        }
    }
}
