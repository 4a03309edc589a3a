use crate::dispatcher::HandlerRequest;
use crate::handlers::{Controller, HandlerResult};
use crate::redirect::Redirect;
use crate::router::Captures;

use super::{form_text, render_page};

/// Login, registration and logout forms.
///
/// Credential checks belong to the authentication service; these actions only
/// enforce that the required fields are present before redirecting.
#[derive(Debug, Default)]
pub struct AuthController;

impl AuthController {
    pub const NAME: &'static str = "AuthController";

    fn show_login(req: &HandlerRequest) -> HandlerResult {
        render_page(req, "auth/login", &[])
    }

    fn login(req: &HandlerRequest) -> HandlerResult {
        if form_text(req, "email").is_empty() || form_text(req, "password").is_empty() {
            return Ok(Redirect::to(&req.base_path, "/login")
                .with_error("Email and password are required.")
                .into());
        }
        Ok(Redirect::to(&req.base_path, "/").into())
    }

    fn show_register(req: &HandlerRequest) -> HandlerResult {
        render_page(req, "auth/register", &[])
    }

    fn register(req: &HandlerRequest) -> HandlerResult {
        let missing = ["username", "email", "password"]
            .into_iter()
            .any(|field| form_text(req, field).is_empty());
        if missing {
            return Ok(Redirect::to(&req.base_path, "/register")
                .with_error("All fields are required.")
                .into());
        }
        Ok(Redirect::to(&req.base_path, "/").into())
    }

    fn logout(req: &HandlerRequest) -> HandlerResult {
        Ok(Redirect::to(&req.base_path, "/").into())
    }
}

impl Controller for AuthController {
    fn invoke(&mut self, action: &str, req: &HandlerRequest, _args: &Captures) -> Option<HandlerResult> {
        let result = match action {
            "show_login" => Self::show_login(req),
            "login" => Self::login(req),
            "show_register" => Self::show_register(req),
            "register" => Self::register(req),
            "logout" => Self::logout(req),
            _ => return None,
        };
        Some(result)
    }
}
