use crate::dispatcher::HandlerRequest;
use crate::handlers::{Controller, HandlerResult};
use crate::redirect::Redirect;
use crate::router::Captures;

use super::{form_text, render_page};

/// The signed-in user's own profile.
#[derive(Debug, Default)]
pub struct UserController;

impl UserController {
    pub const NAME: &'static str = "UserController";

    fn user_profile(req: &HandlerRequest) -> HandlerResult {
        render_page(req, "user/profile", &[])
    }

    fn user_edit_profile(req: &HandlerRequest) -> HandlerResult {
        render_page(req, "user/edit", &[])
    }

    fn update(req: &HandlerRequest) -> HandlerResult {
        if form_text(req, "username").is_empty() {
            return Ok(Redirect::to(&req.base_path, "/profile/edit")
                .with_error("Username is required.")
                .into());
        }
        Ok(Redirect::to(&req.base_path, "/profile")
            .with_success("Profile updated.")
            .into())
    }

    fn avatar(req: &HandlerRequest) -> HandlerResult {
        if req.body.as_deref().map_or(true, str::is_empty) {
            return Ok(Redirect::to(&req.base_path, "/profile/edit")
                .with_error("Avatar upload failed. Please try again.")
                .into());
        }
        Ok(Redirect::to(&req.base_path, "/profile")
            .with_success("Avatar updated.")
            .into())
    }
}

impl Controller for UserController {
    fn invoke(&mut self, action: &str, req: &HandlerRequest, _args: &Captures) -> Option<HandlerResult> {
        let result = match action {
            "user_profile" => Self::user_profile(req),
            "user_edit_profile" => Self::user_edit_profile(req),
            "update" => Self::update(req),
            "avatar" => Self::avatar(req),
            _ => return None,
        };
        Some(result)
    }
}
