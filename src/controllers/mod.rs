//! Application controllers.
//!
//! Each controller is built fresh per request by the
//! [`ControllerRegistry`](crate::registry::ControllerRegistry) and exposes its actions
//! through [`Controller::invoke`](crate::handlers::Controller::invoke). Persistence,
//! sessions and domain views live outside this crate; actions render a placeholder
//! page naming the view they stand for, or redirect the way the real action would.

mod admin;
mod auth;
mod home;
mod post;
mod user;

pub use admin::AdminController;
pub use auth::AuthController;
pub use home::HomeController;
pub use post::PostController;
pub use user::UserController;

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::handlers::HandlerResult;
use crate::redirect::{clear_flash, take_flash};
use crate::registry::ControllerRegistry;
use minijinja::{context, Environment};
use once_cell::sync::Lazy;
use tracing::warn;

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{{ view }}</title></head>
<body>
{% if flash %}<div class="flash flash-{{ flash_kind }}">{{ flash }}</div>{% endif %}
<main data-view="{{ view }}">
<h1>{{ view }}</h1>
{% if details %}<dl>
{% for key, value in details %}<dt>{{ key }}</dt><dd>{{ value }}</dd>
{% endfor %}</dl>{% endif %}
</main>
</body>
</html>
"#;

static PAGES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    if let Err(e) = env.add_template("page.html", PAGE_TEMPLATE) {
        warn!(error = %e, "Placeholder page template rejected");
    }
    env
});

/// Render the placeholder page for `view`, showing `details` and any pending flash
/// message. The flash cookie is expired once shown.
pub(crate) fn render_page(
    req: &HandlerRequest,
    view: &str,
    details: &[(&str, String)],
) -> HandlerResult {
    let flash = take_flash(req);
    let body = PAGES.get_template("page.html")?.render(context! {
        view => view,
        details => details,
        flash => flash.as_ref().map(|(_, message)| message.as_str()),
        flash_kind => flash.as_ref().map(|(kind, _)| kind.cookie_name()),
    })?;
    let mut res = HandlerResponse::html(200, body);
    if let Some((kind, _)) = flash {
        clear_flash(&mut res, kind, &req.base_path);
    }
    Ok(res)
}

/// Trimmed form field, empty when missing.
pub(crate) fn form_text<'a>(req: &'a HandlerRequest, name: &str) -> &'a str {
    req.get_form_field(name).map(str::trim).unwrap_or_default()
}

/// Register every application controller under the name routes refer to it by.
pub fn register_all(registry: &mut ControllerRegistry) {
    registry
        .register_default::<HomeController>(HomeController::NAME)
        .register_default::<PostController>(PostController::NAME)
        .register_default::<AuthController>(AuthController::NAME)
        .register_default::<UserController>(UserController::NAME)
        .register_default::<AdminController>(AdminController::NAME);
}
