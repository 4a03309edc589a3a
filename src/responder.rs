//! Fixed pages for requests that never reach a handler.
//!
//! The dispatcher hands a status code to a [`FallbackResponder`] when no route matches
//! (404) or a route points at a controller/action that cannot be resolved (500). The
//! pages are deliberately small and never include route tables or error detail.

use crate::dispatcher::{HandlerResponse, MountPrefix};
use minijinja::{context, Environment};
use tracing::warn;

pub trait FallbackResponder: Send + Sync {
    fn respond(&self, status: u16, base_path: &MountPrefix) -> HandlerResponse;
}

const NOT_FOUND_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Page not found</title></head>
<body>
<div class="error-page">
    <h1 class="error-code">404</h1>
    <h2 class="error-title">Page not found</h2>
    <p class="error-text">Sorry, the page you are looking for does not exist.</p>
    <a href="{{ base_path }}/" class="btn-primary">Back to home</a>
</div>
</body>
</html>
"#;

const SERVER_ERROR_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Server error</title></head>
<body>
<div class="error-page">
    <h1 class="error-code">{{ status }}</h1>
    <h2 class="error-title">Something went wrong</h2>
    <p class="error-text">An unexpected error occurred. Please try again later.</p>
    <a href="{{ base_path }}/" class="btn-primary">Back to home</a>
</div>
</body>
</html>
"#;

/// Default responder: two `minijinja` templates compiled once at startup.
pub struct ErrorPages {
    env: Environment<'static>,
}

impl ErrorPages {
    #[must_use]
    pub fn new() -> Self {
        let mut env = Environment::new();
        for (name, source) in [
            ("not_found", NOT_FOUND_TEMPLATE),
            ("server_error", SERVER_ERROR_TEMPLATE),
        ] {
            if let Err(e) = env.add_template(name, source) {
                warn!(template = name, error = %e, "Error page template rejected");
            }
        }
        Self { env }
    }

    fn render(&self, status: u16, base_path: &MountPrefix) -> Result<String, minijinja::Error> {
        let name = if status == 404 { "not_found" } else { "server_error" };
        self.env
            .get_template(name)?
            .render(context! { status => status, base_path => base_path.as_str() })
    }
}

impl Default for ErrorPages {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackResponder for ErrorPages {
    fn respond(&self, status: u16, base_path: &MountPrefix) -> HandlerResponse {
        match self.render(status, base_path) {
            Ok(body) => HandlerResponse::html(status, body),
            Err(e) => {
                warn!(status, error = %e, "Error page failed to render");
                let text = if status == 404 {
                    "404 - Page not found"
                } else {
                    "An unexpected error occurred. Please try again later."
                };
                HandlerResponse::text(status, text)
            }
        }
    }
}
