//! Redirect responses and one-shot flash messages.
//!
//! Handlers return a [`Redirect`] instead of writing headers themselves. Flash
//! messages travel in a short-lived cookie named after their kind
//! (`flash_success` / `flash_error`) and are read back with [`take_flash`].

use crate::dispatcher::{HandlerRequest, HandlerResponse, MountPrefix};
use std::fmt;

/// Kind of flash message attached to a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    #[must_use]
    pub fn cookie_name(self) -> &'static str {
        match self {
            FlashKind::Success => "flash_success",
            FlashKind::Error => "flash_error",
        }
    }
}

impl fmt::Display for FlashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cookie_name())
    }
}

/// Redirect response builder. Defaults to `302 Found`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    status: u16,
    location: String,
    cookie_path: String,
    flash: Option<(FlashKind, String)>,
}

impl Redirect {
    fn new(location: String, base_path: &MountPrefix) -> Self {
        Self {
            status: 302,
            location,
            cookie_path: base_path.join("/"),
            flash: None,
        }
    }

    /// Redirect to an application path; the mount prefix is prepended.
    #[must_use]
    pub fn to(base_path: &MountPrefix, path: &str) -> Self {
        Self::new(base_path.join(path), base_path)
    }

    /// Redirect to an absolute URL, untouched.
    #[must_use]
    pub fn away(url: impl Into<String>) -> Self {
        Self::new(url.into(), &MountPrefix::default())
    }

    /// Redirect to the `Referer` of `req`, or to `fallback` under the mount prefix
    /// when the header is missing or empty.
    #[must_use]
    pub fn back(req: &HandlerRequest, fallback: &str) -> Self {
        match req.get_header("referer").filter(|r| !r.trim().is_empty()) {
            Some(referer) => Self::new(referer.to_owned(), &req.base_path),
            None => Self::to(&req.base_path, fallback),
        }
    }

    /// Override the status, e.g. `301` for a permanent move.
    #[must_use]
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_success(mut self, message: impl Into<String>) -> Self {
        self.flash = Some((FlashKind::Success, message.into()));
        self
    }

    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.flash = Some((FlashKind::Error, message.into()));
        self
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub fn into_response(self) -> HandlerResponse {
        let mut res = HandlerResponse::redirect(self.status, self.location);
        if let Some((kind, message)) = self.flash {
            res = res.with_header(
                "set-cookie",
                format!(
                    "{}={}; Path={}; HttpOnly; SameSite=Lax",
                    kind.cookie_name(),
                    urlencoding::encode(&message),
                    self.cookie_path
                ),
            );
        }
        res
    }
}

impl From<Redirect> for HandlerResponse {
    fn from(redirect: Redirect) -> Self {
        redirect.into_response()
    }
}

/// Read the pending flash message, if any. Success wins when both are present.
#[must_use]
pub fn take_flash(req: &HandlerRequest) -> Option<(FlashKind, String)> {
    [FlashKind::Success, FlashKind::Error]
        .into_iter()
        .find_map(|kind| {
            let raw = req.get_cookie(kind.cookie_name())?;
            let message = urlencoding::decode(raw)
                .map(|m| m.into_owned())
                .unwrap_or_else(|_| raw.to_owned());
            Some((kind, message))
        })
}

/// Expire the flash cookie of `kind` once it has been shown.
pub fn clear_flash(res: &mut HandlerResponse, kind: FlashKind, base_path: &MountPrefix) {
    res.headers.push((
        "set-cookie".into(),
        format!(
            "{}=; Path={}; Max-Age=0; HttpOnly; SameSite=Lax",
            kind.cookie_name(),
            base_path.join("/")
        ),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_prefixes_mount_path() {
        let res = Redirect::to(&MountPrefix::new("/blog"), "/login").into_response();
        assert_eq!(res.status, 302);
        assert_eq!(res.get_header("location"), Some("/blog/login"));
        assert!(res.body.is_empty());
    }

    #[test]
    fn test_away_and_status_override() {
        let res: HandlerResponse = Redirect::away("https://example.com/x").status(301).into();
        assert_eq!(res.status, 301);
        assert_eq!(res.get_header("location"), Some("https://example.com/x"));
    }

    #[test]
    fn test_back_uses_referer_or_fallback() {
        let req = HandlerRequest::new("POST", "/blog/posts/3/delete")
            .with_base_path(MountPrefix::new("/blog"))
            .with_header("Referer", "http://localhost/blog/my-posts");
        assert_eq!(Redirect::back(&req, "/").location(), "http://localhost/blog/my-posts");

        let req = HandlerRequest::new("POST", "/x").with_base_path(MountPrefix::new("/blog"));
        assert_eq!(Redirect::back(&req, "/my-posts").location(), "/blog/my-posts");
    }

    #[test]
    fn test_flash_cookie_round_trip() {
        let res = Redirect::to(&MountPrefix::new("/blog"), "/my-posts")
            .with_success("Post saved & published")
            .into_response();
        let cookie = res.get_header("set-cookie").unwrap();
        assert!(cookie.starts_with("flash_success=Post%20saved%20%26%20published;"));
        assert!(cookie.contains("Path=/blog/"));

        let value = cookie.split(';').next().unwrap().split_once('=').unwrap().1;
        let req = HandlerRequest::new("GET", "/my-posts").with_cookie("flash_success", value);
        assert_eq!(
            take_flash(&req),
            Some((FlashKind::Success, "Post saved & published".to_owned()))
        );
    }

    #[test]
    fn test_clear_flash_expires_cookie() {
        let mut res = HandlerResponse::html(200, "ok");
        clear_flash(&mut res, FlashKind::Error, &MountPrefix::default());
        assert_eq!(
            res.get_header("set-cookie"),
            Some("flash_error=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
        );
        assert_eq!(take_flash(&HandlerRequest::new("GET", "/")), None);
    }
}
