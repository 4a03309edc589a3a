//! The blog's route table.
//!
//! Order matters: the first matching registration wins, so literal paths that could
//! also match a placeholder (`/my-posts/create` vs `/my-posts/{id}/...`) are declared
//! where no earlier pattern shadows them.

use crate::controllers;
use crate::dispatcher::{Dispatcher, HandlerResponse};
use crate::handlers::HandlerDescriptor;
use crate::observe::TracingLogger;
use crate::registry::ControllerRegistry;
use crate::router::{RegistrationError, Router};
use crate::runtime_config::RuntimeConfig;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

/// Register every application route, in precedence order.
///
/// Both declaration styles are in use: `"Controller@action"` strings and
/// `(controller, action)` pairs.
///
/// # Errors
///
/// The first malformed declaration.
pub fn register_routes(router: &mut Router) -> Result<(), RegistrationError> {
    router
        .get("/", "HomeController@index")?
        .get(
            "/about",
            HandlerDescriptor::inline(|req, _| {
                Ok(HandlerResponse::text(
                    200,
                    format!("blogrouter {} mounted at '{}'", env!("CARGO_PKG_VERSION"), req.base_path),
                ))
            }),
        )?;

    // Public posts
    router
        .get("/posts", ("PostController", "index"))?
        .get("/posts/{slug}", ("PostController", "show_post"))?
        .get("/author/{id}", ("PostController", "show_author"))?
        .get("/search", ("PostController", "search"))?;

    // Authentication
    router
        .get("/login", "AuthController@show_login")?
        .post("/login", "AuthController@login")?
        .get("/register", "AuthController@show_register")?
        .post("/register", "AuthController@register")?
        .post("/logout", "AuthController@logout")?;

    // The author's own posts
    router
        .get("/my-posts", "PostController@my_posts")?
        .get("/my-posts/create", "PostController@create")?
        .post("/my-posts", "PostController@store")?
        .get("/my-posts/{id}/edit", "PostController@edit")?
        .post("/my-posts/{id}/update", "PostController@update")?
        .post("/my-posts/{id}/delete", "PostController@delete")?
        .post("/my-posts/{id}/publish", "PostController@publish")?;

    // Profile
    router
        .get("/profile", "UserController@user_profile")?
        .get("/profile/edit", "UserController@user_edit_profile")?
        .post("/profile/update", "UserController@update")?
        .post("/profile/avatar", "UserController@avatar")?;

    // Administration
    router
        .get("/admin", "AdminController@admin_index")?
        .get("/admin/users", "AdminController@admin_user_list")?
        .post("/admin/users/{id}/delete", "AdminController@admin_delete_user")?
        .get("/admin/posts", "AdminController@admin_posts")?
        .post("/admin/posts/{id}/status", "AdminController@admin_switch_status")?
        .get("/admin/audit", "AdminController@admin_audit_log")?
        .post("/admin/audit/{id}/restore", "AdminController@admin_restore")?
        .post("/admin/audit/{id}/delete", "AdminController@admin_audit_delete")?;

    Ok(())
}

/// Build the application's route table and controller registry.
///
/// # Errors
///
/// A malformed route declaration.
pub fn build_app() -> anyhow::Result<(Router, ControllerRegistry)> {
    let mut router = Router::new();
    register_routes(&mut router).context("registering application routes")?;
    let mut controllers = ControllerRegistry::new();
    controllers::register_all(&mut controllers);
    Ok((router, controllers))
}

/// Application dispatcher for `config`, logging through `tracing`.
///
/// # Errors
///
/// See [`build_app`].
pub fn build_dispatcher(config: &RuntimeConfig) -> anyhow::Result<Dispatcher> {
    let (router, controllers) = build_app()?;
    let unresolved = router.unresolved(&controllers).len();
    if unresolved > 0 {
        tracing::warn!(unresolved, "Routes reference unregistered controllers");
    }
    let base_path = config.mount_prefix();
    info!(routes = router.len(), base_path = %base_path, "Route table ready");
    Ok(Dispatcher::new(router, controllers, base_path).with_logger(Arc::new(TracingLogger)))
}
