use crate::dispatcher::HandlerRequest;
use crate::handlers::{Controller, HandlerResult};
use crate::redirect::Redirect;
use crate::router::Captures;

use super::render_page;

/// Moderation screens: users, posts and the audit log.
#[derive(Debug, Default)]
pub struct AdminController;

impl AdminController {
    pub const NAME: &'static str = "AdminController";

    fn page(req: &HandlerRequest, view: &str) -> HandlerResult {
        let page = req
            .get_query_param("page")
            .and_then(|p| p.parse::<u32>().ok())
            .unwrap_or(1)
            .max(1);
        render_page(req, view, &[("page", page.to_string())])
    }

    fn back_to(req: &HandlerRequest, args: &Captures, path: &str, message: &str) -> HandlerResult {
        let _id: u64 = args.parse(0)?;
        Ok(Redirect::to(&req.base_path, path).with_success(message).into())
    }
}

impl Controller for AdminController {
    fn invoke(&mut self, action: &str, req: &HandlerRequest, args: &Captures) -> Option<HandlerResult> {
        let result = match action {
            "admin_index" => render_page(req, "admin/index", &[]),
            "admin_user_list" => Self::page(req, "admin/users"),
            "admin_delete_user" => Self::back_to(req, args, "/admin/users", "User deleted."),
            "admin_posts" => Self::page(req, "admin/posts"),
            "admin_switch_status" => Self::back_to(req, args, "/admin/posts", "Post status updated."),
            "admin_audit_log" => Self::page(req, "admin/audit"),
            "admin_restore" => Self::back_to(req, args, "/admin/audit", "Entry restored."),
            "admin_audit_delete" => Self::back_to(req, args, "/admin/audit", "Entry deleted."),
            _ => return None,
        };
        Some(result)
    }
}
