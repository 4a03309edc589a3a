use crate::dispatcher::HandlerRequest;
use crate::handlers::{Controller, HandlerResult};
use crate::redirect::Redirect;
use crate::router::Captures;

use super::{form_text, render_page};

const POST_STATUSES: [&str; 3] = ["draft", "published", "archived"];

/// Public post listing plus the author's own post management.
#[derive(Debug, Default)]
pub struct PostController;

impl PostController {
    pub const NAME: &'static str = "PostController";

    fn index(req: &HandlerRequest) -> HandlerResult {
        let page = req
            .get_query_param("page")
            .and_then(|p| p.parse::<u32>().ok())
            .unwrap_or(1)
            .max(1);
        render_page(req, "posts/index", &[("page", page.to_string())])
    }

    fn show_post(req: &HandlerRequest, args: &Captures) -> HandlerResult {
        let slug = args.arg(0)?;
        render_page(req, "posts/show", &[("slug", slug.to_owned())])
    }

    fn show_author(req: &HandlerRequest, args: &Captures) -> HandlerResult {
        let author_id: u64 = args.parse(0)?;
        render_page(req, "posts/author", &[("author_id", author_id.to_string())])
    }

    fn search(req: &HandlerRequest) -> HandlerResult {
        let query = req.get_query_param("q").map(str::trim).unwrap_or_default();
        render_page(req, "posts/index", &[("search_query", query.to_owned())])
    }

    fn my_posts(req: &HandlerRequest) -> HandlerResult {
        render_page(req, "posts/my-posts", &[])
    }

    fn create(req: &HandlerRequest) -> HandlerResult {
        render_page(req, "posts/create", &[])
    }

    fn store(req: &HandlerRequest) -> HandlerResult {
        if let Some(problem) = validate_post(form_text(req, "title"), form_text(req, "content")) {
            return Ok(Redirect::to(&req.base_path, "/my-posts/create")
                .with_error(problem)
                .into());
        }
        Ok(Redirect::to(&req.base_path, "/my-posts")
            .with_success("Post created.")
            .into())
    }

    fn edit(req: &HandlerRequest, args: &Captures) -> HandlerResult {
        let id: u64 = args.parse(0)?;
        render_page(req, "posts/edit", &[("id", id.to_string())])
    }

    fn update(req: &HandlerRequest, args: &Captures) -> HandlerResult {
        let id: u64 = args.parse(0)?;
        if let Some(problem) = validate_post(form_text(req, "title"), form_text(req, "content")) {
            return Ok(Redirect::to(&req.base_path, &format!("/my-posts/{id}/edit"))
                .with_error(problem)
                .into());
        }
        let status = form_text(req, "status");
        if !status.is_empty() && !POST_STATUSES.contains(&status) {
            return Ok(Redirect::to(&req.base_path, &format!("/my-posts/{id}/edit"))
                .with_error("Unknown post status.")
                .into());
        }
        Ok(Redirect::to(&req.base_path, "/my-posts")
            .with_success("Post updated.")
            .into())
    }

    fn delete(req: &HandlerRequest, args: &Captures) -> HandlerResult {
        let _id: u64 = args.parse(0)?;
        Ok(Redirect::to(&req.base_path, "/my-posts")
            .with_success("Post deleted.")
            .into())
    }

    fn publish(req: &HandlerRequest, args: &Captures) -> HandlerResult {
        let _id: u64 = args.parse(0)?;
        Ok(Redirect::to(&req.base_path, "/my-posts")
            .with_success("Post status changed.")
            .into())
    }
}

fn validate_post(title: &str, content: &str) -> Option<&'static str> {
    if title.is_empty() {
        Some("Title is required.")
    } else if title.chars().count() > 255 {
        Some("Title must be at most 255 characters.")
    } else if content.is_empty() {
        Some("Content is required.")
    } else {
        None
    }
}

impl Controller for PostController {
    fn invoke(&mut self, action: &str, req: &HandlerRequest, args: &Captures) -> Option<HandlerResult> {
        let result = match action {
            "index" => Self::index(req),
            "show_post" => Self::show_post(req, args),
            "show_author" => Self::show_author(req, args),
            "search" => Self::search(req),
            "my_posts" => Self::my_posts(req),
            "create" => Self::create(req),
            "store" => Self::store(req),
            "edit" => Self::edit(req, args),
            "update" => Self::update(req, args),
            "delete" => Self::delete(req, args),
            "publish" => Self::publish(req, args),
            _ => return None,
        };
        Some(result)
    }
}
