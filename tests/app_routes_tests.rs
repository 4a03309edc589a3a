//! The blog application dispatched end to end, without a socket.

mod common;

use blogrouter::dispatcher::{HandlerRequest, MountPrefix};
use blogrouter::server::parse_query_params;

/// Request as the hosting adapter would build it, minus headers and body.
fn request(method: &str, target: &str) -> HandlerRequest {
    let mut req = HandlerRequest::new(method, target).with_base_path(MountPrefix::new("/blog"));
    req.query_params = parse_query_params(target);
    req
}

/// The page marks which view it stands for; HTML escaping may turn `/` into `&#x2f;`.
fn renders_view(body: &str, view: &str) -> bool {
    body.contains(&format!(r#"data-view="{view}""#))
        || body.contains(&format!(r#"data-view="{}""#, view.replace('/', "&#x2f;")))
}

#[test]
fn test_pages_render() {
    let dispatcher = common::blog_dispatcher("/blog");
    let pages = [
        ("/blog/", "home/index"),
        ("/blog/posts?page=2", "posts/index"),
        ("/blog/posts/my-first-post", "posts/show"),
        ("/blog/author/7", "posts/author"),
        ("/blog/search?q=rust", "posts/index"),
        ("/blog/login", "auth/login"),
        ("/blog/my-posts/create", "posts/create"),
        ("/blog/my-posts/3/edit", "posts/edit"),
        ("/blog/profile", "user/profile"),
        ("/blog/admin", "admin/index"),
    ];
    for (target, view) in pages {
        let res = dispatcher.handle(&request("GET", target)).unwrap();
        assert_eq!(res.status, 200, "{target}");
        assert_eq!(res.get_header("content-type"), Some("text/html; charset=utf-8"));
        assert!(
            renders_view(&res.body, view),
            "{target} should render {view}"
        );
    }
}

#[test]
fn test_captures_reach_the_page() {
    let dispatcher = common::blog_dispatcher("/blog");
    let res = dispatcher.handle(&request("GET", "/blog/posts/hello-world/")).unwrap();
    assert!(res.body.contains("<dd>hello-world</dd>"));

    let res = dispatcher.handle(&request("GET", "/blog/posts?page=3")).unwrap();
    assert!(res.body.contains("<dd>3</dd>"));

    let res = dispatcher.handle(&request("GET", "/blog/search?q=%3Cscript%3E")).unwrap();
    assert!(res.body.contains("&lt;script&gt;"));
    assert!(!res.body.contains("<script>"));
}

#[test]
fn test_about_is_served_inline() {
    let dispatcher = common::blog_dispatcher("/blog");
    let res = dispatcher.handle(&request("GET", "/blog/about")).unwrap();
    assert_eq!(res.status, 200);
    assert!(res.body.starts_with("blogrouter "));
    assert!(res.body.ends_with("mounted at '/blog'"));
}

#[test]
fn test_form_posts_redirect_with_flash() {
    let dispatcher = common::blog_dispatcher("/blog");

    let res = dispatcher.handle(&request("POST", "/blog/my-posts")).unwrap();
    assert_eq!(res.status, 302);
    assert_eq!(res.get_header("location"), Some("/blog/my-posts/create"));
    let cookie = res.get_header("set-cookie").unwrap();
    assert!(cookie.starts_with("flash_error=Title%20is%20required"));
    assert!(cookie.contains("Path=/blog/"));

    let res = dispatcher
        .handle(
            &request("POST", "/blog/my-posts")
                .with_form_field("title", "Hello")
                .with_form_field("content", "World"),
        )
        .unwrap();
    assert_eq!(res.get_header("location"), Some("/blog/my-posts"));
    assert!(res.get_header("set-cookie").unwrap().starts_with("flash_success="));

    let res = dispatcher.handle(&request("POST", "/blog/logout")).unwrap();
    assert_eq!(res.status, 302);
    assert_eq!(res.get_header("location"), Some("/blog/"));
    assert_eq!(res.get_header("set-cookie"), None);
}

#[test]
fn test_flash_is_shown_once() {
    let dispatcher = common::blog_dispatcher("/blog");
    let res = dispatcher
        .handle(&request("GET", "/blog/my-posts").with_cookie("flash_success", "Post%20created."))
        .unwrap();
    assert!(res.body.contains("Post created."));
    assert!(res
        .get_header("set-cookie")
        .unwrap()
        .starts_with("flash_success=; Path=/blog/; Max-Age=0"));
}

#[test]
fn test_fallback_pages() {
    let dispatcher = common::blog_dispatcher("/blog");

    for (method, target) in [("GET", "/blog/nowhere"), ("GET", "/blog/logout"), ("DELETE", "/blog/posts/1")] {
        let res = dispatcher.handle(&request(method, target)).unwrap();
        assert_eq!(res.status, 404, "{method} {target}");
        assert!(res.body.contains(r#"href="/blog/""#));
    }
}

#[test]
fn test_bad_captures_surface_as_handler_errors() {
    let dispatcher = common::blog_dispatcher("/blog");
    // `{id}` only accepts digits, but a value past u64 still fails to parse.
    let err = dispatcher
        .handle(&request("GET", "/blog/my-posts/99999999999999999999999/edit"))
        .unwrap_err();
    assert!(err.to_string().contains("99999999999999999999999"), "{err}");
}
