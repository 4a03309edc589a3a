//! Unit tests for CLI commands

use crate::cli::{execute, Cli, Commands};
use clap::Parser;

fn run(args: &[&str]) -> String {
    let cli = Cli::try_parse_from(args).unwrap();
    let mut out = Vec::new();
    execute(cli.command, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_serve_command_flags() {
    let cli = Cli::try_parse_from([
        "blogrouter",
        "serve",
        "--config",
        "blog.yaml",
        "--addr",
        "0.0.0.0:9000",
        "--base-path",
        "/blog",
    ])
    .unwrap();

    match cli.command {
        Commands::Serve {
            config,
            addr,
            base_path,
        } => {
            assert_eq!(config.unwrap().to_string_lossy(), "blog.yaml");
            assert_eq!(addr.as_deref(), Some("0.0.0.0:9000"));
            assert_eq!(base_path.as_deref(), Some("/blog"));
        }
        other => panic!("Expected Serve command, got {other:?}"),
    }
}

#[test]
fn test_routes_lists_table_in_order() {
    let out = run(&["blogrouter", "routes"]);
    let mut lines = out.lines();
    assert!(lines.next().unwrap().ends_with(" routes"));
    let first = lines.next().unwrap();
    assert!(first.contains("GET"));
    assert!(first.contains("HomeController@index"));
    assert!(!out.contains("unresolved"));
}

#[test]
fn test_match_reports_captures() {
    let out = run(&["blogrouter", "match", "GET", "/blog/posts/hello/?x=1", "--base-path", "/blog"]);
    assert!(out.starts_with("GET /posts/hello -> PostController@show_post"));
    assert!(out.contains("  slug = hello"));
}

#[test]
fn test_match_reports_miss() {
    let out = run(&["blogrouter", "match", "DELETE", "/posts/1"]);
    assert_eq!(out.trim_end(), "no match: DELETE /posts/1 (404)");
}

#[test]
fn test_match_explain_prints_scan() {
    let out = run(&["blogrouter", "match", "POST", "/login", "--explain"]);
    assert!(out.contains("[info] router initialised"));
    assert!(out.contains("[info] checking route"));
    assert!(out.contains("[info] route matched"));
}

#[test]
fn test_serve_is_not_inspection() {
    let cli = Cli::try_parse_from(["blogrouter", "serve"]).unwrap();
    assert!(execute(cli.command, &mut Vec::new()).is_err());
}
