use crate::dispatcher::{normalize_path, Dispatcher, MountPrefix};
use crate::logging::init_logging_with_config;
use crate::observe::MemoryLogger;
use crate::registry::ControllerRegistry;
use crate::router::Router;
use crate::routes::{build_app, build_dispatcher};
use crate::runtime_config::RuntimeConfig;
use crate::server::{AppService, HttpServer};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Command-line interface for the blog router
#[derive(Parser, Debug)]
#[command(name = "blogrouter", version)]
#[command(about = "Blog routing core: serve, inspect routes, test matches", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// YAML configuration file
        #[arg(short, long, env = "BLOG_CONFIG")]
        config: Option<PathBuf>,

        /// Address and port to bind (overrides config and environment)
        #[arg(long)]
        addr: Option<String>,

        /// Mount prefix the application is served under, e.g. /blog
        #[arg(long)]
        base_path: Option<String>,
    },
    /// Print the route table in precedence order
    Routes,
    /// Show which route a request would reach, without running it
    Match {
        /// HTTP method, compared exactly (GET, POST, ...)
        method: String,

        /// Request target, e.g. /blog/posts/hello?ref=home
        target: String,

        /// Mount prefix to strip before matching
        #[arg(long, default_value = "")]
        base_path: String,

        /// Also print every dispatch log record
        #[arg(long, default_value_t = false)]
        explain: bool,
    },
}

/// Parse arguments and execute the command
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, the route table is
/// malformed, or the server fails to start.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            config,
            addr,
            base_path,
        } => serve(config, addr, base_path),
        command => execute(command, &mut io::stdout().lock()),
    }
}

/// Run an inspection command, writing its report to `out`.
///
/// # Errors
///
/// A malformed route table or a failed write. `serve` is rejected here.
pub fn execute<W: Write>(command: Commands, out: &mut W) -> Result<()> {
    match command {
        Commands::Routes => {
            let (router, controllers) = build_app()?;
            write_routes(&router, &controllers, out)
        }
        Commands::Match {
            method,
            target,
            base_path,
            explain,
        } => {
            let (router, controllers) = build_app()?;
            let mut dispatcher = Dispatcher::new(router, controllers, MountPrefix::new(&base_path));
            let logger = explain.then(|| Arc::new(MemoryLogger::new()));
            if let Some(logger) = &logger {
                dispatcher = dispatcher.with_logger(logger.clone());
            }
            write_match(&dispatcher, &method, &target, out)?;
            if let Some(logger) = logger {
                for record in logger.records() {
                    writeln!(out, "  [{}] {} {}", record.level.as_str(), record.message, record.context)?;
                }
            }
            Ok(())
        }
        Commands::Serve { .. } => anyhow::bail!("serve is not an inspection command"),
    }
}

fn write_routes<W: Write>(router: &Router, controllers: &ControllerRegistry, out: &mut W) -> Result<()> {
    let unresolved = router.unresolved(controllers);
    writeln!(out, "{} routes", router.len())?;
    for (i, route) in router.routes().iter().enumerate() {
        let flag = if unresolved.iter().any(|r| std::ptr::eq(*r, route)) {
            "  (unresolved controller)"
        } else {
            ""
        };
        writeln!(
            out,
            "{i:>3}  {:<6} {:<32} -> {}{flag}",
            route.method.as_str(),
            route.pattern,
            route.handler
        )?;
    }
    Ok(())
}

fn write_match<W: Write>(dispatcher: &Dispatcher, method: &str, target: &str, out: &mut W) -> Result<()> {
    let path = normalize_path(target, dispatcher.base_path());
    match dispatcher.match_route(method, target) {
        Some(m) => {
            writeln!(out, "{method} {path} -> {}", m.route.handler)?;
            writeln!(out, "  route #{}: {}", m.index, m.route.pattern)?;
            for (name, value) in m.route.matcher.param_names().zip(m.captures.iter()) {
                writeln!(out, "  {name} = {value}")?;
            }
        }
        None => writeln!(out, "no match: {method} {path} (404)")?,
    }
    Ok(())
}

fn serve(config: Option<PathBuf>, addr: Option<String>, base_path: Option<String>) -> Result<()> {
    let mut config = RuntimeConfig::load(config.as_deref())?;
    if let Some(addr) = addr {
        config.addr = addr;
    }
    if let Some(base_path) = base_path {
        config.base_path = base_path;
    }

    let _log_guard = init_logging_with_config(&config.log_config())?;
    may::config().set_stack_size(config.stack_size);

    let dispatcher = build_dispatcher(&config)?;
    let handle = HttpServer(AppService::new(dispatcher))
        .start(config.addr.as_str())
        .with_context(|| format!("binding {}", config.addr))?;
    handle.wait_ready().context("server did not become ready")?;
    info!(
        addr = %handle.addr(),
        base_path = %config.mount_prefix(),
        stack_size = config.stack_size,
        "Server listening"
    );

    wait_for_shutdown()?;
    info!("Shutting down");
    handle.stop();
    Ok(())
}

#[cfg(unix)]
fn wait_for_shutdown() -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    let mut signals = signal_hook::iterator::Signals::new([SIGINT, SIGTERM])
        .context("installing signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Signal received");
    }
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown() -> Result<()> {
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(())
}
