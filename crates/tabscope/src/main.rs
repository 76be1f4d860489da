use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tabscope_core::config::{ScopeConfig, TabTarget, DEFAULT_MAX_DEPTH};

mod session;

const DEFAULT_PORT: u16 = 9222;

/// Attach to a live browser tab over the remote debugging protocol and
/// write a diagnostic bundle: screenshots, a style/DOM snapshot, a
/// performance profile, and time-correlated network/console logs.
#[derive(Parser, Debug)]
#[command(name = "tabscope", version, about)]
struct Args {
    /// Tab index to inspect (ignored when --url is given)
    #[arg(long, default_value_t = 0)]
    tab: usize,

    /// Select the tab whose URL (or, failing that, title) contains this
    /// keyword
    #[arg(long)]
    url: Option<String>,

    /// Debugging endpoint host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Debugging endpoint port (default: CDP_PORT env var, then 9222)
    #[arg(long)]
    port: Option<u16>,

    /// Skip network request capture (and the reload it triggers)
    #[arg(long)]
    no_network: bool,

    /// Skip console log capture
    #[arg(long)]
    no_console: bool,

    /// Skip performance sampling
    #[arg(long)]
    no_perf: bool,

    /// Seconds to let network activity settle after the reload
    #[arg(long, default_value_t = 5)]
    network_wait: u64,

    /// Maximum DOM snapshot depth
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    depth: usize,

    /// Output directory (default: DEBUG_OUTPUT_DIR env var, then
    /// ./debug-output)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// CSS selectors to sample instead of the default set
    selectors: Vec<String>,
}

fn resolve_port(flag: Option<u16>) -> u16 {
    if let Some(port) = flag {
        return port;
    }
    match std::env::var("CDP_PORT") {
        Ok(value) => value.trim().parse().unwrap_or(DEFAULT_PORT),
        Err(_) => DEFAULT_PORT,
    }
}

fn resolve_output_dir(flag: Option<PathBuf>) -> PathBuf {
    let dir = flag
        .or_else(|| std::env::var("DEBUG_OUTPUT_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("debug-output"));
    if dir.is_absolute() {
        dir
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&dir))
            .unwrap_or(dir)
    }
}

fn build_config(args: Args) -> ScopeConfig {
    let target = match args.url {
        Some(keyword) => TabTarget::Keyword(keyword),
        None => TabTarget::Index(args.tab),
    };

    ScopeConfig {
        host: args.host,
        port: resolve_port(args.port),
        target,
        selectors: args.selectors,
        capture_network: !args.no_network,
        capture_console: !args.no_console,
        capture_performance: !args.no_perf,
        network_wait: Duration::from_secs(args.network_wait),
        max_depth: args.depth,
        output_dir: resolve_output_dir(args.output_dir),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr; stdout carries the progress log.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(Args::parse());

    if let Err(e) = session::run(&config).await {
        eprintln!("Error: {}", e);
        eprintln!("  hint: {}", e.remediation());
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::parse_from(std::iter::once("tabscope").chain(args.iter().copied()))
    }

    #[test]
    fn keyword_flag_wins_over_index() {
        let config = build_config(parse(&["--tab", "3", "--url", "b.com"]));
        assert_eq!(config.target, TabTarget::Keyword("b.com".to_string()));
    }

    #[test]
    fn index_is_the_default_target() {
        let config = build_config(parse(&["--tab", "2"]));
        assert_eq!(config.target, TabTarget::Index(2));
    }

    #[test]
    fn capture_flags_invert_the_switches() {
        let config = build_config(parse(&["--no-network", "--no-perf"]));
        assert!(!config.capture_network);
        assert!(config.capture_console);
        assert!(!config.capture_performance);
    }

    #[test]
    fn positionals_become_selectors() {
        let config = build_config(parse(&["button", ".card"]));
        assert_eq!(config.selectors, vec!["button", ".card"]);
    }

    #[test]
    fn port_flag_overrides_env_fallback() {
        assert_eq!(resolve_port(Some(9333)), 9333);
    }

    #[test]
    fn output_dir_flag_is_resolved_against_cwd() {
        let dir = resolve_output_dir(Some(PathBuf::from("captures")));
        assert!(dir.is_absolute());
        assert!(dir.ends_with("captures"));
    }
}
