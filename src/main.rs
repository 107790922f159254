//! getjs main entry point
//!
//! This is the command-line interface around the getjs pipeline.

use anyhow::Context;
use clap::Parser;
use getjs::config::{load_config, validate, Config};
use getjs::crawler::Runner;
use getjs::input::{read_work_items, WorkItem};
use getjs::output::{open_append, ResultSink, WriterSink};
use getjs::url::parse_page_url;
use getjs::{ConfigError, Diagnostics};
use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;
use url::Url;

/// Exit status for missing input or contradictory flags
const USAGE_EXIT_CODE: i32 = 3;

/// getjs: find the JavaScript sources a web page loads
///
/// Page URLs are taken from --url, --input and stdin. Input that does not
/// start with a URL is treated as a saved response body.
#[derive(Parser, Debug, Clone)]
#[command(name = "getjs")]
#[command(version)]
#[command(about = "Get all JavaScript sources from web pages", long_about = None)]
struct Cli {
    /// The url to get the javascript sources from (repeatable)
    #[arg(short = 'u', long = "url", value_name = "URL")]
    urls: Vec<String>,

    /// Input file with urls, or a saved response body
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Page URL a raw response body was fetched from, used for --complete
    #[arg(long, value_name = "URL")]
    base: Option<String>,

    /// Output file to append the results to (repeatable)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    outputs: Vec<PathBuf>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// The request method, e.g. GET or POST
    #[arg(short = 'X', long)]
    method: Option<String>,

    /// Any HTTP header, e.g. -H "Authorization: Bearer token" (repeatable)
    #[arg(short = 'H', long = "header", value_name = "HEADER")]
    headers: Vec<String>,

    /// Skip TLS certificate verification
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Max timeout for the requests, in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Complete the urls, e.g. prepend the domain to a path
    #[arg(long)]
    complete: bool,

    /// Output only sources that exist (requires --complete)
    #[arg(long)]
    resolve: bool,

    /// Number of pages fetched in parallel
    #[arg(short = 't', long, value_name = "N")]
    threads: Option<usize>,

    /// Display what is going on
    #[arg(short, long)]
    verbose: bool,

    /// Disable colors in diagnostic output
    #[arg(long)]
    no_colors: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let colors = !cli.no_colors && io::stderr().is_terminal();
    let dispatch = Diagnostics::new(cli.verbose, colors).into_dispatch();
    if let Err(e) = tracing::dispatcher::set_global_default(dispatch.clone()) {
        tracing::debug!("Keeping the existing global subscriber: {}", e);
    }

    let config = merge_config(&cli).context("Couldn't load configuration")?;
    if config.pipeline.resolve && !config.pipeline.complete {
        exit_usage("Resolve can only be used in combination with --complete");
    }
    validate(&config).context("Invalid configuration")?;

    let base = match &cli.base {
        Some(raw) => Some(parse_page_url(raw).context("Invalid --base URL")?),
        None => None,
    };

    let items = tokio::task::spawn_blocking({
        let cli = cli.clone();
        move || collect_work_items(&cli, base.as_ref())
    })
    .await??;

    if items.is_empty() {
        exit_usage("No urls supplied");
    }

    let sinks = build_sinks(&cli)?;
    let runner = Runner::new(&config)?.with_diagnostics(dispatch);
    let summary = runner.run_to_sinks(items, sinks).await?;

    tracing::debug!(
        "Done: {} input(s), {} failed, {} result(s)",
        summary.items,
        summary.failed,
        summary.results
    );

    Ok(())
}

/// Layers command-line flags over the configuration file (or defaults)
fn merge_config(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => Config::default(),
    };

    if let Some(method) = &cli.method {
        config.request.method = method.clone();
    }
    config.request.headers.extend(cli.headers.iter().cloned());
    if cli.insecure {
        config.request.insecure = true;
    }
    if let Some(timeout) = cli.timeout {
        config.request.timeout = timeout;
    }
    if cli.complete {
        config.pipeline.complete = true;
    }
    if cli.resolve {
        config.pipeline.resolve = true;
    }
    if let Some(threads) = cli.threads {
        config.pipeline.threads = threads;
    }

    Ok(config)
}

/// Gathers work items from stdin, --input and --url, in that order
fn collect_work_items(cli: &Cli, base: Option<&Url>) -> anyhow::Result<Vec<WorkItem>> {
    let mut items = Vec::new();

    let stdin = io::stdin();
    if !stdin.is_terminal() {
        let from_stdin = read_work_items(stdin.lock(), base).context("Couldn't read stdin")?;
        if !from_stdin.is_empty() {
            tracing::info!("Received {} input(s) from stdin", from_stdin.len());
        }
        items.extend(from_stdin);
    }

    if let Some(path) = &cli.input {
        let file = File::open(path)
            .with_context(|| format!("Couldn't open input file {}", path.display()))?;
        let from_file = read_work_items(BufReader::new(file), base)
            .with_context(|| format!("Couldn't read input file {}", path.display()))?;
        tracing::info!("Read {} input(s) from {}", from_file.len(), path.display());
        items.extend(from_file);
    }

    for raw in &cli.urls {
        match parse_page_url(raw) {
            Ok(url) => {
                tracing::info!("Set url to {}", url);
                items.push(WorkItem::PageUrl(url));
            }
            Err(e) => tracing::warn!("Skipping --url {}: {}", raw, e),
        }
    }

    Ok(items)
}

/// Stdout plus one append-mode sink per --output file
fn build_sinks(cli: &Cli) -> anyhow::Result<Vec<Box<dyn ResultSink>>> {
    let mut sinks: Vec<Box<dyn ResultSink>> = vec![Box::new(WriterSink::stdout())];

    for path in &cli.outputs {
        tracing::info!("Saving output to {}", path.display());
        sinks.push(Box::new(open_append(path)?));
    }

    Ok(sinks)
}

fn exit_usage(message: &str) -> ! {
    eprintln!("getjs: {}", message);
    std::process::exit(USAGE_EXIT_CODE);
}
