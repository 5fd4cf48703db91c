//! Linkscope main entry point
//!
//! This is the command-line interface for the Linkscope link auditor.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use linkscope::config::{load_config, validate, AuditConfig, BasicAuth};
use linkscope::engine::{AuditReport, Auditor, LinkScope, ProgressEvent};
use linkscope::checker::Outcome;

/// Linkscope: a polite broken-link auditor
///
/// Linkscope crawls the pages you give it, collects every link, and
/// verifies each one by tracing its full redirect chain. It respects
/// robots.txt and backs off hosts that ask it to slow down.
#[derive(Parser, Debug)]
#[command(name = "linkscope")]
#[command(version = "1.0.0")]
#[command(about = "A polite broken-link auditor", long_about = None)]
struct Cli {
    /// Page URL to audit (repeatable)
    #[arg(short, long, value_name = "URL")]
    url: Vec<String>,

    /// File with one page URL per line (# comments allowed)
    #[arg(long, value_name = "FILE")]
    urls_file: Option<PathBuf>,

    /// Base URL for internal/external classification (defaults to the first page)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured User-Agent
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Override the request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Override the per-host delay in milliseconds
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Override the transient-error retry count
    #[arg(long, value_name = "N", conflicts_with = "no_retry")]
    max_retries: Option<u32>,

    /// Disable transient-error retries entirely
    #[arg(long)]
    no_retry: bool,

    /// Treat subdomains of the base host as internal
    #[arg(long)]
    include_subdomains: bool,

    /// Skip robots.txt checks (for auditing your own sites)
    #[arg(long)]
    ignore_robots: bool,

    /// HTTP Basic auth username
    #[arg(long, value_name = "USER", requires = "auth_pass")]
    auth_user: Option<String>,

    /// HTTP Basic auth password
    #[arg(long, value_name = "PASS", requires = "auth_user")]
    auth_pass: Option<String>,

    /// Extra request header as "Name: value" (repeatable)
    #[arg(long, value_name = "HEADER")]
    header: Vec<String>,

    /// Cookie as "name=value" (repeatable)
    #[arg(long, value_name = "COOKIE")]
    cookie: Vec<String>,

    /// Only verify links pointing at the base site
    #[arg(long, conflicts_with = "external_only")]
    internal_only: bool,

    /// Only verify links pointing away from the base site
    #[arg(long, conflicts_with = "internal_only")]
    external_only: bool,

    /// Stop after this many pages
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Write the full report as JSON to this path
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;
    let pages = collect_pages(&cli)?;
    let base_url = match &cli.base_url {
        Some(base) => base.clone(),
        None => pages[0].clone(),
    };
    let scope = if cli.internal_only {
        LinkScope::InternalOnly
    } else if cli.external_only {
        LinkScope::ExternalOnly
    } else {
        LinkScope::All
    };

    tracing::info!(
        pages = pages.len(),
        base_url = %base_url,
        "starting audit"
    );

    let auditor = Auditor::new(config, &base_url)?;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let quiet = cli.quiet;
    let progress = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if quiet {
                continue;
            }
            match event {
                ProgressEvent::PageCrawled { completed, total } => {
                    eprintln!("Crawled page {}/{}", completed, total);
                }
                ProgressEvent::LinkChecked { completed, total } => {
                    if completed % 25 == 0 || completed == total {
                        eprintln!("Checked {}/{} links", completed, total);
                    }
                }
            }
        }
    });

    let report = auditor.run(&pages, scope, Some(tx)).await;
    let _ = progress.await;

    if let Some(path) = &cli.json {
        write_json_report(path, &report, &auditor)
            .with_context(|| format!("failed to write JSON report to {}", path.display()))?;
        if !cli.quiet {
            println!("Report written to {}", path.display());
        }
    }

    let problems = print_summary(&report, &auditor, cli.quiet);

    Ok(if problems > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkscope=warn,error"),
            1 => EnvFilter::new("linkscope=info,warn"),
            2 => EnvFilter::new("linkscope=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the config file (if any) and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<AuditConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => AuditConfig::default(),
    };

    if let Some(ua) = &cli.user_agent {
        config.user_agent = ua.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(retries) = cli.max_retries {
        config.max_retries = retries;
    }
    if cli.no_retry {
        config.max_retries = 0;
    }
    if cli.include_subdomains {
        config.include_subdomains = true;
    }
    if cli.ignore_robots {
        config.ignore_robots = true;
    }
    if let (Some(user), Some(pass)) = (&cli.auth_user, &cli.auth_pass) {
        config.basic_auth = Some(BasicAuth {
            username: user.clone(),
            password: pass.clone(),
        });
    }
    for header in &cli.header {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("invalid header '{}', expected 'Name: value'", header))?;
        config
            .headers
            .insert(name.trim().to_string(), value.trim().to_string());
    }
    for cookie in &cli.cookie {
        let (name, value) = cookie
            .split_once('=')
            .with_context(|| format!("invalid cookie '{}', expected 'name=value'", cookie))?;
        config
            .cookies
            .insert(name.trim().to_string(), value.trim().to_string());
    }

    validate(&config).context("invalid configuration")?;
    Ok(config)
}

/// Gathers page URLs from --url flags and --urls-file
fn collect_pages(cli: &Cli) -> anyhow::Result<Vec<String>> {
    let mut pages: Vec<String> = cli.url.clone();

    if let Some(path) = &cli.urls_file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            pages.push(line.to_string());
        }
    }

    if pages.is_empty() {
        bail!("no pages to audit; pass --url or --urls-file");
    }
    if let Some(max) = cli.max_pages {
        if max == 0 {
            bail!("--max-pages must be greater than 0");
        }
        pages.truncate(max);
    }
    Ok(pages)
}

#[derive(Serialize)]
struct JsonReport<'a> {
    pages_crawled: usize,
    pages_skipped: usize,
    links: &'a [linkscope::ExtractedLink],
    statuses: Vec<&'a linkscope::LinkStatus>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonSummary {
    counts: BTreeMap<String, usize>,
    urls_with_retries: usize,
    total_retries: u32,
    head_blacklisted_hosts: usize,
    hosts_with_raised_delay: usize,
    robots_domains_fetched: usize,
}

/// Writes the full report to `path` as pretty-printed JSON
fn write_json_report(
    path: &std::path::Path,
    report: &AuditReport,
    auditor: &Auditor,
) -> anyhow::Result<()> {
    let mut statuses: Vec<&linkscope::LinkStatus> = report.statuses.values().collect();
    statuses.sort_by(|a, b| a.url.cmp(&b.url));

    let stats = auditor.cache_stats();
    let json = JsonReport {
        pages_crawled: report.pages_crawled,
        pages_skipped: report.pages_skipped,
        links: &report.links,
        statuses,
        summary: JsonSummary {
            counts: outcome_counts(report),
            urls_with_retries: stats.urls_with_retries,
            total_retries: stats.total_retries,
            head_blacklisted_hosts: stats.head_blacklisted_hosts,
            hosts_with_raised_delay: stats.hosts_with_raised_delay,
            robots_domains_fetched: auditor.robots_domains_fetched(),
        },
    };
    let content = serde_json::to_string_pretty(&json)?;
    std::fs::write(path, content)?;
    Ok(())
}

fn outcome_counts(report: &AuditReport) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for status in report.statuses.values() {
        *counts.entry(status.outcome().to_string()).or_default() += 1;
    }
    counts
}

/// Prints the human-readable summary and returns the number of problem links
fn print_summary(report: &AuditReport, auditor: &Auditor, quiet: bool) -> usize {
    let mut problems: Vec<&linkscope::LinkStatus> = report
        .statuses
        .values()
        .filter(|s| {
            matches!(
                s.outcome(),
                Outcome::Broken | Outcome::Error | Outcome::RedirectLoop
            )
        })
        .collect();
    problems.sort_by(|a, b| a.url.cmp(&b.url));

    if quiet {
        return problems.len();
    }

    println!("\n=== Linkscope Audit ===\n");
    println!(
        "Pages crawled: {} ({} skipped by robots.txt)",
        report.pages_crawled, report.pages_skipped
    );
    println!(
        "Links found: {} ({} unique checked)",
        report.links.len(),
        report.statuses.len()
    );

    println!("\nOutcomes:");
    for (outcome, count) in outcome_counts(report) {
        println!("  {:<20} {}", outcome, count);
    }

    if !problems.is_empty() {
        println!("\nProblem links:");
        for status in &problems {
            if status.error.is_empty() {
                println!("  [{}] {}", status.status_code, status.url);
            } else {
                println!("  [{}] {} ({})", status.status_code, status.url, status.error);
            }
            if status.redirect_chain.len() > 1 {
                println!("        chain: {}", status.redirect_chain_formatted());
            }
        }
    }

    let stats = auditor.cache_stats();
    if stats.total_retries > 0 {
        println!(
            "\nRetries: {} across {} URLs",
            stats.total_retries, stats.urls_with_retries
        );
    }
    if stats.hosts_with_raised_delay > 0 {
        println!(
            "Hosts slowed down after 429s: {}",
            stats.hosts_with_raised_delay
        );
    }
    tracing::debug!(
        cached = stats.cached_urls,
        head_blacklisted = stats.head_blacklisted_hosts,
        robots_domains = auditor.robots_domains_fetched(),
        "checker statistics"
    );

    problems.len()
}
