//! Replay command - evaluate a JSON-lines file of requests

use anyhow::{bail, Context, Result};
use clap::Args;
use cm_core::{CookieFilterHandler, CookieRemoval, HttpRequest};
use colored::Colorize;
use serde::Serialize;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, warn};

use super::{build_store, RuleArgs};

/// Replay command arguments
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON-lines file with one request per line ("-" for stdin)
    #[arg(default_value = "-")]
    pub input: PathBuf,

    /// Number of worker threads
    #[arg(short, long, default_value_t = 4)]
    pub threads: usize,

    #[command(flatten)]
    pub rules: RuleArgs,

    /// Print results as JSON lines followed by a statistics object
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ReplayResult {
    line: usize,
    host: String,
    removed: CookieRemoval,
    cookie_header: String,
}

/// Execute replay command
pub fn execute(args: ReplayArgs, config: Option<&Path>) -> Result<()> {
    if args.threads == 0 {
        bail!("--threads must be at least 1");
    }

    let store = build_store(&args.rules, config)?;
    let handler = CookieFilterHandler::new(store);

    let requests = read_requests(&args.input)?;
    debug!(
        "Replaying {} request(s) on {} thread(s)",
        requests.len(),
        args.threads
    );

    let results = replay(&handler, &requests, args.threads);
    let stats = handler.stats().snapshot();

    if args.json {
        for result in &results {
            println!("{}", serde_json::to_string(result).context("Failed to serialize result")?);
        }
        println!("{}", serde_json::to_string(&stats).context("Failed to serialize stats")?);
        return Ok(());
    }

    for result in &results {
        if result.removed.is_empty() {
            println!("{:>5} {} {}", result.line, "pass".green(), result.host);
        } else {
            println!(
                "{:>5} {} {} [{}]",
                result.line,
                "strip".yellow(),
                result.host,
                result.removed.names().join(", ")
            );
        }
    }

    println!("{}", "─".repeat(50).bright_black());
    println!("Requests seen:     {}", stats.requests_seen);
    println!("Requests modified: {}", stats.requests_modified);
    println!("Cookies removed:   {}", stats.cookies_removed);
    if stats.faults_recovered > 0 {
        println!("Faults recovered:  {}", stats.faults_recovered.to_string().red());
    }

    Ok(())
}

/// Parse requests, skipping blank lines and lines that are not valid JSON
fn read_requests(input: &Path) -> Result<Vec<(usize, HttpRequest)>> {
    let reader: Box<dyn BufRead> = if input == Path::new("-") {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = std::fs::File::open(input)
            .with_context(|| format!("Failed to open {:?}", input))?;
        Box::new(BufReader::new(file))
    };

    let mut requests = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<HttpRequest>(&line) {
            Ok(request) => requests.push((line_no, request)),
            Err(e) => warn!("Skipping line {}: {}", line_no, e),
        }
    }

    Ok(requests)
}

/// Evaluate requests on `threads` workers, keeping input order
fn replay(
    handler: &CookieFilterHandler,
    requests: &[(usize, HttpRequest)],
    threads: usize,
) -> Vec<ReplayResult> {
    if requests.is_empty() {
        return Vec::new();
    }

    let chunk_size = requests.len().div_ceil(threads);

    thread::scope(|scope| {
        let workers: Vec<_> = requests
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|entry| evaluate(handler, entry))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        workers
            .into_iter()
            .flat_map(|worker| match worker.join() {
                Ok(results) => results,
                Err(_) => {
                    warn!("Replay worker panicked; its results are missing");
                    Vec::new()
                }
            })
            .collect()
    })
}

fn evaluate(handler: &CookieFilterHandler, (line, request): &(usize, HttpRequest)) -> ReplayResult {
    let (filtered, removal) = handler.filter_request(request.clone());

    ReplayResult {
        line: *line,
        host: request.host.clone(),
        removed: removal,
        cookie_header: filtered.cookie_header(),
    }
}
