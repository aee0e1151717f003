//! Check command - evaluate a single request

use anyhow::{Context, Result};
use clap::Args;
use cm_core::{CookieFilterHandler, HttpRequest};
use colored::Colorize;
use serde_json::json;
use std::path::Path;

use super::{build_store, RuleArgs};

/// Check command arguments
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Target host of the request
    #[arg(long)]
    pub host: String,

    /// Full request URL (defaults to the host)
    #[arg(long)]
    pub url: Option<String>,

    /// Treat the request as in scope
    #[arg(long)]
    pub in_scope: bool,

    /// Cookie header value, e.g. "a=1; b=2" (repeatable)
    #[arg(long = "cookie", value_name = "HEADER")]
    pub cookies: Vec<String>,

    #[command(flatten)]
    pub rules: RuleArgs,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute check command
pub fn execute(args: CheckArgs, config: Option<&Path>) -> Result<()> {
    let store = build_store(&args.rules, config)?;
    let handler = CookieFilterHandler::new(store);

    let mut request = HttpRequest::new(args.host).in_scope(args.in_scope);
    if let Some(url) = args.url {
        request = request.with_url(url);
    }
    for header in &args.cookies {
        request = request.with_cookie_header(header);
    }

    let mode = handler.store().mode();
    let (filtered, removal) = handler.filter_request(request.clone());

    if args.json {
        let output = json!({
            "host": request.host,
            "mode": mode,
            "in_scope": request.in_scope,
            "removed": removal,
            "cookie_header": filtered.cookie_header(),
        });
        let text = serde_json::to_string_pretty(&output).context("Failed to serialize result")?;
        println!("{}", text);
        return Ok(());
    }

    println!("Host: {}", request.host.cyan());
    println!("Mode: {}", mode.display_name());

    if removal.is_empty() {
        println!("{} No cookies removed", "✓".green());
    } else {
        for name in &removal {
            println!("  {} {}", "✗".red(), name);
        }
        println!("{} {} cookie(s) removed", "✓".green(), removal.len());
    }

    println!("Cookie: {}", filtered.cookie_header());

    Ok(())
}
