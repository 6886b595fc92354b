//! CLI entry point for the urlfetch tool.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use urlfetch_core::output::{write_header_block, write_timing};
use urlfetch_core::{
    FetchConfig, FetchRequest, Fetcher, OutputTarget, fetch_binary, fetch_text, resolve_charset,
};

mod cli;

use cli::Args;

fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout may carry the response body
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config = FetchConfig {
        accept_invalid_certs: args.no_check_certificate,
        max_redirects: args.max_redirect,
    };
    let request = build_request(&args)?;

    let fetcher = Fetcher::new(&config).context("failed to initialise HTTP client")?;
    let (response, elapsed) = fetcher
        .execute_with_redirects(request)
        .with_context(|| format!("request to {} failed", args.url))?;

    if args.server_response {
        let mut stdout = io::stdout().lock();
        write_header_block(&mut stdout, &response)?;
        if args.timing {
            write_timing(&mut stdout, elapsed)?;
        }
        stdout.flush()?;
    } else if args.timing {
        debug!("--timing has no effect without -S");
    }

    let target = OutputTarget::resolve(args.output_document.as_deref(), response.url());
    let mut sink = target.open()?;

    let report = match resolve_charset(&response) {
        Some(charset) => fetch_text(response, &mut sink, &charset, args.enforce_content_length),
        None => fetch_binary(response, &mut sink, args.enforce_content_length),
    }
    .context("failed to transfer response body")?;

    info!(
        bytes = report.bytes_written,
        length_reached = report.gate_exhausted(),
        "transfer complete"
    );

    Ok(())
}

/// Builds the initial request from the URL, headers and upload flags.
fn build_request(args: &Args) -> Result<FetchRequest> {
    let mut request = FetchRequest::get(&args.url)?.with_headers(args.parsed_headers());
    if let Some((method, body)) = args.upload() {
        request = request.with_body(method, body);
        if let Some(mime) = &args.mime {
            request = request.with_content_type(mime.clone());
        }
    }
    Ok(request)
}
