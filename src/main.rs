//! prdiff — pull-request diff synthesis engine.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use prdiff::cache;
use prdiff::constants;
use prdiff::diff;
use prdiff::host;
use prdiff::models;
use prdiff::pipeline;

use std::io::Read;
use std::process;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;

use cli::args::{CacheAction, Cli, Command, DecodeArgs, DecodeFormat, SynthArgs};
use host::{Credentials, PullRequestHost, rest::RestHost};
use models::{HostVariant, PullRequestRef};
use pipeline::SynthesisOptions;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Synth(args) => run_synth(*args).await,
        Command::Decode(args) => run_decode(args).await,
        Command::Cache { action } => run_cache(action).await,
        Command::Version => run_version(),
    }
}

/// Print detailed version and build information.
fn run_version() -> Result<()> {
    println!("{} {}", "prdiff".bold(), constants::VERSION.green().bold());
    println!("{}  {}", "target:".dimmed(), constants::TARGET);
    Ok(())
}

/// Synthesize a diff blob for one pull request.
async fn run_synth(args: SynthArgs) -> Result<()> {
    let host_variant = if args.server_url.is_some() {
        HostVariant::Server
    } else {
        HostVariant::Cloud
    };
    let pr = PullRequestRef {
        organization: args.organization,
        project: args.project,
        repository: args.repository,
        pull_request_id: args.pull_request,
        host_variant,
    };

    let credentials = match args.token {
        Some(token) if args.bearer => Credentials::Bearer(token),
        Some(token) => Credentials::Pat(token),
        None => Credentials::Anonymous,
    };
    let host = RestHost::new(credentials, args.server_url)
        .context("failed to construct host client")?;

    let options = SynthesisOptions {
        mode: args.mode.into(),
        budget: args.budget,
        max_files: args.max_files,
        per_file_limit: args.per_file_limit,
        context_lines: args.context_lines,
        ..SynthesisOptions::default()
    };

    eprintln!("  Synthesizing diff for {}...", pr.to_string().bold());
    let info = host
        .get_pull_request(&pr)
        .await
        .context("failed to fetch pull request metadata")?;

    let blob_cache = cache::BlobCache::new(!args.no_cache);
    let key = cache::cache_key(&pr, info.head_revision(), &options);
    if let Some(blob) = blob_cache.get(&key) {
        eprintln!("  {} using cached blob for {pr}", "cache:".dimmed());
        return emit_blob(&blob, args.output.as_deref());
    }

    let blob = pipeline::synthesize_with_info(&host, &pr, &info, &options)
        .await
        .context("diff synthesis failed")?;

    eprintln!(
        "  {} {} file(s) encoded, {} omitted, {} chars",
        "done:".green(),
        blob.files_emitted,
        blob.files_omitted,
        blob.char_len(),
    );

    blob_cache.put(&key, &blob);
    emit_blob(&blob, args.output.as_deref())
}

/// Write the blob to a file or stdout.
fn emit_blob(blob: &models::DiffBlob, output: Option<&std::path::Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, &blob.text)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", blob.text),
    }
    Ok(())
}

/// Decode a blob file back into per-file summaries.
async fn run_decode(args: DecodeArgs) -> Result<()> {
    let text = if args.file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(&args.file)
            .with_context(|| format!("failed to read {}", args.file.display()))?
    };

    let diffs = diff::decode::decode_blob(&text);

    match args.format {
        DecodeFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&diffs).context("failed to serialize diffs")?
            );
        }
        DecodeFormat::Text => {
            if diffs.is_empty() {
                println!("No file sections found.");
                return Ok(());
            }
            for file in &diffs {
                println!(
                    "  {} {}  {} {}",
                    format!("{}:", file.change_type).bold(),
                    file.path,
                    format!("+{}", file.additions).green(),
                    format!("-{}", file.deletions).red(),
                );
            }
        }
    }

    Ok(())
}

/// Manage the session blob cache.
async fn run_cache(action: CacheAction) -> Result<()> {
    let engine = cache::BlobCache::new(true);

    match action {
        CacheAction::Clear => {
            let stats = engine.clear().context("failed to clear cache")?;
            println!(
                "Cleared {} cached entry/entries ({}).",
                stats.entries,
                stats.human_size(),
            );
        }
        CacheAction::Stats => {
            let stats = engine.stats().context("failed to read cache stats")?;
            println!("Cache entries: {}", stats.entries);
            println!("Cache size:    {}", stats.human_size());
        }
        CacheAction::Path => match engine.path() {
            Some(p) => println!("{}", p.display()),
            None => bail!("cache directory could not be determined"),
        },
    }

    Ok(())
}
