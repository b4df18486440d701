//! Clap argument types and their mapping onto pipeline options.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use prdiff::constants::{
    CONTEXT_LINES, ENV_SERVER_URL, ENV_TOKEN, GLOBAL_BUDGET, MAX_FILES, PER_FILE_LIMIT,
};
use prdiff::models::DiffMode;

/// Pull-request diff synthesis engine.
#[derive(Parser, Debug)]
#[command(name = "prdiff", version = prdiff::constants::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Synthesize a diff blob for a pull request.
    Synth(Box<SynthArgs>),

    /// Parse a diff blob back into per-file summaries.
    Decode(DecodeArgs),

    /// Manage the session blob cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Print version and build information.
    Version,
}

/// Arguments for the `synth` subcommand.
#[derive(Parser, Debug)]
pub struct SynthArgs {
    // --- Pull request location ---
    /// Organization (cloud) or collection name (server).
    #[arg(long)]
    pub organization: String,

    /// Project name.
    #[arg(long)]
    pub project: String,

    /// Repository name.
    #[arg(long)]
    pub repository: String,

    /// Pull request id.
    #[arg(long)]
    pub pull_request: u64,

    /// On-premises server URL (e.g. https://tfs.example.com/tfs).
    /// When set, the reference is treated as a server-variant host.
    #[arg(long, env = ENV_SERVER_URL)]
    pub server_url: Option<String>,

    // --- Credentials ---
    /// Access token. Sent as HTTP Basic (personal access token) unless
    /// --bearer is given.
    #[arg(long, env = ENV_TOKEN, hide_env_values = true)]
    pub token: Option<String>,

    /// Send the token as an OAuth bearer token instead of a PAT.
    #[arg(long, default_value_t = false)]
    pub bearer: bool,

    // --- Diff shape ---
    /// Diff mode.
    #[arg(long, default_value = "changes-context")]
    pub mode: ModeArg,

    /// Context lines around each change (changes-context mode).
    #[arg(long, default_value_t = CONTEXT_LINES)]
    pub context_lines: usize,

    // --- Budget ---
    /// Global character budget for the blob.
    #[arg(long, default_value_t = GLOBAL_BUDGET)]
    pub budget: usize,

    /// Maximum number of files included.
    #[arg(long, default_value_t = MAX_FILES)]
    pub max_files: usize,

    /// Per-file section cap, in characters.
    #[arg(long, default_value_t = PER_FILE_LIMIT)]
    pub per_file_limit: usize,

    // --- Output ---
    /// Skip the session cache for this run.
    #[arg(long, default_value_t = false)]
    pub no_cache: bool,

    /// Write the blob to a file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Diff mode flag.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// Add/remove ops only.
    ChangesOnly,
    /// Changes plus surrounding context lines.
    ChangesContext,
    /// The whole new file, line-numbered.
    FullFile,
}

impl From<ModeArg> for DiffMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::ChangesOnly => DiffMode::ChangesOnly,
            ModeArg::ChangesContext => DiffMode::ChangesContext,
            ModeArg::FullFile => DiffMode::FullFile,
        }
    }
}

/// Arguments for the `decode` subcommand.
#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// Blob file to decode, or `-` for stdin.
    pub file: PathBuf,

    /// Output format.
    #[arg(long, default_value = "text")]
    pub format: DecodeFormat,
}

/// Decode output format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeFormat {
    /// One summary line per file.
    Text,
    /// Structured per-file diffs as JSON.
    Json,
}

/// Cache management subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum CacheAction {
    /// Remove all cached blobs.
    Clear,
    /// Show cache statistics (entry count and size).
    Stats,
    /// Print the cache directory path.
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn synth_parses_required_flags() {
        let cli = Cli::parse_from([
            "prdiff",
            "synth",
            "--organization",
            "acme",
            "--project",
            "widgets",
            "--repository",
            "api",
            "--pull-request",
            "42",
        ]);
        let Command::Synth(args) = cli.command else {
            panic!("expected synth command");
        };
        assert_eq!(args.organization, "acme");
        assert_eq!(args.pull_request, 42);
        assert_eq!(args.mode, ModeArg::ChangesContext);
        assert_eq!(args.budget, GLOBAL_BUDGET);
    }

    #[test]
    fn mode_arg_maps_to_diff_mode() {
        assert_eq!(DiffMode::from(ModeArg::ChangesOnly), DiffMode::ChangesOnly);
        assert_eq!(DiffMode::from(ModeArg::FullFile), DiffMode::FullFile);
    }

    #[test]
    #[serial_test::serial]
    fn token_falls_back_to_the_environment() {
        // set_var is unsafe in edition 2024; serialized so no other test
        // observes the temporary variable.
        unsafe { std::env::set_var(ENV_TOKEN, "pat-from-env") };
        let cli = Cli::parse_from([
            "prdiff",
            "synth",
            "--organization",
            "acme",
            "--project",
            "widgets",
            "--repository",
            "api",
            "--pull-request",
            "42",
        ]);
        unsafe { std::env::remove_var(ENV_TOKEN) };

        let Command::Synth(args) = cli.command else {
            panic!("expected synth command");
        };
        assert_eq!(args.token.as_deref(), Some("pat-from-env"));
        assert!(!args.bearer);
    }

    #[test]
    fn decode_defaults_to_text() {
        let cli = Cli::parse_from(["prdiff", "decode", "blob.txt"]);
        let Command::Decode(args) = cli.command else {
            panic!("expected decode command");
        };
        assert_eq!(args.format, DecodeFormat::Text);
    }
}
