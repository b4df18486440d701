//! App-wide constants.
//!
//! Centralises the tool name, host API version, budget defaults, and
//! environment variable names so a rename only requires changing this file.

/// Display name of the tool (lowercase).
pub const APP_NAME: &str = "prdiff";

/// CLI version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compilation target triple, injected by `build.rs`.
pub const TARGET: &str = env!("TARGET");

/// User-Agent header sent with every host API request.
pub const USER_AGENT: &str = concat!("prdiff/", env!("CARGO_PKG_VERSION"));

/// Directory name under the user cache dir for session blobs.
pub const CACHE_DIR: &str = "prdiff";

/// Host REST API version requested on every call.
pub const API_VERSION: &str = "7.0";

// ── Budget defaults ──────────────────────────────────────────────────

/// Global character budget for a serialized diff blob.
pub const GLOBAL_BUDGET: usize = 30_000;

/// Maximum number of files attempted per blob.
pub const MAX_FILES: usize = 25;

/// Per-file cap on a rendered section, in characters.
pub const PER_FILE_LIMIT: usize = 4_000;

/// Line cap for full-file mode.
pub const FULL_FILE_MAX_LINES: usize = 400;

/// Context lines kept around each change in changes-context mode.
pub const CONTEXT_LINES: usize = 3;

/// Forward search window for the line alignment heuristic. Bounded to
/// keep worst-case alignment O(n·w) on very large files.
pub const LOOKAHEAD_WINDOW: usize = 64;

// ── Environment variable names ──────────────────────────────────────

pub const ENV_TOKEN: &str = "PRDIFF_TOKEN";
pub const ENV_SERVER_URL: &str = "PRDIFF_SERVER_URL";
