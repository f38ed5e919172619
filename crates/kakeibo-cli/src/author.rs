//! Author resolution for commands that append to the journal.
//!
//! The resolution chain: `--author` flag > `KAKEIBO_AUTHOR` env > user config
//! `author` > `USER` env. Read-only commands never need an author.

use std::env;

/// Errors from author resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorResolutionError {
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for AuthorResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AuthorResolutionError {}

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
}

/// Real environment reader.
struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.is_empty())
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_string)
}

fn resolve_author_with(
    cli_flag: Option<&str>,
    user_config: Option<&str>,
    env: &dyn EnvReader,
) -> Option<String> {
    non_empty(cli_flag)
        .or_else(|| env.get("KAKEIBO_AUTHOR"))
        .or_else(|| non_empty(user_config))
        .or_else(|| env.get("USER"))
}

/// Resolve the author recorded on appended rows.
///
/// Returns `None` if no source names one.
pub fn resolve_author(cli_flag: Option<&str>, user_config: Option<&str>) -> Option<String> {
    resolve_author_with(cli_flag, user_config, &RealEnv)
}

/// Resolve the author, returning an error if none is found.
pub fn require_author(
    cli_flag: Option<&str>,
    user_config: Option<&str>,
) -> Result<String, AuthorResolutionError> {
    resolve_author(cli_flag, user_config).ok_or_else(|| AuthorResolutionError {
        message: "Author required for this command. \
                  Set --author, KAKEIBO_AUTHOR, or `author` in the user config."
            .to_string(),
    })
}
