//! How commands print: pretty for terminals, tab-separated text for pipes,
//! JSON for scripts.
//!
//! The mode comes from, in order: `--json`, the `FORMAT` env var
//! (`pretty`, `text` or `json`), `output` in the user config, and finally
//! whether stdout is a terminal.

use kakeibo_core::config::ConfigError;
use kakeibo_core::draft::DraftError;
use kakeibo_core::error::ErrorCode;
use kakeibo_core::export::ExportError;
use kakeibo_core::intake::IntakeError;
use kakeibo_core::journal::JournalError;
use kakeibo_core::summary::AmountError;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

const RULE: &str = "------------------------------------------------------------";
const KEY_WIDTH: usize = 12;

/// Heading underlined with a rule.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}\n{RULE}")
}

/// `key:` padded to a fixed column, then the value.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    let label = format!("{key}:");
    writeln!(w, "{label:<KEY_WIDTH$} {}", value.as_ref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Pretty,
    Text,
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

fn pick_output_mode(
    json_flag: bool,
    format_env: Option<&str>,
    user_output: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    let fallback = if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    };
    if json_flag {
        return OutputMode::Json;
    }
    // Unrecognized values are skipped rather than rejected.
    format_env
        .and_then(OutputMode::parse)
        .or_else(|| user_output.and_then(OutputMode::parse))
        .unwrap_or(fallback)
}

/// Output mode for this invocation.
pub fn resolve_output_mode(json_flag: bool, user_output: Option<&str>) -> OutputMode {
    let format_env = std::env::var("FORMAT").ok();
    pick_output_mode(
        json_flag,
        format_env.as_deref(),
        user_output,
        io::stdout().is_terminal(),
    )
}

type Renderer<'a, T> = Box<dyn FnOnce(&T, &mut dyn Write) -> io::Result<()> + 'a>;

fn emit<T: Serialize>(mode: OutputMode, value: &T, human: Renderer<'_, T>) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    if mode.is_json() {
        serde_json::to_writer_pretty(&mut out, value)?;
        writeln!(out)?;
    } else {
        human(value, &mut out)?;
    }
    out.flush()?;
    Ok(())
}

/// Print `value` as JSON, or through `text` / `pretty` for humans.
pub fn render_mode<'a, T: Serialize>(
    mode: OutputMode,
    value: &T,
    text: impl FnOnce(&T, &mut dyn Write) -> io::Result<()> + 'a,
    pretty: impl FnOnce(&T, &mut dyn Write) -> io::Result<()> + 'a,
) -> anyhow::Result<()> {
    let human: Renderer<'a, T> = if mode == OutputMode::Pretty {
        Box::new(pretty)
    } else {
        Box::new(text)
    };
    emit(mode, value, human)
}

/// Like [`render_mode`] with one renderer for both human modes.
pub fn render<'a, T: Serialize>(
    mode: OutputMode,
    value: &T,
    human: impl FnOnce(&T, &mut dyn Write) -> io::Result<()> + 'a,
) -> anyhow::Result<()> {
    emit(mode, value, Box::new(human))
}

/// A failed command as shown to the user: the message, plus the `E####`
/// code and its hint when a library error caused it.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
            ..Self::new(message)
        }
    }
}

/// First library error code found along an error's cause chain.
fn error_code(err: &anyhow::Error) -> Option<ErrorCode> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<IntakeError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<JournalError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<ConfigError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<ExportError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<DraftError>() {
            Some(e.code())
        } else {
            cause.downcast_ref::<AmountError>().map(AmountError::code)
        }
    })
}

impl From<&anyhow::Error> for CliError {
    fn from(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}");
        match error_code(err) {
            Some(code) => Self::with_code(message, code),
            None => Self::new(message),
        }
    }
}

/// Print `error` to stderr, as `{"error": ...}` in JSON mode.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    #[derive(Serialize)]
    struct Envelope<'a> {
        error: &'a CliError,
    }

    let mut out = io::stderr().lock();
    if mode.is_json() {
        serde_json::to_writer_pretty(&mut out, &Envelope { error })?;
        writeln!(out)?;
        return Ok(());
    }
    match &error.error_code {
        Some(code) => writeln!(out, "error[{code}]: {}", error.message)?,
        None => writeln!(out, "error: {}", error.message)?,
    }
    if let Some(hint) = &error.suggestion {
        writeln!(out, "  hint: {hint}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn json_flag_wins_over_env() {
        let mode = pick_output_mode(true, Some("pretty"), Some("text"), true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn format_env_beats_user_config() {
        let mode = pick_output_mode(false, Some("TEXT"), Some("json"), true);
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn user_config_used_without_env() {
        let mode = pick_output_mode(false, None, Some("json"), true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn unknown_values_fall_through_to_tty() {
        let mode_tty = pick_output_mode(false, Some("fancy"), Some("yaml"), true);
        assert_eq!(mode_tty, OutputMode::Pretty);
        let mode_pipe = pick_output_mode(false, Some("fancy"), None, false);
        assert_eq!(mode_pipe, OutputMode::Text);
    }

    #[test]
    fn pretty_kv_aligns_keys() {
        let mut buf = Vec::new();
        pretty_kv(&mut buf, "entries", "3").unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "entries:     3\n");
    }

    #[test]
    fn cli_error_picks_up_library_code() {
        let err = anyhow::Error::new(IntakeError::NotInitialized {
            root: PathBuf::from("/tmp/ledger"),
        })
        .context("submit failed");
        let cli = CliError::from(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E1001"));
        assert!(cli.suggestion.is_some());
        assert!(cli.message.starts_with("submit failed: "));
    }

    #[test]
    fn cli_error_without_code() {
        let err = anyhow::anyhow!("plain failure");
        let cli = CliError::from(&err);
        assert!(cli.error_code.is_none());
        assert_eq!(cli.message, "plain failure");
    }
}
