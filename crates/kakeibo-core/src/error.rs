//! Stable machine-readable error codes shared by every error type.

use std::fmt;

/// Machine-readable error codes shared by the library and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    StorageUnavailable,
    MalformedRow,
    InvalidField,
    InvalidAmount,
    IncompleteDraft,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    pub const ALL: [Self; 9] = [
        Self::NotInitialized,
        Self::ConfigParseError,
        Self::StorageUnavailable,
        Self::MalformedRow,
        Self::InvalidField,
        Self::InvalidAmount,
        Self::IncompleteDraft,
        Self::LockContention,
        Self::InternalUnexpected,
    ];

    /// `E` plus four digits. The first digit groups the area: 1 setup,
    /// 2 storage, 3 input, 5 concurrency, 9 internal.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::StorageUnavailable => "E2001",
            Self::MalformedRow => "E2002",
            Self::InvalidField => "E3001",
            Self::InvalidAmount => "E3002",
            Self::IncompleteDraft => "E3003",
            Self::LockContention => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// One-line description.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Ledger not initialized",
            Self::ConfigParseError => "kakeibo.toml could not be parsed",
            Self::StorageUnavailable => "Journal storage unavailable",
            Self::MalformedRow => "Malformed journal row",
            Self::InvalidField => "Field cannot be stored in the journal",
            Self::InvalidAmount => "Amount is not an integer",
            Self::IncompleteDraft => "Receipt draft is incomplete",
            Self::LockContention => "Another writer holds the ledger lock",
            Self::InternalUnexpected => "Unexpected internal failure",
        }
    }

    /// Optional remediation hint that can be surfaced to the user.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `kb init` in the ledger directory."),
            Self::ConfigParseError => Some("Fix syntax in kakeibo.toml and retry."),
            Self::StorageUnavailable => Some("Check disk space and permissions on log.tsv."),
            Self::MalformedRow => Some("Inspect the reported line of log.tsv; it is skipped."),
            Self::InvalidField => Some("Remove tabs and line breaks from the value."),
            Self::InvalidAmount => Some("Amounts are signed integers without separators."),
            Self::IncompleteDraft => Some("Fill in the missing date or amount before submitting."),
            Self::LockContention => Some("Retry after the other `kb` process releases its lock."),
            Self::InternalUnexpected => Some("Rerun with KAKEIBO_LOG=debug and report the output."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
