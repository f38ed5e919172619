//! kakeibo-core library.
//!
//! A household ledger kept as an append-only journal (`log.tsv`). The
//! journal is compacted on demand into the book, a sorted list of live
//! entries, which can be exported, summarized and checked for anomalies in
//! recurring monthly payments.
//!
//! ```text
//! intake ──append──▶ journal ──read_all──▶ compact ──▶ book ──▶ export
//!                                                          ├──▶ validate
//!                                                          └──▶ summary
//! ```
//!
//! # Conventions
//!
//! - **Errors**: each module owns a `thiserror` enum exposing `code()` for
//!   its machine-readable [`error::ErrorCode`].
//! - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod compact;
pub mod config;
pub mod draft;
pub mod error;
pub mod export;
pub mod id;
pub mod intake;
pub mod journal;
pub mod lock;
pub mod model;
pub mod summary;
pub mod validate;

pub use compact::{CompiledBook, KeyedEntry, compact, compact_keyed};
pub use intake::{Ledger, Submission};
pub use model::{EntryId, EntryKey, Gist, LogRow, Participant};
pub use validate::{Finding, Validator};
