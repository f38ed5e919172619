//! `kb withdraw`: delete a transaction by appending a tombstone.
//!
//! Withdrawing an id that was never submitted is accepted and changes nothing.

use crate::author;
use crate::cmd::open_ledger;
use crate::output::{OutputMode, render};
use anyhow::{Context as _, Result};
use clap::Args;
use kakeibo_core::EntryId;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct WithdrawArgs {
    /// Id of the transaction to withdraw.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct WithdrawOutput {
    id: EntryId,
    withdrawn: bool,
}

/// Execute `kb withdraw`.
///
/// # Errors
///
/// Returns an error if no author resolves, the ledger is not initialized,
/// or the append fails.
pub fn run_withdraw(
    args: &WithdrawArgs,
    author_flag: Option<&str>,
    user_author: Option<&str>,
    output: OutputMode,
    root: &Path,
) -> Result<()> {
    let author = author::require_author(author_flag, user_author)?;
    let ledger = open_ledger(root)?;
    let id = ledger
        .withdraw(&EntryId::new(args.id.as_str()), &author)
        .with_context(|| format!("failed to withdraw {:?}", args.id))?;

    let result = WithdrawOutput { id, withdrawn: true };
    render(output, &result, |r, w| writeln!(w, "withdrew {}", r.id))
}
