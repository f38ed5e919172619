pub mod completions;
pub mod draft;
pub mod export;
pub mod init;
pub mod submit;
pub mod summarize;
pub mod validate;
pub mod withdraw;

use anyhow::{Context as _, Result};
use kakeibo_core::Ledger;
use std::path::Path;

/// Open the ledger in `root` for a command.
pub fn open_ledger(root: &Path) -> Result<Ledger> {
    Ledger::open(root).with_context(|| format!("failed to open ledger in {}", root.display()))
}
