#![forbid(unsafe_code)]

mod author;
mod cmd;
mod output;

use anyhow::Context as _;
use clap::{CommandFactory, Parser, Subcommand};
use kakeibo_core::config::{UserConfig, load_user_config};
use output::{CliError, OutputMode};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "kb",
    author,
    version,
    about = "kakeibo: append-only household ledger",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Ledger directory (defaults to `KAKEIBO_DIR`, then the current directory).
    #[arg(long, global = true, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Author recorded on appended rows (skips env resolution).
    #[arg(long, global = true)]
    author: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn author_flag(&self) -> Option<&str> {
        self.author.as_deref()
    }

    /// The ledger directory: `--dir`, then `KAKEIBO_DIR`, then the cwd.
    fn ledger_root(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.dir {
            return Ok(dir.clone());
        }
        if let Some(dir) = env::var_os("KAKEIBO_DIR").filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(dir));
        }
        env::current_dir().context("failed to resolve current directory")
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Ledger",
        about = "Initialize a ledger",
        long_about = "Create the journal and a default kakeibo.toml in the ledger directory.",
        after_help = "EXAMPLES:\n    # Initialize the current directory\n    kb init\n\n    # Initialize another directory\n    kb init --dir ~/kakeibo"
    )]
    Init,

    #[command(
        next_help_heading = "Write",
        about = "Record a transaction",
        long_about = "Append a transaction to the journal. Pass --id to replace an earlier one.",
        after_help = "EXAMPLES:\n    # A monthly bill paid by participant A\n    kb submit 2024-01-05 --category 月額 -a -5000 --remark 電気\n\n    # Salary for participant B\n    kb submit 2024-01-25 --category 給料 -b 300000\n\n    # Correct an earlier entry\n    kb submit 2024-01-05 --category 月額 -a -5500 --remark 電気 --id 1704412800"
    )]
    Submit(cmd::submit::SubmitArgs),

    #[command(
        next_help_heading = "Write",
        about = "Withdraw a transaction",
        long_about = "Append a tombstone so the transaction disappears from the book.",
        after_help = "EXAMPLES:\n    # Withdraw by id\n    kb withdraw 1704412800\n\n    # Emit machine-readable output\n    kb withdraw 1704412800 --json"
    )]
    Withdraw(cmd::withdraw::WithdrawArgs),

    #[command(
        next_help_heading = "Read",
        about = "Export the book as TSV",
        long_about = "Compile the journal and print the book with its header row.",
        after_help = "EXAMPLES:\n    # Print the book\n    kb export\n\n    # Also keep a dated copy under downloads/\n    kb export --archive\n\n    # Emit machine-readable output\n    kb export --json"
    )]
    Export(cmd::export::ExportArgs),

    #[command(
        next_help_heading = "Read",
        about = "Check the book for anomalies",
        long_about = "Report duplicates, unnamed bills and irregular recurring payments. Always exits 0 when the book can be read.",
        after_help = "EXAMPLES:\n    # Validate the ledger\n    kb validate\n\n    # Validate an exported file\n    kb validate --from downloads/kakeibo-2024-03-01.tsv"
    )]
    Validate(cmd::validate::ValidateArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show totals and settlement",
        long_about = "Sum each participant's amounts and show who pays whom to even out.",
        after_help = "EXAMPLES:\n    # Show totals\n    kb summarize\n\n    # Emit machine-readable output\n    kb summarize --json"
    )]
    Summarize,

    #[command(
        next_help_heading = "Write",
        about = "Preview or submit receipt drafts",
        long_about = "Read receipt-reader JSON and preview the submissions it suggests. Nothing is recorded without --submit.",
        after_help = "EXAMPLES:\n    # Preview drafts from a file\n    kb draft receipts.json --payer a\n\n    # Submit a transfer read from stdin\n    cat receipt.json | kb draft --payer b --flow transfer --submit"
    )]
    Draft(cmd::draft::DraftArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    kb completions bash > ~/.local/share/bash-completion/completions/kb"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("KAKEIBO_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "kakeibo=debug,info"
        } else {
            "kakeibo=info,warn"
        })
    });

    let format = env::var("KAKEIBO_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn user_config() -> UserConfig {
    load_user_config().unwrap_or_else(|err| {
        warn!(error = %err, "ignoring unreadable user config");
        UserConfig::default()
    })
}

fn run(cli: &Cli, user: &UserConfig, output: OutputMode) -> anyhow::Result<()> {
    let root = cli.ledger_root()?;
    debug!(root = %root.display(), ?output, "resolved ledger");
    let user_author = user.author.as_deref();

    match &cli.command {
        Commands::Init => cmd::init::run_init(output, &root),
        Commands::Submit(args) => {
            cmd::submit::run_submit(args, cli.author_flag(), user_author, output, &root)
        }
        Commands::Withdraw(args) => {
            cmd::withdraw::run_withdraw(args, cli.author_flag(), user_author, output, &root)
        }
        Commands::Export(args) => cmd::export::run_export(args, output, &root),
        Commands::Validate(args) => cmd::validate::run_validate(args, output, &root),
        Commands::Summarize => cmd::summarize::run_summarize(output, &root),
        Commands::Draft(args) => {
            cmd::draft::run_draft(args, cli.author_flag(), user_author, output, &root)
        }
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args, &mut command, &mut std::io::stdout())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let user = user_config();
    let output = output::resolve_output_mode(cli.json, user.output.as_deref());

    match run(&cli, &user, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if output::render_error(output, &CliError::from(&err)).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
