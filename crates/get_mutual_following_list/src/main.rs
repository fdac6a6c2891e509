use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use mutual_core::{
    export_mutual_graph_blocking, load_credentials, parse_account, ExportOptions, ExportProgress,
    ExportResult, ProgressCallback, DEFAULT_CREDENTIALS_FILE,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Export an account's followees and the mutual follows among them to CSV",
    long_about = None
)]
struct Cli {
    /// Target screen name, @handle or profile URL
    account: String,

    /// File holding consumer key, consumer secret, access token and access secret, one per line
    #[arg(long = "credentials", default_value = DEFAULT_CREDENTIALS_FILE)]
    credentials: PathBuf,

    /// Directory receiving both CSV files
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    output_dir: PathBuf,

    /// Output file encoding
    #[arg(short = 'e', long = "encoding", default_value = "utf-8")]
    encoding: String,

    /// Request timeout in seconds
    #[arg(long = "timeout", default_value_t = 30)]
    timeout: u64,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    if cli.timeout == 0 {
        bail!("timeout must be greater than 0");
    }

    let account = parse_account(&cli.account).context("invalid target account")?;
    let credentials = load_credentials(&cli.credentials)
        .with_context(|| format!("cannot load credentials from {}", cli.credentials.display()))?;

    println!(
        "{} {}",
        style("Fetching followees of").cyan(),
        style(&account).bold()
    );

    let progress_bar = ProgressBar::hidden();
    progress_bar.set_style(
        ProgressStyle::with_template("{bar:30.green/dim} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut options = ExportOptions::new(account, credentials);
    options.output_dir = cli.output_dir;
    options.encoding = cli.encoding;
    options.timeout_secs = cli.timeout;
    options.progress_callback = Some(progress_callback(progress_bar.clone(), stdout_sink()));

    let result = export_mutual_graph_blocking(options);
    progress_bar.finish_and_clear();
    let result = result.context("mutual following export failed")?;
    print_summary(&result);
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Receives each finished progress line.
type LineSink = Arc<dyn Fn(&str) + Send + Sync + 'static>;

fn stdout_sink() -> LineSink {
    Arc::new(|line: &str| println!("{line}"))
}

/// Lines go to `sink` whether or not the bar is drawn; a hidden bar (stderr
/// redirected) must not swallow them.
fn progress_callback(bar: ProgressBar, sink: LineSink) -> ProgressCallback {
    Arc::new(move |event: ExportProgress| {
        let line = progress_line(&event);
        bar.suspend(|| sink(&line));
        match event {
            ExportProgress::FriendsFetched { count, .. } => {
                bar.set_length(count as u64);
                bar.set_draw_target(ProgressDrawTarget::stderr());
            }
            ExportProgress::FriendResolved { account, .. }
            | ExportProgress::FriendPrivate { account, .. } => {
                bar.set_message(account);
                bar.inc(1);
            }
        }
    })
}

fn progress_line(event: &ExportProgress) -> String {
    match event {
        ExportProgress::FriendsFetched { account, count } => format!(
            "{} follows {} accounts",
            style(account).bold(),
            style(count).green()
        ),
        ExportProgress::FriendResolved {
            position,
            total,
            account,
            mutual_count,
        } => format!(
            "[{position}/{total}] {account}: {} mutual followees",
            style(mutual_count).green()
        ),
        ExportProgress::FriendPrivate {
            position,
            total,
            account,
        } => format!(
            "[{position}/{total}] {} {account} is private, skipped",
            style("!").yellow().bold()
        ),
    }
}

fn print_summary(result: &ExportResult) {
    println!(
        "{} {} followees -> {}",
        style("Saved").green().bold(),
        result.graph.friends.len(),
        result.friends_csv_path.display()
    );
    println!(
        "{} {} mutual pairs -> {}",
        style("Saved").green().bold(),
        result.graph.pairs.len(),
        result.following_csv_path.display()
    );
    if !result.graph.private_accounts.is_empty() {
        println!(
            "{} {}",
            style("Private accounts skipped:").yellow(),
            result.graph.private_accounts.join(", ")
        );
    }
}
