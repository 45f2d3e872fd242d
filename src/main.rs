mod cli;
mod output;

use anyhow::Context;
use cli::{Cli, Command, ListArgs};
use fsdb::{ChangeFileDb, ChildSource, FileDb, OsFileDb, SnapshotFileDb, TagPolicy, TextSource};
use output::{ListOptions, write_listing};
use std::fmt as stdfmt;
use std::io::{IsTerminal, Read, Write, stderr, stdin, stdout};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Event, Level, Subscriber, error, info};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

struct FsdbExitCode;

impl FsdbExitCode {
    /// Exit code used for any error (unreadable report, missing path, etc.).
    fn any_error() -> ExitCode {
        ExitCode::from(255)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Some(directory) = cli.directory
        && let Err(e) = std::env::set_current_dir(&directory)
    {
        error!(
            "Failed to change directory to {}: {}",
            directory.display(),
            e
        );
        return FsdbExitCode::any_error();
    }

    let base = PathBuf::from(".");
    let policy = cli.policy.as_deref();

    let result: anyhow::Result<ExitCode> = match cli.command {
        Command::Ls { list } => handle_ls(base, policy, &list),
        Command::Status { report, list } => handle_status(base, policy, &report, &list),
        Command::Changes { report, list } => handle_changes(policy, &report, &list),
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(err) => {
            error!("{err:#}");
            FsdbExitCode::any_error()
        }
    }
}

fn load_policy(path: Option<&Path>) -> anyhow::Result<TagPolicy> {
    match path {
        Some(path) => TagPolicy::load(path)
            .with_context(|| format!("Cannot load policy {}", path.display())),
        None => Ok(TagPolicy::default()),
    }
}

/// `-` reads the whole report from stdin once; a file is re-read on each
/// staleness check.
fn report_source(report: &Path) -> anyhow::Result<TextSource> {
    if report == Path::new("-") {
        let mut text = String::new();
        stdin()
            .read_to_string(&mut text)
            .context("Cannot read status report from stdin")?;
        Ok(TextSource::inline(text))
    } else {
        Ok(TextSource::file(report))
    }
}

fn handle_ls(base: PathBuf, policy: Option<&Path>, list: &ListArgs) -> anyhow::Result<ExitCode> {
    let db = match policy {
        Some(_) => OsFileDb::workspace(base, load_policy(policy)?),
        None => OsFileDb::os(base),
    };
    print_listing(db, list)
}

fn handle_status(
    base: PathBuf,
    policy: Option<&Path>,
    report: &Path,
    list: &ListArgs,
) -> anyhow::Result<ExitCode> {
    let policy = load_policy(policy)?;
    let source = report_source(report)?;
    let db = SnapshotFileDb::with_snapshot(base, policy, source)
        .with_context(|| format!("Cannot load status report {}", report.display()))?;
    print_listing(db, list)
}

fn handle_changes(
    policy: Option<&Path>,
    report: &Path,
    list: &ListArgs,
) -> anyhow::Result<ExitCode> {
    let policy = load_policy(policy)?;
    let source = report_source(report)?;
    let db = ChangeFileDb::from_changes(policy, source)
        .with_context(|| format!("Cannot load status report {}", report.display()))?;
    print_listing(db, list)
}

fn print_listing<S: ChildSource>(mut db: FileDb<S>, list: &ListArgs) -> anyhow::Result<ExitCode> {
    let path = list.path.as_deref().unwrap_or("");
    let options = ListOptions {
        show_hidden: list.all,
        hide_clean: list.hide_clean,
        recursive: list.recursive,
    };

    let mut out = stdout().lock();
    if !write_listing(&mut out, &mut db, path, options)? {
        anyhow::bail!("No directory {} in the tree", path);
    }
    out.flush()?;

    info!("Tree status: {}", db.root_status());

    Ok(ExitCode::SUCCESS)
}

fn init_tracing(verbose: u8) {
    let stderr_is_terminal = stderr().is_terminal();
    let formatter = LevelFormatter { stderr_is_terminal };

    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    let fmt_layer = tracing_fmt::layer()
        .event_format(formatter)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Prefixes each event with its level: emoji on a terminal, plain text
/// otherwise.
struct LevelFormatter {
    stderr_is_terminal: bool,
}

impl<S, N> FormatEvent<S, N> for LevelFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        if self.stderr_is_terminal {
            match *event.metadata().level() {
                Level::DEBUG => write!(writer, "🔍 ")?,
                Level::INFO => write!(writer, "ℹ️ ")?,
                Level::WARN => write!(writer, "⚠️  ")?,
                Level::ERROR => write!(writer, "❌ ")?,
                _ => {}
            }
        } else {
            match *event.metadata().level() {
                Level::DEBUG => writer.write_str("DEBUG: ")?,
                Level::INFO => writer.write_str("INFO: ")?,
                Level::WARN => writer.write_str("WARN: ")?,
                Level::ERROR => writer.write_str("ERROR: ")?,
                _ => {}
            }
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
