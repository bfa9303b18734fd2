//! enhance: add `@since` / `@deprecated` API levels to Android SDK sources.
//!
//! Supports two modes:
//!
//! - **annotate** (default): `enhance --sdk 34` rewrites the platform sources of
//!   an SDK from a pristine backup, `enhance --sdk 34 --source DIR -o OUT` writes
//!   an annotated copy of any tree
//! - **diff**: `enhance --sdk 34 --diff` prints what the level added and deprecated

mod annotate;
mod descriptor;
mod diff;
mod java;
mod javadoc;
mod registry;
mod sdk;
mod version;
mod writer;

use anyhow::{bail, Context, Result};
use clap::Parser;
use java::LanguageLevel;
use registry::RegistryIndex;
use sdk::SdkLayout;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use version::ApiLevel;
use writer::{EnhanceWriter, SourceFormatter, WriterConfig};

#[derive(Parser)]
#[command(
    name = "enhance",
    version,
    about = "Annotate Android SDK sources with the API level each declaration was added or deprecated in"
)]
struct Cli {
    /// Target API level, e.g. 34
    #[arg(long, value_name = "LEVEL", allow_negative_numbers = true)]
    sdk: i32,

    /// Android SDK installation
    #[arg(short = 'p', long, env = "ANDROID_HOME", value_name = "DIR")]
    sdk_path: Option<PathBuf>,

    /// api-versions.xml to read instead of the one shipped with the platform
    #[arg(long, value_name = "FILE")]
    registry: Option<PathBuf>,

    /// Annotate this tree instead of the SDK sources (requires --output)
    #[arg(long, value_name = "DIR", requires = "output", conflicts_with = "diff")]
    source: Option<PathBuf>,

    /// Destination of the annotated copy of --source
    #[arg(short = 'o', long, value_name = "DIR", requires = "source", conflicts_with = "diff")]
    output: Option<PathBuf>,

    /// Print what the level added and deprecated instead of annotating
    #[arg(long)]
    diff: bool,

    /// Command that formats Java source from stdin to stdout,
    /// e.g. "google-java-format -"
    #[arg(long, value_name = "CMD")]
    formatter: Option<String>,

    /// Java files to copy without annotating. Can be specified multiple times.
    #[arg(long, value_name = "GLOB", default_value = writer::DEFAULT_SKIP)]
    skip: Vec<String>,

    /// Where pristine SDK sources are kept [default: $HOME/.enhance-backup]
    #[arg(long, value_name = "DIR")]
    backup_dir: Option<PathBuf>,

    /// Proceed with an API level unknown to this version without asking
    #[arg(short = 'y', long)]
    yes: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    info!(version = env!("CARGO_PKG_VERSION"), latest = %ApiLevel::latest(), "enhance");

    let level = ApiLevel::new(cli.sdk);
    if level.is_unknown() {
        warn!(%level, "API level is not known to this version of enhance");
        if !cli.yes && !confirm("proceed anyway? (y/N) ")? {
            info!("aborted");
            return Ok(());
        }
    }

    let started = Instant::now();
    run(&cli, level)?;
    info!("processing took {}", format_elapsed(started.elapsed()));
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}

/// Ask on stderr and read one line from stdin; only `y` means yes.
fn confirm(question: &str) -> Result<bool> {
    eprint!("{question}");
    io::stderr().flush().ok();

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read confirmation")?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn run(cli: &Cli, level: ApiLevel) -> Result<()> {
    // the SDK is needed for whatever was not given explicitly
    let needs_sdk = cli.registry.is_none() || (!cli.diff && cli.source.is_none());
    let layout = if needs_sdk {
        let root = cli
            .sdk_path
            .as_deref()
            .context("--sdk-path (or ANDROID_HOME) is required unless --registry and --source are given")?;
        Some(SdkLayout::resolve(root, level)?)
    } else {
        None
    };

    let registry_path = cli
        .registry
        .clone()
        .or_else(|| layout.as_ref().map(|layout| layout.api_versions.clone()))
        .context("no registry file")?;

    info!(path = %registry_path.display(), "parsing registry");
    let parse_started = Instant::now();
    let index = RegistryIndex::from_path(&registry_path)
        .with_context(|| format!("failed to load registry {}", registry_path.display()))?;
    if index.is_empty() {
        warn!(path = %registry_path.display(), "registry has no versioned entries");
    }
    info!(
        types = index.len(),
        elapsed_ms = parse_started.elapsed().as_millis() as u64,
        "registry parsed"
    );

    if cli.diff {
        info!(%level, "emitting diff");
        print!("{}", diff::render(&index, level));
        return Ok(());
    }

    let config = WriterConfig {
        language: LanguageLevel::for_api_level(level),
        formatter: cli.formatter.as_deref().map(SourceFormatter::parse).transpose()?,
        skip: cli
            .skip
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern).with_context(|| format!("invalid skip pattern: {pattern}"))
            })
            .collect::<Result<_>>()?,
    };
    let writer = EnhanceWriter::new(&index, config);

    let summary = match (&cli.source, &cli.output, &layout) {
        (Some(source), Some(output), _) => {
            info!(source = %source.display(), output = %output.display(), %level, "annotating");
            writer.write(source, output)?
        }
        (_, _, Some(layout)) => {
            let backup_root = match &cli.backup_dir {
                Some(dir) => dir.clone(),
                None => sdk::default_backup_root()?,
            };
            let backup = sdk::stage_backup(&layout.sources, &backup_root, &layout.folder)?;

            info!(path = %layout.sources.display(), "cleaning platform sources");
            sdk::clean_directory(&layout.sources)?;

            info!(source = %backup.display(), output = %layout.sources.display(), %level, "annotating");
            writer.write(&backup, &layout.sources)?
        }
        _ => bail!("nothing to annotate: pass --source and --output, or an SDK path"),
    };

    info!(
        annotated_files = summary.annotated_files,
        copied_files = summary.copied_files,
        declarations = summary.declarations,
        "done"
    );
    Ok(())
}

/// `"MM minutes SS seconds"`
fn format_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    format!("{:02} minutes {:02} seconds", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn elapsed_is_zero_padded() {
        assert_eq!(format_elapsed(Duration::from_millis(999)), "00 minutes 00 seconds");
        assert_eq!(format_elapsed(Duration::from_secs(65)), "01 minutes 05 seconds");
        assert_eq!(format_elapsed(Duration::from_secs(3600 + 7)), "60 minutes 07 seconds");
    }

    #[test]
    fn diff_conflicts_with_explicit_tree() {
        let result = Cli::try_parse_from(["enhance", "--sdk", "23", "--diff", "--source", "a", "-o", "b"]);
        assert!(result.is_err());
    }

    #[test]
    fn source_requires_output() {
        assert!(Cli::try_parse_from(["enhance", "--sdk", "23", "--source", "a"]).is_err());
        assert!(Cli::try_parse_from(["enhance", "--sdk", "23", "-o", "b"]).is_err());
    }

    #[test]
    fn skip_defaults_to_annotated_companions() {
        let cli = Cli::try_parse_from(["enhance", "--sdk", "23"]).unwrap();
        assert_eq!(cli.skip, vec![writer::DEFAULT_SKIP.to_string()]);

        let cli = Cli::try_parse_from(["enhance", "--sdk", "23", "--skip", "*Test.java", "--skip", "gen/*"]).unwrap();
        assert_eq!(cli.skip, vec!["*Test.java".to_string(), "gen/*".to_string()]);
    }
}
