use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use exif_rename_core::{
    app_paths, load_config_from, rename_directory, AppConfig, MalformedPolicy, RenameOptions,
    RenameSummary,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EXIT_INVALID_DIR: u8 = 2;

#[derive(Debug, PartialEq, Eq)]
struct InvalidDirectory {
    message: String,
    status: u8,
}

fn check_directory(dir: &Path) -> Result<(), InvalidDirectory> {
    if dir.is_dir() {
        return Ok(());
    }
    Err(InvalidDirectory {
        message: format!("Error: directory {} not found.", dir.display()),
        status: EXIT_INVALID_DIR,
    })
}

#[derive(Debug, Parser)]
#[command(name = "exif-rename", version)]
#[command(about = "Rename images and videos after the creation date in their metadata")]
struct Cli {
    /// Directory whose files are renamed (not recursive)
    #[arg(default_value = ".")]
    dir: PathBuf,
    /// strftime-style date format; defaults to the configured one (%Y%m%d_%H%M%S)
    #[arg(long)]
    format: Option<String>,
    /// Report what would be renamed without touching any file
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// What to do when an image carries an unreadable DateTimeOriginal
    #[arg(long, value_enum)]
    on_malformed: Option<MalformedArg>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
    /// Config file to use instead of the OS default location
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the resolved configuration and exit
    #[arg(long, default_value_t = false)]
    print_config: bool,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MalformedArg {
    Abort,
    Skip,
}

impl From<MalformedArg> for MalformedPolicy {
    fn from(value: MalformedArg) -> Self {
        match value {
            MalformedArg::Abort => MalformedPolicy::Abort,
            MalformedArg::Skip => MalformedPolicy::Skip,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => app_paths()?.config_path,
    };
    let config = load_config_from(&config_path)?;

    if cli.print_config {
        println!("config file: {}", config_path.display());
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    if let Err(invalid) = check_directory(&cli.dir) {
        println!("{}", invalid.message);
        return Ok(ExitCode::from(invalid.status));
    }

    let output = cli.output;
    let options = resolve_options(cli, config);
    let summary = rename_directory(&options, |event| println!("{event}"))?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_footer(&summary, options.dry_run),
    }

    Ok(ExitCode::SUCCESS)
}

fn resolve_options(cli: Cli, config: AppConfig) -> RenameOptions {
    RenameOptions {
        dir: cli.dir,
        format: cli.format.unwrap_or(config.date_format),
        on_malformed: cli
            .on_malformed
            .map(MalformedPolicy::from)
            .unwrap_or(config.on_malformed),
        dry_run: cli.dry_run,
    }
}

fn print_footer(summary: &RenameSummary, dry_run: bool) {
    tracing::info!(
        scanned = summary.scanned,
        renamed = summary.renamed,
        collisions = summary.collisions,
        no_timestamp = summary.no_timestamp,
        unsupported = summary.unsupported,
        failed = summary.failed,
        "done"
    );
    if dry_run {
        eprintln!("dry run: no files were changed");
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
