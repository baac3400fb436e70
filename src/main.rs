use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use git_release::cli::{self, ReleaseWorkflowArgs};
use git_release::ui;

#[derive(clap::Parser)]
#[command(
    name = "git-release",
    about = "Run a release pipeline driven by conventional commits"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Release this branch instead of the checked-out one")]
    branch: Option<String>,

    #[arg(long, help = "Run every step without writing files, committing, tagging or pushing")]
    dry_run: bool,

    #[arg(long, help = "Show configured branches and pipeline steps and exit")]
    list: bool,

    #[arg(long, help = "Log debug output to stderr")]
    verbose: bool,

    #[arg(short, long, help = "Print version information")]
    version: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.version {
        println!("git-release {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_logging(args.verbose);

    let workflow = ReleaseWorkflowArgs {
        config_path: args.config,
        branch: args.branch,
        dry_run: args.dry_run,
        root: std::env::current_dir()?,
    };

    let result = if args.list {
        cli::list_configuration(&workflow)
    } else {
        cli::run_release_workflow(&workflow).map(|_| ())
    };

    if let Err(e) = result {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
