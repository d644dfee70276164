use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use shotline_lib::core::annotations::{
    collect_editorial_package, create_editorial_package, remove_editorial_package,
};
use shotline_lib::core::enrich::enrich_all;
use shotline_lib::core::fs;
use shotline_lib::core::interchange::InterchangeTimeline;
use shotline_lib::core::session::ShotSession;
use shotline_lib::core::settings::CreatorSettings;
use shotline_lib::core::timeline::HostProject;

#[derive(Parser, Debug)]
#[command(name = "shotline", version, about = "Timeline-to-shot resolution for editorial publishing")]
struct Cli {
    /// Also write a daily log file into this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// More log output (-v debug, -vv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build shots from the timeline and annotate their clips.
    Create(CreateArgs),
    /// Print the shots annotated on the timeline.
    Collect(CollectArgs),
    /// Enrich collected shots from an interchange export.
    Enrich(EnrichArgs),
    /// Remove every shot annotation from the timeline.
    Clear(ClearArgs),
    /// Annotate the timeline itself as an editorial package.
    Package(PackageArgs),
}

#[derive(Parser, Debug)]
struct CreateArgs {
    /// Host timeline snapshot (JSON).
    #[arg(long)]
    timeline: PathBuf,

    /// Creator settings (JSON). Defaults apply when omitted.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Where to write the annotated snapshot. Defaults to `--timeline`.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CollectArgs {
    /// Host timeline snapshot (JSON).
    #[arg(long)]
    timeline: PathBuf,
}

#[derive(Parser, Debug)]
struct EnrichArgs {
    /// Host timeline snapshot (JSON).
    #[arg(long)]
    timeline: PathBuf,

    /// Interchange timeline export (JSON).
    #[arg(long)]
    interchange: PathBuf,

    /// Frame rate to attach. Defaults to the host timeline's.
    #[arg(long)]
    fps: Option<f64>,
}

#[derive(Parser, Debug)]
struct ClearArgs {
    /// Host timeline snapshot (JSON).
    #[arg(long)]
    timeline: PathBuf,

    /// Also remove the editorial package annotation.
    #[arg(long, default_value_t = false)]
    include_package: bool,

    /// Where to write the cleared snapshot. Defaults to `--timeline`.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PackageArgs {
    /// Host timeline snapshot (JSON).
    #[arg(long)]
    timeline: PathBuf,

    /// Folder the package publishes into.
    #[arg(long)]
    folder_path: String,

    #[arg(long)]
    product_name: String,

    /// Where to write the annotated snapshot. Defaults to `--timeline`.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_dir.as_deref(), cli.verbose)?;

    match cli.cmd {
        Command::Create(args) => cmd_create(args),
        Command::Collect(args) => cmd_collect(args),
        Command::Enrich(args) => cmd_enrich(args),
        Command::Clear(args) => cmd_clear(args),
        Command::Package(args) => cmd_package(args),
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logging(log_dir: Option<&Path>, verbose: u8) -> anyhow::Result<Option<WorkerGuard>> {
    use tracing_subscriber::prelude::*;

    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create log dir '{}'", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, "shotline.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer);

    // Already set when embedded in another process; keep theirs.
    let _ = tracing::subscriber::set_global_default(subscriber);
    Ok(guard)
}

fn cmd_create(args: CreateArgs) -> anyhow::Result<()> {
    let settings = match &args.settings {
        Some(path) => CreatorSettings::load(path)
            .with_context(|| format!("load settings '{}'", path.display()))?,
        None => CreatorSettings::default(),
    };
    let mut project = load_project(&args.timeline)?;

    let mut session = ShotSession::new(settings);
    let created = session.create(&mut project).context("create shots")?;

    save_project(args.out.as_deref().unwrap_or(&args.timeline), &project)?;
    print_json(&created)
}

fn cmd_collect(args: CollectArgs) -> anyhow::Result<()> {
    let project = load_project(&args.timeline)?;
    let mut session = ShotSession::new(CreatorSettings::default());
    let shots = session.collect(&project).context("collect shots")?;

    let package = project
        .timeline
        .as_ref()
        .and_then(|t| collect_editorial_package(session.store(), t));

    print_json(&serde_json::json!({
        "shots": shots,
        "editorialPackage": package,
    }))
}

fn cmd_enrich(args: EnrichArgs) -> anyhow::Result<()> {
    let project = load_project(&args.timeline)?;
    let content = std::fs::read_to_string(&args.interchange)
        .with_context(|| format!("read interchange '{}'", args.interchange.display()))?;
    let interchange = InterchangeTimeline::from_json_str(&content)
        .with_context(|| format!("parse interchange '{}'", args.interchange.display()))?;

    let mut session = ShotSession::new(CreatorSettings::default());
    let shots = session.collect(&project).context("collect shots")?;

    let fps = match args.fps {
        Some(fps) => fps,
        None => project
            .timeline
            .as_ref()
            .map(|t| t.fps)
            .context("host snapshot has no timeline")?,
    };

    let report = enrich_all(&shots, &interchange, fps).context("enrich shots")?;
    if !report.failures.is_empty() {
        warn!("{} sub-product(s) could not be enriched", report.failures.len());
    }
    print_json(&report)
}

fn cmd_clear(args: ClearArgs) -> anyhow::Result<()> {
    let mut project = load_project(&args.timeline)?;
    let mut session = ShotSession::new(CreatorSettings::default());
    let removed = session.remove_all(&mut project).context("clear shots")?;

    if args.include_package {
        if let Some(timeline) = project.timeline.as_mut() {
            remove_editorial_package(session.store(), timeline);
        }
    }

    save_project(args.out.as_deref().unwrap_or(&args.timeline), &project)?;
    info!("Removed {} shot annotation(s)", removed);
    print_json(&serde_json::json!({ "removed": removed }))
}

fn cmd_package(args: PackageArgs) -> anyhow::Result<()> {
    let mut project = load_project(&args.timeline)?;
    let session = ShotSession::new(CreatorSettings::default());

    let timeline = project
        .timeline
        .as_mut()
        .context("Make sure to have an active current timeline.")?;
    let package = create_editorial_package(
        session.store(),
        timeline,
        &args.folder_path,
        &args.product_name,
    )?;

    save_project(args.out.as_deref().unwrap_or(&args.timeline), &project)?;
    print_json(&package)
}

fn load_project(path: &Path) -> anyhow::Result<HostProject> {
    fs::read_json(path).with_context(|| format!("read host timeline '{}'", path.display()))
}

fn save_project(path: &Path, project: &HostProject) -> anyhow::Result<()> {
    fs::atomic_write_json_pretty(path, project)
        .with_context(|| format!("write host timeline '{}'", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
