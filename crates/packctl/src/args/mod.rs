//! CLI surface (`spec §6`): `packctl <command> [flags]`.

pub mod common;
pub mod registry;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

pub use common::{ClusterArgs, PackSelector, PlanFlags, RunFlags, VarArgs};
pub use registry::RegistryCommand;

#[derive(Parser, Debug)]
#[command(
    name = "packctl",
    version,
    about = "Render, deploy, and manage cluster job packs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a packctl.toml config file; defaults to ./packctl.toml if present.
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Override the registry cache root (`spec §6` "registry cache root resolution").
    #[arg(long, global = true)]
    pub cache_root: Option<Utf8PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    pub fn verbosity(&self) -> Option<LevelFilter> {
        match self.verbose {
            0 => None,
            1 => Some(LevelFilter::INFO),
            2 => Some(LevelFilter::DEBUG),
            _ => Some(LevelFilter::TRACE),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scaffold a new pack directory.
    Init(InitArgs),
    /// Render and deploy a pack's jobs to the cluster.
    Run(RunArgs),
    /// Dry-run a pack's jobs against the cluster without deploying.
    Plan(PlanArgs),
    /// Stop a deployment's jobs without purging them.
    Stop(StopArgs),
    /// Stop a deployment's jobs and purge them (`stop` with `purge` forced on).
    Destroy(DestroyArgs),
    /// Render a pack's templates to stdout or a directory, without touching the cluster.
    Render(RenderArgs),
    /// Show a pack's metadata, declared variables, and dependency tree.
    Info(InfoArgs),
    /// Show the jobs belonging to one deployment, or every deployment.
    Status(StatusArgs),
    /// Manage cached registries.
    Registry(RegistryCommand),
}

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Name of the new pack.
    pub name: String,

    /// Directory the pack is scaffolded into; the pack itself is created at `<directory>/<name>`.
    #[arg(long, default_value = ".")]
    pub directory: Utf8PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub selector: PackSelector,
    #[command(flatten)]
    pub vars: VarArgs,
    #[command(flatten)]
    pub cluster: ClusterArgs,
    #[command(flatten)]
    pub run: RunFlags,
}

#[derive(clap::Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub selector: PackSelector,
    #[command(flatten)]
    pub vars: VarArgs,
    #[command(flatten)]
    pub cluster: ClusterArgs,
    #[command(flatten)]
    pub plan: PlanFlags,
}

#[derive(clap::Args, Debug)]
pub struct StopArgs {
    #[command(flatten)]
    pub selector: PackSelector,
    #[command(flatten)]
    pub cluster: ClusterArgs,
    /// Also purge the jobs' history from the cluster.
    #[arg(long)]
    pub purge: bool,
}

#[derive(clap::Args, Debug)]
pub struct DestroyArgs {
    #[command(flatten)]
    pub selector: PackSelector,
    #[command(flatten)]
    pub vars: VarArgs,
    #[command(flatten)]
    pub cluster: ClusterArgs,
}

#[derive(clap::Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub selector: PackSelector,
    #[command(flatten)]
    pub vars: VarArgs,
    /// Write rendered templates to this directory instead of stdout.
    #[arg(short = 'o', long = "to-dir")]
    pub output_dir: Option<Utf8PathBuf>,
    /// Overwrite files already present in `--to-dir`.
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub selector: PackSelector,
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Deployment name, or an unambiguous prefix of one. Omit to list every job on the cluster.
    pub deployment: Option<String>,
    #[command(flatten)]
    pub cluster: ClusterArgs,
}
