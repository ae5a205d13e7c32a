//! `packctl`: render, deploy, and manage cluster job packs (`spec §1`,
//! `§6` CLI surface).

mod args;
mod commands;
mod config;
mod log;

use std::process::ExitCode;

use args::{Cli, Command};
use clap::Parser;
use config::Config;

fn main() -> ExitCode {
    let cli = Cli::parse();
    log::init(cli.verbosity());

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    match &cli.command {
        Command::Init(args) => {
            commands::init::run(args)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Run(args) => {
            let config = Config::load(cli.config.as_deref(), cli.cache_root.clone(), &args.cluster)?;
            commands::run::run(args, &config)
        }
        Command::Plan(args) => {
            let config = Config::load(cli.config.as_deref(), cli.cache_root.clone(), &args.cluster)?;
            commands::plan::run(args, &config)
        }
        Command::Stop(args) => {
            let config = Config::load(cli.config.as_deref(), cli.cache_root.clone(), &args.cluster)?;
            commands::stop::stop(args, &config)
        }
        Command::Destroy(args) => {
            let config = Config::load(cli.config.as_deref(), cli.cache_root.clone(), &args.cluster)?;
            commands::stop::destroy(args, &config)
        }
        Command::Render(args) => {
            let config = Config::load(cli.config.as_deref(), cli.cache_root.clone(), &args::ClusterArgs::default())?;
            commands::render::run(args, &config)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Info(args) => {
            let config = Config::load(cli.config.as_deref(), cli.cache_root.clone(), &args::ClusterArgs::default())?;
            commands::info::run(args, &config)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Status(args) => {
            let config = Config::load(cli.config.as_deref(), cli.cache_root.clone(), &args.cluster)?;
            commands::status::run(args, &config)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Registry(cmd) => {
            let config = Config::load(cli.config.as_deref(), cli.cache_root.clone(), &args::ClusterArgs::default())?;
            commands::registry::run(cmd, &config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
