use std::process::ExitCode;

use anyhow::Context;
use pack_cluster_http::ClusterHttpClient;
use pack_core::{DeployOutcome, RegisterOpts, Runner};
use tracing::{info, warn};

use crate::args::RunArgs;
use crate::commands::pack_context::resolve_and_render;
use crate::config::Config;

/// `spec §4.5` "Deploy": render, then drive every job through the runner's
/// parse → canonicalize → conflict-check → deploy pipeline.
pub fn run(args: &RunArgs, config: &Config) -> anyhow::Result<ExitCode> {
    let (reference, pack, processed) = resolve_and_render(&args.selector, &args.vars, config)?;
    let identity = args.selector.deployment_identity();
    let deployment_name = identity.deployment_name.clone();
    let _ = &reference;

    let adapter = ClusterHttpClient::new(&config.cluster_address, config.nomad_token.clone())
        .context("failed to build cluster client")?;
    let runner = Runner::new(&adapter, identity, pack.metadata.version.clone());

    let register_opts = RegisterOpts {
        enforce_index: args.run.check_index > 0,
        modify_index: args.run.check_index,
        policy_override: args.run.policy_override,
        preserve_counts: args.run.preserve_counts,
    };

    let outcome = runner.run(&processed.templates, register_opts, args.run.rollback)?;
    match outcome {
        DeployOutcome::Success(deployed) => {
            for job in &deployed {
                info!(job = %job.job_name, "deployed");
            }
            println!("deployed {} job(s) for {deployment_name}", deployed.len());
            Ok(ExitCode::SUCCESS)
        }
        DeployOutcome::Failed {
            failed_job,
            error,
            rolled_back,
            deployed,
            ..
        } => {
            warn!(job = %failed_job, %error, rolled_back, "deploy failed");
            let suffix = if rolled_back {
                " (rolled back)"
            } else if !deployed.is_empty() {
                " (rollback disabled; earlier jobs were left in place)"
            } else {
                ""
            };
            if error.is_index_enforcement_failure() {
                eprintln!(
                    "failed to deploy {failed_job}: job was modified since it was last checked; rerun with the current --check-index to deploy anyway{suffix}"
                );
            } else {
                eprintln!("failed to deploy {failed_job}: {error}{suffix}");
            }
            Ok(ExitCode::from(1))
        }
    }
}
