use std::collections::BTreeSet;
use std::process::ExitCode;

use anyhow::Context;
use pack_cluster_http::ClusterHttpClient;
use pack_core::runner::{parse_templates, resolve_deployment_jobs};
use pack_core::{ClusterAdapter, DeregisterOpts};

use crate::args::{DestroyArgs, StopArgs};
use crate::commands::pack_context::resolve_and_render;
use crate::config::Config;

/// `spec §4.5` "Stop": resolve the deployment, deregister every job without
/// purging it.
pub fn stop(args: &StopArgs, config: &Config) -> anyhow::Result<ExitCode> {
    let adapter = ClusterHttpClient::new(&config.cluster_address, config.nomad_token.clone())
        .context("failed to build cluster client")?;
    let identifier = args.selector.deployment_identity().deployment_name;
    let jobs = resolve_deployment_jobs(&adapter, &identifier)?;
    deregister_all(&adapter, jobs.into_iter().map(|job| job.job_name), args.purge)
}

/// `spec §4.5` "Destroy" = `Stop` with `purge = true`, except the job set is
/// computed the same way `run`'s would be (render, then parse each template
/// to a job name) and narrowed to jobs the deployment already has
/// registered, so a `--var` change that would rename/add a job never
/// surprises the caller by tearing down something `run` never deployed
/// (decided open question, see `DESIGN.md`).
pub fn destroy(args: &DestroyArgs, config: &Config) -> anyhow::Result<ExitCode> {
    let (_, _pack, processed) = resolve_and_render(&args.selector, &args.vars, config)?;

    let adapter = ClusterHttpClient::new(&config.cluster_address, config.nomad_token.clone())
        .context("failed to build cluster client")?;
    let identifier = args.selector.deployment_identity().deployment_name;
    let registered = resolve_deployment_jobs(&adapter, &identifier)?;
    let registered_names: BTreeSet<String> =
        registered.into_iter().map(|job| job.job_name).collect();

    let owned_renders = processed
        .templates
        .iter()
        .map(|(name, hcl)| (name.clone(), hcl.clone()));
    let parsed = parse_templates(&adapter, owned_renders)
        .context("failed to parse rendered templates while resolving destroy's job set")?;
    let rendered_names: BTreeSet<String> = parsed.into_iter().map(|t| t.job.name).collect();

    let to_destroy = rendered_names.intersection(&registered_names).cloned();
    deregister_all(&adapter, to_destroy, true)
}

fn deregister_all(
    adapter: &dyn ClusterAdapter,
    job_names: impl Iterator<Item = String>,
    purge: bool,
) -> anyhow::Result<ExitCode> {
    let opts = DeregisterOpts {
        purge,
        global: false,
    };
    let verb = if purge { "destroyed" } else { "stopped" };
    let mut any = false;
    for job_name in job_names {
        adapter
            .deregister(&job_name, opts)
            .with_context(|| format!("failed to deregister {job_name}"))?;
        println!("{verb} {job_name}");
        any = true;
    }
    if !any {
        println!("no jobs to {}", if purge { "destroy" } else { "stop" });
    }
    Ok(ExitCode::SUCCESS)
}
