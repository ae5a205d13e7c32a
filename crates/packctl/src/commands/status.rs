use anyhow::Context;
use pack_cluster_http::ClusterHttpClient;
use pack_core::ClusterAdapter;
use pack_core::meta::META_PACK_DEPLOYMENT_NAME;
use pack_core::runner::{StopError, resolve_deployment_jobs};

use crate::args::StatusArgs;
use crate::config::Config;

/// Supplemented behavior (`spec §6` lists `status [pack]` as external
/// surface but leaves its output undefined): list the jobs belonging to one
/// deployment, or every job the cluster reports when no identifier is given.
pub fn run(args: &StatusArgs, config: &Config) -> anyhow::Result<()> {
    let adapter = ClusterHttpClient::new(&config.cluster_address, config.nomad_token.clone())
        .context("failed to build cluster client")?;

    match &args.deployment {
        Some(identifier) => print_one(&adapter, identifier),
        None => print_all(&adapter),
    }
}

fn print_one(adapter: &dyn ClusterAdapter, identifier: &str) -> anyhow::Result<()> {
    match resolve_deployment_jobs(adapter, identifier) {
        Ok(jobs) => {
            for job in &jobs {
                print_job(adapter, &job.job_name, &job.deployment_name)?;
            }
            Ok(())
        }
        Err(StopError::NotFound(_)) => {
            println!("not found");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn print_all(adapter: &dyn ClusterAdapter) -> anyhow::Result<()> {
    for stub in adapter.list()? {
        let Some(job) = adapter.info(&stub.name)? else {
            continue;
        };
        let deployment = job
            .meta
            .get(META_PACK_DEPLOYMENT_NAME)
            .cloned()
            .unwrap_or_else(|| "-".to_string());
        println!("{}\t{}\t{deployment}", stub.name, stub.status);
    }
    Ok(())
}

fn print_job(adapter: &dyn ClusterAdapter, job_name: &str, deployment_name: &str) -> anyhow::Result<()> {
    match adapter.info(job_name)? {
        Some(job) => println!(
            "{job_name}\tdeployment={deployment_name}\tregion={}",
            job.region.as_deref().unwrap_or("-")
        ),
        None => println!("{job_name}\tnot found"),
    }
    Ok(())
}
