use std::process::ExitCode;

use anyhow::Context;
use pack_cluster_http::ClusterHttpClient;
use pack_core::{PlanOpts, PlanReport, Runner};

use crate::args::PlanArgs;
use crate::commands::pack_context::resolve_and_render;
use crate::config::Config;

/// `spec §4.5` "PlanDeployment": dry-run every job, never touching cluster
/// state, and map the aggregate result to one of the three configurable
/// exit codes (`spec §6`).
pub fn run(args: &PlanArgs, config: &Config) -> anyhow::Result<ExitCode> {
    let (_, pack, processed) = resolve_and_render(&args.selector, &args.vars, config)?;
    let identity = args.selector.deployment_identity();

    let adapter = ClusterHttpClient::new(&config.cluster_address, config.nomad_token.clone())
        .context("failed to build cluster client")?;
    let runner = Runner::new(&adapter, identity, pack.metadata.version.clone());

    let reports = runner.plan(
        &processed.templates,
        PlanOpts {
            policy_override: args.plan.policy_override,
        },
    )?;

    let mut has_errors = false;
    let mut has_changes = false;
    for report in &reports {
        print_report(report, args.plan.diff);
        has_errors |= report.has_errors();
        has_changes |= report.has_changes();
    }

    let code = if has_errors {
        args.plan.exit_code_error
    } else if has_changes {
        args.plan.exit_code_makes_changes
    } else {
        args.plan.exit_code_no_changes
    };
    Ok(ExitCode::from(code))
}

fn print_report(report: &PlanReport, diff: bool) {
    if !report.has_changes() && !report.has_errors() {
        println!("{}: no changes", report.job_name);
    }
    for outcome in &report.per_region {
        let region = outcome.diff.region.as_deref().unwrap_or("-");
        if outcome.diff.has_changes() {
            println!("{} ({region}):", report.job_name);
            if diff {
                for name in &outcome.diff.added {
                    println!("  + {name}");
                }
                for name in &outcome.diff.deleted {
                    println!("  - {name}");
                }
                for name in &outcome.diff.edited {
                    println!("  ~ {name}");
                }
            } else {
                println!(
                    "  {} to add, {} to delete, {} to edit",
                    outcome.diff.added.len(),
                    outcome.diff.deleted.len(),
                    outcome.diff.edited.len()
                );
            }
        }
        if outcome.annotations.has_preemptions() {
            println!(
                "  preempts {} allocation(s):",
                outcome.annotations.preempted_allocs.len()
            );
            for alloc in &outcome.annotations.preempted_allocs {
                println!("    {} (job {})", alloc.alloc_id, alloc.job_id);
            }
        }
        if let Some(launch) = &outcome.next_periodic_launch {
            println!("  next periodic launch: {launch}");
        }
        for (task_group, reason) in &outcome.failed_task_group_allocs {
            println!("  placement failure in {task_group}: {reason}");
        }
    }
    for error in &report.errors {
        eprintln!("{}: error: {error}", report.job_name);
    }
}
