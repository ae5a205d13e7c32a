//! Drives rendered job specs through parse → canonicalize → conflict-check
//! → plan/deploy → (optional) rollback (`spec §4.5` "Runner").
//!
//! State machine: `RAW -> PARSED -> CANONICAL -> CONFLICT_CHECKED ->
//! (PLANNED | DEPLOYED) -> ROLLED_BACK` (on a failed deploy with rollback
//! enabled).

use std::sync::LazyLock;

use regex::Regex;

pub mod canonicalize;
pub mod conflict;
pub mod deploy;
pub mod job;
pub mod parse;
pub mod plan;
pub mod stop;

pub use canonicalize::canonicalize_job_hcl;
pub use conflict::{Conflict, check_for_conflict};
pub use deploy::{DeployOutcome, DeployedJob, deploy};
pub use job::{
    AdapterError, ClusterAdapter, DeregisterOpts, DeregisterOutcome, JOB_NOT_FOUND, Job, JobStub,
    PlanAnnotations, PlanOpts, PlanOutcome, PreemptedAlloc, RegisterOpts, RegisterOutcome,
};
pub use parse::{ParseTemplateError, ParsedTemplate, extract_region_namespace, parse_templates};
pub use plan::{JobDiff, PlanReport, plan_deployment};
pub use stop::{ResolvedJob, StopError, resolve_deployment_jobs, stop_deployment};

use crate::meta::DeploymentIdentity;
use crate::render::RenderedArtifact;

/// The index-enforcement failure prefix a cluster adapter's error text
/// carries when a `--check-index` mismatch is rejected (`spec §4.6`
/// "Contracts"). The runner re-labels this rather than treating it as an
/// opaque failure.
pub static INDEX_ENFORCEMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(Enforcing job modify index.*\)").expect("valid regex"));

/// Failures from driving a [`RenderedArtifact`] through the runner.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Parse(#[from] ParseTemplateError),
    #[error("{0}")]
    Conflict(Conflict),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Drives one deployment's rendered templates through the runner's state
/// machine against a [`ClusterAdapter`] (`spec §4.5`).
pub struct Runner<'a> {
    adapter: &'a dyn ClusterAdapter,
    identity: DeploymentIdentity,
    version: String,
}

impl<'a> Runner<'a> {
    pub fn new(
        adapter: &'a dyn ClusterAdapter,
        identity: DeploymentIdentity,
        version: impl Into<String>,
    ) -> Self {
        Self {
            adapter,
            identity,
            version: version.into(),
        }
    }

    /// `RAW -> PARSED -> CANONICAL`: parses every render, stamps deployment
    /// identity meta into its HCL, then re-parses the canonical form so the
    /// returned [`Job`] reflects what will actually be registered.
    fn parse_and_canonicalize(
        &self,
        renders: &RenderedArtifact,
    ) -> Result<Vec<(String, Job)>, RunError> {
        let owned_renders = renders
            .iter()
            .map(|(name, hcl)| (name.clone(), hcl.clone()));
        let parsed = parse_templates(self.adapter, owned_renders)?;

        let mut canonical = Vec::with_capacity(parsed.len());
        for template in parsed {
            let canonical_hcl = canonicalize_job_hcl(
                &template.job,
                &self.identity,
                &template.render_name,
                &self.version,
            );
            let mut job = self
                .adapter
                .parse_job_hcl(&canonical_hcl, true)
                .map_err(RunError::Adapter)?;
            job.hcl = canonical_hcl;
            canonical.push((template.render_name, job));
        }
        Ok(canonical)
    }

    /// `CANONICAL -> CONFLICT_CHECKED`.
    fn check_conflicts(&self, jobs: &[(String, Job)]) -> Result<(), RunError> {
        for (_, job) in jobs {
            if let Some(conflict) =
                check_for_conflict(self.adapter, &job.name, &self.identity.deployment_name)
                    .map_err(RunError::Adapter)?
            {
                return Err(RunError::Conflict(conflict));
            }
        }
        Ok(())
    }

    /// `spec §4.5` "PlanDeployment": parses and canonicalizes every render,
    /// then dry-runs each resulting job, skipping the conflict check (a
    /// plan never mutates cluster state).
    pub fn plan(
        &self,
        renders: &RenderedArtifact,
        opts: PlanOpts,
    ) -> Result<Vec<PlanReport>, RunError> {
        let jobs = self.parse_and_canonicalize(renders)?;
        Ok(jobs
            .iter()
            .map(|(_, job)| plan_deployment(self.adapter, job, opts))
            .collect())
    }

    /// `PARSED -> CANONICAL -> CONFLICT_CHECKED -> DEPLOYED` (`-> ROLLED_BACK`
    /// on failure when `rollback` is set).
    pub fn run(
        &self,
        renders: &RenderedArtifact,
        register_opts: RegisterOpts,
        rollback: bool,
    ) -> Result<DeployOutcome, RunError> {
        let jobs = self.parse_and_canonicalize(renders)?;
        self.check_conflicts(&jobs)?;
        Ok(deploy(self.adapter, &jobs, register_opts, rollback))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use super::*;

    #[derive(Default)]
    struct FakeAdapter {
        existing: RefCell<BTreeMap<String, Job>>,
        deregistered: RefCell<Vec<String>>,
    }

    impl ClusterAdapter for FakeAdapter {
        fn parse_job_hcl(&self, hcl: &str, _canonicalize: bool) -> Result<Job, AdapterError> {
            let name = hcl
                .split('"')
                .nth(1)
                .ok_or_else(|| AdapterError::Other("no job name".to_string()))?;
            Ok(Job {
                name: name.to_string(),
                hcl: hcl.to_string(),
                ..Default::default()
            })
        }
        fn register(&self, job: &Job, _opts: RegisterOpts) -> Result<RegisterOutcome, AdapterError> {
            self.existing.borrow_mut().insert(job.name.clone(), job.clone());
            Ok(RegisterOutcome::default())
        }
        fn plan(&self, job: &Job, _opts: PlanOpts) -> Result<PlanOutcome, AdapterError> {
            Ok(PlanOutcome {
                diff: JobDiff {
                    job_name: job.name.clone(),
                    added: vec!["task".to_string()],
                    ..Default::default()
                },
                ..Default::default()
            })
        }
        fn info(&self, job_name: &str) -> Result<Option<Job>, AdapterError> {
            Ok(self.existing.borrow().get(job_name).cloned())
        }
        fn deregister(
            &self,
            job_name: &str,
            _opts: DeregisterOpts,
        ) -> Result<DeregisterOutcome, AdapterError> {
            self.deregistered.borrow_mut().push(job_name.to_string());
            self.existing.borrow_mut().remove(job_name);
            Ok(DeregisterOutcome::default())
        }
        fn list(&self) -> Result<Vec<JobStub>, AdapterError> {
            Ok(self
                .existing
                .borrow()
                .keys()
                .map(|name| JobStub {
                    name: name.clone(),
                    status: "running".to_string(),
                })
                .collect())
        }
        fn set_namespace(&self, _namespace: Option<&str>) {}
        fn set_region(&self, _region: Option<&str>) {}
    }

    fn identity() -> DeploymentIdentity {
        DeploymentIdentity::new("community", "web", "v1", None)
    }

    fn renders_for(job_name: &str) -> RenderedArtifact {
        let mut artifact = RenderedArtifact::default();
        artifact.parent_renders.insert(
            "web/templates/job".to_string(),
            format!("job \"{job_name}\" {{\n  type = \"service\"\n}}\n"),
        );
        artifact
    }

    #[test]
    fn run_deploys_a_fresh_job() {
        let adapter = FakeAdapter::default();
        let runner = Runner::new(&adapter, identity(), "1.0.0");
        let outcome = runner
            .run(&renders_for("web"), RegisterOpts::default(), false)
            .unwrap();
        match outcome {
            DeployOutcome::Success(deployed) => assert_eq!(deployed.len(), 1),
            DeployOutcome::Failed { .. } => panic!("expected success"),
        }
        assert!(adapter.existing.borrow()["web"].hcl.contains("pack.deployment_name"));
    }

    #[test]
    fn run_rejects_a_job_owned_by_another_deployment() {
        let adapter = FakeAdapter::default();
        let foreign = DeploymentIdentity::new("community", "web", "v0", None);
        let mut meta = BTreeMap::new();
        meta.insert(
            crate::meta::META_PACK_DEPLOYMENT_NAME.to_string(),
            foreign.deployment_name.clone(),
        );
        adapter.existing.borrow_mut().insert(
            "web".to_string(),
            Job {
                name: "web".to_string(),
                meta,
                ..Default::default()
            },
        );

        let runner = Runner::new(&adapter, identity(), "1.0.0");
        let err = runner
            .run(&renders_for("web"), RegisterOpts::default(), false)
            .unwrap_err();
        assert!(matches!(err, RunError::Conflict(Conflict::ExistsInDeployment { .. })));
    }

    #[test]
    fn plan_reports_changes_without_mutating_cluster_state() {
        let adapter = FakeAdapter::default();
        let runner = Runner::new(&adapter, identity(), "1.0.0");
        let reports = runner.plan(&renders_for("web"), PlanOpts::default()).unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].has_changes());
        assert!(adapter.existing.borrow().is_empty());
    }
}
