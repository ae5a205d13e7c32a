use std::collections::BTreeSet;

use super::job::{AdapterError, ClusterAdapter, DeregisterOpts};
use crate::meta::META_PACK_DEPLOYMENT_NAME;

/// `spec §4.5` "Stop"/"Destroy": why a deployment couldn't be resolved to a
/// single, unambiguous set of jobs.
#[derive(Debug, thiserror::Error)]
pub enum StopError {
    #[error("no deployment matching {0:?} was found")]
    NotFound(String),
    #[error("{0:?} matches more than one deployment: {}", .1.join(", "))]
    AmbiguousMatch(String, Vec<String>),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// A job resolved to a deployment, ready to be deregistered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedJob {
    pub job_name: String,
    pub deployment_name: String,
}

/// `spec §4.5` "Stop"/"Destroy": lists every job on the cluster, reads each
/// one's `pack.deployment_name` meta via `Info`, and resolves `identifier`
/// to the jobs of exactly one deployment. `identifier` may be the full
/// deployment name or an unambiguous prefix of it.
pub fn resolve_deployment_jobs(
    adapter: &dyn ClusterAdapter,
    identifier: &str,
) -> Result<Vec<ResolvedJob>, StopError> {
    let stubs = adapter.list()?;
    let mut resolved = Vec::new();
    let mut deployment_names = BTreeSet::new();
    for stub in &stubs {
        let Some(job) = adapter.info(&stub.name)? else {
            continue;
        };
        let Some(deployment_name) = job.meta.get(META_PACK_DEPLOYMENT_NAME) else {
            continue;
        };
        deployment_names.insert(deployment_name.clone());
        resolved.push(ResolvedJob {
            job_name: stub.name.clone(),
            deployment_name: deployment_name.clone(),
        });
    }

    let exact_match = deployment_names.contains(identifier);
    let target: BTreeSet<&String> = if exact_match {
        deployment_names.iter().filter(|n| *n == identifier).collect()
    } else {
        deployment_names
            .iter()
            .filter(|n| n.starts_with(identifier))
            .collect()
    };

    match target.len() {
        0 => Err(StopError::NotFound(identifier.to_string())),
        1 => {
            let deployment_name = target.into_iter().next().expect("len checked above");
            Ok(resolved
                .into_iter()
                .filter(|job| &job.deployment_name == deployment_name)
                .collect())
        }
        _ => Err(StopError::AmbiguousMatch(
            identifier.to_string(),
            target.into_iter().cloned().collect(),
        )),
    }
}

/// Deregisters every resolved job, collecting every failure instead of
/// stopping at the first one. `Destroy` is `Stop` with `purge = true`
/// (`spec §4.5`).
pub fn stop_deployment(
    adapter: &dyn ClusterAdapter,
    identifier: &str,
    purge: bool,
) -> Result<Vec<ResolvedJob>, StopError> {
    let jobs = resolve_deployment_jobs(adapter, identifier)?;
    let opts = DeregisterOpts {
        purge,
        global: false,
    };
    let mut errors = Vec::new();
    for job in &jobs {
        if let Err(err) = adapter.deregister(&job.job_name, opts) {
            errors.push(format!("{}: {err}", job.job_name));
        }
    }
    if let Some(err) = errors.into_iter().next() {
        return Err(StopError::Adapter(AdapterError::Other(err)));
    }
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use super::*;
    use crate::runner::job::{
        DeregisterOutcome, Job, JobStub, PlanOpts, PlanOutcome, RegisterOpts, RegisterOutcome,
    };

    #[derive(Default)]
    struct FakeAdapter {
        jobs: Vec<Job>,
        deregistered: RefCell<Vec<String>>,
    }

    impl ClusterAdapter for FakeAdapter {
        fn parse_job_hcl(&self, _hcl: &str, _canonicalize: bool) -> Result<Job, AdapterError> {
            unimplemented!()
        }
        fn register(&self, _job: &Job, _opts: RegisterOpts) -> Result<RegisterOutcome, AdapterError> {
            unimplemented!()
        }
        fn plan(&self, _job: &Job, _opts: PlanOpts) -> Result<PlanOutcome, AdapterError> {
            unimplemented!()
        }
        fn info(&self, job_name: &str) -> Result<Option<Job>, AdapterError> {
            Ok(self.jobs.iter().find(|j| j.name == job_name).cloned())
        }
        fn deregister(
            &self,
            job_name: &str,
            _opts: DeregisterOpts,
        ) -> Result<DeregisterOutcome, AdapterError> {
            self.deregistered.borrow_mut().push(job_name.to_string());
            Ok(DeregisterOutcome::default())
        }
        fn list(&self) -> Result<Vec<JobStub>, AdapterError> {
            Ok(self
                .jobs
                .iter()
                .map(|j| JobStub {
                    name: j.name.clone(),
                    status: "running".to_string(),
                })
                .collect())
        }
        fn set_namespace(&self, _namespace: Option<&str>) {}
        fn set_region(&self, _region: Option<&str>) {}
    }

    fn job_with_deployment(name: &str, deployment_name: &str) -> Job {
        let mut meta = BTreeMap::new();
        meta.insert(META_PACK_DEPLOYMENT_NAME.to_string(), deployment_name.to_string());
        Job {
            name: name.to_string(),
            meta,
            ..Default::default()
        }
    }

    #[test]
    fn resolves_exact_deployment_name() {
        let adapter = FakeAdapter {
            jobs: vec![job_with_deployment("web", "web@v1")],
            ..Default::default()
        };
        let jobs = resolve_deployment_jobs(&adapter, "web@v1").unwrap();
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn resolves_unambiguous_prefix() {
        let adapter = FakeAdapter {
            jobs: vec![job_with_deployment("web", "web@v1")],
            ..Default::default()
        };
        let jobs = resolve_deployment_jobs(&adapter, "web").unwrap();
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn ambiguous_prefix_across_two_deployments_is_an_error() {
        let adapter = FakeAdapter {
            jobs: vec![
                job_with_deployment("web", "web@v1"),
                job_with_deployment("web-canary", "web@v2"),
            ],
            ..Default::default()
        };
        let err = resolve_deployment_jobs(&adapter, "web").unwrap_err();
        assert!(matches!(err, StopError::AmbiguousMatch(_, _)));
    }

    #[test]
    fn unmatched_identifier_is_not_found() {
        let adapter = FakeAdapter::default();
        let err = resolve_deployment_jobs(&adapter, "missing").unwrap_err();
        assert!(matches!(err, StopError::NotFound(_)));
    }

    #[test]
    fn stop_deregisters_every_resolved_job_without_purge() {
        let adapter = FakeAdapter {
            jobs: vec![job_with_deployment("web", "web@v1")],
            ..Default::default()
        };
        stop_deployment(&adapter, "web@v1", false).unwrap();
        assert_eq!(&*adapter.deregistered.borrow(), &["web".to_string()]);
    }

    #[test]
    fn destroy_is_stop_with_purge() {
        let adapter = FakeAdapter {
            jobs: vec![job_with_deployment("web", "web@v1")],
            ..Default::default()
        };
        let jobs = stop_deployment(&adapter, "web@v1", true).unwrap();
        assert_eq!(jobs.len(), 1);
    }
}
