use super::job::{AdapterError, ClusterAdapter};
use crate::meta::META_PACK_DEPLOYMENT_NAME;

/// `spec §4.5` "CheckForConflicts": whether registering a canonicalized job
/// would clobber something this deployment doesn't own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// A job by this name already exists on the cluster and carries no
    /// `pack.deployment_name` meta at all — it wasn't deployed by any pack.
    ExistsNonPack { job_name: String },
    /// A job by this name already exists, stamped with a *different*
    /// `pack.deployment_name` than the one being deployed.
    ExistsInDeployment {
        job_name: String,
        owning_deployment: String,
    },
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conflict::ExistsNonPack { job_name } => write!(
                f,
                "job {job_name:?} already exists and was not deployed by a pack"
            ),
            Conflict::ExistsInDeployment {
                job_name,
                owning_deployment,
            } => write!(
                f,
                "job {job_name:?} already belongs to deployment {owning_deployment:?}"
            ),
        }
    }
}

/// `spec §4.5` "CheckForConflicts": looks up `job_name` on the cluster and
/// decides whether `deployment_name` may register over it. No existing job,
/// or one already owned by the same deployment (the update path), is fine.
pub fn check_for_conflict(
    adapter: &dyn ClusterAdapter,
    job_name: &str,
    deployment_name: &str,
) -> Result<Option<Conflict>, AdapterError> {
    let existing = match adapter.info(job_name) {
        Ok(existing) => existing,
        Err(err) if err.is_not_found() => None,
        Err(err) => return Err(err),
    };

    let Some(existing) = existing else {
        return Ok(None);
    };

    match existing.meta.get(META_PACK_DEPLOYMENT_NAME) {
        None => Ok(Some(Conflict::ExistsNonPack {
            job_name: job_name.to_string(),
        })),
        Some(owner) if owner == deployment_name => Ok(None),
        Some(owner) => Ok(Some(Conflict::ExistsInDeployment {
            job_name: job_name.to_string(),
            owning_deployment: owner.clone(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use super::*;
    use crate::runner::job::{
        DeregisterOpts, DeregisterOutcome, Job, JobStub, PlanOpts, PlanOutcome, RegisterOpts,
        RegisterOutcome,
    };

    #[derive(Default)]
    struct FakeAdapter {
        job: RefCell<Option<Job>>,
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
            match &*self.job.borrow() {
                Some(job) if job.name == job_name => Ok(Some(job.clone())),
                _ => Ok(None),
            }
        }
        fn deregister(
            &self,
            _job_name: &str,
            _opts: DeregisterOpts,
        ) -> Result<DeregisterOutcome, AdapterError> {
            unimplemented!()
        }
        fn list(&self) -> Result<Vec<JobStub>, AdapterError> {
            unimplemented!()
        }
        fn set_namespace(&self, _namespace: Option<&str>) {}
        fn set_region(&self, _region: Option<&str>) {}
    }

    #[test]
    fn no_existing_job_is_not_a_conflict() {
        let adapter = FakeAdapter::default();
        assert_eq!(check_for_conflict(&adapter, "web", "web@v1").unwrap(), None);
    }

    #[test]
    fn existing_job_without_pack_meta_conflicts() {
        let adapter = FakeAdapter {
            job: RefCell::new(Some(Job {
                name: "web".to_string(),
                ..Default::default()
            })),
        };
        let conflict = check_for_conflict(&adapter, "web", "web@v1").unwrap();
        assert_eq!(
            conflict,
            Some(Conflict::ExistsNonPack {
                job_name: "web".to_string()
            })
        );
    }

    #[test]
    fn existing_job_owned_by_different_deployment_conflicts() {
        let mut meta = BTreeMap::new();
        meta.insert(META_PACK_DEPLOYMENT_NAME.to_string(), "web@v0".to_string());
        let adapter = FakeAdapter {
            job: RefCell::new(Some(Job {
                name: "web".to_string(),
                meta,
                ..Default::default()
            })),
        };
        let conflict = check_for_conflict(&adapter, "web", "web@v1").unwrap();
        assert_eq!(
            conflict,
            Some(Conflict::ExistsInDeployment {
                job_name: "web".to_string(),
                owning_deployment: "web@v0".to_string()
            })
        );
    }

    #[test]
    fn existing_job_owned_by_same_deployment_is_an_update_not_a_conflict() {
        let mut meta = BTreeMap::new();
        meta.insert(META_PACK_DEPLOYMENT_NAME.to_string(), "web@v1".to_string());
        let adapter = FakeAdapter {
            job: RefCell::new(Some(Job {
                name: "web".to_string(),
                meta,
                ..Default::default()
            })),
        };
        assert_eq!(check_for_conflict(&adapter, "web", "web@v1").unwrap(), None);
    }
}
