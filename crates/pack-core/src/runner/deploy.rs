use super::job::{
    AdapterError, ClusterAdapter, DeregisterOpts, Job, RegisterOpts, RegisterOutcome,
};

/// One job's registration result, kept so a failed deploy can be reported
/// against the jobs that *did* make it (`spec §4.5` "Deploy").
#[derive(Debug, Clone)]
pub struct DeployedJob {
    pub job_name: String,
    pub outcome: RegisterOutcome,
}

/// What happened when deploying a batch of canonicalized jobs
/// (`spec §4.5` "Deploy").
#[derive(Debug, Clone)]
pub enum DeployOutcome {
    /// Every job registered.
    Success(Vec<DeployedJob>),
    /// A job failed to register; `deployed` lists what had already
    /// succeeded, `rolled_back` is `true` if they were deregistered again.
    Failed {
        deployed: Vec<DeployedJob>,
        failed_job: String,
        error: AdapterError,
        rolled_back: bool,
    },
}

/// `spec §4.5` "Deploy": registers `jobs` in order, stopping at the first
/// failure. When `rollback` is set, deregisters (with purge) everything
/// that had already succeeded, in reverse order, before returning the
/// error (`spec §4.5` state transition `DEPLOYED -> ROLLED_BACK`).
pub fn deploy(
    adapter: &dyn ClusterAdapter,
    jobs: &[(String, Job)],
    opts: RegisterOpts,
    rollback: bool,
) -> DeployOutcome {
    let mut deployed = Vec::new();
    for (job_name, job) in jobs {
        match adapter.register(job, opts) {
            Ok(outcome) => deployed.push(DeployedJob {
                job_name: job_name.clone(),
                outcome,
            }),
            Err(error) => {
                let rolled_back = if rollback {
                    rollback_deployed(adapter, &deployed)
                } else {
                    false
                };
                return DeployOutcome::Failed {
                    deployed,
                    failed_job: job_name.clone(),
                    error,
                    rolled_back,
                };
            }
        }
    }
    DeployOutcome::Success(deployed)
}

/// Deregisters every already-deployed job in reverse order, best-effort —
/// one failed rollback doesn't stop the rest from being attempted.
fn rollback_deployed(adapter: &dyn ClusterAdapter, deployed: &[DeployedJob]) -> bool {
    let mut all_ok = true;
    for job in deployed.iter().rev() {
        let opts = DeregisterOpts {
            purge: true,
            global: false,
        };
        if adapter.deregister(&job.job_name, opts).is_err() {
            all_ok = false;
        }
    }
    all_ok
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::runner::job::{DeregisterOutcome, JobStub, PlanOpts, PlanOutcome};

    #[derive(Default)]
    struct FakeAdapter {
        fail_on: Option<String>,
        deregistered: RefCell<Vec<String>>,
    }

    impl ClusterAdapter for FakeAdapter {
        fn parse_job_hcl(&self, _hcl: &str, _canonicalize: bool) -> Result<Job, AdapterError> {
            unimplemented!()
        }
        fn register(&self, job: &Job, _opts: RegisterOpts) -> Result<RegisterOutcome, AdapterError> {
            if self.fail_on.as_deref() == Some(job.name.as_str()) {
                return Err(AdapterError::Other("register failed".to_string()));
            }
            Ok(RegisterOutcome::default())
        }
        fn plan(&self, _job: &Job, _opts: PlanOpts) -> Result<PlanOutcome, AdapterError> {
            unimplemented!()
        }
        fn info(&self, _job_name: &str) -> Result<Option<Job>, AdapterError> {
            unimplemented!()
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
            unimplemented!()
        }
        fn set_namespace(&self, _namespace: Option<&str>) {}
        fn set_region(&self, _region: Option<&str>) {}
    }

    fn job(name: &str) -> Job {
        Job {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn deploys_every_job_when_all_succeed() {
        let adapter = FakeAdapter::default();
        let jobs = vec![
            ("web".to_string(), job("web")),
            ("redis".to_string(), job("redis")),
        ];
        let outcome = deploy(&adapter, &jobs, RegisterOpts::default(), false);
        match outcome {
            DeployOutcome::Success(deployed) => assert_eq!(deployed.len(), 2),
            DeployOutcome::Failed { .. } => panic!("expected success"),
        }
    }

    #[test]
    fn rolls_back_already_deployed_jobs_on_failure_when_enabled() {
        let adapter = FakeAdapter {
            fail_on: Some("redis".to_string()),
            ..Default::default()
        };
        let jobs = vec![
            ("web".to_string(), job("web")),
            ("redis".to_string(), job("redis")),
        ];
        let outcome = deploy(&adapter, &jobs, RegisterOpts::default(), true);
        match outcome {
            DeployOutcome::Failed {
                deployed,
                failed_job,
                rolled_back,
                ..
            } => {
                assert_eq!(deployed.len(), 1);
                assert_eq!(failed_job, "redis");
                assert!(rolled_back);
                assert_eq!(&*adapter.deregistered.borrow(), &["web".to_string()]);
            }
            DeployOutcome::Success(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn leaves_already_deployed_jobs_in_place_when_rollback_disabled() {
        let adapter = FakeAdapter {
            fail_on: Some("redis".to_string()),
            ..Default::default()
        };
        let jobs = vec![
            ("web".to_string(), job("web")),
            ("redis".to_string(), job("redis")),
        ];
        let outcome = deploy(&adapter, &jobs, RegisterOpts::default(), false);
        match outcome {
            DeployOutcome::Failed { rolled_back, .. } => {
                assert!(!rolled_back);
                assert!(adapter.deregistered.borrow().is_empty());
            }
            DeployOutcome::Success(_) => panic!("expected failure"),
        }
    }
}
