use super::job::{AdapterError, ClusterAdapter, Job, PlanOpts, PlanOutcome};

/// One region's plan result, or the multi-region aggregate when a job isn't
/// multiregion (`spec §4.5` "PlanDeployment").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobDiff {
    pub job_name: String,
    pub region: Option<String>,
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    pub edited: Vec<String>,
}

impl JobDiff {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.deleted.is_empty() || !self.edited.is_empty()
    }
}

/// The full result of planning one job, across every region it targets
/// (`spec §4.5` "PlanDeployment" — "iterates regions, collecting all
/// results before reporting").
#[derive(Debug, Clone, Default)]
pub struct PlanReport {
    pub job_name: String,
    pub per_region: Vec<PlanOutcome>,
    pub errors: Vec<String>,
}

impl PlanReport {
    pub fn has_changes(&self) -> bool {
        self.per_region.iter().any(|outcome| outcome.diff.has_changes())
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// `spec §4.5` "PlanDeployment": whether any region's plan would preempt
    /// an existing allocation, triggering the preemption summary on print.
    pub fn has_preemptions(&self) -> bool {
        self.per_region.iter().any(|outcome| outcome.annotations.has_preemptions())
    }
}

/// Dry-runs `job` through the adapter, once per multiregion region (or once,
/// unqualified, for a single-region job), accumulating every result instead
/// of stopping at the first error (`spec §4.5` "PlanDeployment").
pub fn plan_deployment(adapter: &dyn ClusterAdapter, job: &Job, opts: PlanOpts) -> PlanReport {
    let mut report = PlanReport {
        job_name: job.name.clone(),
        ..Default::default()
    };

    if job.is_multiregion() {
        for region in &job.multiregion_regions {
            adapter.set_region(Some(region));
            match adapter.plan(job, opts) {
                Ok(outcome) => report.per_region.push(outcome),
                Err(err) => report.errors.push(format_region_error(region, &err)),
            }
        }
    } else {
        match adapter.plan(job, opts) {
            Ok(outcome) => report.per_region.push(outcome),
            Err(err) => report.errors.push(err.to_string()),
        }
    }
    report
}

fn format_region_error(region: &str, err: &AdapterError) -> String {
    format!("region {region}: {err}")
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::runner::job::{
        DeregisterOpts, DeregisterOutcome, JobStub, RegisterOpts, RegisterOutcome,
    };

    #[derive(Default)]
    struct FakeAdapter {
        region: RefCell<Option<String>>,
        fail_region: Option<String>,
    }

    impl ClusterAdapter for FakeAdapter {
        fn parse_job_hcl(&self, _hcl: &str, _canonicalize: bool) -> Result<Job, AdapterError> {
            unimplemented!()
        }
        fn register(&self, _job: &Job, _opts: RegisterOpts) -> Result<RegisterOutcome, AdapterError> {
            unimplemented!()
        }
        fn plan(&self, job: &Job, _opts: PlanOpts) -> Result<PlanOutcome, AdapterError> {
            let region = self.region.borrow().clone();
            if region == self.fail_region {
                return Err(AdapterError::Other("plan failed".to_string()));
            }
            Ok(PlanOutcome {
                diff: JobDiff {
                    job_name: job.name.clone(),
                    region,
                    added: vec!["task".to_string()],
                    ..Default::default()
                },
                ..Default::default()
            })
        }
        fn info(&self, _job_name: &str) -> Result<Option<Job>, AdapterError> {
            unimplemented!()
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
        fn set_region(&self, region: Option<&str>) {
            *self.region.borrow_mut() = region.map(str::to_string);
        }
    }

    #[test]
    fn single_region_job_plans_once() {
        let adapter = FakeAdapter::default();
        let job = Job {
            name: "web".to_string(),
            ..Default::default()
        };
        let report = plan_deployment(&adapter, &job, PlanOpts::default());
        assert_eq!(report.per_region.len(), 1);
        assert!(report.has_changes());
        assert!(!report.has_errors());
    }

    #[test]
    fn multiregion_job_plans_every_region_and_keeps_going_after_a_failure() {
        let adapter = FakeAdapter {
            fail_region: Some("eu".to_string()),
            ..Default::default()
        };
        let job = Job {
            name: "web".to_string(),
            multiregion_regions: vec!["us".to_string(), "eu".to_string()],
            ..Default::default()
        };
        let report = plan_deployment(&adapter, &job, PlanOpts::default());
        assert_eq!(report.per_region.len(), 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.has_errors());
    }
}
