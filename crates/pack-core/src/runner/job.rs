use std::collections::BTreeMap;

/// A scheduler job, far narrower than a real cluster's job schema — only the
/// fields the runner itself inspects or mutates (`spec §4.5`, `§4.6`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Job {
    pub name: String,
    pub region: Option<String>,
    pub namespace: Option<String>,
    /// Non-empty for a multiregion job; the runner iterates each of these
    /// during `PlanDeployment` (`spec §4.5` "PlanDeployment").
    pub multiregion_regions: Vec<String>,
    pub periodic: bool,
    pub parameterized: bool,
    pub task_groups: Vec<String>,
    pub meta: BTreeMap<String, String>,
    /// The canonical HCL text for this job, round-tripped through
    /// [`super::canonicalize::canonicalize_job_hcl`] and handed to the
    /// adapter for registration/planning.
    pub hcl: String,
}

impl Job {
    pub fn is_multiregion(&self) -> bool {
        !self.multiregion_regions.is_empty()
    }
}

/// One job known to the cluster, as returned by [`ClusterAdapter::list`]
/// (`spec §4.6` `List`).
#[derive(Debug, Clone, PartialEq)]
pub struct JobStub {
    pub name: String,
    pub status: String,
}

/// `spec §4.5` "Deploy" — flags taken from run config, passed through to
/// `RegisterOpts`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterOpts {
    pub enforce_index: bool,
    pub modify_index: u64,
    pub policy_override: bool,
    pub preserve_counts: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RegisterOutcome {
    pub eval_id: Option<String>,
    pub warnings: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlanOpts {
    pub policy_override: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PlanOutcome {
    pub diff: crate::runner::plan::JobDiff,
    pub annotations: PlanAnnotations,
    pub warnings: Option<String>,
    pub next_periodic_launch: Option<String>,
    pub failed_task_group_allocs: BTreeMap<String, String>,
    pub created_evals: usize,
}

/// `spec §4.5` "PlanDeployment": the allocations a plan would preempt if
/// applied, so a preemption summary can be printed before anything is
/// actually registered.
#[derive(Debug, Clone, Default)]
pub struct PlanAnnotations {
    pub preempted_allocs: Vec<PreemptedAlloc>,
}

impl PlanAnnotations {
    pub fn has_preemptions(&self) -> bool {
        !self.preempted_allocs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreemptedAlloc {
    pub alloc_id: String,
    pub job_id: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeregisterOpts {
    pub purge: bool,
    pub global: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DeregisterOutcome {
    pub eval_id: Option<String>,
}

/// The literal sentinel text the runner inspects textually (`spec §4.6`
/// "Contracts").
pub const JOB_NOT_FOUND: &str = "job not found";

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("{JOB_NOT_FOUND}")]
    NotFound,
    #[error("{0}")]
    Other(String),
}

impl AdapterError {
    /// `true` for the one sentinel error the runner is allowed to inspect
    /// textually (`spec §4.6`).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// `true` when the message carries the index-enforcement failure prefix
    /// the runner re-labels (`spec §4.6` "Contracts").
    pub fn is_index_enforcement_failure(&self) -> bool {
        super::INDEX_ENFORCEMENT_RE.is_match(self.to_string().as_str())
    }
}

/// The narrow capability set the runner consumes from the cluster
/// (`spec §4.6`). Implemented for real by `pack-cluster-http`; tests
/// substitute an in-memory double.
///
/// `set_region`/`set_namespace` are interior-mutable so the runner can hold
/// a single shared `&dyn ClusterAdapter` across an invocation and still
/// mutate client-scoped state before each template's operation
/// (`spec §4.5` "Ordering" — single-threaded, so no race arises).
pub trait ClusterAdapter: Send + Sync {
    fn parse_job_hcl(&self, hcl: &str, canonicalize: bool) -> Result<Job, AdapterError>;
    fn register(&self, job: &Job, opts: RegisterOpts) -> Result<RegisterOutcome, AdapterError>;
    fn plan(&self, job: &Job, opts: PlanOpts) -> Result<PlanOutcome, AdapterError>;
    fn info(&self, job_name: &str) -> Result<Option<Job>, AdapterError>;
    fn deregister(
        &self,
        job_name: &str,
        opts: DeregisterOpts,
    ) -> Result<DeregisterOutcome, AdapterError>;
    fn list(&self) -> Result<Vec<JobStub>, AdapterError>;
    fn set_namespace(&self, namespace: Option<&str>);
    fn set_region(&self, region: Option<&str>);
}
