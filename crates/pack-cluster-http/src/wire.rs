//! JSON shapes exchanged with the cluster API, kept separate from
//! [`pack_core::Job`] so a wire-format change never ripples into the
//! runner's narrow model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct JobJson {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Region", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(rename = "Namespace", skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(rename = "Multiregion", skip_serializing_if = "Option::is_none")]
    pub multiregion: Option<MultiregionJson>,
    #[serde(rename = "Periodic", skip_serializing_if = "Option::is_none")]
    pub periodic: Option<serde_json::Value>,
    #[serde(rename = "ParameterizedJob", skip_serializing_if = "Option::is_none")]
    pub parameterized_job: Option<serde_json::Value>,
    #[serde(rename = "TaskGroups", default)]
    pub task_groups: Vec<TaskGroupJson>,
    #[serde(rename = "Meta", default)]
    pub meta: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct MultiregionJson {
    #[serde(rename = "Regions", default)]
    pub regions: Vec<MultiregionRegionJson>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct MultiregionRegionJson {
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct TaskGroupJson {
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ParseJobRequest<'a> {
    #[serde(rename = "JobHCL")]
    pub job_hcl: &'a str,
    #[serde(rename = "Canonicalize")]
    pub canonicalize: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterJobRequest<'a> {
    #[serde(rename = "Job")]
    pub job: &'a JobJson,
    #[serde(rename = "EnforceIndex")]
    pub enforce_index: bool,
    #[serde(rename = "JobModifyIndex")]
    pub job_modify_index: u64,
    #[serde(rename = "PolicyOverride")]
    pub policy_override: bool,
    #[serde(rename = "PreserveCounts")]
    pub preserve_counts: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterJobResponse {
    #[serde(rename = "EvalID", default)]
    pub eval_id: Option<String>,
    #[serde(rename = "Warnings", default)]
    pub warnings: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PlanJobRequest<'a> {
    #[serde(rename = "Job")]
    pub job: &'a JobJson,
    #[serde(rename = "Diff")]
    pub diff: bool,
    #[serde(rename = "PolicyOverride")]
    pub policy_override: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PlanJobResponse {
    #[serde(rename = "Diff", default)]
    pub diff: Option<JobDiffJson>,
    #[serde(rename = "Annotations", default)]
    pub annotations: Option<PlanAnnotationsJson>,
    #[serde(rename = "Warnings", default)]
    pub warnings: Option<String>,
    #[serde(rename = "NextPeriodicLaunch", default)]
    pub next_periodic_launch: Option<String>,
    #[serde(rename = "FailedTGAllocs", default)]
    pub failed_tg_allocs: BTreeMap<String, String>,
    #[serde(rename = "CreatedEvals", default)]
    pub created_evals: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PlanAnnotationsJson {
    #[serde(rename = "PreemptedAllocs", default)]
    pub preempted_allocs: Vec<PreemptedAllocJson>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreemptedAllocJson {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "JobID")]
    pub job_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct JobDiffJson {
    #[serde(rename = "Fields", default)]
    pub fields: Vec<FieldDiffJson>,
    #[serde(rename = "TaskGroups", default)]
    pub task_groups: Vec<TaskGroupDiffJson>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TaskGroupDiffJson {
    #[serde(rename = "Fields", default)]
    pub fields: Vec<FieldDiffJson>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FieldDiffJson {
    #[serde(rename = "Type")]
    pub diff_type: String,
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeregisterJobResponse {
    #[serde(rename = "EvalID", default)]
    pub eval_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobStubJson {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Status")]
    pub status: String,
}
