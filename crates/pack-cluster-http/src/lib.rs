//! HTTP implementation of the narrow [`ClusterAdapter`] capability set the
//! runner consumes (`spec §4.6`). The trait is synchronous — the runner
//! drives one invocation on a single thread (`spec §5`) — so this client
//! wraps a blocking `reqwest` client rather than bridging an async one.

mod error;
mod wire;

use std::cell::RefCell;

use pack_core::{
    AdapterError, ClusterAdapter, DeregisterOpts, DeregisterOutcome, Job, JobDiff, JobStub,
    PlanAnnotations, PlanOpts, PlanOutcome, PreemptedAlloc, RegisterOpts, RegisterOutcome,
};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

pub use error::ClusterHttpError;

const TOKEN_HEADER: &str = "X-Nomad-Token";

/// Talks to a real cluster scheduler over HTTP. One client is built per CLI
/// invocation and shared across every template's operation; `namespace`/
/// `region` are interior-mutable so [`ClusterAdapter::set_namespace`]/
/// [`ClusterAdapter::set_region`] can update them ahead of each call without
/// `&mut self` (`spec §4.5` "Ordering").
pub struct ClusterHttpClient {
    base_url: Url,
    http: reqwest::blocking::Client,
    token: Option<SecretString>,
    namespace: RefCell<Option<String>>,
    region: RefCell<Option<String>>,
}

impl ClusterHttpClient {
    /// Builds a client against `base_url` (e.g. the value of `NOMAD_ADDR`),
    /// authenticating requests with `token` (`NOMAD_TOKEN`) when present.
    pub fn new(base_url: &str, token: Option<SecretString>) -> Result<Self, ClusterHttpError> {
        let base_url = Url::parse(base_url)?;
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("packctl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url,
            http,
            token,
            namespace: RefCell::new(None),
            region: RefCell::new(None),
        })
    }

    fn url(&self, path: &str) -> Url {
        self.base_url.join(path).expect("path is a valid relative url")
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> reqwest::blocking::RequestBuilder {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(token) = &self.token {
            builder = builder.header(TOKEN_HEADER, token.expose_secret());
        }
        if let Some(namespace) = self.namespace.borrow().as_deref() {
            builder = builder.query(&[("namespace", namespace)]);
        }
        if let Some(region) = self.region.borrow().as_deref() {
            builder = builder.query(&[("region", region)]);
        }
        builder
    }

    fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::blocking::RequestBuilder,
    ) -> Result<T, ClusterHttpError> {
        let response = builder.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClusterHttpError::Status { status, body });
        }
        response.json().map_err(ClusterHttpError::Decode)
    }

    /// Like [`Self::send_json`], but treats a 404 as `Ok(None)` instead of
    /// an error, for lookups where "not found" isn't a failure at the wire
    /// level (`Info`/`List` never return the `AdapterError::NotFound`
    /// sentinel themselves — only `ClusterAdapter::info` does, via its
    /// `Result<Option<Job>, _>` signature).
    fn send_json_optional<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::blocking::RequestBuilder,
    ) -> Result<Option<T>, ClusterHttpError> {
        let response = builder.send()?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClusterHttpError::Status { status, body });
        }
        response.json().map(Some).map_err(ClusterHttpError::Decode)
    }
}

fn job_from_wire(job: wire::JobJson, hcl: String) -> Job {
    let multiregion_regions = job
        .multiregion
        .map(|m| m.regions.into_iter().map(|r| r.name).collect())
        .unwrap_or_default();
    Job {
        name: job.id,
        region: job.region,
        namespace: job.namespace,
        multiregion_regions,
        periodic: job.periodic.is_some(),
        parameterized: job.parameterized_job.is_some(),
        task_groups: job.task_groups.into_iter().map(|tg| tg.name).collect(),
        meta: job.meta,
        hcl,
    }
}

fn job_to_wire(job: &Job) -> wire::JobJson {
    wire::JobJson {
        id: job.name.clone(),
        region: job.region.clone(),
        namespace: job.namespace.clone(),
        multiregion: if job.multiregion_regions.is_empty() {
            None
        } else {
            Some(wire::MultiregionJson {
                regions: job
                    .multiregion_regions
                    .iter()
                    .map(|name| wire::MultiregionRegionJson { name: name.clone() })
                    .collect(),
            })
        },
        periodic: None,
        parameterized_job: None,
        task_groups: job
            .task_groups
            .iter()
            .map(|name| wire::TaskGroupJson { name: name.clone() })
            .collect(),
        meta: job.meta.clone(),
    }
}

fn diff_from_wire(job_name: String, region: Option<String>, diff: wire::JobDiffJson) -> JobDiff {
    let mut added = Vec::new();
    let mut deleted = Vec::new();
    let mut edited = Vec::new();
    let mut classify = |fields: Vec<wire::FieldDiffJson>| {
        for field in fields {
            match field.diff_type.as_str() {
                "Added" => added.push(field.name),
                "Deleted" => deleted.push(field.name),
                "Edited" => edited.push(field.name),
                _ => {}
            }
        }
    };
    classify(diff.fields);
    for task_group in diff.task_groups {
        classify(task_group.fields);
    }
    JobDiff {
        job_name,
        region,
        added,
        deleted,
        edited,
    }
}

fn annotations_from_wire(annotations: Option<wire::PlanAnnotationsJson>) -> PlanAnnotations {
    let Some(annotations) = annotations else {
        return PlanAnnotations::default();
    };
    PlanAnnotations {
        preempted_allocs: annotations
            .preempted_allocs
            .into_iter()
            .map(|alloc| PreemptedAlloc {
                alloc_id: alloc.id,
                job_id: alloc.job_id,
            })
            .collect(),
    }
}

impl ClusterAdapter for ClusterHttpClient {
    fn parse_job_hcl(&self, hcl: &str, canonicalize: bool) -> Result<Job, AdapterError> {
        let request = self
            .request(reqwest::Method::POST, "v1/jobs/parse")
            .json(&wire::ParseJobRequest {
                job_hcl: hcl,
                canonicalize,
            });
        let job: wire::JobJson = self
            .send_json(request)
            .map_err(ClusterHttpError::into_adapter_error)?;
        Ok(job_from_wire(job, hcl.to_string()))
    }

    fn register(&self, job: &Job, opts: RegisterOpts) -> Result<RegisterOutcome, AdapterError> {
        let job_json = job_to_wire(job);
        let request = self
            .request(reqwest::Method::POST, "v1/jobs")
            .json(&wire::RegisterJobRequest {
                job: &job_json,
                enforce_index: opts.enforce_index,
                job_modify_index: opts.modify_index,
                policy_override: opts.policy_override,
                preserve_counts: opts.preserve_counts,
            });
        let response: wire::RegisterJobResponse = self
            .send_json(request)
            .map_err(ClusterHttpError::into_adapter_error)?;
        Ok(RegisterOutcome {
            eval_id: response.eval_id,
            warnings: response.warnings,
        })
    }

    fn plan(&self, job: &Job, opts: PlanOpts) -> Result<PlanOutcome, AdapterError> {
        let job_json = job_to_wire(job);
        let request = self
            .request(reqwest::Method::POST, &format!("v1/job/{}/plan", job.name))
            .json(&wire::PlanJobRequest {
                job: &job_json,
                diff: true,
                policy_override: opts.policy_override,
            });
        let response: wire::PlanJobResponse = self
            .send_json(request)
            .map_err(ClusterHttpError::into_adapter_error)?;
        let diff = response
            .diff
            .map(|diff| diff_from_wire(job.name.clone(), job.region.clone(), diff))
            .unwrap_or_else(|| JobDiff {
                job_name: job.name.clone(),
                region: job.region.clone(),
                ..Default::default()
            });
        let annotations = annotations_from_wire(response.annotations);
        Ok(PlanOutcome {
            diff,
            annotations,
            warnings: response.warnings,
            next_periodic_launch: response.next_periodic_launch,
            failed_task_group_allocs: response.failed_tg_allocs,
            created_evals: response.created_evals.len(),
        })
    }

    fn info(&self, job_name: &str) -> Result<Option<Job>, AdapterError> {
        let request = self.request(reqwest::Method::GET, &format!("v1/job/{job_name}"));
        let job: Option<wire::JobJson> = self
            .send_json_optional(request)
            .map_err(ClusterHttpError::into_adapter_error)?;
        Ok(job.map(|job| job_from_wire(job, String::new())))
    }

    fn deregister(
        &self,
        job_name: &str,
        opts: DeregisterOpts,
    ) -> Result<DeregisterOutcome, AdapterError> {
        let mut builder = self.request(reqwest::Method::DELETE, &format!("v1/job/{job_name}"));
        builder = builder.query(&[("purge", opts.purge), ("global", opts.global)]);
        let response: wire::DeregisterJobResponse = self
            .send_json(builder)
            .map_err(ClusterHttpError::into_adapter_error)?;
        Ok(DeregisterOutcome {
            eval_id: response.eval_id,
        })
    }

    fn list(&self) -> Result<Vec<JobStub>, AdapterError> {
        let request = self.request(reqwest::Method::GET, "v1/jobs");
        let stubs: Vec<wire::JobStubJson> = self
            .send_json(request)
            .map_err(ClusterHttpError::into_adapter_error)?;
        Ok(stubs
            .into_iter()
            .map(|stub| JobStub {
                name: stub.id,
                status: stub.status,
            })
            .collect())
    }

    fn set_namespace(&self, namespace: Option<&str>) {
        *self.namespace.borrow_mut() = namespace.map(str::to_string);
    }

    fn set_region(&self, region: Option<&str>) {
        *self.region.borrow_mut() = region.map(str::to_string);
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(base_url: &str) -> ClusterHttpClient {
        ClusterHttpClient::new(base_url, None).unwrap()
    }

    #[tokio::test]
    async fn parse_job_hcl_maps_a_successful_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/jobs/parse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ID": "web",
                "Region": "global",
                "TaskGroups": [{"Name": "app"}],
            })))
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let job = tokio::task::spawn_blocking(move || client.parse_job_hcl("job \"web\" {}", true))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(job.name, "web");
        assert_eq!(job.region.as_deref(), Some("global"));
        assert_eq!(job.task_groups, vec!["app".to_string()]);
    }

    #[tokio::test]
    async fn info_maps_a_404_to_none_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/job/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let job = tokio::task::spawn_blocking(move || client.info("missing"))
            .await
            .unwrap()
            .unwrap();
        assert!(job.is_none());
    }

    #[tokio::test]
    async fn register_surfaces_an_index_enforcement_failure_with_its_prefix_intact() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/jobs"))
            .respond_with(ResponseTemplate::new(500).set_body_string(
                "job modify index did not match (Enforcing job modify index 3): actual 4",
            ))
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let job = Job {
            name: "web".to_string(),
            ..Default::default()
        };
        let err = tokio::task::spawn_blocking(move || client.register(&job, RegisterOpts::default()))
            .await
            .unwrap()
            .unwrap_err();
        assert!(err.is_index_enforcement_failure());
    }

    #[tokio::test]
    async fn deregister_sends_purge_and_global_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/job/web"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "EvalID": "eval-1",
            })))
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let opts = DeregisterOpts {
            purge: true,
            global: false,
        };
        let outcome = tokio::task::spawn_blocking(move || client.deregister("web", opts))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.eval_id.as_deref(), Some("eval-1"));
    }

    #[tokio::test]
    async fn list_maps_job_stubs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"ID": "web", "Status": "running"},
                {"ID": "redis", "Status": "pending"},
            ])))
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let stubs = tokio::task::spawn_blocking(move || client.list())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stubs.len(), 2);
        assert_eq!(stubs[0].name, "web");
    }

    #[tokio::test]
    async fn plan_flattens_task_group_field_diffs() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/job/web/plan"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Diff": {
                    "Fields": [{"Type": "Edited", "Name": "Meta"}],
                    "TaskGroups": [{"Fields": [{"Type": "Added", "Name": "app"}]}],
                },
                "CreatedEvals": ["eval-1"],
            })))
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let job = Job {
            name: "web".to_string(),
            ..Default::default()
        };
        let outcome = tokio::task::spawn_blocking(move || client.plan(&job, PlanOpts::default()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.diff.edited, vec!["Meta".to_string()]);
        assert_eq!(outcome.diff.added, vec!["app".to_string()]);
        assert_eq!(outcome.created_evals, 1);
    }

    #[tokio::test]
    async fn plan_maps_preempted_allocs() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/job/web/plan"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Diff": {"Fields": [], "TaskGroups": []},
                "Annotations": {
                    "PreemptedAllocs": [{"ID": "alloc-1", "JobID": "redis"}],
                },
                "CreatedEvals": [],
            })))
            .mount(&server)
            .await;

        let client = client(&server.uri());
        let job = Job {
            name: "web".to_string(),
            ..Default::default()
        };
        let outcome = tokio::task::spawn_blocking(move || client.plan(&job, PlanOpts::default()))
            .await
            .unwrap()
            .unwrap();
        assert!(outcome.annotations.has_preemptions());
        assert_eq!(outcome.annotations.preempted_allocs[0].alloc_id, "alloc-1");
        assert_eq!(outcome.annotations.preempted_allocs[0].job_id, "redis");
    }
}
