use std::sync::LazyLock;

use regex::Regex;

use super::job::{AdapterError, ClusterAdapter, Job};

static HEREDOC_DATA_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    // `data = <<EOF ... EOF` / `data = <<-EOF ... EOF`, any tag name.
    Regex::new(r#"(?ms)^\s*data\s*=\s*<<-?(\w+)\r?\n.*?^\1\s*$"#).expect("valid regex")
});
static REGION_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^\s*region\s*=\s*"([^"]*)"\s*$"#).expect("valid regex"));
static NAMESPACE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^\s*namespace\s*=\s*"([^"]*)"\s*$"#).expect("valid regex"));

/// Strips `template { data = <<EOF ... EOF }` heredoc bodies so their
/// contents can't produce a false `region`/`namespace` match (`spec §4.5`
/// "ParseTemplates").
fn strip_heredocs(hcl: &str) -> String {
    HEREDOC_DATA_BLOCK.replace_all(hcl, "data = \"\"").into_owned()
}

/// Extracts `region`/`namespace` from raw job HCL via anchored regex,
/// *before* parsing, since ACL constraints may depend on them being applied
/// to the adapter client first (`spec §4.5` "ParseTemplates").
pub fn extract_region_namespace(hcl: &str) -> (Option<String>, Option<String>) {
    let scrubbed = strip_heredocs(hcl);
    let region = REGION_ATTR
        .captures(&scrubbed)
        .map(|c| c[1].to_string());
    let namespace = NAMESPACE_ATTR
        .captures(&scrubbed)
        .map(|c| c[1].to_string());
    (region, namespace)
}

/// One rendered template parsed into a [`Job`] (`spec §4.5` state `PARSED`).
#[derive(Debug, Clone)]
pub struct ParsedTemplate {
    pub render_name: String,
    pub job: Job,
}

#[derive(Debug, thiserror::Error)]
#[error("{render_name}: {source}")]
pub struct ParseTemplateError {
    pub render_name: String,
    #[source]
    pub source: AdapterError,
}

/// `spec §4.5` "ParseTemplates": for each rendered string, extract
/// region/namespace and apply them to the adapter client, then call
/// `ParseJobHCL`.
pub fn parse_templates(
    adapter: &dyn ClusterAdapter,
    renders: impl IntoIterator<Item = (String, String)>,
) -> Result<Vec<ParsedTemplate>, ParseTemplateError> {
    let mut parsed = Vec::new();
    for (render_name, hcl) in renders {
        let (region, namespace) = extract_region_namespace(&hcl);
        adapter.set_region(region.as_deref());
        adapter.set_namespace(namespace.as_deref());
        let job = adapter
            .parse_job_hcl(&hcl, true)
            .map_err(|source| ParseTemplateError {
                render_name: render_name.clone(),
                source,
            })?;
        parsed.push(ParsedTemplate { render_name, job });
    }
    Ok(parsed)
}
