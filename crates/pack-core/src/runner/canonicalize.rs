use std::collections::BTreeMap;

use hcl::Expression;
use hcl_edit::structure::{Block, BlockLabel, Body as EditBody};

use super::job::Job;
use crate::meta::DeploymentIdentity;

/// `spec §4.5` "CanonicalizeTemplates": stamps the six `pack.*` meta keys
/// into a parsed job's HCL, merging with whatever `meta` the author already
/// declared. A `meta` attribute wins over a `meta` block on conflict; the
/// stamped identity keys always win over both (`spec §3` "Deployment
/// identity" is the sole source of truth for later lookup).
///
/// Edits are format-preserving: everything outside the `meta`
/// attribute/block of the matched `job` block — comments, spacing, the rest
/// of the document — survives untouched, since the rewrite goes through
/// `hcl-edit`'s parse tree rather than text surgery.
///
/// Falls back to the original HCL unchanged if it can't be parsed — the
/// same template already survived [`super::parse::parse_templates`], so a
/// failure here means the adapter's own canonicalizer already rewrote it
/// into something this scanner doesn't recognise, not that it's invalid.
pub fn canonicalize_job_hcl(
    job: &Job,
    identity: &DeploymentIdentity,
    pack_path: &str,
    version: &str,
) -> String {
    let Ok(read_body) = hcl::parse(&job.hcl) else {
        return job.hcl.clone();
    };
    let mut merged = existing_meta(&read_body, &job.name);
    merged.extend(identity.meta(pack_path, &job.name, version));

    let Ok(mut edit_body) = job.hcl.parse::<EditBody>() else {
        return job.hcl.clone();
    };

    let Some(job_block) = edit_body.get_blocks_mut("job").find(|block| is_labelled(block, &job.name))
    else {
        return job.hcl.clone();
    };

    strip_meta_structures(&mut job_block.body);
    job_block.body.push(meta_attribute(&merged));

    edit_body.to_string()
}

fn is_labelled(block: &Block, job_name: &str) -> bool {
    block
        .labels
        .first()
        .map(|label| label_text(label) == job_name)
        .unwrap_or(false)
}

fn label_text(label: &BlockLabel) -> String {
    label.to_string().trim_matches('"').to_string()
}

/// Drops any top-level `meta = { ... }` attribute or `meta { ... }` block
/// already present in `body`, so the merged replacement is the only one
/// left once it's pushed back on.
fn strip_meta_structures(body: &mut EditBody) {
    let remove: Vec<usize> = body
        .iter()
        .enumerate()
        .filter(|(_, structure)| {
            structure.as_attribute().map(|a| a.key.as_str() == "meta").unwrap_or(false)
                || structure.as_block().map(|b| b.ident.as_str() == "meta").unwrap_or(false)
        })
        .map(|(index, _)| index)
        .collect();
    for index in remove.into_iter().rev() {
        body.remove(index);
    }
}

/// Builds the merged `meta` attribute by parsing a small generated HCL
/// fragment, rather than constructing `hcl-edit`'s expression tree by hand.
fn meta_attribute(meta: &BTreeMap<String, String>) -> hcl_edit::structure::Attribute {
    let mut text = String::from("meta = {\n");
    for (key, value) in meta {
        text.push_str("  \"");
        text.push_str(key);
        text.push_str("\" = \"");
        text.push_str(&value.replace('\\', "\\\\").replace('"', "\\\""));
        text.push_str("\"\n");
    }
    text.push_str("}\n");

    let fragment: EditBody = text.parse().expect("generated meta HCL is well-formed");
    let structure = fragment
        .into_iter()
        .next()
        .expect("generated meta HCL has one structure");
    structure
        .as_attribute()
        .cloned()
        .expect("generated meta HCL is a single attribute")
}

/// Reads whatever `meta = { ... }` attribute or `meta { ... }` block
/// already exists directly under `job "name" { ... }`, attribute values
/// taking precedence over block values on a key collision.
fn existing_meta(body: &hcl::Body, job_name: &str) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    for block in body.blocks() {
        if block.identifier() != "job" {
            continue;
        }
        if block.labels().first().map(ToString::to_string).as_deref() != Some(job_name) {
            continue;
        }
        for meta_block in block.body().blocks().filter(|b| b.identifier() == "meta") {
            for attr in meta_block.body().attributes() {
                if let Some(value) = expr_as_string(attr.expr()) {
                    merged.insert(attr.key().to_string(), value);
                }
            }
        }
        for attr in block.body().attributes().filter(|a| a.key() == "meta") {
            if let Expression::Object(object) = attr.expr() {
                for (key, value) in object.iter() {
                    if let Some(value) = expr_as_string(value) {
                        merged.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    merged
}

fn expr_as_string(expr: &Expression) -> Option<String> {
    match expr {
        Expression::String(s) => Some(s.clone()),
        Expression::Number(n) => Some(n.to_string()),
        Expression::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> DeploymentIdentity {
        DeploymentIdentity::new("community", "web", "v1", None)
    }

    #[test]
    fn stamps_meta_into_job_with_no_existing_meta() {
        let job = Job {
            name: "web".to_string(),
            hcl: "job \"web\" {\n  type = \"service\"\n}\n".to_string(),
            ..Default::default()
        };
        let out = canonicalize_job_hcl(&job, &identity(), "web/templates/job", "1.0.0");
        assert!(out.contains("meta = {"));
        assert!(out.contains("\"pack.deployment_name\" = \"web@v1\""));
        assert!(out.contains("type = \"service\""));
    }

    #[test]
    fn attribute_meta_wins_over_block_meta_on_conflict() {
        let job = Job {
            name: "web".to_string(),
            hcl: "job \"web\" {\n  meta {\n    owner = \"legacy\"\n  }\n  meta = {\n    owner = \"current\"\n  }\n}\n".to_string(),
            ..Default::default()
        };
        let out = canonicalize_job_hcl(&job, &identity(), "web/templates/job", "1.0.0");
        assert!(out.contains("\"owner\" = \"current\""));
        assert!(!out.contains("legacy"));
    }

    #[test]
    fn existing_non_meta_attributes_and_blocks_survive_untouched() {
        let job = Job {
            name: "web".to_string(),
            hcl: "job \"web\" {\n  type = \"service\"\n\n  group \"app\" {\n    count = 1\n  }\n}\n".to_string(),
            ..Default::default()
        };
        let out = canonicalize_job_hcl(&job, &identity(), "web/templates/job", "1.0.0");
        assert!(out.contains("type = \"service\""));
        assert!(out.contains("group \"app\" {"));
        assert!(out.contains("count = 1"));
    }

    #[test]
    fn falls_back_to_original_on_parse_failure() {
        let job = Job {
            name: "web".to_string(),
            hcl: "job \"web\" { this is not valid hcl".to_string(),
            ..Default::default()
        };
        let out = canonicalize_job_hcl(&job, &identity(), "web/templates/job", "1.0.0");
        assert_eq!(out, job.hcl);
    }
}
