use url::Url;

/// Sentinel `Registry.source` used when no valid pack was found to infer a
/// source from (`spec §4.1` "Get").
pub const UNPARSABLE_SOURCE: &str = "not parsable - registry contains no valid packs";

/// Infers a registry's source slug from a pack's declared URL: hostname +
/// path, with a trailing `/packs/*` segment and a trailing `.git` stripped
/// (`spec §4.1` "Get"). Conservative: returns `None` rather than guessing
/// when the URL doesn't parse.
pub fn infer_source_slug(declared_url: &str) -> Option<String> {
    if declared_url.is_empty() {
        return None;
    }
    let parsed = Url::parse(declared_url).ok()?;
    let host = parsed.host_str()?;
    let mut path = parsed.path().to_string();
    if let Some(idx) = path.find("/packs/") {
        path.truncate(idx);
    }
    if let Some(stripped) = path.strip_suffix(".git") {
        path = stripped.to_string();
    }
    if path.len() > 1 {
        if let Some(stripped) = path.strip_suffix('/') {
            path = stripped.to_string();
        }
    }
    Some(format!("{host}{path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_packs_subdir_and_git_suffix() {
        let slug =
            infer_source_slug("https://github.com/hashicorp/nomad-pack-registry.git//packs/web")
                .unwrap();
        assert_eq!(slug, "github.com/hashicorp/nomad-pack-registry");
    }

    #[test]
    fn handles_plain_repo_url() {
        let slug = infer_source_slug("https://example.invalid/org/repo").unwrap();
        assert_eq!(slug, "example.invalid/org/repo");
    }

    #[test]
    fn unparsable_url_returns_none() {
        assert!(infer_source_slug("not a url").is_none());
        assert!(infer_source_slug("").is_none());
    }
}
