use camino::Utf8PathBuf;

/// Resolves the registry cache root the way `spec §6` describes: an
/// explicit path wins, otherwise the OS user-cache directory, otherwise the
/// user's home directory, each joined with `packctl/registries`.
///
/// Returns `None` only when neither a cache dir nor a home dir can be
/// determined for the current user (e.g. a minimal container with no `HOME`
/// set) — callers map that to `CacheErrorKind::CachePathRequired`.
pub fn resolve_cache_root(explicit: Option<&Utf8PathBuf>) -> Option<Utf8PathBuf> {
    if let Some(path) = explicit {
        return Some(path.clone());
    }
    cache_root()
}

/// The default cache root, without considering an explicit override.
pub fn cache_root() -> Option<Utf8PathBuf> {
    if let Some(dir) = dirs::cache_dir() {
        if let Ok(dir) = Utf8PathBuf::from_path_buf(dir) {
            return Some(dir.join("packctl").join("registries"));
        }
    }
    if let Some(dir) = dirs::home_dir() {
        if let Ok(dir) = Utf8PathBuf::from_path_buf(dir) {
            return Some(dir.join(".packctl").join("registries"));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let explicit = Utf8PathBuf::from("/tmp/my-cache");
        assert_eq!(
            resolve_cache_root(Some(&explicit)),
            Some(Utf8PathBuf::from("/tmp/my-cache"))
        );
    }

    #[test]
    fn falls_back_to_a_default_when_unset() {
        // One of the two fallbacks should resolve on any machine running
        // the test suite.
        assert!(resolve_cache_root(None).is_some());
    }
}
