use std::collections::BTreeMap;

/// Job meta keys stamped by the runner into every submitted job (`spec §3`
/// "Deployment identity", `§6` "Job meta keys").
pub const META_PACK_PATH: &str = "pack.path";
pub const META_PACK_NAME: &str = "pack.name";
pub const META_PACK_REGISTRY: &str = "pack.registry";
pub const META_PACK_DEPLOYMENT_NAME: &str = "pack.deployment_name";
pub const META_PACK_JOB: &str = "pack.job";
pub const META_PACK_VERSION: &str = "pack.version";

pub const PACK_META_KEYS: [&str; 6] = [
    META_PACK_PATH,
    META_PACK_NAME,
    META_PACK_REGISTRY,
    META_PACK_DEPLOYMENT_NAME,
    META_PACK_JOB,
    META_PACK_VERSION,
];

/// A logical deployment: `(registry, pack, deployment_name)` (`spec §3`
/// "Deployment identity"). `deployment_name` defaults to `<pack>@<ref>` when
/// the caller doesn't supply one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentIdentity {
    pub registry: String,
    pub pack: String,
    pub ref_name: String,
    pub deployment_name: String,
}

impl DeploymentIdentity {
    pub fn new(
        registry: impl Into<String>,
        pack: impl Into<String>,
        ref_name: impl Into<String>,
        deployment_name: Option<String>,
    ) -> Self {
        let pack = pack.into();
        let ref_name = ref_name.into();
        let deployment_name =
            deployment_name.unwrap_or_else(|| format!("{pack}@{ref_name}"));
        Self {
            registry: registry.into(),
            pack,
            ref_name,
            deployment_name,
        }
    }

    /// The six `pack.*` meta entries for a job named `job_name` at
    /// `pack_path`/`version`, the sole source of truth for later lookup
    /// (`spec §3`).
    pub fn meta(&self, pack_path: &str, job_name: &str, version: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            (META_PACK_PATH.to_string(), pack_path.to_string()),
            (META_PACK_NAME.to_string(), self.pack.clone()),
            (META_PACK_REGISTRY.to_string(), self.registry.clone()),
            (
                META_PACK_DEPLOYMENT_NAME.to_string(),
                self.deployment_name.clone(),
            ),
            (META_PACK_JOB.to_string(), job_name.to_string()),
            (META_PACK_VERSION.to_string(), version.to_string()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployment_name_defaults_to_pack_at_ref() {
        let id = DeploymentIdentity::new("community", "web", "v1", None);
        assert_eq!(id.deployment_name, "web@v1");
    }

    #[test]
    fn explicit_deployment_name_is_kept() {
        let id = DeploymentIdentity::new("community", "web", "v1", Some("prod".to_string()));
        assert_eq!(id.deployment_name, "prod");
    }

    #[test]
    fn meta_carries_all_six_keys() {
        let id = DeploymentIdentity::new("community", "web", "v1", None);
        let meta = id.meta("web/templates/job", "web", "1.0.0");
        for key in PACK_META_KEYS {
            assert!(meta.contains_key(key), "missing key {key}");
        }
        assert_eq!(meta[META_PACK_DEPLOYMENT_NAME], "web@v1");
    }
}
