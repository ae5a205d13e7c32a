//! Drives a single [`Pack`] through load → merge → render and exposes the
//! parent/dependent renders (`spec §4.4` "Pack Manager / Renderer").

use camino::Utf8PathBuf;
use pack_diagnostics::Diagnostics;
use pack_registry::RegistryCache;

use crate::loader::{self, LoadError};
use crate::pack::Pack;
use crate::render::{RenderError, Renderer, RenderedArtifact};
use crate::variables::{self, Declarations, OverrideFile, VariableTree};

/// A `(registry, pack, ref)` selector for a pack on disk (`spec §3`
/// "Registry" on-disk layout `<cache_root>/<registry>/<ref>/<pack>@<ref>/`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackReference {
    pub registry: String,
    pub pack: String,
    pub ref_name: String,
}

impl PackReference {
    pub fn new(registry: impl Into<String>, pack: impl Into<String>, ref_name: Option<String>) -> Self {
        Self {
            registry: registry.into(),
            pack: pack.into(),
            ref_name: ref_name.unwrap_or_else(|| pack_utils::LATEST_REF.to_string()),
        }
    }
}

/// Failures from resolving, loading, or processing a pack through the
/// manager.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("pack {pack:?} not found in registry {registry:?} at ref {ref_name:?}")]
    PackNotFound {
        registry: String,
        pack: String,
        ref_name: String,
    },
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("variable resolution failed:\n{0}")]
    Variables(Diagnostics),
}

/// Resolves pack references against a [`RegistryCache`] and loads them
/// (`spec §2` data flow: "CLI → Cache resolves pack location → Pack
/// Loader").
pub struct PackManager<'a> {
    cache: &'a RegistryCache,
}

impl<'a> PackManager<'a> {
    pub fn new(cache: &'a RegistryCache) -> Self {
        Self { cache }
    }

    /// The on-disk directory a reference resolves to, independent of whether
    /// anything actually lives there yet.
    pub fn resolve_pack_dir(&self, reference: &PackReference) -> Utf8PathBuf {
        self.cache
            .root()
            .join(&reference.registry)
            .join(&reference.ref_name)
            .join(format!("{}@{}", reference.pack, reference.ref_name))
    }

    /// Loads the pack (and its transitive dependencies) a reference points
    /// at.
    pub fn load(&self, reference: &PackReference) -> Result<Pack, ManagerError> {
        let dir = self.resolve_pack_dir(reference);
        if !dir.is_dir() {
            return Err(ManagerError::PackNotFound {
                registry: reference.registry.clone(),
                pack: reference.pack.clone(),
                ref_name: reference.ref_name.clone(),
            });
        }
        Ok(loader::load_pack(&dir)?)
    }
}

/// The fully processed result of driving a pack through load → merge →
/// render (`spec §4.4`): declared variables, resolved values, and both
/// render partitions.
pub struct ProcessedPack {
    pub declarations: Declarations,
    pub variables: VariableTree,
    pub templates: RenderedArtifact,
    pub output: Option<String>,
}

/// Runs `spec §4.4`'s algorithm (steps 1-6) against an already-loaded pack
/// tree, independent of where the pack came from — used directly by tests
/// and by [`PackManager::load`] callers alike.
pub fn process_pack(
    pack: &Pack,
    override_files: &[OverrideFile],
    cli_vars: &[String],
) -> Result<ProcessedPack, ManagerError> {
    let (declarations, diags) = variables::collect_declarations(pack);
    if diags.has_errors() {
        return Err(ManagerError::Variables(diags));
    }

    let variable_tree =
        variables::resolve_variables(&declarations, &pack.metadata.name, override_files, cli_vars)
            .map_err(ManagerError::Variables)?;

    let renderer = Renderer::new(pack, &variable_tree);
    let templates = renderer.process_templates()?;
    let output = renderer.process_output_template()?;

    Ok(ProcessedPack {
        declarations,
        variables: variable_tree,
        templates,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pack_fixture::{FixtureGitFetcher, PackFixture, RegistryFixture};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn resolve_pack_dir_matches_cache_layout() {
        let cache_dir = tempdir().unwrap();
        let cache_root =
            camino::Utf8PathBuf::from_path_buf(cache_dir.path().to_path_buf()).unwrap();
        let fetcher = Arc::new(FixtureGitFetcher::new(cache_root.clone(), "deadbeef"));
        let cache = RegistryCache::new(cache_root.clone(), fetcher);
        let manager = PackManager::new(&cache);
        let reference = PackReference::new("community", "web", Some("v1".to_string()));
        assert_eq!(
            manager.resolve_pack_dir(&reference),
            cache_root.join("community").join("v1").join("web@v1")
        );
    }

    #[test]
    fn load_resolves_through_the_registry_cache() {
        let source_dir = tempdir().unwrap();
        let source_root =
            camino::Utf8PathBuf::from_path_buf(source_dir.path().to_path_buf()).unwrap();
        RegistryFixture::new()
            .with_pack(PackFixture::new("web").with_variables_hcl(
                "variable \"replicas\" {\n  type = number\n  default = 1\n}\n",
            ))
            .write_to(&source_root)
            .unwrap();

        let cache_dir = tempdir().unwrap();
        let cache_root =
            camino::Utf8PathBuf::from_path_buf(cache_dir.path().to_path_buf()).unwrap();
        let fetcher = Arc::new(FixtureGitFetcher::new(source_root, "deadbeef"));
        let cache = RegistryCache::new(cache_root, fetcher);
        cache
            .add(pack_registry::AddOptions::new(
                "community",
                "https://example.invalid/registry",
            ))
            .unwrap();

        let manager = PackManager::new(&cache);
        let reference = PackReference::new("community", "web", None);
        let pack = manager.load(&reference).unwrap();
        assert_eq!(pack.metadata.name, "web");
    }

    #[test]
    fn load_reports_missing_pack() {
        let cache_dir = tempdir().unwrap();
        let cache_root =
            camino::Utf8PathBuf::from_path_buf(cache_dir.path().to_path_buf()).unwrap();
        let fetcher = Arc::new(FixtureGitFetcher::new(cache_root.clone(), "deadbeef"));
        let cache = RegistryCache::new(cache_root, fetcher);
        let manager = PackManager::new(&cache);
        let reference = PackReference::new("community", "missing", None);
        let err = manager.load(&reference).unwrap_err();
        assert!(matches!(err, ManagerError::PackNotFound { .. }));
    }

    #[test]
    fn process_pack_renders_with_resolved_variables() {
        let pack = crate::pack::Pack {
            metadata: crate::pack::PackMetadata {
                name: "web".to_string(),
                pack_type: crate::pack::PackType::Job,
                version: "1.0.0".to_string(),
                ..Default::default()
            },
            root_variable_file: Some(crate::pack::RootVariableFile {
                path: "variables.hcl".into(),
                contents: "variable \"replicas\" {\n  type = number\n  default = 1\n}\n"
                    .to_string(),
            }),
            template_files: vec![crate::pack::TemplateFile {
                name: "job".to_string(),
                contents: "job \"{{ web.replicas }}\" {}".to_string(),
            }],
            output_template_file: None,
            dependencies: vec![],
        };
        let cli_vars = vec!["replicas=7".to_string()];
        let processed = process_pack(&pack, &[], &cli_vars).unwrap();
        assert_eq!(
            processed.templates.parent_renders.get("web/templates/job"),
            Some(&"job \"7\" {}".to_string())
        );
    }
}
