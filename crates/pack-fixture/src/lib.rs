//! Test-only helpers that build throwaway pack directory trees on disk and a
//! [`pack_git::GitFetcher`] that serves them up without touching the
//! network, mirroring the teacher workspace's `fake_package` crate.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use pack_git::{ClonedRepo, GitCredentials, GitError, GitFetcher};

/// Builds a single pack directory: `metadata.hcl`, a root `variables.hcl`,
/// a `templates/` directory, and optionally nested dependency packs.
#[derive(Debug, Clone)]
pub struct PackFixture {
    pub name: String,
    pub description: String,
    pub version: String,
    variables_hcl: String,
    templates: BTreeMap<String, String>,
    output_template: Option<String>,
    dependencies: Vec<PackFixture>,
}

impl PackFixture {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: "a fixture pack".to_string(),
            version: "0.1.0".to_string(),
            variables_hcl: String::new(),
            templates: BTreeMap::new(),
            output_template: None,
            dependencies: Vec::new(),
        }
    }

    pub fn with_variables_hcl(mut self, hcl: impl Into<String>) -> Self {
        self.variables_hcl = hcl.into();
        self
    }

    pub fn with_template(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.templates.insert(name.into(), body.into());
        self
    }

    pub fn with_output_template(mut self, body: impl Into<String>) -> Self {
        self.output_template = Some(body.into());
        self
    }

    pub fn with_dependency(mut self, dep: PackFixture) -> Self {
        self.dependencies.push(dep);
        self
    }

    /// Writes this pack (and its dependencies, under `dependencies/<name>`)
    /// rooted at `dir`, creating `dir` itself.
    pub fn write_to(&self, dir: &Utf8Path) -> std::io::Result<()> {
        fs_err::create_dir_all(dir)?;
        fs_err::write(dir.join("metadata.hcl"), self.metadata_hcl())?;
        fs_err::write(dir.join("variables.hcl"), &self.variables_hcl)?;

        let templates_dir = dir.join("templates");
        fs_err::create_dir_all(&templates_dir)?;
        for (name, body) in &self.templates {
            fs_err::write(templates_dir.join(format!("{name}.tpl")), body)?;
        }
        if let Some(outputs) = &self.output_template {
            fs_err::write(templates_dir.join("outputs.tpl"), outputs)?;
        }

        if !self.dependencies.is_empty() {
            let deps_dir = dir.join("dependencies");
            fs_err::create_dir_all(&deps_dir)?;
            for dep in &self.dependencies {
                dep.write_to(&deps_dir.join(&dep.name))?;
            }
        }
        Ok(())
    }

    fn metadata_hcl(&self) -> String {
        format!(
            "app {{\n  url    = \"https://example.invalid/{name}\"\n  author = \"fixture\"\n}}\n\npack {{\n  name        = \"{name}\"\n  description = \"{description}\"\n  url         = \"https://example.invalid/{name}\"\n  version     = \"{version}\"\n}}\n",
            name = self.name,
            description = self.description,
            version = self.version,
        )
    }
}

/// Builds a fixture registry: a `packs/` directory containing one or more
/// [`PackFixture`] trees, suitable as the root of a fixture git clone.
#[derive(Debug, Clone, Default)]
pub struct RegistryFixture {
    packs: Vec<PackFixture>,
}

impl RegistryFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pack(mut self, pack: PackFixture) -> Self {
        self.packs.push(pack);
        self
    }

    pub fn write_to(&self, dir: &Utf8Path) -> std::io::Result<()> {
        let packs_dir = dir.join("packs");
        fs_err::create_dir_all(&packs_dir)?;
        for pack in &self.packs {
            pack.write_to(&packs_dir.join(&pack.name))?;
        }
        Ok(())
    }
}

/// A [`GitFetcher`] that copies a pre-built fixture tree into the
/// destination instead of cloning a remote, reporting a fixed SHA. Lets
/// registry-cache tests exercise `Add`/idempotence without a real git
/// remote (`spec §8` S1/S5).
pub struct FixtureGitFetcher {
    pub source_root: Utf8PathBuf,
    pub head_sha: String,
}

impl FixtureGitFetcher {
    pub fn new(source_root: impl Into<Utf8PathBuf>, head_sha: impl Into<String>) -> Self {
        Self {
            source_root: source_root.into(),
            head_sha: head_sha.into(),
        }
    }
}

impl GitFetcher for FixtureGitFetcher {
    fn clone_ref(
        &self,
        _url: &str,
        _ref_name: &str,
        dest: &Utf8Path,
        _credentials: &GitCredentials,
    ) -> Result<ClonedRepo, GitError> {
        copy_tree(&self.source_root, dest)?;
        Ok(ClonedRepo {
            root: dest.to_path_buf(),
            head_sha: self.head_sha.clone(),
        })
    }
}

fn copy_tree(src: &Utf8Path, dest: &Utf8Path) -> std::io::Result<()> {
    fs_err::create_dir_all(dest)?;
    for entry in walkdir::WalkDir::new(src) {
        let entry = entry.map_err(std::io::Error::other)?;
        let rel = entry.path().strip_prefix(src.as_std_path()).unwrap();
        let target = dest.as_std_path().join(rel);
        if entry.file_type().is_dir() {
            fs_err::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs_err::create_dir_all(parent)?;
            }
            fs_err::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_metadata_and_templates() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let pack = PackFixture::new("web")
            .with_variables_hcl("variable \"replicas\" {\n  type = number\n  default = 1\n}\n")
            .with_template("job", "job \"{{ my.pack.name }}\" {}");
        pack.write_to(&root).unwrap();
        assert!(root.join("metadata.hcl").exists());
        assert!(root.join("variables.hcl").exists());
        assert!(root.join("templates/job.tpl").exists());
    }

    #[test]
    fn fixture_fetcher_copies_and_reports_sha() {
        let src_dir = tempdir().unwrap();
        let src = Utf8PathBuf::from_path_buf(src_dir.path().to_path_buf()).unwrap();
        RegistryFixture::new()
            .with_pack(PackFixture::new("web"))
            .write_to(&src)
            .unwrap();

        let dest_dir = tempdir().unwrap();
        let dest = Utf8PathBuf::from_path_buf(dest_dir.path().to_path_buf()).unwrap();
        let fetcher = FixtureGitFetcher::new(src, "deadbeef");
        let cloned = fetcher
            .clone_ref("ignored", "latest", &dest, &GitCredentials::default())
            .unwrap();
        assert_eq!(cloned.head_sha, "deadbeef");
        assert!(dest.join("packs/web/metadata.hcl").exists());
    }
}
