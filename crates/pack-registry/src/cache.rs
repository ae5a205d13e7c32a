use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use pack_diagnostics::{CacheError, CacheErrorKind, CacheResultExt};
use pack_git::{GitCredentials, GitFetcher};
use pack_utils::{LATEST_LOG_FILE, LATEST_REF, PACK_METADATA_FILE, REGISTRY_METADATA_FILE};
use secrecy::ExposeSecret;

use crate::metadata::load_pack_metadata;
use crate::options::{AddOptions, DeleteOptions, GetOptions};
use crate::registry::{PersistedRegistry, Registry, RegistryPackEntry};
use crate::slug::{UNPARSABLE_SOURCE, infer_source_slug};

/// Owns the on-disk hierarchy of registries and exposes `Add`/`Delete`/
/// `Get`/`List`/`Packs` (`spec §4.1`).
pub struct RegistryCache {
    root: Utf8PathBuf,
    fetcher: Arc<dyn GitFetcher>,
}

impl RegistryCache {
    pub fn new(root: Utf8PathBuf, fetcher: Arc<dyn GitFetcher>) -> Self {
        Self { root, fetcher }
    }

    /// Resolves the cache root the way `spec §6` describes (explicit path,
    /// else OS cache dir, else home dir), failing with
    /// [`CacheErrorKind::CachePathRequired`] when none can be determined.
    pub fn open(
        explicit_root: Option<&Utf8PathBuf>,
        fetcher: Arc<dyn GitFetcher>,
    ) -> Result<Self, CacheError> {
        let root = pack_utils::resolve_cache_root(explicit_root)
            .ok_or_else(|| CacheError::new(CacheErrorKind::CachePathRequired))?;
        Ok(Self::new(root, fetcher))
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// `spec §4.1` "Add".
    pub fn add(&self, opts: AddOptions) -> Result<Registry, CacheError> {
        if opts.source.is_empty() {
            return Err(CacheError::new(CacheErrorKind::RegistrySourceRequired)
                .with_context(|c| c.with_registry_name(&opts.registry_name)));
        }
        if Utf8Path::new(&opts.source).is_dir() {
            return self.add_vendor(opts);
        }
        let ref_name = opts.ref_name.clone().unwrap_or_else(|| LATEST_REF.to_string());

        let tmp_dir = self.root.join("packctl-tmp");
        if tmp_dir.exists() {
            fs_err::remove_dir_all(&tmp_dir)
                .cache_context(|c| c.with_cache_path(&self.root))?;
        }
        fs_err::create_dir_all(&tmp_dir).cache_context(|c| c.with_cache_path(&self.root))?;
        let _cleanup = TempCloneGuard(tmp_dir.clone());

        let credentials = GitCredentials {
            username: opts.username.clone(),
            password: opts
                .password
                .as_ref()
                .map(|secret| secret.expose_secret().to_string()),
        };
        let cloned = self
            .fetcher
            .clone_ref(&opts.source, &ref_name, &tmp_dir, &credentials)
            .map_err(|err| {
                CacheError::new(CacheErrorKind::Other(err.to_string())).with_context(|c| {
                    c.with_registry_name(&opts.registry_name)
                        .with_ref_name(&ref_name)
                })
            })?;

        let packs_root = cloned.root.join("packs");
        if !packs_root.is_dir() {
            return Err(
                CacheError::new(CacheErrorKind::Other(
                    "registry source has no packs/ directory".to_string(),
                ))
                .with_context(|c| c.with_registry_name(&opts.registry_name)),
            );
        }

        let mut candidates: Vec<String> = Vec::new();
        for entry in fs_err::read_dir(&packs_root)
            .cache_context(|c| c.with_cache_path(&packs_root))?
            .filter_map(Result::ok)
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == ".git" {
                continue;
            }
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            if let Some(filter) = &opts.pack_name
                && &name != filter
            {
                continue;
            }
            candidates.push(name);
        }

        if candidates.is_empty() {
            return Err(CacheError::new(CacheErrorKind::PackNotFound).with_context(|c| {
                let c = c.with_registry_name(&opts.registry_name);
                match &opts.pack_name {
                    Some(name) => c.with_pack_name(name.as_str()),
                    None => c,
                }
            }));
        }

        let registry_ref_root = self.root.join(&opts.registry_name).join(&ref_name);
        fs_err::create_dir_all(&registry_ref_root)
            .cache_context(|c| c.with_cache_path(&registry_ref_root))?;

        let mut pack_entries = Vec::with_capacity(candidates.len());
        for name in &candidates {
            let src = packs_root.join(name);
            let dest = registry_ref_root.join(format!("{name}@{ref_name}"));

            if ref_name != LATEST_REF && dest.is_dir() {
                // re-adding the same non-latest ref is a no-op (spec §3 invariant ii)
                let metadata = load_pack_metadata(&dest, name);
                pack_entries.push(RegistryPackEntry::new(ref_name.clone(), metadata));
                continue;
            }

            let log_path = registry_ref_root.join(LATEST_LOG_FILE);
            let log_backup = tmp_dir.join(format!("{name}.{LATEST_LOG_FILE}.bak"));
            if ref_name == LATEST_REF {
                if log_path.is_file() {
                    fs_err::copy(&log_path, &log_backup)
                        .cache_context(|c| c.with_cache_path(&log_path))?;
                }
                if dest.is_dir() {
                    fs_err::remove_dir_all(&dest).cache_context(|c| c.with_cache_path(&dest))?;
                }
            }

            copy_tree(&src, &dest).cache_context(|c| c.with_cache_path(&dest))?;

            if ref_name == LATEST_REF {
                if log_backup.is_file() && !log_path.is_file() {
                    fs_err::copy(&log_backup, &log_path)
                        .cache_context(|c| c.with_cache_path(&log_path))?;
                }
                append_latest_log(&log_path, &cloned.head_sha)
                    .cache_context(|c| c.with_cache_path(&log_path))?;
            }

            let metadata = load_pack_metadata(&dest, name);
            pack_entries.push(RegistryPackEntry::new(ref_name.clone(), metadata));
        }

        let registry = Registry {
            name: opts.registry_name.clone(),
            source: opts.source.clone(),
            local_ref: cloned.head_sha.clone(),
            ref_name: ref_name.clone(),
            packs: pack_entries,
        };

        write_registry_metadata(&registry_ref_root, &registry)?;

        Ok(registry)
    }

    /// `spec §3` "Vendor registry": a registry whose source is a local
    /// filesystem path. Copies instead of cloning, always lands at ref
    /// `latest`, and uses each pack's blake3 content hash as the "Ref"
    /// column a git SHA would otherwise occupy.
    fn add_vendor(&self, opts: AddOptions) -> Result<Registry, CacheError> {
        let source_root = Utf8PathBuf::from(&opts.source);
        let nested = source_root.join("packs");
        let packs_root = if nested.is_dir() { nested } else { source_root.clone() };

        let mut candidates: Vec<String> = Vec::new();
        for entry in fs_err::read_dir(&packs_root)
            .cache_context(|c| c.with_cache_path(&packs_root))?
            .filter_map(Result::ok)
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == ".git" {
                continue;
            }
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            if let Some(filter) = &opts.pack_name
                && &name != filter
            {
                continue;
            }
            candidates.push(name);
        }

        if candidates.is_empty() {
            return Err(CacheError::new(CacheErrorKind::PackNotFound).with_context(|c| {
                let c = c.with_registry_name(&opts.registry_name);
                match &opts.pack_name {
                    Some(name) => c.with_pack_name(name.as_str()),
                    None => c,
                }
            }));
        }

        let registry_ref_root = self.root.join(&opts.registry_name).join(LATEST_REF);
        fs_err::create_dir_all(&registry_ref_root)
            .cache_context(|c| c.with_cache_path(&registry_ref_root))?;

        let mut pack_entries = Vec::with_capacity(candidates.len());
        for name in &candidates {
            let src = packs_root.join(name);
            let hash = hash_pack_tree(&src).cache_context(|c| c.with_cache_path(&src))?;
            // the on-disk suffix stays `@latest`, matching every other ref's
            // `<pack>@<ref>` layout (`spec §3` "Registry" on-disk layout) so
            // the loader can still find it; the hash travels as this pack's
            // `Ref` metadata instead.
            let dest = registry_ref_root.join(format!("{name}@{LATEST_REF}"));
            if dest.is_dir() {
                fs_err::remove_dir_all(&dest).cache_context(|c| c.with_cache_path(&dest))?;
            }
            copy_tree(&src, &dest).cache_context(|c| c.with_cache_path(&dest))?;

            let log_path = registry_ref_root.join(LATEST_LOG_FILE);
            append_latest_log(&log_path, &hash).cache_context(|c| c.with_cache_path(&log_path))?;

            let metadata = load_pack_metadata(&dest, name);
            pack_entries.push(RegistryPackEntry::new(hash, metadata));
        }

        let registry = Registry {
            name: opts.registry_name.clone(),
            source: opts.source.clone(),
            local_ref: "vendor".to_string(),
            ref_name: LATEST_REF.to_string(),
            packs: pack_entries,
        };

        write_registry_metadata(&registry_ref_root, &registry)?;

        Ok(registry)
    }

    /// `spec §4.1` "Delete".
    pub fn delete(&self, opts: DeleteOptions) -> Result<(), CacheError> {
        let registry_root = self.root.join(&opts.registry_name);
        if !registry_root.is_dir() {
            return Err(CacheError::new(CacheErrorKind::RegistryNotFound)
                .with_context(|c| c.with_registry_name(&opts.registry_name)));
        }

        if opts.pack_name.is_none() && opts.ref_name.is_none() {
            fs_err::remove_dir_all(&registry_root)
                .cache_context(|c| c.with_registry_name(&opts.registry_name))?;
            return Ok(());
        }

        let ref_dirs: Vec<Utf8PathBuf> = match &opts.ref_name {
            Some(ref_name) => vec![registry_root.join(ref_name)],
            None => list_subdirs(&registry_root)?,
        };

        let mut removed = 0usize;
        for ref_dir in &ref_dirs {
            if !ref_dir.is_dir() {
                continue;
            }
            for entry in fs_err::read_dir(ref_dir)
                .cache_context(|c| c.with_cache_path(ref_dir))?
                .filter_map(Result::ok)
            {
                if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                    continue;
                }
                let dir_name = entry.file_name().to_string_lossy().into_owned();
                let Some((pack_name, ref_part)) = dir_name.rsplit_once('@') else {
                    continue;
                };
                if let Some(filter) = &opts.pack_name
                    && pack_name != filter
                {
                    continue;
                }
                if let Some(filter) = &opts.ref_name
                    && ref_part != filter.as_str()
                {
                    continue;
                }
                let path = entry.path();
                fs_err::remove_dir_all(&path)
                    .cache_context(|c| c.with_cache_path(&path))?;
                removed += 1;
            }
            if dir_is_empty(ref_dir)? {
                fs_err::remove_dir(ref_dir).cache_context(|c| c.with_cache_path(ref_dir))?;
            }
        }

        if removed == 0 {
            return Err(CacheError::new(CacheErrorKind::NoPacksMatched)
                .with_context(|c| c.with_registry_name(&opts.registry_name)));
        }

        if dir_is_empty(&registry_root)? {
            fs_err::remove_dir(&registry_root)
                .cache_context(|c| c.with_registry_name(&opts.registry_name))?;
        }

        Ok(())
    }

    /// `spec §4.1` "Get". `opts.ref_name: None` aggregates every cached ref.
    pub fn get(&self, opts: GetOptions) -> Result<Registry, CacheError> {
        let registry_root = self.root.join(&opts.registry_name);
        if !registry_root.is_dir() {
            return Err(CacheError::new(CacheErrorKind::RegistryNotFound)
                .with_context(|c| c.with_registry_name(&opts.registry_name)));
        }

        let ref_dirs: Vec<Utf8PathBuf> = match &opts.ref_name {
            Some(ref_name) => vec![registry_root.join(ref_name)],
            None => list_subdirs(&registry_root)?,
        };

        let mut packs = Vec::new();
        let mut local_ref = String::new();
        for ref_dir in &ref_dirs {
            if !ref_dir.is_dir() {
                continue;
            }
            let ref_name = ref_dir
                .file_name()
                .map(str::to_string)
                .unwrap_or_default();

            if local_ref.is_empty()
                && let Ok(persisted) = read_registry_metadata(ref_dir)
            {
                local_ref = persisted.local_ref;
            }

            for entry in fs_err::read_dir(ref_dir)
                .cache_context(|c| c.with_cache_path(ref_dir))?
                .filter_map(Result::ok)
            {
                if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                    continue;
                }
                let dir_name = entry.file_name().to_string_lossy().into_owned();
                let Some((pack_name, _ref_part)) = dir_name.rsplit_once('@') else {
                    continue;
                };
                let pack_dir = Utf8PathBuf::from_path_buf(entry.path())
                    .expect("cache paths are always utf8");
                let metadata = load_pack_metadata(&pack_dir, pack_name);
                packs.push(RegistryPackEntry::new(ref_name.clone(), metadata));
            }
        }

        let source = packs
            .iter()
            .map(RegistryPackEntry::metadata)
            .find(|metadata| metadata.is_valid() && !metadata.url.is_empty())
            .and_then(|metadata| infer_source_slug(&metadata.url))
            .unwrap_or_else(|| UNPARSABLE_SOURCE.to_string());

        Ok(Registry {
            name: opts.registry_name,
            source,
            local_ref,
            ref_name: opts.ref_name.unwrap_or_default(),
            packs,
        })
    }

    /// `spec §4.1` "List": every registry under the cache root, packs
    /// aggregated across all of their cached refs.
    pub fn list(&self) -> Result<Vec<Registry>, CacheError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut registries = Vec::new();
        for dir in list_subdirs(&self.root)? {
            let name = dir
                .file_name()
                .map(str::to_string)
                .unwrap_or_default();
            if name == "packctl-tmp" {
                continue;
            }
            registries.push(self.get(GetOptions::new(name))?);
        }
        Ok(registries)
    }

    /// `spec §4.1` "Packs": the flattened, aggregated pack list for one
    /// registry, used to resolve a pack reference for rendering.
    pub fn packs(&self, registry_name: &str) -> Result<Vec<RegistryPackEntry>, CacheError> {
        Ok(self.get(GetOptions::new(registry_name))?.packs)
    }
}

struct TempCloneGuard(Utf8PathBuf);

impl Drop for TempCloneGuard {
    fn drop(&mut self) {
        let _ = fs_err::remove_dir_all(&self.0);
    }
}

fn copy_tree(src: &Utf8Path, dest: &Utf8Path) -> std::io::Result<()> {
    fs_err::create_dir_all(dest)?;
    for entry in walkdir::WalkDir::new(src) {
        let entry = entry.map_err(std::io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(src.as_std_path())
            .expect("walkdir entries are rooted at src");
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

/// Content hash of a pack directory: every regular file's path (relative to
/// `dir`) and bytes, in sorted-path order so the hash is stable regardless
/// of directory-walk order (`spec §3` "Vendor registry").
fn hash_pack_tree(dir: &Utf8Path) -> std::io::Result<String> {
    let mut paths: Vec<Utf8PathBuf> = Vec::new();
    for entry in walkdir::WalkDir::new(dir) {
        let entry = entry.map_err(std::io::Error::other)?;
        if entry.file_type().is_file() {
            paths.push(
                Utf8PathBuf::from_path_buf(entry.path().to_path_buf())
                    .expect("cache paths are always utf8"),
            );
        }
    }
    paths.sort();

    let mut hasher = blake3::Hasher::new();
    for path in &paths {
        let rel = path.strip_prefix(dir).expect("walkdir entries are rooted at dir");
        hasher.update(rel.as_str().as_bytes());
        hasher.update(&fs_err::read(path)?);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

fn append_latest_log(log_path: &Utf8Path, sha: &str) -> std::io::Result<()> {
    use std::io::Write as _;
    let mut file = fs_err::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    writeln!(file, "SHA {sha} downloaded at UTC {now}")?;
    Ok(())
}

fn list_subdirs(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, CacheError> {
    let mut dirs = Vec::new();
    for entry in fs_err::read_dir(dir)
        .cache_context(|c| c.with_cache_path(dir))?
        .filter_map(Result::ok)
    {
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == ".git" {
            continue;
        }
        dirs.push(Utf8PathBuf::from_path_buf(entry.path()).expect("cache paths are always utf8"));
    }
    Ok(dirs)
}

fn dir_is_empty(dir: &Utf8Path) -> Result<bool, CacheError> {
    Ok(fs_err::read_dir(dir)
        .cache_context(|c| c.with_cache_path(dir))?
        .next()
        .is_none())
}

fn write_registry_metadata(ref_root: &Utf8Path, registry: &Registry) -> Result<(), CacheError> {
    let persisted = PersistedRegistry::from(registry);
    let json = serde_json::to_string_pretty(&persisted).cache_context(|c| c.with_cache_path(ref_root))?;
    fs_err::write(ref_root.join(REGISTRY_METADATA_FILE), json)
        .cache_context(|c| c.with_cache_path(ref_root))?;
    Ok(())
}

fn read_registry_metadata(ref_root: &Utf8Path) -> Result<PersistedRegistry, CacheError> {
    let contents = fs_err::read_to_string(ref_root.join(REGISTRY_METADATA_FILE))
        .cache_context(|c| c.with_cache_path(ref_root))?;
    serde_json::from_str(&contents).cache_context(|c| c.with_cache_path(ref_root))
}

/// `true` if `pack_dir` contains `metadata.hcl` (`spec §3` invariant i).
pub fn has_pack_metadata(pack_dir: &Utf8Path) -> bool {
    pack_dir.join(PACK_METADATA_FILE).is_file()
}
