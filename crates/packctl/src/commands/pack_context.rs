//! Shared load → render plumbing used by `run`/`plan`/`render`/`info`
//! (`spec §4.4`, `§2` data flow "CLI → Cache resolves pack location → Pack
//! Loader").

use std::sync::Arc;

use anyhow::Context;
use pack_core::{Pack, PackManager, PackReference, ProcessedPack, process_pack};
use pack_registry::RegistryCache;

use crate::args::{PackSelector, VarArgs};
use crate::config::Config;

pub fn open_cache(config: &Config) -> anyhow::Result<RegistryCache> {
    let fetcher: Arc<dyn pack_git::GitFetcher> = Arc::new(pack_git::Git2Fetcher);
    RegistryCache::open(config.cache_root.as_ref(), fetcher).context("failed to open the registry cache")
}

pub fn load_pack(cache: &RegistryCache, reference: &PackReference) -> anyhow::Result<Pack> {
    let manager = PackManager::new(cache);
    let pack = manager.load(reference).with_context(|| {
        format!(
            "failed to load pack {}/{}@{}",
            reference.registry, reference.pack, reference.ref_name
        )
    })?;
    pack.validate().context("pack failed validation")?;
    Ok(pack)
}

pub fn render_pack(pack: &Pack, vars: &VarArgs) -> anyhow::Result<ProcessedPack> {
    let override_files = vars.override_files()?;
    process_pack(pack, &override_files, &vars.var).context("failed to render pack templates")
}

/// Resolves a selector against the cache, loads the pack, and renders it —
/// the common prelude for every command that needs rendered output.
pub fn resolve_and_render(
    selector: &PackSelector,
    vars: &VarArgs,
    config: &Config,
) -> anyhow::Result<(PackReference, Pack, ProcessedPack)> {
    let cache = open_cache(config)?;
    let reference = selector.pack_reference();
    let pack = load_pack(&cache, &reference)?;
    let processed = render_pack(&pack, vars)?;
    Ok((reference, pack, processed))
}
