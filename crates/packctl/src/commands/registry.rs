use anyhow::Context;
use pack_registry::{AddOptions, DeleteOptions};

use crate::args::registry::{RegistryCommand, RegistrySubcommand};
use crate::commands::pack_context::open_cache;
use crate::config::Config;

/// `spec §4.1` `Add`/`Delete`/`List` surfaced as `registry {add,delete,list}`
/// (`spec §6`).
pub fn run(cmd: &RegistryCommand, config: &Config) -> anyhow::Result<()> {
    let cache = open_cache(config)?;

    match &cmd.command {
        RegistrySubcommand::Add(args) => {
            let mut opts = AddOptions::new(args.name.clone(), args.source.clone());
            if let Some(target) = &args.target {
                opts = opts.with_pack_name(target.clone());
            }
            if let Some(ref_name) = &args.ref_name {
                opts = opts.with_ref_name(ref_name.clone());
            }
            let registry = cache.add(opts).context("failed to add registry")?;
            println!(
                "added {} pack(s) to registry {} at ref {}",
                registry.packs.len(),
                registry.name,
                registry.ref_name
            );
        }
        RegistrySubcommand::Delete(args) => {
            let mut opts = DeleteOptions::new(args.name.clone());
            if let Some(target) = &args.target {
                opts = opts.with_pack_name(target.clone());
            }
            if let Some(ref_name) = &args.ref_name {
                opts = opts.with_ref_name(ref_name.clone());
            }
            cache.delete(opts).context("failed to delete from registry")?;
            println!("deleted from registry {}", args.name);
        }
        RegistrySubcommand::List => {
            for registry in cache.list().context("failed to list registries")? {
                println!(
                    "{}\t{}\t{} pack(s)",
                    registry.name,
                    registry.source,
                    registry.packs.len()
                );
            }
        }
    }
    Ok(())
}
