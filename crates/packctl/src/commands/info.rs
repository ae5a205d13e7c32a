use pack_core::Pack;

use crate::args::InfoArgs;
use crate::commands::pack_context::{load_pack, open_cache};
use crate::config::Config;

/// Supplemented behavior (`spec §4.4`/`§6` has no dedicated `info`, added
/// here as ambient operator tooling): print a pack's metadata, declared
/// variables, and dependency tree without resolving any overrides.
pub fn run(args: &InfoArgs, config: &Config) -> anyhow::Result<()> {
    let cache = open_cache(config)?;
    let reference = args.selector.pack_reference();
    let pack = load_pack(&cache, &reference)?;
    print_pack(&pack, 0);
    Ok(())
}

fn print_pack(pack: &Pack, depth: usize) {
    let indent = "  ".repeat(depth);
    println!("{indent}{} v{}", pack.metadata.name, pack.metadata.version);
    if !pack.metadata.description.is_empty() {
        println!("{indent}  {}", pack.metadata.description);
    }
    if !pack.metadata.author.is_empty() {
        println!("{indent}  author: {}", pack.metadata.author);
    }
    if !pack.metadata.url.is_empty() {
        println!("{indent}  url: {}", pack.metadata.url);
    }

    let contents = pack
        .root_variable_file
        .as_ref()
        .map(|f| f.contents.as_str())
        .unwrap_or_default();
    let (decls, _diags) = pack_core::variables::parse_variable_decls("variables.hcl", contents);
    for decl in &decls {
        let default = decl
            .default
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "(none)".to_string());
        println!("{indent}  variable {}: {} = {default}", decl.name, decl.ty);
        if let Some(desc) = &decl.description {
            println!("{indent}    {desc}");
        }
    }

    for dep in &pack.dependencies {
        print_pack(dep, depth + 1);
    }
}
