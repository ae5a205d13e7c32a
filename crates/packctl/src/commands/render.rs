use anyhow::{Context, bail};
use camino::Utf8Path;
use pack_core::ProcessedPack;

use crate::args::RenderArgs;
use crate::commands::pack_context::resolve_and_render;
use crate::config::Config;

/// `spec §4.4`: render a pack without touching the cluster, to stdout or a
/// directory.
pub fn run(args: &RenderArgs, config: &Config) -> anyhow::Result<()> {
    let (_, _pack, processed) = resolve_and_render(&args.selector, &args.vars, config)?;

    match &args.output_dir {
        None => print_to_stdout(&processed),
        Some(dir) => write_to_dir(dir, &processed, args.overwrite)?,
    }
    Ok(())
}

fn print_to_stdout(processed: &ProcessedPack) {
    for (name, contents) in processed.templates.iter() {
        println!("# {name}\n{contents}");
    }
    if let Some(output) = &processed.output {
        println!("# outputs\n{output}");
    }
}

fn write_to_dir(dir: &Utf8Path, processed: &ProcessedPack, overwrite: bool) -> anyhow::Result<()> {
    fs_err::create_dir_all(dir).with_context(|| format!("failed to create {dir}"))?;
    for (name, contents) in processed.templates.iter() {
        write_one(dir, &name.replace('/', "_"), contents, overwrite)?;
    }
    if let Some(output) = &processed.output {
        write_one(dir, "outputs", output, overwrite)?;
    }
    Ok(())
}

fn write_one(dir: &Utf8Path, file_name: &str, contents: &str, overwrite: bool) -> anyhow::Result<()> {
    let path = dir.join(file_name);
    if path.exists() && !overwrite {
        bail!("destination file exists and overwrite is unset: {path}");
    }
    fs_err::write(&path, contents).with_context(|| format!("failed to write {path}"))
}
