use anyhow::{Context, bail};

use crate::args::InitArgs;

/// `spec §4.2`/`§6`: scaffold a new pack directory with a `metadata.hcl`, an
/// empty `variables.hcl`, and one starter template, the minimum shape
/// [`pack_core::loader::load_pack`] accepts.
pub fn run(args: &InitArgs) -> anyhow::Result<()> {
    let root = args.directory.join(&args.name);
    if root.exists() {
        bail!("{root} already exists");
    }

    let templates_dir = root.join("templates");
    fs_err::create_dir_all(&templates_dir)
        .with_context(|| format!("failed to create {templates_dir}"))?;

    fs_err::write(root.join("metadata.hcl"), metadata_hcl(&args.name))
        .with_context(|| format!("failed to write {}/metadata.hcl", root))?;
    fs_err::write(root.join("variables.hcl"), "")
        .with_context(|| format!("failed to write {}/variables.hcl", root))?;

    let template_path = templates_dir.join(format!("{}.tpl", args.name));
    fs_err::write(&template_path, starter_template(&args.name))
        .with_context(|| format!("failed to write {template_path}"))?;

    println!("scaffolded pack {} at {root}", args.name);
    Ok(())
}

fn metadata_hcl(name: &str) -> String {
    format!(
        "app {{\n  url    = \"\"\n  author = \"\"\n}}\n\npack {{\n  name        = \"{name}\"\n  description = \"\"\n  version     = \"0.1.0\"\n}}\n"
    )
}

fn starter_template(name: &str) -> String {
    format!(
        "job \"{{{{ my.job_name | default(value=\"{name}\") }}}}\" {{\n  datacenters = [\"dc1\"]\n\n  group \"{name}\" {{\n    task \"{name}\" {{\n      driver = \"docker\"\n\n      config {{\n        image = \"{{{{ my.image | default(value=\"\") }}}}\"\n      }}\n    }}\n  }}\n}}\n"
    )
}
