use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

use crate::pack::{Pack, PackMetadata, PackType, RootVariableFile, TemplateFile};

const METADATA_FILE: &str = "metadata.hcl";
const VARIABLES_FILE: &str = "variables.hcl";
const TEMPLATES_DIR: &str = "templates";
const OUTPUTS_TEMPLATE: &str = "outputs";
const DEPENDENCIES_DIR: &str = "dependencies";

/// Everything that can go wrong loading a pack directory into a [`Pack`]
/// (`spec §4.2`).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{METADATA_FILE} not found in {0}")]
    FileNotFound(Utf8PathBuf),
    #[error("invalid pack name {0:?}")]
    InvalidPackName(String, #[source] pack_utils::IdentifierError),
    #[error("failed to parse {METADATA_FILE} in {path}: {source}")]
    InvalidMetadata {
        path: Utf8PathBuf,
        #[source]
        source: hcl::Error,
    },
    #[error("dependency cycle detected: {0}")]
    DependencyCycle(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Loads a pack directory into a [`Pack`] tree, recursing into
/// `dependencies/*` (`spec §4.2`). `ancestry` tracks the canonical paths of
/// packs already on the path from the root, to reject cyclic dependencies.
pub fn load_pack(dir: &Utf8Path) -> Result<Pack, LoadError> {
    let mut ancestry = Vec::new();
    load_pack_inner(dir, &mut ancestry)
}

fn load_pack_inner(dir: &Utf8Path, ancestry: &mut Vec<Utf8PathBuf>) -> Result<Pack, LoadError> {
    let canonical = canonicalize(dir)?;
    if ancestry.contains(&canonical) {
        let chain = ancestry
            .iter()
            .map(Utf8PathBuf::as_str)
            .collect::<Vec<_>>()
            .join(" -> ");
        return Err(LoadError::DependencyCycle(format!("{chain} -> {dir}")));
    }

    let metadata_path = dir.join(METADATA_FILE);
    if !metadata_path.is_file() {
        return Err(LoadError::FileNotFound(dir.to_path_buf()));
    }
    let metadata_contents =
        fs_err::read_to_string(&metadata_path).map_err(LoadError::Io)?;
    let metadata =
        parse_metadata(&metadata_contents).map_err(|source| LoadError::InvalidMetadata {
            path: metadata_path.clone(),
            source,
        })?;
    pack_utils::validate_identifier(&metadata.name)
        .map_err(|e| LoadError::InvalidPackName(metadata.name.clone(), e))?;

    let root_variable_file = load_root_variable_file(dir)?;
    let (template_files, output_template_file) = load_templates(dir)?;

    ancestry.push(canonical);
    let dependencies = load_dependencies(dir, ancestry)?;
    ancestry.pop();

    Ok(Pack {
        metadata,
        root_variable_file,
        template_files,
        output_template_file,
        dependencies,
    })
}

fn canonicalize(dir: &Utf8Path) -> Result<Utf8PathBuf, LoadError> {
    let canonical = fs_err::canonicalize(dir)?;
    Ok(Utf8PathBuf::from_path_buf(canonical).unwrap_or_else(|p| dir.to_path_buf().join(p)))
}

fn load_root_variable_file(dir: &Utf8Path) -> Result<Option<RootVariableFile>, LoadError> {
    let path = dir.join(VARIABLES_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let contents = fs_err::read_to_string(&path)?;
    Ok(Some(RootVariableFile { path, contents }))
}

/// Walks `templates/`, following symlinks once (`spec §4.2` step 4),
/// reading every `*.tpl`. `templates/outputs.tpl`, if present, becomes the
/// output template instead of a regular one.
fn load_templates(
    dir: &Utf8Path,
) -> Result<(Vec<TemplateFile>, Option<TemplateFile>), LoadError> {
    let templates_dir = dir.join(TEMPLATES_DIR);
    if !templates_dir.is_dir() {
        return Ok((Vec::new(), None));
    }

    let mut templates = Vec::new();
    let mut output_template = None;
    for entry in walkdir::WalkDir::new(&templates_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("tpl") {
            continue;
        }
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let contents = fs_err::read_to_string(path)?;
        let template = TemplateFile {
            name: stem.clone(),
            contents,
        };
        if stem == OUTPUTS_TEMPLATE {
            output_template = Some(template);
        } else {
            templates.push(template);
        }
    }
    templates.sort_by(|a, b| a.name.cmp(&b.name));
    Ok((templates, output_template))
}

fn load_dependencies(
    dir: &Utf8Path,
    ancestry: &mut Vec<Utf8PathBuf>,
) -> Result<Vec<Pack>, LoadError> {
    let deps_dir = dir.join(DEPENDENCIES_DIR);
    if !deps_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names: Vec<_> = fs_err::read_dir(&deps_dir)?
        .filter_map(Result::ok)
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    let mut dependencies = Vec::with_capacity(names.len());
    for name in names {
        dependencies.push(load_pack_inner(&deps_dir.join(&name), ancestry)?);
    }
    Ok(dependencies)
}

#[derive(Debug, Deserialize)]
struct AppBlock {
    #[serde(default)]
    url: String,
    #[serde(default)]
    author: String,
}

#[derive(Debug, Deserialize)]
struct PackBlock {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    author: String,
    version: String,
    #[serde(default, rename = "type")]
    pack_type: String,
}

#[derive(Debug, Deserialize)]
struct MetadataHcl {
    #[serde(default)]
    app: Option<AppBlock>,
    pack: PackBlock,
}

fn parse_metadata(contents: &str) -> Result<PackMetadata, hcl::Error> {
    let parsed: MetadataHcl = hcl::from_str(contents)?;
    let app = parsed.app.unwrap_or(AppBlock {
        url: String::new(),
        author: String::new(),
    });
    let url = if parsed.pack.url.is_empty() {
        app.url
    } else {
        parsed.pack.url
    };
    let author = if parsed.pack.author.is_empty() {
        app.author
    } else {
        parsed.pack.author
    };
    Ok(PackMetadata {
        name: parsed.pack.name,
        description: parsed.pack.description,
        url,
        author,
        version: parsed.pack.version,
        pack_type: PackType::parse(&parsed.pack.pack_type),
    })
}
