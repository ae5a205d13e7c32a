use serde::{Deserialize, Serialize};

use pack_utils::PACK_METADATA_FILE;

/// Literal version string a placeholder pack carries when its `metadata.hcl`
/// is missing or fails to parse (`spec §4.1` "Get").
pub const INVALID_PACK_VERSION: &str = "Invalid pack definition";

/// The subset of a pack's declared metadata the registry cache cares about.
/// The richer `Pack` model (dependencies, templates, variables) belongs to
/// the pack loader, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub author: String,
    pub version: String,
}

impl PackMetadata {
    pub fn is_valid(&self) -> bool {
        self.version != INVALID_PACK_VERSION
    }

    /// A placeholder for a pack directory that is missing `metadata.hcl` or
    /// whose metadata failed to parse, keyed only by its directory name.
    pub fn invalid(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            url: String::new(),
            author: String::new(),
            version: INVALID_PACK_VERSION.to_string(),
        }
    }
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
}

#[derive(Debug, Deserialize)]
struct MetadataHcl {
    #[serde(default)]
    app: Option<AppBlock>,
    pack: PackBlock,
}

/// Parses `metadata.hcl`, preferring the `pack.url`/`pack.author` fields and
/// falling back to the `app` block (`spec §4.2` step 2).
pub fn parse_metadata_hcl(contents: &str) -> Result<PackMetadata, hcl::Error> {
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
    })
}

/// Reads and parses `<pack_dir>/metadata.hcl`, returning an
/// [`PackMetadata::invalid`] placeholder (rather than an error) when the
/// file is missing or malformed, so a single broken pack never aborts
/// enumeration of the rest of the registry (`spec §4.1` "Get").
pub fn load_pack_metadata(pack_dir: &camino::Utf8Path, fallback_name: &str) -> PackMetadata {
    let metadata_path = pack_dir.join(PACK_METADATA_FILE);
    let Ok(contents) = fs_err::read_to_string(&metadata_path) else {
        return PackMetadata::invalid(fallback_name);
    };
    parse_metadata_hcl(&contents).unwrap_or_else(|err| {
        tracing::debug!(pack_dir = %pack_dir, %err, "pack metadata failed to parse");
        PackMetadata::invalid(fallback_name)
    })
}
