//! Small collaborators shared by the registry cache, pack loader and CLI:
//! cache-root resolution (`spec §6` "Persisted state"), identifier
//! validation (`spec §3` variable/pack naming), and a handful of path
//! helpers used to keep the on-disk layout consistent.

mod cache_root;
mod ident;

pub use cache_root::{cache_root, resolve_cache_root};
pub use ident::{is_valid_identifier, validate_identifier, IdentifierError};

/// The sentinel ref name meaning "whatever is currently latest" (`spec §3`).
pub const LATEST_REF: &str = "latest";

/// Append-only audit log filename written alongside each `latest`-ref pack
/// directory (`spec §3`/`§6`).
pub const LATEST_LOG_FILE: &str = "latest.log";

/// Filename every pack directory must contain at its root (`spec §4.2`).
pub const PACK_METADATA_FILE: &str = "metadata.hcl";

/// Per-registry-ref metadata file (`spec §3`/`§6`).
pub const REGISTRY_METADATA_FILE: &str = "metadata.json";
