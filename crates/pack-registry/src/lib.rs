//! Content-addressed local store of registries at specific git refs
//! (`spec §4.1`): atomic `Add`/`Delete`, a `latest`-ref replacement
//! discipline with an append-only audit log, and metadata persistence.

mod cache;
mod metadata;
mod options;
mod registry;
mod slug;

pub use cache::{RegistryCache, has_pack_metadata};
pub use metadata::{INVALID_PACK_VERSION, PackMetadata, load_pack_metadata, parse_metadata_hcl};
pub use options::{AddOptions, DeleteOptions, GetOptions};
pub use registry::{PersistedPack, PersistedRegistry, Registry, RegistryPackEntry};
pub use slug::{UNPARSABLE_SOURCE, infer_source_slug};

pub use pack_diagnostics::{CacheError, CacheErrorKind};
