use serde::{Deserialize, Serialize};

use crate::metadata::PackMetadata;

/// One entry in a [`Registry`]'s pack list: the ref it was fetched at and
/// its (possibly placeholder) metadata (`spec §3` "Registry").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryPackEntry {
    #[serde(rename = "Ref")]
    pub ref_name: String,
    #[serde(rename = "Pack")]
    pub pack: PersistedPack,
}

impl RegistryPackEntry {
    pub fn new(ref_name: impl Into<String>, metadata: PackMetadata) -> Self {
        Self {
            ref_name: ref_name.into(),
            pack: PersistedPack { metadata },
        }
    }

    pub fn metadata(&self) -> &PackMetadata {
        &self.pack.metadata
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedPack {
    #[serde(rename = "Metadata")]
    pub metadata: PackMetadata,
}

/// An in-memory view of a registry, built from whatever is currently on
/// disk under `<cache_root>/<name>` (`spec §3` "Registry").
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    pub name: String,
    pub source: String,
    pub local_ref: String,
    pub ref_name: String,
    pub packs: Vec<RegistryPackEntry>,
}

/// On-disk shape of `<cache_root>/<registry>/<ref>/metadata.json`
/// (`spec §6` "Persisted state").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedRegistry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Ref")]
    pub ref_name: String,
    #[serde(rename = "LocalRef")]
    pub local_ref: String,
    #[serde(rename = "Packs")]
    pub packs: Vec<RegistryPackEntry>,
}

impl From<&Registry> for PersistedRegistry {
    fn from(registry: &Registry) -> Self {
        Self {
            name: registry.name.clone(),
            source: registry.source.clone(),
            ref_name: registry.ref_name.clone(),
            local_ref: registry.local_ref.clone(),
            packs: registry.packs.clone(),
        }
    }
}
