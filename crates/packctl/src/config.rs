//! Layered configuration (`spec §2` ambient "Configuration"): CLI flags win
//! over environment variables, which win over a `packctl.toml` file, which
//! wins over built-in defaults. Mirrors the teacher's workspace/package
//! config layering, scaled down to this crate's one resolved settings
//! struct.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use secrecy::SecretString;
use serde::Deserialize;

use crate::args::ClusterArgs;

const DEFAULT_ADDRESS: &str = "http://127.0.0.1:4646";
const CONFIG_FILENAMES: [&str; 2] = ["packctl.toml", ".packctl.toml"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    cache_root: Option<Utf8PathBuf>,
    #[serde(default)]
    cluster: ClusterFileConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClusterFileConfig {
    #[serde(default)]
    address: Option<String>,
}

/// The fully resolved settings a command runs with.
#[derive(Debug, Clone)]
pub struct Config {
    pub cache_root: Option<Utf8PathBuf>,
    pub cluster_address: String,
    pub nomad_token: Option<SecretString>,
    pub consul_token: Option<SecretString>,
    pub consul_namespace: Option<String>,
    pub vault_token: Option<SecretString>,
    pub vault_namespace: Option<String>,
}

impl Config {
    pub fn load(
        explicit_config_path: Option<&Utf8Path>,
        cli_cache_root: Option<Utf8PathBuf>,
        cluster: &ClusterArgs,
    ) -> anyhow::Result<Self> {
        let file = load_file(explicit_config_path)?;

        let cache_root = cli_cache_root.or(file.cache_root);
        let cluster_address = cluster
            .address
            .clone()
            .or(file.cluster.address)
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

        Ok(Self {
            cache_root,
            cluster_address,
            nomad_token: cluster.token.clone().map(SecretString::from),
            consul_token: cluster.consul_token.clone().map(SecretString::from),
            consul_namespace: cluster.consul_namespace.clone(),
            vault_token: cluster.vault_token.clone().map(SecretString::from),
            vault_namespace: cluster.vault_namespace.clone(),
        })
    }
}

fn load_file(explicit: Option<&Utf8Path>) -> anyhow::Result<FileConfig> {
    if let Some(path) = explicit {
        let contents = fs_err::read_to_string(path)
            .with_context(|| format!("failed to read config file {path}"))?;
        return toml::from_str(&contents).with_context(|| format!("invalid config file {path}"));
    }
    for name in CONFIG_FILENAMES {
        if let Ok(contents) = fs_err::read_to_string(name) {
            return toml::from_str(&contents).with_context(|| format!("invalid config file {name}"));
        }
    }
    Ok(FileConfig::default())
}
