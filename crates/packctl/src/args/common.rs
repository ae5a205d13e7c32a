use anyhow::Context;
use camino::Utf8PathBuf;
use pack_core::{DeploymentIdentity, PackReference};

/// A registry alias used when a pack reference doesn't name one explicitly
/// (`spec §6` CLI surface takes `<pack>`, not `<registry>/<pack>`, so
/// something has to be picked).
pub const DEFAULT_REGISTRY: &str = "default";

/// Selects a pack: `<pack>` or `<registry>/<pack>`, at a ref, optionally
/// under an explicit deployment name (`spec §6`).
#[derive(clap::Args, Debug, Clone)]
pub struct PackSelector {
    /// Pack reference, e.g. `nomad_example` or `community/nomad_example`.
    pub pack: String,

    /// Registry the pack belongs to; overrides any `registry/` prefix on `pack`.
    #[arg(long)]
    pub registry: Option<String>,

    /// Registry ref to resolve against; defaults to the cached `latest`.
    #[arg(long = "ref")]
    pub ref_name: Option<String>,

    /// Deployment name; defaults to `<pack>@<ref>`.
    #[arg(long)]
    pub name: Option<String>,
}

impl PackSelector {
    pub fn registry_and_pack(&self) -> (String, String) {
        if let Some(registry) = &self.registry {
            return (registry.clone(), self.pack.clone());
        }
        match self.pack.split_once('/') {
            Some((registry, pack)) => (registry.to_string(), pack.to_string()),
            None => (DEFAULT_REGISTRY.to_string(), self.pack.clone()),
        }
    }

    pub fn pack_reference(&self) -> PackReference {
        let (registry, pack) = self.registry_and_pack();
        PackReference::new(registry, pack, self.ref_name.clone())
    }

    pub fn deployment_name(&self) -> Option<String> {
        self.name.clone()
    }

    /// The identity this selector resolves to, same rule the runner itself
    /// uses to default an unset deployment name (`spec §3` "Deployment
    /// identity").
    pub fn deployment_identity(&self) -> DeploymentIdentity {
        let reference = self.pack_reference();
        DeploymentIdentity::new(
            reference.registry,
            reference.pack,
            reference.ref_name,
            self.deployment_name(),
        )
    }
}

/// `--var`/`--var-file` overrides, applied in the strict precedence order
/// `spec §4.3` defines (files in order, then CLI pairs, CLI always last).
#[derive(clap::Args, Debug, Clone, Default)]
pub struct VarArgs {
    /// A `name=value` (or `pack.name=value`) override; repeatable.
    #[arg(long = "var", value_name = "name=value")]
    pub var: Vec<String>,

    /// An HCL override file; repeatable, applied in the order given.
    #[arg(long = "var-file", value_name = "path")]
    pub var_file: Vec<Utf8PathBuf>,
}

impl VarArgs {
    pub fn override_files(&self) -> anyhow::Result<Vec<pack_core::variables::OverrideFile>> {
        self.var_file
            .iter()
            .map(|path| {
                let contents = fs_err::read_to_string(path)
                    .with_context(|| format!("failed to read var file {path}"))?;
                // OverrideFile wants a 'static filename for diagnostics; the
                // process is short-lived so leaking the handful of paths
                // supplied on the command line is harmless.
                let filename: &'static str = Box::leak(path.to_string().into_boxed_str());
                Ok(pack_core::variables::OverrideFile { filename, contents })
            })
            .collect()
    }
}

/// Cluster connection flags shared by `run`/`plan`/`stop`/`destroy`/`status`
/// (`spec §6` "External interfaces").
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ClusterArgs {
    /// Cluster API address.
    #[arg(long, env = "NOMAD_ADDR")]
    pub address: Option<String>,

    /// Cluster API token.
    #[arg(long, env = "NOMAD_TOKEN")]
    pub token: Option<String>,

    /// Consul ACL token, passed through for job registration; accepted for
    /// CLI parity, not consumed by the narrow cluster adapter contract.
    #[arg(long = "consul-token", env = "CONSUL_HTTP_TOKEN")]
    pub consul_token: Option<String>,

    #[arg(long = "consul-namespace")]
    pub consul_namespace: Option<String>,

    /// Vault token, passed through for job registration; same caveat as
    /// `consul_token`.
    #[arg(long = "vault-token", env = "VAULT_TOKEN")]
    pub vault_token: Option<String>,

    #[arg(long = "vault-namespace")]
    pub vault_namespace: Option<String>,
}

/// `run`/`rollback` flags (`spec §6`).
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunFlags {
    /// Reject the deploy unless the job's current modify index matches.
    /// `0` (the default) registers unconditionally.
    #[arg(long = "check-index", default_value_t = 0)]
    pub check_index: u64,

    #[arg(long = "policy-override")]
    pub policy_override: bool,

    #[arg(long = "preserve-counts")]
    pub preserve_counts: bool,

    /// Accepted for CLI parity with legacy HCLv1 packs; this renderer only
    /// ever produces HCLv2 job specs.
    #[arg(long = "hcl1")]
    pub hcl1: bool,

    /// Roll back every already-deployed job in this run if a later one fails.
    #[arg(long, hide = true)]
    pub rollback: bool,
}

/// `plan` flags (`spec §6`).
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PlanFlags {
    #[arg(long)]
    pub diff: bool,

    #[arg(long)]
    pub verbose: bool,

    #[arg(long = "policy-override")]
    pub policy_override: bool,

    #[arg(long = "exit-code-no-changes", default_value_t = 0)]
    pub exit_code_no_changes: u8,

    #[arg(long = "exit-code-makes-changes", default_value_t = 1)]
    pub exit_code_makes_changes: u8,

    #[arg(long = "exit-code-error", default_value_t = 255)]
    pub exit_code_error: u8,
}
