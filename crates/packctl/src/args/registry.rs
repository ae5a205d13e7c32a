use clap::{Args, Subcommand};

/// `registry {add,delete,list}` (`spec §6`).
#[derive(Args, Debug)]
pub struct RegistryCommand {
    #[command(subcommand)]
    pub command: RegistrySubcommand,
}

#[derive(Subcommand, Debug)]
pub enum RegistrySubcommand {
    /// Clone a registry (or a single pack from one) into the local cache.
    Add(AddArgs),
    /// Remove a cached registry, or a pack/ref within one.
    Delete(DeleteArgs),
    /// List every cached registry and its packs.
    List,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Name the registry will be cached under.
    pub name: String,
    /// Git URL, or a local path for a vendored registry.
    pub source: String,
    /// Only cache this one pack from the registry.
    #[arg(long = "target")]
    pub target: Option<String>,
    /// Ref to clone; defaults to the source's default branch, cached as `latest`.
    #[arg(long = "ref")]
    pub ref_name: Option<String>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub name: String,
    #[arg(long = "target")]
    pub target: Option<String>,
    #[arg(long = "ref")]
    pub ref_name: Option<String>,
}
