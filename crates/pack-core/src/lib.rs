//! Pack loader, variable parser/merger, renderer, pack manager, and
//! job-flavor runner (`spec §4.2`-`§4.5`).

pub mod loader;
pub mod manager;
pub mod meta;
pub mod pack;
pub mod render;
pub mod runner;
pub mod variables;

pub use loader::{LoadError, load_pack};
pub use manager::{ManagerError, PackManager, PackReference, ProcessedPack, process_pack};
pub use meta::{DeploymentIdentity, PACK_META_KEYS};
pub use pack::{Pack, PackMetadata, PackType, PackValidationError, RootVariableFile, TemplateFile};
pub use render::{RenderError, Renderer, RenderedArtifact};
pub use runner::{
    AdapterError, ClusterAdapter, Conflict, DeployOutcome, DeployedJob, DeregisterOpts,
    DeregisterOutcome, Job, JobDiff, JobStub, PlanAnnotations, PlanOpts, PlanOutcome, PlanReport,
    PreemptedAlloc, RegisterOpts, RegisterOutcome, ResolvedJob, RunError, Runner, StopError,
};
