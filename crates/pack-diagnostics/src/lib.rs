//! Structured errors and HCL diagnostics shared by every crate in the
//! workspace.
//!
//! Two families live here:
//!
//! - [`CacheError`]: leaf errors from the registry cache and pack loader,
//!   carrying the prefix-tagged context fields (`cache_path`,
//!   `registry_name`, `ref_name`, `pack_name`) so mid-layers can append more
//!   context without losing the original subject.
//! - [`Diagnostic`] / [`Diagnostics`]: a diagnostic-collecting model for HCL
//!   parsing and variable resolution, which doesn't fail fast but
//!   accumulates every problem found and reports them together.

use std::fmt;
use std::path::PathBuf;

/// Context accumulated by a [`CacheError`] as it propagates up through the
/// registry cache and pack loader.
#[derive(Debug, Clone, Default)]
pub struct CacheContext {
    pub cache_path: Option<PathBuf>,
    pub registry_name: Option<String>,
    pub ref_name: Option<String>,
    pub pack_name: Option<String>,
}

impl CacheContext {
    pub fn with_cache_path(mut self, path: impl AsRef<std::path::Path>) -> Self {
        self.cache_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_registry_name(mut self, name: impl AsRef<str>) -> Self {
        self.registry_name = Some(name.as_ref().to_string());
        self
    }

    pub fn with_ref_name(mut self, ref_name: impl AsRef<str>) -> Self {
        self.ref_name = Some(ref_name.as_ref().to_string());
        self
    }

    pub fn with_pack_name(mut self, name: impl AsRef<str>) -> Self {
        self.pack_name = Some(name.as_ref().to_string());
        self
    }

    /// `true` if no context field has been filled in yet.
    fn is_empty(&self) -> bool {
        self.cache_path.is_none()
            && self.registry_name.is_none()
            && self.ref_name.is_none()
            && self.pack_name.is_none()
    }
}

impl fmt::Display for CacheContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        let mut wrote_any = false;
        let mut sep = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            if wrote_any {
                write!(f, ", ")
            } else {
                write!(f, " (")
            }
        };
        if let Some(path) = &self.cache_path {
            sep(f)?;
            write!(f, "cachePath={}", path.display())?;
            wrote_any = true;
        }
        if let Some(name) = &self.registry_name {
            sep(f)?;
            write!(f, "registryName={name}")?;
            wrote_any = true;
        }
        if let Some(r) = &self.ref_name {
            sep(f)?;
            write!(f, "ref={r}")?;
            wrote_any = true;
        }
        if let Some(name) = &self.pack_name {
            sep(f)?;
            write!(f, "packName={name}")?;
            wrote_any = true;
        }
        if wrote_any {
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// The leaf condition of a [`CacheError`], independent of where it happened.
#[derive(Debug, thiserror::Error)]
pub enum CacheErrorKind {
    #[error("no cache path configured")]
    CachePathRequired,
    #[error("registry source is required")]
    RegistrySourceRequired,
    #[error("registry not found")]
    RegistryNotFound,
    #[error("pack not found")]
    PackNotFound,
    #[error("error deleting packs")]
    NoPacksMatched,
    #[error("invalid registry source url: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

// re-exported so downstream crates don't need a direct `serde_json` dependency
// just to construct `CacheErrorKind::Json`.
pub use serde_json;

/// A [`CacheErrorKind`] together with the context accumulated while it
/// propagated. Every filesystem write in the registry cache returns this
/// type (see `spec §4.1`/`§7`).
#[derive(Debug)]
pub struct CacheError {
    pub kind: CacheErrorKind,
    pub context: CacheContext,
}

impl CacheError {
    pub fn new(kind: CacheErrorKind) -> Self {
        Self {
            kind,
            context: CacheContext::default(),
        }
    }

    pub fn with_context(mut self, f: impl FnOnce(CacheContext) -> CacheContext) -> Self {
        self.context = f(self.context);
        self
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, self.context)
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<CacheErrorKind> for CacheError {
    fn from(kind: CacheErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Extension trait letting callers attach cache context fluently at the
/// point an `io::Result`/`CacheErrorKind` first surfaces, mirroring the way
/// `anyhow::Context` reads at call sites elsewhere in the workspace.
pub trait CacheResultExt<T> {
    fn cache_context(self, f: impl FnOnce(CacheContext) -> CacheContext) -> Result<T, CacheError>;
}

impl<T, E> CacheResultExt<T> for Result<T, E>
where
    E: Into<CacheErrorKind>,
{
    fn cache_context(self, f: impl FnOnce(CacheContext) -> CacheContext) -> Result<T, CacheError> {
        self.map_err(|e| CacheError::new(e.into()).with_context(f))
    }
}

/// Severity of a single [`Diagnostic`], following HCL convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A `(line, column)` position in a source document, 1-indexed the way HCL
/// and editors report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePos {
    pub line: usize,
    pub column: usize,
}

/// A half-open range of source positions a diagnostic points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRange {
    pub filename: &'static str,
    pub start: SourcePos,
    pub end: SourcePos,
}

/// One problem found while parsing/merging variables, with enough context to
/// print alongside the offending source. The subject-specific constructors
/// (`invalid_variable_name`, `missing_root_var`, `invalid_value_for_type`)
/// mirror the named diagnostics in `spec §4.3`.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: Option<String>,
    pub range: Option<SourceRange>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: None,
            range: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_range(mut self, range: SourceRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn invalid_variable_name(name: &str, range: Option<SourceRange>) -> Self {
        let mut d = Self::error(format!(
            "invalid variable name {name:?}: must match ^[A-Za-z_][A-Za-z0-9_-]*$"
        ));
        if let Some(range) = range {
            d = d.with_range(range);
        }
        d
    }

    pub fn missing_root_var(pack: &str, name: &str, range: Option<SourceRange>) -> Self {
        let mut d = Self::error(format!(
            "variable {pack}.{name} is not declared in the pack's root variable file"
        ));
        if let Some(range) = range {
            d = d.with_range(range);
        }
        d
    }

    pub fn invalid_value_for_type(
        pack: &str,
        name: &str,
        expected: &str,
        range: Option<SourceRange>,
    ) -> Self {
        let mut d = Self::error(format!(
            "invalid value for {pack}.{name}: expected {expected}"
        ));
        if let Some(range) = range {
            d = d.with_range(range);
        }
        d
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(range) = &self.range {
            write!(
                f,
                "{}: {}:{}:{}: {}",
                self.severity, range.filename, range.start.line, range.start.column, self.summary
            )?;
        } else {
            write!(f, "{}: {}", self.severity, self.summary)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, "\n  {detail}")?;
        }
        Ok(())
    }
}

/// A diagnostic-collecting result set: the variable parser never fails fast
/// (`spec §4.3`), it accumulates every problem and reports them together.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Turns the collected diagnostics into an `Err` if any is an error,
    /// otherwise returns the supplied value.
    pub fn into_result<T>(self, value: T) -> Result<T, Diagnostics> {
        if self.has_errors() { Err(self) } else { Ok(value) }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostics {}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Wraps an [`hcl::Error`] (failed parse of a `.hcl` file) into a
/// [`Diagnostic`], preserving the source location when the underlying parser
/// reports one.
pub fn diagnostic_from_hcl_error(filename: &'static str, err: &hcl::Error) -> Diagnostic {
    let message = err.to_string();
    Diagnostic::error(message).with_range(SourceRange {
        filename,
        start: SourcePos { line: 1, column: 1 },
        end: SourcePos { line: 1, column: 1 },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_error_renders_context_trail() {
        let err = CacheError::new(CacheErrorKind::RegistryNotFound).with_context(|c| {
            c.with_cache_path("/tmp/cache")
                .with_registry_name("community")
                .with_ref_name("latest")
        });
        let rendered = err.to_string();
        assert!(rendered.starts_with("registry not found ("));
        assert!(rendered.contains("cachePath=/tmp/cache"));
        assert!(rendered.contains("registryName=community"));
        assert!(rendered.contains("ref=latest"));
    }

    #[test]
    fn context_with_no_fields_is_silent() {
        let err = CacheError::new(CacheErrorKind::CachePathRequired);
        assert_eq!(err.to_string(), "no cache path configured");
    }

    #[test]
    fn diagnostics_aggregate_and_report_errors() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::invalid_variable_name("1bad", None));
        diags.push(Diagnostic::missing_root_var("web", "replicas", None));
        assert!(diags.has_errors());
        let rendered = diags.to_string();
        assert!(rendered.contains("1bad"));
        assert!(rendered.contains("web.replicas"));
    }

    #[test]
    fn empty_diagnostics_allow_success() {
        let diags = Diagnostics::new();
        assert_eq!(diags.into_result(42), Ok(42));
    }
}
