use camino::Utf8PathBuf;

/// A pack's declared `type` (`spec §3` "Pack"). Only `job` is recognised
/// today; other values parse but fail [`Pack::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackType {
    #[default]
    Job,
    Unknown,
}

impl PackType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "" | "job" => Self::Job,
            _ => Self::Unknown,
        }
    }

    pub fn is_recognised(self) -> bool {
        matches!(self, Self::Job)
    }
}

/// `pack { ... }` / `app { ... }` metadata (`spec §3` "Pack" `metadata`
/// field; `spec §4.2` step 2).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PackMetadata {
    pub name: String,
    pub description: String,
    pub url: String,
    pub author: String,
    pub version: String,
    pub pack_type: PackType,
}

/// The root `variables.hcl` for a pack: raw bytes plus the path they were
/// read from, not parsed until the variable merger needs them (`spec §4.2`
/// step 3, `spec §3` "Pack" `root_variable_file`).
#[derive(Debug, Clone, PartialEq)]
pub struct RootVariableFile {
    pub path: Utf8PathBuf,
    pub contents: String,
}

/// One `templates/*.tpl` file. A name beginning with `_` is a helper,
/// compiled but never rendered standalone (`spec §3`, `§4.2` step 4).
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateFile {
    pub name: String,
    pub contents: String,
}

impl TemplateFile {
    pub fn is_helper(&self) -> bool {
        self.name.starts_with('_')
    }

    /// The render name under which this template's output is keyed in a
    /// [`crate::render::RenderedArtifact`] (`spec §3` "RenderedArtifact").
    pub fn render_name(&self, pack_name: &str) -> String {
        format!("{pack_name}/templates/{}", self.name)
    }
}

/// A parameterizable bundle of job templates, default variable
/// declarations, optional output template, and metadata (`spec §1`, `§3`
/// "Pack"). Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Pack {
    pub metadata: PackMetadata,
    pub root_variable_file: Option<RootVariableFile>,
    pub template_files: Vec<TemplateFile>,
    pub output_template_file: Option<TemplateFile>,
    pub dependencies: Vec<Pack>,
}

/// What's wrong with a loaded [`Pack`] (`spec §4.2` "Validation").
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PackValidationError {
    #[error("pack {0:?} has no root variable file")]
    MissingRootVariableFile(String),
    #[error("pack {0:?} declares unrecognised type")]
    UnrecognisedType(String),
}

impl Pack {
    /// `spec §4.2` "Validation": `root_variable_file != nil`; metadata
    /// present and pack type recognised. Checked recursively.
    pub fn validate(&self) -> Result<(), PackValidationError> {
        if self.root_variable_file.is_none() {
            return Err(PackValidationError::MissingRootVariableFile(
                self.metadata.name.clone(),
            ));
        }
        if !self.metadata.pack_type.is_recognised() {
            return Err(PackValidationError::UnrecognisedType(
                self.metadata.name.clone(),
            ));
        }
        for dep in &self.dependencies {
            dep.validate()?;
        }
        Ok(())
    }

    /// Non-helper templates belonging to this pack alone (not its
    /// dependencies), in the order they were read from disk.
    pub fn own_templates(&self) -> impl Iterator<Item = &TemplateFile> {
        self.template_files.iter().filter(|t| !t.is_helper())
    }

    /// Every helper template (`_*.tpl`) belonging to this pack alone.
    pub fn own_helpers(&self) -> impl Iterator<Item = &TemplateFile> {
        self.template_files.iter().filter(|t| t.is_helper())
    }

    /// Depth-first iterator over this pack and every transitive
    /// dependency, this pack first.
    pub fn iter_tree(&self) -> PackTreeIter<'_> {
        PackTreeIter { stack: vec![self] }
    }
}

pub struct PackTreeIter<'a> {
    stack: Vec<&'a Pack>,
}

impl<'a> Iterator for PackTreeIter<'a> {
    type Item = &'a Pack;

    fn next(&mut self) -> Option<Self::Item> {
        let pack = self.stack.pop()?;
        // push in reverse so dependencies are visited in declaration order
        self.stack.extend(pack.dependencies.iter().rev());
        Some(pack)
    }
}
