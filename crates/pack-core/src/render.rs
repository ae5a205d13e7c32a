use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value as Json;

use crate::pack::Pack;
use crate::variables::VariableTree;

/// A mapping from render name to rendered content, partitioned the way
/// `spec §3` "RenderedArtifact" describes: templates owned by the
/// top-level pack versus templates reached through a dependency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedArtifact {
    pub parent_renders: BTreeMap<String, String>,
    pub dependent_renders: BTreeMap<String, String>,
}

impl RenderedArtifact {
    /// Every render, parent first then dependents, in render-name order —
    /// the iteration order the runner consumes (`spec §4.5` "Ordering").
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.parent_renders.iter().chain(self.dependent_renders.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.parent_renders.is_empty() && self.dependent_renders.is_empty()
    }
}

/// Failures from [`Renderer::process_templates`] / `process_output_template`
/// (`spec §4.4`, `§7` "Render errors").
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// `spec §4.4` invariant: "at least one parent render is required by
    /// downstream runners".
    #[error("no templates were rendered for the top-level pack")]
    NoTemplatesRendered,
    #[error("{render_name}: {message}")]
    Template {
        render_name: String,
        message: String,
        hint: Option<String>,
    },
    #[error(transparent)]
    TeraSetup(#[from] tera::Error),
}

/// Drives a single [`Pack`] through load-and-render, returning a
/// [`RenderedArtifact`] (`spec §4.4` "Pack Manager / Renderer").
pub struct Renderer<'a> {
    root: &'a Pack,
    variables: &'a VariableTree,
}

impl<'a> Renderer<'a> {
    pub fn new(root: &'a Pack, variables: &'a VariableTree) -> Self {
        Self { root, variables }
    }

    /// `spec §4.4` `ProcessTemplates`.
    pub fn process_templates(&self) -> Result<RenderedArtifact, RenderError> {
        let mut tera = tera::Tera::default();
        register_helpers(&mut tera);

        // register every template (including helpers, via their render
        // name) so non-helper templates can `{% include %}` them.
        for pack in self.root.iter_tree() {
            for template in &pack.template_files {
                tera.add_raw_template(&template.render_name(&pack.metadata.name), &template.contents)?;
            }
        }

        let mut artifact = RenderedArtifact::default();
        for pack in self.root.iter_tree() {
            let context = self.context_for(pack);
            for template in pack.own_templates() {
                let render_name = template.render_name(&pack.metadata.name);
                let rendered = tera
                    .render(&render_name, &context)
                    .map_err(|err| wrap_template_error(&render_name, err))?;
                if rendered.trim().is_empty() {
                    // dropped silently (spec §4.4 step 5)
                    continue;
                }
                if std::ptr::eq(pack, self.root) {
                    artifact.parent_renders.insert(render_name, rendered);
                } else {
                    artifact.dependent_renders.insert(render_name, rendered);
                }
            }
        }

        if artifact.parent_renders.is_empty() {
            return Err(RenderError::NoTemplatesRendered);
        }
        Ok(artifact)
    }

    /// `spec §4.4` `ProcessOutputTemplate`.
    pub fn process_output_template(&self) -> Result<Option<String>, RenderError> {
        let Some(template) = &self.root.output_template_file else {
            return Ok(None);
        };
        let mut tera = tera::Tera::default();
        register_helpers(&mut tera);
        let render_name = "outputs";
        tera.add_raw_template(render_name, &template.contents)?;
        let context = self.context_for(self.root);
        let rendered = tera
            .render(render_name, &context)
            .map_err(|err| wrap_template_error(render_name, err))?;
        Ok(Some(rendered))
    }

    /// Builds the shared template context: every pack's variable object
    /// under its own name, `nomad_pack.{app,pack}` for `owner`'s own
    /// metadata, and `my` as a convenience alias for `owner`'s variables
    /// (`spec §4.4` step 1, `§6` "Template context surface").
    fn context_for(&self, owner: &Pack) -> tera::Context {
        let mut context = tera::Context::new();
        let mut owner_vars = Json::Object(Default::default());
        for pack in self.root.iter_tree() {
            let vars = self
                .variables
                .pack_vars(&pack.metadata.name)
                .map(|vars| {
                    Json::Object(
                        vars.iter()
                            .map(|(k, v)| (k.clone(), v.to_json()))
                            .collect(),
                    )
                })
                .unwrap_or(Json::Object(Default::default()));
            if pack.metadata.name == owner.metadata.name {
                owner_vars = vars.clone();
            }
            context.insert(&pack.metadata.name, &vars);
        }
        context.insert("my", &owner_vars);
        context.insert(
            "nomad_pack",
            &serde_json::json!({
                "pack": {
                    "name": owner.metadata.name,
                    "description": owner.metadata.description,
                    "url": owner.metadata.url,
                    "version": owner.metadata.version,
                },
                "app": {
                    "url": owner.metadata.url,
                    "author": owner.metadata.author,
                },
            }),
        );
        context
    }
}

fn register_helpers(tera: &mut tera::Tera) {
    tera.register_filter(
        "quote",
        |value: &Json, _args: &std::collections::HashMap<String, Json>| -> tera::Result<Json> {
            let s = match value {
                Json::String(s) => s.clone(),
                other => other.to_string(),
            };
            Ok(Json::String(format!("\"{s}\"")))
        },
    );
    tera.register_filter(
        "coalesce",
        |value: &Json, args: &std::collections::HashMap<String, Json>| -> tera::Result<Json> {
            if !value.is_null() {
                return Ok(value.clone());
            }
            Ok(args.get("default").cloned().unwrap_or(Json::Null))
        },
    );
    tera.register_function(
        "empty",
        |args: &std::collections::HashMap<String, Json>| -> tera::Result<Json> {
            let value = args.get("value").cloned().unwrap_or(Json::Null);
            let is_empty = match &value {
                Json::Null => true,
                Json::String(s) => s.is_empty(),
                Json::Array(a) => a.is_empty(),
                Json::Object(o) => o.is_empty(),
                _ => false,
            };
            Ok(Json::Bool(is_empty))
        },
    );
    tera.register_filter(
        "toJson",
        |value: &Json, _args: &std::collections::HashMap<String, Json>| -> tera::Result<Json> {
            Ok(Json::String(serde_json::to_string(value).unwrap_or_default()))
        },
    );
}

static LEGACY_VAR_SYNTAX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.pack\.var\b").expect("valid regex"));
static VARIABLE_NOT_FOUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Variable `([A-Za-z0-9_]+)\.([A-Za-z0-9_.]+)`").expect("valid regex"));

/// Wraps a `tera::Error` into a [`RenderError::Template`] with filename and
/// a heuristic hint (`spec §4.4` step 6, `§9` "Exceptions/panics in
/// templates", "Legacy template syntax").
fn wrap_template_error(render_name: &str, err: tera::Error) -> RenderError {
    let message = err.to_string();
    let mut hint = None;

    if let Some(captures) = VARIABLE_NOT_FOUND.captures(&message) {
        let pack = &captures[1];
        let field = &captures[2];
        hint = Some(format!("Pack {pack} not found when accessing {field}"));
    }
    if LEGACY_VAR_SYNTAX.is_match(&message) {
        hint = Some(
            "detected legacy `.pack.var` template syntax; use `<pack>.<variable>` instead"
                .to_string(),
        );
    }

    RenderError::Template {
        render_name: render_name.to_string(),
        message,
        hint,
    }
}
