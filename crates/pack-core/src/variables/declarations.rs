use std::collections::BTreeMap;

use pack_diagnostics::{Diagnostic, Diagnostics};
use pack_value::{Type, Value, parse_type_expr, literal_from_expr};
use serde::Deserialize;

/// One `variable "name" { type = ...; default = ...; description = "..." }`
/// declaration (`spec §3` "Variable", `§4.3`).
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub description: Option<String>,
    pub ty: Type,
    pub default: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct VariableBlockBody {
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "type")]
    type_expr: Option<hcl::Expression>,
    #[serde(default)]
    default: Option<hcl::Expression>,
}

#[derive(Debug, Default, Deserialize)]
struct VariablesHcl {
    #[serde(default, rename = "variable")]
    variable: BTreeMap<String, VariableBlockBody>,
}

/// Parses every `variable` block out of a root variable file, the way
/// `spec §4.3` describes. Never fails fast: unparseable HCL yields a single
/// diagnostic and an empty declaration set; per-variable problems (bad
/// name, unsupported type expression) are collected alongside whatever
/// declarations did parse cleanly.
pub fn parse_variable_decls(filename: &'static str, contents: &str) -> (Vec<VariableDecl>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    if contents.trim().is_empty() {
        return (Vec::new(), diagnostics);
    }

    let parsed: VariablesHcl = match hcl::from_str(contents) {
        Ok(parsed) => parsed,
        Err(err) => {
            diagnostics.push(pack_diagnostics::diagnostic_from_hcl_error(filename, &err));
            return (Vec::new(), diagnostics);
        }
    };

    let mut decls = Vec::with_capacity(parsed.variable.len());
    for (name, block) in parsed.variable {
        if !pack_utils::is_valid_identifier(&name) {
            diagnostics.push(Diagnostic::invalid_variable_name(&name, None));
            continue;
        }

        let ty = match &block.type_expr {
            Some(expr) => match parse_type_expr(expr) {
                Ok(ty) => ty,
                Err(err) => {
                    diagnostics.push(
                        Diagnostic::error(format!(
                            "variable {name:?}: invalid type expression: {err}"
                        ))
                        .with_detail(format!("declared in {filename}")),
                    );
                    continue;
                }
            },
            None => Type::Any,
        };

        let default = match &block.default {
            Some(expr) => match literal_from_expr(expr) {
                Ok(value) => Some(value),
                Err(err) => {
                    diagnostics.push(
                        Diagnostic::error(format!(
                            "variable {name:?}: invalid default value: {err}"
                        ))
                        .with_detail(format!("declared in {filename}")),
                    );
                    continue;
                }
            },
            None => None,
        };

        decls.push(VariableDecl {
            name,
            description: block.description,
            ty,
            default,
        });
    }
    decls.sort_by(|a, b| a.name.cmp(&b.name));
    (decls, diagnostics)
}
