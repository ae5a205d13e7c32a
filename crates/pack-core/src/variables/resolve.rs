use std::collections::BTreeMap;

use pack_diagnostics::{Diagnostic, Diagnostics};
use pack_value::{Value, type_check};

use super::declarations::VariableDecl;
use super::overrides::{OverrideAssignment, parse_cli_var, parse_override_file};

/// Declarations for every pack in a tree, keyed by pack name (`spec §4.3`
/// "Root variable files keyed by pack name").
pub type Declarations = BTreeMap<String, Vec<VariableDecl>>;

/// The resolved value of every declared variable, keyed by `(pack, name)`
/// (`spec §3` "Variable" "Override values attach to the matching declared
/// variable").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableTree(BTreeMap<String, BTreeMap<String, Value>>);

impl VariableTree {
    pub fn get(&self, pack: &str, name: &str) -> Option<&Value> {
        self.0.get(pack).and_then(|vars| vars.get(name))
    }

    pub fn pack_vars(&self, pack: &str) -> Option<&BTreeMap<String, Value>> {
        self.0.get(pack)
    }
}

/// One named override file's raw contents, already read off disk by the
/// caller (`spec §4.3` "Zero or more override files (HCL), supplied by
/// path").
pub struct OverrideFile {
    pub filename: &'static str,
    pub contents: String,
}

/// Runs the deterministic resolution algorithm of `spec §4.3`: seed with
/// defaults, apply override files in order, apply CLI `--var` pairs in
/// order, then type-check every final value. Diagnostic-collecting: every
/// problem is gathered before returning, never fail-fast.
pub fn resolve_variables(
    declarations: &Declarations,
    root_pack_name: &str,
    override_files: &[OverrideFile],
    cli_vars: &[String],
) -> Result<VariableTree, Diagnostics> {
    let mut diagnostics = Diagnostics::new();
    let mut tree: BTreeMap<String, BTreeMap<String, Value>> = BTreeMap::new();

    // (1) seed with declared defaults.
    for (pack, decls) in declarations {
        let vars = tree.entry(pack.clone()).or_default();
        for decl in decls {
            vars.insert(decl.name.clone(), decl.default.clone().unwrap_or(Value::Null));
        }
    }

    // (2) override files, in the order supplied.
    for file in override_files {
        let (assignments, file_diags) = parse_override_file(file.filename, &file.contents);
        diagnostics.extend(file_diags);
        for assignment in assignments {
            apply_assignment(
                declarations,
                &mut tree,
                root_pack_name,
                assignment,
                &mut diagnostics,
            );
        }
    }

    // (3) CLI --var pairs, in order, strictly overriding files.
    for pair in cli_vars {
        match parse_cli_var(pair) {
            Ok(assignment) => apply_assignment(
                declarations,
                &mut tree,
                root_pack_name,
                assignment,
                &mut diagnostics,
            ),
            Err(diag) => diagnostics.push(diag),
        }
    }

    // (4) final type check of every resolved value.
    for (pack, decls) in declarations {
        let Some(vars) = tree.get(pack) else { continue };
        for decl in decls {
            let Some(value) = vars.get(&decl.name) else {
                continue;
            };
            if let Err(_err) = type_check(&decl.ty, value) {
                diagnostics.push(Diagnostic::invalid_value_for_type(
                    pack,
                    &decl.name,
                    &decl.ty.to_string(),
                    None,
                ));
            }
        }
    }

    diagnostics.into_result(VariableTree(tree))
}

fn apply_assignment(
    declarations: &Declarations,
    tree: &mut BTreeMap<String, BTreeMap<String, Value>>,
    root_pack_name: &str,
    assignment: OverrideAssignment,
    diagnostics: &mut Diagnostics,
) {
    let target_pack = assignment.pack.as_deref().unwrap_or(root_pack_name);
    let declared = declarations
        .get(target_pack)
        .is_some_and(|decls| decls.iter().any(|d| d.name == assignment.name));
    if !declared {
        diagnostics.push(Diagnostic::missing_root_var(
            target_pack,
            &assignment.name,
            None,
        ));
        return;
    }
    tree.entry(target_pack.to_string())
        .or_default()
        .insert(assignment.name, assignment.value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pack_value::Type;

    fn decls(pack: &str, name: &str, ty: Type, default: Option<Value>) -> Declarations {
        let mut map = Declarations::new();
        map.insert(
            pack.to_string(),
            vec![VariableDecl {
                name: name.to_string(),
                description: None,
                ty,
                default,
            }],
        );
        map
    }

    #[test]
    fn default_is_used_when_nothing_overrides_it() {
        let declarations = decls("web", "replicas", Type::Number, Some(Value::Number(1.0)));
        let tree = resolve_variables(&declarations, "web", &[], &[]).unwrap();
        assert_eq!(tree.get("web", "replicas"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn cli_var_overrides_file_and_default() {
        let declarations = decls("web", "replicas", Type::Number, Some(Value::Number(1.0)));
        let override_files = vec![OverrideFile {
            filename: "vars.hcl",
            contents: "replicas = 3\n".to_string(),
        }];
        let cli_vars = vec!["replicas=5".to_string()];
        let tree = resolve_variables(&declarations, "web", &override_files, &cli_vars).unwrap();
        assert_eq!(tree.get("web", "replicas"), Some(&Value::Number(5.0)));
    }

    #[test]
    fn last_file_wins_over_earlier_ones() {
        let declarations = decls("web", "replicas", Type::Number, Some(Value::Number(1.0)));
        let override_files = vec![
            OverrideFile {
                filename: "a.hcl",
                contents: "replicas = 2\n".to_string(),
            },
            OverrideFile {
                filename: "b.hcl",
                contents: "replicas = 4\n".to_string(),
            },
        ];
        let tree = resolve_variables(&declarations, "web", &override_files, &[]).unwrap();
        assert_eq!(tree.get("web", "replicas"), Some(&Value::Number(4.0)));
    }

    #[test]
    fn undeclared_override_is_a_diagnostic() {
        let declarations = decls("web", "replicas", Type::Number, Some(Value::Number(1.0)));
        let cli_vars = vec!["unknown=1".to_string()];
        let diags = resolve_variables(&declarations, "web", &[], &cli_vars).unwrap_err();
        assert!(diags.has_errors());
    }

    #[test]
    fn type_mismatch_is_a_diagnostic_and_blocks_render() {
        let declarations = decls("web", "replicas", Type::Number, Some(Value::Number(1.0)));
        let cli_vars = vec!["replicas=\"not a number\"".to_string()];
        let diags = resolve_variables(&declarations, "web", &[], &cli_vars).unwrap_err();
        assert!(diags.has_errors());
    }

    #[test]
    fn dependency_qualified_override_targets_dependency_pack() {
        let mut declarations = decls("web", "replicas", Type::Number, Some(Value::Number(1.0)));
        declarations.insert(
            "redis".to_string(),
            vec![VariableDecl {
                name: "replicas".to_string(),
                description: None,
                ty: Type::Number,
                default: Some(Value::Number(1.0)),
            }],
        );
        let cli_vars = vec!["redis.replicas=2".to_string()];
        let tree = resolve_variables(&declarations, "web", &[], &cli_vars).unwrap();
        assert_eq!(tree.get("redis", "replicas"), Some(&Value::Number(2.0)));
        assert_eq!(tree.get("web", "replicas"), Some(&Value::Number(1.0)));
    }
}
