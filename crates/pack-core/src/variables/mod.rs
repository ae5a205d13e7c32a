//! Typed variable declarations, override files, CLI `--var` pairs, and the
//! strict-precedence resolver that merges them (`spec §4.3`).

mod declarations;
mod overrides;
mod resolve;

pub use declarations::{VariableDecl, parse_variable_decls};
pub use overrides::{OverrideAssignment, parse_cli_var, parse_override_file};
pub use resolve::{Declarations, OverrideFile, VariableTree, resolve_variables};

use pack_diagnostics::Diagnostics;

use crate::pack::Pack;

/// Collects every pack's declared variables from a loaded [`Pack`] tree,
/// the same source `spec §4.3` calls `Pack.RootVariableFiles()`.
pub fn collect_declarations(root: &Pack) -> (Declarations, Diagnostics) {
    let mut declarations = Declarations::new();
    let mut diagnostics = Diagnostics::new();
    for pack in root.iter_tree() {
        let contents = pack
            .root_variable_file
            .as_ref()
            .map(|f| f.contents.as_str())
            .unwrap_or_default();
        let (decls, pack_diags) = parse_variable_decls("variables.hcl", contents);
        diagnostics.extend(pack_diags);
        declarations.insert(pack.metadata.name.clone(), decls);
    }
    (declarations, diagnostics)
}
