use pack_diagnostics::{Diagnostic, Diagnostics};
use pack_value::{Value, literal_from_expr};

/// One assignment parsed out of an override file or a `--var` CLI pair
/// (`spec §4.3`). `pack` is `None` for an unqualified name, meaning "the
/// top-level pack".
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideAssignment {
    pub pack: Option<String>,
    pub name: String,
    pub value: Value,
}

/// Parses a `--var name=value` or `--var pack.name=value` CLI pair
/// (`spec §6`). The right-hand side is a bare HCL expression fragment, the
/// same grammar used for `default = <expr>` in a declaration.
pub fn parse_cli_var(pair: &str) -> Result<OverrideAssignment, Diagnostic> {
    let (lhs, rhs) = pair.split_once('=').ok_or_else(|| {
        Diagnostic::error(format!("invalid --var {pair:?}: expected name=value"))
    })?;
    let (pack, name) = split_qualifier(lhs);
    let expr: hcl::Expression = rhs.parse().map_err(|err| {
        Diagnostic::error(format!("invalid --var {pair:?}: {err}"))
    })?;
    let value = literal_from_expr(&expr)
        .map_err(|err| Diagnostic::error(format!("invalid --var {pair:?}: {err}")))?;
    Ok(OverrideAssignment {
        pack,
        name: name.to_string(),
        value,
    })
}

fn split_qualifier(lhs: &str) -> (Option<String>, &str) {
    match lhs.split_once('.') {
        Some((pack, name)) => (Some(pack.to_string()), name),
        None => (None, lhs),
    }
}

/// Parses a var-file: top-level attributes apply to the top-level pack;
/// each top-level block is named after a dependency pack, and its
/// attributes apply to that dependency (`spec §4.3` "Tie-breaks").
pub fn parse_override_file(
    filename: &'static str,
    contents: &str,
) -> (Vec<OverrideAssignment>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let body = match hcl::parse(contents) {
        Ok(body) => body,
        Err(err) => {
            diagnostics.push(pack_diagnostics::diagnostic_from_hcl_error(filename, &err));
            return (Vec::new(), diagnostics);
        }
    };

    let mut assignments = Vec::new();
    for attr in body.attributes() {
        match literal_from_expr(attr.expr()) {
            Ok(value) => assignments.push(OverrideAssignment {
                pack: None,
                name: attr.key().to_string(),
                value,
            }),
            Err(err) => diagnostics.push(Diagnostic::error(format!(
                "{}: invalid value for {}: {err}",
                filename,
                attr.key()
            ))),
        }
    }
    for block in body.blocks() {
        let pack_name = block.identifier().to_string();
        for attr in block.body().attributes() {
            match literal_from_expr(attr.expr()) {
                Ok(value) => assignments.push(OverrideAssignment {
                    pack: Some(pack_name.clone()),
                    name: attr.key().to_string(),
                    value,
                }),
                Err(err) => diagnostics.push(Diagnostic::error(format!(
                    "{}: invalid value for {}.{}: {err}",
                    filename,
                    pack_name,
                    attr.key()
                ))),
            }
        }
    }
    (assignments, diagnostics)
}
