use std::sync::LazyLock;

use regex::Regex;

/// Pack/registry/variable names must match `^[A-Za-z_][A-Za-z0-9_-]*$`
/// (`spec §3` "Variable").
static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid regex"));

#[derive(Debug, thiserror::Error)]
#[error("invalid identifier {0:?}: must match ^[A-Za-z_][A-Za-z0-9_-]*$")]
pub struct IdentifierError(pub String);

pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

pub fn validate_identifier(name: &str) -> Result<(), IdentifierError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(IdentifierError(name.to_string()))
    }
}
