//! Tagged-variant variable value model with declared type constraints
//! (`spec §3` "Variable", `spec §9` "Runtime-typed variable values").
//!
//! [`type_constraint::Type`] is the declared shape of a variable; [`Value`]
//! is the runtime value assigned to it, either from a declared default or
//! from an override. [`type_check`] enforces that the two agree before a
//! render is allowed to proceed.

mod type_constraint;
mod value;

pub use type_constraint::{Type, TypeExprError, parse_type_expr};
pub use value::{LiteralError, Value, literal_from_expr, type_check};
