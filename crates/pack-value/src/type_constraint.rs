use std::fmt;

/// A declared variable type constraint (`spec §4.3`): a primitive, a
/// homogeneous collection of a primitive, or an object with named typed
/// fields. Parsed from the bare HCL type-expression syntax used in
/// `variable "name" { type = ... }` blocks, e.g. `list(string)` or
/// `object({ replicas = number, tags = set(string) })`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Any,
    String,
    Number,
    Bool,
    List(Box<Type>),
    Set(Box<Type>),
    Map(Box<Type>),
    Object(Vec<(String, Type)>),
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::String => write!(f, "string"),
            Self::Number => write!(f, "number"),
            Self::Bool => write!(f, "bool"),
            Self::List(inner) => write!(f, "list({inner})"),
            Self::Set(inner) => write!(f, "set({inner})"),
            Self::Map(inner) => write!(f, "map({inner})"),
            Self::Object(fields) => {
                write!(f, "object({{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name} = {ty}")?;
                }
                write!(f, "}})")
            }
        }
    }
}

/// Error produced while parsing a type expression out of an HCL attribute.
#[derive(Debug, thiserror::Error)]
pub enum TypeExprError {
    #[error("unknown type keyword {0:?}")]
    UnknownKeyword(String),
    #[error("type constructor {0:?} expects exactly one argument")]
    WrongArity(String),
    #[error("unsupported type expression: {0}")]
    Unsupported(String),
}

/// Parses an HCL expression appearing in `type = <expr>` position into a
/// [`Type`]. Only the subset of HCL used to describe types is accepted:
/// bare identifiers (`string`, `number`, `bool`, `any`), single-argument
/// function calls (`list(T)`, `set(T)`, `map(T)`), and `object({ ... })`
/// with type-valued fields.
pub fn parse_type_expr(expr: &hcl::Expression) -> Result<Type, TypeExprError> {
    match expr {
        hcl::Expression::Variable(ident) => match ident.as_str() {
            "string" => Ok(Type::String),
            "number" => Ok(Type::Number),
            "bool" => Ok(Type::Bool),
            "any" => Ok(Type::Any),
            other => Err(TypeExprError::UnknownKeyword(other.to_string())),
        },
        hcl::Expression::FuncCall(call) => {
            let name = call.name.as_str();
            match name {
                "list" | "set" | "map" => {
                    let [arg] = call.args.as_slice() else {
                        return Err(TypeExprError::WrongArity(name.to_string()));
                    };
                    let inner = Box::new(parse_type_expr(arg)?);
                    Ok(match name {
                        "list" => Type::List(inner),
                        "set" => Type::Set(inner),
                        _ => Type::Map(inner),
                    })
                }
                "object" => {
                    let [arg] = call.args.as_slice() else {
                        return Err(TypeExprError::WrongArity(name.to_string()));
                    };
                    let hcl::Expression::Object(obj) = arg else {
                        return Err(TypeExprError::Unsupported(
                            "object(...) argument must be an object literal".to_string(),
                        ));
                    };
                    let mut fields = Vec::with_capacity(obj.len());
                    for (key, value) in obj.iter() {
                        let field_name = object_key_to_string(key)?;
                        fields.push((field_name, parse_type_expr(value)?));
                    }
                    Ok(Type::Object(fields))
                }
                other => Err(TypeExprError::UnknownKeyword(other.to_string())),
            }
        }
        other => Err(TypeExprError::Unsupported(format!("{other:?}"))),
    }
}

fn object_key_to_string(key: &hcl::ObjectKey) -> Result<String, TypeExprError> {
    match key {
        hcl::ObjectKey::Identifier(ident) => Ok(ident.as_str().to_string()),
        hcl::ObjectKey::Expression(hcl::Expression::String(s)) => Ok(s.clone()),
        other => Err(TypeExprError::Unsupported(format!(
            "object field key must be an identifier or string, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn type_of(src: &str) -> Type {
        let expr = hcl::Expression::from_str(src).expect("valid hcl expression");
        parse_type_expr(&expr).expect("supported type expression")
    }

    #[test]
    fn parses_primitives() {
        assert_eq!(type_of("string"), Type::String);
        assert_eq!(type_of("number"), Type::Number);
        assert_eq!(type_of("bool"), Type::Bool);
        assert_eq!(type_of("any"), Type::Any);
    }

    #[test]
    fn parses_collections() {
        assert_eq!(type_of("list(string)"), Type::List(Box::new(Type::String)));
        assert_eq!(type_of("set(number)"), Type::Set(Box::new(Type::Number)));
        assert_eq!(type_of("map(bool)"), Type::Map(Box::new(Type::Bool)));
    }

    #[test]
    fn parses_nested_object() {
        let ty = type_of("object({ replicas = number, tags = set(string) })");
        match ty {
            Type::Object(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0], ("replicas".to_string(), Type::Number));
                assert_eq!(
                    fields[1],
                    ("tags".to_string(), Type::Set(Box::new(Type::String)))
                );
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_keyword() {
        let expr = hcl::Expression::from_str("frobnicate").unwrap();
        assert!(matches!(
            parse_type_expr(&expr),
            Err(TypeExprError::UnknownKeyword(_))
        ));
    }
}
