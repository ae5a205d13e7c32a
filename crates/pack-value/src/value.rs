use std::fmt;

use crate::type_constraint::Type;

/// A runtime-typed variable value: a tagged variant alongside the declared
/// [`Type`] it was checked against (`spec §9` "Runtime-typed variable
/// values").
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    String(String),
    Number(f64),
    Bool(bool),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(Vec<(String, Value)>),
    Object(Vec<(String, Value)>),
}

impl Value {
    /// Converts to a `serde_json::Value` for use as a Tera/JSON rendering
    /// context. `Set` collapses to a JSON array like `List`; JSON has no set
    /// type.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::List(items) | Self::Set(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Self::Map(entries) | Self::Object(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Error produced while evaluating a literal HCL expression into a
/// [`Value`]. Only literal expressions are supported: declared defaults and
/// override assignments are plain data, not computed expressions.
#[derive(Debug, thiserror::Error)]
pub enum LiteralError {
    #[error("expression is not a literal value: {0}")]
    NotLiteral(String),
}

/// Evaluates an HCL expression that is expected to hold a literal value
/// (no variable references, no function calls) into a [`Value`].
pub fn literal_from_expr(expr: &hcl::Expression) -> Result<Value, LiteralError> {
    match expr {
        hcl::Expression::Null => Ok(Value::Null),
        hcl::Expression::Bool(b) => Ok(Value::Bool(*b)),
        hcl::Expression::Number(n) => Ok(Value::Number(n.as_f64().unwrap_or_default())),
        hcl::Expression::String(s) => Ok(Value::String(s.clone())),
        hcl::Expression::Array(items) => {
            let values = items
                .iter()
                .map(literal_from_expr)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(values))
        }
        hcl::Expression::Object(obj) => {
            let mut entries = Vec::with_capacity(obj.len());
            for (key, value) in obj.iter() {
                let key = object_key_to_string(key)?;
                entries.push((key, literal_from_expr(value)?));
            }
            Ok(Value::Object(entries))
        }
        hcl::Expression::TemplateExpr(template) => Ok(Value::String(template.to_string())),
        other => Err(LiteralError::NotLiteral(format!("{other:?}"))),
    }
}

fn object_key_to_string(key: &hcl::ObjectKey) -> Result<String, LiteralError> {
    match key {
        hcl::ObjectKey::Identifier(ident) => Ok(ident.as_str().to_string()),
        hcl::ObjectKey::Expression(hcl::Expression::String(s)) => Ok(s.clone()),
        other => Err(LiteralError::NotLiteral(format!("object key {other:?}"))),
    }
}

/// Checks a [`Value`] against a declared [`Type`], the way `spec §4.3` step
/// 4 describes: a mismatch must be reported with the declared type, not
/// silently coerced.
pub fn type_check(ty: &Type, value: &Value) -> Result<(), String> {
    match (ty, value) {
        (Type::Any, _) => Ok(()),
        (Type::String, Value::String(_)) => Ok(()),
        (Type::Number, Value::Number(_)) => Ok(()),
        (Type::Bool, Value::Bool(_)) => Ok(()),
        (Type::List(inner), Value::List(items)) | (Type::List(inner), Value::Set(items)) => {
            items.iter().try_for_each(|item| type_check(inner, item))
        }
        (Type::Set(inner), Value::Set(items)) | (Type::Set(inner), Value::List(items)) => {
            items.iter().try_for_each(|item| type_check(inner, item))
        }
        (Type::Map(inner), Value::Map(entries)) | (Type::Map(inner), Value::Object(entries)) => {
            entries
                .iter()
                .try_for_each(|(_, value)| type_check(inner, value))
        }
        (Type::Object(fields), Value::Object(entries)) | (Type::Object(fields), Value::Map(entries)) => {
            for (field_name, field_type) in fields {
                let Some((_, value)) = entries.iter().find(|(name, _)| name == field_name) else {
                    return Err(format!("missing object field {field_name:?}"));
                };
                type_check(field_type, value)?;
            }
            Ok(())
        }
        (expected, actual) => Err(format!(
            "expected {expected}, found {}",
            describe_shape(actual)
        )),
    }
}

fn describe_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "bool",
        Value::List(_) => "list",
        Value::Set(_) => "set",
        Value::Map(_) => "map",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn value_of(src: &str) -> Value {
        let expr = hcl::Expression::from_str(src).expect("valid hcl expression");
        literal_from_expr(&expr).expect("literal expression")
    }

    #[test]
    fn evaluates_primitive_literals() {
        assert_eq!(value_of("\"hello\""), Value::String("hello".to_string()));
        assert_eq!(value_of("42"), Value::Number(42.0));
        assert_eq!(value_of("true"), Value::Bool(true));
    }

    #[test]
    fn evaluates_list_literal() {
        let value = value_of("[1, 2, 3]");
        assert_eq!(
            value,
            Value::List(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)])
        );
    }

    #[test]
    fn type_check_accepts_matching_list() {
        let ty = Type::List(Box::new(Type::String));
        let value = Value::List(vec![Value::String("a".into()), Value::String("b".into())]);
        assert!(type_check(&ty, &value).is_ok());
    }

    #[test]
    fn type_check_rejects_mismatched_primitive() {
        let err = type_check(&Type::Number, &Value::String("nope".into())).unwrap_err();
        assert!(err.contains("expected number"));
    }

    #[test]
    fn type_check_enforces_object_fields() {
        let ty = Type::Object(vec![
            ("replicas".to_string(), Type::Number),
            ("name".to_string(), Type::String),
        ]);
        let ok = Value::Object(vec![
            ("replicas".to_string(), Value::Number(3.0)),
            ("name".to_string(), Value::String("web".into())),
        ]);
        assert!(type_check(&ty, &ok).is_ok());

        let missing_field = Value::Object(vec![("replicas".to_string(), Value::Number(3.0))]);
        assert!(type_check(&ty, &missing_field).is_err());
    }

    #[test]
    fn to_json_collapses_set_to_array() {
        let value = Value::Set(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(value.to_json(), serde_json::json!([1.0, 2.0]));
    }
}
