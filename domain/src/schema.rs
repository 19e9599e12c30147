//! Schema validation: the validator port and a small combinator library.
//!
//! A [`Validator`] is an opaque capability with one operation: given a
//! decoded JSON value, return a normalized value conforming to the schema or
//! a [`SchemaError`] describing what did not match. Validators may transform
//! their input (default-filling, unknown-field stripping), so callers must
//! always use the returned value, not the original.
//!
//! The combinators here cover the shapes the store needs day to day;
//! anything implementing [`Validator`] plugs into a
//! [`SchemaMap`](crate::SchemaMap) the same way.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Capability that accepts, rejects, or normalizes a decoded value.
pub trait Validator: Send + Sync {
    /// Validate `value`, returning its normalized form or a failure
    /// description with the location of the mismatch.
    fn parse(&self, value: &Value) -> Result<Value, SchemaError>;
}

/// A validation failure: what did not match, and where.
///
/// The location is a JSON-path-ish string (`$.user.id`, `$.tags[2]`)
/// accumulated as the error propagates out of nested combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    path: String,
    message: String,
}

impl SchemaError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            path: String::new(),
            message: message.into(),
        }
    }

    /// Prefix the location with an object field segment.
    pub fn at_field(mut self, name: &str) -> Self {
        self.path = format!(".{}{}", name, self.path);
        self
    }

    /// Prefix the location with an array index segment.
    pub fn at_index(mut self, index: usize) -> Self {
        self.path = format!("[{}]{}", index, self.path);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "at ${}: {}", self.path, self.message)
        }
    }
}

impl Error for SchemaError {}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expected(what: &str, got: &Value) -> SchemaError {
    SchemaError::new(format!("expected {}, got {}", what, type_name(got)))
}

/// Schema for JSON strings, with optional length bounds.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringSchema {
    min_len: Option<usize>,
    max_len: Option<usize>,
}

pub fn string() -> StringSchema {
    StringSchema::default()
}

impl StringSchema {
    pub fn min_len(mut self, n: usize) -> Self {
        self.min_len = Some(n);
        self
    }

    pub fn max_len(mut self, n: usize) -> Self {
        self.max_len = Some(n);
        self
    }
}

impl Validator for StringSchema {
    fn parse(&self, value: &Value) -> Result<Value, SchemaError> {
        let Value::String(s) = value else {
            return Err(expected("string", value));
        };
        if let Some(min) = self.min_len {
            if s.chars().count() < min {
                return Err(SchemaError::new(format!(
                    "string shorter than {} characters",
                    min
                )));
            }
        }
        if let Some(max) = self.max_len {
            if s.chars().count() > max {
                return Err(SchemaError::new(format!(
                    "string longer than {} characters",
                    max
                )));
            }
        }
        Ok(value.clone())
    }
}

/// Schema for JSON numbers, with optional range bounds.
#[derive(Clone, Copy, Debug, Default)]
pub struct NumberSchema {
    min: Option<f64>,
    max: Option<f64>,
}

pub fn number() -> NumberSchema {
    NumberSchema::default()
}

impl NumberSchema {
    pub fn min(mut self, bound: f64) -> Self {
        self.min = Some(bound);
        self
    }

    pub fn max(mut self, bound: f64) -> Self {
        self.max = Some(bound);
        self
    }
}

impl Validator for NumberSchema {
    fn parse(&self, value: &Value) -> Result<Value, SchemaError> {
        let Some(n) = value.as_f64() else {
            return Err(expected("number", value));
        };
        if let Some(min) = self.min {
            if n < min {
                return Err(SchemaError::new(format!("number below minimum {}", min)));
            }
        }
        if let Some(max) = self.max {
            if n > max {
                return Err(SchemaError::new(format!("number above maximum {}", max)));
            }
        }
        Ok(value.clone())
    }
}

/// Schema for whole numbers representable as `i64`.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntegerSchema {
    min: Option<i64>,
    max: Option<i64>,
}

pub fn integer() -> IntegerSchema {
    IntegerSchema::default()
}

impl IntegerSchema {
    pub fn min(mut self, bound: i64) -> Self {
        self.min = Some(bound);
        self
    }

    pub fn max(mut self, bound: i64) -> Self {
        self.max = Some(bound);
        self
    }
}

impl Validator for IntegerSchema {
    fn parse(&self, value: &Value) -> Result<Value, SchemaError> {
        let Some(n) = value.as_i64() else {
            return Err(expected("integer", value));
        };
        if let Some(min) = self.min {
            if n < min {
                return Err(SchemaError::new(format!("integer below minimum {}", min)));
            }
        }
        if let Some(max) = self.max {
            if n > max {
                return Err(SchemaError::new(format!("integer above maximum {}", max)));
            }
        }
        Ok(value.clone())
    }
}

/// Schema for JSON booleans.
#[derive(Clone, Copy, Debug, Default)]
pub struct BooleanSchema;

pub fn boolean() -> BooleanSchema {
    BooleanSchema
}

impl Validator for BooleanSchema {
    fn parse(&self, value: &Value) -> Result<Value, SchemaError> {
        if value.is_boolean() {
            Ok(value.clone())
        } else {
            Err(expected("boolean", value))
        }
    }
}

/// Schema for a string drawn from a fixed set of variants.
#[derive(Clone, Debug)]
pub struct OneOfSchema {
    variants: Vec<String>,
}

pub fn one_of<I, S>(variants: I) -> OneOfSchema
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    OneOfSchema {
        variants: variants.into_iter().map(Into::into).collect(),
    }
}

impl Validator for OneOfSchema {
    fn parse(&self, value: &Value) -> Result<Value, SchemaError> {
        let Value::String(s) = value else {
            return Err(expected("string", value));
        };
        if self.variants.iter().any(|v| v == s) {
            Ok(value.clone())
        } else {
            Err(SchemaError::new(format!(
                "expected one of [{}], got \"{}\"",
                self.variants.join(", "),
                s
            )))
        }
    }
}

/// Schema for homogeneous arrays; each element runs through `items`.
pub struct ArraySchema<V: Validator> {
    items: V,
}

pub fn array<V: Validator>(items: V) -> ArraySchema<V> {
    ArraySchema { items }
}

impl<V: Validator> Validator for ArraySchema<V> {
    fn parse(&self, value: &Value) -> Result<Value, SchemaError> {
        let Value::Array(elems) = value else {
            return Err(expected("array", value));
        };
        let mut normalized = Vec::with_capacity(elems.len());
        for (i, elem) in elems.iter().enumerate() {
            normalized.push(self.items.parse(elem).map_err(|e| e.at_index(i))?);
        }
        Ok(Value::Array(normalized))
    }
}

/// Schema for objects with named, individually validated fields.
///
/// Declared fields are required unless wrapped in `.optional()` or
/// `.default_value(..)`. Fields present in the input but not declared are
/// stripped from the normalized output.
#[derive(Default)]
pub struct ObjectSchema {
    fields: Vec<(String, Box<dyn Validator>)>,
}

pub fn object() -> ObjectSchema {
    ObjectSchema::default()
}

impl ObjectSchema {
    pub fn field<S, V>(mut self, name: S, schema: V) -> Self
    where
        S: Into<String>,
        V: Validator + 'static,
    {
        self.fields.push((name.into(), Box::new(schema)));
        self
    }
}

impl Validator for ObjectSchema {
    fn parse(&self, value: &Value) -> Result<Value, SchemaError> {
        let Value::Object(map) = value else {
            return Err(expected("object", value));
        };
        let mut normalized = Map::new();
        for (name, schema) in &self.fields {
            match map.get(name) {
                Some(field) => {
                    let parsed = schema.parse(field).map_err(|e| e.at_field(name))?;
                    normalized.insert(name.clone(), parsed);
                }
                None => {
                    // Absent fields validate as null so optional/default
                    // wrappers can accept or fill them.
                    let parsed = schema.parse(&Value::Null).map_err(|_| {
                        SchemaError::new("missing required field").at_field(name)
                    })?;
                    normalized.insert(name.clone(), parsed);
                }
            }
        }
        Ok(Value::Object(normalized))
    }
}

/// Wrapper accepting null (or an absent object field) as-is.
pub struct OptionalSchema<V: Validator> {
    inner: V,
}

impl<V: Validator> Validator for OptionalSchema<V> {
    fn parse(&self, value: &Value) -> Result<Value, SchemaError> {
        if value.is_null() {
            Ok(Value::Null)
        } else {
            self.inner.parse(value)
        }
    }
}

/// Wrapper replacing null (or an absent object field) with a default value.
pub struct DefaultSchema<V: Validator> {
    inner: V,
    default: Value,
}

impl<V: Validator> Validator for DefaultSchema<V> {
    fn parse(&self, value: &Value) -> Result<Value, SchemaError> {
        if value.is_null() {
            Ok(self.default.clone())
        } else {
            self.inner.parse(value)
        }
    }
}

/// Builder-style modifiers available on every validator.
pub trait ValidatorExt: Validator + Sized {
    /// Also accept null (and absent object fields), passing it through.
    fn optional(self) -> OptionalSchema<Self> {
        OptionalSchema { inner: self }
    }

    /// Replace null (and absent object fields) with `default`.
    ///
    /// The default is stored verbatim; it is not itself validated.
    fn default_value(self, default: Value) -> DefaultSchema<Self> {
        DefaultSchema {
            inner: self,
            default,
        }
    }
}

impl<V: Validator + Sized> ValidatorExt for V {}

/// Schema delegating to serde: a value conforms iff it deserializes into
/// `T`. Normalization is whatever `T`'s serde impls do (e.g. filling
/// `#[serde(default)]` fields, dropping unknown fields).
pub struct TypedSchema<T> {
    _marker: PhantomData<fn() -> T>,
}

pub fn of_type<T: Serialize + DeserializeOwned>() -> TypedSchema<T> {
    TypedSchema {
        _marker: PhantomData,
    }
}

impl<T: Serialize + DeserializeOwned> Validator for TypedSchema<T> {
    fn parse(&self, value: &Value) -> Result<Value, SchemaError> {
        let typed: T = serde_json::from_value(value.clone())
            .map_err(|e| SchemaError::new(e.to_string()))?;
        serde_json::to_value(&typed).map_err(|e| SchemaError::new(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn string_accepts_and_rejects() {
        assert_eq!(string().parse(&json!("hi")).unwrap(), json!("hi"));
        let err = string().parse(&json!(7)).unwrap_err();
        assert_eq!(err.to_string(), "expected string, got number");
    }

    #[test]
    fn string_length_bounds() {
        let schema = string().min_len(2).max_len(4);
        assert!(schema.parse(&json!("ab")).is_ok());
        assert!(schema.parse(&json!("a")).is_err());
        assert!(schema.parse(&json!("abcde")).is_err());
    }

    #[test]
    fn number_range_bounds() {
        let schema = number().min(0.0).max(10.0);
        assert!(schema.parse(&json!(5)).is_ok());
        assert!(schema.parse(&json!(-1)).is_err());
        assert!(schema.parse(&json!(11)).is_err());
        assert!(schema.parse(&json!("5")).is_err());
    }

    #[test]
    fn integer_rejects_fractions() {
        assert!(integer().parse(&json!(3)).is_ok());
        assert!(integer().parse(&json!(3.5)).is_err());
    }

    #[test]
    fn boolean_basic() {
        assert!(boolean().parse(&json!(true)).is_ok());
        assert!(boolean().parse(&json!(0)).is_err());
    }

    #[test]
    fn one_of_variants() {
        let schema = one_of(["light", "dark"]);
        assert!(schema.parse(&json!("dark")).is_ok());
        let err = schema.parse(&json!("sepia")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected one of [light, dark], got \"sepia\""
        );
    }

    #[test]
    fn array_reports_failing_index() {
        let schema = array(number());
        assert!(schema.parse(&json!([1, 2, 3])).is_ok());
        let err = schema.parse(&json!([1, "x", 3])).unwrap_err();
        assert_eq!(err.to_string(), "at $[1]: expected number, got string");
    }

    #[test]
    fn object_validates_fields_and_reports_path() {
        let schema = object()
            .field("id", string())
            .field("name", string());
        let ok = schema.parse(&json!({"id": "1", "name": "Alice"})).unwrap();
        assert_eq!(ok, json!({"id": "1", "name": "Alice"}));

        let err = schema.parse(&json!({"id": 1, "name": "Alice"})).unwrap_err();
        assert_eq!(err.to_string(), "at $.id: expected string, got number");
    }

    #[test]
    fn object_requires_declared_fields() {
        let schema = object().field("id", string());
        let err = schema.parse(&json!({})).unwrap_err();
        assert_eq!(err.to_string(), "at $.id: missing required field");
    }

    #[test]
    fn object_strips_unknown_fields() {
        let schema = object().field("id", string());
        let normalized = schema
            .parse(&json!({"id": "1", "extra": true}))
            .unwrap();
        assert_eq!(normalized, json!({"id": "1"}));
    }

    #[test]
    fn nested_object_path() {
        let schema = object().field("user", object().field("id", string()));
        let err = schema
            .parse(&json!({"user": {"id": 42}}))
            .unwrap_err();
        assert_eq!(err.to_string(), "at $.user.id: expected string, got number");
    }

    #[test]
    fn optional_accepts_null_and_absence() {
        let schema = object().field("note", string().optional());
        assert_eq!(
            schema.parse(&json!({"note": null})).unwrap(),
            json!({"note": null})
        );
        assert_eq!(schema.parse(&json!({})).unwrap(), json!({"note": null}));
        assert!(schema.parse(&json!({"note": 1})).is_err());
    }

    #[test]
    fn default_fills_absent_field() {
        let schema = object().field("limit", integer().default_value(json!(10)));
        assert_eq!(schema.parse(&json!({})).unwrap(), json!({"limit": 10}));
        assert_eq!(
            schema.parse(&json!({"limit": 3})).unwrap(),
            json!({"limit": 3})
        );
    }

    #[test]
    fn of_type_round_trips_through_serde() {
        #[derive(Debug, Serialize, Deserialize)]
        struct Prefs {
            theme: String,
            #[serde(default)]
            font_size: u32,
        }

        let schema = of_type::<Prefs>();
        // serde fills the defaulted field during normalization
        let normalized = schema.parse(&json!({"theme": "dark"})).unwrap();
        assert_eq!(normalized, json!({"theme": "dark", "font_size": 0}));

        assert!(schema.parse(&json!({"theme": 7})).is_err());
    }
}
