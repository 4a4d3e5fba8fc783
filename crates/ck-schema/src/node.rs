//! `SchemaNode` — a JSON-schema subset covering required fields, nested
//! object/array/string/number/bool/null types, enumerations, and
//! externally-tagged unions (`Position = Square{..} | Hex{..} | Region{..}`).
//!
//! Parsing and validating a small declarative grammar out of a `Value` tree
//! mirrors the shape of `dt-schedule::loader::parse_destination` (a tiny
//! hand-rolled interpreter over a handful of string tags) scaled up to a
//! recursive structure.

use std::collections::BTreeMap;

use ck_core::{PathSegment, Value};

use crate::error::{SchemaError, SchemaResult};

#[derive(Clone, Debug)]
pub enum SchemaNode {
    Null,
    Bool,
    Integer,
    Float,
    String { enum_values: Option<Vec<String>> },
    Array { items: Box<SchemaNode> },
    Object { required: Vec<String>, properties: BTreeMap<String, SchemaNode> },
    /// `{"oneOf": [...]}` — an externally tagged union of object variants.
    OneOf(Vec<SchemaNode>),
    /// `{"type": ["X", "null"]}` — `X` or `Value::Null`.
    Nullable(Box<SchemaNode>),
    /// No constraint — matches anything. Used for free-form fields such as
    /// a job's `target`.
    Any,
}

impl SchemaNode {
    /// Parse one schema node from its JSON-schema-subset `serde_json`
    /// representation (the on-disk format loaded by `ck-schema::registry`).
    pub fn parse(kind: &str, json: &serde_json::Value) -> SchemaResult<SchemaNode> {
        let malformed = |reason: String| SchemaError::Malformed { path: kind.into(), reason };

        if let Some(variants) = json.get("oneOf").and_then(|v| v.as_array()) {
            let parsed = variants
                .iter()
                .map(|v| SchemaNode::parse(kind, v))
                .collect::<SchemaResult<Vec<_>>>()?;
            return Ok(SchemaNode::OneOf(parsed));
        }

        let Some(ty) = json.get("type") else {
            return Ok(SchemaNode::Any);
        };

        if let Some(types) = ty.as_array() {
            let names: Vec<&str> = types.iter().filter_map(|t| t.as_str()).collect();
            if names.contains(&"null") && names.len() == 2 {
                let other = names.iter().find(|n| **n != "null").copied().unwrap_or("null");
                let mut rest = json.clone();
                rest["type"] = serde_json::Value::String(other.to_string());
                return Ok(SchemaNode::Nullable(Box::new(SchemaNode::parse(kind, &rest)?)));
            }
            return Err(malformed(format!("unsupported multi-type node: {types:?}")));
        }

        let ty = ty.as_str().ok_or_else(|| malformed("`type` must be a string".into()))?;

        match ty {
            "null" => Ok(SchemaNode::Null),
            "boolean" => Ok(SchemaNode::Bool),
            "integer" => Ok(SchemaNode::Integer),
            "number" => Ok(SchemaNode::Float),
            "string" => {
                let enum_values = json.get("enum").and_then(|e| e.as_array()).map(|values| {
                    values.iter().filter_map(|v| v.as_str().map(str::to_string)).collect()
                });
                Ok(SchemaNode::String { enum_values })
            }
            "array" => {
                let items = match json.get("items") {
                    Some(items) => SchemaNode::parse(kind, items)?,
                    None => SchemaNode::Any,
                };
                Ok(SchemaNode::Array { items: Box::new(items) })
            }
            "object" => {
                let required = json
                    .get("required")
                    .and_then(|r| r.as_array())
                    .map(|r| r.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                    .unwrap_or_default();
                let mut properties = BTreeMap::new();
                if let Some(props) = json.get("properties").and_then(|p| p.as_object()) {
                    for (name, node) in props {
                        properties.insert(name.clone(), SchemaNode::parse(kind, node)?);
                    }
                }
                Ok(SchemaNode::Object { required, properties })
            }
            other => Err(malformed(format!("unsupported type {other:?}"))),
        }
    }

    /// Validate `value` against this node, appending to `path` as recursion
    /// descends. Returns the first violation encountered.
    pub fn validate(&self, kind: &str, value: &Value, path: &mut Vec<PathSegment>) -> SchemaResult<()> {
        match self {
            SchemaNode::Any => Ok(()),
            SchemaNode::Null => expect(kind, value.is_null(), "null", value, path),
            SchemaNode::Bool => expect(kind, matches!(value, Value::Bool(_)), "bool", value, path),
            SchemaNode::Integer => {
                expect(kind, matches!(value, Value::Int(_)), "integer", value, path)
            }
            SchemaNode::Float => {
                expect(kind, matches!(value, Value::Int(_) | Value::Float(_)), "float", value, path)
            }
            SchemaNode::String { enum_values } => {
                let Value::String(s) = value else {
                    return violation(kind, path, "string", value);
                };
                if let Some(allowed) = enum_values {
                    if !allowed.contains(s) {
                        return violation(kind, path, &format!("one of {allowed:?}"), value);
                    }
                }
                Ok(())
            }
            SchemaNode::Array { items } => {
                let Value::Seq(seq) = value else {
                    return violation(kind, path, "array", value);
                };
                for (i, item) in seq.iter().enumerate() {
                    path.push(PathSegment::Index(i));
                    items.validate(kind, item, path)?;
                    path.pop();
                }
                Ok(())
            }
            SchemaNode::Object { required, properties } => {
                let Value::Map(map) = value else {
                    return violation(kind, path, "object", value);
                };
                for field in required {
                    if !map.contains_key(field) {
                        path.push(PathSegment::Field(field.clone()));
                        let err = violation(kind, path, "required field present", &Value::Null);
                        path.pop();
                        return err;
                    }
                }
                for (name, node) in properties {
                    if let Some(field_value) = map.get(name) {
                        path.push(PathSegment::Field(name.clone()));
                        node.validate(kind, field_value, path)?;
                        path.pop();
                    }
                }
                Ok(())
            }
            SchemaNode::Nullable(inner) => {
                if value.is_null() {
                    Ok(())
                } else {
                    inner.validate(kind, value, path)
                }
            }
            SchemaNode::OneOf(variants) => self.validate_one_of(variants, kind, value, path),
        }
    }

    fn validate_one_of(
        &self,
        variants: &[SchemaNode],
        kind: &str,
        value: &Value,
        path: &mut Vec<PathSegment>,
    ) -> SchemaResult<()> {
        // Try each variant in turn; the first to validate cleanly wins.
        for variant in variants {
            let mut scratch = path.clone();
            if variant.validate(kind, value, &mut scratch).is_ok() {
                return Ok(());
            }
        }
        // None matched: report the variant with the fewest unmatched
        // required fields.
        let best = variants
            .iter()
            .min_by_key(|v| v.unmatched_required(value))
            .expect("oneOf has at least one variant");
        best.validate(kind, value, path)
    }

    /// Count of required fields missing (plus one per mistyped present
    /// field) — used only to rank `oneOf` variants for error reporting.
    fn unmatched_required(&self, value: &Value) -> usize {
        match self {
            SchemaNode::Object { required, properties } => match value.as_map() {
                Some(map) => {
                    let missing = required.iter().filter(|r| !map.contains_key(*r)).count();
                    let mistyped = properties
                        .iter()
                        .filter(|(name, node)| {
                            map.get(*name).is_some_and(|v| node.validate("", v, &mut vec![]).is_err())
                        })
                        .count();
                    missing + mistyped
                }
                None => required.len().max(1),
            },
            _ => usize::from(self.validate("", value, &mut vec![]).is_err()),
        }
    }
}

fn expect(
    kind: &str,
    ok: bool,
    expected: &str,
    value: &Value,
    path: &[PathSegment],
) -> SchemaResult<()> {
    if ok {
        Ok(())
    } else {
        violation(kind, &path.to_vec(), expected, value)
    }
}

fn violation(kind: &str, path: &[PathSegment], expected: &str, value: &Value) -> SchemaResult<()> {
    Err(SchemaError::Violation {
        kind: kind.to_string(),
        path: path.to_vec(),
        expected: expected.to_string(),
        actual: value.type_name().to_string(),
    })
}
