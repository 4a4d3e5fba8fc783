//! Unit tests for schema parsing, validation, and union matching.

use ck_core::Value;

use crate::node::SchemaNode;
use crate::registry::SchemaRegistry;

fn object_schema(json: serde_json::Value) -> SchemaNode {
    SchemaNode::parse("test", &json).expect("schema parses")
}

#[test]
fn required_field_missing() {
    let node = object_schema(serde_json::json!({
        "type": "object",
        "required": ["x"],
        "properties": {"x": {"type": "integer"}}
    }));
    let value = Value::object([]);
    assert!(node.validate("test", &value, &mut Vec::new()).is_err());
}

#[test]
fn nested_array_of_objects() {
    let node = object_schema(serde_json::json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["kind", "amount"],
            "properties": {
                "kind": {"type": "string"},
                "amount": {"type": "integer"}
            }
        }
    }));
    let value = Value::Seq(vec![Value::object([
        ("kind", Value::String("wood".into())),
        ("amount", Value::Int(3)),
    ])]);
    assert!(node.validate("test", &value, &mut Vec::new()).is_ok());
}

#[test]
fn enum_rejects_unknown_variant() {
    let node = object_schema(serde_json::json!({
        "type": "string",
        "enum": ["square", "hex"]
    }));
    assert!(node.validate("test", &Value::String("triangle".into()), &mut Vec::new()).is_err());
    assert!(node.validate("test", &Value::String("hex".into()), &mut Vec::new()).is_ok());
}

#[test]
fn nullable_accepts_null_or_inner() {
    let node = object_schema(serde_json::json!({"type": ["integer", "null"]}));
    assert!(node.validate("test", &Value::Null, &mut Vec::new()).is_ok());
    assert!(node.validate("test", &Value::Int(5), &mut Vec::new()).is_ok());
    assert!(node.validate("test", &Value::String("x".into()), &mut Vec::new()).is_err());
}

#[test]
fn one_of_picks_matching_variant() {
    let square = object_schema(serde_json::json!({
        "type": "object",
        "required": ["kind", "x", "y"],
        "properties": {
            "kind": {"type": "string", "enum": ["square"]},
            "x": {"type": "integer"},
            "y": {"type": "integer"}
        }
    }));
    let hex = object_schema(serde_json::json!({
        "type": "object",
        "required": ["kind", "q", "r"],
        "properties": {
            "kind": {"type": "string", "enum": ["hex"]},
            "q": {"type": "integer"},
            "r": {"type": "integer"}
        }
    }));
    let position = SchemaNode::OneOf(vec![square, hex]);

    let as_hex = Value::object([
        ("kind", Value::String("hex".into())),
        ("q", Value::Int(1)),
        ("r", Value::Int(-1)),
    ]);
    assert!(position.validate("position", &as_hex, &mut Vec::new()).is_ok());
}

#[test]
fn one_of_reports_closest_variant_on_failure() {
    let square = object_schema(serde_json::json!({
        "type": "object",
        "required": ["kind", "x", "y"],
        "properties": {"kind": {"type": "string"}, "x": {"type": "integer"}, "y": {"type": "integer"}}
    }));
    let hex = object_schema(serde_json::json!({
        "type": "object",
        "required": ["kind", "q", "r"],
        "properties": {"kind": {"type": "string"}, "q": {"type": "integer"}, "r": {"type": "integer"}}
    }));
    let position = SchemaNode::OneOf(vec![square, hex]);

    // Missing only "y": closer to the square variant than the hex variant.
    let almost_square =
        Value::object([("kind", Value::String("square".into())), ("x", Value::Int(1))]);
    let err = position.validate("position", &almost_square, &mut Vec::new()).unwrap_err();
    assert!(err.path_string().contains("y"));
}

#[test]
fn registry_validates_loaded_schema() {
    let mut registry = SchemaRegistry::new();
    registry.register_schema(
        "inventory",
        object_schema(serde_json::json!({
            "type": "object",
            "required": ["slots"],
            "properties": {"slots": {"type": "array", "items": {"type": "string"}}}
        })),
    );
    assert_eq!(registry.list_components(), vec!["inventory"]);

    let good = Value::object([(
        "slots",
        Value::Seq(vec![Value::String("axe".into())]),
    )]);
    assert!(registry.validate("inventory", &good).is_ok());
    assert!(registry.validate("unknown", &good).is_err());
}
