//! JSON Bridge
//!
//! Converts between tagged values and the untyped JSON representation used
//! for interchange. Flattening is lossy in one direction only: struct type
//! identity is erased (a struct becomes a plain object keyed by member name),
//! so unflattening is driven by an explicit target type descriptor.
//!
//! Round-trip law: for any value `v` whose type contains no functions and no
//! dict-of-json, `unflatten(flatten(v), typeof v) == v`.

use crate::error::RuntimeError;
use crate::types::{TypeDescriptor, type_from_json, type_to_json};
use crate::value::Value;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// Flatten a value into its JSON form.
///
/// Structs become objects keyed by member name, vectors arrays, dicts
/// objects, typeid values the structured type encoding, primitives their
/// JSON counterparts; json payloads pass through. Function values,
/// `undefined`, and `void` have no JSON form and fail with `TypeMismatch`,
/// as do non-finite floats (JSON has no encoding for them).
pub fn flatten_to_json(value: &Value) -> Result<JsonValue, RuntimeError> {
    match value {
        Value::Bool(b) => Ok(JsonValue::Bool(*b)),
        Value::Int(i) => Ok(JsonValue::from(*i as i64)),
        Value::Float(f) => {
            serde_json::Number::from_f64(f64::from(*f))
                .map(JsonValue::Number)
                .ok_or_else(|| {
                    RuntimeError::TypeMismatch(format!("cannot flatten non-finite float {}", f))
                })
        }
        Value::String(s) => Ok(JsonValue::String(s.as_str().to_string())),
        Value::Json(j) => Ok(j.as_ref().clone()),
        Value::Typeid(t) => Ok(type_to_json(t)),
        Value::Struct(s) => {
            let def = s
                .struct_type
                .struct_def()
                .expect("struct value carries a struct type");
            let mut object = Map::new();
            for (member, member_value) in def.members.iter().zip(&s.members) {
                object.insert(member.name.clone(), flatten_to_json(member_value)?);
            }
            Ok(JsonValue::Object(object))
        }
        Value::Vector(v) => {
            let mut items = Vec::with_capacity(v.elements.len());
            for e in &v.elements {
                items.push(flatten_to_json(e)?);
            }
            Ok(JsonValue::Array(items))
        }
        Value::Dict(d) => {
            let mut object = Map::new();
            for (key, entry) in &d.entries {
                object.insert(key.clone(), flatten_to_json(entry)?);
            }
            Ok(JsonValue::Object(object))
        }
        Value::Undefined | Value::Void | Value::Function(_) => Err(RuntimeError::TypeMismatch(
            format!("cannot flatten {} to json", value.base_kind().name()),
        )),
    }
}

/// Rebuild a value of `target_type` from its JSON form.
///
/// The JSON shape must match the target kind: boolean for bool, number for
/// int/float, string for string, array for vector, object for dict and
/// struct. Struct members are looked up by name; unknown extra keys are
/// ignored, missing keys fail. Numbers unflattened to `int` truncate toward
/// zero. All shape failures are `JsonShapeMismatch`.
pub fn unflatten_from_json(
    v: &JsonValue,
    target_type: &TypeDescriptor,
) -> Result<Value, RuntimeError> {
    match target_type {
        TypeDescriptor::Bool => match v {
            JsonValue::Bool(b) => Ok(Value::Bool(*b)),
            other => Err(shape_error("expected true or false", other)),
        },
        TypeDescriptor::Int => match v.as_f64() {
            Some(n) => Ok(Value::Int(n as i32)),
            None => Err(shape_error("expected a number", v)),
        },
        TypeDescriptor::Float => match v.as_f64() {
            Some(n) => Ok(Value::Float(n as f32)),
            None => Err(shape_error("expected a number", v)),
        },
        TypeDescriptor::String => match v {
            JsonValue::String(s) => Ok(Value::make_string(s.clone())),
            other => Err(shape_error("expected a string", other)),
        },
        TypeDescriptor::Json => Ok(Value::make_json(v.clone())),
        TypeDescriptor::Typeid => Ok(Value::make_typeid(type_from_json(v)?)),
        TypeDescriptor::Struct(def) => match v {
            JsonValue::Object(object) => {
                let mut members = Vec::with_capacity(def.members.len());
                for member in &def.members {
                    let member_json = object.get(&member.name).ok_or_else(|| {
                        RuntimeError::JsonShapeMismatch(format!(
                            "missing member \"{}\" for {}",
                            member.name,
                            target_type.to_signature()
                        ))
                    })?;
                    members.push(unflatten_from_json(member_json, &member.member_type)?);
                }
                Value::make_struct(target_type.clone(), members)
            }
            other => Err(shape_error("expected an object", other)),
        },
        TypeDescriptor::Vector(element_type) => match v {
            JsonValue::Array(items) => {
                let mut elements = Vec::with_capacity(items.len());
                for item in items {
                    elements.push(unflatten_from_json(item, element_type)?);
                }
                Value::make_vector((**element_type).clone(), elements)
            }
            other => Err(shape_error("expected an array", other)),
        },
        TypeDescriptor::Dict(value_type) => match v {
            JsonValue::Object(object) => {
                let mut entries = BTreeMap::new();
                for (key, entry) in object {
                    entries.insert(key.clone(), unflatten_from_json(entry, value_type)?);
                }
                Value::make_dict((**value_type).clone(), entries)
            }
            other => Err(shape_error("expected an object", other)),
        },
        TypeDescriptor::Undefined
        | TypeDescriptor::Dynamic
        | TypeDescriptor::Void
        | TypeDescriptor::Function(_) => Err(RuntimeError::JsonShapeMismatch(format!(
            "cannot unflatten to {}",
            target_type.to_signature()
        ))),
    }
}

/// Flatten a list of values into one JSON array.
pub fn values_to_json_array(values: &[Value]) -> Result<JsonValue, RuntimeError> {
    let mut items = Vec::with_capacity(values.len());
    for v in values {
        items.push(flatten_to_json(v)?);
    }
    Ok(JsonValue::Array(items))
}

fn shape_error(wanted: &str, got: &JsonValue) -> RuntimeError {
    RuntimeError::JsonShapeMismatch(format!("{}, got {}", wanted, got))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StructMember;
    use serde_json::json;

    fn pixel_type() -> TypeDescriptor {
        TypeDescriptor::struct_of(vec![
            StructMember::new("r", TypeDescriptor::Int),
            StructMember::new("g", TypeDescriptor::Int),
            StructMember::new("b", TypeDescriptor::Int),
        ])
    }

    fn roundtrip(v: &Value) {
        let j = flatten_to_json(v).unwrap();
        let back = unflatten_from_json(&j, &v.value_type()).unwrap();
        assert_eq!(&back, v);
    }

    #[test]
    fn test_roundtrip_primitives() {
        roundtrip(&Value::Bool(true));
        roundtrip(&Value::Int(-42));
        roundtrip(&Value::Float(13.5));
        roundtrip(&Value::make_string("Hello, world"));
        roundtrip(&Value::make_json(json!({"nested": [1, null, "x"]})));
    }

    #[test]
    fn test_roundtrip_typeid() {
        roundtrip(&Value::make_typeid(TypeDescriptor::vector_of(pixel_type())));
    }

    #[test]
    fn test_roundtrip_composites() {
        let p = Value::make_struct(
            pixel_type(),
            vec![Value::Int(10), Value::Int(20), Value::Int(30)],
        )
        .unwrap();
        roundtrip(&p);

        let v = Value::make_vector(pixel_type(), vec![p.clone(), p.clone()]).unwrap();
        roundtrip(&v);

        let mut entries = std::collections::BTreeMap::new();
        entries.insert("one".to_string(), Value::Int(1));
        entries.insert("two".to_string(), Value::Int(2));
        let d = Value::make_dict(TypeDescriptor::Int, entries).unwrap();
        roundtrip(&d);
    }

    #[test]
    fn test_struct_flattens_to_object_keyed_by_member() {
        let p = Value::make_struct(
            pixel_type(),
            vec![Value::Int(10), Value::Int(20), Value::Int(30)],
        )
        .unwrap();
        assert_eq!(flatten_to_json(&p).unwrap(), json!({"r": 10, "g": 20, "b": 30}));
    }

    #[test]
    fn test_unflatten_struct_ignores_extra_keys() {
        let j = json!({"r": 1, "g": 2, "b": 3, "alpha": 255});
        let p = unflatten_from_json(&j, &pixel_type()).unwrap();
        assert_eq!(
            p,
            Value::make_struct(
                pixel_type(),
                vec![Value::Int(1), Value::Int(2), Value::Int(3)]
            )
            .unwrap()
        );
    }

    #[test]
    fn test_unflatten_struct_missing_key_fails() {
        let j = json!({"r": 1, "g": 2});
        let err = unflatten_from_json(&j, &pixel_type()).unwrap_err();
        assert_eq!(err.kind(), "JsonShapeMismatch");
    }

    #[test]
    fn test_unflatten_shape_mismatches() {
        let vector_of_int = TypeDescriptor::vector_of(TypeDescriptor::Int);
        let cases: Vec<(JsonValue, TypeDescriptor)> = vec![
            (json!("x"), TypeDescriptor::Int),
            (json!(1), TypeDescriptor::Bool),
            (json!({"a": 1}), vector_of_int),
            (json!([1]), TypeDescriptor::dict_of(TypeDescriptor::Int)),
            (json!(null), TypeDescriptor::String),
        ];
        for (j, t) in &cases {
            let err = unflatten_from_json(j, t).unwrap_err();
            assert_eq!(err.kind(), "JsonShapeMismatch", "for {} as {}", j, t.to_signature());
        }
    }

    #[test]
    fn test_unflatten_int_truncates_toward_zero() {
        assert_eq!(
            unflatten_from_json(&json!(3.9), &TypeDescriptor::Int).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            unflatten_from_json(&json!(-3.9), &TypeDescriptor::Int).unwrap(),
            Value::Int(-3)
        );
    }

    #[test]
    fn test_flatten_function_fails() {
        let f = Value::make_function(
            TypeDescriptor::function_of(TypeDescriptor::Int, vec![]),
            1000,
        )
        .unwrap();
        let err = flatten_to_json(&f).unwrap_err();
        assert_eq!(err.kind(), "TypeMismatch");
    }

    #[test]
    fn test_unflatten_to_function_fails() {
        let t = TypeDescriptor::function_of(TypeDescriptor::Int, vec![]);
        let err = unflatten_from_json(&json!(0), &t).unwrap_err();
        assert_eq!(err.kind(), "JsonShapeMismatch");
    }

    #[test]
    fn test_values_to_json_array() {
        let j = values_to_json_array(&[Value::Int(1), Value::make_string("two")]).unwrap();
        assert_eq!(j, json!([1, "two"]));
    }
}
