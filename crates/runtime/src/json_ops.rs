//! JSON Host Functions
//!
//! Text ⇄ json conversions and the flatten/unflatten bridge between typed
//! values and json payloads.

use crate::interpreter::Interpreter;
use floyd_core::error::RuntimeError;
use floyd_core::json;
use floyd_core::value::Value;
use serde_json::Value as JsonValue;

/// decode_json(string) -> json
///
/// Parses JSON text into a json payload.
pub fn host_decode_json(_vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::ArityMismatch(
            "decode_json() requires 1 argument".to_string(),
        ));
    }
    let text = args[0].get_string()?;
    let parsed: JsonValue = serde_json::from_str(text)
        .map_err(|e| RuntimeError::JsonShapeMismatch(format!("invalid json text: {}", e)))?;
    Ok(Value::make_json(parsed))
}

/// encode_json(json) -> string
///
/// Serializes a json payload to compact JSON text.
pub fn host_encode_json(_vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::ArityMismatch(
            "encode_json() requires 1 argument".to_string(),
        ));
    }
    let payload = args[0].get_json()?;
    let text = serde_json::to_string(payload)
        .map_err(|e| RuntimeError::JsonShapeMismatch(e.to_string()))?;
    Ok(Value::make_string(text))
}

/// flatten_to_json(any) -> json
pub fn host_flatten_to_json(_vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::ArityMismatch(
            "flatten_to_json() requires 1 argument".to_string(),
        ));
    }
    Ok(Value::make_json(json::flatten_to_json(&args[0])?))
}

/// unflatten_from_json(json, typeid) -> any
pub fn host_unflatten_from_json(
    _vm: &mut Interpreter,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::ArityMismatch(
            "unflatten_from_json() requires 2 arguments".to_string(),
        ));
    }
    let payload = args[0].get_json()?;
    let target_type = args[1].get_typeid()?;
    json::unflatten_from_json(payload, target_type)
}

/// get_json_type(json) -> int
///
/// 1=object, 2=array, 3=string, 4=number, 5=true, 6=false, 7=null.
pub fn host_get_json_type(_vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::ArityMismatch(
            "get_json_type() requires 1 argument".to_string(),
        ));
    }
    let code = match args[0].get_json()? {
        JsonValue::Object(_) => 1,
        JsonValue::Array(_) => 2,
        JsonValue::String(_) => 3,
        JsonValue::Number(_) => 4,
        JsonValue::Bool(true) => 5,
        JsonValue::Bool(false) => 6,
        JsonValue::Null => 7,
    };
    Ok(Value::Int(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Program;
    use floyd_core::types::TypeDescriptor;
    use serde_json::json;
    use std::rc::Rc;

    fn test_vm() -> Interpreter {
        Interpreter::new(Rc::new(Program::default())).unwrap()
    }

    #[test]
    fn test_decode_then_encode() {
        let mut vm = test_vm();
        let decoded =
            host_decode_json(&mut vm, &[Value::make_string(r#"{"a": [1, 2]}"#)]).unwrap();
        assert_eq!(decoded, Value::make_json(json!({"a": [1, 2]})));
        let encoded = host_encode_json(&mut vm, &[decoded]).unwrap();
        assert_eq!(encoded, Value::make_string(r#"{"a":[1,2]}"#));
    }

    #[test]
    fn test_decode_rejects_bad_text() {
        let mut vm = test_vm();
        let err = host_decode_json(&mut vm, &[Value::make_string("{nope")]).unwrap_err();
        assert_eq!(err.kind(), "JsonShapeMismatch");
    }

    #[test]
    fn test_get_json_type_codes() {
        let mut vm = test_vm();
        let cases = [
            (json!({}), 1),
            (json!([]), 2),
            (json!("s"), 3),
            (json!(1.5), 4),
            (json!(true), 5),
            (json!(false), 6),
            (json!(null), 7),
        ];
        for (payload, code) in cases {
            assert_eq!(
                host_get_json_type(&mut vm, &[Value::make_json(payload)]).unwrap(),
                Value::Int(code)
            );
        }
    }

    #[test]
    fn test_flatten_unflatten_host_pair() {
        let mut vm = test_vm();
        let v = Value::make_vector(
            TypeDescriptor::Int,
            vec![Value::Int(7), Value::Int(8), Value::Int(9)],
        )
        .unwrap();
        let flattened = host_flatten_to_json(&mut vm, &[v.clone()]).unwrap();
        assert_eq!(flattened, Value::make_json(json!([7, 8, 9])));

        let back = host_unflatten_from_json(
            &mut vm,
            &[
                flattened,
                Value::make_typeid(TypeDescriptor::vector_of(TypeDescriptor::Int)),
            ],
        )
        .unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn test_unflatten_requires_json_and_typeid() {
        let mut vm = test_vm();
        let err = host_unflatten_from_json(
            &mut vm,
            &[Value::Int(1), Value::make_typeid(TypeDescriptor::Int)],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "TypeMismatch");
    }
}
