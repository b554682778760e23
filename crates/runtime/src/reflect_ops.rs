//! Reflection Host Functions
//!
//! `to_string`, `to_pretty_string`, and `typeof`. These accept any value;
//! the runtime type stays queryable because every value carries its full
//! descriptor.

use crate::interpreter::Interpreter;
use floyd_core::error::RuntimeError;
use floyd_core::json::flatten_to_json;
use floyd_core::value::{Value, to_compact_string};

/// to_string(any) -> string
///
/// Compact textual form. Strings are NOT quoted.
pub fn host_to_string(_vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::ArityMismatch(
            "to_string() requires 1 argument".to_string(),
        ));
    }
    Ok(Value::make_string(to_compact_string(&args[0])))
}

/// to_pretty_string(any) -> string
///
/// Multi-line pretty-printed JSON form of the flattened value.
pub fn host_to_pretty_string(
    _vm: &mut Interpreter,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::ArityMismatch(
            "to_pretty_string() requires 1 argument".to_string(),
        ));
    }
    let flattened = flatten_to_json(&args[0])?;
    let pretty = serde_json::to_string_pretty(&flattened)
        .map_err(|e| RuntimeError::JsonShapeMismatch(e.to_string()))?;
    Ok(Value::make_string(pretty))
}

/// typeof(any) -> typeid
pub fn host_typeof(_vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::ArityMismatch(
            "typeof() requires 1 argument".to_string(),
        ));
    }
    Ok(Value::make_typeid(args[0].value_type()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Program;
    use floyd_core::types::TypeDescriptor;
    use std::rc::Rc;

    fn test_vm() -> Interpreter {
        Interpreter::new(Rc::new(Program::default())).unwrap()
    }

    #[test]
    fn test_to_string_leaves_strings_bare() {
        let mut vm = test_vm();
        let s = host_to_string(&mut vm, &[Value::make_string("plain")]).unwrap();
        assert_eq!(s, Value::make_string("plain"));
    }

    #[test]
    fn test_to_string_of_int() {
        let mut vm = test_vm();
        let s = host_to_string(&mut vm, &[Value::Int(1003)]).unwrap();
        assert_eq!(s, Value::make_string("1003"));
    }

    #[test]
    fn test_to_pretty_string_is_json() {
        let mut vm = test_vm();
        let v = Value::make_vector(
            TypeDescriptor::Int,
            vec![Value::Int(1), Value::Int(2)],
        )
        .unwrap();
        let s = host_to_pretty_string(&mut vm, &[v]).unwrap();
        let text = s.get_string().unwrap().to_string();
        assert!(text.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, serde_json::json!([1, 2]));
    }

    #[test]
    fn test_typeof_returns_runtime_type() {
        let mut vm = test_vm();
        let t = host_typeof(&mut vm, &[Value::Int(5)]).unwrap();
        assert_eq!(t.get_typeid().unwrap(), &TypeDescriptor::Int);

        let v = Value::make_vector(TypeDescriptor::Int, vec![]).unwrap();
        let t = host_typeof(&mut vm, &[v]).unwrap();
        assert_eq!(
            t.get_typeid().unwrap(),
            &TypeDescriptor::vector_of(TypeDescriptor::Int)
        );
    }
}
