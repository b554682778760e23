//! Collection Host Functions
//!
//! The polymorphic collection library: `size`, `find`, `exists`, `erase`,
//! `push_back`, `subset`, `replace`, and `update`. One module rather than
//! one per container because every operation here dispatches on the runtime
//! kind of its first argument (string, vector, dict, and for some, json).
//!
//! All operations are non-destructive: the input value is never mutated, a
//! new value is returned. String positions are character positions, so
//! results stay valid UTF-8.

use crate::interpreter::Interpreter;
use floyd_core::error::RuntimeError;
use floyd_core::value::{Value, type_accepts};
use serde_json::Value as JsonValue;

/// size(string | json | vector | dict) -> int
///
/// Characters of a string, elements of a vector, entries of a dict. For a
/// json payload: entries of an object, elements of an array, characters of a
/// string node; other json kinds have no size.
pub fn host_size(_vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::ArityMismatch(
            "size() requires 1 argument".to_string(),
        ));
    }
    let n = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Json(j) => match j.as_ref() {
            JsonValue::Object(o) => o.len(),
            JsonValue::Array(a) => a.len(),
            JsonValue::String(s) => s.chars().count(),
            other => {
                return Err(RuntimeError::TypeMismatch(format!(
                    "size() is not defined for json {}",
                    json_kind_name(other)
                )));
            }
        },
        Value::Vector(v) => v.elements.len(),
        Value::Dict(d) => d.entries.len(),
        other => {
            return Err(RuntimeError::TypeMismatch(format!(
                "size() is not defined for {}",
                other.base_kind().name()
            )));
        }
    };
    Ok(Value::Int(n as i32))
}

/// find(string, string) -> int | find(vector<T>, T) -> int
///
/// First character index of a substring, or first index of an equal vector
/// element; -1 when absent.
pub fn host_find(_vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::ArityMismatch(
            "find() requires 2 arguments".to_string(),
        ));
    }
    match &args[0] {
        Value::String(s) => {
            let wanted = args[1].get_string()?;
            let index = match s.find(wanted) {
                Some(byte_index) => s[..byte_index].chars().count() as i32,
                None => -1,
            };
            Ok(Value::Int(index))
        }
        Value::Vector(v) => {
            if !type_accepts(&v.element_type, &args[1]) {
                return Err(RuntimeError::TypeMismatch(format!(
                    "find() in a vector of {} takes a {}",
                    v.element_type.to_signature(),
                    v.element_type.to_signature()
                )));
            }
            let index = v
                .elements
                .iter()
                .position(|e| e == &args[1])
                .map(|i| i as i32)
                .unwrap_or(-1);
            Ok(Value::Int(index))
        }
        other => Err(RuntimeError::TypeMismatch(format!(
            "find() is not defined for {}",
            other.base_kind().name()
        ))),
    }
}

/// exists(dict<T>, string) -> bool
pub fn host_exists(_vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::ArityMismatch(
            "exists() requires 2 arguments".to_string(),
        ));
    }
    let dict = args[0].get_dict()?;
    let key = args[1].get_string()?;
    Ok(Value::Bool(dict.entries.contains_key(key)))
}

/// erase(dict<T>, string) -> dict<T>
///
/// Returns a copy without the key. Erasing an absent key is not an error.
pub fn host_erase(_vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::ArityMismatch(
            "erase() requires 2 arguments".to_string(),
        ));
    }
    let dict = args[0].get_dict()?;
    let key = args[1].get_string()?;
    let mut entries = dict.entries.clone();
    entries.remove(key);
    Value::make_dict(dict.value_type.clone(), entries)
}

/// push_back(string, string) -> string | push_back(vector<T>, T) -> vector<T>
pub fn host_push_back(_vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::ArityMismatch(
            "push_back() requires 2 arguments".to_string(),
        ));
    }
    match &args[0] {
        Value::String(s) => {
            let tail = args[1].get_string()?;
            Ok(Value::make_string(format!("{}{}", s, tail)))
        }
        Value::Vector(v) => {
            if !type_accepts(&v.element_type, &args[1]) {
                return Err(RuntimeError::TypeMismatch(format!(
                    "push_back() to a vector of {} takes a {}",
                    v.element_type.to_signature(),
                    v.element_type.to_signature()
                )));
            }
            let mut elements = v.elements.clone();
            elements.push(args[1].clone());
            Value::make_vector(v.element_type.clone(), elements)
        }
        other => Err(RuntimeError::TypeMismatch(format!(
            "push_back() is not defined for {}",
            other.base_kind().name()
        ))),
    }
}

/// subset(seq, int, int) -> seq
///
/// Half-open `[start, end)` range of a string or vector. Never fails: both
/// indices clamp to `[0, len]`, and start past end yields empty.
pub fn host_subset(_vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 3 {
        return Err(RuntimeError::ArityMismatch(
            "subset() requires 3 arguments".to_string(),
        ));
    }
    let start = args[1].get_int().map_err(|_| {
        RuntimeError::TypeMismatch("subset() start and end must be integers".to_string())
    })?;
    let end = args[2].get_int().map_err(|_| {
        RuntimeError::TypeMismatch("subset() start and end must be integers".to_string())
    })?;
    match &args[0] {
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = clamp_range(start, end, chars.len());
            let result: String = if start < end {
                chars[start..end].iter().collect()
            } else {
                String::new()
            };
            Ok(Value::make_string(result))
        }
        Value::Vector(v) => {
            let (start, end) = clamp_range(start, end, v.elements.len());
            let elements = if start < end {
                v.elements[start..end].to_vec()
            } else {
                vec![]
            };
            Value::make_vector(v.element_type.clone(), elements)
        }
        other => Err(RuntimeError::TypeMismatch(format!(
            "subset() is not defined for {}",
            other.base_kind().name()
        ))),
    }
}

/// replace(seq, int, int, seq) -> seq
///
/// Splices the fourth argument over the half-open `[start, end)` range.
/// The replacement's type must equal the subject's. Negative indices and
/// start past end fail; indices past the length clamp.
pub fn host_replace(_vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 4 {
        return Err(RuntimeError::ArityMismatch(
            "replace() requires 4 arguments".to_string(),
        ));
    }
    let start = args[1].get_int().map_err(|_| {
        RuntimeError::TypeMismatch("replace() start and end must be integers".to_string())
    })?;
    let end = args[2].get_int().map_err(|_| {
        RuntimeError::TypeMismatch("replace() start and end must be integers".to_string())
    })?;
    if start < 0 || end < 0 {
        return Err(RuntimeError::IndexOutOfBounds(
            "replace() start and end must be non-negative".to_string(),
        ));
    }
    if start > end {
        return Err(RuntimeError::IndexOutOfBounds(
            "replace() start must not exceed end".to_string(),
        ));
    }
    if args[3].value_type() != args[0].value_type() {
        return Err(RuntimeError::TypeMismatch(
            "replace() requires the 4th argument to have the same type as the 1st".to_string(),
        ));
    }
    match &args[0] {
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = clamp_range(start, end, chars.len());
            let mut result: String = chars[..start].iter().collect();
            result.push_str(args[3].get_string()?);
            result.extend(&chars[end..]);
            Ok(Value::make_string(result))
        }
        Value::Vector(v) => {
            let (start, end) = clamp_range(start, end, v.elements.len());
            let new_bits = args[3].get_vector()?;
            let mut elements = v.elements[..start].to_vec();
            elements.extend(new_bits.elements.iter().cloned());
            elements.extend(v.elements[end..].iter().cloned());
            Value::make_vector(v.element_type.clone(), elements)
        }
        other => Err(RuntimeError::TypeMismatch(format!(
            "replace() is not defined for {}",
            other.base_kind().name()
        ))),
    }
}

/// update(container, key, value) -> container
///
/// Non-destructive update:
/// - string: integer index, 1-character string replacement
/// - vector: integer index, element of the declared element type
/// - dict: string key (inserted or overwritten), value of the declared type
/// - struct: string member name, optionally dotted for a deep update; the
///   innermost replacement must match the declared member type at the leaf
///
/// Json payloads are rejected: structural path update over json is not
/// defined.
pub fn host_update(_vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 3 {
        return Err(RuntimeError::ArityMismatch(
            "update() requires 3 arguments".to_string(),
        ));
    }
    let obj = &args[0];
    let key = &args[1];
    let new_value = &args[2];
    match obj {
        Value::String(s) => {
            let index = key.get_int().map_err(|_| {
                RuntimeError::TypeMismatch("string update uses an integer index".to_string())
            })?;
            let replacement = new_value.get_string().map_err(|_| {
                RuntimeError::TypeMismatch(
                    "string update element must be a 1-character string".to_string(),
                )
            })?;
            let mut replacement_chars = replacement.chars();
            let (Some(c), None) = (replacement_chars.next(), replacement_chars.next()) else {
                return Err(RuntimeError::TypeMismatch(
                    "string update element must be a 1-character string".to_string(),
                ));
            };
            let count = s.chars().count();
            if index < 0 || index as usize >= count {
                return Err(RuntimeError::IndexOutOfBounds(format!(
                    "string index {} of {}",
                    index, count
                )));
            }
            let result: String = s
                .chars()
                .enumerate()
                .map(|(i, old)| if i == index as usize { c } else { old })
                .collect();
            Ok(Value::make_string(result))
        }
        Value::Json(_) => Err(RuntimeError::TypeMismatch(
            "update() of a json value is not defined; update string, vector, dict or struct"
                .to_string(),
        )),
        Value::Vector(v) => {
            let index = key.get_int().map_err(|_| {
                RuntimeError::TypeMismatch("vector update uses an integer index".to_string())
            })?;
            if !type_accepts(&v.element_type, new_value) {
                return Err(RuntimeError::TypeMismatch(format!(
                    "update element must be a {}",
                    v.element_type.to_signature()
                )));
            }
            if index < 0 || index as usize >= v.elements.len() {
                return Err(RuntimeError::IndexOutOfBounds(format!(
                    "vector index {} of {}",
                    index,
                    v.elements.len()
                )));
            }
            let mut elements = v.elements.clone();
            elements[index as usize] = new_value.clone();
            Value::make_vector(v.element_type.clone(), elements)
        }
        Value::Dict(d) => {
            let key = key.get_string().map_err(|_| {
                RuntimeError::TypeMismatch("dict update uses a string key".to_string())
            })?;
            if !type_accepts(&d.value_type, new_value) {
                return Err(RuntimeError::TypeMismatch(format!(
                    "update element must be a {}",
                    d.value_type.to_signature()
                )));
            }
            let mut entries = d.entries.clone();
            entries.insert(key.to_string(), new_value.clone());
            Value::make_dict(d.value_type.clone(), entries)
        }
        Value::Struct(_) => {
            let key = key.get_string().map_err(|_| {
                RuntimeError::TypeMismatch("struct update uses a string member name".to_string())
            })?;
            let path: Vec<&str> = key.split('.').collect();
            update_struct_member_deep(obj, &path, new_value)
        }
        other => Err(RuntimeError::TypeMismatch(format!(
            "update() is not defined for {}",
            other.base_kind().name()
        ))),
    }
}

fn update_struct_member_shallow(
    obj: &Value,
    member_name: &str,
    new_value: &Value,
) -> Result<Value, RuntimeError> {
    let instance = obj.get_struct()?;
    let def = instance
        .struct_type
        .struct_def()
        .expect("struct value carries a struct type");
    let index = def.member_index_of(member_name).ok_or_else(|| {
        RuntimeError::KeyNotFound(format!("unknown struct member \"{}\"", member_name))
    })?;
    let declared = &def.members[index].member_type;
    if !type_accepts(declared, new_value) {
        return Err(RuntimeError::TypeMismatch(format!(
            "member \"{}\" has type {}, got {}",
            member_name,
            declared.to_signature(),
            new_value.value_type().to_signature()
        )));
    }
    let mut members = instance.members.clone();
    members[index] = new_value.clone();
    Value::make_struct(instance.struct_type.clone(), members)
}

fn update_struct_member_deep(
    obj: &Value,
    path: &[&str],
    new_value: &Value,
) -> Result<Value, RuntimeError> {
    if path.len() == 1 {
        return update_struct_member_shallow(obj, path[0], new_value);
    }
    let instance = obj.get_struct()?;
    let def = instance
        .struct_type
        .struct_def()
        .expect("struct value carries a struct type");
    let index = def.member_index_of(path[0]).ok_or_else(|| {
        RuntimeError::KeyNotFound(format!("unknown struct member \"{}\"", path[0]))
    })?;
    let child = &instance.members[index];
    if child.get_struct().is_err() {
        return Err(RuntimeError::TypeMismatch(format!(
            "member \"{}\" is not a struct; cannot descend further",
            path[0]
        )));
    }
    let updated_child = update_struct_member_deep(child, &path[1..], new_value)?;
    update_struct_member_shallow(obj, path[0], &updated_child)
}

fn clamp_range(start: i32, end: i32, len: usize) -> (usize, usize) {
    let clamp = |i: i32| -> usize {
        if i < 0 { 0 } else { (i as usize).min(len) }
    };
    (clamp(start), clamp(end))
}

fn json_kind_name(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Program;
    use floyd_core::types::{StructMember, TypeDescriptor};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    fn test_vm() -> Interpreter {
        Interpreter::new(Rc::new(Program::default())).unwrap()
    }

    fn int_vector(elements: &[i32]) -> Value {
        Value::make_vector(
            TypeDescriptor::Int,
            elements.iter().map(|i| Value::Int(*i)).collect(),
        )
        .unwrap()
    }

    fn int_dict(entries: &[(&str, i32)]) -> Value {
        let map: BTreeMap<String, Value> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), Value::Int(*v)))
            .collect();
        Value::make_dict(TypeDescriptor::Int, map).unwrap()
    }

    fn pixel_type() -> TypeDescriptor {
        TypeDescriptor::struct_of(vec![
            StructMember::new("r", TypeDescriptor::Int),
            StructMember::new("g", TypeDescriptor::Int),
            StructMember::new("b", TypeDescriptor::Int),
        ])
    }

    fn pixel(r: i32, g: i32, b: i32) -> Value {
        Value::make_struct(
            pixel_type(),
            vec![Value::Int(r), Value::Int(g), Value::Int(b)],
        )
        .unwrap()
    }

    #[test]
    fn test_size() {
        let mut vm = test_vm();
        let cases = [
            (Value::make_string("héllo"), 5),
            (int_vector(&[1, 2, 3]), 3),
            (int_dict(&[("a", 1), ("b", 2)]), 2),
            (Value::make_json(json!([1, 2, 3, 4])), 4),
            (Value::make_json(json!({"a": 1})), 1),
            (Value::make_json(json!("abc")), 3),
        ];
        for (v, expected) in cases {
            assert_eq!(host_size(&mut vm, &[v]).unwrap(), Value::Int(expected));
        }
        let err = host_size(&mut vm, &[Value::Int(1)]).unwrap_err();
        assert_eq!(err.kind(), "TypeMismatch");
        let err = host_size(&mut vm, &[Value::make_json(json!(true))]).unwrap_err();
        assert_eq!(err.kind(), "TypeMismatch");
    }

    #[test]
    fn test_find_in_string() {
        let mut vm = test_vm();
        let s = Value::make_string("one ring to rule");
        assert_eq!(
            host_find(&mut vm, &[s.clone(), Value::make_string("ring")]).unwrap(),
            Value::Int(4)
        );
        assert_eq!(
            host_find(&mut vm, &[s, Value::make_string("hobbit")]).unwrap(),
            Value::Int(-1)
        );
    }

    #[test]
    fn test_find_in_vector() {
        let mut vm = test_vm();
        let v = int_vector(&[5, 6, 7]);
        assert_eq!(
            host_find(&mut vm, &[v.clone(), Value::Int(6)]).unwrap(),
            Value::Int(1)
        );
        assert_eq!(
            host_find(&mut vm, &[v.clone(), Value::Int(9)]).unwrap(),
            Value::Int(-1)
        );
        let err = host_find(&mut vm, &[v, Value::make_string("6")]).unwrap_err();
        assert_eq!(err.kind(), "TypeMismatch");
    }

    #[test]
    fn test_exists() {
        let mut vm = test_vm();
        let d = int_dict(&[("a", 1), ("b", 2)]);
        assert_eq!(
            host_exists(&mut vm, &[d.clone(), Value::make_string("a")]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            host_exists(&mut vm, &[d, Value::make_string("z")]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_erase_returns_copy_without_key() {
        let mut vm = test_vm();
        let d = int_dict(&[("a", 1), ("b", 2)]);
        let without = host_erase(&mut vm, &[d.clone(), Value::make_string("a")]).unwrap();
        assert_eq!(without, int_dict(&[("b", 2)]));
        assert_eq!(d, int_dict(&[("a", 1), ("b", 2)]));
        // absent keys do not fail
        let same = host_erase(&mut vm, &[d.clone(), Value::make_string("z")]).unwrap();
        assert_eq!(same, d);
    }

    #[test]
    fn test_push_back() {
        let mut vm = test_vm();
        assert_eq!(
            host_push_back(
                &mut vm,
                &[Value::make_string("ab"), Value::make_string("c")]
            )
            .unwrap(),
            Value::make_string("abc")
        );
        assert_eq!(
            host_push_back(&mut vm, &[int_vector(&[1, 2]), Value::Int(3)]).unwrap(),
            int_vector(&[1, 2, 3])
        );
        let err =
            host_push_back(&mut vm, &[int_vector(&[1]), Value::make_string("x")]).unwrap_err();
        assert_eq!(err.kind(), "TypeMismatch");
    }

    #[test]
    fn test_subset_basics() {
        let mut vm = test_vm();
        let s = Value::make_string("abc");
        assert_eq!(
            host_subset(&mut vm, &[s.clone(), Value::Int(1), Value::Int(3)]).unwrap(),
            Value::make_string("bc")
        );
        // subset(x, 0, len(x)) == x
        assert_eq!(
            host_subset(&mut vm, &[s.clone(), Value::Int(0), Value::Int(3)]).unwrap(),
            s
        );
    }

    #[test]
    fn test_subset_clamps_and_never_fails() {
        let mut vm = test_vm();
        let s = Value::make_string("abc");
        // out-of-range indices clamp to [0, len]
        assert_eq!(
            host_subset(&mut vm, &[s.clone(), Value::Int(-5), Value::Int(99)]).unwrap(),
            s
        );
        // start past end yields empty
        assert_eq!(
            host_subset(&mut vm, &[s.clone(), Value::Int(2), Value::Int(1)]).unwrap(),
            Value::make_string("")
        );
        let v = int_vector(&[1, 2, 3]);
        assert_eq!(
            host_subset(&mut vm, &[v.clone(), Value::Int(1), Value::Int(99)]).unwrap(),
            int_vector(&[2, 3])
        );
    }

    #[test]
    fn test_replace_splices() {
        let mut vm = test_vm();
        let s = Value::make_string("One ring to rule them all");
        let replaced = host_replace(
            &mut vm,
            &[
                s,
                Value::Int(4),
                Value::Int(8),
                Value::make_string("rabbit"),
            ],
        )
        .unwrap();
        assert_eq!(replaced, Value::make_string("One rabbit to rule them all"));
    }

    #[test]
    fn test_replace_equals_subset_composition() {
        // replace(x,i,j,y) == subset(x,0,i) + y + subset(x,j,len(x))
        let mut vm = test_vm();
        let x = int_vector(&[1, 2, 3, 4, 5]);
        let y = int_vector(&[8, 9]);
        let (i, j) = (1, 4);
        let replaced = host_replace(
            &mut vm,
            &[x.clone(), Value::Int(i), Value::Int(j), y.clone()],
        )
        .unwrap();

        let left = host_subset(&mut vm, &[x.clone(), Value::Int(0), Value::Int(i)]).unwrap();
        let right = host_subset(&mut vm, &[x, Value::Int(j), Value::Int(5)]).unwrap();
        let mut expected = left.get_vector().unwrap().elements.clone();
        expected.extend(y.get_vector().unwrap().elements.iter().cloned());
        expected.extend(right.get_vector().unwrap().elements.iter().cloned());
        assert_eq!(
            replaced,
            Value::make_vector(TypeDescriptor::Int, expected).unwrap()
        );
    }

    #[test]
    fn test_replace_validates_arguments() {
        let mut vm = test_vm();
        let s = Value::make_string("abc");
        let err = host_replace(
            &mut vm,
            &[
                s.clone(),
                Value::Int(-1),
                Value::Int(2),
                Value::make_string("x"),
            ],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "IndexOutOfBounds");
        let err = host_replace(
            &mut vm,
            &[
                s.clone(),
                Value::Int(2),
                Value::Int(1),
                Value::make_string("x"),
            ],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "IndexOutOfBounds");
        let err = host_replace(
            &mut vm,
            &[s, Value::Int(0), Value::Int(1), int_vector(&[1])],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "TypeMismatch");
    }

    #[test]
    fn test_update_vector() {
        let mut vm = test_vm();
        let v = int_vector(&[1, 2, 3]);
        let updated = host_update(&mut vm, &[v.clone(), Value::Int(1), Value::Int(99)]).unwrap();
        assert_eq!(updated, int_vector(&[1, 99, 3]));
        assert_eq!(v, int_vector(&[1, 2, 3]));

        let err = host_update(&mut vm, &[v.clone(), Value::Int(7), Value::Int(0)]).unwrap_err();
        assert_eq!(err.kind(), "IndexOutOfBounds");
        let err = host_update(&mut vm, &[v, Value::Int(0), Value::Bool(true)]).unwrap_err();
        assert_eq!(err.kind(), "TypeMismatch");
    }

    #[test]
    fn test_update_dict_inserts_and_overwrites() {
        let mut vm = test_vm();
        let d = int_dict(&[("a", 1)]);
        let with_b =
            host_update(&mut vm, &[d.clone(), Value::make_string("b"), Value::Int(2)]).unwrap();
        assert_eq!(with_b, int_dict(&[("a", 1), ("b", 2)]));
        let overwritten =
            host_update(&mut vm, &[d, Value::make_string("a"), Value::Int(9)]).unwrap();
        assert_eq!(overwritten, int_dict(&[("a", 9)]));
    }

    #[test]
    fn test_update_then_erase_matches_plain_erase() {
        let mut vm = test_vm();
        let d = int_dict(&[("a", 1), ("b", 2)]);
        let updated =
            host_update(&mut vm, &[d.clone(), Value::make_string("k"), Value::Int(7)]).unwrap();
        let erased_updated =
            host_erase(&mut vm, &[updated, Value::make_string("k")]).unwrap();
        let erased_plain = host_erase(&mut vm, &[d, Value::make_string("k")]).unwrap();
        assert_eq!(erased_updated, erased_plain);
    }

    #[test]
    fn test_update_string_single_char() {
        let mut vm = test_vm();
        let s = Value::make_string("abc");
        let updated = host_update(
            &mut vm,
            &[s.clone(), Value::Int(1), Value::make_string("X")],
        )
        .unwrap();
        assert_eq!(updated, Value::make_string("aXc"));

        let err = host_update(
            &mut vm,
            &[s.clone(), Value::Int(1), Value::make_string("XY")],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "TypeMismatch");
        let err = host_update(&mut vm, &[s, Value::Int(9), Value::make_string("X")]).unwrap_err();
        assert_eq!(err.kind(), "IndexOutOfBounds");
    }

    #[test]
    fn test_update_struct_member() {
        let mut vm = test_vm();
        let p = pixel(10, 20, 30);
        let q = host_update(
            &mut vm,
            &[p.clone(), Value::make_string("g"), Value::Int(99)],
        )
        .unwrap();
        assert_eq!(floyd_core::to_compact_string(&q), "{r=10, g=99, b=30}");
        assert_eq!(p, pixel(10, 20, 30));

        let err = host_update(
            &mut vm,
            &[p.clone(), Value::make_string("alpha"), Value::Int(0)],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "KeyNotFound");
        let err = host_update(
            &mut vm,
            &[p, Value::make_string("g"), Value::make_string("99")],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "TypeMismatch");
    }

    #[test]
    fn test_update_struct_dotted_path() {
        let sprite_type = TypeDescriptor::struct_of(vec![
            StructMember::new("name", TypeDescriptor::String),
            StructMember::new("color", pixel_type()),
        ]);
        let sprite = Value::make_struct(
            sprite_type,
            vec![Value::make_string("player"), pixel(1, 2, 3)],
        )
        .unwrap();

        let mut vm = test_vm();
        let updated = host_update(
            &mut vm,
            &[sprite, Value::make_string("color.b"), Value::Int(255)],
        )
        .unwrap();
        assert_eq!(
            floyd_core::to_compact_string(&updated),
            "{name=\"player\", color={r=1, g=2, b=255}}"
        );

        let err = host_update(
            &mut vm,
            &[updated, Value::make_string("name.x"), Value::Int(0)],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "TypeMismatch");
    }

    #[test]
    fn test_update_json_is_rejected() {
        let mut vm = test_vm();
        let err = host_update(
            &mut vm,
            &[
                Value::make_json(json!({"a": 1})),
                Value::make_string("a"),
                Value::Int(2),
            ],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "TypeMismatch");
    }
}
