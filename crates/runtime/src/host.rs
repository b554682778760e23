//! Host-Function Table
//!
//! The static registry of native functions exposed to scripts. Each entry
//! pairs a name, a typed signature, and a plain function pointer. Host ids
//! start at 1000; scripted function ids are assigned from 0, so the two id
//! spaces never collide.
//!
//! Signatures use the `dynamic` sentinel where an operation accepts any
//! value. The value itself stays fully typed — call sites supply the
//! concrete kinds, and the runtime type remains queryable via `typeof`.

use crate::interpreter::Interpreter;
use crate::{collection_ops, file, io, json_ops, os, reflect_ops, time_ops};
use floyd_core::error::RuntimeError;
use floyd_core::types::TypeDescriptor;
use floyd_core::value::Value;
use std::collections::HashMap;

/// First host-function id. Every id below this addresses the program's
/// function table.
pub const HOST_FUNCTION_ID_BASE: i32 = 1000;

pub type HostFn = fn(&mut Interpreter, &[Value]) -> Result<Value, RuntimeError>;

/// One registered host function.
#[derive(Clone)]
pub struct HostFunction {
    pub id: i32,
    pub name: &'static str,
    pub signature: TypeDescriptor,
    pub f: HostFn,
}

/// All host functions in registration order. Ids are assigned sequentially
/// from [`HOST_FUNCTION_ID_BASE`], so the order here is part of the id
/// assignment and must stay stable.
pub fn host_function_entries() -> Vec<HostFunction> {
    use TypeDescriptor::{Bool, Dynamic, Int, Json, String as Str, Typeid, Void};
    let function = TypeDescriptor::function_of;

    let table: Vec<(&'static str, TypeDescriptor, HostFn)> = vec![
        ("print", function(Void, vec![Dynamic]), io::host_print),
        ("assert", function(Void, vec![Bool]), io::host_assert),
        (
            "to_string",
            function(Str, vec![Dynamic]),
            reflect_ops::host_to_string,
        ),
        (
            "to_pretty_string",
            function(Str, vec![Dynamic]),
            reflect_ops::host_to_pretty_string,
        ),
        (
            "typeof",
            function(Typeid, vec![Dynamic]),
            reflect_ops::host_typeof,
        ),
        (
            "get_time_of_day",
            function(Int, vec![]),
            time_ops::host_get_time_of_day,
        ),
        (
            "update",
            function(Dynamic, vec![Dynamic, Dynamic, Dynamic]),
            collection_ops::host_update,
        ),
        ("size", function(Int, vec![Dynamic]), collection_ops::host_size),
        (
            "find",
            function(Int, vec![Dynamic, Dynamic]),
            collection_ops::host_find,
        ),
        (
            "exists",
            function(Bool, vec![Dynamic, Str]),
            collection_ops::host_exists,
        ),
        (
            "erase",
            function(Dynamic, vec![Dynamic, Str]),
            collection_ops::host_erase,
        ),
        (
            "push_back",
            function(Dynamic, vec![Dynamic, Dynamic]),
            collection_ops::host_push_back,
        ),
        (
            "subset",
            function(Dynamic, vec![Dynamic, Int, Int]),
            collection_ops::host_subset,
        ),
        (
            "replace",
            function(Dynamic, vec![Dynamic, Int, Int, Dynamic]),
            collection_ops::host_replace,
        ),
        ("get_env_path", function(Str, vec![]), os::host_get_env_path),
        (
            "read_text_file",
            function(Str, vec![Str]),
            file::host_read_text_file,
        ),
        (
            "write_text_file",
            function(Void, vec![Str, Str]),
            file::host_write_text_file,
        ),
        (
            "decode_json",
            function(Json, vec![Str]),
            json_ops::host_decode_json,
        ),
        (
            "encode_json",
            function(Str, vec![Json]),
            json_ops::host_encode_json,
        ),
        (
            "flatten_to_json",
            function(Json, vec![Dynamic]),
            json_ops::host_flatten_to_json,
        ),
        (
            "unflatten_from_json",
            function(Dynamic, vec![Json, Typeid]),
            json_ops::host_unflatten_from_json,
        ),
        (
            "get_json_type",
            function(Int, vec![Json]),
            json_ops::host_get_json_type,
        ),
    ];

    table
        .into_iter()
        .enumerate()
        .map(|(offset, (name, signature, f))| HostFunction {
            id: HOST_FUNCTION_ID_BASE + offset as i32,
            name,
            signature,
            f,
        })
        .collect()
}

/// The table keyed by id, as the interpreter holds it.
pub fn host_function_table() -> HashMap<i32, HostFunction> {
    host_function_entries()
        .into_iter()
        .map(|entry| (entry.id, entry))
        .collect()
}

/// Id of a host function by name, for symbol binding at program load.
pub fn host_function_id(name: &str) -> Option<i32> {
    host_function_entries()
        .iter()
        .find(|entry| entry.name == name)
        .map(|entry| entry.id)
}

/// A function value referring to a host function, as the loader binds into
/// global symbols.
pub fn host_function_value(name: &str) -> Option<Value> {
    host_function_entries()
        .into_iter()
        .find(|entry| entry.name == name)
        .and_then(|entry| Value::make_function(entry.signature, entry.id).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_base_and_are_unique() {
        let entries = host_function_entries();
        let mut seen = std::collections::HashSet::new();
        for entry in &entries {
            assert!(entry.id >= HOST_FUNCTION_ID_BASE);
            assert!(seen.insert(entry.id), "duplicate id {}", entry.id);
        }
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(host_function_id("print"), Some(HOST_FUNCTION_ID_BASE));
        assert!(host_function_id("get_json_type").is_some());
        assert!(host_function_id("no_such_function").is_none());
    }

    #[test]
    fn test_host_function_value_has_function_type() {
        let v = host_function_value("size").unwrap();
        let fref = v.get_function().unwrap();
        assert!(fref.function_id >= HOST_FUNCTION_ID_BASE);
        assert!(fref.function_type.function_signature().is_some());
    }

    #[test]
    fn test_every_spec_function_is_registered() {
        let names = [
            "print",
            "assert",
            "to_string",
            "to_pretty_string",
            "typeof",
            "get_time_of_day",
            "update",
            "size",
            "find",
            "exists",
            "erase",
            "push_back",
            "subset",
            "replace",
            "get_env_path",
            "read_text_file",
            "write_text_file",
            "decode_json",
            "encode_json",
            "flatten_to_json",
            "unflatten_from_json",
            "get_json_type",
        ];
        for name in names {
            assert!(host_function_id(name).is_some(), "missing {}", name);
        }
    }
}
