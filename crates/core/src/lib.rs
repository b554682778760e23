//! Floyd Core: the value model shared by the whole toolchain
//!
//! Three layers, each depending only on those below:
//! - `types`: immutable structural type descriptors with canonical
//!   signatures and a canonical JSON encoding
//! - `value`: tagged values — inline primitives, reference-counted extended
//!   payloads, deep equality, total per-tag ordering
//! - `json`: the flatten/unflatten bridge between tagged values and untyped
//!   JSON

pub mod error;
pub mod json;
pub mod types;
pub mod value;

pub use error::RuntimeError;
pub use json::{flatten_to_json, unflatten_from_json, values_to_json_array};
pub use types::{
    BaseKind, FunctionSignature, StructDefinition, StructMember, TypeDescriptor, type_from_json,
    type_to_json,
};
pub use value::{
    DictInstance, FunctionRef, StructInstance, Value, VectorInstance, compare_values,
    default_value_for_type, to_compact_string, to_compact_string_quote_strings, type_accepts,
    value_and_type_to_string,
};

/// JSON node payload type, re-exported so embedders name the same type the
/// runtime stores.
pub type JsonValue = serde_json::Value;
