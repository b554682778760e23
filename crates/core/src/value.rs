//! Tagged Values
//!
//! A value is a (base-tag, payload) pair. Primitive payloads (bool, 32-bit
//! signed int, 32-bit float) are stored inline. Extended payloads — strings,
//! json nodes, typeid values, struct instances, vectors, dicts, and function
//! references — live behind `Rc`, so copying a value bumps a reference count
//! and dropping the last copy destroys the payload deterministically.
//!
//! Values are immutable after construction; every "mutation" in the language
//! (update, erase, push_back, ...) produces a new value. Because composites
//! are built bottom-up and never mutated, reference cycles are structurally
//! impossible and plain reference counting is a complete collector.
//!
//! The interpreter is single-threaded by specification, so payloads use `Rc`
//! rather than `Arc`; there is no scheduler to share values across threads.

use crate::error::RuntimeError;
use crate::types::{BaseKind, TypeDescriptor};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::rc::Rc;

/// An instance of a struct type: the owning descriptor plus one value per
/// declared member, in declaration order.
#[derive(Debug, PartialEq)]
pub struct StructInstance {
    pub struct_type: TypeDescriptor,
    pub members: Vec<Value>,
}

/// A vector value: element type plus ordered elements.
#[derive(Debug, PartialEq)]
pub struct VectorInstance {
    pub element_type: TypeDescriptor,
    pub elements: Vec<Value>,
}

/// A dict value: value type plus string-keyed entries. `BTreeMap` keeps the
/// entries ordered, which makes printing and comparison deterministic.
#[derive(Debug, PartialEq)]
pub struct DictInstance {
    pub value_type: TypeDescriptor,
    pub entries: BTreeMap<String, Value>,
}

/// A function reference: the function's type and its integer id.
///
/// Host ids are ≥ 1000; scripted ids are assigned sequentially from 0. The
/// two id spaces never overlap. An id of -1 marks a default-initialized
/// function slot that was never assigned; calling it is an error.
#[derive(Debug, PartialEq)]
pub struct FunctionRef {
    pub function_type: TypeDescriptor,
    pub function_id: i32,
}

/// A runtime value.
///
/// The tag determines exactly which payload is live. Equality is deep;
/// ordering is total within a tag via [`compare_values`].
#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Void,
    Bool(bool),
    Int(i32),
    Float(f32),
    String(Rc<String>),
    Json(Rc<JsonValue>),
    Typeid(Rc<TypeDescriptor>),
    Struct(Rc<StructInstance>),
    Vector(Rc<VectorInstance>),
    Dict(Rc<DictInstance>),
    Function(Rc<FunctionRef>),
}

impl Value {
    pub fn make_bool(value: bool) -> Value {
        Value::Bool(value)
    }

    pub fn make_int(value: i32) -> Value {
        Value::Int(value)
    }

    pub fn make_float(value: f32) -> Value {
        Value::Float(value)
    }

    pub fn make_string(value: impl Into<String>) -> Value {
        Value::String(Rc::new(value.into()))
    }

    pub fn make_json(value: JsonValue) -> Value {
        Value::Json(Rc::new(value))
    }

    pub fn make_typeid(type_id: TypeDescriptor) -> Value {
        Value::Typeid(Rc::new(type_id))
    }

    /// Build a struct value. The member count and every member's type must
    /// match the descriptor's declared members.
    pub fn make_struct(
        struct_type: TypeDescriptor,
        members: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let def = struct_type.struct_def().ok_or_else(|| {
            RuntimeError::TypeMismatch(format!(
                "expected a struct type, got {}",
                struct_type.to_signature()
            ))
        })?;
        if def.members.len() != members.len() {
            return Err(RuntimeError::TypeMismatch(format!(
                "struct {} declares {} members, got {}",
                struct_type.to_signature(),
                def.members.len(),
                members.len()
            )));
        }
        for (declared, value) in def.members.iter().zip(&members) {
            check_assignable(&declared.member_type, value, &declared.name)?;
        }
        Ok(Value::Struct(Rc::new(StructInstance {
            struct_type,
            members,
        })))
    }

    /// Build a vector value. Every element's type must equal `element_type`.
    pub fn make_vector(
        element_type: TypeDescriptor,
        elements: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        for (i, e) in elements.iter().enumerate() {
            check_assignable(&element_type, e, &format!("element {}", i))?;
        }
        Ok(Value::Vector(Rc::new(VectorInstance {
            element_type,
            elements,
        })))
    }

    /// Build a dict value. Every entry's type must equal `value_type`.
    pub fn make_dict(
        value_type: TypeDescriptor,
        entries: BTreeMap<String, Value>,
    ) -> Result<Value, RuntimeError> {
        for (key, v) in &entries {
            check_assignable(&value_type, v, key)?;
        }
        Ok(Value::Dict(Rc::new(DictInstance {
            value_type,
            entries,
        })))
    }

    /// Build a function reference. `function_type` must be a function type.
    pub fn make_function(
        function_type: TypeDescriptor,
        function_id: i32,
    ) -> Result<Value, RuntimeError> {
        if function_type.function_signature().is_none() {
            return Err(RuntimeError::TypeMismatch(format!(
                "expected a function type, got {}",
                function_type.to_signature()
            )));
        }
        Ok(Value::Function(Rc::new(FunctionRef {
            function_type,
            function_id,
        })))
    }

    pub fn base_kind(&self) -> BaseKind {
        match self {
            Value::Undefined => BaseKind::Undefined,
            Value::Void => BaseKind::Void,
            Value::Bool(_) => BaseKind::Bool,
            Value::Int(_) => BaseKind::Int,
            Value::Float(_) => BaseKind::Float,
            Value::String(_) => BaseKind::String,
            Value::Json(_) => BaseKind::Json,
            Value::Typeid(_) => BaseKind::Typeid,
            Value::Struct(_) => BaseKind::Struct,
            Value::Vector(_) => BaseKind::Vector,
            Value::Dict(_) => BaseKind::Dict,
            Value::Function(_) => BaseKind::Function,
        }
    }

    /// The value's full runtime type descriptor.
    pub fn value_type(&self) -> TypeDescriptor {
        match self {
            Value::Undefined => TypeDescriptor::Undefined,
            Value::Void => TypeDescriptor::Void,
            Value::Bool(_) => TypeDescriptor::Bool,
            Value::Int(_) => TypeDescriptor::Int,
            Value::Float(_) => TypeDescriptor::Float,
            Value::String(_) => TypeDescriptor::String,
            Value::Json(_) => TypeDescriptor::Json,
            Value::Typeid(_) => TypeDescriptor::Typeid,
            Value::Struct(s) => s.struct_type.clone(),
            Value::Vector(v) => TypeDescriptor::vector_of(v.element_type.clone()),
            Value::Dict(d) => TypeDescriptor::dict_of(d.value_type.clone()),
            Value::Function(f) => f.function_type.clone(),
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    // Guarded accessors. No implicit coercion exists anywhere in the runtime:
    // asking for the wrong tag is a TypeMismatch.

    pub fn get_bool(&self) -> Result<bool, RuntimeError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(tag_error("bool", other)),
        }
    }

    pub fn get_int(&self) -> Result<i32, RuntimeError> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(tag_error("int", other)),
        }
    }

    pub fn get_float(&self) -> Result<f32, RuntimeError> {
        match self {
            Value::Float(f) => Ok(*f),
            other => Err(tag_error("float", other)),
        }
    }

    pub fn get_string(&self) -> Result<&str, RuntimeError> {
        match self {
            Value::String(s) => Ok(s.as_str()),
            other => Err(tag_error("string", other)),
        }
    }

    pub fn get_json(&self) -> Result<&JsonValue, RuntimeError> {
        match self {
            Value::Json(j) => Ok(j),
            other => Err(tag_error("json", other)),
        }
    }

    pub fn get_typeid(&self) -> Result<&TypeDescriptor, RuntimeError> {
        match self {
            Value::Typeid(t) => Ok(t),
            other => Err(tag_error("typeid", other)),
        }
    }

    pub fn get_struct(&self) -> Result<&StructInstance, RuntimeError> {
        match self {
            Value::Struct(s) => Ok(s),
            other => Err(tag_error("struct", other)),
        }
    }

    pub fn get_vector(&self) -> Result<&VectorInstance, RuntimeError> {
        match self {
            Value::Vector(v) => Ok(v),
            other => Err(tag_error("vector", other)),
        }
    }

    pub fn get_dict(&self) -> Result<&DictInstance, RuntimeError> {
        match self {
            Value::Dict(d) => Ok(d),
            other => Err(tag_error("dict", other)),
        }
    }

    pub fn get_function(&self) -> Result<&FunctionRef, RuntimeError> {
        match self {
            Value::Function(f) => Ok(f),
            other => Err(tag_error("function", other)),
        }
    }

    /// Strong count of the shared payload, `None` for inline values.
    /// Diagnostic only; the count includes the queried value itself.
    pub fn payload_refcount(&self) -> Option<usize> {
        match self {
            Value::String(p) => Some(Rc::strong_count(p)),
            Value::Json(p) => Some(Rc::strong_count(p)),
            Value::Typeid(p) => Some(Rc::strong_count(p)),
            Value::Struct(p) => Some(Rc::strong_count(p)),
            Value::Vector(p) => Some(Rc::strong_count(p)),
            Value::Dict(p) => Some(Rc::strong_count(p)),
            Value::Function(p) => Some(Rc::strong_count(p)),
            _ => None,
        }
    }
}

/// True when `value` can occupy a slot declared as `declared`. `Dynamic`
/// accepts anything; there are no other widenings.
pub fn type_accepts(declared: &TypeDescriptor, value: &Value) -> bool {
    matches!(declared, TypeDescriptor::Dynamic) || value.value_type() == *declared
}

fn check_assignable(
    declared: &TypeDescriptor,
    value: &Value,
    what: &str,
) -> Result<(), RuntimeError> {
    if type_accepts(declared, value) {
        Ok(())
    } else {
        Err(RuntimeError::TypeMismatch(format!(
            "{}: expected {}, got {}",
            what,
            declared.to_signature(),
            value.value_type().to_signature()
        )))
    }
}

fn tag_error(wanted: &str, got: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch(format!(
        "expected {}, got {}",
        wanted,
        got.base_kind().name()
    ))
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Void, Value::Void) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            // Bitwise, per the value model: NaN equals an identical NaN,
            // and 0.0 differs from -0.0.
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::Typeid(a), Value::Typeid(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a == b,
            _ => false,
        }
    }
}

/// Total order over two values of the *same* tag.
///
/// Numeric kinds compare numerically (floats by IEEE total order), strings
/// lexicographically, vectors and dicts by length first and then element- or
/// key-wise. Json payloads order structurally (kind rank, then contents);
/// typeid values by signature; function references by id. Comparing values
/// of differing tags is a `TypeMismatch`.
pub fn compare_values(left: &Value, right: &Value) -> Result<Ordering, RuntimeError> {
    match (left, right) {
        (Value::Undefined, Value::Undefined) => Ok(Ordering::Equal),
        (Value::Void, Value::Void) => Ok(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => Ok(a.total_cmp(b)),
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        (Value::Json(a), Value::Json(b)) => Ok(compare_json(a, b)),
        (Value::Typeid(a), Value::Typeid(b)) => Ok(a.to_signature().cmp(&b.to_signature())),
        (Value::Struct(a), Value::Struct(b)) => {
            if a.struct_type != b.struct_type {
                return Err(RuntimeError::TypeMismatch(format!(
                    "cannot compare {} with {}",
                    a.struct_type.to_signature(),
                    b.struct_type.to_signature()
                )));
            }
            for (x, y) in a.members.iter().zip(&b.members) {
                let ord = compare_values(x, y)?;
                if ord != Ordering::Equal {
                    return Ok(ord);
                }
            }
            Ok(Ordering::Equal)
        }
        (Value::Vector(a), Value::Vector(b)) => {
            if a.element_type != b.element_type {
                return Err(RuntimeError::TypeMismatch(format!(
                    "cannot compare vector of {} with vector of {}",
                    a.element_type.to_signature(),
                    b.element_type.to_signature()
                )));
            }
            let by_len = a.elements.len().cmp(&b.elements.len());
            if by_len != Ordering::Equal {
                return Ok(by_len);
            }
            for (x, y) in a.elements.iter().zip(&b.elements) {
                let ord = compare_values(x, y)?;
                if ord != Ordering::Equal {
                    return Ok(ord);
                }
            }
            Ok(Ordering::Equal)
        }
        (Value::Dict(a), Value::Dict(b)) => {
            if a.value_type != b.value_type {
                return Err(RuntimeError::TypeMismatch(format!(
                    "cannot compare dict of {} with dict of {}",
                    a.value_type.to_signature(),
                    b.value_type.to_signature()
                )));
            }
            let by_len = a.entries.len().cmp(&b.entries.len());
            if by_len != Ordering::Equal {
                return Ok(by_len);
            }
            for ((ka, va), (kb, vb)) in a.entries.iter().zip(&b.entries) {
                let by_key = ka.cmp(kb);
                if by_key != Ordering::Equal {
                    return Ok(by_key);
                }
                let by_value = compare_values(va, vb)?;
                if by_value != Ordering::Equal {
                    return Ok(by_value);
                }
            }
            Ok(Ordering::Equal)
        }
        (Value::Function(a), Value::Function(b)) => Ok(a.function_id.cmp(&b.function_id)),
        (a, b) => Err(RuntimeError::TypeMismatch(format!(
            "cannot compare {} with {}",
            a.base_kind().name(),
            b.base_kind().name()
        ))),
    }
}

/// Structural total order over json nodes: kind rank first
/// (null < bool < number < string < array < object), then contents.
fn compare_json(a: &JsonValue, b: &JsonValue) -> Ordering {
    fn rank(v: &JsonValue) -> u8 {
        match v {
            JsonValue::Null => 0,
            JsonValue::Bool(_) => 1,
            JsonValue::Number(_) => 2,
            JsonValue::String(_) => 3,
            JsonValue::Array(_) => 4,
            JsonValue::Object(_) => 5,
        }
    }
    match (a, b) {
        (JsonValue::Null, JsonValue::Null) => Ordering::Equal,
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        (JsonValue::Number(x), JsonValue::Number(y)) => {
            let xf = x.as_f64().unwrap_or(f64::NAN);
            let yf = y.as_f64().unwrap_or(f64::NAN);
            xf.total_cmp(&yf)
        }
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Array(x), JsonValue::Array(y)) => {
            let by_len = x.len().cmp(&y.len());
            if by_len != Ordering::Equal {
                return by_len;
            }
            for (xe, ye) in x.iter().zip(y) {
                let ord = compare_json(xe, ye);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        }
        (JsonValue::Object(x), JsonValue::Object(y)) => {
            let by_len = x.len().cmp(&y.len());
            if by_len != Ordering::Equal {
                return by_len;
            }
            let mut xk: Vec<&String> = x.keys().collect();
            let mut yk: Vec<&String> = y.keys().collect();
            xk.sort();
            yk.sort();
            for (kx, ky) in xk.iter().zip(&yk) {
                let by_key = kx.cmp(ky);
                if by_key != Ordering::Equal {
                    return by_key;
                }
                let ord = compare_json(&x[kx.as_str()], &y[ky.as_str()]);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

/// The value a freshly declared slot of type `t` holds before its first
/// assignment. Structs default member-wise; function slots get the -1
/// never-assigned sentinel.
pub fn default_value_for_type(t: &TypeDescriptor) -> Result<Value, RuntimeError> {
    match t {
        TypeDescriptor::Undefined | TypeDescriptor::Dynamic => Ok(Value::Undefined),
        TypeDescriptor::Void => Ok(Value::Void),
        TypeDescriptor::Bool => Ok(Value::Bool(false)),
        TypeDescriptor::Int => Ok(Value::Int(0)),
        TypeDescriptor::Float => Ok(Value::Float(0.0)),
        TypeDescriptor::String => Ok(Value::make_string("")),
        TypeDescriptor::Json => Ok(Value::make_json(JsonValue::Null)),
        TypeDescriptor::Typeid => Ok(Value::make_typeid(TypeDescriptor::Undefined)),
        TypeDescriptor::Struct(def) => {
            let mut members = Vec::with_capacity(def.members.len());
            for m in &def.members {
                members.push(default_value_for_type(&m.member_type)?);
            }
            Value::make_struct(t.clone(), members)
        }
        TypeDescriptor::Vector(elem) => Value::make_vector((**elem).clone(), vec![]),
        TypeDescriptor::Dict(value) => Value::make_dict((**value).clone(), BTreeMap::new()),
        TypeDescriptor::Function(_) => Value::make_function(t.clone(), -1),
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// Compact textual form, as `print` and `to_string` show it. Top-level
/// strings are NOT quoted; strings inside composites are.
pub fn to_compact_string(value: &Value) -> String {
    let mut buf = String::new();
    format_value(value, false, &mut buf);
    buf
}

/// Compact form with top-level strings quoted. Used for elements inside
/// composites and in diagnostics.
pub fn to_compact_string_quote_strings(value: &Value) -> String {
    let mut buf = String::new();
    format_value(value, true, &mut buf);
    buf
}

/// Diagnostic form pairing the type signature with the quoted value.
pub fn value_and_type_to_string(value: &Value) -> String {
    format!(
        "{}: {}",
        value.value_type().to_signature(),
        to_compact_string_quote_strings(value)
    )
}

fn format_value(value: &Value, quote_strings: bool, buf: &mut String) {
    match value {
        Value::Undefined => buf.push_str("undefined"),
        Value::Void => buf.push_str("void"),
        Value::Bool(b) => buf.push_str(if *b { "true" } else { "false" }),
        Value::Int(i) => buf.push_str(&i.to_string()),
        Value::Float(f) => {
            let s = f.to_string();
            buf.push_str(&s);
            // Floats always carry a decimal point, to stay distinguishable
            // from ints.
            if !s.contains('.') && !s.contains("inf") && !s.contains("NaN") {
                buf.push_str(".0");
            }
        }
        Value::String(s) => {
            if quote_strings {
                format_quoted_string(s, buf);
            } else {
                buf.push_str(s);
            }
        }
        Value::Json(j) => {
            buf.push_str(&serde_json::to_string(j.as_ref()).expect("json node serializes"))
        }
        Value::Typeid(t) => buf.push_str(&t.to_signature()),
        Value::Struct(s) => {
            buf.push('{');
            let def = s
                .struct_type
                .struct_def()
                .expect("struct value carries a struct type");
            for (i, (member, value)) in def.members.iter().zip(&s.members).enumerate() {
                if i > 0 {
                    buf.push_str(", ");
                }
                buf.push_str(&member.name);
                buf.push('=');
                format_value(value, true, buf);
            }
            buf.push('}');
        }
        Value::Vector(v) => {
            buf.push('[');
            for (i, e) in v.elements.iter().enumerate() {
                if i > 0 {
                    buf.push_str(", ");
                }
                format_value(e, true, buf);
            }
            buf.push(']');
        }
        Value::Dict(d) => {
            buf.push('{');
            for (i, (key, value)) in d.entries.iter().enumerate() {
                if i > 0 {
                    buf.push_str(", ");
                }
                format_quoted_string(key, buf);
                buf.push_str(": ");
                format_value(value, true, buf);
            }
            buf.push('}');
        }
        Value::Function(f) => {
            buf.push_str(&format!("<function:{}>", f.function_id));
        }
    }
}

fn format_quoted_string(s: &str, buf: &mut String) {
    buf.push('"');
    for c in s.chars() {
        match c {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            '\n' => buf.push_str("\\n"),
            '\r' => buf.push_str("\\r"),
            '\t' => buf.push_str("\\t"),
            c if c.is_control() => {
                buf.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => buf.push(c),
        }
    }
    buf.push('"');
}
