//! Type Descriptors
//!
//! An immutable, structurally-comparable description of every value's type.
//! Compound descriptors carry their full structure, so two descriptors are
//! equal exactly when they describe the same shape, member for member.
//!
//! Every descriptor has a canonical textual *signature* used as a map key for
//! deduplication and in diagnostics:
//!
//! ```text
//! <bool>
//! <string>
//! <vector>[<float>]
//! <struct>{<int>x,<string>y}
//! <float>(<string>,<float>)
//! ```
//!
//! Struct member order is significant; dict ordering is irrelevant (a dict
//! descriptor only names its value type).
//!
//! Descriptors also have a canonical JSON encoding used by the compiler
//! pipeline and the program-bundle loader: primitives as their kind-name
//! strings, compounds as tagged arrays.

use crate::error::RuntimeError;
use serde_json::{Value as JsonValue, json};
use std::rc::Rc;

/// Top-level discriminator of a type or value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseKind {
    Undefined,
    /// Sentinel for host-function parameters that accept any value.
    /// Only ever appears in descriptors, never as a value's tag.
    Dynamic,
    Void,
    Bool,
    Int,
    Float,
    String,
    Json,
    Typeid,
    Struct,
    Vector,
    Dict,
    Function,
}

impl BaseKind {
    /// Lowercase kind name, as used in signatures and JSON encodings.
    pub fn name(&self) -> &'static str {
        match self {
            BaseKind::Undefined => "undefined",
            BaseKind::Dynamic => "dynamic",
            BaseKind::Void => "void",
            BaseKind::Bool => "bool",
            BaseKind::Int => "int",
            BaseKind::Float => "float",
            BaseKind::String => "string",
            BaseKind::Json => "json",
            BaseKind::Typeid => "typeid",
            BaseKind::Struct => "struct",
            BaseKind::Vector => "vector",
            BaseKind::Dict => "dict",
            BaseKind::Function => "function",
        }
    }

    /// Inverse of [`BaseKind::name`].
    pub fn from_name(name: &str) -> Option<BaseKind> {
        match name {
            "undefined" => Some(BaseKind::Undefined),
            "dynamic" => Some(BaseKind::Dynamic),
            "void" => Some(BaseKind::Void),
            "bool" => Some(BaseKind::Bool),
            "int" => Some(BaseKind::Int),
            "float" => Some(BaseKind::Float),
            "string" => Some(BaseKind::String),
            "json" => Some(BaseKind::Json),
            "typeid" => Some(BaseKind::Typeid),
            "struct" => Some(BaseKind::Struct),
            "vector" => Some(BaseKind::Vector),
            "dict" => Some(BaseKind::Dict),
            "function" => Some(BaseKind::Function),
            _ => None,
        }
    }

    /// True for kinds whose payload lives behind a shared, reference-counted
    /// allocation. Undefined/Dynamic/Void/Bool/Int/Float are inline.
    pub fn is_extended(&self) -> bool {
        matches!(
            self,
            BaseKind::String
                | BaseKind::Json
                | BaseKind::Typeid
                | BaseKind::Struct
                | BaseKind::Vector
                | BaseKind::Dict
                | BaseKind::Function
        )
    }
}

/// One named member of a struct type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructMember {
    pub name: String,
    pub member_type: TypeDescriptor,
}

impl StructMember {
    pub fn new(name: impl Into<String>, member_type: TypeDescriptor) -> StructMember {
        StructMember {
            name: name.into(),
            member_type,
        }
    }
}

/// The ordered member list of a struct type. Order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructDefinition {
    pub members: Vec<StructMember>,
}

impl StructDefinition {
    pub fn new(members: Vec<StructMember>) -> StructDefinition {
        StructDefinition { members }
    }

    /// Index of the member called `name`, if any.
    pub fn member_index_of(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name == name)
    }
}

/// A function type: return type plus parameter types, in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    pub return_type: TypeDescriptor,
    pub parameters: Vec<TypeDescriptor>,
}

/// A structural type descriptor.
///
/// Compound payloads are `Rc`-shared so descriptors clone cheaply into
/// instructions, values, and symbol tables. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Undefined,
    Dynamic,
    Void,
    Bool,
    Int,
    Float,
    String,
    Json,
    Typeid,
    Struct(Rc<StructDefinition>),
    Vector(Rc<TypeDescriptor>),
    Dict(Rc<TypeDescriptor>),
    Function(Rc<FunctionSignature>),
}

impl TypeDescriptor {
    pub fn struct_of(members: Vec<StructMember>) -> TypeDescriptor {
        TypeDescriptor::Struct(Rc::new(StructDefinition::new(members)))
    }

    pub fn vector_of(element_type: TypeDescriptor) -> TypeDescriptor {
        TypeDescriptor::Vector(Rc::new(element_type))
    }

    pub fn dict_of(value_type: TypeDescriptor) -> TypeDescriptor {
        TypeDescriptor::Dict(Rc::new(value_type))
    }

    pub fn function_of(
        return_type: TypeDescriptor,
        parameters: Vec<TypeDescriptor>,
    ) -> TypeDescriptor {
        TypeDescriptor::Function(Rc::new(FunctionSignature {
            return_type,
            parameters,
        }))
    }

    pub fn base_kind(&self) -> BaseKind {
        match self {
            TypeDescriptor::Undefined => BaseKind::Undefined,
            TypeDescriptor::Dynamic => BaseKind::Dynamic,
            TypeDescriptor::Void => BaseKind::Void,
            TypeDescriptor::Bool => BaseKind::Bool,
            TypeDescriptor::Int => BaseKind::Int,
            TypeDescriptor::Float => BaseKind::Float,
            TypeDescriptor::String => BaseKind::String,
            TypeDescriptor::Json => BaseKind::Json,
            TypeDescriptor::Typeid => BaseKind::Typeid,
            TypeDescriptor::Struct(_) => BaseKind::Struct,
            TypeDescriptor::Vector(_) => BaseKind::Vector,
            TypeDescriptor::Dict(_) => BaseKind::Dict,
            TypeDescriptor::Function(_) => BaseKind::Function,
        }
    }

    /// Member list, when this is a struct type.
    pub fn struct_def(&self) -> Option<&StructDefinition> {
        match self {
            TypeDescriptor::Struct(def) => Some(def),
            _ => None,
        }
    }

    /// Element type, when this is a vector type.
    pub fn element_type(&self) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::Vector(t) => Some(t),
            _ => None,
        }
    }

    /// Value type, when this is a dict type.
    pub fn dict_value_type(&self) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::Dict(t) => Some(t),
            _ => None,
        }
    }

    /// Return/parameter types, when this is a function type.
    pub fn function_signature(&self) -> Option<&FunctionSignature> {
        match self {
            TypeDescriptor::Function(sig) => Some(sig),
            _ => None,
        }
    }

    /// Canonical signature string, unique per structural type.
    pub fn to_signature(&self) -> String {
        match self {
            TypeDescriptor::Struct(def) => {
                let members: Vec<String> = def
                    .members
                    .iter()
                    .map(|m| format!("{}{}", m.member_type.to_signature(), m.name))
                    .collect();
                format!("<struct>{{{}}}", members.join(","))
            }
            TypeDescriptor::Vector(t) => format!("<vector>[{}]", t.to_signature()),
            TypeDescriptor::Dict(t) => format!("<dict>[{}]", t.to_signature()),
            TypeDescriptor::Function(sig) => {
                let params: Vec<String> =
                    sig.parameters.iter().map(|p| p.to_signature()).collect();
                format!("{}({})", sig.return_type.to_signature(), params.join(","))
            }
            other => format!("<{}>", other.base_kind().name()),
        }
    }
}

/// Canonical JSON encoding of a descriptor.
///
/// Primitives encode as their kind-name strings; compounds as tagged arrays:
/// `["vector", T]`, `["dict", T]`, `["struct", [[name, T], ...]]`,
/// `["function", R, [P...]]`.
pub fn type_to_json(t: &TypeDescriptor) -> JsonValue {
    match t {
        TypeDescriptor::Struct(def) => {
            let members: Vec<JsonValue> = def
                .members
                .iter()
                .map(|m| json!([m.name.clone(), type_to_json(&m.member_type)]))
                .collect();
            json!(["struct", members])
        }
        TypeDescriptor::Vector(elem) => json!(["vector", type_to_json(elem)]),
        TypeDescriptor::Dict(value) => json!(["dict", type_to_json(value)]),
        TypeDescriptor::Function(sig) => {
            let params: Vec<JsonValue> = sig.parameters.iter().map(type_to_json).collect();
            json!(["function", type_to_json(&sig.return_type), params])
        }
        other => JsonValue::String(other.base_kind().name().to_string()),
    }
}

/// Inverse of [`type_to_json`]. Fails with `JsonShapeMismatch` on anything
/// that is not a canonical encoding.
pub fn type_from_json(v: &JsonValue) -> Result<TypeDescriptor, RuntimeError> {
    match v {
        JsonValue::String(name) => match BaseKind::from_name(name) {
            Some(kind) if !kind.is_extended() => Ok(primitive_descriptor(kind)),
            Some(BaseKind::String) => Ok(TypeDescriptor::String),
            Some(BaseKind::Json) => Ok(TypeDescriptor::Json),
            Some(BaseKind::Typeid) => Ok(TypeDescriptor::Typeid),
            _ => Err(RuntimeError::JsonShapeMismatch(format!(
                "unknown type name \"{}\"",
                name
            ))),
        },
        JsonValue::Array(items) => {
            let tag = items
                .first()
                .and_then(JsonValue::as_str)
                .ok_or_else(|| shape_error("compound type must start with a tag string"))?;
            match tag {
                "vector" => {
                    let elem = items.get(1).ok_or_else(|| shape_error("vector needs an element type"))?;
                    Ok(TypeDescriptor::vector_of(type_from_json(elem)?))
                }
                "dict" => {
                    let value = items.get(1).ok_or_else(|| shape_error("dict needs a value type"))?;
                    Ok(TypeDescriptor::dict_of(type_from_json(value)?))
                }
                "struct" => {
                    let members_json = items
                        .get(1)
                        .and_then(JsonValue::as_array)
                        .ok_or_else(|| shape_error("struct needs a member array"))?;
                    let mut members = Vec::with_capacity(members_json.len());
                    for m in members_json {
                        let pair = m
                            .as_array()
                            .filter(|p| p.len() == 2)
                            .ok_or_else(|| shape_error("struct member must be [name, type]"))?;
                        let name = pair[0]
                            .as_str()
                            .ok_or_else(|| shape_error("struct member name must be a string"))?;
                        members.push(StructMember::new(name, type_from_json(&pair[1])?));
                    }
                    Ok(TypeDescriptor::struct_of(members))
                }
                "function" => {
                    let ret = items.get(1).ok_or_else(|| shape_error("function needs a return type"))?;
                    let params_json = items
                        .get(2)
                        .and_then(JsonValue::as_array)
                        .ok_or_else(|| shape_error("function needs a parameter array"))?;
                    let mut params = Vec::with_capacity(params_json.len());
                    for p in params_json {
                        params.push(type_from_json(p)?);
                    }
                    Ok(TypeDescriptor::function_of(type_from_json(ret)?, params))
                }
                other => Err(RuntimeError::JsonShapeMismatch(format!(
                    "unknown compound type tag \"{}\"",
                    other
                ))),
            }
        }
        other => Err(RuntimeError::JsonShapeMismatch(format!(
            "type must be a string or tagged array, got {}",
            other
        ))),
    }
}

fn primitive_descriptor(kind: BaseKind) -> TypeDescriptor {
    match kind {
        BaseKind::Undefined => TypeDescriptor::Undefined,
        BaseKind::Dynamic => TypeDescriptor::Dynamic,
        BaseKind::Void => TypeDescriptor::Void,
        BaseKind::Bool => TypeDescriptor::Bool,
        BaseKind::Int => TypeDescriptor::Int,
        BaseKind::Float => TypeDescriptor::Float,
        BaseKind::String => TypeDescriptor::String,
        BaseKind::Json => TypeDescriptor::Json,
        BaseKind::Typeid => TypeDescriptor::Typeid,
        // Callers only pass non-compound kinds here.
        BaseKind::Struct | BaseKind::Vector | BaseKind::Dict | BaseKind::Function => {
            unreachable!("compound kinds carry structure")
        }
    }
}

fn shape_error(msg: &str) -> RuntimeError {
    RuntimeError::JsonShapeMismatch(msg.to_string())
}
