//! Compiled Program Representation
//!
//! An immutable bundle produced by the compiler pipeline: the global symbol
//! table, the function table, and the top-level instruction sequence. The
//! interpreter never mutates a program; one program may back any number of
//! interpreter instances.
//!
//! Instructions form a small stack machine. Every instruction that touches an
//! untagged stack slot carries the slot's base kind, recovered by the code
//! generator from symbol metadata — the stack itself stores no tags (see
//! `stack.rs`).

use floyd_core::error::RuntimeError;
use floyd_core::types::{BaseKind, TypeDescriptor};
use floyd_core::value::{Value, type_accepts};
use std::collections::BTreeMap;

/// Where a symbol's slot lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolStorage {
    Global,
    Local,
    Argument,
}

impl SymbolStorage {
    pub fn name(&self) -> &'static str {
        match self {
            SymbolStorage::Global => "global",
            SymbolStorage::Local => "local",
            SymbolStorage::Argument => "arg",
        }
    }

    pub fn from_name(name: &str) -> Option<SymbolStorage> {
        match name {
            "global" => Some(SymbolStorage::Global),
            "local" => Some(SymbolStorage::Local),
            "arg" => Some(SymbolStorage::Argument),
            _ => None,
        }
    }
}

/// One named slot: declared type, storage class, and an optional constant
/// initializer (function bindings and literal constants).
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub declared_type: TypeDescriptor,
    pub storage: SymbolStorage,
    pub init: Option<Value>,
}

impl Symbol {
    pub fn new(
        name: impl Into<String>,
        declared_type: TypeDescriptor,
        storage: SymbolStorage,
    ) -> Symbol {
        Symbol {
            name: name.into(),
            declared_type,
            storage,
            init: None,
        }
    }

    pub fn with_init(mut self, init: Value) -> Symbol {
        self.init = Some(init);
        self
    }
}

/// An ordered list of symbols; the position in the list is the slot index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    pub symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new(symbols: Vec<Symbol>) -> SymbolTable {
        SymbolTable { symbols }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&Symbol> {
        self.symbols.get(slot)
    }

    /// Slot index and symbol for `name`, if declared.
    pub fn find(&self, name: &str) -> Option<(usize, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .find(|(_, s)| s.name == name)
    }
}

/// Address of a symbol slot. Frame 0 is the globals table; frame 1 is the
/// current frame. No other frame index is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolAddress {
    pub frame: i32,
    pub slot: usize,
}

impl SymbolAddress {
    pub fn global(slot: usize) -> SymbolAddress {
        SymbolAddress { frame: 0, slot }
    }

    pub fn local(slot: usize) -> SymbolAddress {
        SymbolAddress { frame: 1, slot }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithOp {
    pub fn name(&self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Mul => "mul",
            ArithOp::Div => "div",
            ArithOp::Mod => "mod",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn name(&self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
        }
    }
}

/// One stack-machine instruction.
///
/// `kind` operands name the base kind of the slots the instruction reads or
/// writes; extended payloads are self-describing once read, so the kind alone
/// is enough to materialize a full value from a raw slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Push a constant.
    LoadConst { value: Value },
    /// Push the value at a symbol slot.
    LoadSymbol {
        address: SymbolAddress,
        kind: BaseKind,
    },
    /// Pop a value into a symbol slot, releasing the slot's old payload.
    StoreSymbol {
        address: SymbolAddress,
        kind: BaseKind,
    },
    /// Pop two operands, push the result. Add also concatenates strings and
    /// vectors; the other ops are int/float only.
    Arith { op: ArithOp, kind: BaseKind },
    /// Pop two operands of one kind, push their comparison as bool.
    Compare { op: CompareOp, kind: BaseKind },
    /// Pop a struct, push the member at a fixed index.
    GetMember { member_index: usize },
    /// Pop a key then a container; push the element. Int subscripts for
    /// vectors and strings, string keys for dicts.
    LookupElement { kind: BaseKind },
    /// Pop `arg_count` arguments (kinds given youngest-last) and invoke the
    /// callee: a host function for ids ≥ 1000, a scripted frame otherwise.
    Call {
        callee: Value,
        arg_count: usize,
        arg_kinds: Vec<BaseKind>,
    },
    /// Pop the return value (nothing for void) and leave the function.
    Return { kind: BaseKind },
    Jump { target: usize },
    /// Pop a bool; jump when false.
    BranchIfFalse { target: usize },
    /// Pop a bool; jump when true.
    BranchIfTrue { target: usize },
    /// Pop one value per declared member (youngest member last) and push the
    /// struct.
    ConstructStruct {
        struct_type: TypeDescriptor,
        arg_count: usize,
    },
    /// Pop `arg_count` elements and push the vector.
    ConstructVector {
        element_type: TypeDescriptor,
        arg_count: usize,
    },
    /// Pop `arg_count` (key, value) pairs and push the dict. Duplicate keys
    /// keep the later pair.
    ConstructDict {
        value_type: TypeDescriptor,
        arg_count: usize,
    },
    /// Generic construction: dispatch on the target type descriptor.
    ConstructFromTypeid {
        target_type: TypeDescriptor,
        arg_type: TypeDescriptor,
        arg_count: usize,
    },
}

/// One entry of the function table: type, symbols (arguments first, then
/// locals, forming a single slot-index space), and the body.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub function_type: TypeDescriptor,
    pub symbols: SymbolTable,
    pub body: Vec<Instruction>,
}

impl FunctionDef {
    pub fn param_count(&self) -> usize {
        self.function_type
            .function_signature()
            .map(|sig| sig.parameters.len())
            .unwrap_or(0)
    }

    pub fn return_type(&self) -> &TypeDescriptor {
        self.function_type
            .function_signature()
            .map(|sig| &sig.return_type)
            .unwrap_or(&TypeDescriptor::Undefined)
    }

    /// Names of the argument symbols, in declared order.
    pub fn param_names(&self) -> Vec<&str> {
        self.symbols
            .symbols
            .iter()
            .take(self.param_count())
            .map(|s| s.name.as_str())
            .collect()
    }
}

/// The compiled program: globals, function table, top-level instructions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub globals: SymbolTable,
    pub functions: Vec<FunctionDef>,
    pub top: Vec<Instruction>,
}

impl Program {
    /// Check every symbol address, jump target, and callee id. Programs that
    /// fail here would corrupt the untagged stack at run time, so loading
    /// rejects them with `UndefinedSymbol` / `JsonShapeMismatch` instead.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        for s in &self.globals.symbols {
            if s.declared_type.base_kind() == BaseKind::Dynamic {
                return Err(RuntimeError::UndefinedSymbol(format!(
                    "global \"{}\": symbols must have concrete types",
                    s.name
                )));
            }
        }
        validate_instructions(&self.top, &self.globals, 0, self)?;
        for (i, f) in self.functions.iter().enumerate() {
            let sig = f.function_type.function_signature().ok_or_else(|| {
                RuntimeError::UndefinedSymbol(format!(
                    "function {} has non-function type {}",
                    i,
                    f.function_type.to_signature()
                ))
            })?;
            let n_args = sig.parameters.len();
            if f.symbols.len() < n_args {
                return Err(RuntimeError::UndefinedSymbol(format!(
                    "function {} declares {} parameters but only {} symbols",
                    i,
                    n_args,
                    f.symbols.len()
                )));
            }
            for s in &f.symbols.symbols {
                if s.declared_type.base_kind() == BaseKind::Dynamic {
                    return Err(RuntimeError::UndefinedSymbol(format!(
                        "function {}: symbol \"{}\" must have a concrete type",
                        i, s.name
                    )));
                }
            }
            for (s, param_type) in f.symbols.symbols.iter().zip(&sig.parameters) {
                if s.storage != SymbolStorage::Argument {
                    return Err(RuntimeError::UndefinedSymbol(format!(
                        "function {}: symbol \"{}\" must have argument storage",
                        i, s.name
                    )));
                }
                if s.declared_type != *param_type {
                    return Err(RuntimeError::UndefinedSymbol(format!(
                        "function {}: argument \"{}\" type differs from the signature",
                        i, s.name
                    )));
                }
            }
            validate_instructions(&f.body, &f.symbols, n_args, self)?;
        }
        Ok(())
    }

    pub fn find_global(&self, name: &str) -> Option<(usize, &Symbol)> {
        self.globals.find(name)
    }
}

fn validate_instructions(
    instructions: &[Instruction],
    frame_symbols: &SymbolTable,
    _n_args: usize,
    program: &Program,
) -> Result<(), RuntimeError> {
    let check_address = |address: &SymbolAddress| -> Result<(), RuntimeError> {
        let table = match address.frame {
            0 => &program.globals,
            1 => frame_symbols,
            other => {
                return Err(RuntimeError::UndefinedSymbol(format!(
                    "invalid frame index {}",
                    other
                )));
            }
        };
        if address.slot >= table.len() {
            return Err(RuntimeError::UndefinedSymbol(format!(
                "slot {} out of range for frame {}",
                address.slot, address.frame
            )));
        }
        Ok(())
    };
    let check_kind = |kind: &BaseKind| -> Result<(), RuntimeError> {
        if *kind == BaseKind::Dynamic {
            return Err(RuntimeError::UndefinedSymbol(
                "instructions must carry concrete kinds, not dynamic".to_string(),
            ));
        }
        Ok(())
    };
    let check_target = |target: usize| -> Result<(), RuntimeError> {
        if target > instructions.len() {
            return Err(RuntimeError::UndefinedSymbol(format!(
                "jump target {} past end of body",
                target
            )));
        }
        Ok(())
    };

    for instr in instructions {
        match instr {
            Instruction::LoadSymbol { address, kind }
            | Instruction::StoreSymbol { address, kind } => {
                check_address(address)?;
                check_kind(kind)?;
            }
            Instruction::Arith { kind, .. }
            | Instruction::Compare { kind, .. }
            | Instruction::LookupElement { kind }
            | Instruction::Return { kind } => check_kind(kind)?,
            Instruction::Call {
                callee,
                arg_count,
                arg_kinds,
            } => {
                let fref = callee.get_function().map_err(|_| {
                    RuntimeError::UndefinedSymbol("call instruction callee is not a function".to_string())
                })?;
                if arg_kinds.len() != *arg_count {
                    return Err(RuntimeError::UndefinedSymbol(format!(
                        "call carries {} kinds for {} arguments",
                        arg_kinds.len(),
                        arg_count
                    )));
                }
                for k in arg_kinds {
                    check_kind(k)?;
                }
                let id = fref.function_id;
                if id >= 0 && id < crate::host::HOST_FUNCTION_ID_BASE
                    && (id as usize) >= program.functions.len()
                {
                    return Err(RuntimeError::UndefinedSymbol(format!(
                        "call to unknown scripted function {}",
                        id
                    )));
                }
            }
            Instruction::Jump { target }
            | Instruction::BranchIfFalse { target }
            | Instruction::BranchIfTrue { target } => check_target(*target)?,
            Instruction::LoadConst { .. }
            | Instruction::GetMember { .. }
            | Instruction::ConstructStruct { .. }
            | Instruction::ConstructVector { .. }
            | Instruction::ConstructDict { .. }
            | Instruction::ConstructFromTypeid { .. } => {}
        }
    }
    Ok(())
}

/// The language's generic construction expression, `T(args...)`.
///
/// Rules per target kind:
/// - primitive: one argument, same type — except the documented json↔string
///   pair: `string(j)` takes a json string node's text, `json(s)` wraps the
///   string as a json string node
/// - struct: one argument per declared member, types matching
/// - vector: every argument has the element type
/// - dict: alternating (string key, value) pairs, values matching
///
/// Wrong argument counts are `ArityMismatch`; every type failure is
/// `ConstructionTypeError`.
pub fn construct_value_from_typeid(
    target_type: &TypeDescriptor,
    arg_type: &TypeDescriptor,
    args: Vec<Value>,
) -> Result<Value, RuntimeError> {
    match target_type {
        TypeDescriptor::Bool
        | TypeDescriptor::Int
        | TypeDescriptor::Float
        | TypeDescriptor::String
        | TypeDescriptor::Json
        | TypeDescriptor::Typeid => {
            if args.len() != 1 {
                return Err(RuntimeError::ArityMismatch(format!(
                    "{}() takes 1 argument, got {}",
                    target_type.base_kind().name(),
                    args.len()
                )));
            }
            let arg = args.into_iter().next().expect("length checked");
            if type_accepts(target_type, &arg) {
                return Ok(arg);
            }
            match (target_type, &arg) {
                (TypeDescriptor::String, Value::Json(j)) => match j.as_str() {
                    Some(s) => Ok(Value::make_string(s)),
                    None => Err(RuntimeError::ConstructionTypeError(
                        "string() of a json value requires a json string node".to_string(),
                    )),
                },
                (TypeDescriptor::Json, Value::String(s)) => {
                    Ok(Value::make_json(serde_json::Value::String(s.as_str().to_string())))
                }
                _ => Err(RuntimeError::ConstructionTypeError(format!(
                    "cannot construct {} from {}",
                    target_type.to_signature(),
                    arg_type.to_signature()
                ))),
            }
        }
        TypeDescriptor::Struct(def) => {
            if args.len() != def.members.len() {
                return Err(RuntimeError::ArityMismatch(format!(
                    "struct {} takes {} arguments, got {}",
                    target_type.to_signature(),
                    def.members.len(),
                    args.len()
                )));
            }
            Value::make_struct(target_type.clone(), args)
                .map_err(|e| RuntimeError::ConstructionTypeError(e.to_string()))
        }
        TypeDescriptor::Vector(element_type) => {
            Value::make_vector((**element_type).clone(), args)
                .map_err(|e| RuntimeError::ConstructionTypeError(e.to_string()))
        }
        TypeDescriptor::Dict(value_type) => {
            if args.len() % 2 != 0 {
                return Err(RuntimeError::ArityMismatch(
                    "dict construction takes alternating key, value arguments".to_string(),
                ));
            }
            let mut entries = BTreeMap::new();
            let mut it = args.into_iter();
            while let (Some(key), Some(value)) = (it.next(), it.next()) {
                let key = key.get_string().map_err(|_| {
                    RuntimeError::ConstructionTypeError("dict keys must be strings".to_string())
                })?;
                entries.insert(key.to_string(), value);
            }
            Value::make_dict((**value_type).clone(), entries)
                .map_err(|e| RuntimeError::ConstructionTypeError(e.to_string()))
        }
        other => Err(RuntimeError::ConstructionTypeError(format!(
            "cannot construct a value of type {}",
            other.to_signature()
        ))),
    }
}
