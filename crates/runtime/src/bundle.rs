//! Program Bundle JSON
//!
//! The compiler pipeline hands the runtime a serialized bundle:
//!
//! ```json
//! ["program", {"globals": [...], "functions": [...], "top": [...]}]
//! ```
//!
//! Symbols encode as `[name, storage, type, init]` (init is a constant or
//! null), instructions as `[opcode, ...operands]`, and constants as
//! `(type, payload)` pairs using the AST value encoding — function constants
//! carry their integer id, everything else its flattened JSON form.
//!
//! Malformed bundles fail with `JsonShapeMismatch`; bundles whose addresses
//! or callees do not resolve fail with `UndefinedSymbol` (the loaded program
//! is validated before it is returned).

use crate::program::{
    ArithOp, CompareOp, FunctionDef, Instruction, Program, Symbol, SymbolAddress, SymbolStorage,
    SymbolTable,
};
use floyd_core::error::RuntimeError;
use floyd_core::json::{flatten_to_json, unflatten_from_json};
use floyd_core::types::{BaseKind, TypeDescriptor, type_from_json, type_to_json};
use floyd_core::value::Value;
use serde_json::{Value as JsonValue, json};
use tracing::debug;

/// Serialize a program to its bundle form.
pub fn program_to_json(program: &Program) -> Result<JsonValue, RuntimeError> {
    let globals = symbols_to_json(&program.globals)?;
    let mut functions = Vec::with_capacity(program.functions.len());
    for f in &program.functions {
        functions.push(json!({
            "type": type_to_json(&f.function_type),
            "symbols": symbols_to_json(&f.symbols)?,
            "body": instructions_to_json(&f.body)?,
        }));
    }
    Ok(json!([
        "program",
        {
            "globals": globals,
            "functions": functions,
            "top": instructions_to_json(&program.top)?,
        }
    ]))
}

/// Load a program from its bundle form and validate it.
pub fn program_from_json(v: &JsonValue) -> Result<Program, RuntimeError> {
    let items = v
        .as_array()
        .filter(|a| a.len() == 2 && a[0] == json!("program"))
        .ok_or_else(|| shape_error("bundle must be [\"program\", {...}]"))?;
    let body = items[1]
        .as_object()
        .ok_or_else(|| shape_error("bundle body must be an object"))?;

    let globals = symbols_from_json(
        body.get("globals")
            .ok_or_else(|| shape_error("bundle is missing \"globals\""))?,
    )?;
    let functions_json = body
        .get("functions")
        .and_then(JsonValue::as_array)
        .ok_or_else(|| shape_error("bundle is missing \"functions\""))?;
    let mut functions = Vec::with_capacity(functions_json.len());
    for f in functions_json {
        let obj = f
            .as_object()
            .ok_or_else(|| shape_error("function entry must be an object"))?;
        let function_type = type_from_json(
            obj.get("type")
                .ok_or_else(|| shape_error("function entry is missing \"type\""))?,
        )?;
        let symbols = symbols_from_json(
            obj.get("symbols")
                .ok_or_else(|| shape_error("function entry is missing \"symbols\""))?,
        )?;
        let body = instructions_from_json(
            obj.get("body")
                .ok_or_else(|| shape_error("function entry is missing \"body\""))?,
        )?;
        functions.push(FunctionDef {
            function_type,
            symbols,
            body,
        });
    }
    let top = instructions_from_json(
        body.get("top")
            .ok_or_else(|| shape_error("bundle is missing \"top\""))?,
    )?;

    let program = Program {
        globals,
        functions,
        top,
    };
    program.validate()?;
    debug!(
        globals = program.globals.len(),
        functions = program.functions.len(),
        "program bundle loaded"
    );
    Ok(program)
}

/// Convenience: parse bundle text and load it.
pub fn program_from_text(text: &str) -> Result<Program, RuntimeError> {
    let v: JsonValue = serde_json::from_str(text)
        .map_err(|e| RuntimeError::JsonShapeMismatch(format!("invalid bundle text: {}", e)))?;
    program_from_json(&v)
}

// ============================================================================
// Symbols
// ============================================================================

fn symbols_to_json(table: &SymbolTable) -> Result<JsonValue, RuntimeError> {
    let mut out = Vec::with_capacity(table.len());
    for s in &table.symbols {
        let init = match &s.init {
            Some(constant) => {
                let (t, payload) = constant_to_parts(constant)?;
                json!([t, payload])
            }
            None => JsonValue::Null,
        };
        out.push(json!([
            s.name.clone(),
            s.storage.name(),
            type_to_json(&s.declared_type),
            init
        ]));
    }
    Ok(JsonValue::Array(out))
}

fn symbols_from_json(v: &JsonValue) -> Result<SymbolTable, RuntimeError> {
    let items = v
        .as_array()
        .ok_or_else(|| shape_error("symbol table must be an array"))?;
    let mut symbols = Vec::with_capacity(items.len());
    for item in items {
        let fields = item
            .as_array()
            .filter(|a| a.len() == 4)
            .ok_or_else(|| shape_error("symbol must be [name, storage, type, init]"))?;
        let name = fields[0]
            .as_str()
            .ok_or_else(|| shape_error("symbol name must be a string"))?;
        let storage = fields[1]
            .as_str()
            .and_then(SymbolStorage::from_name)
            .ok_or_else(|| shape_error("symbol storage must be global, local or arg"))?;
        let declared_type = type_from_json(&fields[2])?;
        let init = match &fields[3] {
            JsonValue::Null => None,
            other => {
                let pair = other
                    .as_array()
                    .filter(|a| a.len() == 2)
                    .ok_or_else(|| shape_error("symbol init must be [type, payload]"))?;
                Some(constant_from_parts(&pair[0], &pair[1])?)
            }
        };
        symbols.push(Symbol {
            name: name.to_string(),
            declared_type,
            storage,
            init,
        });
    }
    Ok(SymbolTable::new(symbols))
}

// ============================================================================
// Constants
// ============================================================================

fn constant_to_parts(v: &Value) -> Result<(JsonValue, JsonValue), RuntimeError> {
    let t = type_to_json(&v.value_type());
    let payload = match v {
        Value::Undefined | Value::Void => JsonValue::Null,
        Value::Function(f) => json!(f.function_id),
        other => flatten_to_json(other)?,
    };
    Ok((t, payload))
}

fn constant_from_parts(t: &JsonValue, payload: &JsonValue) -> Result<Value, RuntimeError> {
    let declared = type_from_json(t)?;
    match declared.base_kind() {
        BaseKind::Undefined => Ok(Value::Undefined),
        BaseKind::Void => Ok(Value::Void),
        BaseKind::Function => {
            let id = payload
                .as_i64()
                .ok_or_else(|| shape_error("function constant payload must be an id"))?;
            Value::make_function(declared, id as i32)
        }
        _ => unflatten_from_json(payload, &declared),
    }
}

// ============================================================================
// Instructions
// ============================================================================

fn instructions_to_json(instructions: &[Instruction]) -> Result<JsonValue, RuntimeError> {
    let mut out = Vec::with_capacity(instructions.len());
    for instr in instructions {
        out.push(instruction_to_json(instr)?);
    }
    Ok(JsonValue::Array(out))
}

fn instruction_to_json(instr: &Instruction) -> Result<JsonValue, RuntimeError> {
    Ok(match instr {
        Instruction::LoadConst { value } => {
            let (t, payload) = constant_to_parts(value)?;
            json!(["load-const", t, payload])
        }
        Instruction::LoadSymbol { address, kind } => {
            json!(["load", address.frame, address.slot, kind.name()])
        }
        Instruction::StoreSymbol { address, kind } => {
            json!(["store", address.frame, address.slot, kind.name()])
        }
        Instruction::Arith { op, kind } => json!([op.name(), kind.name()]),
        Instruction::Compare { op, kind } => json!([op.name(), kind.name()]),
        Instruction::GetMember { member_index } => json!(["get-member", member_index]),
        Instruction::LookupElement { kind } => json!(["lookup", kind.name()]),
        Instruction::Call {
            callee,
            arg_count: _,
            arg_kinds,
        } => {
            let (t, payload) = constant_to_parts(callee)?;
            let kinds: Vec<&str> = arg_kinds.iter().map(BaseKind::name).collect();
            json!(["call", t, payload, kinds])
        }
        Instruction::Return { kind } => json!(["return", kind.name()]),
        Instruction::Jump { target } => json!(["jump", target]),
        Instruction::BranchIfFalse { target } => json!(["branch-false", target]),
        Instruction::BranchIfTrue { target } => json!(["branch-true", target]),
        Instruction::ConstructStruct {
            struct_type,
            arg_count,
        } => json!(["construct-struct", type_to_json(struct_type), arg_count]),
        Instruction::ConstructVector {
            element_type,
            arg_count,
        } => json!(["construct-vector", type_to_json(element_type), arg_count]),
        Instruction::ConstructDict {
            value_type,
            arg_count,
        } => json!(["construct-dict", type_to_json(value_type), arg_count]),
        Instruction::ConstructFromTypeid {
            target_type,
            arg_type,
            arg_count,
        } => json!([
            "construct",
            type_to_json(target_type),
            type_to_json(arg_type),
            arg_count
        ]),
    })
}

fn instructions_from_json(v: &JsonValue) -> Result<Vec<Instruction>, RuntimeError> {
    let items = v
        .as_array()
        .ok_or_else(|| shape_error("instruction list must be an array"))?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(instruction_from_json(item)?);
    }
    Ok(out)
}

fn instruction_from_json(v: &JsonValue) -> Result<Instruction, RuntimeError> {
    let items = v
        .as_array()
        .filter(|a| !a.is_empty())
        .ok_or_else(|| shape_error("instruction must be a non-empty array"))?;
    let opcode = items[0]
        .as_str()
        .ok_or_else(|| shape_error("instruction opcode must be a string"))?;

    let arith = |op: ArithOp| -> Result<Instruction, RuntimeError> {
        Ok(Instruction::Arith {
            op,
            kind: kind_operand(items, 1)?,
        })
    };
    let compare = |op: CompareOp| -> Result<Instruction, RuntimeError> {
        Ok(Instruction::Compare {
            op,
            kind: kind_operand(items, 1)?,
        })
    };

    match opcode {
        "load-const" => {
            require_len(items, 3)?;
            Ok(Instruction::LoadConst {
                value: constant_from_parts(&items[1], &items[2])?,
            })
        }
        "load" => {
            require_len(items, 4)?;
            Ok(Instruction::LoadSymbol {
                address: address_operand(items)?,
                kind: kind_operand(items, 3)?,
            })
        }
        "store" => {
            require_len(items, 4)?;
            Ok(Instruction::StoreSymbol {
                address: address_operand(items)?,
                kind: kind_operand(items, 3)?,
            })
        }
        "add" => arith(ArithOp::Add),
        "sub" => arith(ArithOp::Sub),
        "mul" => arith(ArithOp::Mul),
        "div" => arith(ArithOp::Div),
        "mod" => arith(ArithOp::Mod),
        "eq" => compare(CompareOp::Eq),
        "ne" => compare(CompareOp::Ne),
        "lt" => compare(CompareOp::Lt),
        "le" => compare(CompareOp::Le),
        "gt" => compare(CompareOp::Gt),
        "ge" => compare(CompareOp::Ge),
        "get-member" => {
            require_len(items, 2)?;
            Ok(Instruction::GetMember {
                member_index: usize_operand(items, 1)?,
            })
        }
        "lookup" => {
            require_len(items, 2)?;
            Ok(Instruction::LookupElement {
                kind: kind_operand(items, 1)?,
            })
        }
        "call" => {
            require_len(items, 4)?;
            let callee = constant_from_parts(&items[1], &items[2])?;
            let kinds_json = items[3]
                .as_array()
                .ok_or_else(|| shape_error("call argument kinds must be an array"))?;
            let mut arg_kinds = Vec::with_capacity(kinds_json.len());
            for k in kinds_json {
                let name = k
                    .as_str()
                    .and_then(BaseKind::from_name)
                    .ok_or_else(|| shape_error("unknown argument kind"))?;
                arg_kinds.push(name);
            }
            Ok(Instruction::Call {
                callee,
                arg_count: arg_kinds.len(),
                arg_kinds,
            })
        }
        "return" => {
            require_len(items, 2)?;
            Ok(Instruction::Return {
                kind: kind_operand(items, 1)?,
            })
        }
        "jump" => {
            require_len(items, 2)?;
            Ok(Instruction::Jump {
                target: usize_operand(items, 1)?,
            })
        }
        "branch-false" => {
            require_len(items, 2)?;
            Ok(Instruction::BranchIfFalse {
                target: usize_operand(items, 1)?,
            })
        }
        "branch-true" => {
            require_len(items, 2)?;
            Ok(Instruction::BranchIfTrue {
                target: usize_operand(items, 1)?,
            })
        }
        "construct-struct" => {
            require_len(items, 3)?;
            Ok(Instruction::ConstructStruct {
                struct_type: type_from_json(&items[1])?,
                arg_count: usize_operand(items, 2)?,
            })
        }
        "construct-vector" => {
            require_len(items, 3)?;
            Ok(Instruction::ConstructVector {
                element_type: type_from_json(&items[1])?,
                arg_count: usize_operand(items, 2)?,
            })
        }
        "construct-dict" => {
            require_len(items, 3)?;
            Ok(Instruction::ConstructDict {
                value_type: type_from_json(&items[1])?,
                arg_count: usize_operand(items, 2)?,
            })
        }
        "construct" => {
            require_len(items, 4)?;
            Ok(Instruction::ConstructFromTypeid {
                target_type: type_from_json(&items[1])?,
                arg_type: type_from_json(&items[2])?,
                arg_count: usize_operand(items, 3)?,
            })
        }
        other => Err(shape_error(&format!("unknown opcode \"{}\"", other))),
    }
}

fn require_len(items: &[JsonValue], len: usize) -> Result<(), RuntimeError> {
    if items.len() != len {
        return Err(shape_error(&format!(
            "instruction \"{}\" takes {} fields, got {}",
            items[0],
            len - 1,
            items.len() - 1
        )));
    }
    Ok(())
}

fn address_operand(items: &[JsonValue]) -> Result<SymbolAddress, RuntimeError> {
    let frame = items[1]
        .as_i64()
        .ok_or_else(|| shape_error("frame index must be an integer"))?;
    let slot = usize_operand(items, 2)?;
    Ok(SymbolAddress {
        frame: frame as i32,
        slot,
    })
}

fn usize_operand(items: &[JsonValue], index: usize) -> Result<usize, RuntimeError> {
    items[index]
        .as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| shape_error("operand must be a non-negative integer"))
}

fn kind_operand(items: &[JsonValue], index: usize) -> Result<BaseKind, RuntimeError> {
    items
        .get(index)
        .and_then(JsonValue::as_str)
        .and_then(BaseKind::from_name)
        .ok_or_else(|| shape_error("operand must be a kind name"))
}

fn shape_error(msg: &str) -> RuntimeError {
    RuntimeError::JsonShapeMismatch(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::host_function_value;

    fn sample_program() -> Program {
        let print = host_function_value("print").unwrap();
        Program {
            globals: SymbolTable::new(vec![
                Symbol::new("x", TypeDescriptor::Int, SymbolStorage::Global),
                Symbol::new(
                    "greeting",
                    TypeDescriptor::String,
                    SymbolStorage::Global,
                )
                .with_init(Value::make_string("hi")),
            ]),
            functions: vec![FunctionDef {
                function_type: TypeDescriptor::function_of(
                    TypeDescriptor::Int,
                    vec![TypeDescriptor::Int],
                ),
                symbols: SymbolTable::new(vec![
                    Symbol::new("a", TypeDescriptor::Int, SymbolStorage::Argument),
                    Symbol::new("tmp", TypeDescriptor::Int, SymbolStorage::Local),
                ]),
                body: vec![
                    Instruction::LoadSymbol {
                        address: SymbolAddress::local(0),
                        kind: BaseKind::Int,
                    },
                    Instruction::LoadConst { value: Value::Int(1) },
                    Instruction::Arith {
                        op: ArithOp::Add,
                        kind: BaseKind::Int,
                    },
                    Instruction::Return {
                        kind: BaseKind::Int,
                    },
                ],
            }],
            top: vec![
                Instruction::LoadConst { value: Value::Int(41) },
                Instruction::StoreSymbol {
                    address: SymbolAddress::global(0),
                    kind: BaseKind::Int,
                },
                Instruction::LoadSymbol {
                    address: SymbolAddress::global(0),
                    kind: BaseKind::Int,
                },
                Instruction::Call {
                    callee: print,
                    arg_count: 1,
                    arg_kinds: vec![BaseKind::Int],
                },
            ],
        }
    }

    #[test]
    fn test_bundle_roundtrip() {
        let program = sample_program();
        let bundle = program_to_json(&program).unwrap();
        let loaded = program_from_json(&bundle).unwrap();
        assert_eq!(loaded, program);
    }

    #[test]
    fn test_bundle_shape() {
        let bundle = program_to_json(&sample_program()).unwrap();
        let items = bundle.as_array().unwrap();
        assert_eq!(items[0], serde_json::json!("program"));
        assert!(items[1].get("globals").is_some());
        assert!(items[1].get("functions").is_some());
        assert!(items[1].get("top").is_some());
    }

    #[test]
    fn test_text_roundtrip() {
        let program = sample_program();
        let text = serde_json::to_string(&program_to_json(&program).unwrap()).unwrap();
        let loaded = program_from_text(&text).unwrap();
        assert_eq!(loaded, program);
    }

    #[test]
    fn test_malformed_bundles_fail() {
        let cases = [
            serde_json::json!(["not-a-program", {}]),
            serde_json::json!(["program", {"globals": []}]),
            serde_json::json!(["program", {"globals": [], "functions": [], "top": [["frobnicate"]]}]),
            serde_json::json!(["program", {"globals": [["x"]], "functions": [], "top": []}]),
        ];
        for bundle in &cases {
            let err = program_from_json(bundle).unwrap_err();
            assert_eq!(err.kind(), "JsonShapeMismatch", "for {}", bundle);
        }
    }

    #[test]
    fn test_unresolved_address_fails_at_load() {
        let bundle = serde_json::json!([
            "program",
            {
                "globals": [],
                "functions": [],
                "top": [["load", 0, 5, "int"]],
            }
        ]);
        let err = program_from_json(&bundle).unwrap_err();
        assert_eq!(err.kind(), "UndefinedSymbol");
    }

    #[test]
    fn test_invalid_bundle_text_fails() {
        let err = program_from_text("not json at all").unwrap_err();
        assert_eq!(err.kind(), "JsonShapeMismatch");
    }
}
