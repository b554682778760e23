//! Bytecode Interpreter
//!
//! Evaluates instructions against the untagged evaluation stack, manages
//! frames, resolves symbols, and dispatches calls to scripted functions or
//! the host table.
//!
//! # Frame protocol
//!
//! On a call the caller has already pushed the N arguments in declared
//! order. The interpreter then pushes one marker slot saving the previous
//! frame base, sets the frame base to the slot after the marker, and
//! reserves the callee's locals. Argument slot *i* therefore lives at
//! `frame_base - 1 - n_args + i` and local slot *j* at `frame_base + j`;
//! a function's symbol table lists arguments first, then locals, so one slot
//! index space covers both. Unwinding — on return and on every error path —
//! releases locals, marker, and arguments in reverse order, decrementing the
//! reference count of every extended payload exactly once.
//!
//! # Poisoning
//!
//! An error that escapes a public entry point (`run_program`,
//! `call_function`) leaves the interpreter in a defined-but-unusable state:
//! further calls fail with `InterpreterPoisoned`. The print log captured so
//! far stays readable.

use crate::host::{HOST_FUNCTION_ID_BASE, HostFunction, host_function_table};
use crate::program::{
    ArithOp, CompareOp, Instruction, Program, Symbol, SymbolAddress, SymbolTable,
    construct_value_from_typeid,
};
use crate::stack::InterpreterStack;
use floyd_core::error::RuntimeError;
use floyd_core::types::{BaseKind, TypeDescriptor};
use floyd_core::value::{Value, compare_values, default_value_for_type, type_accepts};
use serde_json::json;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, trace};

/// The immutable half of the interpreter: shared program, host table, and
/// the clock base for `get_time_of_day`. Read-only after construction, so
/// any number of interpreter instances may share one program.
pub struct InterpreterImm {
    pub program: Rc<Program>,
    pub host_functions: HashMap<i32, HostFunction>,
    pub start_time: Instant,
}

/// How a body finished: fell off the end, or hit a return instruction.
enum ExecOutcome {
    Completed,
    Returned(Value),
}

/// Frame-local context for symbol resolution.
struct FrameCtx<'a> {
    symbols: &'a SymbolTable,
    n_args: usize,
}

/// Complete runtime state of one interpreter. Single-threaded; scripted code
/// never observes a partially-updated stack.
pub struct Interpreter {
    imm: Rc<InterpreterImm>,
    stack: InterpreterStack,
    frame_base: usize,
    print_output: Vec<String>,
    poisoned: bool,
}

impl Interpreter {
    /// Validate the program, build the host table, and materialize the
    /// global slots (constant initializers first, declared-type defaults
    /// otherwise).
    pub fn new(program: Rc<Program>) -> Result<Interpreter, RuntimeError> {
        program.validate()?;
        debug!(
            globals = program.globals.len(),
            functions = program.functions.len(),
            "interpreter created"
        );
        let imm = Rc::new(InterpreterImm {
            program: Rc::clone(&program),
            host_functions: host_function_table(),
            start_time: Instant::now(),
        });
        let mut vm = Interpreter {
            imm,
            stack: InterpreterStack::new(),
            frame_base: 0,
            print_output: Vec::new(),
            poisoned: false,
        };
        for symbol in &program.globals.symbols {
            let value = match &symbol.init {
                Some(constant) => constant.clone(),
                None => default_value_for_type(&symbol.declared_type)?,
            };
            vm.stack.push_value(value);
        }
        Ok(vm)
    }

    pub fn program(&self) -> &Program {
        &self.imm.program
    }

    /// Everything `print` has emitted so far, in program order. Preserved
    /// across errors.
    pub fn print_output(&self) -> &[String] {
        &self.print_output
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub(crate) fn record_print(&mut self, line: String) {
        self.print_output.push(line);
    }

    pub(crate) fn start_time(&self) -> Instant {
        self.imm.start_time
    }

    /// Execute the top-level instructions, then call `main` (function id 0)
    /// with `args` as a vector-of-string when it declares a parameter, and
    /// return its result. Programs without functions return `void`.
    pub fn run_program(&mut self, args: &[String]) -> Result<Value, RuntimeError> {
        self.guard_poisoned()?;
        let result = self.run_program_inner(args);
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }

    fn run_program_inner(&mut self, args: &[String]) -> Result<Value, RuntimeError> {
        let imm = Rc::clone(&self.imm);
        let ctx = FrameCtx {
            symbols: &imm.program.globals,
            n_args: 0,
        };
        if let Err(e) = self.execute(&imm.program.top, &ctx) {
            self.stack.truncate_to(imm.program.globals.len());
            return Err(e);
        }
        debug_assert_eq!(self.stack.size(), imm.program.globals.len());

        let Some(main) = imm.program.functions.first() else {
            return Ok(Value::Void);
        };
        let call_args = match main.param_count() {
            0 => vec![],
            1 => {
                let argv = Value::make_vector(
                    TypeDescriptor::String,
                    args.iter().map(|s| Value::make_string(s.as_str())).collect(),
                )?;
                vec![argv]
            }
            n => {
                return Err(RuntimeError::ArityMismatch(format!(
                    "main declares {} parameters; expected 0 or 1",
                    n
                )));
            }
        };
        let main_ref = Value::make_function(main.function_type.clone(), 0)?;
        self.call_function_inner(&main_ref, &call_args)
    }

    /// Call a function value with already-materialized arguments. This is
    /// the re-entry point host functions and embedders may use; it pushes a
    /// new frame on the same stack.
    pub fn call_function(&mut self, f: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
        self.guard_poisoned()?;
        let result = self.call_function_inner(f, args);
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }

    fn call_function_inner(&mut self, f: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
        let fref = f.get_function()?;
        let signature = fref
            .function_type
            .function_signature()
            .ok_or_else(|| {
                RuntimeError::TypeMismatch("function value without a function type".to_string())
            })?;
        if args.len() != signature.parameters.len() {
            return Err(RuntimeError::ArityMismatch(format!(
                "function takes {} arguments, got {}",
                signature.parameters.len(),
                args.len()
            )));
        }
        for (param, arg) in signature.parameters.iter().zip(args) {
            if !type_accepts(param, arg) {
                return Err(RuntimeError::TypeMismatch(format!(
                    "argument: expected {}, got {}",
                    param.to_signature(),
                    arg.value_type().to_signature()
                )));
            }
        }
        let function_id = fref.function_id;
        if function_id >= HOST_FUNCTION_ID_BASE {
            return self.call_host_function(function_id, args.to_vec());
        }
        if function_id < 0 {
            return Err(RuntimeError::UndefinedSymbol(
                "call through an unassigned function value".to_string(),
            ));
        }
        for arg in args {
            self.stack.push_value(arg.clone());
        }
        let result = self.call_scripted_function(function_id as usize, args.len())?;
        Ok(result.unwrap_or(Value::Void))
    }

    /// Find a global by name: its address and symbol record.
    pub fn find_global_symbol(&self, name: &str) -> Option<(SymbolAddress, &Symbol)> {
        self.imm
            .program
            .globals
            .find(name)
            .map(|(slot, symbol)| (SymbolAddress::global(slot), symbol))
    }

    /// Current value of a global by name.
    pub fn get_global(&self, name: &str) -> Result<Value, RuntimeError> {
        let (slot, symbol) = self
            .imm
            .program
            .globals
            .find(name)
            .ok_or_else(|| RuntimeError::UndefinedSymbol(format!("global \"{}\"", name)))?;
        Ok(self
            .stack
            .load_value(slot, symbol.declared_type.base_kind()))
    }

    /// Diagnostic snapshot of the interpreter state.
    pub fn interpreter_to_json(&self) -> serde_json::Value {
        let mut globals = serde_json::Map::new();
        for (slot, symbol) in self.imm.program.globals.symbols.iter().enumerate() {
            let value = self
                .stack
                .load_value(slot, symbol.declared_type.base_kind());
            globals.insert(
                symbol.name.clone(),
                serde_json::Value::String(floyd_core::to_compact_string_quote_strings(&value)),
            );
        }
        json!({
            "stack_size": self.stack.size(),
            "frame_base": self.frame_base,
            "poisoned": self.poisoned,
            "print_output": self.print_output.clone(),
            "globals": serde_json::Value::Object(globals),
        })
    }

    fn guard_poisoned(&self) -> Result<(), RuntimeError> {
        if self.poisoned {
            Err(RuntimeError::InterpreterPoisoned)
        } else {
            Ok(())
        }
    }

    /// Physical stack index of a symbol address within the current frame.
    fn slot_position(&self, address: &SymbolAddress, ctx: &FrameCtx) -> usize {
        if address.frame == 0 {
            address.slot
        } else if address.slot < ctx.n_args {
            self.frame_base - 1 - ctx.n_args + address.slot
        } else {
            self.frame_base + (address.slot - ctx.n_args)
        }
    }

    /// Enter a scripted frame. The N arguments are already on the stack,
    /// youngest last. Returns the function's result, `None` for void.
    fn call_scripted_function(
        &mut self,
        fn_index: usize,
        n_args: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        let imm = Rc::clone(&self.imm);
        let def = imm.program.functions.get(fn_index).ok_or_else(|| {
            RuntimeError::UndefinedSymbol(format!("scripted function {}", fn_index))
        })?;
        debug_assert_eq!(n_args, def.param_count());
        trace!(fn_index, n_args, "entering scripted frame");

        let saved_base = self.frame_base;
        self.stack.push_int(saved_base as i32);
        self.frame_base = self.stack.size();

        let mut outcome: Result<ExecOutcome, RuntimeError> = Ok(ExecOutcome::Completed);
        for symbol in &def.symbols.symbols[n_args..] {
            let init = match &symbol.init {
                Some(constant) => Ok(constant.clone()),
                None => default_value_for_type(&symbol.declared_type),
            };
            match init {
                Ok(v) => self.stack.push_value(v),
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        if outcome.is_ok() {
            let ctx = FrameCtx {
                symbols: &def.symbols,
                n_args,
            };
            outcome = self.execute(&def.body, &ctx);
        }

        // Unwind: temporaries and locals, then the marker, then arguments.
        self.stack.truncate_to(self.frame_base);
        self.frame_base = self.stack.pop_int() as usize;
        let signature = def
            .function_type
            .function_signature()
            .expect("validated function type");
        for param in signature.parameters.iter().rev() {
            drop(self.stack.pop_value(param.base_kind()));
        }

        match outcome? {
            ExecOutcome::Completed => Ok(None),
            ExecOutcome::Returned(v) => {
                if v.is_void() {
                    Ok(None)
                } else {
                    Ok(Some(v))
                }
            }
        }
    }

    fn call_host_function(&mut self, id: i32, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let f = {
            let entry = self.imm.host_functions.get(&id).ok_or_else(|| {
                RuntimeError::UndefinedSymbol(format!("host function {}", id))
            })?;
            trace!(name = entry.name, "calling host function");
            entry.f
        };
        f(self, &args)
    }

    fn execute(
        &mut self,
        instructions: &[Instruction],
        ctx: &FrameCtx,
    ) -> Result<ExecOutcome, RuntimeError> {
        let mut pc = 0usize;
        while pc < instructions.len() {
            match &instructions[pc] {
                Instruction::LoadConst { value } => {
                    self.stack.push_value(value.clone());
                }
                Instruction::LoadSymbol { address, kind } => {
                    let pos = self.slot_position(address, ctx);
                    let value = self.stack.load_value(pos, *kind);
                    self.stack.push_value(value);
                }
                Instruction::StoreSymbol { address, kind } => {
                    let value = self.stack.pop_value(*kind);
                    let pos = self.slot_position(address, ctx);
                    self.stack.replace_value(pos, value);
                }
                Instruction::Arith { op, kind } => self.execute_arith(*op, *kind)?,
                Instruction::Compare { op, kind } => self.execute_compare(*op, *kind)?,
                Instruction::GetMember { member_index } => {
                    let obj = self.stack.pop_value(BaseKind::Struct);
                    let member = {
                        let instance = obj.get_struct()?;
                        instance
                            .members
                            .get(*member_index)
                            .ok_or_else(|| {
                                RuntimeError::IndexOutOfBounds(format!(
                                    "struct member {}",
                                    member_index
                                ))
                            })?
                            .clone()
                    };
                    self.stack.push_value(member);
                }
                Instruction::LookupElement { kind } => self.execute_lookup(*kind)?,
                Instruction::Call {
                    callee,
                    arg_count,
                    arg_kinds,
                } => self.execute_call(callee, *arg_count, arg_kinds)?,
                Instruction::Return { kind } => {
                    if matches!(kind, BaseKind::Void | BaseKind::Undefined) {
                        return Ok(ExecOutcome::Returned(Value::Void));
                    }
                    let value = self.stack.pop_value(*kind);
                    return Ok(ExecOutcome::Returned(value));
                }
                Instruction::Jump { target } => {
                    pc = *target;
                    continue;
                }
                Instruction::BranchIfFalse { target } => {
                    let condition = self.stack.pop_value(BaseKind::Bool).get_bool()?;
                    if !condition {
                        pc = *target;
                        continue;
                    }
                }
                Instruction::BranchIfTrue { target } => {
                    let condition = self.stack.pop_value(BaseKind::Bool).get_bool()?;
                    if condition {
                        pc = *target;
                        continue;
                    }
                }
                Instruction::ConstructStruct {
                    struct_type,
                    arg_count,
                } => {
                    let def = struct_type.struct_def().ok_or_else(|| {
                        RuntimeError::ConstructionTypeError(format!(
                            "{} is not a struct type",
                            struct_type.to_signature()
                        ))
                    })?;
                    if def.members.len() != *arg_count {
                        return Err(RuntimeError::ArityMismatch(format!(
                            "struct {} takes {} arguments, got {}",
                            struct_type.to_signature(),
                            def.members.len(),
                            arg_count
                        )));
                    }
                    let kinds: Vec<BaseKind> = def
                        .members
                        .iter()
                        .map(|m| m.member_type.base_kind())
                        .collect();
                    let args = self.pop_args(&kinds);
                    let value = Value::make_struct(struct_type.clone(), args)
                        .map_err(|e| RuntimeError::ConstructionTypeError(e.to_string()))?;
                    self.stack.push_value(value);
                }
                Instruction::ConstructVector {
                    element_type,
                    arg_count,
                } => {
                    let kinds = vec![element_type.base_kind(); *arg_count];
                    let args = self.pop_args(&kinds);
                    let value = Value::make_vector(element_type.clone(), args)
                        .map_err(|e| RuntimeError::ConstructionTypeError(e.to_string()))?;
                    self.stack.push_value(value);
                }
                Instruction::ConstructDict {
                    value_type,
                    arg_count,
                } => {
                    let mut kinds = Vec::with_capacity(arg_count * 2);
                    for _ in 0..*arg_count {
                        kinds.push(BaseKind::String);
                        kinds.push(value_type.base_kind());
                    }
                    let args = self.pop_args(&kinds);
                    let mut entries = std::collections::BTreeMap::new();
                    let mut it = args.into_iter();
                    while let (Some(key), Some(value)) = (it.next(), it.next()) {
                        entries.insert(key.get_string()?.to_string(), value);
                    }
                    let value = Value::make_dict(value_type.clone(), entries)
                        .map_err(|e| RuntimeError::ConstructionTypeError(e.to_string()))?;
                    self.stack.push_value(value);
                }
                Instruction::ConstructFromTypeid {
                    target_type,
                    arg_type,
                    arg_count,
                } => {
                    let kinds = generic_construct_arg_kinds(target_type, arg_type, *arg_count)?;
                    let args = self.pop_args(&kinds);
                    let value = construct_value_from_typeid(target_type, arg_type, args)?;
                    self.stack.push_value(value);
                }
            }
            pc += 1;
        }
        Ok(ExecOutcome::Completed)
    }

    /// Pop `kinds.len()` values pushed in `kinds` order (youngest last).
    fn pop_args(&mut self, kinds: &[BaseKind]) -> Vec<Value> {
        let mut args = Vec::with_capacity(kinds.len());
        for kind in kinds.iter().rev() {
            args.push(self.stack.pop_value(*kind));
        }
        args.reverse();
        args
    }

    fn execute_arith(&mut self, op: ArithOp, kind: BaseKind) -> Result<(), RuntimeError> {
        match kind {
            BaseKind::Int => {
                let rhs = self.stack.pop_value(BaseKind::Int).get_int()?;
                let lhs = self.stack.pop_value(BaseKind::Int).get_int()?;
                // Integer overflow wraps (two's complement).
                let result = match op {
                    ArithOp::Add => lhs.wrapping_add(rhs),
                    ArithOp::Sub => lhs.wrapping_sub(rhs),
                    ArithOp::Mul => lhs.wrapping_mul(rhs),
                    ArithOp::Div => {
                        if rhs == 0 {
                            return Err(RuntimeError::DivideByZero);
                        }
                        lhs.wrapping_div(rhs)
                    }
                    ArithOp::Mod => {
                        if rhs == 0 {
                            return Err(RuntimeError::DivideByZero);
                        }
                        lhs.wrapping_rem(rhs)
                    }
                };
                self.stack.push_value(Value::Int(result));
            }
            BaseKind::Float => {
                let rhs = self.stack.pop_value(BaseKind::Float).get_float()?;
                let lhs = self.stack.pop_value(BaseKind::Float).get_float()?;
                // IEEE-754: division by zero yields an infinity or NaN.
                let result = match op {
                    ArithOp::Add => lhs + rhs,
                    ArithOp::Sub => lhs - rhs,
                    ArithOp::Mul => lhs * rhs,
                    ArithOp::Div => lhs / rhs,
                    ArithOp::Mod => lhs % rhs,
                };
                self.stack.push_value(Value::Float(result));
            }
            BaseKind::String => {
                if op != ArithOp::Add {
                    return Err(RuntimeError::TypeMismatch(format!(
                        "{} is not defined for strings",
                        op.name()
                    )));
                }
                let rhs = self.stack.pop_value(BaseKind::String);
                let lhs = self.stack.pop_value(BaseKind::String);
                let joined = format!("{}{}", lhs.get_string()?, rhs.get_string()?);
                self.stack.push_value(Value::make_string(joined));
            }
            BaseKind::Vector => {
                if op != ArithOp::Add {
                    return Err(RuntimeError::TypeMismatch(format!(
                        "{} is not defined for vectors",
                        op.name()
                    )));
                }
                let rhs = self.stack.pop_value(BaseKind::Vector);
                let lhs = self.stack.pop_value(BaseKind::Vector);
                let value = {
                    let left = lhs.get_vector()?;
                    let right = rhs.get_vector()?;
                    if left.element_type != right.element_type {
                        return Err(RuntimeError::TypeMismatch(format!(
                            "cannot concatenate vector of {} with vector of {}",
                            left.element_type.to_signature(),
                            right.element_type.to_signature()
                        )));
                    }
                    let elements: Vec<Value> = left
                        .elements
                        .iter()
                        .chain(&right.elements)
                        .cloned()
                        .collect();
                    Value::make_vector(left.element_type.clone(), elements)?
                };
                self.stack.push_value(value);
            }
            other => {
                return Err(RuntimeError::TypeMismatch(format!(
                    "arithmetic is not defined for {}",
                    other.name()
                )));
            }
        }
        Ok(())
    }

    fn execute_compare(&mut self, op: CompareOp, kind: BaseKind) -> Result<(), RuntimeError> {
        let rhs = self.stack.pop_value(kind);
        let lhs = self.stack.pop_value(kind);
        let ord = compare_values(&lhs, &rhs)?;
        let result = match op {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Ne => ord != Ordering::Equal,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Le => ord != Ordering::Greater,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Ge => ord != Ordering::Less,
        };
        self.stack.push_value(Value::Bool(result));
        Ok(())
    }

    fn execute_lookup(&mut self, kind: BaseKind) -> Result<(), RuntimeError> {
        match kind {
            BaseKind::Vector => {
                let index = self.stack.pop_value(BaseKind::Int).get_int()?;
                let obj = self.stack.pop_value(BaseKind::Vector);
                let element = {
                    let vector = obj.get_vector()?;
                    if index < 0 || index as usize >= vector.elements.len() {
                        return Err(RuntimeError::IndexOutOfBounds(format!(
                            "vector index {} of {}",
                            index,
                            vector.elements.len()
                        )));
                    }
                    vector.elements[index as usize].clone()
                };
                self.stack.push_value(element);
            }
            BaseKind::String => {
                let index = self.stack.pop_value(BaseKind::Int).get_int()?;
                let obj = self.stack.pop_value(BaseKind::String);
                let s = obj.get_string()?;
                if index < 0 {
                    return Err(RuntimeError::IndexOutOfBounds(format!(
                        "string index {}",
                        index
                    )));
                }
                let c = s.chars().nth(index as usize).ok_or_else(|| {
                    RuntimeError::IndexOutOfBounds(format!(
                        "string index {} of {}",
                        index,
                        s.chars().count()
                    ))
                })?;
                self.stack.push_value(Value::make_string(c.to_string()));
            }
            BaseKind::Dict => {
                let key = self.stack.pop_value(BaseKind::String);
                let obj = self.stack.pop_value(BaseKind::Dict);
                let entry = {
                    let dict = obj.get_dict()?;
                    let key = key.get_string()?;
                    dict.entries
                        .get(key)
                        .cloned()
                        .ok_or_else(|| RuntimeError::KeyNotFound(format!("dict key \"{}\"", key)))?
                };
                self.stack.push_value(entry);
            }
            other => {
                return Err(RuntimeError::TypeMismatch(format!(
                    "subscript is not defined for {}",
                    other.name()
                )));
            }
        }
        Ok(())
    }

    fn execute_call(
        &mut self,
        callee: &Value,
        arg_count: usize,
        arg_kinds: &[BaseKind],
    ) -> Result<(), RuntimeError> {
        let fref = callee.get_function()?;
        let function_id = fref.function_id;
        if function_id >= HOST_FUNCTION_ID_BASE {
            let args = self.pop_args(arg_kinds);
            let return_kind = fref
                .function_type
                .function_signature()
                .map(|sig| sig.return_type.base_kind())
                .unwrap_or(BaseKind::Undefined);
            let result = self.call_host_function(function_id, args)?;
            if return_kind != BaseKind::Void {
                self.stack.push_value(result);
            }
            return Ok(());
        }
        if function_id < 0 {
            return Err(RuntimeError::UndefinedSymbol(
                "call through an unassigned function value".to_string(),
            ));
        }
        let result = self.call_scripted_function(function_id as usize, arg_count)?;
        if let Some(value) = result {
            self.stack.push_value(value);
        }
        Ok(())
    }
}

/// Slot kinds for the generic construction expression's arguments.
fn generic_construct_arg_kinds(
    target_type: &TypeDescriptor,
    arg_type: &TypeDescriptor,
    arg_count: usize,
) -> Result<Vec<BaseKind>, RuntimeError> {
    match target_type {
        TypeDescriptor::Struct(def) => {
            if def.members.len() != arg_count {
                return Err(RuntimeError::ArityMismatch(format!(
                    "struct {} takes {} arguments, got {}",
                    target_type.to_signature(),
                    def.members.len(),
                    arg_count
                )));
            }
            Ok(def
                .members
                .iter()
                .map(|m| m.member_type.base_kind())
                .collect())
        }
        TypeDescriptor::Vector(element_type) => Ok(vec![element_type.base_kind(); arg_count]),
        TypeDescriptor::Dict(value_type) => {
            if arg_count % 2 != 0 {
                return Err(RuntimeError::ArityMismatch(
                    "dict construction takes alternating key, value arguments".to_string(),
                ));
            }
            let mut kinds = Vec::with_capacity(arg_count);
            for i in 0..arg_count {
                kinds.push(if i % 2 == 0 {
                    BaseKind::String
                } else {
                    value_type.base_kind()
                });
            }
            Ok(kinds)
        }
        TypeDescriptor::Bool
        | TypeDescriptor::Int
        | TypeDescriptor::Float
        | TypeDescriptor::String
        | TypeDescriptor::Json
        | TypeDescriptor::Typeid => {
            if arg_count != 1 {
                return Err(RuntimeError::ArityMismatch(format!(
                    "{}() takes 1 argument, got {}",
                    target_type.base_kind().name(),
                    arg_count
                )));
            }
            Ok(vec![arg_type.base_kind()])
        }
        other => Err(RuntimeError::ConstructionTypeError(format!(
            "cannot construct a value of type {}",
            other.to_signature()
        ))),
    }
}
