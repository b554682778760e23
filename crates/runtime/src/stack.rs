//! Evaluation Stack
//!
//! A contiguous stack of *untagged* slots. A slot is a union holding either a
//! primitive bit pattern (bool / i32 / f32), an owning `Rc` pointer to an
//! extended payload, or nothing (undefined/void slots and reserved markers).
//!
//! No tag is stored next to the payload: the kind of every slot an
//! instruction touches comes from the instruction itself, which the code
//! generator derived from symbol metadata. That removes per-access tag
//! checks but places a hard correctness burden upstream — an instruction
//! addressing a slot declared `int` must never find a string payload there.
//!
//! # Ownership
//!
//! Pushing an extended value moves its `Rc` into the slot (the stack holds
//! one reference while the slot lives). Loading clones the `Rc` (+1);
//! popping moves it back out (the eventual drop is the −1). Replacing a slot
//! releases the old payload first.
//!
//! # The shadow kind vec
//!
//! Alongside the slots the stack keeps one `BaseKind` per slot. It is never
//! consulted to execute an instruction — only to `debug_assert` that
//! metadata and reality agree, and to release slots whose kinds no
//! instruction will ever name again: temporaries abandoned by an error
//! unwind, and whatever remains when the interpreter itself is dropped.

use floyd_core::types::{BaseKind, TypeDescriptor};
use floyd_core::value::{DictInstance, FunctionRef, StructInstance, Value, VectorInstance};
use serde_json::Value as JsonValue;
use std::mem::ManuallyDrop;
use std::rc::Rc;

/// One untagged stack slot. Exactly one field is live; which one is known
/// only from instruction/symbol metadata (and the shadow kind vec).
pub union SlotPayload {
    empty: (),
    boolean: bool,
    int: i32,
    float: f32,
    string: ManuallyDrop<Rc<String>>,
    json: ManuallyDrop<Rc<JsonValue>>,
    typeid: ManuallyDrop<Rc<TypeDescriptor>>,
    struct_instance: ManuallyDrop<Rc<StructInstance>>,
    vector: ManuallyDrop<Rc<VectorInstance>>,
    dict: ManuallyDrop<Rc<DictInstance>>,
    function: ManuallyDrop<Rc<FunctionRef>>,
}

/// Split a value into its slot payload and kind. Extended payloads move
/// their `Rc` into the slot without touching the reference count.
fn value_to_slot(value: Value) -> (SlotPayload, BaseKind) {
    let kind = value.base_kind();
    let slot = match value {
        Value::Undefined | Value::Void => SlotPayload { empty: () },
        Value::Bool(b) => SlotPayload { boolean: b },
        Value::Int(i) => SlotPayload { int: i },
        Value::Float(f) => SlotPayload { float: f },
        Value::String(p) => SlotPayload {
            string: ManuallyDrop::new(p),
        },
        Value::Json(p) => SlotPayload {
            json: ManuallyDrop::new(p),
        },
        Value::Typeid(p) => SlotPayload {
            typeid: ManuallyDrop::new(p),
        },
        Value::Struct(p) => SlotPayload {
            struct_instance: ManuallyDrop::new(p),
        },
        Value::Vector(p) => SlotPayload {
            vector: ManuallyDrop::new(p),
        },
        Value::Dict(p) => SlotPayload {
            dict: ManuallyDrop::new(p),
        },
        Value::Function(p) => SlotPayload {
            function: ManuallyDrop::new(p),
        },
    };
    (slot, kind)
}

/// Rebuild a full value from a borrowed slot, cloning the payload `Rc`.
///
/// # Safety
/// `kind` must name the slot's live field.
unsafe fn read_slot(slot: &SlotPayload, kind: BaseKind) -> Value {
    unsafe {
        match kind {
            BaseKind::Undefined => Value::Undefined,
            BaseKind::Void => Value::Void,
            BaseKind::Bool => Value::Bool(slot.boolean),
            BaseKind::Int => Value::Int(slot.int),
            BaseKind::Float => Value::Float(slot.float),
            BaseKind::String => Value::String(Rc::clone(&slot.string)),
            BaseKind::Json => Value::Json(Rc::clone(&slot.json)),
            BaseKind::Typeid => Value::Typeid(Rc::clone(&slot.typeid)),
            BaseKind::Struct => Value::Struct(Rc::clone(&slot.struct_instance)),
            BaseKind::Vector => Value::Vector(Rc::clone(&slot.vector)),
            BaseKind::Dict => Value::Dict(Rc::clone(&slot.dict)),
            BaseKind::Function => Value::Function(Rc::clone(&slot.function)),
            BaseKind::Dynamic => unreachable!("instructions carry concrete kinds"),
        }
    }
}

/// Rebuild a full value from an owned slot, moving the payload `Rc` out.
///
/// # Safety
/// `kind` must name the slot's live field, and the slot must not be touched
/// again afterwards.
unsafe fn take_slot(slot: SlotPayload, kind: BaseKind) -> Value {
    unsafe {
        match kind {
            BaseKind::Undefined => Value::Undefined,
            BaseKind::Void => Value::Void,
            BaseKind::Bool => Value::Bool(slot.boolean),
            BaseKind::Int => Value::Int(slot.int),
            BaseKind::Float => Value::Float(slot.float),
            BaseKind::String => Value::String(ManuallyDrop::into_inner(slot.string)),
            BaseKind::Json => Value::Json(ManuallyDrop::into_inner(slot.json)),
            BaseKind::Typeid => Value::Typeid(ManuallyDrop::into_inner(slot.typeid)),
            BaseKind::Struct => Value::Struct(ManuallyDrop::into_inner(slot.struct_instance)),
            BaseKind::Vector => Value::Vector(ManuallyDrop::into_inner(slot.vector)),
            BaseKind::Dict => Value::Dict(ManuallyDrop::into_inner(slot.dict)),
            BaseKind::Function => Value::Function(ManuallyDrop::into_inner(slot.function)),
            BaseKind::Dynamic => unreachable!("instructions carry concrete kinds"),
        }
    }
}

/// Drop an owned slot's payload, decrementing the reference count of
/// extended payloads. Primitive and empty slots need no work.
///
/// # Safety
/// `kind` must name the slot's live field, and the slot must not be touched
/// again afterwards.
unsafe fn release_slot(slot: SlotPayload, kind: BaseKind) {
    if kind.is_extended() {
        drop(unsafe { take_slot(slot, kind) });
    }
}

/// The interpreter's evaluation stack.
pub struct InterpreterStack {
    slots: Vec<SlotPayload>,
    kinds: Vec<BaseKind>,
}

impl InterpreterStack {
    pub fn new() -> InterpreterStack {
        InterpreterStack {
            slots: Vec::with_capacity(1024),
            kinds: Vec::with_capacity(1024),
        }
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Push a value, transferring ownership of its payload into the slot.
    pub fn push_value(&mut self, value: Value) {
        let (slot, kind) = value_to_slot(value);
        self.slots.push(slot);
        self.kinds.push(kind);
    }

    /// Push a raw int slot (frame markers).
    pub fn push_int(&mut self, value: i32) {
        self.slots.push(SlotPayload { int: value });
        self.kinds.push(BaseKind::Int);
    }

    /// Materialize the value at `pos`. Extended payloads gain a reference.
    pub fn load_value(&self, pos: usize, kind: BaseKind) -> Value {
        debug_assert_eq!(self.kinds[pos], kind, "slot {} kind mismatch", pos);
        unsafe { read_slot(&self.slots[pos], kind) }
    }

    pub fn load_int(&self, pos: usize) -> i32 {
        debug_assert_eq!(self.kinds[pos], BaseKind::Int);
        unsafe { self.slots[pos].int }
    }

    /// Overwrite the slot at `pos`, releasing whatever payload it held.
    /// The new value's kind must equal the slot's declared kind.
    pub fn replace_value(&mut self, pos: usize, value: Value) {
        let (slot, kind) = value_to_slot(value);
        debug_assert_eq!(self.kinds[pos], kind, "slot {} kind change", pos);
        let old = std::mem::replace(&mut self.slots[pos], slot);
        unsafe { release_slot(old, self.kinds[pos]) };
        self.kinds[pos] = kind;
    }

    /// Pop the top slot as a value of `kind`, transferring payload ownership
    /// to the caller.
    pub fn pop_value(&mut self, kind: BaseKind) -> Value {
        debug_assert_eq!(self.kinds.last().copied(), Some(kind), "top kind mismatch");
        self.kinds.pop();
        let slot = self.slots.pop().expect("pop on empty stack");
        unsafe { take_slot(slot, kind) }
    }

    pub fn pop_int(&mut self) -> i32 {
        match self.pop_value(BaseKind::Int) {
            Value::Int(i) => i,
            _ => unreachable!("pop_value returned the requested kind"),
        }
    }

    /// Drop the top slot, releasing its payload. The kind comes from the
    /// shadow vec; used by frame unwinding and teardown.
    pub fn discard_top(&mut self) {
        let kind = self.kinds.pop().expect("discard on empty stack");
        let slot = self.slots.pop().expect("slots and kinds stay in step");
        unsafe { release_slot(slot, kind) };
    }

    /// Release every slot above `len`. Error unwinds use this to abandon
    /// expression temporaries whose kinds no instruction will name again.
    pub fn truncate_to(&mut self, len: usize) {
        while self.slots.len() > len {
            self.discard_top();
        }
    }

    /// Kind of the slot at `pos`, from the shadow vec. Diagnostic use only.
    pub fn kind_at(&self, pos: usize) -> BaseKind {
        self.kinds[pos]
    }
}

impl Default for InterpreterStack {
    fn default() -> Self {
        InterpreterStack::new()
    }
}

impl Drop for InterpreterStack {
    fn drop(&mut self) {
        self.truncate_to(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floyd_core::value::Value;

    #[test]
    fn test_primitive_roundtrip() {
        let mut stack = InterpreterStack::new();
        stack.push_value(Value::Bool(true));
        stack.push_value(Value::Int(-7));
        stack.push_value(Value::Float(2.5));
        assert_eq!(stack.size(), 3);
        assert_eq!(stack.pop_value(BaseKind::Float), Value::Float(2.5));
        assert_eq!(stack.pop_value(BaseKind::Int), Value::Int(-7));
        assert_eq!(stack.pop_value(BaseKind::Bool), Value::Bool(true));
        assert_eq!(stack.size(), 0);
    }

    #[test]
    fn test_extended_roundtrip_preserves_refcount() {
        let v = Value::make_string("payload");
        assert_eq!(v.payload_refcount(), Some(1));

        let mut stack = InterpreterStack::new();
        stack.push_value(v.clone());
        assert_eq!(v.payload_refcount(), Some(2));

        let loaded = stack.load_value(0, BaseKind::String);
        assert_eq!(v.payload_refcount(), Some(3));
        drop(loaded);
        assert_eq!(v.payload_refcount(), Some(2));

        let popped = stack.pop_value(BaseKind::String);
        assert_eq!(v.payload_refcount(), Some(2));
        drop(popped);
        assert_eq!(v.payload_refcount(), Some(1));
    }

    #[test]
    fn test_replace_releases_old_payload() {
        let old = Value::make_string("old");
        let new = Value::make_string("new");
        let mut stack = InterpreterStack::new();
        stack.push_value(old.clone());
        assert_eq!(old.payload_refcount(), Some(2));

        stack.replace_value(0, new.clone());
        assert_eq!(old.payload_refcount(), Some(1));
        assert_eq!(new.payload_refcount(), Some(2));
        assert_eq!(stack.load_value(0, BaseKind::String), new);
    }

    #[test]
    fn test_truncate_releases_extended_slots() {
        let a = Value::make_string("a");
        let b = Value::make_json(serde_json::json!([1, 2]));
        let mut stack = InterpreterStack::new();
        stack.push_value(a.clone());
        stack.push_value(b.clone());
        stack.push_value(Value::Int(1));
        stack.truncate_to(0);
        assert_eq!(a.payload_refcount(), Some(1));
        assert_eq!(b.payload_refcount(), Some(1));
        assert_eq!(stack.size(), 0);
    }

    #[test]
    fn test_drop_releases_everything() {
        let a = Value::make_string("held");
        {
            let mut stack = InterpreterStack::new();
            stack.push_value(a.clone());
            assert_eq!(a.payload_refcount(), Some(2));
        }
        assert_eq!(a.payload_refcount(), Some(1));
    }

    #[test]
    fn test_marker_slots() {
        let mut stack = InterpreterStack::new();
        stack.push_int(41);
        assert_eq!(stack.load_int(0), 41);
        assert_eq!(stack.pop_int(), 41);
    }

    #[test]
    fn test_empty_slots() {
        let mut stack = InterpreterStack::new();
        stack.push_value(Value::Undefined);
        assert_eq!(stack.load_value(0, BaseKind::Undefined), Value::Undefined);
        stack.discard_top();
        assert_eq!(stack.size(), 0);
    }
}
