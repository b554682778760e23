//! Time Host Functions

use crate::interpreter::Interpreter;
use floyd_core::error::RuntimeError;
use floyd_core::value::Value;

/// get_time_of_day() -> int
///
/// Milliseconds since the interpreter was created, from a monotonic clock.
/// Sub-millisecond precision is truncated toward zero. Saturates at
/// `i32::MAX` (~24 days of interpreter lifetime).
pub fn host_get_time_of_day(vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if !args.is_empty() {
        return Err(RuntimeError::ArityMismatch(
            "get_time_of_day() requires 0 arguments".to_string(),
        ));
    }
    let ms = vm
        .start_time()
        .elapsed()
        .as_millis()
        .try_into()
        .unwrap_or(i32::MAX);
    Ok(Value::Int(ms))
}
