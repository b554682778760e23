//! OS Host Functions

use crate::interpreter::Interpreter;
use floyd_core::error::RuntimeError;
use floyd_core::value::Value;

/// get_env_path() -> string
///
/// The HOME environment variable. This is the only environment variable the
/// runtime consults.
pub fn host_get_env_path(_vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if !args.is_empty() {
        return Err(RuntimeError::ArityMismatch(
            "get_env_path() requires 0 arguments".to_string(),
        ));
    }
    let home = std::env::var("HOME")
        .map_err(|_| RuntimeError::IoError("HOME is not set".to_string()))?;
    Ok(Value::make_string(home))
}
