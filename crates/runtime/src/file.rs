//! File Host Functions
//!
//! Whole-file text reads and writes. Failures surface as `IoError` with the
//! offending path in the message; side effects are observed strictly in
//! program order.

use crate::interpreter::Interpreter;
use floyd_core::error::RuntimeError;
use floyd_core::value::Value;
use std::fs;

/// read_text_file(string) -> string
pub fn host_read_text_file(_vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::ArityMismatch(
            "read_text_file() requires 1 argument".to_string(),
        ));
    }
    let path = args[0].get_string()?;
    let contents = fs::read_to_string(path)
        .map_err(|e| RuntimeError::IoError(format!("cannot read \"{}\": {}", path, e)))?;
    Ok(Value::make_string(contents))
}

/// write_text_file(string, string) -> void
pub fn host_write_text_file(_vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 2 {
        return Err(RuntimeError::ArityMismatch(
            "write_text_file() requires 2 arguments".to_string(),
        ));
    }
    let path = args[0].get_string()?;
    let contents = args[1].get_string()?;
    fs::write(path, contents)
        .map_err(|e| RuntimeError::IoError(format!("cannot write \"{}\": {}", path, e)))?;
    Ok(Value::Void)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Program;
    use std::rc::Rc;

    fn test_vm() -> Interpreter {
        Interpreter::new(Rc::new(Program::default())).unwrap()
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        let path_str = path.to_string_lossy().to_string();

        let mut vm = test_vm();
        host_write_text_file(
            &mut vm,
            &[
                Value::make_string(path_str.clone()),
                Value::make_string("line one\nline two\n"),
            ],
        )
        .unwrap();
        let back = host_read_text_file(&mut vm, &[Value::make_string(path_str)]).unwrap();
        assert_eq!(back, Value::make_string("line one\nline two\n"));
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let mut vm = test_vm();
        let err = host_read_text_file(
            &mut vm,
            &[Value::make_string("/no/such/floyd/file.txt")],
        )
        .unwrap_err();
        assert_eq!(err.kind(), "IoError");
    }

    #[test]
    fn test_path_must_be_string() {
        let mut vm = test_vm();
        let err = host_read_text_file(&mut vm, &[Value::Int(1)]).unwrap_err();
        assert_eq!(err.kind(), "TypeMismatch");
    }
}
