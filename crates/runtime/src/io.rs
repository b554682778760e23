//! Console Host Functions
//!
//! `print` and `assert`. Everything printed goes both to standard output and
//! to the interpreter's print log, so embedders and tests can observe output
//! in program order without capturing stdout.

use crate::interpreter::Interpreter;
use floyd_core::error::RuntimeError;
use floyd_core::value::{Value, to_compact_string};

/// print(any) -> void
///
/// Appends the compact form of the argument to the print log and writes it
/// to standard output with a trailing newline. Strings print unquoted.
pub fn host_print(vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::ArityMismatch(
            "print() requires 1 argument".to_string(),
        ));
    }
    let line = to_compact_string(&args[0]);
    println!("{}", line);
    vm.record_print(line);
    Ok(Value::Void)
}

/// assert(bool) -> void
///
/// On a false argument, logs "Assertion failed." and fails with
/// `AssertionFailed`, unwinding every active frame.
pub fn host_assert(vm: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.len() != 1 {
        return Err(RuntimeError::ArityMismatch(
            "assert() requires 1 argument".to_string(),
        ));
    }
    let ok = args[0].get_bool().map_err(|_| {
        RuntimeError::TypeMismatch("first argument to assert() must be of type bool".to_string())
    })?;
    if !ok {
        vm.record_print("Assertion failed.".to_string());
        return Err(RuntimeError::AssertionFailed);
    }
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
    fn test_print_logs_compact_form() {
        let mut vm = test_vm();
        host_print(&mut vm, &[Value::Int(3)]).unwrap();
        host_print(&mut vm, &[Value::make_string("hello")]).unwrap();
        assert_eq!(vm.print_output(), &["3".to_string(), "hello".to_string()]);
    }

    #[test]
    fn test_print_arity() {
        let mut vm = test_vm();
        let err = host_print(&mut vm, &[]).unwrap_err();
        assert_eq!(err.kind(), "ArityMismatch");
    }

    #[test]
    fn test_assert_true_is_silent() {
        let mut vm = test_vm();
        host_assert(&mut vm, &[Value::Bool(true)]).unwrap();
        assert!(vm.print_output().is_empty());
    }

    #[test]
    fn test_assert_false_logs_and_fails() {
        let mut vm = test_vm();
        let err = host_assert(&mut vm, &[Value::Bool(false)]).unwrap_err();
        assert_eq!(err.kind(), "AssertionFailed");
        assert_eq!(vm.print_output(), &["Assertion failed.".to_string()]);
    }

    #[test]
    fn test_assert_requires_bool() {
        let mut vm = test_vm();
        let err = host_assert(&mut vm, &[Value::Int(1)]).unwrap_err();
        assert_eq!(err.kind(), "TypeMismatch");
    }
}
