//! Runtime Error Kinds
//!
//! One enum covers every failure the value layer, JSON bridge, and
//! interpreter can produce. Errors carry a human-readable message where one
//! helps diagnosis; the variant itself is the machine-readable kind.
//!
//! Errors propagate with `?` through all active frames. An error that escapes
//! a top-level entry point leaves the interpreter poisoned: further calls
//! fail with `InterpreterPoisoned`.

/// Every error kind the runtime can surface to an embedder.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Accessor on the wrong value tag, or mismatched operand types
    TypeMismatch(String),
    /// Call or construction with the wrong number of arguments
    ArityMismatch(String),
    /// Integer division or modulo by zero
    DivideByZero,
    /// Vector or string subscript outside `[0, len)`
    IndexOutOfBounds(String),
    /// Dict subscript on a missing key, or unknown struct member
    KeyNotFound(String),
    /// Symbol resolution failed at program-load time
    UndefinedSymbol(String),
    /// JSON does not match the shape the target type requires
    JsonShapeMismatch(String),
    /// Generic construction expression with incompatible arguments
    ConstructionTypeError(String),
    /// A scripted `assert` evaluated to false
    AssertionFailed,
    /// File operation failed
    IoError(String),
    /// A previous error escaped top-level; the interpreter is unusable
    InterpreterPoisoned,
}

impl RuntimeError {
    /// Stable kind name, for reports and tests.
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::TypeMismatch(_) => "TypeMismatch",
            RuntimeError::ArityMismatch(_) => "ArityMismatch",
            RuntimeError::DivideByZero => "DivideByZero",
            RuntimeError::IndexOutOfBounds(_) => "IndexOutOfBounds",
            RuntimeError::KeyNotFound(_) => "KeyNotFound",
            RuntimeError::UndefinedSymbol(_) => "UndefinedSymbol",
            RuntimeError::JsonShapeMismatch(_) => "JsonShapeMismatch",
            RuntimeError::ConstructionTypeError(_) => "ConstructionTypeError",
            RuntimeError::AssertionFailed => "AssertionFailed",
            RuntimeError::IoError(_) => "IoError",
            RuntimeError::InterpreterPoisoned => "InterpreterPoisoned",
        }
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::TypeMismatch(msg) => write!(f, "type mismatch: {}", msg),
            RuntimeError::ArityMismatch(msg) => write!(f, "arity mismatch: {}", msg),
            RuntimeError::DivideByZero => write!(f, "division by zero"),
            RuntimeError::IndexOutOfBounds(msg) => write!(f, "index out of bounds: {}", msg),
            RuntimeError::KeyNotFound(msg) => write!(f, "key not found: {}", msg),
            RuntimeError::UndefinedSymbol(msg) => write!(f, "undefined symbol: {}", msg),
            RuntimeError::JsonShapeMismatch(msg) => write!(f, "json shape mismatch: {}", msg),
            RuntimeError::ConstructionTypeError(msg) => write!(f, "construction error: {}", msg),
            RuntimeError::AssertionFailed => write!(f, "assertion failed"),
            RuntimeError::IoError(msg) => write!(f, "io error: {}", msg),
            RuntimeError::InterpreterPoisoned => {
                write!(f, "interpreter poisoned by a previous error")
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_are_stable() {
        assert_eq!(RuntimeError::DivideByZero.kind(), "DivideByZero");
        assert_eq!(
            RuntimeError::TypeMismatch("x".to_string()).kind(),
            "TypeMismatch"
        );
        assert_eq!(RuntimeError::InterpreterPoisoned.kind(), "InterpreterPoisoned");
    }

    #[test]
    fn test_display_includes_message() {
        let e = RuntimeError::KeyNotFound("dict key \"z\"".to_string());
        assert_eq!(e.to_string(), "key not found: dict key \"z\"");
    }
}
