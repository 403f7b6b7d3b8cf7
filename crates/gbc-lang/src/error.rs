/// Error codes prefixed by phase: P = parser, R = runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Parser
    P001, // invalid numeric literal
    P002, // continuation with nothing to continue
    P003, // continuation against non-expressive value
    P004, // infix operator without a left operand
    P005, // block end with no block open
    P006, // unclosed blocks at end of input
    P007, // operand pushed onto a node that takes none
    P008, // nesting too deep

    // Runtime
    R001, // wrong tuple arity, or tuple expected
    R002, // call to an undefined function
    R003, // unsupported inversion target
    R004, // negative loop count
    R005, // missing operand
    R006, // tuple used where a number is required
    R007, // call depth exceeded
    R008, // malformed bytecode
}

impl ErrorCode {
    /// Lexical/structural failures detected while building the tree.
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            Self::P001 | Self::P002 | Self::P003 | Self::P004 | Self::P005 | Self::P006 | Self::P007 | Self::P008
        )
    }

    /// Semantic failures that only surface during evaluation.
    pub fn is_runtime(&self) -> bool { !self.is_parse() }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P001 => "P001",
            Self::P002 => "P002",
            Self::P003 => "P003",
            Self::P004 => "P004",
            Self::P005 => "P005",
            Self::P006 => "P006",
            Self::P007 => "P007",
            Self::P008 => "P008",
            Self::R001 => "R001",
            Self::R002 => "R002",
            Self::R003 => "R003",
            Self::R004 => "R004",
            Self::R005 => "R005",
            Self::R006 => "R006",
            Self::R007 => "R007",
            Self::R008 => "R008",
        }
    }
}

// ─── Parse errors ─────────────────────────────────────────────────────────────

/// A structural failure raised while scanning. `position` is the character
/// offset (0-based) of the glyph being processed when the failure occurred.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[{}] at {}: {}", .code.as_str(), .position, .message)]
pub struct Error {
    pub code: ErrorCode,
    pub position: usize,
    pub message: String,
}

impl Error {
    pub fn new(code: ErrorCode, position: usize, message: impl Into<String>) -> Self {
        Self { code, position, message: message.into() }
    }
}

// ─── Runtime errors ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[runtime {}] {}", .code.as_str(), .message)]
pub struct RuntimeError {
    pub code: ErrorCode,
    pub message: String,
}

impl RuntimeError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub(crate) fn arity(what: &str, expected: &[usize], got: usize) -> Self {
        let expected = expected.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(" or ");
        Self::new(ErrorCode::R001, format!("`{what}` expects a tuple of {expected} items, got {got}"))
    }

    pub(crate) fn tuple_expected(what: &str) -> Self {
        Self::new(ErrorCode::R001, format!("`{what}` expects a tuple operand"))
    }

    pub(crate) fn undefined_function(key: i64) -> Self {
        Self::new(ErrorCode::R002, format!("function {key} not yet defined"))
    }

    pub(crate) fn unsupported_inversion(target: &str) -> Self {
        Self::new(ErrorCode::R003, format!("unsupported inversion operation on `{target}`"))
    }

    pub(crate) fn negative_loop(count: f64) -> Self {
        Self::new(ErrorCode::R004, format!("cannot loop {count} times"))
    }

    pub(crate) fn missing_operand(what: &str) -> Self {
        Self::new(ErrorCode::R005, format!("`{what}` is missing its operand"))
    }

    pub(crate) fn not_a_number(len: usize) -> Self {
        Self::new(ErrorCode::R006, format!("expected a number, got a tuple of {len} items"))
    }

    pub(crate) fn call_depth(limit: usize) -> Self {
        Self::new(ErrorCode::R007, format!("call depth exceeded ({limit} nested calls)"))
    }

    pub(crate) fn malformed(what: &str, ip: usize) -> Self {
        Self::new(ErrorCode::R008, format!("malformed bytecode at {ip}: {what}"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────

/// Failure of a combined entry point (`interpret`, `compile` + `invoke`).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GbcError {
    #[error(transparent)]
    Parse(#[from] Error),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl GbcError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Parse(e) => e.code,
            Self::Runtime(e) => e.code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_code_and_position() {
        let e = Error::new(ErrorCode::P004, 7, "infix operator in invalid location");
        assert_eq!(e.to_string(), "[P004] at 7: infix operator in invalid location");
    }

    #[test]
    fn codes_know_their_phase() {
        assert!(ErrorCode::P006.is_parse());
        assert!(ErrorCode::R003.is_runtime());
        let e: GbcError = RuntimeError::negative_loop(-1.0).into();
        assert_eq!(e.code(), ErrorCode::R004);
        assert!(e.to_string().starts_with("[runtime R004]"));
    }
}
