use thiserror::Error;

use crate::range::Range;

type ErrorRange = Option<Range>;
type Name = String;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum EvalError {
    #[error("{1} is not defined")]
    NotDefined(ErrorRange, Name),
    #[error("{1} is not a function")]
    NotAFunction(ErrorRange, Name),
    #[error("{1}")]
    TypeError(ErrorRange, String),
    #[error("{1}")]
    RangeError(ErrorRange, String),
    #[error("Assignment to constant variable \"{1}\"")]
    AssignToConstant(ErrorRange, Name),
    #[error("Maximum call stack size exceeded ({0})")]
    RecursionError(u32),
}

impl EvalError {
    #[cold]
    pub fn range(&self) -> Option<Range> {
        match self {
            EvalError::NotDefined(range, _)
            | EvalError::NotAFunction(range, _)
            | EvalError::TypeError(range, _)
            | EvalError::RangeError(range, _)
            | EvalError::AssignToConstant(range, _) => *range,
            EvalError::RecursionError(_) => None,
        }
    }

    /// Attaches `range` to an error raised without a location, such as one
    /// coming out of a builtin.
    pub fn or_range(self, range: Option<Range>) -> Self {
        match self {
            EvalError::NotDefined(None, name) => EvalError::NotDefined(range, name),
            EvalError::NotAFunction(None, name) => EvalError::NotAFunction(range, name),
            EvalError::TypeError(None, message) => EvalError::TypeError(range, message),
            EvalError::RangeError(None, message) => EvalError::RangeError(range, message),
            EvalError::AssignToConstant(None, name) => EvalError::AssignToConstant(range, name),
            err => err,
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        EvalError::TypeError(None, message.into())
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        EvalError::RangeError(None, message.into())
    }
}
