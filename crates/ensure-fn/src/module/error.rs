use std::borrow::Cow;

use thiserror::Error;

use crate::ast::error::ParseError;
use crate::eval::error::EvalError;
use crate::lexer::error::LexerError;

#[derive(Debug, PartialEq, Error)]
pub enum ModuleError {
    #[error("Module `{0}` not found")]
    NotFound(Cow<'static, str>),
    #[error("IO error: {0}")]
    IOError(Cow<'static, str>),
    #[error(transparent)]
    LexerError(#[from] LexerError),
    #[error(transparent)]
    ParseError(#[from] ParseError),
    #[error(transparent)]
    EvalError(#[from] EvalError),
}
