use std::path::PathBuf;

use miette::{Diagnostic, SourceOffset, SourceSpan};

use crate::{ast::error::ParseError, eval::error::EvalError, lexer::error::LexerError, range::Range};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InnerError {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error("Illegal return statement")]
    IllegalReturn(Option<Range>),
}

impl InnerError {
    pub fn range(&self) -> Option<Range> {
        match self {
            InnerError::Lexer(err) => Some(*err.range()),
            InnerError::Parse(err) => Some(err.token().range),
            InnerError::Eval(err) => err.range(),
            InnerError::IllegalReturn(range) => *range,
        }
    }
}

/// Errors reported while normalizing an input into a callable.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The callable declares fewer parameters than requested.
    #[error(
        "Not enough arguments: expected a function taking {expected} parameter(s), got one taking {actual}"
    )]
    Arity { expected: usize, actual: usize },
    #[error("Failed to parse code")]
    Parse {
        #[source]
        cause: InnerError,
        source_code: String,
        location: SourceSpan,
    },
    #[error("Failed to compile code: {cause}")]
    Compile {
        #[source]
        cause: InnerError,
        source_code: String,
        location: SourceSpan,
    },
    #[error("No valid format found for the given input")]
    NoValidFormat,
    #[error("Failed to read \"{}\"", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An error raised while calling a normalized function.
    #[error(transparent)]
    Runtime(#[from] EvalError),
}

impl Error {
    pub fn parse(source_code: impl Into<String>, cause: impl Into<InnerError>) -> Self {
        let source_code = source_code.into();
        let cause = cause.into();
        let location = location(&source_code, cause.range());

        Error::Parse {
            cause,
            source_code,
            location,
        }
    }

    pub fn compile(source_code: impl Into<String>, cause: impl Into<InnerError>) -> Self {
        let source_code = source_code.into();
        let cause = cause.into();
        let location = location(&source_code, cause.range());

        Error::Compile {
            cause,
            source_code,
            location,
        }
    }

    /// The lexer, parser or evaluator error behind a `Parse` or `Compile` error.
    pub fn cause(&self) -> Option<&InnerError> {
        match self {
            Error::Parse { cause, .. } | Error::Compile { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// Byte span of `range` in `source_code`, at least one byte wide. Without a
/// range the span points at the start of the source.
fn location(source_code: &str, range: Option<Range>) -> SourceSpan {
    match range {
        Some(range) => {
            let start = std::cmp::min(range.start.offset, source_code.len());
            SourceSpan::new(SourceOffset::from(start), std::cmp::max(range.len(), 1))
        }
        None => SourceSpan::new(SourceOffset::from(0), 1),
    }
}

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let code = match self {
            Error::Arity { .. } => "Error::Arity".to_string(),
            Error::NoValidFormat => "Error::NoValidFormat".to_string(),
            Error::Read { .. } => "Error::Read".to_string(),
            Error::Runtime(_) => "Error::Runtime".to_string(),
            Error::Parse { cause, .. } | Error::Compile { cause, .. } => {
                let kind = if matches!(self, Error::Parse { .. }) {
                    "Parse"
                } else {
                    "Compile"
                };
                let inner = match cause {
                    InnerError::Lexer(LexerError::UnexpectedCharacter(_, _)) => {
                        "LexerError::UnexpectedCharacter"
                    }
                    InnerError::Lexer(LexerError::UnterminatedString(_)) => {
                        "LexerError::UnterminatedString"
                    }
                    InnerError::Lexer(LexerError::UnterminatedComment(_)) => {
                        "LexerError::UnterminatedComment"
                    }
                    InnerError::Parse(ParseError::UnexpectedToken(_)) => "ParseError::UnexpectedToken",
                    InnerError::Parse(ParseError::UnexpectedEOFDetected(_)) => {
                        "ParseError::UnexpectedEOFDetected"
                    }
                    InnerError::Parse(ParseError::ExpectedClosingParen(_)) => {
                        "ParseError::ExpectedClosingParen"
                    }
                    InnerError::Parse(ParseError::ExpectedClosingBrace(_)) => {
                        "ParseError::ExpectedClosingBrace"
                    }
                    InnerError::Parse(ParseError::ExpectedClosingBracket(_)) => {
                        "ParseError::ExpectedClosingBracket"
                    }
                    InnerError::Parse(ParseError::ExpectedIdent(_)) => "ParseError::ExpectedIdent",
                    InnerError::Parse(ParseError::InvalidAssignmentTarget(_)) => {
                        "ParseError::InvalidAssignmentTarget"
                    }
                    InnerError::Parse(ParseError::IllegalReturn(_)) => "ParseError::IllegalReturn",
                    InnerError::Parse(ParseError::MissingInitializer(_)) => {
                        "ParseError::MissingInitializer"
                    }
                    InnerError::Parse(ParseError::NestingTooDeep(_)) => "ParseError::NestingTooDeep",
                    InnerError::Eval(EvalError::NotDefined(_, _)) => "EvalError::NotDefined",
                    InnerError::Eval(EvalError::NotAFunction(_, _)) => "EvalError::NotAFunction",
                    InnerError::Eval(EvalError::TypeError(_, _)) => "EvalError::TypeError",
                    InnerError::Eval(EvalError::RangeError(_, _)) => "EvalError::RangeError",
                    InnerError::Eval(EvalError::AssignToConstant(_, _)) => {
                        "EvalError::AssignToConstant"
                    }
                    InnerError::Eval(EvalError::RecursionError(_)) => "EvalError::RecursionError",
                    InnerError::IllegalReturn(_) => "IllegalReturn",
                };
                format!("Error::{}::{}", kind, inner)
            }
        };

        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let msg = match self {
            Error::Arity { expected, .. } => Some(format!(
                "Declare at least {expected} parameter(s) on the function."
            )),
            Error::NoValidFormat => Some(
                "Pass a function, a module or file path, or a source string.".to_string(),
            ),
            Error::Parse { cause, .. } => match cause {
                InnerError::Lexer(_) => {
                    Some("Check for unexpected characters or unterminated literals.".to_string())
                }
                InnerError::Parse(ParseError::UnexpectedEOFDetected(_)) => Some(
                    "Input ended unexpectedly. Check for missing closing brackets or incomplete expressions."
                        .to_string(),
                ),
                _ => Some("Check for syntax errors or misplaced tokens.".to_string()),
            },
            Error::Compile { cause, .. } => match cause {
                InnerError::IllegalReturn(_) => Some(
                    "A script may only `return` a function. Return from inside a function body instead."
                        .to_string(),
                ),
                InnerError::Eval(EvalError::NotDefined(_, name)) => {
                    Some(format!("'{name}' is not defined. Did you forget to declare it?"))
                }
                _ => None,
            },
            Error::Read { .. } | Error::Runtime(_) => None,
        };

        msg.map(|m| Box::new(m) as Box<dyn std::fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        match self {
            Error::Parse {
                cause, location, ..
            }
            | Error::Compile {
                cause, location, ..
            } => Some(Box::new(std::iter::once(
                miette::LabeledSpan::new_with_span(Some(cause.to_string()), *location),
            ))),
            _ => None,
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Error::Parse { source_code, .. } | Error::Compile { source_code, .. } => {
                Some(source_code)
            }
            _ => None,
        }
    }
}
