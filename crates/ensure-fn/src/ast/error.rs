use thiserror::Error;

use crate::Token;

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token `{}`", if .0.is_eof() { "EOF".to_string() } else { .0.to_string() })]
    UnexpectedToken(Token),
    #[error("Unexpected EOF detected")]
    UnexpectedEOFDetected(Token),
    #[error("Expected a closing parenthesis `)` but got `{}`", if .0.is_eof() { "EOF".to_string() } else { .0.to_string() })]
    ExpectedClosingParen(Token),
    #[error("Expected a closing brace `}}` but got `{}`", if .0.is_eof() { "EOF".to_string() } else { .0.to_string() })]
    ExpectedClosingBrace(Token),
    #[error("Expected a closing bracket `]` but got `{}`", if .0.is_eof() { "EOF".to_string() } else { .0.to_string() })]
    ExpectedClosingBracket(Token),
    #[error("Expected an identifier but got `{}`", if .0.is_eof() { "EOF".to_string() } else { .0.to_string() })]
    ExpectedIdent(Token),
    #[error("Invalid left-hand side in assignment")]
    InvalidAssignmentTarget(Token),
    #[error("Illegal return statement")]
    IllegalReturn(Token),
    #[error("Missing initializer in const declaration")]
    MissingInitializer(Token),
    #[error("Expression nested too deeply")]
    NestingTooDeep(Token),
}

impl ParseError {
    pub fn token(&self) -> &Token {
        match self {
            ParseError::UnexpectedToken(token)
            | ParseError::UnexpectedEOFDetected(token)
            | ParseError::ExpectedClosingParen(token)
            | ParseError::ExpectedClosingBrace(token)
            | ParseError::ExpectedClosingBracket(token)
            | ParseError::ExpectedIdent(token)
            | ParseError::InvalidAssignmentTarget(token)
            | ParseError::IllegalReturn(token)
            | ParseError::MissingInitializer(token)
            | ParseError::NestingTooDeep(token) => token,
        }
    }
}
