use smol_str::SmolStr;

use crate::Shared;

pub mod error;
pub mod node;
pub mod parser;
pub mod printer;

pub type Program = Vec<Shared<node::Stmt>>;
pub type IdentName = SmolStr;

/// Options handed through to the lexer, parser and printer.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Accept `return` outside of any function body.
    pub allow_return_outside_function: bool,
    /// Let a line break, `}` or the end of input terminate a statement.
    pub semicolon_insertion: bool,
    /// Skip `//` and `/* */` comments.
    pub comments: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            allow_return_outside_function: true,
            semicolon_insertion: true,
            comments: true,
        }
    }
}

impl ParserOptions {
    pub fn lexer_options(&self) -> crate::lexer::Options {
        crate::lexer::Options {
            comments: self.comments,
        }
    }
}
