//! `ensure-fn` turns function-like input into a callable.
//!
//! The input may already be a function, or a module path, a file path or a
//! snippet of script source. Source is rewritten so that a trailing
//! expression becomes the function's return value, and a trailing function
//! declaration or arrow becomes the function itself.
//!
//! ## Examples
//!
//! ```rust
//! use ensure_fn::{Context, Value, normalize};
//!
//! let context = Context::new();
//! let double = normalize("item.value * 2", &["item"], &context).unwrap();
//!
//! assert_eq!(double.arity(), 1);
//! assert_eq!(
//!     double.call(&[Value::object([("value", 3)])]).unwrap(),
//!     Value::from(6)
//! );
//!
//! let sum = normalize("(memo, item) => memo + item", &["memo", "item"], &context).unwrap();
//! assert_eq!(sum.call(&[Value::from(1), Value::from(2)]).unwrap(), Value::from(3));
//!
//! // Rewriting without compiling
//! use ensure_fn::{ParserOptions, rewrite};
//!
//! let rewritten = rewrite("let a = 1; a + item", &ParserOptions::default()).unwrap();
//! assert_eq!(rewritten.code, "let a = 1; return a + item;");
//! assert!(rewritten.is_expression_body);
//! ```
mod ast;
mod compiler;
mod context;
mod error;
mod eval;
mod lexer;
mod module;
mod number;
mod probe;
mod range;
mod resolver;
mod rewrite;
mod value;

use std::cell::RefCell;
use std::rc::Rc;

use ast::parser::Parser;
use lexer::Lexer;

pub use ast::error::ParseError;
pub use ast::node::{Expr as AstExpr, Node as AstNode, Stmt as AstStmt, StmtKind as AstStmtKind};
pub use ast::printer::Printer;
pub use ast::{ParserOptions, Program};
pub use compiler::compile;
pub use context::{Context, FileSystem, LocalFileSystem};
pub use error::{Error, InnerError};
pub use eval::error::EvalError;
pub use eval::{Evaluator, Options as EvalOptions};
pub use lexer::Options as LexerOptions;
pub use lexer::error::LexerError;
pub use lexer::token::{Token, TokenKind};
pub use module::error::ModuleError;
pub use module::{ModuleLoader, ScriptModuleLoader};
pub use number::Number;
pub use probe::probe;
pub use range::{Position, Range};
pub use resolver::normalize;
pub use rewrite::{Rewritten, rewrite, rewrite_program};
pub use value::{Function, Value};

pub type Shared<T> = Rc<T>;
pub type SharedCell<T> = RefCell<T>;

#[allow(clippy::result_large_err)]
pub fn parse(code: &str, options: &ParserOptions) -> Result<Program, Error> {
    let tokens = tokenize(code, &options.lexer_options())?;

    Parser::new(&tokens, options)
        .parse()
        .map_err(|e| Error::parse(code, e))
}

#[allow(clippy::result_large_err)]
pub fn tokenize(code: &str, options: &LexerOptions) -> Result<Vec<Token>, Error> {
    Lexer::new(options.clone())
        .tokenize(code)
        .map_err(|e| Error::parse(code, e))
}
