use tracing::debug;

use crate::Shared;
use crate::ast::node::{FunctionBody, FunctionDef, Ident, Params, Stmt, StmtKind};
use crate::ast::parser::Parser;
use crate::ast::{ParserOptions, Program};
use crate::error::{Error, InnerError};
use crate::eval::{Completion, Evaluator};
use crate::lexer::Lexer;
use crate::value::{Function, Value};

/// Compiles rewritten source.
///
/// An expression body becomes a function taking `params`, whose body is the
/// code itself. Otherwise the code runs as a script in a fresh global scope
/// and the value of its last expression statement is returned, which the
/// caller still has to check is a callable.
pub fn compile(
    code: &str,
    params: &[&str],
    is_expression_body: bool,
    options: &ParserOptions,
) -> Result<Value, Error> {
    if is_expression_body {
        debug!(params = ?params, "compiling expression body");
        compile_function_body(code, params, options).map(Value::Function)
    } else {
        debug!("compiling script");
        run_script(code, options)
    }
}

fn compile_function_body(code: &str, params: &[&str], options: &ParserOptions) -> Result<Function, Error> {
    let program = parse(code, options, true)?;
    let def = FunctionDef {
        name: None,
        params: params.iter().map(|name| Ident::new(name)).collect::<Params>(),
        body: FunctionBody::Block(Shared::new(Stmt::new(StmtKind::Block(program)))),
    };

    Ok(Function::script(Shared::new(def), Evaluator::global_scope(), false))
}

fn run_script(code: &str, options: &ParserOptions) -> Result<Value, Error> {
    let program = parse(code, options, false)?;

    match Evaluator::default()
        .exec_script(&program, &Evaluator::global_scope())
        .map_err(|e| Error::compile(code, e))?
    {
        Completion::Normal(value) => Ok(value.unwrap_or_default()),
        Completion::Return(_) => Err(Error::compile(
            code,
            InnerError::IllegalReturn(top_level_return(&program)),
        )),
    }
}

fn parse(code: &str, options: &ParserOptions, function_body: bool) -> Result<Program, Error> {
    let tokens = Lexer::new(options.lexer_options())
        .tokenize(code)
        .map_err(|e| Error::compile(code, e))?;
    let mut parser = Parser::new(&tokens, options);

    let program = if function_body {
        parser.parse_function_body()
    } else {
        parser.parse()
    };

    program.map_err(|e| Error::compile(code, e))
}

/// Location of the first `return` directly in the script, for diagnostics.
fn top_level_return(program: &Program) -> Option<crate::range::Range> {
    program
        .iter()
        .find(|stmt| matches!(stmt.kind, StmtKind::Return(_)))
        .and_then(|stmt| stmt.range)
}
