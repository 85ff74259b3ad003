use std::borrow::Cow;
use std::fs;
use std::path::Path;

use tracing::trace;

use crate::ast::ParserOptions;
use crate::ast::parser::Parser;
use crate::eval::{Evaluator, builtin};
use crate::lexer::Lexer;
use crate::value::Value;

pub mod error;
pub mod resolver;

use error::ModuleError;

/// Loads the value a module path exports.
pub trait ModuleLoader {
    fn load(&self, path: &Path, options: &ParserOptions) -> Result<Value, ModuleError>;
}

impl<F> ModuleLoader for F
where
    F: Fn(&Path, &ParserOptions) -> Result<Value, ModuleError>,
{
    fn load(&self, path: &Path, options: &ParserOptions) -> Result<Value, ModuleError> {
        self(path, options)
    }
}

/// Runs a script file with `module` and `exports` in scope and returns
/// whatever ends up in `module.exports`.
#[derive(Debug, Clone, Default)]
pub struct ScriptModuleLoader;

impl ScriptModuleLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ModuleLoader for ScriptModuleLoader {
    fn load(&self, path: &Path, options: &ParserOptions) -> Result<Value, ModuleError> {
        let file_path = resolver::resolve(path)?;
        let code = fs::read_to_string(&file_path)
            .map_err(|e| ModuleError::IOError(Cow::Owned(e.to_string())))?;

        trace!(path = %file_path.display(), "loading module");

        // A module body may `return` early.
        let options = ParserOptions {
            allow_return_outside_function: true,
            ..options.clone()
        };
        let tokens = Lexer::new(options.lexer_options()).tokenize(&code)?;
        let program = Parser::new(&tokens, &options).parse()?;

        let exports = Value::object(Vec::<(&str, Value)>::new());
        let module = Value::object([("exports", exports.clone())]);
        let scope = Evaluator::global_scope();
        {
            let mut scope = scope.borrow_mut();
            scope.define("module".into(), module.clone());
            scope.define("exports".into(), exports);
        }

        Evaluator::default().exec_script(&program, &scope)?;

        Ok(builtin::property(&module, "exports")?)
    }
}
