use tracing::debug;

use crate::compiler::compile;
use crate::context::{Context, FileSystem};
use crate::error::Error;
use crate::module::ModuleLoader;
use crate::probe::probe;
use crate::rewrite::rewrite;
use crate::value::{Function, Value};

/// Turns `candidate` into a function taking `params`.
///
/// The candidate is tried, in order, as a callable, a module path, a file
/// path and finally as inline source. The first interpretation that yields a
/// callable wins; a module that loads but exports something else falls
/// through to the file step. Paths are relative to `context.cwd`.
pub fn normalize<F, L>(
    candidate: impl Into<Value>,
    params: &[&str],
    context: &Context<F, L>,
) -> Result<Function, Error>
where
    F: FileSystem,
    L: ModuleLoader,
{
    let candidate = candidate.into();

    if let Some(function) = probe(&candidate, params)? {
        debug!("input is already callable");
        return Ok(function);
    }

    let Value::String(input) = &candidate else {
        debug!(type_of = candidate.type_of(), "input is neither callable nor text");
        return Err(Error::NoValidFormat);
    };

    let path = context.resolve_path(input);

    match context.module_loader.load(&path, &context.parser_options) {
        Ok(module) => match probe(&module, params)? {
            Some(function) => {
                debug!(path = %path.display(), "loaded input as a module");
                return Ok(function);
            }
            None => debug!(path = %path.display(), "module does not export a callable"),
        },
        Err(err) => debug!(path = %path.display(), error = %err, "input is not a loadable module"),
    }

    if context.fs.exists(&path) {
        debug!(path = %path.display(), "reading input as a file");
        let code = context
            .fs
            .read_text(&path)
            .map_err(|source| Error::Read { path, source })?;

        return from_source(&code, params, context);
    }

    debug!("compiling input as inline source");
    from_source(input, params, context)
}

fn from_source<F, L>(code: &str, params: &[&str], context: &Context<F, L>) -> Result<Function, Error> {
    let rewritten = rewrite(code, &context.parser_options)?;
    let compiled = compile(
        &rewritten.code,
        params,
        rewritten.is_expression_body,
        &context.parser_options,
    )?;

    probe(&compiled, params)?.ok_or(Error::NoValidFormat)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::io;
    use std::path::Path;

    use rstest::rstest;

    use super::*;
    use crate::ast::ParserOptions;
    use crate::ast::error::ParseError;
    use crate::error::InnerError;
    use crate::eval::error::EvalError;
    use crate::module::error::ModuleError;

    #[derive(Default)]
    struct NoFiles;

    impl FileSystem for NoFiles {
        fn exists(&self, _: &Path) -> bool {
            false
        }

        fn read_text(&self, path: &Path) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
        }
    }

    struct OneFile(&'static str);

    impl FileSystem for OneFile {
        fn exists(&self, _: &Path) -> bool {
            true
        }

        fn read_text(&self, _: &Path) -> io::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct UnreadableFile;

    impl FileSystem for UnreadableFile {
        fn exists(&self, _: &Path) -> bool {
            true
        }

        fn read_text(&self, _: &Path) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    fn no_modules(path: &Path, _: &ParserOptions) -> Result<Value, ModuleError> {
        Err(ModuleError::NotFound(path.display().to_string().into()))
    }

    fn context() -> Context<NoFiles, fn(&Path, &ParserOptions) -> Result<Value, ModuleError>> {
        Context::new()
            .with_cwd("/work")
            .with_fs(NoFiles)
            .with_module_loader(no_modules as fn(&Path, &ParserOptions) -> Result<Value, ModuleError>)
    }

    #[rstest]
    #[case::expression("item * 2")]
    #[case::arrow("item => item * 2")]
    #[case::function("function double (item) { return item * 2 }")]
    fn test_inline_source(#[case] code: &str) {
        let function = normalize(code, &["item"], &context()).unwrap();
        assert_eq!(function.call(&[Value::from(21)]).unwrap(), Value::from(42));
    }

    #[test]
    fn test_callable_is_returned_as_is() {
        let function = Function::native("double", 1, |args| {
            Ok(Value::from(args[0].to_number().value() * 2.0))
        });
        let normalized = normalize(function.clone(), &["item"], &context()).unwrap();

        assert!(normalized.ptr_eq(&function));
    }

    #[test]
    fn test_module_is_preferred_over_file_and_source() {
        let loaded = Cell::new(false);
        let loader = |path: &Path, _: &ParserOptions| -> Result<Value, ModuleError> {
            assert_eq!(path, Path::new("/work/double"));
            loaded.set(true);
            Ok(Value::Function(Function::native("double", 1, |_| Ok(Value::from(2)))))
        };
        let context = context().with_module_loader(loader);

        let function = normalize("double", &["item"], &context).unwrap();

        assert!(loaded.get());
        assert_eq!(function.name(), Some("double"));
    }

    #[rstest]
    #[case::number(Value::from(1))]
    #[case::empty_exports(Value::object(Vec::<(&str, Value)>::new()))]
    #[case::undefined(Value::Undefined)]
    fn test_module_exporting_a_non_function_falls_through_to_file(#[case] exports: Value) {
        let loader = move |_: &Path, _: &ParserOptions| -> Result<Value, ModuleError> { Ok(exports.clone()) };
        let context = context()
            .with_fs(OneFile("function double (item) { return item * 2 }"))
            .with_module_loader(loader);

        let function = normalize("map.js", &["item"], &context).unwrap();

        assert_eq!(function.name(), Some("double"));
        assert_eq!(function.call(&[Value::from(21)]).unwrap(), Value::from(42));
    }

    #[test]
    fn test_module_exporting_a_non_function_falls_through_to_source() {
        let loader = |_: &Path, _: &ParserOptions| -> Result<Value, ModuleError> { Ok(Value::from(1)) };
        let function = normalize("item + 1", &["item"], &context().with_module_loader(loader)).unwrap();

        assert_eq!(function.call(&[Value::from(1)]).unwrap(), Value::from(2));
    }

    #[test]
    fn test_module_export_with_too_few_params() {
        let loader = |_: &Path, _: &ParserOptions| -> Result<Value, ModuleError> {
            Ok(Value::Function(Function::native("first", 1, |_| Ok(Value::Undefined))))
        };
        let err = normalize("first.js", &["memo", "item"], &context().with_module_loader(loader)).unwrap_err();

        assert!(matches!(err, Error::Arity { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_deeply_nested_source_is_a_parse_error() {
        let code = format!("{}item{}", "(".repeat(20_000), ")".repeat(20_000));
        let err = normalize(code, &["item"], &context()).unwrap_err();

        assert!(matches!(
            err,
            Error::Parse {
                cause: InnerError::Parse(ParseError::NestingTooDeep(_)),
                ..
            }
        ));
    }

    #[test]
    fn test_oversized_array_index_in_script_is_a_compile_error() {
        let err = normalize("var a = []; a[1e18] = 1; item => item", &["item"], &context()).unwrap_err();

        assert!(matches!(
            err,
            Error::Compile {
                cause: InnerError::Eval(EvalError::RangeError(_, _)),
                ..
            }
        ));
    }

    #[test]
    fn test_oversized_array_index_in_body_is_a_runtime_error() {
        let function = normalize("var a = []; a[1e18] = 1; a.length", &["item"], &context()).unwrap();
        let err = function.call(&[Value::Undefined]).unwrap_err();

        assert!(matches!(err, Error::Runtime(EvalError::RangeError(_, _))));
    }

    #[test]
    fn test_unreadable_file() {
        let err = normalize("map.js", &["item"], &context().with_fs(UnreadableFile)).unwrap_err();

        match err {
            Error::Read { path, .. } => assert_eq!(path, Path::new("/work/map.js")),
            err => panic!("unexpected error {:?}", err),
        }
    }

    #[rstest]
    #[case::number(Value::from(1))]
    #[case::null(Value::Null)]
    #[case::object(Value::object([("value", 1)]))]
    fn test_no_valid_format(#[case] candidate: Value) {
        assert!(matches!(
            normalize(candidate, &["item"], &context()),
            Err(Error::NoValidFormat)
        ));
    }

    #[test]
    fn test_script_evaluating_to_a_non_function() {
        let err = normalize("var a = 1;\nif (a) { a = 2 }", &["item"], &context()).unwrap_err();
        assert!(matches!(err, Error::NoValidFormat));
    }

    #[test]
    fn test_arity_error_from_source() {
        let err = normalize("item => item", &["memo", "item"], &context()).unwrap_err();
        assert!(matches!(
            err,
            Error::Arity {
                expected: 2,
                actual: 1
            }
        ));
    }
}
