use tracing::trace;

use crate::Shared;
use crate::ast::node::{Expr, Node, Stmt, StmtKind};
use crate::ast::printer::Printer;
use crate::ast::{ParserOptions, Program};
use crate::error::Error;

/// Source text ready for compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub code: String,
    /// The code is a function body that ends by returning a value, rather
    /// than a script evaluating to a function.
    pub is_expression_body: bool,
}

/// Parses `code`, rewrites its final top-level statement and prints it back.
///
/// Only the rewritten statement's text changes; everything around it,
/// comments and whitespace included, is kept as written.
pub fn rewrite(code: &str, options: &ParserOptions) -> Result<Rewritten, Error> {
    let mut program = crate::parse(code, options)?;
    let printer = Printer::new(code);

    let Some(index) = last_statement(&program) else {
        return Ok(Rewritten {
            code: code.to_string(),
            is_expression_body: false,
        });
    };

    let original = program[index].range;
    let (replacement, is_expression_body) = rewrite_statement(&program[index]);

    let code = match replacement {
        Some(replacement) => {
            let printed = printer.print_stmt(&replacement);
            program[index] = Shared::new(replacement);

            match original.and_then(|range| {
                Some((code.get(..range.start.offset)?, code.get(range.end.offset..)?))
            }) {
                Some((before, after)) => format!("{}{}{}", before, printed, after),
                None => printer.print(&program),
            }
        }
        None => code.to_string(),
    };

    trace!(is_expression_body, code = %code, "rewrote source");

    Ok(Rewritten {
        code,
        is_expression_body,
    })
}

/// Rewrites the last top-level statement of `program` in place and reports
/// whether the program became an expression body.
pub fn rewrite_program(program: &mut Program) -> bool {
    let Some(index) = last_statement(program) else {
        return false;
    };

    let (replacement, is_expression_body) = rewrite_statement(&program[index]);
    if let Some(replacement) = replacement {
        program[index] = Shared::new(replacement);
    }

    is_expression_body
}

/// Index of the last top-level statement that is not an empty `;`.
fn last_statement(program: &Program) -> Option<usize> {
    program
        .iter()
        .rposition(|stmt| !matches!(stmt.kind, StmtKind::Empty))
}

/// The statement to put in place of `stmt`, if any, and whether the program
/// is now an expression body.
fn rewrite_statement(stmt: &Stmt) -> (Option<Stmt>, bool) {
    match &stmt.kind {
        StmtKind::Expr(node) if matches!(node.expr, Expr::Arrow(_)) => (None, false),
        StmtKind::Expr(node) => (
            Some(Stmt::new(StmtKind::Return(Some(Shared::clone(node))))),
            true,
        ),
        StmtKind::FunctionDecl(def) => {
            // The declaration's own text is already a valid function expression.
            let expr = Node {
                range: stmt.range,
                expr: Expr::Function(Shared::clone(def)),
            };
            (Some(Stmt::new(StmtKind::Expr(Shared::new(expr)))), false)
        }
        StmtKind::Return(Some(argument)) if argument.is_function() => (
            Some(Stmt::new(StmtKind::Expr(Shared::clone(argument)))),
            false,
        ),
        StmtKind::Return(_) => (None, true),
        _ => (None, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::expression("item.value * 2", "return item.value * 2;", true)]
    #[case::expression_with_semicolon("item.value * 2;", "return item.value * 2;", true)]
    #[case::explicit_return("return item.value * 2", "return item.value * 2", true)]
    #[case::bare_return("return", "return", true)]
    #[case::function_declaration(
        "function map (item) { return item.value * 2 }",
        "(function map (item) { return item.value * 2 });",
        false
    )]
    #[case::returned_function(
        "return function map (item) { return item.value * 2 }",
        "(function map (item) { return item.value * 2 });",
        false
    )]
    #[case::arrow("item => item.value * 2", "item => item.value * 2", false)]
    #[case::returned_arrow("return item => item.value * 2", "item => item.value * 2;", false)]
    #[case::statements(
        "let multiple; multiple = 2; item.value * multiple",
        "let multiple; multiple = 2; return item.value * multiple;",
        true
    )]
    #[case::trailing_empty_statement(
        "function map (item) { return item };",
        "(function map (item) { return item });;",
        false
    )]
    #[case::trailing_comment("a + b // sum", "return a + b; // sum", true)]
    #[case::only_declarations("var a = 1", "var a = 1", false)]
    #[case::if_statement("if (a) { b }", "if (a) { b }", false)]
    #[case::empty("", "", false)]
    fn test_rewrite(#[case] code: &str, #[case] expected: &str, #[case] is_expression_body: bool) {
        assert_eq!(
            rewrite(code, &ParserOptions::default()).unwrap(),
            Rewritten {
                code: expected.to_string(),
                is_expression_body,
            }
        );
    }

    #[test]
    fn test_only_last_statement_is_rewritten() {
        let code = "\n  function square (v) {\n    return v * 2\n  }\n\n  function map (item) {\n    return square(item.value)\n  }\n";
        let rewritten = rewrite(code, &ParserOptions::default()).unwrap();

        assert!(!rewritten.is_expression_body);
        assert_eq!(
            rewritten.code,
            "\n  function square (v) {\n    return v * 2\n  }\n\n  (function map (item) {\n    return square(item.value)\n  });\n"
        );
    }

    #[test]
    fn test_earlier_expressions_are_kept() {
        let rewritten = rewrite("first(); second()", &ParserOptions::default()).unwrap();
        assert_eq!(rewritten.code, "first(); return second();");
    }

    #[test]
    fn test_rewrite_program_in_place() {
        let mut program = crate::parse("a; b", &ParserOptions::default()).unwrap();

        assert!(rewrite_program(&mut program));
        assert!(matches!(program[0].kind, StmtKind::Expr(_)));
        assert!(matches!(program[1].kind, StmtKind::Return(Some(_))));
        assert!(!rewrite_program(&mut Vec::new()));
    }

    #[test]
    fn test_parse_failure() {
        let err = rewrite("_Q)(**%&^*&R", &ParserOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
