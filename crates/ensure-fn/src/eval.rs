// Tree-walking evaluator for the script subset accepted by the parser.
// Scopes are `Env`s chained through their parents; functions capture the
// scope they are created in.
use crate::ast::Program;
use crate::ast::node::{
    AssignOp, BinaryOp, DeclKind, Expr, FunctionBody, Literal, LogicalOp, Node, Stmt, StmtKind,
    UnaryOp,
};
use crate::number::Number;
use crate::value::{Function, FunctionKind, Value};
use crate::{Shared, SharedCell};

pub mod builtin;
pub mod env;
pub mod error;

use env::Env;
use error::EvalError;

type Scope = Shared<SharedCell<Env>>;

/// Configuration options for the evaluator.
#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum depth of the call stack to prevent infinite recursion.
    pub max_call_stack_depth: u32,
}

#[cfg(debug_assertions)]
impl Default for Options {
    fn default() -> Self {
        Self {
            max_call_stack_depth: 32,
        }
    }
}

#[cfg(not(debug_assertions))]
impl Default for Options {
    fn default() -> Self {
        Self {
            max_call_stack_depth: 192,
        }
    }
}

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Ran to the end. Carries the value of the last expression statement, if any.
    Normal(Option<Value>),
    /// Hit a `return`.
    Return(Value),
}

#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    /// Current depth of the function call stack, used to prevent recursion errors.
    call_stack_depth: u32,
    pub(crate) options: Options,
}

impl Evaluator {
    pub fn new(options: Options) -> Self {
        Self {
            call_stack_depth: 0,
            options,
        }
    }

    /// Creates an empty global scope.
    pub fn global_scope() -> Scope {
        Shared::new(SharedCell::new(Env::global()))
    }

    /// Runs `program` as a script in `env`.
    ///
    /// A top-level `return` is reported as `Completion::Return`; deciding
    /// whether that is legal is left to the caller.
    pub fn exec_script(&mut self, program: &Program, env: &Scope) -> Result<Completion, EvalError> {
        self.exec_statements(program, env)
    }

    pub fn call_function(&mut self, function: &Function, args: &[Value]) -> Result<Value, EvalError> {
        if self.call_stack_depth >= self.options.max_call_stack_depth {
            return Err(EvalError::RecursionError(self.options.max_call_stack_depth));
        }

        self.call_stack_depth += 1;
        let result = self.call_function_inner(function, args);
        self.call_stack_depth -= 1;
        result
    }

    fn call_function_inner(&mut self, function: &Function, args: &[Value]) -> Result<Value, EvalError> {
        match function.kind() {
            FunctionKind::Native { func, .. } => func(self, args),
            FunctionKind::Script { def, env, arrow } => {
                let scope = Shared::new(SharedCell::new(Env::function_scope(Shared::clone(env))));

                {
                    let mut scope = scope.borrow_mut();
                    // A named function expression can refer to itself.
                    if let Some(name) = def.name.as_ref().filter(|_| !arrow) {
                        scope.define(name.name.clone(), Value::Function(function.clone()));
                    }
                    for (i, param) in def.params.iter().enumerate() {
                        scope.define(param.name.clone(), args.get(i).cloned().unwrap_or_default());
                    }
                }

                match &def.body {
                    FunctionBody::Expr(node) => self.eval_expr(node, &scope),
                    FunctionBody::Block(block) => {
                        let completion = match &block.kind {
                            StmtKind::Block(program) => self.exec_statements(program, &scope)?,
                            _ => self.exec_stmt(block, &scope)?,
                        };

                        match completion {
                            Completion::Return(value) => Ok(value),
                            Completion::Normal(_) => Ok(Value::Undefined),
                        }
                    }
                }
            }
        }
    }

    /// Function declarations are visible throughout their block.
    fn hoist(&self, program: &Program, env: &Scope) {
        for stmt in program {
            if let StmtKind::FunctionDecl(def) = &stmt.kind
                && let Some(name) = &def.name
            {
                let function = Function::script(Shared::clone(def), Shared::clone(env), false);
                env.borrow_mut()
                    .define(name.name.clone(), Value::Function(function));
            }
        }
    }

    fn exec_statements(&mut self, program: &Program, env: &Scope) -> Result<Completion, EvalError> {
        self.hoist(program, env);

        let mut last = None;
        for stmt in program {
            match self.exec_stmt(stmt, env)? {
                Completion::Return(value) => return Ok(Completion::Return(value)),
                Completion::Normal(Some(value)) => last = Some(value),
                Completion::Normal(None) => {}
            }
        }

        Ok(Completion::Normal(last))
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Scope) -> Result<Completion, EvalError> {
        match &stmt.kind {
            StmtKind::VarDecl(kind, declarators) => {
                for declarator in declarators {
                    let value = declarator
                        .init
                        .as_ref()
                        .map(|init| self.eval_expr(init, env))
                        .transpose()?;
                    let name = declarator.ident.name.clone();

                    match kind {
                        DeclKind::Var => Env::declare_var(env, name, value),
                        DeclKind::Let => env.borrow_mut().define(name, value.unwrap_or_default()),
                        DeclKind::Const => env
                            .borrow_mut()
                            .define_const(name, value.unwrap_or_default()),
                    }
                }
                Ok(Completion::Normal(None))
            }
            StmtKind::FunctionDecl(_) | StmtKind::Empty => Ok(Completion::Normal(None)),
            StmtKind::Return(argument) => Ok(Completion::Return(
                argument
                    .as_ref()
                    .map(|argument| self.eval_expr(argument, env))
                    .transpose()?
                    .unwrap_or_default(),
            )),
            StmtKind::If(test, consequent, alternate) => {
                if self.eval_expr(test, env)?.is_truthy() {
                    self.exec_stmt(consequent, env)
                } else if let Some(alternate) = alternate {
                    self.exec_stmt(alternate, env)
                } else {
                    Ok(Completion::Normal(None))
                }
            }
            StmtKind::While(test, body) => {
                let mut last = None;
                while self.eval_expr(test, env)?.is_truthy() {
                    match self.exec_stmt(body, env)? {
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal(Some(value)) => last = Some(value),
                        Completion::Normal(None) => {}
                    }
                }
                Ok(Completion::Normal(last))
            }
            StmtKind::Block(program) => {
                let scope = Shared::new(SharedCell::new(Env::with_parent(Shared::clone(env))));
                self.exec_statements(program, &scope)
            }
            StmtKind::Expr(node) => Ok(Completion::Normal(Some(self.eval_expr(node, env)?))),
        }
    }

    pub(crate) fn eval_expr(&mut self, node: &Node, env: &Scope) -> Result<Value, EvalError> {
        match &node.expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::String(s) => Value::String(s.clone()),
                Literal::Number(n) => Value::Number(*n),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Null => Value::Null,
            }),
            Expr::Ident(ident) => env
                .borrow()
                .resolve(&ident.name)
                .map_err(|e| e.to_eval_error(node.range)),
            Expr::Array(items) => items
                .iter()
                .map(|item| self.eval_expr(item, env))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::array),
            Expr::Object(properties) => {
                let mut entries = Vec::with_capacity(properties.len());
                for (key, value) in properties {
                    entries.push((key.clone(), self.eval_expr(value, env)?));
                }
                Ok(Value::object(entries))
            }
            Expr::Member(object, name) => {
                let object = self.eval_expr(object, env)?;
                builtin::property(&object, name).map_err(|e| e.or_range(node.range))
            }
            Expr::Index(object, index) => {
                let object = self.eval_expr(object, env)?;
                let index = self.eval_expr(index, env)?;
                builtin::property(&object, &property_key(&index))
                    .map_err(|e| e.or_range(node.range))
            }
            Expr::Call(callee, args) => {
                let function = self.eval_expr(callee, env)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval_expr(arg, env))
                    .collect::<Result<Vec<_>, _>>()?;

                match function {
                    Value::Function(function) => self
                        .call_function(&function, &args)
                        .map_err(|e| e.or_range(node.range)),
                    _ => Err(EvalError::NotAFunction(node.range, callee_name(callee))),
                }
            }
            Expr::Unary(UnaryOp::Typeof, operand) => match self.eval_expr(operand, env) {
                Ok(value) => Ok(Value::from(value.type_of())),
                // `typeof` of an undeclared name is not an error.
                Err(EvalError::NotDefined(_, _)) if matches!(operand.expr, Expr::Ident(_)) => {
                    Ok(Value::from("undefined"))
                }
                Err(err) => Err(err),
            },
            Expr::Unary(op, operand) => {
                let value = self.eval_expr(operand, env)?;
                Ok(match op {
                    UnaryOp::Neg => Value::Number(-value.to_number()),
                    UnaryOp::Plus => Value::Number(value.to_number()),
                    UnaryOp::Not => Value::Bool(!value.is_truthy()),
                    UnaryOp::Typeof => Value::from(value.type_of()),
                })
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval_expr(lhs, env)?;
                let rhs = self.eval_expr(rhs, env)?;
                Ok(eval_binary_op(*op, &lhs, &rhs))
            }
            Expr::Logical(op, lhs, rhs) => {
                let lhs = self.eval_expr(lhs, env)?;
                let short_circuit = match op {
                    LogicalOp::And => !lhs.is_truthy(),
                    LogicalOp::Or => lhs.is_truthy(),
                    LogicalOp::Nullish => !lhs.is_nullish(),
                };

                if short_circuit {
                    Ok(lhs)
                } else {
                    self.eval_expr(rhs, env)
                }
            }
            Expr::Conditional(test, consequent, alternate) => {
                if self.eval_expr(test, env)?.is_truthy() {
                    self.eval_expr(consequent, env)
                } else {
                    self.eval_expr(alternate, env)
                }
            }
            Expr::Assign(op, target, value) => self.eval_assign(*op, target, value, env, node),
            Expr::Function(def) => Ok(Value::Function(Function::script(
                Shared::clone(def),
                Shared::clone(env),
                false,
            ))),
            Expr::Arrow(def) => Ok(Value::Function(Function::script(
                Shared::clone(def),
                Shared::clone(env),
                true,
            ))),
        }
    }

    fn eval_assign(
        &mut self,
        op: AssignOp,
        target: &Node,
        value: &Node,
        env: &Scope,
        node: &Node,
    ) -> Result<Value, EvalError> {
        match &target.expr {
            Expr::Ident(ident) => {
                let value = match op.binary_op() {
                    Some(binary_op) => {
                        let current = self.eval_expr(target, env)?;
                        let rhs = self.eval_expr(value, env)?;
                        eval_binary_op(binary_op, &current, &rhs)
                    }
                    None => self.eval_expr(value, env)?,
                };

                env.borrow_mut()
                    .assign(&ident.name, value.clone())
                    .map_err(|e| e.to_eval_error(node.range))?;
                Ok(value)
            }
            Expr::Member(object, name) => {
                let object = self.eval_expr(object, env)?;
                self.assign_property(op, &object, name.to_string(), value, env, node)
            }
            Expr::Index(object, index) => {
                let object = self.eval_expr(object, env)?;
                let key = property_key(&self.eval_expr(index, env)?);
                self.assign_property(op, &object, key, value, env, node)
            }
            _ => Err(EvalError::TypeError(
                node.range,
                "Invalid left-hand side in assignment".to_string(),
            )),
        }
    }

    fn assign_property(
        &mut self,
        op: AssignOp,
        object: &Value,
        key: String,
        value: &Node,
        env: &Scope,
        node: &Node,
    ) -> Result<Value, EvalError> {
        let value = match op.binary_op() {
            Some(binary_op) => {
                let current = builtin::property(object, &key).map_err(|e| e.or_range(node.range))?;
                let rhs = self.eval_expr(value, env)?;
                eval_binary_op(binary_op, &current, &rhs)
            }
            None => self.eval_expr(value, env)?,
        };

        set_property(object, key, value.clone()).map_err(|e| e.or_range(node.range))?;
        Ok(value)
    }
}

/// Upper bound on how far an index assignment may grow an array.
const MAX_ARRAY_LENGTH: usize = 1 << 24;

fn set_property(object: &Value, key: String, value: Value) -> Result<(), EvalError> {
    match object {
        Value::Undefined | Value::Null => Err(EvalError::type_error(format!(
            "Cannot set properties of {} (setting '{}')",
            object, key
        ))),
        Value::Object(entries) => {
            entries.borrow_mut().insert(key.into(), value);
            Ok(())
        }
        Value::Array(items) => match key.parse::<usize>() {
            Ok(index) if index >= MAX_ARRAY_LENGTH => Err(EvalError::range_error(format!(
                "Invalid array length: cannot set index {}",
                index
            ))),
            Ok(index) => {
                let mut items = items.borrow_mut();
                if index >= items.len() {
                    items.resize(index + 1, Value::Undefined);
                }
                items[index] = value;
                Ok(())
            }
            Err(_) => Err(EvalError::type_error(format!(
                "Cannot set property '{}' of an array",
                key
            ))),
        },
        // Writes to primitives are silently dropped.
        _ => Ok(()),
    }
}

/// Converts a computed member key to the property name it reads.
fn property_key(index: &Value) -> String {
    match index {
        Value::Number(n) if n.is_int() => n.to_int().to_string(),
        _ => index.to_string(),
    }
}

fn callee_name(callee: &Node) -> String {
    match &callee.expr {
        Expr::Ident(ident) => ident.name.to_string(),
        Expr::Member(object, name) => format!("{}.{}", callee_name(object), name),
        _ => "expression".to_string(),
    }
}

pub(crate) fn eval_binary_op(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    match op {
        // Anything that is not a number-like primitive turns `+` into concatenation.
        BinaryOp::Add if is_numeric_operand(lhs) && is_numeric_operand(rhs) => {
            Value::Number(lhs.to_number() + rhs.to_number())
        }
        BinaryOp::Add => Value::String(format!("{}{}", lhs, rhs)),
        BinaryOp::Sub => Value::Number(lhs.to_number() - rhs.to_number()),
        BinaryOp::Mul => Value::Number(lhs.to_number() * rhs.to_number()),
        BinaryOp::Div => Value::Number(lhs.to_number() / rhs.to_number()),
        BinaryOp::Mod => Value::Number(lhs.to_number() % rhs.to_number()),
        BinaryOp::Lt => Value::Bool(compare(lhs, rhs, |o| o.is_lt())),
        BinaryOp::Lte => Value::Bool(compare(lhs, rhs, |o| o.is_le())),
        BinaryOp::Gt => Value::Bool(compare(lhs, rhs, |o| o.is_gt())),
        BinaryOp::Gte => Value::Bool(compare(lhs, rhs, |o| o.is_ge())),
        BinaryOp::Eq => Value::Bool(lhs.loose_equals(rhs)),
        BinaryOp::NotEq => Value::Bool(!lhs.loose_equals(rhs)),
        BinaryOp::StrictEq => Value::Bool(lhs.strict_equals(rhs)),
        BinaryOp::StrictNotEq => Value::Bool(!lhs.strict_equals(rhs)),
    }
}

#[inline(always)]
fn is_numeric_operand(value: &Value) -> bool {
    matches!(
        value,
        Value::Number(_) | Value::Bool(_) | Value::Null | Value::Undefined
    )
}

/// Strings compare lexicographically, everything else numerically. Any
/// comparison involving `NaN` is false.
fn compare(lhs: &Value, rhs: &Value, f: impl Fn(std::cmp::Ordering) -> bool) -> bool {
    let ordering = match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => {
            let (a, b): (Number, Number) = (lhs.to_number(), rhs.to_number());
            a.partial_cmp(&b)
        }
    };

    ordering.is_some_and(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ParserOptions;
    use crate::ast::parser::Parser;
    use crate::lexer::{Lexer, Options as LexerOptions};
    use rstest::rstest;

    fn run(code: &str) -> Result<Completion, EvalError> {
        let tokens = Lexer::new(LexerOptions::default()).tokenize(code).unwrap();
        let program = Parser::new(&tokens, &ParserOptions::default())
            .parse()
            .unwrap();
        Evaluator::default().exec_script(&program, &Evaluator::global_scope())
    }

    fn value_of(code: &str) -> Value {
        match run(code).unwrap() {
            Completion::Normal(Some(value)) | Completion::Return(value) => value,
            Completion::Normal(None) => Value::Undefined,
        }
    }

    #[rstest]
    #[case::arithmetic("1 + 2 * 3", Value::from(7))]
    #[case::modulo("7 % 4", Value::from(3))]
    #[case::string_concat("'a' + 1", Value::from("a1"))]
    #[case::array_concat("[1, 2] + ''", Value::from("1,2"))]
    #[case::undefined_plus_number("isNaN(undefined + 1)", Value::from(true))]
    #[case::comparison("2 < 10", Value::from(true))]
    #[case::string_comparison("'2' < '10'", Value::from(false))]
    #[case::loose_equality("1 == '1'", Value::from(true))]
    #[case::strict_equality("1 === '1'", Value::from(false))]
    #[case::logical_or("0 || 'default'", Value::from("default"))]
    #[case::logical_and("1 && 2", Value::from(2))]
    #[case::nullish("null ?? 5", Value::from(5))]
    #[case::nullish_zero("0 ?? 5", Value::from(0))]
    #[case::conditional("true ? 'yes' : 'no'", Value::from("yes"))]
    #[case::typeof_undeclared("typeof missing", Value::from("undefined"))]
    #[case::typeof_function("typeof (x => x)", Value::from("function"))]
    #[case::negation("-(2 + 3)", Value::from(-5))]
    #[case::not("!''", Value::from(true))]
    fn test_expressions(#[case] code: &str, #[case] expected: Value) {
        assert_eq!(value_of(code), expected);
    }

    #[rstest]
    #[case::var_and_assign("var a = 1; a += 2; a", Value::from(3))]
    #[case::let_assign_later("let multiple; multiple = 2; multiple * 3", Value::from(6))]
    #[case::closure("var add = function (a) { return b => a + b }; add(1)(2)", Value::from(3))]
    #[case::hoisting("square(3); function square(v) { return v * v }", Value::from(9))]
    #[case::recursion("function fact(n) { return n <= 1 ? 1 : n * fact(n - 1) } fact(5)", Value::from(120))]
    #[case::named_function_expression("var f = function g(n) { return n ? g(n - 1) + 1 : 0 }; f(3)", Value::from(3))]
    #[case::while_loop("var i = 0; var sum = 0; while (i < 4) { sum += i; i += 1 } sum", Value::from(6))]
    #[case::if_else("var r; if (1 > 2) r = 'a'; else r = 'b'; r", Value::from("b"))]
    #[case::block_scope("let x = 1; { let x = 2; } x", Value::from(1))]
    #[case::var_escapes_block("{ var y = 5; } y", Value::from(5))]
    #[case::object_member("var o = { value: 3 }; o.value * 2", Value::from(6))]
    #[case::member_assign("var o = {}; o.count = 1; o.count += 1; o['count']", Value::from(2))]
    #[case::index_assign("var a = []; a[2] = 'x'; a.length", Value::from(3))]
    #[case::reduce("[1, 2, 3].reduce((memo, item) => (memo || 0) + item, undefined)", Value::from(6))]
    #[case::map_join("[1, 2].map(x => x * 10).join('-')", Value::from("10-20"))]
    #[case::implicit_global("function set() { leaked = 4 } set(); leaked", Value::from(4))]
    #[case::missing_args("(function (a, b) { return b })(1)", Value::Undefined)]
    #[case::function_length("(function (a, b) {}).length", Value::from(2))]
    #[case::math("Math.max(1, Math.abs(-7))", Value::from(7))]
    #[case::self_containing_array("var a = []; a.push(a); '' + a", Value::from(""))]
    #[case::self_containing_join("var a = [1]; a.push(a); a.join('-')", Value::from("1-"))]
    #[case::nested_cycle("var a = [1]; a.push([2, a]); '' + a", Value::from("1,2,"))]
    fn test_statements(#[case] code: &str, #[case] expected: Value) {
        assert_eq!(value_of(code), expected);
    }

    #[test]
    fn test_completion_value_of_function_expression() {
        let value = value_of("var scale = 2;\n(function map(item) { return item * scale });");
        let function = value.as_function().unwrap();

        assert_eq!(function.arity(), 1);
        assert_eq!(function.call(&[Value::from(4)]).unwrap(), Value::from(8));
    }

    #[test]
    fn test_top_level_return() {
        assert_eq!(run("1; return 2; 3").unwrap(), Completion::Return(Value::from(2)));
    }

    #[rstest]
    #[case::not_defined("missing + 1", "missing is not defined")]
    #[case::not_a_function("var o = {}; o.run()", "o.run is not a function")]
    #[case::property_of_undefined("undefined.value", "Cannot read properties of undefined (reading 'value')")]
    #[case::assign_to_const("const c = 1; c = 2", "Assignment to constant variable \"c\"")]
    #[case::huge_index("var a = []; a[1e18] = 1", "Invalid array length: cannot set index 1000000000000000000")]
    #[case::index_past_limit("var a = []; a[16777216] = 1", "Invalid array length: cannot set index 16777216")]
    fn test_runtime_errors(#[case] code: &str, #[case] expected: &str) {
        assert_eq!(run(code).unwrap_err().to_string(), expected);
    }

    #[test]
    fn test_runtime_error_has_range() {
        let err = run("1 +\n  missing").unwrap_err();
        assert_eq!(err.range().map(|r| r.start.line), Some(2));
    }

    #[test]
    fn test_recursion_limit() {
        let err = run("function f() { return f() } f()").unwrap_err();
        assert_eq!(
            err,
            EvalError::RecursionError(Options::default().max_call_stack_depth)
        );
    }
}
