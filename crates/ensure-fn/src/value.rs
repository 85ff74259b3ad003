use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display, Formatter};

use itertools::Itertools;
use smol_str::SmolStr;

use crate::ast::node::FunctionDef;
use crate::eval::{Evaluator, env::Env, error::EvalError};
use crate::number::{self, Number};
use crate::{Error, Shared, SharedCell};

pub type Array = Shared<SharedCell<Vec<Value>>>;
pub type Object = Shared<SharedCell<BTreeMap<SmolStr, Value>>>;
pub type NativeFn = Box<dyn Fn(&mut Evaluator, &[Value]) -> Result<Value, EvalError>>;

/// A runtime value of the embedded script language.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Array),
    Object(Object),
    Function(Function),
}

pub enum FunctionKind {
    Script {
        def: Shared<FunctionDef>,
        env: Shared<SharedCell<Env>>,
        arrow: bool,
    },
    Native {
        name: SmolStr,
        arity: usize,
        func: NativeFn,
    },
}

/// A callable. Clones share the same function.
#[derive(Clone)]
pub struct Function(Shared<FunctionKind>);

impl Function {
    pub(crate) fn script(def: Shared<FunctionDef>, env: Shared<SharedCell<Env>>, arrow: bool) -> Self {
        Function(Shared::new(FunctionKind::Script { def, env, arrow }))
    }

    pub(crate) fn builtin(
        name: &str,
        arity: usize,
        func: impl Fn(&mut Evaluator, &[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        Function(Shared::new(FunctionKind::Native {
            name: SmolStr::new(name),
            arity,
            func: Box::new(func),
        }))
    }

    /// Wraps a Rust closure as a callable declaring `arity` parameters.
    pub fn native(
        name: &str,
        arity: usize,
        func: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        Self::builtin(name, arity, move |_, args| func(args))
    }

    #[inline(always)]
    pub fn kind(&self) -> &FunctionKind {
        &self.0
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        match self.kind() {
            FunctionKind::Script { def, .. } => def.params.len(),
            FunctionKind::Native { arity, .. } => *arity,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self.kind() {
            FunctionKind::Script { def, .. } => def.name.as_ref().map(|name| name.name.as_str()),
            FunctionKind::Native { name, .. } => Some(name.as_str()),
        }
    }

    /// Whether both handles refer to the same function.
    #[inline(always)]
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Shared::ptr_eq(&self.0, &other.0)
    }

    /// Calls the function with a fresh evaluator.
    pub fn call(&self, args: &[Value]) -> Result<Value, Error> {
        Evaluator::default()
            .call_function(self, args)
            .map_err(Error::from)
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.kind() {
            FunctionKind::Script { arrow: true, .. } => write!(f, "[Function: (arrow)/{}]", self.arity()),
            _ => write!(
                f,
                "[Function: {}/{}]",
                self.name().unwrap_or("(anonymous)"),
                self.arity()
            ),
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Shared::new(SharedCell::new(items)))
    }

    /// Builds an object from key/value pairs.
    pub fn object<K: Into<SmolStr>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Value::Object(Shared::new(SharedCell::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )))
    }

    #[inline(always)]
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null | Value::Array(_) | Value::Object(_) => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => !n.is_zero() && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) => true,
        }
    }

    pub fn to_number(&self) -> Number {
        match self {
            Value::Undefined => number::NAN,
            Value::Null => 0.into(),
            Value::Bool(b) => (*b as i32).into(),
            Value::Number(n) => *n,
            Value::String(s) => parse_number(s),
            Value::Array(_) => parse_number(&self.to_string()),
            Value::Object(_) | Value::Function(_) => number::NAN,
        }
    }

    /// `===`
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Shared::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Shared::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// `==`
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Value::Number(_), Value::String(_))
            | (Value::String(_), Value::Number(_))
            | (Value::Bool(_), _)
            | (_, Value::Bool(_)) => self.to_number() == other.to_number(),
            (Value::Array(_) | Value::Object(_), Value::String(_) | Value::Number(_))
            | (Value::String(_) | Value::Number(_), Value::Array(_) | Value::Object(_)) => {
                Value::String(self.to_string()).loose_equals(&Value::String(other.to_string()))
            }
            _ => self.strict_equals(other),
        }
    }

    /// Equality used by `includes`: like `===` but `NaN` matches itself.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) if a.is_nan() && b.is_nan() => true,
            _ => self.strict_equals(other),
        }
    }
}

/// Converts a string to a number the way `Number(s)` does.
pub fn parse_number(s: &str) -> Number {
    let s = s.trim();

    match s {
        "" => 0.into(),
        "Infinity" | "+Infinity" => number::INFINITE,
        "-Infinity" => -number::INFINITE,
        _ => {
            if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                return i64::from_str_radix(hex, 16)
                    .map(Number::from)
                    .unwrap_or(number::NAN);
            }

            if s
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
            {
                s.parse::<f64>().map(Number::new).unwrap_or(number::NAN)
            } else {
                number::NAN
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Shared::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Object(a), Value::Object(b)) => Shared::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let seen = SharedCell::new(Vec::new());
        Debug::fmt(&Guarded { value: self, seen: &seen }, f)
    }
}

/// Debug view of a value that prints containers already being printed as
/// `[Circular]`.
struct Guarded<'a> {
    value: &'a Value,
    seen: &'a SharedCell<Vec<usize>>,
}

impl Guarded<'_> {
    fn nested<'b>(&'b self, value: &'b Value) -> Guarded<'b> {
        Guarded {
            value,
            seen: self.seen,
        }
    }

    fn enter(&self, addr: usize) -> bool {
        let mut seen = self.seen.borrow_mut();
        if seen.contains(&addr) {
            return false;
        }
        seen.push(addr);
        true
    }

    fn leave(&self) {
        self.seen.borrow_mut().pop();
    }
}

impl Debug for Guarded<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(a) => {
                if !self.enter(Shared::as_ptr(a) as usize) {
                    return write!(f, "[Circular]");
                }
                let result = f
                    .debug_list()
                    .entries(a.borrow().iter().map(|v| self.nested(v)))
                    .finish();
                self.leave();
                result
            }
            Value::Object(o) => {
                if !self.enter(Shared::as_ptr(o) as usize) {
                    return write!(f, "[Circular]");
                }
                let result = f
                    .debug_map()
                    .entries(o.borrow().iter().map(|(k, v)| (k, self.nested(v))))
                    .finish();
                self.leave();
                result
            }
            Value::Function(func) => write!(f, "{:?}", func),
        }
    }
}

/// Joins array elements the way `Array.prototype.join` does: `null` and
/// `undefined` become empty strings, and so does an array reached again
/// while it is being joined.
pub(crate) fn join_array(items: &Array, separator: &str) -> String {
    join_guarded(items, separator, &mut Vec::new())
}

fn join_guarded(items: &Array, separator: &str, seen: &mut Vec<usize>) -> String {
    let addr = Shared::as_ptr(items) as usize;
    if seen.contains(&addr) {
        return String::new();
    }

    seen.push(addr);
    let joined = items
        .borrow()
        .iter()
        .map(|v| match v {
            Value::Array(inner) => join_guarded(inner, ",", seen),
            v if v.is_nullish() => String::new(),
            v => v.to_string(),
        })
        .join(separator);
    seen.pop();

    joined
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(a) => write!(f, "{}", join_array(a, ",")),
            Value::Object(_) => write!(f, "[object Object]"),
            Value::Function(func) => write!(
                f,
                "function {}() {{ [code] }}",
                func.name().unwrap_or_default()
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Undefined
    }
}
