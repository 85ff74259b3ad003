use std::sync::LazyLock;

use rustc_hash::FxHashMap;

use super::Evaluator;
use super::error::EvalError;
use crate::number::{self, Number};
use crate::value::{Function, Value, join_array};

type Receiver = Value;
type BuiltinFn = fn(&mut Evaluator, &Receiver, &[Value]) -> Result<Value, EvalError>;
type BuiltinTable = LazyLock<FxHashMap<&'static str, BuiltinFunction>>;

#[derive(Clone, Copy, Debug)]
pub struct BuiltinFunction {
    /// Declared parameter count, reported by `fn.length`.
    pub arity: usize,
    pub func: BuiltinFn,
}

impl BuiltinFunction {
    const fn new(arity: usize, func: BuiltinFn) -> Self {
        Self { arity, func }
    }

    /// Binds the builtin to `receiver`, producing a callable value.
    fn bind(self, name: &str, receiver: Receiver) -> Value {
        Value::Function(Function::builtin(name, self.arity, move |evaluator, args| {
            (self.func)(evaluator, &receiver, args)
        }))
    }
}

#[inline(always)]
fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

fn math(f: impl Fn(f64) -> f64, args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Number(Number::new(f(arg(args, 0).to_number().value()))))
}

static GLOBAL_FUNCTIONS: BuiltinTable = LazyLock::new(|| {
    let mut map = FxHashMap::default();

    map.insert(
        "String",
        BuiltinFunction::new(1, |_, _, args| {
            Ok(Value::String(
                args.first().map(|v| v.to_string()).unwrap_or_default(),
            ))
        }),
    );
    map.insert(
        "Number",
        BuiltinFunction::new(1, |_, _, args| {
            Ok(Value::Number(
                args.first().map(Value::to_number).unwrap_or_default(),
            ))
        }),
    );
    map.insert(
        "Boolean",
        BuiltinFunction::new(1, |_, _, args| Ok(Value::Bool(arg(args, 0).is_truthy()))),
    );
    map.insert(
        "isNaN",
        BuiltinFunction::new(1, |_, _, args| {
            Ok(Value::Bool(arg(args, 0).to_number().is_nan()))
        }),
    );

    map
});

static MATH_FUNCTIONS: BuiltinTable = LazyLock::new(|| {
    let mut map = FxHashMap::default();

    map.insert("abs", BuiltinFunction::new(1, |_, _, args| math(f64::abs, args)));
    map.insert("floor", BuiltinFunction::new(1, |_, _, args| math(f64::floor, args)));
    map.insert("ceil", BuiltinFunction::new(1, |_, _, args| math(f64::ceil, args)));
    // Halves round towards +Infinity.
    map.insert(
        "round",
        BuiltinFunction::new(1, |_, _, args| math(|n| (n + 0.5).floor(), args)),
    );
    map.insert("sqrt", BuiltinFunction::new(1, |_, _, args| math(f64::sqrt, args)));
    map.insert(
        "pow",
        BuiltinFunction::new(2, |_, _, args| {
            let exponent = arg(args, 1).to_number().value();
            math(|n| n.powf(exponent), args)
        }),
    );
    map.insert(
        "max",
        BuiltinFunction::new(2, |_, _, args| {
            Ok(Value::Number(args.iter().map(Value::to_number).fold(
                -number::INFINITE,
                |acc, n| {
                    if acc.is_nan() || n.is_nan() {
                        number::NAN
                    } else if n > acc {
                        n
                    } else {
                        acc
                    }
                },
            )))
        }),
    );
    map.insert(
        "min",
        BuiltinFunction::new(2, |_, _, args| {
            Ok(Value::Number(args.iter().map(Value::to_number).fold(
                number::INFINITE,
                |acc, n| {
                    if acc.is_nan() || n.is_nan() {
                        number::NAN
                    } else if n < acc {
                        n
                    } else {
                        acc
                    }
                },
            )))
        }),
    );

    map
});

static ARRAY_METHODS: BuiltinTable = LazyLock::new(|| {
    let mut map = FxHashMap::default();

    map.insert(
        "push",
        BuiltinFunction::new(1, |_, receiver, args| match receiver {
            Value::Array(items) => {
                let mut items = items.borrow_mut();
                items.extend(args.iter().cloned());
                Ok(Value::from(items.len()))
            }
            _ => Err(EvalError::type_error("push called on non-array")),
        }),
    );
    map.insert(
        "map",
        BuiltinFunction::new(1, |evaluator, receiver, args| {
            let (items, callback) = array_and_callback(receiver, args, "map")?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    evaluator.call_function(
                        &callback,
                        &[item.clone(), Value::from(i), receiver.clone()],
                    )
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::array)
        }),
    );
    map.insert(
        "filter",
        BuiltinFunction::new(1, |evaluator, receiver, args| {
            let (items, callback) = array_and_callback(receiver, args, "filter")?;
            let mut filtered = Vec::with_capacity(items.len());

            for (i, item) in items.into_iter().enumerate() {
                if evaluator
                    .call_function(&callback, &[item.clone(), Value::from(i), receiver.clone()])?
                    .is_truthy()
                {
                    filtered.push(item);
                }
            }

            Ok(Value::array(filtered))
        }),
    );
    map.insert(
        "reduce",
        BuiltinFunction::new(1, |evaluator, receiver, args| {
            let (items, callback) = array_and_callback(receiver, args, "reduce")?;
            let mut items = items.into_iter().enumerate();

            // An explicit initial value counts even when it is `undefined`.
            let mut acc = match args.get(1) {
                Some(initial) => initial.clone(),
                None => match items.next() {
                    Some((_, first)) => first,
                    None => {
                        return Err(EvalError::type_error(
                            "Reduce of empty array with no initial value",
                        ));
                    }
                },
            };

            for (i, item) in items {
                acc = evaluator
                    .call_function(&callback, &[acc, item, Value::from(i), receiver.clone()])?;
            }

            Ok(acc)
        }),
    );
    map.insert(
        "join",
        BuiltinFunction::new(1, |_, receiver, args| {
            let separator = match args.first() {
                None | Some(Value::Undefined) => ",".to_string(),
                Some(separator) => separator.to_string(),
            };
            match receiver {
                Value::Array(items) => Ok(Value::String(join_array(items, &separator))),
                _ => Err(not_an_array("join")),
            }
        }),
    );
    map.insert(
        "indexOf",
        BuiltinFunction::new(1, |_, receiver, args| {
            let needle = arg(args, 0);
            Ok(array_items(receiver, "indexOf")?
                .iter()
                .position(|v| v.strict_equals(&needle))
                .map(Value::from)
                .unwrap_or(Value::from(-1)))
        }),
    );
    map.insert(
        "includes",
        BuiltinFunction::new(1, |_, receiver, args| {
            let needle = arg(args, 0);
            Ok(Value::Bool(
                array_items(receiver, "includes")?
                    .iter()
                    .any(|v| v.same_value_zero(&needle)),
            ))
        }),
    );

    map
});

static STRING_METHODS: BuiltinTable = LazyLock::new(|| {
    let mut map = FxHashMap::default();

    map.insert(
        "toUpperCase",
        BuiltinFunction::new(0, |_, receiver, _| {
            Ok(Value::String(receiver.to_string().to_uppercase()))
        }),
    );
    map.insert(
        "toLowerCase",
        BuiltinFunction::new(0, |_, receiver, _| {
            Ok(Value::String(receiver.to_string().to_lowercase()))
        }),
    );
    map.insert(
        "trim",
        BuiltinFunction::new(0, |_, receiver, _| {
            Ok(Value::String(receiver.to_string().trim().to_string()))
        }),
    );
    map.insert(
        "includes",
        BuiltinFunction::new(1, |_, receiver, args| {
            Ok(Value::Bool(
                receiver.to_string().contains(&arg(args, 0).to_string()),
            ))
        }),
    );
    map.insert(
        "indexOf",
        BuiltinFunction::new(1, |_, receiver, args| {
            let haystack = receiver.to_string();
            Ok(haystack
                .find(&arg(args, 0).to_string())
                .map(|offset| Value::from(haystack[..offset].chars().count()))
                .unwrap_or(Value::from(-1)))
        }),
    );

    map
});

fn array_items(receiver: &Value, method: &str) -> Result<Vec<Value>, EvalError> {
    match receiver {
        Value::Array(items) => Ok(items.borrow().clone()),
        _ => Err(not_an_array(method)),
    }
}

fn not_an_array(method: &str) -> EvalError {
    EvalError::type_error(format!("{} called on non-array", method))
}

fn array_and_callback(
    receiver: &Value,
    args: &[Value],
    method: &str,
) -> Result<(Vec<Value>, Function), EvalError> {
    let items = array_items(receiver, method)?;
    match args.first() {
        Some(Value::Function(callback)) => Ok((items, callback.clone())),
        Some(other) => Err(EvalError::type_error(format!(
            "{} is not a function",
            other
        ))),
        None => Err(EvalError::type_error("undefined is not a function")),
    }
}

fn math_object() -> Value {
    Value::object(
        MATH_FUNCTIONS
            .iter()
            .map(|(name, f)| (*name, f.bind(name, Value::Undefined)))
            .chain([
                ("PI", Value::from(std::f64::consts::PI)),
                ("E", Value::from(std::f64::consts::E)),
            ]),
    )
}

/// Looks up a global binding that is not declared by the script.
pub fn global(name: &str) -> Option<Value> {
    match name {
        "undefined" => Some(Value::Undefined),
        "NaN" => Some(Value::Number(number::NAN)),
        "Infinity" => Some(Value::Number(number::INFINITE)),
        "Math" => Some(math_object()),
        _ => GLOBAL_FUNCTIONS
            .get(name)
            .map(|f| f.bind(name, Value::Undefined)),
    }
}

/// Reads `object.name`.
pub fn property(object: &Value, name: &str) -> Result<Value, EvalError> {
    match object {
        Value::Undefined | Value::Null => Err(EvalError::type_error(format!(
            "Cannot read properties of {} (reading '{}')",
            object, name
        ))),
        Value::Array(items) => match name {
            "length" => Ok(Value::from(items.borrow().len())),
            _ => Ok(name
                .parse::<usize>()
                .ok()
                .and_then(|i| items.borrow().get(i).cloned())
                .or_else(|| {
                    ARRAY_METHODS
                        .get(name)
                        .map(|f| f.bind(name, object.clone()))
                })
                .unwrap_or_default()),
        },
        Value::String(s) => match name {
            "length" => Ok(Value::from(s.encode_utf16().count())),
            _ => Ok(name
                .parse::<usize>()
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::String(c.to_string()))
                .or_else(|| {
                    STRING_METHODS
                        .get(name)
                        .map(|f| f.bind(name, object.clone()))
                })
                .unwrap_or_default()),
        },
        Value::Object(entries) => Ok(entries.borrow().get(name).cloned().unwrap_or_default()),
        Value::Function(f) => match name {
            "length" => Ok(Value::from(f.arity())),
            "name" => Ok(Value::from(f.name().unwrap_or_default())),
            _ => Ok(Value::Undefined),
        },
        Value::Bool(_) | Value::Number(_) => Ok(Value::Undefined),
    }
}
