use tracing::trace;

use crate::error::Error;
use crate::value::{Function, Value};

/// Checks whether `candidate` can be used as a function taking `params`.
///
/// Returns `Ok(None)` when the value is not callable at all, so the caller can
/// try another interpretation of the input. A callable that declares fewer
/// parameters than `params` is an `Error::Arity`; declaring more is fine.
pub fn probe(candidate: &Value, params: &[&str]) -> Result<Option<Function>, Error> {
    let Some(function) = candidate.as_function() else {
        return Ok(None);
    };

    let actual = function.arity();
    trace!(expected = params.len(), actual, "probing callable");

    if actual < params.len() {
        return Err(Error::Arity {
            expected: params.len(),
            actual,
        });
    }

    Ok(Some(function.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn function(arity: usize) -> Value {
        Value::Function(Function::native("f", arity, |_| Ok(Value::Undefined)))
    }

    #[rstest]
    #[case::exact(function(1), &["item"])]
    #[case::more_params(function(3), &["item"])]
    #[case::no_params(function(0), &[])]
    fn test_probe_accepts(#[case] candidate: Value, #[case] params: &[&str]) {
        let probed = probe(&candidate, params).unwrap().unwrap();
        assert!(probed.ptr_eq(candidate.as_function().unwrap()));
    }

    #[rstest]
    #[case::number(Value::from(1))]
    #[case::string(Value::from("item => item"))]
    #[case::undefined(Value::Undefined)]
    #[case::object(Value::object([("call", 1)]))]
    fn test_probe_not_callable(#[case] candidate: Value) {
        assert!(probe(&candidate, &["item"]).unwrap().is_none());
    }

    #[test]
    fn test_probe_too_few_params() {
        let err = probe(&function(1), &["memo", "item"]).unwrap_err();
        assert!(matches!(
            err,
            Error::Arity {
                expected: 2,
                actual: 1
            }
        ));
    }
}
