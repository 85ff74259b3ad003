use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use super::builtin;
use super::error::EvalError;
use crate::ast::IdentName;
use crate::range::Range;
use crate::value::Value;
use crate::{Shared, SharedCell};

#[derive(Error, Debug, PartialEq)]
pub enum EnvError {
    #[error("{0} is not defined")]
    NotDefined(String),
    #[error("Assignment to constant variable \"{0}\"")]
    AssignToConstant(String),
}

impl EnvError {
    pub fn to_eval_error(&self, range: Option<Range>) -> EvalError {
        match self {
            EnvError::NotDefined(name) => EvalError::NotDefined(range, name.to_string()),
            EnvError::AssignToConstant(name) => {
                EvalError::AssignToConstant(range, name.to_string())
            }
        }
    }
}

/// A lexical scope.
///
/// Parents are held strongly: a closure keeps every scope it can see alive.
#[derive(Debug, Default)]
pub struct Env {
    context: FxHashMap<IdentName, Value>,
    consts: FxHashSet<IdentName>,
    parent: Option<Shared<SharedCell<Env>>>,
    /// Whether `var` declarations land in this scope. True for the global
    /// scope and for function bodies, false for blocks.
    is_function_scope: bool,
}

impl Env {
    pub fn global() -> Self {
        Self {
            is_function_scope: true,
            ..Self::default()
        }
    }

    /// A block scope nested in `parent`.
    pub fn with_parent(parent: Shared<SharedCell<Env>>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    /// A function body scope nested in the closure's captured `parent`.
    pub fn function_scope(parent: Shared<SharedCell<Env>>) -> Self {
        Self {
            parent: Some(parent),
            is_function_scope: true,
            ..Self::default()
        }
    }

    #[inline(always)]
    pub fn define(&mut self, name: IdentName, value: Value) {
        self.consts.remove(&name);
        self.context.insert(name, value);
    }

    #[inline(always)]
    pub fn define_const(&mut self, name: IdentName, value: Value) {
        self.consts.insert(name.clone());
        self.context.insert(name, value);
    }

    #[inline(always)]
    pub fn contains(&self, name: &str) -> bool {
        self.context.contains_key(name)
    }

    /// Declares a `var` in the nearest function scope. Redeclaring without an
    /// initializer keeps the current value.
    pub fn declare_var(env: &Shared<SharedCell<Env>>, name: IdentName, value: Option<Value>) {
        let parent = {
            let mut current = env.borrow_mut();
            if current.is_function_scope || current.parent.is_none() {
                match value {
                    Some(value) => current.define(name, value),
                    None if !current.contains(&name) => current.define(name, Value::Undefined),
                    None => {}
                }
                return;
            }
            current.parent.as_ref().map(Shared::clone)
        };

        if let Some(parent) = parent {
            Env::declare_var(&parent, name, value);
        }
    }

    pub fn resolve(&self, name: &str) -> Result<Value, EnvError> {
        match self.context.get(name) {
            Some(value) => Ok(value.clone()),
            None => match &self.parent {
                Some(parent) => parent.borrow().resolve(name),
                None => builtin::global(name).ok_or_else(|| EnvError::NotDefined(name.to_string())),
            },
        }
    }

    /// Assigns to the nearest binding of `name`. An undeclared name becomes a
    /// global.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), EnvError> {
        if let Some(slot) = self.context.get_mut(name) {
            if self.consts.contains(name) {
                return Err(EnvError::AssignToConstant(name.to_string()));
            }
            *slot = value;
            return Ok(());
        }

        match &self.parent {
            Some(parent) => parent.borrow_mut().assign(name, value),
            None => {
                self.context.insert(IdentName::new(name), value);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_define_and_resolve() {
        let mut env = Env::global();
        env.define("x".into(), Value::from(42));

        assert_eq!(env.resolve("x").unwrap(), Value::from(42));
    }

    #[test]
    fn test_env_resolve_from_parent() {
        let parent_env = Shared::new(SharedCell::new(Env::global()));
        let mut child_env = Env::with_parent(Shared::clone(&parent_env));

        parent_env
            .borrow_mut()
            .define("parent_var".into(), Value::from(100));
        child_env.define("child_var".into(), Value::from(200));

        assert_eq!(child_env.resolve("child_var").unwrap(), Value::from(200));
        assert_eq!(child_env.resolve("parent_var").unwrap(), Value::from(100));
        assert_eq!(
            parent_env.borrow().resolve("child_var"),
            Err(EnvError::NotDefined("child_var".to_string()))
        );
    }

    #[test]
    fn test_env_shadow_parent_variable() {
        let parent_env = Shared::new(SharedCell::new(Env::global()));
        let mut child_env = Env::with_parent(Shared::clone(&parent_env));

        parent_env.borrow_mut().define("x".into(), Value::from(100));
        child_env.define("x".into(), Value::from(200));

        assert_eq!(child_env.resolve("x").unwrap(), Value::from(200));
        assert_eq!(parent_env.borrow().resolve("x").unwrap(), Value::from(100));
    }

    #[test]
    fn test_env_falls_back_to_builtins() {
        let env = Env::global();

        assert_eq!(env.resolve("undefined").unwrap(), Value::Undefined);
        assert!(env.resolve("Math").is_ok());
    }

    #[test]
    fn test_assign_updates_nearest_binding() {
        let parent_env = Shared::new(SharedCell::new(Env::global()));
        let mut child_env = Env::with_parent(Shared::clone(&parent_env));
        parent_env.borrow_mut().define("x".into(), Value::from(1));

        child_env.assign("x", Value::from(2)).unwrap();
        child_env.assign("y", Value::from(3)).unwrap();

        assert_eq!(parent_env.borrow().resolve("x").unwrap(), Value::from(2));
        assert_eq!(parent_env.borrow().resolve("y").unwrap(), Value::from(3));
        assert!(!child_env.contains("y"));
    }

    #[test]
    fn test_assign_to_constant() {
        let mut env = Env::global();
        env.define_const("x".into(), Value::from(1));

        assert_eq!(
            env.assign("x", Value::from(2)),
            Err(EnvError::AssignToConstant("x".to_string()))
        );
    }

    #[test]
    fn test_declare_var_hoists_to_function_scope() {
        let function_env = Shared::new(SharedCell::new(Env::global()));
        let block_env = Shared::new(SharedCell::new(Env::with_parent(Shared::clone(
            &function_env,
        ))));

        Env::declare_var(&block_env, "x".into(), Some(Value::from(1)));
        Env::declare_var(&block_env, "x".into(), None);

        assert!(!block_env.borrow().contains("x"));
        assert_eq!(function_env.borrow().resolve("x").unwrap(), Value::from(1));
    }
}
