//! Call dispatch between script and host code.

use std::fmt;

use crate::coroutine::{Coroutine, CoroutineStatus};
use crate::error::ScriptError;
use crate::function::Function;
use crate::interpreter::Interpreter;
use crate::table::Table;
use crate::value::{MultiValue, ScriptValue};

/// Whether execution is nested inside a coroutine.
///
/// A context starts `Normal`. Resuming a coroutine runs its body in a child
/// context whose state is `InCoroutine`; when the body returns the child is
/// dropped and the caller continues in its own state, so leaving the
/// coroutine restores `Normal` without any explicit transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionState {
    #[default]
    Normal,
    InCoroutine,
}

impl ExecutionState {
    /// The state of a context entered from this one by resuming a coroutine.
    pub fn enter_coroutine(self) -> Self {
        ExecutionState::InCoroutine
    }

    pub fn is_in_coroutine(self) -> bool {
        matches!(self, ExecutionState::InCoroutine)
    }
}

/// Context for a function call.
///
/// Every function body receives the context it was called from. Calls made
/// through the context inherit its [`ExecutionState`].
pub struct CallContext<'i> {
    interpreter: &'i Interpreter,
    state: ExecutionState,
}

impl<'i> CallContext<'i> {
    pub(crate) fn new(interpreter: &'i Interpreter, state: ExecutionState) -> Self {
        Self { interpreter, state }
    }

    pub fn interpreter(&self) -> &'i Interpreter {
        self.interpreter
    }

    pub fn execution_state(&self) -> ExecutionState {
        self.state
    }

    pub fn globals(&self) -> Table {
        self.interpreter.globals()
    }

    /// Look up a global by name.
    pub fn global(&self, name: &str) -> ScriptValue {
        self.interpreter.globals().get(name)
    }

    /// Number of active call frames.
    pub fn depth(&self) -> usize {
        self.interpreter.depth()
    }

    /// Call a function.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn call(&mut self, function: &Function, args: MultiValue) -> Result<MultiValue, ScriptError> {
        if !self.interpreter.push_frame(function) {
            return Err(self.runtime_error("stack overflow"));
        }
        let result = function.invoke(self, args);
        self.interpreter.pop_frame();
        result
    }

    /// Call a value, raising if it is not a function.
    pub fn call_value(
        &mut self,
        callee: &ScriptValue,
        args: MultiValue,
    ) -> Result<MultiValue, ScriptError> {
        match callee {
            ScriptValue::Function(f) => self.call(f, args),
            other => Err(self.runtime_error(format!(
                "attempt to call a {} value",
                other.type_name()
            ))),
        }
    }

    /// Index `target` with `key` and call the result: `target.key(args)`.
    pub fn invoke(
        &mut self,
        target: &ScriptValue,
        key: impl Into<ScriptValue>,
        args: MultiValue,
    ) -> Result<MultiValue, ScriptError> {
        let callee = self.index(target, &key.into())?;
        self.call_value(&callee, args)
    }

    /// `target[key]`
    pub fn index(
        &mut self,
        target: &ScriptValue,
        key: &ScriptValue,
    ) -> Result<ScriptValue, ScriptError> {
        match target {
            ScriptValue::Table(t) => Ok(t.get(key.clone())),
            ScriptValue::UserData(ud) => {
                let ud = ud.clone();
                ud.as_rc().index(self, key)
            }
            other => Err(self.runtime_error(format!(
                "attempt to index a {} value",
                other.type_name()
            ))),
        }
    }

    /// `target[key] = value`
    pub fn set_index(
        &mut self,
        target: &ScriptValue,
        key: &ScriptValue,
        value: ScriptValue,
    ) -> Result<(), ScriptError> {
        match target {
            ScriptValue::Table(t) => t
                .set(key.clone(), value)
                .map_err(|e| self.raise(e.into_value())),
            ScriptValue::UserData(ud) => {
                let ud = ud.clone();
                ud.as_rc().new_index(self, key, value)
            }
            other => Err(self.runtime_error(format!(
                "attempt to index a {} value",
                other.type_name()
            ))),
        }
    }

    /// `a == b`, consulting the userdata equality capability when both sides
    /// are distinct userdata.
    pub fn equals(&self, a: &ScriptValue, b: &ScriptValue) -> bool {
        if a.raw_equals(b) {
            return true;
        }
        match (a, b) {
            (ScriptValue::UserData(x), ScriptValue::UserData(y)) => {
                x.as_rc().equals(y.as_rc().as_ref()).unwrap_or(false)
            }
            _ => false,
        }
    }

    /// `tostring(value)`
    pub fn to_display_string(&self, value: &ScriptValue) -> String {
        match value {
            ScriptValue::Nil => "nil".to_string(),
            ScriptValue::Boolean(b) => b.to_string(),
            ScriptValue::Integer(i) => i.to_string(),
            ScriptValue::Number(n) => format_number(*n),
            ScriptValue::String(s) => s.clone(),
            ScriptValue::Function(f) => format!("function: 0x{:x}", f.addr()),
            ScriptValue::Table(t) => format!("table: 0x{:x}", t.addr()),
            ScriptValue::UserData(ud) => ud
                .as_rc()
                .to_display()
                .unwrap_or_else(|| format!("{}: 0x{:x}", ud.type_name(), ud.addr())),
        }
    }

    /// Build an error raising `value` from the current call stack.
    pub fn raise(&self, value: impl Into<ScriptValue>) -> ScriptError {
        ScriptError::with_traceback(value, Some(self.traceback()))
    }

    /// Build an error raising a string message.
    pub fn runtime_error(&self, message: impl Into<String>) -> ScriptError {
        self.raise(ScriptValue::String(message.into()))
    }

    pub fn traceback(&self) -> String {
        self.interpreter.traceback()
    }

    /// Resume a coroutine, running its body in a coroutine context.
    pub fn resume(&mut self, co: &Coroutine, args: MultiValue) -> Result<MultiValue, ScriptError> {
        match co.status() {
            CoroutineStatus::Suspended => {}
            CoroutineStatus::Running => {
                return Err(self.runtime_error("cannot resume non-suspended coroutine"));
            }
            CoroutineStatus::Dead => {
                return Err(self.runtime_error("cannot resume dead coroutine"));
            }
        }
        co.set_status(CoroutineStatus::Running);
        let mut inner = CallContext::new(self.interpreter, self.state.enter_coroutine());
        tracing::trace!(function = co.function().name(), "resuming coroutine");
        let result = inner.call(co.function(), args);
        co.set_status(CoroutineStatus::Dead);
        result
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "nan".to_string()
    } else if n.is_infinite() {
        (if n > 0.0 { "inf" } else { "-inf" }).to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.1}", n)
    } else {
        format!("{}", n)
    }
}

impl fmt::Debug for CallContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("state", &self.state)
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_non_indexable_raises() {
        let interp = Interpreter::new();
        let mut ctx = interp.context();
        let err = ctx
            .index(&ScriptValue::Integer(1), &ScriptValue::from("x"))
            .unwrap_err();
        assert_eq!(err.to_string(), "attempt to index a number value");
    }

    #[test]
    fn test_call_non_function_raises() {
        let interp = Interpreter::new();
        let mut ctx = interp.context();
        let err = ctx.call_value(&ScriptValue::Nil, vec![]).unwrap_err();
        assert_eq!(err.to_string(), "attempt to call a nil value");
    }

    #[test]
    fn test_resume_enters_coroutine_state() {
        let interp = Interpreter::new();
        let body = interp.create_function("body", |ctx, _| {
            Ok(vec![ScriptValue::Boolean(ctx.execution_state().is_in_coroutine())])
        });
        let co = interp.create_coroutine(body);
        let mut ctx = interp.context();
        assert_eq!(ctx.execution_state(), ExecutionState::Normal);
        let out = ctx.resume(&co, vec![]).unwrap();
        assert_eq!(out, vec![ScriptValue::Boolean(true)]);
        assert_eq!(ctx.execution_state(), ExecutionState::Normal);
        assert_eq!(co.status(), CoroutineStatus::Dead);
    }

    #[test]
    fn test_resume_dead_coroutine_fails() {
        let interp = Interpreter::new();
        let body = interp.create_function("body", |_, _| Ok(vec![]));
        let co = interp.create_coroutine(body);
        let mut ctx = interp.context();
        ctx.resume(&co, vec![]).unwrap();
        let err = ctx.resume(&co, vec![]).unwrap_err();
        assert_eq!(err.to_string(), "cannot resume dead coroutine");
    }

    #[test]
    fn test_nested_calls_inherit_coroutine_state() {
        let interp = Interpreter::new();
        let check = interp.create_function("check", |ctx, _| {
            Ok(vec![ScriptValue::Boolean(ctx.execution_state().is_in_coroutine())])
        });
        let outer = interp.create_function("outer", move |ctx, _| ctx.call(&check, vec![]));
        let co = interp.create_coroutine(outer);
        let out = interp.context().resume(&co, vec![]).unwrap();
        assert_eq!(out, vec![ScriptValue::Boolean(true)]);
    }

    #[test]
    fn test_number_display() {
        assert_eq!(format_number(10.0), "10.0");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::INFINITY), "inf");
    }
}
