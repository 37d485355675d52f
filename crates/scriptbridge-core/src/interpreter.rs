//! Interpreter state shared by all call contexts.

use std::cell::RefCell;
use std::fmt;

use crate::context::{CallContext, ExecutionState};
use crate::coroutine::Coroutine;
use crate::error::ScriptError;
use crate::function::{Function, FunctionOrigin};
use crate::table::Table;
use crate::userdata::{AnyUserData, UserData};
use crate::value::{MultiValue, ScriptValue};

/// Interpreter limits.
#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    /// Maximum number of nested calls before `stack overflow` is raised.
    pub max_call_depth: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self { max_call_depth: 200 }
    }
}

/// The embedded interpreter.
///
/// Owns the global table and the call stack used for tracebacks. All
/// execution is single-threaded.
pub struct Interpreter {
    globals: Table,
    frames: RefCell<Vec<Function>>,
    config: InterpreterConfig,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        Self {
            globals: Table::new(),
            frames: RefCell::new(Vec::new()),
            config,
        }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn globals(&self) -> Table {
        self.globals.clone()
    }

    /// A top-level context in the `Normal` state.
    pub fn context(&self) -> CallContext<'_> {
        CallContext::new(self, ExecutionState::Normal)
    }

    pub fn create_table(&self) -> Table {
        Table::new()
    }

    pub fn create_sequence<I, V>(&self, values: I) -> Table
    where
        I: IntoIterator<Item = V>,
        V: Into<ScriptValue>,
    {
        Table::from_sequence(values)
    }

    /// Create a script-defined function.
    pub fn create_function<F>(&self, name: impl Into<String>, body: F) -> Function
    where
        F: Fn(&mut CallContext<'_>, MultiValue) -> Result<MultiValue, ScriptError> + 'static,
    {
        Function::new(name, FunctionOrigin::Script, body)
    }

    /// Create a function whose body is host code.
    pub fn create_host_function<F>(&self, name: impl Into<String>, body: F) -> Function
    where
        F: Fn(&mut CallContext<'_>, MultiValue) -> Result<MultiValue, ScriptError> + 'static,
    {
        Function::new(name, FunctionOrigin::Host, body)
    }

    pub fn create_coroutine(&self, function: Function) -> Coroutine {
        Coroutine::new(function)
    }

    pub fn create_userdata<T: UserData>(&self, value: T) -> AnyUserData {
        AnyUserData::new(value)
    }

    /// Call a function from the host, outside any coroutine.
    pub fn call(&self, function: &Function, args: MultiValue) -> Result<MultiValue, ScriptError> {
        self.context().call(function, args)
    }

    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Render the active call stack, innermost frame first.
    pub fn traceback(&self) -> String {
        let frames = self.frames.borrow();
        let mut out = String::from("stack traceback:");
        for frame in frames.iter().rev() {
            out.push_str("\n\t");
            out.push_str(&frame.frame_line());
        }
        out
    }

    pub(crate) fn push_frame(&self, function: &Function) -> bool {
        let mut frames = self.frames.borrow_mut();
        if frames.len() >= self.config.max_call_depth {
            return false;
        }
        frames.push(function.clone());
        true
    }

    pub(crate) fn pop_frame(&self) {
        self.frames.borrow_mut().pop();
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("depth", &self.depth())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
