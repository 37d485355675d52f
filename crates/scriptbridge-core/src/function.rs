//! Callable script values.

use std::fmt;
use std::rc::Rc;

use crate::context::CallContext;
use crate::error::ScriptError;
use crate::value::MultiValue;

/// Type-erased function body.
///
/// The body receives the caller's [`CallContext`] and the argument list and
/// returns the result list.
pub type NativeFn = dyn Fn(&mut CallContext<'_>, MultiValue) -> Result<MultiValue, ScriptError>;

/// Where a function's body lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionOrigin {
    /// Defined by script code.
    Script,
    /// Bound to host code.
    Host,
}

impl FunctionOrigin {
    fn frame_tag(self) -> &'static str {
        match self {
            FunctionOrigin::Script => "[script]",
            FunctionOrigin::Host => "[host]",
        }
    }
}

struct FunctionInner {
    name: String,
    origin: FunctionOrigin,
    body: Box<NativeFn>,
}

/// A shared function handle.
#[derive(Clone)]
pub struct Function(Rc<FunctionInner>);

impl Function {
    /// Create a function from a body closure.
    pub fn new<F>(name: impl Into<String>, origin: FunctionOrigin, body: F) -> Self
    where
        F: Fn(&mut CallContext<'_>, MultiValue) -> Result<MultiValue, ScriptError> + 'static,
    {
        Self(Rc::new(FunctionInner {
            name: name.into(),
            origin,
            body: Box::new(body),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn origin(&self) -> FunctionOrigin {
        self.0.origin
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The address identifying this function.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Traceback line for a frame running this function.
    pub(crate) fn frame_line(&self) -> String {
        format!("{}: in function '{}'", self.0.origin.frame_tag(), self.0.name)
    }

    pub(crate) fn invoke(
        &self,
        ctx: &mut CallContext<'_>,
        args: MultiValue,
    ) -> Result<MultiValue, ScriptError> {
        (self.0.body)(ctx, args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.0.name)
            .field("origin", &self.0.origin)
            .finish_non_exhaustive()
    }
}
