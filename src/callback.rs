//! Host functions callable from script.
//!
//! Every host call, whether a registered [`HostFunction`] or a method bound
//! through a proxy, goes through [`dispatch`]: reentrancy check, arity check,
//! argument conversion, the body, result conversion and error translation.

use std::fmt;
use std::rc::Rc;

use scriptbridge_core::{CallContext, ExecutionState, Interpreter, MultiValue, ScriptError, ScriptValue};

use crate::binding::BindingContext;
use crate::convert::{to_host, to_script};
use crate::error::{BindingError, BridgeError, BridgeResult, ScriptException};
use crate::reentrancy::ReentrancyGuard;
use crate::translate;
use crate::types::{HostType, HostValue};

/// Erased host function body.
pub type HostFn = dyn Fn(&mut HostCall<'_, '_>, Vec<HostValue>) -> BridgeResult<Vec<HostValue>>;

/// A host function with a fixed parameter list.
///
/// ```
/// use scriptbridge::{HostFunction, HostType, HostValue};
///
/// let add = HostFunction::new("add", [HostType::I64, HostType::I64], |_, args| {
///     let sum = args[0].as_i64().unwrap_or(0) + args[1].as_i64().unwrap_or(0);
///     Ok(vec![HostValue::Int(sum)])
/// });
/// assert_eq!(add.arity(), 2);
/// ```
#[derive(Clone)]
pub struct HostFunction {
    name: String,
    params: Vec<HostType>,
    body: Rc<HostFn>,
}

impl HostFunction {
    pub fn new<F>(name: impl Into<String>, params: impl IntoIterator<Item = HostType>, body: F) -> Self
    where
        F: Fn(&mut HostCall<'_, '_>, Vec<HostValue>) -> BridgeResult<Vec<HostValue>> + 'static,
    {
        Self {
            name: name.into(),
            params: params.into_iter().collect(),
            body: Rc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[HostType] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub(crate) fn body(&self) -> &Rc<HostFn> {
        &self.body
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// The view a host function body has of its caller.
pub struct HostCall<'a, 'i> {
    ctx: &'a mut CallContext<'i>,
    binding: &'a Rc<BindingContext>,
}

impl<'a, 'i> HostCall<'a, 'i> {
    pub(crate) fn new(ctx: &'a mut CallContext<'i>, binding: &'a Rc<BindingContext>) -> Self {
        Self { ctx, binding }
    }

    pub fn context(&mut self) -> &mut CallContext<'i> {
        &mut *self.ctx
    }

    pub fn interpreter(&self) -> &'i Interpreter {
        self.ctx.interpreter()
    }

    pub fn binding(&self) -> &Rc<BindingContext> {
        self.binding
    }

    pub fn execution_state(&self) -> ExecutionState {
        self.ctx.execution_state()
    }

    pub fn to_host(&self, value: &ScriptValue, ty: &HostType) -> BridgeResult<HostValue> {
        Ok(to_host(self.binding, value, ty)?)
    }

    pub fn to_script(&self, value: HostValue) -> ScriptValue {
        to_script(self.binding, value)
    }

    /// Call a script value with host arguments.
    ///
    /// Errors come back through the translator: a payload raised anywhere
    /// below arrives unchanged.
    pub fn call_function(&mut self, callee: &ScriptValue, args: Vec<HostValue>) -> BridgeResult<MultiValue> {
        let args = args.into_iter().map(|a| to_script(self.binding, a)).collect();
        self.ctx.call_value(callee, args).map_err(translate::catch)
    }

    /// Call a global function by name.
    pub fn call_global(&mut self, name: &str, args: Vec<HostValue>) -> BridgeResult<MultiValue> {
        let callee = self.ctx.global(name);
        self.call_function(&callee, args)
    }

    /// Build an error raising `payload` into script, with the current
    /// traceback.
    pub fn raise(&self, payload: impl Into<ScriptValue>) -> BridgeError {
        BridgeError::Script(ScriptException::new(payload.into(), Some(self.ctx.traceback())))
    }
}

/// Run a host body on behalf of a script call.
#[cfg_attr(feature = "profiling", profiling::function)]
pub(crate) fn dispatch<'i, F>(
    ctx: &mut CallContext<'i>,
    binding: &Rc<BindingContext>,
    name: &str,
    params: &[HostType],
    args: MultiValue,
    body: F,
) -> Result<MultiValue, ScriptError>
where
    F: FnOnce(&mut HostCall<'_, 'i>, Vec<HostValue>) -> BridgeResult<Vec<HostValue>>,
{
    if let Err(err) = ReentrancyGuard::for_context(ctx).admit(name) {
        return Err(translate::raise(ctx, err));
    }
    let host_args = match convert_args(binding, name, params, args) {
        Ok(host_args) => host_args,
        Err(err) => return Err(translate::raise(ctx, err)),
    };
    let result = {
        let mut call = HostCall::new(ctx, binding);
        body(&mut call, host_args)
    };
    match result {
        Ok(values) => Ok(values.into_iter().map(|v| to_script(binding, v)).collect()),
        Err(err) => Err(translate::raise(ctx, err)),
    }
}

/// Convert script arguments to `params`. Missing trailing arguments are nil.
fn convert_args(
    binding: &BindingContext,
    name: &str,
    params: &[HostType],
    args: MultiValue,
) -> BridgeResult<Vec<HostValue>> {
    if args.len() > params.len() {
        return Err(BindingError::ArgumentCount {
            function: name.to_string(),
            expected: params.len(),
            actual: args.len(),
        }
        .into());
    }
    let nil = ScriptValue::Nil;
    params
        .iter()
        .enumerate()
        .map(|(i, ty)| to_host(binding, args.get(i).unwrap_or(&nil), ty).map_err(BridgeError::from))
        .collect()
}
