//! The bridge: an interpreter plus the binding context its proxies share.

use std::rc::Rc;

use scriptbridge_core::{AnyUserData, Function, Interpreter, MultiValue, ScriptValue, Table};

use crate::binding::{BindingContext, BridgeConfig};
use crate::callback::{self, HostFunction};
use crate::convert::{to_host, to_script};
use crate::error::BridgeResult;
use crate::proxy::HostProxy;
use crate::registry::ClassInfo;
use crate::translate;
use crate::types::{HostObject, HostType, HostValue};

/// Entry point for embedding.
///
/// ```
/// use scriptbridge::{Bridge, HostFunction, HostType, HostValue};
///
/// let bridge = Bridge::new();
/// bridge
///     .register_global(HostFunction::new("twice", [HostType::I64], |_, args| {
///         Ok(vec![HostValue::Int(args[0].as_i64().unwrap_or(0) * 2)])
///     }))
///     .unwrap();
///
/// let out = bridge.call_global("twice", vec![HostValue::Int(21)]).unwrap();
/// assert_eq!(out[0].as_integer(), Some(42));
/// ```
pub struct Bridge {
    interpreter: Interpreter,
    binding: Rc<BindingContext>,
}

impl Bridge {
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        Self {
            interpreter: Interpreter::with_config(config.interpreter.clone()),
            binding: Rc::new(BindingContext::new(&config)),
        }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn binding(&self) -> &Rc<BindingContext> {
        &self.binding
    }

    pub fn globals(&self) -> Table {
        self.interpreter.globals()
    }

    /// Expose a class's static surface as a global named after the class.
    pub fn register_class(&self, class: &Rc<ClassInfo>) -> BridgeResult<()> {
        self.register_class_as(class.name(), class)
    }

    pub fn register_class_as(&self, name: &str, class: &Rc<ClassInfo>) -> BridgeResult<()> {
        tracing::debug!(class = class.name(), global = name, "registering class");
        self.globals().set(name, self.wrap_class(class.clone()))?;
        Ok(())
    }

    /// The script value for a host object. Wrapping the same live object
    /// again returns the same proxy.
    ///
    /// The proxy does not keep `object` alive; the caller must hold a handle
    /// for as long as script uses it.
    pub fn wrap_object(&self, object: HostObject) -> ScriptValue {
        to_script(&self.binding, HostValue::Object(object))
    }

    /// A fresh type proxy for `class`.
    pub fn wrap_class(&self, class: Rc<ClassInfo>) -> ScriptValue {
        ScriptValue::UserData(AnyUserData::new(HostProxy::for_type(class, self.binding.clone())))
    }

    /// A script function running `function` through the host call path.
    pub fn create_function(&self, function: HostFunction) -> Function {
        let binding = self.binding.clone();
        self.interpreter
            .create_host_function(function.name().to_string(), move |ctx, args| {
                callback::dispatch(ctx, &binding, function.name(), function.params(), args, |call, host_args| {
                    (function.body())(call, host_args)
                })
            })
    }

    /// Store a host function in `table` under its name.
    pub fn register_function(&self, table: &Table, function: HostFunction) -> BridgeResult<()> {
        tracing::debug!(function = function.name(), arity = function.arity(), "registering function");
        let name = function.name().to_string();
        table.set(name, self.create_function(function))?;
        Ok(())
    }

    pub fn register_global(&self, function: HostFunction) -> BridgeResult<()> {
        self.register_function(&self.globals(), function)
    }

    /// Call a script function from the host.
    pub fn call(&self, function: &Function, args: Vec<HostValue>) -> BridgeResult<MultiValue> {
        let args = args.into_iter().map(|a| to_script(&self.binding, a)).collect();
        self.interpreter.call(function, args).map_err(translate::catch)
    }

    /// Call a global by name. Calling a non-function is a script error.
    pub fn call_global(&self, name: &str, args: Vec<HostValue>) -> BridgeResult<MultiValue> {
        let callee = self.globals().get(name);
        let args = args.into_iter().map(|a| to_script(&self.binding, a)).collect();
        self.interpreter
            .context()
            .call_value(&callee, args)
            .map_err(translate::catch)
    }

    pub fn to_host(&self, value: &ScriptValue, ty: &HostType) -> BridgeResult<HostValue> {
        Ok(to_host(&self.binding, value, ty)?)
    }

    pub fn to_script(&self, value: HostValue) -> ScriptValue {
        to_script(&self.binding, value)
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("interpreter", &self.interpreter)
            .field("binding", &self.binding)
            .finish()
    }
}
