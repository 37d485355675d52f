//! Script/host boundary for an embedded interpreter.
//!
//! Host classes are described once with [`ClassBuilder`] and exposed to
//! script through [`HostProxy`] values. Script indexing resolves members with
//! a [`Binder`], filters them through a [`SecurityPolicy`], and converts
//! values with [`to_host`]/[`to_script`]. Host functions are registered with
//! [`Bridge::register_function`]; errors crossing the boundary keep their
//! original payload however many times they cross, and host calls are refused
//! while a coroutine is running.
//!
//! # Example
//!
//! ```
//! use scriptbridge::{Bridge, ClassBuilder, HostType, HostValue};
//!
//! struct Greeter;
//!
//! let class = ClassBuilder::<Greeter>::new("Greeter")
//!     .static_method("Greet", [HostType::String], |_, args| {
//!         let name = args[0].as_str().unwrap_or("nobody");
//!         Ok(vec![HostValue::from(format!("hello, {name}"))])
//!     })
//!     .build()
//!     .unwrap();
//!
//! let bridge = Bridge::new();
//! bridge.register_class(&class).unwrap();
//!
//! let interp = bridge.interpreter();
//! let mut ctx = interp.context();
//! let greeter = ctx.global("Greeter");
//! let out = ctx.invoke(&greeter, "Greet", vec!["world".into()]).unwrap();
//! assert_eq!(out[0].as_str(), Some("hello, world"));
//! ```

pub mod binder;
pub mod binding;
pub mod bridge;
pub mod callback;
pub mod convert;
pub mod error;
pub mod policy;
pub mod proxy;
pub mod reentrancy;
pub mod registry;
pub mod translate;
pub mod types;

pub use binder::{Binder, BindingFlags, LookupKey};
pub use binding::{BindingContext, BridgeConfig, ProxyCache};
pub use bridge::Bridge;
pub use callback::{HostCall, HostFn, HostFunction};
pub use convert::{natural_host_type, to_host, to_script};
pub use error::{
    BindingError, BridgeError, BridgeResult, ConversionError, RegistrationError, ScriptException,
};
pub use policy::{Decision, PermitAll, RuleSet, SecurityPolicy, default_policy};
pub use proxy::{HostProxy, ProxyTarget};
pub use reentrancy::{REENTRANCY_MESSAGE, ReentrancyGuard};
pub use registry::{
    ClassBuilder, ClassId, ClassInfo, FieldInfo, MemberDescriptor, MemberFlags, MethodInfo,
    PropertyInfo,
};
pub use translate::HostErrorObject;
pub use types::{HostObject, HostType, HostValue};

pub use scriptbridge_core::{
    AnyUserData, CallContext, ExecutionState, Function, Interpreter, MultiValue, ScriptError,
    ScriptValue, Table, ValueKind,
};
