//! Script-side proxies for host types and instances.
//!
//! A proxy makes one host class (its static surface) or one host object (its
//! instance surface) indexable from script. Every access goes through the
//! binding context: the binder resolves candidates, the policy filters them,
//! and the converter marshals values.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use scriptbridge_core::{
    CallContext, Function, FunctionOrigin, MultiValue, ScriptError, ScriptValue, UserData,
};

use crate::binder::LookupKey;
use crate::binding::BindingContext;
use crate::callback;
use crate::convert::{to_host, to_script};
use crate::error::{BindingError, BridgeResult};
use crate::reentrancy::ReentrancyGuard;
use crate::registry::{ClassInfo, MemberDescriptor, MethodInfo};
use crate::translate;
use crate::types::{HostObject, WeakHostObject};

/// What a proxy wraps, resolved for one access.
#[derive(Debug, Clone)]
pub enum ProxyTarget {
    /// A class, exposing its static members.
    Type(Rc<ClassInfo>),
    /// An object, exposing its instance members.
    Instance(HostObject),
}

impl ProxyTarget {
    pub fn class(&self) -> &Rc<ClassInfo> {
        match self {
            ProxyTarget::Type(class) => class,
            ProxyTarget::Instance(object) => object.class(),
        }
    }

    pub fn receiver(&self) -> Option<&HostObject> {
        match self {
            ProxyTarget::Type(_) => None,
            ProxyTarget::Instance(object) => Some(object),
        }
    }

    /// Whether both targets denote the same class or the same object.
    pub fn same_target(&self, other: &ProxyTarget) -> bool {
        match (self, other) {
            (ProxyTarget::Type(a), ProxyTarget::Type(b)) => Rc::ptr_eq(a, b),
            (ProxyTarget::Instance(a), ProxyTarget::Instance(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// What a proxy holds. Instances are held weakly.
#[derive(Debug, Clone)]
enum Slot {
    Type(Rc<ClassInfo>),
    Instance(WeakHostObject),
}

impl Slot {
    fn resolve(&self) -> Result<ProxyTarget, BindingError> {
        match self {
            Slot::Type(class) => Ok(ProxyTarget::Type(class.clone())),
            Slot::Instance(weak) => weak.upgrade().map(ProxyTarget::Instance).ok_or_else(|| {
                BindingError::ObjectReleased {
                    class: weak.class().name().to_string(),
                }
            }),
        }
    }
}

/// A host type or instance as seen by script.
///
/// An instance proxy holds a weak handle: the host decides how long the
/// object lives, and a proxy outliving it reports
/// [`BindingError::ObjectReleased`]. Disposing the proxy detaches it; the
/// object lives on.
pub struct HostProxy {
    slot: RefCell<Option<Slot>>,
    binding: Rc<BindingContext>,
    type_name: String,
}

impl HostProxy {
    pub fn for_type(class: Rc<ClassInfo>, binding: Rc<BindingContext>) -> Self {
        Self::new(class.name().to_string(), Slot::Type(class), binding)
    }

    pub fn for_instance(object: &HostObject, binding: Rc<BindingContext>) -> Self {
        Self::new(
            object.class().name().to_string(),
            Slot::Instance(object.downgrade()),
            binding,
        )
    }

    fn new(type_name: String, slot: Slot, binding: Rc<BindingContext>) -> Self {
        Self {
            slot: RefCell::new(Some(slot)),
            binding,
            type_name,
        }
    }

    /// The wrapped target, or `None` once disposed or released.
    pub fn target(&self) -> Option<ProxyTarget> {
        self.slot.borrow().as_ref().and_then(|slot| slot.resolve().ok())
    }

    pub fn is_disposed(&self) -> bool {
        self.slot.borrow().is_none()
    }

    /// Whether the host has dropped the wrapped object.
    pub fn is_released(&self) -> bool {
        matches!(&*self.slot.borrow(), Some(Slot::Instance(weak)) if !weak.is_alive())
    }

    /// Detach the proxy from its target.
    pub fn dispose(&self) {
        if self.slot.borrow_mut().take().is_some() {
            tracing::trace!(type_name = %self.type_name, "proxy disposed");
        }
    }

    fn live_slot(&self) -> Result<Slot, BindingError> {
        self.slot.borrow().clone().ok_or_else(|| BindingError::Disposed {
            type_name: self.type_name.clone(),
        })
    }

    fn live_target(&self) -> Result<ProxyTarget, BindingError> {
        self.live_slot()?.resolve()
    }

    /// `proxy[key]`. Anything other than exactly one permitted member
    /// reads as nil.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn read(&self, key: &ScriptValue) -> BridgeResult<ScriptValue> {
        let slot = self.live_slot()?;
        let target = slot.resolve()?;
        let Some(key) = LookupKey::from_value(key) else {
            return Ok(ScriptValue::Nil);
        };
        let class = target.class();
        let members = self
            .binding
            .resolve(class, &key, matches!(target, ProxyTarget::Instance(_)));
        let [member] = members.as_slice() else {
            tracing::trace!(
                class = class.name(),
                key = %key.display(),
                candidates = members.len(),
                "no single member"
            );
            return Ok(ScriptValue::Nil);
        };

        match member {
            MemberDescriptor::Method(method) => Ok(ScriptValue::Function(bind_method(
                method,
                slot,
                &self.binding,
            ))),
            MemberDescriptor::Property(property) => {
                if property.is_indexer() {
                    return Err(BindingError::IndexerUnsupported {
                        class: class.name().to_string(),
                        member: property.name().to_string(),
                    }
                    .into());
                }
                let value = property.get(target.receiver(), class.name())?;
                Ok(to_script(&self.binding, value))
            }
            MemberDescriptor::Field(field) => {
                let object = target.receiver().ok_or_else(|| BindingError::MissingReceiver {
                    class: class.name().to_string(),
                    member: field.name().to_string(),
                })?;
                let value = (field.get)(object)?;
                Ok(to_script(&self.binding, value))
            }
        }
    }

    /// `proxy[key] = value`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn write(&self, key: &ScriptValue, value: &ScriptValue) -> BridgeResult<()> {
        let target = self.live_target()?;
        let class = target.class();
        let Some(key) = LookupKey::from_value(key) else {
            return Err(BindingError::MemberNotFound {
                class: class.name().to_string(),
                key: format!("<{} key>", key.kind()),
            }
            .into());
        };
        write_member(&self.binding, class, target.receiver(), &key, value)
    }

    /// Member access runs host getters and setters, so it is refused inside
    /// a coroutine like any other host call.
    fn admit(&self, ctx: &CallContext<'_>, key: &ScriptValue) -> BridgeResult<()> {
        let member = match key.as_str() {
            Some(name) => format!("{}.{}", self.type_name, name),
            None => self.type_name.clone(),
        };
        ReentrancyGuard::for_context(ctx).admit(&member)
    }

    fn equals_proxy(&self, other: &HostProxy) -> bool {
        match (self.target(), other.target()) {
            (Some(a), Some(b)) => a.same_target(&b),
            _ => false,
        }
    }

    fn display(&self) -> String {
        if self.is_disposed() {
            return format!("[disposed {}]", self.type_name);
        }
        match self.target() {
            Some(ProxyTarget::Instance(object)) => object
                .class()
                .display(&object)
                .unwrap_or_else(|| format!("[{}]", self.type_name)),
            Some(ProxyTarget::Type(_)) => format!("[type {}]", self.type_name),
            None => format!("[released {}]", self.type_name),
        }
    }
}

impl UserData for HostProxy {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn index(&self, ctx: &mut CallContext<'_>, key: &ScriptValue) -> Result<ScriptValue, ScriptError> {
        self.admit(ctx, key)
            .and_then(|()| self.read(key))
            .map_err(|err| translate::raise(ctx, err))
    }

    fn new_index(
        &self,
        ctx: &mut CallContext<'_>,
        key: &ScriptValue,
        value: ScriptValue,
    ) -> Result<(), ScriptError> {
        self.admit(ctx, key)
            .and_then(|()| self.write(key, &value))
            .map_err(|err| translate::raise(ctx, err))
    }

    fn equals(&self, other: &dyn UserData) -> Option<bool> {
        other
            .as_any()
            .downcast_ref::<HostProxy>()
            .map(|other| self.equals_proxy(other))
    }

    fn to_display(&self) -> Option<String> {
        Some(self.display())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl std::fmt::Debug for HostProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostProxy")
            .field("type_name", &self.type_name)
            .field("disposed", &self.is_disposed())
            .field("released", &self.is_released())
            .finish()
    }
}

/// Assign `value` to the single permitted member named by `key`.
///
/// Shared by proxy writes and table-to-object conversion.
pub(crate) fn write_member(
    binding: &BindingContext,
    class: &ClassInfo,
    receiver: Option<&HostObject>,
    key: &LookupKey,
    value: &ScriptValue,
) -> BridgeResult<()> {
    let members = binding.resolve(class, key, receiver.is_some());
    let [member] = members.as_slice() else {
        return Err(BindingError::MemberNotFound {
            class: class.name().to_string(),
            key: key.display(),
        }
        .into());
    };

    let incompatible = |expected: String| BindingError::IncompatibleValue {
        class: class.name().to_string(),
        member: member.name().to_string(),
        expected,
        actual: value.kind(),
    };

    match member {
        MemberDescriptor::Method(method) => Err(BindingError::ReadOnly {
            class: class.name().to_string(),
            member: method.name().to_string(),
        }
        .into()),
        MemberDescriptor::Property(property) => {
            if property.is_indexer() {
                return Err(BindingError::IndexerUnsupported {
                    class: class.name().to_string(),
                    member: property.name().to_string(),
                }
                .into());
            }
            if !property.has_setter() {
                return Err(BindingError::ReadOnly {
                    class: class.name().to_string(),
                    member: property.name().to_string(),
                }
                .into());
            }
            let converted = to_host(binding, value, property.ty())
                .map_err(|_| incompatible(property.ty().name()))?;
            property.set(receiver, converted, class.name())
        }
        MemberDescriptor::Field(field) => {
            let Some(set) = &field.set else {
                return Err(BindingError::ReadOnly {
                    class: class.name().to_string(),
                    member: field.name().to_string(),
                }
                .into());
            };
            let object = receiver.ok_or_else(|| BindingError::MissingReceiver {
                class: class.name().to_string(),
                member: field.name().to_string(),
            })?;
            let converted =
                to_host(binding, value, field.ty()).map_err(|_| incompatible(field.ty().name()))?;
            set(object, converted)
        }
    }
}

/// A host-origin function invoking `method` on the proxy's target.
///
/// Called as `obj:Method(x)` the first argument is the proxy itself and
/// there is one argument more than the method takes; that argument is
/// dropped so both call styles reach the method with the same arguments.
/// The function holds the target as weakly as the proxy does.
fn bind_method(method: &MethodInfo, slot: Slot, binding: &Rc<BindingContext>) -> Function {
    let method = method.clone();
    let binding = binding.clone();
    let name = match &slot {
        Slot::Type(class) => format!("{}.{}", class.name(), method.name()),
        Slot::Instance(weak) => format!("{}.{}", weak.class().name(), method.name()),
    };
    Function::new(name.clone(), FunctionOrigin::Host, move |ctx, mut args: MultiValue| {
        let target = slot
            .resolve()
            .map_err(|err| translate::raise(ctx, err.into()))?;
        if args.len() == method.params().len() + 1 && is_self_argument(args.first(), &target) {
            args.remove(0);
        }
        let receiver = target.receiver();
        callback::dispatch(ctx, &binding, &name, method.params(), args, |call, host_args| {
            (method.body())(call, receiver, host_args)
        })
    })
}

fn is_self_argument(arg: Option<&ScriptValue>, target: &ProxyTarget) -> bool {
    arg.and_then(ScriptValue::as_userdata)
        .and_then(|ud| ud.downcast_ref::<HostProxy>())
        .and_then(HostProxy::target)
        .is_some_and(|t| t.same_target(target))
}
