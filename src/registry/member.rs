//! Member descriptors: the closed set of host members a script can reach.

use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;

use crate::callback::HostCall;
use crate::error::{BindingError, BridgeResult};
use crate::types::{HostObject, HostType, HostValue};

bitflags! {
    /// Visibility of a registered member.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemberFlags: u8 {
        /// Belongs to the class rather than an instance.
        const STATIC = 0x01;
        /// Visible to ordinary lookups.
        const PUBLIC = 0x02;
    }
}

/// Erased method body. Static methods receive `None` as the receiver.
pub type MethodFn =
    dyn Fn(&mut HostCall<'_, '_>, Option<&HostObject>, Vec<HostValue>) -> BridgeResult<Vec<HostValue>>;

/// Erased property getter. The slice holds indexer arguments.
pub type GetterFn = dyn Fn(Option<&HostObject>, &[HostValue]) -> BridgeResult<HostValue>;

/// Erased property setter.
pub type SetterFn = dyn Fn(Option<&HostObject>, &[HostValue], HostValue) -> BridgeResult<()>;

/// Erased field accessors.
pub type FieldGetFn = dyn Fn(&HostObject) -> BridgeResult<HostValue>;
pub type FieldSetFn = dyn Fn(&HostObject, HostValue) -> BridgeResult<()>;

/// A callable member.
#[derive(Clone)]
pub struct MethodInfo {
    pub(crate) name: String,
    pub(crate) params: Vec<HostType>,
    pub(crate) flags: MemberFlags,
    pub(crate) body: Rc<MethodFn>,
}

impl MethodInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[HostType] {
        &self.params
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }

    pub(crate) fn body(&self) -> &Rc<MethodFn> {
        &self.body
    }
}

/// A property with an optional getter and setter.
///
/// `indexer_arity` is the number of index parameters; zero for plain
/// properties.
#[derive(Clone)]
pub struct PropertyInfo {
    pub(crate) name: String,
    pub(crate) ty: HostType,
    pub(crate) flags: MemberFlags,
    pub(crate) indexer_arity: usize,
    pub(crate) getter: Option<Rc<GetterFn>>,
    pub(crate) setter: Option<Rc<SetterFn>>,
}

impl PropertyInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &HostType {
        &self.ty
    }

    pub fn has_getter(&self) -> bool {
        self.getter.is_some()
    }

    pub fn has_setter(&self) -> bool {
        self.setter.is_some()
    }

    pub fn indexer_arity(&self) -> usize {
        self.indexer_arity
    }

    pub fn is_indexer(&self) -> bool {
        self.indexer_arity > 0
    }

    pub(crate) fn get(&self, receiver: Option<&HostObject>, class: &str) -> BridgeResult<HostValue> {
        match &self.getter {
            Some(get) => get(receiver, &[]),
            None => Err(BindingError::WriteOnly {
                class: class.to_string(),
                member: self.name.clone(),
            }
            .into()),
        }
    }

    pub(crate) fn set(
        &self,
        receiver: Option<&HostObject>,
        value: HostValue,
        class: &str,
    ) -> BridgeResult<()> {
        match &self.setter {
            Some(set) => set(receiver, &[], value),
            None => Err(BindingError::ReadOnly {
                class: class.to_string(),
                member: self.name.clone(),
            }
            .into()),
        }
    }
}

/// A data field. Immutable fields have no setter.
#[derive(Clone)]
pub struct FieldInfo {
    pub(crate) name: String,
    pub(crate) ty: HostType,
    pub(crate) flags: MemberFlags,
    pub(crate) get: Rc<FieldGetFn>,
    pub(crate) set: Option<Rc<FieldSetFn>>,
}

impl FieldInfo {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &HostType {
        &self.ty
    }

    pub fn is_mutable(&self) -> bool {
        self.set.is_some()
    }
}

/// One host member, derived once at registration and never mutated.
#[derive(Clone)]
pub enum MemberDescriptor {
    Method(MethodInfo),
    Property(PropertyInfo),
    Field(FieldInfo),
}

impl MemberDescriptor {
    pub fn name(&self) -> &str {
        match self {
            MemberDescriptor::Method(m) => &m.name,
            MemberDescriptor::Property(p) => &p.name,
            MemberDescriptor::Field(f) => &f.name,
        }
    }

    pub fn flags(&self) -> MemberFlags {
        match self {
            MemberDescriptor::Method(m) => m.flags,
            MemberDescriptor::Property(p) => p.flags,
            MemberDescriptor::Field(f) => f.flags,
        }
    }

    pub fn is_static(&self) -> bool {
        self.flags().contains(MemberFlags::STATIC)
    }

    pub fn is_public(&self) -> bool {
        self.flags().contains(MemberFlags::PUBLIC)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            MemberDescriptor::Method(_) => "method",
            MemberDescriptor::Property(_) => "property",
            MemberDescriptor::Field(_) => "field",
        }
    }

    pub fn as_method(&self) -> Option<&MethodInfo> {
        match self {
            MemberDescriptor::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyInfo> {
        match self {
            MemberDescriptor::Property(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&FieldInfo> {
        match self {
            MemberDescriptor::Field(f) => Some(f),
            _ => None,
        }
    }

    pub(crate) fn flags_mut(&mut self) -> &mut MemberFlags {
        match self {
            MemberDescriptor::Method(m) => &mut m.flags,
            MemberDescriptor::Property(p) => &mut p.flags,
            MemberDescriptor::Field(f) => &mut f.flags,
        }
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberDescriptor::Method(m) => f
                .debug_struct("Method")
                .field("name", &m.name)
                .field("params", &m.params)
                .field("flags", &m.flags)
                .finish(),
            MemberDescriptor::Property(p) => f
                .debug_struct("Property")
                .field("name", &p.name)
                .field("ty", &p.ty)
                .field("getter", &p.has_getter())
                .field("setter", &p.has_setter())
                .field("indexer_arity", &p.indexer_arity)
                .finish(),
            MemberDescriptor::Field(x) => f
                .debug_struct("Field")
                .field("name", &x.name)
                .field("ty", &x.ty)
                .field("mutable", &x.is_mutable())
                .finish(),
        }
    }
}
