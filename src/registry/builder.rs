//! ClassBuilder for registering host types.
//!
//! ClassBuilder provides a fluent API for describing a Rust type's script
//! surface: constructor, methods, properties, fields and string conversion.
//! The result is an immutable [`ClassInfo`] that the binder reads.
//!
//! # Example
//!
//! ```
//! use scriptbridge::{ClassBuilder, HostType, HostValue};
//!
//! #[derive(Default)]
//! struct Counter {
//!     count: i64,
//! }
//!
//! let class = ClassBuilder::<Counter>::new("Counter")
//!     .constructor(Counter::default)
//!     .field("Count", HostType::I64, |c| HostValue::Int(c.count), |c, v| {
//!         c.count = v.as_i64().unwrap_or_default();
//!         Ok(())
//!     })
//!     .method("Increment", [], |_, this, _| {
//!         this.borrow_mut::<Counter>()?.count += 1;
//!         Ok(vec![])
//!     })
//!     .to_string(|c| format!("Counter({})", c.count))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(class.name(), "Counter");
//! ```

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::callback::HostCall;
use crate::error::{BindingError, BridgeResult, RegistrationError};
use crate::registry::class::{ClassId, ClassInfo, ConstructorFn, DisplayFn};
use crate::registry::member::{
    FieldInfo, GetterFn, MemberDescriptor, MemberFlags, MethodInfo, PropertyInfo, SetterFn,
};
use crate::types::{HostObject, HostType, HostValue};

/// Builder for one host class.
///
/// Members are public unless followed by [`non_public`](Self::non_public).
pub struct ClassBuilder<T: Any> {
    name: String,
    members: Vec<MemberDescriptor>,
    constructor: Option<Rc<ConstructorFn>>,
    display: Option<Rc<DisplayFn>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any> ClassBuilder<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            constructor: None,
            display: None,
            _marker: PhantomData,
        }
    }

    /// Default constructor, used when a table converts to this class.
    pub fn constructor<F>(mut self, f: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        self.constructor = Some(Rc::new(move || -> Rc<RefCell<dyn Any>> {
            Rc::new(RefCell::new(f()))
        }));
        self
    }

    /// Instance method. Arguments arrive converted to `params`.
    pub fn method<F>(mut self, name: &str, params: impl IntoIterator<Item = HostType>, f: F) -> Self
    where
        F: Fn(&mut HostCall<'_, '_>, &HostObject, Vec<HostValue>) -> BridgeResult<Vec<HostValue>>
            + 'static,
    {
        let (class, member) = (self.name.clone(), name.to_string());
        self.members.push(MemberDescriptor::Method(MethodInfo {
            name: name.to_string(),
            params: params.into_iter().collect(),
            flags: MemberFlags::PUBLIC,
            body: Rc::new(move |call, receiver, args| {
                let this = require_receiver(receiver, &class, &member)?;
                f(call, this, args)
            }),
        }));
        self
    }

    pub fn static_method<F>(
        mut self,
        name: &str,
        params: impl IntoIterator<Item = HostType>,
        f: F,
    ) -> Self
    where
        F: Fn(&mut HostCall<'_, '_>, Vec<HostValue>) -> BridgeResult<Vec<HostValue>> + 'static,
    {
        self.members.push(MemberDescriptor::Method(MethodInfo {
            name: name.to_string(),
            params: params.into_iter().collect(),
            flags: MemberFlags::PUBLIC | MemberFlags::STATIC,
            body: Rc::new(move |call, _, args| f(call, args)),
        }));
        self
    }

    /// Read/write instance property.
    pub fn property<G, S>(self, name: &str, ty: HostType, get: G, set: S) -> Self
    where
        G: Fn(&T) -> HostValue + 'static,
        S: Fn(&mut T, HostValue) -> BridgeResult<()> + 'static,
    {
        let getter = self.instance_getter(name, get);
        let setter = self.instance_setter(name, set);
        self.push_property(name, ty, 0, Some(getter), Some(setter))
    }

    pub fn readonly_property<G>(self, name: &str, ty: HostType, get: G) -> Self
    where
        G: Fn(&T) -> HostValue + 'static,
    {
        let getter = self.instance_getter(name, get);
        self.push_property(name, ty, 0, Some(getter), None)
    }

    pub fn writeonly_property<S>(self, name: &str, ty: HostType, set: S) -> Self
    where
        S: Fn(&mut T, HostValue) -> BridgeResult<()> + 'static,
    {
        let setter = self.instance_setter(name, set);
        self.push_property(name, ty, 0, None, Some(setter))
    }

    /// Indexed property taking `arity` index arguments.
    ///
    /// Indexers are registered for reflection only; plain indexing cannot
    /// reach them.
    pub fn indexer<G>(self, name: &str, ty: HostType, arity: usize, get: G) -> Self
    where
        G: Fn(&T, &[HostValue]) -> BridgeResult<HostValue> + 'static,
    {
        let (class, member) = (self.name.clone(), name.to_string());
        let getter: Rc<GetterFn> = Rc::new(move |receiver, index| {
            let this = require_receiver(receiver, &class, &member)?;
            let value = this.borrow::<T>()?;
            get(&value, index)
        });
        self.push_property(name, ty, arity.max(1), Some(getter), None)
    }

    /// Read-only static property.
    pub fn static_property<G>(mut self, name: &str, ty: HostType, get: G) -> Self
    where
        G: Fn() -> HostValue + 'static,
    {
        self.members.push(MemberDescriptor::Property(PropertyInfo {
            name: name.to_string(),
            ty,
            flags: MemberFlags::PUBLIC | MemberFlags::STATIC,
            indexer_arity: 0,
            getter: Some(Rc::new(move |_, _| Ok(get()))),
            setter: None,
        }));
        self
    }

    /// Mutable instance field.
    pub fn field<G, S>(mut self, name: &str, ty: HostType, get: G, set: S) -> Self
    where
        G: Fn(&T) -> HostValue + 'static,
        S: Fn(&mut T, HostValue) -> BridgeResult<()> + 'static,
    {
        self.members.push(MemberDescriptor::Field(FieldInfo {
            name: name.to_string(),
            ty,
            flags: MemberFlags::PUBLIC,
            get: Rc::new(move |this| Ok(get(&*this.borrow::<T>()?))),
            set: Some(Rc::new(move |this, value| set(&mut *this.borrow_mut::<T>()?, value))),
        }));
        self
    }

    /// Immutable instance field.
    pub fn readonly_field<G>(mut self, name: &str, ty: HostType, get: G) -> Self
    where
        G: Fn(&T) -> HostValue + 'static,
    {
        self.members.push(MemberDescriptor::Field(FieldInfo {
            name: name.to_string(),
            ty,
            flags: MemberFlags::PUBLIC,
            get: Rc::new(move |this| Ok(get(&*this.borrow::<T>()?))),
            set: None,
        }));
        self
    }

    /// The class's own string conversion.
    pub fn to_string<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> String + 'static,
    {
        self.display = Some(Rc::new(move |object| {
            object.borrow::<T>().ok().map(|value| f(&value))
        }));
        self
    }

    /// Hide the most recently added member from public lookups.
    pub fn non_public(mut self) -> Self {
        if let Some(last) = self.members.last_mut() {
            last.flags_mut().remove(MemberFlags::PUBLIC);
        }
        self
    }

    /// Validate the members and freeze them into a [`ClassInfo`].
    ///
    /// Methods may share a name (overloads). Any other name collision is a
    /// [`RegistrationError::DuplicateMember`].
    pub fn build(self) -> Result<Rc<ClassInfo>, RegistrationError> {
        if self.name.trim().is_empty() {
            return Err(RegistrationError::InvalidName(self.name));
        }

        let mut by_name: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        let mut indexers = Vec::new();
        for (i, member) in self.members.iter().enumerate() {
            if member.name().trim().is_empty() {
                return Err(RegistrationError::InvalidName(member.name().to_string()));
            }
            let slots = by_name.entry(member.name().to_string()).or_default();
            let clashes = slots.iter().any(|&j| {
                !(self.members[j].as_method().is_some() && member.as_method().is_some())
            });
            if clashes {
                return Err(RegistrationError::DuplicateMember {
                    class: self.name,
                    member: member.name().to_string(),
                });
            }
            slots.push(i);
            if member.as_property().is_some_and(PropertyInfo::is_indexer) {
                indexers.push(i);
            }
        }

        tracing::debug!(
            class = %self.name,
            members = self.members.len(),
            indexers = indexers.len(),
            "registered class"
        );

        Ok(Rc::new(ClassInfo {
            id: ClassId::from_name(&self.name),
            name: self.name,
            rust_type: TypeId::of::<T>(),
            members: self.members,
            by_name,
            indexers,
            constructor: self.constructor,
            display: self.display,
        }))
    }

    fn instance_getter<G>(&self, name: &str, get: G) -> Rc<GetterFn>
    where
        G: Fn(&T) -> HostValue + 'static,
    {
        let (class, member) = (self.name.clone(), name.to_string());
        Rc::new(move |receiver, _| {
            let this = require_receiver(receiver, &class, &member)?;
            Ok(get(&*this.borrow::<T>()?))
        })
    }

    fn instance_setter<S>(&self, name: &str, set: S) -> Rc<SetterFn>
    where
        S: Fn(&mut T, HostValue) -> BridgeResult<()> + 'static,
    {
        let (class, member) = (self.name.clone(), name.to_string());
        Rc::new(move |receiver, _, value| {
            let this = require_receiver(receiver, &class, &member)?;
            set(&mut *this.borrow_mut::<T>()?, value)
        })
    }

    fn push_property(
        mut self,
        name: &str,
        ty: HostType,
        indexer_arity: usize,
        getter: Option<Rc<GetterFn>>,
        setter: Option<Rc<SetterFn>>,
    ) -> Self {
        self.members.push(MemberDescriptor::Property(PropertyInfo {
            name: name.to_string(),
            ty,
            flags: MemberFlags::PUBLIC,
            indexer_arity,
            getter,
            setter,
        }));
        self
    }
}

fn require_receiver<'a>(
    receiver: Option<&'a HostObject>,
    class: &str,
    member: &str,
) -> Result<&'a HostObject, BindingError> {
    receiver.ok_or_else(|| BindingError::MissingReceiver {
        class: class.to_string(),
        member: member.to_string(),
    })
}
