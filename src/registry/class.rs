//! Immutable class metadata.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use xxhash_rust::xxh64::xxh64;

use crate::error::{ConversionError, RegistrationError};
use crate::registry::member::MemberDescriptor;
use crate::types::HostObject;

/// Domain marker mixed into class hashes.
const CLASS_SEED: u64 = 0x2fac10b63a6cc57c;

/// Stable identity of a registered class, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u64);

impl ClassId {
    pub fn from_name(name: &str) -> Self {
        ClassId(xxh64(name.as_bytes(), CLASS_SEED))
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

pub(crate) type ConstructorFn = dyn Fn() -> Rc<RefCell<dyn Any>>;
pub(crate) type DisplayFn = dyn Fn(&HostObject) -> Option<String>;

/// Reflection metadata for one host class.
///
/// Built once by [`ClassBuilder`](crate::ClassBuilder). Members keep their
/// declaration order; `by_name` maps each name to its positions so lookups
/// never scan the whole list.
pub struct ClassInfo {
    pub(crate) id: ClassId,
    pub(crate) name: String,
    pub(crate) rust_type: TypeId,
    pub(crate) members: Vec<MemberDescriptor>,
    pub(crate) by_name: FxHashMap<String, Vec<usize>>,
    pub(crate) indexers: Vec<usize>,
    pub(crate) constructor: Option<Rc<ConstructorFn>>,
    pub(crate) display: Option<Rc<DisplayFn>>,
}

impl ClassInfo {
    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    /// Members named `name`, in declaration order.
    pub fn members_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a MemberDescriptor> + 'a {
        self.by_name
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(move |&i| &self.members[i])
    }

    /// Indexed properties, in declaration order.
    pub fn indexers(&self) -> impl Iterator<Item = &MemberDescriptor> + '_ {
        self.indexers.iter().map(move |&i| &self.members[i])
    }

    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Whether values of Rust type `T` are instances of this class.
    pub fn holds<T: Any>(&self) -> bool {
        self.rust_type == TypeId::of::<T>()
    }

    /// Wrap an existing Rust value as an instance of this class.
    pub fn instantiate<T: Any>(self: &Rc<Self>, value: T) -> Result<HostObject, RegistrationError> {
        if !self.holds::<T>() {
            return Err(RegistrationError::TypeMismatch {
                class: self.name.clone(),
                actual: std::any::type_name::<T>(),
            });
        }
        let inner: Rc<RefCell<dyn Any>> = Rc::new(RefCell::new(value));
        Ok(HostObject::from_parts(self.clone(), inner))
    }

    /// Create a default instance through the registered constructor.
    pub fn construct(self: &Rc<Self>) -> Result<HostObject, ConversionError> {
        let ctor = self
            .constructor
            .as_ref()
            .ok_or_else(|| ConversionError::MissingConstructor {
                class: self.name.clone(),
            })?;
        Ok(HostObject::from_parts(self.clone(), ctor()))
    }

    /// The host's own string conversion, when registered.
    pub fn display(&self, object: &HostObject) -> Option<String> {
        self.display.as_ref().and_then(|f| f(object))
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("members", &self.members)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_id_deterministic() {
        assert_eq!(ClassId::from_name("Point"), ClassId::from_name("Point"));
        assert_ne!(ClassId::from_name("Point"), ClassId::from_name("point"));
    }
}
