//! Member resolution against class metadata.

use bitflags::bitflags;
use scriptbridge_core::ScriptValue;

use crate::registry::{ClassInfo, MemberDescriptor};

bitflags! {
    /// Which members a lookup may see.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BindingFlags: u8 {
        const STATIC = 0x01;
        const INSTANCE = 0x02;
        const PUBLIC = 0x04;
        const NON_PUBLIC = 0x08;
    }
}

impl BindingFlags {
    /// Static, public members: the surface of a type proxy.
    pub fn type_access() -> Self {
        BindingFlags::STATIC | BindingFlags::PUBLIC
    }

    /// Instance, public members: the surface of an instance proxy.
    pub fn instance_access() -> Self {
        BindingFlags::INSTANCE | BindingFlags::PUBLIC
    }

    fn admits(self, member: &MemberDescriptor) -> bool {
        let scope = if member.is_static() {
            BindingFlags::STATIC
        } else {
            BindingFlags::INSTANCE
        };
        let visibility = if member.is_public() {
            BindingFlags::PUBLIC
        } else {
            BindingFlags::NON_PUBLIC
        };
        self.contains(scope) && self.contains(visibility)
    }
}

/// A script-side lookup key.
///
/// Strings name members. Numbers address indexed properties. Every other
/// value kind is unsupported and resolves to nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupKey {
    Name(String),
    Index(f64),
}

impl LookupKey {
    pub fn from_value(key: &ScriptValue) -> Option<Self> {
        match key {
            ScriptValue::String(s) => Some(LookupKey::Name(s.clone())),
            ScriptValue::Integer(i) => Some(LookupKey::Index(*i as f64)),
            ScriptValue::Number(n) => Some(LookupKey::Index(*n)),
            _ => None,
        }
    }

    /// The key as shown in diagnostics.
    pub fn display(&self) -> String {
        match self {
            LookupKey::Name(name) => name.clone(),
            LookupKey::Index(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            LookupKey::Index(n) => n.to_string(),
        }
    }
}

/// Enumerates the members of a class that match a key under fixed flags.
///
/// Overloads are returned together, in declaration order; choosing among
/// them is left to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binder {
    flags: BindingFlags,
}

impl Binder {
    pub fn new(flags: BindingFlags) -> Self {
        Self { flags }
    }

    pub fn flags(&self) -> BindingFlags {
        self.flags
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve<'c>(&self, class: &'c ClassInfo, key: &LookupKey) -> Vec<&'c MemberDescriptor> {
        let candidates: Vec<&MemberDescriptor> = match key {
            LookupKey::Name(name) => class.members_named(name).collect(),
            LookupKey::Index(_) => class.indexers().collect(),
        };
        candidates
            .into_iter()
            .filter(|m| self.flags.admits(m))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ClassBuilder;
    use crate::types::{HostType, HostValue};
    use std::rc::Rc;

    struct Sample {
        value: i64,
    }

    fn sample_class() -> Rc<ClassInfo> {
        ClassBuilder::<Sample>::new("Sample")
            .static_method("Create", [], |_, _| Ok(vec![]))
            .static_method("Create", [HostType::I64], |_, _| Ok(vec![]))
            .readonly_field("Value", HostType::I64, |s| HostValue::Int(s.value))
            .readonly_field("Secret", HostType::I64, |s| HostValue::Int(s.value))
            .non_public()
            .indexer("Item", HostType::I64, 1, |s, _| Ok(HostValue::Int(s.value)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_type_access_sees_static_members_only() {
        let class = sample_class();
        let binder = Binder::new(BindingFlags::type_access());
        let key = LookupKey::Name("Create".into());
        assert_eq!(binder.resolve(&class, &key).len(), 2);
        assert!(binder.resolve(&class, &LookupKey::Name("Value".into())).is_empty());
    }

    #[test]
    fn test_instance_access_hides_non_public() {
        let class = sample_class();
        let binder = Binder::new(BindingFlags::instance_access());
        assert_eq!(binder.resolve(&class, &LookupKey::Name("Value".into())).len(), 1);
        assert!(binder.resolve(&class, &LookupKey::Name("Secret".into())).is_empty());

        let all = Binder::new(BindingFlags::instance_access() | BindingFlags::NON_PUBLIC);
        assert_eq!(all.resolve(&class, &LookupKey::Name("Secret".into())).len(), 1);
    }

    #[test]
    fn test_number_keys_resolve_to_indexers() {
        let class = sample_class();
        let binder = Binder::new(BindingFlags::instance_access());
        let found = binder.resolve(&class, &LookupKey::Index(1.0));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "Item");
    }

    #[test]
    fn test_unsupported_key_kinds() {
        assert_eq!(LookupKey::from_value(&ScriptValue::Boolean(true)), None);
        assert_eq!(LookupKey::from_value(&ScriptValue::Nil), None);
        assert_eq!(
            LookupKey::from_value(&ScriptValue::Integer(2)),
            Some(LookupKey::Index(2.0))
        );
        assert_eq!(LookupKey::Index(2.0).display(), "2");
    }
}
