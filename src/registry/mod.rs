//! Reflection metadata for host classes.
//!
//! Each class is described once through [`ClassBuilder`]; the resulting
//! [`ClassInfo`] is immutable and shared by every proxy of that class.

mod builder;
mod class;
mod member;

pub use builder::ClassBuilder;
pub use class::{ClassId, ClassInfo};
pub use member::{
    FieldGetFn, FieldInfo, FieldSetFn, GetterFn, MemberDescriptor, MemberFlags, MethodFn,
    MethodInfo, PropertyInfo, SetterFn,
};
