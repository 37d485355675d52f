//! The host side of the boundary: declared types and runtime values.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use scriptbridge_core::ScriptValue;

use crate::error::BindingError;
use crate::registry::ClassInfo;

/// A declared host type: a parameter, property or field type.
#[derive(Clone)]
pub enum HostType {
    Void,
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    /// A homogeneous array.
    Array(Box<HostType>),
    /// An instance of a registered class.
    Object(Rc<ClassInfo>),
    /// `inner` or null.
    Nullable(Box<HostType>),
    /// A script table, passed through untouched.
    Table,
    /// A script function, passed through untouched.
    Function,
    /// Whatever the script passes.
    Any,
}

impl HostType {
    pub fn array(element: HostType) -> Self {
        HostType::Array(Box::new(element))
    }

    pub fn nullable(inner: HostType) -> Self {
        HostType::Nullable(Box::new(inner))
    }

    /// Whether nil converts to host null for this type.
    pub fn accepts_null(&self) -> bool {
        matches!(
            self,
            HostType::Nullable(_)
                | HostType::String
                | HostType::Array(_)
                | HostType::Object(_)
                | HostType::Table
                | HostType::Function
                | HostType::Any
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            HostType::I8
                | HostType::I16
                | HostType::I32
                | HostType::I64
                | HostType::U8
                | HostType::U16
                | HostType::U32
                | HostType::U64
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, HostType::F32 | HostType::F64)
    }

    /// The name used in diagnostics, e.g. `string[]` or `i32?`.
    pub fn name(&self) -> String {
        match self {
            HostType::Void => "void".into(),
            HostType::Bool => "bool".into(),
            HostType::I8 => "i8".into(),
            HostType::I16 => "i16".into(),
            HostType::I32 => "i32".into(),
            HostType::I64 => "i64".into(),
            HostType::U8 => "u8".into(),
            HostType::U16 => "u16".into(),
            HostType::U32 => "u32".into(),
            HostType::U64 => "u64".into(),
            HostType::F32 => "f32".into(),
            HostType::F64 => "f64".into(),
            HostType::String => "string".into(),
            HostType::Array(elem) => format!("{}[]", elem.name()),
            HostType::Object(class) => class.name().to_string(),
            HostType::Nullable(inner) => format!("{}?", inner.name()),
            HostType::Table => "table".into(),
            HostType::Function => "function".into(),
            HostType::Any => "any".into(),
        }
    }
}

impl PartialEq for HostType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostType::Array(a), HostType::Array(b)) => a == b,
            (HostType::Nullable(a), HostType::Nullable(b)) => a == b,
            (HostType::Object(a), HostType::Object(b)) => Rc::ptr_eq(a, b),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl fmt::Debug for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostType({})", self.name())
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// A value on the host side of the boundary.
#[derive(Clone, Default)]
pub enum HostValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Array(Vec<HostValue>),
    Object(HostObject),
    /// A class itself, exposed to script as its static surface.
    Class(Rc<ClassInfo>),
    /// A script value passed through without conversion.
    Script(ScriptValue),
}

impl HostValue {
    pub fn is_null(&self) -> bool {
        matches!(self, HostValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HostValue::Int(i) => Some(*i),
            HostValue::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            HostValue::UInt(u) => Some(*u),
            HostValue::Int(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Float(f) => Some(*f),
            HostValue::Int(i) => Some(*i as f64),
            HostValue::UInt(u) => Some(*u as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[HostValue]> {
        match self {
            HostValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&HostObject> {
        match self {
            HostValue::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_script(&self) -> Option<&ScriptValue> {
        match self {
            HostValue::Script(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Null => write!(f, "Null"),
            HostValue::Bool(b) => write!(f, "Bool({})", b),
            HostValue::Int(i) => write!(f, "Int({})", i),
            HostValue::UInt(u) => write!(f, "UInt({})", u),
            HostValue::Float(x) => write!(f, "Float({})", x),
            HostValue::Str(s) => write!(f, "Str({:?})", s),
            HostValue::Array(items) => f.debug_tuple("Array").field(items).finish(),
            HostValue::Object(o) => write!(f, "{:?}", o),
            HostValue::Class(c) => write!(f, "Class({})", c.name()),
            HostValue::Script(v) => write!(f, "Script({:?})", v),
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Null, HostValue::Null) => true,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Int(a), HostValue::Int(b)) => a == b,
            (HostValue::UInt(a), HostValue::UInt(b)) => a == b,
            (HostValue::Float(a), HostValue::Float(b)) => a == b,
            (HostValue::Str(a), HostValue::Str(b)) => a == b,
            (HostValue::Array(a), HostValue::Array(b)) => a == b,
            (HostValue::Object(a), HostValue::Object(b)) => a.ptr_eq(b),
            (HostValue::Class(a), HostValue::Class(b)) => Rc::ptr_eq(a, b),
            (HostValue::Script(a), HostValue::Script(b)) => a.raw_equals(b),
            _ => false,
        }
    }
}

impl From<bool> for HostValue {
    fn from(v: bool) -> Self {
        HostValue::Bool(v)
    }
}

impl From<i32> for HostValue {
    fn from(v: i32) -> Self {
        HostValue::Int(v as i64)
    }
}

impl From<i64> for HostValue {
    fn from(v: i64) -> Self {
        HostValue::Int(v)
    }
}

impl From<u32> for HostValue {
    fn from(v: u32) -> Self {
        HostValue::UInt(v as u64)
    }
}

impl From<u64> for HostValue {
    fn from(v: u64) -> Self {
        HostValue::UInt(v)
    }
}

impl From<f64> for HostValue {
    fn from(v: f64) -> Self {
        HostValue::Float(v)
    }
}

impl From<&str> for HostValue {
    fn from(v: &str) -> Self {
        HostValue::Str(v.to_string())
    }
}

impl From<String> for HostValue {
    fn from(v: String) -> Self {
        HostValue::Str(v)
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(v: Vec<HostValue>) -> Self {
        HostValue::Array(v)
    }
}

impl From<HostObject> for HostValue {
    fn from(v: HostObject) -> Self {
        HostValue::Object(v)
    }
}

impl From<ScriptValue> for HostValue {
    fn from(v: ScriptValue) -> Self {
        HostValue::Script(v)
    }
}

/// A shared handle to an instance of a registered class.
///
/// The host owns the instance; proxies only hold handles to it. Two handles
/// are the same object when [`HostObject::ptr_eq`] holds.
#[derive(Clone)]
pub struct HostObject {
    class: Rc<ClassInfo>,
    inner: Rc<RefCell<dyn Any>>,
}

impl HostObject {
    pub(crate) fn from_parts(class: Rc<ClassInfo>, inner: Rc<RefCell<dyn Any>>) -> Self {
        Self { class, inner }
    }

    pub fn class(&self) -> &Rc<ClassInfo> {
        &self.class
    }

    pub fn ptr_eq(&self, other: &HostObject) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The address identifying the underlying object.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }

    /// A handle that does not keep the object alive.
    pub fn downgrade(&self) -> WeakHostObject {
        WeakHostObject {
            class: self.class.clone(),
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Borrow the instance as `T`.
    pub fn borrow<T: Any>(&self) -> Result<Ref<'_, T>, BindingError> {
        let cell = self
            .inner
            .try_borrow()
            .map_err(|_| BindingError::ObjectBorrowed {
                class: self.class.name().to_string(),
            })?;
        Ref::filter_map(cell, |v| v.downcast_ref::<T>()).map_err(|_| {
            BindingError::InvalidReceiver {
                class: self.class.name().to_string(),
                expected: std::any::type_name::<T>(),
            }
        })
    }

    /// Mutably borrow the instance as `T`.
    pub fn borrow_mut<T: Any>(&self) -> Result<RefMut<'_, T>, BindingError> {
        let cell = self
            .inner
            .try_borrow_mut()
            .map_err(|_| BindingError::ObjectBorrowed {
                class: self.class.name().to_string(),
            })?;
        RefMut::filter_map(cell, |v| v.downcast_mut::<T>()).map_err(|_| {
            BindingError::InvalidReceiver {
                class: self.class.name().to_string(),
                expected: std::any::type_name::<T>(),
            }
        })
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostObject({}: 0x{:x})", self.class.name(), self.addr())
    }
}

/// A non-owning handle to a host object, as held by proxies.
///
/// The allocation stays reserved while any weak handle exists, so
/// [`WeakHostObject::addr`] cannot be reused by another object meanwhile.
#[derive(Clone)]
pub struct WeakHostObject {
    class: Rc<ClassInfo>,
    inner: Weak<RefCell<dyn Any>>,
}

impl WeakHostObject {
    pub fn class(&self) -> &Rc<ClassInfo> {
        &self.class
    }

    /// The object, if the host still holds it.
    pub fn upgrade(&self) -> Option<HostObject> {
        self.inner.upgrade().map(|inner| HostObject {
            class: self.class.clone(),
            inner,
        })
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    pub fn addr(&self) -> usize {
        self.inner.as_ptr() as *const () as usize
    }
}

impl fmt::Debug for WeakHostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WeakHostObject({}: 0x{:x}, alive: {})",
            self.class.name(),
            self.addr(),
            self.is_alive()
        )
    }
}
