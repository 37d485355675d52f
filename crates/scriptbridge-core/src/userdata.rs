//! Opaque host values.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::context::CallContext;
use crate::error::ScriptError;
use crate::value::ScriptValue;

/// Behaviour of an opaque host value inside the interpreter.
///
/// `index` and `new_index` back the `v.key` and `v.key = x` syntax. `equals`
/// and `to_display` are optional capabilities: returning `None` selects the
/// interpreter default (identity equality, `"<type name>: 0x…"`).
pub trait UserData: Any {
    /// Name shown in diagnostics.
    fn type_name(&self) -> &str;

    fn index(
        &self,
        ctx: &mut CallContext<'_>,
        key: &ScriptValue,
    ) -> Result<ScriptValue, ScriptError> {
        let _ = key;
        Err(ctx.runtime_error(format!("attempt to index a {} value", self.type_name())))
    }

    fn new_index(
        &self,
        ctx: &mut CallContext<'_>,
        key: &ScriptValue,
        value: ScriptValue,
    ) -> Result<(), ScriptError> {
        let _ = (key, value);
        Err(ctx.runtime_error(format!("attempt to index a {} value", self.type_name())))
    }

    fn equals(&self, other: &dyn UserData) -> Option<bool> {
        let _ = other;
        None
    }

    fn to_display(&self) -> Option<String> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// A shared handle to a [`UserData`] value.
#[derive(Clone)]
pub struct AnyUserData(Rc<dyn UserData>);

impl AnyUserData {
    pub fn new<T: UserData>(value: T) -> Self {
        Self(Rc::new(value))
    }

    /// Wrap an existing shared value without re-allocating it.
    pub fn from_rc(value: Rc<dyn UserData>) -> Self {
        Self(value)
    }

    pub fn as_rc(&self) -> &Rc<dyn UserData> {
        &self.0
    }

    pub fn type_name(&self) -> &str {
        self.0.type_name()
    }

    pub fn downcast_ref<T: UserData>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn is<T: UserData>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    pub fn ptr_eq(&self, other: &AnyUserData) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The address identifying this value.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for AnyUserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnyUserData({}: 0x{:x})", self.type_name(), self.addr())
    }
}
