//! The script value model.

use std::fmt;

use crate::function::Function;
use crate::table::Table;
use crate::userdata::AnyUserData;

/// Argument and result lists passed across calls.
pub type MultiValue = Vec<ScriptValue>;

/// A value held by the interpreter.
///
/// Scalars are plain values. Tables, functions and userdata are shared
/// handles: cloning a `ScriptValue` never copies the object behind them.
#[derive(Clone, Default)]
pub enum ScriptValue {
    /// The absent value.
    #[default]
    Nil,
    /// `true` or `false`.
    Boolean(bool),
    /// A number with an exact integer representation.
    Integer(i64),
    /// A floating point number.
    Number(f64),
    /// An immutable string.
    String(String),
    /// A callable.
    Function(Function),
    /// A shared table.
    Table(Table),
    /// An opaque host value.
    UserData(AnyUserData),
}

/// The kind of a [`ScriptValue`], as reported by the interpreter's `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Nil,
    Boolean,
    Number,
    String,
    Function,
    Table,
    UserData,
}

impl ValueKind {
    /// The interpreter's name for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Nil => "nil",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Function => "function",
            ValueKind::Table => "table",
            ValueKind::UserData => "userdata",
        }
    }

    /// The bracketed placeholder used when a value of this kind is shown in
    /// place of an error message, e.g. `[Table]`.
    pub fn placeholder(self) -> &'static str {
        match self {
            ValueKind::Nil => "[Nil]",
            ValueKind::Boolean => "[Boolean]",
            ValueKind::Number => "[Number]",
            ValueKind::String => "[String]",
            ValueKind::Function => "[Function]",
            ValueKind::Table => "[Table]",
            ValueKind::UserData => "[UserData]",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ScriptValue {
    /// Get the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            ScriptValue::Nil => ValueKind::Nil,
            ScriptValue::Boolean(_) => ValueKind::Boolean,
            ScriptValue::Integer(_) | ScriptValue::Number(_) => ValueKind::Number,
            ScriptValue::String(_) => ValueKind::String,
            ScriptValue::Function(_) => ValueKind::Function,
            ScriptValue::Table(_) => ValueKind::Table,
            ScriptValue::UserData(_) => ValueKind::UserData,
        }
    }

    /// Get the interpreter's type name for this value.
    pub fn type_name(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, ScriptValue::Nil)
    }

    /// Everything except `nil` and `false` is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, ScriptValue::Nil | ScriptValue::Boolean(false))
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            ScriptValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the value as an integer.
    ///
    /// Floats qualify only when they have an exact integer representation.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ScriptValue::Integer(i) => Some(*i),
            ScriptValue::Number(n) => float_to_integer(*n),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScriptValue::Integer(i) => Some(*i as f64),
            ScriptValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            ScriptValue::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            ScriptValue::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_userdata(&self) -> Option<&AnyUserData> {
        match self {
            ScriptValue::UserData(u) => Some(u),
            _ => None,
        }
    }

    /// Raw equality: scalars by value, shared objects by identity.
    ///
    /// Integers and floats compare numerically, so `1 == 1.0`.
    pub fn raw_equals(&self, other: &ScriptValue) -> bool {
        match (self, other) {
            (ScriptValue::Nil, ScriptValue::Nil) => true,
            (ScriptValue::Boolean(a), ScriptValue::Boolean(b)) => a == b,
            (ScriptValue::Integer(a), ScriptValue::Integer(b)) => a == b,
            (ScriptValue::Number(a), ScriptValue::Number(b)) => a == b,
            (ScriptValue::Integer(a), ScriptValue::Number(b))
            | (ScriptValue::Number(b), ScriptValue::Integer(a)) => (*a as f64) == *b,
            (ScriptValue::String(a), ScriptValue::String(b)) => a == b,
            (ScriptValue::Function(a), ScriptValue::Function(b)) => a.ptr_eq(b),
            (ScriptValue::Table(a), ScriptValue::Table(b)) => a.ptr_eq(b),
            (ScriptValue::UserData(a), ScriptValue::UserData(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// Convert a float to an integer when the conversion is exact.
pub(crate) fn float_to_integer(n: f64) -> Option<i64> {
    // 2^63 is exactly representable; anything at or above it overflows i64.
    if n.fract() == 0.0 && n >= -9_223_372_036_854_775_808.0 && n < 9_223_372_036_854_775_808.0 {
        Some(n as i64)
    } else {
        None
    }
}

impl PartialEq for ScriptValue {
    fn eq(&self, other: &Self) -> bool {
        self.raw_equals(other)
    }
}

impl fmt::Debug for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Nil => write!(f, "Nil"),
            ScriptValue::Boolean(b) => write!(f, "Boolean({})", b),
            ScriptValue::Integer(i) => write!(f, "Integer({})", i),
            ScriptValue::Number(n) => write!(f, "Number({})", n),
            ScriptValue::String(s) => write!(f, "String({:?})", s),
            ScriptValue::Function(func) => write!(f, "Function({:?})", func.name()),
            ScriptValue::Table(t) => write!(f, "Table(0x{:x})", t.addr()),
            ScriptValue::UserData(u) => write!(f, "UserData({})", u.type_name()),
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(v: bool) -> Self {
        ScriptValue::Boolean(v)
    }
}

impl From<i32> for ScriptValue {
    fn from(v: i32) -> Self {
        ScriptValue::Integer(v as i64)
    }
}

impl From<i64> for ScriptValue {
    fn from(v: i64) -> Self {
        ScriptValue::Integer(v)
    }
}

impl From<f64> for ScriptValue {
    fn from(v: f64) -> Self {
        ScriptValue::Number(v)
    }
}

impl From<&str> for ScriptValue {
    fn from(v: &str) -> Self {
        ScriptValue::String(v.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(v: String) -> Self {
        ScriptValue::String(v)
    }
}

impl From<Table> for ScriptValue {
    fn from(v: Table) -> Self {
        ScriptValue::Table(v)
    }
}

impl From<Function> for ScriptValue {
    fn from(v: Function) -> Self {
        ScriptValue::Function(v)
    }
}

impl From<AnyUserData> for ScriptValue {
    fn from(v: AnyUserData) -> Self {
        ScriptValue::UserData(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(ScriptValue::Nil.type_name(), "nil");
        assert_eq!(ScriptValue::Integer(3).type_name(), "number");
        assert_eq!(ScriptValue::Number(0.5).type_name(), "number");
        assert_eq!(ScriptValue::from("x").type_name(), "string");
        assert_eq!(ValueKind::Table.placeholder(), "[Table]");
    }

    #[test]
    fn test_integer_float_equality() {
        assert_eq!(ScriptValue::Integer(1), ScriptValue::Number(1.0));
        assert_ne!(ScriptValue::Integer(1), ScriptValue::Number(1.5));
        assert_ne!(ScriptValue::Integer(1), ScriptValue::from("1"));
    }

    #[test]
    fn test_as_integer_requires_exact_float() {
        assert_eq!(ScriptValue::Number(3.0).as_integer(), Some(3));
        assert_eq!(ScriptValue::Number(3.5).as_integer(), None);
        assert_eq!(ScriptValue::Number(f64::NAN).as_integer(), None);
        assert_eq!(ScriptValue::Number(1e300).as_integer(), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!ScriptValue::Nil.is_truthy());
        assert!(!ScriptValue::Boolean(false).is_truthy());
        assert!(ScriptValue::Integer(0).is_truthy());
        assert!(ScriptValue::from("").is_truthy());
    }

    #[test]
    fn test_tables_compare_by_identity() {
        let a = Table::new();
        let b = Table::new();
        assert_eq!(ScriptValue::Table(a.clone()), ScriptValue::Table(a));
        assert_ne!(ScriptValue::Table(Table::new()), ScriptValue::Table(b));
    }
}
