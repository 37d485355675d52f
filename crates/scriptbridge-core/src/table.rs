//! Shared script tables.

use std::cell::RefCell;
use std::rc::Rc;

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use crate::error::ScriptError;
use crate::value::{ScriptValue, float_to_integer};

/// Hashable identity of a table key.
///
/// Integral floats normalise to `Integer` so `t[1]` and `t[1.0]` address the
/// same slot. Shared objects key by address; the entry keeps the key value
/// alive, so the address stays valid for as long as the entry exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TableKey {
    Boolean(bool),
    Integer(i64),
    Float(OrderedFloat<f64>),
    String(String),
    Ref(usize),
}

impl TableKey {
    fn from_value(key: &ScriptValue) -> Result<Self, ScriptError> {
        Ok(match key {
            ScriptValue::Nil => return Err(ScriptError::new("table index is nil")),
            ScriptValue::Boolean(b) => TableKey::Boolean(*b),
            ScriptValue::Integer(i) => TableKey::Integer(*i),
            ScriptValue::Number(n) if n.is_nan() => {
                return Err(ScriptError::new("table index is NaN"));
            }
            ScriptValue::Number(n) => match float_to_integer(*n) {
                Some(i) => TableKey::Integer(i),
                None => TableKey::Float(OrderedFloat(*n)),
            },
            ScriptValue::String(s) => TableKey::String(s.clone()),
            ScriptValue::Function(f) => TableKey::Ref(f.addr()),
            ScriptValue::Table(t) => TableKey::Ref(t.addr()),
            ScriptValue::UserData(u) => TableKey::Ref(u.addr()),
        })
    }
}

#[derive(Default)]
struct TableData {
    entries: FxHashMap<TableKey, (ScriptValue, ScriptValue)>,
}

/// A shared, mutable script table.
///
/// Cloning a `Table` clones the handle; both handles see the same entries.
#[derive(Clone, Default)]
pub struct Table(Rc<RefCell<TableData>>);

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table whose entries `1..=n` hold `values` in order.
    pub fn from_sequence<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ScriptValue>,
    {
        let table = Table::new();
        {
            let mut data = table.0.borrow_mut();
            for (i, value) in values.into_iter().enumerate() {
                let value = value.into();
                if value.is_nil() {
                    continue;
                }
                let index = i as i64 + 1;
                data.entries.insert(
                    TableKey::Integer(index),
                    (ScriptValue::Integer(index), value),
                );
            }
        }
        table
    }

    /// Read an entry. Keys that can never be stored (nil, NaN) read as nil.
    pub fn get(&self, key: impl Into<ScriptValue>) -> ScriptValue {
        let key = key.into();
        match TableKey::from_value(&key) {
            Ok(k) => self
                .0
                .borrow()
                .entries
                .get(&k)
                .map(|(_, v)| v.clone())
                .unwrap_or_default(),
            Err(_) => ScriptValue::Nil,
        }
    }

    /// Write an entry. Assigning nil removes the entry.
    pub fn set(
        &self,
        key: impl Into<ScriptValue>,
        value: impl Into<ScriptValue>,
    ) -> Result<(), ScriptError> {
        let key = key.into();
        let value = value.into();
        let k = TableKey::from_value(&key)?;
        let mut data = self.0.borrow_mut();
        if value.is_nil() {
            data.entries.remove(&k);
        } else {
            data.entries.insert(k, (key, value));
        }
        Ok(())
    }

    pub fn contains_key(&self, key: impl Into<ScriptValue>) -> bool {
        !self.get(key).is_nil()
    }

    /// The length of the sequence part: the last `n` such that `1..=n` are
    /// all present.
    pub fn raw_len(&self) -> usize {
        let data = self.0.borrow();
        let mut n = 0usize;
        while data.entries.contains_key(&TableKey::Integer(n as i64 + 1)) {
            n += 1;
        }
        n
    }

    /// The values at `1..=raw_len()`, in order.
    pub fn sequence_values(&self) -> Vec<ScriptValue> {
        let data = self.0.borrow();
        let mut out = Vec::new();
        let mut i = 1i64;
        while let Some((_, v)) = data.entries.get(&TableKey::Integer(i)) {
            out.push(v.clone());
            i += 1;
        }
        out
    }

    /// All key/value pairs. Iteration order is unspecified.
    pub fn pairs(&self) -> Vec<(ScriptValue, ScriptValue)> {
        self.0.borrow().entries.values().cloned().collect()
    }

    pub fn len_entries(&self) -> usize {
        self.0.borrow().entries.len()
    }

    pub fn ptr_eq(&self, other: &Table) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// The address identifying this table.
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_keys_normalise_to_integers() {
        let t = Table::new();
        t.set(1.0, "one").unwrap();
        assert_eq!(t.get(1), ScriptValue::from("one"));
        t.set(1.5, "half").unwrap();
        assert_eq!(t.get(1.5), ScriptValue::from("half"));
        assert_eq!(t.len_entries(), 2);
    }

    #[test]
    fn test_nil_and_nan_keys_rejected() {
        let t = Table::new();
        assert!(t.set(ScriptValue::Nil, 1).is_err());
        assert!(t.set(f64::NAN, 1).is_err());
        assert!(t.get(ScriptValue::Nil).is_nil());
    }

    #[test]
    fn test_assigning_nil_removes() {
        let t = Table::new();
        t.set("a", 1).unwrap();
        t.set("a", ScriptValue::Nil).unwrap();
        assert!(!t.contains_key("a"));
        assert_eq!(t.len_entries(), 0);
    }

    #[test]
    fn test_sequence_border() {
        let t = Table::from_sequence(["a", "b", "c"]);
        assert_eq!(t.raw_len(), 3);
        t.set(5, "e").unwrap();
        assert_eq!(t.raw_len(), 3);
        assert_eq!(
            t.sequence_values(),
            vec![
                ScriptValue::from("a"),
                ScriptValue::from("b"),
                ScriptValue::from("c")
            ]
        );
    }

    #[test]
    fn test_reference_keys_by_identity() {
        let t = Table::new();
        let k1 = Table::new();
        let k2 = Table::new();
        t.set(k1.clone(), 1).unwrap();
        assert_eq!(t.get(k1), ScriptValue::Integer(1));
        assert!(t.get(k2).is_nil());
    }

    #[test]
    fn test_handles_share_entries() {
        let a = Table::new();
        let b = a.clone();
        a.set("x", 10).unwrap();
        assert_eq!(b.get("x"), ScriptValue::Integer(10));
        assert!(a.ptr_eq(&b));
    }
}
