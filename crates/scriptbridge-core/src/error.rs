//! Raised script errors.

use std::fmt;

use crate::value::ScriptValue;

/// A value raised through the interpreter's error mechanism.
///
/// Any value can be raised, not only strings. The value is carried as-is:
/// raising a table and catching it yields the same table.
#[derive(Clone)]
pub struct ScriptError {
    value: ScriptValue,
    traceback: Option<String>,
}

impl ScriptError {
    /// Create an error without a traceback.
    pub fn new(value: impl Into<ScriptValue>) -> Self {
        Self {
            value: value.into(),
            traceback: None,
        }
    }

    pub fn with_traceback(value: impl Into<ScriptValue>, traceback: Option<String>) -> Self {
        Self {
            value: value.into(),
            traceback,
        }
    }

    /// The raised value.
    pub fn value(&self) -> &ScriptValue {
        &self.value
    }

    pub fn into_value(self) -> ScriptValue {
        self.value
    }

    pub fn traceback(&self) -> Option<&str> {
        self.traceback.as_deref()
    }

    pub fn into_parts(self) -> (ScriptValue, Option<String>) {
        (self.value, self.traceback)
    }

    /// The display message for the raised value.
    pub fn message(&self) -> String {
        payload_message(&self.value)
    }
}

/// The display message for a raised value: the string itself, or a
/// bracketed placeholder naming the value's kind.
pub fn payload_message(value: &ScriptValue) -> String {
    match value {
        ScriptValue::String(s) => s.clone(),
        other => other.kind().placeholder().to_string(),
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl fmt::Debug for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptError")
            .field("value", &self.value)
            .field("traceback", &self.traceback)
            .finish()
    }
}

impl std::error::Error for ScriptError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    #[test]
    fn test_string_payload_is_message() {
        let err = ScriptError::new("boom");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_non_string_payload_uses_placeholder() {
        let t = Table::new();
        let err = ScriptError::new(t.clone());
        assert_eq!(err.to_string(), "[Table]");
        assert!(err.value().as_table().unwrap().ptr_eq(&t));
        assert_eq!(ScriptError::new(42).to_string(), "[Number]");
    }
}
