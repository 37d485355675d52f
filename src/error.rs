//! Error types for the script/host boundary.
//!
//! ## Error Hierarchy
//!
//! ```text
//! BridgeError (top-level wrapper)
//! ├── BindingError       - member access contract violations
//! ├── ConversionError    - a script value has no coercion to a host type
//! ├── RegistrationError  - invalid class metadata
//! ├── ScriptException    - a value raised by script code
//! ├── Reentrancy         - host function called inside a coroutine
//! └── Host               - failure reported by a host callback
//! ```
//!
//! `BridgeError` is flat: an error re-raised across several boundary
//! crossings keeps its original variant and never gains a `source()` chain.

use scriptbridge_core::{ScriptError, ScriptValue, ValueKind, payload_message};
use thiserror::Error;

use crate::reentrancy::REENTRANCY_MESSAGE;

// ============================================================================
// Binding Errors
// ============================================================================

/// Capability mismatches when reading, writing or calling host members.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// No single permitted member matches the key.
    #[error("member '{key}' not found on '{class}'")]
    MemberNotFound { class: String, key: String },

    /// The property has no getter.
    #[error("property '{member}' on '{class}' is write-only")]
    WriteOnly { class: String, member: String },

    /// The property has no setter, or the field is immutable.
    #[error("member '{member}' on '{class}' is read-only")]
    ReadOnly { class: String, member: String },

    /// Indexed properties cannot be reached through plain indexing.
    #[error("indexed property '{member}' on '{class}' cannot be accessed by plain indexing")]
    IndexerUnsupported { class: String, member: String },

    /// A written value does not fit the member's declared type.
    #[error("cannot assign a {actual} value to '{member}' on '{class}': expected {expected}")]
    IncompatibleValue {
        class: String,
        member: String,
        expected: String,
        actual: ValueKind,
    },

    /// Too many arguments for a fixed-arity host function.
    #[error("'{function}' expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        function: String,
        expected: usize,
        actual: usize,
    },

    /// An instance member was invoked without an instance.
    #[error("instance member '{member}' on '{class}' requires a receiver")]
    MissingReceiver { class: String, member: String },

    /// A host object did not hold the Rust type a callback asked for.
    #[error("host object of class '{class}' is not a {expected}")]
    InvalidReceiver { class: String, expected: &'static str },

    /// A host object is already mutably borrowed.
    #[error("host object of class '{class}' is already borrowed")]
    ObjectBorrowed { class: String },

    /// The proxy was disposed.
    #[error("proxy for '{type_name}' has been disposed")]
    Disposed { type_name: String },

    /// The host dropped the object behind an instance proxy.
    #[error("host object of class '{class}' has been released")]
    ObjectReleased { class: String },
}

// ============================================================================
// Conversion Errors
// ============================================================================

/// A script value could not be coerced to a host type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The value's kind has no coercion to the target type.
    #[error("cannot convert a {actual} value (convertible to {convertible_to}) to {target}")]
    TypeMismatch {
        actual: ValueKind,
        convertible_to: String,
        target: String,
    },

    /// A number is outside the target type's range.
    #[error("number {value} is out of range for {target}")]
    OutOfRange { value: String, target: String },

    /// A float was given where an integer is required.
    #[error("number {value} has no integer representation for {target}")]
    NoIntegerRepresentation { value: f64, target: String },

    /// nil was given for a type that does not accept null.
    #[error("cannot convert nil to non-nullable {target}")]
    NilToNonNullable { target: String },

    /// A table element failed to convert. `index` is the script-side index.
    #[error(
        "cannot convert table to {target}: element at index {index} is a {actual} value \
         (convertible to {convertible_to}, not {element})"
    )]
    ArrayElement {
        target: String,
        index: usize,
        actual: ValueKind,
        convertible_to: String,
        element: String,
    },

    /// A table entry failed to populate a structured host value.
    #[error("cannot convert table to {class}: field '{key}': {reason}")]
    StructuredField {
        class: String,
        key: String,
        reason: String,
    },

    /// A structured conversion targeted a class without a constructor.
    #[error("cannot convert table to {class}: class has no constructor")]
    MissingConstructor { class: String },

    /// A wrapped host object belongs to another class.
    #[error("cannot convert {actual} object to {expected}")]
    ClassMismatch { expected: String, actual: String },
}

// ============================================================================
// Registration Errors
// ============================================================================

/// Invalid class metadata supplied to the class builder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// Two non-method members share a name.
    #[error("duplicate member '{member}' on class '{class}'")]
    DuplicateMember { class: String, member: String },

    /// A class or member name is empty.
    #[error("invalid name '{0}'")]
    InvalidName(String),

    /// A host object was created from a value of the wrong Rust type.
    #[error("class '{class}' does not hold values of type {actual}")]
    TypeMismatch { class: String, actual: &'static str },
}

// ============================================================================
// Script Exceptions
// ============================================================================

/// A value raised by script code, as seen by the host.
///
/// The message is the payload itself when it is a string, otherwise a
/// bracketed placeholder such as `[Table]`. The payload is the raised value,
/// unchanged. There is never an underlying `source()`.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ScriptException {
    message: String,
    payload: ScriptValue,
    traceback: Option<String>,
}

impl ScriptException {
    pub fn new(payload: ScriptValue, traceback: Option<String>) -> Self {
        Self {
            message: payload_message(&payload),
            payload,
            traceback,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The raised value.
    pub fn payload(&self) -> &ScriptValue {
        &self.payload
    }

    pub fn traceback(&self) -> Option<&str> {
        self.traceback.as_deref()
    }

    /// Turn back into an interpreter error carrying the same payload and
    /// traceback.
    pub fn into_script_error(self) -> ScriptError {
        ScriptError::with_traceback(self.payload, self.traceback)
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// The unified error type for boundary operations.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Script(#[from] ScriptException),

    /// A host function was invoked inside a coroutine.
    #[error("cannot call '{function}': {message}", message = REENTRANCY_MESSAGE)]
    Reentrancy { function: String },

    /// A failure reported by a host callback.
    #[error("{0}")]
    Host(String),
}

impl BridgeError {
    /// A failure reported by host code.
    pub fn host(message: impl Into<String>) -> Self {
        BridgeError::Host(message.into())
    }

    pub fn is_binding(&self) -> bool {
        matches!(self, BridgeError::Binding(_))
    }

    pub fn is_conversion(&self) -> bool {
        matches!(self, BridgeError::Conversion(_))
    }

    pub fn is_script(&self) -> bool {
        matches!(self, BridgeError::Script(_))
    }

    pub fn is_reentrancy(&self) -> bool {
        matches!(self, BridgeError::Reentrancy { .. })
    }

    /// The raised script value, for script exceptions.
    pub fn payload(&self) -> Option<&ScriptValue> {
        match self {
            BridgeError::Script(e) => Some(e.payload()),
            _ => None,
        }
    }
}

/// Result alias for boundary operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

// ============================================================================
// Tests
// ============================================================================
