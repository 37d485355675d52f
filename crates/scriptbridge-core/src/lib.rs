//! Script-side collaborator for the scriptbridge boundary.
//!
//! This crate holds the pieces of the embedded interpreter that the boundary
//! subsystem talks to:
//!
//! - [`ScriptValue`]: the tagged union of values a script can hold
//! - [`Table`] and [`Function`]: shared, reference-counted script objects
//! - [`UserData`]: the seam through which opaque host values are indexed,
//!   compared and stringified
//! - [`CallContext`]: call dispatch, carrying the [`ExecutionState`] that
//!   tells a callee whether it runs inside a coroutine
//! - [`ScriptError`]: a raised script value plus an optional traceback
//!
//! Bytecode execution, parsing and garbage collection are not part of this
//! crate. Script functions are closures tagged with [`FunctionOrigin::Script`].
//!
//! ## Example
//!
//! ```
//! use scriptbridge_core::{Interpreter, ScriptValue};
//!
//! let interp = Interpreter::new();
//! let double = interp.create_function("double", |_ctx, args| {
//!     let n = args.first().and_then(ScriptValue::as_integer).unwrap_or(0);
//!     Ok(vec![ScriptValue::Integer(n * 2)])
//! });
//! let out = interp.call(&double, vec![ScriptValue::Integer(21)]).unwrap();
//! assert_eq!(out, vec![ScriptValue::Integer(42)]);
//! ```

mod context;
mod coroutine;
mod error;
mod function;
mod interpreter;
mod table;
mod userdata;
mod value;

pub use context::{CallContext, ExecutionState};
pub use coroutine::{Coroutine, CoroutineStatus};
pub use error::{ScriptError, payload_message};
pub use function::{Function, FunctionOrigin, NativeFn};
pub use interpreter::{Interpreter, InterpreterConfig};
pub use table::Table;
pub use userdata::{AnyUserData, UserData};
pub use value::{MultiValue, ScriptValue, ValueKind};
