//! Error translation at the script/host boundary.
//!
//! Going into script, a script exception is re-raised with its original
//! payload and traceback; any other host failure travels as a
//! [`HostErrorObject`]. Coming back to the host, a host error object is
//! unwrapped to the error it carries and anything else becomes a
//! [`ScriptException`]. Neither direction adds a layer, so an error that
//! crosses the boundary many times arrives exactly as it was first raised.

use std::any::Any;

use scriptbridge_core::{AnyUserData, CallContext, ScriptError, ScriptValue, UserData};

use crate::error::{BridgeError, ScriptException};

/// A host failure travelling through script code.
///
/// Script code sees an opaque value whose `message` field and display string
/// are the error message.
#[derive(Debug, Clone)]
pub struct HostErrorObject {
    error: BridgeError,
}

impl HostErrorObject {
    pub fn new(error: BridgeError) -> Self {
        Self { error }
    }

    pub fn error(&self) -> &BridgeError {
        &self.error
    }
}

impl UserData for HostErrorObject {
    fn type_name(&self) -> &str {
        "host error"
    }

    fn index(&self, _ctx: &mut CallContext<'_>, key: &ScriptValue) -> Result<ScriptValue, ScriptError> {
        Ok(match key.as_str() {
            Some("message") => ScriptValue::String(self.error.to_string()),
            _ => ScriptValue::Nil,
        })
    }

    fn to_display(&self) -> Option<String> {
        Some(self.error.to_string())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Turn a host failure into an error raised into script.
pub fn raise(ctx: &CallContext<'_>, error: BridgeError) -> ScriptError {
    match error {
        BridgeError::Script(exception) => {
            tracing::trace!(message = exception.message(), "re-raising script exception");
            exception.into_script_error()
        }
        other => {
            tracing::trace!(error = %other, "raising host error into script");
            ScriptError::with_traceback(
                AnyUserData::new(HostErrorObject::new(other)),
                Some(ctx.traceback()),
            )
        }
    }
}

/// Turn an error raised in script into a host error.
pub fn catch(error: ScriptError) -> BridgeError {
    let (payload, traceback) = error.into_parts();
    if let Some(host) = payload
        .as_userdata()
        .and_then(|ud| ud.downcast_ref::<HostErrorObject>())
    {
        return host.error.clone();
    }
    BridgeError::Script(ScriptException::new(payload, traceback))
}

impl From<ScriptError> for BridgeError {
    fn from(error: ScriptError) -> Self {
        catch(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BindingError;
    use scriptbridge_core::{Interpreter, Table};
    use std::error::Error as _;

    #[test]
    fn test_script_payload_survives_round_trip() {
        let interp = Interpreter::new();
        let ctx = interp.context();
        let table = Table::new();
        let original = ctx.raise(table.clone());

        let caught = catch(original);
        let reraised = raise(&ctx, caught);
        let caught_again = catch(reraised);

        assert!(caught_again.payload().unwrap().as_table().unwrap().ptr_eq(&table));
        assert_eq!(caught_again.to_string(), "[Table]");
        assert!(caught_again.source().is_none());
    }

    #[test]
    fn test_host_error_is_unwrapped() {
        let interp = Interpreter::new();
        let ctx = interp.context();
        let err = BridgeError::from(BindingError::MemberNotFound {
            class: "A".into(),
            key: "b".into(),
        });
        let raised = raise(&ctx, err.clone());
        assert_eq!(raised.value().type_name(), "userdata");
        let back = catch(raised);
        assert!(matches!(back, BridgeError::Binding(BindingError::MemberNotFound { .. })));
    }

    #[test]
    fn test_host_error_message_visible_to_script() {
        let interp = Interpreter::new();
        let mut ctx = interp.context();
        let raised = raise(&ctx, BridgeError::host("disk full"));
        let payload = raised.into_value();
        assert_eq!(ctx.to_display_string(&payload), "disk full");
        assert_eq!(
            ctx.index(&payload, &"message".into()).unwrap(),
            ScriptValue::from("disk full")
        );
    }
}
