//! Value conversion between script values and host values.
//!
//! Script to host conversion is driven by the declared [`HostType`] and can
//! fail. Host to script conversion always succeeds; host objects become
//! proxies, one per live object.

use std::rc::Rc;

use scriptbridge_core::{AnyUserData, ScriptValue, Table};

use crate::binder::LookupKey;
use crate::binding::BindingContext;
use crate::error::ConversionError;
use crate::proxy::{self, HostProxy, ProxyTarget};
use crate::types::{HostType, HostValue};

// ============================================================================
// Script -> Host
// ============================================================================

/// Convert a script value to `target`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn to_host(
    binding: &BindingContext,
    value: &ScriptValue,
    target: &HostType,
) -> Result<HostValue, ConversionError> {
    let result = convert(binding, value, target);
    if let Err(err) = &result {
        tracing::trace!(host_type = %target, kind = %value.kind(), error = %err, "conversion failed");
    }
    result
}

fn convert(
    binding: &BindingContext,
    value: &ScriptValue,
    target: &HostType,
) -> Result<HostValue, ConversionError> {
    if value.is_nil() {
        return if target.accepts_null() {
            Ok(HostValue::Null)
        } else {
            Err(ConversionError::NilToNonNullable {
                target: target.name(),
            })
        };
    }

    match target {
        HostType::Nullable(inner) => convert(binding, value, inner),
        HostType::Void => Ok(HostValue::Null),
        HostType::Any => Ok(natural_host_value(value)),
        HostType::Bool => match value {
            ScriptValue::Boolean(b) => Ok(HostValue::Bool(*b)),
            _ => Err(mismatch(value, target)),
        },
        HostType::F32 | HostType::F64 => {
            let n = value.as_number().ok_or_else(|| mismatch(value, target))?;
            if matches!(target, HostType::F32) && n.is_finite() && n.abs() > f32::MAX as f64 {
                return Err(ConversionError::OutOfRange {
                    value: n.to_string(),
                    target: target.name(),
                });
            }
            Ok(HostValue::Float(n))
        }
        t if t.is_integer() => to_integer(value, t),
        HostType::String => match value {
            ScriptValue::String(s) => Ok(HostValue::Str(s.clone())),
            _ => Err(mismatch(value, target)),
        },
        HostType::Array(element) => match value {
            ScriptValue::Table(t) => to_array(binding, t, target, element),
            _ => Err(mismatch(value, target)),
        },
        HostType::Object(class) => match value {
            ScriptValue::UserData(ud) => match proxy_target(ud) {
                Some(ProxyTarget::Instance(object)) if Rc::ptr_eq(object.class(), class) => {
                    Ok(HostValue::Object(object))
                }
                Some(ProxyTarget::Instance(object)) => Err(ConversionError::ClassMismatch {
                    expected: class.name().to_string(),
                    actual: object.class().name().to_string(),
                }),
                _ => Err(mismatch(value, target)),
            },
            ScriptValue::Table(t) => to_structured(binding, t, class),
            _ => Err(mismatch(value, target)),
        },
        HostType::Table => match value {
            ScriptValue::Table(_) => Ok(HostValue::Script(value.clone())),
            _ => Err(mismatch(value, target)),
        },
        HostType::Function => match value {
            ScriptValue::Function(_) => Ok(HostValue::Script(value.clone())),
            _ => Err(mismatch(value, target)),
        },
        _ => Err(mismatch(value, target)),
    }
}

fn to_integer(value: &ScriptValue, target: &HostType) -> Result<HostValue, ConversionError> {
    let wide: i128 = match value {
        ScriptValue::Integer(i) => *i as i128,
        ScriptValue::Number(n) => {
            if !n.is_finite() || n.fract() != 0.0 {
                return Err(ConversionError::NoIntegerRepresentation {
                    value: *n,
                    target: target.name(),
                });
            }
            if n.abs() >= 2f64.powi(100) {
                return Err(out_of_range(n.to_string(), target));
            }
            *n as i128
        }
        _ => return Err(mismatch(value, target)),
    };

    let (min, max): (i128, i128) = match target {
        HostType::I8 => (i8::MIN.into(), i8::MAX.into()),
        HostType::I16 => (i16::MIN.into(), i16::MAX.into()),
        HostType::I32 => (i32::MIN.into(), i32::MAX.into()),
        HostType::I64 => (i64::MIN.into(), i64::MAX.into()),
        HostType::U8 => (0, u8::MAX.into()),
        HostType::U16 => (0, u16::MAX.into()),
        HostType::U32 => (0, u32::MAX.into()),
        _ => (0, u64::MAX.into()),
    };
    if wide < min || wide > max {
        return Err(out_of_range(wide.to_string(), target));
    }

    let unsigned = matches!(
        target,
        HostType::U8 | HostType::U16 | HostType::U32 | HostType::U64
    );
    Ok(if unsigned {
        HostValue::UInt(wide as u64)
    } else {
        HostValue::Int(wide as i64)
    })
}

fn to_array(
    binding: &BindingContext,
    table: &Table,
    target: &HostType,
    element: &HostType,
) -> Result<HostValue, ConversionError> {
    let values = table.sequence_values();
    let mut out = Vec::with_capacity(values.len());
    for (i, item) in values.iter().enumerate() {
        match convert(binding, item, element) {
            Ok(v) => out.push(v),
            Err(_) => {
                return Err(ConversionError::ArrayElement {
                    target: target.name(),
                    index: i + 1,
                    actual: item.kind(),
                    convertible_to: natural_host_type(item),
                    element: element.name(),
                });
            }
        }
    }
    Ok(HostValue::Array(out))
}

/// Build a host object from a table, assigning each string key through the
/// same path as a proxy write.
fn to_structured(
    binding: &BindingContext,
    table: &Table,
    class: &Rc<crate::registry::ClassInfo>,
) -> Result<HostValue, ConversionError> {
    let object = class.construct()?;
    let mut pairs = table.pairs();
    pairs.sort_by_key(|(k, _)| k.as_str().map(str::to_string));
    for (key, value) in pairs {
        let Some(name) = key.as_str() else {
            return Err(ConversionError::StructuredField {
                class: class.name().to_string(),
                key: format!("{:?}", key),
                reason: format!("{} keys are not supported", key.kind()),
            });
        };
        let lookup = LookupKey::Name(name.to_string());
        proxy::write_member(binding, class, Some(&object), &lookup, &value).map_err(|err| {
            ConversionError::StructuredField {
                class: class.name().to_string(),
                key: name.to_string(),
                reason: err.to_string(),
            }
        })?;
    }
    Ok(HostValue::Object(object))
}

fn proxy_target(ud: &AnyUserData) -> Option<ProxyTarget> {
    ud.downcast_ref::<HostProxy>().and_then(HostProxy::target)
}

fn mismatch(value: &ScriptValue, target: &HostType) -> ConversionError {
    ConversionError::TypeMismatch {
        actual: value.kind(),
        convertible_to: natural_host_type(value),
        target: target.name(),
    }
}

fn out_of_range(value: String, target: &HostType) -> ConversionError {
    ConversionError::OutOfRange {
        value,
        target: target.name(),
    }
}

/// The host type a script value converts to without loss.
pub fn natural_host_type(value: &ScriptValue) -> String {
    match value {
        ScriptValue::Nil => "null".into(),
        ScriptValue::Boolean(_) => "bool".into(),
        ScriptValue::Integer(_) => "i64".into(),
        ScriptValue::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => "i64".into(),
        ScriptValue::Number(_) => "f64".into(),
        ScriptValue::String(_) => "string".into(),
        ScriptValue::Table(_) => "table".into(),
        ScriptValue::Function(_) => "function".into(),
        ScriptValue::UserData(ud) => match proxy_target(ud) {
            Some(ProxyTarget::Instance(object)) => object.class().name().to_string(),
            Some(ProxyTarget::Type(class)) => format!("type {}", class.name()),
            None => "userdata".into(),
        },
    }
}

/// The host value a script value maps to under [`HostType::Any`].
fn natural_host_value(value: &ScriptValue) -> HostValue {
    match value {
        ScriptValue::Nil => HostValue::Null,
        ScriptValue::Boolean(b) => HostValue::Bool(*b),
        ScriptValue::Integer(i) => HostValue::Int(*i),
        ScriptValue::Number(n) => HostValue::Float(*n),
        ScriptValue::String(s) => HostValue::Str(s.clone()),
        ScriptValue::UserData(ud) => match proxy_target(ud) {
            Some(ProxyTarget::Instance(object)) => HostValue::Object(object),
            Some(ProxyTarget::Type(class)) => HostValue::Class(class),
            None => HostValue::Script(value.clone()),
        },
        _ => HostValue::Script(value.clone()),
    }
}

// ============================================================================
// Host -> Script
// ============================================================================

/// Convert a host value to a script value.
///
/// Converting the same live host object twice yields the same proxy.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn to_script(binding: &Rc<BindingContext>, value: HostValue) -> ScriptValue {
    match value {
        HostValue::Null => ScriptValue::Nil,
        HostValue::Bool(b) => ScriptValue::Boolean(b),
        HostValue::Int(i) => ScriptValue::Integer(i),
        HostValue::UInt(u) => match i64::try_from(u) {
            Ok(i) => ScriptValue::Integer(i),
            Err(_) => ScriptValue::Number(u as f64),
        },
        HostValue::Float(f) => ScriptValue::Number(f),
        HostValue::Str(s) => ScriptValue::String(s),
        HostValue::Array(items) => ScriptValue::Table(Table::from_sequence(
            items.into_iter().map(|item| to_script(binding, item)),
        )),
        HostValue::Object(object) => {
            let proxy = match binding.cache().get(&object) {
                Some(proxy) => proxy,
                None => {
                    let proxy = Rc::new(HostProxy::for_instance(&object, binding.clone()));
                    binding.cache().insert(&object, &proxy);
                    proxy
                }
            };
            ScriptValue::UserData(AnyUserData::from_rc(proxy))
        }
        HostValue::Class(class) => ScriptValue::UserData(AnyUserData::new(HostProxy::for_type(
            class,
            binding.clone(),
        ))),
        HostValue::Script(v) => v,
    }
}
