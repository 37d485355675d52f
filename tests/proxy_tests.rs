//! Proxy member access from script, under different binding configurations.


use scriptbridge::{
    BindingError, BridgeConfig, BridgeError, ConversionError, HostProxy, HostType, HostValue,
    RuleSet, ScriptValue,
};
use test_harness::{Harness, Point};

fn read(h: &Harness, target: &ScriptValue, key: &str) -> Result<ScriptValue, BridgeError> {
    let mut ctx = h.bridge.interpreter().context();
    ctx.index(target, &key.into()).map_err(BridgeError::from)
}

fn write(h: &Harness, target: &ScriptValue, key: &str, value: ScriptValue) -> Result<(), BridgeError> {
    let mut ctx = h.bridge.interpreter().context();
    ctx.set_index(target, &key.into(), value).map_err(BridgeError::from)
}

// =============================================================================
// Reads
// =============================================================================

#[test]
fn test_instance_field_and_property_reads() {
    let h = Harness::new();
    let point = h.new_point(3.0, 4.0);
    let p = h.bridge.wrap_object(point.clone());
    assert_eq!(read(&h, &p, "X").unwrap(), ScriptValue::Number(3.0));
    assert_eq!(read(&h, &p, "Length").unwrap(), ScriptValue::Number(5.0));
}

#[test]
fn test_static_property_read() {
    let h = Harness::new();
    let util = h.bridge.globals().get("StringUtil");
    assert_eq!(read(&h, &util, "Empty").unwrap(), ScriptValue::from(""));
}

#[test]
fn test_overloaded_name_reads_nil() {
    let h = Harness::new();
    let util = h.bridge.globals().get("StringUtil");
    assert!(read(&h, &util, "Concat").unwrap().is_nil());
}

#[test]
fn test_instance_members_hidden_on_type_proxy() {
    let h = Harness::new();
    let point = h.bridge.globals().get("Point");
    assert!(read(&h, &point, "X").unwrap().is_nil());
    assert!(read(&h, &point, "Scale").unwrap().is_nil());
}

#[test]
fn test_write_only_property_read_fails() {
    let h = Harness::new();
    let account = h.new_account("ada", 0);
    let acct = h.bridge.wrap_object(account.clone());
    let err = read(&h, &acct, "Pin").unwrap_err();
    assert!(matches!(err, BridgeError::Binding(BindingError::WriteOnly { .. })));
}

#[test]
fn test_indexer_unreachable_by_plain_indexing() {
    let h = Harness::new();
    let account = h.new_account("ada", 0);
    let acct = h.bridge.wrap_object(account.clone());
    let err = read(&h, &acct, "History").unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Binding(BindingError::IndexerUnsupported { .. })
    ));
}

#[test]
fn test_released_object_fails_access() {
    let h = Harness::new();
    let point = h.new_point(1.0, 1.0);
    let p = h.bridge.wrap_object(point.clone());
    assert_eq!(read(&h, &p, "X").unwrap(), ScriptValue::Number(1.0));
    drop(point);

    let err = read(&h, &p, "X").unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Binding(BindingError::ObjectReleased { ref class }) if class == "Point"
    ));
    let err = write(&h, &p, "Y", ScriptValue::Integer(2)).unwrap_err();
    assert!(matches!(err, BridgeError::Binding(BindingError::ObjectReleased { .. })));
}

// =============================================================================
// Writes
// =============================================================================

#[test]
fn test_field_and_property_writes() {
    let h = Harness::new();
    let point = h.new_point(0.0, 0.0);
    let p = h.bridge.wrap_object(point.clone());
    write(&h, &p, "X", ScriptValue::Integer(7)).unwrap();
    assert_eq!(point.borrow::<Point>().unwrap().x, 7.0);

    let account = h.new_account("ada", 0);
    let a = h.bridge.wrap_object(account.clone());
    write(&h, &a, "Balance", ScriptValue::Integer(250)).unwrap();
    write(&h, &a, "Pin", ScriptValue::Integer(1234)).unwrap();
    let acct = account.borrow::<test_harness::Account>().unwrap();
    assert_eq!((acct.balance, acct.pin), (250, 1234));
}

#[test]
fn test_read_only_write_fails() {
    let h = Harness::new();
    let account = h.new_account("ada", 0);
    let a = h.bridge.wrap_object(account.clone());
    let err = write(&h, &a, "Owner", "eve".into()).unwrap_err();
    assert!(matches!(err, BridgeError::Binding(BindingError::ReadOnly { .. })));
}

#[test]
fn test_missing_member_write_names_key() {
    let h = Harness::new();
    let point = h.new_point(0.0, 0.0);
    let p = h.bridge.wrap_object(point.clone());
    let err = write(&h, &p, "Z", ScriptValue::Integer(1)).unwrap_err();
    assert_eq!(err.to_string(), "member 'Z' not found on 'Point'");
}

#[test]
fn test_overloaded_name_write_fails() {
    let h = Harness::new();
    let util = h.bridge.globals().get("StringUtil");
    let err = write(&h, &util, "Concat", "x".into()).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Binding(BindingError::MemberNotFound { .. })
    ));
}

#[test]
fn test_indexer_write_fails_by_name_and_number() {
    let h = Harness::new();
    let account = h.new_account("ada", 0);
    let a = h.bridge.wrap_object(account.clone());
    let err = write(&h, &a, "History", ScriptValue::Integer(1)).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Binding(BindingError::IndexerUnsupported { .. })
    ));

    let mut ctx = h.bridge.interpreter().context();
    let err = ctx
        .set_index(&a, &ScriptValue::Integer(1), ScriptValue::Integer(5))
        .unwrap_err();
    assert!(matches!(
        BridgeError::from(err),
        BridgeError::Binding(BindingError::IndexerUnsupported { .. })
    ));
    assert_eq!(account.borrow::<test_harness::Account>().unwrap().balance, 0);
}

#[test]
fn test_incompatible_write_value() {
    let h = Harness::new();
    let account = h.new_account("ada", 0);
    let a = h.bridge.wrap_object(account.clone());
    let err = write(&h, &a, "Pin", ScriptValue::Integer(-1)).unwrap_err();
    match err {
        BridgeError::Binding(BindingError::IncompatibleValue {
            member, expected, ..
        }) => {
            assert_eq!(member, "Pin");
            assert_eq!(expected, "u32");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// =============================================================================
// Method calls
// =============================================================================

#[test]
fn test_dot_and_colon_calls_reach_same_method() {
    let h = Harness::new();
    let account = h.new_account("ada", 10);
    let a = h.bridge.wrap_object(account.clone());
    let mut ctx = h.bridge.interpreter().context();

    let out = ctx.invoke(&a, "Deposit", vec![5.into()]).unwrap();
    assert_eq!(out, vec![ScriptValue::Integer(15)]);

    let deposit = ctx.index(&a, &"Deposit".into()).unwrap();
    let out = ctx.call_value(&deposit, vec![a.clone(), 5.into()]).unwrap();
    assert_eq!(out, vec![ScriptValue::Integer(20)]);
}

#[test]
fn test_receiver_passed_as_only_argument_is_kept() {
    let h = Harness::new();
    let point = h.new_point(1.0, 1.0);
    let p = h.bridge.wrap_object(point.clone());
    let twin = h.new_point(1.0, 1.0);
    let q = h.bridge.wrap_object(twin.clone());
    let mut ctx = h.bridge.interpreter().context();

    let same_as = ctx.index(&p, &"SameAs".into()).unwrap();
    let out = ctx.call_value(&same_as, vec![p.clone()]).unwrap();
    assert_eq!(out, vec![ScriptValue::Boolean(true)]);
    let out = ctx.call_value(&same_as, vec![p.clone(), p.clone()]).unwrap();
    assert_eq!(out, vec![ScriptValue::Boolean(true)]);
    let out = ctx.call_value(&same_as, vec![q.clone()]).unwrap();
    assert_eq!(out, vec![ScriptValue::Boolean(false)]);
    let out = ctx.invoke(&p, "SameAs", vec![q]).unwrap();
    assert_eq!(out, vec![ScriptValue::Boolean(false)]);
}

#[test]
fn test_surplus_arguments_fail() {
    let h = Harness::new();
    let util = h.bridge.globals().get("StringUtil");
    let mut ctx = h.bridge.interpreter().context();
    let err = ctx
        .invoke(&util, "Upper", vec!["a".into(), "b".into()])
        .unwrap_err();
    assert!(matches!(
        BridgeError::from(err),
        BridgeError::Binding(BindingError::ArgumentCount {
            expected: 1,
            actual: 2,
            ..
        })
    ));
}

#[test]
fn test_method_mutates_object_in_place() {
    let h = Harness::new();
    let point = h.new_point(1.0, 2.0);
    let p = h.bridge.wrap_object(point.clone());
    let mut ctx = h.bridge.interpreter().context();
    ctx.invoke(&p, "Scale", vec![ScriptValue::Number(2.0)]).unwrap();
    assert_eq!(*point.borrow::<Point>().unwrap(), Point { x: 2.0, y: 4.0 });
}

// =============================================================================
// Stringification and disposal
// =============================================================================

#[test]
fn test_display() {
    let h = Harness::new();
    let ctx = h.bridge.interpreter().context();
    let point = h.new_point(1.0, 2.5);
    let p = h.bridge.wrap_object(point.clone());
    assert_eq!(ctx.to_display_string(&p), "(1, 2.5)");
    let account = h.new_account("ada", 0);
    let a = h.bridge.wrap_object(account.clone());
    assert_eq!(ctx.to_display_string(&a), "[Account]");
    let ty = h.bridge.globals().get("Account");
    assert_eq!(ctx.to_display_string(&ty), "[type Account]");
}

#[test]
fn test_disposed_proxy_is_replaced_on_next_wrap() {
    let h = Harness::new();
    let point = h.new_point(1.0, 1.0);
    let p = h.bridge.wrap_object(point.clone());
    p.as_userdata()
        .unwrap()
        .downcast_ref::<HostProxy>()
        .unwrap()
        .dispose();

    let err = read(&h, &p, "X").unwrap_err();
    assert!(matches!(err, BridgeError::Binding(BindingError::Disposed { .. })));

    let fresh = h.bridge.wrap_object(point.clone());
    assert!(!fresh.raw_equals(&p));
    assert_eq!(read(&h, &fresh, "X").unwrap(), ScriptValue::Number(1.0));
}

// =============================================================================
// Policy and configuration
// =============================================================================

#[test]
fn test_denied_member_reads_nil_and_write_not_found() {
    let config =
        BridgeConfig::new().with_policy(RuleSet::permit_by_default().deny_member("Account", "Balance"));
    let h = Harness::with_config(config);
    let account = h.new_account("ada", 99);
    let a = h.bridge.wrap_object(account.clone());
    assert!(read(&h, &a, "Balance").unwrap().is_nil());
    let err = write(&h, &a, "Balance", ScriptValue::Integer(0)).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Binding(BindingError::MemberNotFound { .. })
    ));
    assert_eq!(read(&h, &a, "Owner").unwrap(), ScriptValue::from("ada"));
}

#[test]
fn test_denied_class() {
    let config = BridgeConfig::new().with_policy(RuleSet::permit_by_default().deny_class("StringUtil"));
    let h = Harness::with_config(config);
    let util = h.bridge.globals().get("StringUtil");
    assert!(read(&h, &util, "Upper").unwrap().is_nil());
}

#[test]
fn test_non_public_members_need_opt_in() {
    let h = Harness::new();
    let account = h.new_account("ada", 0);
    let a = h.bridge.wrap_object(account.clone());
    assert!(read(&h, &a, "Audit").unwrap().is_nil());

    let h = Harness::with_config(BridgeConfig::new().include_non_public(true));
    let account = h.new_account("ada", 0);
    let a = h.bridge.wrap_object(account.clone());
    let mut ctx = h.bridge.interpreter().context();
    let out = ctx.invoke(&a, "Audit", vec![]).unwrap();
    assert_eq!(out, vec![ScriptValue::Boolean(true)]);
}

#[test]
fn test_instance_exposure_disabled() {
    let h = Harness::with_config(BridgeConfig::new().expose_instance_members(false));
    let point = h.new_point(1.0, 1.0);
    let p = h.bridge.wrap_object(point.clone());
    assert!(read(&h, &p, "X").unwrap().is_nil());
    let util = h.bridge.globals().get("StringUtil");
    assert_eq!(read(&h, &util, "Empty").unwrap(), ScriptValue::from(""));
}

// =============================================================================
// Structured conversion
// =============================================================================

#[test]
fn test_table_to_object() {
    let h = Harness::new();
    let t = h.bridge.interpreter().create_table();
    t.set("X", 1.5).unwrap();
    t.set("Y", 2).unwrap();
    let value = h
        .bridge
        .to_host(&t.into(), &HostType::Object(h.point.clone()))
        .unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(*object.borrow::<Point>().unwrap(), Point { x: 1.5, y: 2.0 });
}

#[test]
fn test_table_to_object_names_bad_field() {
    let h = Harness::new();
    let t = h.bridge.interpreter().create_table();
    t.set("Owner", "eve").unwrap();
    let err = h
        .bridge
        .to_host(&t.into(), &HostType::Object(h.account.clone()))
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Conversion(ConversionError::StructuredField { ref key, .. }) if key == "Owner"
    ));
}

#[test]
fn test_proxy_unwraps_to_object() {
    let h = Harness::new();
    let point = h.new_point(1.0, 1.0);
    let p = h.bridge.wrap_object(point.clone());
    let back = h.bridge.to_host(&p, &HostType::Object(h.point.clone())).unwrap();
    assert_eq!(back, HostValue::Object(point));

    let err = h
        .bridge
        .to_host(&p, &HostType::Object(h.account.clone()))
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Conversion(ConversionError::ClassMismatch { .. })
    ));
}
