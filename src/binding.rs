//! Binding contexts: a security policy paired with binders.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use scriptbridge_core::InterpreterConfig;

use crate::binder::{Binder, BindingFlags, LookupKey};
use crate::policy::{SecurityPolicy, default_policy};
use crate::proxy::HostProxy;
use crate::registry::{ClassInfo, MemberDescriptor};
use crate::types::HostObject;

/// Configuration for a [`Bridge`](crate::Bridge).
#[derive(Clone)]
pub struct BridgeConfig {
    /// Policy applied to every resolved member.
    pub policy: Rc<dyn SecurityPolicy>,
    /// Whether instance proxies expose instance members. When false an
    /// instance proxy resolves nothing.
    pub expose_instance_members: bool,
    /// Whether non-public members are visible.
    pub include_non_public: bool,
    pub interpreter: InterpreterConfig,
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: impl SecurityPolicy + 'static) -> Self {
        self.policy = Rc::new(policy);
        self
    }

    pub fn expose_instance_members(mut self, expose: bool) -> Self {
        self.expose_instance_members = expose;
        self
    }

    pub fn include_non_public(mut self, include: bool) -> Self {
        self.include_non_public = include;
        self
    }

    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.interpreter.max_call_depth = depth;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            expose_instance_members: true,
            include_non_public: false,
            interpreter: InterpreterConfig::default(),
        }
    }
}

impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("expose_instance_members", &self.expose_instance_members)
            .field("include_non_public", &self.include_non_public)
            .field("interpreter", &self.interpreter)
            .finish_non_exhaustive()
    }
}

/// One proxy per live host object.
///
/// Entries are weak: the cache never keeps a proxy alive, and a proxy never
/// keeps its object alive. A proxy's weak handle keeps the object's
/// allocation reserved, so an address cannot be reused while its entry
/// still upgrades.
#[derive(Default)]
pub struct ProxyCache {
    entries: RefCell<FxHashMap<usize, Weak<HostProxy>>>,
}

impl ProxyCache {
    /// The live, undisposed proxy for `object`, if any.
    pub fn get(&self, object: &HostObject) -> Option<Rc<HostProxy>> {
        self.entries
            .borrow()
            .get(&object.addr())
            .and_then(Weak::upgrade)
            .filter(|proxy| {
                proxy
                    .target()
                    .and_then(|target| target.receiver().map(|r| r.ptr_eq(object)))
                    .unwrap_or(false)
            })
    }

    pub fn insert(&self, object: &HostObject, proxy: &Rc<HostProxy>) {
        let mut entries = self.entries.borrow_mut();
        if entries.len() >= 64 && entries.len().is_power_of_two() {
            entries.retain(|_, weak| weak.strong_count() > 0);
        }
        entries.insert(object.addr(), Rc::downgrade(proxy));
    }

    /// Number of entries whose proxy is still alive.
    pub fn live_count(&self) -> usize {
        self.entries
            .borrow()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

/// The policy and binders used by every proxy of one bridge.
///
/// Built once from a [`BridgeConfig`]; only the identity cache changes
/// afterwards.
pub struct BindingContext {
    policy: Rc<dyn SecurityPolicy>,
    type_binder: Binder,
    instance_binder: Option<Binder>,
    cache: ProxyCache,
}

impl BindingContext {
    pub fn new(config: &BridgeConfig) -> Self {
        let extra = if config.include_non_public {
            BindingFlags::NON_PUBLIC
        } else {
            BindingFlags::empty()
        };
        Self {
            policy: config.policy.clone(),
            type_binder: Binder::new(BindingFlags::type_access() | extra),
            instance_binder: config
                .expose_instance_members
                .then(|| Binder::new(BindingFlags::instance_access() | extra)),
            cache: ProxyCache::default(),
        }
    }

    pub fn policy(&self) -> &Rc<dyn SecurityPolicy> {
        &self.policy
    }

    /// The binder for a type proxy or an instance proxy.
    pub fn binder(&self, instance: bool) -> Option<&Binder> {
        if instance {
            self.instance_binder.as_ref()
        } else {
            Some(&self.type_binder)
        }
    }

    pub fn cache(&self) -> &ProxyCache {
        &self.cache
    }

    /// Resolve `key` and drop every member the policy denies.
    pub fn resolve<'c>(
        &self,
        class: &'c ClassInfo,
        key: &LookupKey,
        instance: bool,
    ) -> Vec<&'c MemberDescriptor> {
        let Some(binder) = self.binder(instance) else {
            return Vec::new();
        };
        binder
            .resolve(class, key)
            .into_iter()
            .filter(|member| {
                let permitted = self.policy.decide(class, member).is_permit();
                if !permitted {
                    tracing::trace!(
                        class = class.name(),
                        member = member.name(),
                        "member denied by policy"
                    );
                }
                permitted
            })
            .collect()
    }
}

impl Default for BindingContext {
    fn default() -> Self {
        Self::new(&BridgeConfig::default())
    }
}

impl fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingContext")
            .field("type_binder", &self.type_binder)
            .field("instance_binder", &self.instance_binder)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RuleSet;
    use crate::registry::ClassBuilder;
    use crate::types::{HostType, HostValue};

    struct Acct {
        balance: i64,
    }

    fn acct_class() -> Rc<ClassInfo> {
        ClassBuilder::<Acct>::new("Account")
            .readonly_field("Balance", HostType::I64, |a| HostValue::Int(a.balance))
            .readonly_field("Pin", HostType::I64, |_| HostValue::Int(0))
            .build()
            .unwrap()
    }

    #[test]
    fn test_denied_member_is_indistinguishable_from_missing() {
        let config = BridgeConfig::new().with_policy(RuleSet::permit_by_default().deny("Pin"));
        let binding = BindingContext::new(&config);
        let class = acct_class();
        let pin = binding.resolve(&class, &LookupKey::Name("Pin".into()), true);
        let missing = binding.resolve(&class, &LookupKey::Name("Nope".into()), true);
        assert!(pin.is_empty());
        assert!(missing.is_empty());
        assert_eq!(
            binding.resolve(&class, &LookupKey::Name("Balance".into()), true).len(),
            1
        );
    }

    #[test]
    fn test_instance_members_can_be_hidden() {
        let config = BridgeConfig::new().expose_instance_members(false);
        let binding = BindingContext::new(&config);
        let class = acct_class();
        assert!(binding.binder(true).is_none());
        assert!(binding.resolve(&class, &LookupKey::Name("Balance".into()), true).is_empty());
    }
}
