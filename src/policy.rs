//! Security policies gating which members scripts may reach.
//!
//! A policy is consulted after the binder has resolved candidates and before
//! any of them is exposed. A denied member behaves exactly like a missing one.

use std::rc::Rc;

use crate::registry::{ClassInfo, MemberDescriptor};

/// The outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Permit,
    Deny,
}

impl Decision {
    pub fn is_permit(self) -> bool {
        matches!(self, Decision::Permit)
    }
}

/// A total function from member descriptors to decisions.
pub trait SecurityPolicy {
    fn decide(&self, class: &ClassInfo, member: &MemberDescriptor) -> Decision;
}

impl<F> SecurityPolicy for F
where
    F: Fn(&ClassInfo, &MemberDescriptor) -> Decision,
{
    fn decide(&self, class: &ClassInfo, member: &MemberDescriptor) -> Decision {
        self(class, member)
    }
}

/// Permits every member.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermitAll;

impl SecurityPolicy for PermitAll {
    fn decide(&self, _class: &ClassInfo, _member: &MemberDescriptor) -> Decision {
        Decision::Permit
    }
}

thread_local! {
    static DEFAULT_POLICY: Rc<dyn SecurityPolicy> = Rc::new(PermitAll);
}

/// The policy used when a binding context is not given one.
///
/// Every call on a thread returns the same immutable instance.
pub fn default_policy() -> Rc<dyn SecurityPolicy> {
    DEFAULT_POLICY.with(Rc::clone)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Rule {
    Class(String),
    Member(String),
    ClassMember(String, String),
}

impl Rule {
    fn matches(&self, class: &ClassInfo, member: &MemberDescriptor) -> bool {
        match self {
            Rule::Class(c) => c == class.name(),
            Rule::Member(m) => m == member.name(),
            Rule::ClassMember(c, m) => c == class.name() && m == member.name(),
        }
    }
}

/// A list of rules evaluated in order; the first match decides.
///
/// Descriptors matched by no rule get the base decision, so the policy is
/// total.
///
/// ```
/// use scriptbridge::RuleSet;
///
/// let policy = RuleSet::permit_by_default()
///     .deny_member("Process", "Kill")
///     .deny_class("FileSystem");
/// # let _ = policy;
/// ```
#[derive(Debug, Clone)]
pub struct RuleSet {
    base: Decision,
    rules: Vec<(Rule, Decision)>,
}

impl RuleSet {
    pub fn permit_by_default() -> Self {
        Self {
            base: Decision::Permit,
            rules: Vec::new(),
        }
    }

    /// An allow-list: only members matched by a permit rule are visible.
    pub fn deny_by_default() -> Self {
        Self {
            base: Decision::Deny,
            rules: Vec::new(),
        }
    }

    pub fn deny_class(self, class: impl Into<String>) -> Self {
        self.with(Rule::Class(class.into()), Decision::Deny)
    }

    /// Deny a member name on every class.
    pub fn deny(self, member: impl Into<String>) -> Self {
        self.with(Rule::Member(member.into()), Decision::Deny)
    }

    pub fn deny_member(self, class: impl Into<String>, member: impl Into<String>) -> Self {
        self.with(Rule::ClassMember(class.into(), member.into()), Decision::Deny)
    }

    pub fn permit_class(self, class: impl Into<String>) -> Self {
        self.with(Rule::Class(class.into()), Decision::Permit)
    }

    pub fn permit_member(self, class: impl Into<String>, member: impl Into<String>) -> Self {
        self.with(Rule::ClassMember(class.into(), member.into()), Decision::Permit)
    }

    fn with(mut self, rule: Rule, decision: Decision) -> Self {
        self.rules.push((rule, decision));
        self
    }
}

impl SecurityPolicy for RuleSet {
    fn decide(&self, class: &ClassInfo, member: &MemberDescriptor) -> Decision {
        self.rules
            .iter()
            .find(|(rule, _)| rule.matches(class, member))
            .map(|(_, decision)| *decision)
            .unwrap_or(self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ClassBuilder;

    struct Proc;

    fn proc_class() -> Rc<ClassInfo> {
        ClassBuilder::<Proc>::new("Process")
            .static_method("Start", [], |_, _| Ok(vec![]))
            .static_method("Kill", [], |_, _| Ok(vec![]))
            .build()
            .unwrap()
    }

    #[test]
    fn test_permit_all() {
        let class = proc_class();
        for member in class.members() {
            assert_eq!(default_policy().decide(&class, member), Decision::Permit);
        }
    }

    #[test]
    fn test_default_policy_is_shared() {
        assert!(Rc::ptr_eq(&default_policy(), &default_policy()));
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let class = proc_class();
        let policy = RuleSet::deny_by_default()
            .permit_member("Process", "Start")
            .deny_class("Process");
        let start = &class.members()[0];
        let kill = &class.members()[1];
        assert_eq!(policy.decide(&class, start), Decision::Permit);
        assert_eq!(policy.decide(&class, kill), Decision::Deny);
    }

    #[test]
    fn test_closure_policy() {
        let class = proc_class();
        let policy = |_: &ClassInfo, m: &MemberDescriptor| {
            if m.name() == "Kill" {
                Decision::Deny
            } else {
                Decision::Permit
            }
        };
        assert_eq!(policy.decide(&class, &class.members()[1]), Decision::Deny);
    }
}
