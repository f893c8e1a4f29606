//! Rule payloads
//!
//! A payload is the caller-visible object attached to a rule record. It is
//! returned as-is (same `Arc`) by result queries, so callers can hang their
//! own data on it and recognize it later with `Arc::ptr_eq`.

use std::fmt;
use std::sync::Arc;

/// Payload attached to a rule
pub trait Rule: fmt::Debug + Send + Sync {
    /// Action name the rule governs
    fn name(&self) -> &str;
}

/// Shared handle to a rule payload
pub type RuleRef = Arc<dyn Rule>;

/// Builds a payload from a bare action name
pub type RuleFactory = Arc<dyn Fn(&str) -> RuleRef + Send + Sync>;

/// Default payload: just the action name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedRule {
    name: String,
}

impl NamedRule {
    pub fn new(name: impl Into<String>) -> Self {
        NamedRule { name: name.into() }
    }
}

impl Rule for NamedRule {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Factory wrapping the name in a [`NamedRule`]
pub fn named_rule_factory() -> RuleFactory {
    Arc::new(|name: &str| Arc::new(NamedRule::new(name)) as RuleRef)
}

/// Rule argument for `add_rule`: either a bare action name or a payload
#[derive(Debug, Clone)]
pub enum RuleArg {
    /// Bare action name, turned into a payload by the configured factory
    Name(String),
    /// Ready-made payload, stored as-is
    Rule(RuleRef),
}

impl From<&str> for RuleArg {
    fn from(name: &str) -> Self {
        RuleArg::Name(name.to_string())
    }
}

impl From<String> for RuleArg {
    fn from(name: String) -> Self {
        RuleArg::Name(name)
    }
}

impl From<&String> for RuleArg {
    fn from(name: &String) -> Self {
        RuleArg::Name(name.clone())
    }
}

impl From<RuleRef> for RuleArg {
    fn from(rule: RuleRef) -> Self {
        RuleArg::Rule(rule)
    }
}

impl From<&RuleRef> for RuleArg {
    fn from(rule: &RuleRef) -> Self {
        RuleArg::Rule(Arc::clone(rule))
    }
}

impl From<NamedRule> for RuleArg {
    fn from(rule: NamedRule) -> Self {
        RuleArg::Rule(Arc::new(rule))
    }
}
