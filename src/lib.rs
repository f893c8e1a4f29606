//! # hieracl - Hierarchical Access Control
//!
//! `hieracl-rs` answers one question: may this role perform this action on
//! this resource? Roles and resources each form a directed acyclic graph, and
//! rules bound to a node cascade down to its descendants.
//!
//! - **Default deny**: no applicable rule means no access
//! - **Specificity**: the rule closest to the queried pair wins
//! - **Recency**: among equally close rules, the newest wins
//! - **Aggregates**: ordered groups of roles or resources; earlier members
//!   win ties
//!
//! ## Quick Start
//!
//! ```rust
//! use hieracl_rs::{Acl, Resource, Role};
//!
//! # fn main() -> hieracl_rs::Result<()> {
//! let admin = Role::new("Admin");
//! let moderator = Role::new("Moderator");
//! let user = Role::new("User");
//! admin.add_child(&moderator)?;
//! moderator.add_child(&user)?;
//!
//! let page = Resource::new("Page");
//!
//! let mut acl = Acl::new();
//! acl.add_rule(&admin, &page, "View", true);
//! assert!(acl.is_allowed("User", "Page", "View"));
//!
//! // A closer rule overrides the inherited one
//! acl.add_rule(&user, &page, "View", false);
//! assert!(!acl.is_allowed("User", "Page", "View"));
//! assert!(acl.is_allowed("Moderator", "Page", "View"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use hieracl_rs::{AclBuilder, AclConfig};
//!
//! # fn main() -> hieracl_rs::Result<()> {
//! let config = AclConfig::from_toml_str("max_depth = 32\nlog_decisions = true")?;
//! let acl = AclBuilder::new().config(config).build()?;
//! assert_eq!(acl.config().max_depth, 32);
//! # Ok(())
//! # }
//! ```

pub mod core;

// Re-export core modules internally so crate:: paths in core still work
#[allow(unused_imports)]
pub(crate) use core::{aggregate, config, distance, error, node, resolver, rule, store};

pub use crate::core::{
    aggregate::{Aggregate, ResourceAggregate, RoleAggregate},
    config::{AclConfig, DEFAULT_MAX_DEPTH},
    distance::distance,
    error::{AclError, Result},
    node::{Node, NodeKind, Resource, ResourceKind, Role, RoleKind},
    resolver::{RuleMatch, RuleResults, Target},
    rule::{named_rule_factory, NamedRule, Rule, RuleArg, RuleFactory, RuleRef},
    store::{Registry, RuleId, RuleRecord, RuleStore},
};

use crate::core::resolver::Resolver;
use tracing::{debug, info};

/// Access-control engine
///
/// Holds the rule records, the role and resource registries and the payload
/// factory. Queries take `&self` and never change state; every mutation takes
/// `&mut self`, so an embedder sharing one instance across threads wraps it
/// in its own lock.
///
/// # Examples
///
/// ```rust
/// use hieracl_rs::{Acl, Resource, Role, RoleAggregate};
///
/// let user = Role::new("User");
/// let moderator = Role::new("Moderator");
/// let page = Resource::new("Page");
///
/// let mut acl = Acl::new();
/// acl.add_rule(&user, &page, "View", true);
/// acl.add_rule(&moderator, &page, "View", false);
///
/// let mut group = RoleAggregate::new();
/// group.add_role(user.clone());
/// group.add_role(moderator.clone());
///
/// // Both rules are exact; the first member decides
/// assert!(acl.is_allowed(&group, "Page", "View"));
/// ```
pub struct Acl {
    store: RuleStore,
    config: AclConfig,
}

impl Acl {
    /// Create an engine with the default configuration
    pub fn new() -> Self {
        info!("Creating access-control engine");
        Acl {
            store: RuleStore::new(),
            config: AclConfig::default(),
        }
    }

    /// Create an engine with a validated configuration
    pub fn with_config(config: AclConfig) -> Result<Self> {
        config.validate()?;
        info!(
            max_depth = config.max_depth,
            log_decisions = config.log_decisions,
            "Creating access-control engine"
        );
        Ok(Acl {
            store: RuleStore::new(),
            config,
        })
    }

    pub fn config(&self) -> &AclConfig {
        &self.config
    }

    /// Bind `role`/`resource`/action to allow or deny
    ///
    /// `rule` is either a bare action name, turned into a payload by the
    /// current factory, or a ready-made payload stored as-is. Every call adds
    /// a new record; the returned id orders it after all earlier ones.
    pub fn add_rule(
        &mut self,
        role: &Role,
        resource: &Resource,
        rule: impl Into<RuleArg>,
        allowed: bool,
    ) -> RuleId {
        self.store.add(role, resource, rule.into(), allowed)
    }

    /// Delete every rule matching the filter
    ///
    /// `None` matches anything. Role and resource are compared by identity,
    /// not by name. Returns how many rules were deleted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hieracl_rs::{Acl, Resource, Role};
    ///
    /// let user = Role::new("User");
    /// let page = Resource::new("Page");
    ///
    /// let mut acl = Acl::new();
    /// acl.add_rule(&user, &page, "View", false);
    /// acl.add_rule(&user, &page, "View", true);
    ///
    /// assert_eq!(acl.remove_rule(None, None, "View", Some(true)), 1);
    /// assert!(!acl.is_allowed("User", "Page", "View"));
    /// ```
    pub fn remove_rule(
        &mut self,
        role: Option<&Role>,
        resource: Option<&Resource>,
        action: &str,
        allowed: Option<bool>,
    ) -> usize {
        self.store.remove(role, resource, action, allowed)
    }

    /// Delete one rule by id; `false` if it was already gone
    pub fn remove_rule_by_id(&mut self, id: RuleId) -> bool {
        self.store.remove_by_id(id)
    }

    /// Delete every rule
    ///
    /// Known names stay resolvable and ids keep increasing.
    pub fn clear_rules(&mut self) {
        self.store.clear();
    }

    /// Replace the factory used for bare-name rules added from now on
    pub fn set_rule_class(&mut self, factory: RuleFactory) {
        self.store.set_factory(factory);
    }

    /// Decide whether `subject` may perform `action` on `object`
    ///
    /// Either side may be a name, a node or an aggregate. Names unknown to
    /// the engine and empty aggregates are denied.
    pub fn is_allowed<'s, 'o>(
        &self,
        subject: impl Into<Target<'s, RoleKind>>,
        object: impl Into<Target<'o, ResourceKind>>,
        action: &str,
    ) -> bool {
        let subject = subject.into();
        let object = object.into();
        let allowed = self
            .resolver()
            .resolve(subject, object, action)
            .first()
            .map_or(false, |m| m.allowed);
        self.log_decision(&subject, &object, action, allowed);
        allowed
    }

    /// Ranked payloads of every applicable rule, best first
    ///
    /// The head decides; [`RuleResults::is_allowed`] gives the same answer
    /// as [`Acl::is_allowed`] for the same query.
    pub fn is_allowed_return_result<'s, 'o>(
        &self,
        subject: impl Into<Target<'s, RoleKind>>,
        object: impl Into<Target<'o, ResourceKind>>,
        action: &str,
    ) -> RuleResults {
        let subject = subject.into();
        let object = object.into();
        let results = RuleResults::new(self.resolver().resolve(subject, object, action));
        self.log_decision(&subject, &object, action, results.is_allowed());
        results
    }

    /// Full ranking for a query: distances, positions and rule ids
    pub fn explain<'s, 'o>(
        &self,
        subject: impl Into<Target<'s, RoleKind>>,
        object: impl Into<Target<'o, ResourceKind>>,
        action: &str,
    ) -> Vec<RuleMatch> {
        self.resolver().resolve(subject.into(), object.into(), action)
    }

    /// Like [`Acl::is_allowed`], but a deny is an [`AclError::AccessDenied`]
    pub fn check<'s, 'o>(
        &self,
        subject: impl Into<Target<'s, RoleKind>>,
        object: impl Into<Target<'o, ResourceKind>>,
        action: &str,
    ) -> Result<()> {
        let subject = subject.into();
        let object = object.into();
        if self.is_allowed(subject, object, action) {
            Ok(())
        } else {
            Err(AclError::AccessDenied {
                subject: subject.describe(),
                object: object.describe(),
                action: action.to_string(),
            })
        }
    }

    /// Role known to the engine under `name`
    pub fn role(&self, name: &str) -> Option<Role> {
        self.store.roles().find(name)
    }

    /// Resource known to the engine under `name`
    pub fn resource(&self, name: &str) -> Option<Resource> {
        self.store.resources().find(name)
    }

    /// Rules in insertion order
    pub fn rules(&self) -> impl Iterator<Item = &RuleRecord> {
        self.store.records()
    }

    pub fn rule(&self, id: RuleId) -> Option<&RuleRecord> {
        self.store.get(id)
    }

    pub fn rule_count(&self) -> usize {
        self.store.len()
    }

    /// Check whether any rule governs `action`
    pub fn has_rule(&self, action: &str) -> bool {
        self.store.has_action(action)
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.store, self.config.max_depth)
    }

    fn log_decision(
        &self,
        subject: &Target<'_, RoleKind>,
        object: &Target<'_, ResourceKind>,
        action: &str,
        allowed: bool,
    ) {
        if self.config.log_decisions {
            debug!(
                subject = %subject.describe(),
                object = %object.describe(),
                action,
                allowed,
                "Access decision"
            );
        }
    }
}

impl Default for Acl {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Acl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Acl")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish()
    }
}

/// Builder for configuring an [`Acl`]
///
/// # Examples
///
/// ```rust
/// use hieracl_rs::{AclBuilder, NamedRule, RuleRef};
/// use std::sync::Arc;
///
/// # fn main() -> hieracl_rs::Result<()> {
/// let acl = AclBuilder::new()
///     .max_depth(64)
///     .rule_factory(Arc::new(|name: &str| {
///         Arc::new(NamedRule::new(name.to_lowercase())) as RuleRef
///     }))
///     .build()?;
/// assert_eq!(acl.config().max_depth, 64);
/// # Ok(())
/// # }
/// ```
pub struct AclBuilder {
    config: AclConfig,
    factory: Option<RuleFactory>,
}

impl AclBuilder {
    /// Create a new AclBuilder with default settings
    pub fn new() -> Self {
        AclBuilder {
            config: AclConfig::default(),
            factory: None,
        }
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: AclConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the traversal depth bound
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Emit a debug event for every decision
    pub fn with_decision_logging(mut self) -> Self {
        self.config.log_decisions = true;
        self
    }

    /// Set the factory for bare-name rules
    pub fn rule_factory(mut self, factory: RuleFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Build the Acl instance
    pub fn build(self) -> Result<Acl> {
        let mut acl = Acl::with_config(self.config)?;
        if let Some(factory) = self.factory {
            acl.set_rule_class(factory);
        }
        Ok(acl)
    }
}

impl Default for AclBuilder {
    fn default() -> Self {
        Self::new()
    }
}
