//! End-to-end access-control scenarios through the public `Acl` API

use hieracl_rs::{
    Acl, AclError, NamedRule, Resource, ResourceAggregate, Role, RoleAggregate, RuleRef,
};
use std::sync::Arc;

#[test]
fn test_default_deny() {
    let acl = Acl::new();
    assert!(!acl.is_allowed("User", "Page", "View"));
    assert_eq!(acl.is_allowed_return_result("User", "Page", "View").len(), 0);
    assert!(acl.explain("User", "Page", "View").is_empty());
}

#[test]
fn test_recency_wins_on_exact_ties() {
    let user = Role::new("User");
    let page = Resource::new("Page");

    let mut acl = Acl::new();
    acl.add_rule(&user, &page, "View", false);
    acl.add_rule(&user, &page, "View", true);
    assert!(acl.is_allowed("User", "Page", "View"));

    acl.add_rule(&user, &page, "View", false);
    assert!(!acl.is_allowed("User", "Page", "View"));
}

#[test]
fn test_remove_rule_filters_by_effect() {
    let user = Role::new("User");
    let page = Resource::new("Page");

    let mut acl = Acl::new();
    acl.add_rule(&user, &page, "View", false);
    acl.add_rule(&user, &page, "View", true);

    // Dropping the deny leaves the allow in place
    assert_eq!(acl.remove_rule(None, None, "View", Some(false)), 1);
    assert!(acl.is_allowed("User", "Page", "View"));

    assert_eq!(acl.remove_rule(Some(&user), Some(&page), "View", None), 1);
    assert!(!acl.is_allowed("User", "Page", "View"));

    assert_eq!(acl.remove_rule(None, None, "View", None), 0);
}

#[test]
fn test_ancestor_cascade_for_roles() {
    let admin = Role::new("Admin");
    let moderator = Role::new("Moderator");
    let user = Role::new("User");
    admin.add_child(&moderator).unwrap();
    moderator.add_child(&user).unwrap();
    let page = Resource::new("Page");

    let mut acl = Acl::new();
    acl.add_rule(&admin, &page, "View", true);

    assert!(acl.is_allowed("Admin", "Page", "View"));
    assert!(acl.is_allowed("Moderator", "Page", "View"));
    assert!(acl.is_allowed("User", "Page", "View"));

    acl.add_rule(&user, &page, "View", false);
    acl.add_rule(&moderator, &page, "View", false);

    assert!(!acl.is_allowed("User", "Page", "View"));
    assert!(!acl.is_allowed("Moderator", "Page", "View"));
    assert!(acl.is_allowed("Admin", "Page", "View"));
}

#[test]
fn test_ancestor_cascade_for_resources() {
    let site = Resource::new("Site");
    let blog = Resource::new("Blog");
    let page = Resource::new("Page");
    site.add_child(&blog).unwrap();
    blog.add_child(&page).unwrap();
    let user = Role::new("User");

    let mut acl = Acl::new();
    acl.add_rule(&user, &site, "View", true);

    for resource in ["Site", "Blog", "Page"] {
        assert!(acl.is_allowed("User", resource, "View"), "{}", resource);
    }

    acl.add_rule(&user, &blog, "View", false);
    assert!(acl.is_allowed("User", "Site", "View"));
    assert!(!acl.is_allowed("User", "Blog", "View"));
    assert!(!acl.is_allowed("User", "Page", "View"));
}

#[test]
fn test_specificity_beats_recency() {
    let admin = Role::new("Admin");
    let user = Role::new("User");
    admin.add_child(&user).unwrap();
    let page = Resource::new("Page");

    let mut acl = Acl::new();
    acl.add_rule(&user, &page, "View", false);
    acl.add_rule(&admin, &page, "View", true);

    // The newer admin rule is one hop away; the exact rule still wins
    assert!(!acl.is_allowed("User", "Page", "View"));
    assert!(acl.is_allowed("Admin", "Page", "View"));
}

#[test]
fn test_aggregate_reordering_changes_tie_break() {
    let user = Role::new("User");
    let moderator = Role::new("Moderator");
    let page = Resource::new("Page");

    let mut acl = Acl::new();
    acl.add_rule(&user, &page, "View", true);
    acl.add_rule(&moderator, &page, "View", false);

    let mut group = RoleAggregate::new();
    group.add_role(user.clone());
    group.add_role(moderator.clone());
    assert!(acl.is_allowed(&group, "Page", "View"));

    group.remove_role("User");
    assert!(!acl.is_allowed(&group, "Page", "View"));

    group.add_role(user.clone());
    assert!(!acl.is_allowed(&group, "Page", "View"));
}

#[test]
fn test_resource_aggregate_first_member_wins() {
    let user = Role::new("User");
    let page = Resource::new("Page");
    let blog = Resource::new("Blog");

    let mut acl = Acl::new();
    acl.add_rule(&user, &blog, "View", false);
    acl.add_rule(&user, &page, "View", true);

    let mut group = ResourceAggregate::new();
    group.add_resource(page.clone());
    group.add_resource(blog.clone());
    assert!(acl.is_allowed("User", &group, "View"));

    group.remove_resource("Page");
    assert!(!acl.is_allowed("User", &group, "View"));
}

#[test]
fn test_five_tied_rules_in_reverse_insertion_order() {
    let user = Role::new("User");
    let page = Resource::new("Page");

    let payloads: Vec<RuleRef> = (0..5)
        .map(|_| Arc::new(NamedRule::new("View")) as RuleRef)
        .collect();

    // R0:false, R1:true, R2:false, R3:true, R4:false
    let mut acl = Acl::new();
    for (i, payload) in payloads.iter().enumerate() {
        acl.add_rule(&user, &page, payload, i % 2 == 1);
    }

    // The newest rule (R4, deny) heads the ranking
    assert!(!acl.is_allowed("User", "Page", "View"));

    let results = acl.is_allowed_return_result("User", "Page", "View");
    assert!(!results.is_allowed());
    let results: Vec<RuleRef> = results.collect();
    assert_eq!(results.len(), 5);
    for (got, expected) in results.iter().zip(payloads.iter().rev()) {
        assert!(Arc::ptr_eq(got, expected));
    }

    let effects: Vec<bool> = acl
        .explain("User", "Page", "View")
        .iter()
        .map(|m| m.allowed)
        .collect();
    assert_eq!(effects, vec![false, true, false, true, false]);
}

#[test]
fn test_deep_role_chain_query_and_drop() {
    let root = Role::new("R0");
    let mut tail = root.clone();
    for i in 1..150_000 {
        let next = Role::new(format!("R{}", i));
        tail.add_child(&next).unwrap();
        tail = next;
    }
    let page = Resource::new("Page");

    let mut acl = Acl::new();
    acl.add_rule(&root, &page, "View", true);
    assert!(acl.is_allowed("R0", "Page", "View"));
    // The tail sits far below the default depth bound
    assert!(!acl.is_allowed(&tail, "Page", "View"));

    drop(tail);
    drop(root);
    drop(acl);
}

#[test]
fn test_results_are_recomputed_per_query() {
    let user = Role::new("User");
    let page = Resource::new("Page");

    let mut acl = Acl::new();
    acl.add_rule(&user, &page, "View", true);

    let before = acl.is_allowed_return_result("User", "Page", "View");
    acl.add_rule(&user, &page, "View", false);
    let after = acl.is_allowed_return_result("User", "Page", "View");

    assert_eq!(before.len(), 1);
    assert!(before.is_allowed());
    assert_eq!(after.len(), 2);
    assert!(!after.is_allowed());
}

#[test]
fn test_nodes_and_names_are_interchangeable() {
    let admin = Role::new("Admin");
    let user = Role::new("User");
    admin.add_child(&user).unwrap();
    let page = Resource::new("Page");

    let mut acl = Acl::new();
    acl.add_rule(&admin, &page, "View", true);

    let name = String::from("User");
    assert!(acl.is_allowed(&user, &page, "View"));
    assert!(acl.is_allowed("User", &page, "View"));
    assert!(acl.is_allowed(&name, "Page", "View"));

    // An unregistered node passed directly is still checked against rules
    let stranger = Role::new("User");
    assert!(!acl.is_allowed(&stranger, &page, "View"));
}

#[test]
fn test_custom_payload_factory() {
    #[derive(Debug)]
    struct Audited {
        action: String,
        owner: &'static str,
    }

    impl hieracl_rs::Rule for Audited {
        fn name(&self) -> &str {
            &self.action
        }
    }

    let user = Role::new("User");
    let page = Resource::new("Page");

    let mut acl = Acl::new();
    acl.add_rule(&user, &page, "View", true);
    acl.set_rule_class(Arc::new(|name: &str| {
        Arc::new(Audited {
            action: name.to_string(),
            owner: "ops",
        }) as RuleRef
    }));
    acl.add_rule(&user, &page, "View", true);

    let rendered: Vec<String> = acl
        .is_allowed_return_result("User", "Page", "View")
        .map(|rule| format!("{:?}", rule))
        .collect();

    assert_eq!(rendered.len(), 2);
    assert!(rendered[0].contains("Audited") && rendered[0].contains("ops"));
    assert!(rendered[1].contains("NamedRule"));
}

#[test]
fn test_cycle_rejected_and_graph_unchanged() {
    let a = Role::new("A");
    let b = Role::new("B");
    let c = Role::new("C");
    a.add_child(&b).unwrap();
    b.add_child(&c).unwrap();

    match c.add_child(&a) {
        Err(AclError::CycleDetected { parent, child }) => {
            assert_eq!(parent, "C");
            assert_eq!(child, "A");
        }
        other => panic!("expected CycleDetected, got {:?}", other),
    }
    assert!(c.children().is_empty());

    let doc = Resource::new("Doc");
    let mut acl = Acl::new();
    acl.add_rule(&c, &doc, "Read", true);
    assert!(!acl.is_allowed("A", "Doc", "Read"));
}

#[test]
fn test_check_propagates_denials() {
    fn publish(acl: &Acl, role: &str) -> hieracl_rs::Result<&'static str> {
        acl.check(role, "Page", "Publish")?;
        Ok("published")
    }

    let editor = Role::new("Editor");
    let page = Resource::new("Page");

    let mut acl = Acl::new();
    acl.add_rule(&editor, &page, "Publish", true);

    assert_eq!(publish(&acl, "Editor").unwrap(), "published");
    let err = publish(&acl, "Guest").unwrap_err();
    assert!(err.to_string().contains("Guest"));
}

#[test]
fn test_config_from_file() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "max_depth = 2").unwrap();

    let config = hieracl_rs::AclConfig::from_file(file.path()).unwrap();
    let mut acl = Acl::with_config(config).unwrap();

    let top = Role::new("Top");
    let mid = Role::new("Mid");
    let low = Role::new("Low");
    let bottom = Role::new("Bottom");
    top.add_child(&mid).unwrap();
    mid.add_child(&low).unwrap();
    low.add_child(&bottom).unwrap();

    let doc = Resource::new("Doc");
    acl.add_rule(&top, &doc, "Read", true);

    assert!(acl.is_allowed("Low", "Doc", "Read"));
    // Three hops exceed the bound
    assert!(!acl.is_allowed("Bottom", "Doc", "Read"));
}

#[test]
fn test_decision_logging_with_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("hieracl_rs=debug"))
        .with_test_writer()
        .try_init();

    let user = Role::new("User");
    let page = Resource::new("Page");

    let mut acl = hieracl_rs::AclBuilder::new()
        .with_decision_logging()
        .build()
        .unwrap();
    acl.add_rule(&user, &page, "View", true);

    assert!(acl.config().log_decisions);
    assert!(acl.is_allowed("User", "Page", "View"));
    assert!(!acl.is_allowed("User", "Page", "Edit"));
}
