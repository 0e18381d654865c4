//! Routing behavior tests
//!
//! Each test pins down one observable property of `Router::route`.

use cgr_core::{
    ChangeContext, ConfigError, InclusionReason, PatternDefinition, Router, RuleDefinition,
};

fn router(definitions: Vec<RuleDefinition>) -> Router {
    Router::from_definitions(definitions).expect("Failed to build router")
}

fn locking_and_tracing() -> Router {
    router(vec![
        RuleDefinition::new("Locking")
            .path_prefix("kernel/locking/")
            .symbol_regex("spin_lock.*|mutex_.*"),
        RuleDefinition::new("Tracing")
            .path_prefix("kernel/trace/")
            .symbol_regex("trace_.*"),
    ])
}

#[test]
fn route_is_deterministic() {
    let router = router(vec![
        RuleDefinition::new("Net").path_prefix("net/").child("Skb").child("Sock"),
        RuleDefinition::new("Mm").symbol_regex("kmalloc|kfree").child("Slab"),
        RuleDefinition::new("Skb").child("Slab"),
        RuleDefinition::new("Sock"),
        RuleDefinition::new("Slab"),
    ]);
    let context = ChangeContext::new()
        .with_paths(["net/ipv4/tcp.c", "net/core/skbuff.c", "mm/slub.c"])
        .with_symbols(["kfree", "tcp_sendmsg", "kmalloc"]);

    let first = router.route(&context);
    for _ in 0..10 {
        let again = router.route(&context);
        assert_eq!(again.documents, first.documents);
        assert_eq!(again.trace, first.trace);
    }
    assert_eq!(first.documents, vec!["Net", "Mm", "Skb", "Sock", "Slab"]);
}

#[test]
fn insertion_order_of_signals_does_not_matter() {
    let router = locking_and_tracing();

    let a = ChangeContext::new()
        .with_paths(["kernel/trace/ftrace.c", "kernel/locking/mutex.c"])
        .with_symbols(["trace_printk", "mutex_lock"]);
    let b = ChangeContext::new()
        .with_symbols(["mutex_lock", "trace_printk"])
        .with_paths(["kernel/locking/mutex.c", "kernel/trace/ftrace.c"]);

    assert_eq!(router.route(&a).documents, router.route(&b).documents);
    assert_eq!(router.route(&a).trace, router.route(&b).trace);
}

#[test]
fn documents_have_no_duplicates() {
    let router = router(vec![
        RuleDefinition::new("A").path_prefix("a/").child("Shared").child("B"),
        RuleDefinition::new("C").path_prefix("c/").child("Shared"),
        RuleDefinition::new("B").child("Shared"),
        RuleDefinition::new("Shared"),
    ]);

    let result = router.route(&ChangeContext::new().with_paths(["a/x.c", "c/y.c"]));

    assert_eq!(result.documents, vec!["A", "C", "Shared", "B"]);
    assert_eq!(result.trace.len(), 4);
}

#[test]
fn path_prefix_respects_segment_boundary() {
    let router = router(vec![RuleDefinition::new("Net").path_prefix("net/")]);

    let hit = router.route(&ChangeContext::new().with_path("net/core/dev.c"));
    assert_eq!(hit.documents, vec!["Net"]);

    let miss = router.route(&ChangeContext::new().with_path("network/foo.c"));
    assert!(miss.documents.is_empty());
}

#[test]
fn path_prefix_without_trailing_slash_is_still_segment_aware() {
    let router = router(vec![RuleDefinition::new("Net").path_prefix("net")]);

    assert!(router.route(&ChangeContext::new().with_path("net/core/dev.c")).contains("Net"));
    assert!(router.route(&ChangeContext::new().with_path("net")).contains("Net"));
    assert!(router.route(&ChangeContext::new().with_path("network/foo.c")).is_empty());
}

#[test]
fn symbol_regex_matches_symbols() {
    let router = router(vec![RuleDefinition::new("Spin").symbol_regex("spin_lock.*")]);

    let hit = router.route(&ChangeContext::new().with_symbol("spin_lock_irqsave"));
    assert_eq!(hit.documents, vec!["Spin"]);

    let miss = router.route(&ChangeContext::new().with_symbol("mutex_lock"));
    assert!(miss.documents.is_empty());
}

#[test]
fn path_glob_matches_recursively() {
    let router = router(vec![
        RuleDefinition::new("Dt").path_glob("arch/**/*.dts"),
        RuleDefinition::new("Headers").path_glob("*.h"),
    ]);

    let result = router.route(&ChangeContext::new().with_path("arch/arm64/boot/dts/board.dts"));
    assert_eq!(result.documents, vec!["Dt"]);

    let result = router.route(&ChangeContext::new().with_path("include/linux/mutex.h"));
    assert_eq!(result.documents, vec!["Headers"]);
}

#[test]
fn on_request_rules_are_gated() {
    let router = router(vec![
        RuleDefinition::new("Sched").path_prefix("kernel/sched/"),
        RuleDefinition::new("SchedDeep")
            .on_request()
            .path_prefix("kernel/sched/"),
    ]);
    let context = ChangeContext::new().with_path("kernel/sched/fair.c");

    let without = router.route(&context);
    assert!(!without.contains("SchedDeep"));

    let with = router.route(&context.clone().with_request("SchedDeep"));
    assert!(with.contains("SchedDeep"));
    assert_eq!(with.documents, vec!["Sched", "SchedDeep"]);
}

#[test]
fn requested_rule_still_needs_a_match() {
    let router = router(vec![RuleDefinition::new("Bpf").on_request().path_prefix("kernel/bpf/")]);

    let result = router.route(&ChangeContext::new().with_path("mm/slub.c").with_request("Bpf"));

    assert!(result.documents.is_empty());
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].code(), "REQUEST_NOT_MATCHED");
}

#[test]
fn transitive_closure_in_order() {
    let router = router(vec![
        RuleDefinition::new("A").path_prefix("a/").child("B"),
        RuleDefinition::new("B").child("C"),
        RuleDefinition::new("C"),
    ]);

    let result = router.route(&ChangeContext::new().with_path("a/main.c"));

    assert_eq!(result.documents, vec!["A", "B", "C"]);
    let depths: Vec<usize> = result.trace.iter().map(|t| t.depth).collect();
    assert_eq!(depths, vec![0, 1, 2]);
}

#[test]
fn sub_guide_matches_without_its_parent() {
    let router = router(vec![
        RuleDefinition::new("Net")
            .path_prefix("net/")
            .child_when("Rcu", vec![PatternDefinition::symbol_regex("^rcu_")]),
        RuleDefinition::new("Rcu")
            .path_prefix("kernel/rcu/")
            .symbol_regex("rcu_.*"),
    ]);

    let result = router.route(
        &ChangeContext::new()
            .with_path("kernel/rcu/tree.c")
            .with_symbol("rcu_read_lock"),
    );

    assert_eq!(result.documents, vec!["Rcu"]);
    assert!(matches!(
        result.trace[0].reason,
        InclusionReason::Matched { .. }
    ));
}

#[test]
fn requested_sub_guide_is_evaluated_not_ignored() {
    let router = router(vec![
        RuleDefinition::new("Networking").path_prefix("net/").child("xdp"),
        RuleDefinition::new("xdp").on_request().symbol_regex("^xdp_"),
    ]);

    let result = router.route(
        &ChangeContext::new()
            .with_symbol("xdp_do_redirect")
            .with_request("xdp"),
    );

    assert_eq!(result.documents, vec!["xdp"]);
    assert!(result.warnings.is_empty());
}

#[test]
fn conditional_child_is_excluded_when_predicate_fails() {
    let router = router(vec![
        RuleDefinition::new("Net")
            .path_prefix("net/")
            .child_when("Xdp", vec![PatternDefinition::symbol_regex("xdp")])
            .child("Skb"),
        RuleDefinition::new("Xdp"),
        RuleDefinition::new("Skb"),
    ]);

    let result = router.route(&ChangeContext::new().with_path("net/core/dev.c"));
    assert_eq!(result.documents, vec!["Net", "Skb"]);

    let result = router.route(
        &ChangeContext::new()
            .with_path("net/core/dev.c")
            .with_symbol("bpf_prog_run_xdp"),
    );
    assert_eq!(result.documents, vec!["Net", "Xdp", "Skb"]);
}

#[test]
fn cycle_is_rejected_at_build() {
    let err = Router::from_definitions(vec![
        RuleDefinition::new("X").child("Y"),
        RuleDefinition::new("Y").child("X"),
    ])
    .expect_err("cyclic registry must not build");

    match err {
        ConfigError::CyclicReference { cycle } => assert_eq!(cycle, vec!["X", "Y", "X"]),
        other => panic!("expected CyclicReference, got {other:?}"),
    }
}

#[test]
fn unknown_request_is_a_warning_not_a_failure() {
    let router = locking_and_tracing();

    let result = router.route(&ChangeContext::new().with_request("nonexistent-id"));

    assert!(result.documents.is_empty());
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].code(), "UNKNOWN_REQUEST");
    assert_eq!(result.warnings[0].rule_id(), "nonexistent-id");
}

#[test]
fn end_to_end_locking_scenario() {
    let router = locking_and_tracing();

    let result = router.route(
        &ChangeContext::new()
            .with_path("kernel/locking/mutex.c")
            .with_symbol("mutex_lock"),
    );

    assert_eq!(result.documents, vec!["Locking"]);
    assert!(result.warnings.is_empty());

    let entry = result.trace_for("Locking").expect("Locking is traced");
    match &entry.reason {
        InclusionReason::Matched { pattern } => {
            assert_eq!(pattern.pattern, "kernel/locking/");
            assert_eq!(pattern.signal, "kernel/locking/mutex.c");
        }
        other => panic!("expected a direct match, got {other:?}"),
    }
}

#[test]
fn empty_context_routes_to_nothing() {
    let result = locking_and_tracing().route(&ChangeContext::new());
    assert!(result.is_empty());
    assert!(!result.has_warnings());
}
