//! The parallel metadata stage: batching threshold, concurrency, failures,
//! and cancellation.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use javelin_core::metadata::DependencyMetadata;
use javelin_util::cancel::CancellationToken;

use common::*;

fn wide_root(count: usize) -> (Universe, Vec<DependencyMetadata>) {
    let mut universe = Universe::new();
    let mut deps = Vec::new();
    for i in 0..count {
        universe.publish(&format!("org.dep:lib{i}:1.0"), vec![]);
        deps.push(dep("org.dep", &format!("lib{i}"), "1.0"));
    }
    (universe, deps)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn wide_batch_is_fetched_in_parallel_and_attached_in_order() {
    let (universe, deps) = wide_root(10);
    let universe = Arc::new(universe);
    let root = root_component("com.example:app:1.0", deps);

    let (events, graph) = resolve(&builder(&universe, root)).await;

    // One fetch per edge, dispatched concurrently.
    assert_eq!(universe.metadata_calls.load(Ordering::SeqCst), 10);
    assert!(universe.max_in_flight.load(Ordering::SeqCst) >= 2);
    assert_eq!(graph.len(), 10);

    // Attachment (and therefore node materialization) follows declaration
    // order.
    let node_events: Vec<&String> = events
        .iter()
        .filter(|e| e.starts_with("node org.dep:"))
        .collect();
    let expected: Vec<String> = (0..10)
        .map(|i| format!("node org.dep:lib{i}:1.0 (default)"))
        .collect();
    assert_eq!(
        node_events.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        expected.iter().map(|s| s.as_str()).collect::<Vec<_>>()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_edge_fetches_serially() {
    let (universe, deps) = wide_root(1);
    let universe = Arc::new(universe);
    let root = root_component("com.example:app:1.0", deps);

    let (_, graph) = resolve(&builder(&universe, root)).await;

    assert_eq!(universe.metadata_calls.load(Ordering::SeqCst), 1);
    assert_eq!(universe.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(graph.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cheap_metadata_skips_the_parallel_stage() {
    let (universe, deps) = wide_root(10);
    let universe = Arc::new(universe);
    let root = root_component("com.example:app:1.0", deps);

    let builder = builder_with_cheap_metadata(&universe, root, true);
    let (_, graph) = resolve(&builder).await;

    // Metadata is still needed at attachment, but fetched one at a time.
    assert_eq!(universe.metadata_calls.load(Ordering::SeqCst), 10);
    assert_eq!(universe.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(graph.len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fetch_failure_is_recorded_and_leaves_target_unreachable() {
    let mut universe = Universe::new();
    universe.publish("org.a:a:1.0", vec![]);
    universe.publish_broken("org.b:b:1.0");
    let universe = Arc::new(universe);

    let root = root_component(
        "com.example:app:1.0",
        vec![dep("org.a", "a", "1.0"), dep("org.b", "b", "1.0")],
    );
    let (events, graph) = resolve(&builder(&universe, root)).await;

    // b's selector resolved, but the metadata failure keeps it out of the
    // graph; the resolve still completes.
    assert!(graph.find("org.a:a").is_some());
    assert!(graph.find("org.b:b").is_none());
    assert!(events.last().unwrap().starts_with("finish"));
}

#[tokio::test]
async fn cancellation_aborts_before_any_visitor_callback() {
    let mut universe = Universe::new();
    universe.publish("org.a:a:1.0", vec![]);
    let universe = Arc::new(universe);

    let root = root_component("com.example:app:1.0", vec![dep("org.a", "a", "1.0")]);
    let token = CancellationToken::new();
    token.cancel();
    let builder = builder(&universe, root).with_cancellation(token);

    let mut visitor = RecordingVisitor::default();
    let result = builder.resolve(&context(), &mut visitor).await;
    assert!(result.is_err());
    assert!(visitor.events.is_empty());
}
