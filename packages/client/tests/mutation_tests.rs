//! Mutation engine behavior: retry, hook ordering, context threading,
//! related-key invalidation and reset.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use serde_json::{Value, json};
use tokio_test::assert_ok;
use tokio::time::Instant;

use cachet_client::error;
use cachet_client::mutation::http_operation;
use cachet_client::{
    CacheStore, HeaderMap, HttpMutation, HttpQuery, Kind, Method, MutationHooks,
    MutationOperation, MutationOptions, MutationStatus, MutationTarget, QueryKey, QueryOptions,
    RetryPolicy, StatusCode, Transport,
};
use common::{MockStep, MockTransport, settle};

/// Operation failing the first `failures` attempts, then succeeding.
fn flaky_operation(failures: usize) -> (MutationOperation<Value, Value>, Arc<AtomicUsize>) {
    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&attempts);
    let operation: MutationOperation<Value, Value> = Arc::new(move |_variables| {
        let attempt = seen.fetch_add(1, Ordering::SeqCst);
        async move {
            if attempt < failures {
                Err(error::transport(std::io::Error::other("backend unavailable")))
            } else {
                Ok(json!({"attempt": attempt + 1}))
            }
        }
        .boxed()
    });
    (operation, attempts)
}

fn options_with_retry(retry: RetryPolicy) -> MutationOptions<Value, Value, ()> {
    MutationOptions {
        retry,
        ..MutationOptions::<Value, Value, ()>::default()
    }
}

#[tokio::test(start_paused = true)]
async fn http_mutation_succeeds_on_the_third_attempt() {
    let store = Arc::new(CacheStore::new());
    let transport = MockTransport::sequence(vec![
        MockStep::FailTransport,
        MockStep::FailTransport,
        MockStep::Json(json!({"id": 9})),
    ]);
    let operation = http_operation::<Value, Value>(
        Arc::clone(&transport) as Arc<dyn Transport>,
        MutationTarget::from("/items"),
        Method::POST,
        HeaderMap::new(),
    );
    let mutation = HttpMutation::new(
        store,
        operation,
        options_with_retry(RetryPolicy::fixed(2, Duration::from_millis(50))),
    );

    let result = mutation.mutate(json!({"name": "widget"})).await;

    assert_eq!(result.expect("third attempt succeeds"), json!({"id": 9}));
    assert_eq!(transport.calls(), 3);
    assert_eq!(mutation.status(), MutationStatus::Success);
    assert_eq!(mutation.data(), Some(json!({"id": 9})));
    assert!(mutation.error().is_none());
}

#[tokio::test(start_paused = true)]
async fn default_policy_fails_fast() {
    let store = Arc::new(CacheStore::new());
    let transport = MockTransport::sequence(vec![MockStep::FailTransport]);
    let operation = http_operation::<Value, Value>(
        Arc::clone(&transport) as Arc<dyn Transport>,
        MutationTarget::from("/items"),
        Method::POST,
        HeaderMap::new(),
    );
    let mutation = HttpMutation::new(store, operation, MutationOptions::<Value, Value, ()>::default());

    let err = mutation
        .mutate(json!({"name": "widget"}))
        .await
        .expect_err("no retries configured");

    assert_eq!(transport.calls(), 1);
    assert_eq!(err.kind(), Kind::Transport);
    assert_eq!(mutation.status(), MutationStatus::Error);
    assert!(mutation.error().is_some());
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_surface_the_last_error() {
    let store = Arc::new(CacheStore::new());
    let transport = MockTransport::sequence(vec![MockStep::Status(500), MockStep::Status(500)]);
    let operation = http_operation::<Value, Value>(
        Arc::clone(&transport) as Arc<dyn Transport>,
        MutationTarget::from("/items"),
        Method::POST,
        HeaderMap::new(),
    );
    let mutation = HttpMutation::new(
        store,
        operation,
        options_with_retry(RetryPolicy::fixed(1, Duration::from_millis(10))),
    );

    let err = mutation
        .mutate(json!({"name": "widget"}))
        .await
        .expect_err("both attempts fail");

    assert_eq!(transport.calls(), 2);
    assert_eq!(err.kind(), Kind::Status);
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
    assert_eq!(mutation.status(), MutationStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn retry_is_invisible_except_as_elapsed_time() {
    let store = Arc::new(CacheStore::new());
    let (operation, attempts) = flaky_operation(2);
    let mutation = HttpMutation::new(
        store,
        operation,
        options_with_retry(RetryPolicy::backoff(2, |attempt| {
            Duration::from_millis(100 * u64::from(attempt))
        })),
    );

    let started = Instant::now();
    let result = mutation.mutate(json!({})).await;
    let elapsed = started.elapsed();

    assert!(result.is_ok());
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    // 100ms after the first failure, 200ms after the second.
    assert_eq!(elapsed, Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn hooks_run_in_order_with_the_context_threaded_through() {
    let store = Arc::new(CacheStore::new());
    let log = Arc::new(Mutex::new(Vec::<String>::new()));

    let operation: MutationOperation<Value, Value> =
        Arc::new(|_variables| async { Ok(json!({"done": true})) }.boxed());

    let hooks = MutationHooks::<Value, Value, i32> {
        on_mutate: Some(Box::new({
            let log = Arc::clone(&log);
            move |variables| {
                log.lock().expect("log").push(format!("mutate {variables}"));
                42
            }
        })),
        on_success: Some(Box::new({
            let log = Arc::clone(&log);
            move |value, _variables, context| {
                log.lock()
                    .expect("log")
                    .push(format!("success {value} ctx={:?}", context.copied()));
            }
        })),
        on_error: Some(Box::new({
            let log = Arc::clone(&log);
            move |_error, _variables, _context| {
                log.lock().expect("log").push("error".into());
            }
        })),
        on_finally: Some(Box::new({
            let log = Arc::clone(&log);
            move |result, error, _variables, context| {
                log.lock().expect("log").push(format!(
                    "finally result={} error={} ctx={:?}",
                    result.is_some(),
                    error.is_some(),
                    context.copied()
                ));
            }
        })),
    };

    let mutation = HttpMutation::new(
        store,
        operation,
        MutationOptions {
            hooks,
            invalidate_keys: Vec::new(),
            retry: RetryPolicy::none(),
        },
    );

    mutation.mutate(json!({"name": "x"})).await.expect("succeeds");

    let log = log.lock().expect("log").clone();
    assert_eq!(
        log,
        vec![
            r#"mutate {"name":"x"}"#.to_string(),
            r#"success {"done":true} ctx=Some(42)"#.to_string(),
            "finally result=true error=false ctx=Some(42)".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn error_hooks_receive_the_normalized_error_and_both_finally_slots() {
    let store = Arc::new(CacheStore::new());
    let log = Arc::new(Mutex::new(Vec::<String>::new()));

    let operation: MutationOperation<Value, Value> = Arc::new(|_variables| {
        async { Err(error::status(StatusCode::CONFLICT, None)) }.boxed()
    });

    let hooks = MutationHooks::<Value, Value, ()> {
        on_mutate: None,
        on_success: Some(Box::new({
            let log = Arc::clone(&log);
            move |_value, _variables, _context| {
                log.lock().expect("log").push("success".into());
            }
        })),
        on_error: Some(Box::new({
            let log = Arc::clone(&log);
            move |error, _variables, _context| {
                log.lock()
                    .expect("log")
                    .push(format!("error status={:?}", error.status().map(|s| s.as_u16())));
            }
        })),
        on_finally: Some(Box::new({
            let log = Arc::clone(&log);
            move |result, error, _variables, _context| {
                log.lock().expect("log").push(format!(
                    "finally result={} error={}",
                    result.is_some(),
                    error.is_some()
                ));
            }
        })),
    };

    let mutation = HttpMutation::new(
        store,
        operation,
        MutationOptions {
            hooks,
            invalidate_keys: Vec::new(),
            retry: RetryPolicy::none(),
        },
    );

    let err = mutation.mutate(json!({})).await.expect_err("operation fails");

    assert_eq!(err.kind(), Kind::Status);
    let log = log.lock().expect("log").clone();
    assert_eq!(
        log,
        vec![
            "error status=Some(409)".to_string(),
            "finally result=false error=true".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn successful_mutation_invalidates_related_query_keys() {
    let store = Arc::new(CacheStore::new());
    let query_transport = MockTransport::json(json!({"users": ["a"]}));
    let query: HttpQuery<Value> = HttpQuery::new(
        Arc::clone(&store),
        Arc::clone(&query_transport) as Arc<dyn Transport>,
        "/users".into(),
        QueryOptions {
            ttl: Duration::from_secs(3600),
            ..QueryOptions::default()
        },
    )
    .expect("query builds");
    query.fetch().await;
    assert_eq!(query_transport.calls(), 1);

    let (operation, _) = flaky_operation(0);
    let mutation = HttpMutation::new(
        Arc::clone(&store),
        operation,
        MutationOptions {
            invalidate_keys: vec![QueryKey::from("/users")],
            ..MutationOptions::<Value, Value, ()>::default()
        },
    );
    mutation.mutate(json!({"name": "b"})).await.expect("succeeds");

    // The entry is expired in place: data intact, timestamp gone.
    let entry = store.get("/users").expect("entry preserved");
    assert_eq!(entry.data, Some(json!({"users": ["a"]})));
    assert!(entry.is_expired(Instant::now()));

    // A fresh-looking TTL no longer shields the next fetch.
    query.fetch().await;
    assert_eq!(query_transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn invalidation_cancels_an_in_flight_fetch_for_the_key() {
    let store = Arc::new(CacheStore::new());
    let (query_transport, _gate) = MockTransport::gated(vec![MockStep::Json(json!({"id": 1}))]);
    let query = Arc::new(
        HttpQuery::<Value>::new(
            Arc::clone(&store),
            Arc::clone(&query_transport) as Arc<dyn Transport>,
            "/users".into(),
            QueryOptions::default(),
        )
        .expect("query builds"),
    );

    let fetch = tokio::spawn({
        let q = Arc::clone(&query);
        async move { q.fetch().await }
    });
    settle().await;
    assert_eq!(query_transport.calls(), 1);

    let (operation, _) = flaky_operation(0);
    let mutation = HttpMutation::new(
        Arc::clone(&store),
        operation,
        MutationOptions {
            invalidate_keys: vec![QueryKey::from("/users")],
            ..MutationOptions::<Value, Value, ()>::default()
        },
    );
    mutation.mutate(json!({})).await.expect("succeeds");

    // The preempted fetch settles silently.
    fetch.await.expect("fetch completes");
    assert!(query.error().is_none());
    assert!(!query.loading());
}

#[tokio::test(start_paused = true)]
async fn status_cells_walk_idle_pending_success() {
    let store = Arc::new(CacheStore::new());
    let (transport, gate) = MockTransport::gated(vec![MockStep::Json(json!({"id": 1}))]);
    let operation = http_operation::<Value, Value>(
        Arc::clone(&transport) as Arc<dyn Transport>,
        MutationTarget::from("/items"),
        Method::POST,
        HeaderMap::new(),
    );
    let mutation = Arc::new(HttpMutation::new(
        store,
        operation,
        MutationOptions::<Value, Value, ()>::default(),
    ));

    assert!(mutation.is_idle());

    let running = tokio::spawn({
        let m = Arc::clone(&mutation);
        async move { m.mutate(json!({"name": "x"})).await }
    });
    settle().await;
    assert!(mutation.is_pending());

    gate.add_permits(1);
    running
        .await
        .expect("task completes")
        .expect("mutation succeeds");
    assert!(mutation.is_success());
}

#[tokio::test(start_paused = true)]
async fn reset_returns_to_idle_unconditionally() {
    let store = Arc::new(CacheStore::new());
    let (operation, _) = flaky_operation(0);
    let mutation = HttpMutation::new(store, operation, options_with_retry(RetryPolicy::none()));

    mutation.mutate(json!({})).await.expect("succeeds");
    assert_eq!(mutation.status(), MutationStatus::Success);
    assert!(mutation.data().is_some());

    mutation.reset();

    assert_eq!(mutation.status(), MutationStatus::Idle);
    assert!(mutation.data().is_none());
    assert!(mutation.error().is_none());
}

#[tokio::test(start_paused = true)]
async fn target_resolver_computes_the_request_target() {
    let store = Arc::new(CacheStore::new());
    let transport = MockTransport::json(json!({"ok": true}));
    let operation = http_operation::<Value, Value>(
        Arc::clone(&transport) as Arc<dyn Transport>,
        MutationTarget::resolver(|variables: &Value| {
            format!("/users/{}", variables["id"].as_u64().unwrap_or(0))
        }),
        Method::PUT,
        HeaderMap::new(),
    );
    let mutation = HttpMutation::new(store, operation, MutationOptions::<Value, Value, ()>::default());

    tokio_test::assert_ok!(mutation.mutate(json!({"id": 7})).await);

    assert_eq!(transport.targets(), vec!["/users/7".to_string()]);
}
