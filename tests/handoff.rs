// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hand-off scenarios: wrapped work crossing threads and executors.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc;
use std::thread;

use ambit::{Context, FutureExt, Key};
use test_executors::async_test;

#[test]
fn wrapped_closure_crosses_threads() {
    let user_id: Key<String> = Key::new("user-id");
    let cx = Context::current().with(&user_id, "u1".to_string());

    // Thread A keeps its activation live across the whole hand-off.
    let _scope = cx.make_current();

    let (tx, rx) = mpsc::channel();
    let task = Context::current().wrap({
        let user_id = user_id.clone();
        move || {
            tx.send(Context::current().get(&user_id).cloned()).unwrap();
        }
    });

    let worker = thread::spawn({
        let user_id = user_id.clone();
        move || {
            // A fresh worker starts at root, regardless of thread A's scope.
            assert_eq!(Context::current(), Context::root());
            task();
            // Restored after the wrapped call, independent of thread A.
            assert_eq!(Context::current(), Context::root());
            assert_eq!(Context::current().get(&user_id), None);
        }
    });
    worker.join().unwrap();

    assert_eq!(rx.recv().unwrap().as_deref(), Some("u1"));
    // Thread A's own activation is untouched by the worker's lifecycle.
    assert_eq!(
        Context::current().get(&user_id).map(String::as_str),
        Some("u1")
    );
}

#[test]
fn wrapped_closure_restores_worker_slot_after_panic() {
    let k: Key<&'static str> = Key::new("armed");
    let cx = Context::current().with(&k, "yes");
    let task = cx.wrap(|| -> () { panic!("wrapped work failed") });

    let worker = thread::spawn(move || {
        let result = catch_unwind(AssertUnwindSafe(task));
        assert!(result.is_err());
        // The panic propagated, and the worker's slot was restored first.
        assert_eq!(Context::current(), Context::root());
    });
    worker.join().unwrap();
}

#[test]
fn wrap_captures_at_wrap_time_not_invocation_time() {
    let k: Key<i32> = Key::new("generation");
    let gen1 = Context::current().with(&k, 1);
    let gen2 = Context::current().with(&k, 2);

    let task = gen1.wrap({
        let k = k.clone();
        move || Context::current().get(&k).copied()
    });

    // Activating a different context afterward must not leak into the task.
    let _scope = gen2.make_current();
    let worker = thread::spawn(task);
    assert_eq!(worker.join().unwrap(), Some(1));
}

#[async_test]
async fn future_observes_attached_context() {
    let k: Key<&'static str> = Key::new("job");
    let before = Context::current();
    let cx = Context::current().with(&k, "reindex");

    let observed = async {
        assert_eq!(Context::current().get(&k), Some(&"reindex"));
        Context::current().get(&k).copied()
    }
    .with_context(cx)
    .await;

    assert_eq!(observed, Some("reindex"));
    // The awaiting thread's slot is back where it started.
    assert_eq!(Context::current(), before);
}

#[async_test]
async fn future_captures_current_at_handoff() {
    let k: Key<u8> = Key::new("attempt");
    let cx = Context::current().with(&k, 2);

    let fut = {
        let _scope = cx.make_current();
        // Capture happens here, while the scope is live.
        async { Context::current().get(&k).copied() }.with_current_context()
    };

    // The scope is long gone by the time the future runs.
    assert_eq!(Context::current().get(&k), None);
    assert_eq!(fut.await, Some(2));
}
