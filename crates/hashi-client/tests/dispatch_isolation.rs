//! Envelope dispatcher: validation, self-echo suppression, fan-out isolation.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use hashi_client::dispatch::{DispatchReport, EnvelopeDispatcher, Listener, ListenerResult, Listeners};
use hashi_core::{EventMessage, FriendMessage, GroupMessage, MessageKind};

use common::{event_envelope, friend_envelope, group_envelope};

const BOT: i64 = 2400000002;
const ALICE: i64 = 1300000001;

fn counting_friend(counter: &Arc<AtomicUsize>) -> Listener<FriendMessage> {
    let counter = Arc::clone(counter);
    Listener::from_async(move |_msg: FriendMessage| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
}

#[tokio::test]
async fn failing_listener_does_not_stop_siblings() {
    let listeners = Arc::new(Listeners::new());
    let calls = Arc::new(AtomicUsize::new(0));

    listeners.friend.register(counting_friend(&calls).named("first"));
    let failing_calls = Arc::clone(&calls);
    listeners.friend.register(
        Listener::from_async(move |_msg: FriendMessage| {
            let calls = Arc::clone(&failing_calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let res: ListenerResult = Err("listener exploded".into());
                res
            }
        })
        .named("second"),
    );
    listeners.friend.register(counting_friend(&calls).named("third"));

    let dispatcher = EnvelopeDispatcher::new(Arc::clone(&listeners));
    let report = dispatcher
        .dispatch(MessageKind::Friend, friend_envelope(BOT, ALICE, "hi"))
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    match report {
        DispatchReport::Delivered { total, failures } => {
            assert_eq!(total, 3);
            // each captured failure is logged once as a `listener failed` error
            assert_eq!(failures.len(), 1);
            assert_eq!(&*failures[0].listener, "second");
            assert!(failures[0].error.contains("listener exploded"));
        }
        other => panic!("unexpected report: {other:?}"),
    }
}

#[tokio::test]
async fn panics_are_captured_as_failures() {
    let listeners = Arc::new(Listeners::new());
    let calls = Arc::new(AtomicUsize::new(0));

    listeners
        .group
        .register(Listener::from_blocking(|_msg: GroupMessage| -> ListenerResult {
            panic!("blocking listener panicked")
        }));
    listeners.group.register(Listener::from_async(|_msg: GroupMessage| async move {
        if true {
            panic!("async listener panicked");
        }
        Ok(())
    }));
    let counter = Arc::clone(&calls);
    listeners.group.register(Listener::from_blocking(move |_msg: GroupMessage| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));

    let dispatcher = EnvelopeDispatcher::new(Arc::clone(&listeners));
    let report = dispatcher
        .dispatch(MessageKind::Group, group_envelope(BOT, 700, ALICE, "hey"))
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.invoked(), 3);
    assert_eq!(report.failed(), 2);
}

#[tokio::test]
async fn listeners_receive_independent_copies() {
    let listeners = Arc::new(Listeners::new());
    let seen = Arc::new(Mutex::new(Vec::new()));

    for _ in 0..2 {
        let seen = Arc::clone(&seen);
        listeners.friend.register(Listener::from_blocking(move |mut msg: FriendMessage| {
            msg.data.body.content.push_str(" (edited)");
            seen.lock().unwrap().push(msg.data.body.content);
            Ok(())
        }));
    }

    let dispatcher = EnvelopeDispatcher::new(Arc::clone(&listeners));
    dispatcher
        .dispatch(MessageKind::Friend, friend_envelope(BOT, ALICE, "original"))
        .await;

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, vec!["original (edited)", "original (edited)"]);
}

#[tokio::test]
async fn self_authored_friend_and_group_messages_are_dropped() {
    let listeners = Arc::new(Listeners::new());
    let calls = Arc::new(AtomicUsize::new(0));
    listeners.friend.register(counting_friend(&calls));
    let counter = Arc::clone(&calls);
    listeners.group.register(Listener::from_blocking(move |_msg: GroupMessage| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));

    let dispatcher = EnvelopeDispatcher::new(Arc::clone(&listeners));

    let report = dispatcher
        .dispatch(MessageKind::Friend, friend_envelope(BOT, BOT, "echo"))
        .await;
    assert!(matches!(report, DispatchReport::SelfAuthored));

    let report = dispatcher
        .dispatch(MessageKind::Group, group_envelope(BOT, 700, BOT, "echo"))
        .await;
    assert!(matches!(report, DispatchReport::SelfAuthored));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn event_from_self_still_dispatches() {
    let listeners = Arc::new(Listeners::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    listeners.event.register(Listener::from_async(move |_msg: EventMessage| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }));

    let dispatcher = EnvelopeDispatcher::new(Arc::clone(&listeners));
    let report = dispatcher
        .dispatch(MessageKind::Event, event_envelope(BOT, BOT, BOT))
        .await;

    assert_eq!(report.invoked(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalid_envelope_invokes_nobody() {
    let listeners = Arc::new(Listeners::new());
    let calls = Arc::new(AtomicUsize::new(0));
    listeners.friend.register(counting_friend(&calls));
    let dispatcher = EnvelopeDispatcher::new(Arc::clone(&listeners));

    // group-shaped envelope on the friend event
    let report = dispatcher
        .dispatch(MessageKind::Friend, group_envelope(BOT, 700, ALICE, "wrong kind"))
        .await;
    match report {
        DispatchReport::Rejected(failure) => assert_eq!(failure.path, "Data.FromUin"),
        other => panic!("unexpected report: {other:?}"),
    }

    let report = dispatcher
        .dispatch(MessageKind::Friend, json!({ "CurrentQQ": BOT }))
        .await;
    assert!(matches!(report, DispatchReport::Rejected(ref f) if f.path == "CurrentPacket"));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn listeners_run_concurrently() {
    let listeners = Arc::new(Listeners::new());
    let barrier = Arc::new(tokio::sync::Barrier::new(2));

    for _ in 0..2 {
        let barrier = Arc::clone(&barrier);
        listeners.friend.register(Listener::from_async(move |_msg: FriendMessage| {
            let barrier = Arc::clone(&barrier);
            async move {
                barrier.wait().await;
                Ok(())
            }
        }));
    }

    let dispatcher = EnvelopeDispatcher::new(Arc::clone(&listeners));
    let report = tokio::time::timeout(
        Duration::from_secs(5),
        dispatcher.dispatch(MessageKind::Friend, friend_envelope(BOT, ALICE, "together")),
    )
    .await
    .expect("both listeners must be in flight at once");
    assert_eq!(report.failed(), 0);
}

#[tokio::test]
async fn same_kind_dispatches_complete_in_arrival_order() {
    let listeners = Arc::new(Listeners::new());
    let order = Arc::new(Mutex::new(Vec::new()));

    let seen = Arc::clone(&order);
    listeners.friend.register(Listener::from_async(move |msg: FriendMessage| {
        let seen = Arc::clone(&seen);
        async move {
            // the first message takes longer than the second
            if msg.data.body.content == "first" {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            seen.lock().unwrap().push(msg.data.body.content);
            Ok(())
        }
    }));

    let dispatcher = Arc::new(EnvelopeDispatcher::new(Arc::clone(&listeners)));
    let first = {
        let d = Arc::clone(&dispatcher);
        tokio::spawn(async move {
            d.dispatch(MessageKind::Friend, friend_envelope(BOT, ALICE, "first")).await
        })
    };
    tokio::task::yield_now().await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = dispatcher
        .dispatch(MessageKind::Friend, friend_envelope(BOT, ALICE, "second"))
        .await;

    first.await.unwrap();
    assert_eq!(second.invoked(), 1);
    assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
}

#[test]
fn snapshot_preserves_registration_order() {
    let listeners = Listeners::new();
    for name in ["a", "b", "c", "d"] {
        let returned = listeners
            .friend
            .register(Listener::from_blocking(|_msg: FriendMessage| Ok(())).named(name));
        assert_eq!(returned.name(), name);
        assert!(returned.is_blocking());
    }

    let snapshot = listeners.friend.snapshot();
    listeners
        .friend
        .register(Listener::from_blocking(|_msg: FriendMessage| Ok(())).named("late"));

    let names: Vec<&str> = snapshot.iter().map(|l| l.name()).collect();
    assert_eq!(names, ["a", "b", "c", "d"]);
    assert_eq!(listeners.friend.len(), 5);
}

#[test]
fn concurrent_registration_keeps_each_registrants_order() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 50;

    let listeners = Arc::new(Listeners::new());
    let done = Arc::new(AtomicUsize::new(0));

    let reader = {
        let listeners = Arc::clone(&listeners);
        let done = Arc::clone(&done);
        std::thread::spawn(move || {
            let mut seen = Vec::new();
            while done.load(Ordering::SeqCst) < THREADS {
                let names: Vec<String> = listeners
                    .friend
                    .snapshot()
                    .iter()
                    .map(|l| l.name().to_string())
                    .collect();
                seen.push(names);
            }
            seen
        })
    };

    let writers: Vec<_> = (0..THREADS)
        .map(|t| {
            let listeners = Arc::clone(&listeners);
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                for j in 0..PER_THREAD {
                    listeners.friend.register(
                        Listener::from_blocking(|_msg: FriendMessage| Ok(()))
                            .named(format!("t{t}-{j}")),
                    );
                }
                done.fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    for w in writers {
        w.join().unwrap();
    }
    let seen = reader.join().unwrap();

    let last: Vec<String> = listeners
        .friend
        .snapshot()
        .iter()
        .map(|l| l.name().to_string())
        .collect();
    assert_eq!(last.len(), THREADS * PER_THREAD);

    for names in &seen {
        assert_eq!(names[..], last[..names.len()], "snapshot is not a prefix");
    }

    for t in 0..THREADS {
        let prefix = format!("t{t}-");
        let order: Vec<usize> = last
            .iter()
            .filter_map(|n| n.strip_prefix(&prefix))
            .map(|j| j.parse().unwrap())
            .collect();
        assert_eq!(order, (0..PER_THREAD).collect::<Vec<_>>());
    }
}
