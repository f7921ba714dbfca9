use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use subjectbus::{
    Aggregate, Bus, BusError, Config, Delivery, FallbackPolicy, Message, PublishMode, Reply,
    Request, ScopeId,
};

type Log = Arc<Mutex<Vec<&'static str>>>;

struct Ping;
impl Message for Ping {}

struct Score;
impl Message for Score {}

#[derive(Default)]
struct Hit {
    block_at: Option<&'static str>,
    blocked: bool,
}

impl Message for Hit {
    fn is_cancelled(&self) -> bool {
        self.blocked
    }
}

struct Sum;
impl Message for Sum {}
impl Aggregate for Sum {
    type Output = i64;

    fn aggregate(&self, acc: i64, next: i64) -> i64 {
        acc + next
    }
}

struct Answer {
    reply: Reply<i32>,
}

impl Message for Answer {}

impl Request for Answer {
    type Response = i32;

    fn respond(&mut self, value: i32) {
        self.reply.set(value);
    }
    fn response(&self) -> &i32 {
        self.reply.get()
    }
    fn into_response(self) -> i32 {
        self.reply.into_inner()
    }
}

fn logger(log: &Log, tag: &'static str) -> Arc<dyn Fn(&mut Hit) + Send + Sync> {
    let log = log.clone();
    Arc::new(move |hit: &mut Hit| {
        log.lock().unwrap().push(tag);
        if hit.block_at == Some(tag) {
            hit.blocked = true;
        }
    })
}

fn entries(log: &Log) -> Vec<&'static str> {
    log.lock().unwrap().clone()
}

#[test]
fn test_lower_order_runs_first() {
    let bus = Bus::new();
    let log = Log::default();
    bus.subscribe(logger(&log, "second"), 2);
    bus.subscribe(logger(&log, "first"), 1);
    bus.subscribe(logger(&log, "also_second"), 2);

    for _ in 0..3 {
        bus.publish(&mut Hit::default()).unwrap();
    }
    assert_eq!(
        entries(&log),
        ["first", "second", "also_second"].repeat(3)
    );
}

#[test]
fn test_duplicate_subscribe_invokes_once() {
    let bus = Bus::new();
    let log = Log::default();
    let handler = logger(&log, "h");

    assert!(bus.subscribe(handler.clone(), 0));
    assert!(!bus.subscribe(handler.clone(), 5));
    assert_eq!(bus.action_count::<Hit>(None), 1);

    let delivery = bus.publish(&mut Hit::default()).unwrap();
    assert_eq!(delivery.invoked, 1);
    assert_eq!(entries(&log), vec!["h"]);
}

#[test]
fn test_same_handler_on_two_scopes_is_two_subscriptions() {
    let bus = Bus::new();
    let log = Log::default();
    let handler = logger(&log, "h");

    assert!(bus.subscribe_in("a", handler.clone(), 0));
    assert!(bus.subscribe_in("b", handler.clone(), 0));

    bus.publish_to("a", &mut Hit::default()).unwrap();
    bus.publish_to("b", &mut Hit::default()).unwrap();
    assert_eq!(entries(&log), vec!["h", "h"]);
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let bus = Bus::new();
    let log = Log::default();
    let keep = logger(&log, "keep");
    let dropped = logger(&log, "drop");
    bus.subscribe(keep.clone(), 0);
    bus.subscribe(dropped.clone(), 1);

    assert!(bus.unsubscribe(&dropped));
    bus.publish(&mut Hit::default()).unwrap();
    assert_eq!(entries(&log), vec!["keep"]);
}

#[test]
fn test_unsubscribe_unknown_handler_is_noop() {
    let bus = Bus::new();
    let log = Log::default();
    let registered = logger(&log, "registered");
    let stranger = logger(&log, "stranger");

    // unknown subject
    assert!(!bus.unsubscribe(&stranger));

    // known subject, unknown handler
    bus.subscribe(registered.clone(), 0);
    assert!(!bus.unsubscribe(&stranger));
    assert!(!bus.unsubscribe_in("p1", &registered));

    bus.publish(&mut Hit::default()).unwrap();
    assert_eq!(entries(&log), vec!["registered"]);
}

#[test]
fn test_broadcast_reaches_scoped_then_global() {
    let bus = Bus::new();
    let log = Log::default();
    bus.subscribe(logger(&log, "global"), -100);
    bus.subscribe_in("p1", logger(&log, "scoped"), 100);
    bus.subscribe_in("p2", logger(&log, "other_scope"), 0);

    let delivery = bus
        .publish_in("p1", &mut Hit::default(), PublishMode::Broadcast)
        .unwrap();
    assert_eq!(
        delivery,
        Delivery {
            invoked: 2,
            cancelled: false
        }
    );
    assert_eq!(entries(&log), vec!["scoped", "global"]);
}

#[test]
fn test_narrowcast_skips_global() {
    let bus = Bus::new();
    let log = Log::default();
    bus.subscribe(logger(&log, "global"), 0);
    bus.subscribe_in(3u64, logger(&log, "scoped"), 0);

    bus.publish_in(3u64, &mut Hit::default(), PublishMode::Narrowcast)
        .unwrap();
    bus.publish_to(3u64, &mut Hit::default()).unwrap();
    assert_eq!(entries(&log), vec!["scoped", "scoped"]);
}

#[test]
fn test_global_publish_ignores_scoped_handlers() {
    let bus = Bus::new();
    let log = Log::default();
    bus.subscribe_in("p1", logger(&log, "scoped"), 0);

    let delivery = bus.publish(&mut Hit::default()).unwrap();
    assert!(delivery.is_empty());
    assert!(entries(&log).is_empty());
}

#[test]
fn test_cancellation_stops_scoped_and_global() {
    let bus = Bus::new();
    let log = Log::default();
    bus.subscribe_in("p1", logger(&log, "a"), 0);
    bus.subscribe_in("p1", logger(&log, "b"), 1);
    bus.subscribe_in("p1", logger(&log, "c"), 2);
    bus.subscribe(logger(&log, "global"), 0);

    let mut hit = Hit {
        block_at: Some("b"),
        ..Hit::default()
    };
    let delivery = bus
        .publish_in("p1", &mut hit, PublishMode::Broadcast)
        .unwrap();

    assert!(hit.blocked);
    assert_eq!(
        delivery,
        Delivery {
            invoked: 2,
            cancelled: true
        }
    );
    assert_eq!(entries(&log), vec!["a", "b"]);
}

#[test]
fn test_cancellation_truncates_collected_results() {
    let bus = Bus::new();
    for value in 1..=4u32 {
        bus.subscribe_fn(
            Arc::new(move |hit: &mut Hit| {
                if value == 2 {
                    hit.blocked = true;
                }
                value
            }),
            value as i32,
        );
    }

    let results: Vec<u32> = bus.collect(&mut Hit::default()).unwrap();
    assert_eq!(results, vec![1, 2]);
}

#[test]
fn test_scoped_cancellation_drops_global_results() {
    let bus = Bus::new();
    bus.subscribe_fn_in(
        "p1",
        Arc::new(|hit: &mut Hit| {
            hit.blocked = true;
            1u32
        }),
        0,
    );
    bus.subscribe_fn_in("p1", Arc::new(|_: &mut Hit| 2u32), 1);
    bus.subscribe_fn(Arc::new(|_: &mut Hit| 10u32), 0);

    let mut hit = Hit::default();
    let results: Vec<u32> = bus
        .collect_in("p1", &mut hit, PublishMode::Broadcast)
        .unwrap();
    assert!(hit.blocked);
    assert_eq!(results, vec![1]);

    // without the cancelling handler the global result follows
    let results: Vec<u32> = bus
        .collect_in("p2", &mut Hit::default(), PublishMode::Broadcast)
        .unwrap();
    assert_eq!(results, vec![10]);
}

#[test]
fn test_collect_scoped_results_precede_global() {
    let bus = Bus::new();
    bus.subscribe_fn(Arc::new(|_: &mut Score| "global"), 0);
    bus.subscribe_fn_in("p1", Arc::new(|_: &mut Score| "scoped"), 9);
    bus.subscribe_fn_unit_in::<Score, _, _>("p1", Arc::new(|| "unit"), 10);

    let broadcast: Vec<&str> = bus
        .collect_in("p1", &mut Score, PublishMode::Broadcast)
        .unwrap();
    assert_eq!(broadcast, vec!["scoped", "unit", "global"]);

    let narrow: Vec<&str> = bus.collect_to("p1", &mut Score).unwrap();
    assert_eq!(narrow, vec!["scoped", "unit"]);
}

#[test]
fn test_aggregate_sums_results() {
    let bus = Bus::new();
    for value in [1i64, 2, 3] {
        bus.subscribe_fn(Arc::new(move |_: &mut Sum| value), 0);
    }

    assert_eq!(bus.aggregate(&mut Sum).unwrap(), 6);
}

#[test]
fn test_aggregate_without_results_fails() {
    let bus = Bus::new();
    let err = bus.aggregate(&mut Sum).unwrap_err();
    assert!(matches!(err, BusError::EmptyAggregate { .. }));
    assert_eq!(err.as_label(), "bus_empty_aggregate");

    // narrowcast to an empty scope fails too, even with global handlers present
    bus.subscribe_fn(Arc::new(|_: &mut Sum| 5i64), 0);
    let err = bus.aggregate_to("nobody", &mut Sum).unwrap_err();
    assert!(matches!(err, BusError::EmptyAggregate { .. }));
    assert_eq!(
        bus.aggregate_in("nobody", &mut Sum, PublishMode::Broadcast)
            .unwrap(),
        5
    );
}

#[test]
fn test_aggregate_with_wrong_output_type_is_mismatch() {
    let bus = Bus::new();
    bus.subscribe_fn(Arc::new(|_: &mut Sum| 1u8), 0);

    let err = bus.aggregate(&mut Sum).unwrap_err();
    assert!(matches!(err, BusError::TypeMismatch { .. }));
}

#[test]
fn test_request_returns_handler_response() {
    let bus = Bus::new();
    bus.subscribe(Arc::new(|q: &mut Answer| q.respond(42)), 0);

    let answer = bus
        .request(Answer {
            reply: Reply::new(0),
        })
        .unwrap();
    assert_eq!(answer, 42);
}

#[test]
fn test_request_last_write_wins_and_default_without_handlers() {
    let bus = Bus::new();
    let unanswered = bus
        .request_to(
            "p1",
            Answer {
                reply: Reply::new(-1),
            },
        )
        .unwrap();
    assert_eq!(unanswered, -1);

    bus.subscribe_in(
        "p1",
        Arc::new(|q: &mut Answer| {
            let seen = *q.response();
            q.respond(seen + 1);
        }),
        0,
    );
    bus.subscribe(
        Arc::new(|q: &mut Answer| {
            let seen = *q.response();
            q.respond(seen * 10);
        }),
        0,
    );

    let answer = bus
        .request_in(
            "p1",
            Answer {
                reply: Reply::new(0),
            },
            PublishMode::Broadcast,
        )
        .unwrap();
    assert_eq!(answer, 10);
}

#[test]
fn test_ping_without_subscribers_is_silent() {
    let bus = Bus::new();
    let delivery = bus.publish(&mut Ping).unwrap();
    assert!(delivery.is_empty());
    assert!(!delivery.cancelled);
}

#[test]
fn test_score_scenario() {
    let bus = Bus::new();
    let counter = Arc::new(AtomicU32::new(0));
    let steps = Arc::new(Mutex::new(Vec::new()));

    let (c, s) = (counter.clone(), steps.clone());
    bus.subscribe_in(
        "player1",
        Arc::new(move |_: &mut Score| {
            let now = c.fetch_add(1, Ordering::SeqCst) + 1;
            s.lock().unwrap().push(now);
        }),
        0,
    );
    let (c, s) = (counter.clone(), steps.clone());
    bus.subscribe(
        Arc::new(move |_: &mut Score| {
            let now = c.fetch_add(10, Ordering::SeqCst) + 10;
            s.lock().unwrap().push(now);
        }),
        1,
    );

    bus.publish_in("player1", &mut Score, PublishMode::Broadcast)
        .unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 11);
    assert_eq!(*steps.lock().unwrap(), vec![1, 11]);
}

#[test]
fn test_fallback_always_reaches_global_for_unknown_scope() {
    let bus = Bus::new();
    let log = Log::default();
    bus.subscribe(logger(&log, "global"), 0);
    bus.subscribe_fn(Arc::new(|_: &mut Hit| 7u32), 0);

    let delivery = bus
        .publish_in("ghost", &mut Hit::default(), PublishMode::Broadcast)
        .unwrap();
    assert_eq!(delivery.invoked, 1);

    let results: Vec<u32> = bus
        .collect_in("ghost", &mut Hit::default(), PublishMode::Broadcast)
        .unwrap();
    assert_eq!(results, vec![7]);
}

#[test]
fn test_fallback_require_scoped_subject_stops_for_unknown_scope() {
    let bus = Bus::with_config(Config {
        fallback: FallbackPolicy::RequireScopedSubject,
        ..Config::default()
    });
    let log = Log::default();
    bus.subscribe(logger(&log, "global"), 0);
    bus.subscribe_fn(Arc::new(|_: &mut Hit| 7u32), 0);

    let delivery = bus
        .publish_in("ghost", &mut Hit::default(), PublishMode::Broadcast)
        .unwrap();
    assert!(delivery.is_empty());

    let results: Vec<u32> = bus
        .collect_in("ghost", &mut Hit::default(), PublishMode::Broadcast)
        .unwrap();
    assert!(results.is_empty());

    // a scope that once had a subscriber keeps its entry and falls back
    let scoped = logger(&log, "scoped");
    bus.subscribe_in("known", scoped.clone(), 0);
    bus.unsubscribe_in("known", &scoped);
    let delivery = bus
        .publish_in("known", &mut Hit::default(), PublishMode::Broadcast)
        .unwrap();
    assert_eq!(delivery.invoked, 1);
    assert_eq!(entries(&log), vec!["global"]);
}

#[test]
fn test_handler_can_publish_reentrantly() {
    let bus = Bus::new();
    let pings = Arc::new(AtomicUsize::new(0));

    let p = pings.clone();
    bus.subscribe_unit::<Ping, _>(
        Arc::new(move || {
            p.fetch_add(1, Ordering::SeqCst);
        }),
        0,
    );
    let inner = bus.clone();
    bus.subscribe(
        Arc::new(move |_: &mut Score| {
            inner.publish(&mut Ping).unwrap();
        }),
        0,
    );

    bus.publish(&mut Score).unwrap();
    assert_eq!(pings.load(Ordering::SeqCst), 1);
}

#[test]
fn test_numeric_and_named_scopes_are_distinct() {
    let bus = Bus::new();
    let log = Log::default();
    bus.subscribe_in(ScopeId::from("7"), logger(&log, "named"), 0);
    bus.subscribe_in(7u64, logger(&log, "numeric"), 0);

    bus.publish_to(7u64, &mut Hit::default()).unwrap();
    assert_eq!(entries(&log), vec!["numeric"]);
}

#[test]
fn test_custom_key_scopes() {
    #[derive(Hash, PartialEq, Eq)]
    struct Entity(u32);

    let bus = Bus::new();
    let log = Log::default();
    bus.subscribe_in(ScopeId::key(Entity(7)), logger(&log, "entity"), 0);
    bus.subscribe_in(7u64, logger(&log, "numeric"), 0);
    bus.subscribe_in("7", logger(&log, "named"), 0);

    bus.publish_to(ScopeId::key(Entity(7)), &mut Hit::default())
        .unwrap();
    bus.publish_to(ScopeId::key(Entity(8)), &mut Hit::default())
        .unwrap();
    assert_eq!(entries(&log), vec!["entity"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_publish_and_subscribe() {
    let bus = Bus::new();
    let hits = Arc::new(AtomicUsize::new(0));

    let h = hits.clone();
    bus.subscribe(
        Arc::new(move |_: &mut Score| {
            h.fetch_add(1, Ordering::SeqCst);
        }),
        0,
    );

    let mut tasks = Vec::new();
    for worker in 0..8u64 {
        let bus = bus.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..100 {
                bus.publish(&mut Score).unwrap();
                let local = Arc::new(|_: &mut Score| {});
                bus.subscribe_in(worker, local.clone(), 0);
                bus.unsubscribe_in(worker, &local);
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(hits.load(Ordering::SeqCst), 800);
    assert_eq!(bus.action_count::<Score>(None), 1);
}
