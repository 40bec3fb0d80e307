use std::{
    collections::VecDeque,
    net::Ipv4Addr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use super::Inner;
use crate::{
    Endpoint, ProcessId, QueryStatus, RttReading, RttSource, SampleStore, TrackerError,
};

const PID: ProcessId = ProcessId(77);

struct FakeSource {
    endpoint: Mutex<Result<Endpoint, TrackerError>>,
    readings: Mutex<VecDeque<RttReading>>,
}

impl FakeSource {
    fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint: Mutex::new(Ok(endpoint)),
            readings: Mutex::new(VecDeque::new()),
        }
    }

    fn move_to(&self, endpoint: Endpoint) { *self.endpoint.lock().unwrap() = Ok(endpoint); }

    fn push(&self, reading: RttReading) { self.readings.lock().unwrap().push_back(reading); }
}

#[async_trait]
impl RttSource for FakeSource {
    async fn resolve_endpoint(&self, _pid: ProcessId) -> Result<Endpoint, TrackerError> {
        self.endpoint.lock().unwrap().clone()
    }

    async fn query_rtt(&self, _endpoint: Endpoint) -> RttReading {
        self.readings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(RttReading::failed(QueryStatus::NoData))
    }
}

fn addr(last: u8) -> Endpoint { Ipv4Addr::new(10, 0, 0, last).into() }

fn setup(capacity: usize) -> (Arc<FakeSource>, Inner<FakeSource>) {
    let source = Arc::new(FakeSource::new(addr(1)));
    let store = SampleStore::new(capacity).unwrap();
    let inner = Inner::new(Arc::clone(&source), PID, store, addr(1));
    (source, inner)
}

#[tokio::test]
async fn successful_query_records_sample() {
    let (source, inner) = setup(3);
    assert_eq!(inner.last_status(), None);

    for rtt in [10, 20, 30, 40] {
        source.push(RttReading::ok(rtt));
        assert!(inner.sample_once().await.is_continue());
    }

    let snap = inner.samples.snapshot();
    assert_eq!(snap.samples, vec![20, 30, 40]);
    assert_eq!(snap.average, Some(30.0));
    assert_eq!(snap.last_rtt, Some(40));
    assert_eq!(inner.last_status(), Some(QueryStatus::Success));
}

#[tokio::test]
async fn failed_query_only_updates_status() {
    let (source, inner) = setup(3);
    source.push(RttReading::ok(25));
    inner.sample_once().await;

    source.push(RttReading::failed(QueryStatus::NotFound));
    inner.sample_once().await;

    let snap = inner.samples.snapshot();
    assert_eq!(snap.samples, vec![25]);
    assert_eq!(snap.last_rtt, Some(25));
    assert_eq!(inner.last_status(), Some(QueryStatus::NotFound));
    assert_eq!(inner.last_code(), Some(1168));
}

#[tokio::test]
async fn unknown_failure_keeps_raw_code() {
    let (source, inner) = setup(3);
    source.push(RttReading::failed(31_u32));
    inner.sample_once().await;
    assert_eq!(inner.last_status(), Some(QueryStatus::Other));
    assert_eq!(inner.last_code(), Some(31));
    assert!(inner.samples.is_empty());
}

#[tokio::test]
async fn unchanged_endpoint_keeps_window() {
    let (source, inner) = setup(3);
    source.push(RttReading::ok(10));
    source.push(RttReading::ok(20));
    inner.sample_once().await;
    inner.sample_once().await;

    assert!(inner.watch_once().await.is_continue());
    assert!(!inner.discontinuity());
    assert_eq!(inner.samples.snapshot().samples, vec![10, 20]);
    assert_eq!(inner.samples.average(), Some(15.0));
}

#[tokio::test]
async fn changed_endpoint_resets_window_for_one_tick() {
    let (source, inner) = setup(3);
    source.push(RttReading::ok(10));
    source.push(RttReading::ok(20));
    inner.sample_once().await;
    inner.sample_once().await;

    source.move_to(addr(2));
    inner.watch_once().await;
    assert!(inner.discontinuity());
    assert_eq!(inner.endpoint(), addr(2));
    assert!(inner.samples.is_empty());
    assert_eq!(inner.samples.average(), None);
    assert_eq!(inner.samples.last_rtt(), Some(20));

    source.push(RttReading::ok(50));
    inner.sample_once().await;
    assert_eq!(inner.samples.snapshot().samples, vec![50]);
    assert_eq!(inner.samples.average(), Some(50.0));
    assert!(inner.discontinuity());

    inner.watch_once().await;
    assert!(!inner.discontinuity());
    assert_eq!(inner.samples.snapshot().samples, vec![50]);
}

#[tokio::test]
async fn resolution_failure_is_fatal() {
    let (source, inner) = setup(3);
    *source.endpoint.lock().unwrap() = Err(TrackerError::ProcessNotFound(PID));

    assert!(inner.watch_once().await.is_break());
    assert!(inner.token.is_cancelled());
    assert_eq!(inner.fault(), Some(TrackerError::ProcessNotFound(PID)));
    assert_eq!(inner.endpoint(), addr(1));
}

#[tokio::test]
async fn cancelled_ticks_do_not_mutate() {
    let (source, inner) = setup(3);
    inner.token.cancel();

    source.push(RttReading::ok(10));
    source.move_to(addr(9));
    assert!(inner.sample_once().await.is_break());
    assert!(inner.watch_once().await.is_break());

    assert!(inner.samples.is_empty());
    assert_eq!(inner.last_status(), None);
    assert_eq!(inner.endpoint(), addr(1));
    assert!(!inner.discontinuity());
    assert_eq!(inner.fault(), None);
}

// hops between two endpoints on every resolve and answers each query with
// the last octet of the endpoint it was asked about
struct HoppingSource {
    flip: AtomicBool,
}

#[async_trait]
impl RttSource for HoppingSource {
    async fn resolve_endpoint(&self, _pid: ProcessId) -> Result<Endpoint, TrackerError> {
        let flip = !self.flip.fetch_xor(true, Ordering::SeqCst);
        Ok(if flip { addr(2) } else { addr(1) })
    }

    async fn query_rtt(&self, endpoint: Endpoint) -> RttReading {
        tokio::task::yield_now().await;
        RttReading::ok(u64::from(endpoint.addr().octets()[3]))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn snapshot_never_mixes_endpoints() {
    let source = Arc::new(HoppingSource {
        flip: AtomicBool::new(false),
    });
    let store = SampleStore::new(8).unwrap();
    let inner = Arc::new(Inner::new(source, PID, store, addr(1)));

    let watcher = {
        let inner = Arc::clone(&inner);
        tokio::spawn(async move {
            for _ in 0..2_000 {
                let _ = inner.watch_once().await;
            }
        })
    };
    let sampler = {
        let inner = Arc::clone(&inner);
        tokio::spawn(async move {
            for _ in 0..2_000 {
                let _ = inner.sample_once().await;
            }
        })
    };

    let mut views = 0;
    while !(watcher.is_finished() && sampler.is_finished()) {
        let view = inner.samples.view();
        let expected = u64::from(view.endpoint.addr().octets()[3]);
        assert!(
            view.window.samples.iter().all(|&s| s == expected),
            "window {:?} under endpoint {}",
            view.window.samples,
            view.endpoint
        );
        views += 1;
        tokio::task::yield_now().await;
    }
    watcher.await.unwrap();
    sampler.await.unwrap();
    assert!(views > 0);
}

struct StalledSource;

#[async_trait]
impl RttSource for StalledSource {
    async fn resolve_endpoint(&self, _pid: ProcessId) -> Result<Endpoint, TrackerError> {
        std::future::pending().await
    }

    async fn query_rtt(&self, _endpoint: Endpoint) -> RttReading { std::future::pending().await }
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_pending_calls() {
    let store = SampleStore::new(3).unwrap();
    let inner = Arc::new(Inner::new(Arc::new(StalledSource), PID, store, addr(1)));

    let sample = tokio::spawn({
        let inner = Arc::clone(&inner);
        async move { inner.sample_once().await }
    });
    let watch = tokio::spawn({
        let inner = Arc::clone(&inner);
        async move { inner.watch_once().await }
    });

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(!sample.is_finished());
    assert!(!watch.is_finished());

    inner.token.cancel();
    assert!(sample.await.unwrap().is_break());
    assert!(watch.await.unwrap().is_break());

    assert_eq!(inner.last_status(), None);
    assert!(inner.samples.is_empty());
    assert_eq!(inner.endpoint(), addr(1));
    assert_eq!(inner.fault(), None);
}
