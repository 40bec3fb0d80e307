#![warn(clippy::all, clippy::pedantic)]

use std::{
    net::Ipv4Addr,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use clap::Parser;
use ping_tracker::{
    Blocking, BlockingRttSource, Endpoint, LatencyTracker, ProcessId, QueryStatus, RttReading,
    TrackerConfig, TrackerError,
};
use rand::Rng;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Process to track
    #[arg(short, long, default_value_t = 1)]
    pid: u32,

    /// Number of samples to average
    #[arg(short, long, default_value_t = ping_tracker::DEFAULT_CAPACITY)]
    capacity: usize,

    /// Milliseconds between RTT queries
    #[arg(long, default_value_t = 3000)]
    sample_ms: u64,

    /// Milliseconds between endpoint checks
    #[arg(long, default_value_t = 10_000)]
    watch_ms: u64,

    /// Stop after this many seconds, 0 runs until Ctrl-C
    #[arg(short, long, default_value_t = 0)]
    duration: u64,
}

/// Stands in for the OS connection tables: jittery RTTs, the odd missing
/// connection, and an occasional server hop.
struct SimulatedSource {
    pid: ProcessId,
    server: AtomicU32,
}

impl SimulatedSource {
    fn new(pid: ProcessId) -> Self {
        Self {
            pid,
            server: AtomicU32::new(Endpoint::from(Ipv4Addr::new(124, 150, 157, 23)).raw()),
        }
    }
}

impl BlockingRttSource for SimulatedSource {
    fn resolve_endpoint(&self, pid: ProcessId) -> Result<Endpoint, TrackerError> {
        if pid != self.pid {
            return Err(TrackerError::ProcessNotFound(pid));
        }
        let mut rng = rand::rng();
        if rng.random_bool(0.2) {
            let hop = Endpoint::from(Ipv4Addr::new(124, 150, 157, rng.random_range(20..30)));
            self.server.store(hop.raw(), Ordering::Relaxed);
        }
        Ok(Endpoint::from_raw(self.server.load(Ordering::Relaxed)))
    }

    fn query_rtt(&self, _endpoint: Endpoint) -> RttReading {
        let mut rng = rand::rng();
        if rng.random_bool(0.05) {
            RttReading::failed(QueryStatus::NotFound)
        } else {
            RttReading::ok(rng.random_range(30..90))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), TrackerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("ping_tracker=info".parse().unwrap()),
        )
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let pid = ProcessId(args.pid);
    let config = TrackerConfig::new(pid)
        .with_capacity(args.capacity)
        .with_sample_interval(Duration::from_millis(args.sample_ms))
        .with_watch_interval(Duration::from_millis(args.watch_ms));

    let source = Arc::new(Blocking::new(SimulatedSource::new(pid)));
    let tracker = LatencyTracker::start(source, config).await?;

    let deadline = async {
        if args.duration == 0 {
            std::future::pending::<()>().await;
        } else {
            tokio::time::sleep(Duration::from_secs(args.duration)).await;
        }
    };
    tokio::pin!(deadline);

    let mut report = tokio::time::interval(Duration::from_millis(args.sample_ms));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            () = &mut deadline => break,
            _ = report.tick() => {}
        }

        let snap = tracker.snapshot();
        match snap.window.average {
            Some(avg) => println!(
                "{}: avg {avg:.1}ms over {} samples, last {}ms{}",
                snap.endpoint,
                snap.window.samples.len(),
                snap.window.last_rtt.unwrap_or_default(),
                if snap.discontinuity { " (server changed)" } else { "" },
            ),
            None => println!("{}: no data ({:?})", snap.endpoint, snap.last_status),
        }

        if let Some(e) = tracker.fault() {
            tracker.shutdown().await;
            return Err(e);
        }
    }

    tracker.shutdown().await;
    Ok(())
}
