//! Transmit Engine
//!
//! Run-to-completion replay with one worker thread per execution context.
//! Every worker owns its packet buffer and touches only its own cursor and
//! stats cells; the template table is the only state shared between them.

use crate::buffer::{FrameBuffer, PacketBuffer, DEFAULT_HEADROOM, FRAME_SIZE};
use crate::context::ContextId;
use crate::control::ControlPlane;
use crate::stats::{RateMeter, StatsSnapshot};
use crate::template::TemplateTable;
use crate::transmit::{Action, Transmitter};
use crossbeam::channel::{bounded, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Transmit engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of execution contexts (worker threads)
    pub contexts: usize,
    /// Total frames to process across all contexts
    pub packets: u64,
    /// Pin each worker to a CPU core
    pub pin_cores: bool,
    /// Throughput report interval, `None` disables the reporter
    pub report_interval: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            contexts: num_cpus(),
            packets: 1_000_000,
            pin_cores: false,
            report_interval: Some(Duration::from_secs(1)),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.contexts == 0 {
            return Err(EngineError::ConfigError(
                "at least one execution context is required".into(),
            ));
        }
        if self.packets == 0 {
            return Err(EngineError::ConfigError("packet count must be positive".into()));
        }
        if self.packets < self.contexts as u64 {
            return Err(EngineError::ConfigError(format!(
                "packet count {} is smaller than context count {}",
                self.packets, self.contexts
            )));
        }
        if matches!(self.report_interval, Some(d) if d.is_zero()) {
            return Err(EngineError::ConfigError("report interval must be non-zero".into()));
        }
        Ok(())
    }

    /// Frames per context; the remainder goes to the lowest-numbered contexts
    pub fn split_count(&self) -> Vec<u64> {
        if self.contexts == 0 {
            return Vec::new();
        }
        let n = self.contexts as u64;
        let base = self.packets / n;
        let extra = self.packets % n;
        (0..n).map(|i| base + u64::from(i < extra)).collect()
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Destination for forwarded frames
pub trait TxSink: Send {
    fn transmit(&mut self, frame: &[u8]);
}

/// Sink that drops every frame
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl TxSink for DiscardSink {
    #[inline(always)]
    fn transmit(&mut self, _frame: &[u8]) {}
}

impl<F> TxSink for F
where
    F: FnMut(&[u8]) + Send,
{
    fn transmit(&mut self, frame: &[u8]) {
        self(frame)
    }
}

/// Cloneable stop switch for a running engine
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    running: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask every worker to stop after its current frame
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        !self.running.load(Ordering::Acquire)
    }
}

/// Multi-threaded template transmit engine
pub struct TxEngine {
    config: EngineConfig,
    control: Arc<ControlPlane>,
    running: Arc<AtomicBool>,
    workers: Vec<WorkerHandle>,
    reporter: Option<ReporterHandle>,
}

struct WorkerHandle {
    thread: Option<thread::JoinHandle<()>>,
    ctx: ContextId,
}

struct ReporterHandle {
    stop: Sender<()>,
    thread: thread::JoinHandle<()>,
}

impl TxEngine {
    /// Engine over `table` with cursor and stats sized for `config.contexts`
    pub fn new(config: EngineConfig, table: Arc<TemplateTable>) -> Result<Self, EngineError> {
        config.validate()?;
        let tx = Transmitter::for_contexts(table, config.contexts);
        Ok(Self {
            config,
            control: Arc::new(ControlPlane::new(tx)),
            running: Arc::new(AtomicBool::new(false)),
            workers: Vec::new(),
            reporter: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Control plane over the engine's table, cursors and stats
    pub fn control(&self) -> &Arc<ControlPlane> {
        &self.control
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            running: self.running.clone(),
        }
    }

    /// Spawn one worker per context, each replaying `seed` as its inbound
    /// frame and handing forwarded frames to the sink `make_sink` builds
    /// for it.
    pub fn start<F, S>(&mut self, seed: &[u8], mut make_sink: F) -> Result<(), EngineError>
    where
        F: FnMut(ContextId) -> S,
        S: TxSink + 'static,
    {
        if self.running.load(Ordering::Acquire) || !self.workers.is_empty() {
            return Err(EngineError::AlreadyRunning);
        }
        let room = FRAME_SIZE - DEFAULT_HEADROOM;
        if seed.len() > room {
            return Err(EngineError::SeedTooLarge {
                len: seed.len(),
                max: room,
            });
        }

        let seed: Arc<[u8]> = Arc::from(seed);
        let cores = if self.config.pin_cores {
            let ids = core_affinity::get_core_ids().unwrap_or_default();
            if ids.is_empty() {
                tracing::warn!("core pinning requested but no core ids are available");
            }
            ids
        } else {
            Vec::new()
        };

        self.running.store(true, Ordering::Release);

        for (i, count) in self.config.split_count().into_iter().enumerate() {
            let ctx = ContextId(i as u32);
            let worker = Worker {
                ctx,
                count,
                core: (!cores.is_empty()).then(|| cores[i % cores.len()]),
                seed: seed.clone(),
                tx: self.control.transmitter().clone(),
                running: self.running.clone(),
                sink: make_sink(ctx),
            };

            let spawned = thread::Builder::new()
                .name(format!("pktforge-tx-{}", i))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => self.workers.push(WorkerHandle {
                    thread: Some(handle),
                    ctx,
                }),
                Err(e) => {
                    self.stop();
                    return Err(EngineError::SpawnFailed(e.to_string()));
                }
            }
        }

        if let Some(interval) = self.config.report_interval {
            match spawn_reporter(self.control.clone(), interval) {
                Ok(reporter) => self.reporter = Some(reporter),
                Err(e) => {
                    self.stop();
                    return Err(EngineError::SpawnFailed(e.to_string()));
                }
            }
        }

        tracing::info!(
            contexts = self.config.contexts,
            packets = self.config.packets,
            seed_len = seed.len(),
            "transmit engine started"
        );

        Ok(())
    }

    /// Block until every worker finished its share, then return the totals
    pub fn wait(&mut self) -> StatsSnapshot {
        for worker in &mut self.workers {
            if let Some(handle) = worker.thread.take() {
                if handle.join().is_err() {
                    tracing::error!(ctx = %worker.ctx, "worker panicked");
                }
            }
        }
        self.workers.clear();

        if let Some(reporter) = self.reporter.take() {
            let _ = reporter.stop.send(());
            let _ = reporter.thread.join();
        }

        self.running.store(false, Ordering::Release);
        let totals = self.control.totals();
        tracing::info!(
            tx_packets = totals.tx_packets,
            tx_bytes = totals.tx_bytes,
            aborted = totals.aborted,
            "transmit engine finished"
        );
        totals
    }

    /// Stop workers early and wait for them
    pub fn stop(&mut self) -> StatsSnapshot {
        self.running.store(false, Ordering::Release);
        self.wait()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Current totals across contexts
    pub fn stats(&self) -> StatsSnapshot {
        self.control.totals()
    }
}

impl Drop for TxEngine {
    fn drop(&mut self) {
        if !self.workers.is_empty() || self.reporter.is_some() {
            self.stop();
        }
    }
}

/// Per-context worker
struct Worker<S> {
    ctx: ContextId,
    count: u64,
    core: Option<core_affinity::CoreId>,
    seed: Arc<[u8]>,
    tx: Transmitter,
    running: Arc<AtomicBool>,
    sink: S,
}

impl<S: TxSink> Worker<S> {
    /// Main worker loop (run-to-completion)
    fn run(mut self) {
        if let Some(core) = self.core {
            if core_affinity::set_for_current(core) {
                tracing::debug!(ctx = %self.ctx, core = core.id, "pinned worker");
            } else {
                tracing::warn!(ctx = %self.ctx, core = core.id, "failed to pin worker");
            }
        }

        tracing::debug!(ctx = %self.ctx, count = self.count, "worker starting");

        let mut buf = PacketBuffer::new();
        let mut done = 0u64;
        while done < self.count && self.running.load(Ordering::Relaxed) {
            if let Err(e) = buf.load(&self.seed) {
                tracing::error!(ctx = %self.ctx, error = %e, "seed frame rejected");
                break;
            }
            match self.tx.process(self.ctx, &mut buf) {
                Action::Forward => self.sink.transmit(buf.frame()),
                Action::Abort => {
                    if let Some(stats) = self.tx.stats().get(self.ctx) {
                        stats.record_abort();
                    }
                }
            }
            done += 1;
        }

        tracing::debug!(ctx = %self.ctx, done, "worker stopped");
    }
}

fn spawn_reporter(
    control: Arc<ControlPlane>,
    interval: Duration,
) -> std::io::Result<ReporterHandle> {
    let (stop, stopped) = bounded::<()>(1);
    let thread = thread::Builder::new()
        .name("pktforge-report".into())
        .spawn(move || {
            let mut meter = RateMeter::new(control.totals(), Instant::now());
            loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
                let totals = control.totals();
                let rate = meter.sample(totals, Instant::now());

                metrics::gauge!("pktforge_tx_pps").set(rate.pps);
                metrics::gauge!("pktforge_tx_mbps").set(rate.mbps);
                metrics::counter!("pktforge_tx_packets_total").absolute(totals.tx_packets);
                metrics::counter!("pktforge_tx_bytes_total").absolute(totals.tx_bytes);

                tracing::info!("{} xmit/s, {:.2} Mbps", rate.pps as u64, rate.mbps);
            }
        })?;
    Ok(ReporterHandle { stop, thread })
}

/// Engine errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine already running")]
    AlreadyRunning,

    #[error("failed to spawn worker: {0}")]
    SpawnFailed(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("seed frame of {len} bytes exceeds buffer room of {max}")]
    SeedTooLarge { len: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;
    use parking_lot::Mutex;

    fn table(lengths: &[usize]) -> Arc<TemplateTable> {
        let table = Arc::new(TemplateTable::new(8).unwrap());
        let templates: Vec<Template> = lengths
            .iter()
            .map(|&len| Template::from_frame(&vec![0x11; len]).unwrap())
            .collect();
        let tx = Transmitter::for_contexts(table.clone(), 1);
        ControlPlane::new(tx).install(&templates).unwrap();
        table
    }

    fn config(contexts: usize, packets: u64) -> EngineConfig {
        EngineConfig {
            contexts,
            packets,
            pin_cores: false,
            report_interval: None,
        }
    }

    #[test]
    fn test_validate() {
        assert!(config(2, 10).validate().is_ok());
        assert!(config(0, 10).validate().is_err());
        assert!(config(2, 0).validate().is_err());
        assert!(config(4, 3).validate().is_err());

        let mut zero_interval = config(1, 1);
        zero_interval.report_interval = Some(Duration::ZERO);
        assert!(zero_interval.validate().is_err());
    }

    #[test]
    fn test_split_count_distributes_remainder() {
        assert_eq!(config(3, 10).split_count(), vec![4, 3, 3]);
        assert_eq!(config(4, 8).split_count(), vec![2, 2, 2, 2]);
        assert_eq!(config(1, 7).split_count(), vec![7]);
        assert_eq!(config(3, 10).split_count().iter().sum::<u64>(), 10);
    }

    #[test]
    fn test_engine_lifecycle() {
        let mut engine = TxEngine::new(config(2, 101), table(&[60, 120])).unwrap();
        assert!(!engine.is_running());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        engine
            .start(&[0u8; 64], move |_ctx| {
                let seen = sink_seen.clone();
                move |frame: &[u8]| seen.lock().push(frame.len())
            })
            .unwrap();

        let totals = engine.wait();
        assert!(!engine.is_running());
        assert_eq!(totals.tx_packets, 101);
        assert_eq!(totals.aborted, 0);

        let seen = seen.lock();
        assert_eq!(seen.len(), 101);
        assert!(seen.iter().all(|&len| len == 60 || len == 120));
        assert_eq!(totals.tx_bytes, seen.iter().map(|&l| l as u64).sum::<u64>());

        // context 0 replays 51 frames over an 8-slot table: 7 full cycles
        assert_eq!(engine.control().stats()[0].1.tx_packets, 51);
        assert_eq!(
            engine.control().transmitter().cursor().load_raw(ContextId(0)),
            Some(51 % 8)
        );
    }

    #[test]
    fn test_aborts_are_counted() {
        let empty = Arc::new(TemplateTable::new(4).unwrap());
        let mut engine = TxEngine::new(config(1, 5), empty).unwrap();
        engine.start(&[0u8; 32], |_| DiscardSink).unwrap();

        let totals = engine.wait();
        assert_eq!(totals.tx_packets, 0);
        assert_eq!(totals.aborted, 5);
    }

    #[test]
    fn test_start_twice() {
        let mut engine = TxEngine::new(config(1, u64::MAX), table(&[64])).unwrap();
        engine.start(&[0u8; 64], |_| DiscardSink).unwrap();
        assert!(matches!(
            engine.start(&[0u8; 64], |_| DiscardSink),
            Err(EngineError::AlreadyRunning)
        ));
        engine.stop();
        assert!(!engine.is_running());
    }

    #[test]
    fn test_shutdown_handle() {
        let mut engine = TxEngine::new(config(2, u64::MAX), table(&[64])).unwrap();
        let handle = engine.shutdown_handle();
        engine.start(&[0u8; 64], |_| DiscardSink).unwrap();
        assert!(!handle.is_shutdown());

        std::thread::sleep(Duration::from_millis(10));
        handle.shutdown();
        let totals = engine.wait();
        assert!(handle.is_shutdown());
        assert!(totals.tx_packets > 0);
    }

    #[test]
    fn test_seed_too_large() {
        let mut engine = TxEngine::new(config(1, 1), table(&[64])).unwrap();
        let seed = vec![0u8; FRAME_SIZE];
        assert!(matches!(
            engine.start(&seed, |_| DiscardSink),
            Err(EngineError::SeedTooLarge { len: FRAME_SIZE, .. })
        ));
        assert!(!engine.is_running());
    }

    #[test]
    fn test_reporter_runs() {
        let mut cfg = config(1, 200);
        cfg.report_interval = Some(Duration::from_millis(1));
        let mut engine = TxEngine::new(cfg, table(&[64])).unwrap();
        engine.start(&[0u8; 64], |_| DiscardSink).unwrap();
        assert_eq!(engine.wait().tx_packets, 200);
    }
}
