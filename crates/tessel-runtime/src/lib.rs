//! Render scheduling: per-block lifecycle managers and the worker lanes that build them.
#![forbid(unsafe_code)]

mod buffer_cache;
mod config;
mod manager;
mod queue;

pub use buffer_cache::{AdditionalBuffers, BufferCache, BufferProducer};
pub use config::RuntimeConfig;
pub use manager::{BlockRenderManager, BuildOutcome, BuildTicket};
pub use queue::{RenderPassClock, RenderQueue};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, select, unbounded};
use hashbrown::HashMap;
use parking_lot::RwLock;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use tessel_geom::BlockPos;
use tessel_tiles::Grid;
use tessel_world::{NeighbourView, TileBlock, TileWorld};

#[derive(Clone, Debug)]
pub struct RenderJob {
    pub pos: BlockPos,
    pub hint: Option<BlockPos>,
    pub job_id: u64,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum JobLane {
    /// Requests carrying a position hint.
    Near,
    Bg,
}

pub struct RenderJobOut {
    pub pos: BlockPos,
    pub job_id: u64,
    pub lane: JobLane,
    /// `None` when no manager was registered for the position.
    pub outcome: Option<BuildOutcome>,
    pub resubmitted: bool,
    pub t_total_ms: u32,
}

/// The lanes managers submit into.
struct LaneQueue {
    tx_near: Sender<RenderJob>,
    tx_bg: Sender<RenderJob>,
    q_near: Arc<AtomicUsize>,
    q_bg: Arc<AtomicUsize>,
    has_bg_workers: bool,
    next_job_id: AtomicU64,
    closed: AtomicBool,
}

impl RenderQueue for LaneQueue {
    fn submit(&self, pos: BlockPos, hint: Option<BlockPos>) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        let job = RenderJob {
            pos,
            hint,
            job_id: self.next_job_id.fetch_add(1, Ordering::Relaxed),
        };
        // background workers drain the near lane too
        let (tx, ctr) = if hint.is_some() || !self.has_bg_workers {
            (&self.tx_near, &self.q_near)
        } else {
            (&self.tx_bg, &self.q_bg)
        };
        ctr.fetch_add(1, Ordering::Relaxed);
        if tx.send(job).is_err() {
            ctr.fetch_sub(1, Ordering::Relaxed);
            return false;
        }
        true
    }
}

type ManagerMap = HashMap<BlockPos, Arc<BlockRenderManager>>;

#[derive(Clone)]
struct WorkerCtx {
    world: Arc<TileWorld>,
    managers: Arc<RwLock<ManagerMap>>,
    resubmit_stale: bool,
    tx: Sender<RenderJobOut>,
}

#[derive(Clone)]
struct LaneCounters {
    queued: Arc<AtomicUsize>,
    inflight: Arc<AtomicUsize>,
}

impl LaneCounters {
    fn run(&self, job: RenderJob, lane: JobLane, ctx: &WorkerCtx) {
        self.inflight.fetch_add(1, Ordering::AcqRel);
        self.queued.fetch_sub(1, Ordering::AcqRel);
        process_job(job, lane, ctx);
        self.inflight.fetch_sub(1, Ordering::AcqRel);
    }
}

fn process_job(job: RenderJob, lane: JobLane, ctx: &WorkerCtx) {
    let t0 = Instant::now();
    let manager = ctx.managers.read().get(&job.pos).cloned();
    let (outcome, resubmitted) = match manager {
        Some(m) => {
            let outcome = match ctx.world.get(job.pos) {
                Some(block) => {
                    let view = ctx.world.neighbours(job.pos);
                    m.build(block.as_ref(), &view)
                }
                // removed from the world: commit empty geometry
                None => m.build(
                    &TileBlock::new(job.pos, Grid::DEFAULT),
                    &NeighbourView::empty(),
                ),
            };
            let resubmitted = !outcome.accepted && ctx.resubmit_stale && m.resubmit_stale();
            (Some(outcome), resubmitted)
        }
        None => {
            log::debug!(target: "runtime", "job {} for unregistered {:?}", job.job_id, job.pos);
            (None, false)
        }
    };
    let _ = ctx.tx.send(RenderJobOut {
        pos: job.pos,
        job_id: job.job_id,
        lane,
        outcome,
        resubmitted,
        t_total_ms: t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32,
    });
}

/// Worker pool building the blocks of one [`TileWorld`].
pub struct RenderRuntime {
    world: Arc<TileWorld>,
    managers: Arc<RwLock<ManagerMap>>,
    queue: Arc<LaneQueue>,
    clock: RenderPassClock,
    config: RuntimeConfig,
    res_rx: Receiver<RenderJobOut>,
    shutdown_tx: Option<Sender<()>>,
    _near_pool: Option<Arc<ThreadPool>>,
    _bg_pool: Option<Arc<ThreadPool>>,
    q_near: Arc<AtomicUsize>,
    q_bg: Arc<AtomicUsize>,
    inflight_near: Arc<AtomicUsize>,
    inflight_bg: Arc<AtomicUsize>,
    pub w_near: usize,
    pub w_bg: usize,
}

impl RenderRuntime {
    pub fn new(world: Arc<TileWorld>, config: RuntimeConfig) -> Result<Self, ThreadPoolBuildError> {
        let (tx_near, rx_near) = unbounded::<RenderJob>();
        let (tx_bg, rx_bg) = unbounded::<RenderJob>();
        let (res_tx, res_rx) = unbounded::<RenderJobOut>();
        let (shutdown_tx, shutdown_rx) = unbounded::<()>();

        let (w_near, w_bg) = config.worker_split();
        let q_near = Arc::new(AtomicUsize::new(0));
        let q_bg = Arc::new(AtomicUsize::new(0));
        let inflight_near = Arc::new(AtomicUsize::new(0));
        let inflight_bg = Arc::new(AtomicUsize::new(0));
        let managers: Arc<RwLock<ManagerMap>> = Arc::default();

        let ctx = WorkerCtx {
            world: Arc::clone(&world),
            managers: Arc::clone(&managers),
            resubmit_stale: config.resubmit_stale,
            tx: res_tx,
        };
        let near = LaneCounters {
            queued: Arc::clone(&q_near),
            inflight: Arc::clone(&inflight_near),
        };
        let bg = LaneCounters {
            queued: Arc::clone(&q_bg),
            inflight: Arc::clone(&inflight_bg),
        };

        let near_pool = if w_near > 0 {
            let pool = Arc::new(
                ThreadPoolBuilder::new()
                    .num_threads(w_near)
                    .thread_name(|i| format!("tessel-near-{i}"))
                    .build()?,
            );
            for _ in 0..w_near {
                let rx = rx_near.clone();
                let stop = shutdown_rx.clone();
                let ctx = ctx.clone();
                let near = near.clone();
                pool.spawn(move || {
                    loop {
                        select! {
                            recv(rx) -> job => match job {
                                Ok(job) => near.run(job, JobLane::Near, &ctx),
                                Err(_) => break,
                            },
                            recv(stop) -> _ => break,
                        }
                    }
                });
            }
            Some(pool)
        } else {
            None
        };

        let bg_pool = if w_bg > 0 {
            let pool = Arc::new(
                ThreadPoolBuilder::new()
                    .num_threads(w_bg)
                    .thread_name(|i| format!("tessel-bg-{i}"))
                    .build()?,
            );
            for _ in 0..w_bg {
                let bg_rx = rx_bg.clone();
                let near_rx = rx_near.clone();
                let stop = shutdown_rx.clone();
                let ctx = ctx.clone();
                let near = near.clone();
                let bg = bg.clone();
                pool.spawn(move || {
                    loop {
                        // near requests first, then background, then wait on both
                        match near_rx.try_recv() {
                            Ok(job) => {
                                near.run(job, JobLane::Near, &ctx);
                                continue;
                            }
                            Err(TryRecvError::Disconnected) => break,
                            Err(TryRecvError::Empty) => {}
                        }
                        match bg_rx.try_recv() {
                            Ok(job) => {
                                bg.run(job, JobLane::Bg, &ctx);
                                continue;
                            }
                            Err(TryRecvError::Disconnected) => break,
                            Err(TryRecvError::Empty) => {}
                        }
                        select! {
                            recv(near_rx) -> job => match job {
                                Ok(job) => near.run(job, JobLane::Near, &ctx),
                                Err(_) => break,
                            },
                            recv(bg_rx) -> job => match job {
                                Ok(job) => bg.run(job, JobLane::Bg, &ctx),
                                Err(_) => break,
                            },
                            recv(stop) -> _ => break,
                        }
                    }
                });
            }
            Some(pool)
        } else {
            None
        };

        log::info!(target: "runtime", "render workers near={} bg={}", w_near, w_bg);

        let queue = Arc::new(LaneQueue {
            tx_near,
            tx_bg,
            q_near: Arc::clone(&q_near),
            q_bg: Arc::clone(&q_bg),
            has_bg_workers: w_bg > 0,
            next_job_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        });

        Ok(Self {
            world,
            managers,
            queue,
            clock: RenderPassClock::new(),
            config,
            res_rx,
            shutdown_tx: Some(shutdown_tx),
            _near_pool: near_pool,
            _bg_pool: bg_pool,
            q_near,
            q_bg,
            inflight_near,
            inflight_bg,
            w_near,
            w_bg,
        })
    }

    pub fn world(&self) -> &Arc<TileWorld> {
        &self.world
    }

    pub fn clock(&self) -> &RenderPassClock {
        &self.clock
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Starts a new render pass; every block rebuilds from scratch on its next section update.
    pub fn advance_pass(&self) -> u64 {
        self.clock.advance()
    }

    /// Returns the manager for `pos`, creating it on first use.
    pub fn register(&self, pos: BlockPos) -> Arc<BlockRenderManager> {
        if let Some(m) = self.managers.read().get(&pos) {
            return Arc::clone(m);
        }
        let mut managers = self.managers.write();
        let m = managers.entry(pos).or_insert_with(|| {
            Arc::new(BlockRenderManager::new(
                pos,
                self.queue.clone() as Arc<dyn RenderQueue>,
                self.clock.clone(),
                self.config.default_render_distance,
            ))
        });
        Arc::clone(m)
    }

    /// Drops the manager's caches and forgets it.
    pub fn unregister(&self, pos: BlockPos) -> bool {
        match self.managers.write().remove(&pos) {
            Some(m) => {
                m.chunk_unload();
                true
            }
            None => false,
        }
    }

    pub fn manager(&self, pos: BlockPos) -> Option<Arc<BlockRenderManager>> {
        self.managers.read().get(&pos).cloned()
    }

    pub fn registered(&self) -> Vec<BlockPos> {
        let mut out: Vec<BlockPos> = self.managers.read().keys().copied().collect();
        out.sort();
        out
    }

    /// Registers every block of the world.
    pub fn register_world(&self) -> usize {
        let positions = self.world.positions();
        for &pos in &positions {
            self.register(pos);
        }
        positions.len()
    }

    /// Runs a section update on every manager. Returns how many asked for a build.
    pub fn section_update_all(&self) -> usize {
        let managers: Vec<_> = self.managers.read().values().cloned().collect();
        managers.iter().filter(|m| m.section_update()).count()
    }

    /// Tiles at `pos` changed: rebuild it and refresh the faces its neighbours share with it.
    pub fn tiles_changed(&self, pos: BlockPos) {
        if let Some(m) = self.manager(pos) {
            m.tiles_changed();
        }
        for (_, n) in self.world.loaded_neighbours(pos) {
            if let Some(m) = self.manager(n) {
                m.on_neighbour_changed(Some(pos));
            }
        }
    }

    pub fn light_changed(&self, pos: BlockPos) {
        if let Some(m) = self.manager(pos) {
            m.light_changed();
        }
    }

    pub fn queue(&self) -> Arc<dyn RenderQueue> {
        self.queue.clone()
    }

    pub fn drain_worker_results(&self) -> Vec<RenderJobOut> {
        self.res_rx.try_iter().collect()
    }

    pub fn recv_result_timeout(&self, timeout: Duration) -> Option<RenderJobOut> {
        match self.res_rx.recv_timeout(timeout) {
            Ok(out) => Some(out),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// (near queued, near in flight, bg queued, bg in flight)
    pub fn queue_debug_counts(&self) -> (usize, usize, usize, usize) {
        (
            self.q_near.load(Ordering::Acquire),
            self.inflight_near.load(Ordering::Acquire),
            self.q_bg.load(Ordering::Acquire),
            self.inflight_bg.load(Ordering::Acquire),
        )
    }

    pub fn is_idle(&self) -> bool {
        let (a, b, c, d) = self.queue_debug_counts();
        a + b + c + d == 0
    }

    /// Collects results until both lanes are empty or `timeout` passes.
    pub fn run_until_idle(&self, timeout: Duration) -> Vec<RenderJobOut> {
        let deadline = Instant::now() + timeout;
        let mut out = Vec::new();
        while Instant::now() < deadline {
            if let Some(r) = self.recv_result_timeout(Duration::from_millis(5)) {
                out.push(r);
                continue;
            }
            if self.is_idle() {
                break;
            }
        }
        out.extend(self.drain_worker_results());
        if !self.is_idle() {
            log::warn!(
                target: "runtime",
                "not idle after {:?}: {:?}",
                timeout,
                self.queue_debug_counts()
            );
        }
        out
    }
}

impl Drop for RenderRuntime {
    fn drop(&mut self) {
        self.queue.closed.store(true, Ordering::Release);
        // workers see a disconnected shutdown channel and exit
        self.shutdown_tx.take();
    }
}
