use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tessel_geom::{Aabb, BlockPos, Vec3};
use tessel_mesh_cpu::{
    BoxMap, BufferMap, BuildContext, NeighbourQuery, RenderBoxCache, TileSource, bake_layers,
    upload_layers,
};

use crate::buffer_cache::BufferCache;
use crate::queue::{RenderPassClock, RenderQueue};

/// Scheduling state of one block. Only touched under the manager's mutex.
#[derive(Debug, Default)]
struct ScheduleState {
    blocked: usize,
    // wraps after 256 requests; a build outliving that many triggers can be accepted
    requested_version: Option<i8>,
    committed_version: Option<i8>,
    committed_pass: Option<u64>,
    queued: bool,
    // last finish was rejected and nothing resubmitted since
    stale: bool,
    erase_box_cache: bool,
    light_changed: bool,
    neighbour_changed: bool,
    boundary_dirty: bool,
    cached_render_distance: Option<f32>,
    cached_bounds: Option<Aabb>,
    bounds_dirty: bool,
}

/// Snapshot handed to a worker by [`BlockRenderManager::start_building_cache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildTicket {
    pub version: Option<i8>,
    pub pass_index: u64,
    /// Only boundary faces of the cached boxes need re-resolving.
    pub refresh_boundary: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuildOutcome {
    pub accepted: bool,
    pub version: Option<i8>,
    pub refreshed_boundary: bool,
    pub layers: usize,
    pub vertices: usize,
    pub additional: usize,
    pub t_boxes_ms: u32,
    pub t_total_ms: u32,
}

/// Render lifecycle of one tile block: triggers, build protocol, and committed caches.
pub struct BlockRenderManager {
    pos: BlockPos,
    queue: Arc<dyn RenderQueue>,
    clock: RenderPassClock,
    default_render_distance: f32,
    boxes: RenderBoxCache,
    buffers: BufferCache,
    state: Mutex<ScheduleState>,
}

#[inline]
fn ms_since(t0: Instant) -> u32 {
    t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
}

impl BlockRenderManager {
    pub fn new(
        pos: BlockPos,
        queue: Arc<dyn RenderQueue>,
        clock: RenderPassClock,
        default_render_distance: f32,
    ) -> Self {
        Self {
            pos,
            queue,
            clock,
            default_render_distance,
            boxes: RenderBoxCache::new(),
            buffers: BufferCache::new(),
            state: Mutex::new(ScheduleState {
                bounds_dirty: true,
                ..ScheduleState::default()
            }),
        }
    }

    #[inline]
    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    /// Re-evaluates whether the block needs a rebuild and enqueues it if so.
    /// Consumes the light and neighbour triggers either way.
    pub fn section_update(&self) -> bool {
        let mut st = self.state.lock();
        let mut need = st.light_changed
            || st.neighbour_changed
            || st.requested_version.is_none()
            || self.buffers.has_invalid_buffers();
        let mut erase = false;
        if st.committed_pass != Some(self.clock.current()) {
            need = true;
            erase = true;
        }
        st.light_changed = false;
        st.neighbour_changed = false;
        if need {
            self.queue_locked(&mut st, erase, None);
        }
        need
    }

    /// The block's tiles changed: everything derived from them is rebuilt.
    pub fn tiles_changed(&self) {
        let mut st = self.state.lock();
        st.bounds_dirty = true;
        st.cached_render_distance = None;
        self.queue_locked(&mut st, true, None);
    }

    /// An adjacent block changed; only boundary faces are re-resolved on the next build.
    pub fn on_neighbour_changed(&self, hint: Option<BlockPos>) {
        let mut st = self.state.lock();
        st.neighbour_changed = true;
        st.boundary_dirty = true;
        self.queue_locked(&mut st, false, hint);
    }

    /// Light around the block changed. Picked up by the next [`Self::section_update`].
    pub fn light_changed(&self) {
        self.state.lock().light_changed = true;
    }

    fn queue_locked(&self, st: &mut ScheduleState, erase: bool, hint: Option<BlockPos>) {
        st.requested_version = Some(st.requested_version.map_or(0, |v| v.wrapping_add(1)));
        st.erase_box_cache |= erase;
        if !st.queued {
            st.queued = self.queue.submit(self.pos, hint);
            log::trace!(
                target: "render",
                "queue pos={:?} version={:?} accepted={}",
                self.pos,
                st.requested_version,
                st.queued
            );
        }
    }

    pub fn start_building_cache(&self) -> BuildTicket {
        let mut st = self.state.lock();
        let refresh_boundary = if st.erase_box_cache {
            self.boxes.clear();
            st.erase_box_cache = false;
            st.boundary_dirty = false;
            false
        } else {
            std::mem::take(&mut st.boundary_dirty)
        };
        st.blocked += 1;
        BuildTicket {
            version: st.requested_version,
            pass_index: self.clock.current(),
            refresh_boundary,
        }
    }

    /// Commits a finished build. Returns false if a newer request or render pass
    /// arrived since `start_building_cache`; the buffers are installed regardless.
    pub fn finish_building_cache(
        &self,
        version: Option<i8>,
        buffers: BufferMap,
        pass_index: u64,
        force: bool,
    ) -> bool {
        let mut st = self.state.lock();
        st.committed_pass = Some(pass_index);
        let accepted = force
            || (version == st.requested_version && pass_index == self.clock.current());
        if accepted {
            st.queued = false;
            st.stale = false;
            st.committed_version = version;
        } else {
            st.stale = true;
            log::debug!(
                target: "render",
                "stale build pos={:?} built={:?} requested={:?}",
                self.pos,
                version,
                st.requested_version
            );
        }
        st.light_changed = false;
        self.buffers.set_buffers(buffers);
        Self::release(&mut st);
        accepted
    }

    /// Resubmits a block whose last build was rejected. Returns true if the queue accepted it.
    pub fn resubmit_stale(&self) -> bool {
        let mut st = self.state.lock();
        if !st.stale {
            return false;
        }
        st.queued = self.queue.submit(self.pos, None);
        if st.queued {
            st.stale = false;
        }
        st.queued
    }

    /// Drops every cache. Versions are kept.
    /// A build already in flight still installs its buffers when it finishes.
    pub fn chunk_unload(&self) {
        let mut st = self.state.lock();
        self.buffers.set_empty();
        self.boxes.clear();
        st.cached_bounds = None;
        st.bounds_dirty = true;
    }

    /// Takes a hold. Returns true if someone already held it.
    pub fn get_and_set_blocked(&self) -> bool {
        let mut st = self.state.lock();
        let was = st.blocked > 0;
        st.blocked += 1;
        was
    }

    pub fn unset_blocked(&self) {
        Self::release(&mut self.state.lock());
    }

    fn release(st: &mut ScheduleState) {
        debug_assert!(st.blocked > 0, "hold released more often than taken");
        st.blocked = st.blocked.saturating_sub(1);
    }

    /// Runs one full build pass for this block and commits it.
    pub fn build(&self, source: &dyn TileSource, neighbours: &dyn NeighbourQuery) -> BuildOutcome {
        let t0 = Instant::now();
        let ticket = self.start_building_cache();
        let ctx = BuildContext {
            pos: self.pos,
            source,
            neighbours,
        };
        let boxes = if ticket.refresh_boundary {
            self.boxes.refresh_boundary_faces(&ctx)
        } else {
            self.boxes.get_rendering_boxes(&ctx)
        };
        let t_boxes_ms = ms_since(t0);

        let mut meshes = bake_layers(&boxes, source.grid(), source.light());
        let producers = self.buffers.take_additional();
        let additional = producers.len();
        for produce in producers {
            produce(&mut meshes);
        }
        meshes.retain(|_, mb| !mb.is_empty());
        let buffers = upload_layers(meshes);
        let layers = buffers.len();
        let vertices = buffers.values().map(|b| b.vertex_count()).sum();

        let accepted = self.finish_building_cache(ticket.version, buffers, ticket.pass_index, false);
        let t_total_ms = ms_since(t0);
        log::debug!(
            target: "perf",
            "ms={} render_build pos={:?} boxes_ms={} layers={} verts={} boundary_only={} accepted={}",
            t_total_ms,
            self.pos,
            t_boxes_ms,
            layers,
            vertices,
            ticket.refresh_boundary,
            accepted
        );
        BuildOutcome {
            accepted,
            version: ticket.version,
            refreshed_boundary: ticket.refresh_boundary,
            layers,
            vertices,
            additional,
            t_boxes_ms,
            t_total_ms,
        }
    }

    pub fn is_build_outstanding(&self) -> bool {
        self.state.lock().queued
    }

    pub fn is_queued_or_unbuilt(&self) -> bool {
        let st = self.state.lock();
        st.queued || st.committed_version.is_none()
    }

    /// Farthest distance any contributing structure wants this block drawn from.
    pub fn max_render_distance(&self, source: &dyn TileSource) -> f32 {
        let mut st = self.state.lock();
        *st.cached_render_distance.get_or_insert_with(|| {
            source
                .groups()
                .iter()
                .filter_map(|g| g.structure())
                .map(|s| s.render_distance())
                .fold(self.default_render_distance, f32::max)
        })
    }

    /// World-space bounds of the block's tiles and every structure they belong to.
    pub fn render_bounding_box(&self, source: &dyn TileSource) -> Aabb {
        let mut st = self.state.lock();
        if st.bounds_dirty || st.cached_bounds.is_none() {
            let origin = self.pos.to_vec3();
            let local = source
                .local_bounds()
                .unwrap_or(Aabb::new(Vec3::default(), Vec3::new(1.0, 1.0, 1.0)));
            let bounds = source
                .groups()
                .iter()
                .filter_map(|g| g.structure())
                .filter_map(|s| s.surrounding_box())
                .fold(local.offset(origin), Aabb::union);
            st.cached_bounds = Some(bounds);
            st.bounds_dirty = false;
        }
        st.cached_bounds.unwrap_or_default()
    }

    /// Current render boxes without building them.
    pub fn cached_boxes(&self) -> Option<Arc<BoxMap>> {
        self.boxes.cached()
    }

    pub fn box_cache(&self) -> &RenderBoxCache {
        &self.boxes
    }

    pub fn buffers(&self) -> &BufferCache {
        &self.buffers
    }

    pub fn requested_version(&self) -> Option<i8> {
        self.state.lock().requested_version
    }

    pub fn committed_version(&self) -> Option<i8> {
        self.state.lock().committed_version
    }

    pub fn hold_count(&self) -> usize {
        self.state.lock().blocked
    }
}
