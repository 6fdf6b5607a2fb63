use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use tessel_geom::Facing;
use tessel_tiles::{Grid, Tile, TileBox};

use crate::render_box::{BoxMap, LayerBoxes, RenderBox};
use crate::source::BuildContext;
use crate::visibility::resolve_face;

/// Lazily built render boxes of one block, replaced as a whole.
#[derive(Default)]
pub struct RenderBoxCache {
    boxes: RwLock<Option<Arc<BoxMap>>>,
    builds: AtomicU64,
    refreshes: AtomicU64,
}

impl RenderBoxCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cache without building it.
    pub fn cached(&self) -> Option<Arc<BoxMap>> {
        self.boxes.read().clone()
    }

    pub fn clear(&self) {
        *self.boxes.write() = None;
    }

    /// Number of full builds so far.
    pub fn build_count(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }

    /// Number of boundary-only refreshes so far.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    /// Returns the cached boxes, building them first if absent.
    pub fn get_rendering_boxes(&self, ctx: &BuildContext<'_>) -> Arc<BoxMap> {
        if let Some(existing) = self.cached() {
            return existing;
        }
        let t0 = Instant::now();
        let built = Arc::new(build_box_map(ctx));
        self.builds.fetch_add(1, Ordering::Relaxed);
        *self.boxes.write() = Some(Arc::clone(&built));
        log::debug!(
            target: "perf",
            "ms={} render_boxes_build pos={:?} groups={}",
            t0.elapsed().as_millis(),
            ctx.pos,
            built.len()
        );
        built
    }

    /// Re-resolves only faces on the block boundary, keeping everything else.
    /// Falls back to a full build when nothing is cached.
    pub fn refresh_boundary_faces(&self, ctx: &BuildContext<'_>) -> Arc<BoxMap> {
        let Some(current) = self.cached() else {
            return self.get_rendering_boxes(ctx);
        };
        let grid = ctx.source.grid();
        let mut next = (*current).clone();
        for layers in next.values_mut() {
            for boxes in layers.values_mut() {
                for rb in boxes.iter_mut() {
                    let Some(tile) = rb.tile.clone() else {
                        continue;
                    };
                    let bounds = rb.bounds;
                    resolve_faces(rb, &tile, &bounds, grid, ctx, true);
                }
            }
        }
        let next = Arc::new(next);
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        *self.boxes.write() = Some(Arc::clone(&next));
        next
    }
}

fn resolve_faces(
    rb: &mut RenderBox,
    tile: &Arc<Tile>,
    bx: &TileBox,
    grid: Grid,
    ctx: &BuildContext<'_>,
    outside_only: bool,
) {
    for facing in Facing::ALL {
        if outside_only && !rb.is_outside(facing) {
            continue;
        }
        let state = ctx.source.face_state(tile, bx, facing, ctx.neighbours);
        let render = resolve_face(
            facing,
            &state,
            Some(tile),
            bx,
            grid,
            ctx.source.decider(),
            ctx.neighbours,
        );
        rb.set_face(facing, render, state.outside);
    }
}

fn build_box_map(ctx: &BuildContext<'_>) -> BoxMap {
    let grid = ctx.source.grid();
    let mut map = BoxMap::new();
    for group in ctx.source.groups() {
        let mut layers = LayerBoxes::new();
        for &layer in group.layers() {
            for tile in group.tiles() {
                if !tile.can_render_in(layer) {
                    continue;
                }
                for bx in &tile.boxes {
                    let Some(mut rb) = group.render_box(tile, bx, layer) else {
                        continue;
                    };
                    resolve_faces(&mut rb, tile, bx, grid, ctx, false);
                    layers.entry(layer).or_default().push(rb);
                }
            }
        }
        if let Some(structure) = group.structure().filter(|_| group.needs_extra_rendering()) {
            match structure.check_connections() {
                Ok(()) => structure.contribute_extra_boxes(ctx.pos, &mut layers),
                Err(err) => {
                    log::debug!(target: "render", "no extra boxes at {:?}: {}", ctx.pos, err);
                }
            }
        }
        layers.retain(|_, boxes| !boxes.is_empty());
        if !layers.is_empty() {
            map.insert(group.key(), layers);
        }
    }
    map
}
