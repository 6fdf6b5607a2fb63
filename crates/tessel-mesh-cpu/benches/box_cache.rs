use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use tessel_geom::{BlockPos, Facing};
use tessel_mesh_cpu::{
    BuildContext, FaceDecider, NoNeighbours, RenderBoxCache, TileGroup, TileSource, bake_layers,
};
use tessel_tiles::{
    Coverage, FaceRect, FaceState, Grid, GroupKey, RenderLayer, Tile, TileBox, VisibleFace,
};

// Checkerboard of 4x4x4 boxes alternating glass and stone.
struct Checker {
    tiles: Vec<Arc<Tile>>,
}

impl Checker {
    fn new() -> Self {
        let mut stone = Tile::new("stone", RenderLayer::Solid);
        let mut glass = Tile::new("glass", RenderLayer::Translucent);
        for x in 0..4 {
            for y in 0..4 {
                for z in 0..4 {
                    let b = TileBox::new([x * 4, y * 4, z * 4], [x * 4 + 4, y * 4 + 4, z * 4 + 4]);
                    if (x + y + z) % 2 == 0 {
                        stone.boxes.push(b);
                    } else {
                        glass.boxes.push(b);
                    }
                }
            }
        }
        Self {
            tiles: vec![Arc::new(stone), Arc::new(glass)],
        }
    }
}

impl TileGroup for Checker {
    fn key(&self) -> GroupKey {
        GroupKey::Block
    }

    fn tiles(&self) -> &[Arc<Tile>] {
        &self.tiles
    }
}

impl FaceDecider for Checker {
    fn should_face_be_rendered(&self, face: &VisibleFace, _tile: &Tile) -> bool {
        face.has_visible()
    }

    fn boundary_occluders(&self, _facing: Facing, _viewer: &Tile, _grid: Grid) -> Vec<FaceRect> {
        Vec::new()
    }
}

impl TileSource for Checker {
    fn grid(&self) -> Grid {
        Grid::DEFAULT
    }

    fn groups(&self) -> Vec<&dyn TileGroup> {
        vec![self as &dyn TileGroup]
    }

    fn face_state(
        &self,
        tile: &Tile,
        bx: &TileBox,
        facing: Facing,
        _neighbours: &dyn tessel_mesh_cpu::NeighbourQuery,
    ) -> FaceState {
        let outside = bx.on_boundary(facing, Grid::DEFAULT);
        let rect = bx.face_rect(facing);
        let occluders = self
            .tiles
            .iter()
            .filter(|t| t.occludes(tile))
            .flat_map(|t| t.boxes.iter())
            .filter(|o| bx.touches(o, facing))
            .map(|o| o.face_rect(facing.opposite()));
        FaceState {
            coverage: Coverage::compute(rect, occluders),
            outside,
        }
    }

    fn decider(&self) -> &dyn FaceDecider {
        self
    }
}

fn bench_box_cache(c: &mut Criterion) {
    let source = Checker::new();
    c.bench_function("render_boxes_build_checker", |b| {
        b.iter(|| {
            let cache = RenderBoxCache::new();
            let ctx = BuildContext {
                pos: BlockPos::new(0, 0, 0),
                source: &source,
                neighbours: &NoNeighbours,
            };
            black_box(cache.get_rendering_boxes(&ctx));
        })
    });

    let cache = RenderBoxCache::new();
    let ctx = BuildContext {
        pos: BlockPos::new(0, 0, 0),
        source: &source,
        neighbours: &NoNeighbours,
    };
    let boxes = cache.get_rendering_boxes(&ctx);
    c.bench_function("bake_layers_checker", |b| {
        b.iter(|| black_box(bake_layers(&boxes, Grid::DEFAULT, 15)))
    });
}

criterion_group!(benches, bench_box_cache);
criterion_main!(benches);
