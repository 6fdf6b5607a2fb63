#![allow(dead_code)]

use std::cell::Cell;
use std::sync::Arc;

use tessel_geom::{Aabb, BlockPos, Facing};
use tessel_mesh_cpu::{
    FaceDecider, LayerBoxes, NeighbourQuery, RenderBox, StructureRender, TileGroup, TileSource,
};
use tessel_tiles::{
    ConnectivityError, FaceRect, FaceState, Grid, GroupKey, RenderLayer, StructureId, Tile,
    TileBox, VisibleFace,
};

/// Decider that records what it was asked.
pub struct Counting {
    pub answer: bool,
    pub calls: Cell<usize>,
    pub last_plane: Cell<Option<i32>>,
}

impl Counting {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            calls: Cell::new(0),
            last_plane: Cell::new(None),
        }
    }
}

impl FaceDecider for Counting {
    fn should_face_be_rendered(&self, face: &VisibleFace, _tile: &Tile) -> bool {
        self.calls.set(self.calls.get() + 1);
        self.last_plane.set(Some(face.plane));
        self.answer
    }

    fn boundary_occluders(&self, _facing: Facing, _viewer: &Tile, _grid: Grid) -> Vec<FaceRect> {
        Vec::new()
    }
}

pub struct CountingNeighbours {
    pub decider: Option<Counting>,
    pub lookups: Cell<usize>,
}

impl CountingNeighbours {
    pub fn absent() -> Self {
        Self {
            decider: None,
            lookups: Cell::new(0),
        }
    }

    pub fn answering(answer: bool) -> Self {
        Self {
            decider: Some(Counting::new(answer)),
            lookups: Cell::new(0),
        }
    }
}

impl NeighbourQuery for CountingNeighbours {
    fn neighbour(&self, _facing: Facing) -> Option<&dyn FaceDecider> {
        self.lookups.set(self.lookups.get() + 1);
        self.decider.as_ref().map(|d| d as &dyn FaceDecider)
    }
}

pub struct FakeStructure {
    pub id: StructureId,
    pub result: Result<(), ConnectivityError>,
    pub extra: Vec<(RenderLayer, RenderBox)>,
    pub contributed: Cell<usize>,
}

impl FakeStructure {
    pub fn new(result: Result<(), ConnectivityError>) -> Self {
        let extra = RenderBox::new(TileBox::new([0, 0, 0], [16, 1, 16]), [10, 20, 30, 255]);
        Self {
            id: StructureId(7),
            result,
            extra: vec![(RenderLayer::Cutout, extra)],
            contributed: Cell::new(0),
        }
    }
}

impl StructureRender for FakeStructure {
    fn id(&self) -> StructureId {
        self.id
    }

    fn check_connections(&self) -> Result<(), ConnectivityError> {
        self.result
    }

    fn contribute_extra_boxes(&self, _origin: BlockPos, target: &mut LayerBoxes) {
        self.contributed.set(self.contributed.get() + 1);
        for (layer, rb) in &self.extra {
            target.entry(*layer).or_default().push(rb.clone());
        }
    }

    fn render_distance(&self) -> f32 {
        128.0
    }

    fn surrounding_box(&self) -> Option<Aabb> {
        None
    }
}

pub struct FakeGroup {
    pub key: GroupKey,
    pub tiles: Vec<Arc<Tile>>,
    pub structure: Option<FakeStructure>,
    pub skip: Option<TileBox>,
}

impl FakeGroup {
    pub fn plain(tiles: Vec<Tile>) -> Self {
        Self {
            key: GroupKey::Block,
            tiles: tiles.into_iter().map(Arc::new).collect(),
            structure: None,
            skip: None,
        }
    }
}

impl TileGroup for FakeGroup {
    fn key(&self) -> GroupKey {
        self.key
    }

    fn tiles(&self) -> &[Arc<Tile>] {
        &self.tiles
    }

    fn render_box(&self, tile: &Arc<Tile>, bx: &TileBox, _layer: RenderLayer) -> Option<RenderBox> {
        if self.skip == Some(*bx) {
            return None;
        }
        Some(RenderBox::for_tile(tile, *bx))
    }

    fn structure(&self) -> Option<&dyn StructureRender> {
        self.structure.as_ref().map(|s| s as &dyn StructureRender)
    }

    fn needs_extra_rendering(&self) -> bool {
        self.structure.is_some()
    }
}

type StateFn = Box<dyn Fn(&Tile, &TileBox, Facing) -> FaceState>;

pub struct FakeSource {
    pub grid: Grid,
    pub groups: Vec<FakeGroup>,
    pub states: StateFn,
    pub own: Counting,
    pub state_calls: Cell<usize>,
}

impl FakeSource {
    pub fn new(groups: Vec<FakeGroup>) -> Self {
        Self {
            grid: Grid::DEFAULT,
            groups,
            states: Box::new(|_, _, _| FaceState::open(false)),
            own: Counting::new(true),
            state_calls: Cell::new(0),
        }
    }

    pub fn with_states(mut self, f: impl Fn(&Tile, &TileBox, Facing) -> FaceState + 'static) -> Self {
        self.states = Box::new(f);
        self
    }
}

impl TileSource for FakeSource {
    fn grid(&self) -> Grid {
        self.grid
    }

    fn groups(&self) -> Vec<&dyn TileGroup> {
        self.groups.iter().map(|g| g as &dyn TileGroup).collect()
    }

    fn face_state(
        &self,
        tile: &Tile,
        bx: &TileBox,
        facing: Facing,
        _neighbours: &dyn NeighbourQuery,
    ) -> FaceState {
        self.state_calls.set(self.state_calls.get() + 1);
        (self.states)(tile, bx, facing)
    }

    fn decider(&self) -> &dyn FaceDecider {
        &self.own
    }
}

pub fn stone_full() -> Tile {
    Tile::new("stone", RenderLayer::Solid).with_box(TileBox::full(Grid::DEFAULT))
}

pub fn glass_half() -> Tile {
    Tile::new("glass", RenderLayer::Translucent)
        .with_color([200, 220, 255, 128])
        .with_box(TileBox::new([0, 0, 0], [16, 8, 16]))
}
