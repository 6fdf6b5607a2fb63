use std::sync::Arc;

use tessel_geom::{BlockPos, Facing};
use tessel_mesh_cpu::{FaceDecider, NeighbourQuery, StructureRender, TileGroup, TileSource};
use tessel_tiles::{Coverage, FaceRect, FaceState, Grid, GroupKey, Tile, TileBox, VisibleFace};

use crate::structure::LinkedStructure;

/// Tiles of one block that share a structural parent.
pub struct BlockGroup {
    key: GroupKey,
    tiles: Vec<Arc<Tile>>,
    structure: Option<Arc<LinkedStructure>>,
}

impl BlockGroup {
    pub fn new(key: GroupKey) -> Self {
        Self {
            key,
            tiles: Vec::new(),
            structure: None,
        }
    }

    pub fn for_structure(structure: Arc<LinkedStructure>) -> Self {
        Self {
            key: GroupKey::Structure(structure.id),
            tiles: Vec::new(),
            structure: Some(structure),
        }
    }
}

impl TileGroup for BlockGroup {
    fn key(&self) -> GroupKey {
        self.key
    }

    fn tiles(&self) -> &[Arc<Tile>] {
        &self.tiles
    }

    fn structure(&self) -> Option<&dyn StructureRender> {
        self.structure.as_deref().map(|s| s as &dyn StructureRender)
    }

    fn needs_extra_rendering(&self) -> bool {
        self.structure.as_ref().is_some_and(|s| s.has_extra_boxes())
    }
}

/// A block subdivided into a grid of tiles.
pub struct TileBlock {
    pub pos: BlockPos,
    grid: Grid,
    light: u8,
    groups: Vec<BlockGroup>,
}

impl TileBlock {
    pub fn new(pos: BlockPos, grid: Grid) -> Self {
        Self {
            pos,
            grid,
            light: tessel_mesh_cpu::MAX_LIGHT,
            groups: Vec::new(),
        }
    }

    pub fn set_light(&mut self, light: u8) {
        self.light = light.min(tessel_mesh_cpu::MAX_LIGHT);
    }

    /// Adds a tile without a structural parent. Boxes outside the grid are dropped.
    pub fn add_tile(&mut self, tile: Tile) {
        let tile = self.fit(tile);
        let idx = match self.groups.iter().position(|g| g.key == GroupKey::Block) {
            Some(i) => i,
            None => {
                self.groups.push(BlockGroup::new(GroupKey::Block));
                self.groups.len() - 1
            }
        };
        self.groups[idx].tiles.push(tile);
    }

    /// Adds a tile owned by `structure`.
    pub fn add_structure_tile(&mut self, structure: &Arc<LinkedStructure>, tile: Tile) {
        let tile = self.fit(tile);
        let key = GroupKey::Structure(structure.id);
        let idx = match self.groups.iter().position(|g| g.key == key) {
            Some(i) => i,
            None => {
                self.groups
                    .push(BlockGroup::for_structure(Arc::clone(structure)));
                self.groups.len() - 1
            }
        };
        self.groups[idx].tiles.push(tile);
    }

    pub fn group(&self, key: GroupKey) -> Option<&BlockGroup> {
        self.groups.iter().find(|g| g.key == key)
    }

    pub fn tile_count(&self) -> usize {
        self.groups.iter().map(|g| g.tiles.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tile_count() == 0
    }

    pub fn structures(&self) -> impl Iterator<Item = &Arc<LinkedStructure>> {
        self.groups.iter().filter_map(|g| g.structure.as_ref())
    }

    fn fit(&self, mut tile: Tile) -> Arc<Tile> {
        let before = tile.boxes.len();
        tile.boxes.retain(|b| b.fits(self.grid));
        if tile.boxes.len() != before {
            log::warn!(
                "dropped {} box(es) of '{}' outside grid {} at {:?}",
                before - tile.boxes.len(),
                tile.name,
                self.grid.count(),
                self.pos
            );
        }
        Arc::new(tile)
    }

    fn all_tiles(&self) -> impl Iterator<Item = &Arc<Tile>> {
        self.groups.iter().flat_map(|g| g.tiles.iter())
    }

    /// Boxes of tiles that hide `viewer`.
    fn occluding_boxes<'a>(&'a self, viewer: &'a Tile) -> impl Iterator<Item = &'a TileBox> + 'a {
        self.all_tiles()
            .filter(move |t| t.occludes(viewer))
            .flat_map(|t| t.boxes.iter())
    }
}

impl FaceDecider for TileBlock {
    fn should_face_be_rendered(&self, face: &VisibleFace, tile: &Tile) -> bool {
        let back = face.facing.opposite();
        let (ours, theirs) = (self.grid.count() as i64, face.grid.count() as i64);
        let rects: Vec<FaceRect> = self
            .occluding_boxes(tile)
            .filter(|b| b.plane(back) as i64 * theirs == face.plane as i64 * ours)
            .filter_map(|b| b.face_rect(back).convert_inner(self.grid, face.grid))
            .collect();
        let mut remaining = face.clone();
        remaining.cover(rects);
        remaining.has_visible()
    }

    fn boundary_occluders(&self, facing: Facing, viewer: &Tile, grid: Grid) -> Vec<FaceRect> {
        self.occluding_boxes(viewer)
            .filter(|b| b.on_boundary(facing, self.grid))
            .filter_map(|b| b.face_rect(facing).convert_inner(self.grid, grid))
            .collect()
    }
}

impl TileSource for TileBlock {
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
        neighbours: &dyn NeighbourQuery,
    ) -> FaceState {
        let rect = bx.face_rect(facing);
        if bx.on_boundary(facing, self.grid) {
            return match neighbours.neighbour(facing) {
                Some(n) => FaceState {
                    coverage: Coverage::compute(
                        rect,
                        n.boundary_occluders(facing.opposite(), tile, self.grid),
                    ),
                    outside: true,
                },
                None => FaceState::open(true),
            };
        }
        let plane = bx.plane(facing);
        let rects: Vec<FaceRect> = self
            .occluding_boxes(tile)
            .filter(|b| b.plane(facing.opposite()) == plane)
            .map(|b| b.face_rect(facing.opposite()))
            .collect();
        FaceState {
            coverage: Coverage::compute(rect, rects),
            outside: false,
        }
    }

    fn decider(&self) -> &dyn FaceDecider {
        self
    }

    fn light(&self) -> u8 {
        self.light
    }
}
