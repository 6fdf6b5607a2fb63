//! Collaborator traits the render pipeline reads tile data through.

use std::sync::Arc;

use tessel_geom::{Aabb, BlockPos, Facing};
use tessel_tiles::{
    ConnectivityError, FaceRect, FaceState, Grid, GroupKey, RenderLayer, StructureId, Tile,
    TileBox, VisibleFace,
};

use crate::constants::MAX_LIGHT;
use crate::render_box::{LayerBoxes, RenderBox};

/// Render decisions a block answers for faces that touch it.
pub trait FaceDecider {
    /// Returns true if `face`, expressed in this block's frame, should be drawn for `tile`.
    fn should_face_be_rendered(&self, face: &VisibleFace, tile: &Tile) -> bool;

    /// Rects of this block's `facing` boundary face that hide `viewer`, converted to `grid`.
    fn boundary_occluders(&self, facing: Facing, viewer: &Tile, grid: Grid) -> Vec<FaceRect>;
}

/// Access to the adjacent blocks' deciders.
pub trait NeighbourQuery {
    fn neighbour(&self, facing: Facing) -> Option<&dyn FaceDecider>;
}

/// Neighbour query for an isolated block.
pub struct NoNeighbours;

impl NeighbourQuery for NoNeighbours {
    fn neighbour(&self, _facing: Facing) -> Option<&dyn FaceDecider> {
        None
    }
}

/// A multi-block structure that renders extra geometry next to its tiles.
pub trait StructureRender {
    fn id(&self) -> StructureId;

    fn check_connections(&self) -> Result<(), ConnectivityError>;

    /// Appends extra boxes for the block at `origin` into `target`.
    fn contribute_extra_boxes(&self, origin: BlockPos, target: &mut LayerBoxes);

    fn render_distance(&self) -> f32;

    /// World-space bounds of the whole structure, if known.
    fn surrounding_box(&self) -> Option<Aabb>;
}

/// Tiles sharing one structural parent.
pub trait TileGroup {
    fn key(&self) -> GroupKey;

    fn tiles(&self) -> &[Arc<Tile>];

    fn layers(&self) -> &[RenderLayer] {
        &RenderLayer::ALL
    }

    /// Produces the render box for a tile box in `layer`; `None` leaves it out.
    fn render_box(&self, tile: &Arc<Tile>, bx: &TileBox, _layer: RenderLayer) -> Option<RenderBox> {
        Some(RenderBox::for_tile(tile, *bx))
    }

    /// The structure owning these tiles, if any.
    fn structure(&self) -> Option<&dyn StructureRender> {
        None
    }

    /// Returns true if the structure renders extra boxes that need a connectivity check first.
    fn needs_extra_rendering(&self) -> bool {
        false
    }
}

/// Tile data of one voxel-subdivided block.
pub trait TileSource {
    fn grid(&self) -> Grid;

    fn groups(&self) -> Vec<&dyn TileGroup>;

    fn face_state(
        &self,
        tile: &Tile,
        bx: &TileBox,
        facing: Facing,
        neighbours: &dyn NeighbourQuery,
    ) -> FaceState;

    /// This block's own decider, asked about faces that do not leave the block.
    fn decider(&self) -> &dyn FaceDecider;

    fn light(&self) -> u8 {
        MAX_LIGHT
    }

    /// Union of all tile boxes in block-local units.
    fn local_bounds(&self) -> Option<Aabb> {
        let grid = self.grid();
        self.groups()
            .iter()
            .flat_map(|g| g.tiles().iter())
            .flat_map(|t| t.boxes.iter())
            .map(|b| b.to_aabb(grid))
            .reduce(Aabb::union)
    }
}

/// Everything a box-cache build reads.
pub struct BuildContext<'a> {
    pub pos: BlockPos,
    pub source: &'a dyn TileSource,
    pub neighbours: &'a dyn NeighbourQuery,
}
