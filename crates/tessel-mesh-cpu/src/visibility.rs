use std::sync::Arc;

use tessel_geom::Facing;
use tessel_tiles::{Coverage, FaceState, Grid, Tile, TileBox, VisibleFace};

use crate::render_box::FaceRender;
use crate::source::{FaceDecider, NeighbourQuery};

/// Decides how the face of `bx` on `facing` is drawn.
///
/// Covered faces are suppressed. Partially covered faces of translucent tiles are
/// cut down to their visible cells and turned into fans, provided the block that
/// ends up drawing them agrees (the neighbour for boundary faces, `own` otherwise).
/// Everything else is a plain quad.
pub fn resolve_face(
    facing: Facing,
    state: &FaceState,
    tile: Option<&Arc<Tile>>,
    bx: &TileBox,
    grid: Grid,
    own: &dyn FaceDecider,
    neighbours: &dyn NeighbourQuery,
) -> FaceRender {
    if state.is_covered() {
        return FaceRender::Suppressed;
    }
    let (Some(tile), Coverage::Partial(covered)) = (tile, &state.coverage) else {
        return FaceRender::Full;
    };
    if !tile.translucent {
        return FaceRender::Full;
    }

    let face = VisibleFace::new(facing, bx, grid, covered);
    let rendered = if state.outside {
        match neighbours.neighbour(facing) {
            Some(n) => n.should_face_be_rendered(&face.moved_to_neighbour(), tile),
            // unloaded neighbour: nothing to hide behind
            None => true,
        }
    } else {
        own.should_face_be_rendered(&face, tile)
    };

    if rendered {
        FaceRender::Fan {
            fans: face.generate_fans(),
            tile: Arc::clone(tile),
        }
    } else {
        FaceRender::Suppressed
    }
}
