use std::collections::HashMap;
use std::sync::Arc;

use tessel_geom::Facing;
use tessel_tiles::{Fan, GroupKey, RenderLayer, Tile, TileBox};

/// Render decision for one box face.
#[derive(Clone, Debug, PartialEq)]
pub enum FaceRender {
    Suppressed,
    Full,
    /// Partially visible translucent face; `tile` is kept for texture and shading lookup.
    Fan { fans: Vec<Fan>, tile: Arc<Tile> },
}

impl FaceRender {
    #[inline]
    pub fn is_suppressed(&self) -> bool {
        matches!(self, FaceRender::Suppressed)
    }

    #[inline]
    pub fn is_fan(&self) -> bool {
        matches!(self, FaceRender::Fan { .. })
    }
}

/// One renderable cuboid with a decision per face.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderBox {
    pub bounds: TileBox,
    pub color: [u8; 4],
    pub tile: Option<Arc<Tile>>,
    faces: [FaceRender; 6],
    outside: [bool; 6],
}

impl RenderBox {
    pub fn new(bounds: TileBox, color: [u8; 4]) -> Self {
        Self {
            bounds,
            color,
            tile: None,
            faces: std::array::from_fn(|_| FaceRender::Full),
            outside: [false; 6],
        }
    }

    pub fn for_tile(tile: &Arc<Tile>, bounds: TileBox) -> Self {
        let mut rb = Self::new(bounds, tile.color);
        rb.tile = Some(Arc::clone(tile));
        rb
    }

    #[inline]
    pub fn face(&self, facing: Facing) -> &FaceRender {
        &self.faces[facing.index()]
    }

    #[inline]
    pub fn set_face(&mut self, facing: Facing, render: FaceRender, outside: bool) {
        self.faces[facing.index()] = render;
        self.outside[facing.index()] = outside;
    }

    /// Returns true if the face depends on the neighbouring block.
    #[inline]
    pub fn is_outside(&self, facing: Facing) -> bool {
        self.outside[facing.index()]
    }

    pub fn visible_faces(&self) -> usize {
        self.faces.iter().filter(|f| !f.is_suppressed()).count()
    }
}

pub type LayerBoxes = HashMap<RenderLayer, Vec<RenderBox>>;
pub type BoxMap = HashMap<GroupKey, LayerBoxes>;
