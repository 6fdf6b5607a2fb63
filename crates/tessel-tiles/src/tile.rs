use serde::Deserialize;
use tessel_geom::{Aabb, Facing, Vec3};

use crate::face::FaceRect;
use crate::grid::Grid;

/// Rendering pass bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderLayer {
    Solid,
    Cutout,
    CutoutMipped,
    Translucent,
}

impl RenderLayer {
    pub const ALL: [RenderLayer; 4] = [
        RenderLayer::Solid,
        RenderLayer::Cutout,
        RenderLayer::CutoutMipped,
        RenderLayer::Translucent,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Axis-aligned cuboid in a block's local grid. `min` inclusive, `max` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileBox {
    pub min: [i32; 3],
    pub max: [i32; 3],
}

impl TileBox {
    #[inline]
    pub const fn new(min: [i32; 3], max: [i32; 3]) -> Self {
        Self { min, max }
    }

    /// Box spanning the whole block.
    #[inline]
    pub fn full(grid: Grid) -> Self {
        let c = grid.count();
        Self::new([0, 0, 0], [c, c, c])
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        (0..3).all(|a| self.min[a] < self.max[a])
    }

    /// Returns true if the box lies inside a block of the given grid.
    #[inline]
    pub fn fits(&self, grid: Grid) -> bool {
        self.is_valid() && (0..3).all(|a| self.min[a] >= 0 && self.max[a] <= grid.count())
    }

    /// Grid coordinate of the plane holding the face on `facing`.
    #[inline]
    pub fn plane(&self, facing: Facing) -> i32 {
        let a = facing.axis().index();
        if facing.is_positive() { self.max[a] } else { self.min[a] }
    }

    /// In-plane extent of the face on `facing`.
    #[inline]
    pub fn face_rect(&self, facing: Facing) -> FaceRect {
        let (u, v) = facing.axis().plane_axes();
        let (u, v) = (u.index(), v.index());
        FaceRect::new(self.min[u], self.min[v], self.max[u], self.max[v])
    }

    /// Returns true if the face on `facing` lies on the block boundary.
    #[inline]
    pub fn on_boundary(&self, facing: Facing, grid: Grid) -> bool {
        if facing.is_positive() {
            self.plane(facing) == grid.count()
        } else {
            self.plane(facing) == 0
        }
    }

    /// Returns true if `other`'s face on `facing.opposite()` lies on this box's `facing` plane.
    #[inline]
    pub fn touches(&self, other: &TileBox, facing: Facing) -> bool {
        self.plane(facing) == other.plane(facing.opposite())
    }

    #[inline]
    pub fn to_aabb(&self, grid: Grid) -> Aabb {
        Aabb::new(
            Vec3::new(
                grid.to_units(self.min[0]),
                grid.to_units(self.min[1]),
                grid.to_units(self.min[2]),
            ),
            Vec3::new(
                grid.to_units(self.max[0]),
                grid.to_units(self.max[1]),
                grid.to_units(self.max[2]),
            ),
        )
    }
}

/// A named sub-voxel block variant made of one or more boxes.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    pub name: String,
    pub color: [u8; 4],
    pub translucent: bool,
    pub layer: RenderLayer,
    pub boxes: Vec<TileBox>,
}

impl Tile {
    pub fn new(name: impl Into<String>, layer: RenderLayer) -> Self {
        Self {
            name: name.into(),
            color: [255, 255, 255, 255],
            translucent: layer == RenderLayer::Translucent,
            layer,
            boxes: Vec::new(),
        }
    }

    pub fn with_color(mut self, color: [u8; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn with_box(mut self, b: TileBox) -> Self {
        self.boxes.push(b);
        self
    }

    #[inline]
    pub fn can_render_in(&self, layer: RenderLayer) -> bool {
        self.layer == layer
    }

    /// Returns true if this tile hides faces of `viewer` that touch it.
    /// Translucent tiles only hide faces of the same translucent tile.
    #[inline]
    pub fn occludes(&self, viewer: &Tile) -> bool {
        !self.translucent || (viewer.translucent && viewer.name == self.name)
    }
}
