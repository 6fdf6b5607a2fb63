//! Face rectangles, coverage masks and the visible portion of partially covered faces.

use tessel_geom::{Facing, Vec3};

use crate::constants::{BITS_PER_WORD, WORD_INDEX_MASK, WORD_INDEX_SHIFT};
use crate::grid::Grid;
use crate::tile::TileBox;

/// Rectangle on a face plane in grid cells: `[u0, u1) x [v0, v1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FaceRect {
    pub u0: i32,
    pub v0: i32,
    pub u1: i32,
    pub v1: i32,
}

impl FaceRect {
    #[inline]
    pub const fn new(u0: i32, v0: i32, u1: i32, v1: i32) -> Self {
        Self { u0, v0, u1, v1 }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.u1 - self.u0
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.v1 - self.v0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.u0 >= self.u1 || self.v0 >= self.v1
    }

    #[inline]
    pub fn area(&self) -> i32 {
        if self.is_empty() { 0 } else { self.width() * self.height() }
    }

    #[inline]
    pub fn intersect(&self, other: &FaceRect) -> Option<FaceRect> {
        let r = FaceRect::new(
            self.u0.max(other.u0),
            self.v0.max(other.v0),
            self.u1.min(other.u1),
            self.v1.min(other.v1),
        );
        (!r.is_empty()).then_some(r)
    }

    /// Re-expresses the rect in `to`, shrinking to whole cells. `None` if nothing remains.
    pub fn convert_inner(self, from: Grid, to: Grid) -> Option<FaceRect> {
        if from == to {
            return Some(self);
        }
        let r = FaceRect::new(
            from.convert_ceil(self.u0, to),
            from.convert_ceil(self.v0, to),
            from.convert_floor(self.u1, to),
            from.convert_floor(self.v1, to),
        );
        (!r.is_empty()).then_some(r)
    }

    /// Corners in block units on the `plane` of `facing`, wound CCW around the facing normal.
    pub fn to_quad(self, facing: Facing, plane: i32, grid: Grid) -> [Vec3; 4] {
        let axis = facing.axis();
        let (ua, va) = axis.plane_axes();
        let w = grid.to_units(plane);
        let corner = |u: i32, v: i32| {
            let mut p = Vec3::default();
            p.set(axis, w);
            p.set(ua, grid.to_units(u));
            p.set(va, grid.to_units(v));
            p
        };
        let quad = [
            corner(self.u0, self.v0),
            corner(self.u1, self.v0),
            corner(self.u1, self.v1),
            corner(self.u0, self.v1),
        ];
        // u x v points along +X, -Y, +Z
        if matches!(facing, Facing::PosX | Facing::NegY | Facing::PosZ) {
            quad
        } else {
            [quad[0], quad[3], quad[2], quad[1]]
        }
    }
}

/// Cell bitmask over a `width x height` face, backed by `u64` words.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceMask {
    width: usize,
    height: usize,
    data: Vec<u64>,
}

impl FaceMask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height + WORD_INDEX_MASK) / BITS_PER_WORD],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn set(&mut self, u: usize, v: usize) {
        let i = v * self.width + u;
        self.data[i >> WORD_INDEX_SHIFT] |= 1u64 << (i & WORD_INDEX_MASK);
    }

    #[inline]
    pub fn get(&self, u: usize, v: usize) -> bool {
        let i = v * self.width + u;
        (self.data[i >> WORD_INDEX_SHIFT] >> (i & WORD_INDEX_MASK)) & 1 != 0
    }

    /// Sets every cell of `[u0, u1) x [v0, v1)` (local coordinates).
    pub fn fill(&mut self, u0: usize, v0: usize, u1: usize, v1: usize) {
        for v in v0..v1.min(self.height) {
            for u in u0..u1.min(self.width) {
                self.set(u, v);
            }
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.data.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count() == self.width * self.height
    }
}

/// How much of a face is hidden by adjacent geometry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Coverage {
    Open,
    /// Covered rects, clipped to the face.
    Partial(Vec<FaceRect>),
    Covered,
}

impl Coverage {
    /// Classifies `face` against the rects of adjacent occluders.
    pub fn compute(face: FaceRect, occluders: impl IntoIterator<Item = FaceRect>) -> Coverage {
        let mut mask = FaceMask::new(face.width().max(0) as usize, face.height().max(0) as usize);
        let mut covered = Vec::new();
        for r in occluders {
            let Some(c) = face.intersect(&r) else {
                continue;
            };
            mask.fill(
                (c.u0 - face.u0) as usize,
                (c.v0 - face.v0) as usize,
                (c.u1 - face.u0) as usize,
                (c.v1 - face.v0) as usize,
            );
            covered.push(c);
        }
        if covered.is_empty() {
            Coverage::Open
        } else if mask.is_full() {
            Coverage::Covered
        } else {
            Coverage::Partial(covered)
        }
    }
}

/// Occlusion state of one box face. `outside` is set when the face lies on the block boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceState {
    pub coverage: Coverage,
    pub outside: bool,
}

impl FaceState {
    #[inline]
    pub fn open(outside: bool) -> Self {
        Self {
            coverage: Coverage::Open,
            outside,
        }
    }

    #[inline]
    pub fn covered(outside: bool) -> Self {
        Self {
            coverage: Coverage::Covered,
            outside,
        }
    }

    #[inline]
    pub fn partial(outside: bool, rects: Vec<FaceRect>) -> Self {
        Self {
            coverage: Coverage::Partial(rects),
            outside,
        }
    }

    #[inline]
    pub fn is_covered(&self) -> bool {
        matches!(self.coverage, Coverage::Covered)
    }

    #[inline]
    pub fn is_partial(&self) -> bool {
        matches!(self.coverage, Coverage::Partial(_))
    }
}

/// Triangle fan in block-local units.
#[derive(Clone, Debug, PartialEq)]
pub struct Fan {
    pub vertices: Vec<Vec3>,
}

impl Fan {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.vertices.len().saturating_sub(2)
    }
}

/// The not-yet-covered portion of one box face.
#[derive(Clone, Debug, PartialEq)]
pub struct VisibleFace {
    pub facing: Facing,
    pub plane: i32,
    pub rect: FaceRect,
    pub grid: Grid,
    covered: FaceMask,
}

impl VisibleFace {
    /// Face of `bx` on `facing` with `covered` (absolute coordinates) removed.
    pub fn new(facing: Facing, bx: &TileBox, grid: Grid, covered: &[FaceRect]) -> Self {
        let rect = bx.face_rect(facing);
        let mut face = Self {
            facing,
            plane: bx.plane(facing),
            rect,
            grid,
            covered: FaceMask::new(rect.width() as usize, rect.height() as usize),
        };
        face.cover(covered.iter().copied());
        face
    }

    /// Removes the cells hidden by `rects` (absolute coordinates in `self.grid`).
    pub fn cover(&mut self, rects: impl IntoIterator<Item = FaceRect>) {
        for r in rects {
            if let Some(c) = self.rect.intersect(&r) {
                self.covered.fill(
                    (c.u0 - self.rect.u0) as usize,
                    (c.v0 - self.rect.v0) as usize,
                    (c.u1 - self.rect.u0) as usize,
                    (c.v1 - self.rect.v0) as usize,
                );
            }
        }
    }

    /// Returns true if the absolute cell `(u, v)` is inside the face and uncovered.
    #[inline]
    pub fn is_visible(&self, u: i32, v: i32) -> bool {
        if u < self.rect.u0 || u >= self.rect.u1 || v < self.rect.v0 || v >= self.rect.v1 {
            return false;
        }
        !self
            .covered
            .get((u - self.rect.u0) as usize, (v - self.rect.v0) as usize)
    }

    #[inline]
    pub fn visible_count(&self) -> usize {
        self.rect.area() as usize - self.covered.count()
    }

    #[inline]
    pub fn has_visible(&self) -> bool {
        self.visible_count() > 0
    }

    /// Same face expressed in the frame of the block across `facing`.
    pub fn moved_to_neighbour(&self) -> VisibleFace {
        let mut moved = self.clone();
        if self.facing.is_positive() {
            moved.plane -= self.grid.count();
        } else {
            moved.plane += self.grid.count();
        }
        moved
    }

    /// Visible cells merged greedily into maximal rectangles (absolute coordinates).
    pub fn visible_rects(&self) -> Vec<FaceRect> {
        let (w, h) = (self.covered.width(), self.covered.height());
        let mut used = FaceMask::new(w, h);
        let mut out = Vec::new();
        for v in 0..h {
            let mut u = 0;
            while u < w {
                if self.covered.get(u, v) || used.get(u, v) {
                    u += 1;
                    continue;
                }
                let mut du = 1;
                while u + du < w && !self.covered.get(u + du, v) && !used.get(u + du, v) {
                    du += 1;
                }
                let mut dv = 1;
                'grow: while v + dv < h {
                    for uu in u..u + du {
                        if self.covered.get(uu, v + dv) || used.get(uu, v + dv) {
                            break 'grow;
                        }
                    }
                    dv += 1;
                }
                used.fill(u, v, u + du, v + dv);
                out.push(FaceRect::new(
                    self.rect.u0 + u as i32,
                    self.rect.v0 + v as i32,
                    self.rect.u0 + (u + du) as i32,
                    self.rect.v0 + (v + dv) as i32,
                ));
                u += du;
            }
        }
        out
    }

    /// One 4-vertex fan per visible rectangle, at the grid's pixel resolution.
    pub fn generate_fans(&self) -> Vec<Fan> {
        self.visible_rects()
            .into_iter()
            .map(|r| Fan {
                vertices: r.to_quad(self.facing, self.plane, self.grid).to_vec(),
            })
            .collect()
    }
}
