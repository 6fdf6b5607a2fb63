use serde::Deserialize;

use crate::constants::{DEFAULT_GRID_COUNT, MAX_GRID_COUNT, MIN_GRID_COUNT};

/// Subdivision of a block: `count` cells per axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u32")]
pub struct Grid {
    count: u32,
}

impl Grid {
    pub const DEFAULT: Grid = Grid {
        count: DEFAULT_GRID_COUNT,
    };

    /// Returns `None` outside of `1..=64`.
    #[inline]
    pub fn new(count: u32) -> Option<Grid> {
        (MIN_GRID_COUNT..=MAX_GRID_COUNT)
            .contains(&count)
            .then_some(Grid { count })
    }

    #[inline]
    pub fn count(self) -> i32 {
        self.count as i32
    }

    /// World units per grid cell.
    #[inline]
    pub fn pixel_size(self) -> f32 {
        1.0 / self.count as f32
    }

    #[inline]
    pub fn to_units(self, v: i32) -> f32 {
        v as f32 * self.pixel_size()
    }

    /// Converts a coordinate into `to`, rounding down.
    #[inline]
    pub fn convert_floor(self, v: i32, to: Grid) -> i32 {
        (v * to.count()).div_euclid(self.count())
    }

    /// Converts a coordinate into `to`, rounding up.
    #[inline]
    pub fn convert_ceil(self, v: i32, to: Grid) -> i32 {
        let n = v * to.count();
        let q = n.div_euclid(self.count());
        if n.rem_euclid(self.count()) != 0 { q + 1 } else { q }
    }
}

impl Default for Grid {
    fn default() -> Self {
        Grid::DEFAULT
    }
}

impl TryFrom<u32> for Grid {
    type Error = String;

    fn try_from(count: u32) -> Result<Self, Self::Error> {
        Grid::new(count).ok_or_else(|| {
            format!("grid count {count} outside {MIN_GRID_COUNT}..={MAX_GRID_COUNT}")
        })
    }
}
