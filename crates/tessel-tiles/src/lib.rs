//! Tile, box, grid and face-coverage types for voxel-subdivided blocks.
#![forbid(unsafe_code)]

mod constants;
pub mod face;
pub mod grid;
pub mod structure;
pub mod tile;

pub use face::{Coverage, FaceMask, FaceRect, FaceState, Fan, VisibleFace};
pub use grid::Grid;
pub use structure::{ConnectivityError, GroupKey, StructureId};
pub use tile::{RenderLayer, Tile, TileBox};
