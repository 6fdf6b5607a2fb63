//! Tile blocks, their neighbourhood, and the structures linking them.
#![forbid(unsafe_code)]

mod block;
mod structure;
mod world;

pub use block::{BlockGroup, TileBlock};
pub use structure::{ConnectionStatus, ExtraBox, LinkedStructure};
pub use world::{NeighbourView, TileWorld};
