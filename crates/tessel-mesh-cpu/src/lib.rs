//! CPU side of tile rendering: face visibility, render-box cache and layer baking.
#![forbid(unsafe_code)]

mod bake;
mod box_cache;
mod buffer;
mod constants;
mod mesh_build;
mod render_box;
mod source;
mod visibility;

pub use bake::{LayerMeshes, bake_layers};
pub use box_cache::RenderBoxCache;
pub use buffer::{BufferMap, LayerBuffer, upload_layers};
pub use constants::MAX_LIGHT;
pub use mesh_build::MeshBuild;
pub use render_box::{BoxMap, FaceRender, LayerBoxes, RenderBox};
pub use source::{
    BuildContext, FaceDecider, NeighbourQuery, NoNeighbours, StructureRender, TileGroup,
    TileSource,
};
pub use visibility::resolve_face;
