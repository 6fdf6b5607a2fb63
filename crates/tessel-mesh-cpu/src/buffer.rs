use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tessel_tiles::RenderLayer;

use crate::bake::LayerMeshes;
use crate::mesh_build::MeshBuild;

/// Immutable baked geometry of one layer, ready for upload.
#[derive(Debug, Default)]
pub struct LayerBuffer {
    mesh: MeshBuild,
    invalid: AtomicBool,
}

impl LayerBuffer {
    pub fn new(mesh: MeshBuild) -> Self {
        Self {
            mesh,
            invalid: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    /// Marks the buffer stale, e.g. after its upload was lost.
    pub fn invalidate(&self) {
        self.invalid.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_invalid(&self) -> bool {
        self.invalid.load(Ordering::Acquire)
    }
}

pub type BufferMap = HashMap<RenderLayer, Arc<LayerBuffer>>;

pub fn upload_layers(meshes: LayerMeshes) -> BufferMap {
    meshes
        .into_iter()
        .map(|(layer, mesh)| (layer, Arc::new(LayerBuffer::new(mesh))))
        .collect()
}
