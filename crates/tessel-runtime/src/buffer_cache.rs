use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tessel_mesh_cpu::{BufferMap, LayerMeshes};

/// Work that appends supplemental geometry during a build pass.
pub type BufferProducer = Box<dyn FnOnce(&mut LayerMeshes) + Send>;

/// Handle passed to [`BufferCache::execute_additional`] callbacks.
#[derive(Default)]
pub struct AdditionalBuffers {
    producers: Vec<BufferProducer>,
}

impl AdditionalBuffers {
    pub fn add(&mut self, producer: impl FnOnce(&mut LayerMeshes) + Send + 'static) {
        self.producers.push(Box::new(producer));
    }

    pub fn len(&self) -> usize {
        self.producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }
}

/// Latest committed layer buffers of one block.
#[derive(Default)]
pub struct BufferCache {
    buffers: RwLock<Arc<BufferMap>>,
    additional: Mutex<AdditionalBuffers>,
}

impl BufferCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_buffers(&self, map: BufferMap) {
        *self.buffers.write() = Arc::new(map);
    }

    /// Drops all buffers and any pending producers.
    pub fn set_empty(&self) {
        *self.buffers.write() = Arc::new(BufferMap::new());
        self.additional.lock().producers.clear();
    }

    pub fn has_invalid_buffers(&self) -> bool {
        self.buffers.read().values().any(|b| b.is_invalid())
    }

    /// Lets `callback` register producers for the next build pass.
    ///
    /// Producers registered after that pass has collected them wait for the one after,
    /// so call this before the block is next updated.
    pub fn execute_additional<F>(&self, callback: F)
    where
        F: FnOnce(&mut AdditionalBuffers),
    {
        callback(&mut *self.additional.lock());
    }

    pub fn take_additional(&self) -> Vec<BufferProducer> {
        std::mem::take(&mut self.additional.lock().producers)
    }

    pub fn pending_additional(&self) -> usize {
        self.additional.lock().len()
    }

    /// Snapshot of the current buffers.
    pub fn buffers(&self) -> Arc<BufferMap> {
        Arc::clone(&self.buffers.read())
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.read().is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.buffers.read().values().map(|b| b.vertex_count()).sum()
    }
}
