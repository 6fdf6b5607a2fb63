use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tessel_geom::BlockPos;

/// Accepts blocks for a future build pass.
pub trait RenderQueue: Send + Sync {
    /// Returns true if the block was accepted. Must not block or call back into the block's manager.
    fn submit(&self, pos: BlockPos, hint: Option<BlockPos>) -> bool;
}

/// Shared render pass counter. Builds finished under a different pass are stale.
#[derive(Clone, Debug, Default)]
pub struct RenderPassClock(Arc<AtomicU64>);

impl RenderPassClock {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Starts a new pass and returns its index.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}
