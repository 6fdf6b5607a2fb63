use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use tessel_geom::{BlockPos, Facing};
use tessel_mesh_cpu::{FaceDecider, NeighbourQuery};

use crate::block::TileBlock;

/// Loaded tile blocks by position. Blocks are immutable once shared; edits replace them.
#[derive(Default)]
pub struct TileWorld {
    blocks: RwLock<HashMap<BlockPos, Arc<TileBlock>>>,
}

impl TileWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the block at its position, returning the previous one.
    pub fn insert(&self, block: TileBlock) -> Option<Arc<TileBlock>> {
        let pos = block.pos;
        self.blocks.write().insert(pos, Arc::new(block))
    }

    pub fn remove(&self, pos: BlockPos) -> Option<Arc<TileBlock>> {
        self.blocks.write().remove(&pos)
    }

    pub fn get(&self, pos: BlockPos) -> Option<Arc<TileBlock>> {
        self.blocks.read().get(&pos).cloned()
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        self.blocks.read().contains_key(&pos)
    }

    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }

    /// Sorted positions of all loaded blocks.
    pub fn positions(&self) -> Vec<BlockPos> {
        let mut out: Vec<BlockPos> = self.blocks.read().keys().copied().collect();
        out.sort();
        out
    }

    /// Snapshot of the six adjacent blocks.
    pub fn neighbours(&self, pos: BlockPos) -> NeighbourView {
        let blocks = self.blocks.read();
        NeighbourView {
            blocks: Facing::ALL.map(|f| blocks.get(&pos.offset(f)).cloned()),
        }
    }

    /// Loaded blocks next to `pos`, with the facing that leads from `pos` to them.
    pub fn loaded_neighbours(&self, pos: BlockPos) -> Vec<(Facing, BlockPos)> {
        let blocks = self.blocks.read();
        Facing::ALL
            .into_iter()
            .map(|f| (f, pos.offset(f)))
            .filter(|(_, p)| blocks.contains_key(p))
            .collect()
    }
}

/// The neighbours of one block, captured at build time.
#[derive(Default)]
pub struct NeighbourView {
    blocks: [Option<Arc<TileBlock>>; 6],
}

impl NeighbourView {
    pub fn empty() -> Self {
        Self::default()
    }
}

impl NeighbourQuery for NeighbourView {
    fn neighbour(&self, facing: Facing) -> Option<&dyn FaceDecider> {
        self.blocks[facing.index()]
            .as_deref()
            .map(|b| b as &dyn FaceDecider)
    }
}
