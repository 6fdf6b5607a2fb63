use std::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureId(pub u32);

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structural parent of a set of tiles. `Block` groups tiles that belong to no structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Block,
    Structure(StructureId),
}

/// Structure connectivity failures. Both are transient and skip extra rendering for one pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ConnectivityError {
    #[error("structure {0} has a corrupted connection")]
    CorruptedConnection(StructureId),
    #[error("structure {0} is not connected yet")]
    NotYetConnected(StructureId),
}
