use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use tessel_geom::{Aabb, BlockPos, Vec3};
use tessel_mesh_cpu::{LayerBoxes, RenderBox, StructureRender};
use tessel_tiles::{ConnectivityError, RenderLayer, StructureId, TileBox};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    Pending,
    Corrupted,
}

/// Geometry a structure draws in one of its blocks beyond the tiles themselves.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtraBox {
    pub origin: BlockPos,
    pub layer: RenderLayer,
    pub bounds: TileBox,
    pub color: [u8; 4],
}

/// A structure spanning several blocks.
pub struct LinkedStructure {
    pub id: StructureId,
    render_distance: f32,
    parts: Vec<BlockPos>,
    extra: Vec<ExtraBox>,
    status: Mutex<ConnectionStatus>,
}

impl LinkedStructure {
    pub fn new(id: StructureId, render_distance: f32) -> Self {
        Self {
            id,
            render_distance,
            parts: Vec::new(),
            extra: Vec::new(),
            status: Mutex::new(ConnectionStatus::Pending),
        }
    }

    pub fn with_part(mut self, pos: BlockPos) -> Self {
        if !self.parts.contains(&pos) {
            self.parts.push(pos);
        }
        self
    }

    pub fn with_extra(mut self, extra: ExtraBox) -> Self {
        self = self.with_part(extra.origin);
        self.extra.push(extra);
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn parts(&self) -> &[BlockPos] {
        &self.parts
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.lock()
    }

    pub fn set_status(&self, status: ConnectionStatus) {
        let mut s = self.status.lock();
        if *s != status {
            log::debug!(target: "render", "structure {} {:?} -> {:?}", self.id, *s, status);
            *s = status;
        }
    }

    #[inline]
    pub fn has_extra_boxes(&self) -> bool {
        !self.extra.is_empty()
    }
}

impl StructureRender for LinkedStructure {
    fn id(&self) -> StructureId {
        self.id
    }

    fn check_connections(&self) -> Result<(), ConnectivityError> {
        match self.status() {
            ConnectionStatus::Connected => Ok(()),
            ConnectionStatus::Pending => Err(ConnectivityError::NotYetConnected(self.id)),
            ConnectionStatus::Corrupted => Err(ConnectivityError::CorruptedConnection(self.id)),
        }
    }

    fn contribute_extra_boxes(&self, origin: BlockPos, target: &mut LayerBoxes) {
        for e in self.extra.iter().filter(|e| e.origin == origin) {
            target
                .entry(e.layer)
                .or_default()
                .push(RenderBox::new(e.bounds, e.color));
        }
    }

    fn render_distance(&self) -> f32 {
        self.render_distance
    }

    fn surrounding_box(&self) -> Option<Aabb> {
        self.parts
            .iter()
            .map(|p| {
                let min = p.to_vec3();
                Aabb::new(min, min + Vec3::new(1.0, 1.0, 1.0))
            })
            .reduce(Aabb::union)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp() -> ExtraBox {
        ExtraBox {
            origin: BlockPos::new(0, 0, 0),
            layer: RenderLayer::Cutout,
            bounds: TileBox::new([6, 16, 6], [10, 20, 10]),
            color: [255, 220, 120, 255],
        }
    }

    #[test]
    fn status_maps_to_connectivity_errors() {
        let s = LinkedStructure::new(StructureId(3), 64.0);
        assert_eq!(
            s.check_connections(),
            Err(ConnectivityError::NotYetConnected(StructureId(3)))
        );
        s.set_status(ConnectionStatus::Corrupted);
        assert_eq!(
            s.check_connections(),
            Err(ConnectivityError::CorruptedConnection(StructureId(3)))
        );
        s.set_status(ConnectionStatus::Connected);
        assert!(s.check_connections().is_ok());
    }

    #[test]
    fn extra_boxes_only_land_in_their_origin() {
        let s = LinkedStructure::new(StructureId(1), 32.0).with_extra(lamp());
        let mut here = LayerBoxes::new();
        s.contribute_extra_boxes(BlockPos::new(0, 0, 0), &mut here);
        assert_eq!(here[&RenderLayer::Cutout].len(), 1);

        let mut elsewhere = LayerBoxes::new();
        s.contribute_extra_boxes(BlockPos::new(1, 0, 0), &mut elsewhere);
        assert!(elsewhere.is_empty());
    }

    #[test]
    fn surrounding_box_spans_all_parts() {
        let s = LinkedStructure::new(StructureId(1), 32.0)
            .with_part(BlockPos::new(0, 0, 0))
            .with_part(BlockPos::new(2, 1, -1));
        let bb = s.surrounding_box().unwrap();
        assert_eq!(bb.min, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(bb.max, Vec3::new(3.0, 2.0, 1.0));
    }
}
