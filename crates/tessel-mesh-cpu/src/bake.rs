use std::collections::HashMap;

use tessel_geom::Facing;
use tessel_tiles::{Grid, RenderLayer};

use crate::constants::{
    INITIAL_QUAD_CAP, MAX_LIGHT, MIN_VISUAL_LIGHT, SHADE_BOTTOM, SHADE_TOP, SHADE_X, SHADE_Z,
};
use crate::mesh_build::MeshBuild;
use crate::render_box::{BoxMap, FaceRender};

pub type LayerMeshes = HashMap<RenderLayer, MeshBuild>;

#[inline]
fn facing_shade(facing: Facing) -> f32 {
    match facing {
        Facing::PosY => SHADE_TOP,
        Facing::NegY => SHADE_BOTTOM,
        Facing::PosX | Facing::NegX => SHADE_X,
        Facing::PosZ | Facing::NegZ => SHADE_Z,
    }
}

#[inline]
fn shaded(rgba: [u8; 4], facing: Facing, light: u8) -> [u8; 4] {
    let l = light.clamp(MIN_VISUAL_LIGHT, MAX_LIGHT) as f32 / MAX_LIGHT as f32;
    let k = facing_shade(facing) * l;
    let ch = |c: u8| (c as f32 * k).round().clamp(0.0, 255.0) as u8;
    [ch(rgba[0]), ch(rgba[1]), ch(rgba[2]), rgba[3]]
}

/// Turns render boxes into per-layer geometry in block-local units.
pub fn bake_layers(boxes: &BoxMap, grid: Grid, light: u8) -> LayerMeshes {
    let mut out = LayerMeshes::new();
    for layers in boxes.values() {
        for (layer, list) in layers {
            let mb = out.entry(*layer).or_insert_with(|| {
                let mut mb = MeshBuild::default();
                mb.reserve_quads(INITIAL_QUAD_CAP);
                mb
            });
            for rb in list {
                for facing in Facing::ALL {
                    let n = facing.normal();
                    match rb.face(facing) {
                        FaceRender::Suppressed => {}
                        FaceRender::Full => {
                            let quad = rb.bounds.face_rect(facing).to_quad(
                                facing,
                                rb.bounds.plane(facing),
                                grid,
                            );
                            mb.add_quad(quad, n, shaded(rb.color, facing, light));
                        }
                        FaceRender::Fan { fans, tile } => {
                            let rgba = shaded(tile.color, facing, light);
                            for fan in fans {
                                mb.add_fan(&fan.vertices, n, rgba);
                            }
                        }
                    }
                }
            }
        }
    }
    out.retain(|_, mb| !mb.is_empty());
    out
}
