use tessel_geom::Vec3;

/// CPU-side vertex and index arrays for one render layer.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct MeshBuild {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    pub idx: Vec<u32>,
    pub col: Vec<u8>,
}

impl MeshBuild {
    /// Pre-reserve capacity for approximately `n_quads` quads worth of data.
    #[inline]
    pub fn reserve_quads(&mut self, n_quads: usize) {
        // 4 vertices per quad
        self.pos.reserve(n_quads * 4 * 3);
        self.norm.reserve(n_quads * 4 * 3);
        self.uv.reserve(n_quads * 4 * 2);
        self.col.reserve(n_quads * 4 * 4);
        self.idx.reserve(n_quads * 6);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    /// Appends a quad (two triangles). Winding is flipped if it disagrees with `n`.
    pub fn add_quad(&mut self, quad: [Vec3; 4], n: Vec3, rgba: [u8; 4]) {
        self.add_fan(&quad, n, rgba);
    }

    /// Appends a convex triangle fan around `vs[0]`.
    pub fn add_fan(&mut self, vs: &[Vec3], n: Vec3, rgba: [u8; 4]) {
        if vs.len() < 3 {
            return;
        }
        let base = self.vertex_count() as u32;
        let cross = (vs[1] - vs[0]).cross(vs[2] - vs[0]);
        let flip = cross.dot(n) < 0.0;
        for v in vs {
            self.pos.extend_from_slice(&[v.x, v.y, v.z]);
            self.norm.extend_from_slice(&[n.x, n.y, n.z]);
            let (u, w) = planar_uv(*v, n);
            self.uv.extend_from_slice(&[u, w]);
            self.col.extend_from_slice(&rgba);
        }
        for i in 1..(vs.len() as u32 - 1) {
            if flip {
                self.idx.extend_from_slice(&[base, base + i + 1, base + i]);
            } else {
                self.idx.extend_from_slice(&[base, base + i, base + i + 1]);
            }
        }
    }
}

// Texture coordinates taken from the two in-plane world axes.
#[inline]
fn planar_uv(v: Vec3, n: Vec3) -> (f32, f32) {
    if n.x != 0.0 {
        (v.z, v.y)
    } else if n.y != 0.0 {
        (v.x, v.z)
    } else {
        (v.x, v.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_emits_two_triangles() {
        let mut mb = MeshBuild::default();
        let q = [
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 0.0),
        ];
        mb.add_quad(q, Vec3::new(0.0, 1.0, 0.0), [255; 4]);
        assert_eq!(mb.vertex_count(), 4);
        assert_eq!(mb.idx.len(), 6);
    }

    #[test]
    fn reversed_winding_is_flipped() {
        let mut mb = MeshBuild::default();
        let n = Vec3::new(0.0, 0.0, 1.0);
        let cw = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        ];
        mb.add_fan(&cw, n, [255; 4]);
        let p = |i: u32| {
            let i = i as usize * 3;
            Vec3::new(mb.pos[i], mb.pos[i + 1], mb.pos[i + 2])
        };
        let (a, b, c) = (p(mb.idx[0]), p(mb.idx[1]), p(mb.idx[2]));
        assert!((b - a).cross(c - a).dot(n) > 0.0);
    }
}
