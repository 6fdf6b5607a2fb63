use proptest::prelude::*;
use tessel_geom::Facing;
use tessel_tiles::{Coverage, FaceRect, Grid, TileBox, VisibleFace};

fn arb_rect(max: i32) -> impl Strategy<Value = FaceRect> {
    (0..max, 0..max, 1..=max, 1..=max).prop_map(|(u, v, w, h)| FaceRect::new(u, v, u + w, v + h))
}

fn arb_facing() -> impl Strategy<Value = Facing> {
    (0usize..6).prop_map(Facing::from_index)
}

proptest! {
    // Greedy rects cover exactly the visible cells, each once
    #[test]
    fn visible_rects_cover_exact_mask(
        facing in arb_facing(),
        covered in proptest::collection::vec(arb_rect(16), 0..6),
    ) {
        let grid = Grid::DEFAULT;
        let bx = TileBox::full(grid);
        let face = VisibleFace::new(facing, &bx, grid, &covered);
        let rects = face.visible_rects();
        let mut cov = [[0u8; 16]; 16];
        for r in &rects {
            for v in r.v0..r.v1 {
                for u in r.u0..r.u1 {
                    cov[v as usize][u as usize] += 1;
                }
            }
        }
        for v in 0..16 {
            for u in 0..16 {
                let want = if face.is_visible(u, v) { 1 } else { 0 };
                prop_assert_eq!(cov[v as usize][u as usize], want);
            }
        }
        let fans = face.generate_fans();
        prop_assert_eq!(fans.len(), rects.len());
        prop_assert!(fans.iter().all(|f| f.triangle_count() == 2));
    }

    // Coverage agrees with the visible cell count
    #[test]
    fn coverage_matches_visible_cells(
        facing in arb_facing(),
        covered in proptest::collection::vec(arb_rect(16), 0..6),
    ) {
        let grid = Grid::DEFAULT;
        let bx = TileBox::full(grid);
        let face = VisibleFace::new(facing, &bx, grid, &covered);
        match Coverage::compute(bx.face_rect(facing), covered.iter().copied()) {
            Coverage::Open => prop_assert_eq!(face.visible_count(), 256),
            Coverage::Covered => prop_assert!(!face.has_visible()),
            Coverage::Partial(_) => {
                prop_assert!(face.has_visible());
                prop_assert!(face.visible_count() < 256);
            }
        }
    }

    // Shrinking conversion never grows a rect
    #[test]
    fn convert_inner_stays_inside(r in arb_rect(16)) {
        let g16 = Grid::DEFAULT;
        let g4 = Grid::new(4).unwrap();
        if let Some(c) = r.convert_inner(g16, g4) {
            let back = FaceRect::new(c.u0 * 4, c.v0 * 4, c.u1 * 4, c.v1 * 4);
            prop_assert!(back.u0 >= r.u0 && back.v0 >= r.v0);
            prop_assert!(back.u1 <= r.u1 && back.v1 <= r.v1);
        }
    }
}
