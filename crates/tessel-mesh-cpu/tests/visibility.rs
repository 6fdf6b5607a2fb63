mod common;

use std::sync::Arc;

use common::{Counting, CountingNeighbours, glass_half, stone_full};
use proptest::prelude::*;
use tessel_geom::Facing;
use tessel_mesh_cpu::{FaceRender, resolve_face};
use tessel_tiles::{FaceRect, FaceState, Grid, TileBox};

fn arb_facing() -> impl Strategy<Value = Facing> {
    (0usize..6).prop_map(Facing::from_index)
}

fn arb_partial_rects() -> impl Strategy<Value = Vec<FaceRect>> {
    proptest::collection::vec(
        (0..15, 0..15, 1..8, 1..8).prop_map(|(u, v, w, h)| FaceRect::new(u, v, u + w, v + h)),
        1..4,
    )
}

proptest! {
    // Fully covered faces never render, translucent or not
    #[test]
    fn covered_faces_are_suppressed(facing in arb_facing(), translucent in any::<bool>(), outside in any::<bool>()) {
        let tile = Arc::new(if translucent { glass_half() } else { stone_full() });
        let bx = tile.boxes[0];
        let own = Counting::new(true);
        let nb = CountingNeighbours::answering(true);
        let r = resolve_face(facing, &FaceState::covered(outside), Some(&tile), &bx, Grid::DEFAULT, &own, &nb);
        prop_assert_eq!(r, FaceRender::Suppressed);
        prop_assert_eq!(own.calls.get(), 0);
        prop_assert_eq!(nb.lookups.get(), 0);
    }

    // Opaque tiles never produce fans, however the face is covered
    #[test]
    fn opaque_faces_never_fan(facing in arb_facing(), rects in arb_partial_rects(), outside in any::<bool>()) {
        let tile = Arc::new(stone_full());
        let bx = tile.boxes[0];
        let own = Counting::new(true);
        let nb = CountingNeighbours::answering(true);
        let r = resolve_face(facing, &FaceState::partial(outside, rects), Some(&tile), &bx, Grid::DEFAULT, &own, &nb);
        prop_assert_eq!(r, FaceRender::Full);
    }
}

#[test]
fn open_face_renders_full_without_queries() {
    let tile = Arc::new(glass_half());
    let own = Counting::new(false);
    let nb = CountingNeighbours::answering(false);
    for facing in Facing::ALL {
        let r = resolve_face(
            facing,
            &FaceState::open(true),
            Some(&tile),
            &tile.boxes[0],
            Grid::DEFAULT,
            &own,
            &nb,
        );
        assert_eq!(r, FaceRender::Full);
    }
    assert_eq!(own.calls.get(), 0);
    assert_eq!(nb.lookups.get(), 0);
}

#[test]
fn missing_tile_renders_full_when_partial() {
    let own = Counting::new(false);
    let nb = CountingNeighbours::absent();
    let bx = TileBox::full(Grid::DEFAULT);
    let state = FaceState::partial(false, vec![FaceRect::new(0, 0, 8, 8)]);
    let r = resolve_face(Facing::PosX, &state, None, &bx, Grid::DEFAULT, &own, &nb);
    assert_eq!(r, FaceRender::Full);
}

#[test]
fn inside_partial_translucent_face_asks_own_block() {
    let tile = Arc::new(glass_half());
    let bx = tile.boxes[0];
    let state = FaceState::partial(false, vec![FaceRect::new(0, 0, 8, 16)]);
    let nb = CountingNeighbours::answering(false);

    let yes = Counting::new(true);
    let r = resolve_face(Facing::PosY, &state, Some(&tile), &bx, Grid::DEFAULT, &yes, &nb);
    match r {
        FaceRender::Fan { fans, tile: t } => {
            assert!(Arc::ptr_eq(&t, &tile));
            assert_eq!(fans.len(), 1);
            // visible half: x in [0.5, 1], top of the half slab
            assert!(fans[0].vertices.iter().all(|v| v.x >= 0.5 && (v.y - 0.5).abs() < 1e-6));
        }
        other => panic!("expected fan, got {other:?}"),
    }
    assert_eq!(yes.calls.get(), 1);
    assert_eq!(nb.lookups.get(), 0);

    let no = Counting::new(false);
    let r = resolve_face(Facing::PosY, &state, Some(&tile), &bx, Grid::DEFAULT, &no, &nb);
    assert_eq!(r, FaceRender::Suppressed);
}

#[test]
fn outside_partial_translucent_face_asks_neighbour_in_its_frame() {
    let tile = Arc::new(glass_half());
    let bx = tile.boxes[0];
    let own = Counting::new(false);
    let state = FaceState::partial(true, vec![FaceRect::new(0, 0, 4, 16)]);

    let nb = CountingNeighbours::answering(true);
    let r = resolve_face(Facing::PosX, &state, Some(&tile), &bx, Grid::DEFAULT, &own, &nb);
    assert!(r.is_fan());
    assert_eq!(own.calls.get(), 0);
    let asked = nb.decider.as_ref().unwrap();
    assert_eq!(asked.calls.get(), 1);
    // +X face at x=16 lands on the neighbour's x=0 plane
    assert_eq!(asked.last_plane.get(), Some(0));

    let refusing = CountingNeighbours::answering(false);
    let r = resolve_face(Facing::PosX, &state, Some(&tile), &bx, Grid::DEFAULT, &own, &refusing);
    assert_eq!(r, FaceRender::Suppressed);

    let absent = CountingNeighbours::absent();
    let r = resolve_face(Facing::PosX, &state, Some(&tile), &bx, Grid::DEFAULT, &own, &absent);
    assert!(r.is_fan());
    assert_eq!(absent.lookups.get(), 1);
}
