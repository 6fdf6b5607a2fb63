//! Drives a render runtime over a loaded scene.

use std::collections::BTreeMap;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use hashbrown::HashSet;
use tessel_geom::BlockPos;
use tessel_mesh_cpu::{MAX_LIGHT, TileSource};
use tessel_runtime::{RenderJobOut, RenderRuntime, RuntimeConfig};
use tessel_tiles::RenderLayer;
use tessel_world::TileWorld;

use crate::scene::{Scene, StructureMap};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    pub jobs: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub resubmitted: usize,
    pub unregistered: usize,
    pub boundary_refreshes: usize,
    pub max_ms: u32,
}

impl PassReport {
    fn from_results(results: &[RenderJobOut]) -> Self {
        let mut r = PassReport {
            jobs: results.len(),
            ..PassReport::default()
        };
        for out in results {
            r.max_ms = r.max_ms.max(out.t_total_ms);
            r.resubmitted += usize::from(out.resubmitted);
            match &out.outcome {
                Some(o) if o.accepted => r.accepted += 1,
                Some(_) => r.rejected += 1,
                None => r.unregistered += 1,
            }
            if out.outcome.as_ref().is_some_and(|o| o.refreshed_boundary) {
                r.boundary_refreshes += 1;
            }
        }
        r
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
    pub blocks: usize,
    pub vertices: BTreeMap<RenderLayer, usize>,
    pub box_builds: u64,
    pub boundary_refreshes: u64,
    pub max_render_distance: f32,
}

pub struct Session {
    scene: Scene,
    structures: StructureMap,
    world: Arc<TileWorld>,
    runtime: RenderRuntime,
    carved: HashSet<BlockPos>,
    timeout: Duration,
}

impl Session {
    pub fn start(scene: Scene, config: RuntimeConfig) -> Result<Self, Box<dyn Error>> {
        let (world, structures) = scene.build_world()?;
        let world = Arc::new(world);
        let runtime = RenderRuntime::new(Arc::clone(&world), config)?;
        let registered = runtime.register_world();
        log::info!("scene loaded: {} blocks, {} structures", registered, structures.len());
        Ok(Self {
            scene,
            structures,
            world,
            runtime,
            carved: HashSet::new(),
            timeout: Duration::from_secs(30),
        })
    }

    pub fn runtime(&self) -> &RenderRuntime {
        &self.runtime
    }

    /// Section update on every block, then waits for the builds it caused.
    pub fn update(&self) -> PassReport {
        let requested = self.runtime.section_update_all();
        log::debug!(target: "runtime", "section update requested {} builds", requested);
        self.collect()
    }

    fn collect(&self) -> PassReport {
        PassReport::from_results(&self.runtime.run_until_idle(self.timeout))
    }

    /// One simulated edit: every third round changes light, the others carve or restore a block.
    pub fn edit_round(&mut self, round: usize) -> Result<PassReport, Box<dyn Error>> {
        let positions = self.world.positions();
        if positions.is_empty() {
            return Ok(PassReport::default());
        }
        let pos = positions[round % positions.len()];
        let def = self
            .scene
            .block(pos)
            .ok_or_else(|| format!("no scene block at {pos:?}"))?;
        let carve = self.carved.contains(&pos);

        if round % 3 == 2 {
            let light = self.world.get(pos).map_or(MAX_LIGHT, |b| b.light());
            let mut block = self.scene.build_block(def, &self.structures, carve)?;
            block.set_light(MAX_LIGHT - light);
            self.world.insert(block);
            self.runtime.light_changed(pos);
            log::info!("round {round}: light at {pos:?} {light} -> {}", MAX_LIGHT - light);
            return Ok(self.update());
        }

        let carve = !carve;
        let block = self.scene.build_block(def, &self.structures, carve)?;
        self.world.insert(block);
        if carve {
            self.carved.insert(pos);
        } else {
            self.carved.remove(&pos);
        }
        self.runtime.tiles_changed(pos);
        log::info!("round {round}: {} {pos:?}", if carve { "carved" } else { "restored" });
        Ok(self.collect())
    }

    /// Swaps in a new scene, rebuilding every block it touches.
    pub fn reload(&mut self, scene: Scene) -> Result<PassReport, Box<dyn Error>> {
        let structures = scene.build_structures();
        let mut blocks = Vec::with_capacity(scene.blocks.len());
        for def in &scene.blocks {
            blocks.push(scene.build_block(def, &structures, false)?);
        }
        let keep: HashSet<BlockPos> = blocks.iter().map(|b| b.pos).collect();
        for pos in self.world.positions() {
            if !keep.contains(&pos) {
                self.world.remove(pos);
                self.runtime.unregister(pos);
                self.runtime.tiles_changed(pos);
            }
        }
        for block in blocks {
            let pos = block.pos;
            self.world.insert(block);
            self.runtime.register(pos);
            self.runtime.tiles_changed(pos);
        }
        self.scene = scene;
        self.structures = structures;
        self.carved.clear();
        log::info!("scene reloaded: {} blocks", self.world.len());
        Ok(self.update())
    }

    pub fn summary(&self) -> Summary {
        let mut s = Summary {
            blocks: self.world.len(),
            ..Summary::default()
        };
        for pos in self.runtime.registered() {
            let Some(m) = self.runtime.manager(pos) else {
                continue;
            };
            for (layer, buf) in m.buffers().buffers().iter() {
                *s.vertices.entry(*layer).or_default() += buf.vertex_count();
            }
            s.box_builds += m.box_cache().build_count();
            s.boundary_refreshes += m.box_cache().refresh_count();
            if let Some(block) = self.world.get(pos) {
                s.max_render_distance = s.max_render_distance.max(m.max_render_distance(block.as_ref()));
            }
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = r#"
[[blocks]]
pos = [0, 0, 0]
[[blocks.tiles]]
name = "stone"
layer = "solid"
boxes = [[0, 0, 0, 16, 16, 16]]

[[blocks]]
pos = [1, 0, 0]
[[blocks.tiles]]
name = "stone"
layer = "solid"
boxes = [[0, 0, 0, 16, 16, 16]]
"#;

    fn session() -> Session {
        let _ = env_logger::builder().is_test(true).try_init();
        let cfg = RuntimeConfig {
            workers: 2,
            ..RuntimeConfig::default()
        };
        Session::start(Scene::from_toml_str(ROW).unwrap(), cfg).unwrap()
    }

    #[test]
    fn first_update_builds_everything() {
        let s = session();
        let r = s.update();
        assert_eq!(r.jobs, 2);
        assert_eq!(r.accepted, 2);
        let sum = s.summary();
        assert_eq!(sum.vertices[&RenderLayer::Solid], 40);
        assert_eq!(sum.box_builds, 2);
        assert_eq!(sum.max_render_distance, 64.0);
    }

    #[test]
    fn carving_rebuilds_block_and_refreshes_neighbour() {
        let mut s = session();
        s.update();
        let r = s.edit_round(0).unwrap();
        assert_eq!(r.jobs, 2);
        assert_eq!(r.boundary_refreshes, 1);
        let sum = s.summary();
        // the neighbour's shared face is now only half covered
        assert_eq!(sum.vertices[&RenderLayer::Solid], 44);
    }

    #[test]
    fn light_rounds_reuse_box_caches() {
        let mut s = session();
        s.update();
        let r = s.edit_round(2).unwrap();
        assert_eq!(r.jobs, 1);
        assert_eq!(s.summary().box_builds, 2);
    }

    #[test]
    fn reload_drops_missing_blocks() {
        let mut s = session();
        s.update();
        let one = ROW.split("[[blocks]]").take(2).collect::<Vec<_>>().join("[[blocks]]");
        let r = s.reload(Scene::from_toml_str(&one).unwrap()).unwrap();
        assert!(r.accepted >= 1);
        let sum = s.summary();
        assert_eq!(sum.blocks, 1);
        assert_eq!(sum.vertices[&RenderLayer::Solid], 24);
    }
}
