//! TOML scene files: blocks, their tiles, and the structures linking them.

use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use hashbrown::HashMap;
use serde::Deserialize;
use tessel_geom::BlockPos;
use tessel_tiles::{Grid, RenderLayer, StructureId, Tile, TileBox};
use tessel_world::{ConnectionStatus, ExtraBox, LinkedStructure, TileBlock, TileWorld};

#[derive(Clone, Debug, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub grid: Grid,
    #[serde(default)]
    pub structures: Vec<SceneStructure>,
    #[serde(default)]
    pub blocks: Vec<SceneBlock>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SceneStructure {
    pub id: u32,
    #[serde(default = "default_status")]
    pub status: ConnectionStatus,
    pub render_distance: f32,
    #[serde(default)]
    pub parts: Vec<[i32; 3]>,
    #[serde(default)]
    pub extra: Vec<SceneExtra>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SceneExtra {
    pub origin: [i32; 3],
    pub layer: RenderLayer,
    /// min x y z, max x y z
    #[serde(rename = "box")]
    pub bounds: [i32; 6],
    #[serde(default = "default_color")]
    pub color: [u8; 4],
}

#[derive(Clone, Debug, Deserialize)]
pub struct SceneBlock {
    pub pos: [i32; 3],
    pub grid: Option<Grid>,
    pub light: Option<u8>,
    #[serde(default)]
    pub tiles: Vec<SceneTile>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SceneTile {
    pub name: String,
    pub layer: RenderLayer,
    #[serde(default = "default_color")]
    pub color: [u8; 4],
    pub translucent: Option<bool>,
    pub structure: Option<u32>,
    pub boxes: Vec<[i32; 6]>,
}

fn default_status() -> ConnectionStatus {
    ConnectionStatus::Connected
}

fn default_color() -> [u8; 4] {
    [255, 255, 255, 255]
}

#[inline]
fn tile_box(b: [i32; 6]) -> TileBox {
    TileBox::new([b[0], b[1], b[2]], [b[3], b[4], b[5]])
}

#[inline]
fn block_pos(p: [i32; 3]) -> BlockPos {
    BlockPos::new(p[0], p[1], p[2])
}

pub type StructureMap = HashMap<u32, Arc<LinkedStructure>>;

impl Scene {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let scene: Scene = toml::from_str(toml_str)?;
        let mut seen = hashbrown::HashSet::new();
        for b in &scene.blocks {
            if !seen.insert(b.pos) {
                return Err(format!("duplicate block at {:?}", b.pos).into());
            }
        }
        Ok(scene)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn build_structures(&self) -> StructureMap {
        self.structures
            .iter()
            .map(|s| {
                let mut ls = LinkedStructure::new(StructureId(s.id), s.render_distance);
                for &p in &s.parts {
                    ls = ls.with_part(block_pos(p));
                }
                for e in &s.extra {
                    ls = ls.with_extra(ExtraBox {
                        origin: block_pos(e.origin),
                        layer: e.layer,
                        bounds: tile_box(e.bounds),
                        color: e.color,
                    });
                }
                ls.set_status(s.status);
                (s.id, ls.into_shared())
            })
            .collect()
    }

    /// Builds one block. `carve` keeps only the lower half of every box.
    pub fn build_block(
        &self,
        def: &SceneBlock,
        structures: &StructureMap,
        carve: bool,
    ) -> Result<TileBlock, Box<dyn Error>> {
        let grid = def.grid.unwrap_or(self.grid);
        let mut block = TileBlock::new(block_pos(def.pos), grid);
        if let Some(light) = def.light {
            block.set_light(light);
        }
        for t in &def.tiles {
            let mut tile = Tile::new(t.name.clone(), t.layer).with_color(t.color);
            if let Some(translucent) = t.translucent {
                tile.translucent = translucent;
            }
            for &b in &t.boxes {
                let mut bx = tile_box(b);
                if carve && bx.max[1] - bx.min[1] > 1 {
                    bx.max[1] = bx.min[1] + (bx.max[1] - bx.min[1]) / 2;
                }
                tile = tile.with_box(bx);
            }
            match t.structure {
                Some(id) => {
                    let s = structures.get(&id).ok_or_else(|| {
                        format!("tile '{}' at {:?} names unknown structure {}", t.name, def.pos, id)
                    })?;
                    block.add_structure_tile(s, tile);
                }
                None => block.add_tile(tile),
            }
        }
        Ok(block)
    }

    /// Loads every block into a fresh world.
    pub fn build_world(&self) -> Result<(TileWorld, StructureMap), Box<dyn Error>> {
        let structures = self.build_structures();
        let world = TileWorld::new();
        for def in &self.blocks {
            world.insert(self.build_block(def, &structures, false)?);
        }
        Ok((world, structures))
    }

    pub fn block(&self, pos: BlockPos) -> Option<&SceneBlock> {
        self.blocks.iter().find(|b| block_pos(b.pos) == pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_mesh_cpu::{TileGroup, TileSource};
    use tessel_tiles::GroupKey;

    const SAMPLE: &str = r#"
grid = 16

[[structures]]
id = 7
status = "pending"
render_distance = 128.0
parts = [[0, 0, 0], [1, 0, 0]]

[[structures.extra]]
origin = [0, 0, 0]
layer = "cutout"
box = [4, 0, 4, 12, 2, 12]

[[blocks]]
pos = [0, 0, 0]
light = 12

[[blocks.tiles]]
name = "stone"
layer = "solid"
boxes = [[0, 0, 0, 16, 8, 16]]

[[blocks.tiles]]
name = "rail"
layer = "cutout"
structure = 7
boxes = [[0, 8, 0, 16, 9, 16]]

[[blocks]]
pos = [1, 0, 0]
grid = 8

[[blocks.tiles]]
name = "glass"
layer = "translucent"
boxes = [[0, 0, 0, 8, 8, 8]]
"#;

    #[test]
    fn sample_scene_builds_a_world() {
        let scene = Scene::from_toml_str(SAMPLE).unwrap();
        let (world, structures) = scene.build_world().unwrap();
        assert_eq!(world.len(), 2);
        assert_eq!(structures[&7].status(), ConnectionStatus::Pending);

        let a = world.get(BlockPos::new(0, 0, 0)).unwrap();
        assert_eq!(a.light(), 12);
        assert_eq!(a.tile_count(), 2);
        assert_eq!(a.groups().len(), 2);

        let b = world.get(BlockPos::new(1, 0, 0)).unwrap();
        assert_eq!(b.grid().count(), 8);
    }

    #[test]
    fn unknown_structure_is_an_error() {
        let bad = SAMPLE.replace("structure = 7", "structure = 8");
        let scene = Scene::from_toml_str(&bad).unwrap();
        assert!(scene.build_world().is_err());
    }

    #[test]
    fn duplicate_positions_are_rejected() {
        let dup = format!("{SAMPLE}\n[[blocks]]\npos = [1, 0, 0]\n");
        assert!(Scene::from_toml_str(&dup).is_err());
    }

    #[test]
    fn bad_grid_is_rejected() {
        assert!(Scene::from_toml_str("grid = 100").is_err());
    }

    #[test]
    fn carving_halves_boxes() {
        let scene = Scene::from_toml_str(SAMPLE).unwrap();
        let structures = scene.build_structures();
        let def = scene.block(BlockPos::new(0, 0, 0)).unwrap();
        let block = scene.build_block(def, &structures, true).unwrap();
        let stone = &block.group(GroupKey::Block).unwrap().tiles()[0];
        assert_eq!(stone.boxes[0].max[1], 4);
        // one-cell boxes stay as they are
        assert_eq!(block.local_bounds().unwrap().max.y, 9.0 / 16.0);
    }

    #[test]
    fn bundled_assets_load() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets");
        let scene = Scene::from_path(root.join("scene.toml")).unwrap();
        let (world, structures) = scene.build_world().unwrap();
        assert_eq!(world.len(), scene.blocks.len());
        assert_eq!(structures.len(), 2);
        assert!(tessel_runtime::RuntimeConfig::from_path(root.join("runtime.toml")).is_ok());
    }
}
