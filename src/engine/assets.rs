// Background asset loading with one-shot completion events.
//
// Each load runs on its own thread and reports back over a channel. The main
// loop drains finished loads between frames, so the simulation only ever sees
// a load as a single event applied on its own thread.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use glam::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::bounds::Aabb;
use super::components::{LEFT_ARM, LEFT_LEG, LEFT_UP_LEG, RIGHT_ARM, RIGHT_LEG, RIGHT_UP_LEG};
use super::scene::{NodeId, SceneGraph, SceneNode};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to load glTF file {path}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("{0} contains no scene nodes")]
    EmptyScene(PathBuf),

    #[error("failed to start loader thread: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Avatar,
    Environment,
}

#[derive(Debug, Clone)]
pub enum AssetSource {
    Gltf(PathBuf),
    ProceduralHumanoid,
    ProceduralCity { seed: u64, floor_name: String },
}

impl AssetSource {
    pub fn load(self) -> Result<SceneGraph, AssetError> {
        match self {
            AssetSource::Gltf(path) => load_gltf(&path),
            AssetSource::ProceduralHumanoid => Ok(procedural_humanoid()),
            AssetSource::ProceduralCity { seed, floor_name } => Ok(procedural_city(seed, &floor_name)),
        }
    }
}

/// A finished load, delivered exactly once per requested asset.
#[derive(Debug)]
pub struct LoadEvent {
    pub kind: AssetKind,
    pub result: Result<SceneGraph, AssetError>,
}

pub struct AssetLoader {
    sender: Sender<LoadEvent>,
    receiver: Receiver<LoadEvent>,
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetLoader {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    /// Start loading in the background. The outcome arrives via `poll`.
    pub fn load(&self, kind: AssetKind, source: AssetSource) {
        let sender = self.sender.clone();
        let spawned = thread::Builder::new()
            .name(format!("load-{:?}", kind).to_lowercase())
            .spawn(move || {
                let result = source.load();
                // Receiver only disappears at shutdown.
                let _ = sender.send(LoadEvent { kind, result });
            });

        if let Err(e) = spawned {
            let _ = self.sender.send(LoadEvent { kind, result: Err(AssetError::Spawn(e)) });
        }
    }

    /// Loads that finished since the last call, in completion order.
    pub fn poll(&self) -> Vec<LoadEvent> {
        self.receiver.try_iter().collect()
    }
}

// ============================================================================
// GLTF
// ============================================================================

/// Read the node hierarchy and per-mesh bounds of a glTF/GLB file.
///
/// Mesh bounds come from the POSITION accessor min/max, which glTF requires,
/// so vertex buffers are never read. Node names fall back to mesh names.
pub fn load_gltf(path: &Path) -> Result<SceneGraph, AssetError> {
    let gltf = gltf::Gltf::open(path).map_err(|source| AssetError::Gltf {
        path: path.to_path_buf(),
        source,
    })?;

    let mut graph = SceneGraph::new();
    let scene = gltf.default_scene().or_else(|| gltf.scenes().next());
    if let Some(scene) = scene {
        for node in scene.nodes() {
            add_gltf_node(&mut graph, &node, None);
        }
    }

    if graph.is_empty() {
        return Err(AssetError::EmptyScene(path.to_path_buf()));
    }

    log::info!(
        "Loaded {}: {} nodes, {} meshes",
        path.display(),
        graph.len(),
        graph.meshes().len()
    );
    Ok(graph)
}

fn add_gltf_node(graph: &mut SceneGraph, node: &gltf::Node, parent: Option<NodeId>) {
    let (t, r, s) = node.transform().decomposed();
    let mesh = node.mesh();

    let name = node
        .name()
        .or_else(|| mesh.as_ref().and_then(|m| m.name()))
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));

    let mut mesh_bounds: Option<Aabb> = None;
    let mut color = [0.7, 0.7, 0.7];
    if let Some(mesh) = &mesh {
        for (i, primitive) in mesh.primitives().enumerate() {
            let bb = primitive.bounding_box();
            let b = Aabb::new(Vec3::from(bb.min), Vec3::from(bb.max));
            mesh_bounds = Some(match mesh_bounds {
                Some(acc) => acc.union(&b),
                None => b,
            });
            if i == 0 {
                let c = primitive.material().pbr_metallic_roughness().base_color_factor();
                color = [c[0], c[1], c[2]];
            }
        }
    }

    let id = graph.push(SceneNode {
        name,
        parent,
        translation: Vec3::from(t),
        rotation: Quat::from_array(r),
        scale: Vec3::from(s),
        mesh_bounds,
        color,
    });

    for child in node.children() {
        add_gltf_node(graph, &child, Some(id));
    }
}

// ============================================================================
// PROCEDURAL ASSETS
// ============================================================================

const SKIN: [f32; 3] = [0.93, 0.76, 0.62];
const SHIRT: [f32; 3] = [0.20, 0.35, 0.80];
const TROUSERS: [f32; 3] = [0.18, 0.18, 0.22];

fn limb(half_width: f32, length: f32) -> Aabb {
    Aabb::new(Vec3::new(-half_width, -length, -half_width), Vec3::new(half_width, 0.0, half_width))
}

/// Box humanoid with the six animated joints. Feet rest at local y = -0.5
/// and it faces local -Z.
pub fn procedural_humanoid() -> SceneGraph {
    let mut g = SceneGraph::new();
    let root = g.add_node("Armature", None, Vec3::ZERO);
    let hips = g.add_mesh(
        "Hips",
        Some(root),
        Vec3::new(0.0, 0.45, 0.0),
        Aabb::new(Vec3::new(-0.22, 0.0, -0.12), Vec3::new(0.22, 0.6, 0.12)),
        SHIRT,
    );
    let head = g.add_mesh(
        "Head",
        Some(hips),
        Vec3::new(0.0, 0.75, 0.0),
        Aabb::from_center_size(Vec3::ZERO, Vec3::splat(0.24)),
        SKIN,
    );
    g.add_mesh(
        "Nose",
        Some(head),
        Vec3::new(0.0, 0.0, -0.13),
        Aabb::from_center_size(Vec3::ZERO, Vec3::splat(0.05)),
        SKIN,
    );

    for (side, arm, up_leg, leg) in [
        (-1.0, LEFT_ARM, LEFT_UP_LEG, LEFT_LEG),
        (1.0, RIGHT_ARM, RIGHT_UP_LEG, RIGHT_LEG),
    ] {
        g.add_mesh(arm, Some(hips), Vec3::new(side * 0.28, 0.58, 0.0), limb(0.06, 0.55), SKIN);
        let thigh = g.add_mesh(up_leg, Some(hips), Vec3::new(side * 0.11, 0.0, 0.0), limb(0.08, 0.45), TROUSERS);
        g.add_mesh(leg, Some(thigh), Vec3::new(0.0, -0.45, 0.0), limb(0.07, 0.5), TROUSERS);
    }

    g
}

/// Spacing between city block centres.
const BLOCK: f32 = 15.0;
/// Blocks out from the centre on each axis.
const BLOCKS: i32 = 4;

/// Grid of tall towers around an open plaza at the origin, with a few low
/// benches the padded collision box walks over. Same seed, same city.
pub fn procedural_city(seed: u64, floor_name: &str) -> SceneGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut g = SceneGraph::new();
    let root = g.add_node("City", None, Vec3::ZERO);

    let half = BLOCK * (BLOCKS as f32 + 1.0);
    g.add_mesh(
        floor_name,
        Some(root),
        Vec3::ZERO,
        Aabb::new(Vec3::new(-half, -0.1, -half), Vec3::new(half, 0.0, half)),
        [0.32, 0.34, 0.30],
    );

    let mut towers = 0;
    let mut benches = 0;
    for gx in -BLOCKS..=BLOCKS {
        for gz in -BLOCKS..=BLOCKS {
            let centre = Vec3::new(gx as f32 * BLOCK, 0.0, gz as f32 * BLOCK);

            if gx.abs() <= 1 && gz.abs() <= 1 {
                if (gx + gz) % 2 != 0 {
                    let length = rng.gen_range(2.0..4.0);
                    g.add_mesh(
                        &format!("Bench_{benches}"),
                        Some(root),
                        centre,
                        Aabb::new(Vec3::new(-length, 0.0, -0.6), Vec3::new(length, 0.9, 0.6)),
                        [0.55, 0.38, 0.22],
                    );
                    benches += 1;
                }
                continue;
            }

            if !rng.gen_bool(0.8) {
                continue;
            }

            let w = rng.gen_range(3.0..6.5);
            let d = rng.gen_range(3.0..6.5);
            let h = rng.gen_range(18.0..45.0);
            let shade = rng.gen_range(0.45..0.85);
            g.add_mesh(
                &format!("Building_{towers}"),
                Some(root),
                centre,
                Aabb::new(Vec3::new(-w, 0.0, -d), Vec3::new(w, h, d)),
                [shade, shade * 0.95, shade * 0.9],
            );
            towers += 1;
        }
    }

    log::info!("Generated city (seed {seed}): {towers} towers, {benches} benches");
    g
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::components::SkeletonJoints;

    #[test]
    fn humanoid_has_every_joint() {
        let g = procedural_humanoid();
        assert!(SkeletonJoints::resolve(&g).is_complete());
    }

    #[test]
    fn humanoid_stands_on_local_minus_half() {
        let b = procedural_humanoid().bounds().unwrap();
        assert!((b.min.y + 0.5).abs() < 1e-5, "{:?}", b);
        assert!(b.max.y > 1.0);
    }

    #[test]
    fn city_is_deterministic_per_seed() {
        let a = procedural_city(3, "Floor");
        let b = procedural_city(3, "Floor");
        let names = |g: &SceneGraph| g.nodes().iter().map(|n| n.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&a), names(&b));
        assert_eq!(a.bounds(), b.bounds());
    }

    #[test]
    fn city_plaza_is_clear_of_towers() {
        let g = procedural_city(11, "Floor");
        let plaza = Aabb::from_center_size(Vec3::new(0.0, 1.0, 0.0), Vec3::new(4.0, 2.0, 4.0));
        for mesh in g.meshes() {
            if mesh.name.starts_with("Building_") {
                assert!(!mesh.world_bounds.intersects(&plaza), "{} in plaza", mesh.name);
            }
        }
        assert!(g.node_by_name("Floor").is_some());
    }

    #[test]
    fn missing_gltf_is_a_load_error() {
        let err = AssetSource::Gltf(PathBuf::from("does/not/exist.glb")).load().unwrap_err();
        assert!(matches!(err, AssetError::Gltf { .. }));
    }

    #[test]
    fn loader_reports_each_load_once() {
        let loader = AssetLoader::new();
        loader.load(AssetKind::Avatar, AssetSource::ProceduralHumanoid);
        loader.load(AssetKind::Environment, AssetSource::Gltf(PathBuf::from("missing.glb")));

        let mut events = Vec::new();
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        while events.len() < 2 && std::time::Instant::now() < deadline {
            events.extend(loader.poll());
            thread::sleep(std::time::Duration::from_millis(5));
        }

        assert_eq!(events.len(), 2);
        let avatar = events.iter().find(|e| e.kind == AssetKind::Avatar).unwrap();
        assert!(avatar.result.is_ok());
        let env = events.iter().find(|e| e.kind == AssetKind::Environment).unwrap();
        assert!(env.result.is_err());
        assert!(loader.poll().is_empty());
    }
}
