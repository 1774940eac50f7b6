// Minimal scene graph produced by asset loading.
//
// Nodes are stored parent-first: a node's parent always has a smaller index,
// so world matrices resolve in a single forward pass.

use glam::{EulerRot, Mat4, Quat, Vec3};

use super::bounds::Aabb;

pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Local-space bounds of the node's mesh, if it carries one.
    pub mesh_bounds: Option<Aabb>,
    pub color: [f32; 3],
}

impl SceneNode {
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Local matrix with the XYZ Euler rotation replaced on the given axes.
    /// Axes left as `None` keep their rest value.
    pub fn local_matrix_with_euler(&self, x: Option<f32>, y: Option<f32>, z: Option<f32>) -> Mat4 {
        let (rx, ry, rz) = self.rotation.to_euler(EulerRot::XYZ);
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            x.unwrap_or(rx),
            y.unwrap_or(ry),
            z.unwrap_or(rz),
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.translation)
    }
}

/// A mesh-bearing node with its bounds already in scene space.
#[derive(Debug, Clone, Copy)]
pub struct MeshInstance<'a> {
    pub id: NodeId,
    pub name: &'a str,
    pub world_bounds: Aabb,
}

#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Append a node with identity rotation and unit scale. Returns its id.
    pub fn add_node(&mut self, name: &str, parent: Option<NodeId>, translation: Vec3) -> NodeId {
        self.push(SceneNode {
            name: name.to_string(),
            parent,
            translation,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            mesh_bounds: None,
            color: [0.7, 0.7, 0.7],
        })
    }

    /// Append a node that renders and collides as `bounds` in its local space.
    pub fn add_mesh(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        translation: Vec3,
        bounds: Aabb,
        color: [f32; 3],
    ) -> NodeId {
        let id = self.add_node(name, parent, translation);
        self.nodes[id].mesh_bounds = Some(bounds);
        self.nodes[id].color = color;
        id
    }

    /// Append a fully specified node. Panics in debug builds if the parent
    /// does not precede it.
    pub fn push(&mut self, node: SceneNode) -> NodeId {
        debug_assert!(node.parent.is_none_or(|p| p < self.nodes.len()), "parent must be added first");
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &SceneNode { &self.nodes[id] }
    pub fn nodes(&self) -> &[SceneNode] { &self.nodes }
    pub fn len(&self) -> usize { self.nodes.len() }
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// First node with this exact name.
    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name)
    }

    /// Scene-space matrix of every node, with `local` supplying each node's
    /// local matrix. Used by the renderer to pose joints.
    pub fn world_matrices_with(&self, mut local: impl FnMut(NodeId, &SceneNode) -> Mat4) -> Vec<Mat4> {
        let mut world: Vec<Mat4> = Vec::with_capacity(self.nodes.len());
        for (id, node) in self.nodes.iter().enumerate() {
            let m = local(id, node);
            let m = match node.parent {
                Some(parent) => world[parent] * m,
                None => m,
            };
            world.push(m);
        }
        world
    }

    /// Rest-pose scene-space matrix of every node.
    pub fn world_matrices(&self) -> Vec<Mat4> {
        self.world_matrices_with(|_, node| node.local_matrix())
    }

    /// Every mesh node with its scene-space bounds at rest pose.
    pub fn meshes(&self) -> Vec<MeshInstance<'_>> {
        let world = self.world_matrices();
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(id, node)| {
                node.mesh_bounds.map(|bounds| MeshInstance {
                    id,
                    name: node.name.as_str(),
                    world_bounds: bounds.transformed(&world[id]),
                })
            })
            .collect()
    }

    /// Union of all mesh bounds in scene space. `None` without meshes.
    pub fn bounds(&self) -> Option<Aabb> {
        self.meshes()
            .into_iter()
            .map(|m| m.world_bounds)
            .reduce(|a, b| a.union(&b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg() -> SceneGraph {
        let mut g = SceneGraph::new();
        let root = g.add_node("Root", None, Vec3::new(0.0, 1.0, 0.0));
        let hip = g.add_node("Hip", Some(root), Vec3::new(0.2, 0.0, 0.0));
        g.add_mesh(
            "Shin",
            Some(hip),
            Vec3::new(0.0, -0.5, 0.0),
            Aabb::new(Vec3::new(-0.1, -0.5, -0.1), Vec3::new(0.1, 0.0, 0.1)),
            [1.0, 0.0, 0.0],
        );
        g
    }

    #[test]
    fn lookup_by_name() {
        let g = leg();
        assert_eq!(g.node_by_name("Hip"), Some(1));
        assert_eq!(g.node_by_name("LeftArm"), None);
    }

    #[test]
    fn mesh_bounds_follow_parent_chain() {
        let g = leg();
        let meshes = g.meshes();
        assert_eq!(meshes.len(), 1);
        let b = meshes[0].world_bounds;
        assert!(b.min.abs_diff_eq(Vec3::new(0.1, 0.0, -0.1), 1e-5), "{:?}", b);
        assert!(b.max.abs_diff_eq(Vec3::new(0.3, 0.5, 0.1), 1e-5), "{:?}", b);
        assert_eq!(g.bounds(), Some(b));
    }

    #[test]
    fn euler_override_rotates_children() {
        let g = leg();
        let hip = g.node_by_name("Hip").unwrap();
        let world = g.world_matrices_with(|id, node| {
            if id == hip {
                node.local_matrix_with_euler(None, None, Some(std::f32::consts::FRAC_PI_2))
            } else {
                node.local_matrix()
            }
        });
        // Shin origin swings from straight down to pointing +x.
        let shin = world[2].transform_point3(Vec3::ZERO);
        assert!(shin.abs_diff_eq(Vec3::new(0.7, 1.0, 0.0), 1e-5), "{:?}", shin);
    }

    #[test]
    fn empty_graph_has_no_bounds() {
        assert!(SceneGraph::new().bounds().is_none());
    }
}
