//! Loaded model: an arena of parts forming the visible hierarchy.
//!
//! Parts are never destroyed while the model lives. Removing a part only
//! detaches it (and with it, its subtree) from the hierarchy, so it can be
//! attached again later.

use glam::{Mat4, Quat, Vec3};
use shared::{ModelId, PartId, PartTransform};

use crate::viewport::mesh::MeshData;

/// One node of the model hierarchy
#[derive(Clone, Debug)]
pub struct PartNode {
    pub name: String,
    /// Parent at the time the part was last attached (None = model root)
    pub parent: Option<PartId>,
    pub children: Vec<PartId>,
    pub transform: PartTransform,
    /// Geometry in the part's local space
    pub mesh: Option<MeshData>,
    attached: bool,
}

/// Current model: parts plus the root list
#[derive(Clone, Debug)]
pub struct Model {
    id: ModelId,
    name: String,
    nodes: Vec<PartNode>,
    roots: Vec<PartId>,
    /// Bumped on every hierarchy or transform change
    version: u64,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            nodes: Vec::new(),
            roots: Vec::new(),
            version: 0,
        }
    }

    pub fn id(&self) -> &ModelId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Total number of parts, attached or not
    pub fn part_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> &[PartId] {
        &self.roots
    }

    pub fn part(&self, id: PartId) -> Option<&PartNode> {
        self.nodes.get(id)
    }

    pub fn part_name(&self, id: PartId) -> Option<&str> {
        self.part(id).map(|p| p.name.as_str())
    }

    /// Add a new attached part. An unknown parent puts the part at the root.
    pub fn add_part(
        &mut self,
        name: impl Into<String>,
        parent: Option<PartId>,
        transform: PartTransform,
        mesh: Option<MeshData>,
    ) -> PartId {
        let id = self.nodes.len();
        let parent = parent.filter(|p| *p < self.nodes.len());

        self.nodes.push(PartNode {
            name: name.into(),
            parent,
            children: Vec::new(),
            transform,
            mesh,
            attached: true,
        });

        match parent {
            Some(p) => self.nodes[p].children.push(id),
            None => self.roots.push(id),
        }

        self.version += 1;
        id
    }

    /// Whether the part itself is linked into its parent
    pub fn is_attached(&self, id: PartId) -> bool {
        self.part(id).is_some_and(|p| p.attached)
    }

    /// Whether the part and all of its ancestors are attached
    pub fn is_visible(&self, id: PartId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            match self.part(cur) {
                Some(node) if node.attached => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Unlink a part from its parent. Its data and subtree are kept.
    pub fn detach(&mut self, id: PartId) -> bool {
        if !self.is_attached(id) {
            return false;
        }

        let parent = self.nodes[id].parent;
        let siblings = match parent {
            Some(p) => &mut self.nodes[p].children,
            None => &mut self.roots,
        };
        siblings.retain(|c| *c != id);

        self.nodes[id].attached = false;
        self.version += 1;
        true
    }

    /// Link a detached part under `parent`, or under the root when the
    /// parent is `None` or not itself visible.
    pub fn attach(&mut self, id: PartId, parent: Option<PartId>) -> bool {
        if id >= self.nodes.len() || self.nodes[id].attached {
            return false;
        }

        let parent = parent.filter(|p| *p != id && self.is_visible(*p));
        match parent {
            Some(p) => self.nodes[p].children.push(id),
            None => self.roots.push(id),
        }

        let node = &mut self.nodes[id];
        node.parent = parent;
        node.attached = true;
        self.version += 1;
        true
    }

    /// Local translation of the part
    pub fn position(&self, id: PartId) -> Option<[f32; 3]> {
        self.part(id).map(|p| p.transform.translation)
    }

    pub fn set_position(&mut self, id: PartId, position: [f32; 3]) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.transform.translation = position;
                self.version += 1;
                true
            }
            None => false,
        }
    }

    /// Local transform as a matrix
    pub fn local_matrix(&self, id: PartId) -> Mat4 {
        self.part(id)
            .map(|p| transform_matrix(&p.transform))
            .unwrap_or(Mat4::IDENTITY)
    }

    /// Model-space transform: parent chain composed with the local transform
    pub fn world_matrix(&self, id: PartId) -> Mat4 {
        let mut matrix = self.local_matrix(id);
        let mut current = self.part(id).and_then(|p| p.parent);
        while let Some(parent) = current {
            matrix = self.local_matrix(parent) * matrix;
            current = self.part(parent).and_then(|p| p.parent);
        }
        matrix
    }

    /// Visible parts in depth-first order from the roots
    pub fn visible_parts(&self) -> Vec<PartId> {
        let mut out = Vec::new();
        let mut stack: Vec<PartId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        out
    }

    /// Geometry of every visible part, moved into model space
    pub fn visible_meshes(&self) -> Vec<(PartId, MeshData)> {
        self.visible_parts()
            .into_iter()
            .filter_map(|id| {
                let mesh = self.nodes[id].mesh.as_ref()?;
                if mesh.is_empty() {
                    return None;
                }
                Some((id, mesh.transformed(&self.world_matrix(id))))
            })
            .collect()
    }

    /// Find a part by exact name
    pub fn find_part(&self, name: &str) -> Option<PartId> {
        self.nodes.iter().position(|p| p.name == name)
    }
}

pub fn transform_matrix(t: &PartTransform) -> Mat4 {
    let rotation = Quat::from_array(t.rotation);
    let rotation = if rotation.length_squared() > 0.0 {
        rotation.normalize()
    } else {
        Quat::IDENTITY
    };
    Mat4::from_scale_rotation_translation(Vec3::from(t.scale), rotation, Vec3::from(t.translation))
}
