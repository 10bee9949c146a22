use anyhow::Result;
use nalgebra::base::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Mesh vertex
pub type Vertex = Vector3<f32>;
/// Mesh face (array of vertex indices, counter-clockwise seen from outside)
pub type Face = [usize; 3];

/// Named meshes, ordered by key
pub type MeshSet = BTreeMap<String, Mesh3D>;

#[derive(Debug, Clone, Default, Serialize)]
/// Indexed triangle mesh
///
/// Serializes as its vertex list and face-index list.
pub struct Mesh3D {
    pub(super) vertices: Vec<Vertex>,
    pub(super) faces: Vec<Face>,

    #[serde(skip)]
    pub(super) map_vert_face: Vec<Vec<usize>>,
}

impl Mesh3D {
    /// Mesh constructor
    pub fn new() -> Mesh3D {
        Mesh3D {
            vertices: Vec::new(),
            faces: Vec::new(),

            map_vert_face: Vec::new(),
        }
    }

    /// Builds a mesh from flat vertex positions and triangle indices
    pub fn from_buffers(positions: &[[f32; 3]], indices: &[u32]) -> Result<Mesh3D> {
        if indices.len() % 3 != 0 {
            return Err(anyhow::Error::msg(
                "from_buffers(): Index count is not a multiple of 3",
            ));
        }
        let mut mesh = Mesh3D::new();
        for pos in positions.iter() {
            mesh.add_vertex(&Vector3::new(pos[0], pos[1], pos[2]));
        }
        for tri in indices.chunks_exact(3) {
            mesh.add_face(tri[0] as usize, tri[1] as usize, tri[2] as usize)?;
        }
        Ok(mesh)
    }

    /// Adds a vertex to the mesh
    pub fn add_vertex(&mut self, point: &Vector3<f32>) -> usize {
        self.vertices.push(*point);
        self.map_vert_face.push(Vec::new());
        self.vertices.len() - 1
    }

    fn get_vertex_uncheck(&self, ind_vertex: usize) -> Vertex {
        self.vertices[ind_vertex]
    }

    /// Vertex getter
    pub fn get_vertex(&self, ind_vertex: usize) -> Result<Vertex> {
        if ind_vertex >= self.vertices.len() {
            return Err(anyhow::Error::msg("get_vertex(): Index out of bounds"));
        }

        Ok(self.get_vertex_uncheck(ind_vertex))
    }

    /// Gets number of vertices
    pub fn get_nb_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Adds a face to the mesh
    ///
    /// Vertex order is kept. Returns the index of an existing face over the
    /// same vertices if there is one.
    pub fn add_face(
        &mut self,
        ind_vertex1: usize,
        ind_vertex2: usize,
        ind_vertex3: usize,
    ) -> Result<usize> {
        let face = [ind_vertex1, ind_vertex2, ind_vertex3];
        if face.iter().any(|&ind| ind >= self.vertices.len()) {
            return Err(anyhow::Error::msg("add_face(): Vertex index out of bounds"));
        }
        if ind_vertex1 == ind_vertex2 || ind_vertex2 == ind_vertex3 || ind_vertex1 == ind_vertex3
        {
            return Err(anyhow::Error::msg("add_face(): Degenerated face"));
        }

        if let Some(ind_fac) = self.is_face_in(ind_vertex1, ind_vertex2, ind_vertex3) {
            return Ok(ind_fac);
        }

        self.faces.push(face);
        let ind_face = self.faces.len() - 1;
        for &ind in face.iter() {
            self.map_vert_face[ind].push(ind_face);
        }

        Ok(ind_face)
    }

    fn get_face_uncheck(&self, ind_face: usize) -> Face {
        self.faces[ind_face]
    }

    /// Face getter
    pub fn get_face(&self, ind_face: usize) -> Result<Face> {
        if ind_face >= self.faces.len() {
            return Err(anyhow::Error::msg("get_face(): Index out of bounds"));
        }
        Ok(self.get_face_uncheck(ind_face))
    }

    /// Gets number of faces
    pub fn get_nb_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Checks if the mesh has no face
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Faces around a vertex
    pub fn faces_of_vertex(&self, ind_vertex: usize) -> Result<&[usize]> {
        self.map_vert_face
            .get(ind_vertex)
            .map(|faces| faces.as_slice())
            .ok_or(anyhow::Error::msg("faces_of_vertex(): Index out of bounds"))
    }

    /// Checks if a face is in the mesh, whatever its orientation
    ///
    /// Returns face index if found
    pub fn is_face_in(
        &self,
        ind_vertex1: usize,
        ind_vertex2: usize,
        ind_vertex3: usize,
    ) -> Option<usize> {
        let mut face = [ind_vertex1, ind_vertex2, ind_vertex3];
        face.sort();
        self.map_vert_face
            .get(ind_vertex1)?
            .iter()
            .find(|&&ind_face| {
                let mut other = self.faces[ind_face];
                other.sort();
                other == face
            })
            .copied()
    }

    /// Moves every vertex by an offset
    pub fn translate(&mut self, offset: &Vector3<f32>) -> () {
        for vert in self.vertices.iter_mut() {
            *vert += offset;
        }
    }

    /// Axis aligned bounding box, as (min, max)
    pub fn bounding_box(&self) -> Option<(Vertex, Vertex)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(mn, mx), vert| (mn.inf(vert), mx.sup(vert))),
        )
    }

    /// Vertex positions as plain arrays
    pub fn positions(&self) -> Vec<[f32; 3]> {
        self.vertices.iter().map(|v| [v[0], v[1], v[2]]).collect()
    }
}
