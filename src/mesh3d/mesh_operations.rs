use anyhow::Result;
use nalgebra::base::*;
use std::collections::{HashMap, VecDeque};

use crate::mesh3d::Mesh3D;

/// Splits a mesh into its maximal connected sub-meshes
///
/// Faces are connected through shared vertices. Components come out in
/// the order of their first face, and each component lists its faces in
/// breadth-first order from that face. Vertices are renumbered in order of
/// first use and vertices without faces are dropped.
pub fn split_components(mesh: &Mesh3D) -> Result<Vec<Mesh3D>> {
    let nb_faces = mesh.get_nb_faces();
    let mut visited = vec![false; nb_faces];
    let mut components = Vec::new();

    for ind_seed in 0..nb_faces {
        if visited[ind_seed] {
            continue;
        }
        visited[ind_seed] = true;

        let mut component = Mesh3D::new();
        let mut corresp: HashMap<usize, usize> = HashMap::new();
        let mut queue = VecDeque::from([ind_seed]);

        while let Some(ind_face) = queue.pop_front() {
            let face = mesh.get_face(ind_face)?;
            let mut new_face = [0; 3];
            for (i, &ind_vertex) in face.iter().enumerate() {
                new_face[i] = match corresp.get(&ind_vertex) {
                    Some(&ind) => ind,
                    None => {
                        let ind = component.add_vertex(&mesh.get_vertex(ind_vertex)?);
                        corresp.insert(ind_vertex, ind);
                        ind
                    }
                };
                for &ind_neigh in mesh.faces_of_vertex(ind_vertex)?.iter() {
                    if !visited[ind_neigh] {
                        visited[ind_neigh] = true;
                        queue.push_back(ind_neigh);
                    }
                }
            }
            component.add_face(new_face[0], new_face[1], new_face[2])?;
        }

        components.push(component);
    }

    Ok(components)
}

/// Mean of all vertices of all meshes
pub fn joint_centroid<'a, I>(meshes: I) -> Option<Vector3<f64>>
where
    I: IntoIterator<Item = &'a Mesh3D>,
{
    let (sum, count) = meshes
        .into_iter()
        .flat_map(|mesh| mesh.vertices.iter())
        .fold((Vector3::<f64>::zeros(), 0usize), |(sum, count), vert| {
            (sum + vert.cast::<f64>(), count + 1)
        });
    if count == 0 {
        return None;
    }
    Some(sum / count as f64)
}

/// Moves meshes so that their joint centroid lies at the origin
///
/// Returns the centroid that was subtracted.
pub fn center_meshes<'a, I>(meshes: I) -> Option<Vector3<f64>>
where
    I: IntoIterator<Item = &'a mut Mesh3D>,
{
    let mut meshes: Vec<&'a mut Mesh3D> = meshes.into_iter().collect();
    let centroid = joint_centroid(meshes.iter().map(|mesh| &**mesh))?;
    let offset = -centroid.cast::<f32>();
    for mesh in meshes.iter_mut() {
        mesh.translate(&offset);
    }
    Some(centroid)
}

/// Checks that every edge is shared by exactly two faces
pub fn is_closed(mesh: &Mesh3D) -> bool {
    let mut edge_count: HashMap<[usize; 2], usize> = HashMap::new();
    for face in mesh.faces.iter() {
        for i in 0..3 {
            let (a, b) = (face[i], face[(i + 1) % 3]);
            let edge = if a < b { [a, b] } else { [b, a] };
            *edge_count.entry(edge).or_insert(0) += 1;
        }
    }
    !edge_count.is_empty() && edge_count.values().all(|&cnt| cnt == 2)
}
