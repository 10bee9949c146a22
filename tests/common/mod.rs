//! Helpers shared by the integration tests.

#![allow(dead_code)]

use nalgebra::Vector3;
use ndarray::Array3;
use seg_mesh_3d::mesh3d::{Mesh3D, MeshSet};
use seg_mesh_3d::segmentation::MetaDictionary;

/// Segment metadata as written by the annotation tool
pub fn metadata(segments: &[(u32, usize, u32, &str)]) -> MetaDictionary {
    let mut meta = MetaDictionary::new();
    for &(n, layer, value, name) in segments {
        meta.insert(format!("Segment{}_ID", n), format!("Segment_{}", n));
        meta.insert(format!("Segment{}_LabelValue", n), value.to_string());
        meta.insert(format!("Segment{}_Layer", n), layer.to_string());
        meta.insert(format!("Segment{}_Name", n), name.to_string());
        meta.insert(format!("Segment{}_Color", n), "0.5 0.5 0.5".to_string());
    }
    meta.insert("Segmentation_MasterRepresentation".to_string(), "Binary labelmap".to_string());
    meta
}

/// Moller-Trumbore ray / triangle intersection, returns the ray parameter
fn ray_hits(origin: &Vector3<f64>, dir: &Vector3<f64>, tri: [Vector3<f64>; 3]) -> Option<f64> {
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let p = dir.cross(&e2);
    let det = e1.dot(&p);
    if det.abs() < 1e-12 {
        return None;
    }
    let inv = 1.0 / det;
    let s = origin - tri[0];
    let u = s.dot(&p) * inv;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(&e1);
    let v = dir.dot(&q) * inv;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(&q) * inv;
    if t > 0.0 {
        Some(t)
    } else {
        None
    }
}

/// Checks if a point lies inside a closed mesh, by ray parity
pub fn is_inside(mesh: &Mesh3D, point: &Vector3<f64>) -> bool {
    let dir = Vector3::new(1.0, 0.0123, 0.0371).normalize();
    let hits = mesh
        .faces()
        .iter()
        .filter(|face| {
            let tri = [
                mesh.vertices()[face[0]].cast::<f64>(),
                mesh.vertices()[face[1]].cast::<f64>(),
                mesh.vertices()[face[2]].cast::<f64>(),
            ];
            ray_hits(point, &dir, tri).is_some()
        })
        .count();
    hits % 2 == 1
}

/// Voxelizes a mesh set on a grid of the given spacing
///
/// The grid is aligned on the joint bounding box of the meshes, which for
/// extracted meshes lies on voxel faces. One empty voxel pads every side.
/// Every voxel takes the value of the first mesh (in key order) holding its
/// center, mapped through `label_of`.
pub fn voxelize<F>(meshes: &MeshSet, spacing: [f64; 3], label_of: F) -> Array3<u32>
where
    F: Fn(&str) -> u32,
{
    let (mut mn, mut mx) = (Vector3::repeat(f64::MAX), Vector3::repeat(f64::MIN));
    for mesh in meshes.values() {
        if let Some((a, b)) = mesh.bounding_box() {
            mn = mn.inf(&a.cast::<f64>());
            mx = mx.sup(&b.cast::<f64>());
        }
    }
    let mut dims = [0usize; 3];
    for axis in 0..3 {
        dims[axis] = ((mx[axis] - mn[axis]) / spacing[axis]).round() as usize + 2;
    }
    let mut volume = Array3::<u32>::zeros((dims[0], dims[1], dims[2]));
    for ((i0, i1, i2), value) in volume.indexed_iter_mut() {
        let ind = [i0, i1, i2];
        if ind.iter().zip(dims.iter()).any(|(&i, &d)| i == 0 || i == d - 1) {
            continue;
        }
        let mut center = Vector3::zeros();
        for axis in 0..3 {
            center[axis] = mn[axis] + (ind[axis] as f64 - 0.5) * spacing[axis];
        }
        if let Some((name, _)) = meshes.iter().find(|(_, mesh)| is_inside(mesh, &center)) {
            *value = label_of(name);
        }
    }
    volume
}

/// Extent of the joint bounding box of a mesh set
pub fn joint_extent(meshes: &MeshSet) -> Vector3<f64> {
    let (mut mn, mut mx) = (Vector3::repeat(f64::MAX), Vector3::repeat(f64::MIN));
    for mesh in meshes.values() {
        if let Some((a, b)) = mesh.bounding_box() {
            mn = mn.inf(&a.cast::<f64>());
            mx = mx.sup(&b.cast::<f64>());
        }
    }
    mx - mn
}
