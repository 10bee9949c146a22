use anyhow::Result;
use nalgebra::base::*;
use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap};
use std::fmt;

use crate::mesh3d::Mesh3D;

/// Smallest closed mesh a decimation can reach
const MIN_FACES: usize = 4;

/// Parameters for mesh decimation
#[derive(Debug, Clone, PartialEq)]
pub struct DecimateParams {
    /// Ratio of faces to keep (0.0 to 1.0). Default: 0.5
    pub target_ratio: f64,

    /// Maximum quadric error allowed for one collapse. If None, no limit.
    pub max_error: Option<f64>,
}

impl Default for DecimateParams {
    fn default() -> Self {
        Self {
            target_ratio: 0.5,
            max_error: None,
        }
    }
}

impl DecimateParams {
    /// Params keeping a ratio of the original faces
    #[must_use]
    pub fn with_target_ratio(ratio: f64) -> Self {
        Self {
            target_ratio: ratio.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// Params dividing the face count by a reduction factor
    ///
    /// Factors 0 and 1 keep every face.
    #[must_use]
    pub fn from_reduction_factor(factor: u32) -> Self {
        if factor <= 1 {
            return Self::with_target_ratio(1.0);
        }
        Self::with_target_ratio(1.0 / factor as f64)
    }

    /// Sets maximum error threshold
    #[must_use]
    pub const fn with_max_error(mut self, max_error: f64) -> Self {
        self.max_error = Some(max_error);
        self
    }
}

/// Decimated mesh and statistics
#[derive(Debug, Clone)]
pub struct DecimationResult {
    pub mesh: Mesh3D,
    pub original_faces: usize,
    pub final_faces: usize,
    pub collapses_performed: usize,
    pub collapses_rejected: usize,
}

impl DecimationResult {
    /// Final / original face count
    pub fn reduction_ratio(&self) -> f64 {
        if self.original_faces == 0 {
            1.0
        } else {
            self.final_faces as f64 / self.original_faces as f64
        }
    }
}

impl fmt::Display for DecimationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "decimation: {} -> {} faces ({} collapses, {} rejected)",
            self.original_faces, self.final_faces, self.collapses_performed, self.collapses_rejected
        )
    }
}

/// Edge collapse candidate
#[derive(Debug, Clone)]
struct EdgeCollapse {
    v1: usize,
    v2: usize,
    cost: f64,
    position: Vector3<f64>,
    stamps: (u32, u32),
}

impl PartialEq for EdgeCollapse {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EdgeCollapse {}

impl PartialOrd for EdgeCollapse {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EdgeCollapse {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed: smallest cost, then smallest edge, on top of the heap
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| (other.v1, other.v2).cmp(&(self.v1, self.v2)))
    }
}

/// Working copy of a mesh under decimation
struct CollapseState {
    positions: Vec<Vector3<f64>>,
    alive: Vec<bool>,
    stamps: Vec<u32>,
    quadrics: Vec<Matrix4<f64>>,
    faces: Vec<Option<[usize; 3]>>,
    map_vert_face: Vec<Vec<usize>>,
    nb_faces: usize,
}

impl CollapseState {
    fn new(mesh: &Mesh3D) -> CollapseState {
        let positions: Vec<Vector3<f64>> = mesh.vertices.iter().map(|v| v.cast::<f64>()).collect();
        let mut quadrics = vec![Matrix4::<f64>::zeros(); positions.len()];
        for face in mesh.faces.iter() {
            if let Some(plane) = face_plane(&positions, face) {
                let q = plane * plane.transpose();
                for &ind in face.iter() {
                    quadrics[ind] += q;
                }
            }
        }
        CollapseState {
            alive: vec![true; positions.len()],
            stamps: vec![0; positions.len()],
            quadrics,
            faces: mesh.faces.iter().map(|&f| Some(f)).collect(),
            map_vert_face: mesh.map_vert_face.clone(),
            nb_faces: mesh.faces.len(),
            positions,
        }
    }

    fn vertex_faces(&self, ind_vertex: usize) -> impl Iterator<Item = (usize, [usize; 3])> + '_ {
        self.map_vert_face[ind_vertex]
            .iter()
            .filter_map(move |&ind_face| self.faces[ind_face].map(|f| (ind_face, f)))
    }

    fn neighbors(&self, ind_vertex: usize) -> BTreeSet<usize> {
        self.vertex_faces(ind_vertex)
            .flat_map(|(_, f)| f.into_iter())
            .filter(|&ind| ind != ind_vertex)
            .collect()
    }

    fn candidate(&self, v1: usize, v2: usize) -> EdgeCollapse {
        let q = self.quadrics[v1] + self.quadrics[v2];
        let p1 = self.positions[v1];
        let p2 = self.positions[v2];

        let a: Matrix3<f64> = q.fixed_slice::<3, 3>(0, 0).into_owned();
        let b: Vector3<f64> = q.fixed_slice::<3, 1>(0, 3).into_owned();
        let optimal = if a.determinant().abs() > 1e-10 {
            a.lu().solve(&(-b))
        } else {
            None
        };

        let (position, cost) = match optimal {
            Some(p) => (p, quadric_cost(&q, &p)),
            None => [p1, p2, (p1 + p2) * 0.5]
                .into_iter()
                .map(|p| (p, quadric_cost(&q, &p)))
                .fold((p1, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best }),
        };

        EdgeCollapse {
            v1,
            v2,
            cost,
            position,
            stamps: (self.stamps[v1], self.stamps[v2]),
        }
    }

    fn is_current(&self, collapse: &EdgeCollapse) -> bool {
        self.alive[collapse.v1]
            && self.alive[collapse.v2]
            && (self.stamps[collapse.v1], self.stamps[collapse.v2]) == collapse.stamps
    }

    /// Checks that merging v2 into v1 at `position` keeps the surface manifold and unfolded
    fn can_collapse(&self, v1: usize, v2: usize, position: &Vector3<f64>) -> bool {
        let n1 = self.neighbors(v1);
        let n2 = self.neighbors(v2);
        if !n1.contains(&v2) {
            return false;
        }
        let shared = n1.intersection(&n2).count();
        let faces_on_edge = self
            .vertex_faces(v1)
            .filter(|(_, f)| f.contains(&v2))
            .count();
        if shared != faces_on_edge {
            return false;
        }
        let valence = n1.union(&n2).filter(|&&ind| ind != v1 && ind != v2).count();
        if valence < 3 {
            return false;
        }

        for &ind_vertex in [v1, v2].iter() {
            for (_, face) in self.vertex_faces(ind_vertex) {
                if face.contains(&v1) && face.contains(&v2) {
                    continue;
                }
                let before = face_normal(&self.positions, &face, None);
                let after = face_normal(&self.positions, &face, Some((ind_vertex, position)));
                match (before, after) {
                    (Some(before), Some(after)) if before.dot(&after) > 0.0 => (),
                    (None, _) => (),
                    _ => return false,
                }
            }
        }
        true
    }

    /// Merges v2 into v1
    fn collapse(&mut self, v1: usize, v2: usize, position: Vector3<f64>) -> () {
        self.positions[v1] = position;
        let q2 = self.quadrics[v2];
        self.quadrics[v1] += q2;
        self.alive[v2] = false;
        self.stamps[v1] += 1;
        self.stamps[v2] += 1;

        let faces_v2: Vec<usize> = self.map_vert_face[v2].clone();
        for ind_face in faces_v2 {
            if let Some(mut face) = self.faces[ind_face] {
                if face.contains(&v1) {
                    self.faces[ind_face] = None;
                    self.nb_faces -= 1;
                } else {
                    for ind in face.iter_mut() {
                        if *ind == v2 {
                            *ind = v1;
                        }
                    }
                    self.faces[ind_face] = Some(face);
                    self.map_vert_face[v1].push(ind_face);
                }
            }
        }
        self.map_vert_face[v2].clear();
        let faces = &self.faces;
        self.map_vert_face[v1].retain(|&ind_face| faces[ind_face].is_some());
    }

    fn into_mesh(self) -> Result<Mesh3D> {
        let mut mesh = Mesh3D::new();
        let mut corresp: Vec<Option<usize>> = vec![None; self.positions.len()];
        for face in self.faces.iter().flatten() {
            let mut new_face = [0; 3];
            for (i, &ind) in face.iter().enumerate() {
                new_face[i] = match corresp[ind] {
                    Some(new_ind) => new_ind,
                    None => {
                        let new_ind = mesh.add_vertex(&self.positions[ind].cast::<f32>());
                        corresp[ind] = Some(new_ind);
                        new_ind
                    }
                };
            }
            mesh.add_face(new_face[0], new_face[1], new_face[2])?;
        }
        Ok(mesh)
    }
}

fn quadric_cost(q: &Matrix4<f64>, p: &Vector3<f64>) -> f64 {
    let h = p.push(1.0);
    (h.transpose() * q * h)[(0, 0)].max(0.0)
}

fn face_normal(
    positions: &[Vector3<f64>],
    face: &[usize; 3],
    moved: Option<(usize, &Vector3<f64>)>,
) -> Option<Vector3<f64>> {
    let pos = |ind: usize| match moved {
        Some((ind_moved, p)) if ind_moved == ind => *p,
        _ => positions[ind],
    };
    let normal = (pos(face[1]) - pos(face[0])).cross(&(pos(face[2]) - pos(face[0])));
    let norm = normal.norm();
    if norm < 1e-12 {
        return None;
    }
    Some(normal / norm)
}

/// Plane (a, b, c, d) of a face, with unit normal (a, b, c)
fn face_plane(positions: &[Vector3<f64>], face: &[usize; 3]) -> Option<Vector4<f64>> {
    let normal = face_normal(positions, face, None)?;
    let d = -normal.dot(&positions[face[0]]);
    Some(normal.push(d))
}

/// Decimates a closed mesh by quadric error edge collapses
///
/// Collapses that would pinch the surface, fold a face over or bring a
/// vertex under three neighbors are rejected, so a closed manifold input
/// stays closed.
pub fn decimate_mesh(mesh: &Mesh3D, params: &DecimateParams) -> Result<DecimationResult> {
    let original_faces = mesh.get_nb_faces();
    let target = ((original_faces as f64 * params.target_ratio).ceil() as usize).max(MIN_FACES);

    if original_faces <= target {
        return Ok(DecimationResult {
            mesh: mesh.clone(),
            original_faces,
            final_faces: original_faces,
            collapses_performed: 0,
            collapses_rejected: 0,
        });
    }

    let mut state = CollapseState::new(mesh);
    let mut heap = BinaryHeap::new();
    for face in mesh.faces.iter() {
        for i in 0..3 {
            let (v1, v2) = (face[i], face[(i + 1) % 3]);
            if v1 < v2 {
                heap.push(state.candidate(v1, v2));
            }
        }
    }

    let mut collapses_performed = 0;
    let mut collapses_rejected = 0;

    while state.nb_faces > target {
        let Some(collapse) = heap.pop() else {
            break;
        };
        if !state.is_current(&collapse) {
            continue;
        }
        if let Some(max_error) = params.max_error {
            if collapse.cost > max_error {
                collapses_rejected += 1;
                continue;
            }
        }
        if !state.can_collapse(collapse.v1, collapse.v2, &collapse.position) {
            collapses_rejected += 1;
            continue;
        }

        state.collapse(collapse.v1, collapse.v2, collapse.position);
        collapses_performed += 1;

        let v1 = collapse.v1;
        for v2 in state.neighbors(v1) {
            heap.push(if v1 < v2 {
                state.candidate(v1, v2)
            } else {
                state.candidate(v2, v1)
            });
        }
    }

    let final_faces = state.nb_faces;
    log::debug!(
        "decimation: {} -> {} faces, {} collapses",
        original_faces,
        final_faces,
        collapses_performed
    );

    Ok(DecimationResult {
        mesh: state.into_mesh()?,
        original_faces,
        final_faces,
        collapses_performed,
        collapses_rejected,
    })
}
