use anyhow::Result;
use fast_surface_nets::ndshape::Shape;
use fast_surface_nets::{surface_nets, SurfaceNetsBuffer};
use ndarray::ArrayView3;
use std::collections::BTreeMap;

use crate::mesh3d::Mesh3D;

/// Sampling grid, in array axis order
#[derive(Clone, Copy)]
pub struct GridShape {
    pub n0: u32,
    pub n1: u32,
    pub n2: u32,
}

impl Shape<3> for GridShape {
    type Coord = u32;

    #[inline]
    fn as_array(&self) -> [Self::Coord; 3] {
        [self.n0, self.n1, self.n2]
    }

    fn size(&self) -> Self::Coord {
        self.n0 * self.n1 * self.n2
    }

    fn usize(&self) -> usize {
        (self.n0 * self.n1 * self.n2) as usize
    }

    fn linearize(&self, coords: [Self::Coord; 3]) -> u32 {
        let [i0, i1, i2] = coords;
        (i0 * self.n1 + i1) * self.n2 + i2
    }

    fn delinearize(&self, i: u32) -> [Self::Coord; 3] {
        let i2 = i % self.n2;
        let i01 = i / self.n2;
        let i1 = i01 % self.n1;
        let i0 = i01 / self.n1;
        [i0, i1, i2]
    }
}

/// Inclusive voxel bounds of a label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelBounds {
    pub min: [usize; 3],
    pub max: [usize; 3],
}

impl LabelBounds {
    fn new(ind: [usize; 3]) -> LabelBounds {
        LabelBounds { min: ind, max: ind }
    }

    fn extend(&mut self, ind: [usize; 3]) -> () {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(ind[axis]);
            self.max[axis] = self.max[axis].max(ind[axis]);
        }
    }
}

/// Bounds of every positive label of a volume
pub fn label_bounds(volume: &ArrayView3<u32>) -> BTreeMap<u32, LabelBounds> {
    let mut bounds: BTreeMap<u32, LabelBounds> = BTreeMap::new();
    for ((i0, i1, i2), &label) in volume.indexed_iter() {
        if label == 0 {
            continue;
        }
        bounds
            .entry(label)
            .and_modify(|b| b.extend([i0, i1, i2]))
            .or_insert(LabelBounds::new([i0, i1, i2]));
    }
    bounds
}

/// Extracts the surface of one label
///
/// The label is sampled on its bounding box padded by one voxel: -1 inside,
/// +1 outside. Samples beyond the volume border are outside when
/// `close_boundaries` is set, otherwise they copy the nearest border voxel.
/// Vertices are scaled by `spacing`, with voxel (0, 0, 0) at the origin.
pub fn extract_label_mesh(
    volume: &ArrayView3<u32>,
    label: u32,
    bounds: &LabelBounds,
    spacing: [f64; 3],
    close_boundaries: bool,
) -> Result<Mesh3D> {
    let dim = volume.shape();
    let mut grid = [0u32; 3];
    for axis in 0..3 {
        grid[axis] = u32::try_from(bounds.max[axis] - bounds.min[axis] + 3).map_err(|_| {
            anyhow::Error::msg("extract_label_mesh(): Label too large for a sampling grid")
        })?;
    }
    let shape = GridShape {
        n0: grid[0],
        n1: grid[1],
        n2: grid[2],
    };
    if grid.iter().try_fold(1u32, |acc, &n| acc.checked_mul(n)).is_none() {
        return Err(anyhow::Error::msg(
            "extract_label_mesh(): Label too large for a sampling grid",
        ));
    }

    let mut field = vec![1.0f32; shape.usize()];
    for g0 in 0..shape.n0 {
        for g1 in 0..shape.n1 {
            for g2 in 0..shape.n2 {
                let g = [g0, g1, g2];
                let mut ind = [0usize; 3];
                let mut outside = false;
                for axis in 0..3 {
                    // grid sample g sits on voxel min + g - 1
                    let v = bounds.min[axis] as i64 + g[axis] as i64 - 1;
                    if v < 0 || v >= dim[axis] as i64 {
                        outside = true;
                    }
                    ind[axis] = v.clamp(0, dim[axis] as i64 - 1) as usize;
                }
                if outside && close_boundaries {
                    continue;
                }
                if volume[ind] == label {
                    field[shape.linearize(g) as usize] = -1.0;
                }
            }
        }
    }

    let mut buffer = SurfaceNetsBuffer::default();
    surface_nets(
        &field,
        &shape,
        [0; 3],
        shape.as_array().map(|n| n - 1),
        &mut buffer,
    );

    let positions: Vec<[f32; 3]> = buffer
        .positions
        .iter()
        .map(|p| {
            let mut pos = [0.0f32; 3];
            for axis in 0..3 {
                pos[axis] =
                    ((bounds.min[axis] as f64 + p[axis] as f64 - 1.0) * spacing[axis]) as f32;
            }
            pos
        })
        .collect();

    log::debug!(
        "label {}: {} vertices, {} faces",
        label,
        positions.len(),
        buffer.indices.len() / 3
    );
    Mesh3D::from_buffers(&positions, &buffer.indices)
}
