use ndarray::{Array3, Array4, ArrayView3, Axis};
use serde::{Deserialize, Serialize};

use crate::errors::LabelError;

/// Raw annotation voxels
///
/// Multi-layer volumes keep the layer index on the last axis.
#[derive(Debug, Clone, PartialEq)]
pub enum RawLabelVolume {
    Single(Array3<u32>),
    Layered(Array4<u32>),
}

impl RawLabelVolume {
    /// Builds a volume from a row-major shape and its flattened voxels
    ///
    /// A 4D shape with a single component collapses to a single-layer volume.
    pub fn from_shape_vec(shape: &[usize], voxels: Vec<u32>) -> Result<RawLabelVolume, LabelError> {
        let err = |e: ndarray::ShapeError| {
            LabelError::ShapeMismatch(format!("{} voxels for shape {:?}: {}", voxels_len(shape), shape, e))
        };
        match *shape {
            [d0, d1, d2] => Ok(RawLabelVolume::Single(
                Array3::from_shape_vec((d0, d1, d2), voxels).map_err(err)?,
            )),
            [d0, d1, d2, 1] => Ok(RawLabelVolume::Single(
                Array3::from_shape_vec((d0, d1, d2), voxels).map_err(err)?,
            )),
            [d0, d1, d2, d3] => Ok(RawLabelVolume::Layered(
                Array4::from_shape_vec((d0, d1, d2, d3), voxels).map_err(err)?,
            )),
            _ => Err(LabelError::ShapeMismatch(format!(
                "expected 3 or 4 dimensions, got {:?}",
                shape
            ))),
        }
    }

    /// Components per pixel (number of layers)
    pub fn components(&self) -> usize {
        match self {
            RawLabelVolume::Single(_) => 1,
            RawLabelVolume::Layered(arr) => arr.len_of(Axis(3)),
        }
    }

    /// Shape of the spatial axes
    pub fn spatial_shape(&self) -> [usize; 3] {
        match self {
            RawLabelVolume::Single(arr) => {
                let (d0, d1, d2) = arr.dim();
                [d0, d1, d2]
            }
            RawLabelVolume::Layered(arr) => {
                let (d0, d1, d2, _) = arr.dim();
                [d0, d1, d2]
            }
        }
    }

    /// View of one layer
    pub fn layer(&self, layer: usize) -> Option<ArrayView3<'_, u32>> {
        match self {
            RawLabelVolume::Single(arr) if layer == 0 => Some(arr.view()),
            RawLabelVolume::Single(_) => None,
            RawLabelVolume::Layered(arr) if layer < arr.len_of(Axis(3)) => {
                Some(arr.index_axis(Axis(3), layer))
            }
            RawLabelVolume::Layered(_) => None,
        }
    }

    /// Shape followed by the flattened voxels in row-major order
    pub fn to_shape_vec(&self) -> (Vec<usize>, Vec<u32>) {
        match self {
            RawLabelVolume::Single(arr) => (arr.shape().to_vec(), arr.iter().copied().collect()),
            RawLabelVolume::Layered(arr) => (arr.shape().to_vec(), arr.iter().copied().collect()),
        }
    }
}

impl From<Array3<u32>> for RawLabelVolume {
    fn from(arr: Array3<u32>) -> Self {
        RawLabelVolume::Single(arr)
    }
}

impl From<Array4<u32>> for RawLabelVolume {
    fn from(arr: Array4<u32>) -> Self {
        if arr.len_of(Axis(3)) == 1 {
            return RawLabelVolume::Single(arr.index_axis_move(Axis(3), 0));
        }
        RawLabelVolume::Layered(arr)
    }
}

fn voxels_len(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Spatial metadata of a volume, one entry per array axis
///
/// It is never recomputed by the pipeline: derived volumes copy it, and
/// crops shift the origin by whole voxels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeGeometry {
    pub origin: [f64; 3],
    pub spacing: [f64; 3],
    pub direction: [f64; 9],
}

impl Default for VolumeGeometry {
    fn default() -> Self {
        VolumeGeometry {
            origin: [0.0; 3],
            spacing: [1.0; 3],
            direction: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl VolumeGeometry {
    /// Geometry with the given spacing and identity orientation
    pub fn with_spacing(spacing: [f64; 3]) -> VolumeGeometry {
        VolumeGeometry {
            spacing,
            ..Default::default()
        }
    }

    /// Geometry of a sub-volume starting `offset` voxels further along `axis`
    pub fn shifted(&self, axis: usize, offset: usize) -> VolumeGeometry {
        let mut geometry = *self;
        if axis < 3 {
            geometry.origin[axis] += offset as f64 * self.spacing[axis];
        }
        geometry
    }
}
