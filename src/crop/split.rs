use anyhow::Result;
use ndarray::{s, Array3, ArrayView3, Axis};

use crate::crop::CropWindow;
use crate::segmentation::VolumeGeometry;

/// Crops a volume to a window of its first axis
pub fn crop_first_axis<T: Clone>(volume: &ArrayView3<T>, window: &CropWindow) -> Result<Array3<T>> {
    let len = volume.len_of(Axis(0));
    if window.start > window.end || window.end > len {
        return Err(anyhow::Error::msg(format!(
            "crop_first_axis(): window {}..{} out of volume length {}",
            window.start, window.end, len
        )));
    }
    Ok(volume.slice(s![window.start..window.end, .., ..]).to_owned())
}

/// Splits a volume at the midpoint of its last axis
///
/// Returns both halves and the index where the second one starts.
pub fn split_last_axis<T: Clone>(volume: &ArrayView3<T>) -> (Array3<T>, Array3<T>, usize) {
    let mid = volume.len_of(Axis(2)) / 2;
    let first = volume.slice(s![.., .., ..mid]).to_owned();
    let second = volume.slice(s![.., .., mid..]).to_owned();
    (first, second, mid)
}

/// Cropped volume with the geometry of its first voxel
#[derive(Debug, Clone, PartialEq)]
pub struct CroppedVolume<T> {
    pub voxels: Array3<T>,
    pub geometry: VolumeGeometry,
}

/// Crops along the first axis, then optionally splits the last axis in halves
pub fn crop_and_split<T: Clone>(
    volume: &ArrayView3<T>,
    geometry: &VolumeGeometry,
    window: &CropWindow,
    split: bool,
) -> Result<Vec<CroppedVolume<T>>> {
    let cropped = crop_first_axis(volume, window)?;
    let geometry = geometry.shifted(0, window.start);
    if !split {
        return Ok(vec![CroppedVolume {
            voxels: cropped,
            geometry,
        }]);
    }
    let (first, second, mid) = split_last_axis(&cropped.view());
    log::debug!("split at index {} of the last axis", mid);
    Ok(vec![
        CroppedVolume {
            voxels: first,
            geometry,
        },
        CroppedVolume {
            voxels: second,
            geometry: geometry.shifted(2, mid),
        },
    ])
}
