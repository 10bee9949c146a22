use ndarray::{ArrayView3, Axis};

use crate::errors::LabelError;

/// Contiguous range `[start, end)` along one axis
///
/// `size` is the requested window length. It is a power of two for detected
/// windows and may exceed `end - start` when the volume is shorter than it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub start: usize,
    pub end: usize,
    pub size: usize,
}

impl CropWindow {
    /// Number of slices actually covered
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Slices along the first axis holding a non-background voxel, as (first, last)
pub fn annotated_range(mask: &ArrayView3<u32>) -> Option<(usize, usize)> {
    let mut range: Option<(usize, usize)> = None;
    for (ind, slice) in mask.axis_iter(Axis(0)).enumerate() {
        if slice.iter().any(|&v| v > 0) {
            range = Some(match range {
                Some((first, _)) => (first, ind),
                None => (ind, ind),
            });
        }
    }
    range
}

/// Selects a crop window along the first axis of a mask
///
/// With both overrides the window is returned as given. Otherwise the window
/// is the smallest power of two covering the annotated slices, centred on
/// them and shifted back inside the volume when it overflows.
pub fn select_z_window(
    mask: &ArrayView3<u32>,
    override_start: Option<usize>,
    override_end: Option<usize>,
) -> Result<CropWindow, LabelError> {
    if let (Some(start), Some(end)) = (override_start, override_end) {
        if end < start {
            return Err(LabelError::ShapeMismatch(format!(
                "crop window ends at {} before its start {}",
                end, start
            )));
        }
        return Ok(CropWindow {
            start,
            end,
            size: end - start,
        });
    }

    let (z_min, z_max) = annotated_range(mask).ok_or(LabelError::EmptyAnnotation)?;
    let bbox_size = z_max - z_min + 1;
    let size = bbox_size.next_power_of_two();

    let len = mask.len_of(Axis(0));
    let center = (z_min + z_max) / 2;
    let start = center.saturating_sub(size / 2);
    let end = (start + size).min(len);
    let start = end.saturating_sub(size);

    log::debug!(
        "annotation spans slices {}..={}, crop {}..{} ({} slices)",
        z_min,
        z_max,
        start,
        end,
        size
    );
    Ok(CropWindow { start, end, size })
}
