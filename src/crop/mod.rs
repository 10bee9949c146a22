/// Crop and split helpers
pub mod split;
/// Power-of-two crop window selection
pub mod window;
pub use split::{crop_and_split, crop_first_axis, split_last_axis, CroppedVolume};
pub use window::{annotated_range, select_z_window, CropWindow};
